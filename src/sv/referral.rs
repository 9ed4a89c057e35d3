use crate::{
  config::{MAX_REFERRAL_DEPTH, Rates},
  entity::{Currency, TransactionType, account, referral},
  ledger,
  locks::LockRegistry,
  prelude::*,
  sv::{Journal, account::Posting},
};

/// Multi-level commission engine. Every payout is best effort: a broken
/// up-line never fails the investment that triggered it.
pub struct Referral<'a> {
  db: &'a DatabaseConnection,
  locks: &'a LockRegistry,
}

/// One commission actually paid out.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct Credit {
  pub account_id: i32,
  /// Chain distance for network payouts, `None` for pool/period bonuses.
  pub level: Option<u32>,
  pub amount: Decimal,
}

/// Rolling activity window for performance bonuses.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BonusPeriod {
  Weekly,
  Monthly,
}

impl BonusPeriod {
  pub fn window(self) -> TimeDelta {
    match self {
      Self::Weekly => TimeDelta::days(7),
      Self::Monthly => TimeDelta::days(30),
    }
  }

  pub fn target(self, rates: &Rates) -> Decimal {
    match self {
      Self::Weekly => rates.weekly_target,
      Self::Monthly => rates.monthly_target,
    }
  }

  pub fn bonus(self, rates: &Rates) -> Decimal {
    match self {
      Self::Weekly => rates.weekly_bonus,
      Self::Monthly => rates.monthly_bonus,
    }
  }

  /// Stable key for the period containing `now`; one payout per key.
  pub fn key(self, now: DateTime) -> String {
    match self {
      Self::Weekly => format!("weekly:{}", now.format("%G-W%V")),
      Self::Monthly => format!("monthly:{}", now.format("%Y-%m")),
    }
  }
}

#[allow(dead_code)]
impl<'a> Referral<'a> {
  pub fn new(db: &'a DatabaseConnection, locks: &'a LockRegistry) -> Self {
    Self { db, locks }
  }

  /// Creates the level-1 edge at signup, snapshotting the current direct
  /// rate and the referrer's up-line path.
  pub async fn register_edge(
    &self,
    referrer: &account::Model,
    referred: &account::Model,
    rates: &Rates,
    now: DateTime,
  ) -> Result<referral::Model> {
    let path = self.build_path(referrer).await?;

    Ok(
      referral::ActiveModel {
        id: NotSet,
        referrer_id: Set(referrer.id),
        referred_id: Set(referred.id),
        level: Set(1),
        commission_rate: Set(rates.direct_rate),
        total_earned: Set(Decimal::ZERO),
        total_invested: Set(Decimal::ZERO),
        direct_cashback_paid: Set(Decimal::ZERO),
        network_cashback_paid: Set(Decimal::ZERO),
        referral_path: Set(Some(path)),
        is_qualified: Set(false),
        qualification_date: Set(None),
        is_active: Set(true),
        joined_at: Set(now),
      }
      .insert(self.db)
      .await?,
    )
  }

  /// Ancestor ids root-first, ending at `account`, at most
  /// [`MAX_REFERRAL_DEPTH`] entries.
  async fn build_path(&self, account: &account::Model) -> Result<String> {
    let mut ids = vec![account.id];
    let mut current = account.clone();

    while ids.len() < MAX_REFERRAL_DEPTH {
      let Some(code) = &current.referred_by else { break };
      let Some(parent) = self.account_by_code(code).await? else { break };
      ids.insert(0, parent.id);
      current = parent;
    }

    Ok(ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(","))
  }

  /// Pays the direct referrer their snapshot rate of `amount`. Missing
  /// links in the chain degrade to no payout rather than an error.
  pub async fn direct_cashback(
    &self,
    account_id: i32,
    amount: Decimal,
    now: DateTime,
  ) -> Result<Option<Credit>> {
    let Some(investor) =
      account::Entity::find_by_id(account_id).one(self.db).await?
    else {
      warn!(account_id, "direct cashback skipped: investor not found");
      return Ok(None);
    };
    let Some(code) = &investor.referred_by else {
      return Ok(None);
    };
    let Some(referrer) = self.account_by_code(code).await? else {
      warn!(account_id, code, "direct cashback skipped: dangling referrer");
      return Ok(None);
    };
    let Some(edge) = self.edge(referrer.id, investor.id).await? else {
      warn!(
        referrer_id = referrer.id,
        referred_id = investor.id,
        "direct cashback skipped: edge missing",
      );
      return Ok(None);
    };

    let commission = edge.commission_amount(amount);
    if commission <= Decimal::ZERO {
      return Ok(None);
    }

    let _guard = self.locks.account(referrer.id).await;
    let txn = self.db.begin().await?;

    let referrer = account::Entity::find_by_id(referrer.id)
      .one(&txn)
      .await?
      .ok_or(Error::AccountNotFound)?;
    let before = referrer.usdt_balance;
    let after = ledger::add(before, commission);
    let total_earned = ledger::add(referrer.total_earned, commission);
    let referrer_id = referrer.id;

    let mut active: account::ActiveModel = referrer.into();
    active.usdt_balance = Set(after);
    active.total_earned = Set(total_earned);
    active.update(&txn).await?;

    let mut active: referral::ActiveModel = edge.clone().into();
    active.total_invested = Set(ledger::add(edge.total_invested, amount));
    active.total_earned = Set(ledger::add(edge.total_earned, commission));
    active.direct_cashback_paid =
      Set(ledger::add(edge.direct_cashback_paid, commission));
    active.is_qualified = Set(true);
    active.qualification_date = Set(edge.qualification_date.or(Some(now)));
    active.update(&txn).await?;

    self
      .journal_bonus(
        &txn,
        referrer_id,
        TransactionType::ReferralBonus,
        commission,
        before,
        after,
        format!("Direct cashback from {} investment", investor.email),
        investor.id,
        now,
      )
      .await?;

    txn.commit().await?;
    debug!(referrer_id, %commission, "direct cashback paid");

    Ok(Some(Credit { account_id: referrer_id, level: Some(1), amount: commission }))
  }

  /// Walks the up-line and pays each ancestor the rate of its chain
  /// distance. The walk starts one step above the investor, so the first
  /// ancestor is paid at the level-2 rate; the direct 10% is the separate
  /// [`Self::direct_cashback`] path.
  pub async fn network_cashback(
    &self,
    account_id: i32,
    amount: Decimal,
    rates: &Rates,
    now: DateTime,
  ) -> Result<Vec<Credit>> {
    let Some(investor) =
      account::Entity::find_by_id(account_id).one(self.db).await?
    else {
      warn!(account_id, "network cashback skipped: investor not found");
      return Ok(vec![]);
    };

    let mut credits = vec![];
    let mut current = investor.clone();
    let mut level: u32 = 1;

    while (level as usize) < MAX_REFERRAL_DEPTH {
      let Some(code) = &current.referred_by else { break };
      let Some(ancestor) = self.account_by_code(code).await? else {
        warn!(code, "network cashback stopped: dangling referrer");
        break;
      };
      level += 1;

      let commission = ledger::multiply(amount, rates.rate_for_level(level));
      if commission > Decimal::ZERO {
        match self
          .credit_network_level(
            &ancestor, &investor, level, amount, commission, rates, now,
          )
          .await
        {
          Ok(()) => credits.push(Credit {
            account_id: ancestor.id,
            level: Some(level),
            amount: commission,
          }),
          Err(err) => {
            warn!(
              ancestor_id = ancestor.id,
              level,
              "network cashback level failed: {err}",
            );
          }
        }
      }

      current = ancestor;
    }

    Ok(credits)
  }

  /// One ancestor payout: balance, edge bookkeeping and journal entry in a
  /// single transaction. A missing edge at this depth is created on the fly
  /// with the current rate snapshot.
  #[allow(clippy::too_many_arguments)]
  async fn credit_network_level(
    &self,
    ancestor: &account::Model,
    investor: &account::Model,
    level: u32,
    amount: Decimal,
    commission: Decimal,
    rates: &Rates,
    now: DateTime,
  ) -> Result<()> {
    let edge = match self.edge(ancestor.id, investor.id).await? {
      Some(edge) => edge,
      None => {
        let path = self.build_path(ancestor).await?;
        referral::ActiveModel {
          id: NotSet,
          referrer_id: Set(ancestor.id),
          referred_id: Set(investor.id),
          level: Set(level as i32),
          commission_rate: Set(rates.rate_for_level(level)),
          total_earned: Set(Decimal::ZERO),
          total_invested: Set(Decimal::ZERO),
          direct_cashback_paid: Set(Decimal::ZERO),
          network_cashback_paid: Set(Decimal::ZERO),
          referral_path: Set(Some(path)),
          is_qualified: Set(false),
          qualification_date: Set(None),
          is_active: Set(true),
          joined_at: Set(now),
        }
        .insert(self.db)
        .await?
      }
    };

    let _guard = self.locks.account(ancestor.id).await;
    let txn = self.db.begin().await?;

    let ancestor = account::Entity::find_by_id(ancestor.id)
      .one(&txn)
      .await?
      .ok_or(Error::AccountNotFound)?;
    let before = ancestor.usdt_balance;
    let after = ledger::add(before, commission);
    let total_earned = ledger::add(ancestor.total_earned, commission);
    let ancestor_id = ancestor.id;

    let mut active: account::ActiveModel = ancestor.into();
    active.usdt_balance = Set(after);
    active.total_earned = Set(total_earned);
    active.update(&txn).await?;

    let mut active: referral::ActiveModel = edge.clone().into();
    active.total_invested = Set(ledger::add(edge.total_invested, amount));
    active.total_earned = Set(ledger::add(edge.total_earned, commission));
    active.network_cashback_paid =
      Set(ledger::add(edge.network_cashback_paid, commission));
    active.is_qualified = Set(true);
    active.qualification_date = Set(edge.qualification_date.or(Some(now)));
    active.update(&txn).await?;

    self
      .journal_bonus(
        &txn,
        ancestor_id,
        TransactionType::NetworkBonus,
        commission,
        before,
        after,
        format!(
          "Level {level} network cashback from {} investment",
          investor.email,
        ),
        investor.id,
        now,
      )
      .await?;

    txn.commit().await?;
    Ok(())
  }

  /// Distributes a share of a platform fee across all token holders,
  /// weighted by balance. Per-holder failures are logged and skipped.
  pub async fn universal_cashback(
    &self,
    fee: Decimal,
    rates: &Rates,
    now: DateTime,
  ) -> Result<Vec<Credit>> {
    let holders = account::Entity::find()
      .filter(account::Column::TokenBalance.gt(Decimal::ZERO))
      .all(self.db)
      .await?;

    let total =
      ledger::sum(holders.iter().map(|holder| holder.token_balance));
    if holders.is_empty() || total <= Decimal::ZERO {
      return Ok(vec![]);
    }

    let pool = ledger::multiply(fee, rates.universal_pool_share);
    let accounts = super::Account::new(self.db, self.locks);
    let mut credits = vec![];

    for holder in holders {
      let weight = ledger::divide(holder.token_balance, total)?;
      let share = ledger::multiply(weight, pool);
      if share <= Decimal::ZERO {
        continue;
      }

      let posting = Posting {
        tx_type: TransactionType::UniversalBonus,
        description: Some("Universal cashback from platform fees".into()),
        reference_id: None,
        reference_type: Some("platform".into()),
      };
      match accounts
        .credit(holder.id, Currency::Usdt, share, posting, now)
        .await
      {
        Ok(_) => {
          credits.push(Credit { account_id: holder.id, level: None, amount: share });
        }
        Err(err) => {
          warn!(holder_id = holder.id, "universal cashback share failed: {err}");
        }
      }
    }

    Ok(credits)
  }

  /// Pays the period bonus when rolling activity meets the target. The
  /// journal reference key makes the payout idempotent per period.
  pub async fn performance_cashback(
    &self,
    account_id: i32,
    period: BonusPeriod,
    rates: &Rates,
    now: DateTime,
  ) -> Result<Option<Credit>> {
    let key = period.key(now);
    let journal = Journal::new(self.db);

    if journal
      .has_reference(account_id, TransactionType::PerformanceBonus, &key)
      .await?
    {
      return Ok(None);
    }

    let activity = journal
      .activity_since(
        account_id,
        &[TransactionType::StakingPayment, TransactionType::TokenPurchase],
        Currency::Usdt,
        now - period.window(),
      )
      .await?;
    if activity < period.target(rates) {
      return Ok(None);
    }

    let bonus = period.bonus(rates);
    let posting = Posting {
      tx_type: TransactionType::PerformanceBonus,
      description: Some(format!("Performance bonus for {key}")),
      reference_id: Some(key),
      reference_type: Some("period".into()),
    };
    super::Account::new(self.db, self.locks)
      .credit(account_id, Currency::Usdt, bonus, posting, now)
      .await?;

    Ok(Some(Credit { account_id, level: None, amount: bonus }))
  }

  pub async fn stats(&self, account_id: i32) -> Result<ReferralStats> {
    let edges = referral::Entity::find()
      .filter(referral::Column::ReferrerId.eq(account_id))
      .all(self.db)
      .await?;

    let mut levels: Vec<LevelStats> = (1..=MAX_REFERRAL_DEPTH as i32)
      .map(|level| LevelStats {
        level,
        count: 0,
        total_earned: Decimal::ZERO,
      })
      .collect();
    for edge in &edges {
      if let Some(stats) = levels.get_mut((edge.level - 1) as usize) {
        stats.count += 1;
        stats.total_earned =
          ledger::add(stats.total_earned, edge.total_earned);
      }
    }

    Ok(ReferralStats {
      direct_count: edges.iter().filter(|edge| edge.is_direct()).count(),
      network_size: edges.len(),
      total_earned: ledger::sum(edges.iter().map(|edge| edge.total_earned)),
      levels,
    })
  }

  /// Down-line edges, optionally narrowed to one level.
  pub async fn network(
    &self,
    account_id: i32,
    level: Option<i32>,
  ) -> Result<Vec<referral::Model>> {
    let mut query = referral::Entity::find()
      .filter(referral::Column::ReferrerId.eq(account_id));
    if let Some(level) = level {
      query = query.filter(referral::Column::Level.eq(level));
    }
    Ok(query.order_by_asc(referral::Column::Level).all(self.db).await?)
  }

  async fn account_by_code(
    &self,
    code: &str,
  ) -> Result<Option<account::Model>> {
    Ok(
      account::Entity::find()
        .filter(account::Column::ReferralCode.eq(code))
        .one(self.db)
        .await?,
    )
  }

  async fn edge(
    &self,
    referrer_id: i32,
    referred_id: i32,
  ) -> Result<Option<referral::Model>> {
    Ok(
      referral::Entity::find()
        .filter(referral::Column::ReferrerId.eq(referrer_id))
        .filter(referral::Column::ReferredId.eq(referred_id))
        .one(self.db)
        .await?,
    )
  }

  #[allow(clippy::too_many_arguments)]
  async fn journal_bonus<C: ConnectionTrait>(
    &self,
    conn: &C,
    account_id: i32,
    tx_type: TransactionType,
    amount: Decimal,
    before: Decimal,
    after: Decimal,
    description: String,
    investor_id: i32,
    now: DateTime,
  ) -> Result<()> {
    use crate::entity::{TransactionStatus, transaction};

    transaction::ActiveModel {
      id: NotSet,
      account_id: Set(account_id),
      tx_type: Set(tx_type),
      amount: Set(amount),
      currency: Set(Currency::Usdt),
      status: Set(TransactionStatus::Completed),
      description: Set(Some(description)),
      reference_id: Set(Some(investor_id.to_string())),
      reference_type: Set(Some("account".into())),
      tx_hash: Set(None),
      block_number: Set(None),
      exchange_rate: Set(None),
      balance_before: Set(Some(before)),
      balance_after: Set(Some(after)),
      created_at: Set(now),
    }
    .insert(conn)
    .await?;
    Ok(())
  }
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct LevelStats {
  pub level: i32,
  pub count: usize,
  pub total_earned: Decimal,
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct ReferralStats {
  pub direct_count: usize,
  pub network_size: usize,
  pub total_earned: Decimal,
  pub levels: Vec<LevelStats>,
}

#[cfg(test)]
mod tests {
  use rust_decimal_macros::dec;

  use super::*;
  use crate::{
    entity::{TransactionStatus, transaction},
    sv::{
      account::{Account, NewAccount},
      test_utils::test_db,
    },
  };

  async fn register(
    accounts: &Account<'_>,
    email: &str,
    referred_by: Option<String>,
    now: DateTime,
  ) -> account::Model {
    accounts
      .register(
        NewAccount {
          email: email.into(),
          first_name: email.split('@').next().unwrap().into(),
          last_name: "Green".into(),
          wallet_address: None,
          referred_by,
        },
        &Rates::default(),
        now,
      )
      .await
      .unwrap()
  }

  /// A <- B <- C chain, returned root first.
  async fn chain(
    accounts: &Account<'_>,
    now: DateTime,
  ) -> (account::Model, account::Model, account::Model) {
    let a = register(accounts, "a@example.com", None, now).await;
    let b =
      register(accounts, "b@example.com", Some(a.referral_code.clone()), now)
        .await;
    let c =
      register(accounts, "c@example.com", Some(b.referral_code.clone()), now)
        .await;
    (a, b, c)
  }

  #[tokio::test]
  async fn direct_cashback_pays_snapshot_rate() {
    let db = test_db::setup().await;
    let locks = LockRegistry::new();
    let accounts = Account::new(&db, &locks);
    let referrals = Referral::new(&db, &locks);
    let now = Utc::now().naive_utc();

    let (_, b, c) = chain(&accounts, now).await;

    let credit = referrals
      .direct_cashback(c.id, dec!(1000), now)
      .await
      .unwrap()
      .unwrap();
    assert_eq!(credit.account_id, b.id);
    assert_eq!(credit.amount, dec!(100));

    let b = accounts.by_id(b.id).await.unwrap();
    assert_eq!(b.usdt_balance, dec!(100));
    assert_eq!(b.total_earned, dec!(100));

    let edge = referrals.edge(b.id, c.id).await.unwrap().unwrap();
    assert!(edge.is_qualified);
    assert!(edge.qualification_date.is_some());
    assert_eq!(edge.total_invested, dec!(1000));
    assert_eq!(edge.direct_cashback_paid, dec!(100));
  }

  #[tokio::test]
  async fn direct_cashback_without_referrer_is_a_noop() {
    let db = test_db::setup().await;
    let locks = LockRegistry::new();
    let accounts = Account::new(&db, &locks);
    let referrals = Referral::new(&db, &locks);
    let now = Utc::now().naive_utc();

    let solo = register(&accounts, "solo@example.com", None, now).await;
    let credit =
      referrals.direct_cashback(solo.id, dec!(1000), now).await.unwrap();
    assert!(credit.is_none());
  }

  #[tokio::test]
  async fn network_cashback_pays_by_chain_distance() {
    let db = test_db::setup().await;
    let locks = LockRegistry::new();
    let accounts = Account::new(&db, &locks);
    let referrals = Referral::new(&db, &locks);
    let now = Utc::now().naive_utc();

    let (a, b, c) = chain(&accounts, now).await;

    // C invests 1000: B sits one step up and gets the level-2 rate (3%),
    // A sits two steps up and gets the level-3 rate (2%).
    let credits = referrals
      .network_cashback(c.id, dec!(1000), &Rates::default(), now)
      .await
      .unwrap();
    assert_eq!(credits.len(), 2);
    assert_eq!(credits[0], Credit {
      account_id: b.id,
      level: Some(2),
      amount: dec!(30),
    });
    assert_eq!(credits[1], Credit {
      account_id: a.id,
      level: Some(3),
      amount: dec!(20),
    });

    let b = accounts.by_id(b.id).await.unwrap();
    let a = accounts.by_id(a.id).await.unwrap();
    assert_eq!(b.usdt_balance, dec!(30));
    assert_eq!(a.usdt_balance, dec!(20));

    // the indirect A -> C edge was created on the fly and fully booked
    let edge = referrals.edge(a.id, c.id).await.unwrap().unwrap();
    assert_eq!(edge.level, 3);
    assert_eq!(edge.network_cashback_paid, dec!(20));
    assert_eq!(edge.total_earned, dec!(20));
    assert_eq!(edge.total_invested, dec!(1000));
    assert!(edge.is_qualified);
    assert!(edge.qualification_date.is_some());

    // the existing B -> C edge mirrors the investment as well
    let edge = referrals.edge(b.id, c.id).await.unwrap().unwrap();
    assert_eq!(edge.total_invested, dec!(1000));
    assert_eq!(edge.network_cashback_paid, dec!(30));
  }

  #[tokio::test]
  async fn network_cashback_stops_at_max_depth() {
    let db = test_db::setup().await;
    let locks = LockRegistry::new();
    let accounts = Account::new(&db, &locks);
    let referrals = Referral::new(&db, &locks);
    let now = Utc::now().naive_utc();

    let mut code = None;
    let mut ids = vec![];
    for n in 0..7 {
      let account =
        register(&accounts, &format!("u{n}@example.com"), code, now).await;
      code = Some(account.referral_code.clone());
      ids.push(account.id);
    }

    // deepest account invests; only 4 ancestors (levels 2..=5) are paid
    let credits = referrals
      .network_cashback(ids[6], dec!(1000), &Rates::default(), now)
      .await
      .unwrap();
    assert_eq!(credits.len(), 4);
    assert_eq!(
      credits.iter().map(|credit| credit.level).collect::<Vec<_>>(),
      vec![Some(2), Some(3), Some(4), Some(5)],
    );
    assert_eq!(credits[3].amount, dec!(5));
  }

  #[tokio::test]
  async fn universal_cashback_splits_pool_by_holdings() {
    let db = test_db::setup().await;
    let locks = LockRegistry::new();
    let accounts = Account::new(&db, &locks);
    let referrals = Referral::new(&db, &locks);
    let now = Utc::now().naive_utc();

    let mut holders = vec![];
    for (email, balance) in [
      ("h1@example.com", dec!(100)),
      ("h2@example.com", dec!(300)),
      ("h3@example.com", dec!(600)),
    ] {
      let account = register(&accounts, email, None, now).await;
      let posting = Posting {
        tx_type: TransactionType::TokenPurchase,
        description: None,
        reference_id: None,
        reference_type: None,
      };
      accounts
        .credit(account.id, Currency::Gsd, balance, posting, now)
        .await
        .unwrap();
      holders.push(account);
    }

    // holding tokens is the only criterion, deactivation does not exclude
    let mut active: account::ActiveModel =
      accounts.by_id(holders[0].id).await.unwrap().into();
    active.is_active = Set(false);
    active.update(&db).await.unwrap();

    let credits = referrals
      .universal_cashback(dec!(1000), &Rates::default(), now)
      .await
      .unwrap();
    assert_eq!(credits.len(), 3);
    assert_eq!(credits[0].amount, dec!(10));
    assert_eq!(credits[1].amount, dec!(30));
    assert_eq!(credits[2].amount, dec!(60));
  }

  #[tokio::test]
  async fn universal_cashback_with_no_holders_is_empty() {
    let db = test_db::setup().await;
    let locks = LockRegistry::new();
    let referrals = Referral::new(&db, &locks);
    let now = Utc::now().naive_utc();

    let credits = referrals
      .universal_cashback(dec!(1000), &Rates::default(), now)
      .await
      .unwrap();
    assert!(credits.is_empty());
  }

  #[tokio::test]
  async fn performance_cashback_is_idempotent_per_period() {
    let db = test_db::setup().await;
    let locks = LockRegistry::new();
    let accounts = Account::new(&db, &locks);
    let referrals = Referral::new(&db, &locks);
    let now = Utc::now().naive_utc();
    let rates = Rates::default();

    let account = register(&accounts, "whale@example.com", None, now).await;

    // qualifying staking activity inside the weekly window
    transaction::ActiveModel {
      id: NotSet,
      account_id: Set(account.id),
      tx_type: Set(TransactionType::StakingPayment),
      amount: Set(dec!(15000)),
      currency: Set(Currency::Usdt),
      status: Set(TransactionStatus::Completed),
      description: Set(None),
      reference_id: Set(None),
      reference_type: Set(None),
      tx_hash: Set(None),
      block_number: Set(None),
      exchange_rate: Set(None),
      balance_before: Set(None),
      balance_after: Set(None),
      created_at: Set(now - TimeDelta::days(2)),
    }
    .insert(&db)
    .await
    .unwrap();

    let credit = referrals
      .performance_cashback(account.id, BonusPeriod::Weekly, &rates, now)
      .await
      .unwrap()
      .unwrap();
    assert_eq!(credit.amount, rates.weekly_bonus);

    // same period key: no second payout
    let repeat = referrals
      .performance_cashback(account.id, BonusPeriod::Weekly, &rates, now)
      .await
      .unwrap();
    assert!(repeat.is_none());

    // bonus income itself never counts toward the monthly target
    let monthly = referrals
      .performance_cashback(account.id, BonusPeriod::Monthly, &rates, now)
      .await
      .unwrap();
    assert!(monthly.is_none());
  }

  #[tokio::test]
  async fn stats_aggregate_edges_by_level() {
    let db = test_db::setup().await;
    let locks = LockRegistry::new();
    let accounts = Account::new(&db, &locks);
    let referrals = Referral::new(&db, &locks);
    let now = Utc::now().naive_utc();

    let (_, b, c) = chain(&accounts, now).await;
    referrals.direct_cashback(c.id, dec!(1000), now).await.unwrap();

    let stats = referrals.stats(b.id).await.unwrap();
    assert_eq!(stats.direct_count, 1);
    assert_eq!(stats.total_earned, dec!(100));
    assert_eq!(stats.levels[0].count, 1);
  }
}
