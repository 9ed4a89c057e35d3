use crate::{
  config::Rates,
  entity::{
    Currency, StakeStatus, TransactionStatus, TransactionType, account,
    package, stake, transaction,
  },
  ledger,
  locks::LockRegistry,
  prelude::*,
  sv::Referral,
};

/// Time-locked deposit engine. Accrual is a pure function of the stake row
/// and the clock, so reading rewards never mutates anything and repeated
/// claims for the same instant settle to zero.
pub struct Staking<'a> {
  db: &'a DatabaseConnection,
  locks: &'a LockRegistry,
}

/// Snapshot of a stake's earnings at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Accrual {
  pub days_elapsed: i64,
  pub days_remaining: i64,
  pub completion_percentage: Decimal,
  pub total_earned: Decimal,
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct Claimed {
  pub amount: Decimal,
  pub new_balance: Decimal,
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct Unlocked {
  pub returned_principal: Decimal,
  pub final_rewards: Decimal,
  pub new_balance: Decimal,
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
  pub tokens: Decimal,
  pub daily_reward: Decimal,
  pub total_reward: Decimal,
  pub apy: Decimal,
}

#[allow(dead_code)]
impl<'a> Staking<'a> {
  pub fn new(db: &'a DatabaseConnection, locks: &'a LockRegistry) -> Self {
    Self { db, locks }
  }

  /// Earnings as of `now`, from whole elapsed days capped at the lock
  /// period. Never reads or writes the database.
  pub fn accrue(stake: &stake::Model, now: DateTime) -> Result<Accrual> {
    let lock = stake.lock_period_days as i64;
    let days = (now - stake.start_date).num_days().clamp(0, lock);

    let total_earned = ledger::multiply(
      stake.daily_reward_amount,
      Decimal::from(days),
    );
    let completion_percentage = if lock > 0 {
      ledger::divide(
        ledger::multiply(Decimal::from(days), Decimal::ONE_HUNDRED),
        Decimal::from(lock),
      )?
      .round_dp(2)
    } else {
      Decimal::ONE_HUNDRED
    };

    Ok(Accrual {
      days_elapsed: days,
      days_remaining: lock - days,
      completion_percentage,
      total_earned,
    })
  }

  /// Opens a stake against an active package, snapshotting the package
  /// terms onto the row, then runs the referral cascade. The cascade is
  /// best effort: the stake stands even if every commission fails.
  pub async fn create_stake(
    &self,
    account_id: i32,
    package_id: i32,
    principal: Decimal,
    payment_tx_hash: Option<String>,
    rates: &Rates,
    now: DateTime,
  ) -> Result<stake::Model> {
    let package = package::Entity::find_by_id(package_id)
      .one(self.db)
      .await?
      .ok_or(Error::PackageNotFound)?;
    if !package.is_available() {
      return Err(Error::PackageUnavailable);
    }
    if package.lock_period_days <= 0 {
      return Err(Error::InvalidArgs("package has no lock period".into()));
    }
    if principal < package.min_stake {
      return Err(Error::InvalidAmount(format!(
        "minimum stake for {} is {}",
        package.name, package.min_stake,
      )));
    }
    if let Some(max) = package.max_stake
      && principal > max
    {
      return Err(Error::InvalidAmount(format!(
        "maximum stake for {} is {max}",
        package.name,
      )));
    }

    let daily_reward = package.daily_reward(principal)?;
    let end_date = now + TimeDelta::days(package.lock_period_days as i64);

    let stake = {
      let _guard = self.locks.account(account_id).await;
      let txn = self.db.begin().await?;

      let account = account::Entity::find_by_id(account_id)
        .one(&txn)
        .await?
        .ok_or(Error::AccountNotFound)?;
      let usdt_balance = account.usdt_balance;
      let total_invested = ledger::add(account.total_invested, principal);

      let stake = stake::ActiveModel {
        id: NotSet,
        account_id: Set(account_id),
        package_id: Set(package_id),
        principal_amount: Set(principal),
        daily_yield_percentage: Set(package.daily_yield_percentage),
        daily_reward_amount: Set(daily_reward),
        total_rewards_earned: Set(Decimal::ZERO),
        total_rewards_claimed: Set(Decimal::ZERO),
        start_date: Set(now),
        end_date: Set(end_date),
        unlock_date: Set(end_date),
        last_reward_date: Set(None),
        status: Set(StakeStatus::Active),
        is_locked: Set(true),
        lock_period_days: Set(package.lock_period_days),
        days_elapsed: Set(0),
        days_remaining: Set(package.lock_period_days),
        completion_percentage: Set(Decimal::ZERO),
        payment_tx_hash: Set(payment_tx_hash),
        created_at: Set(now),
      }
      .insert(&txn)
      .await?;

      let mut active: account::ActiveModel = account.into();
      active.total_invested = Set(total_invested);
      active.update(&txn).await?;

      // principal is paid in externally, so the balance is untouched
      transaction::ActiveModel {
        id: NotSet,
        account_id: Set(account_id),
        tx_type: Set(TransactionType::StakingPayment),
        amount: Set(principal),
        currency: Set(Currency::Usdt),
        status: Set(TransactionStatus::Completed),
        description: Set(Some(format!("Staked {principal} in {}", package.name))),
        reference_id: Set(Some(stake.id.to_string())),
        reference_type: Set(Some("staking".into())),
        tx_hash: Set(stake.payment_tx_hash.clone()),
        block_number: Set(None),
        exchange_rate: Set(None),
        balance_before: Set(Some(usdt_balance)),
        balance_after: Set(Some(usdt_balance)),
        created_at: Set(now),
      }
      .insert(&txn)
      .await?;

      txn.commit().await?;
      stake
    };

    info!(stake_id = stake.id, account_id, %principal, "stake created");

    let referrals = Referral::new(self.db, self.locks);
    if let Err(err) = referrals.direct_cashback(account_id, principal, now).await
    {
      warn!(stake_id = stake.id, "direct cashback failed: {err}");
    }
    if let Err(err) =
      referrals.network_cashback(account_id, principal, rates, now).await
    {
      warn!(stake_id = stake.id, "network cashback failed: {err}");
    }

    Ok(stake)
  }

  /// Moves all unclaimed accrual into the token balance.
  pub async fn claim_rewards(
    &self,
    stake_id: i32,
    now: DateTime,
  ) -> Result<Claimed> {
    let _stake_guard = self.locks.stake(stake_id).await;

    let stake = stake::Entity::find_by_id(stake_id)
      .one(self.db)
      .await?
      .filter(|stake| stake.status == StakeStatus::Active)
      .ok_or(Error::StakeNotFound)?;

    let accrual = Self::accrue(&stake, now)?;
    let unclaimed =
      ledger::subtract(accrual.total_earned, stake.total_rewards_claimed);
    if unclaimed <= Decimal::ZERO {
      return Err(Error::NoRewardsAvailable);
    }

    let account_id = stake.account_id;
    let _account_guard = self.locks.account(account_id).await;
    let txn = self.db.begin().await?;

    let account = account::Entity::find_by_id(account_id)
      .one(&txn)
      .await?
      .ok_or(Error::AccountNotFound)?;
    let before = account.token_balance;
    let after = ledger::add(before, unclaimed);
    let total_earned = ledger::add(account.total_earned, unclaimed);

    let mut active: account::ActiveModel = account.into();
    active.token_balance = Set(after);
    active.total_earned = Set(total_earned);
    active.update(&txn).await?;

    self
      .apply_accrual(&txn, &stake, &accrual, accrual.total_earned, Some(now))
      .await?;

    transaction::ActiveModel {
      id: NotSet,
      account_id: Set(account_id),
      tx_type: Set(TransactionType::StakingReward),
      amount: Set(unclaimed),
      currency: Set(Currency::Gsd),
      status: Set(TransactionStatus::Completed),
      description: Set(Some(format!(
        "Staking rewards for {} days",
        accrual.days_elapsed,
      ))),
      reference_id: Set(Some(stake_id.to_string())),
      reference_type: Set(Some("staking".into())),
      tx_hash: Set(None),
      block_number: Set(None),
      exchange_rate: Set(None),
      balance_before: Set(Some(before)),
      balance_after: Set(Some(after)),
      created_at: Set(now),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    debug!(stake_id, %unclaimed, "rewards claimed");

    Ok(Claimed { amount: unclaimed, new_balance: after })
  }

  /// Returns the principal plus any final rewards to the token balance
  /// once the lock has elapsed, and completes the stake. Completed is
  /// terminal.
  pub async fn unlock(&self, stake_id: i32, now: DateTime) -> Result<Unlocked> {
    let _stake_guard = self.locks.stake(stake_id).await;

    let stake = stake::Entity::find_by_id(stake_id)
      .one(self.db)
      .await?
      .filter(|stake| stake.status == StakeStatus::Active)
      .ok_or(Error::StakeNotFound)?;
    if !stake.can_unlock(now) {
      return Err(Error::StillLocked);
    }

    let accrual = Self::accrue(&stake, now)?;
    let final_rewards =
      ledger::subtract(accrual.total_earned, stake.total_rewards_claimed)
        .max(Decimal::ZERO);
    let principal = stake.principal_amount;
    let account_id = stake.account_id;

    let _account_guard = self.locks.account(account_id).await;
    let txn = self.db.begin().await?;

    let account = account::Entity::find_by_id(account_id)
      .one(&txn)
      .await?
      .ok_or(Error::AccountNotFound)?;
    let before = account.token_balance;
    let with_principal = ledger::add(before, principal);
    let after = ledger::add(with_principal, final_rewards);
    let total_earned = ledger::add(account.total_earned, final_rewards);

    let mut active: account::ActiveModel = account.into();
    active.token_balance = Set(after);
    active.total_earned = Set(total_earned);
    active.update(&txn).await?;

    let mut active: stake::ActiveModel = stake.clone().into();
    active.status = Set(StakeStatus::Completed);
    active.is_locked = Set(false);
    active.total_rewards_earned = Set(accrual.total_earned);
    active.total_rewards_claimed = Set(accrual.total_earned);
    active.last_reward_date = Set(Some(now));
    active.days_elapsed = Set(accrual.days_elapsed as i32);
    active.days_remaining = Set(accrual.days_remaining as i32);
    active.completion_percentage = Set(accrual.completion_percentage);
    active.update(&txn).await?;

    transaction::ActiveModel {
      id: NotSet,
      account_id: Set(account_id),
      tx_type: Set(TransactionType::StakingCompletion),
      amount: Set(principal),
      currency: Set(Currency::Gsd),
      status: Set(TransactionStatus::Completed),
      description: Set(Some("Principal returned at unlock".into())),
      reference_id: Set(Some(stake_id.to_string())),
      reference_type: Set(Some("staking".into())),
      tx_hash: Set(None),
      block_number: Set(None),
      exchange_rate: Set(None),
      balance_before: Set(Some(before)),
      balance_after: Set(Some(with_principal)),
      created_at: Set(now),
    }
    .insert(&txn)
    .await?;

    if final_rewards > Decimal::ZERO {
      transaction::ActiveModel {
        id: NotSet,
        account_id: Set(account_id),
        tx_type: Set(TransactionType::StakingReward),
        amount: Set(final_rewards),
        currency: Set(Currency::Gsd),
        status: Set(TransactionStatus::Completed),
        description: Set(Some("Final staking rewards at unlock".into())),
        reference_id: Set(Some(stake_id.to_string())),
        reference_type: Set(Some("staking".into())),
        tx_hash: Set(None),
        block_number: Set(None),
        exchange_rate: Set(None),
        balance_before: Set(Some(with_principal)),
        balance_after: Set(Some(after)),
        created_at: Set(now),
      }
      .insert(&txn)
      .await?;
    }

    txn.commit().await?;
    info!(stake_id, %principal, %final_rewards, "stake unlocked");

    Ok(Unlocked {
      returned_principal: principal,
      final_rewards,
      new_balance: after,
    })
  }

  /// Admin pause/resume/cancel. Completed stakes are untouchable, and
  /// completion only ever happens through [`Self::unlock`].
  pub async fn set_status(
    &self,
    stake_id: i32,
    status: StakeStatus,
  ) -> Result<stake::Model> {
    if status == StakeStatus::Completed {
      return Err(Error::InvalidArgs(
        "stakes complete through unlock only".into(),
      ));
    }

    let _guard = self.locks.stake(stake_id).await;

    let stake = stake::Entity::find_by_id(stake_id)
      .one(self.db)
      .await?
      .ok_or(Error::StakeNotFound)?;
    if stake.status == StakeStatus::Completed {
      return Err(Error::InvalidArgs("stake is already completed".into()));
    }

    let mut active: stake::ActiveModel = stake.into();
    active.status = Set(status);
    Ok(active.update(self.db).await?)
  }

  /// What a USDT amount would earn under a package, without committing.
  pub async fn preview(
    &self,
    package_id: i32,
    usdt_amount: Decimal,
    rates: &Rates,
  ) -> Result<Preview> {
    let package = package::Entity::find_by_id(package_id)
      .one(self.db)
      .await?
      .ok_or(Error::PackageNotFound)?;

    Ok(Preview {
      tokens: ledger::divide(usdt_amount, rates.token_price)?,
      daily_reward: package.daily_reward(usdt_amount)?,
      total_reward: package.total_reward(usdt_amount)?,
      apy: package.apy(),
    })
  }

  pub async fn packages(&self) -> Result<Vec<package::Model>> {
    Ok(
      package::Entity::find()
        .filter(package::Column::IsActive.eq(true))
        .order_by_asc(package::Column::SortOrder)
        .all(self.db)
        .await?,
    )
  }

  pub async fn stakes_for(&self, account_id: i32) -> Result<Vec<stake::Model>> {
    Ok(
      stake::Entity::find()
        .filter(stake::Column::AccountId.eq(account_id))
        .order_by_desc(stake::Column::CreatedAt)
        .all(self.db)
        .await?,
    )
  }

  pub async fn by_id(&self, stake_id: i32) -> Result<stake::Model> {
    stake::Entity::find_by_id(stake_id)
      .one(self.db)
      .await?
      .ok_or(Error::StakeNotFound)
  }

  /// Active stakes whose lock period has fully elapsed.
  pub async fn expired_stakes(&self, now: DateTime) -> Result<Vec<stake::Model>> {
    Ok(
      stake::Entity::find()
        .filter(stake::Column::Status.eq(StakeStatus::Active))
        .filter(stake::Column::EndDate.lt(now))
        .all(self.db)
        .await?,
    )
  }

  async fn apply_accrual<C: ConnectionTrait>(
    &self,
    conn: &C,
    stake: &stake::Model,
    accrual: &Accrual,
    claimed: Decimal,
    last_reward: Option<DateTime>,
  ) -> Result<()> {
    let mut active: stake::ActiveModel = stake.clone().into();
    active.total_rewards_earned = Set(accrual.total_earned);
    active.total_rewards_claimed = Set(claimed);
    active.last_reward_date = Set(last_reward);
    active.days_elapsed = Set(accrual.days_elapsed as i32);
    active.days_remaining = Set(accrual.days_remaining as i32);
    active.completion_percentage = Set(accrual.completion_percentage);
    active.update(conn).await?;
    Ok(())
  }
}

/// Seeds the package catalogue on an empty database.
pub async fn ensure_default_packages(db: &DatabaseConnection) -> Result<()> {
  use rust_decimal_macros::dec;

  if package::Entity::find().count(db).await? > 0 {
    return Ok(());
  }

  let defaults: [(&str, Decimal, Option<Decimal>, Decimal, i32); 5] = [
    ("Green Starter", dec!(100), Some(dec!(999)), dec!(0.05), 1),
    ("Eco Growth", dec!(1000), Some(dec!(4999)), dec!(0.075), 2),
    ("Sustainable Elite", dec!(5000), Some(dec!(19999)), dec!(0.10), 3),
    ("Green Elite", dec!(20000), Some(dec!(100000)), dec!(0.125), 4),
    ("VIP Diamond", dec!(100000), Some(dec!(1000000)), dec!(0.15), 5),
  ];

  let now = Utc::now().naive_utc();
  for (name, min, max, yield_pct, order) in defaults {
    package::ActiveModel {
      id: NotSet,
      name: Set(name.into()),
      description: Set(None),
      min_stake: Set(min),
      max_stake: Set(max),
      daily_yield_percentage: Set(yield_pct),
      lock_period_days: Set(365),
      is_active: Set(true),
      sort_order: Set(order),
      created_at: Set(now),
    }
    .insert(db)
    .await?;
  }

  info!("seeded default staking packages");
  Ok(())
}

#[cfg(test)]
mod tests {
  use rust_decimal_macros::dec;

  use super::*;
  use crate::sv::{
    Journal,
    account::{Account, NewAccount},
    test_utils::test_db,
  };

  async fn setup_account(
    db: &DatabaseConnection,
    locks: &LockRegistry,
    email: &str,
    referred_by: Option<String>,
    now: DateTime,
  ) -> account::Model {
    Account::new(db, locks)
      .register(
        NewAccount {
          email: email.into(),
          first_name: "Test".into(),
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

  fn starter_package_id() -> i32 {
    1
  }

  #[tokio::test]
  async fn accrual_is_linear_and_capped() {
    let db = test_db::setup().await;
    let locks = LockRegistry::new();
    let staking = Staking::new(&db, &locks);
    let now = Utc::now().naive_utc();

    ensure_default_packages(&db).await.unwrap();
    let account =
      setup_account(&db, &locks, "staker@example.com", None, now).await;
    let stake = staking
      .create_stake(
        account.id,
        starter_package_id(),
        dec!(500),
        None,
        &Rates::default(),
        now,
      )
      .await
      .unwrap();

    // 500 at 0.05% per day is exactly 0.25 per day
    assert_eq!(stake.daily_reward_amount, dec!(0.25));

    let at_10 =
      Staking::accrue(&stake, now + TimeDelta::days(10)).unwrap();
    assert_eq!(at_10.total_earned, dec!(2.50000000));
    assert_eq!(at_10.days_elapsed, 10);
    assert_eq!(at_10.days_remaining, 355);
    assert_eq!(at_10.completion_percentage, dec!(2.74));

    // fractional days never count
    let at_10h =
      Staking::accrue(&stake, now + TimeDelta::hours(10)).unwrap();
    assert_eq!(at_10h.total_earned, Decimal::ZERO);

    // accrual is monotonic and caps at the lock period
    let at_end = Staking::accrue(&stake, now + TimeDelta::days(365)).unwrap();
    let past_end =
      Staking::accrue(&stake, now + TimeDelta::days(400)).unwrap();
    assert_eq!(at_end.total_earned, dec!(91.25));
    assert_eq!(past_end.total_earned, at_end.total_earned);
    assert_eq!(past_end.completion_percentage, dec!(100));
  }

  #[tokio::test]
  async fn create_stake_validates_package_bounds() {
    let db = test_db::setup().await;
    let locks = LockRegistry::new();
    let staking = Staking::new(&db, &locks);
    let now = Utc::now().naive_utc();

    ensure_default_packages(&db).await.unwrap();
    let account =
      setup_account(&db, &locks, "bounds@example.com", None, now).await;
    let rates = Rates::default();

    let low = staking
      .create_stake(account.id, starter_package_id(), dec!(50), None, &rates, now)
      .await;
    assert!(matches!(low, Err(Error::InvalidAmount(_))));

    let high = staking
      .create_stake(account.id, starter_package_id(), dec!(5000), None, &rates, now)
      .await;
    assert!(matches!(high, Err(Error::InvalidAmount(_))));

    let missing = staking
      .create_stake(account.id, 999, dec!(500), None, &rates, now)
      .await;
    assert!(matches!(missing, Err(Error::PackageNotFound)));
  }

  #[tokio::test]
  async fn create_stake_journals_and_pays_referrers() {
    let db = test_db::setup().await;
    let locks = LockRegistry::new();
    let staking = Staking::new(&db, &locks);
    let accounts = Account::new(&db, &locks);
    let now = Utc::now().naive_utc();

    ensure_default_packages(&db).await.unwrap();
    let a = setup_account(&db, &locks, "a@example.com", None, now).await;
    let b = setup_account(
      &db,
      &locks,
      "b@example.com",
      Some(a.referral_code.clone()),
      now,
    )
    .await;
    let c = setup_account(
      &db,
      &locks,
      "c@example.com",
      Some(b.referral_code.clone()),
      now,
    )
    .await;

    let stake = staking
      .create_stake(
        c.id,
        2, // Eco Growth
        dec!(1000),
        Some("0xabc".into()),
        &Rates::default(),
        now,
      )
      .await
      .unwrap();

    let c = accounts.by_id(c.id).await.unwrap();
    assert_eq!(c.total_invested, dec!(1000));

    let journal = Journal::new(&db);
    let paid = journal
      .sum_for_reference(
        TransactionType::StakingPayment,
        "staking",
        &stake.id.to_string(),
      )
      .await
      .unwrap();
    assert_eq!(paid, dec!(1000));

    // B gets 10% direct plus the level-2 network rate, A gets level-3
    let b = accounts.by_id(b.id).await.unwrap();
    let a = accounts.by_id(a.id).await.unwrap();
    assert_eq!(b.usdt_balance, dec!(130));
    assert_eq!(a.usdt_balance, dec!(20));
  }

  #[tokio::test]
  async fn claim_is_idempotent_per_day() {
    let db = test_db::setup().await;
    let locks = LockRegistry::new();
    let staking = Staking::new(&db, &locks);
    let accounts = Account::new(&db, &locks);
    let now = Utc::now().naive_utc();

    ensure_default_packages(&db).await.unwrap();
    let account =
      setup_account(&db, &locks, "claim@example.com", None, now).await;
    let stake = staking
      .create_stake(
        account.id,
        starter_package_id(),
        dec!(500),
        None,
        &Rates::default(),
        now,
      )
      .await
      .unwrap();

    let nothing_yet = staking.claim_rewards(stake.id, now).await;
    assert!(matches!(nothing_yet, Err(Error::NoRewardsAvailable)));

    let later = now + TimeDelta::days(10);
    let claimed = staking.claim_rewards(stake.id, later).await.unwrap();
    assert_eq!(claimed.amount, dec!(2.50000000));
    assert_eq!(claimed.new_balance, dec!(2.5));

    // same instant again: everything is already claimed
    let repeat = staking.claim_rewards(stake.id, later).await;
    assert!(matches!(repeat, Err(Error::NoRewardsAvailable)));

    // one more day accrues exactly one daily reward
    let next_day = staking
      .claim_rewards(stake.id, later + TimeDelta::days(1))
      .await
      .unwrap();
    assert_eq!(next_day.amount, dec!(0.25));

    let account = accounts.by_id(account.id).await.unwrap();
    assert_eq!(account.token_balance, dec!(2.75));
    assert_eq!(account.total_earned, dec!(2.75));

    // journal reconciles with the stake counters
    let stake = staking.by_id(stake.id).await.unwrap();
    let journaled = Journal::new(&db)
      .sum_for_reference(
        TransactionType::StakingReward,
        "staking",
        &stake.id.to_string(),
      )
      .await
      .unwrap();
    assert_eq!(journaled, stake.total_rewards_claimed);
  }

  #[tokio::test]
  async fn unlock_respects_the_lock_and_is_terminal() {
    let db = test_db::setup().await;
    let locks = LockRegistry::new();
    let staking = Staking::new(&db, &locks);
    let accounts = Account::new(&db, &locks);
    let now = Utc::now().naive_utc();

    ensure_default_packages(&db).await.unwrap();
    let account =
      setup_account(&db, &locks, "unlock@example.com", None, now).await;
    let stake = staking
      .create_stake(
        account.id,
        starter_package_id(),
        dec!(500),
        None,
        &Rates::default(),
        now,
      )
      .await
      .unwrap();

    let early = staking.unlock(stake.id, now + TimeDelta::days(100)).await;
    assert!(matches!(early, Err(Error::StillLocked)));

    let after_lock = now + TimeDelta::days(365);
    let unlocked = staking.unlock(stake.id, after_lock).await.unwrap();
    assert_eq!(unlocked.returned_principal, dec!(500));
    assert_eq!(unlocked.final_rewards, dec!(91.25));
    assert_eq!(unlocked.new_balance, dec!(591.25));

    // principal and final rewards settle in tokens, same as claims
    let account = accounts.by_id(account.id).await.unwrap();
    assert_eq!(account.token_balance, dec!(591.25));
    assert_eq!(account.usdt_balance, Decimal::ZERO);
    assert_eq!(account.total_earned, dec!(91.25));

    let stake = staking.by_id(stake.id).await.unwrap();
    assert_eq!(stake.status, StakeStatus::Completed);
    assert!(!stake.is_locked);

    // completed stakes cannot be unlocked, claimed or re-statused
    let again = staking.unlock(stake.id, after_lock).await;
    assert!(matches!(again, Err(Error::StakeNotFound)));
    let claim = staking.claim_rewards(stake.id, after_lock).await;
    assert!(matches!(claim, Err(Error::StakeNotFound)));
    let pause = staking.set_status(stake.id, StakeStatus::Paused).await;
    assert!(matches!(pause, Err(Error::InvalidArgs(_))));
  }

  #[tokio::test]
  async fn claim_sees_credits_committed_while_it_waited() {
    use std::time::Duration;

    let db = test_db::setup().await;
    let locks = Arc::new(LockRegistry::new());
    let accounts = Account::new(&db, &locks);
    let now = Utc::now().naive_utc();

    ensure_default_packages(&db).await.unwrap();
    let account =
      setup_account(&db, &locks, "race@example.com", None, now).await;
    let stake = Staking::new(&db, &locks)
      .create_stake(
        account.id,
        starter_package_id(),
        dec!(500),
        None,
        &Rates::default(),
        now,
      )
      .await
      .unwrap();

    // hold the account lock so the claim parks before touching the row
    let guard = locks.account(account.id).await;

    let claim_db = db.clone();
    let claim_locks = locks.clone();
    let stake_id = stake.id;
    let claim = tokio::spawn(async move {
      Staking::new(&claim_db, &claim_locks)
        .claim_rewards(stake_id, now + TimeDelta::days(10))
        .await
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    // a bonus lands on the token balance while the claim is parked
    let mut active: account::ActiveModel =
      accounts.by_id(account.id).await.unwrap().into();
    active.token_balance = Set(dec!(7));
    active.update(&db).await.unwrap();

    drop(guard);
    let claimed = claim.await.unwrap().unwrap();

    // the claim read the row after the credit, so nothing is overwritten
    assert_eq!(claimed.new_balance, dec!(9.5));
    let account = accounts.by_id(account.id).await.unwrap();
    assert_eq!(account.token_balance, dec!(9.5));
  }

  #[tokio::test]
  async fn preview_converts_and_projects() {
    let db = test_db::setup().await;
    let locks = LockRegistry::new();
    let staking = Staking::new(&db, &locks);

    ensure_default_packages(&db).await.unwrap();

    let preview = staking
      .preview(starter_package_id(), dec!(500), &Rates::default())
      .await
      .unwrap();
    assert_eq!(preview.tokens, dec!(50000));
    assert_eq!(preview.daily_reward, dec!(0.25));
    assert_eq!(preview.total_reward, dec!(91.25));
    assert_eq!(preview.apy, dec!(18.25));
  }
}
