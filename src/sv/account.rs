use uuid::Uuid;

use crate::{
  config::Rates,
  entity::{Currency, TransactionStatus, TransactionType, account, transaction},
  ledger,
  locks::LockRegistry,
  prelude::*,
  sv::referral::Referral,
};

pub struct Account<'a> {
  db: &'a DatabaseConnection,
  locks: &'a LockRegistry,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
  pub email: String,
  pub first_name: String,
  pub last_name: String,
  pub wallet_address: Option<String>,
  /// Referral code of the inviting account, if any.
  pub referred_by: Option<String>,
}

/// Journal context for a plain credit/debit.
#[derive(Debug, Clone)]
pub struct Posting {
  pub tx_type: TransactionType,
  pub description: Option<String>,
  pub reference_id: Option<String>,
  pub reference_type: Option<String>,
}

#[allow(dead_code)]
impl<'a> Account<'a> {
  pub fn new(db: &'a DatabaseConnection, locks: &'a LockRegistry) -> Self {
    Self { db, locks }
  }

  /// Creates an account with a fresh referral code. An invalid referral
  /// code is rejected up front; a valid one links the new account into the
  /// referrer's up-line with a level-1 edge.
  pub async fn register(
    &self,
    new: NewAccount,
    rates: &Rates,
    now: DateTime,
  ) -> Result<account::Model> {
    let referrer = match &new.referred_by {
      Some(code) => {
        Some(self.by_code(code).await?.ok_or(Error::ReferralNotFound)?)
      }
      None => None,
    };

    let code = self.generate_code().await?;

    let account = account::ActiveModel {
      id: NotSet,
      email: Set(new.email),
      first_name: Set(new.first_name),
      last_name: Set(new.last_name),
      wallet_address: Set(new.wallet_address),
      referral_code: Set(code),
      referred_by: Set(new.referred_by),
      token_balance: Set(Decimal::ZERO),
      usdt_balance: Set(Decimal::ZERO),
      total_invested: Set(Decimal::ZERO),
      total_earned: Set(Decimal::ZERO),
      total_withdrawn: Set(Decimal::ZERO),
      is_active: Set(true),
      created_at: Set(now),
    }
    .insert(self.db)
    .await?;

    if let Some(referrer) = referrer {
      Referral::new(self.db, self.locks)
        .register_edge(&referrer, &account, rates, now)
        .await?;
    }

    Ok(account)
  }

  pub async fn by_id(&self, id: i32) -> Result<account::Model> {
    account::Entity::find_by_id(id)
      .one(self.db)
      .await?
      .ok_or(Error::AccountNotFound)
  }

  pub async fn by_code(&self, code: &str) -> Result<Option<account::Model>> {
    Ok(
      account::Entity::find()
        .filter(account::Column::ReferralCode.eq(code))
        .one(self.db)
        .await?,
    )
  }

  pub async fn by_email(&self, email: &str) -> Result<Option<account::Model>> {
    Ok(
      account::Entity::find()
        .filter(account::Column::Email.eq(email))
        .one(self.db)
        .await?,
    )
  }

  /// Credits a balance and journals the posting in the same transaction.
  /// Returns the new balance.
  pub async fn credit(
    &self,
    account_id: i32,
    currency: Currency,
    amount: Decimal,
    posting: Posting,
    now: DateTime,
  ) -> Result<Decimal> {
    if amount <= Decimal::ZERO {
      return Err(Error::InvalidAmount(
        "credit amount must be positive".into(),
      ));
    }

    let _guard = self.locks.account(account_id).await;
    let txn = self.db.begin().await?;

    let account = account::Entity::find_by_id(account_id)
      .one(&txn)
      .await?
      .ok_or(Error::AccountNotFound)?;

    let before = account.balance(currency);
    let after = ledger::add(before, amount);
    self.apply_balance(&txn, account, currency, after).await?;
    Self::journal(&txn, account_id, currency, amount, before, after, posting, now)
      .await?;

    txn.commit().await?;
    Ok(after)
  }

  /// Debits a balance, failing with `InsufficientBalance` before any
  /// mutation. Returns the new balance.
  pub async fn debit(
    &self,
    account_id: i32,
    currency: Currency,
    amount: Decimal,
    posting: Posting,
    now: DateTime,
  ) -> Result<Decimal> {
    if amount <= Decimal::ZERO {
      return Err(Error::InvalidAmount("debit amount must be positive".into()));
    }

    let _guard = self.locks.account(account_id).await;
    let txn = self.db.begin().await?;

    let account = account::Entity::find_by_id(account_id)
      .one(&txn)
      .await?
      .ok_or(Error::AccountNotFound)?;

    let before = account.balance(currency);
    if before < amount {
      return Err(Error::InsufficientBalance);
    }

    let after = ledger::subtract(before, amount);
    self.apply_balance(&txn, account, currency, after).await?;
    Self::journal(&txn, account_id, currency, amount, before, after, posting, now)
      .await?;

    txn.commit().await?;
    Ok(after)
  }

  async fn apply_balance<C: ConnectionTrait>(
    &self,
    conn: &C,
    account: account::Model,
    currency: Currency,
    balance: Decimal,
  ) -> Result<()> {
    let mut active: account::ActiveModel = account.into();
    match currency {
      Currency::Gsd => active.token_balance = Set(balance),
      Currency::Usdt => active.usdt_balance = Set(balance),
    }
    active.update(conn).await?;
    Ok(())
  }

  #[allow(clippy::too_many_arguments)]
  async fn journal<C: ConnectionTrait>(
    conn: &C,
    account_id: i32,
    currency: Currency,
    amount: Decimal,
    before: Decimal,
    after: Decimal,
    posting: Posting,
    now: DateTime,
  ) -> Result<()> {
    transaction::ActiveModel {
      id: NotSet,
      account_id: Set(account_id),
      tx_type: Set(posting.tx_type),
      amount: Set(amount),
      currency: Set(currency),
      status: Set(TransactionStatus::Completed),
      description: Set(posting.description),
      reference_id: Set(posting.reference_id),
      reference_type: Set(posting.reference_type),
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

  async fn generate_code(&self) -> Result<String> {
    loop {
      let code = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
      if self.by_code(&code).await?.is_none() {
        return Ok(code);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use rust_decimal_macros::dec;

  use super::*;
  use crate::sv::test_utils::test_db;

  fn posting(tx_type: TransactionType) -> Posting {
    Posting {
      tx_type,
      description: Some("test posting".into()),
      reference_id: None,
      reference_type: None,
    }
  }

  #[tokio::test]
  async fn register_generates_unique_code() {
    let db = test_db::setup().await;
    let locks = LockRegistry::new();
    let accounts = Account::new(&db, &locks);
    let now = Utc::now().naive_utc();

    let alice = accounts
      .register(
        NewAccount {
          email: "alice@example.com".into(),
          first_name: "Alice".into(),
          last_name: "Green".into(),
          wallet_address: None,
          referred_by: None,
        },
        &Rates::default(),
        now,
      )
      .await
      .unwrap();

    assert_eq!(alice.referral_code.len(), 8);
    assert_eq!(alice.token_balance, Decimal::ZERO);
    assert!(alice.referred_by.is_none());
  }

  #[tokio::test]
  async fn register_rejects_unknown_referral_code() {
    let db = test_db::setup().await;
    let locks = LockRegistry::new();
    let accounts = Account::new(&db, &locks);
    let now = Utc::now().naive_utc();

    let result = accounts
      .register(
        NewAccount {
          email: "bob@example.com".into(),
          first_name: "Bob".into(),
          last_name: "Green".into(),
          wallet_address: None,
          referred_by: Some("NOPE1234".into()),
        },
        &Rates::default(),
        now,
      )
      .await;

    assert!(matches!(result, Err(Error::ReferralNotFound)));
  }

  #[tokio::test]
  async fn credit_and_debit_round_trip() {
    let db = test_db::setup().await;
    let locks = LockRegistry::new();
    let accounts = Account::new(&db, &locks);
    let now = Utc::now().naive_utc();

    let account = accounts
      .register(
        NewAccount {
          email: "carol@example.com".into(),
          first_name: "Carol".into(),
          last_name: "Green".into(),
          wallet_address: None,
          referred_by: None,
        },
        &Rates::default(),
        now,
      )
      .await
      .unwrap();

    let balance = accounts
      .credit(
        account.id,
        Currency::Usdt,
        dec!(100),
        posting(TransactionType::UniversalBonus),
        now,
      )
      .await
      .unwrap();
    assert_eq!(balance, dec!(100));

    let balance = accounts
      .debit(
        account.id,
        Currency::Usdt,
        dec!(40),
        posting(TransactionType::WithdrawalRequest),
        now,
      )
      .await
      .unwrap();
    assert_eq!(balance, dec!(60));

    let result = accounts
      .debit(
        account.id,
        Currency::Usdt,
        dec!(1000),
        posting(TransactionType::WithdrawalRequest),
        now,
      )
      .await;
    assert!(matches!(result, Err(Error::InsufficientBalance)));

    // the failed debit must not have touched the balance
    let account = accounts.by_id(account.id).await.unwrap();
    assert_eq!(account.usdt_balance, dec!(60));
  }
}
