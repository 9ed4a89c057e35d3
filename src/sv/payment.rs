use async_trait::async_trait;
use uuid::Uuid;

use crate::{
  config::Rates,
  entity::{
    Currency, TransactionStatus, TransactionType, WithdrawalStatus, account,
    transaction, withdrawal,
  },
  ledger,
  locks::LockRegistry,
  prelude::*,
  sv::notify::{Event, Notifier, fire},
};

/// On-chain payment confirmation source. Production wires this to a block
/// explorer; tests substitute a canned lookup.
#[async_trait]
pub trait PaymentOracle: Send + Sync {
  async fn lookup(&self, tx_hash: &str) -> Result<VerifiedPayment>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedPayment {
  pub amount: Decimal,
  pub block_number: i32,
}

/// Token purchases, conversions and withdrawals.
pub struct Payment<'a> {
  db: &'a DatabaseConnection,
  locks: &'a LockRegistry,
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct Verified {
  pub tokens: Decimal,
  pub new_balance: Decimal,
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct Converted {
  pub usdt: Decimal,
  pub token_balance: Decimal,
  pub usdt_balance: Decimal,
}

/// Tolerated gap between the declared and on-chain amount.
const AMOUNT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

#[allow(dead_code)]
impl<'a> Payment<'a> {
  pub fn new(db: &'a DatabaseConnection, locks: &'a LockRegistry) -> Self {
    Self { db, locks }
  }

  /// Opens a pending purchase intent. Nothing is credited until the
  /// on-chain payment is verified against it.
  pub async fn create_intent(
    &self,
    account_id: i32,
    amount: Decimal,
    now: DateTime,
  ) -> Result<transaction::Model> {
    if amount <= Decimal::ZERO {
      return Err(Error::InvalidAmount(
        "purchase amount must be positive".into(),
      ));
    }
    account::Entity::find_by_id(account_id)
      .one(self.db)
      .await?
      .ok_or(Error::AccountNotFound)?;

    Ok(
      transaction::ActiveModel {
        id: NotSet,
        account_id: Set(account_id),
        tx_type: Set(TransactionType::TokenPurchase),
        amount: Set(amount),
        currency: Set(Currency::Usdt),
        status: Set(TransactionStatus::Pending),
        description: Set(Some("Token purchase intent".into())),
        reference_id: Set(Some(format!("PAY-{}", Uuid::new_v4().simple()))),
        reference_type: Set(Some("payment".into())),
        tx_hash: Set(None),
        block_number: Set(None),
        exchange_rate: Set(None),
        balance_before: Set(None),
        balance_after: Set(None),
        created_at: Set(now),
      }
      .insert(self.db)
      .await?,
    )
  }

  /// Confirms a pending intent against the oracle and credits the tokens.
  /// An amount outside the tolerance fails the call with no partial
  /// credit; the intent stays pending for a corrected retry.
  pub async fn verify_payment(
    &self,
    oracle: &dyn PaymentOracle,
    notifier: &dyn Notifier,
    transaction_id: i32,
    tx_hash: &str,
    rates: &Rates,
    now: DateTime,
  ) -> Result<Verified> {
    let intent = transaction::Entity::find_by_id(transaction_id)
      .one(self.db)
      .await?
      .ok_or(Error::TransactionNotFound)?;
    if !intent.is_pending() {
      return Err(Error::TransactionNotPending);
    }

    let verified = oracle.lookup(tx_hash).await?;
    let gap = ledger::subtract(verified.amount, intent.amount).abs();
    if gap > AMOUNT_TOLERANCE {
      return Err(Error::OracleAmountMismatch {
        expected: intent.amount,
        actual: verified.amount,
      });
    }

    let amount = intent.amount;
    let tokens = ledger::divide(amount, rates.token_price)?;
    let account_id = intent.account_id;

    let _guard = self.locks.account(account_id).await;
    let txn = self.db.begin().await?;

    let account = account::Entity::find_by_id(account_id)
      .one(&txn)
      .await?
      .ok_or(Error::AccountNotFound)?;
    let before = account.token_balance;
    let after = ledger::add(before, tokens);
    let total_invested = ledger::add(account.total_invested, amount);

    let mut active: account::ActiveModel = account.into();
    active.token_balance = Set(after);
    active.total_invested = Set(total_invested);
    active.update(&txn).await?;

    let reference_id = intent.reference_id.clone();
    let mut active: transaction::ActiveModel = intent.into();
    active.status = Set(TransactionStatus::Completed);
    active.tx_hash = Set(Some(tx_hash.to_string()));
    active.block_number = Set(Some(verified.block_number));
    active.exchange_rate = Set(Some(rates.token_price));
    active.update(&txn).await?;

    transaction::ActiveModel {
      id: NotSet,
      account_id: Set(account_id),
      tx_type: Set(TransactionType::TokenPurchase),
      amount: Set(tokens),
      currency: Set(Currency::Gsd),
      status: Set(TransactionStatus::Completed),
      description: Set(Some(format!("Purchased {tokens} tokens for {amount}"))),
      reference_id: Set(reference_id),
      reference_type: Set(Some("payment".into())),
      tx_hash: Set(Some(tx_hash.to_string())),
      block_number: Set(Some(verified.block_number)),
      exchange_rate: Set(Some(rates.token_price)),
      balance_before: Set(Some(before)),
      balance_after: Set(Some(after)),
      created_at: Set(now),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!(account_id, %tokens, tx_hash, "payment verified");

    fire(notifier, Event::PaymentVerified {
      account_id,
      amount,
      tokens,
      tx_hash: tx_hash.to_string(),
    })
    .await;

    Ok(Verified { tokens, new_balance: after })
  }

  /// Converts tokens back to USDT at the current price.
  pub async fn convert_tokens(
    &self,
    account_id: i32,
    tokens: Decimal,
    rates: &Rates,
    now: DateTime,
  ) -> Result<Converted> {
    if tokens <= Decimal::ZERO {
      return Err(Error::InvalidAmount(
        "conversion amount must be positive".into(),
      ));
    }

    let _guard = self.locks.account(account_id).await;
    let txn = self.db.begin().await?;

    let account = account::Entity::find_by_id(account_id)
      .one(&txn)
      .await?
      .ok_or(Error::AccountNotFound)?;
    if account.token_balance < tokens {
      return Err(Error::InsufficientBalance);
    }

    let usdt = ledger::multiply(tokens, rates.token_price);
    let token_before = account.token_balance;
    let token_after = ledger::subtract(token_before, tokens);
    let usdt_before = account.usdt_balance;
    let usdt_after = ledger::add(usdt_before, usdt);

    let mut active: account::ActiveModel = account.into();
    active.token_balance = Set(token_after);
    active.usdt_balance = Set(usdt_after);
    active.update(&txn).await?;

    transaction::ActiveModel {
      id: NotSet,
      account_id: Set(account_id),
      tx_type: Set(TransactionType::TokenConversion),
      amount: Set(tokens),
      currency: Set(Currency::Gsd),
      status: Set(TransactionStatus::Completed),
      description: Set(Some(format!("Converted {tokens} tokens to {usdt}"))),
      reference_id: Set(None),
      reference_type: Set(None),
      tx_hash: Set(None),
      block_number: Set(None),
      exchange_rate: Set(Some(rates.token_price)),
      balance_before: Set(Some(token_before)),
      balance_after: Set(Some(token_after)),
      created_at: Set(now),
    }
    .insert(&txn)
    .await?;

    transaction::ActiveModel {
      id: NotSet,
      account_id: Set(account_id),
      tx_type: Set(TransactionType::TokenConversion),
      amount: Set(usdt),
      currency: Set(Currency::Usdt),
      status: Set(TransactionStatus::Completed),
      description: Set(Some(format!("Received {usdt} from token conversion"))),
      reference_id: Set(None),
      reference_type: Set(None),
      tx_hash: Set(None),
      block_number: Set(None),
      exchange_rate: Set(Some(ledger::divide(Decimal::ONE, rates.token_price)?)),
      balance_before: Set(Some(usdt_before)),
      balance_after: Set(Some(usdt_after)),
      created_at: Set(now),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    Ok(Converted {
      usdt,
      token_balance: token_after,
      usdt_balance: usdt_after,
    })
  }

  /// Debits the balance immediately and parks the request for manual
  /// processing. Funds re-enter only through [`Self::refund_withdrawal`].
  #[allow(clippy::too_many_arguments)]
  pub async fn request_withdrawal(
    &self,
    notifier: &dyn Notifier,
    account_id: i32,
    amount: Decimal,
    currency: Currency,
    wallet_address: String,
    network: String,
    now: DateTime,
  ) -> Result<withdrawal::Model> {
    if amount <= Decimal::ZERO {
      return Err(Error::InvalidAmount(
        "withdrawal amount must be positive".into(),
      ));
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
    let total_withdrawn = ledger::add(account.total_withdrawn, amount);

    let mut active: account::ActiveModel = account.into();
    match currency {
      Currency::Gsd => active.token_balance = Set(after),
      Currency::Usdt => active.usdt_balance = Set(after),
    }
    active.total_withdrawn = Set(total_withdrawn);
    active.update(&txn).await?;

    let request = withdrawal::ActiveModel {
      id: NotSet,
      account_id: Set(account_id),
      amount: Set(amount),
      currency: Set(currency),
      wallet_address: Set(wallet_address),
      network: Set(network),
      withdrawal_fee: Set(Decimal::ZERO),
      net_amount: Set(amount),
      status: Set(WithdrawalStatus::Pending),
      balance_before: Set(before),
      balance_after: Set(after),
      processed_at: Set(None),
      created_at: Set(now),
    }
    .insert(&txn)
    .await?;

    transaction::ActiveModel {
      id: NotSet,
      account_id: Set(account_id),
      tx_type: Set(TransactionType::WithdrawalRequest),
      amount: Set(amount),
      currency: Set(currency),
      status: Set(TransactionStatus::Pending),
      description: Set(Some("Withdrawal requested".into())),
      reference_id: Set(Some(request.id.to_string())),
      reference_type: Set(Some("withdrawal".into())),
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
    info!(account_id, withdrawal_id = request.id, %amount, "withdrawal requested");

    fire(notifier, Event::WithdrawalRequested {
      account_id,
      withdrawal_id: request.id,
      amount,
      currency: format!("{currency:?}").to_uppercase(),
    })
    .await;

    Ok(request)
  }

  /// Rejects a pending withdrawal and returns the funds.
  pub async fn refund_withdrawal(
    &self,
    notifier: &dyn Notifier,
    withdrawal_id: i32,
    now: DateTime,
  ) -> Result<withdrawal::Model> {
    let request = withdrawal::Entity::find_by_id(withdrawal_id)
      .one(self.db)
      .await?
      .ok_or(Error::WithdrawalNotFound)?;
    if request.status != WithdrawalStatus::Pending {
      return Err(Error::InvalidArgs("withdrawal is not pending".into()));
    }

    let account_id = request.account_id;
    let amount = request.amount;
    let currency = request.currency;

    let _guard = self.locks.account(account_id).await;
    let txn = self.db.begin().await?;

    let account = account::Entity::find_by_id(account_id)
      .one(&txn)
      .await?
      .ok_or(Error::AccountNotFound)?;
    let before = account.balance(currency);
    let after = ledger::add(before, amount);
    let total_withdrawn = ledger::subtract(account.total_withdrawn, amount);

    let mut active: account::ActiveModel = account.into();
    match currency {
      Currency::Gsd => active.token_balance = Set(after),
      Currency::Usdt => active.usdt_balance = Set(after),
    }
    active.total_withdrawn = Set(total_withdrawn);
    active.update(&txn).await?;

    let mut active: withdrawal::ActiveModel = request.into();
    active.status = Set(WithdrawalStatus::Rejected);
    active.processed_at = Set(Some(now));
    let request = active.update(&txn).await?;

    transaction::ActiveModel {
      id: NotSet,
      account_id: Set(account_id),
      tx_type: Set(TransactionType::Refund),
      amount: Set(amount),
      currency: Set(currency),
      status: Set(TransactionStatus::Completed),
      description: Set(Some("Withdrawal refunded".into())),
      reference_id: Set(Some(withdrawal_id.to_string())),
      reference_type: Set(Some("withdrawal".into())),
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
    info!(account_id, withdrawal_id, %amount, "withdrawal refunded");

    fire(notifier, Event::WithdrawalRefunded {
      account_id,
      withdrawal_id,
      amount,
    })
    .await;

    Ok(request)
  }

  pub async fn withdrawals_for(
    &self,
    account_id: i32,
  ) -> Result<Vec<withdrawal::Model>> {
    Ok(
      withdrawal::Entity::find()
        .filter(withdrawal::Column::AccountId.eq(account_id))
        .order_by_desc(withdrawal::Column::CreatedAt)
        .all(self.db)
        .await?,
    )
  }
}
