use crate::{
  entity::{Currency, TransactionType, transaction},
  ledger,
  prelude::*,
};

/// Read side of the append-only transaction journal. Entries are written by
/// the engines inside their own database transactions; this service only
/// queries and reconciles them.
pub struct Journal<'a> {
  db: &'a DatabaseConnection,
}

pub const BONUS_TYPES: [TransactionType; 4] = [
  TransactionType::ReferralBonus,
  TransactionType::NetworkBonus,
  TransactionType::UniversalBonus,
  TransactionType::PerformanceBonus,
];

#[allow(dead_code)]
impl<'a> Journal<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn for_account(
    &self,
    account_id: i32,
    limit: u64,
  ) -> Result<Vec<transaction::Model>> {
    Ok(
      transaction::Entity::find()
        .filter(transaction::Column::AccountId.eq(account_id))
        .order_by_desc(transaction::Column::CreatedAt)
        .limit(limit)
        .all(self.db)
        .await?,
    )
  }

  /// Referral/network/universal/performance bonuses, newest first.
  pub async fn bonus_history(
    &self,
    account_id: i32,
    limit: u64,
  ) -> Result<Vec<transaction::Model>> {
    Ok(
      transaction::Entity::find()
        .filter(transaction::Column::AccountId.eq(account_id))
        .filter(transaction::Column::TxType.is_in(BONUS_TYPES))
        .order_by_desc(transaction::Column::CreatedAt)
        .limit(limit)
        .all(self.db)
        .await?,
    )
  }

  /// Sum of all entries of one type pointing at one reference, e.g. all
  /// `staking_reward` rows of a stake. Reconciles against
  /// `total_rewards_claimed`.
  pub async fn sum_for_reference(
    &self,
    tx_type: TransactionType,
    reference_type: &str,
    reference_id: &str,
  ) -> Result<Decimal> {
    let entries = transaction::Entity::find()
      .filter(transaction::Column::TxType.eq(tx_type))
      .filter(transaction::Column::ReferenceType.eq(reference_type))
      .filter(transaction::Column::ReferenceId.eq(reference_id))
      .all(self.db)
      .await?;

    Ok(ledger::sum(entries.into_iter().map(|entry| entry.amount)))
  }

  /// Summed activity of the given types and currency since `since`.
  pub async fn activity_since(
    &self,
    account_id: i32,
    types: &[TransactionType],
    currency: Currency,
    since: DateTime,
  ) -> Result<Decimal> {
    let entries = transaction::Entity::find()
      .filter(transaction::Column::AccountId.eq(account_id))
      .filter(transaction::Column::TxType.is_in(types.iter().cloned()))
      .filter(transaction::Column::Currency.eq(currency))
      .filter(transaction::Column::CreatedAt.gte(since))
      .all(self.db)
      .await?;

    Ok(ledger::sum(entries.into_iter().map(|entry| entry.amount)))
  }

  pub async fn has_reference(
    &self,
    account_id: i32,
    tx_type: TransactionType,
    reference_id: &str,
  ) -> Result<bool> {
    let count = transaction::Entity::find()
      .filter(transaction::Column::AccountId.eq(account_id))
      .filter(transaction::Column::TxType.eq(tx_type))
      .filter(transaction::Column::ReferenceId.eq(reference_id))
      .count(self.db)
      .await?;

    Ok(count > 0)
  }
}
