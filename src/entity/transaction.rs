use sea_orm::{entity::prelude::*, prelude::Decimal};
use serde::{Deserialize, Serialize};

use super::account;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum TransactionType {
  #[sea_orm(string_value = "staking_payment")]
  #[default]
  StakingPayment,
  #[sea_orm(string_value = "staking_reward")]
  StakingReward,
  #[sea_orm(string_value = "staking_completion")]
  StakingCompletion,
  #[sea_orm(string_value = "referral_bonus")]
  ReferralBonus,
  #[sea_orm(string_value = "network_bonus")]
  NetworkBonus,
  #[sea_orm(string_value = "universal_bonus")]
  UniversalBonus,
  #[sea_orm(string_value = "performance_bonus")]
  PerformanceBonus,
  #[sea_orm(string_value = "token_purchase")]
  TokenPurchase,
  #[sea_orm(string_value = "token_conversion")]
  TokenConversion,
  #[sea_orm(string_value = "withdrawal_request")]
  WithdrawalRequest,
  #[sea_orm(string_value = "refund")]
  Refund,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum TransactionStatus {
  #[sea_orm(string_value = "pending")]
  #[default]
  Pending,
  #[sea_orm(string_value = "processing")]
  Processing,
  #[sea_orm(string_value = "completed")]
  Completed,
  #[sea_orm(string_value = "failed")]
  Failed,
  #[sea_orm(string_value = "cancelled")]
  Cancelled,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum Currency {
  /// Platform utility token.
  #[sea_orm(string_value = "GSD")]
  #[default]
  Gsd,
  /// Stable reference currency.
  #[sea_orm(string_value = "USDT")]
  Usdt,
}

/// Journal entry. Immutable once created, except the pending payment intent
/// which moves to completed/failed after oracle verification.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub account_id: i32,
  pub tx_type: TransactionType,
  pub amount: Decimal,
  pub currency: Currency,
  pub status: TransactionStatus,
  pub description: Option<String>,
  pub reference_id: Option<String>,
  pub reference_type: Option<String>,
  pub tx_hash: Option<String>,
  pub block_number: Option<i32>,
  pub exchange_rate: Option<Decimal>,
  /// Best-effort balance snapshots, not a strict audit guarantee.
  pub balance_before: Option<Decimal>,
  pub balance_after: Option<Decimal>,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "account::Entity",
    from = "Column::AccountId",
    to = "account::Column::Id"
  )]
  Account,
}

impl Related<account::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Account.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
  pub fn is_pending(&self) -> bool {
    matches!(
      self.status,
      TransactionStatus::Pending | TransactionStatus::Processing
    )
  }
}
