use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Db(#[from] sea_orm::DbErr),

  #[error("account not found")]
  AccountNotFound,
  #[error("staking package not found")]
  PackageNotFound,
  #[error("staking package is not available")]
  PackageUnavailable,
  #[error("active stake not found")]
  StakeNotFound,
  #[error("referrer not found")]
  ReferralNotFound,
  #[error("transaction not found")]
  TransactionNotFound,
  #[error("withdrawal not found")]
  WithdrawalNotFound,

  #[error("invalid amount: {0}")]
  InvalidAmount(String),
  #[error("insufficient balance")]
  InsufficientBalance,
  #[error("no rewards to claim")]
  NoRewardsAvailable,
  #[error("stake is still locked")]
  StillLocked,
  #[error("division by zero")]
  DivisionByZero,
  #[error("transaction is not pending")]
  TransactionNotPending,

  #[error("transaction {0} not found on chain")]
  OracleTxNotFound(String),
  #[error("payment amount mismatch: expected {expected}, got {actual}")]
  OracleAmountMismatch { expected: Decimal, actual: Decimal },

  #[error("invalid arguments: {0}")]
  InvalidArgs(String),
}
