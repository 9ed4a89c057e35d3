pub mod account;
pub mod package;
pub mod referral;
pub mod setting;
pub mod stake;
pub mod transaction;
pub mod withdrawal;

pub use stake::StakeStatus;
#[allow(unused_imports)]
pub use transaction::{Currency, TransactionStatus, TransactionType};
#[allow(unused_imports)]
pub use withdrawal::WithdrawalStatus;
