pub mod account;
pub mod journal;
pub mod notify;
pub mod payment;
pub mod referral;
pub mod staking;
#[cfg(test)]
pub mod test_utils;

pub use account::Account;
pub use journal::Journal;
pub use payment::Payment;
pub use referral::Referral;
pub use staking::Staking;
