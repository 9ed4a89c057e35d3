use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::prelude::*;

/// Per-row mutexes serializing read-modify-write balance sequences.
///
/// Claims and unlocks hold the stake lock and then the owning account lock;
/// the referral cascade takes each ancestor's account lock independently, so
/// a multi-level credit never needs a global lock.
#[derive(Default)]
pub struct LockRegistry {
  accounts: DashMap<i32, Arc<Mutex<()>>>,
  stakes: DashMap<i32, Arc<Mutex<()>>>,
}

impl LockRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn account(&self, id: i32) -> OwnedMutexGuard<()> {
    Self::acquire(&self.accounts, id).await
  }

  pub async fn stake(&self, id: i32) -> OwnedMutexGuard<()> {
    Self::acquire(&self.stakes, id).await
  }

  async fn acquire(
    map: &DashMap<i32, Arc<Mutex<()>>>,
    id: i32,
  ) -> OwnedMutexGuard<()> {
    let lock = map.entry(id).or_default().clone();
    lock.lock_owned().await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn serializes_same_account() {
    let locks = Arc::new(LockRegistry::new());

    let guard = locks.account(1).await;
    assert!(locks.accounts.get(&1).unwrap().try_lock().is_err());
    drop(guard);
    assert!(locks.accounts.get(&1).unwrap().try_lock().is_ok());
  }

  #[tokio::test]
  async fn distinct_accounts_do_not_contend() {
    let locks = LockRegistry::new();

    let _first = locks.account(1).await;
    let _second = locks.account(2).await;
  }
}
