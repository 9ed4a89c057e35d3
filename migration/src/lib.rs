pub use sea_orm_migration::prelude::*;

mod m20260810_000001_create_accounts;
mod m20260810_000002_create_packages;
mod m20260810_000003_create_stakes;
mod m20260810_000004_create_transactions;
mod m20260810_000005_create_referrals;
mod m20260810_000006_create_withdrawals;
mod m20260810_000007_create_settings;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20260810_000001_create_accounts::Migration),
      Box::new(m20260810_000002_create_packages::Migration),
      Box::new(m20260810_000003_create_stakes::Migration),
      Box::new(m20260810_000004_create_transactions::Migration),
      Box::new(m20260810_000005_create_referrals::Migration),
      Box::new(m20260810_000006_create_withdrawals::Migration),
      Box::new(m20260810_000007_create_settings::Migration),
    ]
  }
}
