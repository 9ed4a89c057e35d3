mod config;
mod entity;
mod error;
mod ledger;
mod locks;
mod prelude;
mod sv;

use std::{env, time::Duration};

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{
  config::Rates,
  locks::LockRegistry,
  prelude::*,
  sv::{Referral, Staking, referral::BonusPeriod, staking},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "greenstake=debug,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let db_url = env::var("DATABASE_URL")
    .unwrap_or_else(|_| "sqlite:greenstake.db?mode=rwc".into());

  info!("Starting GreenStake v{}", env!("CARGO_PKG_VERSION"));

  let db = Database::connect(&db_url).await?;
  migration::Migrator::up(&db, None).await?;
  staking::ensure_default_packages(&db).await?;

  let locks = Arc::new(LockRegistry::new());

  let bonus_db = db.clone();
  let bonus_locks = locks.clone();
  tokio::spawn(async move {
    let mut interval = tokio::time::interval(Duration::from_secs(3600));
    loop {
      interval.tick().await;
      if let Err(err) = run_bonus_sweep(&bonus_db, &bonus_locks).await {
        error!("Bonus sweep failed: {err}");
      }
    }
  });

  let sweep_db = db.clone();
  let sweep_locks = locks.clone();
  tokio::spawn(async move {
    let mut interval = tokio::time::interval(Duration::from_secs(3600));
    loop {
      interval.tick().await;
      if let Err(err) = run_unlock_sweep(&sweep_db, &sweep_locks).await {
        error!("Unlock sweep failed: {err}");
      }
    }
  });

  tokio::signal::ctrl_c().await?;
  info!("Shutting down");
  Ok(())
}

/// Evaluates weekly and monthly performance bonuses for every active
/// account. Period keys in the journal keep repeated sweeps idempotent.
async fn run_bonus_sweep(
  db: &DatabaseConnection,
  locks: &LockRegistry,
) -> Result<()> {
  let rates = Rates::load(db).await?;
  let referrals = Referral::new(db, locks);
  let now = Utc::now().naive_utc();

  let accounts = entity::account::Entity::find()
    .filter(entity::account::Column::IsActive.eq(true))
    .all(db)
    .await?;

  for account in accounts {
    for period in [BonusPeriod::Weekly, BonusPeriod::Monthly] {
      match referrals
        .performance_cashback(account.id, period, &rates, now)
        .await
      {
        Ok(Some(credit)) => {
          info!(
            account_id = account.id,
            ?period,
            %credit.amount,
            "performance bonus paid",
          );
        }
        Ok(None) => {}
        Err(err) => {
          warn!(account_id = account.id, ?period, "bonus failed: {err}");
        }
      }
    }
  }

  Ok(())
}

/// Reports stakes whose lock has fully elapsed. Unlocking stays a
/// user-initiated action; the sweep only surfaces what is claimable.
async fn run_unlock_sweep(
  db: &DatabaseConnection,
  locks: &LockRegistry,
) -> Result<()> {
  let staking = Staking::new(db, locks);
  let now = Utc::now().naive_utc();

  for stake in staking.expired_stakes(now).await? {
    info!(
      stake_id = stake.id,
      account_id = stake.account_id,
      %stake.principal_amount,
      "stake is unlockable",
    );
  }

  Ok(())
}
