use async_trait::async_trait;
use serde::Serialize;

use crate::prelude::*;

/// Outbound platform events. Delivery is best effort; financial state never
/// depends on a notification going out.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
  PaymentVerified {
    account_id: i32,
    amount: Decimal,
    tokens: Decimal,
    tx_hash: String,
  },
  WithdrawalRequested {
    account_id: i32,
    withdrawal_id: i32,
    amount: Decimal,
    currency: String,
  },
  WithdrawalRefunded {
    account_id: i32,
    withdrawal_id: i32,
    amount: Decimal,
  },
}

#[async_trait]
pub trait Notifier: Send + Sync {
  async fn dispatch(&self, event: &Event) -> anyhow::Result<()>;
}

/// Default sink: structured log lines only.
#[allow(dead_code)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
  async fn dispatch(&self, event: &Event) -> anyhow::Result<()> {
    info!(event = json::to_string(event)?, "notification");
    Ok(())
  }
}

/// Dispatches and swallows delivery failures with a warning.
pub async fn fire(notifier: &dyn Notifier, event: Event) {
  if let Err(err) = notifier.dispatch(&event).await {
    warn!(?event, "notification delivery failed: {err}");
  }
}
