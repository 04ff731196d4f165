//! The SMS dispatcher: delivers one message per contact, or simulates
//! delivery when no channel is configured.
//!
//! Every failure mode is converted into a [`DispatchOutcome`] value.
//! Nothing here ever propagates an error back into the ingestion path.

use crate::core::{DispatchOutcome, Notifier};
use crate::notification::twilio::SmsClient;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Dispatches SMS notifications through an optional transport.
pub struct SmsDispatcher {
    client: Option<Arc<dyn SmsClient>>,
    timeout: Duration,
}

impl SmsDispatcher {
    /// A dispatcher with a real transport and a bounded per-send timeout.
    pub fn new(client: Arc<dyn SmsClient>, timeout: Duration) -> Self {
        Self {
            client: Some(client),
            timeout,
        }
    }

    /// The development/offline dispatcher: every message is logged instead
    /// of transmitted. This is designed behavior, not an error.
    pub fn simulated() -> Self {
        Self {
            client: None,
            timeout: DEFAULT_DISPATCH_TIMEOUT,
        }
    }

    pub fn is_simulated(&self) -> bool {
        self.client.is_none()
    }
}

#[async_trait]
impl Notifier for SmsDispatcher {
    async fn notify(&self, contact: &str, message: &str) -> DispatchOutcome {
        let client = match &self.client {
            Some(client) => client,
            None => {
                info!(to = contact, %message, "simulated SMS");
                metrics::counter!("sms_simulated").increment(1);
                return DispatchOutcome::Simulated;
            }
        };

        match timeout(self.timeout, client.send(contact, message)).await {
            Ok(Ok(())) => {
                metrics::counter!("sms_delivered").increment(1);
                DispatchOutcome::Delivered
            }
            Ok(Err(e)) => {
                warn!(to = contact, error = %e, "SMS delivery failed");
                metrics::counter!("sms_failed").increment(1);
                DispatchOutcome::Failed(e.to_string())
            }
            Err(_) => {
                warn!(to = contact, timeout = ?self.timeout, "SMS delivery timed out");
                metrics::counter!("sms_failed").increment(1);
                DispatchOutcome::Failed(format!(
                    "delivery timed out after {}s",
                    self.timeout.as_secs()
                ))
            }
        }
    }
}
