//! A client for sending SMS through the Twilio Messages API.

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{error, info};

/// A trait for clients that can send a single SMS.
#[async_trait]
pub trait SmsClient: Send + Sync {
    /// Sends `body` to the `to` number.
    async fn send(&self, to: &str, body: &str) -> Result<()>;
}

/// Twilio credentials, conventionally supplied through the environment.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

impl TwilioConfig {
    /// Reads `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN`, and `TWILIO_FROM`.
    /// Returns `None` when any of them is absent or empty, which selects
    /// simulated delivery.
    pub fn from_env() -> Option<Self> {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Some(Self {
            account_sid: read("TWILIO_ACCOUNT_SID")?,
            auth_token: read("TWILIO_AUTH_TOKEN")?,
            from_number: read("TWILIO_FROM")?,
        })
    }
}

/// An [`SmsClient`] backed by the Twilio REST API.
pub struct TwilioSmsClient {
    config: TwilioConfig,
    http: reqwest::Client,
    api_base: String,
}

impl TwilioSmsClient {
    /// Creates a client with a bounded request timeout. A hung transport
    /// must never hang an ingestion response.
    pub fn new(config: TwilioConfig, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            config,
            http,
            api_base: "https://api.twilio.com".to_string(),
        })
    }

    /// Points the client at a different API host, for tests.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

#[async_trait]
impl SmsClient for TwilioSmsClient {
    async fn send(&self, to: &str, body: &str) -> Result<()> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.config.account_sid
        );
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("To", to),
                ("From", self.config.from_number.as_str()),
                ("Body", body),
            ])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!(to, "Twilio accepted SMS");
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            error!(to, status = %status, body = %text, "Twilio rejected SMS");
            anyhow::bail!("Twilio returned status {}: {}", status, text)
        }
    }
}
