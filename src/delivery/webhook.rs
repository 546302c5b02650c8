// src/delivery/webhook.rs
use anyhow::{anyhow, Result};
use reqwest::Client;
use std::time::Duration;

use super::EventSink;
use crate::ingest::types::EventSet;

pub const ENV_WEBHOOK: &str = "DSS_DELIVERY_WEBHOOK";

/// Delay after the `attempt`-th failure: 500 ms doubling, capped at 32 s.
fn backoff(attempt: u8) -> Duration {
    Duration::from_millis(500u64 << attempt.saturating_sub(1).min(6))
}

/// Pushes `{events, apod}` to an HTTP endpoint after every cycle.
#[derive(Clone)]
pub struct WebhookSink {
    url: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl WebhookSink {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: Client::new(),
            timeout: Duration::from_secs(5),
            max_retries: 3,
        }
    }

    pub fn from_env() -> Option<Self> {
        std::env::var(ENV_WEBHOOK)
            .ok()
            .filter(|u| !u.trim().is_empty())
            .map(Self::new)
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }
}

#[async_trait::async_trait]
impl EventSink for WebhookSink {
    async fn deliver(&self, set: &EventSet) -> Result<()> {
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&self.url)
                .timeout(self.timeout)
                .json(set)
                .send()
                .await;

            let err = match res {
                Ok(rsp) => match rsp.error_for_status_ref() {
                    Ok(_) => return Ok(()),
                    Err(e) => anyhow!("webhook HTTP error: {e}"),
                },
                Err(e) => anyhow!("webhook request error: {e}"),
            };
            if attempt >= self.max_retries {
                return Err(err);
            }
            tokio::time::sleep(backoff(attempt)).await;
        }
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}
