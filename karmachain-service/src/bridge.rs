// Copyright 2025 KarmaChain (https://github.com/karmachain)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! InsightFlow signal bridge
//!
//! Forwards karmic feedback signals to an external InsightFlow endpoint.
//! Delivery is best-effort with bounded retries; a failed or disabled
//! bridge is reported to the caller, never escalated to a panic or a
//! service error, because signal forwarding sits outside the karmic
//! source of truth.

use crate::api::KarmicSignal;
use chrono::Utc;
use karmachain_core::config::BridgeConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Outcome of one forward attempt sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BridgeReport {
    Delivered {
        transmission_id: Uuid,
        attempts: u32,
    },
    /// Bridge disabled by configuration; nothing was sent
    Skipped,
    Failed {
        transmission_id: Uuid,
        attempts: u32,
        last_error: String,
    },
}

/// Current bridge configuration and reachability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeHealth {
    pub enabled: bool,
    pub endpoint: String,
    pub reachable: bool,
}

#[derive(Serialize)]
struct Transmission<'a> {
    transmission_id: Uuid,
    sent_at: chrono::DateTime<Utc>,
    signal: &'a KarmicSignal,
}

pub struct SignalBridge {
    config: BridgeConfig,
    client: reqwest::Client,
}

impl SignalBridge {
    pub fn new(config: BridgeConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Forward one signal, retrying up to the configured attempt count.
    pub async fn forward(&self, signal: &KarmicSignal) -> BridgeReport {
        if !self.config.enabled {
            debug!(user_id = %signal.user_id, "bridge disabled, skipping signal");
            return BridgeReport::Skipped;
        }

        let transmission_id = Uuid::new_v4();
        let mut last_error = String::new();

        for attempt in 1..=self.config.retry_attempts {
            let body = Transmission {
                transmission_id,
                sent_at: Utc::now(),
                signal,
            };

            match self
                .client
                .post(&self.config.endpoint)
                .json(&body)
                .send()
                .await
            {
                Ok(resp) if resp.status().is_success() => {
                    debug!(
                        %transmission_id,
                        attempt,
                        user_id = %signal.user_id,
                        "signal delivered"
                    );
                    return BridgeReport::Delivered {
                        transmission_id,
                        attempts: attempt,
                    };
                }
                Ok(resp) => {
                    last_error = format!("endpoint returned {}", resp.status());
                }
                Err(e) => {
                    last_error = e.to_string();
                }
            }

            if attempt < self.config.retry_attempts {
                tokio::time::sleep(Duration::from_millis(250 * u64::from(attempt))).await;
            }
        }

        warn!(
            %transmission_id,
            attempts = self.config.retry_attempts,
            error = %last_error,
            "signal delivery failed"
        );
        BridgeReport::Failed {
            transmission_id,
            attempts: self.config.retry_attempts,
            last_error,
        }
    }

    /// Forward a batch of signals in order, one report per signal.
    ///
    /// Each signal gets its own transmission and retry budget; one failed
    /// delivery does not stop the rest of the batch.
    pub async fn forward_batch(&self, signals: &[KarmicSignal]) -> Vec<BridgeReport> {
        let mut reports = Vec::with_capacity(signals.len());
        for signal in signals {
            reports.push(self.forward(signal).await);
        }
        reports
    }

    /// Reachability probe against the configured endpoint.
    pub async fn health(&self) -> BridgeHealth {
        let reachable = if self.config.enabled {
            self.client
                .get(&self.config.endpoint)
                .send()
                .await
                .is_ok()
        } else {
            false
        };

        BridgeHealth {
            enabled: self.config.enabled,
            endpoint: self.config.endpoint.clone(),
            reachable,
        }
    }
}
