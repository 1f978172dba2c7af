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

use anyhow::Context;
use karmachain_core::{InMemoryStore, KarmaChainConfig};
use karmachain_service::KarmaChainService;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Runs the service against the in-memory store and sweeps expired
/// relationships on an interval. Takes an optional TOML config path as
/// the first argument.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "karmachain=info".into()),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => KarmaChainConfig::from_file(&path)
            .with_context(|| format!("loading config from {}", path))?,
        None => KarmaChainConfig::default(),
    };

    let sweep_days = config.expiry_horizon_days;
    let service = Arc::new(
        KarmaChainService::new(config, Arc::new(InMemoryStore::new()))
            .context("composing service")?,
    );

    info!(expiry_horizon_days = sweep_days, "karmachain started");

    loop {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        let expired = service
            .expire_stale()
            .await
            .map_err(|e| anyhow::anyhow!(e.to_string()))
            .context("expiry sweep")?;
        if expired > 0 {
            info!(expired, "swept expired relationships");
        }
    }
}
