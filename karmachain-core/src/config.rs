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

//! KarmaChain configuration

use crate::error::KarmaResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for the KarmaChain core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KarmaChainConfig {
    /// Graph analysis bounds
    pub graph: GraphConfig,

    /// Prediction engine settings
    pub prediction: PredictionConfig,

    /// Days of inactivity before an open relationship expires
    pub expiry_horizon_days: u32,

    /// Context weights file (JSON), loaded at start and on explicit reload
    pub context_weights_path: Option<PathBuf>,

    /// Outbound signal bridge
    pub bridge: BridgeConfig,
}

impl Default for KarmaChainConfig {
    fn default() -> Self {
        Self {
            graph: GraphConfig::default(),
            prediction: PredictionConfig::default(),
            expiry_horizon_days: 90,
            context_weights_path: None,
            bridge: BridgeConfig::default(),
        }
    }
}

impl KarmaChainConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> KarmaResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}

/// Bounds for the graph engines. Iteration and size caps keep the
/// latency contract achievable on pathological scopes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Hard cap on centrality power iterations
    pub centrality_iteration_cap: usize,

    /// Graphs at or below this node count iterate to convergence
    pub centrality_exact_threshold: usize,

    /// Community detection refuses graphs above this node count
    /// unless the caller passes an explicit override
    pub community_node_ceiling: usize,

    /// Include expired relationships when building graphs
    pub include_expired: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            centrality_iteration_cap: 100,
            centrality_exact_threshold: 64,
            community_node_ceiling: 5_000,
            include_expired: false,
        }
    }
}

/// Base multipliers over the four Purushartha axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseWeights {
    pub dharma: f64,
    pub artha: f64,
    pub kama: f64,
    pub moksha: f64,
}

impl Default for BaseWeights {
    fn default() -> Self {
        Self {
            dharma: 1.0,
            artha: 1.0,
            kama: 1.0,
            moksha: 1.0,
        }
    }
}

/// Penalty coefficients for the prediction confidence score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidencePenalties {
    /// Scales the 1/(1+n) history-sparsity penalty
    pub sparsity: f64,
    /// Flat penalty when centrality did not converge
    pub convergence: f64,
    /// Scales the (1 - overlap) context-distance penalty
    pub context: f64,
}

impl Default for ConfidencePenalties {
    fn default() -> Self {
        Self {
            sparsity: 0.5,
            convergence: 0.15,
            context: 0.25,
        }
    }
}

/// Prediction engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Projection horizon in periods
    pub horizon: u32,

    /// Value returned for state-action keys absent from the weight table
    pub default_q: f64,

    /// Base Purushartha weights before context multipliers
    pub base_weights: BaseWeights,

    /// Confidence penalty coefficients
    pub penalties: ConfidencePenalties,

    /// Upper bound (exclusive of zero, inclusive at the top) for any
    /// context multiplier
    pub max_context_multiplier: f64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            horizon: 30,
            default_q: 0.0,
            base_weights: BaseWeights::default(),
            penalties: ConfidencePenalties::default(),
            max_context_multiplier: 10.0,
        }
    }
}

/// Signal bridge settings for forwarding karmic feedback to InsightFlow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub endpoint: String,
    pub retry_attempts: u32,
    pub timeout_secs: u64,
    pub enabled: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8001/api/v1/insightflow/receive".to_string(),
            retry_attempts: 3,
            timeout_secs: 10,
            enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KarmaError;

    #[test]
    fn test_defaults() {
        let cfg = KarmaChainConfig::default();
        assert_eq!(cfg.graph.centrality_iteration_cap, 100);
        assert_eq!(cfg.prediction.horizon, 30);
        assert_eq!(cfg.prediction.base_weights, BaseWeights::default());
        assert_eq!(cfg.expiry_horizon_days, 90);
        assert!(cfg.bridge.enabled);
    }

    #[test]
    fn test_toml_round_trip() {
        let cfg = KarmaChainConfig::default();
        let raw = toml::to_string(&cfg).unwrap();
        let back: KarmaChainConfig = toml::from_str(&raw).unwrap();
        assert_eq!(back.graph.community_node_ceiling, cfg.graph.community_node_ceiling);
        assert_eq!(back.prediction.max_context_multiplier, cfg.prediction.max_context_multiplier);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let raw = r#"
            expiry_horizon_days = 30

            [graph]
            centrality_iteration_cap = 10
        "#;
        let cfg: KarmaChainConfig = toml::from_str(raw).unwrap();
        assert_eq!(cfg.expiry_horizon_days, 30);
        assert_eq!(cfg.graph.centrality_iteration_cap, 10);
        assert_eq!(cfg.graph.community_node_ceiling, 5_000);
        assert_eq!(cfg.prediction.horizon, 30);
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
                expiry_horizon_days = 45

                [prediction]
                horizon = 14
            "#
        )
        .unwrap();

        let cfg = KarmaChainConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.expiry_horizon_days, 45);
        assert_eq!(cfg.prediction.horizon, 14);

        let err = KarmaChainConfig::from_file("/nonexistent/karmachain.toml");
        assert!(matches!(err, Err(KarmaError::Io(_))));
    }
}
