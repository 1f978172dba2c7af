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

//! Trajectory projection
//!
//! Forward (Agami) karma projection over a fixed horizon. Each period's
//! expected delta combines the user's historical action distribution with
//! the learned state-action values and the effective Purushartha weights;
//! the state band is re-derived every period as projected karma moves, so
//! a user crossing a band boundary mid-horizon picks up that band's values
//! for the remaining periods.

use crate::error::{AgamiError, AgamiResult};
use crate::recommend::Recommendation;
use crate::weights::{Axis, StateBand, WeightAccessor};
use karmachain_core::config::ConfidencePenalties;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Ordered role thresholds, lowest first. The predicted role is the
/// highest entry whose threshold the projected karma meets.
pub const ROLE_LADDER: [(&str, f64); 6] = [
    ("Seeker", 0.0),
    ("Aspirant", 50.0),
    ("Householder", 150.0),
    ("Mentor", 300.0),
    ("Sage", 600.0),
    ("Jivanmukta", 1000.0),
];

/// Purushartha axis an action type accrues toward.
pub fn axis_for_action(action_type: &str) -> Axis {
    match action_type {
        "donation" | "teaching" | "service" => Axis::Dharma,
        "trade" | "investment" | "repayment" => Axis::Artha,
        "gift" | "celebration" | "entertainment" => Axis::Kama,
        "meditation" | "pilgrimage" | "study" => Axis::Moksha,
        _ => Axis::Dharma,
    }
}

/// Per-user features the projector consumes, assembled by the caller
/// from the graph snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionInputs {
    pub user_id: String,
    pub current_karma: f64,
    /// Historical action_type distribution, values summing to ~1.0.
    pub action_distribution: BTreeMap<String, f64>,
    pub history_count: usize,
    pub metrics_converged: bool,
    pub context_key: Option<String>,
}

/// Forward karma projection for one user. Ephemeral, recomputed per
/// request; the authoritative karma ledger lives elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgamiPrediction {
    pub user_id: String,
    pub horizon: u32,
    /// Expected karma delta per period; deltas may be negative.
    pub deltas: Vec<f64>,
    /// Running cumulative projection, same length as `deltas`.
    pub cumulative: Vec<f64>,
    /// Absolute projected karma at horizon end.
    pub projected_karma: f64,
    pub predicted_role: String,
    /// In [0, 1].
    pub confidence: f64,
    pub recommendations: Vec<Recommendation>,
}

impl AgamiPrediction {
    pub fn to_json(&self) -> AgamiResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Projects a fixed-horizon karma trajectory from a user's history and
/// the merged weight table.
pub struct TrajectoryProjector {
    weights: Arc<WeightAccessor>,
    default_horizon: u32,
    penalties: ConfidencePenalties,
}

impl TrajectoryProjector {
    pub fn new(
        weights: Arc<WeightAccessor>,
        default_horizon: u32,
        penalties: ConfidencePenalties,
    ) -> Self {
        Self {
            weights,
            default_horizon,
            penalties,
        }
    }

    pub fn weights(&self) -> &Arc<WeightAccessor> {
        &self.weights
    }

    pub fn default_horizon(&self) -> u32 {
        self.default_horizon
    }

    /// Expected karma delta for one period at the given karma level.
    pub fn period_delta(
        &self,
        karma: f64,
        distribution: &BTreeMap<String, f64>,
        context_key: Option<&str>,
    ) -> f64 {
        let band = StateBand::from_karma(karma);
        distribution
            .iter()
            .map(|(action, share)| {
                let q = self.weights.value(band, action);
                let axis = axis_for_action(action);
                share * q * self.weights.effective_weight(context_key, axis)
            })
            .sum()
    }

    /// Project over the default horizon.
    pub fn project(&self, inputs: &ProjectionInputs) -> AgamiResult<AgamiPrediction> {
        self.project_horizon(inputs, self.default_horizon)
    }

    /// Project over an explicit horizon.
    ///
    /// Fails only when the user has no historical actions at all; every
    /// other degradation lowers confidence instead of refusing.
    pub fn project_horizon(
        &self,
        inputs: &ProjectionInputs,
        horizon: u32,
    ) -> AgamiResult<AgamiPrediction> {
        if inputs.history_count == 0 || inputs.action_distribution.is_empty() {
            return Err(AgamiError::InsufficientHistory(inputs.user_id.clone()));
        }

        let context = inputs.context_key.as_deref();
        let mut deltas = Vec::with_capacity(horizon as usize);
        let mut cumulative = Vec::with_capacity(horizon as usize);
        let mut running = 0.0_f64;

        for _ in 0..horizon {
            let delta =
                self.period_delta(inputs.current_karma + running, &inputs.action_distribution, context);
            running += delta;
            deltas.push(delta);
            cumulative.push(running);
        }

        let projected_karma = inputs.current_karma + running;
        let predicted_role = role_for(projected_karma).to_string();
        let confidence = self.confidence(inputs);

        debug!(
            user_id = %inputs.user_id,
            horizon,
            projected_karma,
            confidence,
            "projected trajectory"
        );

        Ok(AgamiPrediction {
            user_id: inputs.user_id.clone(),
            horizon,
            deltas,
            cumulative,
            projected_karma,
            predicted_role,
            confidence,
            recommendations: Vec::new(),
        })
    }

    /// Deterministic confidence in [0, 1]: penalized by history sparsity,
    /// by a non-converged centrality pass, and by how far the user's
    /// observed actions sit from the table's training coverage.
    fn confidence(&self, inputs: &ProjectionInputs) -> f64 {
        let sparsity = self.penalties.sparsity / (1.0 + inputs.history_count as f64);

        let convergence = if inputs.metrics_converged {
            0.0
        } else {
            self.penalties.convergence
        };

        let table = self.weights.table();
        let trained = table.trained_actions();
        let overlap = if inputs.action_distribution.is_empty() {
            0.0
        } else {
            inputs
                .action_distribution
                .iter()
                .filter(|(action, _)| trained.contains(action.as_str()))
                .map(|(_, share)| share)
                .sum::<f64>()
                .clamp(0.0, 1.0)
        };
        let context = self.penalties.context * (1.0 - overlap);

        (1.0 - sparsity - convergence - context).clamp(0.0, 1.0)
    }
}

/// Highest role whose threshold the karma value meets.
pub fn role_for(karma: f64) -> &'static str {
    let mut role = ROLE_LADDER[0].0;
    for (name, threshold) in ROLE_LADDER {
        if karma >= threshold {
            role = name;
        }
    }
    role
}
