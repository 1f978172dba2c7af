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

//! Action recommendations
//!
//! Ranks candidate action types by their marginal effect on the projected
//! cumulative karma, holding the user's history fixed. Candidates come
//! from the trained weight table, so an empty table yields no
//! recommendations rather than an error.

use crate::projector::{axis_for_action, AgamiPrediction, ProjectionInputs, TrajectoryProjector};
use crate::weights::StateBand;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One ranked suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action_type: String,
    pub expected_gain: f64,
    pub rationale: String,
}

/// Derives ranked action suggestions from a projection.
pub struct RecommendationEngine {
    top_n: usize,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self { top_n: 3 }
    }
}

impl RecommendationEngine {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    /// Rank every trained action type by the cumulative karma gained if
    /// the user committed fully to it over the horizon, relative to the
    /// baseline trajectory. Descending by gain, lexical on ties.
    pub fn recommend(
        &self,
        projector: &TrajectoryProjector,
        inputs: &ProjectionInputs,
        prediction: &AgamiPrediction,
    ) -> Vec<Recommendation> {
        let context = inputs.context_key.as_deref();
        let band = StateBand::from_karma(inputs.current_karma);
        let baseline = prediction.deltas.first().copied().unwrap_or(0.0);

        let table = projector.weights().table();
        let mut ranked: Vec<Recommendation> = table
            .trained_actions()
            .into_iter()
            .map(|action| {
                let q = projector.weights().value(band, action);
                let axis = axis_for_action(action);
                let candidate_delta = q * projector.weights().effective_weight(context, axis);
                let expected_gain =
                    f64::from(prediction.horizon) * (candidate_delta - baseline);
                Recommendation {
                    action_type: action.to_string(),
                    expected_gain,
                    rationale: rationale_for(action, axis.as_str(), expected_gain),
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.expected_gain
                .partial_cmp(&a.expected_gain)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.action_type.cmp(&b.action_type))
        });
        ranked.truncate(self.top_n);
        ranked
    }
}

fn rationale_for(action: &str, axis: &str, gain: f64) -> String {
    if gain > 0.0 {
        format!(
            "Committing to {} would strengthen the {} axis and raise projected karma by {:.1} over the horizon",
            action, axis, gain
        )
    } else {
        format!(
            "{} offers no improvement over the current trajectory on the {} axis",
            action, axis
        )
    }
}
