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

//! Behavioral state normalization
//!
//! Converts raw module-specific action values into module-weighted
//! feedback values and records each as a karma ledger event. Module
//! weights come from the context-weights artifact; unknown modules fall
//! back to weight 1.0 rather than failing the ingest path.

use crate::api::{NormalizeRequest, NormalizedState};
use crate::error::{ServiceError, ServiceResult};
use chrono::Utc;
use karmachain_agami::WeightAccessor;
use karmachain_core::{KarmaEvent, RelationshipStore};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

pub struct Normalizer {
    weights: Arc<WeightAccessor>,
    store: Arc<dyn RelationshipStore>,
}

impl Normalizer {
    pub fn new(weights: Arc<WeightAccessor>, store: Arc<dyn RelationshipStore>) -> Self {
        Self { weights, store }
    }

    /// Normalize one action and append it to the karma ledger.
    pub async fn normalize(&self, req: &NormalizeRequest) -> ServiceResult<NormalizedState> {
        if req.user_id.is_empty() {
            return Err(ServiceError::Validation("user_id must not be empty".into()));
        }
        if !req.raw_value.is_finite() {
            return Err(ServiceError::Validation(format!(
                "raw_value {} is not a finite number",
                req.raw_value
            )));
        }

        let weight = self.weights.module_weight(req.module.as_str());
        let state = NormalizedState {
            state_id: Uuid::new_v4(),
            user_id: req.user_id.clone(),
            module: req.module,
            action_type: req.action_type.clone(),
            weight,
            feedback_value: req.raw_value * weight,
            timestamp: Utc::now(),
        };

        let event = KarmaEvent::new(
            "normalized_state",
            &state.user_id,
            serde_json::to_value(&state).map_err(|e| ServiceError::Internal(e.to_string()))?,
            format!("normalization_api_{}", req.module.as_str()),
        );
        self.store.record_event(event).await?;

        debug!(
            user_id = %state.user_id,
            module = req.module.as_str(),
            feedback = state.feedback_value,
            "normalized behavioral state"
        );
        Ok(state)
    }

    /// Normalize a batch in request order. The batch is all-or-nothing on
    /// validation: any malformed entry rejects the whole batch before the
    /// first ledger write.
    pub async fn normalize_batch(
        &self,
        reqs: &[NormalizeRequest],
    ) -> ServiceResult<Vec<NormalizedState>> {
        for req in reqs {
            if req.user_id.is_empty() || !req.raw_value.is_finite() {
                return Err(ServiceError::Validation(
                    "batch contains a malformed normalization request".into(),
                ));
            }
        }

        let mut states = Vec::with_capacity(reqs.len());
        for req in reqs {
            states.push(self.normalize(req).await?);
        }
        Ok(states)
    }
}
