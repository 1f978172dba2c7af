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

//! Request/response contracts
//!
//! Transport-agnostic shapes consumed by whatever carries the service
//! (HTTP, message bus, embedded calls). Everything here derives serde so
//! any carrier can pick its own encoding.

use chrono::{DateTime, Utc};
use karmachain_core::{Severity, SourceModule};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction filter for relationship listings, seen from the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Edges where the user owes (user is debtor)
    Debts,
    /// Edges where the user is owed (user is receiver)
    Credits,
    /// Both directions
    All,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDebtRequest {
    pub debtor_id: String,
    pub receiver_id: String,
    pub amount: f64,
    pub severity: Severity,
    pub action_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepayRequest {
    pub relationship_id: Uuid,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub relationship_id: Uuid,
    pub new_debtor: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub user_id: String,
    #[serde(default)]
    pub context_key: Option<String>,
    /// Overrides the configured horizon when present
    #[serde(default)]
    pub horizon: Option<u32>,
}

/// One raw behavioral action to normalize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeRequest {
    pub user_id: String,
    pub module: SourceModule,
    pub action_type: String,
    pub raw_value: f64,
}

/// Module-weighted behavioral state, ready for the karma ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedState {
    pub state_id: Uuid,
    pub user_id: String,
    pub module: SourceModule,
    pub action_type: String,
    /// Module weight that was applied
    pub weight: f64,
    /// `raw_value * weight`
    pub feedback_value: f64,
    pub timestamp: DateTime<Utc>,
}

/// Outbound karmic feedback signal for the InsightFlow bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KarmicSignal {
    pub user_id: String,
    pub signal_type: String,
    pub payload: serde_json::Value,
}
