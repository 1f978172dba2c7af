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

//! Action events and the karma event ledger.
//!
//! Incoming game actions arrive as `ActionEvent`s; everything the core
//! records about them (normalized states, mutations, forwarded signals)
//! lands in the ledger as `KarmaEvent`s.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Originating module of a behavioral action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceModule {
    Finance,
    Game,
    Gurukul,
    Insight,
}

impl SourceModule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Finance => "finance",
            Self::Game => "game",
            Self::Gurukul => "gurukul",
            Self::Insight => "insight",
        }
    }
}

/// An externally generated action that may create or mutate relationships
/// and feeds the prediction engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionEvent {
    pub event_id: Uuid,
    pub user_id: String,
    pub module: SourceModule,
    pub action_type: String,
    /// Raw behavioral value before context weighting
    pub raw_value: f64,
    pub at: DateTime<Utc>,
}

impl ActionEvent {
    pub fn new(
        user_id: impl Into<String>,
        module: SourceModule,
        action_type: impl Into<String>,
        raw_value: f64,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            user_id: user_id.into(),
            module,
            action_type: action_type.into(),
            raw_value,
            at: Utc::now(),
        }
    }
}

/// Ledger record of anything the core did on behalf of a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KarmaEvent {
    pub event_id: Uuid,
    pub event_type: String,
    pub user_id: String,
    /// Structured payload, shape depends on `event_type`
    pub data: serde_json::Value,
    /// Producing subsystem, e.g. "normalization_api_game"
    pub source: String,
    pub at: DateTime<Utc>,
}

impl KarmaEvent {
    pub fn new(
        event_type: impl Into<String>,
        user_id: impl Into<String>,
        data: serde_json::Value,
        source: impl Into<String>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type: event_type.into(),
            user_id: user_id.into(),
            data,
            source: source.into(),
            at: Utc::now(),
        }
    }
}
