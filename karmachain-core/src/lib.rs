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

//! KarmaChain Core
//!
//! Fundamental data structures for the karmic obligation ledger:
//! relationship records, lifecycle transitions, action events, the
//! relationship store adapter, and configuration.

pub mod action;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod relationship;
pub mod store;

pub use action::{ActionEvent, KarmaEvent, SourceModule};
pub use config::{
    BaseWeights, BridgeConfig, ConfidencePenalties, GraphConfig, KarmaChainConfig,
    PredictionConfig,
};
pub use error::{KarmaError, KarmaResult};
pub use lifecycle::RelationshipEvent;
pub use relationship::{
    Relationship, RelationshipStatus, RepaymentEntry, Severity, REPAYMENT_EPSILON,
};
pub use store::{InMemoryStore, RelationshipStore, Scope};
