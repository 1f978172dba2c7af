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

//! KarmaChain Agami
//!
//! The forward-looking prediction engine: consumes a learned state-action
//! weight table (trained out-of-band) and context-sensitive Purushartha
//! multipliers to project a user's karma trajectory, role progression, and
//! ranked action recommendations.

pub mod error;
pub mod projector;
pub mod recommend;
pub mod weights;

pub use error::{AgamiError, AgamiResult};
pub use projector::{
    AgamiPrediction, ProjectionInputs, TrajectoryProjector, ROLE_LADDER,
};
pub use recommend::{Recommendation, RecommendationEngine};
pub use weights::{
    Axis, ContextMultipliers, StateBand, WeightAccessor, WeightEntry, WeightTable,
};
