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

//! Prediction engine error types

use thiserror::Error;

/// Result type for prediction operations
pub type AgamiResult<T> = Result<T, AgamiError>;

/// Errors that can occur in the Agami engines
#[derive(Debug, Error)]
pub enum AgamiError {
    /// Prediction impossible: the user has no historical actions at all.
    /// Anything above zero history degrades confidence instead.
    #[error("Insufficient history: {0}")]
    InsufficientHistory(String),

    /// Context-weight update rejected in full; no axis was applied
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),

    /// Weight table or context file failed to parse
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error while loading weight artifacts
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for AgamiError {
    fn from(e: serde_json::Error) -> Self {
        AgamiError::Serialization(e.to_string())
    }
}
