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

//! Core error types

use thiserror::Error;

/// Result type for core ledger operations
pub type KarmaResult<T> = Result<T, KarmaError>;

/// Errors that can occur in the relationship ledger
#[derive(Debug, Error)]
pub enum KarmaError {
    /// Malformed input, rejected before any mutation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown relationship or user id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Lifecycle transition not permitted from the current status
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Underlying store failure, propagated unchanged
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for KarmaError {
    fn from(e: serde_json::Error) -> Self {
        KarmaError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for KarmaError {
    fn from(e: toml::de::Error) -> Self {
        KarmaError::Config(e.to_string())
    }
}
