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

//! Service-level error mapping
//!
//! Wraps the typed errors of the inner crates and maps each to a stable
//! error code suitable for any transport. Codes are part of the contract
//! and must not change once published.

use karmachain_agami::AgamiError;
use karmachain_core::KarmaError;
use karmachain_graph::GraphError;
use thiserror::Error;

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced at the service boundary
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Insufficient history: {0}")]
    InsufficientHistory(String),

    #[error("Invalid weight: {0}")]
    InvalidWeight(String),

    #[error("Bridge failure: {0}")]
    Bridge(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable, transport-agnostic error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::InvalidTransition(_) => "invalid_transition",
            Self::InsufficientHistory(_) => "insufficient_history",
            Self::InvalidWeight(_) => "invalid_weight",
            Self::Bridge(_) => "bridge_failure",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<KarmaError> for ServiceError {
    fn from(e: KarmaError) -> Self {
        match e {
            KarmaError::Validation(msg) => Self::Validation(msg),
            KarmaError::NotFound(msg) => Self::NotFound(msg),
            KarmaError::InvalidTransition(msg) => Self::InvalidTransition(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<GraphError> for ServiceError {
    fn from(e: GraphError) -> Self {
        // EmptyScope is handled before reaching here; anything else is a
        // genuine internal failure.
        Self::Internal(e.to_string())
    }
}

impl From<AgamiError> for ServiceError {
    fn from(e: AgamiError) -> Self {
        match e {
            AgamiError::InsufficientHistory(user) => Self::InsufficientHistory(user),
            AgamiError::InvalidWeight(msg) => Self::InvalidWeight(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}
