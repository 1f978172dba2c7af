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

//! Graph engine error types

use thiserror::Error;

/// Result type for graph analysis operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors that can occur in the graph engines
#[derive(Debug, Error)]
pub enum GraphError {
    /// The requested scope holds no relationships; callers treat this as
    /// "no relationships yet", not a crash
    #[error("Empty scope: {0}")]
    EmptyScope(String),

    /// Community detection refused a graph above the configured node
    /// ceiling without an explicit override
    #[error("Graph has {nodes} nodes, above the community-detection ceiling of {ceiling}")]
    CeilingExceeded { nodes: usize, ceiling: usize },

    /// Export/import serialization failure
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for GraphError {
    fn from(e: serde_json::Error) -> Self {
        GraphError::Serialization(e.to_string())
    }
}

impl From<toml::ser::Error> for GraphError {
    fn from(e: toml::ser::Error) -> Self {
        GraphError::Serialization(e.to_string())
    }
}
