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

//! KarmaChain Graph
//!
//! The rnanubandhan network-analysis engine: builds an ephemeral directed
//! multigraph from relationship records and computes degree, centrality,
//! community, and pattern summaries over it. Graphs are pure values
//! rebuilt per request; nothing here holds shared mutable state.

pub mod builder;
pub mod community;
pub mod error;
pub mod metrics;
pub mod summary;

pub use builder::{GraphBuilder, GraphEdge, KarmicGraph};
pub use community::{CommunityDetector, CommunityPartition};
pub use error::{GraphError, GraphResult};
pub use metrics::{MetricsEngine, NetworkMetrics, NodeMetrics, PatternDistributions};
pub use summary::{NetworkSummarizer, NetworkSummary, TopNode};
