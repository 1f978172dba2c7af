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

//! Network metrics engine
//!
//! Degree and debt-load metrics in O(E), eigenvector centrality via
//! bounded power iteration, position percentiles, and relationship
//! pattern distributions. Iteration is capped; on non-convergence the
//! last iterate is returned with `converged = false` rather than failing.

use crate::builder::KarmicGraph;
use karmachain_core::config::GraphConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Hard bound on iterations when computing below the exactness threshold.
const EXACT_ITERATION_LIMIT: usize = 1_000;

/// Convergence tolerance between iterates (L1 distance).
const CONVERGENCE_TOLERANCE: f64 = 1e-9;

/// Per-node degree, debt, and position metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMetrics {
    pub user_id: String,
    pub in_degree: usize,
    pub out_degree: usize,
    /// Outstanding karma owed to this user
    pub weighted_debt_in: f64,
    /// Outstanding karma this user owes
    pub weighted_debt_out: f64,
    /// Eigenvector centrality, L1-normalized over the scope
    pub centrality: f64,
    /// Percentile of centrality within the scope, 0..=100
    pub position_percentile: f64,
}

/// Normalized distributions over relationship attributes in the scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternDistributions {
    pub severity: BTreeMap<String, f64>,
    pub action_type: BTreeMap<String, f64>,
    pub status: BTreeMap<String, f64>,
}

/// Full metrics report for one graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkMetrics {
    pub nodes: Vec<NodeMetrics>,
    pub patterns: PatternDistributions,
    /// False when the centrality iteration hit its cap first
    pub converged: bool,
    pub iterations: usize,
}

impl NetworkMetrics {
    /// Metrics row for a user, if the user is in scope.
    pub fn node(&self, user_id: &str) -> Option<&NodeMetrics> {
        self.nodes.iter().find(|n| n.user_id == user_id)
    }
}

/// Computes `NetworkMetrics` over a built graph.
#[derive(Debug, Clone, Default)]
pub struct MetricsEngine {
    config: GraphConfig,
}

impl MetricsEngine {
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    pub fn compute(&self, graph: &KarmicGraph) -> NetworkMetrics {
        let n = graph.node_count();
        let (centrality, converged, iterations) = self.centrality(graph);
        let percentiles = position_percentiles(&centrality);

        let nodes = (0..n)
            .map(|i| NodeMetrics {
                user_id: graph.node_id(i).to_string(),
                in_degree: graph.in_edges(i).count(),
                out_degree: graph.out_edges(i).count(),
                weighted_debt_in: graph.in_edges(i).map(|e| e.outstanding).sum(),
                weighted_debt_out: graph.out_edges(i).map(|e| e.outstanding).sum(),
                centrality: centrality[i],
                position_percentile: percentiles[i],
            })
            .collect();

        debug!(
            nodes = n,
            iterations, converged, "computed network metrics"
        );

        NetworkMetrics {
            nodes,
            patterns: pattern_distributions(graph),
            converged,
            iterations,
        }
    }

    /// Eigenvector centrality by power iteration on the undirected weight
    /// matrix.
    ///
    /// Graphs at or below the exactness threshold iterate until the L1
    /// distance between iterates drops under tolerance; larger graphs are
    /// capped at the configured iteration budget. Returns the centrality
    /// vector, the convergence flag, and the iteration count.
    fn centrality(&self, graph: &KarmicGraph) -> (Vec<f64>, bool, usize) {
        let n = graph.node_count();
        if n == 0 {
            return (Vec::new(), true, 0);
        }
        if graph.edge_count() == 0 {
            return (vec![1.0 / n as f64; n], true, 0);
        }

        let w = graph.undirected_weights();
        let cap = if n <= self.config.centrality_exact_threshold {
            EXACT_ITERATION_LIMIT
        } else {
            self.config.centrality_iteration_cap
        };

        let mut x = vec![1.0 / n as f64; n];
        for iteration in 1..=cap {
            let mut next = vec![0.0; n];
            for i in 0..n {
                // Identity shift keeps the iteration from oscillating on
                // bipartite structures (stars, pure debtor/receiver splits).
                next[i] = x[i];
                for j in 0..n {
                    next[i] += w[i][j] * x[j];
                }
            }

            let norm: f64 = next.iter().map(|v| v.abs()).sum();
            if norm == 0.0 {
                // Isolated mass leaked to nothing; keep the last iterate.
                return (x, true, iteration);
            }
            for v in &mut next {
                *v /= norm;
            }

            let delta: f64 = next
                .iter()
                .zip(&x)
                .map(|(a, b)| (a - b).abs())
                .sum();
            x = next;

            if delta < CONVERGENCE_TOLERANCE {
                return (x, true, iteration);
            }
        }

        (x, false, cap)
    }
}

/// Percentile of each value within the vector, 0..=100, stable under ties.
fn position_percentiles(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n <= 1 {
        return vec![100.0; n];
    }

    values
        .iter()
        .map(|&v| {
            let below = values.iter().filter(|&&o| o < v).count();
            below as f64 / (n - 1) as f64 * 100.0
        })
        .collect()
}

/// Counts grouped by severity, action type, and status, each normalized
/// to a probability distribution over the scope's edges.
fn pattern_distributions(graph: &KarmicGraph) -> PatternDistributions {
    let mut severity: BTreeMap<String, f64> = BTreeMap::new();
    let mut action_type: BTreeMap<String, f64> = BTreeMap::new();
    let mut status: BTreeMap<String, f64> = BTreeMap::new();

    for edge in graph.edges() {
        *severity.entry(edge.severity.as_str().to_string()).or_default() += 1.0;
        *action_type.entry(edge.action_type.clone()).or_default() += 1.0;
        *status.entry(edge.status.as_str().to_string()).or_default() += 1.0;
    }

    let total = graph.edge_count() as f64;
    if total > 0.0 {
        for dist in [&mut severity, &mut action_type, &mut status] {
            for v in dist.values_mut() {
                *v /= total;
            }
        }
    }

    PatternDistributions {
        severity,
        action_type,
        status,
    }
}
