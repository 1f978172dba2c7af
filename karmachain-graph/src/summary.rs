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

//! Network summarizer
//!
//! Composes metrics and community output into a single report with
//! rule-based recommendations. Deterministic given identical graph input:
//! no timestamps, no randomized tie-breaking, ordered collections only.
//!
//! Exports: JSON (loss-tolerant, re-importable) and TOML.

use crate::community::CommunityPartition;
use crate::error::GraphResult;
use crate::metrics::{NetworkMetrics, NodeMetrics, PatternDistributions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Highest-centrality nodes in the scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopNode {
    pub user_id: String,
    pub centrality: f64,
    pub weighted_debt_in: f64,
    pub weighted_debt_out: f64,
}

/// Composed network analysis report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSummary {
    pub scope: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub converged: bool,
    pub community_count: u32,
    pub largest_community_size: usize,
    pub modularity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_action_type: Option<String>,
    pub recommendations: Vec<String>,
    /// User id -> cluster id for this computation
    pub communities: BTreeMap<String, u32>,
    pub patterns: PatternDistributions,
    pub top_nodes: Vec<TopNode>,
    pub node_metrics: Vec<NodeMetrics>,
}

impl NetworkSummary {
    /// Export as JSON. Loss-tolerant: `from_json` reproduces cluster
    /// memberships and metric values exactly.
    pub fn to_json(&self) -> GraphResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(raw: &str) -> GraphResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Export as TOML.
    pub fn to_toml(&self) -> GraphResult<String> {
        Ok(toml::to_string(self)?)
    }
}

/// Composes `NetworkMetrics` + `CommunityPartition` into a report.
#[derive(Debug, Clone)]
pub struct NetworkSummarizer {
    /// Number of highest-centrality nodes to surface
    pub top_k: usize,
}

impl Default for NetworkSummarizer {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

impl NetworkSummarizer {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    pub fn summarize(
        &self,
        scope: impl Into<String>,
        metrics: &NetworkMetrics,
        partition: &CommunityPartition,
    ) -> NetworkSummary {
        let mut ranked: Vec<&NodeMetrics> = metrics.nodes.iter().collect();
        ranked.sort_by(|a, b| {
            b.centrality
                .partial_cmp(&a.centrality)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });

        let top_nodes: Vec<TopNode> = ranked
            .iter()
            .take(self.top_k)
            .map(|n| TopNode {
                user_id: n.user_id.clone(),
                centrality: n.centrality,
                weighted_debt_in: n.weighted_debt_in,
                weighted_debt_out: n.weighted_debt_out,
            })
            .collect();

        // Each edge is counted exactly once at its source node.
        let edge_count = metrics.nodes.iter().map(|n| n.out_degree).sum();

        let recommendations = derive_recommendations(metrics, partition);

        NetworkSummary {
            scope: scope.into(),
            node_count: metrics.nodes.len(),
            edge_count,
            top_nodes,
            dominant_severity: dominant(&metrics.patterns.severity),
            dominant_action_type: dominant(&metrics.patterns.action_type),
            patterns: metrics.patterns.clone(),
            node_metrics: metrics.nodes.clone(),
            converged: metrics.converged,
            community_count: partition.cluster_count,
            largest_community_size: partition.largest_cluster_size(),
            modularity: partition.modularity,
            communities: partition.assignments.clone(),
            recommendations,
        }
    }

    /// Well-formed empty report for a scope with no relationships.
    pub fn empty(&self, scope: impl Into<String>) -> NetworkSummary {
        NetworkSummary {
            scope: scope.into(),
            node_count: 0,
            edge_count: 0,
            top_nodes: Vec::new(),
            dominant_severity: None,
            dominant_action_type: None,
            patterns: PatternDistributions::default(),
            node_metrics: Vec::new(),
            converged: true,
            community_count: 0,
            largest_community_size: 0,
            modularity: 0.0,
            communities: BTreeMap::new(),
            recommendations: vec!["No relationships in scope yet.".to_string()],
        }
    }
}

/// Highest-probability key; ties resolve to the lexically first key.
fn dominant(distribution: &BTreeMap<String, f64>) -> Option<String> {
    distribution
        .iter()
        .max_by(|a, b| {
            a.1.partial_cmp(b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.0.cmp(a.0))
        })
        .map(|(k, _)| k.clone())
}

fn derive_recommendations(
    metrics: &NetworkMetrics,
    partition: &CommunityPartition,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    let total_outstanding: f64 = metrics.nodes.iter().map(|n| n.weighted_debt_out).sum();
    if total_outstanding > 0.0 {
        if let Some(heaviest) = metrics.nodes.iter().max_by(|a, b| {
            a.weighted_debt_out
                .partial_cmp(&b.weighted_debt_out)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.user_id.cmp(&a.user_id))
        }) {
            let share = heaviest.weighted_debt_out / total_outstanding;
            if share > 0.5 {
                recommendations.push(format!(
                    "High out-debt concentration: '{}' carries {:.0}% of outstanding debt. \
                     Encourage staged repayments or a transfer to spread the load.",
                    heaviest.user_id,
                    share * 100.0
                ));
            }
        }
    }

    if partition.cluster_count > 1 && partition.modularity < 0.1 {
        recommendations.push(format!(
            "Communities are weakly separated (modularity {:.3}); cross-cluster \
             obligations dominate. Cluster boundaries may not be meaningful.",
            partition.modularity
        ));
    }

    if !metrics.converged {
        recommendations.push(
            "Centrality iteration hit its cap before converging; treat rankings as indicative."
                .to_string(),
        );
    }

    if recommendations.is_empty() {
        recommendations.push("Network within normal bounds; no mitigations suggested.".to_string());
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::community::CommunityDetector;
    use crate::metrics::MetricsEngine;
    use karmachain_core::relationship::{Relationship, Severity};
    use karmachain_core::store::Scope;

    fn summary_for(records: &[Relationship]) -> NetworkSummary {
        let graph = GraphBuilder::default().build(&Scope::All, records).unwrap();
        let metrics = MetricsEngine::default().compute(&graph);
        let partition = CommunityDetector::default().detect(&graph).unwrap();
        NetworkSummarizer::default().summarize("all", &metrics, &partition)
    }

    fn rel(debtor: &str, receiver: &str, amount: f64, severity: Severity) -> Relationship {
        Relationship::new(debtor, receiver, amount, severity, "favor").unwrap()
    }

    fn sample_records() -> Vec<Relationship> {
        vec![
            rel("a", "b", 50.0, Severity::Severe),
            rel("a", "c", 40.0, Severity::Severe),
            rel("b", "c", 5.0, Severity::Minor),
            rel("c", "d", 5.0, Severity::Minor),
        ]
    }

    #[test]
    fn test_summary_shape() {
        let summary = summary_for(&sample_records());

        assert_eq!(summary.node_count, 4);
        assert_eq!(summary.edge_count, 4);
        assert_eq!(summary.dominant_severity.as_deref(), Some("minor"));
        assert_eq!(summary.dominant_action_type.as_deref(), Some("favor"));
        assert!(!summary.top_nodes.is_empty());
        assert_eq!(summary.communities.len(), 4);
    }

    #[test]
    fn test_out_debt_concentration_triggers_recommendation() {
        let summary = summary_for(&sample_records());
        assert!(
            summary
                .recommendations
                .iter()
                .any(|r| r.contains("High out-debt concentration: 'a'")),
            "recommendations: {:?}",
            summary.recommendations
        );
    }

    #[test]
    fn test_json_round_trip_is_lossless() {
        let summary = summary_for(&sample_records());
        let raw = summary.to_json().unwrap();
        let back = NetworkSummary::from_json(&raw).unwrap();

        assert_eq!(back.communities, summary.communities);
        assert_eq!(back.modularity.to_bits(), summary.modularity.to_bits());
        for (a, b) in back.node_metrics.iter().zip(&summary.node_metrics) {
            assert_eq!(a.centrality.to_bits(), b.centrality.to_bits());
            assert_eq!(a.weighted_debt_out.to_bits(), b.weighted_debt_out.to_bits());
        }
        assert_eq!(back, summary);
    }

    #[test]
    fn test_toml_export_parses() {
        let summary = summary_for(&sample_records());
        let raw = summary.to_toml().unwrap();
        assert!(raw.contains("node_count = 4"));
    }

    #[test]
    fn test_empty_summary_is_well_formed() {
        let summary = NetworkSummarizer::default().empty("user:nobody");
        assert_eq!(summary.node_count, 0);
        assert_eq!(summary.community_count, 0);
        assert_eq!(summary.modularity, 0.0);
        assert!(!summary.recommendations.is_empty());
    }

    #[test]
    fn test_summary_deterministic() {
        let records = sample_records();
        assert_eq!(summary_for(&records), summary_for(&records));
    }
}
