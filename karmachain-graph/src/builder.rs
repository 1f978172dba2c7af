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

//! Karmic graph construction
//!
//! Materializes an in-memory directed multigraph from relationship
//! records for one scope. The graph is a pure value owned by the request
//! that built it; every analysis rebuilds from a fresh store snapshot.

use crate::error::{GraphError, GraphResult};
use karmachain_core::config::GraphConfig;
use karmachain_core::relationship::{Relationship, RelationshipStatus, Severity};
use karmachain_core::store::Scope;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// One relationship projected onto dense node indices.
#[derive(Debug, Clone)]
pub struct GraphEdge {
    pub relationship_id: Uuid,
    /// Debtor node index
    pub from: usize,
    /// Receiver node index
    pub to: usize,
    /// Original karma magnitude
    pub amount: f64,
    /// Remaining debt
    pub outstanding: f64,
    pub severity: Severity,
    pub action_type: String,
    pub status: RelationshipStatus,
}

/// Ephemeral directed multigraph over user ids.
///
/// Nodes are the union of debtor/receiver ids across included edges,
/// sorted lexically so that indices are reproducible for a given record
/// set. Self-loops cannot occur; relationship creation rejects them.
#[derive(Debug, Clone, Default)]
pub struct KarmicGraph {
    nodes: Vec<String>,
    index: HashMap<String, usize>,
    edges: Vec<GraphEdge>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
}

impl KarmicGraph {
    fn from_parts(nodes: Vec<String>, edges: Vec<GraphEdge>) -> Self {
        let index: HashMap<String, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        let mut outgoing = vec![Vec::new(); nodes.len()];
        let mut incoming = vec![Vec::new(); nodes.len()];
        for (e, edge) in edges.iter().enumerate() {
            outgoing[edge.from].push(e);
            incoming[edge.to].push(e);
        }

        Self {
            nodes,
            index,
            edges,
            outgoing,
            incoming,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// User id for a node index.
    pub fn node_id(&self, idx: usize) -> &str {
        &self.nodes[idx]
    }

    /// Node index for a user id, if present in this scope.
    pub fn node_index(&self, user_id: &str) -> Option<usize> {
        self.index.get(user_id).copied()
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Edges leaving a node (debts owed by the user).
    pub fn out_edges(&self, idx: usize) -> impl Iterator<Item = &GraphEdge> {
        self.outgoing[idx].iter().map(move |&e| &self.edges[e])
    }

    /// Edges entering a node (debts owed to the user).
    pub fn in_edges(&self, idx: usize) -> impl Iterator<Item = &GraphEdge> {
        self.incoming[idx].iter().map(move |&e| &self.edges[e])
    }

    /// Symmetric weight matrix for partitioning, edge weight = relationship
    /// amount, parallel edges summed.
    pub fn undirected_weights(&self) -> Vec<Vec<f64>> {
        let n = self.nodes.len();
        let mut w = vec![vec![0.0; n]; n];
        for edge in &self.edges {
            w[edge.from][edge.to] += edge.amount;
            w[edge.to][edge.from] += edge.amount;
        }
        w
    }
}

/// Builds a `KarmicGraph` from a scoped set of relationship records.
/// Side-effect free.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    config: GraphConfig,
}

impl GraphBuilder {
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    /// Build the graph for a scope.
    ///
    /// Expired relationships are filtered out unless the config includes
    /// them. Fails with `EmptyScope` when no nodes remain.
    pub fn build(&self, scope: &Scope, records: &[Relationship]) -> GraphResult<KarmicGraph> {
        let included: Vec<&Relationship> = records
            .iter()
            .filter(|r| self.config.include_expired || r.status != RelationshipStatus::Expired)
            .filter(|r| match scope {
                Scope::All => true,
                Scope::User(user_id) => r.involves(user_id),
            })
            .collect();

        let mut nodes: Vec<String> = included
            .iter()
            .flat_map(|r| [r.debtor_id.clone(), r.receiver_id.clone()])
            .collect();
        nodes.sort();
        nodes.dedup();

        if nodes.is_empty() {
            return Err(GraphError::EmptyScope(format!("{:?}", scope)));
        }

        let index: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        let edges: Vec<GraphEdge> = included
            .iter()
            .map(|r| GraphEdge {
                relationship_id: r.relationship_id,
                from: index[r.debtor_id.as_str()],
                to: index[r.receiver_id.as_str()],
                amount: r.amount,
                outstanding: r.amount_outstanding(),
                severity: r.severity,
                action_type: r.action_type.clone(),
                status: r.status,
            })
            .collect();

        debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            ?scope,
            "built karmic graph"
        );
        Ok(KarmicGraph::from_parts(nodes, edges))
    }
}
