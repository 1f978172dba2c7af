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

//! Community detection
//!
//! Greedy modularity maximization over the undirected view of the karmic
//! graph (edge weight = relationship amount). Starts from singletons and
//! repeatedly merges the cluster pair with the largest modularity gain
//! until no merge improves modularity. Merges only ever happen across a
//! positive inter-cluster weight, so disconnected components never join.
//!
//! Modularity:
//!
//! Q = (1/2m) * Σij [Aij - (ki*kj)/(2m)] * δ(ci, cj)
//!
//! Tie-breaks are fixed by the lowest (min id, max id) pair over the
//! candidate clusters' smallest member ids, making partitions reproducible
//! across runs and implementations.

use crate::builder::KarmicGraph;
use crate::error::{GraphError, GraphResult};
use karmachain_core::config::GraphConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Cluster assignment for one graph instance.
///
/// Cluster ids are contiguous, ordered by each cluster's smallest member
/// id, and carry no identity beyond the computation that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityPartition {
    /// User id -> cluster id
    pub assignments: BTreeMap<String, u32>,
    /// Global modularity score in [-1, 1]
    pub modularity: f64,
    pub cluster_count: u32,
}

impl CommunityPartition {
    /// Member count of the largest cluster.
    pub fn largest_cluster_size(&self) -> usize {
        let mut sizes: BTreeMap<u32, usize> = BTreeMap::new();
        for &c in self.assignments.values() {
            *sizes.entry(c).or_default() += 1;
        }
        sizes.values().copied().max().unwrap_or(0)
    }

    /// Members of each cluster, keyed by cluster id.
    pub fn clusters(&self) -> BTreeMap<u32, Vec<String>> {
        let mut clusters: BTreeMap<u32, Vec<String>> = BTreeMap::new();
        for (user, &c) in &self.assignments {
            clusters.entry(c).or_default().push(user.clone());
        }
        clusters
    }
}

/// Greedy modularity-maximization community detector.
#[derive(Debug, Clone, Default)]
pub struct CommunityDetector {
    config: GraphConfig,
}

impl CommunityDetector {
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    /// Detect communities, guarded by the configured node ceiling.
    pub fn detect(&self, graph: &KarmicGraph) -> GraphResult<CommunityPartition> {
        self.detect_with(graph, None, false)
    }

    /// Detect communities, optionally refining a seed partition and
    /// optionally overriding the node ceiling.
    ///
    /// With a seed, merging starts from the supplied cluster memberships
    /// instead of singletons; nodes absent from the seed start as their
    /// own cluster. Cluster ids are renumbered either way.
    pub fn detect_with(
        &self,
        graph: &KarmicGraph,
        seed: Option<&BTreeMap<String, u32>>,
        override_ceiling: bool,
    ) -> GraphResult<CommunityPartition> {
        let n = graph.node_count();
        if n > self.config.community_node_ceiling && !override_ceiling {
            return Err(GraphError::CeilingExceeded {
                nodes: n,
                ceiling: self.config.community_node_ceiling,
            });
        }

        // Degenerate graphs: one trivial cluster, modularity 0.
        if n < 2 {
            let assignments = graph
                .nodes()
                .iter()
                .map(|id| (id.clone(), 0u32))
                .collect::<BTreeMap<_, _>>();
            return Ok(CommunityPartition {
                cluster_count: if n == 0 { 0 } else { 1 },
                assignments,
                modularity: 0.0,
            });
        }

        // Sparse undirected view: symmetric neighbor maps, parallel edges
        // summed by amount.
        let mut degrees = vec![0.0f64; n];
        let mut node_adj: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
        let mut total_weight = 0.0f64;
        for edge in graph.edges() {
            *node_adj[edge.from].entry(edge.to).or_default() += edge.amount;
            *node_adj[edge.to].entry(edge.from).or_default() += edge.amount;
            degrees[edge.from] += edge.amount;
            degrees[edge.to] += edge.amount;
            total_weight += edge.amount;
        }

        // Initial membership: seed partition or singletons.
        let mut membership: Vec<usize> = match seed {
            None => (0..n).collect(),
            Some(seed) => {
                let mut next_fresh = 0usize;
                let mut seen: BTreeMap<u32, usize> = BTreeMap::new();
                let mut membership = Vec::with_capacity(n);
                for idx in 0..n {
                    let slot = match seed.get(graph.node_id(idx)) {
                        Some(&c) => *seen.entry(c).or_insert_with(|| {
                            let s = next_fresh;
                            next_fresh += 1;
                            s
                        }),
                        None => {
                            let s = next_fresh;
                            next_fresh += 1;
                            s
                        }
                    };
                    membership.push(slot);
                }
                membership
            }
        };

        if total_weight > 0.0 {
            self.greedy_merge(&node_adj, &degrees, total_weight, &mut membership);
        }

        let assignments = renumber(graph, &membership);
        let cluster_count = assignments.values().copied().max().map_or(0, |m| m + 1);
        let modularity = modularity_of(graph, &degrees, total_weight, &membership);

        debug!(
            nodes = n,
            clusters = cluster_count,
            modularity,
            "detected communities"
        );

        Ok(CommunityPartition {
            assignments,
            modularity,
            cluster_count,
        })
    }

    /// Merge cluster pairs greedily while any merge yields a positive
    /// modularity gain.
    ///
    /// Clusters carry sparse neighbor maps (cluster -> inter-cluster
    /// weight) folded together incrementally on each merge, so every round
    /// scans only connected cluster pairs. Near-linear in edges on sparse
    /// karmic graphs; the node ceiling bounds the worst case.
    fn greedy_merge(
        &self,
        node_adj: &[BTreeMap<usize, f64>],
        degrees: &[f64],
        total_weight: f64,
        membership: &mut [usize],
    ) {
        let two_m = 2.0 * total_weight;

        // Cluster slots keyed by initial membership. Node indices follow
        // the graph's lexical node order, so the smallest member index is
        // also the lexically smallest member id.
        let mut clusters: BTreeMap<usize, Cluster> = BTreeMap::new();
        for (i, &slot) in membership.iter().enumerate() {
            let cluster = clusters.entry(slot).or_insert_with(|| Cluster {
                mass: 0.0,
                min_member: i,
                members: Vec::new(),
                adj: BTreeMap::new(),
            });
            cluster.mass += degrees[i];
            cluster.min_member = cluster.min_member.min(i);
            cluster.members.push(i);
        }
        for (i, neighbors) in node_adj.iter().enumerate() {
            for (&j, &weight) in neighbors {
                if membership[i] != membership[j] {
                    if let Some(cluster) = clusters.get_mut(&membership[i]) {
                        *cluster.adj.entry(membership[j]).or_default() += weight;
                    }
                }
            }
        }

        loop {
            // Pick the connected pair with the largest gain; ties resolve
            // to the lowest (min index, max index) member pair, which is
            // the lexically lowest (min id, max id) pair.
            let mut best: Option<(usize, usize, f64, (usize, usize))> = None;
            for (&c, cluster) in &clusters {
                for (&d, &weight_cd) in cluster.adj.range((c + 1)..) {
                    let mass_d = clusters[&d].mass;
                    let gain =
                        weight_cd / total_weight - cluster.mass * mass_d / (two_m * two_m) * 2.0;
                    let candidate_key = ordered(cluster.min_member, clusters[&d].min_member);

                    let better = match &best {
                        None => gain > 0.0,
                        Some((_, _, bg, bk)) => {
                            gain > *bg + f64::EPSILON
                                || ((gain - *bg).abs() <= f64::EPSILON && candidate_key < *bk)
                        }
                    };
                    if better && gain > 0.0 {
                        best = Some((c, d, gain, candidate_key));
                    }
                }
            }

            let Some((keep, absorb, _gain, _key)) = best else {
                break;
            };

            // Fold the absorbed cluster's adjacency into the keeper and
            // repoint every third cluster's entry.
            let absorbed = match clusters.remove(&absorb) {
                Some(c) => c,
                None => break,
            };
            for (&nbr, &weight) in &absorbed.adj {
                if nbr == keep {
                    continue;
                }
                if let Some(other) = clusters.get_mut(&nbr) {
                    other.adj.remove(&absorb);
                    *other.adj.entry(keep).or_default() += weight;
                }
                if let Some(keeper) = clusters.get_mut(&keep) {
                    *keeper.adj.entry(nbr).or_default() += weight;
                }
            }
            if let Some(keeper) = clusters.get_mut(&keep) {
                keeper.adj.remove(&absorb);
                keeper.mass += absorbed.mass;
                keeper.min_member = keeper.min_member.min(absorbed.min_member);
                keeper.members.extend(absorbed.members);
            }
        }

        for (&slot, cluster) in &clusters {
            for &i in &cluster.members {
                membership[i] = slot;
            }
        }
    }
}

/// One live cluster during agglomerative merging.
struct Cluster {
    /// Total degree mass of member nodes
    mass: f64,
    /// Smallest member node index (lexically smallest member id)
    min_member: usize,
    members: Vec<usize>,
    /// Neighbor cluster -> inter-cluster weight
    adj: BTreeMap<usize, f64>,
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Contiguous cluster ids ordered by each cluster's smallest member id.
fn renumber(graph: &KarmicGraph, membership: &[usize]) -> BTreeMap<String, u32> {
    let mut min_member: BTreeMap<usize, &str> = BTreeMap::new();
    for (i, &m) in membership.iter().enumerate() {
        let entry = min_member.entry(m).or_insert_with(|| graph.node_id(i));
        if graph.node_id(i) < *entry {
            *entry = graph.node_id(i);
        }
    }

    let mut order: Vec<(usize, &str)> = min_member.iter().map(|(&m, &id)| (m, id)).collect();
    order.sort_by(|a, b| a.1.cmp(b.1));
    let ids: BTreeMap<usize, u32> = order
        .into_iter()
        .enumerate()
        .map(|(new, (old, _))| (old, new as u32))
        .collect();

    membership
        .iter()
        .enumerate()
        .map(|(i, &m)| (graph.node_id(i).to_string(), ids[&m]))
        .collect()
}

/// Global modularity of a membership vector:
/// Q = Σc [2*intra_c/(2m) - (mass_c/(2m))^2].
fn modularity_of(
    graph: &KarmicGraph,
    degrees: &[f64],
    total_weight: f64,
    membership: &[usize],
) -> f64 {
    if total_weight <= 0.0 {
        return 0.0;
    }

    let two_m = 2.0 * total_weight;
    let mut mass: BTreeMap<usize, f64> = BTreeMap::new();
    let mut intra: BTreeMap<usize, f64> = BTreeMap::new();
    for (i, &m) in membership.iter().enumerate() {
        *mass.entry(m).or_default() += degrees[i];
    }
    for edge in graph.edges() {
        if membership[edge.from] == membership[edge.to] {
            *intra.entry(membership[edge.from]).or_default() += edge.amount;
        }
    }

    mass.iter()
        .map(|(c, &a)| {
            let e_in = intra.get(c).copied().unwrap_or(0.0);
            2.0 * e_in / two_m - (a / two_m) * (a / two_m)
        })
        .sum()
}
