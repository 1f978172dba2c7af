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

//! Composed service facade
//!
//! Wires the store adapter, graph engines, and prediction engines behind
//! one transport-agnostic surface. Every analysis or prediction request
//! fetches its own snapshot from the store and builds an independent
//! in-memory graph; the only shared mutable state is the context-weight
//! registry inside the weight accessor.

use crate::api::{
    CreateDebtRequest, Direction, KarmicSignal, NormalizeRequest, NormalizedState,
    PredictRequest, RepayRequest, TransferRequest,
};
use crate::bridge::{BridgeHealth, BridgeReport, SignalBridge};
use crate::error::{ServiceError, ServiceResult};
use crate::normalize::Normalizer;
use chrono::{Duration, Utc};
use karmachain_agami::{
    AgamiPrediction, ContextMultipliers, ProjectionInputs, RecommendationEngine,
    TrajectoryProjector, WeightAccessor, WeightTable,
};
use karmachain_core::{
    KarmaChainConfig, KarmaEvent, Relationship, RelationshipStore, Scope,
};
use karmachain_graph::{
    CommunityDetector, GraphBuilder, GraphError, MetricsEngine, NetworkSummarizer,
    NetworkSummary,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

fn scope_label(scope: &Scope) -> String {
    match scope {
        Scope::User(id) => format!("user:{}", id),
        Scope::All => "all".to_string(),
    }
}

pub struct KarmaChainService {
    config: KarmaChainConfig,
    store: Arc<dyn RelationshipStore>,
    builder: GraphBuilder,
    metrics: MetricsEngine,
    detector: CommunityDetector,
    summarizer: NetworkSummarizer,
    weights: Arc<WeightAccessor>,
    projector: TrajectoryProjector,
    recommender: RecommendationEngine,
    normalizer: Normalizer,
    bridge: SignalBridge,
}

impl KarmaChainService {
    /// Compose the service. Context weights are loaded from the configured
    /// path at construction when one is set.
    pub fn new(
        config: KarmaChainConfig,
        store: Arc<dyn RelationshipStore>,
    ) -> ServiceResult<Self> {
        let weights = Arc::new(WeightAccessor::new(
            config.prediction.base_weights.clone(),
            config.prediction.default_q,
            config.prediction.max_context_multiplier,
        ));
        if let Some(path) = &config.context_weights_path {
            weights.load_context_file(path).map_err(ServiceError::from)?;
        }

        let projector = TrajectoryProjector::new(
            Arc::clone(&weights),
            config.prediction.horizon,
            config.prediction.penalties.clone(),
        );
        let normalizer = Normalizer::new(Arc::clone(&weights), Arc::clone(&store));
        let bridge = SignalBridge::new(config.bridge.clone());

        info!(
            horizon = config.prediction.horizon,
            bridge_enabled = config.bridge.enabled,
            "karmachain service composed"
        );

        Ok(Self {
            builder: GraphBuilder::new(config.graph.clone()),
            metrics: MetricsEngine::new(config.graph.clone()),
            detector: CommunityDetector::new(config.graph.clone()),
            summarizer: NetworkSummarizer::default(),
            weights,
            projector,
            recommender: RecommendationEngine::default(),
            normalizer,
            bridge,
            config,
            store,
        })
    }

    /// Replace the learned weight table snapshot (explicit reload signal).
    pub fn reload_weight_table(&self, table: WeightTable) {
        self.weights.reload_table(table);
    }

    /// Load a trained weight table artifact from disk and swap it in.
    pub fn load_weight_table(&self, path: impl AsRef<std::path::Path>) -> ServiceResult<()> {
        self.weights.reload_table(WeightTable::load_json(path)?);
        Ok(())
    }

    /// Re-read the context-weights artifact from the configured path.
    pub fn reload_context_weights(&self) -> ServiceResult<()> {
        match &self.config.context_weights_path {
            Some(path) => Ok(self.weights.load_context_file(path)?),
            None => Err(ServiceError::Validation(
                "no context weights path configured".into(),
            )),
        }
    }

    /// Full network analysis for a scope. A scope with zero relationships
    /// yields a well-formed empty summary rather than an error.
    pub async fn network_summary(&self, scope: &Scope) -> ServiceResult<NetworkSummary> {
        let records = self.store.get_relationships(scope).await?;

        let graph = match self.builder.build(scope, &records) {
            Ok(graph) => graph,
            Err(GraphError::EmptyScope(_)) => {
                return Ok(self.summarizer.empty(scope_label(scope)));
            }
            Err(other) => return Err(other.into()),
        };

        let metrics = self.metrics.compute(&graph);
        let partition = self.detector.detect(&graph)?;
        Ok(self.summarizer.summarize(scope_label(scope), &metrics, &partition))
    }

    /// Relationships involving a user, newest first, optionally filtered
    /// by direction.
    pub async fn list_relationships(
        &self,
        user_id: &str,
        direction: Direction,
    ) -> ServiceResult<Vec<Relationship>> {
        let records = self
            .store
            .get_relationships(&Scope::user(user_id))
            .await?;

        Ok(records
            .into_iter()
            .filter(|r| match direction {
                Direction::Debts => r.debtor_id == user_id,
                Direction::Credits => r.receiver_id == user_id,
                Direction::All => true,
            })
            .collect())
    }

    pub async fn relationship(&self, id: Uuid) -> ServiceResult<Relationship> {
        Ok(self.store.get_relationship(id).await?)
    }

    pub async fn create_debt(&self, req: &CreateDebtRequest) -> ServiceResult<Relationship> {
        let rel = self
            .store
            .create_relationship(
                &req.debtor_id,
                &req.receiver_id,
                req.amount,
                req.severity,
                &req.action_type,
            )
            .await?;
        self.record_mutation("debt_created", &rel).await?;
        Ok(rel)
    }

    pub async fn repay_debt(&self, req: &RepayRequest) -> ServiceResult<Relationship> {
        let rel = self
            .store
            .append_repayment(req.relationship_id, req.amount)
            .await?;
        self.record_mutation("debt_repaid", &rel).await?;
        Ok(rel)
    }

    pub async fn transfer_debt(&self, req: &TransferRequest) -> ServiceResult<Relationship> {
        let rel = self
            .store
            .transfer(req.relationship_id, &req.new_debtor)
            .await?;
        self.record_mutation("debt_transferred", &rel).await?;
        Ok(rel)
    }

    /// Expire open relationships older than the configured horizon.
    pub async fn expire_stale(&self) -> ServiceResult<usize> {
        let horizon = Duration::days(i64::from(self.config.expiry_horizon_days));
        Ok(self.store.expire_stale(Utc::now(), horizon).await?)
    }

    /// Project a user's Agami trajectory with recommendations attached.
    pub async fn predict_agami(&self, req: &PredictRequest) -> ServiceResult<AgamiPrediction> {
        let scope = Scope::user(&req.user_id);
        let records = self.store.get_relationships(&scope).await?;

        let graph = match self.builder.build(&scope, &records) {
            Ok(graph) => graph,
            Err(GraphError::EmptyScope(_)) => {
                return Err(ServiceError::InsufficientHistory(req.user_id.clone()));
            }
            Err(other) => return Err(other.into()),
        };
        let metrics = self.metrics.compute(&graph);

        let node = metrics
            .node(&req.user_id)
            .ok_or_else(|| ServiceError::InsufficientHistory(req.user_id.clone()))?;

        // History is the user's own edges, both directions.
        let user_idx = graph
            .node_index(&req.user_id)
            .ok_or_else(|| ServiceError::InsufficientHistory(req.user_id.clone()))?;
        let mut action_counts: BTreeMap<String, f64> = BTreeMap::new();
        let mut history_count = 0usize;
        for edge in graph.edges() {
            if edge.from == user_idx || edge.to == user_idx {
                *action_counts.entry(edge.action_type.clone()).or_default() += 1.0;
                history_count += 1;
            }
        }
        let total: f64 = action_counts.values().sum();
        if total > 0.0 {
            for share in action_counts.values_mut() {
                *share /= total;
            }
        }

        let inputs = ProjectionInputs {
            user_id: req.user_id.clone(),
            current_karma: node.weighted_debt_in - node.weighted_debt_out,
            action_distribution: action_counts,
            history_count,
            metrics_converged: metrics.converged,
            context_key: req.context_key.clone(),
        };

        let horizon = req.horizon.unwrap_or(self.projector.default_horizon());
        let mut prediction = self.projector.project_horizon(&inputs, horizon)?;
        prediction.recommendations =
            self.recommender.recommend(&self.projector, &inputs, &prediction);
        Ok(prediction)
    }

    pub fn context_weights(&self, key: &str) -> Option<ContextMultipliers> {
        self.weights.context(key)
    }

    pub fn set_context_weights(
        &self,
        key: &str,
        entry: ContextMultipliers,
    ) -> ServiceResult<()> {
        Ok(self.weights.set_context(key, entry)?)
    }

    pub async fn normalize_state(
        &self,
        req: &NormalizeRequest,
    ) -> ServiceResult<NormalizedState> {
        self.normalizer.normalize(req).await
    }

    pub async fn normalize_state_batch(
        &self,
        reqs: &[NormalizeRequest],
    ) -> ServiceResult<Vec<NormalizedState>> {
        self.normalizer.normalize_batch(reqs).await
    }

    /// Forward a karmic feedback signal and record the outcome in the
    /// ledger. Bridge failures are reported in the result, not raised.
    pub async fn forward_signal(&self, signal: &KarmicSignal) -> ServiceResult<BridgeReport> {
        let report = self.bridge.forward(signal).await;

        let event = KarmaEvent::new(
            "signal_forwarded",
            &signal.user_id,
            serde_json::to_value(&report).map_err(|e| ServiceError::Internal(e.to_string()))?,
            "stp_bridge",
        );
        self.store.record_event(event).await?;
        Ok(report)
    }

    /// Forward a batch of signals, recording one ledger event each.
    pub async fn forward_signal_batch(
        &self,
        signals: &[KarmicSignal],
    ) -> ServiceResult<Vec<BridgeReport>> {
        let mut reports = Vec::with_capacity(signals.len());
        for signal in signals {
            reports.push(self.forward_signal(signal).await?);
        }
        Ok(reports)
    }

    pub async fn bridge_health(&self) -> BridgeHealth {
        self.bridge.health().await
    }

    async fn record_mutation(&self, event_type: &str, rel: &Relationship) -> ServiceResult<()> {
        let event = KarmaEvent::new(
            event_type,
            &rel.debtor_id,
            serde_json::to_value(rel).map_err(|e| ServiceError::Internal(e.to_string()))?,
            "relationship_api",
        );
        self.store.record_event(event).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use karmachain_agami::{StateBand, WeightEntry};
    use karmachain_core::{InMemoryStore, Severity};

    async fn service() -> KarmaChainService {
        let mut config = KarmaChainConfig::default();
        config.bridge.enabled = false;
        KarmaChainService::new(config, Arc::new(InMemoryStore::new())).unwrap()
    }

    fn debt(debtor: &str, receiver: &str, amount: f64, action: &str) -> CreateDebtRequest {
        CreateDebtRequest {
            debtor_id: debtor.to_string(),
            receiver_id: receiver.to_string(),
            amount,
            severity: Severity::Moderate,
            action_type: action.to_string(),
        }
    }

    #[tokio::test]
    async fn test_empty_scope_yields_empty_summary() {
        let svc = service().await;
        let summary = svc.network_summary(&Scope::user("nobody")).await.unwrap();
        assert_eq!(summary.node_count, 0);
        assert_eq!(summary.scope, "user:nobody");
    }

    #[tokio::test]
    async fn test_direction_filters() {
        let svc = service().await;
        svc.create_debt(&debt("arjuna", "karna", 10.0, "trade")).await.unwrap();
        svc.create_debt(&debt("karna", "arjuna", 5.0, "gift")).await.unwrap();

        let debts = svc.list_relationships("arjuna", Direction::Debts).await.unwrap();
        assert_eq!(debts.len(), 1);
        assert_eq!(debts[0].debtor_id, "arjuna");

        let credits = svc.list_relationships("arjuna", Direction::Credits).await.unwrap();
        assert_eq!(credits.len(), 1);
        assert_eq!(credits[0].receiver_id, "arjuna");

        let all = svc.list_relationships("arjuna", Direction::All).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_mutations_land_in_ledger() {
        let svc = service().await;
        let rel = svc.create_debt(&debt("arjuna", "karna", 10.0, "trade")).await.unwrap();
        svc.repay_debt(&RepayRequest {
            relationship_id: rel.relationship_id,
            amount: 4.0,
        })
        .await
        .unwrap();

        let events = svc.store.events_for_user("arjuna").await.unwrap();
        let types: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert!(types.contains(&"debt_created"));
        assert!(types.contains(&"debt_repaid"));
    }

    #[tokio::test]
    async fn test_predict_refuses_unknown_user() {
        let svc = service().await;
        let err = svc
            .predict_agami(&PredictRequest {
                user_id: "ghost".to_string(),
                context_key: None,
                horizon: None,
            })
            .await;
        assert!(matches!(err, Err(ServiceError::InsufficientHistory(_))));
    }

    #[tokio::test]
    async fn test_predict_returns_trajectory_with_recommendations() {
        let svc = service().await;
        svc.reload_weight_table(WeightTable::from_entries(vec![
            WeightEntry {
                band: StateBand::Neutral,
                action_type: "trade".to_string(),
                value: 1.0,
            },
            WeightEntry {
                band: StateBand::Neutral,
                action_type: "donation".to_string(),
                value: 2.0,
            },
        ]));
        svc.create_debt(&debt("karna", "arjuna", 25.0, "trade")).await.unwrap();

        let prediction = svc
            .predict_agami(&PredictRequest {
                user_id: "arjuna".to_string(),
                context_key: None,
                horizon: Some(10),
            })
            .await
            .unwrap();

        assert_eq!(prediction.horizon, 10);
        assert_eq!(prediction.deltas.len(), 10);
        // arjuna is owed 25, owes nothing.
        assert!(prediction.projected_karma > 0.0);
        assert!(!prediction.recommendations.is_empty());
        assert_eq!(prediction.recommendations[0].action_type, "donation");
    }

    #[tokio::test]
    async fn test_predict_counts_both_edge_directions() {
        let svc = service().await;
        svc.reload_weight_table(WeightTable::from_entries(vec![
            WeightEntry {
                band: StateBand::Neutral,
                action_type: "donation".to_string(),
                value: 2.0,
            },
            WeightEntry {
                band: StateBand::Neutral,
                action_type: "trade".to_string(),
                value: 1.0,
            },
        ]));
        // arjuna owes one trade and is owed one donation; both edges count
        // toward the action distribution.
        svc.create_debt(&debt("arjuna", "karna", 10.0, "trade")).await.unwrap();
        svc.create_debt(&debt("karna", "arjuna", 10.0, "donation")).await.unwrap();

        let prediction = svc
            .predict_agami(&PredictRequest {
                user_id: "arjuna".to_string(),
                context_key: None,
                horizon: Some(5),
            })
            .await
            .unwrap();

        // Even split at karma 0: 0.5 * 2.0 + 0.5 * 1.0 per period.
        assert!((prediction.deltas[0] - 1.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_context_weight_round_trip() {
        let svc = service().await;
        assert!(svc.context_weights("realm").is_none());

        let entry = ContextMultipliers {
            dharma: 1.5,
            ..ContextMultipliers::default()
        };
        svc.set_context_weights("realm", entry).unwrap();
        assert_eq!(svc.context_weights("realm").unwrap(), entry);

        let bad = ContextMultipliers {
            artha: -1.0,
            ..ContextMultipliers::default()
        };
        let err = svc.set_context_weights("realm", bad);
        assert!(matches!(err, Err(ServiceError::InvalidWeight(_))));
        assert_eq!(svc.context_weights("realm").unwrap(), entry);
    }

    #[tokio::test]
    async fn test_disabled_bridge_reports_skipped() {
        let svc = service().await;
        let report = svc
            .forward_signal(&KarmicSignal {
                user_id: "arjuna".to_string(),
                signal_type: "karma_delta".to_string(),
                payload: serde_json::json!({"delta": 1.0}),
            })
            .await
            .unwrap();
        assert_eq!(report, BridgeReport::Skipped);

        let events = svc.store.events_for_user("arjuna").await.unwrap();
        assert_eq!(events[0].event_type, "signal_forwarded");
    }
}
