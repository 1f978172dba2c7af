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

//! End-to-end flows through the composed service: debt lifecycle, network
//! analysis, Agami prediction, normalization, and the repay/transfer race.

use karmachain_agami::{StateBand, WeightEntry, WeightTable};
use karmachain_core::{
    InMemoryStore, KarmaChainConfig, RelationshipStatus, Scope, Severity, SourceModule,
};
use karmachain_graph::NetworkSummary;
use karmachain_service::{
    CreateDebtRequest, Direction, KarmaChainService, NormalizeRequest, PredictRequest,
    RepayRequest, ServiceError, TransferRequest,
};
use std::sync::Arc;

fn service() -> KarmaChainService {
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
async fn test_debt_lifecycle_end_to_end() {
    let svc = service();

    let rel = svc.create_debt(&debt("arjuna", "karna", 100.0, "trade")).await.unwrap();
    assert_eq!(rel.status, RelationshipStatus::Active);

    let rel = svc
        .repay_debt(&RepayRequest {
            relationship_id: rel.relationship_id,
            amount: 40.0,
        })
        .await
        .unwrap();
    assert_eq!(rel.status, RelationshipStatus::PartiallyRepaid);
    assert!((rel.amount_outstanding() - 60.0).abs() < 1e-9);

    let rel = svc
        .repay_debt(&RepayRequest {
            relationship_id: rel.relationship_id,
            amount: 60.0,
        })
        .await
        .unwrap();
    assert_eq!(rel.status, RelationshipStatus::Repaid);
    assert_eq!(rel.amount_outstanding(), 0.0);

    // Terminal edges reject further mutation.
    let err = svc
        .repay_debt(&RepayRequest {
            relationship_id: rel.relationship_id,
            amount: 1.0,
        })
        .await;
    assert!(matches!(err, Err(ServiceError::InvalidTransition(_))));
}

#[tokio::test]
async fn test_transfer_preserves_outstanding() {
    let svc = service();

    let rel = svc.create_debt(&debt("arjuna", "karna", 80.0, "trade")).await.unwrap();
    svc.repay_debt(&RepayRequest {
        relationship_id: rel.relationship_id,
        amount: 30.0,
    })
    .await
    .unwrap();

    let successor = svc
        .transfer_debt(&TransferRequest {
            relationship_id: rel.relationship_id,
            new_debtor: "bhima".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(successor.debtor_id, "bhima");
    assert!((successor.amount_outstanding() - 50.0).abs() < 1e-9);
    assert_eq!(successor.transfer_chain, vec!["arjuna".to_string()]);

    let old = svc.relationship(rel.relationship_id).await.unwrap();
    assert_eq!(old.status, RelationshipStatus::Transferred);

    let bhima_debts = svc.list_relationships("bhima", Direction::Debts).await.unwrap();
    assert_eq!(bhima_debts.len(), 1);
}

#[tokio::test]
async fn test_network_summary_round_trip() {
    let svc = service();

    // Two tight triads joined by nothing.
    for (a, b) in [
        ("arjuna", "karna"),
        ("karna", "bhima"),
        ("bhima", "arjuna"),
        ("drona", "kripa"),
        ("kripa", "vidura"),
        ("vidura", "drona"),
    ] {
        svc.create_debt(&debt(a, b, 10.0, "trade")).await.unwrap();
    }

    let summary = svc.network_summary(&Scope::All).await.unwrap();
    assert_eq!(summary.node_count, 6);
    assert_eq!(summary.edge_count, 6);
    assert_eq!(summary.community_count, 2);
    assert!(summary.modularity > 0.0);

    let exported = summary.to_json().unwrap();
    let imported = NetworkSummary::from_json(&exported).unwrap();
    assert_eq!(imported.communities, summary.communities);
    assert_eq!(imported.modularity.to_bits(), summary.modularity.to_bits());
    for (a, b) in imported.node_metrics.iter().zip(&summary.node_metrics) {
        assert_eq!(a.centrality.to_bits(), b.centrality.to_bits());
    }
}

#[tokio::test]
async fn test_prediction_flow_with_context() {
    let svc = service();
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

    svc.create_debt(&debt("karna", "arjuna", 30.0, "donation")).await.unwrap();
    svc.create_debt(&debt("bhima", "arjuna", 10.0, "trade")).await.unwrap();

    let prediction = svc
        .predict_agami(&PredictRequest {
            user_id: "arjuna".to_string(),
            context_key: None,
            horizon: None,
        })
        .await
        .unwrap();

    assert_eq!(prediction.horizon, 30);
    assert!(prediction.confidence > 0.0 && prediction.confidence <= 1.0);
    assert!(prediction.projected_karma > 40.0);
    assert!(!prediction.predicted_role.is_empty());
    assert!(!prediction.recommendations.is_empty());

    // A boosted dharma context raises the projection.
    svc.set_context_weights(
        "gurukul_teacher",
        karmachain_agami::ContextMultipliers {
            dharma: 2.0,
            ..Default::default()
        },
    )
    .unwrap();

    let boosted = svc
        .predict_agami(&PredictRequest {
            user_id: "arjuna".to_string(),
            context_key: Some("gurukul_teacher".to_string()),
            horizon: None,
        })
        .await
        .unwrap();
    assert!(boosted.projected_karma >= prediction.projected_karma);
}

#[tokio::test]
async fn test_normalization_feeds_ledger() {
    let svc = service();

    let states = svc
        .normalize_state_batch(&[
            NormalizeRequest {
                user_id: "arjuna".to_string(),
                module: SourceModule::Game,
                action_type: "quest_complete".to_string(),
                raw_value: 5.0,
            },
            NormalizeRequest {
                user_id: "arjuna".to_string(),
                module: SourceModule::Gurukul,
                action_type: "lesson_complete".to_string(),
                raw_value: 5.0,
            },
        ])
        .await
        .unwrap();

    assert!((states[0].feedback_value - 6.0).abs() < 1e-12);
    assert!((states[1].feedback_value - 6.5).abs() < 1e-12);
}

#[tokio::test]
async fn test_context_weights_loaded_from_configured_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(
        &mut file,
        br#"{
            "context_weights": {
                "game_warrior": {"dharma": 1.0, "artha": 1.3, "kama": 1.1, "moksha": 0.8}
            },
            "default_behavior_weights": {"finance": 1.0, "game": 1.5, "gurukul": 1.3, "insight": 1.1}
        }"#,
    )
    .unwrap();

    let mut config = KarmaChainConfig::default();
    config.bridge.enabled = false;
    config.context_weights_path = Some(file.path().to_path_buf());
    let svc = KarmaChainService::new(config, Arc::new(InMemoryStore::new())).unwrap();

    let entry = svc.context_weights("game_warrior").unwrap();
    assert_eq!(entry.artha, 1.3);

    let state = svc
        .normalize_state(&NormalizeRequest {
            user_id: "arjuna".to_string(),
            module: SourceModule::Game,
            action_type: "duel_won".to_string(),
            raw_value: 2.0,
        })
        .await
        .unwrap();
    assert!((state.feedback_value - 3.0).abs() < 1e-12);

    svc.reload_context_weights().unwrap();
    assert!(svc.context_weights("game_warrior").is_some());
}

#[tokio::test]
async fn test_concurrent_repay_and_transfer_race() {
    let svc = Arc::new(service());
    let rel = svc.create_debt(&debt("arjuna", "karna", 50.0, "trade")).await.unwrap();
    let id = rel.relationship_id;

    let repay = {
        let svc = Arc::clone(&svc);
        tokio::spawn(async move {
            svc.repay_debt(&RepayRequest {
                relationship_id: id,
                amount: 50.0,
            })
            .await
        })
    };
    let transfer = {
        let svc = Arc::clone(&svc);
        tokio::spawn(async move {
            svc.transfer_debt(&TransferRequest {
                relationship_id: id,
                new_debtor: "bhima".to_string(),
            })
            .await
        })
    };

    let repay = repay.await.unwrap();
    let transfer = transfer.await.unwrap();

    // Exactly one mutation wins; the loser sees a terminal-state rejection.
    assert!(
        repay.is_ok() ^ transfer.is_ok(),
        "repay: {:?}, transfer: {:?}",
        repay.as_ref().map(|r| r.status),
        transfer.as_ref().map(|r| r.status)
    );

    let final_state = svc.relationship(id).await.unwrap();
    assert!(final_state.status.is_terminal());
}
