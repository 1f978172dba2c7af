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

//! Relationship store adapter
//!
//! The only point of contact with persistence. The core treats the store
//! as strongly consistent per record: a write is visible to the next read
//! for that record, and a mutation either fully applies or not at all.
//!
//! `InMemoryStore` is the reference implementation used for development
//! and testing; production deployments provide their own
//! `RelationshipStore` over a durable engine.

use crate::action::KarmaEvent;
use crate::error::{KarmaError, KarmaResult};
use crate::relationship::{Relationship, Severity};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Scope of a read or analysis request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Everything touching one user (as debtor or receiver)
    User(String),
    /// The whole graph
    All,
}

impl Scope {
    pub fn user(id: impl Into<String>) -> Self {
        Scope::User(id.into())
    }
}

/// Narrow adapter for reading and writing relationship records.
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    /// All relationships visible to the scope, newest first.
    async fn get_relationships(&self, scope: &Scope) -> KarmaResult<Vec<Relationship>>;

    /// Single relationship by id.
    async fn get_relationship(&self, id: Uuid) -> KarmaResult<Relationship>;

    /// Create a new active relationship after validating constraints.
    async fn create_relationship(
        &self,
        debtor_id: &str,
        receiver_id: &str,
        amount: f64,
        severity: Severity,
        action_type: &str,
    ) -> KarmaResult<Relationship>;

    /// Append a repayment; returns the updated record.
    async fn append_repayment(&self, id: Uuid, amount: f64) -> KarmaResult<Relationship>;

    /// Close the relationship for transfer and open the successor edge.
    /// Returns the new active relationship on the transferee.
    async fn transfer(&self, id: Uuid, new_debtor: &str) -> KarmaResult<Relationship>;

    /// Expire open relationships untouched for longer than `horizon`.
    /// Returns the number of records transitioned.
    async fn expire_stale(&self, now: DateTime<Utc>, horizon: Duration) -> KarmaResult<usize>;

    /// Append to the karma event ledger.
    async fn record_event(&self, event: KarmaEvent) -> KarmaResult<()>;

    /// Ledger entries for a user, oldest first.
    async fn events_for_user(&self, user_id: &str) -> KarmaResult<Vec<KarmaEvent>>;
}

/// In-memory store for development and testing.
///
/// Mutations take the write lock on the record map, which serializes them:
/// a racing repay and transfer against the same id resolve to exactly one
/// full application, never a partial one.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    /// Relationships by id
    relationships: RwLock<HashMap<Uuid, Relationship>>,
    /// Secondary index: user id -> relationship ids touching that user
    by_user: RwLock<HashMap<String, Vec<Uuid>>>,
    /// Karma event ledger by user
    events: DashMap<String, Vec<KarmaEvent>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn index_relationship(&self, rel: &Relationship) {
        let mut by_user = self.by_user.write().await;
        for user in [&rel.debtor_id, &rel.receiver_id] {
            let ids = by_user.entry(user.clone()).or_default();
            if !ids.contains(&rel.relationship_id) {
                ids.push(rel.relationship_id);
            }
        }
    }
}

#[async_trait]
impl RelationshipStore for InMemoryStore {
    async fn get_relationships(&self, scope: &Scope) -> KarmaResult<Vec<Relationship>> {
        let rels = self.relationships.read().await;

        let mut result: Vec<Relationship> = match scope {
            Scope::All => rels.values().cloned().collect(),
            Scope::User(user_id) => {
                let by_user = self.by_user.read().await;
                by_user
                    .get(user_id)
                    .map(|ids| ids.iter().filter_map(|id| rels.get(id).cloned()).collect())
                    .unwrap_or_default()
            }
        };

        result.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(a.relationship_id.cmp(&b.relationship_id))
        });
        Ok(result)
    }

    async fn get_relationship(&self, id: Uuid) -> KarmaResult<Relationship> {
        let rels = self.relationships.read().await;
        rels.get(&id)
            .cloned()
            .ok_or_else(|| KarmaError::NotFound(format!("relationship {}", id)))
    }

    async fn create_relationship(
        &self,
        debtor_id: &str,
        receiver_id: &str,
        amount: f64,
        severity: Severity,
        action_type: &str,
    ) -> KarmaResult<Relationship> {
        let rel = Relationship::new(debtor_id, receiver_id, amount, severity, action_type)?;

        {
            let mut rels = self.relationships.write().await;
            rels.insert(rel.relationship_id, rel.clone());
        }
        self.index_relationship(&rel).await;

        debug!(
            relationship_id = %rel.relationship_id,
            debtor = %rel.debtor_id,
            receiver = %rel.receiver_id,
            amount = rel.amount,
            "created relationship"
        );
        Ok(rel)
    }

    async fn append_repayment(&self, id: Uuid, amount: f64) -> KarmaResult<Relationship> {
        let mut rels = self.relationships.write().await;
        let rel = rels
            .get_mut(&id)
            .ok_or_else(|| KarmaError::NotFound(format!("relationship {}", id)))?;

        rel.record_repayment(amount, Utc::now())?;
        debug!(
            relationship_id = %id,
            amount,
            outstanding = rel.amount_outstanding(),
            status = rel.status.as_str(),
            "appended repayment"
        );
        Ok(rel.clone())
    }

    async fn transfer(&self, id: Uuid, new_debtor: &str) -> KarmaResult<Relationship> {
        let successor = {
            let mut rels = self.relationships.write().await;
            let rel = rels
                .get_mut(&id)
                .ok_or_else(|| KarmaError::NotFound(format!("relationship {}", id)))?;

            let successor = rel.transfer_to(new_debtor, Utc::now())?;
            rels.insert(successor.relationship_id, successor.clone());
            successor
        };
        self.index_relationship(&successor).await;

        debug!(
            old = %id,
            new = %successor.relationship_id,
            debtor = %successor.debtor_id,
            "transferred relationship"
        );
        Ok(successor)
    }

    async fn expire_stale(&self, now: DateTime<Utc>, horizon: Duration) -> KarmaResult<usize> {
        let cutoff = now - horizon;
        let mut expired = 0usize;

        let mut rels = self.relationships.write().await;
        for rel in rels.values_mut() {
            if !rel.status.is_terminal() && rel.updated_at < cutoff {
                rel.expire(now)?;
                expired += 1;
            }
        }

        if expired > 0 {
            debug!(expired, "expired stale relationships");
        }
        Ok(expired)
    }

    async fn record_event(&self, event: KarmaEvent) -> KarmaResult<()> {
        self.events
            .entry(event.user_id.clone())
            .or_default()
            .push(event);
        Ok(())
    }

    async fn events_for_user(&self, user_id: &str) -> KarmaResult<Vec<KarmaEvent>> {
        Ok(self
            .events
            .get(user_id)
            .map(|e| e.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn store_with_debt(amount: f64) -> (Arc<InMemoryStore>, Uuid) {
        let store = Arc::new(InMemoryStore::new());
        let rel = store
            .create_relationship("arjuna", "karna", amount, Severity::Moderate, "unpaid_favor")
            .await
            .unwrap();
        (store, rel.relationship_id)
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let (store, id) = store_with_debt(100.0).await;
        let rel = store.get_relationship(id).await.unwrap();
        assert_eq!(rel.debtor_id, "arjuna");
        assert_eq!(rel.amount, 100.0);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let store = InMemoryStore::new();
        let err = store.get_relationship(Uuid::new_v4()).await;
        assert!(matches!(err, Err(KarmaError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_scope_filters_by_user() {
        let (store, _) = store_with_debt(100.0).await;
        store
            .create_relationship("bhima", "nakula", 20.0, Severity::Minor, "gift")
            .await
            .unwrap();

        let arjuna = store
            .get_relationships(&Scope::user("arjuna"))
            .await
            .unwrap();
        assert_eq!(arjuna.len(), 1);

        let all = store.get_relationships(&Scope::All).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_listing_is_newest_first() {
        let store = InMemoryStore::new();
        for amount in [1.0, 2.0, 3.0] {
            store
                .create_relationship("arjuna", "karna", amount, Severity::Minor, "favor")
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let rels = store
            .get_relationships(&Scope::user("arjuna"))
            .await
            .unwrap();
        assert_eq!(rels[0].amount, 3.0);
        assert_eq!(rels[2].amount, 1.0);
    }

    #[tokio::test]
    async fn test_transfer_indexes_new_debtor() {
        let (store, id) = store_with_debt(100.0).await;
        let successor = store.transfer(id, "bhima").await.unwrap();

        let bhima = store.get_relationships(&Scope::user("bhima")).await.unwrap();
        assert_eq!(bhima.len(), 1);
        assert_eq!(bhima[0].relationship_id, successor.relationship_id);

        let old = store.get_relationship(id).await.unwrap();
        assert!(old.status.is_terminal());
    }

    #[tokio::test]
    async fn test_concurrent_repay_and_transfer_resolve_to_one() {
        let (store, id) = store_with_debt(100.0).await;

        let s1 = Arc::clone(&store);
        let s2 = Arc::clone(&store);
        let repay = tokio::spawn(async move { s1.append_repayment(id, 100.0).await });
        let transfer = tokio::spawn(async move { s2.transfer(id, "bhima").await });

        let repay = repay.await.unwrap();
        let transfer = transfer.await.unwrap();

        // Exactly one mutation applies; the loser sees a terminal edge.
        assert!(
            repay.is_ok() ^ transfer.is_ok(),
            "repay: {:?}, transfer: {:?}",
            repay.as_ref().map(|r| r.status),
            transfer.as_ref().map(|r| r.status)
        );

        let rel = store.get_relationship(id).await.unwrap();
        assert!(rel.status.is_terminal());
    }

    #[tokio::test]
    async fn test_expire_stale_sweeps_open_edges() {
        let (store, id) = store_with_debt(100.0).await;

        // Nothing is stale yet
        let n = store
            .expire_stale(Utc::now(), Duration::days(90))
            .await
            .unwrap();
        assert_eq!(n, 0);

        // Everything older than "the future minus zero days" is stale
        let n = store
            .expire_stale(Utc::now() + Duration::days(1), Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(n, 1);

        let rel = store.get_relationship(id).await.unwrap();
        assert_eq!(rel.status.as_str(), "expired");
    }

    #[tokio::test]
    async fn test_event_ledger_round_trip() {
        let store = InMemoryStore::new();
        let event = KarmaEvent::new(
            "normalized_state",
            "arjuna",
            serde_json::json!({"value": 1.5}),
            "normalization_api_game",
        );
        store.record_event(event.clone()).await.unwrap();

        let events = store.events_for_user("arjuna").await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "normalized_state");
    }
}
