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

//! Karmic relationship records (rnanubandhan)
//!
//! A `Relationship` is one directed debt edge between two users. Mutations
//! never rewrite history: repayments append entries, transfers close the
//! current edge and open a new one carrying the transfer chain, and expiry
//! is a status transition. Records are never physically deleted.

use crate::error::{KarmaError, KarmaResult};
use crate::lifecycle::RelationshipEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tolerance for treating an outstanding f64 amount as fully repaid.
pub const REPAYMENT_EPSILON: f64 = 1e-9;

/// Ordered severity of the originating action.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Moderate,
    Severe,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minor => "minor",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
            Self::Critical => "critical",
        }
    }
}

/// Lifecycle status of a relationship edge.
///
/// `Repaid` and `Expired` are terminal. `Transferred` is terminal for this
/// edge but spawns a new active edge on the transferee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    Active,
    PartiallyRepaid,
    Repaid,
    Transferred,
    Expired,
}

impl RelationshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::PartiallyRepaid => "partially_repaid",
            Self::Repaid => "repaid",
            Self::Transferred => "transferred",
            Self::Expired => "expired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Repaid | Self::Transferred | Self::Expired)
    }
}

/// A single repayment against a relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentEntry {
    pub amount: f64,
    pub at: DateTime<Utc>,
}

/// One karmic debt edge between a debtor and a receiver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    /// Unique edge id
    pub relationship_id: Uuid,
    /// User who owes the karmic debt
    pub debtor_id: String,
    /// User the debt is owed to
    pub receiver_id: String,
    /// Original (non-negative) karma magnitude
    pub amount: f64,
    /// Severity of the originating action
    pub severity: Severity,
    /// Categorical label of the originating action
    pub action_type: String,
    /// Current lifecycle status
    pub status: RelationshipStatus,
    /// Creation time of this edge
    pub created_at: DateTime<Utc>,
    /// Last mutation time (repayment, transfer, expiry)
    pub updated_at: DateTime<Utc>,
    /// Ordered repayments; their sum never exceeds `amount`
    pub repayment_history: Vec<RepaymentEntry>,
    /// Prior debtor ids, oldest first, for transferred debts
    pub transfer_chain: Vec<String>,
}

impl Relationship {
    /// Create a new active relationship, validating the edge constraints.
    pub fn new(
        debtor_id: impl Into<String>,
        receiver_id: impl Into<String>,
        amount: f64,
        severity: Severity,
        action_type: impl Into<String>,
    ) -> KarmaResult<Self> {
        let debtor_id = debtor_id.into();
        let receiver_id = receiver_id.into();

        if !amount.is_finite() || amount < 0.0 {
            return Err(KarmaError::Validation(format!(
                "relationship amount must be a non-negative finite number, got {}",
                amount
            )));
        }
        if debtor_id == receiver_id {
            return Err(KarmaError::Validation(format!(
                "self-relationship rejected for user '{}'",
                debtor_id
            )));
        }
        if debtor_id.is_empty() || receiver_id.is_empty() {
            return Err(KarmaError::Validation(
                "debtor and receiver ids must be non-empty".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            relationship_id: Uuid::new_v4(),
            debtor_id,
            receiver_id,
            amount,
            severity,
            action_type: action_type.into(),
            status: RelationshipStatus::Active,
            created_at: now,
            updated_at: now,
            repayment_history: Vec::new(),
            transfer_chain: Vec::new(),
        })
    }

    /// Total repaid so far.
    pub fn amount_repaid(&self) -> f64 {
        self.repayment_history.iter().map(|r| r.amount).sum()
    }

    /// Remaining debt; invariant: always >= 0.
    pub fn amount_outstanding(&self) -> f64 {
        (self.amount - self.amount_repaid()).max(0.0)
    }

    /// Append a repayment, transitioning status accordingly.
    ///
    /// Rejects non-positive amounts, over-repayment, and repayments against
    /// a terminal edge. The record is unchanged on any error.
    pub fn record_repayment(&mut self, amount: f64, at: DateTime<Utc>) -> KarmaResult<()> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(KarmaError::Validation(format!(
                "repayment amount must be a positive finite number, got {}",
                amount
            )));
        }

        // Terminal edges reject uniformly before any amount arithmetic, so
        // a repaid edge reports the lifecycle violation rather than an
        // over-repayment against its zero outstanding balance.
        if self.status.is_terminal() {
            return Err(KarmaError::InvalidTransition(format!(
                "repayment on {} relationship {}",
                self.status.as_str(),
                self.relationship_id
            )));
        }

        let outstanding = self.amount_outstanding();
        if amount > outstanding + REPAYMENT_EPSILON {
            return Err(KarmaError::Validation(format!(
                "over-repayment: {} exceeds outstanding {}",
                amount, outstanding
            )));
        }

        let fully_repaid = outstanding - amount <= REPAYMENT_EPSILON;
        let event = if fully_repaid {
            RelationshipEvent::FullRepay
        } else {
            RelationshipEvent::Repay
        };
        let next = self.status.transition(event).map_err(|e| {
            KarmaError::InvalidTransition(format!(
                "repayment on {} relationship {}: {}",
                self.status.as_str(),
                self.relationship_id,
                e
            ))
        })?;

        self.repayment_history.push(RepaymentEntry { amount, at });
        self.status = next;
        self.updated_at = at;
        Ok(())
    }

    /// Close this edge for transfer and build the successor edge.
    ///
    /// The successor preserves the outstanding amount and appends the
    /// current debtor to the transfer chain. The original amount on the new
    /// edge equals the outstanding amount, with an empty repayment history.
    pub fn transfer_to(&mut self, new_debtor: &str, at: DateTime<Utc>) -> KarmaResult<Relationship> {
        if new_debtor == self.receiver_id {
            return Err(KarmaError::Validation(format!(
                "transfer would create a self-relationship for user '{}'",
                new_debtor
            )));
        }
        if new_debtor == self.debtor_id {
            return Err(KarmaError::Validation(
                "transfer to the current debtor is a no-op".to_string(),
            ));
        }

        let next = self
            .status
            .transition(RelationshipEvent::Transfer)
            .map_err(|e| {
                KarmaError::InvalidTransition(format!(
                    "transfer of {} relationship {}: {}",
                    self.status.as_str(),
                    self.relationship_id,
                    e
                ))
            })?;

        let mut chain = self.transfer_chain.clone();
        chain.push(self.debtor_id.clone());

        let successor = Relationship {
            relationship_id: Uuid::new_v4(),
            debtor_id: new_debtor.to_string(),
            receiver_id: self.receiver_id.clone(),
            amount: self.amount_outstanding(),
            severity: self.severity,
            action_type: self.action_type.clone(),
            status: RelationshipStatus::Active,
            created_at: at,
            updated_at: at,
            repayment_history: Vec::new(),
            transfer_chain: chain,
        };

        self.status = next;
        self.updated_at = at;
        Ok(successor)
    }

    /// Time-based expiry transition.
    pub fn expire(&mut self, at: DateTime<Utc>) -> KarmaResult<()> {
        let next = self
            .status
            .transition(RelationshipEvent::Expire)
            .map_err(|e| {
                KarmaError::InvalidTransition(format!(
                    "expiry of {} relationship {}: {}",
                    self.status.as_str(),
                    self.relationship_id,
                    e
                ))
            })?;
        self.status = next;
        self.updated_at = at;
        Ok(())
    }

    /// Whether this edge touches the given user (as debtor or receiver).
    pub fn involves(&self, user_id: &str) -> bool {
        self.debtor_id == user_id || self.receiver_id == user_id
    }
}
