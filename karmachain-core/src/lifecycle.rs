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

//! Relationship lifecycle state machine.

use crate::relationship::RelationshipStatus;
use thiserror::Error;

/// Events that drive relationship status transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipEvent {
    /// Partial repayment leaving a positive outstanding amount
    Repay,
    /// Repayment bringing the outstanding amount to zero
    FullRepay,
    /// Debt moved to a new debtor; closes this edge
    Transfer,
    /// Inactivity horizon reached
    Expire,
}

#[derive(Debug, Error)]
#[error("{current:?} does not accept {event:?}")]
pub struct InvalidTransition {
    pub current: RelationshipStatus,
    pub event: RelationshipEvent,
}

impl RelationshipStatus {
    /// Apply a lifecycle event, returning the next status.
    pub fn transition(self, event: RelationshipEvent) -> Result<RelationshipStatus, InvalidTransition> {
        use RelationshipEvent::*;
        use RelationshipStatus::*;

        let next = match (self, event) {
            (Active, Repay) => PartiallyRepaid,
            (PartiallyRepaid, Repay) => PartiallyRepaid,
            (Active, FullRepay) => Repaid,
            (PartiallyRepaid, FullRepay) => Repaid,
            (Active, Transfer) => Transferred,
            (PartiallyRepaid, Transfer) => Transferred,
            (Active, Expire) => Expired,
            (PartiallyRepaid, Expire) => Expired,
            _ => {
                return Err(InvalidTransition {
                    current: self,
                    event,
                })
            }
        };

        Ok(next)
    }
}
