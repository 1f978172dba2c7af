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

//! KarmaChain service layer
//!
//! Transport-agnostic request/response contracts and the composed service
//! facade over the ledger, graph engines, and Agami predictor, plus the
//! behavioral-state normalizer and the outbound InsightFlow signal bridge.

pub mod api;
pub mod bridge;
pub mod error;
pub mod normalize;
pub mod service;

pub use api::{
    CreateDebtRequest, Direction, KarmicSignal, NormalizeRequest, NormalizedState,
    PredictRequest, RepayRequest, TransferRequest,
};
pub use bridge::{BridgeHealth, BridgeReport, SignalBridge};
pub use error::{ServiceError, ServiceResult};
pub use normalize::Normalizer;
pub use service::KarmaChainService;
