// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Campaign parameters. Written once by `configure` and never changed afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundConfig {
    pub creator: Address,
    pub name: String,
    /// Target in base units of the token. Advisory only, progress is never compared on-ledger.
    pub goal: u64,
    pub end_time: u64,
}

/// Lifecycle of a fund. Moves strictly forward: `Unconfigured -> Open -> Closed`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FundPhase {
    #[default]
    Unconfigured,
    Open(FundConfig),
    Closed(FundConfig),
}

impl FundPhase {
    pub fn config(&self) -> Option<&FundConfig> {
        match self {
            FundPhase::Unconfigured => None,
            FundPhase::Open(config) | FundPhase::Closed(config) => Some(config),
        }
    }

    pub fn is_configured(&self) -> bool {
        !matches!(self, FundPhase::Unconfigured)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, FundPhase::Closed(_))
    }

    /// Open and before its end time. Reaching `end_time` needs no ledger write.
    pub fn is_active(&self, now: u64) -> bool {
        matches!(self, FundPhase::Open(config) if now < config.end_time)
    }

    pub fn status(&self, now: u64) -> FundStatus {
        match self {
            FundPhase::Unconfigured => FundStatus::Unconfigured,
            FundPhase::Closed(_) => FundStatus::Closed,
            FundPhase::Open(config) if now < config.end_time => FundStatus::Live,
            FundPhase::Open(_) => FundStatus::Ended,
        }
    }
}

/// Externally observed status, derived from the phase and the current time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum FundStatus {
    #[strum(to_string = "Not configured")]
    Unconfigured,
    Live,
    Ended,
    Closed,
}
