// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use efund_fhe::CiphertextHandle;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::IntoStaticStr;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundConfigured {
    pub fund: Address,
    pub name: String,
    pub goal: u64,
    pub end_time: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionReceived {
    pub fund: Address,
    pub contributor: Address,
    /// Encrypted amount that was moved into the fund.
    pub amount: CiphertextHandle,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundClosed {
    pub fund: Address,
    pub creator: Address,
    /// Encrypted amount swept to the creator.
    pub amount: CiphertextHandle,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorSet {
    pub token: Address,
    pub holder: Address,
    pub operator: Address,
    pub until: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidentialTransfer {
    pub token: Address,
    pub from: Address,
    pub to: Address,
    pub amount: CiphertextHandle,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Minted {
    pub token: Address,
    pub to: Address,
    /// Mint amounts are public on the ledger.
    pub amount: u64,
}

/// Everything the ledger contracts emit. Events are only recorded once the call that produced
/// them has fully committed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr)]
pub enum LedgerEvent {
    FundConfigured(FundConfigured),
    ContributionReceived(ContributionReceived),
    FundClosed(FundClosed),
    OperatorSet(OperatorSet),
    ConfidentialTransfer(ConfidentialTransfer),
    Minted(Minted),
}

impl LedgerEvent {
    pub fn event_type(&self) -> &'static str {
        self.into()
    }

    /// Contract that emitted the event.
    pub fn emitter(&self) -> Address {
        match self {
            LedgerEvent::FundConfigured(e) => e.fund,
            LedgerEvent::ContributionReceived(e) => e.fund,
            LedgerEvent::FundClosed(e) => e.fund,
            LedgerEvent::OperatorSet(e) => e.token,
            LedgerEvent::ConfidentialTransfer(e) => e.token,
            LedgerEvent::Minted(e) => e.token,
        }
    }
}

macro_rules! impl_from_event {
    ($($name:ident),*) => {
        $(
            impl From<$name> for LedgerEvent {
                fn from(value: $name) -> Self {
                    LedgerEvent::$name(value)
                }
            }
        )*
    };
}

impl_from_event!(
    FundConfigured,
    ContributionReceived,
    FundClosed,
    OperatorSet,
    ConfidentialTransfer,
    Minted
);

impl fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerEvent::FundConfigured(e) => write!(
                f,
                "FundConfigured {{ name: {}, goal: {}, end_time: {} }}",
                e.name, e.goal, e.end_time
            ),
            LedgerEvent::ContributionReceived(e) => write!(
                f,
                "ContributionReceived {{ contributor: {}, amount: {:?} }}",
                e.contributor, e.amount
            ),
            LedgerEvent::FundClosed(e) => write!(
                f,
                "FundClosed {{ creator: {}, amount: {:?} }}",
                e.creator, e.amount
            ),
            LedgerEvent::OperatorSet(e) => write!(
                f,
                "OperatorSet {{ holder: {}, operator: {}, until: {} }}",
                e.holder, e.operator, e.until
            ),
            LedgerEvent::ConfidentialTransfer(e) => write!(
                f,
                "ConfidentialTransfer {{ from: {}, to: {}, amount: {:?} }}",
                e.from, e.to, e.amount
            ),
            LedgerEvent::Minted(e) => {
                write!(f, "Minted {{ to: {}, amount: {} }}", e.to, e.amount)
            }
        }
    }
}
