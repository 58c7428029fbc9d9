// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::Address;
use efund_fhe::CiphertextHandle;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecryptError {
    #[error("Signature does not authorize this request: {0}")]
    SignatureInvalid(String),

    #[error("Grant valid from {start} until {expires_at} is not valid at {now}")]
    GrantExpired { start: u64, expires_at: u64, now: u64 },

    #[error("{user} is not entitled to decrypt {handle}")]
    NotEntitled {
        handle: CiphertextHandle,
        user: Address,
    },

    #[error("Ciphertext {0} has not been materialized")]
    NotMaterialized(CiphertextHandle),

    #[error("Invalid decryption request: {0}")]
    InvalidRequest(String),

    #[error("Relayer did not answer within {0:?}")]
    Timeout(Duration),

    #[error("A decryption of {0} is already in flight")]
    AlreadyInFlight(CiphertextHandle),

    #[error("Sealing failed: {0}")]
    Sealing(String),

    #[error("Relayer error: {0}")]
    Relayer(String),
}

impl DecryptError {
    /// Whether a new attempt with a fresh keypair and grant may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DecryptError::Timeout(_) | DecryptError::Relayer(_) | DecryptError::GrantExpired { .. }
        )
    }
}

pub type DecryptResult<T> = std::result::Result<T, DecryptError>;
