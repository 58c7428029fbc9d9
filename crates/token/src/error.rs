// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use efund_fhe::{CiphertextHandle, FheError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("{operator} is not an operator for {holder}")]
    OperatorNotAuthorized { holder: Address, operator: Address },

    #[error("Insufficient confidential balance for {holder}")]
    InsufficientBalance { holder: Address },

    #[error("{caller} may not mint")]
    Unauthorized { caller: Address },

    #[error("{caller} is not allowed to use ciphertext {handle}")]
    HandleNotAllowed {
        handle: CiphertextHandle,
        caller: Address,
    },

    #[error(transparent)]
    Fhe(#[from] FheError),
}

pub type TokenResult<T> = std::result::Result<T, TokenError>;
