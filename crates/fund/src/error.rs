// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::FundStatus;
use alloy_primitives::Address;
use efund_fhe::FheError;
use efund_token::TokenError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FundError {
    #[error("Only the creator {creator} may do this, caller was {caller}")]
    Unauthorized { caller: Address, creator: Address },

    #[error("Fund is already configured")]
    AlreadyConfigured,

    #[error("Fund is already closed")]
    AlreadyClosed,

    #[error("Fund has not been configured")]
    NotConfigured,

    #[error("Fund is not accepting contributions ({status})")]
    NotActive { status: FundStatus },

    #[error("Invalid input proof: {0}")]
    InvalidProof(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Fhe(#[from] FheError),
}

impl FundError {
    /// Input verification failures keep their own variant; everything else the capability
    /// reports is passed through.
    pub(crate) fn from_input(err: FheError) -> Self {
        match err {
            FheError::InvalidProof(reason) => FundError::InvalidProof(reason),
            other => FundError::Fhe(other),
        }
    }
}

pub type FundResult<T> = std::result::Result<T, FundError>;
