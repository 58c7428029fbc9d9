// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::B256;
use efund_utils::short_hex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Byte position holding the encrypted type tag inside a handle.
const TYPE_BYTE: usize = 30;
/// Byte position holding the handle format version.
const VERSION_BYTE: usize = 31;
pub const HANDLE_VERSION: u8 = 0;

/// Encrypted types a handle may point at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FheType {
    Bool = 0,
    Uint8 = 2,
    Uint16 = 3,
    Uint32 = 4,
    Uint64 = 5,
}

impl TryFrom<u8> for FheType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FheType::Bool),
            2 => Ok(FheType::Uint8),
            3 => Ok(FheType::Uint16),
            4 => Ok(FheType::Uint32),
            5 => Ok(FheType::Uint64),
            other => Err(other),
        }
    }
}

/// Opaque, content addressed reference to a ciphertext held by the executor.
///
/// The all-zero handle is the "empty" sentinel: it is what a mapping returns for a key that
/// was never written and it acts as the additive identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CiphertextHandle(B256);

impl CiphertextHandle {
    pub const EMPTY: Self = Self(B256::ZERO);

    pub const fn new(inner: B256) -> Self {
        Self(inner)
    }

    /// Build a handle from a 32 byte digest, stamping the type and version bytes.
    pub fn from_digest(digest: B256, fhe_type: FheType) -> Self {
        let mut bytes = digest.0;
        bytes[TYPE_BYTE] = fhe_type as u8;
        bytes[VERSION_BYTE] = HANDLE_VERSION;
        Self(B256::from(bytes))
    }

    pub fn is_empty(&self) -> bool {
        self.0 == B256::ZERO
    }

    pub fn fhe_type(&self) -> Option<FheType> {
        if self.is_empty() {
            return None;
        }
        FheType::try_from(self.0[TYPE_BYTE]).ok()
    }

    pub fn as_b256(&self) -> &B256 {
        &self.0
    }

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl From<B256> for CiphertextHandle {
    fn from(value: B256) -> Self {
        Self(value)
    }
}

impl From<CiphertextHandle> for B256 {
    fn from(value: CiphertextHandle) -> Self {
        value.0
    }
}

impl FromStr for CiphertextHandle {
    type Err = <B256 as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(B256::from_str(s)?))
    }
}

impl fmt::Display for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "CiphertextHandle(EMPTY)");
        }
        write!(f, "CiphertextHandle({})", short_hex(self.as_slice()))
    }
}
