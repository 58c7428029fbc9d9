// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{open_sealed, DecryptError, DecryptResult, UserDecryptResponse};
use alloy::primitives::Bytes;
use efund_fhe::CiphertextHandle;
use rand::rngs::OsRng;
use std::collections::HashMap;
use std::fmt;
use x25519_dalek::{PublicKey, StaticSecret};

/// One-off keypair for a single decryption request.
///
/// Not `Clone`: [`EphemeralKeypair::open`] takes it by value, so a keypair can open exactly one
/// response. The secret is zeroized when dropped.
pub struct EphemeralKeypair {
    secret: StaticSecret,
    public: PublicKey,
}

impl EphemeralKeypair {
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    pub fn public_key(&self) -> Bytes {
        Bytes::copy_from_slice(self.public.as_bytes())
    }

    /// Open every sealed value for `expected`. A value missing from the response is an error.
    pub fn open(
        self,
        response: &UserDecryptResponse,
        expected: &[CiphertextHandle],
    ) -> DecryptResult<HashMap<CiphertextHandle, u64>> {
        let mut opened = HashMap::with_capacity(expected.len());
        for handle in expected {
            let sealed = response
                .values
                .iter()
                .find(|value| value.handle == *handle)
                .ok_or_else(|| DecryptError::Relayer(format!("response is missing {handle}")))?;
            opened.insert(*handle, open_sealed(&self.secret, sealed)?);
        }
        Ok(opened)
    }
}

impl fmt::Debug for EphemeralKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralKeypair")
            .field("public", &self.public_key())
            .finish_non_exhaustive()
    }
}
