// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{DecryptError, DecryptResult};
use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use alloy::primitives::{Bytes, FixedBytes, B256};
use efund_fhe::CiphertextHandle;
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

const SEAL_DOMAIN: &[u8] = b"efund.user-decrypt.seal.v1";
const NONCE_LEN: usize = 12;

/// A plaintext encrypted to a requester's ephemeral public key.
///
/// The sender side generates its own one-off X25519 key, so the relayer keeps no long-lived
/// sealing key. The handle is authenticated as associated data, so a sealed value cannot be
/// passed off as the plaintext of another handle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedValue {
    pub handle: CiphertextHandle,
    pub ephemeral_public: B256,
    pub nonce: FixedBytes<NONCE_LEN>,
    pub ciphertext: Bytes,
}

fn derive_key(shared: &[u8; 32], sender: &[u8; 32], recipient: &[u8; 32]) -> Zeroizing<[u8; 32]> {
    let digest = Sha256::new()
        .chain_update(SEAL_DOMAIN)
        .chain_update(shared)
        .chain_update(sender)
        .chain_update(recipient)
        .finalize();
    Zeroizing::new(digest.into())
}

pub fn seal(recipient: &PublicKey, handle: CiphertextHandle, value: u64) -> DecryptResult<SealedValue> {
    let sender = StaticSecret::random_from_rng(OsRng);
    let sender_public = PublicKey::from(&sender);
    let shared = sender.diffie_hellman(recipient);
    let key = derive_key(shared.as_bytes(), sender_public.as_bytes(), recipient.as_bytes());

    let cipher = Aes256Gcm::new_from_slice(key.as_slice())
        .map_err(|e| DecryptError::Sealing(e.to_string()))?;
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let plaintext = Zeroizing::new(value.to_be_bytes());
    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: plaintext.as_slice(),
                aad: handle.as_slice(),
            },
        )
        .map_err(|_| DecryptError::Sealing("could not encrypt plaintext".to_string()))?;

    Ok(SealedValue {
        handle,
        ephemeral_public: B256::from(*sender_public.as_bytes()),
        nonce: FixedBytes::from(nonce),
        ciphertext: ciphertext.into(),
    })
}

pub fn open_sealed(secret: &StaticSecret, sealed: &SealedValue) -> DecryptResult<u64> {
    let recipient = PublicKey::from(secret);
    let sender_public = PublicKey::from(sealed.ephemeral_public.0);
    let shared = secret.diffie_hellman(&sender_public);
    let key = derive_key(shared.as_bytes(), sender_public.as_bytes(), recipient.as_bytes());

    let cipher = Aes256Gcm::new_from_slice(key.as_slice())
        .map_err(|e| DecryptError::Sealing(e.to_string()))?;
    let plaintext = Zeroizing::new(
        cipher
            .decrypt(
                Nonce::from_slice(sealed.nonce.as_slice()),
                Payload {
                    msg: sealed.ciphertext.as_ref(),
                    aad: sealed.handle.as_slice(),
                },
            )
            .map_err(|_| {
                DecryptError::Sealing(format!("could not open sealed value for {}", sealed.handle))
            })?,
    );

    let bytes: [u8; 8] = plaintext.as_slice().try_into().map_err(|_| {
        DecryptError::Sealing(format!("expected 8 plaintext bytes, got {}", plaintext.len()))
    })?;
    Ok(u64::from_be_bytes(bytes))
}
