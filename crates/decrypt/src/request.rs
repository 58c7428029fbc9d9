// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{DecryptError, DecryptResult, EphemeralKeypair, SealedValue, UserDecryptRequestVerification};
use alloy::primitives::{Address, Bytes, U256};
use alloy::signers::{local::PrivateKeySigner, SignerSync};
use alloy::sol_types::Eip712Domain;
use efund_config::MAX_VALIDITY_DAYS;
use efund_fhe::CiphertextHandle;
use efund_utils::SECONDS_PER_DAY;
use serde::{Deserialize, Serialize};
use x25519_dalek::PublicKey;

/// A handle and the contract whose access list entitles the user to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleContractPair {
    pub handle: CiphertextHandle,
    pub contract_address: Address,
}

impl HandleContractPair {
    pub fn new(handle: CiphertextHandle, contract_address: Address) -> Self {
        Self {
            handle,
            contract_address,
        }
    }
}

/// What the relayer receives. The ephemeral secret never leaves the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDecryptRequest {
    pub handles: Vec<HandleContractPair>,
    pub public_key: Bytes,
    pub signature: Bytes,
    pub contract_addresses: Vec<Address>,
    pub contracts_chain_id: u64,
    pub user_address: Address,
    pub start_timestamp: u64,
    pub duration_days: u64,
}

impl UserDecryptRequest {
    /// The EIP-712 message the signature has to cover.
    pub fn verification(&self) -> UserDecryptRequestVerification {
        UserDecryptRequestVerification {
            publicKey: self.public_key.clone(),
            contractAddresses: self.contract_addresses.clone(),
            contractsChainId: U256::from(self.contracts_chain_id),
            startTimestamp: U256::from(self.start_timestamp),
            durationDays: U256::from(self.duration_days),
        }
    }

    pub fn expires_at(&self) -> u64 {
        self.start_timestamp
            .saturating_add(self.duration_days.saturating_mul(SECONDS_PER_DAY))
    }

    pub fn recipient_key(&self) -> DecryptResult<PublicKey> {
        let bytes: [u8; 32] = self.public_key.as_ref().try_into().map_err(|_| {
            DecryptError::InvalidRequest(format!(
                "public key must be 32 bytes, got {}",
                self.public_key.len()
            ))
        })?;
        Ok(PublicKey::from(bytes))
    }

    /// Checks that hold regardless of who signed the request.
    pub fn validate(&self) -> DecryptResult<()> {
        if self.handles.is_empty() {
            return Err(DecryptError::InvalidRequest("no handles requested".to_string()));
        }
        if self.duration_days == 0 || self.duration_days > MAX_VALIDITY_DAYS {
            return Err(DecryptError::InvalidRequest(format!(
                "duration must be between 1 and {MAX_VALIDITY_DAYS} days, got {}",
                self.duration_days
            )));
        }
        if self.contract_addresses.contains(&self.user_address) {
            return Err(DecryptError::InvalidRequest(
                "user address may not be one of the contract addresses".to_string(),
            ));
        }
        for pair in &self.handles {
            if pair.handle.is_empty() {
                return Err(DecryptError::InvalidRequest(
                    "the empty handle has no plaintext".to_string(),
                ));
            }
            if !self.contract_addresses.contains(&pair.contract_address) {
                return Err(DecryptError::InvalidRequest(format!(
                    "{} is not covered by the signed contract addresses",
                    pair.contract_address
                )));
            }
        }
        self.recipient_key()?;
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDecryptResponse {
    pub values: Vec<SealedValue>,
}

/// A signed request together with the keypair that can open its response.
#[derive(Debug)]
pub struct DecryptionGrant {
    keypair: EphemeralKeypair,
    request: UserDecryptRequest,
}

impl DecryptionGrant {
    /// Generate a fresh keypair and sign a grant for `handles` with the user's key.
    pub fn issue(
        signer: &PrivateKeySigner,
        domain: &Eip712Domain,
        contracts_chain_id: u64,
        handles: Vec<HandleContractPair>,
        start_timestamp: u64,
        duration_days: u64,
    ) -> DecryptResult<Self> {
        let keypair = EphemeralKeypair::generate();
        let mut contract_addresses: Vec<Address> = Vec::new();
        for pair in &handles {
            if !contract_addresses.contains(&pair.contract_address) {
                contract_addresses.push(pair.contract_address);
            }
        }

        let mut request = UserDecryptRequest {
            handles,
            public_key: keypair.public_key(),
            signature: Bytes::new(),
            contract_addresses,
            contracts_chain_id,
            user_address: signer.address(),
            start_timestamp,
            duration_days,
        };
        request.validate()?;

        let hash = request.verification().signing_hash(domain);
        let signature = signer
            .sign_hash_sync(&hash)
            .map_err(|e| DecryptError::SignatureInvalid(e.to_string()))?;
        request.signature = Bytes::copy_from_slice(&signature.as_bytes());

        Ok(Self { keypair, request })
    }

    pub fn request(&self) -> &UserDecryptRequest {
        &self.request
    }

    pub fn into_parts(self) -> (EphemeralKeypair, UserDecryptRequest) {
        (self.keypair, self.request)
    }
}
