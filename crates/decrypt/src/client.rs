// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{
    decryption_domain, DecryptError, DecryptResult, DecryptionGrant, HandleContractPair, Relayer,
};
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::Eip712Domain;
use efund_config::{AppConfig, DecryptionConfig};
use efund_fhe::CiphertextHandle;
use efund_utils::{retry_with_backoff, Clock, RetryError};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::time::timeout;
use tracing::{debug, info};

/// Runs the user decryption protocol on behalf of one user.
///
/// Each attempt signs a new grant over a new ephemeral keypair. The empty handle decrypts to
/// `None` without contacting the relayer.
pub struct DecryptionClient {
    relayer: Arc<dyn Relayer>,
    signer: PrivateKeySigner,
    domain: Eip712Domain,
    contracts_chain_id: u64,
    settings: DecryptionConfig,
    clock: Arc<dyn Clock>,
    in_flight: Mutex<HashSet<CiphertextHandle>>,
}

/// Releases claimed handles when the request finishes, however it finishes.
struct InFlight<'a> {
    registry: &'a Mutex<HashSet<CiphertextHandle>>,
    handles: Vec<CiphertextHandle>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        for handle in &self.handles {
            registry.remove(handle);
        }
    }
}

impl DecryptionClient {
    pub fn new(
        relayer: Arc<dyn Relayer>,
        signer: PrivateKeySigner,
        domain: Eip712Domain,
        contracts_chain_id: u64,
        settings: DecryptionConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            relayer,
            signer,
            domain,
            contracts_chain_id,
            settings,
            clock,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn from_config(
        config: &AppConfig,
        relayer: Arc<dyn Relayer>,
        signer: PrivateKeySigner,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(
            relayer,
            signer,
            decryption_domain(&config.relayer.gateway),
            config.chain_id,
            config.decryption.clone(),
            clock,
        )
    }

    pub fn user_address(&self) -> Address {
        self.signer.address()
    }

    /// Decrypt a single handle the user is entitled to through `contract`.
    pub async fn user_decrypt(
        &self,
        handle: CiphertextHandle,
        contract: Address,
    ) -> DecryptResult<Option<u64>> {
        let mut values = self
            .decrypt_many(&[HandleContractPair::new(handle, contract)])
            .await?;
        Ok(values.remove(&handle).flatten())
    }

    /// Decrypt several handles under a single grant. Empty handles map to `None`. Repeated pairs
    /// are requested once; a handle named under two different contracts is rejected.
    pub async fn decrypt_many(
        &self,
        pairs: &[HandleContractPair],
    ) -> DecryptResult<HashMap<CiphertextHandle, Option<u64>>> {
        let mut results = HashMap::with_capacity(pairs.len());
        let mut pending: Vec<HandleContractPair> = Vec::new();
        for pair in pairs {
            if pair.handle.is_empty() {
                results.insert(pair.handle, None);
                continue;
            }
            match pending.iter().find(|p| p.handle == pair.handle) {
                None => pending.push(*pair),
                Some(seen) if seen.contract_address == pair.contract_address => {}
                Some(seen) => {
                    return Err(DecryptError::InvalidRequest(format!(
                        "handle {} requested under both {} and {}",
                        pair.handle, seen.contract_address, pair.contract_address
                    )))
                }
            }
        }
        if pending.is_empty() {
            return Ok(results);
        }

        let _claim = self.claim(&pending)?;
        let pending = pending.as_slice();
        let opened = retry_with_backoff(
            |attempt| async move {
                self.attempt(pending, attempt).await.map_err(|err| {
                    if err.is_recoverable() {
                        RetryError::Retry(err)
                    } else {
                        RetryError::Failure(err)
                    }
                })
            },
            self.settings.max_attempts,
            self.settings.retry_delay_ms,
        )
        .await?;

        info!(user = %self.signer.address(), handles = opened.len(), "Decrypted handles");
        results.extend(opened.into_iter().map(|(handle, value)| (handle, Some(value))));
        Ok(results)
    }

    fn claim(&self, pairs: &[HandleContractPair]) -> DecryptResult<InFlight<'_>> {
        let mut registry = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(busy) = pairs.iter().find(|p| registry.contains(&p.handle)) {
            return Err(DecryptError::AlreadyInFlight(busy.handle));
        }
        let handles: Vec<_> = pairs.iter().map(|p| p.handle).collect();
        registry.extend(handles.iter().copied());
        Ok(InFlight {
            registry: &self.in_flight,
            handles,
        })
    }

    async fn attempt(
        &self,
        pairs: &[HandleContractPair],
        attempt: u32,
    ) -> DecryptResult<HashMap<CiphertextHandle, u64>> {
        let grant = DecryptionGrant::issue(
            &self.signer,
            &self.domain,
            self.contracts_chain_id,
            pairs.to_vec(),
            self.clock.now(),
            self.settings.validity_days,
        )?;
        let (keypair, request) = grant.into_parts();
        debug!(attempt, handles = pairs.len(), "Sending decryption request");

        let limit = self.settings.request_timeout();
        let response = timeout(limit, self.relayer.user_decrypt(request))
            .await
            .map_err(|_| DecryptError::Timeout(limit))??;

        let handles: Vec<_> = pairs.iter().map(|p| p.handle).collect();
        keypair.open(&response, &handles)
    }
}
