// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{CiphertextHandle, FheError, FheExecutor, FheResult, FheType};
use alloy_primitives::{keccak256, Address, B256};
use efund_utils::ArcBytes;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::trace;

const INPUT_PROOF_DOMAIN: &[u8] = b"efund.mock.input-proof";

/// A client side encrypted value together with the proof binding it to a contract and user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedInput {
    pub handle: CiphertextHandle,
    pub proof: ArcBytes,
}

#[derive(Default)]
struct MockState {
    plaintexts: HashMap<CiphertextHandle, u64>,
    acl: HashMap<CiphertextHandle, HashSet<Address>>,
    transient: HashMap<CiphertextHandle, HashSet<Address>>,
    input_scopes: HashMap<CiphertextHandle, (Address, Address)>,
    nonce: u64,
}

/// Test double for [`FheExecutor`] doing plaintext arithmetic behind the handles.
///
/// Every result gets a fresh handle, so access granted on one value never leaks to another value
/// that happens to be computed the same way.
#[derive(Default)]
pub struct MockFheExecutor {
    state: Mutex<MockState>,
}

impl MockFheExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Client side encryption (`createEncryptedInput(contract, user).add64(value).encrypt()`).
    pub fn encrypt_input(&self, value: u64, contract: Address, user: Address) -> EncryptedInput {
        let mut state = self.state();
        state.nonce += 1;
        let digest = keccak256(
            [
                b"input".as_slice(),
                &state.nonce.to_be_bytes(),
                contract.as_slice(),
                user.as_slice(),
            ]
            .concat(),
        );
        let handle = CiphertextHandle::from_digest(digest, FheType::Uint64);
        state.plaintexts.insert(handle, value);
        state.input_scopes.insert(handle, (contract, user));
        trace!(?handle, %contract, %user, "encrypted input");

        EncryptedInput {
            handle,
            proof: ArcBytes::from_bytes(input_proof(handle, contract, user).to_vec()),
        }
    }

    fn derive(state: &mut MockState, op: &[u8], operands: &[&[u8]]) -> CiphertextHandle {
        state.nonce += 1;
        let mut preimage = op.to_vec();
        preimage.extend_from_slice(&state.nonce.to_be_bytes());
        for operand in operands {
            preimage.extend_from_slice(operand);
        }
        CiphertextHandle::from_digest(keccak256(preimage), FheType::Uint64)
    }

    fn value_of(state: &MockState, handle: CiphertextHandle) -> FheResult<u64> {
        if handle.is_empty() {
            return Ok(0);
        }
        state
            .plaintexts
            .get(&handle)
            .copied()
            .ok_or(FheError::UnknownHandle(handle))
    }
}

fn input_proof(handle: CiphertextHandle, contract: Address, user: Address) -> B256 {
    keccak256(
        [
            INPUT_PROOF_DOMAIN,
            handle.as_slice(),
            contract.as_slice(),
            user.as_slice(),
        ]
        .concat(),
    )
}

impl FheExecutor for MockFheExecutor {
    fn trivial_encrypt(&self, value: u64) -> FheResult<CiphertextHandle> {
        let mut state = self.state();
        let handle = Self::derive(&mut state, b"trivial", &[&value.to_be_bytes()]);
        state.plaintexts.insert(handle, value);
        Ok(handle)
    }

    fn add(&self, lhs: CiphertextHandle, rhs: CiphertextHandle) -> FheResult<CiphertextHandle> {
        let mut state = self.state();
        let sum = Self::value_of(&state, lhs)?.wrapping_add(Self::value_of(&state, rhs)?);
        let handle = Self::derive(&mut state, b"add", &[lhs.as_slice(), rhs.as_slice()]);
        state.plaintexts.insert(handle, sum);
        Ok(handle)
    }

    fn sub(&self, lhs: CiphertextHandle, rhs: CiphertextHandle) -> FheResult<CiphertextHandle> {
        let mut state = self.state();
        let diff = Self::value_of(&state, lhs)?
            .checked_sub(Self::value_of(&state, rhs)?)
            .ok_or(FheError::Underflow)?;
        let handle = Self::derive(&mut state, b"sub", &[lhs.as_slice(), rhs.as_slice()]);
        state.plaintexts.insert(handle, diff);
        Ok(handle)
    }

    fn verify_input(
        &self,
        input: CiphertextHandle,
        proof: &[u8],
        contract: Address,
        sender: Address,
    ) -> FheResult<CiphertextHandle> {
        let mut state = self.state();
        let Some(&(bound_contract, bound_user)) = state.input_scopes.get(&input) else {
            return Err(FheError::InvalidProof(format!("unknown input {input}")));
        };
        if (bound_contract, bound_user) != (contract, sender) {
            return Err(FheError::InvalidProof(format!(
                "input was encrypted for ({bound_contract}, {bound_user})"
            )));
        }
        if proof != input_proof(input, contract, sender).as_slice() {
            return Err(FheError::InvalidProof(
                "proof does not attest to this input".to_string(),
            ));
        }
        state.transient.entry(input).or_default().insert(contract);
        Ok(input)
    }

    fn allow(&self, handle: CiphertextHandle, account: Address) -> FheResult<()> {
        if handle.is_empty() {
            return Ok(());
        }
        let mut state = self.state();
        if !state.plaintexts.contains_key(&handle) {
            return Err(FheError::UnknownHandle(handle));
        }
        state.acl.entry(handle).or_default().insert(account);
        Ok(())
    }

    fn allow_transient(&self, handle: CiphertextHandle, account: Address) -> FheResult<()> {
        if handle.is_empty() {
            return Ok(());
        }
        let mut state = self.state();
        if !state.plaintexts.contains_key(&handle) {
            return Err(FheError::UnknownHandle(handle));
        }
        state.transient.entry(handle).or_default().insert(account);
        Ok(())
    }

    fn clear_transient(&self) {
        self.state().transient.clear();
    }

    fn is_allowed(&self, handle: CiphertextHandle, account: Address) -> bool {
        let state = self.state();
        [&state.acl, &state.transient].iter().any(|lists| {
            lists
                .get(&handle)
                .is_some_and(|accounts| accounts.contains(&account))
        })
    }

    fn is_materialized(&self, handle: CiphertextHandle) -> bool {
        !handle.is_empty() && self.state().plaintexts.contains_key(&handle)
    }

    fn decrypt(&self, handle: CiphertextHandle) -> FheResult<u64> {
        let state = self.state();
        if handle.is_empty() {
            return Err(FheError::UnknownHandle(handle));
        }
        Self::value_of(&state, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::repeat_byte(n)
    }

    #[test]
    fn addition_is_homomorphic() -> FheResult<()> {
        let fhe = MockFheExecutor::new();
        let a = fhe.trivial_encrypt(7)?;
        let b = fhe.trivial_encrypt(35)?;
        let sum = fhe.add(a, b)?;
        assert_eq!(fhe.decrypt(sum)?, 42);
        Ok(())
    }

    #[test]
    fn empty_handle_is_the_additive_identity() -> FheResult<()> {
        let fhe = MockFheExecutor::new();
        let a = fhe.trivial_encrypt(9)?;
        let sum = fhe.add(CiphertextHandle::EMPTY, a)?;
        assert_eq!(fhe.decrypt(sum)?, 9);
        assert!(!fhe.is_materialized(CiphertextHandle::EMPTY));
        Ok(())
    }

    #[test]
    fn results_get_fresh_handles() -> FheResult<()> {
        let fhe = MockFheExecutor::new();
        let a = fhe.trivial_encrypt(1)?;
        let first = fhe.add(CiphertextHandle::EMPTY, a)?;
        let second = fhe.add(CiphertextHandle::EMPTY, a)?;
        assert_ne!(first, second);
        fhe.allow(first, addr(1))?;
        assert!(!fhe.is_allowed(second, addr(1)));
        Ok(())
    }

    #[test]
    fn subtraction_underflow_is_reported() -> FheResult<()> {
        let fhe = MockFheExecutor::new();
        let small = fhe.trivial_encrypt(1)?;
        let big = fhe.trivial_encrypt(2)?;
        assert_eq!(fhe.sub(small, big), Err(FheError::Underflow));
        assert_eq!(fhe.decrypt(fhe.sub(big, small)?)?, 1);
        Ok(())
    }

    #[test]
    fn inputs_only_verify_for_their_scope() -> FheResult<()> {
        let fhe = MockFheExecutor::new();
        let (fund, alice, bob) = (addr(1), addr(2), addr(3));
        let input = fhe.encrypt_input(10, fund, alice);

        assert!(matches!(
            fhe.verify_input(input.handle, &input.proof, fund, bob),
            Err(FheError::InvalidProof(_))
        ));
        assert!(matches!(
            fhe.verify_input(input.handle, &input.proof, addr(9), alice),
            Err(FheError::InvalidProof(_))
        ));
        assert!(!fhe.is_allowed(input.handle, fund));

        let handle = fhe.verify_input(input.handle, &input.proof, fund, alice)?;
        assert_eq!(handle, input.handle);
        assert!(fhe.is_allowed(handle, fund));
        assert_eq!(fhe.decrypt(handle)?, 10);
        Ok(())
    }

    #[test]
    fn verified_inputs_are_only_allowed_for_the_call() -> FheResult<()> {
        let fhe = MockFheExecutor::new();
        let (fund, alice) = (addr(1), addr(2));
        let input = fhe.encrypt_input(10, fund, alice);
        let handle = fhe.verify_input(input.handle, &input.proof, fund, alice)?;
        let kept = fhe.trivial_encrypt(3)?;
        fhe.allow(kept, fund)?;

        fhe.clear_transient();
        assert!(!fhe.is_allowed(handle, fund));
        assert!(fhe.is_allowed(kept, fund));
        Ok(())
    }

    #[test]
    fn tampered_proof_is_rejected() {
        let fhe = MockFheExecutor::new();
        let (fund, alice) = (addr(1), addr(2));
        let input = fhe.encrypt_input(10, fund, alice);
        let mut proof = input.proof.extract_bytes();
        proof[0] ^= 0xff;
        assert!(matches!(
            fhe.verify_input(input.handle, &proof, fund, alice),
            Err(FheError::InvalidProof(_))
        ));
    }

    #[test]
    fn access_lists_are_per_handle() -> FheResult<()> {
        let fhe = MockFheExecutor::new();
        let handle = fhe.trivial_encrypt(5)?;
        assert!(!fhe.is_allowed(handle, addr(1)));
        fhe.allow(handle, addr(1))?;
        assert!(fhe.is_allowed(handle, addr(1)));
        assert!(!fhe.is_allowed(handle, addr(2)));
        Ok(())
    }

    #[test]
    fn unknown_handles_cannot_be_allowed() {
        let fhe = MockFheExecutor::new();
        let bogus = CiphertextHandle::from_digest(keccak256(b"bogus"), FheType::Uint64);
        assert_eq!(
            fhe.allow(bogus, addr(1)),
            Err(FheError::UnknownHandle(bogus))
        );
    }
}
