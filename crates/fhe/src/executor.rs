// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::CiphertextHandle;
use alloy_primitives::Address;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FheError {
    #[error("Ciphertext handle {0} is not known to the executor")]
    UnknownHandle(CiphertextHandle),

    #[error("Encrypted subtraction would underflow")]
    Underflow,

    #[error("Input proof rejected: {0}")]
    InvalidProof(String),
}

pub type FheResult<T> = std::result::Result<T, FheError>;

/// Homomorphic operations over 64 bit encrypted integers, as offered to ledger contracts by
/// the execution environment.
///
/// Every operation returns a fresh handle and never reveals a plaintext to the caller. The
/// [`CiphertextHandle::EMPTY`] sentinel is accepted wherever an operand is expected and
/// behaves as an encrypted zero.
pub trait FheExecutor: Send + Sync {
    /// Encrypt a public value (`asEuint64`). The result is visible to nobody until allowed.
    fn trivial_encrypt(&self, value: u64) -> FheResult<CiphertextHandle>;

    fn add(&self, lhs: CiphertextHandle, rhs: CiphertextHandle) -> FheResult<CiphertextHandle>;

    /// Subtract `rhs` from `lhs`. Fails with [`FheError::Underflow`] when the executor
    /// reports that the debit cannot be covered.
    fn sub(&self, lhs: CiphertextHandle, rhs: CiphertextHandle) -> FheResult<CiphertextHandle>;

    /// Check that `input` was encrypted for exactly `(contract, sender)` and that `proof`
    /// attests to it being a well formed 64 bit value. On success `contract` is transiently
    /// allowed to use the returned handle, until [`FheExecutor::clear_transient`].
    fn verify_input(
        &self,
        input: CiphertextHandle,
        proof: &[u8],
        contract: Address,
        sender: Address,
    ) -> FheResult<CiphertextHandle>;

    /// Add `account` to the access list of `handle`.
    fn allow(&self, handle: CiphertextHandle, account: Address) -> FheResult<()>;

    /// Allow `account` to use `handle` for the current call only (`allowTransient`).
    fn allow_transient(&self, handle: CiphertextHandle, account: Address) -> FheResult<()>;

    /// Drop every transient grant. Called when a ledger call finishes, whether it succeeded or
    /// not.
    fn clear_transient(&self);

    /// Persistent or transient access.
    fn is_allowed(&self, handle: CiphertextHandle, account: Address) -> bool;

    /// Whether the handle refers to a ciphertext that has actually been produced.
    fn is_materialized(&self, handle: CiphertextHandle) -> bool;

    /// Reveal the plaintext. Only the decryption authority calls this, after it has checked
    /// the requester's grant and the handle's access list.
    fn decrypt(&self, handle: CiphertextHandle) -> FheResult<u64>;
}
