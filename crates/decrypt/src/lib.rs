// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! User decryption for ciphertext handles.
//!
//! A requester proves who they are by signing an EIP-712 grant over a fresh ephemeral public key
//! and the contracts whose handles it wants to read. The relayer checks the grant against the
//! access lists, then seals each plaintext so only the holder of the ephemeral secret can open it.

mod client;
mod eip712;
mod error;
mod keypair;
mod relayer;
mod request;
mod seal;

pub use client::*;
pub use eip712::*;
pub use error::*;
pub use keypair::*;
pub use relayer::*;
pub use request::*;
pub use seal::*;
