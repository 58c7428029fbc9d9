// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! The homomorphic capability the ledger is built on.
//!
//! Nothing in this workspace implements FHE. Contracts only ever see [`CiphertextHandle`]s
//! and ask an [`FheExecutor`] to combine, verify, grant access to, or (for the decryption
//! authority only) reveal them. [`MockFheExecutor`] keeps plaintexts behind the handles so
//! the rest of the system can be exercised end to end.

mod executor;
mod handle;
mod mock;

pub use executor::*;
pub use handle::*;
pub use mock::*;
