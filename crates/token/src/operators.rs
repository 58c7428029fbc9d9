// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use std::collections::HashMap;

/// Time bounded delegations keyed by `(holder, operator)`.
///
/// Only the expiry is stored. Whether a grant is live is decided when it is read, so expired
/// grants simply stop counting and never need cleaning up.
#[derive(Clone, Debug, Default)]
pub struct OperatorRegistry {
    grants: HashMap<(Address, Address), u64>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write wins. Setting `until` in the past revokes.
    pub fn set(&mut self, holder: Address, operator: Address, until: u64) {
        self.grants.insert((holder, operator), until);
    }

    pub fn expiry(&self, holder: Address, operator: Address) -> Option<u64> {
        self.grants.get(&(holder, operator)).copied()
    }

    /// A holder always acts for itself. Anyone else needs a grant expiring after `now`.
    pub fn is_operator(&self, holder: Address, operator: Address, now: u64) -> bool {
        holder == operator
            || self
                .expiry(holder, operator)
                .is_some_and(|until| until > now)
    }
}
