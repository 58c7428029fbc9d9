// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{OperatorRegistry, TokenError, TokenResult};
use alloy_primitives::Address;
use efund_events::{CallContext, ConfidentialTransfer, EventLog, Minted, OperatorSet};
use efund_fhe::{CiphertextHandle, FheError, FheExecutor};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Who may create new tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MintPolicy {
    /// Anyone may mint. Used by the test token faucet.
    Open,
    /// Only the given account may mint.
    Owner(Address),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenMetadata {
    /// The confidential ether used to fund campaigns.
    pub fn feth() -> Self {
        Self {
            name: "FHEETH".to_string(),
            symbol: "fETH".to_string(),
            decimals: 6,
        }
    }
}

/// Confidential fungible token: every balance is a ciphertext handle and amounts are never
/// revealed on the ledger.
pub struct ConfidentialToken {
    address: Address,
    metadata: TokenMetadata,
    mint_policy: MintPolicy,
    balances: HashMap<Address, CiphertextHandle>,
    total_supply: CiphertextHandle,
    operators: OperatorRegistry,
    fhe: Arc<dyn FheExecutor>,
    events: EventLog,
}

impl ConfidentialToken {
    pub fn new(
        address: Address,
        metadata: TokenMetadata,
        mint_policy: MintPolicy,
        fhe: Arc<dyn FheExecutor>,
        events: EventLog,
    ) -> Self {
        Self {
            address,
            metadata,
            mint_policy,
            balances: HashMap::new(),
            total_supply: CiphertextHandle::EMPTY,
            operators: OperatorRegistry::new(),
            fhe,
            events,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    pub fn mint_policy(&self) -> MintPolicy {
        self.mint_policy
    }

    /// Balance handle of `holder`, the empty sentinel when it never held tokens.
    pub fn confidential_balance_of(&self, holder: Address) -> CiphertextHandle {
        self.balances.get(&holder).copied().unwrap_or_default()
    }

    pub fn confidential_total_supply(&self) -> CiphertextHandle {
        self.total_supply
    }

    pub fn is_operator(&self, holder: Address, operator: Address, now: u64) -> bool {
        self.operators.is_operator(holder, operator, now)
    }

    /// Let `operator` move the caller's balance until `until`. Overwrites any earlier grant.
    pub fn set_operator(&mut self, ctx: CallContext, operator: Address, until: u64) {
        self.operators.set(ctx.sender, operator, until);
        info!(token = %self.address, holder = %ctx.sender, %operator, until, "Operator set");
        self.events.emit(OperatorSet {
            token: self.address,
            holder: ctx.sender,
            operator,
            until,
        });
    }

    /// Create `amount` new tokens for `to`. The amount is public, the resulting balance is not.
    pub fn mint(
        &mut self,
        ctx: CallContext,
        to: Address,
        amount: u64,
    ) -> TokenResult<CiphertextHandle> {
        if let MintPolicy::Owner(owner) = self.mint_policy {
            if ctx.sender != owner {
                return Err(TokenError::Unauthorized { caller: ctx.sender });
            }
        }

        let minted = self.fhe.trivial_encrypt(amount)?;
        let balance = self.fhe.add(self.confidential_balance_of(to), minted)?;
        let supply = self.fhe.add(self.total_supply, minted)?;
        self.grant_balance_access(balance, to)?;
        self.fhe.allow(supply, self.address)?;

        self.balances.insert(to, balance);
        self.total_supply = supply;

        info!(token = %self.address, %to, amount, "Minted");
        self.events.emit(Minted {
            token: self.address,
            to,
            amount,
        });
        Ok(balance)
    }

    /// Move `amount` out of the caller's own balance.
    pub fn confidential_transfer(
        &mut self,
        ctx: CallContext,
        to: Address,
        amount: CiphertextHandle,
    ) -> TokenResult<CiphertextHandle> {
        self.ensure_handle_allowed(amount, ctx.sender)?;
        self.transfer(ctx.sender, to, amount)
    }

    /// Move `amount` out of `from`'s balance on its behalf. The caller must be `from` or hold an
    /// unexpired operator grant from it.
    pub fn confidential_transfer_from(
        &mut self,
        ctx: CallContext,
        from: Address,
        to: Address,
        amount: CiphertextHandle,
    ) -> TokenResult<CiphertextHandle> {
        if !self.is_operator(from, ctx.sender, ctx.timestamp) {
            return Err(TokenError::OperatorNotAuthorized {
                holder: from,
                operator: ctx.sender,
            });
        }
        self.ensure_handle_allowed(amount, ctx.sender)?;
        self.transfer(from, to, amount)
    }

    /// Move the caller's entire balance to `to` without the amount ever being decrypted.
    /// Returns the handle of the amount moved, or the empty sentinel when there was nothing to
    /// move.
    pub fn confidential_transfer_all(
        &mut self,
        ctx: CallContext,
        to: Address,
    ) -> TokenResult<CiphertextHandle> {
        let amount = self.confidential_balance_of(ctx.sender);
        if amount.is_empty() {
            debug!(token = %self.address, holder = %ctx.sender, "Nothing to sweep");
            return Ok(CiphertextHandle::EMPTY);
        }
        self.transfer(ctx.sender, to, amount)
    }

    fn ensure_handle_allowed(&self, amount: CiphertextHandle, caller: Address) -> TokenResult<()> {
        if !self.fhe.is_allowed(amount, caller) {
            return Err(TokenError::HandleNotAllowed {
                handle: amount,
                caller,
            });
        }
        Ok(())
    }

    fn grant_balance_access(&self, balance: CiphertextHandle, holder: Address) -> TokenResult<()> {
        self.fhe.allow(balance, self.address)?;
        self.fhe.allow(balance, holder)?;
        Ok(())
    }

    /// Computes every new handle first and only then writes, so an error leaves the ledger as it
    /// was.
    fn transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: CiphertextHandle,
    ) -> TokenResult<CiphertextHandle> {
        let from_balance = self
            .fhe
            .sub(self.confidential_balance_of(from), amount)
            .map_err(|e| match e {
                FheError::Underflow => TokenError::InsufficientBalance { holder: from },
                other => TokenError::Fhe(other),
            })?;

        let to_base = if to == from {
            from_balance
        } else {
            self.confidential_balance_of(to)
        };
        let to_balance = self.fhe.add(to_base, amount)?;

        self.grant_balance_access(from_balance, from)?;
        self.grant_balance_access(to_balance, to)?;
        self.fhe.allow(amount, from)?;
        self.fhe.allow(amount, to)?;

        self.balances.insert(from, from_balance);
        self.balances.insert(to, to_balance);

        debug!(token = %self.address, %from, %to, ?amount, "Confidential transfer");
        self.events.emit(ConfidentialTransfer {
            token: self.address,
            from,
            to,
            amount,
        });
        Ok(amount)
    }
}
