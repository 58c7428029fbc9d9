// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{EncryptedFund, FundResult, FundStatus};
use alloy_primitives::Address;
use efund_events::{CallContext, EventLog};
use efund_fhe::{CiphertextHandle, FheExecutor};
use efund_token::{ConfidentialToken, MintPolicy, TokenMetadata, TokenResult};
use std::sync::Arc;
use tracing::info;

/// A fund together with the confidential token it raises in, as deployed by `creator`.
///
/// Every entry point takes `&mut self`, so calls are applied one at a time in a total order and
/// each one either commits fully or not at all.
pub struct FundDeployment {
    fund: EncryptedFund,
    token: ConfidentialToken,
    events: EventLog,
}

impl FundDeployment {
    /// Deploys the token and then the fund from `creator`. Addresses follow the usual
    /// `CREATE` derivation from the deployer and its nonce.
    pub fn deploy(fhe: Arc<dyn FheExecutor>, creator: Address, mint_policy: MintPolicy) -> Self {
        let events = EventLog::new();
        let token_address = creator.create(0);
        let fund_address = creator.create(1);

        let token = ConfidentialToken::new(
            token_address,
            TokenMetadata::feth(),
            mint_policy,
            fhe.clone(),
            events.clone(),
        );
        let fund = EncryptedFund::new(fund_address, creator, fhe, events.clone());

        info!(fund = %fund_address, token = %token_address, %creator, "Deployed");
        Self {
            fund,
            token,
            events,
        }
    }

    pub fn fund(&self) -> &EncryptedFund {
        &self.fund
    }

    pub fn token(&self) -> &ConfidentialToken {
        &self.token
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn fund_address(&self) -> Address {
        self.fund.address()
    }

    pub fn token_address(&self) -> Address {
        self.token.address()
    }

    pub fn configure(
        &mut self,
        ctx: CallContext,
        name: impl Into<String>,
        goal: u64,
        end_time: u64,
    ) -> FundResult<()> {
        self.fund.configure(ctx, name, goal, end_time)
    }

    pub fn contribute(
        &mut self,
        ctx: CallContext,
        encrypted_amount: CiphertextHandle,
        proof: &[u8],
    ) -> FundResult<CiphertextHandle> {
        self.fund
            .contribute(ctx, &mut self.token, encrypted_amount, proof)
    }

    pub fn close_fund(&mut self, ctx: CallContext) -> FundResult<CiphertextHandle> {
        self.fund.close_fund(ctx, &mut self.token)
    }

    pub fn set_operator(&mut self, ctx: CallContext, operator: Address, until: u64) {
        self.token.set_operator(ctx, operator, until)
    }

    pub fn mint(
        &mut self,
        ctx: CallContext,
        to: Address,
        amount: u64,
    ) -> TokenResult<CiphertextHandle> {
        self.token.mint(ctx, to, amount)
    }

    pub fn creator(&self) -> Address {
        self.fund.creator()
    }

    pub fn fund_name(&self) -> Option<&str> {
        self.fund.fund_name()
    }

    pub fn fund_goal(&self) -> Option<u64> {
        self.fund.fund_goal()
    }

    pub fn fund_end_time(&self) -> Option<u64> {
        self.fund.fund_end_time()
    }

    pub fn is_configured(&self) -> bool {
        self.fund.is_configured()
    }

    pub fn is_closed(&self) -> bool {
        self.fund.is_closed()
    }

    pub fn is_active(&self, now: u64) -> bool {
        self.fund.is_active(now)
    }

    pub fn status(&self, now: u64) -> FundStatus {
        self.fund.status(now)
    }

    pub fn total_raised(&self) -> CiphertextHandle {
        self.fund.total_raised()
    }

    pub fn contribution(&self, contributor: Address) -> CiphertextHandle {
        self.fund.contribution(contributor)
    }

    pub fn confidential_balance_of(&self, holder: Address) -> CiphertextHandle {
        self.token.confidential_balance_of(holder)
    }

    pub fn is_operator(&self, holder: Address, operator: Address, now: u64) -> bool {
        self.token.is_operator(holder, operator, now)
    }
}
