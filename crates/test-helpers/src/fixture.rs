// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use efund_config::AppConfig;
use efund_decrypt::{decryption_domain, DecryptResult, DecryptionClient, LocalRelayer, Relayer};
use efund_events::CallContext;
use efund_fhe::{CiphertextHandle, MockFheExecutor};
use efund_fund::{FundDeployment, FundResult};
use efund_logger::SimpleLogger;
use efund_token::MintPolicy;
use efund_utils::{parse_amount, Clock, ManualClock};
use std::sync::Arc;
use tracing::subscriber::DefaultGuard;

use crate::setup_test_tracing;

pub const GENESIS: u64 = 1_700_000_000;

/// A deployed fund on a mock coprocessor with a manual clock and an in-process relayer.
pub struct FundFixture {
    pub config: AppConfig,
    pub fhe: Arc<MockFheExecutor>,
    pub clock: Arc<ManualClock>,
    pub relayer: Arc<LocalRelayer>,
    pub deployment: FundDeployment,
    pub creator: PrivateKeySigner,
}

impl FundFixture {
    pub fn new() -> Self {
        Self::with_policy(|_| MintPolicy::Open)
    }

    /// Deploy with a mint policy chosen from the creator's address.
    pub fn with_policy(policy: impl FnOnce(Address) -> MintPolicy) -> Self {
        let config = AppConfig::default();
        let fhe = Arc::new(MockFheExecutor::new());
        let clock = Arc::new(ManualClock::new(GENESIS));
        let creator = PrivateKeySigner::random();
        let deployment = FundDeployment::deploy(fhe.clone(), creator.address(), policy(creator.address()));
        SimpleLogger::attach("ledger", deployment.events());

        let relayer = Arc::new(LocalRelayer::new(
            fhe.clone(),
            decryption_domain(&config.relayer.gateway),
            config.chain_id,
            clock.clone(),
        ));

        Self {
            config,
            fhe,
            clock,
            relayer,
            deployment,
            creator,
        }
    }

    /// Test tracing at the configured `log_level`.
    pub fn trace(&self) -> DefaultGuard {
        setup_test_tracing(&self.config.log_level)
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    pub fn ctx(&self, signer: &PrivateKeySigner) -> CallContext {
        CallContext::new(signer.address(), self.now())
    }

    pub fn fund(&self) -> Address {
        self.deployment.fund_address()
    }

    pub fn token(&self) -> Address {
        self.deployment.token_address()
    }

    /// Configure as the creator with `goal` in whole tokens, ending `duration_secs` from now.
    pub fn configure(&mut self, name: &str, goal: &str, duration_secs: u64) -> Result<()> {
        let goal = parse_amount(goal, self.config.token.decimals)?;
        let ctx = self.ctx(&self.creator);
        self.deployment
            .configure(ctx, name, goal, ctx.timestamp + duration_secs)?;
        Ok(())
    }

    /// Mint `amount` (in whole tokens, e.g. `"10"`) to `who` and let the fund spend it for the
    /// default operator window.
    pub fn fund_wallet(&mut self, who: &PrivateKeySigner, amount: &str) -> Result<()> {
        let units = parse_amount(amount, self.config.token.decimals)?;
        let ctx = self.ctx(who);
        self.deployment
            .mint(ctx, who.address(), units)
            .context("mint failed")?;
        let fund = self.fund();
        self.deployment
            .set_operator(ctx, fund, ctx.timestamp + self.config.operator_window_secs);
        Ok(())
    }

    /// Encrypt `units` for the fund on behalf of `who` and contribute it.
    pub fn contribute(&mut self, who: &PrivateKeySigner, units: u64) -> FundResult<CiphertextHandle> {
        let input = self.fhe.encrypt_input(units, self.fund(), who.address());
        let ctx = self.ctx(who);
        self.deployment.contribute(ctx, input.handle, &input.proof)
    }

    pub fn close(&mut self) -> FundResult<CiphertextHandle> {
        let ctx = self.ctx(&self.creator);
        self.deployment.close_fund(ctx)
    }

    pub fn client(&self, user: &PrivateKeySigner) -> DecryptionClient {
        self.client_with(user, self.relayer.clone())
    }

    pub fn client_with(&self, user: &PrivateKeySigner, relayer: Arc<dyn Relayer>) -> DecryptionClient {
        DecryptionClient::from_config(&self.config, relayer, user.clone(), self.clock.clone())
    }

    /// Run the full user decryption protocol for `handle` as `user`.
    pub async fn decrypt(
        &self,
        user: &PrivateKeySigner,
        handle: CiphertextHandle,
        contract: Address,
    ) -> DecryptResult<Option<u64>> {
        self.client(user).user_decrypt(handle, contract).await
    }
}

impl Default for FundFixture {
    fn default() -> Self {
        Self::new()
    }
}
