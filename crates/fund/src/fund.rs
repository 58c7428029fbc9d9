// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{FundConfig, FundError, FundPhase, FundResult, FundStatus};
use alloy_primitives::Address;
use efund_events::{CallContext, ContributionReceived, EventLog, FundClosed, FundConfigured};
use efund_fhe::{CiphertextHandle, FheExecutor};
use efund_token::ConfidentialToken;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// A single fundraising campaign. Contributions are received as encrypted token amounts and
/// summed homomorphically, so neither individual contributions nor the running total are ever
/// visible on the ledger.
pub struct EncryptedFund {
    address: Address,
    creator: Address,
    phase: FundPhase,
    total_raised: CiphertextHandle,
    contributions: HashMap<Address, CiphertextHandle>,
    fhe: Arc<dyn FheExecutor>,
    events: EventLog,
}

impl EncryptedFund {
    pub fn new(
        address: Address,
        creator: Address,
        fhe: Arc<dyn FheExecutor>,
        events: EventLog,
    ) -> Self {
        Self {
            address,
            creator,
            phase: FundPhase::Unconfigured,
            total_raised: CiphertextHandle::EMPTY,
            contributions: HashMap::new(),
            fhe,
            events,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn creator(&self) -> Address {
        self.creator
    }

    pub fn phase(&self) -> &FundPhase {
        &self.phase
    }

    pub fn fund_name(&self) -> Option<&str> {
        self.phase.config().map(|c| c.name.as_str())
    }

    pub fn fund_goal(&self) -> Option<u64> {
        self.phase.config().map(|c| c.goal)
    }

    pub fn fund_end_time(&self) -> Option<u64> {
        self.phase.config().map(|c| c.end_time)
    }

    pub fn is_configured(&self) -> bool {
        self.phase.is_configured()
    }

    pub fn is_closed(&self) -> bool {
        self.phase.is_closed()
    }

    pub fn is_active(&self, now: u64) -> bool {
        self.phase.is_active(now)
    }

    pub fn status(&self, now: u64) -> FundStatus {
        self.phase.status(now)
    }

    pub fn total_raised(&self) -> CiphertextHandle {
        self.total_raised
    }

    /// Encrypted sum of everything `contributor` has put in, the empty sentinel if nothing.
    pub fn contribution(&self, contributor: Address) -> CiphertextHandle {
        self.contributions
            .get(&contributor)
            .copied()
            .unwrap_or_default()
    }

    pub fn configure(
        &mut self,
        ctx: CallContext,
        name: impl Into<String>,
        goal: u64,
        end_time: u64,
    ) -> FundResult<()> {
        if self.phase.is_configured() {
            return Err(FundError::AlreadyConfigured);
        }
        self.ensure_creator(ctx)?;

        let name = name.into();
        if end_time <= ctx.timestamp {
            warn!(fund = %self.address, end_time, "Fund configured with an end time already past");
        }

        info!(fund = %self.address, name = %name, goal, end_time, "Fund configured");
        self.events.emit(FundConfigured {
            fund: self.address,
            name: name.clone(),
            goal,
            end_time,
        });
        self.phase = FundPhase::Open(FundConfig {
            creator: self.creator,
            name,
            goal,
            end_time,
        });
        Ok(())
    }

    /// Pull an encrypted amount from the caller into the fund. The caller must have made the fund
    /// an operator on `token` and encrypted the amount for `(fund, caller)`.
    ///
    /// Either every balance and tally moves, or nothing does. The transient access granted by
    /// input verification ends with the call either way.
    pub fn contribute(
        &mut self,
        ctx: CallContext,
        token: &mut ConfidentialToken,
        encrypted_amount: CiphertextHandle,
        proof: &[u8],
    ) -> FundResult<CiphertextHandle> {
        let result = self.receive(ctx, token, encrypted_amount, proof);
        self.fhe.clear_transient();
        result
    }

    fn receive(
        &mut self,
        ctx: CallContext,
        token: &mut ConfidentialToken,
        encrypted_amount: CiphertextHandle,
        proof: &[u8],
    ) -> FundResult<CiphertextHandle> {
        match self.phase.status(ctx.timestamp) {
            FundStatus::Live => {}
            FundStatus::Closed => return Err(FundError::AlreadyClosed),
            status => return Err(FundError::NotActive { status }),
        }

        let amount = self
            .fhe
            .verify_input(encrypted_amount, proof, self.address, ctx.sender)
            .map_err(FundError::from_input)?;

        let contribution = self.fhe.add(self.contribution(ctx.sender), amount)?;
        let total = self.fhe.add(self.total_raised, amount)?;
        self.fhe.allow(contribution, self.address)?;
        self.fhe.allow(contribution, ctx.sender)?;
        self.fhe.allow(total, self.address)?;
        self.fhe.allow(total, self.creator)?;

        token.confidential_transfer_from(ctx.forward(self.address), ctx.sender, self.address, amount)?;

        self.contributions.insert(ctx.sender, contribution);
        self.total_raised = total;

        info!(fund = %self.address, contributor = %ctx.sender, "Contribution received");
        self.events.emit(ContributionReceived {
            fund: self.address,
            contributor: ctx.sender,
            amount,
        });
        Ok(contribution)
    }

    /// Close the fund and sweep its whole encrypted token balance to the creator. Allowed before
    /// the end time.
    pub fn close_fund(
        &mut self,
        ctx: CallContext,
        token: &mut ConfidentialToken,
    ) -> FundResult<CiphertextHandle> {
        self.ensure_creator(ctx)?;
        let config = match &self.phase {
            FundPhase::Unconfigured => return Err(FundError::NotConfigured),
            FundPhase::Closed(_) => return Err(FundError::AlreadyClosed),
            FundPhase::Open(config) => config.clone(),
        };

        if ctx.timestamp < config.end_time {
            warn!(fund = %self.address, end_time = config.end_time, "Closing fund before its end time");
        }

        let swept = token.confidential_transfer_all(ctx.forward(self.address), self.creator)?;
        self.phase = FundPhase::Closed(config);

        info!(fund = %self.address, creator = %self.creator, "Fund closed");
        self.events.emit(FundClosed {
            fund: self.address,
            creator: self.creator,
            amount: swept,
        });
        Ok(swept)
    }

    fn ensure_creator(&self, ctx: CallContext) -> FundResult<()> {
        if ctx.sender != self.creator {
            return Err(FundError::Unauthorized {
                caller: ctx.sender,
                creator: self.creator,
            });
        }
        Ok(())
    }
}
