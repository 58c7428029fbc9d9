// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::signers::local::PrivateKeySigner;
use anyhow::Result;
use efund_events::LedgerEvent;
use efund_fhe::FheExecutor;
use efund_fund::{FundError, FundStatus};
use efund_test_helpers::{rand_signers, FundFixture};
use efund_token::{MintPolicy, TokenError};
use efund_utils::format_amount;

#[tokio::test]
async fn launch_fund_contribute_and_close() -> Result<()> {
    let mut f = FundFixture::new();
    let _guard = f.trace();
    let contributor = PrivateKeySigner::random();
    let start = f.now();

    f.configure("Launch Fund", "100", 3600)?;
    assert_eq!(f.deployment.fund_name(), Some("Launch Fund"));
    assert_eq!(f.deployment.fund_goal(), Some(100_000000));
    assert_eq!(f.deployment.fund_end_time(), Some(start + 3600));
    assert_eq!(f.deployment.status(f.now()), FundStatus::Live);

    f.fund_wallet(&contributor, "10")?;
    assert!(f
        .deployment
        .is_operator(contributor.address(), f.fund(), start + 3600));
    f.contribute(&contributor, 10_000000)?;

    let contribution = f.deployment.contribution(contributor.address());
    let total = f.deployment.total_raised();
    assert_eq!(
        f.decrypt(&contributor, contribution, f.fund()).await?,
        Some(10_000000)
    );
    assert_eq!(f.decrypt(&f.creator, total, f.fund()).await?, Some(10_000000));

    f.clock.advance(60);
    f.close()?;
    let balance = f.deployment.confidential_balance_of(f.creator.address());
    let creator_balance = f.decrypt(&f.creator, balance, f.token()).await?;
    assert_eq!(creator_balance, Some(10_000000));
    assert_eq!(format_amount(10_000000, 6)?, "10");

    assert!(matches!(f.close(), Err(FundError::AlreadyClosed)));
    assert_eq!(f.deployment.status(f.now()), FundStatus::Closed);
    Ok(())
}

#[tokio::test]
async fn total_tracks_every_contributor() -> Result<()> {
    let mut f = FundFixture::new();
    let contributors = rand_signers(3);
    f.configure("Launch Fund", "100", 3600)?;

    let amounts = [1_500000u64, 250000, 3_000000];
    for (signer, amount) in contributors.iter().zip(amounts) {
        f.fund_wallet(signer, "5")?;
        f.contribute(signer, amount)?;
        f.clock.advance(1);
    }
    f.contribute(&contributors[0], 500000)?;

    assert_eq!(
        f.fhe.decrypt(f.deployment.total_raised())?,
        amounts.iter().sum::<u64>() + 500000
    );
    assert_eq!(
        f.fhe
            .decrypt(f.deployment.contribution(contributors[0].address()))?,
        2_000000
    );
    assert_eq!(
        f.fhe
            .decrypt(f.deployment.confidential_balance_of(f.fund()))?,
        amounts.iter().sum::<u64>() + 500000
    );
    Ok(())
}

#[tokio::test]
async fn contributions_stop_at_end_time() -> Result<()> {
    let mut f = FundFixture::new();
    let contributor = PrivateKeySigner::random();
    f.configure("Launch Fund", "100", 3600)?;
    f.fund_wallet(&contributor, "10")?;

    f.clock.advance(3600);
    assert_eq!(f.deployment.status(f.now()), FundStatus::Ended);
    assert!(!f.deployment.is_active(f.now()));
    assert_eq!(
        f.contribute(&contributor, 1_000000),
        Err(FundError::NotActive {
            status: FundStatus::Ended
        })
    );
    assert!(f.deployment.total_raised().is_empty());

    // Ending is not closing: the creator still has to sweep.
    f.close()?;
    assert!(f.deployment.is_closed());
    Ok(())
}

#[tokio::test]
async fn rejected_contributions_change_nothing() -> Result<()> {
    let mut f = FundFixture::new();
    let contributor = PrivateKeySigner::random();
    f.configure("Launch Fund", "100", 3600)?;

    // no operator grant yet
    let ctx = f.ctx(&contributor);
    f.deployment.mint(ctx, contributor.address(), 5_000000)?;
    assert!(matches!(
        f.contribute(&contributor, 1_000000),
        Err(FundError::Token(TokenError::OperatorNotAuthorized { .. }))
    ));

    // more than the balance
    let fund = f.fund();
    f.deployment.set_operator(ctx, fund, ctx.timestamp + 3600);
    assert!(matches!(
        f.contribute(&contributor, 6_000000),
        Err(FundError::Token(TokenError::InsufficientBalance { .. }))
    ));

    // proof bound to someone else
    let other = PrivateKeySigner::random();
    let input = f.fhe.encrypt_input(1_000000, f.fund(), other.address());
    let ctx = f.ctx(&contributor);
    assert!(matches!(
        f.deployment.contribute(ctx, input.handle, &input.proof),
        Err(FundError::InvalidProof(_))
    ));

    assert!(f.deployment.contribution(contributor.address()).is_empty());
    assert!(f.deployment.total_raised().is_empty());
    assert_eq!(
        f.fhe
            .decrypt(f.deployment.confidential_balance_of(contributor.address()))?,
        5_000000
    );
    Ok(())
}

#[tokio::test]
async fn only_the_creator_controls_the_fund() -> Result<()> {
    let mut f = FundFixture::new();
    let stranger = PrivateKeySigner::random();

    let ctx = f.ctx(&stranger);
    assert!(matches!(
        f.deployment.configure(ctx, "Hijack", 1, ctx.timestamp + 10),
        Err(FundError::Unauthorized { .. })
    ));
    f.configure("Launch Fund", "100", 3600)?;
    let ctx = f.ctx(&stranger);
    assert!(matches!(
        f.deployment.close_fund(ctx),
        Err(FundError::Unauthorized { .. })
    ));
    let ctx = f.ctx(&f.creator);
    assert_eq!(
        f.deployment.configure(ctx, "Again", 1, ctx.timestamp + 10),
        Err(FundError::AlreadyConfigured)
    );
    assert!(!f.deployment.is_closed());
    Ok(())
}

#[tokio::test]
async fn owner_only_minting() -> Result<()> {
    let mut f = FundFixture::with_policy(MintPolicy::Owner);
    let stranger = PrivateKeySigner::random();
    let ctx = f.ctx(&stranger);
    assert!(matches!(
        f.deployment.mint(ctx, stranger.address(), 1),
        Err(TokenError::Unauthorized { .. })
    ));
    let ctx = f.ctx(&f.creator);
    f.deployment.mint(ctx, stranger.address(), 1)?;
    assert_eq!(
        f.fhe
            .decrypt(f.deployment.token().confidential_total_supply())?,
        1
    );
    Ok(())
}

#[tokio::test]
async fn ledger_records_events_in_order() -> Result<()> {
    let mut f = FundFixture::new();
    let contributor = PrivateKeySigner::random();
    f.configure("Launch Fund", "100", 3600)?;
    f.fund_wallet(&contributor, "10")?;
    f.contribute(&contributor, 1_000000)?;
    f.close()?;

    let kinds: Vec<_> = f
        .deployment
        .events()
        .events()
        .iter()
        .map(LedgerEvent::event_type)
        .collect();
    assert_eq!(
        kinds,
        vec![
            "FundConfigured",
            "Minted",
            "OperatorSet",
            "ConfidentialTransfer",
            "ContributionReceived",
            "ConfidentialTransfer",
            "FundClosed",
        ]
    );

    let closed = f.deployment.events().last();
    assert!(matches!(closed, Some(LedgerEvent::FundClosed(c)) if c.creator == f.creator.address()));
    Ok(())
}
