// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::signers::local::PrivateKeySigner;
use anyhow::Result;
use efund_decrypt::{
    decryption_domain, DecryptError, DecryptionGrant, HandleContractPair, Relayer,
};
use efund_fhe::CiphertextHandle;
use efund_test_helpers::{setup_test_tracing, FundFixture};
use efund_utils::SECONDS_PER_DAY;

async fn funded() -> Result<(FundFixture, PrivateKeySigner)> {
    let mut f = FundFixture::new();
    let contributor = PrivateKeySigner::random();
    f.configure("Launch Fund", "100", 3600)?;
    f.fund_wallet(&contributor, "10")?;
    f.contribute(&contributor, 4_000000)?;
    Ok((f, contributor))
}

#[tokio::test]
async fn only_entitled_users_can_decrypt() -> Result<()> {
    let _guard = setup_test_tracing("debug");
    let (f, contributor) = funded().await?;
    let stranger = PrivateKeySigner::random();
    let contribution = f.deployment.contribution(contributor.address());
    let total = f.deployment.total_raised();

    assert_eq!(
        f.decrypt(&contributor, contribution, f.fund()).await?,
        Some(4_000000)
    );
    // the contributor may see their own contribution but not the total
    assert!(matches!(
        f.decrypt(&contributor, total, f.fund()).await,
        Err(DecryptError::NotEntitled { .. })
    ));
    // the creator sees the total but not individual contributions
    assert!(matches!(
        f.decrypt(&f.creator, contribution, f.fund()).await,
        Err(DecryptError::NotEntitled { .. })
    ));
    assert!(matches!(
        f.decrypt(&stranger, total, f.fund()).await,
        Err(DecryptError::NotEntitled { .. })
    ));
    // the contract named in the request must be allowed too
    assert!(matches!(
        f.decrypt(&contributor, contribution, f.token()).await,
        Err(DecryptError::NotEntitled { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn empty_handles_decrypt_to_nothing() -> Result<()> {
    let (f, _) = funded().await?;
    let stranger = PrivateKeySigner::random();
    let empty = f.deployment.contribution(stranger.address());
    assert!(empty.is_empty());

    assert_eq!(f.decrypt(&stranger, empty, f.fund()).await?, None);
    assert_eq!(f.relayer.request_count(), 0);
    Ok(())
}

#[tokio::test]
async fn balances_are_private_to_their_holder() -> Result<()> {
    let (f, contributor) = funded().await?;
    let balance = f.deployment.confidential_balance_of(contributor.address());

    assert_eq!(
        f.decrypt(&contributor, balance, f.token()).await?,
        Some(6_000000)
    );
    assert!(matches!(
        f.decrypt(&f.creator, balance, f.token()).await,
        Err(DecryptError::NotEntitled { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn grants_expire() -> Result<()> {
    let (f, contributor) = funded().await?;
    let contribution = f.deployment.contribution(contributor.address());
    let grant = DecryptionGrant::issue(
        &contributor,
        &decryption_domain(&f.config.relayer.gateway),
        f.config.chain_id,
        vec![HandleContractPair::new(contribution, f.fund())],
        f.now(),
        1,
    )?;
    let (_keypair, request) = grant.into_parts();

    f.clock.advance(SECONDS_PER_DAY);
    let err = f.relayer.user_decrypt(request).await;
    assert!(matches!(err, Err(DecryptError::GrantExpired { .. })));

    // a fresh grant works again
    assert_eq!(
        f.decrypt(&contributor, contribution, f.fund()).await?,
        Some(4_000000)
    );
    Ok(())
}

#[tokio::test]
async fn decrypt_many_mixes_contracts() -> Result<()> {
    let (f, contributor) = funded().await?;
    let contribution = f.deployment.contribution(contributor.address());
    let balance = f.deployment.confidential_balance_of(contributor.address());

    let values = f
        .client(&contributor)
        .decrypt_many(&[
            HandleContractPair::new(contribution, f.fund()),
            HandleContractPair::new(balance, f.token()),
            HandleContractPair::new(CiphertextHandle::EMPTY, f.fund()),
        ])
        .await?;

    assert_eq!(values[&contribution], Some(4_000000));
    assert_eq!(values[&balance], Some(6_000000));
    assert_eq!(values[&CiphertextHandle::EMPTY], None);
    assert_eq!(f.relayer.request_count(), 1);
    Ok(())
}
