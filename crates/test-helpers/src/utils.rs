// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::signers::local::PrivateKeySigner;
use efund_logger::log_filter;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt;

/// Route logs of the current test to the test writer. `RUST_LOG` overrides `filter`. Keep the
/// guard alive for the test.
pub fn setup_test_tracing(filter: &str) -> DefaultGuard {
    let subscriber = fmt()
        .with_env_filter(log_filter(filter))
        .with_test_writer()
        .finish();
    tracing::subscriber::set_default(subscriber)
}

pub fn rand_signers(count: usize) -> Vec<PrivateKeySigner> {
    (0..count).map(|_| PrivateKeySigner::random()).collect()
}
