// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{B256, U256};
use alloy::sol;
use alloy::sol_types::{Eip712Domain, SolStruct};
use efund_config::GatewayConfig;

sol! {
    /// The typed message a user signs to authorize decryption of handles under
    /// `contractAddresses` for `durationDays` days from `startTimestamp`.
    #[derive(Debug, PartialEq, Eq)]
    struct UserDecryptRequestVerification {
        bytes publicKey;
        address[] contractAddresses;
        uint256 contractsChainId;
        uint256 startTimestamp;
        uint256 durationDays;
    }
}

/// Domain of the decryption verifier, as the relayer checks it.
pub fn decryption_domain(gateway: &GatewayConfig) -> Eip712Domain {
    Eip712Domain::new(
        Some(gateway.name.clone().into()),
        Some(gateway.version.clone().into()),
        Some(U256::from(gateway.chain_id)),
        Some(gateway.verifying_contract),
        None,
    )
}

impl UserDecryptRequestVerification {
    /// `keccak256(0x1901 || domainSeparator || hashStruct(self))`
    pub fn signing_hash(&self, domain: &Eip712Domain) -> B256 {
        self.eip712_signing_hash(domain)
    }
}
