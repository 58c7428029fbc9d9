// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{seal, DecryptError, DecryptResult, UserDecryptRequest, UserDecryptResponse};
use alloy::primitives::Signature;
use alloy::sol_types::Eip712Domain;
use anyhow::{Context, Result};
use async_trait::async_trait;
use efund_fhe::FheExecutor;
use efund_utils::Clock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// The service that checks a signed grant and hands back sealed plaintexts.
#[async_trait]
pub trait Relayer: Send + Sync {
    async fn user_decrypt(&self, request: UserDecryptRequest) -> DecryptResult<UserDecryptResponse>;
}

/// In-process relayer backed by an [`FheExecutor`] acting as the decryption authority.
pub struct LocalRelayer {
    fhe: Arc<dyn FheExecutor>,
    domain: Eip712Domain,
    contracts_chain_id: u64,
    clock: Arc<dyn Clock>,
    requests: AtomicUsize,
}

impl LocalRelayer {
    pub fn new(
        fhe: Arc<dyn FheExecutor>,
        domain: Eip712Domain,
        contracts_chain_id: u64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            fhe,
            domain,
            contracts_chain_id,
            clock,
            requests: AtomicUsize::new(0),
        }
    }

    /// Number of requests received so far, valid or not.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn authorize(&self, request: &UserDecryptRequest) -> DecryptResult<()> {
        request.validate()?;
        if request.contracts_chain_id != self.contracts_chain_id {
            return Err(DecryptError::InvalidRequest(format!(
                "contracts chain {} is not served here ({})",
                request.contracts_chain_id, self.contracts_chain_id
            )));
        }

        let hash = request.verification().signing_hash(&self.domain);
        let signature = Signature::try_from(request.signature.as_ref())
            .map_err(|e| DecryptError::SignatureInvalid(e.to_string()))?;
        let signer = signature
            .recover_address_from_prehash(&hash)
            .map_err(|e| DecryptError::SignatureInvalid(e.to_string()))?;
        if signer != request.user_address {
            return Err(DecryptError::SignatureInvalid(format!(
                "signed by {signer}, not {}",
                request.user_address
            )));
        }

        let now = self.clock.now();
        let expires_at = request.expires_at();
        if now < request.start_timestamp || now >= expires_at {
            return Err(DecryptError::GrantExpired {
                start: request.start_timestamp,
                expires_at,
                now,
            });
        }

        for pair in &request.handles {
            if !self.fhe.is_materialized(pair.handle) {
                return Err(DecryptError::NotMaterialized(pair.handle));
            }
            let entitled = self.fhe.is_allowed(pair.handle, request.user_address)
                && self.fhe.is_allowed(pair.handle, pair.contract_address);
            if !entitled {
                return Err(DecryptError::NotEntitled {
                    handle: pair.handle,
                    user: request.user_address,
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Relayer for LocalRelayer {
    async fn user_decrypt(&self, request: UserDecryptRequest) -> DecryptResult<UserDecryptResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Err(err) = self.authorize(&request) {
            warn!(user = %request.user_address, "Rejected decryption request: {err}");
            return Err(err);
        }

        let recipient = request.recipient_key()?;
        let mut values = Vec::with_capacity(request.handles.len());
        for pair in &request.handles {
            let plaintext = self
                .fhe
                .decrypt(pair.handle)
                .map_err(|e| DecryptError::Relayer(e.to_string()))?;
            values.push(seal(&recipient, pair.handle, plaintext)?);
        }

        info!(
            user = %request.user_address,
            handles = values.len(),
            "Sealed plaintexts for user"
        );
        Ok(UserDecryptResponse { values })
    }
}

/// Relayer reached over HTTP.
pub struct HttpRelayer {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpRelayer {
    pub fn new(base: Url) -> Result<Self> {
        let endpoint = base
            .join("v1/user-decrypt")
            .with_context(|| format!("Invalid relayer url {base}"))?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Relayer for HttpRelayer {
    async fn user_decrypt(&self, request: UserDecryptRequest) -> DecryptResult<UserDecryptResponse> {
        debug!(endpoint = %self.endpoint, handles = request.handles.len(), "POST user decrypt");
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| DecryptError::Relayer(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DecryptError::Relayer(format!("{status}: {body}")));
        }

        response
            .json::<UserDecryptResponse>()
            .await
            .map_err(|e| DecryptError::Relayer(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decryption_domain, DecryptionGrant, HandleContractPair};
    use alloy::primitives::{Address, Bytes};
    use alloy::signers::local::PrivateKeySigner;
    use efund_config::GatewayConfig;
    use efund_fhe::{CiphertextHandle, MockFheExecutor};
    use efund_utils::{ManualClock, SECONDS_PER_DAY};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const CHAIN: u64 = 11155111;
    const FUND: Address = Address::repeat_byte(0xf0);
    const T: u64 = 1_700_000_000;

    struct Fixture {
        fhe: Arc<MockFheExecutor>,
        clock: Arc<ManualClock>,
        relayer: LocalRelayer,
        user: PrivateKeySigner,
        handle: CiphertextHandle,
    }

    fn fixture() -> anyhow::Result<Fixture> {
        let fhe = Arc::new(MockFheExecutor::new());
        let clock = Arc::new(ManualClock::new(T));
        let user = PrivateKeySigner::random();
        let handle = fhe.trivial_encrypt(99)?;
        fhe.allow(handle, FUND)?;
        fhe.allow(handle, user.address())?;
        let relayer = LocalRelayer::new(
            fhe.clone(),
            decryption_domain(&GatewayConfig::default()),
            CHAIN,
            clock.clone(),
        );
        Ok(Fixture {
            fhe,
            clock,
            relayer,
            user,
            handle,
        })
    }

    impl Fixture {
        fn grant(&self, signer: &PrivateKeySigner, handle: CiphertextHandle) -> DecryptResult<DecryptionGrant> {
            DecryptionGrant::issue(
                signer,
                &decryption_domain(&GatewayConfig::default()),
                CHAIN,
                vec![HandleContractPair::new(handle, FUND)],
                T,
                1,
            )
        }
    }

    #[tokio::test]
    async fn seals_entitled_handles() -> anyhow::Result<()> {
        let f = fixture()?;
        let (keypair, request) = f.grant(&f.user, f.handle)?.into_parts();
        let response = f.relayer.user_decrypt(request).await?;
        let opened = keypair.open(&response, &[f.handle])?;
        assert_eq!(opened[&f.handle], 99);
        assert_eq!(f.relayer.request_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn tampered_request_fails_signature_check() -> anyhow::Result<()> {
        let f = fixture()?;
        let (_, mut request) = f.grant(&f.user, f.handle)?.into_parts();
        request.duration_days = 2;
        assert!(matches!(
            f.relayer.user_decrypt(request).await,
            Err(DecryptError::SignatureInvalid(_))
        ));

        let (_, mut request) = f.grant(&f.user, f.handle)?.into_parts();
        request.signature = Bytes::from(vec![1u8; 3]);
        assert!(matches!(
            f.relayer.user_decrypt(request).await,
            Err(DecryptError::SignatureInvalid(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn signer_must_be_the_user() -> anyhow::Result<()> {
        let f = fixture()?;
        let stranger = PrivateKeySigner::random();
        let (_, mut request) = f.grant(&stranger, f.handle)?.into_parts();
        request.user_address = f.user.address();
        assert!(matches!(
            f.relayer.user_decrypt(request).await,
            Err(DecryptError::SignatureInvalid(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn grant_expires() -> anyhow::Result<()> {
        let f = fixture()?;
        let (_, request) = f.grant(&f.user, f.handle)?.into_parts();
        f.clock.set(T + SECONDS_PER_DAY);
        assert_eq!(
            f.relayer.user_decrypt(request).await,
            Err(DecryptError::GrantExpired {
                start: T,
                expires_at: T + SECONDS_PER_DAY,
                now: T + SECONDS_PER_DAY
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn grant_not_yet_valid() -> anyhow::Result<()> {
        let f = fixture()?;
        let (_, request) = f.grant(&f.user, f.handle)?.into_parts();
        f.clock.set(T - 1);
        assert!(matches!(
            f.relayer.user_decrypt(request).await,
            Err(DecryptError::GrantExpired { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn user_and_contract_must_both_be_allowed() -> anyhow::Result<()> {
        let f = fixture()?;
        let stranger = PrivateKeySigner::random();
        let (_, request) = f.grant(&stranger, f.handle)?.into_parts();
        assert_eq!(
            f.relayer.user_decrypt(request).await,
            Err(DecryptError::NotEntitled {
                handle: f.handle,
                user: stranger.address()
            })
        );

        let contract_less = f.fhe.trivial_encrypt(5)?;
        f.fhe.allow(contract_less, f.user.address())?;
        let (_, request) = f.grant(&f.user, contract_less)?.into_parts();
        assert!(matches!(
            f.relayer.user_decrypt(request).await,
            Err(DecryptError::NotEntitled { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_handles_are_not_materialized() -> anyhow::Result<()> {
        let f = fixture()?;
        let unknown = CiphertextHandle::new(alloy::primitives::B256::repeat_byte(9));
        let (_, request) = f.grant(&f.user, unknown)?.into_parts();
        assert_eq!(
            f.relayer.user_decrypt(request).await,
            Err(DecryptError::NotMaterialized(unknown))
        );
        Ok(())
    }

    #[tokio::test]
    async fn wrong_chain_is_rejected() -> anyhow::Result<()> {
        let f = fixture()?;
        let grant = DecryptionGrant::issue(
            &f.user,
            &decryption_domain(&GatewayConfig::default()),
            1,
            vec![HandleContractPair::new(f.handle, FUND)],
            T,
            1,
        )?;
        let (_, request) = grant.into_parts();
        assert!(matches!(
            f.relayer.user_decrypt(request).await,
            Err(DecryptError::InvalidRequest(_))
        ));
        Ok(())
    }

    /// Reads headers and a content-length body so the client is done writing before we answer.
    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut received = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let Ok(n) = socket.read(&mut chunk).await else {
                return;
            };
            if n == 0 {
                return;
            }
            received.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&received);
            let Some(header_end) = text.find("\r\n\r\n") else {
                continue;
            };
            let content_length = text[..header_end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if received.len() >= header_end + 4 + content_length {
                return;
            }
        }
    }

    /// Serves one canned HTTP response and returns the base url.
    async fn serve_once(status: &'static str, body: &'static str) -> anyhow::Result<Url> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                read_request(&mut socket).await;
                let reply = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        Ok(Url::parse(&format!("http://{addr}/"))?)
    }

    #[tokio::test]
    async fn http_relayer_reports_server_errors() -> anyhow::Result<()> {
        let f = fixture()?;
        let relayer = HttpRelayer::new(serve_once("503 Service Unavailable", "{}").await?)?;
        assert_eq!(relayer.endpoint().path(), "/v1/user-decrypt");

        let (_, request) = f.grant(&f.user, f.handle)?.into_parts();
        let err = relayer.user_decrypt(request).await;
        assert!(matches!(&err, Err(DecryptError::Relayer(msg)) if msg.contains("503")));
        assert!(err.err().is_some_and(|e| e.is_recoverable()));
        Ok(())
    }

    #[tokio::test]
    async fn http_relayer_parses_responses() -> anyhow::Result<()> {
        let f = fixture()?;
        let relayer = HttpRelayer::new(serve_once("200 OK", r#"{"values":[]}"#).await?)?;
        let (_, request) = f.grant(&f.user, f.handle)?.into_parts();
        assert_eq!(
            relayer.user_decrypt(request).await?,
            UserDecryptResponse::default()
        );
        Ok(())
    }
}
