//! The link: a duplex, line-oriented JSON connection to a wallet process.
//!
//! A [`WalletLink`] knows how to open the connection; the transport owns
//! everything above it (correlation, timeouts, event fan-out). Because the
//! external wallet process is not always present, [`MockWalletLink`] is a
//! drop-in implementation that never opens a real connection and answers
//! every request with deterministic, artificially-delayed results.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::mpsc;

use crate::error::{BridgeError, Result};
use crate::messages::{RequestId, WireMessage};

/// Channel capacity for link endpoints.
const LINK_BUFFER: usize = 64;

/// One end of an open connection. Each channel item is a single
/// JSON-encoded message.
pub struct LinkHandle {
    /// Messages going to the wallet process.
    pub outbound: mpsc::Sender<String>,
    /// Messages coming from the wallet process.
    pub inbound: mpsc::Receiver<String>,
}

/// The remote half of a channel link, used by tests to play the wallet
/// process.
pub struct LinkRemote {
    /// Requests written by the transport.
    pub requests: mpsc::Receiver<String>,
    /// Responses and events to feed back.
    pub responses: mpsc::Sender<String>,
}

/// Build a connected `(LinkHandle, LinkRemote)` pair.
pub fn link_pair() -> (LinkHandle, LinkRemote) {
    let (out_tx, out_rx) = mpsc::channel(LINK_BUFFER);
    let (in_tx, in_rx) = mpsc::channel(LINK_BUFFER);
    (
        LinkHandle {
            outbound: out_tx,
            inbound: in_rx,
        },
        LinkRemote {
            requests: out_rx,
            responses: in_tx,
        },
    )
}

/// Factory for connections to the wallet process.
#[async_trait]
pub trait WalletLink: Send + Sync {
    /// Open a fresh connection.
    ///
    /// Resolves once the connection is usable. The transport bounds this
    /// call with its own connect timeout.
    async fn open(&self) -> Result<LinkHandle>;
}

/// A link that hands out one pre-built connection, for driving the
/// transport from a test.
pub struct ChannelWalletLink {
    handle: std::sync::Mutex<Option<LinkHandle>>,
}

impl ChannelWalletLink {
    /// Create the link and the remote end a test can script.
    pub fn new() -> (Self, LinkRemote) {
        let (handle, remote) = link_pair();
        (
            Self {
                handle: std::sync::Mutex::new(Some(handle)),
            },
            remote,
        )
    }
}

#[async_trait]
impl WalletLink for ChannelWalletLink {
    async fn open(&self) -> Result<LinkHandle> {
        self.handle
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| BridgeError::Link("connection already consumed".into()))
    }
}

/// A link that never connects, for exercising connect failure paths.
pub struct UnavailableWalletLink;

#[async_trait]
impl WalletLink for UnavailableWalletLink {
    async fn open(&self) -> Result<LinkHandle> {
        Err(BridgeError::Link("wallet process not running".into()))
    }
}

/// Fallback wallet: answers every request itself with deterministic
/// results after a short synthetic delay.
///
/// The balance is fixed; transaction ids, signatures and sessions are
/// derived from the request id, so the same request always yields the
/// same result.
pub struct MockWalletLink {
    /// Synthetic processing delay per request.
    delay: Duration,
    /// Balance reported by `get-wallet`.
    balance: Decimal,
}

impl MockWalletLink {
    /// Default synthetic delay.
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(25);

    /// Create a mock with the default delay and balance.
    pub fn new() -> Self {
        Self {
            delay: Self::DEFAULT_DELAY,
            balance: dec!(1.25),
        }
    }

    /// Override the synthetic delay (zero is fine for tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Override the reported balance.
    pub fn with_balance(mut self, balance: Decimal) -> Self {
        self.balance = balance;
        self
    }

    fn answer(&self, request: WireMessage) -> Option<WireMessage> {
        match request {
            WireMessage::GetWallet { request_id } => Some(WireMessage::GetWalletResponse {
                request_id,
                success: true,
                balance: Some(self.balance),
                address: Some(mock_digest("address", &request_id)),
            }),
            WireMessage::Authenticate { request_id, .. } => {
                Some(WireMessage::AuthenticateResponse {
                    request_id,
                    success: true,
                    session: Some(mock_digest("session", &request_id)),
                })
            }
            WireMessage::SendTransaction { request_id, .. } => {
                Some(WireMessage::SendTransactionResponse {
                    request_id,
                    success: true,
                    txid: Some(mock_digest("txid", &request_id)),
                })
            }
            WireMessage::SignMessage { request_id, .. } => {
                Some(WireMessage::SignMessageResponse {
                    request_id,
                    success: true,
                    signature: Some(mock_digest("signature", &request_id)),
                })
            }
            // The mock wallet never receives responses or events
            _ => None,
        }
    }
}

impl Default for MockWalletLink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletLink for MockWalletLink {
    async fn open(&self) -> Result<LinkHandle> {
        let (handle, mut remote) = link_pair();
        let delay = self.delay;
        let balance = self.balance;

        tokio::spawn(async move {
            let wallet = MockWalletLink { delay, balance };
            while let Some(raw) = remote.requests.recv().await {
                let Ok(request) = serde_json::from_str::<WireMessage>(&raw) else {
                    continue;
                };
                let Some(response) = wallet.answer(request) else {
                    continue;
                };
                tokio::time::sleep(delay).await;
                let Ok(encoded) = serde_json::to_string(&response) else {
                    continue;
                };
                if remote.responses.send(encoded).await.is_err() {
                    break;
                }
            }
        });

        Ok(handle)
    }
}

/// Derive a deterministic hex token from a request id.
fn mock_digest(label: &str, request_id: &RequestId) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"walletkit.mock.v1");
    hasher.update(label.as_bytes());
    hasher.update(request_id.as_bytes());
    hex::encode(&hasher.finalize().as_bytes()[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_answers_get_wallet() {
        let link = MockWalletLink::new().with_delay(Duration::ZERO);
        let mut handle = link.open().await.unwrap();

        let request = WireMessage::GetWallet {
            request_id: RequestId::from_bytes([7; 16]),
        };
        handle
            .outbound
            .send(serde_json::to_string(&request).unwrap())
            .await
            .unwrap();

        let raw = handle.inbound.recv().await.unwrap();
        let response: WireMessage = serde_json::from_str(&raw).unwrap();
        match response {
            WireMessage::GetWalletResponse {
                success, balance, ..
            } => {
                assert!(success);
                assert_eq!(balance, Some(dec!(1.25)));
            }
            other => panic!("expected get-wallet-response, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_mock_results_are_deterministic() {
        let id = RequestId::from_bytes([9; 16]);
        assert_eq!(mock_digest("txid", &id), mock_digest("txid", &id));
        assert_ne!(mock_digest("txid", &id), mock_digest("signature", &id));
    }

    #[tokio::test]
    async fn test_mock_ignores_malformed_requests() {
        let link = MockWalletLink::new().with_delay(Duration::ZERO);
        let mut handle = link.open().await.unwrap();

        handle.outbound.send("{broken".into()).await.unwrap();
        let request = WireMessage::SignMessage {
            request_id: RequestId::from_bytes([3; 16]),
            message: "hello".into(),
        };
        handle
            .outbound
            .send(serde_json::to_string(&request).unwrap())
            .await
            .unwrap();

        // The malformed line produced nothing; the next message answers
        // the valid request.
        let raw = handle.inbound.recv().await.unwrap();
        let response: WireMessage = serde_json::from_str(&raw).unwrap();
        assert_eq!(response.request_id(), Some(RequestId::from_bytes([3; 16])));
    }
}
