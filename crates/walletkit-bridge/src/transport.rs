//! The bridge transport: correlated calls over one wallet connection.
//!
//! Owns the single duplex connection to the external wallet process. Each
//! call gets a fresh request id and an entry in the in-flight table; a
//! reader task routes inbound responses to their waiting callers and fans
//! unsolicited events out to registered handlers.
//!
//! State machine: `Disconnected → Connecting → Connected → Disconnected`.
//! There is no automatic reconnect; callers re-invoke [`BridgeTransport::connect`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use walletkit_core::UserId;

use crate::error::{BridgeError, Result};
use crate::link::WalletLink;
use crate::messages::{RequestId, WireMessage};

/// Bound on connection establishment.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Budget for wallet-info queries; answered without human interaction.
pub const GET_WALLET_BUDGET: Duration = Duration::from_secs(5);

/// Budget for authentication; suspends on user approval.
pub const AUTHENTICATE_BUDGET: Duration = Duration::from_secs(30);

/// Budget for message signing; suspends on user approval.
pub const SIGN_MESSAGE_BUDGET: Duration = Duration::from_secs(30);

/// Budget for on-chain sends; approval plus broadcast.
pub const SEND_TRANSACTION_BUDGET: Duration = Duration::from_secs(60);

/// Observable connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
}

/// Token returned by [`BridgeTransport::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Callback invoked with an event's payload.
pub type EventHandler = Arc<dyn Fn(&serde_json::Value) + Send + Sync>;

/// Wallet state reported by `get-wallet`.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletInfo {
    pub balance: Decimal,
    pub address: String,
}

enum ConnState {
    Disconnected,
    Connecting,
    Connected {
        outbound: mpsc::Sender<String>,
        reader: JoinHandle<()>,
    },
}

struct Inner {
    link: Box<dyn WalletLink>,
    state: tokio::sync::Mutex<ConnState>,
    /// In-flight call table. An entry lives from send until response,
    /// timeout, or connection loss, whichever settles it first.
    pending: Mutex<HashMap<RequestId, oneshot::Sender<WireMessage>>>,
    /// Event handlers by event kind, in registration order.
    handlers: Mutex<HashMap<String, Vec<(HandlerId, EventHandler)>>>,
    next_handler: AtomicU64,
}

/// The bridge transport. Cheap to clone; all clones share one connection.
#[derive(Clone)]
pub struct BridgeTransport {
    inner: Arc<Inner>,
}

impl BridgeTransport {
    /// Create a transport over the given link. Starts disconnected.
    pub fn new(link: impl WalletLink + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                link: Box::new(link),
                state: tokio::sync::Mutex::new(ConnState::Disconnected),
                pending: Mutex::new(HashMap::new()),
                handlers: Mutex::new(HashMap::new()),
                next_handler: AtomicU64::new(1),
            }),
        }
    }

    /// Establish the connection.
    ///
    /// Returns `true` once the link signals open, `false` if it does not
    /// open within [`CONNECT_TIMEOUT`] or fails outright. Calling while
    /// already connected is a no-op returning `true`.
    pub async fn connect(&self) -> bool {
        let mut state = self.inner.state.lock().await;
        if matches!(*state, ConnState::Connected { .. }) {
            return true;
        }
        *state = ConnState::Connecting;

        match tokio::time::timeout(CONNECT_TIMEOUT, self.inner.link.open()).await {
            Ok(Ok(handle)) => {
                let outbound = handle.outbound.clone();
                let reader = tokio::spawn(read_loop(Arc::clone(&self.inner), handle.inbound));
                *state = ConnState::Connected { outbound, reader };
                true
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "wallet link failed to open");
                *state = ConnState::Disconnected;
                false
            }
            Err(_) => {
                tracing::warn!(timeout = ?CONNECT_TIMEOUT, "wallet link did not open in time");
                *state = ConnState::Disconnected;
                false
            }
        }
    }

    /// Close the connection and fail every pending call with
    /// [`BridgeError::ConnectionClosed`]. Idempotent.
    pub async fn disconnect(&self) {
        let mut state = self.inner.state.lock().await;
        if let ConnState::Connected { reader, .. } =
            std::mem::replace(&mut *state, ConnState::Disconnected)
        {
            reader.abort();
            drop(state);
            fail_pending(&self.inner);
        }
    }

    /// Current connection state.
    pub async fn state(&self) -> LinkState {
        match *self.inner.state.lock().await {
            ConnState::Disconnected => LinkState::Disconnected,
            ConnState::Connecting => LinkState::Connecting,
            ConnState::Connected { .. } => LinkState::Connected,
        }
    }

    /// Number of calls currently awaiting a response.
    pub fn pending_calls(&self) -> usize {
        self.inner.pending.lock().unwrap().len()
    }

    /// Issue a correlated call and await its response.
    ///
    /// The message must carry a request id. The in-flight entry is removed
    /// on response, timeout, or connection loss, whether or not the caller
    /// is still awaiting.
    pub async fn call(&self, message: WireMessage, budget: Duration) -> Result<WireMessage> {
        let Some(request_id) = message.request_id() else {
            return Err(BridgeError::Link("message has no request id".into()));
        };

        let outbound = {
            let state = self.inner.state.lock().await;
            match &*state {
                ConnState::Connected { outbound, .. } => outbound.clone(),
                _ => return Err(BridgeError::NotConnected),
            }
        };

        let encoded = serde_json::to_string(&message)
            .map_err(|e| BridgeError::Link(format!("encode: {e}")))?;

        let (tx, rx) = oneshot::channel();
        self.inner.pending.lock().unwrap().insert(request_id, tx);

        if outbound.send(encoded).await.is_err() {
            self.inner.pending.lock().unwrap().remove(&request_id);
            return Err(BridgeError::ConnectionClosed);
        }

        match tokio::time::timeout(budget, rx).await {
            Ok(Ok(response)) => Ok(response),
            // Sender dropped: the connection failed the call
            Ok(Err(_)) => Err(BridgeError::ConnectionClosed),
            Err(_) => {
                self.inner.pending.lock().unwrap().remove(&request_id);
                Err(BridgeError::CallTimeout {
                    budget_ms: budget.as_millis() as u64,
                })
            }
        }
    }

    /// Query the wallet's balance and address.
    pub async fn get_wallet(&self) -> Result<WalletInfo> {
        let request = WireMessage::GetWallet {
            request_id: RequestId::random(),
        };
        match self.call(request, GET_WALLET_BUDGET).await? {
            WireMessage::GetWalletResponse {
                success: true,
                balance: Some(balance),
                address: Some(address),
                ..
            } => Ok(WalletInfo { balance, address }),
            WireMessage::GetWalletResponse { success: false, .. } => {
                Err(BridgeError::Rejected("get-wallet".into()))
            }
            other => Err(BridgeError::UnexpectedResponse(format!("{other:?}"))),
        }
    }

    /// Authenticate a user with the wallet. Returns the session token.
    pub async fn authenticate(&self, user: &UserId) -> Result<String> {
        let request = WireMessage::Authenticate {
            request_id: RequestId::random(),
            user: user.clone(),
        };
        match self.call(request, AUTHENTICATE_BUDGET).await? {
            WireMessage::AuthenticateResponse {
                success: true,
                session: Some(session),
                ..
            } => Ok(session),
            WireMessage::AuthenticateResponse { success: false, .. } => {
                Err(BridgeError::Rejected("authenticate".into()))
            }
            other => Err(BridgeError::UnexpectedResponse(format!("{other:?}"))),
        }
    }

    /// Send an on-chain transaction. Returns the transaction id.
    pub async fn send_transaction(&self, to: &str, amount: Decimal) -> Result<String> {
        let request = WireMessage::SendTransaction {
            request_id: RequestId::random(),
            to: to.to_string(),
            amount,
        };
        match self.call(request, SEND_TRANSACTION_BUDGET).await? {
            WireMessage::SendTransactionResponse {
                success: true,
                txid: Some(txid),
                ..
            } => Ok(txid),
            WireMessage::SendTransactionResponse { success: false, .. } => {
                Err(BridgeError::Rejected("send-transaction".into()))
            }
            other => Err(BridgeError::UnexpectedResponse(format!("{other:?}"))),
        }
    }

    /// Sign an arbitrary message. Returns the signature.
    pub async fn sign_message(&self, message: &str) -> Result<String> {
        let request = WireMessage::SignMessage {
            request_id: RequestId::random(),
            message: message.to_string(),
        };
        match self.call(request, SIGN_MESSAGE_BUDGET).await? {
            WireMessage::SignMessageResponse {
                success: true,
                signature: Some(signature),
                ..
            } => Ok(signature),
            WireMessage::SignMessageResponse { success: false, .. } => {
                Err(BridgeError::Rejected("sign-message".into()))
            }
            other => Err(BridgeError::UnexpectedResponse(format!("{other:?}"))),
        }
    }

    /// Register a handler for inbound events of the given kind.
    ///
    /// Handlers for a kind run in registration order. The returned token
    /// identifies the registration for [`BridgeTransport::off`].
    pub fn on(&self, kind: &str, handler: EventHandler) -> HandlerId {
        let id = HandlerId(self.inner.next_handler.fetch_add(1, Ordering::Relaxed));
        self.inner
            .handlers
            .lock()
            .unwrap()
            .entry(kind.to_string())
            .or_default()
            .push((id, handler));
        id
    }

    /// Remove a handler registration. Returns `false` if it was not found.
    pub fn off(&self, kind: &str, id: HandlerId) -> bool {
        let mut handlers = self.inner.handlers.lock().unwrap();
        let Some(list) = handlers.get_mut(kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(hid, _)| *hid != id);
        let removed = list.len() < before;
        if list.is_empty() {
            handlers.remove(kind);
        }
        removed
    }
}

/// Consume inbound messages until the connection drops.
async fn read_loop(inner: Arc<Inner>, mut inbound: mpsc::Receiver<String>) {
    while let Some(raw) = inbound.recv().await {
        let message = match serde_json::from_str::<WireMessage>(&raw) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed inbound message");
                continue;
            }
        };

        match message {
            WireMessage::Event { kind, payload } => dispatch_event(&inner, &kind, &payload),
            message if message.is_response() => {
                let Some(request_id) = message.request_id() else {
                    continue;
                };
                let waiter = inner.pending.lock().unwrap().remove(&request_id);
                match waiter {
                    Some(tx) => {
                        // The caller may have stopped awaiting; that is fine
                        let _ = tx.send(message);
                    }
                    None => {
                        tracing::warn!(%request_id, "dropping unmatched response");
                    }
                }
            }
            message => {
                tracing::warn!(?message, "dropping unexpected inbound request");
            }
        }
    }

    // Remote hung up: fail pending calls and record the drop
    fail_pending(&inner);
    let mut state = inner.state.lock().await;
    if matches!(*state, ConnState::Connected { .. }) {
        *state = ConnState::Disconnected;
    }
}

fn dispatch_event(inner: &Inner, kind: &str, payload: &serde_json::Value) {
    // Snapshot under the lock so a handler can call on()/off() freely
    let snapshot: Vec<EventHandler> = inner
        .handlers
        .lock()
        .unwrap()
        .get(kind)
        .map(|list| list.iter().map(|(_, h)| Arc::clone(h)).collect())
        .unwrap_or_default();

    for handler in snapshot {
        handler(payload);
    }
}

/// Fail every pending call exactly once by dropping its response sender.
fn fail_pending(inner: &Inner) {
    let drained: Vec<_> = inner.pending.lock().unwrap().drain().collect();
    if !drained.is_empty() {
        tracing::warn!(count = drained.len(), "failing pending calls on disconnect");
    }
}
