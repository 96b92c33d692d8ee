//! Wire message types for the wallet bridge.
//!
//! Messages are JSON objects with a `type` discriminator. Requests carry a
//! `requestId`; responses echo the `requestId` they answer plus a `success`
//! flag. Anything that fails to parse into [`WireMessage`] is dropped by
//! the transport, never surfaced as a call failure.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use walletkit_core::UserId;

/// Correlation identifier for one request/response exchange.
///
/// Rendered as hex on the wire so the remote side treats it as an opaque
/// string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub [u8; 16]);

impl RequestId {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Generate a fresh random identifier.
    pub fn random() -> Self {
        use rand::Rng;
        Self(rand::thread_rng().gen())
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 16 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for RequestId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        RequestId::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// All messages exchanged with the external wallet process.
///
/// Request variants flow outbound; `*Response` variants and `Event` flow
/// inbound. Optional response fields are absent when `success` is false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WireMessage {
    /// Ask for the wallet's current state.
    #[serde(rename_all = "camelCase")]
    GetWallet { request_id: RequestId },

    /// Ask the wallet to authenticate a user. Suspends on human approval.
    #[serde(rename_all = "camelCase")]
    Authenticate { request_id: RequestId, user: UserId },

    /// Ask the wallet to broadcast an on-chain send. Suspends on human
    /// approval.
    #[serde(rename_all = "camelCase")]
    SendTransaction {
        request_id: RequestId,
        to: String,
        amount: Decimal,
    },

    /// Ask the wallet to sign an arbitrary message. Suspends on human
    /// approval.
    #[serde(rename_all = "camelCase")]
    SignMessage { request_id: RequestId, message: String },

    #[serde(rename_all = "camelCase")]
    GetWalletResponse {
        request_id: RequestId,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        balance: Option<Decimal>,
        #[serde(skip_serializing_if = "Option::is_none")]
        address: Option<String>,
    },

    #[serde(rename_all = "camelCase")]
    AuthenticateResponse {
        request_id: RequestId,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        session: Option<String>,
    },

    #[serde(rename_all = "camelCase")]
    SendTransactionResponse {
        request_id: RequestId,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        txid: Option<String>,
    },

    #[serde(rename_all = "camelCase")]
    SignMessageResponse {
        request_id: RequestId,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
    },

    /// Unsolicited notification from the wallet process.
    #[serde(rename_all = "camelCase")]
    Event {
        kind: String,
        payload: serde_json::Value,
    },
}

impl WireMessage {
    /// The correlation id, if this message takes part in a call.
    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            WireMessage::GetWallet { request_id }
            | WireMessage::Authenticate { request_id, .. }
            | WireMessage::SendTransaction { request_id, .. }
            | WireMessage::SignMessage { request_id, .. }
            | WireMessage::GetWalletResponse { request_id, .. }
            | WireMessage::AuthenticateResponse { request_id, .. }
            | WireMessage::SendTransactionResponse { request_id, .. }
            | WireMessage::SignMessageResponse { request_id, .. } => Some(*request_id),
            WireMessage::Event { .. } => None,
        }
    }

    /// Whether this message answers a request.
    pub fn is_response(&self) -> bool {
        matches!(
            self,
            WireMessage::GetWalletResponse { .. }
                | WireMessage::AuthenticateResponse { .. }
                | WireMessage::SendTransactionResponse { .. }
                | WireMessage::SignMessageResponse { .. }
        )
    }

    /// The `success` flag for response messages.
    pub fn success(&self) -> Option<bool> {
        match self {
            WireMessage::GetWalletResponse { success, .. }
            | WireMessage::AuthenticateResponse { success, .. }
            | WireMessage::SendTransactionResponse { success, .. }
            | WireMessage::SignMessageResponse { success, .. } => Some(*success),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_request_wire_shape() {
        let id = RequestId::from_bytes([0xab; 16]);
        let msg = WireMessage::SendTransaction {
            request_id: id,
            to: "1BitcoinAddr".into(),
            amount: dec!(0.5),
        };

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "send-transaction");
        assert_eq!(json["requestId"], id.to_hex());
        assert_eq!(json["to"], "1BitcoinAddr");
    }

    #[test]
    fn test_response_roundtrip() {
        let raw = format!(
            r#"{{"type":"get-wallet-response","requestId":"{}","success":true,"balance":"1.25","address":"addr-1"}}"#,
            RequestId::from_bytes([1; 16]).to_hex()
        );
        let msg: WireMessage = serde_json::from_str(&raw).unwrap();
        assert!(msg.is_response());
        assert_eq!(msg.success(), Some(true));
        assert_eq!(msg.request_id(), Some(RequestId::from_bytes([1; 16])));
    }

    #[test]
    fn test_event_has_no_request_id() {
        let msg: WireMessage = serde_json::from_str(
            r#"{"type":"event","kind":"balance-changed","payload":{"delta":"0.1"}}"#,
        )
        .unwrap();
        assert_eq!(msg.request_id(), None);
        assert!(!msg.is_response());
    }

    #[test]
    fn test_malformed_payload_fails_parse() {
        assert!(serde_json::from_str::<WireMessage>(r#"{"type":"no-such-type"}"#).is_err());
        assert!(serde_json::from_str::<WireMessage>("not json at all").is_err());
    }
}
