//! Strong type definitions for WalletKit.
//!
//! External identifiers (users, apps, tokens, plans) are opaque strings
//! assigned by the platform; internal identifiers (wallets, ledger entries)
//! are 16-byte values rendered as hex. All are newtypes to prevent misuse
//! at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new identifier from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id! {
    /// A platform user. Users own wallets and hold stakeholder shares.
    UserId
}

string_id! {
    /// An application registered on the platform (e.g. a music or games app).
    AppId
}

string_id! {
    /// A token minted by an application. Tokens are the subject of
    /// cross-app permission edges.
    TokenId
}

string_id! {
    /// A subscription plan from the static catalog.
    PlanId
}

macro_rules! binary_id {
    ($(#[$meta:meta])* $name:ident, $debug:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub [u8; 16]);

        impl $name {
            /// Create from raw bytes.
            pub const fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(bytes)
            }

            /// Get the raw bytes.
            pub const fn as_bytes(&self) -> &[u8; 16] {
                &self.0
            }

            /// Generate a random identifier.
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

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($debug, "({})"), self.to_hex())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }
    };
}

binary_id! {
    /// Identifier of a wallet record.
    ///
    /// Derived deterministically from the owning user and wallet kind, so
    /// lazy get-or-create is naturally idempotent.
    WalletId, "WalletId"
}

binary_id! {
    /// Identifier of an immutable ledger entry.
    EntryId, "EntryId"
}

/// Domain separator for wallet id derivation.
const WALLET_ID_DOMAIN: &[u8] = b"walletkit.wallet.v1";

impl WalletId {
    /// Derive the wallet id for a user and wallet kind.
    pub fn derive(owner: &UserId, kind: crate::wallet::WalletKind) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(WALLET_ID_DOMAIN);
        hasher.update(&[kind as u8]);
        hasher.update(owner.as_str().as_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hash.as_bytes()[..16]);
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::WalletKind;

    #[test]
    fn test_wallet_id_hex_roundtrip() {
        let id = WalletId::from_bytes([0x42; 16]);
        let hex = id.to_hex();
        let recovered = WalletId::from_hex(&hex).unwrap();
        assert_eq!(id, recovered);
    }

    #[test]
    fn test_wallet_id_from_hex_rejects_bad_length() {
        assert!(WalletId::from_hex("abcd").is_err());
    }

    #[test]
    fn test_wallet_id_derivation_deterministic() {
        let user = UserId::from("alice");
        let a = WalletId::derive(&user, WalletKind::SelfCustodied);
        let b = WalletId::derive(&user, WalletKind::SelfCustodied);
        assert_eq!(a, b);
    }

    #[test]
    fn test_wallet_id_derivation_distinguishes_kind() {
        let user = UserId::from("alice");
        let a = WalletId::derive(&user, WalletKind::SelfCustodied);
        let b = WalletId::derive(&user, WalletKind::ExternallyLinked);
        assert_ne!(a, b);
    }

    #[test]
    fn test_string_id_display() {
        let app = AppId::from("bitcoin-music");
        assert_eq!(app.to_string(), "bitcoin-music");
        assert_eq!(app.as_str(), "bitcoin-music");
    }
}
