//! Cross-app permission graph records.
//!
//! Pure data for the permission graph: registered apps, their tokens, and
//! the directed capability edges between apps. The graph logic that
//! interprets these records lives in `walletkit-perms`; storage backends
//! persist them as-is.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::cost::TokenProtocol;
use crate::types::{AppId, TokenId};

/// What an edge permits the grantee app to do with a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum Capability {
    /// Observe the token and its metadata.
    Read = 0,
    /// Trigger token behavior without transferring ownership.
    Interact = 1,
    /// Move the token to another holder.
    Transfer = 2,
}

impl Capability {
    /// Decode from the stored discriminant.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Capability::Read),
            1 => Some(Capability::Interact),
            2 => Some(Capability::Transfer),
            _ => None,
        }
    }
}

/// An application registered with the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRecord {
    /// Application identifier.
    pub id: AppId,
    /// Display name.
    pub name: String,
    /// Registration time (Unix ms).
    pub registered_at: i64,
}

/// A token minted by an application. The owning app is the only one that
/// may act on the token without a permission edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Token identifier.
    pub id: TokenId,
    /// The minting (owning) app.
    pub owner: AppId,
    /// Display name.
    pub name: String,
    /// Protocol the token was minted under.
    pub protocol: TokenProtocol,
    /// Mint time (Unix ms).
    pub created_at: i64,
}

/// A directed capability grant: `from` (the token's owner) lets `to` use
/// `token` with the given capabilities.
///
/// At most one edge exists per `(from, to, token)` triple. Re-granting
/// merges capability sets instead of creating a second edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionEdge {
    /// The token's owning app.
    pub from: AppId,
    /// The app being granted access.
    pub to: AppId,
    /// The token the grant covers.
    pub token: TokenId,
    /// Granted capabilities, never empty.
    pub capabilities: BTreeSet<Capability>,
    /// Free-form reason recorded when access was requested.
    pub purpose: Option<String>,
    /// When the edge was first created (Unix ms).
    pub granted_at: i64,
    /// When capabilities last changed (Unix ms).
    pub updated_at: i64,
}

impl PermissionEdge {
    /// Build an edge with a single capability.
    pub fn single(
        from: AppId,
        to: AppId,
        token: TokenId,
        capability: Capability,
        now: i64,
    ) -> Self {
        Self {
            from,
            to,
            token,
            capabilities: BTreeSet::from([capability]),
            purpose: None,
            granted_at: now,
            updated_at: now,
        }
    }

    /// Whether the edge includes the capability.
    pub fn allows(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_discriminant_roundtrip() {
        for cap in [Capability::Read, Capability::Interact, Capability::Transfer] {
            assert_eq!(Capability::from_u8(cap as u8), Some(cap));
        }
        assert_eq!(Capability::from_u8(7), None);
    }

    #[test]
    fn test_edge_allows() {
        let edge = PermissionEdge::single(
            AppId::from("music"),
            AppId::from("games"),
            TokenId::from("track-1"),
            Capability::Read,
            10,
        );
        assert!(edge.allows(Capability::Read));
        assert!(!edge.allows(Capability::Transfer));
    }
}
