//! # WalletKit Permissions
//!
//! The cross-app permission graph: which application may observe or act
//! on a token it does not own.
//!
//! ## Overview
//!
//! Access is expressed as directed, capability-scoped edges from a
//! token's owning app to a grantee app. Granting merges capability sets;
//! revoking deletes the edge (or narrows it, when capability-scoped).
//! [`PermissionGraph::simulate_interaction`] is the single enforcement
//! choke point; allowed interactions fan out as [`InteractionEvent`]s on
//! a broadcast channel.
//!
//! ## Key Types
//!
//! - [`PermissionGraph`] - Discovery, grant, revoke, and the gate
//! - [`InteractionOutcome`] - Allowed or denied, as a value
//! - [`InteractionEvent`] - Notification of an allowed interaction

pub mod error;
pub mod graph;

pub use error::{PermsError, Result};
pub use graph::{InteractionEvent, InteractionOutcome, PermissionGraph};
