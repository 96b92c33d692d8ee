//! The cross-app permission graph.
//!
//! Gates which application may observe or act upon a token it does not
//! own. Edges are current-state only, no history. Every cross-app token
//! use routes through [`PermissionGraph::simulate_interaction`]; nothing
//! else checks permissions ad hoc.
//!
//! Concurrent grant/revoke on the same `(owner, grantee, token)` triple is
//! serialized by the store's atomic `merge_edge` / `remove_capabilities`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tokio::sync::broadcast;

use walletkit_core::{
    now_millis, AppId, AppRecord, Capability, PermissionEdge, TokenId, TokenProtocol, TokenRecord,
};
use walletkit_store::{MergeOutcome, RevokeOutcome, Store};

use crate::error::{PermsError, Result};

/// Capacity of the interaction event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Result of a gated interaction attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionOutcome {
    /// The edge exists and carries the capability; the action ran.
    Allowed,
    /// No matching edge, or the edge lacks the capability. No side
    /// effects.
    Denied,
}

/// Notification emitted for every allowed interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionEvent {
    /// The token acted upon.
    pub token: TokenId,
    /// The token's owning app.
    pub owner: AppId,
    /// The app that performed the action.
    pub acting_app: AppId,
    /// The capability exercised.
    pub capability: Capability,
    /// When the interaction ran (Unix ms).
    pub at: i64,
}

/// The permission graph over a storage backend.
pub struct PermissionGraph<S> {
    store: Arc<S>,
    events: broadcast::Sender<InteractionEvent>,
}

impl<S: Store> PermissionGraph<S> {
    /// Create a graph over the given store.
    pub fn new(store: Arc<S>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { store, events }
    }

    /// Subscribe to allowed-interaction notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<InteractionEvent> {
        self.events.subscribe()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registration & Discovery
    // ─────────────────────────────────────────────────────────────────────────

    /// Register an application.
    pub async fn register_app(&self, id: AppId, name: &str) -> Result<AppRecord> {
        let app = AppRecord {
            id,
            name: name.to_string(),
            registered_at: now_millis(),
        };
        self.store.put_app(&app).await?;
        Ok(app)
    }

    /// Register a token under its owning app.
    pub async fn register_token(
        &self,
        owner: &AppId,
        id: TokenId,
        name: &str,
        protocol: TokenProtocol,
    ) -> Result<TokenRecord> {
        if self.store.get_app(owner).await?.is_none() {
            return Err(PermsError::UnknownApp(owner.clone()));
        }
        let token = TokenRecord {
            id,
            owner: owner.clone(),
            name: name.to_string(),
            protocol,
            created_at: now_millis(),
        };
        self.store.put_token(&token).await?;
        Ok(token)
    }

    /// Every known token grouped by owning app.
    ///
    /// A read-only enumeration with no access-control filtering; actual
    /// consumption is still gated at the edge level.
    pub async fn discover_all_tokens(&self) -> Result<BTreeMap<AppId, Vec<TokenRecord>>> {
        let mut grouped: BTreeMap<AppId, Vec<TokenRecord>> = BTreeMap::new();
        for token in self.store.list_tokens().await? {
            grouped.entry(token.owner.clone()).or_default().push(token);
        }
        Ok(grouped)
    }

    /// The access-controlled view: tokens the app owns plus tokens with
    /// an edge into the app.
    pub async fn tokens_available_to(&self, app: &AppId) -> Result<Vec<TokenRecord>> {
        let mut available: BTreeMap<TokenId, TokenRecord> = self
            .store
            .list_tokens()
            .await?
            .into_iter()
            .filter(|t| &t.owner == app)
            .map(|t| (t.id.clone(), t))
            .collect();

        for edge in self.store.edges_into(app).await? {
            if available.contains_key(&edge.token) {
                continue;
            }
            if let Some(token) = self.store.get_token(&edge.token).await? {
                available.insert(token.id.clone(), token);
            }
        }

        Ok(available.into_values().collect())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Grant & Revoke
    // ─────────────────────────────────────────────────────────────────────────

    /// Request access to another app's token.
    ///
    /// Current policy auto-approves: the edge is created or extended with
    /// no human-in-the-loop step. Fails only when the token, its claimed
    /// owner, or the requester is unknown.
    pub async fn request_access(
        &self,
        requester: &AppId,
        token: &TokenId,
        owner: &AppId,
        capability: Capability,
        purpose: &str,
    ) -> Result<MergeOutcome> {
        if self.store.get_app(requester).await?.is_none() {
            return Err(PermsError::UnknownApp(requester.clone()));
        }
        if self.store.get_app(owner).await?.is_none() {
            return Err(PermsError::UnknownApp(owner.clone()));
        }
        match self.store.get_token(token).await? {
            Some(record) if &record.owner == owner => {}
            _ => return Err(PermsError::UnknownToken(token.clone())),
        }

        let mut edge = PermissionEdge::single(
            owner.clone(),
            requester.clone(),
            token.clone(),
            capability,
            now_millis(),
        );
        edge.purpose = Some(purpose.to_string());
        Ok(self.store.merge_edge(&edge).await?)
    }

    /// Maintenance pass: extend a `read` edge for every token to every
    /// other registered app.
    ///
    /// Idempotent; re-running never duplicates edges. Returns the number
    /// of edges newly created.
    pub async fn auto_grant_read_permissions(&self) -> Result<usize> {
        let apps = self.store.list_apps().await?;
        let tokens = self.store.list_tokens().await?;
        let now = now_millis();

        let mut created = 0;
        for token in &tokens {
            for app in &apps {
                if app.id == token.owner {
                    continue;
                }
                let edge = PermissionEdge::single(
                    token.owner.clone(),
                    app.id.clone(),
                    token.id.clone(),
                    Capability::Read,
                    now,
                );
                if self.store.merge_edge(&edge).await? == MergeOutcome::Created {
                    created += 1;
                }
            }
        }

        if created > 0 {
            tracing::debug!(created, "auto-granted read edges");
        }
        Ok(created)
    }

    /// Delete an edge entirely. No-op returning `false` if absent.
    pub async fn revoke_access(
        &self,
        from: &AppId,
        to: &AppId,
        token: &TokenId,
    ) -> Result<bool> {
        Ok(self.store.remove_edge(from, to, token).await?)
    }

    /// Remove only the named capabilities, deleting the edge when none
    /// remain.
    pub async fn revoke_capabilities(
        &self,
        from: &AppId,
        to: &AppId,
        token: &TokenId,
        capabilities: &BTreeSet<Capability>,
    ) -> Result<RevokeOutcome> {
        Ok(self
            .store
            .remove_capabilities(from, to, token, capabilities)
            .await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // The Gate
    // ─────────────────────────────────────────────────────────────────────────

    /// The single enforcement choke point for cross-app token use.
    ///
    /// The owner may always act on its own token. Any other app needs an
    /// edge carrying the capability; otherwise the attempt is denied with
    /// no side effects. Allowed interactions emit an [`InteractionEvent`].
    pub async fn simulate_interaction(
        &self,
        token: &TokenId,
        owner: &AppId,
        acting_app: &AppId,
        capability: Capability,
    ) -> Result<InteractionOutcome> {
        match self.store.get_token(token).await? {
            Some(record) if &record.owner == owner => {}
            _ => return Err(PermsError::UnknownToken(token.clone())),
        }

        let allowed = if acting_app == owner {
            true
        } else {
            self.store
                .get_edge(owner, acting_app, token)
                .await?
                .is_some_and(|edge| edge.allows(capability))
        };

        if !allowed {
            return Ok(InteractionOutcome::Denied);
        }

        // Receiver lag or absence is fine; events are advisory
        let _ = self.events.send(InteractionEvent {
            token: token.clone(),
            owner: owner.clone(),
            acting_app: acting_app.clone(),
            capability,
            at: now_millis(),
        });
        Ok(InteractionOutcome::Allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use walletkit_store::MemoryStore;

    async fn graph_with_apps() -> PermissionGraph<MemoryStore> {
        let graph = PermissionGraph::new(Arc::new(MemoryStore::new()));
        graph
            .register_app(AppId::from("music"), "Bitcoin Music")
            .await
            .unwrap();
        graph
            .register_app(AppId::from("games"), "Bitcoin Games")
            .await
            .unwrap();
        graph
            .register_app(AppId::from("drive"), "Bitcoin Drive")
            .await
            .unwrap();
        graph
            .register_token(
                &AppId::from("music"),
                TokenId::from("track-1"),
                "Track One",
                TokenProtocol::Stas,
            )
            .await
            .unwrap();
        graph
    }

    #[tokio::test]
    async fn test_discovery_groups_by_owner() {
        let graph = graph_with_apps().await;
        graph
            .register_token(
                &AppId::from("games"),
                TokenId::from("sword-1"),
                "Iron Sword",
                TokenProtocol::Run,
            )
            .await
            .unwrap();

        let all = graph.discover_all_tokens().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[&AppId::from("music")][0].id, TokenId::from("track-1"));
        assert_eq!(all[&AppId::from("games")][0].id, TokenId::from("sword-1"));
    }

    #[tokio::test]
    async fn test_token_registration_requires_known_app() {
        let graph = graph_with_apps().await;
        let err = graph
            .register_token(
                &AppId::from("nowhere"),
                TokenId::from("x"),
                "X",
                TokenProtocol::Stas,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PermsError::UnknownApp(_)));
    }

    #[tokio::test]
    async fn test_available_view_is_access_controlled() {
        let graph = graph_with_apps().await;

        // Before any grant, games sees nothing
        assert!(graph
            .tokens_available_to(&AppId::from("games"))
            .await
            .unwrap()
            .is_empty());

        graph
            .request_access(
                &AppId::from("games"),
                &TokenId::from("track-1"),
                &AppId::from("music"),
                Capability::Read,
                "show album art",
            )
            .await
            .unwrap();

        let visible = graph
            .tokens_available_to(&AppId::from("games"))
            .await
            .unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, TokenId::from("track-1"));

        // The owner always sees its own token
        let owned = graph
            .tokens_available_to(&AppId::from("music"))
            .await
            .unwrap();
        assert_eq!(owned.len(), 1);
    }

    #[tokio::test]
    async fn test_request_access_validates_references() {
        let graph = graph_with_apps().await;

        let err = graph
            .request_access(
                &AppId::from("games"),
                &TokenId::from("no-such-token"),
                &AppId::from("music"),
                Capability::Read,
                "p",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PermsError::UnknownToken(_)));

        // Token exists but the claimed owner is wrong
        let err = graph
            .request_access(
                &AppId::from("games"),
                &TokenId::from("track-1"),
                &AppId::from("drive"),
                Capability::Read,
                "p",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PermsError::UnknownToken(_)));

        let err = graph
            .request_access(
                &AppId::from("ghost"),
                &TokenId::from("track-1"),
                &AppId::from("music"),
                Capability::Read,
                "p",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PermsError::UnknownApp(_)));
    }

    #[tokio::test]
    async fn test_permission_gate_and_revoke_restore() {
        let graph = graph_with_apps().await;
        let token = TokenId::from("track-1");
        let music = AppId::from("music");
        let games = AppId::from("games");

        // Pre-grant: denied
        assert_eq!(
            graph
                .simulate_interaction(&token, &music, &games, Capability::Interact)
                .await
                .unwrap(),
            InteractionOutcome::Denied
        );

        graph
            .request_access(&games, &token, &music, Capability::Interact, "play sample")
            .await
            .unwrap();
        assert_eq!(
            graph
                .simulate_interaction(&token, &music, &games, Capability::Interact)
                .await
                .unwrap(),
            InteractionOutcome::Allowed
        );

        // The grant was capability-scoped: transfer still denied
        assert_eq!(
            graph
                .simulate_interaction(&token, &music, &games, Capability::Transfer)
                .await
                .unwrap(),
            InteractionOutcome::Denied
        );

        // Revoke returns the graph to pre-grant behavior
        assert!(graph.revoke_access(&music, &games, &token).await.unwrap());
        assert_eq!(
            graph
                .simulate_interaction(&token, &music, &games, Capability::Interact)
                .await
                .unwrap(),
            InteractionOutcome::Denied
        );
        assert!(!graph.revoke_access(&music, &games, &token).await.unwrap());
    }

    #[tokio::test]
    async fn test_owner_always_passes_the_gate() {
        let graph = graph_with_apps().await;
        assert_eq!(
            graph
                .simulate_interaction(
                    &TokenId::from("track-1"),
                    &AppId::from("music"),
                    &AppId::from("music"),
                    Capability::Transfer,
                )
                .await
                .unwrap(),
            InteractionOutcome::Allowed
        );
    }

    #[tokio::test]
    async fn test_auto_grant_is_idempotent() {
        let graph = graph_with_apps().await;
        graph
            .register_token(
                &AppId::from("games"),
                TokenId::from("sword-1"),
                "Iron Sword",
                TokenProtocol::Run,
            )
            .await
            .unwrap();

        // track-1 to games+drive, sword-1 to music+drive
        assert_eq!(graph.auto_grant_read_permissions().await.unwrap(), 4);
        assert_eq!(graph.auto_grant_read_permissions().await.unwrap(), 0);

        assert_eq!(
            graph
                .simulate_interaction(
                    &TokenId::from("sword-1"),
                    &AppId::from("games"),
                    &AppId::from("drive"),
                    Capability::Read,
                )
                .await
                .unwrap(),
            InteractionOutcome::Allowed
        );
    }

    #[tokio::test]
    async fn test_allowed_interactions_emit_events() {
        let graph = graph_with_apps().await;
        let mut events = graph.subscribe();

        graph
            .request_access(
                &AppId::from("games"),
                &TokenId::from("track-1"),
                &AppId::from("music"),
                Capability::Read,
                "p",
            )
            .await
            .unwrap();

        // Denied attempts emit nothing
        graph
            .simulate_interaction(
                &TokenId::from("track-1"),
                &AppId::from("music"),
                &AppId::from("games"),
                Capability::Transfer,
            )
            .await
            .unwrap();

        graph
            .simulate_interaction(
                &TokenId::from("track-1"),
                &AppId::from("music"),
                &AppId::from("games"),
                Capability::Read,
            )
            .await
            .unwrap();

        let event = events.recv().await.unwrap();
        assert_eq!(event.capability, Capability::Read);
        assert_eq!(event.acting_app, AppId::from("games"));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_capability_scoped_revoke_narrows_edge() {
        let graph = graph_with_apps().await;
        let token = TokenId::from("track-1");
        let music = AppId::from("music");
        let games = AppId::from("games");

        graph
            .request_access(&games, &token, &music, Capability::Read, "p")
            .await
            .unwrap();
        graph
            .request_access(&games, &token, &music, Capability::Interact, "p")
            .await
            .unwrap();

        let outcome = graph
            .revoke_capabilities(&music, &games, &token, &BTreeSet::from([Capability::Interact]))
            .await
            .unwrap();
        assert_eq!(outcome, RevokeOutcome::Narrowed);

        assert_eq!(
            graph
                .simulate_interaction(&token, &music, &games, Capability::Read)
                .await
                .unwrap(),
            InteractionOutcome::Allowed
        );
        assert_eq!(
            graph
                .simulate_interaction(&token, &music, &games, Capability::Interact)
                .await
                .unwrap(),
            InteractionOutcome::Denied
        );
    }
}
