//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;

use walletkit::bridge::MockWalletLink;
use walletkit::{Platform, PlatformConfig};
use walletkit_core::{AppId, TokenId, TokenProtocol, UserId};
use walletkit_ledger::CreditLedger;
use walletkit_perms::PermissionGraph;
use walletkit_store::MemoryStore;

/// A test fixture with a shared in-memory store.
///
/// The ledger and graph views hand out here share one store, so credit
/// and permission state set up through either is visible to both.
pub struct TestFixture {
    pub store: Arc<MemoryStore>,
}

impl TestFixture {
    /// Create a new test fixture over an empty store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
        }
    }

    /// A credit ledger over the fixture's store.
    pub fn ledger(&self) -> CreditLedger<MemoryStore> {
        CreditLedger::new(Arc::clone(&self.store))
    }

    /// A permission graph over the fixture's store.
    pub fn permissions(&self) -> PermissionGraph<MemoryStore> {
        PermissionGraph::new(Arc::clone(&self.store))
    }

    /// Create a user and top their wallet up with credits.
    pub async fn seed_wallet(&self, user: &str, credits: Decimal) -> UserId {
        let user = UserId::from(user);
        self.ledger()
            .add_credits(&user, credits, "fixture seed")
            .await
            .expect("memory store seed");
        user
    }

    /// Register an app under a readable id.
    pub async fn seed_app(&self, id: &str, name: &str) -> AppId {
        let app = AppId::from(id);
        self.permissions()
            .register_app(app.clone(), name)
            .await
            .expect("memory store seed");
        app
    }

    /// Register a STAS token owned by the given app.
    pub async fn seed_token(&self, owner: &AppId, id: &str, name: &str) -> TokenId {
        let token = TokenId::from(id);
        self.permissions()
            .register_token(owner, token.clone(), name, TokenProtocol::Stas)
            .await
            .expect("memory store seed");
        token
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a stakeholder share table from `(holder, count)` pairs.
pub fn stakeholders(counts: &[(&str, u64)]) -> BTreeMap<UserId, u64> {
    counts
        .iter()
        .map(|(holder, count)| (UserId::from(*holder), *count))
        .collect()
}

/// A platform over a fresh in-memory store and a fast mock wallet.
pub fn mock_platform() -> Platform<MemoryStore> {
    let link = MockWalletLink::new().with_delay(std::time::Duration::from_millis(1));
    Platform::new(MemoryStore::new(), link, PlatformConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_fixture_views_share_state() {
        let fixture = TestFixture::new();
        let user = fixture.seed_wallet("alice", dec!(1)).await;

        // A second ledger over the same fixture sees the seed
        let summary = fixture.ledger().wallet_summary(&user).await.unwrap();
        assert_eq!(summary.wallet.credits, dec!(1));
    }

    #[tokio::test]
    async fn test_seeded_tokens_are_discoverable() {
        let fixture = TestFixture::new();
        let music = fixture.seed_app("music", "Bitcoin Music").await;
        fixture.seed_token(&music, "track-1", "Track One").await;

        let all = fixture.permissions().discover_all_tokens().await.unwrap();
        assert_eq!(all[&music].len(), 1);
    }

    #[test]
    fn test_stakeholders_builder() {
        let shares = stakeholders(&[("a", 70), ("b", 30)]);
        assert_eq!(shares[&UserId::from("a")], 70);
        assert_eq!(shares.len(), 2);
    }
}
