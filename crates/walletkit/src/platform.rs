//! The Platform: unified API for the WalletKit system.
//!
//! The Platform brings together the credit ledger, the revenue
//! distribution engine, the permission graph, and the wallet bridge into
//! a cohesive interface for building applications.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;

use walletkit_bridge::{BridgeTransport, WalletLink};
use walletkit_core::{
    distribute, estimate_cost, AppId, CostedOperation, DistributionPlan, DistributionRequest,
    LedgerEntry, TokenRecord, UserId,
};
use walletkit_ledger::{CreditLedger, PlanCatalog, WalletSummary};
use walletkit_perms::PermissionGraph;
use walletkit_store::{DebitOutcome, Store};

use crate::error::Result;

/// Configuration for the Platform.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// The subscription plan and credit package catalog.
    pub catalog: PlanCatalog,
    /// Payouts below this amount are withheld during settlement.
    pub minimum_payout: Decimal,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            catalog: PlanCatalog::standard(),
            minimum_payout: Decimal::ZERO,
        }
    }
}

/// A revenue event to settle across an asset's stakeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevenueEvent {
    /// Reference to the asset that earned the revenue. Also the dedup
    /// key: re-settling the same reference double-pays, so callers must
    /// submit each event exactly once.
    pub asset_reference: String,
    /// Gross revenue to distribute.
    pub total_revenue: Decimal,
    /// Creator royalty percentage, 0 to 100.
    pub royalty_percent: Decimal,
    /// The asset's creator.
    pub creator: UserId,
    /// Stakeholder share counts.
    pub shares: BTreeMap<UserId, u64>,
}

/// Result of an asset unlock attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlockOutcome {
    /// Credits were deducted and the asset is unlocked.
    Unlocked {
        /// The estimated cost that was charged.
        cost: Decimal,
        /// Credits remaining after the charge.
        remaining: Decimal,
    },
    /// The wallet could not cover the cost. Nothing was charged.
    InsufficientCredits {
        /// The estimated cost of the operation.
        required: Decimal,
        /// Credits available at the time of the attempt.
        available: Decimal,
    },
}

/// Result of an on-chain send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The wallet broadcast the transaction.
    Sent {
        /// Transaction id reported by the wallet.
        txid: String,
        /// Platform fee charged in credits.
        fee: Decimal,
    },
    /// The platform fee could not be covered. No bridge call was made.
    InsufficientCredits {
        /// The fee that would have been charged.
        required: Decimal,
        /// Credits available at the time of the attempt.
        available: Decimal,
    },
}

/// Settled revenue: the computed plan and the entries it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementReport {
    /// The distribution plan, withheld payouts included.
    pub plan: DistributionPlan,
    /// The ledger entries posted, royalty first.
    pub entries: Vec<LedgerEntry>,
}

/// The main Platform struct.
///
/// Provides a unified API for:
/// - Wallet balances and credit operations
/// - Revenue settlement across stakeholders
/// - Cross-app token permissions
/// - Correlated calls to the external wallet
pub struct Platform<S: Store> {
    /// The storage backend, shared by the ledger and the graph.
    store: Arc<S>,
    /// The external wallet client.
    bridge: BridgeTransport,
    /// The credit ledger.
    ledger: CreditLedger<S>,
    /// The permission graph.
    permissions: PermissionGraph<S>,
    /// Configuration.
    config: PlatformConfig,
}

impl<S: Store> Platform<S> {
    /// Create a new platform instance.
    pub fn new(store: S, link: impl WalletLink + 'static, config: PlatformConfig) -> Self {
        let store = Arc::new(store);
        Self {
            bridge: BridgeTransport::new(link),
            ledger: CreditLedger::with_catalog(Arc::clone(&store), config.catalog.clone()),
            permissions: PermissionGraph::new(Arc::clone(&store)),
            store,
            config,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The credit ledger.
    pub fn ledger(&self) -> &CreditLedger<S> {
        &self.ledger
    }

    /// The permission graph.
    pub fn permissions(&self) -> &PermissionGraph<S> {
        &self.permissions
    }

    /// The wallet bridge.
    pub fn bridge(&self) -> &BridgeTransport {
        &self.bridge
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Wallet Connection
    // ─────────────────────────────────────────────────────────────────────────

    /// Connect to the external wallet. Returns `false` if the wallet is
    /// unavailable or the handshake exceeds its budget.
    pub async fn connect_wallet(&self) -> bool {
        self.bridge.connect().await
    }

    /// Disconnect from the external wallet. Idempotent.
    pub async fn disconnect_wallet(&self) {
        self.bridge.disconnect().await;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Composite Flows
    // ─────────────────────────────────────────────────────────────────────────

    /// Unlock an asset by charging its estimated platform cost.
    ///
    /// Estimates the cost of `operation`, then atomically deducts it from
    /// the user's credits. A denial charges nothing.
    pub async fn unlock_asset(
        &self,
        user: &UserId,
        asset_reference: &str,
        operation: &CostedOperation,
    ) -> Result<UnlockOutcome> {
        let cost = estimate_cost(operation);
        let description = format!("Unlock {asset_reference}");
        match self.ledger.deduct_credits(user, cost, &description).await? {
            DebitOutcome::Applied { remaining } => {
                tracing::debug!(user = user.as_str(), asset = asset_reference, %cost, "asset unlocked");
                Ok(UnlockOutcome::Unlocked { cost, remaining })
            }
            DebitOutcome::InsufficientCredits { available } => {
                Ok(UnlockOutcome::InsufficientCredits {
                    required: cost,
                    available,
                })
            }
            // deduct_credits maps Inactive to an error
            DebitOutcome::Inactive => unreachable!("inactive outcome surfaces as an error"),
        }
    }

    /// Settle a revenue event across the asset's stakeholders.
    ///
    /// Computes the distribution plan with the configured minimum payout,
    /// then posts one ledger entry per paid stakeholder. Withheld payouts
    /// appear in the returned plan but produce no entries.
    pub async fn settle_revenue(&self, event: &RevenueEvent) -> Result<SettlementReport> {
        let request = DistributionRequest {
            total_revenue: event.total_revenue,
            royalty_percent: event.royalty_percent,
            creator: event.creator.clone(),
            shares: event.shares.clone(),
            minimum_payout: self.config.minimum_payout,
        };
        let plan = distribute(&request)?;
        let entries = self
            .ledger
            .post_distribution(&plan, &event.asset_reference)
            .await?;
        tracing::debug!(
            asset = event.asset_reference,
            paid = entries.len(),
            withheld = plan.withheld.len(),
            "revenue settled"
        );
        Ok(SettlementReport { plan, entries })
    }

    /// Send value on-chain through the external wallet.
    ///
    /// Charges the platform transfer fee in credits first, then asks the
    /// wallet to broadcast. If the bridge call fails after the fee was
    /// taken, an offsetting credit entry refunds it.
    pub async fn send_on_chain(
        &self,
        user: &UserId,
        to: &str,
        amount: Decimal,
    ) -> Result<SendOutcome> {
        let fee = estimate_cost(&CostedOperation::Transfer);
        let description = format!("On-chain send to {to}");
        match self.ledger.deduct_credits(user, fee, &description).await? {
            DebitOutcome::Applied { .. } => {}
            DebitOutcome::InsufficientCredits { available } => {
                return Ok(SendOutcome::InsufficientCredits {
                    required: fee,
                    available,
                });
            }
            DebitOutcome::Inactive => unreachable!("inactive outcome surfaces as an error"),
        }

        match self.bridge.send_transaction(to, amount).await {
            Ok(txid) => Ok(SendOutcome::Sent { txid, fee }),
            Err(err) => {
                let refund = format!("Refund: {description}");
                if let Err(refund_err) = self.ledger.add_credits(user, fee, &refund).await {
                    tracing::warn!(
                        user = user.as_str(),
                        %fee,
                        error = %refund_err,
                        "failed to refund transfer fee after bridge failure"
                    );
                }
                Err(err.into())
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Read-Through Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Balances plus recent activity for a user's wallet.
    pub async fn wallet_summary(&self, user: &UserId) -> Result<WalletSummary> {
        Ok(self.ledger.wallet_summary(user).await?)
    }

    /// Tokens an app owns or has been granted access to.
    pub async fn tokens_available_to(&self, app: &AppId) -> Result<Vec<TokenRecord>> {
        Ok(self.permissions.tokens_available_to(app).await?)
    }
}
