//! The credit ledger: the authoritative record of wallet balances.
//!
//! Every balance change is an appended [`LedgerEntry`]; balances are the
//! running effect of those entries. The ledger is the sole writer of
//! wallet and entry state. Atomicity of the check-then-act deduction is
//! delegated to the store, which serializes it internally.

use std::sync::Arc;

use rust_decimal::Decimal;

use walletkit_core::{
    now_millis, DistributionPlan, EntryKind, LedgerEntry, PlanId, UserId, Wallet, WalletId,
    WalletKind,
};
use walletkit_store::{DebitOutcome, Store};

use crate::catalog::PlanCatalog;
use crate::error::{LedgerError, Result};

/// Number of entries returned by [`CreditLedger::wallet_summary`].
pub const SUMMARY_ENTRIES: usize = 10;

/// Read-only projection of a wallet for display.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletSummary {
    /// The wallet record, balances included.
    pub wallet: Wallet,
    /// Credits plus on-chain balance.
    pub total_value: Decimal,
    /// The most recent entries, newest first.
    pub recent_entries: Vec<LedgerEntry>,
    /// Total entries ever appended.
    pub entry_count: u64,
}

/// The credit ledger over a storage backend.
pub struct CreditLedger<S> {
    store: Arc<S>,
    catalog: PlanCatalog,
}

impl<S: Store> CreditLedger<S> {
    /// Create a ledger with the standard plan catalog.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_catalog(store, PlanCatalog::standard())
    }

    /// Create a ledger with a custom catalog.
    pub fn with_catalog(store: Arc<S>, catalog: PlanCatalog) -> Self {
        Self { store, catalog }
    }

    /// The plan catalog in use.
    pub fn catalog(&self) -> &PlanCatalog {
        &self.catalog
    }

    /// Get the user's wallet, creating an empty one on first contact.
    pub async fn get_or_create_wallet(&self, user: &UserId) -> Result<Wallet> {
        Ok(self
            .store
            .get_or_create_wallet(user, WalletKind::SelfCustodied, now_millis())
            .await?)
    }

    /// Add prepaid credits to a user's wallet.
    pub async fn add_credits(
        &self,
        user: &UserId,
        amount: Decimal,
        source_description: &str,
    ) -> Result<LedgerEntry> {
        self.credit_entry(user, EntryKind::Credit, amount, source_description, None)
            .await
    }

    /// Grant a credit package purchase.
    ///
    /// The grant is the package's credits plus its bonus, tagged with the
    /// package id.
    pub async fn purchase_package(&self, user: &UserId, package_id: &str) -> Result<LedgerEntry> {
        let package = self
            .catalog
            .package(package_id)
            .ok_or_else(|| LedgerError::UnknownPackage(package_id.to_string()))?;
        let description = format!("Purchased {}", package.name);
        let metadata = serde_json::json!({ "package": package.id });
        self.credit_entry(
            user,
            EntryKind::Credit,
            package.total_credits(),
            &description,
            Some(metadata),
        )
        .await
    }

    /// Atomically deduct credits for a platform operation.
    ///
    /// Returns the store's outcome: applied with the remaining balance, or
    /// denied with the available balance and no side effect. Deduction on
    /// a deactivated wallet is an error, matching the other mutations.
    pub async fn deduct_credits(
        &self,
        user: &UserId,
        amount: Decimal,
        description: &str,
    ) -> Result<DebitOutcome> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount { amount });
        }

        let wallet = self.get_or_create_wallet(user).await?;
        let entry = LedgerEntry::new(wallet.id, EntryKind::Debit, amount, description, now_millis());
        match self.store.apply_debit(&entry).await? {
            DebitOutcome::Inactive => Err(LedgerError::WalletDeactivated),
            outcome => Ok(outcome),
        }
    }

    /// Grant a plan's periodic credits, tagged with the plan id.
    ///
    /// An unknown plan fails with no side effect.
    pub async fn apply_plan(&self, user: &UserId, plan_id: &PlanId) -> Result<LedgerEntry> {
        let plan = self
            .catalog
            .plan(plan_id)
            .ok_or_else(|| LedgerError::UnknownPlan(plan_id.clone()))?;
        let description = format!("{} plan credit grant", plan.name);
        let metadata = serde_json::json!({ "plan": plan.id });
        self.credit_entry(
            user,
            EntryKind::Credit,
            plan.credit_grant,
            &description,
            Some(metadata),
        )
        .await
    }

    /// Record direct revenue settled to a user's on-chain balance.
    pub async fn record_revenue(
        &self,
        user: &UserId,
        amount: Decimal,
        description: &str,
    ) -> Result<LedgerEntry> {
        self.credit_entry(user, EntryKind::Revenue, amount, description, None)
            .await
    }

    /// Record one stakeholder payout from a revenue distribution.
    ///
    /// Increases the on-chain balance bucket: distributed revenue is owed
    /// value, not purchased credit.
    pub async fn record_distribution(
        &self,
        user: &UserId,
        amount: Decimal,
        asset_reference: &str,
    ) -> Result<LedgerEntry> {
        let metadata = serde_json::json!({ "asset": asset_reference });
        self.credit_entry(
            user,
            EntryKind::Distribution,
            amount,
            &format!("Revenue distribution for {asset_reference}"),
            Some(metadata),
        )
        .await
    }

    /// Post every payout of a distribution plan as a batch.
    ///
    /// Each payout is an independent `record_distribution`; a failure
    /// partway leaves earlier payouts posted, which is safe to retry as
    /// long as the caller does not re-submit the same revenue event.
    /// Withheld payouts are not posted anywhere.
    pub async fn post_distribution(
        &self,
        plan: &DistributionPlan,
        asset_reference: &str,
    ) -> Result<Vec<LedgerEntry>> {
        let mut entries = Vec::new();
        for payout in plan.royalty.iter().chain(plan.payouts.iter()) {
            let entry = self
                .record_distribution(&payout.holder, payout.amount, asset_reference)
                .await?;
            entries.push(entry);
        }
        if !plan.withheld.is_empty() {
            let total: Decimal = plan.withheld.iter().map(|p| p.amount).sum();
            tracing::warn!(
                asset = asset_reference,
                holders = plan.withheld.len(),
                %total,
                "withholding sub-minimum payouts; amount stays with the distributor"
            );
        }
        Ok(entries)
    }

    /// Current balances plus the most recent entries for display.
    ///
    /// Read-only; works on deactivated wallets too.
    pub async fn wallet_summary(&self, user: &UserId) -> Result<WalletSummary> {
        let wallet = self.get_or_create_wallet(user).await?;
        let recent_entries = self
            .store
            .recent_entries(&wallet.id, SUMMARY_ENTRIES)
            .await?;
        let entry_count = self.store.entry_count(&wallet.id).await?;
        Ok(WalletSummary {
            total_value: wallet.credits + wallet.on_chain_balance,
            wallet,
            recent_entries,
            entry_count,
        })
    }

    /// Deactivate a user's wallet. Wallets are never deleted.
    pub async fn deactivate_wallet(&self, user: &UserId) -> Result<WalletId> {
        let wallet = self.get_or_create_wallet(user).await?;
        self.store.set_wallet_active(&wallet.id, false).await?;
        Ok(wallet.id)
    }

    /// Reactivate a previously deactivated wallet.
    pub async fn reactivate_wallet(&self, user: &UserId) -> Result<WalletId> {
        let wallet = self.get_or_create_wallet(user).await?;
        self.store.set_wallet_active(&wallet.id, true).await?;
        Ok(wallet.id)
    }

    async fn credit_entry(
        &self,
        user: &UserId,
        kind: EntryKind,
        amount: Decimal,
        description: &str,
        metadata: Option<serde_json::Value>,
    ) -> Result<LedgerEntry> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount { amount });
        }

        let wallet = self.get_or_create_wallet(user).await?;
        if !wallet.active {
            return Err(LedgerError::WalletDeactivated);
        }

        let mut entry = LedgerEntry::new(wallet.id, kind, amount, description, now_millis());
        if let Some(metadata) = metadata {
            entry = entry.with_metadata(metadata);
        }
        self.store.apply_entry(&entry).await?;
        Ok(entry)
    }
}
