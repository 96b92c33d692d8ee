//! Subscription plans and credit packages.
//!
//! Plans are immutable configuration, not user data. The concrete catalog
//! lives in `walletkit-ledger`; this module defines the shapes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::PlanId;

/// Quotas attached to a subscription plan. `None` means unlimited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanLimits {
    /// Storage quota in gigabytes.
    pub storage_gb: Option<u32>,
    /// Monthly action quota (uploads, tokenizations, ...).
    pub actions_per_month: Option<u32>,
    /// Percentage of payout revenue retained by the platform.
    pub platform_share_percent: Decimal,
}

/// A static catalog entry granting periodic credits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    /// Catalog identifier, e.g. `starter`.
    pub id: PlanId,
    /// Display name.
    pub name: String,
    /// Monthly price in USD.
    pub monthly_price_usd: Decimal,
    /// Credits granted on each billing cycle, in the base asset.
    pub credit_grant: Decimal,
    /// Plan quotas.
    pub limits: PlanLimits,
}

/// A one-time credit purchase bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditPackage {
    /// Package identifier, e.g. `small`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Price in USD.
    pub price_usd: Decimal,
    /// Credits included, in the base asset.
    pub credits: Decimal,
    /// Bonus credits on top of the base amount.
    pub bonus: Decimal,
}

impl CreditPackage {
    /// Total credits granted when the package is purchased.
    pub fn total_credits(&self) -> Decimal {
        self.credits + self.bonus
    }
}
