//! The static plan and credit-package catalog.
//!
//! Catalog contents are configuration, not user data. The standard
//! catalog mirrors the platform's published pricing.

use std::collections::BTreeMap;

use rust_decimal_macros::dec;

use walletkit_core::{CreditPackage, PlanId, PlanLimits, SubscriptionPlan};

/// Immutable lookup table of subscription plans and credit packages.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    plans: BTreeMap<PlanId, SubscriptionPlan>,
    packages: Vec<CreditPackage>,
}

impl PlanCatalog {
    /// The platform's standard pricing.
    pub fn standard() -> Self {
        let plans = [
            SubscriptionPlan {
                id: PlanId::from("free"),
                name: "Free".into(),
                monthly_price_usd: dec!(0),
                credit_grant: dec!(0.001),
                limits: PlanLimits {
                    storage_gb: Some(1),
                    actions_per_month: Some(10),
                    platform_share_percent: dec!(20),
                },
            },
            SubscriptionPlan {
                id: PlanId::from("starter"),
                name: "Starter".into(),
                monthly_price_usd: dec!(9.99),
                credit_grant: dec!(0.1),
                limits: PlanLimits {
                    storage_gb: Some(10),
                    actions_per_month: Some(100),
                    platform_share_percent: dec!(15),
                },
            },
            SubscriptionPlan {
                id: PlanId::from("pro"),
                name: "Professional".into(),
                monthly_price_usd: dec!(29.99),
                credit_grant: dec!(0.5),
                limits: PlanLimits {
                    storage_gb: Some(100),
                    actions_per_month: None,
                    platform_share_percent: dec!(10),
                },
            },
            SubscriptionPlan {
                id: PlanId::from("enterprise"),
                name: "Enterprise".into(),
                monthly_price_usd: dec!(99.99),
                credit_grant: dec!(2.0),
                limits: PlanLimits {
                    storage_gb: None,
                    actions_per_month: None,
                    platform_share_percent: dec!(5),
                },
            },
        ];

        let packages = vec![
            CreditPackage {
                id: "small".into(),
                name: "Small Pack".into(),
                price_usd: dec!(5),
                credits: dec!(0.1),
                bonus: dec!(0),
            },
            CreditPackage {
                id: "medium".into(),
                name: "Medium Pack".into(),
                price_usd: dec!(20),
                credits: dec!(0.5),
                bonus: dec!(0.05),
            },
            CreditPackage {
                id: "large".into(),
                name: "Large Pack".into(),
                price_usd: dec!(50),
                credits: dec!(1.5),
                bonus: dec!(0.3),
            },
            CreditPackage {
                id: "whale".into(),
                name: "Whale Pack".into(),
                price_usd: dec!(200),
                credits: dec!(10),
                bonus: dec!(2.5),
            },
        ];

        Self {
            plans: plans.into_iter().map(|p| (p.id.clone(), p)).collect(),
            packages,
        }
    }

    /// Look up a plan by id.
    pub fn plan(&self, id: &PlanId) -> Option<&SubscriptionPlan> {
        self.plans.get(id)
    }

    /// Look up a credit package by id.
    pub fn package(&self, id: &str) -> Option<&CreditPackage> {
        self.packages.iter().find(|p| p.id == id)
    }

    /// All plans, ordered by id.
    pub fn plans(&self) -> impl Iterator<Item = &SubscriptionPlan> {
        self.plans.values()
    }

    /// All credit packages, in catalog order.
    pub fn packages(&self) -> &[CreditPackage] {
        &self.packages
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
