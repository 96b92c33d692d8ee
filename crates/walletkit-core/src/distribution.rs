//! Revenue distribution engine.
//!
//! A pure computation: given total revenue, a creator royalty and a table
//! of stakeholder share counts, produce a payout plan. No state is read or
//! written here; the ledger applies the plan afterwards.
//!
//! Conservation invariant: `royalty + sum(paid payouts) <= total_revenue`,
//! with equality when every computed payout clears the minimum threshold.
//! Amounts are truncated toward zero at 8 decimal places so rounding can
//! never pay out more than was taken in.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DistributionError;
use crate::types::UserId;

/// Decimal places of the base asset.
const SCALE: u32 = 8;

fn truncate(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(SCALE, RoundingStrategy::ToZero)
}

/// Why a payout exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayoutReason {
    /// Creator royalty, taken off the top. Never subject to the minimum.
    Royalty,
    /// Pro-rata stakeholder share of the remainder.
    ProRata,
}

/// One computed payment to a holder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    /// Receiving user.
    pub holder: UserId,
    /// Positive amount in the base asset.
    pub amount: Decimal,
    /// Why this payout exists.
    pub reason: PayoutReason,
}

/// Input to [`distribute`].
///
/// `shares` uses a `BTreeMap` so iteration order, and therefore payout
/// order, is stable across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionRequest {
    /// Total revenue to split, strictly positive.
    pub total_revenue: Decimal,
    /// Creator royalty as a percentage in `[0, 100]`.
    pub royalty_percent: Decimal,
    /// Royalty recipient.
    pub creator: UserId,
    /// Stakeholder share counts. Holders with zero shares get nothing.
    pub shares: BTreeMap<UserId, u64>,
    /// Payouts strictly below this amount are withheld, non-negative.
    pub minimum_payout: Decimal,
}

/// Output of [`distribute`]: what to pay and what was withheld.
///
/// Withheld amounts are not carried over to later events; they stay with
/// the distributing party. They are reported here so callers can account
/// for the gap between `total_revenue` and [`DistributionPlan::total_paid`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionPlan {
    /// Creator royalty, absent when the royalty rounds to zero.
    pub royalty: Option<Payout>,
    /// Pro-rata payouts that cleared the minimum.
    pub payouts: Vec<Payout>,
    /// Pro-rata payouts below the minimum. Informational only.
    pub withheld: Vec<Payout>,
}

impl DistributionPlan {
    /// Sum of the royalty and all paid pro-rata payouts.
    pub fn total_paid(&self) -> Decimal {
        let royalty = self.royalty.as_ref().map_or(Decimal::ZERO, |p| p.amount);
        royalty + self.payouts.iter().map(|p| p.amount).sum::<Decimal>()
    }

    /// Total amounts by receiving holder, royalty included. A creator who
    /// also holds shares appears once with both amounts summed.
    pub fn totals_by_holder(&self) -> BTreeMap<UserId, Decimal> {
        let mut totals = BTreeMap::new();
        for p in self.royalty.iter().chain(self.payouts.iter()) {
            *totals.entry(p.holder.clone()).or_insert(Decimal::ZERO) += p.amount;
        }
        totals
    }
}

/// Compute a payout plan for one revenue event.
///
/// The royalty is taken off the top and credited in full to the creator
/// regardless of the minimum threshold. The remainder is split pro rata by
/// share count; any holder whose computed payout falls below
/// `minimum_payout` receives nothing for this event.
pub fn distribute(request: &DistributionRequest) -> Result<DistributionPlan, DistributionError> {
    if request.total_revenue <= Decimal::ZERO {
        return Err(DistributionError::InvalidAmount {
            amount: request.total_revenue,
        });
    }
    if request.royalty_percent < Decimal::ZERO || request.royalty_percent > dec!(100) {
        return Err(DistributionError::InvalidRoyalty {
            percent: request.royalty_percent,
        });
    }
    if request.minimum_payout < Decimal::ZERO {
        return Err(DistributionError::InvalidAmount {
            amount: request.minimum_payout,
        });
    }
    if request.shares.is_empty() {
        return Err(DistributionError::NoShares);
    }

    let royalty_amount = truncate(request.total_revenue * request.royalty_percent / dec!(100));
    let royalty = (royalty_amount > Decimal::ZERO).then(|| Payout {
        holder: request.creator.clone(),
        amount: royalty_amount,
        reason: PayoutReason::Royalty,
    });

    let distributable = request.total_revenue - royalty_amount;
    let total_shares: u64 = request.shares.values().sum();

    let mut payouts = Vec::new();
    let mut withheld = Vec::new();
    if total_shares > 0 {
        let total_shares = Decimal::from(total_shares);
        for (holder, count) in &request.shares {
            if *count == 0 {
                continue;
            }
            let amount = truncate(distributable * Decimal::from(*count) / total_shares);
            if amount <= Decimal::ZERO {
                continue;
            }
            let payout = Payout {
                holder: holder.clone(),
                amount,
                reason: PayoutReason::ProRata,
            };
            if amount < request.minimum_payout {
                withheld.push(payout);
            } else {
                payouts.push(payout);
            }
        }
    }

    Ok(DistributionPlan {
        royalty,
        payouts,
        withheld,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn request(
        total: Decimal,
        royalty_percent: Decimal,
        shares: &[(&str, u64)],
        minimum: Decimal,
    ) -> DistributionRequest {
        DistributionRequest {
            total_revenue: total,
            royalty_percent,
            creator: UserId::from("creator"),
            shares: shares
                .iter()
                .map(|(h, c)| (UserId::from(*h), *c))
                .collect(),
            minimum_payout: minimum,
        }
    }

    #[test]
    fn test_distribution_pays_everyone_above_minimum() {
        let plan = distribute(&request(
            dec!(100),
            dec!(10),
            &[("alice", 70), ("bob", 30)],
            dec!(5),
        ))
        .unwrap();

        assert_eq!(plan.royalty.as_ref().unwrap().amount, dec!(10));
        assert_eq!(plan.payouts.len(), 2);
        assert_eq!(plan.payouts[0].holder, UserId::from("alice"));
        assert_eq!(plan.payouts[0].amount, dec!(63));
        assert_eq!(plan.payouts[1].holder, UserId::from("bob"));
        assert_eq!(plan.payouts[1].amount, dec!(27));
        assert!(plan.withheld.is_empty());
        assert_eq!(plan.total_paid(), dec!(100));
    }

    #[test]
    fn test_sub_minimum_payout_is_withheld_without_carryover() {
        let plan = distribute(&request(
            dec!(100),
            dec!(10),
            &[("alice", 70), ("bob", 30)],
            dec!(30),
        ))
        .unwrap();

        assert_eq!(plan.royalty.as_ref().unwrap().amount, dec!(10));
        assert_eq!(plan.payouts.len(), 1);
        assert_eq!(plan.payouts[0].holder, UserId::from("alice"));
        assert_eq!(plan.payouts[0].amount, dec!(63));
        assert_eq!(plan.withheld.len(), 1);
        assert_eq!(plan.withheld[0].holder, UserId::from("bob"));
        assert_eq!(plan.withheld[0].amount, dec!(27));
        // The withheld 27 stays with the distributing party.
        assert_eq!(plan.total_paid(), dec!(73));
    }

    #[test]
    fn test_zero_royalty_omits_royalty_payout() {
        let plan = distribute(&request(dec!(50), dec!(0), &[("alice", 1)], dec!(0))).unwrap();
        assert!(plan.royalty.is_none());
        assert_eq!(plan.payouts[0].amount, dec!(50));
    }

    #[test]
    fn test_all_zero_shares_yields_royalty_only() {
        let plan = distribute(&request(
            dec!(100),
            dec!(20),
            &[("alice", 0), ("bob", 0)],
            dec!(0),
        ))
        .unwrap();
        assert_eq!(plan.royalty.as_ref().unwrap().amount, dec!(20));
        assert!(plan.payouts.is_empty());
        assert!(plan.withheld.is_empty());
    }

    #[test]
    fn test_empty_shares_rejected() {
        let err = distribute(&request(dec!(100), dec!(10), &[], dec!(0))).unwrap_err();
        assert!(matches!(err, DistributionError::NoShares));
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert!(matches!(
            distribute(&request(dec!(0), dec!(10), &[("a", 1)], dec!(0))),
            Err(DistributionError::InvalidAmount { .. })
        ));
        assert!(matches!(
            distribute(&request(dec!(100), dec!(101), &[("a", 1)], dec!(0))),
            Err(DistributionError::InvalidRoyalty { .. })
        ));
        assert!(matches!(
            distribute(&request(dec!(100), dec!(-1), &[("a", 1)], dec!(0))),
            Err(DistributionError::InvalidRoyalty { .. })
        ));
        assert!(matches!(
            distribute(&request(dec!(100), dec!(10), &[("a", 1)], dec!(-5))),
            Err(DistributionError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_creator_holding_shares_is_summed_once() {
        let plan = distribute(&request(
            dec!(100),
            dec!(10),
            &[("creator", 50), ("bob", 50)],
            dec!(0),
        ))
        .unwrap();
        let totals = plan.totals_by_holder();
        assert_eq!(totals[&UserId::from("creator")], dec!(55));
        assert_eq!(totals[&UserId::from("bob")], dec!(45));
    }

    #[test]
    fn test_truncation_never_overpays() {
        // 100 / 3 does not divide evenly at 8 decimal places.
        let plan = distribute(&request(
            dec!(100),
            dec!(0),
            &[("a", 1), ("b", 1), ("c", 1)],
            dec!(0),
        ))
        .unwrap();
        assert!(plan.total_paid() <= dec!(100));
        for p in &plan.payouts {
            assert_eq!(p.amount, dec!(33.33333333));
        }
    }

    proptest! {
        #[test]
        fn prop_conservation_holds(
            total in 1u64..1_000_000,
            royalty in 0u32..=100,
            counts in proptest::collection::vec(0u64..1_000, 1..8),
            minimum in 0u64..100,
        ) {
            let shares: BTreeMap<UserId, u64> = counts
                .iter()
                .enumerate()
                .map(|(i, c)| (UserId::from(format!("holder-{i}").as_str()), *c))
                .collect();
            let req = DistributionRequest {
                total_revenue: Decimal::from(total),
                royalty_percent: Decimal::from(royalty),
                creator: UserId::from("creator"),
                shares,
                minimum_payout: Decimal::from(minimum),
            };
            let plan = distribute(&req).unwrap();
            let withheld_total: Decimal = plan.withheld.iter().map(|p| p.amount).sum();
            prop_assert!(plan.total_paid() + withheld_total <= req.total_revenue);
            for p in plan.payouts.iter().chain(plan.withheld.iter()) {
                prop_assert!(p.amount > Decimal::ZERO);
            }
        }
    }
}
