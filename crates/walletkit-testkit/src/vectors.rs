//! Golden distribution vectors for cross-implementation verification.
//!
//! Every implementation of the distribution engine must produce identical
//! payout plans for these inputs: same recipients, same amounts, same
//! withholding decisions.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use walletkit_core::{distribute, DistributionRequest, UserId};

/// A single golden distribution vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldenVector {
    pub name: String,
    pub description: String,

    // Inputs
    pub total_revenue: Decimal,
    pub royalty_percent: Decimal,
    pub creator: String,
    pub shares: Vec<(String, u64)>,
    pub minimum_payout: Decimal,

    // Expected outputs
    pub expected_royalty: Option<Decimal>,
    pub expected_payouts: Vec<(String, Decimal)>,
    pub expected_withheld: Vec<(String, Decimal)>,
}

impl GoldenVector {
    /// Build the distribution request this vector describes.
    pub fn request(&self) -> DistributionRequest {
        DistributionRequest {
            total_revenue: self.total_revenue,
            royalty_percent: self.royalty_percent,
            creator: UserId::from(self.creator.as_str()),
            shares: self
                .shares
                .iter()
                .map(|(h, c)| (UserId::from(h.as_str()), *c))
                .collect::<BTreeMap<_, _>>(),
            minimum_payout: self.minimum_payout,
        }
    }
}

/// All golden vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "even-split-above-minimum".into(),
            description: "10% royalty, 70/30 split, everyone clears the minimum".into(),
            total_revenue: dec!(100),
            royalty_percent: dec!(10),
            creator: "creator".into(),
            shares: vec![("alice".into(), 70), ("bob".into(), 30)],
            minimum_payout: dec!(5),
            expected_royalty: Some(dec!(10)),
            expected_payouts: vec![("alice".into(), dec!(63)), ("bob".into(), dec!(27))],
            expected_withheld: vec![],
        },
        GoldenVector {
            name: "sub-minimum-withheld".into(),
            description: "same split, minimum 30 withholds the smaller payout".into(),
            total_revenue: dec!(100),
            royalty_percent: dec!(10),
            creator: "creator".into(),
            shares: vec![("alice".into(), 70), ("bob".into(), 30)],
            minimum_payout: dec!(30),
            expected_royalty: Some(dec!(10)),
            expected_payouts: vec![("alice".into(), dec!(63))],
            expected_withheld: vec![("bob".into(), dec!(27))],
        },
        GoldenVector {
            name: "zero-royalty".into(),
            description: "no royalty payout is emitted when the royalty is zero".into(),
            total_revenue: dec!(50),
            royalty_percent: dec!(0),
            creator: "creator".into(),
            shares: vec![("alice".into(), 1)],
            minimum_payout: dec!(0),
            expected_royalty: None,
            expected_payouts: vec![("alice".into(), dec!(50))],
            expected_withheld: vec![],
        },
        GoldenVector {
            name: "zero-total-shares".into(),
            description: "all-zero share counts yield the royalty only".into(),
            total_revenue: dec!(100),
            royalty_percent: dec!(20),
            creator: "creator".into(),
            shares: vec![("alice".into(), 0), ("bob".into(), 0)],
            minimum_payout: dec!(0),
            expected_royalty: Some(dec!(20)),
            expected_payouts: vec![],
            expected_withheld: vec![],
        },
        GoldenVector {
            name: "uneven-thirds-truncate".into(),
            description: "1/3 splits truncate toward zero at 8 decimal places".into(),
            total_revenue: dec!(100),
            royalty_percent: dec!(0),
            creator: "creator".into(),
            shares: vec![("a".into(), 1), ("b".into(), 1), ("c".into(), 1)],
            minimum_payout: dec!(0),
            expected_royalty: None,
            expected_payouts: vec![
                ("a".into(), dec!(33.33333333)),
                ("b".into(), dec!(33.33333333)),
                ("c".into(), dec!(33.33333333)),
            ],
            expected_withheld: vec![],
        },
        GoldenVector {
            name: "fractional-royalty-truncates".into(),
            description: "royalty on an amount that does not divide evenly".into(),
            total_revenue: dec!(0.00000100),
            royalty_percent: dec!(33),
            creator: "creator".into(),
            shares: vec![("alice".into(), 1)],
            minimum_payout: dec!(0),
            expected_royalty: Some(dec!(0.00000033)),
            expected_payouts: vec![("alice".into(), dec!(0.00000067))],
            expected_withheld: vec![],
        },
    ]
}

/// Run the engine against every vector, returning the first mismatch.
pub fn verify_all_vectors() -> Result<(), String> {
    for vector in all_vectors() {
        let plan = distribute(&vector.request())
            .map_err(|e| format!("{}: distribution failed: {e}", vector.name))?;

        let royalty = plan.royalty.as_ref().map(|p| p.amount);
        if royalty != vector.expected_royalty {
            return Err(format!(
                "{}: royalty {royalty:?} != expected {:?}",
                vector.name, vector.expected_royalty
            ));
        }

        let payouts: Vec<(String, Decimal)> = plan
            .payouts
            .iter()
            .map(|p| (p.holder.as_str().to_string(), p.amount))
            .collect();
        let expected: Vec<(String, Decimal)> = vector.expected_payouts.clone();
        if payouts != expected {
            return Err(format!(
                "{}: payouts {payouts:?} != expected {expected:?}",
                vector.name
            ));
        }

        let withheld: Vec<(String, Decimal)> = plan
            .withheld
            .iter()
            .map(|p| (p.holder.as_str().to_string(), p.amount))
            .collect();
        if withheld != vector.expected_withheld {
            return Err(format!(
                "{}: withheld {withheld:?} != expected {:?}",
                vector.name, vector.expected_withheld
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_verify() {
        verify_all_vectors().unwrap();
    }

    #[test]
    fn test_vectors_round_trip_as_json() {
        let vectors = all_vectors();
        let json = serde_json::to_string(&vectors).unwrap();
        let back: Vec<GoldenVector> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), vectors.len());
        assert_eq!(back[0].name, vectors[0].name);
    }
}
