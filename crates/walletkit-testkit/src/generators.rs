//! Proptest generators for property-based testing.

use std::collections::BTreeMap;

use proptest::prelude::*;
use rust_decimal::Decimal;

use walletkit_core::{DistributionRequest, UserId};

/// Generate a readable user id.
pub fn user_id() -> impl Strategy<Value = UserId> {
    "[a-z][a-z0-9-]{0,15}".prop_map(UserId::from)
}

/// Generate a positive money amount with 8 decimal places, up to ~100k.
pub fn money() -> impl Strategy<Value = Decimal> {
    (1i64..=10_000_000_000_000i64).prop_map(|v| Decimal::new(v, 8))
}

/// Generate a royalty percentage in [0, 100] with 2 decimal places.
pub fn royalty_percent() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000i64).prop_map(|v| Decimal::new(v, 2))
}

/// Generate a non-empty stakeholder share table.
pub fn share_counts(max_holders: usize) -> impl Strategy<Value = BTreeMap<UserId, u64>> {
    prop::collection::btree_map(user_id(), 0u64..=1_000, 1..=max_holders)
}

/// Parameters for generating a distribution request.
#[derive(Debug, Clone)]
pub struct DistributionParams {
    pub total_revenue: Decimal,
    pub royalty_percent: Decimal,
    pub creator: UserId,
    pub shares: BTreeMap<UserId, u64>,
    pub minimum_payout: Decimal,
}

impl Arbitrary for DistributionParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            money(),
            royalty_percent(),
            user_id(),
            share_counts(8),
            (0i64..=1_000_000_000i64).prop_map(|v| Decimal::new(v, 8)),
        )
            .prop_map(
                |(total_revenue, royalty_percent, creator, shares, minimum_payout)| {
                    DistributionParams {
                        total_revenue,
                        royalty_percent,
                        creator,
                        shares,
                        minimum_payout,
                    }
                },
            )
            .boxed()
    }
}

/// Build a distribution request from parameters.
pub fn request_from_params(params: &DistributionParams) -> DistributionRequest {
    DistributionRequest {
        total_revenue: params.total_revenue,
        royalty_percent: params.royalty_percent,
        creator: params.creator.clone(),
        shares: params.shares.clone(),
        minimum_payout: params.minimum_payout,
    }
}
