//! # WalletKit Testkit
//!
//! Testing utilities for WalletKit.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known distribution inputs with expected payout plans
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Helper structs for setting up test scenarios
//!
//! ## Golden Vectors
//!
//! Golden vectors pin the distribution engine's arithmetic:
//!
//! ```rust
//! use walletkit_testkit::vectors::verify_all_vectors;
//!
//! verify_all_vectors().unwrap();
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use walletkit_testkit::generators::{request_from_params, DistributionParams};
//!
//! proptest! {
//!     #[test]
//!     fn distribution_never_overpays(params: DistributionParams) {
//!         let request = request_from_params(&params);
//!         let plan = walletkit_core::distribute(&request).unwrap();
//!         prop_assert!(plan.total_paid() <= request.total_revenue);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! Quickly set up test scenarios:
//!
//! ```rust,ignore
//! use walletkit_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let user = fixture.seed_wallet("alice", "1".parse().unwrap()).await;
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{mock_platform, stakeholders, TestFixture};
pub use generators::{request_from_params, DistributionParams};
pub use vectors::{all_vectors, verify_all_vectors, GoldenVector};
