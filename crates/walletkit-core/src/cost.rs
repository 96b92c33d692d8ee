//! Operation cost estimation.
//!
//! A pure function of the operation shape; it never consults ledger state,
//! so the same request always yields the same quote. Used both for
//! pre-flight quotes shown to the user and for validating deductions.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Token protocol used for a tokenize operation. Pricing differs per
/// protocol; unrecognized protocols fall back to the default rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenProtocol {
    Stas,
    Run,
    Sensible,
    SimpleFt,
    /// Any protocol without a dedicated rate.
    Other(String),
}

/// A platform operation to be priced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CostedOperation {
    /// Store a file of the given size.
    Upload { size_bytes: u64 },
    /// Mint a token under the given protocol.
    Tokenize { protocol: TokenProtocol },
    /// Transfer an existing token or balance.
    Transfer,
}

/// Per-kilobyte upload rate.
const UPLOAD_RATE_PER_KB: Decimal = dec!(0.00001);
/// Flat transfer cost.
const TRANSFER_COST: Decimal = dec!(0.00001);
/// Fallback tokenization cost.
const DEFAULT_TOKENIZE_COST: Decimal = dec!(0.001);

/// Estimate the cost of an operation in the base asset.
pub fn estimate_cost(operation: &CostedOperation) -> Decimal {
    match operation {
        CostedOperation::Upload { size_bytes } => {
            let kb = Decimal::from(*size_bytes) / dec!(1024);
            kb * UPLOAD_RATE_PER_KB
        }
        CostedOperation::Tokenize { protocol } => match protocol {
            TokenProtocol::Stas => dec!(0.001),
            TokenProtocol::Run => dec!(0.005),
            TokenProtocol::Sensible => dec!(0.008),
            TokenProtocol::SimpleFt => dec!(0.0005),
            TokenProtocol::Other(_) => DEFAULT_TOKENIZE_COST,
        },
        CostedOperation::Transfer => TRANSFER_COST,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_cost_scales_with_size() {
        let one_kb = estimate_cost(&CostedOperation::Upload { size_bytes: 1024 });
        let two_kb = estimate_cost(&CostedOperation::Upload { size_bytes: 2048 });
        assert_eq!(one_kb, dec!(0.00001));
        assert_eq!(two_kb, one_kb * dec!(2));
    }

    #[test]
    fn test_empty_upload_is_free() {
        assert_eq!(
            estimate_cost(&CostedOperation::Upload { size_bytes: 0 }),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_tokenize_protocol_table() {
        let cases = [
            (TokenProtocol::Stas, dec!(0.001)),
            (TokenProtocol::Run, dec!(0.005)),
            (TokenProtocol::Sensible, dec!(0.008)),
            (TokenProtocol::SimpleFt, dec!(0.0005)),
            (TokenProtocol::Other("brc-20".into()), dec!(0.001)),
        ];
        for (protocol, expected) in cases {
            assert_eq!(estimate_cost(&CostedOperation::Tokenize { protocol }), expected);
        }
    }

    #[test]
    fn test_estimate_is_deterministic() {
        let op = CostedOperation::Upload { size_bytes: 123_456 };
        assert_eq!(estimate_cost(&op), estimate_cost(&op));
    }
}
