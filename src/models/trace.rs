use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::AssetId;

/// One synthetic price level on a routed order-book side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// Level price in quote display units per base display unit.
    pub price: Decimal,
    /// Amount available at this level.
    pub amount: Decimal,
    /// Running total up to and including this level.
    pub total: Decimal,
    /// Ordered asset path realizing the level, endpoints included.
    pub hops: Vec<AssetId>,
}

impl Trace {
    /// Number of intermediate assets traversed (endpoints excluded).
    pub fn intermediate_hops(&self) -> usize {
        self.hops.len().saturating_sub(2)
    }

    /// A level routed through no intermediate asset.
    pub fn is_direct(&self) -> bool {
        self.intermediate_hops() == 0
    }
}

/// Bid/ask spread derived from the best level of each side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spread {
    /// `best ask - best bid`.
    pub amount: Decimal,
    /// Midpoint between best bid and best ask.
    pub mid: Decimal,
    /// Spread as a percentage of the midpoint.
    pub percent: Decimal,
}

/// A unified two-sided order book: asks ascending, bids descending,
/// both truncated to the caller's depth limit. The aggregator is the
/// sole source of sort order; renderers do not reorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub asks: Vec<Trace>,
    pub bids: Vec<Trace>,
    pub spread: Option<Spread>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_direct_trace_has_two_hops() {
        let trace = Trace {
            price: dec!(1.5),
            amount: dec!(10),
            total: dec!(10),
            hops: vec![AssetId::new("aa"), AssetId::new("bb")],
        };
        assert!(trace.is_direct());
        assert_eq!(trace.intermediate_hops(), 0);
    }

    #[test]
    fn test_routed_trace_counts_intermediates() {
        let trace = Trace {
            price: dec!(1.5),
            amount: dec!(10),
            total: dec!(10),
            hops: vec![
                AssetId::new("aa"),
                AssetId::new("cc"),
                AssetId::new("dd"),
                AssetId::new("bb"),
            ],
        };
        assert!(!trace.is_direct());
        assert_eq!(trace.intermediate_hops(), 2);
    }
}
