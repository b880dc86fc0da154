//! Merges per-direction, per-hop price-level query results into a single
//! two-sided order book with a computed spread.

use rust_decimal::Decimal;

use crate::models::{Book, Spread, Trace};

/// Build a unified book from grouped ask and bid levels.
///
/// Each inner vector holds the levels returned for one hop count; the
/// groups are flattened, degenerate levels dropped, each side sorted
/// (asks ascending, bids descending by price) and only then truncated to
/// `depth_limit`, so the best prices survive no matter which hop count
/// produced them. Callers may have filled the groups concurrently in any
/// order; nothing here depends on arrival order.
pub fn build_book(
    ask_levels: Vec<Vec<Trace>>,
    bid_levels: Vec<Vec<Trace>>,
    depth_limit: usize,
) -> Book {
    let mut asks = collect_side(ask_levels);
    let mut bids = collect_side(bid_levels);

    asks.sort_by(|a, b| a.price.cmp(&b.price));
    bids.sort_by(|a, b| b.price.cmp(&a.price));
    asks.truncate(depth_limit);
    bids.truncate(depth_limit);

    let spread = compute_spread(asks.first(), bids.first());

    Book { asks, bids, spread }
}

/// Flatten one side's hop-count groups, dropping zero-price and
/// zero-amount levels before any sorting happens.
fn collect_side(levels: Vec<Vec<Trace>>) -> Vec<Trace> {
    levels
        .into_iter()
        .flatten()
        .filter(|trace| !trace.price.is_zero() && !trace.amount.is_zero())
        .collect()
}

/// Spread from the best level of each side; unavailable when either side
/// is empty.
fn compute_spread(best_ask: Option<&Trace>, best_bid: Option<&Trace>) -> Option<Spread> {
    let (ask, bid) = match (best_ask, best_bid) {
        (Some(a), Some(b)) => (a.price, b.price),
        _ => return None,
    };
    let amount = ask - bid;
    let mid = (ask + bid) / Decimal::TWO;
    let percent = if mid.is_zero() {
        Decimal::ZERO
    } else {
        amount / mid * Decimal::ONE_HUNDRED
    };
    Some(Spread { amount, mid, percent })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssetId;
    use rust_decimal_macros::dec;

    fn trace(price: Decimal, amount: Decimal, intermediates: usize) -> Trace {
        let mut hops = vec![AssetId::new("aa")];
        for i in 0..intermediates {
            hops.push(AssetId::new(&format!("{:02x}", 0xc0 + i)));
        }
        hops.push(AssetId::new("bb"));
        Trace {
            price,
            amount,
            total: amount,
            hops,
        }
    }

    #[test]
    fn test_depth_one_keeps_best_prices() {
        // Scenario from the book contract: asks [10, 9], bids [8],
        // depth 1 keeps the lowest ask.
        let asks = vec![vec![trace(dec!(10), dec!(5), 0), trace(dec!(9), dec!(5), 1)]];
        let bids = vec![vec![trace(dec!(8), dec!(5), 0)]];
        let book = build_book(asks, bids, 1);

        assert_eq!(book.asks.len(), 1);
        assert_eq!(book.asks[0].price, dec!(9));
        assert_eq!(book.bids.len(), 1);
        assert_eq!(book.bids[0].price, dec!(8));

        let spread = book.spread.unwrap();
        assert_eq!(spread.amount, dec!(1));
        assert_eq!(spread.mid, dec!(8.5));
    }

    #[test]
    fn test_sides_sorted_and_truncated() {
        // Levels arrive grouped by hop count, deliberately unsorted.
        let asks = vec![
            vec![trace(dec!(12), dec!(1), 0), trace(dec!(10), dec!(1), 0)],
            vec![trace(dec!(11), dec!(1), 1), trace(dec!(9.5), dec!(1), 2)],
        ];
        let bids = vec![
            vec![trace(dec!(7), dec!(1), 0)],
            vec![trace(dec!(8.5), dec!(1), 1), trace(dec!(8), dec!(1), 1)],
        ];
        let book = build_book(asks, bids, 3);

        let ask_prices: Vec<Decimal> = book.asks.iter().map(|t| t.price).collect();
        assert_eq!(ask_prices, vec![dec!(9.5), dec!(10), dec!(11)]);
        let bid_prices: Vec<Decimal> = book.bids.iter().map(|t| t.price).collect();
        assert_eq!(bid_prices, vec![dec!(8.5), dec!(8), dec!(7)]);

        // Best ask came from the two-intermediate-hop group, best bid
        // from the one-intermediate-hop group.
        assert_eq!(book.asks[0].intermediate_hops(), 2);
        assert_eq!(book.bids[0].intermediate_hops(), 1);
    }

    #[test]
    fn test_degenerate_levels_excluded() {
        let asks = vec![vec![
            trace(dec!(0), dec!(5), 0),
            trace(dec!(10), dec!(0), 0),
            trace(dec!(10), dec!(5), 0),
        ]];
        let book = build_book(asks, vec![], 10);
        assert_eq!(book.asks.len(), 1);
        assert_eq!(book.asks[0].price, dec!(10));
    }

    #[test]
    fn test_spread_unavailable_with_empty_side() {
        let asks = vec![vec![trace(dec!(10), dec!(5), 0)]];
        let book = build_book(asks, vec![], 10);
        assert!(book.spread.is_none());
        assert_eq!(book.asks.len(), 1);

        let book = build_book(vec![], vec![], 10);
        assert!(book.spread.is_none());
    }

    #[test]
    fn test_mid_price_between_best_levels() {
        let asks = vec![vec![trace(dec!(101), dec!(1), 0)]];
        let bids = vec![vec![trace(dec!(99), dec!(1), 0)]];
        let book = build_book(asks, bids, 5);
        let spread = book.spread.unwrap();
        assert_eq!(spread.amount, dec!(2));
        assert!(spread.mid >= dec!(99) && spread.mid <= dec!(101));
        assert_eq!(spread.percent, dec!(2));
    }

    #[test]
    fn test_never_exceeds_depth_limit() {
        let asks = vec![(1..=20)
            .map(|i| trace(Decimal::from(i), dec!(1), 0))
            .collect()];
        let bids = vec![(1..=20)
            .map(|i| trace(Decimal::from(i), dec!(1), 0))
            .collect()];
        let book = build_book(asks, bids, 7);
        assert_eq!(book.asks.len(), 7);
        assert_eq!(book.bids.len(), 7);
    }
}
