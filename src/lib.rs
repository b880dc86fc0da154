//! # dexbook-rs
//!
//! A Rust library for the trade-encoding and book-aggregation core of a
//! DEX dashboard: converts human-entered decimal prices into the exact
//! bounded fractions the on-chain trading-function format requires,
//! encodes complete liquidity positions, merges routed price levels into
//! a two-sided order book with spread, and multiplexes long-lived data
//! streams across independent consumers.
//!
//! ## Components
//!
//! | Component | Module | Role |
//! |-----------|--------|------|
//! | Rational price codec | `rational` | decimal price <-> bounded `{p, q}` fraction |
//! | Position encoder | `encoder` | `PositionPlan` -> submittable `Position` |
//! | Book aggregator | `book` | per-hop level groups -> sorted, depth-limited `Book` |
//! | Stream registry | `stream` | one live producer per stream id, refcounted teardown |
//! | Indexer client | `indexer` | level queries + concurrent per-hop fan-out |
//! | Asset catalog | `catalog` | symbol -> asset identity and decimals |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dexbook_rs::{fetch_book, IndexerApi, TradingPair, AssetId};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let indexer = Arc::new(IndexerApi::new("http://localhost:8080"));
//!     let pair = TradingPair::new(AssetId::new("29ea9c2f"), AssetId::new("76b301e3"));
//!
//!     let book = fetch_book(indexer, &pair, 3, 20).await;
//!     for ask in &book.asks {
//!         println!("ask {} x {}", ask.price, ask.amount);
//!     }
//!     if let Some(spread) = &book.spread {
//!         println!("spread {} ({}%)", spread.amount, spread.percent);
//!     }
//! }
//! ```

pub mod book;
pub mod catalog;
pub mod encoder;
pub mod error;
pub mod indexer;
pub mod models;
pub mod rational;
pub mod stream;
pub mod utils;

pub use book::build_book;
pub use catalog::{AssetCatalog, StaticCatalog};
pub use encoder::{encode_position, encode_position_with_nonce};
pub use error::{EncodeError, EncodeResult};
pub use indexer::{fetch_book, IndexerApi, LevelSource};
pub use models::{
    Asset, AssetId, Book, Position, PositionPlan, PositionState, Reserves, Spread, Trace,
    TradingFunction, TradingPair,
};
pub use rational::{from_fraction, to_fraction, RationalPrice, PRECISION_DECIMALS};
pub use stream::{StreamGuard, StreamRegistry};
