pub mod asset;
pub mod position;
pub mod trace;

pub use asset::{Asset, AssetId, TradingPair};
pub use position::{Position, PositionPlan, PositionState, Reserves, TradingFunction};
pub use trace::{Book, Spread, Trace};
