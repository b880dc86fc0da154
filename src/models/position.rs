use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Asset, TradingPair};

/// A user-facing liquidity position plan, mutable until submitted.
/// Consumed once by the encoder and then discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionPlan {
    pub base_asset: Asset,
    pub quote_asset: Asset,
    /// Quote display units per base display unit.
    pub price: Decimal,
    /// Fee in basis points, 0..=10000.
    pub fee_bps: u32,
    /// Base reserves in display units.
    pub base_reserves: Decimal,
    /// Quote reserves in display units.
    pub quote_reserves: Decimal,
    /// Close the position once fully filled.
    pub close_on_fill: bool,
}

impl PositionPlan {
    pub fn new(base_asset: Asset, quote_asset: Asset, price: Decimal, fee_bps: u32) -> Self {
        Self {
            base_asset,
            quote_asset,
            price,
            fee_bps,
            base_reserves: Decimal::ZERO,
            quote_reserves: Decimal::ZERO,
            close_on_fill: false,
        }
    }
}

/// On-chain trading function: the parameters defining a position's price
/// and fee schedule. `q / p` is the subunit price of the pair's base asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingFunction {
    pub fee_bps: u32,
    /// Base subunits exchanged per `q` quote subunits.
    pub p: u64,
    /// Quote subunits exchanged per `p` base subunits.
    pub q: u64,
    pub pair: TradingPair,
}

/// Position reserves in integer subunits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reserves {
    /// Base-asset subunits.
    pub r1: u128,
    /// Quote-asset subunits.
    pub r2: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionState {
    Opened,
    Closed,
    Withdrawn,
}

/// A fully encoded liquidity position, immutable once built.
/// Handed to the submission subsystem, which cannot correct rounding
/// after the fact, so reserves and `{p, q}` are exact by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub trading_function: TradingFunction,
    /// Uniqueness token. Structurally identical positions get distinct
    /// nonces so their on-chain addresses never collide.
    #[serde(with = "nonce_hex")]
    pub nonce: [u8; 32],
    pub reserves: Reserves,
    pub state: PositionState,
    pub close_on_fill: bool,
}

mod nonce_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(nonce: &[u8; 32], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(nonce))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 32], D::Error> {
        let raw = String::deserialize(d)?;
        let bytes = hex::decode(&raw).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("nonce must be 32 bytes"))
    }
}
