use serde::{Deserialize, Serialize};

/// Opaque asset identity: the lowercase hex of the on-chain asset id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn new(hex_id: &str) -> Self {
        Self(hex_id.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    pub id: AssetId,
    pub symbol: String,
    /// Decimal exponent: 10^decimals subunits per display unit.
    pub decimals: u8,
}

impl Asset {
    pub fn new(id: &str, symbol: &str, decimals: u8) -> Self {
        Self {
            id: AssetId::new(id),
            symbol: symbol.to_string(),
            decimals,
        }
    }
}

/// A directed market: levels quoted for selling `start` into `end`.
/// Swapping start and end gives the other side of the same pool pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradingPair {
    pub start: AssetId,
    pub end: AssetId,
}

impl TradingPair {
    pub fn new(start: AssetId, end: AssetId) -> Self {
        Self { start, end }
    }

    pub fn flipped(&self) -> TradingPair {
        TradingPair {
            start: self.end.clone(),
            end: self.start.clone(),
        }
    }
}

impl std::fmt::Display for TradingPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.start, self.end)
    }
}
