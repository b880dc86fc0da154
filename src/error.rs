use rust_decimal::Decimal;
use thiserror::Error;

/// Errors produced while encoding prices and positions.
///
/// Validation variants mean the input itself is wrong and retrying is
/// pointless; precision variants mean the input is well-formed but too
/// extreme for the bounded integer representation, so the UI can suggest
/// reducing the price magnitude.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("invalid fee: {0} bps (must be 0..=10000)")]
    InvalidFee(u32),

    #[error("price must be non-negative, got {0}")]
    NegativePrice(Decimal),

    #[error("reserves must be non-negative, got {0}")]
    NegativeReserves(Decimal),

    #[error("unknown asset: {0}")]
    UnknownAsset(String),

    #[error("price {0} maps outside the encodable subunit range [1e-6, 1e6]")]
    PriceOutOfRange(Decimal),

    #[error("arithmetic overflow while {0}")]
    Overflow(&'static str),

    #[error("fraction has zero denominator")]
    ZeroDenominator,
}

impl EncodeError {
    /// True for errors caused by price/reserve magnitude rather than
    /// malformed input.
    pub fn is_precision(&self) -> bool {
        matches!(self, Self::PriceOutOfRange(_) | Self::Overflow(_))
    }
}

pub type EncodeResult<T> = Result<T, EncodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_split() {
        assert!(EncodeError::PriceOutOfRange(Decimal::MAX).is_precision());
        assert!(EncodeError::Overflow("scaling reserves").is_precision());
        assert!(!EncodeError::InvalidFee(20000).is_precision());
        assert!(!EncodeError::ZeroDenominator.is_precision());
    }
}
