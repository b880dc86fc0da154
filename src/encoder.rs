//! Builds a complete, submittable liquidity position from a user-facing
//! plan: encodes the price fraction, scales reserves into subunits, and
//! stamps a fresh random nonce.

use rand::rngs::OsRng;
use rand::RngCore;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{EncodeError, EncodeResult};
use crate::models::{Position, PositionPlan, PositionState, Reserves, TradingFunction, TradingPair};
use crate::rational;

const MAX_FEE_BPS: u32 = 10_000;

/// Encode a plan into a submittable position.
///
/// Pure aside from nonce randomness: encoding the same plan twice yields
/// positions identical except for the nonce, which is drawn fresh from
/// the OS RNG on every call so structurally identical positions never
/// collide on their derived address.
pub fn encode_position(plan: &PositionPlan) -> EncodeResult<Position> {
    let mut nonce = [0u8; 32];
    OsRng.fill_bytes(&mut nonce);
    encode_position_with_nonce(plan, nonce)
}

/// Deterministic variant taking the nonce from the caller. Backs
/// `encode_position` and lets tests assert structural equality.
pub fn encode_position_with_nonce(plan: &PositionPlan, nonce: [u8; 32]) -> EncodeResult<Position> {
    if plan.fee_bps > MAX_FEE_BPS {
        return Err(EncodeError::InvalidFee(plan.fee_bps));
    }

    let fraction = rational::to_fraction(
        plan.price,
        plan.base_asset.decimals,
        plan.quote_asset.decimals,
    )?;

    let r1 = to_subunits(plan.base_reserves, plan.base_asset.decimals)?;
    let r2 = to_subunits(plan.quote_reserves, plan.quote_asset.decimals)?;

    Ok(Position {
        trading_function: TradingFunction {
            fee_bps: plan.fee_bps,
            p: fraction.p,
            q: fraction.q,
            pair: TradingPair::new(plan.base_asset.id.clone(), plan.quote_asset.id.clone()),
        },
        nonce,
        reserves: Reserves { r1, r2 },
        state: PositionState::Opened,
        close_on_fill: plan.close_on_fill,
    })
}

/// Scale a display-unit amount into integer subunits.
///
/// Rounding rule: half-up (`MidpointAwayFromZero`), so `1.0000005` at six
/// decimals becomes `1000001` subunits. Pinned by tests; the submission
/// subsystem cannot correct rounding after the fact.
fn to_subunits(amount: Decimal, decimals: u8) -> EncodeResult<u128> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(EncodeError::NegativeReserves(amount));
    }
    let factor = rational::pow10_decimal(decimals as u32)?;
    let scaled = amount
        .checked_mul(factor)
        .ok_or(EncodeError::Overflow("scaling reserves to subunits"))?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let subunits = scaled.mantissa() / 10i128.pow(scaled.scale());
    u128::try_from(subunits).map_err(|_| EncodeError::Overflow("scaling reserves to subunits"))
}
