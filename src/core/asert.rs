//! ASERTi3-2d difficulty retargeting
//!
//! An absolute, exponential retarget: the next target depends only on a
//! fixed anchor block and the evaluation block's height and timestamp,
//! never on intermediate history. All arithmetic is integer-exact; any
//! deviation in rounding, shift direction or clamping is a consensus
//! fault.

use num_bigint::BigUint;
use num_traits::{One, Zero};

/// Ideal spacing between blocks, in seconds.
pub const IDEAL_BLOCK_TIME: i64 = 600;

/// Retarget half-life, in seconds (2 days). Each half-life of drift away
/// from schedule doubles or halves the target.
pub const HALFLIFE: i64 = 172_800;

/// Fixed-point radix (2^16) for the exponent's fractional part.
pub const RADIX: i64 = 1 << 16;

// Cubic coefficients approximating 2^x over [0, 1) in 16.16 fixed point.
const POLY_A: u64 = 195_766_423_245_049;
const POLY_B: u64 = 971_821_376;
const POLY_C: u64 = 5_127;

/// Compute the target for the block after the evaluation block.
///
/// * `anchor_height` — height of the anchor block
/// * `anchor_parent_time` — timestamp (Unix seconds) of the anchor's parent
/// * `anchor_target` — integer target of the anchor block
/// * `eval_height` — height of the evaluation block
/// * `eval_time` — timestamp of the evaluation block
/// * `max_target` — easiest permitted target; the result is clamped to
///   `[1, max_target]`
///
/// Timestamps are signed and may precede the anchor's in adversarial
/// schedules; the result then decays toward the minimum target.
///
/// # Panics
///
/// Panics if `anchor_height <= 0`, `anchor_target == 0`, or
/// `max_target == 0`. These cannot occur on valid chain data and a crash
/// is preferable to a consensus fault.
pub fn asert_next_target(
    anchor_height: i64,
    anchor_parent_time: i64,
    anchor_target: &BigUint,
    eval_height: i64,
    eval_time: i64,
    max_target: &BigUint,
) -> BigUint {
    assert!(
        anchor_height > 0,
        "asert_next_target: anchor_height must be > 0"
    );
    assert!(
        !anchor_target.is_zero(),
        "asert_next_target: anchor_target must be > 0"
    );
    assert!(
        !max_target.is_zero(),
        "asert_next_target: max_target must be > 0"
    );

    let time_delta = eval_time - anchor_parent_time;
    let height_delta = eval_height - anchor_height;

    // The +1 moves the schedule from the anchor to the block after the
    // evaluation block. Division truncates toward zero.
    let num_blocks = height_delta + 1;
    let mut exponent = ((time_delta - IDEAL_BLOCK_TIME * num_blocks) * RADIX) / HALFLIFE;

    // Arithmetic shift: rounds toward negative infinity for negative
    // exponents, leaving a fractional part in [0, 2^16).
    let num_shifts = exponent >> 16;
    exponent -= num_shifts * RADIX;

    // Reinterpret as unsigned for the polynomial; after the reduction
    // above the value is non-negative and fits in 17 bits, so the cast
    // is value-preserving two's complement.
    let ux = exponent as u64;

    // factor = ((A*x + B*x^2 + C*x^3 + 2^47) >> 48) + 2^16, a 16.16
    // fixed-point multiplier in [1.0, 2.0). The intermediate products
    // wrap modulo 2^64 exactly as the reference does.
    let x2 = ux.wrapping_mul(ux);
    let x3 = x2.wrapping_mul(ux);
    let poly = POLY_A
        .wrapping_mul(ux)
        .wrapping_add(POLY_B.wrapping_mul(x2))
        .wrapping_add(POLY_C.wrapping_mul(x3))
        .wrapping_add(1u64 << 47);
    let factor = (poly >> 48) + RADIX as u64;

    let mut next = anchor_target * factor;

    // Apply the integral part of the exponent.
    if num_shifts < 0 {
        next >>= (-num_shifts) as u64;
    } else if num_shifts > 0 {
        next <<= num_shifts as u64;
    }

    // Undo the 16.16 scaling.
    next >>= 16u32;

    if next.is_zero() {
        return BigUint::one();
    }
    if next > *max_target {
        return max_target.clone();
    }
    next
}
