//! Targets, the compact `nBits` codec, and the difficulty duality
//!
//! A target is an unsigned integer in `[1, 2^256 - 1]`; a block hash `H`
//! satisfies the proof-of-work iff `H <= target`. Block headers carry
//! targets in the 32-bit compact form `(size << 24) | mantissa`, which
//! encodes a magnitude of `mantissa * 256^(size - 3)`.

use crate::error::{Error, Result};
use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Compact encoding of the network's maximum (easiest) permitted target.
pub const MAX_BITS: u32 = 0x1d00ffff;

/// Mantissa sign bit; always clear in a well-formed encoding.
const MANTISSA_SIGN_BIT: u32 = 0x0080_0000;

/// Mantissa mask: the low 23 bits of the compact form.
const MANTISSA_MASK: u32 = 0x007f_ffff;

/// The maximum permitted target, decoded from [`MAX_BITS`].
pub fn max_target() -> BigUint {
    compact_to_target(MAX_BITS)
}

/// `2^256 - 1`, the domain bound shared by targets and difficulties.
pub fn max_u256() -> BigUint {
    (BigUint::one() << 256usize) - 1u32
}

/// Decode a compact 32-bit `nBits` value into a 256-bit target.
///
/// `size` is drawn from a trusted header; out-of-range inputs produce
/// implementation-defined garbage and the caller must enforce domain.
pub fn compact_to_target(bits: u32) -> BigUint {
    let size = bits >> 24;
    let mant = BigUint::from(bits & MANTISSA_MASK);

    if size <= 3 {
        mant >> (8 * (3 - size)) as usize
    } else {
        mant << (8 * (size - 3)) as usize
    }
}

/// Encode a target into its canonical compact form.
///
/// Targets above [`max_target`] are clamped before encoding. The result
/// always has the mantissa sign bit clear.
///
/// # Panics
///
/// Panics if `target` is zero; encoding a non-positive target is a
/// programmer error on the consensus path.
pub fn target_to_compact(target: &BigUint) -> u32 {
    assert!(
        !target.is_zero(),
        "target_to_compact: target must be positive"
    );

    let max = max_target();
    let clamped = if *target > max { &max } else { target };

    let mut size = clamped.bits().div_ceil(8) as u32;
    let mut compact = if size <= 3 {
        (clamped.clone() << (8 * (3 - size)) as usize)
            .to_u32()
            .expect("mantissa fits 24 bits")
    } else {
        (clamped.clone() >> (8 * (size - 3)) as usize)
            .to_u32()
            .expect("mantissa fits 24 bits")
    };

    // Keep the mantissa's top bit clear so the encoding carries no sign.
    if compact & MANTISSA_SIGN_BIT != 0 {
        compact >>= 8;
        size += 1;
    }

    (size << 24) | (compact & MANTISSA_MASK)
}

/// Convert a difficulty to its target: `floor((2^256 - 1) / difficulty)`.
///
/// Total: a zero difficulty maps to the minimum target `1`, and the
/// result is never zero.
pub fn difficulty_to_target(difficulty: &BigUint) -> BigUint {
    if difficulty.is_zero() {
        return BigUint::one();
    }
    let target = max_u256() / difficulty;
    if target.is_zero() {
        BigUint::one()
    } else {
        target
    }
}

/// Convert a target to its difficulty: `floor((2^256 - 1) / target)`.
///
/// Total: a zero target maps to difficulty `1`, and the result is never
/// zero. Not an exact inverse of [`difficulty_to_target`] except at the
/// endpoints.
pub fn target_to_difficulty(target: &BigUint) -> BigUint {
    if target.is_zero() {
        return BigUint::one();
    }
    let difficulty = max_u256() / target;
    if difficulty.is_zero() {
        BigUint::one()
    } else {
        difficulty
    }
}

/// A 256-bit target in fixed 32-byte big-endian form.
///
/// This is the wire shape used for work-package boundaries; the integer
/// arithmetic above operates on [`BigUint`] directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target(pub [u8; 32]);

impl Target {
    /// Create a new Target from bytes (big-endian)
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create a Target from an integer target value.
    ///
    /// Fails if the value does not fit in 256 bits.
    pub fn from_biguint(value: &BigUint) -> Result<Self> {
        if value.bits() > 256 {
            return Err(Error::invalid_value("target", "value exceeds 256 bits"));
        }

        let be = value.to_bytes_be();
        let mut bytes = [0u8; 32];
        bytes[32 - be.len()..].copy_from_slice(&be);
        Ok(Self(bytes))
    }

    /// Convert to an integer target value
    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.0)
    }

    /// Create a Target from a hex string, with or without a `0x` prefix
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let stripped = hex_str
            .strip_prefix("0x")
            .or_else(|| hex_str.strip_prefix("0X"))
            .unwrap_or(hex_str);
        let bytes = hex::decode(stripped)
            .map_err(|e| Error::invalid_value("target", format!("invalid hex: {}", e)))?;

        if bytes.len() != 32 {
            return Err(Error::invalid_value(
                "target",
                format!("expected 32 bytes, got {}", bytes.len()),
            ));
        }

        let mut array = [0u8; 32];
        array.copy_from_slice(&bytes);
        Ok(Self(array))
    }

    /// Get the target as bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to a `0x`-prefixed lower-case hex string
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Target {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Target {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        Self::from_hex(&hex_str).map_err(serde::de::Error::custom)
    }
}
