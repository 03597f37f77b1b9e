//! Core consensus types and arithmetic
//!
//! This module contains the numerical heart of the engine: the `Hash`,
//! `Nonce` and `Target` types, the compact-bits codec, the
//! target/difficulty duality, and the ASERTi3-2d retarget function.

mod hash;
mod nonce;
mod target;

pub mod asert;
pub mod vectors;

pub use hash::Hash;
pub use nonce::Nonce;
pub use target::{
    compact_to_target, difficulty_to_target, max_target, max_u256, target_to_compact,
    target_to_difficulty, Target, MAX_BITS,
};

/// Constants shared by the consensus modules
pub mod constants {
    /// Size of a hash in bytes
    pub const HASH_SIZE: usize = 32;

    /// Size of a sealing nonce in bytes
    pub const NONCE_SIZE: usize = 8;

    /// Size of a target in bytes
    pub const TARGET_SIZE: usize = 32;

    /// Number of blocks between block-reward halvings
    pub const HALVING_INTERVAL: u64 = 210_000;

    /// Confirmations before a coinbase reward is spendable
    pub const COINBASE_MATURITY: u64 = 100;
}
