//! # xhash
//!
//! Consensus-critical difficulty machinery and the remote mining work
//! exchange for the xhash proof-of-work engine.
//!
//! ## Features
//!
//! - **ASERTi3-2d retargeting**: absolute, exponential, integer-only
//!   difficulty adjustment anchored to a fixed block
//! - **Compact target codec**: the 32-bit `nBits` header encoding and its
//!   exact round-trip to 256-bit targets
//! - **Supply accounting**: deterministic total and circulating supply from
//!   the chain tip, with halving eras and coinbase maturity
//! - **Remote work exchange**: a single-writer, channel-mediated
//!   coordinator through which external miners fetch work, submit
//!   solutions, and report hashrates
//!
//! ## Architecture
//!
//! All retargeting and codec functions are pure and synchronization-free.
//! The exchange is built around one coordinator task that owns every piece
//! of mutable state; clients talk to it exclusively through typed request
//! messages carrying per-request reply channels.

#![warn(
    missing_docs,
    rust_2018_idioms,
    unused_lifetimes,
    unused_qualifications,
    clippy::all
)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod config;
pub mod core;
pub mod error;
pub mod exchange;
pub mod supply;
pub mod utils;

pub use crate::error::{Error, Result};
pub use chain::{ChainHeaderReader, Header, RewardSchedule};
pub use config::Config;
pub use core::{Hash, Nonce, Target};
pub use exchange::{Api, ExchangeHandle, RemoteExchange, WorkPackage};
pub use supply::SupplyCalculator;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        chain::{ChainHeaderReader, Header, RewardSchedule},
        config::Config,
        core::{Hash, Nonce, Target},
        error::{Error, Result},
        exchange::{Api, ExchangeHandle, RemoteExchange, SealVerifier, WorkPackage},
        supply::SupplyCalculator,
    };
}
