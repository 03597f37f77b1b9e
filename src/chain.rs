//! Chain access capabilities
//!
//! The supply calculator and the RPC surface only ever need the current
//! tip header, so that is the whole capability: one method, one field.
//! Broader chain abstractions stay outside this crate.

use crate::core::constants::HALVING_INTERVAL;
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

/// The header fields the engine consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Block height, counting the genesis block as 0.
    pub number: u64,
}

impl Header {
    /// Create a header at the given height
    pub const fn new(number: u64) -> Self {
        Self { number }
    }
}

/// Read access to the chain tip.
///
/// Implementations must be safe for concurrent callers; the supply
/// calculator and RPC handlers share one reader.
pub trait ChainHeaderReader: Send + Sync {
    /// The current tip header, or `None` before the chain has one.
    fn current_header(&self) -> Option<Header>;
}

/// The block reward due at a given height.
///
/// Rewards must be constant within each halving era; the supply
/// calculator samples one representative block per era.
pub trait RewardSchedule: Send + Sync {
    /// Reward for the block at `height`, in base units.
    fn block_reward(&self, height: u64) -> BigUint;
}

/// The stock geometric schedule: the initial reward halves every
/// [`HALVING_INTERVAL`] blocks and is exhausted after 64 halvings.
#[derive(Debug, Clone)]
pub struct HalvingSchedule {
    initial_reward: BigUint,
}

impl HalvingSchedule {
    /// Create a schedule starting from `initial_reward` base units.
    pub fn new(initial_reward: BigUint) -> Self {
        Self { initial_reward }
    }
}

impl Default for HalvingSchedule {
    /// 50 coins at 10^8 base units per coin.
    fn default() -> Self {
        Self::new(BigUint::from(5_000_000_000u64))
    }
}

impl RewardSchedule for HalvingSchedule {
    fn block_reward(&self, height: u64) -> BigUint {
        let era = height / HALVING_INTERVAL;
        if era >= 64 {
            return BigUint::zero();
        }
        &self.initial_reward >> era as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_eras() {
        let schedule = HalvingSchedule::default();
        assert_eq!(schedule.block_reward(0), BigUint::from(5_000_000_000u64));
        assert_eq!(schedule.block_reward(1), BigUint::from(5_000_000_000u64));
        assert_eq!(
            schedule.block_reward(HALVING_INTERVAL - 1),
            BigUint::from(5_000_000_000u64)
        );
        assert_eq!(
            schedule.block_reward(HALVING_INTERVAL),
            BigUint::from(2_500_000_000u64)
        );
        assert_eq!(
            schedule.block_reward(2 * HALVING_INTERVAL),
            BigUint::from(1_250_000_000u64)
        );
    }

    #[test]
    fn test_schedule_exhausts() {
        let schedule = HalvingSchedule::default();
        assert_eq!(
            schedule.block_reward(64 * HALVING_INTERVAL),
            BigUint::zero()
        );
        assert_eq!(schedule.block_reward(u64::MAX), BigUint::zero());
    }

    #[test]
    fn test_header() {
        let header = Header::new(42);
        assert_eq!(header.number, 42);
    }
}
