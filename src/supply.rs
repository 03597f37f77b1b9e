//! Supply accounting
//!
//! Deterministic total and circulating coin supply, computed from the
//! chain tip height alone. Rewards are summed era by era: full eras
//! contribute `HALVING_INTERVAL * reward(sample)` and the partial
//! current era contributes `remainder * reward(sample)`, where `sample`
//! is one representative block inside the era.
//!
//! Total supply samples era 0 at block 0 while circulating supply
//! samples it at block 1 (skipping a genesis block that may carry no
//! reward). The asymmetry is deliberate and matches the deployed
//! accounting; both figures would change if it were smoothed over.

use crate::chain::{ChainHeaderReader, RewardSchedule};
use crate::core::constants::{COINBASE_MATURITY, HALVING_INTERVAL};
use num_bigint::BigUint;
use num_traits::Zero;
use std::sync::Arc;
use tracing::trace;

/// Computes supply figures from the current chain tip.
///
/// Read-only and safe for concurrent callers; it never mutates chain
/// state.
pub struct SupplyCalculator {
    chain: Arc<dyn ChainHeaderReader>,
    schedule: Arc<dyn RewardSchedule>,
}

impl SupplyCalculator {
    /// Create a calculator over the given chain reader and reward
    /// schedule.
    pub fn new(chain: Arc<dyn ChainHeaderReader>, schedule: Arc<dyn RewardSchedule>) -> Self {
        Self { chain, schedule }
    }

    /// Total coins emitted up to and including the current tip, as a
    /// decimal string. `"0"` when the chain has no header yet.
    pub fn total_supply(&self) -> String {
        let Some(header) = self.chain.current_header() else {
            return "0".to_string();
        };
        let n = header.number;

        let mut emissions = BigUint::zero();
        let full_eras = n / HALVING_INTERVAL;
        let remainder = n % HALVING_INTERVAL;

        for era in 0..full_eras {
            let sample = era * HALVING_INTERVAL;
            emissions += self.schedule.block_reward(sample) * HALVING_INTERVAL;
        }

        if remainder > 0 {
            let mut sample = full_eras * HALVING_INTERVAL;
            if sample == 0 {
                sample = 1;
            }
            emissions += self.schedule.block_reward(sample) * remainder;
        }

        trace!(height = n, supply = %emissions, "computed total supply");
        emissions.to_string()
    }

    /// Coins whose coinbase has matured at the current tip, as a decimal
    /// string. `"0"` when the chain has no header or nothing has matured.
    pub fn circulating_supply(&self) -> String {
        let Some(header) = self.chain.current_header() else {
            return "0".to_string();
        };
        let height = header.number;

        // No matured rewards yet
        if height <= COINBASE_MATURITY {
            return "0".to_string();
        }

        // Rewarded and matured blocks are 1..=matured_height.
        let n = height - COINBASE_MATURITY;

        let mut emissions = BigUint::zero();
        let full_eras = n / HALVING_INTERVAL;
        let remainder = n % HALVING_INTERVAL;

        for era in 0..full_eras {
            let mut sample = era * HALVING_INTERVAL;
            if sample == 0 {
                // avoid genesis if it has no reward
                sample = 1;
            }
            emissions += self.schedule.block_reward(sample) * HALVING_INTERVAL;
        }

        if remainder > 0 {
            let mut sample = full_eras * HALVING_INTERVAL;
            if sample == 0 {
                sample = 1;
            }
            emissions += self.schedule.block_reward(sample) * remainder;
        }

        trace!(height, supply = %emissions, "computed circulating supply");
        emissions.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{HalvingSchedule, Header};
    use std::sync::atomic::{AtomicU64, Ordering};

    struct MockChain {
        height: AtomicU64,
        empty: bool,
    }

    impl MockChain {
        fn at(height: u64) -> Arc<Self> {
            Arc::new(Self {
                height: AtomicU64::new(height),
                empty: false,
            })
        }

        fn without_header() -> Arc<Self> {
            Arc::new(Self {
                height: AtomicU64::new(0),
                empty: true,
            })
        }

        fn set_height(&self, height: u64) {
            self.height.store(height, Ordering::Relaxed);
        }
    }

    impl ChainHeaderReader for MockChain {
        fn current_header(&self) -> Option<Header> {
            if self.empty {
                None
            } else {
                Some(Header::new(self.height.load(Ordering::Relaxed)))
            }
        }
    }

    fn calculator(chain: Arc<MockChain>) -> SupplyCalculator {
        SupplyCalculator::new(chain, Arc::new(HalvingSchedule::default()))
    }

    #[test]
    fn test_no_header() {
        let calc = calculator(MockChain::without_header());
        assert_eq!(calc.total_supply(), "0");
        assert_eq!(calc.circulating_supply(), "0");
    }

    #[test]
    fn test_genesis() {
        let calc = calculator(MockChain::at(0));
        assert_eq!(calc.total_supply(), "0");
        assert_eq!(calc.circulating_supply(), "0");
    }

    #[test]
    fn test_first_block() {
        let calc = calculator(MockChain::at(1));
        assert_eq!(calc.total_supply(), "5000000000");
        assert_eq!(calc.circulating_supply(), "0");
    }

    #[test]
    fn test_maturity_boundary() {
        let calc = calculator(MockChain::at(100));
        assert_eq!(calc.total_supply(), "500000000000");
        assert_eq!(calc.circulating_supply(), "0");

        let calc = calculator(MockChain::at(101));
        assert_eq!(calc.total_supply(), "505000000000");
        assert_eq!(calc.circulating_supply(), "5000000000");
    }

    #[test]
    fn test_first_halving() {
        let calc = calculator(MockChain::at(210_000));
        assert_eq!(calc.total_supply(), "1050000000000000");
        assert_eq!(calc.circulating_supply(), "1049500000000000");

        // One block into the second era, the marginal reward halves.
        let calc = calculator(MockChain::at(210_001));
        assert_eq!(calc.total_supply(), "1050002500000000");
    }

    #[test]
    fn test_circulating_catches_up_after_halving() {
        // Tip far enough past the halving that all first-era rewards
        // have matured.
        let calc = calculator(MockChain::at(210_100));
        assert_eq!(calc.circulating_supply(), "1050000000000000");
    }

    #[test]
    fn test_second_era_boundary() {
        let calc = calculator(MockChain::at(420_200));
        assert_eq!(calc.total_supply(), "1575250000000000");
        assert_eq!(calc.circulating_supply(), "1575125000000000");
    }

    #[test]
    fn test_monotone_and_bounded() {
        let chain = MockChain::at(0);
        let calc = calculator(Arc::clone(&chain));

        let mut prev_total = BigUint::zero();
        let mut prev_circ = BigUint::zero();
        for height in [0u64, 1, 50, 100, 101, 1_000, 209_999, 210_000, 210_001, 500_000] {
            chain.set_height(height);
            let total: BigUint = calc.total_supply().parse().unwrap();
            let circ: BigUint = calc.circulating_supply().parse().unwrap();

            assert!(total >= prev_total, "total regressed at height {}", height);
            assert!(circ >= prev_circ, "circulating regressed at height {}", height);
            assert!(circ <= total, "circulating exceeds total at height {}", height);

            prev_total = total;
            prev_circ = circ;
        }
    }
}
