//! RPC-facing API surface
//!
//! The methods an RPC server exposes for remote mining and supply
//! queries. The API object is explicitly constructed and handed to the
//! transport layer; there is no process-wide engine singleton.

use super::ExchangeHandle;
use crate::chain::{ChainHeaderReader, RewardSchedule};
use crate::core::{Hash, Nonce};
use crate::error::{Error, Result};
use crate::supply::SupplyCalculator;
use std::sync::Arc;

/// Remote mining and supply methods for the RPC interface.
pub struct Api {
    exchange: Option<ExchangeHandle>,
    supply: SupplyCalculator,
}

impl Api {
    /// Create the API surface.
    ///
    /// `exchange` is `None` on nodes that do not serve remote miners;
    /// the mining methods then answer `not supported` / `false`.
    pub fn new(
        exchange: Option<ExchangeHandle>,
        chain: Arc<dyn ChainHeaderReader>,
        schedule: Arc<dyn RewardSchedule>,
    ) -> Self {
        Self {
            exchange,
            supply: SupplyCalculator::new(chain, schedule),
        }
    }

    /// Return a work package for an external miner.
    ///
    /// The package consists of 4 strings:
    ///   result\[0\] - 32 bytes hex encoded current block header pow-hash
    ///   result\[1\] - 32 bytes hex encoded seed hash used for the DAG
    ///   result\[2\] - 32 bytes hex encoded boundary condition ("target")
    ///   result\[3\] - hex encoded block number
    pub async fn get_work(&self) -> Result<[String; 4]> {
        let Some(exchange) = &self.exchange else {
            return Err(Error::NotSupported);
        };
        exchange.get_work().await
    }

    /// Submit a proof-of-work solution from an external miner.
    ///
    /// Returns whether the work was accepted. An invalid solution, a
    /// stale work package and an unknown pow-hash all answer `false`.
    pub async fn submit_work(&self, nonce: Nonce, hash: Hash, mix_digest: Hash) -> bool {
        let Some(exchange) = &self.exchange else {
            return false;
        };
        exchange.submit_work(nonce, hash, mix_digest).await
    }

    /// Record the hashrate of a remote miner, keyed by an identifier
    /// unique to that miner. Returns `true` once the report has been
    /// acknowledged, `false` if the exchange has stopped.
    pub async fn submit_hashrate(&self, rate: u64, id: Hash) -> bool {
        let Some(exchange) = &self.exchange else {
            return false;
        };
        exchange.submit_hashrate(rate, id).await
    }

    /// Combined hashrate of the local sealer and all reporting remote
    /// miners.
    pub fn get_hashrate(&self) -> u64 {
        self.exchange
            .as_ref()
            .map(ExchangeHandle::hashrate)
            .unwrap_or(0)
    }

    /// Total coins emitted up to the current tip, as a decimal string.
    pub fn get_total_supply(&self) -> String {
        self.supply.total_supply()
    }

    /// Matured coins at the current tip, as a decimal string.
    pub fn get_circulating_supply(&self) -> String {
        self.supply.circulating_supply()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{HalvingSchedule, Header};
    use crate::config::ExchangeConfig;
    use crate::core::Target;
    use crate::exchange::{RemoteExchange, SealVerifier, WorkPackage};
    use tokio::sync::mpsc;

    struct FixedChain(u64);

    impl ChainHeaderReader for FixedChain {
        fn current_header(&self) -> Option<Header> {
            Some(Header::new(self.0))
        }
    }

    fn api_without_remote(height: u64) -> Api {
        Api::new(
            None,
            Arc::new(FixedChain(height)),
            Arc::new(HalvingSchedule::default()),
        )
    }

    #[tokio::test]
    async fn test_not_supported_without_remote() {
        let api = api_without_remote(10);

        let err = api.get_work().await.unwrap_err();
        assert!(matches!(err, Error::NotSupported));
        assert_eq!(err.to_string(), "not supported");

        assert!(
            !api.submit_work(Nonce::new(1), Hash::default(), Hash::default())
                .await
        );
        assert!(!api.submit_hashrate(1000, Hash::default()).await);
        assert_eq!(api.get_hashrate(), 0);
    }

    #[tokio::test]
    async fn test_supply_endpoints() {
        let api = api_without_remote(101);
        assert_eq!(api.get_total_supply(), "505000000000");
        assert_eq!(api.get_circulating_supply(), "5000000000");
    }

    #[tokio::test]
    async fn test_mining_methods_with_remote() {
        let verifier: Arc<dyn SealVerifier> =
            Arc::new(|_: &WorkPackage, _: Nonce, _: Hash| true);
        let (solutions, _solutions_rx) = mpsc::channel(4);
        let (handle, _join) =
            RemoteExchange::spawn(verifier, solutions, ExchangeConfig::default());

        let package = WorkPackage {
            pow_hash: Hash::from_bytes([0x77; 32]),
            seed_hash: Hash::from_bytes([0x88; 32]),
            boundary: Target::from_bytes([0xFF; 32]),
            height: 12,
        };
        handle.publish_work(package).await.unwrap();

        let api = Api::new(
            Some(handle.clone()),
            Arc::new(FixedChain(12)),
            Arc::new(HalvingSchedule::default()),
        );

        let work = api.get_work().await.unwrap();
        assert_eq!(work[0], package.pow_hash.to_hex());
        assert_eq!(work[3], "0xc");

        assert!(
            api.submit_work(Nonce::new(5), package.pow_hash, Hash::default())
                .await
        );

        assert!(api.submit_hashrate(2_500, Hash::from_bytes([0x01; 32])).await);
        assert_eq!(api.get_hashrate(), 2_500);

        handle.stop();
    }
}
