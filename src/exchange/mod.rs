//! Remote work exchange
//!
//! The channel-mediated state machine through which external miners
//! fetch work packages, submit candidate solutions, and report their
//! hashrates. A single coordinator task owns all mutable state; clients
//! hold a cheap cloneable [`ExchangeHandle`] and communicate through
//! typed request messages, each carrying its own reply channel.

mod api;
mod coordinator;

pub use api::Api;
pub use coordinator::{ExchangeHandle, RemoteExchange};

use crate::core::{Hash, Nonce, Target};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Everything an external miner needs to start hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkPackage {
    /// Pow-hash of the header being sealed.
    pub pow_hash: Hash,
    /// Seed hash for the current epoch's dataset.
    pub seed_hash: Hash,
    /// Boundary condition: the target, big-endian.
    pub boundary: Target,
    /// Height of the block being sealed.
    pub height: u64,
}

impl WorkPackage {
    /// The four-string RPC form: pow-hash, seed hash, boundary, and hex
    /// block number, all `0x`-prefixed lower-case.
    pub fn to_rpc(&self) -> [String; 4] {
        [
            self.pow_hash.to_hex(),
            self.seed_hash.to_hex(),
            self.boundary.to_hex(),
            format!("{:#x}", self.height),
        ]
    }
}

/// A verified solution handed back to the sealing engine.
#[derive(Debug, Clone)]
pub struct SealedSolution {
    /// The work package the solution seals.
    pub work: WorkPackage,
    /// The winning nonce.
    pub nonce: Nonce,
    /// The mix digest accompanying the nonce.
    pub mix_digest: Hash,
}

/// Checks a candidate seal against a pending work package.
///
/// Called inline by the coordinator at its selection point, so
/// implementations must be brief and must not block. Anything slow
/// belongs behind the engine's own worker, fed from the solutions
/// channel.
pub trait SealVerifier: Send + Sync {
    /// Whether `nonce`/`mix_digest` seal `work`.
    fn verify(&self, work: &WorkPackage, nonce: Nonce, mix_digest: Hash) -> bool;
}

impl<F> SealVerifier for F
where
    F: Fn(&WorkPackage, Nonce, Hash) -> bool + Send + Sync,
{
    fn verify(&self, work: &WorkPackage, nonce: Nonce, mix_digest: Hash) -> bool {
        self(work, nonce, mix_digest)
    }
}

/// Request for the current work package.
pub(crate) struct SealWork {
    pub(crate) reply: oneshot::Sender<Result<[String; 4]>>,
}

/// A candidate solution from an external miner.
pub(crate) struct MineResult {
    pub(crate) nonce: Nonce,
    pub(crate) mix_digest: Hash,
    /// Pow-hash identifying which pending work this solution claims.
    pub(crate) hash: Hash,
    pub(crate) reply: oneshot::Sender<Result<()>>,
}

/// A hashrate report from an external miner.
pub(crate) struct HashrateReport {
    pub(crate) rate: u64,
    /// Identifier de-duplicating reports from the same miner.
    pub(crate) id: Hash,
    pub(crate) ack: oneshot::Sender<()>,
}
