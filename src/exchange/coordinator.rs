//! The exchange coordinator task and its client handle

use super::{
    HashrateReport, MineResult, SealWork, SealVerifier, SealedSolution, WorkPackage,
};
use crate::config::ExchangeConfig;
use crate::core::{Hash, Nonce};
use crate::error::{Error, Result};
use crate::utils::format_hashrate;
use dashmap::DashMap;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Pending work packages older than this many blocks behind the latest
/// published height are dropped.
const STALE_THRESHOLD: u64 = 7;

struct RateEntry {
    rate: u64,
    updated: Instant,
}

/// The single-writer coordinator behind the remote work exchange.
///
/// Owns the current work slot, the pending-seal table, and the hashrate
/// table. All client traffic arrives through the channels created by
/// [`RemoteExchange::spawn`]; nothing else may touch this state.
pub struct RemoteExchange {
    verifier: Arc<dyn SealVerifier>,
    solutions: mpsc::Sender<SealedSolution>,
    config: ExchangeConfig,

    current_work: Option<WorkPackage>,
    pending: HashMap<Hash, WorkPackage>,
    pending_order: VecDeque<Hash>,
    rates: Arc<DashMap<Hash, RateEntry>>,

    new_work_rx: mpsc::Receiver<WorkPackage>,
    fetch_work_rx: mpsc::Receiver<SealWork>,
    submit_work_rx: mpsc::Receiver<MineResult>,
    submit_rate_rx: mpsc::Receiver<HashrateReport>,
    exit_rx: watch::Receiver<bool>,
}

/// Cheap cloneable client handle to a running exchange.
///
/// The sealing engine publishes work and signals shutdown through it;
/// RPC handlers use it for fetches, submissions and hashrate reports.
#[derive(Clone)]
pub struct ExchangeHandle {
    new_work_tx: mpsc::Sender<WorkPackage>,
    fetch_work_tx: mpsc::Sender<SealWork>,
    submit_work_tx: mpsc::Sender<MineResult>,
    submit_rate_tx: mpsc::Sender<HashrateReport>,
    rates: Arc<DashMap<Hash, RateEntry>>,
    local_rate: Arc<AtomicU64>,
    exit: Arc<watch::Sender<bool>>,
    rate_expiry: Duration,
}

impl RemoteExchange {
    /// Spawn the coordinator task.
    ///
    /// Verified solutions are forwarded on `solutions` with a
    /// non-blocking send; if the engine is not consuming them the
    /// submission is rejected rather than the coordinator stalling.
    pub fn spawn(
        verifier: Arc<dyn SealVerifier>,
        solutions: mpsc::Sender<SealedSolution>,
        config: ExchangeConfig,
    ) -> (ExchangeHandle, JoinHandle<()>) {
        let capacity = config.channel_capacity;
        let (new_work_tx, new_work_rx) = mpsc::channel(capacity);
        let (fetch_work_tx, fetch_work_rx) = mpsc::channel(capacity);
        let (submit_work_tx, submit_work_rx) = mpsc::channel(capacity);
        let (submit_rate_tx, submit_rate_rx) = mpsc::channel(capacity);
        let (exit_tx, exit_rx) = watch::channel(false);

        let rates = Arc::new(DashMap::new());
        let rate_expiry = Duration::from_secs(config.rate_expiry_secs);

        let exchange = Self {
            verifier,
            solutions,
            config,
            current_work: None,
            pending: HashMap::new(),
            pending_order: VecDeque::new(),
            rates: Arc::clone(&rates),
            new_work_rx,
            fetch_work_rx,
            submit_work_rx,
            submit_rate_rx,
            exit_rx,
        };

        let handle = ExchangeHandle {
            new_work_tx,
            fetch_work_tx,
            submit_work_tx,
            submit_rate_tx,
            rates,
            local_rate: Arc::new(AtomicU64::new(0)),
            exit: Arc::new(exit_tx),
            rate_expiry,
        };

        let join = tokio::spawn(exchange.run());
        (handle, join)
    }

    async fn run(mut self) {
        info!("remote work exchange started");
        loop {
            tokio::select! {
                _ = self.exit_rx.changed() => {
                    self.drain();
                    break;
                }
                Some(work) = self.new_work_rx.recv() => self.on_new_work(work),
                Some(req) = self.fetch_work_rx.recv() => self.on_fetch_work(req),
                Some(result) = self.submit_work_rx.recv() => self.on_submit_work(result),
                Some(report) = self.submit_rate_rx.recv() => self.on_submit_rate(report),
            }
        }
        info!("remote work exchange stopped");
    }

    /// A new package from the sealing engine: it becomes the current
    /// work, stale and excess pending entries are dropped.
    fn on_new_work(&mut self, work: WorkPackage) {
        debug!(height = work.height, pow_hash = %work.pow_hash, "publishing new work");

        let pending = &mut self.pending;
        self.pending_order.retain(|hash| {
            let stale = pending
                .get(hash)
                .map(|w| w.height + STALE_THRESHOLD <= work.height)
                .unwrap_or(true);
            if stale {
                pending.remove(hash);
            }
            !stale
        });

        while self.pending.len() >= self.config.max_pending_works {
            let Some(oldest) = self.pending_order.pop_front() else {
                break;
            };
            self.pending.remove(&oldest);
        }

        if self.pending.insert(work.pow_hash, work).is_none() {
            self.pending_order.push_back(work.pow_hash);
        }
        self.current_work = Some(work);
    }

    fn on_fetch_work(&mut self, req: SealWork) {
        let response = match &self.current_work {
            Some(work) => Ok(work.to_rpc()),
            None => Err(Error::NoWork),
        };
        // The requester may have timed out and dropped its receiver.
        let _ = req.reply.send(response);
    }

    fn on_submit_work(&mut self, result: MineResult) {
        let verdict = self.check_submission(result.nonce, result.hash, result.mix_digest);
        if let Err(err) = &verdict {
            debug!(hash = %result.hash, %err, "rejected remote solution");
        }
        let _ = result.reply.send(verdict);
    }

    fn check_submission(&self, nonce: Nonce, hash: Hash, mix_digest: Hash) -> Result<()> {
        let Some(work) = self.pending.get(&hash) else {
            return Err(Error::UnknownWork {
                hash: hash.to_hex(),
            });
        };

        if !self.verifier.verify(work, nonce, mix_digest) {
            return Err(Error::InvalidSeal {
                hash: hash.to_hex(),
            });
        }

        let solution = SealedSolution {
            work: *work,
            nonce,
            mix_digest,
        };
        match self.solutions.try_send(solution) {
            Ok(()) => {
                info!(height = work.height, %nonce, "remote solution accepted");
                Ok(())
            }
            Err(_) => {
                warn!(height = work.height, "sealing result is not being consumed by the engine");
                Err(Error::ResultUnconsumed)
            }
        }
    }

    fn on_submit_rate(&mut self, report: HashrateReport) {
        let expiry = Duration::from_secs(self.config.rate_expiry_secs);
        self.rates.retain(|_, entry| entry.updated.elapsed() < expiry);
        self.rates.insert(
            report.id,
            RateEntry {
                rate: report.rate,
                updated: Instant::now(),
            },
        );

        let remote: u64 = self.rates.iter().map(|entry| entry.rate).sum();
        debug!(
            id = %report.id,
            rate = %format_hashrate(report.rate),
            remote = %format_hashrate(remote),
            "remote hashrate reported"
        );

        let _ = report.ack.send(());
    }

    /// Answer everything still queued with the stopped error, then let
    /// the receivers drop so all future sends fail fast.
    fn drain(&mut self) {
        self.new_work_rx.close();
        self.fetch_work_rx.close();
        self.submit_work_rx.close();
        self.submit_rate_rx.close();

        while let Ok(req) = self.fetch_work_rx.try_recv() {
            let _ = req.reply.send(Err(Error::Stopped));
        }
        while let Ok(result) = self.submit_work_rx.try_recv() {
            let _ = result.reply.send(Err(Error::Stopped));
        }
        // Dropping the ack is enough: the reporter observes the closed
        // channel and returns false.
        while self.submit_rate_rx.try_recv().is_ok() {}
        while self.new_work_rx.try_recv().is_ok() {}
    }
}

impl ExchangeHandle {
    /// Publish a freshly prepared work package (sealing-engine side).
    pub async fn publish_work(&self, work: WorkPackage) -> Result<()> {
        self.new_work_tx
            .send(work)
            .await
            .map_err(|_| Error::Stopped)
    }

    /// Fetch the current work package in its four-string RPC form.
    ///
    /// Fails with [`Error::NoWork`] before the first package is
    /// published and with [`Error::Stopped`] after shutdown.
    pub async fn get_work(&self) -> Result<[String; 4]> {
        let (reply, rx) = oneshot::channel();
        self.fetch_work_tx
            .send(SealWork { reply })
            .await
            .map_err(|_| Error::Stopped)?;
        rx.await.map_err(|_| Error::Stopped)?
    }

    /// Submit a candidate solution. Returns `true` iff it was accepted;
    /// invalid, stale and unknown submissions are indistinguishable at
    /// this boundary.
    pub async fn submit_work(&self, nonce: Nonce, hash: Hash, mix_digest: Hash) -> bool {
        let (reply, rx) = oneshot::channel();
        let sent = self
            .submit_work_tx
            .send(MineResult {
                nonce,
                mix_digest,
                hash,
                reply,
            })
            .await;
        if sent.is_err() {
            return false;
        }
        matches!(rx.await, Ok(Ok(())))
    }

    /// Report a remote miner's hashrate. Returns `true` once the report
    /// is acknowledged, `false` if the exchange stopped first.
    pub async fn submit_hashrate(&self, rate: u64, id: Hash) -> bool {
        let (ack, rx) = oneshot::channel();
        let sent = self
            .submit_rate_tx
            .send(HashrateReport { rate, id, ack })
            .await;
        if sent.is_err() {
            return false;
        }
        rx.await.is_ok()
    }

    /// Best-effort aggregate of local and recently reported remote
    /// hashrate. Not sequentially consistent with in-flight reports.
    pub fn hashrate(&self) -> u64 {
        let remote: u64 = self
            .rates
            .iter()
            .filter(|entry| entry.updated.elapsed() < self.rate_expiry)
            .map(|entry| entry.rate)
            .sum();
        remote.saturating_add(self.local_rate.load(Ordering::Relaxed))
    }

    /// Record the local sealing loop's hashrate for [`Self::hashrate`].
    pub fn set_local_hashrate(&self, rate: u64) {
        self.local_rate.store(rate, Ordering::Relaxed);
    }

    /// Signal shutdown. Idempotent; all in-flight and subsequent
    /// requests observe the stopped error.
    pub fn stop(&self) {
        let _ = self.exit.send(true);
    }
}
