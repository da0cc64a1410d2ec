//! Flushes the pending queue to the remote sheet service.
//!
//! One attempt sends the whole pending batch as a JSON array. The remote side
//! either acknowledges all of it or none of it; there is no per-record retry.
//! At most one attempt is in flight: a trigger that arrives while another
//! attempt is outstanding is skipped, not queued.

use crate::model::AttendanceRecord;
use crate::tracker::{NoticeLevel, Tracker};
use anyhow::{bail, Context};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

pub const AUTO_SYNC_INTERVAL: Duration = Duration::from_secs(5 * 60);
pub const DEFERRED_SYNC_DELAY: Duration = Duration::from_secs(1);
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub type SharedTracker = Arc<Mutex<Option<Tracker>>>;

pub fn lock_tracker(shared: &SharedTracker) -> MutexGuard<'_, Option<Tracker>> {
    // A panicked holder leaves plain data behind; keep serving it.
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub trait SyncTransport: Send + Sync {
    fn send(&self, url: &str, batch: &[AttendanceRecord]) -> anyhow::Result<()>;
}

pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(HTTP_TIMEOUT).build(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncTransport for HttpTransport {
    fn send(&self, url: &str, batch: &[AttendanceRecord]) -> anyhow::Result<()> {
        match self.agent.post(url).send_json(batch) {
            Ok(resp) if (200..300).contains(&resp.status()) => Ok(()),
            Ok(resp) => bail!("sync endpoint answered {}", resp.status()),
            Err(ureq::Error::Status(code, _)) => bail!("sync endpoint answered {}", code),
            Err(e) => Err(e).context("failed to reach sync endpoint"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Manual,
    AfterRecord,
    Periodic,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trigger::Manual => "manual",
            Trigger::AfterRecord => "after-record",
            Trigger::Periodic => "periodic",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    InFlight,
    NoWorkspace,
    NotConfigured,
    NothingPending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum SyncOutcome {
    Synced { count: usize },
    Failed { error: String, pending: usize },
    Skipped { reason: SkipReason },
}

/// Single-flight flag. Holding a `FlightGuard` means an attempt is running.
#[derive(Debug, Default)]
pub struct SyncGate {
    busy: AtomicBool,
}

pub struct FlightGuard<'a> {
    gate: &'a SyncGate,
}

impl SyncGate {
    pub fn try_acquire(&self) -> Option<FlightGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard { gate: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}

pub struct Syncer {
    tracker: SharedTracker,
    gate: SyncGate,
    transport: Box<dyn SyncTransport>,
}

impl Syncer {
    pub fn new(tracker: SharedTracker, transport: Box<dyn SyncTransport>) -> Self {
        Self {
            tracker,
            gate: SyncGate::default(),
            transport,
        }
    }

    pub fn in_flight(&self) -> bool {
        self.gate.is_busy()
    }

    pub fn auto_sync_enabled(&self) -> bool {
        lock_tracker(&self.tracker)
            .as_ref()
            .map(|t| t.config().auto_sync)
            .unwrap_or(false)
    }

    /// One attempt. The state lock is held only while taking the batch and
    /// while applying the result, never across the network call.
    pub fn run(&self, trigger: Trigger) -> SyncOutcome {
        let Some(_flight) = self.gate.try_acquire() else {
            log::debug!("sync ({}) skipped: another attempt in flight", trigger);
            return SyncOutcome::Skipped {
                reason: SkipReason::InFlight,
            };
        };

        let (workspace, url, batch) = {
            let guard = lock_tracker(&self.tracker);
            let Some(t) = guard.as_ref() else {
                return SyncOutcome::Skipped {
                    reason: SkipReason::NoWorkspace,
                };
            };
            if !t.config().has_sheet() {
                return SyncOutcome::Skipped {
                    reason: SkipReason::NotConfigured,
                };
            }
            let batch = t.pending_batch();
            if batch.is_empty() {
                return SyncOutcome::Skipped {
                    reason: SkipReason::NothingPending,
                };
            }
            (
                t.workspace().to_path_buf(),
                t.config().sync_url.clone(),
                batch,
            )
        };

        log::info!("sync ({}): sending {} records to {}", trigger, batch.len(), url);
        let started = Instant::now();
        let result = self.transport.send(&url, &batch);

        let mut guard = lock_tracker(&self.tracker);
        let tracker = guard
            .as_mut()
            .filter(|t| t.workspace() == workspace.as_path());
        match result {
            Ok(()) => {
                let ids: Vec<i64> = batch.iter().map(|r| r.id).collect();
                let Some(t) = tracker else {
                    log::warn!(
                        "sync acknowledged after workspace {} closed",
                        workspace.to_string_lossy()
                    );
                    return SyncOutcome::Synced { count: ids.len() };
                };
                if let Err(e) = t.acknowledge_sync(&ids) {
                    log::error!("failed to persist sync acknowledgement: {:#}", e);
                }
                t.notify(NoticeLevel::Success, "synced", "Synchronized with the sheet");
                log::info!(
                    "sync ({}) acknowledged {} records in {} ms",
                    trigger,
                    ids.len(),
                    started.elapsed().as_millis()
                );
                SyncOutcome::Synced { count: ids.len() }
            }
            Err(e) => {
                log::warn!("sync ({}) failed: {:#}", trigger, e);
                let pending = match tracker {
                    Some(t) => {
                        if t.config().offline_mode {
                            t.notify(
                                NoticeLevel::Warning,
                                "saved_offline",
                                "Saved locally (offline mode)",
                            );
                        }
                        t.ledger().pending_count()
                    }
                    None => batch.len(),
                };
                SyncOutcome::Failed {
                    error: format!("{:#}", e),
                    pending,
                }
            }
        }
    }
}

/// Background thread for the deferred and periodic triggers.
pub struct SyncScheduler {
    tx: Sender<Trigger>,
    handle: JoinHandle<()>,
}

impl SyncScheduler {
    pub fn spawn(syncer: Arc<Syncer>, interval: Duration, defer: Duration) -> anyhow::Result<Self> {
        let (tx, rx) = mpsc::channel::<Trigger>();
        let handle = std::thread::Builder::new()
            .name("sync-scheduler".into())
            .spawn(move || {
                let mut next_tick = Instant::now() + interval;
                loop {
                    let wait = next_tick.saturating_duration_since(Instant::now());
                    match rx.recv_timeout(wait) {
                        Ok(trigger) => {
                            if trigger == Trigger::AfterRecord {
                                std::thread::sleep(defer);
                            }
                            if syncer.auto_sync_enabled() {
                                syncer.run(trigger);
                            }
                        }
                        Err(RecvTimeoutError::Timeout) => {
                            next_tick = Instant::now() + interval;
                            if syncer.auto_sync_enabled() {
                                syncer.run(Trigger::Periodic);
                            }
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                log::debug!("sync scheduler stopped");
            })
            .context("failed to start sync scheduler")?;
        Ok(Self { tx, handle })
    }

    pub fn nudge(&self, trigger: Trigger) {
        if self.tx.send(trigger).is_err() {
            log::warn!("sync scheduler is gone; {} trigger dropped", trigger);
        }
    }

    /// Close the channel and wait for the current attempt to finish.
    pub fn shutdown(self) {
        let Self { tx, handle } = self;
        drop(tx);
        let _ = handle.join();
    }
}
