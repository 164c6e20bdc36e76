//! # Autosave Coordinator
//!
//! Editing surfaces report content on every keystroke. Committing each of
//! those would flood the version history, so the coordinator sits between
//! the editor and the store and turns bursts of changes into single commits.
//!
//! ## Debounce Model
//!
//! One pending slot, one timer:
//!
//! ```text
//! change("a")   change("ab")   change("abc")        (quiet period)
//!     │             │               │ ─────────────────────────▶ commit("abc")
//!     └─ timer ─────┴─ reset ───────┴─ reset
//! ```
//!
//! Each change replaces the pending value and pushes the deadline out to
//! `now + quiet_period`. When the deadline passes with no new change, the
//! latest value is committed with `update_note(selected, value)`. Values
//! replaced inside the quiet period are never committed.
//!
//! [`Debouncer`] holds that state and knows nothing about time sources or
//! tasks. [`AutosaveHandle`] runs it on a tokio task fed by a channel.
//!
//! ## Guards
//!
//! A due value is dropped instead of committed when:
//! - no note is selected,
//! - the value is empty,
//! - the value equals the selected note's current content.
//!
//! The selection is read when the value comes due, so an edit lands on
//! whichever note is selected at that moment.
//!
//! ## Teardown
//!
//! Dropping the handle, or [`AutosaveHandle::close`] with the default
//! config, discards a pending value. Set `flush_on_close` to commit it
//! instead. [`AutosaveHandle::flush`] commits the pending value right away.

use crate::error::{JotterError, Result};
use crate::model::NoteId;
use crate::persist::Persister;
use crate::store::SharedStore;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Duration, Instant};

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveConfig {
    pub quiet_period: Duration,
    pub flush_on_close: bool,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            quiet_period: DEFAULT_QUIET_PERIOD,
            flush_on_close: false,
        }
    }
}

/// A single pending value with a single resettable deadline.
#[derive(Debug)]
pub struct Debouncer<T> {
    quiet_period: Duration,
    pending: Option<T>,
    deadline: Option<Instant>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: None,
            deadline: None,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Replace the pending value and restart the quiet period from `now`.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some(value);
        self.deadline = Some(now + self.quiet_period);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The pending value, if its quiet period has elapsed by `now`.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.deadline {
            Some(deadline) if now >= deadline => self.take(),
            _ => None,
        }
    }

    /// The pending value regardless of the deadline.
    pub fn take(&mut self) -> Option<T> {
        self.deadline = None;
        self.pending.take()
    }

    /// Drop the pending value. Returns whether there was one.
    pub fn cancel(&mut self) -> bool {
        self.take().is_some()
    }
}

/// Counters returned when the coordinator shuts down.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveStats {
    /// Values committed to the store.
    pub commits: usize,
    /// Due values dropped by a guard.
    pub skipped: usize,
    /// Commits the store rejected, or persists that failed.
    pub failed: usize,
}

enum Command {
    Change(String),
    Flush(oneshot::Sender<()>),
    Close,
}

/// Owner-side handle to a running coordinator.
pub struct AutosaveHandle {
    tx: mpsc::UnboundedSender<Command>,
    task: JoinHandle<AutosaveStats>,
}

impl AutosaveHandle {
    /// Start a coordinator on the current tokio runtime.
    pub fn spawn(store: SharedStore, config: AutosaveConfig) -> Self {
        Self::start(store, config, None)
    }

    /// Like [`spawn`](Self::spawn), and persist through `persister` after each commit.
    pub fn spawn_with_persister(
        store: SharedStore,
        config: AutosaveConfig,
        persister: Persister,
    ) -> Self {
        Self::start(store, config, Some(persister))
    }

    fn start(store: SharedStore, config: AutosaveConfig, persister: Option<Persister>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = Worker {
            store,
            persister,
            debouncer: Debouncer::new(config.quiet_period),
            flush_on_close: config.flush_on_close,
            stats: AutosaveStats::default(),
        };
        tracing::debug!(
            "autosave started with a {}ms quiet period",
            config.quiet_period.as_millis()
        );
        let task = tokio::spawn(worker.run(rx));
        Self { tx, task }
    }

    /// Report the editor's current content.
    pub fn change(&self, content: impl Into<String>) -> Result<()> {
        self.tx
            .send(Command::Change(content.into()))
            .map_err(|_| closed())
    }

    /// Commit the pending value now, without waiting for the quiet period.
    pub async fn flush(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.tx.send(Command::Flush(ack)).map_err(|_| closed())?;
        done.await.map_err(|_| closed())
    }

    /// Shut the coordinator down and wait for it to finish.
    pub async fn close(self) -> AutosaveStats {
        let _ = self.tx.send(Command::Close);
        match self.task.await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!("autosave task ended abnormally: {}", e);
                AutosaveStats::default()
            }
        }
    }
}

fn closed() -> JotterError {
    JotterError::Store("autosave coordinator has shut down".to_string())
}

struct Worker {
    store: SharedStore,
    persister: Option<Persister>,
    debouncer: Debouncer<String>,
    flush_on_close: bool,
    stats: AutosaveStats,
}

impl Worker {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) -> AutosaveStats {
        loop {
            let deadline = self.debouncer.deadline();
            tokio::select! {
                biased;

                cmd = rx.recv() => match cmd {
                    Some(Command::Change(content)) => {
                        self.debouncer.push(content, Instant::now());
                    }
                    Some(Command::Flush(ack)) => {
                        if let Some(content) = self.debouncer.take() {
                            self.commit(content);
                        }
                        let _ = ack.send(());
                    }
                    Some(Command::Close) => {
                        if self.flush_on_close {
                            if let Some(content) = self.debouncer.take() {
                                self.commit(content);
                            }
                        } else if self.debouncer.cancel() {
                            tracing::debug!("autosave closed, pending change dropped");
                        }
                        break;
                    }
                    None => {
                        if self.debouncer.cancel() {
                            tracing::debug!("autosave handle dropped, pending change dropped");
                        }
                        break;
                    }
                },

                _ = wait_until(deadline) => {
                    if let Some(content) = self.debouncer.poll(Instant::now()) {
                        self.commit(content);
                    }
                }
            }
        }
        tracing::debug!("autosave stopped: {:?}", self.stats);
        self.stats
    }

    fn commit(&mut self, content: String) {
        if content.is_empty() {
            self.stats.skipped += 1;
            return;
        }

        let outcome = {
            let mut store = self.store.lock();
            let target = store
                .selected_note()
                .map(|note| (note.id().clone(), note.content() == content));
            match target {
                None => Outcome::NoSelection,
                Some((id, true)) => Outcome::Unchanged(id),
                Some((id, false)) => match store.update_note(&id, content) {
                    Ok(version) => Outcome::Committed(id, version),
                    Err(e) => Outcome::Rejected(e),
                },
            }
        };

        match outcome {
            Outcome::NoSelection => {
                tracing::debug!("no note selected, autosave skipped");
                self.stats.skipped += 1;
            }
            Outcome::Unchanged(id) => {
                tracing::debug!("note {} already holds this content, autosave skipped", id);
                self.stats.skipped += 1;
            }
            Outcome::Committed(id, version) => {
                tracing::debug!("autosaved note {} as version {}", id, version);
                self.stats.commits += 1;
                if let Some(persister) = &self.persister {
                    if persister.persist(&self.store).is_err() {
                        self.stats.failed += 1;
                    }
                }
            }
            Outcome::Rejected(e) => {
                tracing::warn!("autosave commit rejected: {}", e);
                self.stats.failed += 1;
            }
        }
    }
}

enum Outcome {
    NoSelection,
    Unchanged(NoteId),
    Committed(NoteId, u64),
    Rejected(JotterError),
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
