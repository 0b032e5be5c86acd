use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::{debug, warn};

use crate::api::Command;
use crate::context::ControlSource;
use crate::engine::WeakEngineRef;
use crate::registry::Players;

/// Synthetic command produced by a progress reader, stamped with the
/// tracking generation it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerReport {
    pub generation: u64,
    pub command: Command,
}

/// Polls every playing engine on a fixed cadence.
///
/// Each [`ProgressTracker::start`] bumps a generation counter and spawns one
/// reader per playing player. Readers exit as soon as the counter moves on,
/// so bumping it cancels the whole set at once. Reports still in flight are
/// recognised as stale through [`ProgressTracker::is_current`].
#[derive(Debug)]
pub struct ProgressTracker {
    interval: Duration,
    generation: Arc<AtomicU64>,
    active: bool,
    report_tx: Sender<TrackerReport>,
    report_rx: Receiver<TrackerReport>,
}

impl ProgressTracker {
    pub fn new(interval: Duration) -> Self {
        let (report_tx, report_rx) = unbounded();
        Self {
            interval,
            generation: Arc::new(AtomicU64::new(0)),
            active: false,
            report_tx,
            report_rx,
        }
    }

    /// Receiver of every report produced by any generation.
    pub fn reports(&self) -> Receiver<TrackerReport> {
        self.report_rx.clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_current(&self, report: &TrackerReport) -> bool {
        self.active && report.generation == self.generation()
    }

    /// Cancels running readers and starts new ones for every player that is
    /// playing, has an engine and no error. Returns the new generation.
    pub fn start(&mut self, players: &Players, origin: ControlSource) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.active = true;

        let mut readers = 0usize;
        for (id, state) in players.iter() {
            if !state.is_playing || state.has_error() {
                continue;
            }
            let Some(engine) = state.engine.as_ref() else {
                continue;
            };
            let reader = Reader {
                id: id.to_owned(),
                engine: engine.downgrade(),
                origin,
                generation,
                current: Arc::clone(&self.generation),
                interval: self.interval,
                report_tx: self.report_tx.clone(),
            };
            let spawned = thread::Builder::new()
                .name(format!("progress-{id}"))
                .spawn(move || reader.run());
            match spawned {
                Ok(_) => readers += 1,
                Err(error) => warn!(id, %error, "failed to spawn progress reader"),
            }
        }

        debug!(generation, readers, ?origin, "progress tracking started");
        generation
    }

    /// Stops every reader of the current generation.
    pub fn cancel(&mut self) {
        if !self.active {
            return;
        }
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.active = false;
        debug!(generation, "progress tracking cancelled");
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

struct Reader {
    id: String,
    engine: WeakEngineRef,
    origin: ControlSource,
    generation: u64,
    current: Arc<AtomicU64>,
    interval: Duration,
    report_tx: Sender<TrackerReport>,
}

impl Reader {
    fn run(self) {
        loop {
            thread::sleep(self.interval);
            if self.current.load(Ordering::Acquire) != self.generation {
                return;
            }
            let Some(engine) = self.engine.upgrade() else {
                return;
            };
            let Some(frame) = engine.current_frame() else {
                continue;
            };

            let progress = Command::UpdateProgress {
                id: self.id.clone(),
                frame: Some(frame.round().max(0.0) as u32),
            };
            if !self.send(progress) {
                return;
            }

            let Some(total) = engine.total_frames() else {
                continue;
            };
            if !engine.is_looping() && frame >= f64::from(total) - 1.0 {
                let id = self.id.clone();
                let ended = match self.origin {
                    ControlSource::Individual => Command::AnimationEnded { id },
                    ControlSource::Global => Command::AnimationAllEnded { id },
                };
                self.send(ended);
                return;
            }
        }
    }

    fn send(&self, command: Command) -> bool {
        self.report_tx
            .send(TrackerReport {
                generation: self.generation,
                command,
            })
            .is_ok()
    }
}
