//! Preview orchestration for one animation rendered by several engines.
//!
//! A lifecycle [`Machine`] owns the player registry, applies individual and
//! broadcast controls, and polls playing engines through a background
//! progress tracker.

pub mod adapters;
pub mod api;
pub mod bridge;
pub mod broadcast;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod file;
pub mod frame;
pub mod handlers;
pub mod registry;
pub mod snapshot;
pub mod tracker;

pub use adapters::{DotLottieEngine, LottieWebEngine};
pub use api::{Command, Event, Machine};
pub use bridge::{MachineEventReceiver, MachineHandle, attach_player, spawn_machine_bridge};
pub use broadcast::{ParseSeekDirectionError, SeekDirection, seek_target};
pub use config::{DEFAULT_MAX_FILE_SIZE, DEFAULT_TICK_INTERVAL_MS, MachineConfig};
pub use context::{AnimationContext, ControlSource, MachineState};
pub use engine::{EngineKind, EngineRef, LoadHook, PlayerEngine, WeakEngineRef};
pub use error::{FileError, MachineError, Result};
pub use file::{AnimationFile, confirm_load, validate_file};
pub use frame::{format_frame, frame_at_fraction, progress_percent};
pub use registry::{PlayerId, PlayerState, PlayerStatus, Players};
pub use snapshot::{MachineSnapshot, PlayerSummary};
pub use tracker::{ProgressTracker, TrackerReport};
