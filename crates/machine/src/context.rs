use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::file::AnimationFile;
use crate::registry::Players;

/// Top-level lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineState {
    #[default]
    Idle,
    Loading,
    Error,
    Ready,
    Playing,
    Paused,
    Stopped,
}

impl Display for MachineState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Error => "error",
            Self::Ready => "ready",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        };
        f.write_str(label)
    }
}

/// Whether the latest control targeted one player or all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlSource {
    Individual,
    Global,
}

/// Session data owned by the machine.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationContext {
    pub file: Option<AnimationFile>,
    /// Last load-level error message.
    pub error: Option<String>,
    /// Last broadcast multiplier. Each player keeps its own speed.
    pub global_speed: f64,
    /// Display hint only.
    pub source: Option<ControlSource>,
    /// Session loop flag flipped by `LOOP_ALL`.
    pub is_looping: bool,
    pub players: Players,
}

impl Default for AnimationContext {
    fn default() -> Self {
        Self {
            file: None,
            error: None,
            global_speed: 1.0,
            source: None,
            is_looping: false,
            players: Players::new(),
        }
    }
}
