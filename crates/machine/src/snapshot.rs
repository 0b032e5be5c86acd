use serde::Serialize;

use crate::context::{AnimationContext, ControlSource, MachineState};
use crate::engine::EngineKind;
use crate::frame::{format_frame, progress_percent};
use crate::registry::{PlayerState, PlayerStatus};

/// Serializable view of the machine consumed by front ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineSnapshot {
    pub state: MachineState,
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub error: Option<String>,
    pub global_speed: f64,
    pub source: Option<ControlSource>,
    pub is_looping: bool,
    pub players: Vec<PlayerSummary>,
}

/// Serializable view of one player, with live engine readouts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSummary {
    pub id: String,
    pub engine: Option<EngineKind>,
    pub status: PlayerStatus,
    pub is_playing: bool,
    pub is_looping: bool,
    pub playback_speed: f64,
    pub current_time: u32,
    pub total_frames: Option<u32>,
    pub frame_label: String,
    pub progress_percent: f64,
    pub error: Option<String>,
}

impl PlayerSummary {
    pub fn from_state(id: &str, state: &PlayerState) -> Self {
        let total = state.total_frames();
        let total_or_zero = total.unwrap_or(0);
        Self {
            id: id.to_owned(),
            engine: state.engine.as_ref().map(|engine| engine.kind()),
            status: state.status,
            is_playing: state.is_playing,
            is_looping: state.is_looping,
            playback_speed: state.playback_speed,
            current_time: state.current_time,
            total_frames: total,
            frame_label: format_frame(state.current_time, total_or_zero),
            progress_percent: progress_percent(state.current_time, total_or_zero),
            error: state.error.clone(),
        }
    }
}

impl MachineSnapshot {
    pub fn new(state: MachineState, context: &AnimationContext) -> Self {
        Self {
            state,
            file_name: context.file.as_ref().map(|file| file.name().to_owned()),
            file_size: context.file.as_ref().map(|file| file.size()),
            error: context.error.clone(),
            global_speed: context.global_speed,
            source: context.source,
            is_looping: context.is_looping,
            players: context
                .players
                .iter()
                .map(|(id, state)| PlayerSummary::from_state(id, state))
                .collect(),
        }
    }
}
