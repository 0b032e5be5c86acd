//! Pure transitions targeting a single player.
//!
//! Each function returns a new map in which only the targeted entry is
//! rebuilt. Unknown ids and players carrying an error are left untouched.

use crate::registry::{PlayerState, PlayerStatus, Players};

fn update_controllable(
    players: &Players,
    id: &str,
    change: impl FnOnce(&PlayerState) -> PlayerState,
) -> Players {
    match players.get(id) {
        Some(state) if !state.has_error() => players.update(id, change),
        _ => players.clone(),
    }
}

pub(crate) fn playing(state: &PlayerState) -> PlayerState {
    PlayerState {
        status: PlayerStatus::Playing,
        is_playing: true,
        ..state.clone()
    }
}

pub(crate) fn paused(state: &PlayerState) -> PlayerState {
    PlayerState {
        status: PlayerStatus::Paused,
        is_playing: false,
        ..state.clone()
    }
}

pub(crate) fn rewound(state: &PlayerState) -> PlayerState {
    PlayerState {
        status: PlayerStatus::Ready,
        is_playing: false,
        current_time: 0,
        ..state.clone()
    }
}

/// Clamps `frame` into the engine's frame range when it is known.
pub(crate) fn at_frame(state: &PlayerState, frame: u32) -> PlayerState {
    let frame = match state.total_frames() {
        Some(total) => frame.min(total),
        None => frame,
    };
    PlayerState {
        current_time: frame,
        ..state.clone()
    }
}

pub fn play(players: &Players, id: &str) -> Players {
    update_controllable(players, id, playing)
}

pub fn pause(players: &Players, id: &str) -> Players {
    update_controllable(players, id, paused)
}

/// Rewinds to frame 0 and marks the player ready. Applying it twice is the
/// same as applying it once.
pub fn stop(players: &Players, id: &str) -> Players {
    update_controllable(players, id, rewound)
}

/// Moves the playhead. A missing frame means frame 0.
pub fn seek(players: &Players, id: &str, frame: Option<u32>) -> Players {
    update_controllable(players, id, |state| at_frame(state, frame.unwrap_or(0)))
}

/// Records a progress sample; same effect on the registry as [`seek`].
pub fn update_progress(players: &Players, id: &str, frame: Option<u32>) -> Players {
    seek(players, id, frame)
}

pub fn toggle_loop(players: &Players, id: &str) -> Players {
    update_controllable(players, id, |state| PlayerState {
        is_looping: !state.is_looping,
        ..state.clone()
    })
}

/// Sets the playback multiplier. Values are not bounded here.
pub fn set_speed(players: &Players, id: &str, value: f64) -> Players {
    update_controllable(players, id, |state| PlayerState {
        playback_speed: value,
        ..state.clone()
    })
}

/// Marks a player whose animation ran to its last frame.
pub fn mark_ended(players: &Players, id: &str) -> Players {
    update_controllable(players, id, |state| PlayerState {
        status: PlayerStatus::Stopped,
        is_playing: false,
        ..state.clone()
    })
}

/// Records an engine failure on one player. An empty message clears it.
pub fn set_error(players: &Players, id: &str, error: &str) -> Players {
    players.update(id, |state| {
        if error.is_empty() {
            PlayerState {
                status: PlayerStatus::Ready,
                error: None,
                ..state.clone()
            }
        } else {
            PlayerState {
                status: PlayerStatus::Error,
                is_playing: false,
                error: Some(error.to_owned()),
                ..state.clone()
            }
        }
    })
}
