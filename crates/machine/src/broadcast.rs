//! Pure transitions applied to every registered player.
//!
//! Each player is updated independently from its own record; players
//! carrying an error are skipped and stay shared with the input map.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::handlers::{at_frame, paused, playing, rewound};
use crate::registry::{PlayerState, Players};

/// Relative target of `SEEK_ALL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeekDirection {
    Start,
    End,
    Forward,
    Backward,
}

impl Display for SeekDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Forward => "forward",
            Self::Backward => "backward",
        };
        f.write_str(label)
    }
}

/// Error returned when parsing an unknown seek direction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown seek direction `{0}` (expected start, end, forward or backward)")]
pub struct ParseSeekDirectionError(String);

impl FromStr for SeekDirection {
    type Err = ParseSeekDirectionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "end" => Ok(Self::End),
            "forward" => Ok(Self::Forward),
            "backward" => Ok(Self::Backward),
            _ => Err(ParseSeekDirectionError(value.to_owned())),
        }
    }
}

/// Frame a player moves to for `direction`.
///
/// Without a known total, `end` and `forward` keep the current frame.
///
/// # Example
/// ```
/// use machine::{SeekDirection, seek_target};
///
/// assert_eq!(seek_target(SeekDirection::Forward, 99, Some(100)), 100);
/// assert_eq!(seek_target(SeekDirection::Forward, 100, Some(100)), 100);
/// assert_eq!(seek_target(SeekDirection::Backward, 0, Some(100)), 0);
/// ```
pub fn seek_target(direction: SeekDirection, current: u32, total: Option<u32>) -> u32 {
    match (direction, total) {
        (SeekDirection::Start, _) => 0,
        (SeekDirection::Backward, _) => current.saturating_sub(1),
        (SeekDirection::End, Some(total)) => total,
        (SeekDirection::Forward, Some(total)) => current.saturating_add(1).min(total),
        (SeekDirection::End | SeekDirection::Forward, None) => current,
    }
}

fn each_controllable(
    players: &Players,
    mut change: impl FnMut(&PlayerState) -> PlayerState,
) -> Players {
    players.update_all(|state| (!state.has_error()).then(|| change(state)))
}

pub fn play_all(players: &Players) -> Players {
    each_controllable(players, playing)
}

pub fn pause_all(players: &Players) -> Players {
    each_controllable(players, paused)
}

/// Rewinds every player to frame 0 and marks it ready.
pub fn stop_all(players: &Players) -> Players {
    each_controllable(players, rewound)
}

pub fn seek_all(players: &Players, direction: SeekDirection) -> Players {
    each_controllable(players, |state| {
        let target = seek_target(direction, state.current_time, state.total_frames());
        at_frame(state, target)
    })
}

pub fn set_global_speed(players: &Players, value: f64) -> Players {
    each_controllable(players, |state| PlayerState {
        playback_speed: value,
        ..state.clone()
    })
}

/// Flips each player's own loop flag.
pub fn loop_all(players: &Players) -> Players {
    each_controllable(players, |state| PlayerState {
        is_looping: !state.is_looping,
        ..state.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::{
        SeekDirection, loop_all, pause_all, play_all, seek_all, seek_target, set_global_speed,
        stop_all,
    };
    use crate::engine::tests::MockEngine;
    use crate::handlers::{seek, set_error, toggle_loop};
    use crate::registry::{PlayerStatus, Players};

    fn players_with_totals(totals: &[(&str, u32)]) -> Players {
        totals.iter().fold(Players::new(), |players, (id, total)| {
            let (engine, _) = MockEngine::with_total(*total);
            players.register(*id, engine)
        })
    }

    fn times(players: &Players) -> Vec<u32> {
        players.iter().map(|(_, state)| state.current_time).collect()
    }

    #[test]
    fn seek_start_rewinds_everyone() {
        let players = players_with_totals(&[("a", 100), ("b", 50)]);
        let players = seek(&seek(&players, "a", Some(80)), "b", Some(20));

        let players = seek_all(&players, SeekDirection::Start);

        assert_eq!(times(&players), vec![0, 0]);
    }

    #[test]
    fn seek_end_uses_each_players_own_total() {
        let players = players_with_totals(&[("a", 100), ("b", 50)]);

        let players = seek_all(&players, SeekDirection::End);

        assert_eq!(times(&players), vec![100, 50]);
    }

    #[test]
    fn seek_forward_clamps_at_total() {
        let players = players_with_totals(&[("a", 100), ("b", 100)]);
        let players = seek(&players, "a", Some(100));

        let players = seek_all(&players, SeekDirection::Forward);

        assert_eq!(times(&players), vec![100, 1]);
    }

    #[test]
    fn seek_backward_clamps_at_zero() {
        let players = players_with_totals(&[("a", 100), ("b", 100)]);
        let players = seek(&players, "b", Some(10));

        let players = seek_all(&players, SeekDirection::Backward);

        assert_eq!(times(&players), vec![0, 9]);
    }

    #[test]
    fn seek_target_without_total_holds_position() {
        assert_eq!(seek_target(SeekDirection::End, 12, None), 12);
        assert_eq!(seek_target(SeekDirection::Forward, 12, None), 12);
        assert_eq!(seek_target(SeekDirection::Start, 12, None), 0);
    }

    #[test]
    fn play_pause_stop_all_apply_uniformly() {
        let players = players_with_totals(&[("a", 10), ("b", 10)]);

        let playing = play_all(&players);
        assert!(playing.iter().all(|(_, s)| s.status == PlayerStatus::Playing && s.is_playing));

        let paused = pause_all(&playing);
        assert!(paused.iter().all(|(_, s)| s.status == PlayerStatus::Paused && !s.is_playing));

        let stopped = stop_all(&seek_all(&paused, SeekDirection::End));
        assert!(stopped.iter().all(|(_, s)| s.status == PlayerStatus::Ready));
        assert_eq!(times(&stopped), vec![0, 0]);
    }

    #[test]
    fn broadcasts_skip_errored_players() {
        let players = set_error(
            &players_with_totals(&[("a", 10), ("b", 10)]),
            "a",
            "cannot decode",
        );

        let after = set_global_speed(&play_all(&players), 2.0);

        assert!(after.shares_entry(&players, "a"));
        let b = after.get("b").expect("b");
        assert_eq!(b.playback_speed, 2.0);
        assert!(b.is_playing);
    }

    #[test]
    fn loop_all_flips_each_flag() {
        let players = players_with_totals(&[("a", 10), ("b", 10)]);
        let players = toggle_loop(&players, "a");

        let players = loop_all(&players);

        let flags: Vec<bool> = players.iter().map(|(_, s)| s.is_looping).collect();
        assert_eq!(flags, vec![false, true]);
    }

    #[test]
    fn seek_direction_parses_case_insensitively() {
        assert_eq!("Forward".parse::<SeekDirection>(), Ok(SeekDirection::Forward));
        assert!("sideways".parse::<SeekDirection>().is_err());
    }
}
