use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde::Serialize;

use crate::engine::EngineRef;

/// Externally assigned, session-stable player id.
pub type PlayerId = String;

/// Playback status of one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    #[default]
    Idle,
    Ready,
    Playing,
    Paused,
    Stopped,
    Error,
}

impl Display for PlayerStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Ready => "ready",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// Registry record of one player.
///
/// `is_playing` is true exactly when `status` is `Playing`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub engine: Option<EngineRef>,
    pub status: PlayerStatus,
    pub is_playing: bool,
    pub is_looping: bool,
    pub playback_speed: f64,
    pub current_time: u32,
    pub error: Option<String>,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            engine: None,
            status: PlayerStatus::Idle,
            is_playing: false,
            is_looping: false,
            playback_speed: 1.0,
            current_time: 0,
            error: None,
        }
    }
}

impl PlayerState {
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Frame count read live from the attached engine.
    pub fn total_frames(&self) -> Option<u32> {
        self.engine.as_ref().and_then(|engine| engine.total_frames())
    }
}

/// Persistent player map.
///
/// Updates never touch the map in place. Each one returns a new map that
/// shares every unchanged entry with the previous one, so
/// [`Players::shares_entry`] can tell untouched siblings apart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Players(Arc<BTreeMap<PlayerId, Arc<PlayerState>>>);

impl Players {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&PlayerState> {
        self.0.get(id).map(|entry| entry.as_ref())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PlayerState)> {
        self.0
            .iter()
            .map(|(id, entry)| (id.as_str(), entry.as_ref()))
    }

    pub fn any_playing(&self) -> bool {
        self.0.values().any(|entry| entry.is_playing)
    }

    /// Whether both maps hold the very same record for `id`.
    pub fn shares_entry(&self, other: &Self, id: &str) -> bool {
        match (self.0.get(id), other.0.get(id)) {
            (Some(left), Some(right)) => Arc::ptr_eq(left, right),
            _ => false,
        }
    }

    /// Returns a map with `id` replaced by `state`.
    pub fn with_player(&self, id: impl Into<PlayerId>, state: PlayerState) -> Self {
        let mut entries = (*self.0).clone();
        entries.insert(id.into(), Arc::new(state));
        Self(Arc::new(entries))
    }

    /// Rebuilds the entry for `id`. Unknown ids leave the map untouched.
    pub fn update(&self, id: &str, change: impl FnOnce(&PlayerState) -> PlayerState) -> Self {
        match self.get(id) {
            Some(current) => self.with_player(id, change(current)),
            None => self.clone(),
        }
    }

    /// Rebuilds every entry for which `change` returns a new record.
    ///
    /// Entries mapped to `None` stay shared with `self`.
    pub fn update_all(&self, mut change: impl FnMut(&PlayerState) -> Option<PlayerState>) -> Self {
        let entries = self
            .0
            .iter()
            .map(|(id, entry)| {
                let entry = match change(entry) {
                    Some(next) => Arc::new(next),
                    None => Arc::clone(entry),
                };
                (id.clone(), entry)
            })
            .collect();
        Self(Arc::new(entries))
    }

    /// Attaches `engine` to `id` and marks the player ready.
    ///
    /// Speed, loop flag and position of a known player are kept; a first
    /// registration starts from defaults.
    pub fn register(&self, id: impl Into<PlayerId>, engine: EngineRef) -> Self {
        let id = id.into();
        let previous = self.get(&id).cloned().unwrap_or_default();
        let state = PlayerState {
            engine: Some(engine),
            status: PlayerStatus::Ready,
            is_playing: false,
            error: None,
            ..previous
        };
        self.with_player(id, state)
    }
}
