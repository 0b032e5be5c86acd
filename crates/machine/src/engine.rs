use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::sync::{Arc, Weak};

use serde::Serialize;

/// One-shot callback fired with the outcome of the engine's next load.
pub type LoadHook = Box<dyn FnOnce(Result<(), String>) + Send>;

/// Rendering engine families that can be attached to a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EngineKind {
    #[serde(rename = "dotlottie")]
    DotLottie,
    #[serde(rename = "lottie-web")]
    LottieWeb,
}

impl Display for EngineKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DotLottie => write!(f, "dotlottie"),
            Self::LottieWeb => write!(f, "lottie-web"),
        }
    }
}

/// Playback capabilities every attached engine exposes.
///
/// Control methods are fire-and-forget: an engine that cannot honour a
/// command logs and carries on. Readouts return `None` until a document is
/// loaded.
pub trait PlayerEngine: Send + Sync {
    fn kind(&self) -> EngineKind;
    fn play(&self);
    fn pause(&self);
    /// Pauses and rewinds to the first frame.
    fn stop(&self);
    fn set_frame(&self, frame: u32);
    fn set_speed(&self, speed: f64);
    fn set_loop(&self, looping: bool);
    fn current_frame(&self) -> Option<f64>;
    fn total_frames(&self) -> Option<u32>;
    fn is_looping(&self) -> bool;
    /// Installs a hook for the next load outcome. Fires immediately if a
    /// load already finished.
    fn on_load(&self, hook: LoadHook);
}

/// Shared handle to an externally owned engine.
///
/// Equality is identity: two refs are equal when they point at the same
/// engine instance.
#[derive(Clone)]
pub struct EngineRef(Arc<dyn PlayerEngine>);

impl EngineRef {
    pub fn new(engine: impl PlayerEngine + 'static) -> Self {
        Self(Arc::new(engine))
    }

    pub fn from_arc(engine: Arc<dyn PlayerEngine>) -> Self {
        Self(engine)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakEngineRef {
        WeakEngineRef(Arc::downgrade(&self.0))
    }
}

impl PartialEq for EngineRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl std::fmt::Debug for EngineRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EngineRef").field(&self.0.kind()).finish()
    }
}

impl Deref for EngineRef {
    type Target = dyn PlayerEngine;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

/// Non-owning engine handle held by background readers and load hooks.
#[derive(Clone)]
pub struct WeakEngineRef(Weak<dyn PlayerEngine>);

impl WeakEngineRef {
    pub fn upgrade(&self) -> Option<EngineRef> {
        self.0.upgrade().map(EngineRef)
    }
}

impl std::fmt::Debug for WeakEngineRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("WeakEngineRef")
    }
}
