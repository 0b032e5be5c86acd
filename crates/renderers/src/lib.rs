//! Headless models of the rendering engines previewed side by side.
//!
//! Neither model draws anything. They decode the animation header, keep a
//! wall-clock playhead and expose the native control surface of the engine
//! they stand in for.

mod archive;
mod clock;
mod document;
mod dotlottie;
mod error;
mod lottie_web;

pub use archive::{ArchiveEntry, find_animation_entry, is_archive, pack_dotlottie};
pub use document::{AnimationDocument, SourceFormat, probe_document, sniff_format};
pub use dotlottie::{DotLottie, LoadListener, LoadOutcome};
pub use error::{RenderError, Result};
pub use lottie_web::{
    AnimationEvent, AnimationEventKind, AnimationEventListener, AnimationItem, LoadOptions,
};
