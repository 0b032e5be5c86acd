use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use tracing::debug;

use crate::clock::PlaybackState;
use crate::document::{AnimationDocument, SourceFormat, sniff_format};
use crate::dotlottie::lock;
use crate::error::{RenderError, Result};

const ENGINE_NAME: &str = "lottie-web";

/// Event kinds a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationEventKind {
    DomLoaded,
    DataFailed,
}

/// Event delivered to listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationEvent {
    DomLoaded,
    DataFailed(RenderError),
}

impl AnimationEvent {
    pub fn kind(&self) -> AnimationEventKind {
        match self {
            Self::DomLoaded => AnimationEventKind::DomLoaded,
            Self::DataFailed(_) => AnimationEventKind::DataFailed,
        }
    }
}

/// Listener removed after its first delivery.
pub type AnimationEventListener = Box<dyn FnOnce(&AnimationEvent) + Send>;

/// Options given when the animation item is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub looping: bool,
    pub autoplay: bool,
}

/// Headless lottie-web animation item.
///
/// Only plain Lottie JSON can be decoded; handing it a dotLottie archive
/// fails the load with `DataFailed`.
pub struct AnimationItem {
    options: LoadOptions,
    state: Mutex<PlaybackState>,
    last_event: Mutex<Option<AnimationEvent>>,
    listeners: Mutex<Vec<(AnimationEventKind, AnimationEventListener)>>,
}

impl std::fmt::Debug for AnimationItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationItem")
            .field("options", &self.options)
            .field("state", &*self.state())
            .finish_non_exhaustive()
    }
}

impl AnimationItem {
    pub fn new(options: LoadOptions) -> Self {
        Self {
            options,
            state: Mutex::new(PlaybackState::new(1.0, options.looping)),
            last_event: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Decodes `bytes` and emits `DomLoaded` or `DataFailed`.
    ///
    /// # Example
    /// ```
    /// use renderers::{AnimationItem, LoadOptions};
    ///
    /// let item = AnimationItem::new(LoadOptions::default());
    /// item.load(br#"{"fr":24,"ip":0,"op":48}"#).expect("valid animation");
    /// assert_eq!(item.total_frames(), Some(48.0));
    /// ```
    pub fn load(&self, bytes: &[u8]) -> Result<()> {
        let probed = match sniff_format(bytes) {
            SourceFormat::LottieJson => {
                AnimationDocument::from_json(bytes).map(|doc| (SourceFormat::LottieJson, doc))
            }
            format @ SourceFormat::DotLottieArchive => Err(RenderError::UnsupportedFormat {
                engine: ENGINE_NAME,
                format,
            }),
        };

        let event = match &probed {
            Ok(_) => AnimationEvent::DomLoaded,
            Err(error) => {
                debug!(%error, "lottie-web load failed");
                AnimationEvent::DataFailed(error.clone())
            }
        };
        let outcome = probed.as_ref().map(|_| ()).map_err(|error| error.clone());

        {
            let mut state = self.state();
            state.finish_load(probed);
            if outcome.is_ok() && self.options.autoplay {
                state.playhead_mut()?.play(Instant::now());
            }
        }
        *lock(&self.last_event) = Some(event.clone());
        self.emit(&event);
        outcome
    }

    /// Subscribes a one-shot listener.
    ///
    /// When the matching event was already emitted the listener fires
    /// immediately.
    pub fn add_event_listener(&self, kind: AnimationEventKind, listener: AnimationEventListener) {
        let last = lock(&self.last_event).clone();
        match last {
            Some(event) if event.kind() == kind => listener(&event),
            _ => lock(&self.listeners).push((kind, listener)),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.state().is_loaded()
    }

    pub fn play(&self) -> Result<()> {
        self.state().playhead_mut()?.play(Instant::now());
        Ok(())
    }

    pub fn pause(&self) -> Result<()> {
        self.state().playhead_mut()?.pause(Instant::now());
        Ok(())
    }

    pub fn stop(&self) -> Result<()> {
        self.state().playhead_mut()?.stop();
        Ok(())
    }

    /// Moves to `value` and pauses. `value` is a frame when `is_frame` is
    /// set, otherwise milliseconds.
    pub fn go_to_and_stop(&self, value: f64, is_frame: bool) -> Result<()> {
        let mut state = self.state();
        let frame = self.to_frame(&state, value, is_frame)?;
        let playhead = state.playhead_mut()?;
        playhead.pause(Instant::now());
        playhead.seek(frame, Instant::now());
        Ok(())
    }

    /// Moves to `value` and keeps playing.
    pub fn go_to_and_play(&self, value: f64, is_frame: bool) -> Result<()> {
        let mut state = self.state();
        let frame = self.to_frame(&state, value, is_frame)?;
        let now = Instant::now();
        let playhead = state.playhead_mut()?;
        playhead.seek(frame, now);
        playhead.play(now);
        Ok(())
    }

    pub fn set_speed(&self, speed: f64) {
        self.state().set_speed(speed, Instant::now());
    }

    pub fn set_loop(&self, looping: bool) {
        self.state().set_loop(looping, Instant::now());
    }

    pub fn loop_enabled(&self) -> bool {
        self.state().looping()
    }

    pub fn is_paused(&self) -> bool {
        !self
            .state()
            .playhead()
            .is_some_and(|playhead| playhead.is_playing())
    }

    pub fn current_frame(&self) -> Option<f64> {
        self.state()
            .playhead()
            .map(|playhead| playhead.position_at(Instant::now()))
    }

    pub fn total_frames(&self) -> Option<f64> {
        self.state()
            .playhead()
            .map(|playhead| f64::from(playhead.total_frames()))
    }

    fn to_frame(&self, state: &PlaybackState, value: f64, is_frame: bool) -> Result<f64> {
        if is_frame {
            return Ok(value);
        }
        let document = state.document().ok_or(RenderError::NotLoaded)?;
        Ok(value / 1000.0 * document.frame_rate)
    }

    fn state(&self) -> MutexGuard<'_, PlaybackState> {
        lock(&self.state)
    }

    fn emit(&self, event: &AnimationEvent) {
        let kind = event.kind();
        let pending = std::mem::take(&mut *lock(&self.listeners));
        let (matching, rest): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .partition(|(listener_kind, _)| *listener_kind == kind);
        lock(&self.listeners).extend(rest);
        for (_, listener) in matching {
            listener(event);
        }
    }
}
