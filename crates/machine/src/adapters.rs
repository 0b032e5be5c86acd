//! Adapters from the concrete renderers to [`PlayerEngine`].

use std::sync::{Arc, Mutex, PoisonError};

use renderers::{AnimationEvent, AnimationEventKind, AnimationItem, DotLottie, RenderError};
use tracing::debug;

use crate::engine::{EngineKind, LoadHook, PlayerEngine};

fn log_failure(kind: EngineKind, action: &'static str, result: Result<(), RenderError>) {
    if let Err(error) = result {
        debug!(engine = %kind, action, %error, "engine command failed");
    }
}

/// Drives a [`DotLottie`] player.
#[derive(Debug, Clone)]
pub struct DotLottieEngine {
    player: Arc<DotLottie>,
}

impl DotLottieEngine {
    pub fn new(player: Arc<DotLottie>) -> Self {
        Self { player }
    }

    pub fn player(&self) -> &Arc<DotLottie> {
        &self.player
    }
}

impl PlayerEngine for DotLottieEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::DotLottie
    }

    fn play(&self) {
        log_failure(self.kind(), "play", self.player.play());
    }

    fn pause(&self) {
        log_failure(self.kind(), "pause", self.player.pause());
    }

    fn stop(&self) {
        log_failure(self.kind(), "stop", self.player.stop());
    }

    fn set_frame(&self, frame: u32) {
        log_failure(self.kind(), "set_frame", self.player.set_frame(f64::from(frame)));
    }

    fn set_speed(&self, speed: f64) {
        self.player.set_speed(speed);
    }

    fn set_loop(&self, looping: bool) {
        self.player.set_loop(looping);
    }

    fn current_frame(&self) -> Option<f64> {
        self.player.current_frame()
    }

    fn total_frames(&self) -> Option<u32> {
        self.player.total_frames()
    }

    fn is_looping(&self) -> bool {
        self.player.loop_enabled()
    }

    fn on_load(&self, hook: LoadHook) {
        self.player.add_load_listener(Box::new(move |outcome| {
            hook(outcome.clone().map_err(|error| error.to_string()));
        }));
    }
}

/// Drives a lottie-web [`AnimationItem`].
#[derive(Debug, Clone)]
pub struct LottieWebEngine {
    item: Arc<AnimationItem>,
}

impl LottieWebEngine {
    pub fn new(item: Arc<AnimationItem>) -> Self {
        Self { item }
    }

    pub fn item(&self) -> &Arc<AnimationItem> {
        &self.item
    }
}

impl PlayerEngine for LottieWebEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::LottieWeb
    }

    fn play(&self) {
        log_failure(self.kind(), "play", self.item.play());
    }

    fn pause(&self) {
        log_failure(self.kind(), "pause", self.item.pause());
    }

    fn stop(&self) {
        log_failure(self.kind(), "stop", self.item.stop());
    }

    /// Seeks without changing whether the item is playing.
    fn set_frame(&self, frame: u32) {
        let frame = f64::from(frame);
        let result = if self.item.is_paused() {
            self.item.go_to_and_stop(frame, true)
        } else {
            self.item.go_to_and_play(frame, true)
        };
        log_failure(self.kind(), "set_frame", result);
    }

    fn set_speed(&self, speed: f64) {
        self.item.set_speed(speed);
    }

    fn set_loop(&self, looping: bool) {
        self.item.set_loop(looping);
    }

    fn current_frame(&self) -> Option<f64> {
        self.item.current_frame()
    }

    fn total_frames(&self) -> Option<u32> {
        self.item.total_frames().map(|total| total.round() as u32)
    }

    fn is_looping(&self) -> bool {
        self.item.loop_enabled()
    }

    /// Whichever of `DomLoaded` and `DataFailed` comes first consumes the
    /// hook.
    fn on_load(&self, hook: LoadHook) {
        let shared = Arc::new(Mutex::new(Some(hook)));
        let take = |shared: &Arc<Mutex<Option<LoadHook>>>| {
            shared
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take()
        };

        let on_loaded = Arc::clone(&shared);
        self.item.add_event_listener(
            AnimationEventKind::DomLoaded,
            Box::new(move |_| {
                if let Some(hook) = take(&on_loaded) {
                    hook(Ok(()));
                }
            }),
        );
        let on_failed = shared;
        self.item.add_event_listener(
            AnimationEventKind::DataFailed,
            Box::new(move |event| {
                if let Some(hook) = take(&on_failed) {
                    let message = match event {
                        AnimationEvent::DataFailed(error) => error.to_string(),
                        AnimationEvent::DomLoaded => String::from("load failed"),
                    };
                    hook(Err(message));
                }
            }),
        );
    }
}
