use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tracing::debug;

use crate::clock::PlaybackState;
use crate::document::{AnimationDocument, SourceFormat, probe_document};
use crate::error::{RenderError, Result};

/// Outcome passed to load listeners.
pub type LoadOutcome = Result<()>;

/// One-shot listener fired with the next load outcome.
pub type LoadListener = Box<dyn FnOnce(&LoadOutcome) + Send>;

/// Headless dotLottie player.
///
/// Accepts plain Lottie JSON as well as dotLottie archives. All methods take
/// `&self` so one player can be shared between the control thread and the
/// progress readers.
pub struct DotLottie {
    state: Mutex<PlaybackState>,
    outcome: Mutex<Option<LoadOutcome>>,
    listeners: Mutex<Vec<LoadListener>>,
}

impl Default for DotLottie {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DotLottie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DotLottie")
            .field("state", &*self.state())
            .finish_non_exhaustive()
    }
}

impl DotLottie {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PlaybackState::new(1.0, false)),
            outcome: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Loads animation bytes and notifies pending load listeners.
    ///
    /// # Example
    /// ```
    /// use renderers::DotLottie;
    ///
    /// let player = DotLottie::new();
    /// player
    ///     .load(br#"{"fr":30,"ip":0,"op":60}"#)
    ///     .expect("valid animation");
    /// assert_eq!(player.total_frames(), Some(60));
    /// ```
    pub fn load(&self, bytes: &[u8]) -> Result<()> {
        let probed = probe_document(bytes);
        let outcome = probed.as_ref().map(|_| ()).map_err(|error| error.clone());
        match &probed {
            Ok((format, document)) => debug!(
                %format,
                total_frames = document.total_frames(),
                "dotLottie animation loaded"
            ),
            Err(error) => debug!(%error, "dotLottie load failed"),
        }

        self.state().finish_load(probed);
        *lock(&self.outcome) = Some(outcome.clone());
        self.notify(&outcome);
        outcome
    }

    /// Registers a listener for the load outcome.
    ///
    /// Fires immediately when a load already finished.
    pub fn add_load_listener(&self, listener: LoadListener) {
        let finished = lock(&self.outcome).clone();
        match finished {
            Some(outcome) => listener(&outcome),
            None => lock(&self.listeners).push(listener),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.state().is_loaded()
    }

    pub fn load_error(&self) -> Option<RenderError> {
        self.state().load_error().cloned()
    }

    pub fn source_format(&self) -> Option<SourceFormat> {
        self.state().format()
    }

    pub fn document(&self) -> Option<AnimationDocument> {
        self.state().document().cloned()
    }

    pub fn play(&self) -> Result<()> {
        self.state().playhead_mut()?.play(Instant::now());
        Ok(())
    }

    pub fn pause(&self) -> Result<()> {
        self.state().playhead_mut()?.pause(Instant::now());
        Ok(())
    }

    /// Pauses and rewinds to the first frame.
    pub fn stop(&self) -> Result<()> {
        self.state().playhead_mut()?.stop();
        Ok(())
    }

    pub fn set_frame(&self, frame: f64) -> Result<()> {
        self.state().playhead_mut()?.seek(frame, Instant::now());
        Ok(())
    }

    pub fn set_speed(&self, speed: f64) {
        self.state().set_speed(speed, Instant::now());
    }

    pub fn speed(&self) -> f64 {
        self.state().speed()
    }

    pub fn set_loop(&self, looping: bool) {
        self.state().set_loop(looping, Instant::now());
    }

    pub fn loop_enabled(&self) -> bool {
        self.state().looping()
    }

    pub fn is_playing(&self) -> bool {
        self.state()
            .playhead()
            .is_some_and(|playhead| playhead.is_playing())
    }

    pub fn current_frame(&self) -> Option<f64> {
        self.state()
            .playhead()
            .map(|playhead| playhead.position_at(Instant::now()))
    }

    pub fn total_frames(&self) -> Option<u32> {
        self.state().playhead().map(|playhead| playhead.total_frames())
    }

    fn state(&self) -> MutexGuard<'_, PlaybackState> {
        lock(&self.state)
    }

    fn notify(&self, outcome: &LoadOutcome) {
        let listeners = std::mem::take(&mut *lock(&self.listeners));
        for listener in listeners {
            listener(outcome);
        }
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::DotLottie;
    use crate::archive::pack_dotlottie;
    use crate::document::SourceFormat;
    use crate::error::RenderError;

    const DOC: &[u8] = br#"{"fr":30,"ip":0,"op":90}"#;

    #[test]
    fn controls_before_load_report_not_loaded() {
        let player = DotLottie::new();

        assert_eq!(player.play(), Err(RenderError::NotLoaded));
        assert_eq!(player.set_frame(3.0), Err(RenderError::NotLoaded));
        assert_eq!(player.current_frame(), None);
        assert_eq!(player.total_frames(), None);
    }

    #[test]
    fn speed_and_loop_configured_before_load_are_kept() {
        let player = DotLottie::new();
        player.set_speed(1.5);
        player.set_loop(true);

        player.load(DOC).expect("load should succeed");

        assert_eq!(player.speed(), 1.5);
        assert!(player.loop_enabled());
    }

    #[test]
    fn archive_sources_are_decoded() {
        let player = DotLottie::new();
        let archive = pack_dotlottie("a", DOC).expect("archive should pack");

        player.load(&archive).expect("archive should load");

        assert_eq!(player.source_format(), Some(SourceFormat::DotLottieArchive));
        assert_eq!(player.total_frames(), Some(90));
    }

    #[test]
    fn stop_rewinds_to_first_frame() {
        let player = DotLottie::new();
        player.load(DOC).expect("load should succeed");
        player.set_frame(42.0).expect("seek should succeed");
        player.play().expect("play should succeed");

        player.stop().expect("stop should succeed");

        assert_eq!(player.current_frame(), Some(0.0));
        assert!(!player.is_playing());
    }

    #[test]
    fn load_listener_fires_once_with_outcome() {
        let player = DotLottie::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&calls);
        player.add_load_listener(Box::new(move |outcome| {
            seen.lock().expect("lock calls").push(outcome.is_ok());
        }));

        player.load(DOC).expect("first load");
        player.load(DOC).expect("second load");

        assert_eq!(*calls.lock().expect("lock calls"), vec![true]);
    }

    #[test]
    fn listener_added_after_failed_load_sees_error() {
        let player = DotLottie::new();
        let _ = player.load(b"not json");
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&calls);

        player.add_load_listener(Box::new(move |outcome| {
            seen.lock().expect("lock calls").push(outcome.clone());
        }));

        let calls = calls.lock().expect("lock calls");
        assert_eq!(calls.len(), 1);
        assert!(matches!(calls[0], Err(RenderError::InvalidDocument { .. })));
        assert!(player.load_error().is_some());
    }
}
