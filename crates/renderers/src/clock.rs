use std::time::Instant;

use crate::document::{AnimationDocument, SourceFormat};
use crate::error::{RenderError, Result};

/// Wall-clock playhead measured in (fractional) frames.
///
/// While playing, the position is `origin + elapsed * frame_rate * speed`.
/// Changing speed, loop mode or position re-anchors the clock so the frame
/// shown at that instant does not jump.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Playhead {
    total_frames: u32,
    frame_rate: f64,
    speed: f64,
    looping: bool,
    origin_frame: f64,
    anchor: Option<Instant>,
}

impl Playhead {
    pub(crate) fn new(total_frames: u32, frame_rate: f64, speed: f64, looping: bool) -> Self {
        Self {
            total_frames,
            frame_rate,
            speed,
            looping,
            origin_frame: 0.0,
            anchor: None,
        }
    }

    pub(crate) fn is_playing(&self) -> bool {
        self.anchor.is_some()
    }

    pub(crate) fn total_frames(&self) -> u32 {
        self.total_frames
    }

    pub(crate) fn position_at(&self, now: Instant) -> f64 {
        let Some(anchor) = self.anchor else {
            return self.origin_frame;
        };
        let elapsed = now.saturating_duration_since(anchor).as_secs_f64();
        self.wrap(self.origin_frame + elapsed * self.frame_rate * self.speed)
    }

    pub(crate) fn play(&mut self, now: Instant) {
        if self.anchor.is_some() {
            return;
        }
        // A finished one-shot animation starts over.
        if !self.looping && self.origin_frame >= self.last_frame() {
            self.origin_frame = 0.0;
        }
        self.anchor = Some(now);
    }

    pub(crate) fn pause(&mut self, now: Instant) {
        self.origin_frame = self.position_at(now);
        self.anchor = None;
    }

    pub(crate) fn stop(&mut self) {
        self.origin_frame = 0.0;
        self.anchor = None;
    }

    pub(crate) fn seek(&mut self, frame: f64, now: Instant) {
        self.origin_frame = frame.clamp(0.0, self.last_frame());
        if self.anchor.is_some() {
            self.anchor = Some(now);
        }
    }

    pub(crate) fn set_speed(&mut self, speed: f64, now: Instant) {
        self.rebase(now);
        self.speed = speed;
    }

    pub(crate) fn set_loop(&mut self, looping: bool, now: Instant) {
        self.rebase(now);
        self.looping = looping;
    }

    fn rebase(&mut self, now: Instant) {
        if self.anchor.is_some() {
            self.origin_frame = self.position_at(now);
            self.anchor = Some(now);
        }
    }

    fn last_frame(&self) -> f64 {
        f64::from(self.total_frames.saturating_sub(1))
    }

    fn wrap(&self, frame: f64) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        if self.looping {
            frame.rem_euclid(f64::from(self.total_frames))
        } else {
            frame.clamp(0.0, self.last_frame())
        }
    }
}

/// Load result and playback settings shared by both engine models.
///
/// Speed and loop mode may be configured before a document is loaded; they
/// are carried into the playhead once it exists.
#[derive(Debug, Clone)]
pub(crate) struct PlaybackState {
    speed: f64,
    looping: bool,
    loaded: Option<Loaded>,
    load_error: Option<RenderError>,
}

#[derive(Debug, Clone)]
struct Loaded {
    format: SourceFormat,
    document: AnimationDocument,
    playhead: Playhead,
}

impl PlaybackState {
    pub(crate) fn new(speed: f64, looping: bool) -> Self {
        Self {
            speed,
            looping,
            loaded: None,
            load_error: None,
        }
    }

    pub(crate) fn finish_load(&mut self, outcome: Result<(SourceFormat, AnimationDocument)>) {
        match outcome {
            Ok((format, document)) => {
                let playhead = Playhead::new(
                    document.total_frames(),
                    document.frame_rate,
                    self.speed,
                    self.looping,
                );
                self.loaded = Some(Loaded {
                    format,
                    document,
                    playhead,
                });
                self.load_error = None;
            }
            Err(error) => {
                self.loaded = None;
                self.load_error = Some(error);
            }
        }
    }

    pub(crate) fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub(crate) fn load_error(&self) -> Option<&RenderError> {
        self.load_error.as_ref()
    }

    pub(crate) fn format(&self) -> Option<SourceFormat> {
        self.loaded.as_ref().map(|loaded| loaded.format)
    }

    pub(crate) fn document(&self) -> Option<&AnimationDocument> {
        self.loaded.as_ref().map(|loaded| &loaded.document)
    }

    pub(crate) fn speed(&self) -> f64 {
        self.speed
    }

    pub(crate) fn looping(&self) -> bool {
        self.looping
    }

    pub(crate) fn set_speed(&mut self, speed: f64, now: Instant) {
        self.speed = speed;
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.playhead.set_speed(speed, now);
        }
    }

    pub(crate) fn set_loop(&mut self, looping: bool, now: Instant) {
        self.looping = looping;
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.playhead.set_loop(looping, now);
        }
    }

    pub(crate) fn playhead(&self) -> Option<&Playhead> {
        self.loaded.as_ref().map(|loaded| &loaded.playhead)
    }

    pub(crate) fn playhead_mut(&mut self) -> Result<&mut Playhead> {
        self.loaded
            .as_mut()
            .map(|loaded| &mut loaded.playhead)
            .ok_or(RenderError::NotLoaded)
    }
}
