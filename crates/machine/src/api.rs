use crossbeam_channel::Receiver;
use tracing::{debug, info};

use crate::broadcast::{self, SeekDirection};
use crate::config::MachineConfig;
use crate::context::{AnimationContext, ControlSource, MachineState};
use crate::engine::EngineRef;
use crate::file::{AnimationFile, confirm_load, validate_file};
use crate::handlers;
use crate::registry::{PlayerId, PlayerState, Players};
use crate::snapshot::MachineSnapshot;
use crate::tracker::{ProgressTracker, TrackerReport};

/// Commands accepted by the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    LoadFile {
        file: Option<AnimationFile>,
    },
    /// Leaves `error` and clears the file and message.
    Retry,
    /// Attaches a loaded engine to a player.
    ///
    /// # Example
    /// ```ignore
    /// use machine::{Command, EngineRef, Machine, MachineConfig};
    ///
    /// let mut machine = Machine::new(MachineConfig::default());
    /// let _ = machine.dispatch(Command::RegisterPlayer {
    ///     id: String::from("dotlottie"),
    ///     engine: EngineRef::new(my_engine),
    /// });
    /// ```
    RegisterPlayer {
        id: PlayerId,
        engine: EngineRef,
    },
    Play {
        id: PlayerId,
    },
    Pause {
        id: PlayerId,
    },
    Stop {
        id: PlayerId,
    },
    Seek {
        id: PlayerId,
        frame: Option<u32>,
    },
    ToggleLoop {
        id: PlayerId,
    },
    SetSpeed {
        id: PlayerId,
        value: f64,
    },
    UpdateProgress {
        id: PlayerId,
        frame: Option<u32>,
    },
    AnimationEnded {
        id: PlayerId,
    },
    AnimationAllEnded {
        id: PlayerId,
    },
    PlayAll,
    PauseAll,
    StopAll,
    SeekAll {
        direction: SeekDirection,
    },
    SetGlobalSpeed {
        value: f64,
    },
    LoopAll,
    /// Records an engine failure on one player; an empty message clears it.
    SetPlayerError {
        id: PlayerId,
        error: String,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadFile { .. } => "LOAD_FILE",
            Self::Retry => "RETRY",
            Self::RegisterPlayer { .. } => "REGISTER_PLAYER",
            Self::Play { .. } => "PLAY",
            Self::Pause { .. } => "PAUSE",
            Self::Stop { .. } => "STOP",
            Self::Seek { .. } => "SEEK",
            Self::ToggleLoop { .. } => "TOGGLE_LOOP",
            Self::SetSpeed { .. } => "SET_SPEED",
            Self::UpdateProgress { .. } => "UPDATE_PROGRESS",
            Self::AnimationEnded { .. } => "ANIMATION_ENDED",
            Self::AnimationAllEnded { .. } => "ANIMATION_ALL_ENDED",
            Self::PlayAll => "PLAY_ALL",
            Self::PauseAll => "PAUSE_ALL",
            Self::StopAll => "STOP_ALL",
            Self::SeekAll { .. } => "SEEK_ALL",
            Self::SetGlobalSpeed { .. } => "SET_GLOBAL_SPEED",
            Self::LoopAll => "LOOP_ALL",
            Self::SetPlayerError { .. } => "SET_PLAYER_ERROR",
        }
    }
}

/// Events emitted by the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    StateChanged {
        from: MachineState,
        to: MachineState,
    },
    ContextChanged(AnimationContext),
}

/// Lifecycle state machine driving every attached player.
#[derive(Debug)]
pub struct Machine {
    config: MachineConfig,
    state: MachineState,
    context: AnimationContext,
    tracker: ProgressTracker,
    play_origin: ControlSource,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(MachineConfig::default())
    }
}

impl Machine {
    pub fn new(config: MachineConfig) -> Self {
        let tracker = ProgressTracker::new(config.tick_interval());
        Self {
            config,
            state: MachineState::Idle,
            context: AnimationContext::default(),
            tracker,
            play_origin: ControlSource::Individual,
        }
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn context(&self) -> &AnimationContext {
        &self.context
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn snapshot(&self) -> MachineSnapshot {
        MachineSnapshot::new(self.state, &self.context)
    }

    /// Reports produced by the progress tracker, to be fed back through
    /// [`Machine::apply_report`].
    pub fn tracker_reports(&self) -> Receiver<TrackerReport> {
        self.tracker.reports()
    }

    /// Generation of the running tracker, if tracking is active.
    pub fn tracking_generation(&self) -> Option<u64> {
        self.tracker
            .is_active()
            .then(|| self.tracker.generation())
    }

    /// Applies a tracker report unless it belongs to a cancelled generation.
    pub fn apply_report(&mut self, report: TrackerReport) -> Vec<Event> {
        if !self.tracker.is_current(&report) {
            debug!(
                generation = report.generation,
                command = report.command.name(),
                "stale tracker report dropped"
            );
            return Vec::new();
        }
        self.dispatch(report.command)
    }

    /// Applies one command and returns emitted events.
    ///
    /// Transient states resolve within the same call, so a valid
    /// `LOAD_FILE` from `idle` ends in `ready`. Commands the current state
    /// does not accept are ignored and produce no events.
    pub fn dispatch(&mut self, command: Command) -> Vec<Event> {
        let name = command.name();
        let from = self.state;
        let mut events = Vec::new();

        if !self.apply(command, &mut events) {
            debug!(state = %from, command = name, "command ignored");
            return Vec::new();
        }

        events.push(Event::ContextChanged(self.context.clone()));
        events
    }

    fn apply(&mut self, command: Command, events: &mut Vec<Event>) -> bool {
        use MachineState as S;

        match (self.state, command) {
            (S::Error, Command::Retry) => {
                self.context.file = None;
                self.context.error = None;
                self.enter(S::Idle, events);
            }
            (S::Error | S::Loading, _) => return false,

            (_, Command::LoadFile { file }) => self.load_file(file, events),
            (_, Command::RegisterPlayer { id, engine }) => self.register_player(id, engine),
            (_, Command::SetPlayerError { id, error }) => {
                if !self.context.players.contains(&id) {
                    return false;
                }
                self.context.players = handlers::set_error(&self.context.players, &id, &error);
                info!(%id, %error, "player error recorded");
            }
            (S::Idle, _) => return false,

            (S::Ready | S::Playing | S::Paused | S::Stopped, Command::Play { id })
                if self.is_controllable(&id) =>
            {
                self.context.players = handlers::play(&self.context.players, &id);
                self.drive(&id, |engine| engine.play());
                self.context.source = Some(ControlSource::Individual);
                self.enter_playing(ControlSource::Individual, events);
            }
            (S::Ready | S::Playing | S::Paused | S::Stopped, Command::PlayAll) => {
                self.context.players = broadcast::play_all(&self.context.players);
                self.drive_all(|engine, _| engine.play());
                self.context.source = Some(ControlSource::Global);
                self.enter_playing(ControlSource::Global, events);
            }

            (S::Ready | S::Playing | S::Paused, Command::Pause { id })
                if self.is_controllable(&id) =>
            {
                if self.state == S::Ready && !self.context.players.any_playing() {
                    return false;
                }
                self.context.players = handlers::pause(&self.context.players, &id);
                self.drive(&id, |engine| engine.pause());
                self.context.source = Some(ControlSource::Individual);
                self.enter(S::Paused, events);
            }
            (S::Ready | S::Playing | S::Paused, Command::PauseAll) => {
                if self.state == S::Ready && !self.context.players.any_playing() {
                    return false;
                }
                self.context.players = broadcast::pause_all(&self.context.players);
                self.drive_all(|engine, _| engine.pause());
                self.context.source = Some(ControlSource::Global);
                self.enter(S::Paused, events);
            }

            (S::Ready | S::Playing | S::Paused | S::Stopped, Command::Stop { id })
                if self.is_controllable(&id) =>
            {
                self.context.players = handlers::stop(&self.context.players, &id);
                self.drive(&id, |engine| engine.stop());
                self.context.source = Some(ControlSource::Individual);
                self.enter(S::Ready, events);
            }
            (S::Ready | S::Playing | S::Paused | S::Stopped, Command::StopAll) => {
                // Engines are paused, not stopped natively.
                self.context.players = broadcast::stop_all(&self.context.players);
                self.drive_all(|engine, _| engine.pause());
                self.context.source = Some(ControlSource::Global);
                self.enter(S::Ready, events);
            }

            (S::Ready | S::Playing | S::Paused, Command::Seek { id, frame })
                if self.is_controllable(&id) =>
            {
                self.context.players = handlers::seek(&self.context.players, &id, frame);
                let target = self.current_time(&id);
                self.drive(&id, |engine| engine.set_frame(target));
                self.context.source = Some(ControlSource::Individual);
            }
            (S::Ready | S::Playing | S::Paused, Command::UpdateProgress { id, frame })
                if self.is_controllable(&id) =>
            {
                self.context.players = handlers::update_progress(&self.context.players, &id, frame);
            }
            (S::Ready | S::Playing | S::Paused, Command::ToggleLoop { id })
                if self.is_controllable(&id) =>
            {
                self.context.players = handlers::toggle_loop(&self.context.players, &id);
                let looping = self
                    .context
                    .players
                    .get(&id)
                    .is_some_and(|state| state.is_looping);
                self.drive(&id, |engine| engine.set_loop(looping));
                self.context.source = Some(ControlSource::Individual);
            }
            (S::Ready | S::Playing | S::Paused, Command::SetSpeed { id, value })
                if self.is_controllable(&id) =>
            {
                self.context.players = handlers::set_speed(&self.context.players, &id, value);
                self.drive(&id, |engine| engine.set_speed(value));
                self.context.source = Some(ControlSource::Individual);
            }

            (S::Ready | S::Playing | S::Paused, Command::SeekAll { direction }) => {
                self.context.players = broadcast::seek_all(&self.context.players, direction);
                self.drive_all(|engine, state| engine.set_frame(state.current_time));
                self.context.source = Some(ControlSource::Global);
            }
            (S::Ready | S::Playing | S::Paused, Command::SetGlobalSpeed { value }) => {
                self.context.players = broadcast::set_global_speed(&self.context.players, value);
                self.drive_all(|engine, _| engine.set_speed(value));
                self.context.global_speed = value;
                self.context.source = Some(ControlSource::Global);
            }
            (S::Ready | S::Playing | S::Paused, Command::LoopAll) => {
                self.context.players = broadcast::loop_all(&self.context.players);
                self.drive_all(|engine, state| engine.set_loop(state.is_looping));
                self.context.is_looping = !self.context.is_looping;
                self.context.source = Some(ControlSource::Global);
            }

            (S::Playing, Command::AnimationEnded { id }) if self.is_controllable(&id) => {
                self.context.players = handlers::mark_ended(&self.context.players, &id);
                self.enter(S::Stopped, events);
            }
            // The machine keeps playing; only the finished player stops.
            (S::Playing, Command::AnimationAllEnded { id }) if self.is_controllable(&id) => {
                self.context.players = handlers::mark_ended(&self.context.players, &id);
            }

            _ => return false,
        }
        true
    }

    fn load_file(&mut self, file: Option<AnimationFile>, events: &mut Vec<Event>) {
        if self.state != MachineState::Idle {
            self.context.file = None;
            self.context.error = None;
            self.enter(MachineState::Idle, events);
        }

        match validate_file(file.as_ref(), &self.config) {
            Ok(file) => {
                info!(name = file.name(), size = file.size(), "animation file accepted");
                self.context.file = Some(file.clone());
                self.enter(MachineState::Loading, events);
            }
            Err(error) => {
                info!(%error, "animation file rejected");
                self.context.error = Some(error.to_string());
                self.enter(MachineState::Error, events);
            }
        }
    }

    fn register_player(&mut self, id: PlayerId, engine: EngineRef) {
        let previous = self.context.players.get(&id).cloned();
        self.context.players = self.context.players.register(id.clone(), engine.clone());

        let Some(state) = self.context.players.get(&id).cloned() else {
            return;
        };
        engine.set_speed(state.playback_speed);
        engine.set_loop(state.is_looping);
        engine.set_frame(state.current_time);

        let resume = self.state == MachineState::Playing
            && previous.is_some_and(|previous| previous.is_playing && !previous.has_error());
        if resume {
            self.context.players = handlers::play(&self.context.players, &id);
            engine.play();
            self.tracker.start(&self.context.players, self.play_origin);
        }
        info!(%id, engine = %engine.kind(), resume, "player registered");
    }

    /// Enters `playing`, restarting tracking even when already there.
    fn enter_playing(&mut self, origin: ControlSource, events: &mut Vec<Event>) {
        self.play_origin = origin;
        self.enter(MachineState::Playing, events);
    }

    fn enter(&mut self, to: MachineState, events: &mut Vec<Event>) {
        let from = self.state;
        if from == MachineState::Playing {
            self.tracker.cancel();
        }
        self.state = to;
        if from != to {
            info!(%from, %to, "state changed");
            events.push(Event::StateChanged { from, to });
        }

        match to {
            MachineState::Idle => {
                let valid = validate_file(self.context.file.as_ref(), &self.config).is_ok();
                if valid {
                    self.enter(MachineState::Ready, events);
                }
            }
            MachineState::Loading => match confirm_load(self.context.file.as_ref()) {
                Ok(_) => {
                    self.context.error = None;
                    self.enter(MachineState::Ready, events);
                }
                Err(error) => {
                    self.context.file = None;
                    self.context.error = Some(error.to_string());
                    self.enter(MachineState::Error, events);
                }
            },
            MachineState::Playing => {
                self.tracker.start(&self.context.players, self.play_origin);
            }
            _ => {}
        }
    }

    /// Individual commands only reach registered players without an error.
    fn is_controllable(&self, id: &str) -> bool {
        self.context
            .players
            .get(id)
            .is_some_and(|state| !state.has_error())
    }

    fn current_time(&self, id: &str) -> u32 {
        self.context
            .players
            .get(id)
            .map_or(0, |state| state.current_time)
    }

    /// Forwards a command to one controllable player's engine.
    fn drive(&self, id: &str, action: impl FnOnce(&EngineRef)) {
        if let Some(engine) = controllable_engine(&self.context.players, id) {
            action(engine);
        }
    }

    /// Forwards a command to every controllable engine with its new record.
    fn drive_all(&self, mut action: impl FnMut(&EngineRef, &PlayerState)) {
        for (_, state) in self.context.players.iter() {
            if state.has_error() {
                continue;
            }
            if let Some(engine) = state.engine.as_ref() {
                action(engine, state);
            }
        }
    }
}

fn controllable_engine<'a>(players: &'a Players, id: &str) -> Option<&'a EngineRef> {
    players
        .get(id)
        .filter(|state| !state.has_error())
        .and_then(|state| state.engine.as_ref())
}
