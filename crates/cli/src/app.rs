use std::time::{Duration, Instant};

use machine::{
    AnimationContext, Command, Event, MachineEventReceiver, MachineHandle, MachineSnapshot,
    MachineState,
};
use tracing::info;

use crate::script::Step;

const SETTLE_TIMEOUT: Duration = Duration::from_millis(50);

/// Driver-side view of the machine, rebuilt from bridge events.
pub struct AppState {
    handle: MachineHandle,
    events: MachineEventReceiver,
    state: MachineState,
    context: AnimationContext,
    status: String,
}

impl AppState {
    pub fn new(handle: MachineHandle, events: MachineEventReceiver) -> Self {
        Self {
            handle,
            events,
            state: MachineState::Idle,
            context: AnimationContext::default(),
            status: String::from("starting machine bridge"),
        }
    }

    pub fn handle(&self) -> &MachineHandle {
        &self.handle
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn snapshot(&self) -> MachineSnapshot {
        MachineSnapshot::new(self.state, &self.context)
    }

    /// Sends one command and records it in the status line.
    pub fn send_command(&mut self, command: Command) -> bool {
        let name = command.name();
        match self.handle.send(command) {
            Ok(()) => {
                self.status = format!("{name} sent");
                true
            }
            Err(error) => {
                self.status = format!("error: {error}");
                false
            }
        }
    }

    /// Runs script steps in order, printing a snapshot for each `status`.
    pub fn run(&mut self, steps: Vec<Step>) -> anyhow::Result<()> {
        for step in steps {
            match step {
                Step::Send(command) => {
                    if !self.send_command(command) {
                        anyhow::bail!("{}", self.status);
                    }
                    self.settle();
                }
                Step::Wait(duration) => self.pump_for(duration),
                Step::Status => {
                    self.settle();
                    println!("{}", serde_json::to_string_pretty(&self.snapshot())?);
                }
            }
        }
        Ok(())
    }

    /// Applies events until the bridge stays quiet for a short while.
    pub fn settle(&mut self) {
        while let Ok(event) = self.events.recv_timeout(SETTLE_TIMEOUT) {
            self.apply_event(event);
        }
    }

    /// Applies events for `duration`, regardless of how busy the bridge is.
    pub fn pump_for(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.events.recv_timeout(remaining) {
                Ok(event) => self.apply_event(event),
                Err(_) => break,
            }
        }
    }

    pub fn apply_event(&mut self, event: Event) {
        match event {
            Event::StateChanged { from, to } => {
                info!(%from, %to, "machine state changed");
                self.state = to;
                self.status = match (to, self.context.error.as_deref()) {
                    (MachineState::Error, Some(error)) => format!("error: {error}"),
                    _ => format!("state: {to}"),
                };
            }
            Event::ContextChanged(context) => {
                if self.state == MachineState::Error {
                    if let Some(error) = context.error.as_deref() {
                        self.status = format!("error: {error}");
                    }
                }
                self.context = context;
            }
        }
    }
}
