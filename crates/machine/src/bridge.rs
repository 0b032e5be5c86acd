use std::thread;

use crossbeam_channel::{Receiver, Sender, bounded, select, unbounded};
use tracing::{debug, warn};

use crate::api::{Command, Event, Machine};
use crate::engine::EngineRef;
use crate::error::{MachineError, Result};
use crate::registry::PlayerId;

const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Receiver used by front ends to read events emitted by the machine thread.
pub type MachineEventReceiver = Receiver<Event>;

/// Cloneable sender of commands to the machine thread.
///
/// The dispatcher stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct MachineHandle {
    command_tx: Sender<Command>,
}

impl MachineHandle {
    pub fn send(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| MachineError::Disconnected)
    }
}

/// Runs `machine` on its own thread.
///
/// The dispatcher serialises external commands and tracker reports, so the
/// machine is only ever touched by one thread.
pub fn spawn_machine_bridge(mut machine: Machine) -> (MachineHandle, MachineEventReceiver) {
    let (command_tx, command_rx) = bounded::<Command>(COMMAND_CHANNEL_CAPACITY);
    let (event_tx, event_rx) = unbounded::<Event>();
    let reports = machine.tracker_reports();

    thread::spawn(move || {
        loop {
            let events = select! {
                recv(command_rx) -> command => match command {
                    Ok(command) => machine.dispatch(command),
                    Err(_) => break,
                },
                recv(reports) -> report => match report {
                    Ok(report) => machine.apply_report(report),
                    Err(_) => break,
                },
            };
            for event in events {
                if event_tx.send(event).is_err() {
                    return;
                }
            }
        }
        debug!(state = %machine.state(), "machine dispatcher stopped");
    });

    (MachineHandle { command_tx }, event_rx)
}

/// Registers `engine` as player `id` once its next load finishes.
///
/// A failed load still registers the player and then records the failure
/// on it, so the player shows its error instead of controls.
pub fn attach_player(handle: &MachineHandle, id: impl Into<PlayerId>, engine: &EngineRef) {
    let id = id.into();
    let handle = handle.clone();
    let weak = engine.downgrade();
    engine.on_load(Box::new(move |outcome| {
        let Some(engine) = weak.upgrade() else {
            return;
        };
        let mut commands = vec![Command::RegisterPlayer {
            id: id.clone(),
            engine,
        }];
        if let Err(error) = outcome {
            commands.push(Command::SetPlayerError {
                id: id.clone(),
                error,
            });
        }
        for command in commands {
            if let Err(error) = handle.send(command) {
                warn!(%id, %error, "player load result not delivered");
                return;
            }
        }
    }));
}
