use std::sync::Arc;
use std::time::{Duration, Instant};

use machine::{
    AnimationContext, AnimationFile, Command, DotLottieEngine, EngineRef, Event,
    LottieWebEngine, Machine, MachineConfig, MachineEventReceiver, MachineHandle, MachineState,
    PlayerStatus, attach_player, spawn_machine_bridge,
};
use renderers::{AnimationItem, DotLottie, LoadOptions, pack_dotlottie};

const WAIT: Duration = Duration::from_secs(3);

fn lottie_json(frame_rate: u32, frames: u32) -> Vec<u8> {
    format!(r#"{{"v":"5.12.1","nm":"bridge","fr":{frame_rate},"ip":0,"op":{frames},"layers":[]}}"#)
        .into_bytes()
}

fn fast_bridge() -> (MachineHandle, MachineEventReceiver) {
    let config = MachineConfig {
        tick_interval_ms: 2,
        ..MachineConfig::default()
    };
    spawn_machine_bridge(Machine::new(config))
}

/// Loads `file` into the machine and one engine of each kind.
fn load_session(handle: &MachineHandle, file: AnimationFile) -> (EngineRef, EngineRef) {
    handle
        .send(Command::LoadFile {
            file: Some(file.clone()),
        })
        .expect("send load command");

    let dot = Arc::new(DotLottie::new());
    let web = Arc::new(AnimationItem::new(LoadOptions::default()));
    let dot_engine = EngineRef::new(DotLottieEngine::new(Arc::clone(&dot)));
    let web_engine = EngineRef::new(LottieWebEngine::new(Arc::clone(&web)));
    attach_player(handle, "dotlottie", &dot_engine);
    attach_player(handle, "lottie-web", &web_engine);

    let _ = dot.load(file.bytes());
    let _ = web.load(file.bytes());
    (dot_engine, web_engine)
}

fn wait_for(events: &MachineEventReceiver, mut predicate: impl FnMut(&Event) -> bool) -> Event {
    let deadline = Instant::now() + WAIT;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let event = events.recv_timeout(remaining).expect("expected event before deadline");
        if predicate(&event) {
            return event;
        }
    }
}

fn wait_for_context(
    events: &MachineEventReceiver,
    mut predicate: impl FnMut(&AnimationContext) -> bool,
) -> AnimationContext {
    let event = wait_for(events, |event| {
        matches!(event, Event::ContextChanged(context) if predicate(context))
    });
    match event {
        Event::ContextChanged(context) => context,
        other => panic!("expected context change, got {other:?}"),
    }
}

#[test]
fn individual_play_runs_to_stopped() {
    let (handle, events) = fast_bridge();
    let _engines = load_session(&handle, AnimationFile::new("short.json", lottie_json(200, 20)));
    wait_for_context(&events, |context| context.players.len() == 2);

    handle
        .send(Command::Play {
            id: String::from("dotlottie"),
        })
        .expect("send play");

    let mut progressed = false;
    wait_for(&events, |event| match event {
        Event::ContextChanged(context) => {
            progressed |= context
                .players
                .get("dotlottie")
                .is_some_and(|state| state.current_time > 0);
            false
        }
        Event::StateChanged { to, .. } => *to == MachineState::Stopped,
    });

    assert!(progressed, "progress should be reported before the end");
}

#[test]
fn global_play_end_keeps_machine_playing() {
    let (handle, events) = fast_bridge();
    let _engines = load_session(&handle, AnimationFile::new("short.json", lottie_json(200, 20)));
    wait_for_context(&events, |context| context.players.len() == 2);

    handle.send(Command::PlayAll).expect("send play all");

    let context = wait_for_context(&events, |context| {
        context
            .players
            .iter()
            .all(|(_, state)| state.status == PlayerStatus::Stopped)
    });
    assert!(context.players.iter().all(|(_, state)| !state.is_playing));

    handle.send(Command::StopAll).expect("send stop all");
    let event = wait_for(&events, |event| matches!(event, Event::StateChanged { .. }));
    assert_eq!(
        event,
        Event::StateChanged {
            from: MachineState::Playing,
            to: MachineState::Ready,
        }
    );
}

#[test]
fn deflated_archive_loads_in_dotlottie_and_errors_in_lottie_web() {
    let (handle, events) = fast_bridge();
    let archive = pack_dotlottie("a", &lottie_json(30, 60)).expect("archive should pack");
    let _engines = load_session(&handle, AnimationFile::new("a.lottie", archive));

    let context = wait_for_context(&events, |context| {
        context
            .players
            .get("lottie-web")
            .is_some_and(|state| state.status == PlayerStatus::Error)
            && context.players.contains("dotlottie")
    });

    let web = context.players.get("lottie-web").expect("lottie-web player");
    assert!(web.error.as_deref().is_some_and(|error| error.contains("lottie-web")));
    let dot = context.players.get("dotlottie").expect("dotlottie player");
    assert_eq!(dot.status, PlayerStatus::Ready);
    assert_eq!(dot.total_frames(), Some(60));
    assert_eq!(context.error, None);
}

#[test]
fn pause_stops_progress_reports() {
    let (handle, events) = fast_bridge();
    let (dot_engine, web_engine) =
        load_session(&handle, AnimationFile::new("long.json", lottie_json(30, 3_000)));
    wait_for_context(&events, |context| context.players.len() == 2);

    handle.send(Command::PlayAll).expect("send play all");
    wait_for_context(&events, |context| {
        context
            .players
            .iter()
            .any(|(_, state)| state.current_time > 0)
    });
    handle.send(Command::PauseAll).expect("send pause all");
    wait_for(&events, |event| {
        matches!(
            event,
            Event::StateChanged {
                to: MachineState::Paused,
                ..
            }
        )
    });

    while events.recv_timeout(Duration::from_millis(30)).is_ok() {}
    assert!(events.recv_timeout(Duration::from_millis(60)).is_err());
    drop((dot_engine, web_engine));
}
