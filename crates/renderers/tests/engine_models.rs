use std::thread;
use std::time::Duration;

use renderers::{
    AnimationItem, DotLottie, LoadOptions, RenderError, SourceFormat, pack_dotlottie,
    probe_document,
};

fn lottie_json(frame_rate: u32, frames: u32) -> Vec<u8> {
    format!(r#"{{"v":"5.12.1","nm":"sample","fr":{frame_rate},"ip":0,"op":{frames},"w":64,"h":64,"layers":[]}}"#)
        .into_bytes()
}

#[test]
fn both_engines_agree_on_total_frames_for_json() {
    let bytes = lottie_json(30, 120);
    let dot = DotLottie::new();
    let web = AnimationItem::new(LoadOptions::default());

    dot.load(&bytes).expect("dotLottie should load json");
    web.load(&bytes).expect("lottie-web should load json");

    assert_eq!(dot.total_frames(), Some(120));
    assert_eq!(web.total_frames(), Some(120.0));
}

#[test]
fn only_dotlottie_decodes_deflated_archives() {
    let archive = pack_dotlottie("sample", &lottie_json(60, 30)).expect("archive should pack");

    let (format, document) = probe_document(&archive).expect("archive should probe");
    assert_eq!(format, SourceFormat::DotLottieArchive);
    assert_eq!(document.name.as_deref(), Some("sample"));

    let dot = DotLottie::new();
    dot.load(&archive).expect("dotLottie should load archive");
    assert_eq!(dot.total_frames(), Some(30));

    let web = AnimationItem::new(LoadOptions::default());
    assert!(matches!(
        web.load(&archive),
        Err(RenderError::UnsupportedFormat { .. })
    ));
}

#[test]
fn playing_engine_advances_and_pause_holds_position() {
    let dot = DotLottie::new();
    dot.load(&lottie_json(1_000, 100_000))
        .expect("dotLottie should load json");

    dot.play().expect("play should succeed");
    thread::sleep(Duration::from_millis(30));
    dot.pause().expect("pause should succeed");

    let paused_at = dot.current_frame().expect("frame available after load");
    assert!(paused_at > 0.0, "playhead must advance while playing");

    thread::sleep(Duration::from_millis(20));
    assert_eq!(dot.current_frame(), Some(paused_at));
}

#[test]
fn one_shot_engine_stops_on_last_frame() {
    let web = AnimationItem::new(LoadOptions::default());
    web.load(&lottie_json(1_000, 10))
        .expect("lottie-web should load json");

    web.play().expect("play should succeed");
    thread::sleep(Duration::from_millis(40));

    assert_eq!(web.current_frame(), Some(9.0));
}
