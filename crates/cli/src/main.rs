mod app;
mod script;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use machine::{
    AnimationFile, Command, DotLottieEngine, EngineRef, LottieWebEngine, Machine, MachineConfig,
    attach_player, spawn_machine_bridge,
};
use renderers::{AnimationItem, DotLottie, LoadOptions};
use tracing::info;

use app::AppState;
use script::{Step, parse_script};

/// Previews one animation through a dotLottie and a lottie-web player.
#[derive(Parser, Debug)]
#[command(name = "lottie-preview", version)]
struct Cli {
    /// Animation file (.lottie or .json).
    file: PathBuf,

    /// Machine config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Control statements separated by `;` or newlines.
    #[arg(long, default_value = "status")]
    script: String,

    /// Overrides the progress tracking cadence.
    #[arg(long)]
    tick_ms: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => MachineConfig::load(path)?,
        None => MachineConfig::default(),
    };
    if let Some(tick_ms) = cli.tick_ms {
        config.tick_interval_ms = tick_ms;
    }
    let steps = parse_script(&cli.script, &config).context("parse --script")?;
    let file = AnimationFile::open(&cli.file)?;

    let (handle, events) = spawn_machine_bridge(Machine::new(config));
    let mut app = AppState::new(handle, events);
    app.run(vec![Step::Send(Command::LoadFile {
        file: Some(file.clone()),
    })])?;

    let dotlottie = Arc::new(DotLottie::new());
    let lottie_web = Arc::new(AnimationItem::new(LoadOptions::default()));
    let engines = [
        (
            "dotlottie",
            EngineRef::new(DotLottieEngine::new(Arc::clone(&dotlottie))),
        ),
        (
            "lottie-web",
            EngineRef::new(LottieWebEngine::new(Arc::clone(&lottie_web))),
        ),
    ];
    for (id, engine) in &engines {
        attach_player(app.handle(), *id, engine);
    }
    // Load failures reach the players through their load hooks.
    let _ = dotlottie.load(file.bytes());
    let _ = lottie_web.load(file.bytes());
    app.settle();
    info!(players = app.snapshot().players.len(), "engines attached");

    app.run(steps)?;
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
