//! Drowsiness Monitor - Main Entry Point

use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use alerting::{default_player, platform_fallback, AudioAlert, SoundResource};
use anyhow::{Context, Result};
use camera_capture::{FrameSource, ImageSequence};
use clap::Parser;
use dms::DmsModule;
use drowsiness_monitor::preview::open_preview;
use drowsiness_monitor::{
    init_logging, run_session, watch_interrupts, Cli, SessionSummary, Settings,
};
use tracing::{error, info};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    cli.apply(&mut settings);
    init_logging(&settings.logging);

    info!("=== Drowsiness Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    match run(&cli, &settings) {
        Ok(summary) => {
            info!(
                "Session finished ({:?}): {} frames, {} alert(s), longest closed run {} frames",
                summary.exit_reason,
                summary.frames_processed,
                summary.alerts_fired,
                summary.longest_closed_run
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, settings: &Settings) -> Result<SessionSummary> {
    settings.validate().context("invalid configuration")?;

    // Everything below must succeed before the first frame is read
    let detector = dms::load_detector(&settings.dms).context("failed to load detector models")?;
    let mut module = DmsModule::new(&settings.dms, detector)?;

    let sound = SoundResource::load(&settings.alert.sound_path)
        .context("failed to load alert sound")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("alert")
        .enable_all()
        .build()
        .context("failed to start alert runtime")?;

    let alert = AudioAlert::new(
        runtime.handle().clone(),
        sound,
        default_player(),
        platform_fallback(&settings.alert),
    );

    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);
    runtime.spawn(async move {
        if watch_interrupts(tokio::signal::ctrl_c, &stop_flag).await {
            eprintln!("interrupted twice, exiting");
            std::process::exit(130);
        }
    });

    let source: Box<dyn FrameSource> = match &cli.replay {
        Some(dir) => Box::new(ImageSequence::open(dir).context("failed to open replay directory")?),
        None => settings.camera.open().context("failed to open camera")?,
    };
    let mut preview = open_preview(&settings.preview).context("failed to open preview")?;

    info!("Monitoring started");
    let result = run_session(source, &mut module, &alert, preview.as_mut(), &stop);

    drop(preview);
    // Detached alert playback must not hold the process open
    runtime.shutdown_background();

    Ok(result?)
}
