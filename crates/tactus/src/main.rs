use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use tactus_core::{
    AsyncModule, ConfigManager, ModuleMessage, PlayerCommand, PlayerEvent, Settings,
};
use tactus_player::{waveform, PlayerModule};
use tokio::sync::mpsc;

mod sim;

use sim::{LogActuator, SimulatedPlayer};

/// Haptic playback demo: plays a media file on a simulated transport and
/// renders amplitude-driven haptic pulses to the log.
#[derive(Parser, Debug)]
#[command(name = "tactus")]
#[command(about = "Tactus haptic playback demo")]
struct Args {
    /// Media file to load
    media: PathBuf,

    /// Path to the config file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Disable haptic pulses
    #[arg(long)]
    no_haptics: bool,
}

/// Render envelope bars as a one-line sparkline.
fn sparkline(bars: &[f32], width: usize) -> String {
    const GLYPHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    if bars.is_empty() || width == 0 {
        return String::new();
    }
    (0..width)
        .map(|i| {
            let idx = i * bars.len() / width;
            let level = (bars[idx] * 7.0).round() as usize;
            GLYPHS[level.min(7)]
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = ConfigManager::new(Some(args.config));
    let mut settings = config.load().unwrap_or_else(|e| {
        log::warn!("Falling back to default settings: {}", e);
        Settings::default()
    });
    if args.no_haptics {
        settings.haptics_enabled = false;
    }

    println!("Tactus Haptic Playback Demo");
    println!("===========================");
    println!("File: {}", args.media.display());
    println!(
        "Envelope: {} bars, pulse spacing >= {}ms, haptics {}",
        settings.envelope_bars,
        settings.min_pulse_interval_ms,
        if settings.haptics_enabled { "on" } else { "off" }
    );

    let mut module = PlayerModule::new(
        Box::new(SimulatedPlayer::new()),
        Box::new(LogActuator),
        settings,
    );
    let session = module.session_handle();

    module
        .initialize()
        .await
        .map_err(|e| anyhow::anyhow!("initialization failed: {}", e))?;

    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (msg_tx, mut msg_rx) = mpsc::channel(256);
    let run = tokio::spawn(async move { module.run(cmd_rx, msg_tx).await });

    cmd_tx
        .send(PlayerCommand::LoadAsset {
            path: args.media.clone(),
        })
        .await?;
    cmd_tx.send(PlayerCommand::Play).await?;

    // While the envelope is still being analyzed the scrubber would show
    // this placeholder
    println!(
        "\nanalyzing {}",
        sparkline(&waveform::placeholder(waveform::PLACEHOLDER_BARS), 60)
    );

    let mut last_progress_print = Instant::now();
    while let Some(message) = msg_rx.recv().await {
        match message {
            ModuleMessage::Event(event) => match event {
                PlayerEvent::AssetLoaded { info } => {
                    println!(
                        "Loaded {} ({:.2}s, {} Hz, {} channels)",
                        info.display_name(),
                        info.duration_seconds,
                        info.sample_rate,
                        info.channels
                    );
                }
                PlayerEvent::AssetFailed { message } => {
                    eprintln!("Asset failed to load: {}", message);
                    cmd_tx.send(PlayerCommand::Shutdown).await?;
                }
                PlayerEvent::EnvelopeProgress { fraction } => {
                    log::debug!("Analyzing audio... {:.0}%", fraction * 100.0);
                }
                PlayerEvent::EnvelopeReady { bars } => {
                    println!("waveform  {}  ({} bars)", sparkline(&bars, 60), bars.len());
                }
                PlayerEvent::PositionUpdated {
                    position_seconds, ..
                } => {
                    if last_progress_print.elapsed() >= Duration::from_secs(1) {
                        last_progress_print = Instant::now();
                        let duration = session.read().duration_seconds;
                        println!("  {:6.2}s / {:.2}s", position_seconds, duration);
                    }
                }
                PlayerEvent::Finished => {
                    println!("Playback finished");
                    cmd_tx.send(PlayerCommand::Shutdown).await?;
                }
                PlayerEvent::HapticsUnavailable { message } => {
                    log::warn!("Haptics unavailable: {}", message);
                }
                PlayerEvent::Error { message } => {
                    log::warn!("{}", message);
                }
                PlayerEvent::PulseFired { .. } | PlayerEvent::TransportChanged { .. } => {}
            },
            ModuleMessage::Status(status) => {
                log::info!("{}", status);
                break;
            }
            ModuleMessage::Error(error) => {
                log::error!("{}", error);
            }
        }
    }

    run.await?
        .map_err(|e| anyhow::anyhow!("player module failed: {}", e))?;

    let session = session.read();
    println!(
        "Session ended: {:?} at {:.2}s",
        session.state, session.position_seconds
    );

    Ok(())
}
