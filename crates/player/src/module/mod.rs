//! Player module: async orchestration of playback, analysis, and haptics.
//!
//! Owns the playback session and runs the interactive loop: commands in,
//! events out, a ~30 Hz clock tick in between. Extraction and reduction run
//! on a blocking worker and hand back immutable envelopes tagged with the
//! session generation; stale results are discarded on arrival.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use tactus_core::{
    ActuatorSignal, AsyncModule, FileAssetSource, HapticActuator, MediaAssetSource, MediaPlayer,
    ModuleId, ModuleMessage, PlayerCommand, PlayerEvent, Settings,
};
use tokio::sync::mpsc;

use crate::analysis::{self, AmplitudeEnvelope};
use crate::haptics::{HapticEngine, TriggerPolicy};
use crate::session::{PlaybackSession, TransportState};

/// Updates handed back by a background analysis task.
#[derive(Debug)]
enum AnalysisUpdate {
    /// Extraction progress (0.0-1.0).
    Progress { generation: u64, fraction: f32 },
    /// The finished envelope.
    Complete {
        generation: u64,
        envelope: AmplitudeEnvelope,
    },
    /// Extraction failed; the session keeps an empty envelope.
    Failed { generation: u64, message: String },
}

/// Playback orchestrator.
pub struct PlayerModule {
    /// Session state; mutated only on the module's run loop, readable by
    /// the shell for display.
    session: Arc<RwLock<PlaybackSession>>,
    settings: Settings,
    player: Box<dyn MediaPlayer>,
    engine: HapticEngine,
    policy: TriggerPolicy,
    analysis_tx: mpsc::UnboundedSender<AnalysisUpdate>,
    analysis_rx: Option<mpsc::UnboundedReceiver<AnalysisUpdate>>,
}

impl PlayerModule {
    /// Create a new player module around the media player and actuator
    /// collaborators.
    pub fn new(
        player: Box<dyn MediaPlayer>,
        actuator: Box<dyn HapticActuator>,
        settings: Settings,
    ) -> Self {
        let (analysis_tx, analysis_rx) = mpsc::unbounded_channel();
        Self {
            session: Arc::new(RwLock::new(PlaybackSession::new())),
            policy: TriggerPolicy::from_settings(&settings),
            settings,
            player,
            engine: HapticEngine::new(actuator),
            analysis_tx,
            analysis_rx: Some(analysis_rx),
        }
    }

    /// Shared handle to the session for read-only display snapshots.
    pub fn session_handle(&self) -> Arc<RwLock<PlaybackSession>> {
        Arc::clone(&self.session)
    }

    /// Spawn extraction + reduction for the given generation on a blocking
    /// worker. Progress and the result come back over the analysis channel;
    /// the worker is never cancelled, its result is simply discarded if the
    /// asset changed in the meantime.
    fn spawn_analysis(&self, generation: u64, path: PathBuf) {
        let tx = self.analysis_tx.clone();
        let target_bars = self.settings.envelope_bars;

        tokio::task::spawn_blocking(move || {
            let mut last_decile = -1i32;
            let progress_tx = tx.clone();
            let result = analysis::extract_samples_with_progress(&path, |fraction| {
                // Throttle to one update per 10%
                let decile = (fraction * 10.0) as i32;
                if decile > last_decile {
                    last_decile = decile;
                    let _ = progress_tx.send(AnalysisUpdate::Progress {
                        generation,
                        fraction,
                    });
                }
            });

            match result {
                Ok(audio) => {
                    let envelope = AmplitudeEnvelope::reduce(&audio.samples, target_bars);
                    log::info!(
                        "Analysis complete: {} samples -> {} bars",
                        audio.samples.len(),
                        envelope.len()
                    );
                    let _ = tx.send(AnalysisUpdate::Complete {
                        generation,
                        envelope,
                    });
                }
                Err(e) => {
                    let _ = tx.send(AnalysisUpdate::Failed {
                        generation,
                        message: e.to_string(),
                    });
                }
            }
        });
    }

    /// Adopt or discard an analysis update against the live generation.
    fn apply_analysis_update(&mut self, update: AnalysisUpdate) -> Option<PlayerEvent> {
        let live_generation = self.session.read().generation;
        match update {
            AnalysisUpdate::Progress {
                generation,
                fraction,
            } => {
                if generation != live_generation {
                    return None;
                }
                Some(PlayerEvent::EnvelopeProgress { fraction })
            }
            AnalysisUpdate::Complete {
                generation,
                envelope,
            } => {
                if generation != live_generation {
                    log::debug!(
                        "Discarding stale envelope (generation {} superseded by {})",
                        generation,
                        live_generation
                    );
                    return None;
                }
                let bars = envelope.bars().to_vec();
                self.session.write().adopt_envelope(envelope);
                Some(PlayerEvent::EnvelopeReady { bars })
            }
            AnalysisUpdate::Failed {
                generation,
                message,
            } => {
                if generation != live_generation {
                    return None;
                }
                // Session keeps its empty envelope: waveform falls back to
                // the placeholder and haptics stay silent
                log::warn!("Audio analysis failed: {}", message);
                Some(PlayerEvent::Error { message })
            }
        }
    }

    /// Handle a shell command, returning the events to emit.
    fn handle_command(&mut self, command: PlayerCommand) -> Vec<PlayerEvent> {
        let mut events = Vec::new();
        match command {
            PlayerCommand::LoadAsset { path } => {
                let source = FileAssetSource::new(&path);
                match source.resolve() {
                    Ok(info) => {
                        let generation = {
                            let mut session = self.session.write();
                            session.load_asset(info.clone());
                            session.generation
                        };
                        self.player.load(&info);
                        log::info!(
                            "Loaded asset: {} ({:.2}s)",
                            info.display_name(),
                            info.duration_seconds
                        );
                        events.push(PlayerEvent::AssetLoaded { info });
                        if let Some(audio_path) = source.audio_path() {
                            self.spawn_analysis(generation, audio_path);
                        }
                    }
                    Err(e) => {
                        self.session.write().clear();
                        log::warn!("Asset load failed: {}", e);
                        events.push(PlayerEvent::AssetFailed {
                            message: e.to_string(),
                        });
                    }
                }
            }
            PlayerCommand::Play => {
                if self.settings.haptics_enabled {
                    // New playback start is the one sanctioned re-probe point
                    self.engine.ensure_started();
                }
                let (started, position) = {
                    let mut session = self.session.write();
                    (session.play(), session.position_seconds)
                };
                if started {
                    self.player.play();
                    events.push(PlayerEvent::TransportChanged {
                        playing: true,
                        position_seconds: position,
                    });
                }
            }
            PlayerCommand::Pause => {
                let (paused, position) = {
                    let mut session = self.session.write();
                    (session.pause(), session.position_seconds)
                };
                if paused {
                    self.player.pause();
                    events.push(PlayerEvent::TransportChanged {
                        playing: false,
                        position_seconds: position,
                    });
                }
            }
            PlayerCommand::PlayPause => {
                let playing = self.session.read().state.is_playing();
                let toggled = if playing {
                    PlayerCommand::Pause
                } else {
                    PlayerCommand::Play
                };
                events.extend(self.handle_command(toggled));
            }
            PlayerCommand::Seek { seconds } => {
                let duration = self.session.read().duration_seconds;
                if !self.session.read().state.has_asset() {
                    return events;
                }
                let target = seconds.clamp(0.0, duration);
                match self.player.seek(target) {
                    Ok(()) => {
                        let mut session = self.session.write();
                        session.seek_to(target);
                        events.push(PlayerEvent::PositionUpdated {
                            position_seconds: session.position_seconds,
                            progress: session.progress(),
                        });
                    }
                    Err(e) => {
                        // Position stays where it was; one attempt per action
                        log::warn!("{}", e);
                        events.push(PlayerEvent::Error {
                            message: e.to_string(),
                        });
                    }
                }
            }
            PlayerCommand::Replay => {
                if self.session.read().state != TransportState::Finished {
                    return events;
                }
                match self.player.seek(0.0) {
                    Ok(()) => {
                        {
                            let mut session = self.session.write();
                            session.replay();
                        }
                        if self.settings.haptics_enabled {
                            self.engine.ensure_started();
                        }
                        self.player.play();
                        events.push(PlayerEvent::TransportChanged {
                            playing: true,
                            position_seconds: 0.0,
                        });
                    }
                    Err(e) => {
                        log::warn!("{}", e);
                        events.push(PlayerEvent::Error {
                            message: e.to_string(),
                        });
                    }
                }
            }
            PlayerCommand::BeginScrub => {
                let was_playing = {
                    let mut session = self.session.write();
                    let was_playing = session.state.is_playing();
                    session.begin_scrub();
                    was_playing
                };
                if was_playing {
                    self.player.pause();
                    events.push(PlayerEvent::TransportChanged {
                        playing: false,
                        position_seconds: self.session.read().position_seconds,
                    });
                }
            }
            PlayerCommand::ScrubTo { progress } => {
                let mut session = self.session.write();
                session.scrub_to(progress);
                events.push(PlayerEvent::PositionUpdated {
                    position_seconds: session.position_seconds,
                    progress: session.progress(),
                });
            }
            PlayerCommand::EndScrub => {
                if !self.session.read().scrubbing {
                    return events;
                }
                let position = self.session.read().position_seconds;
                if let Err(e) = self.player.seek(position) {
                    // Failed seek: fall back to wherever the player still is
                    log::warn!("{}", e);
                    self.session.write().seek_to(self.player.current_time());
                    events.push(PlayerEvent::Error {
                        message: e.to_string(),
                    });
                }
                let (resumed, position) = {
                    let mut session = self.session.write();
                    (session.end_scrub(), session.position_seconds)
                };
                if resumed {
                    if self.settings.haptics_enabled {
                        self.engine.ensure_started();
                    }
                    self.player.play();
                }
                events.push(PlayerEvent::TransportChanged {
                    playing: resumed,
                    position_seconds: position,
                });
            }
            PlayerCommand::SetHapticsEnabled { enabled } => {
                self.settings.haptics_enabled = enabled;
                self.session.write().last_pulse_at = None;
                if enabled {
                    self.engine.ensure_started();
                } else {
                    self.engine.stop();
                }
                log::info!("Haptics {}", if enabled { "enabled" } else { "disabled" });
            }
            PlayerCommand::Actuator(signal) => {
                self.engine.handle_signal(signal);
                // Hardware timing state is gone; never block the next pulse
                // on a stale timestamp
                self.session.write().last_pulse_at = None;
                if signal == ActuatorSignal::Stopped {
                    events.push(PlayerEvent::HapticsUnavailable {
                        message: "haptic engine stopped by system".into(),
                    });
                }
            }
            PlayerCommand::Shutdown => {
                // Intercepted by the run loop
            }
        }
        events
    }

    /// One playback clock tick: advance the session from the player's
    /// clock, detect end-of-media, and evaluate the haptic trigger policy.
    fn handle_tick(&mut self, now: Instant) -> Vec<PlayerEvent> {
        let mut events = Vec::new();

        let player_time = self.player.current_time();
        let reached_end = self.player.has_reached_end();

        let finished = {
            let mut session = self.session.write();
            if session.state != TransportState::Playing || session.scrubbing {
                false
            } else {
                let mut finished =
                    session.apply_tick(player_time, self.settings.end_epsilon_seconds);
                if !finished && reached_end {
                    session.finish();
                    finished = true;
                }
                finished
            }
        };

        if finished {
            self.player.pause();
            let position = self.session.read().position_seconds;
            events.push(PlayerEvent::Finished);
            events.push(PlayerEvent::TransportChanged {
                playing: false,
                position_seconds: position,
            });
            return events;
        }

        let (playing, position, progress) = {
            let session = self.session.read();
            (
                session.state.is_playing(),
                session.position_seconds,
                session.progress(),
            )
        };

        if playing {
            events.push(PlayerEvent::PositionUpdated {
                position_seconds: position,
                progress,
            });

            let available = self.settings.haptics_enabled && self.engine.is_available();
            let pulse = {
                let mut session = self.session.write();
                self.policy.evaluate(&mut session, available, now)
            };
            if let Some(pulse) = pulse {
                if self.engine.fire(pulse) {
                    events.push(PlayerEvent::PulseFired {
                        intensity: pulse.intensity,
                        sharpness: pulse.sharpness,
                    });
                } else {
                    events.push(PlayerEvent::HapticsUnavailable {
                        message: "haptic pulse playback failed".into(),
                    });
                }
            }
        }

        events
    }
}

#[async_trait]
impl AsyncModule for PlayerModule {
    fn id(&self) -> ModuleId {
        ModuleId::Player
    }

    async fn initialize(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        log::info!("Initializing player module");
        if self.settings.haptics_enabled {
            let available = self.engine.start();
            log::info!(
                "Haptic actuator {}",
                if available { "available" } else { "unavailable" }
            );
        }
        Ok(())
    }

    async fn run(
        &mut self,
        mut rx: mpsc::Receiver<PlayerCommand>,
        tx: mpsc::Sender<ModuleMessage>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        log::info!("Player module running");

        let mut analysis_rx = match self.analysis_rx.take() {
            Some(rx) => rx,
            None => {
                // A previous run consumed the receiver; start a fresh pair
                let (analysis_tx, analysis_rx) = mpsc::unbounded_channel();
                self.analysis_tx = analysis_tx;
                analysis_rx
            }
        };

        let mut tick =
            tokio::time::interval(Duration::from_millis(self.settings.tick_interval_ms.max(1)));

        loop {
            tokio::select! {
                Some(command) = rx.recv() => {
                    if matches!(command, PlayerCommand::Shutdown) {
                        log::info!("Player module received shutdown");
                        break;
                    }
                    let events = self.handle_command(command);
                    for event in events {
                        let _ = tx.send(ModuleMessage::Event(event)).await;
                    }
                }

                Some(update) = analysis_rx.recv() => {
                    if let Some(event) = self.apply_analysis_update(update) {
                        let _ = tx.send(ModuleMessage::Event(event)).await;
                    }
                }

                _ = tick.tick() => {
                    let events = self.handle_tick(Instant::now());
                    for event in events {
                        let _ = tx.send(ModuleMessage::Event(event)).await;
                    }
                }
            }
        }

        self.analysis_rx = Some(analysis_rx);
        let _ = tx
            .send(ModuleMessage::Status("player module stopped".to_string()))
            .await;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        log::info!("Shutting down player module");
        self.engine.stop();
        self.session.write().clear();
        Ok(())
    }

    fn status(&self) -> HashMap<String, String> {
        let session = self.session.read();

        let mut status = HashMap::new();
        status.insert("state".to_string(), format!("{:?}", session.state));
        status.insert(
            "position".to_string(),
            format!("{:.2}", session.position_seconds),
        );
        status.insert(
            "duration".to_string(),
            format!("{:.2}", session.duration_seconds),
        );
        status.insert(
            "envelope_bars".to_string(),
            session.envelope.len().to_string(),
        );
        status.insert(
            "haptics".to_string(),
            if self.engine.is_available() {
                "available".to_string()
            } else {
                "unavailable".to_string()
            },
        );
        status.insert(
            "asset".to_string(),
            session
                .asset
                .as_ref()
                .map(|a| a.display_name())
                .unwrap_or_else(|| "none".to_string()),
        );
        status
    }
}
