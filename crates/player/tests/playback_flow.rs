//! End-to-end playback flow tests.
//!
//! Drives the player module through load → analyze → play → pause with a
//! simulated media clock and a recording actuator, checking that the
//! envelope arrives and pulses keep their minimum spacing.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tactus_core::{
    AssetInfo, AsyncModule, HapticActuator, HapticError, HapticPulse, MediaPlayer, ModuleMessage,
    PlayerCommand, PlayerEvent, SeekError, Settings,
};
use tactus_player::PlayerModule;
use tokio::sync::mpsc;

/// Write a minimal mono 16-bit PCM WAV file.
fn write_wav(path: &Path, samples: &[i16], sample_rate: u32) {
    let data_len = (samples.len() * 2) as u32;
    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    for s in samples {
        bytes.extend_from_slice(&s.to_le_bytes());
    }
    fs::write(path, bytes).unwrap();
}

/// Wall-clock media transport standing in for the platform player.
struct SimPlayer {
    playing: bool,
    position: f64,
    duration: f64,
    resumed_at: Option<Instant>,
}

impl SimPlayer {
    fn new() -> Self {
        Self {
            playing: false,
            position: 0.0,
            duration: 0.0,
            resumed_at: None,
        }
    }

    fn clock(&self) -> f64 {
        match (self.playing, self.resumed_at) {
            (true, Some(at)) => self.position + at.elapsed().as_secs_f64(),
            _ => self.position,
        }
    }
}

impl MediaPlayer for SimPlayer {
    fn load(&mut self, info: &AssetInfo) {
        self.duration = info.duration_seconds;
        self.position = 0.0;
        self.playing = false;
        self.resumed_at = None;
    }

    fn play(&mut self) {
        if !self.playing {
            self.playing = true;
            self.resumed_at = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        self.position = self.clock().min(self.duration);
        self.playing = false;
        self.resumed_at = None;
    }

    fn seek(&mut self, seconds: f64) -> Result<(), SeekError> {
        if !(0.0..=self.duration).contains(&seconds) {
            return Err(SeekError::new(seconds, "position out of range"));
        }
        self.position = seconds;
        if self.playing {
            self.resumed_at = Some(Instant::now());
        }
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.clock().min(self.duration)
    }

    fn has_reached_end(&self) -> bool {
        self.duration > 0.0 && self.clock() >= self.duration
    }
}

/// Actuator that records the wall-clock instant of every pulse.
struct RecordingActuator {
    fired: Arc<Mutex<Vec<Instant>>>,
}

impl RecordingActuator {
    fn new() -> (Self, Arc<Mutex<Vec<Instant>>>) {
        let fired = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                fired: Arc::clone(&fired),
            },
            fired,
        )
    }
}

impl HapticActuator for RecordingActuator {
    fn start(&mut self) -> Result<(), HapticError> {
        Ok(())
    }

    fn stop(&mut self) {}

    fn fire_pulse(&mut self, _pulse: HapticPulse) -> Result<(), HapticError> {
        self.fired.lock().push(Instant::now());
        Ok(())
    }
}

/// Receive events until the predicate matches or the timeout elapses.
async fn wait_for_event<F>(
    rx: &mut mpsc::Receiver<ModuleMessage>,
    timeout: Duration,
    mut predicate: F,
) -> bool
where
    F: FnMut(&PlayerEvent) -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return false;
        }
        match tokio::time::timeout(remaining, rx.recv()).await {
            Ok(Some(ModuleMessage::Event(event))) => {
                if predicate(&event) {
                    return true;
                }
            }
            Ok(Some(_)) => {}
            Ok(None) | Err(_) => return false,
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_load_analyze_play_pulse_flow() {
    let dir = tempfile::tempdir().unwrap();
    let media = dir.path().join("tone.wav");
    // Two seconds of loud constant amplitude: every envelope bar qualifies
    write_wav(&media, &vec![12_000i16; 88_200], 44_100);

    let (actuator, fired) = RecordingActuator::new();
    let mut module = PlayerModule::new(
        Box::new(SimPlayer::new()),
        Box::new(actuator),
        Settings::default(),
    );
    let session = module.session_handle();

    module.initialize().await.unwrap();

    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (msg_tx, mut msg_rx) = mpsc::channel(256);
    let run = tokio::spawn(async move { module.run(cmd_rx, msg_tx).await });

    cmd_tx
        .send(PlayerCommand::LoadAsset {
            path: media.clone(),
        })
        .await
        .unwrap();

    assert!(
        wait_for_event(&mut msg_rx, Duration::from_secs(10), |e| matches!(
            e,
            PlayerEvent::AssetLoaded { .. }
        ))
        .await
    );
    assert!(
        wait_for_event(&mut msg_rx, Duration::from_secs(10), |e| matches!(
            e,
            PlayerEvent::EnvelopeReady { .. }
        ))
        .await
    );
    assert_eq!(session.read().envelope.len(), 360);

    cmd_tx.send(PlayerCommand::Play).await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    cmd_tx.send(PlayerCommand::Pause).await.unwrap();

    // Pulses fired, spaced by at least the minimum interval (with a small
    // allowance for the gap between policy stamping and actuator dispatch)
    let pulses = fired.lock().clone();
    assert!(
        pulses.len() >= 2,
        "expected multiple pulses, got {}",
        pulses.len()
    );
    for pair in pulses.windows(2) {
        let spacing = pair[1].duration_since(pair[0]);
        assert!(
            spacing >= Duration::from_millis(70),
            "pulses too close: {:?}",
            spacing
        );
    }

    cmd_tx.send(PlayerCommand::Shutdown).await.unwrap();
    run.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_scrub_suppresses_pulses() {
    let dir = tempfile::tempdir().unwrap();
    let media = dir.path().join("tone.wav");
    write_wav(&media, &vec![12_000i16; 88_200], 44_100);

    let (actuator, fired) = RecordingActuator::new();
    let mut module = PlayerModule::new(
        Box::new(SimPlayer::new()),
        Box::new(actuator),
        Settings::default(),
    );

    module.initialize().await.unwrap();

    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (msg_tx, mut msg_rx) = mpsc::channel(256);
    let run = tokio::spawn(async move { module.run(cmd_rx, msg_tx).await });

    cmd_tx
        .send(PlayerCommand::LoadAsset {
            path: media.clone(),
        })
        .await
        .unwrap();
    assert!(
        wait_for_event(&mut msg_rx, Duration::from_secs(10), |e| matches!(
            e,
            PlayerEvent::EnvelopeReady { .. }
        ))
        .await
    );

    cmd_tx.send(PlayerCommand::Play).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    cmd_tx.send(PlayerCommand::BeginScrub).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let count_at_scrub_start = fired.lock().len();

    // Drag across the whole loud track: no pulses may fire
    for progress in [0.2, 0.5, 0.8] {
        cmd_tx
            .send(PlayerCommand::ScrubTo { progress })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(fired.lock().len(), count_at_scrub_start);

    // Playback resumes after the scrub and pulses come back
    cmd_tx.send(PlayerCommand::EndScrub).await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(fired.lock().len() > count_at_scrub_start);

    cmd_tx.send(PlayerCommand::Shutdown).await.unwrap();
    run.await.unwrap().unwrap();
}
