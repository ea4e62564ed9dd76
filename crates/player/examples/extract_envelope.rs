//! Envelope extraction example.
//!
//! Decodes a media file and prints its amplitude envelope as ASCII bars.
//!
//! Usage: cargo run --package tactus-player --example extract_envelope <media_file>

use std::env;

use tactus_player::analysis::{extract_samples, AmplitudeEnvelope};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <media_file> [bars]", args[0]);
        eprintln!("\nExample: cargo run --package tactus-player --example extract_envelope clip.mp3");
        std::process::exit(1);
    }
    let path = &args[1];
    let bars: usize = args.get(2).and_then(|a| a.parse().ok()).unwrap_or(60);

    println!("Extracting PCM from {}...", path);
    let audio = extract_samples(path)?;
    println!(
        "{} samples, {} Hz, {} channels, {:.2}s",
        audio.samples.len(),
        audio.sample_rate,
        audio.channels,
        audio.duration_seconds()
    );

    let envelope = AmplitudeEnvelope::reduce(&audio.samples, bars);
    println!("\nAmplitude envelope ({} bars):", envelope.len());
    for (i, value) in envelope.bars().iter().enumerate() {
        let width = (value * 50.0).round() as usize;
        println!("{:4} | {:5.3} {}", i, value, "#".repeat(width));
    }

    Ok(())
}
