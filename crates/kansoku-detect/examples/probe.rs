//! Run with: cargo run -p kansoku-detect --example probe -- 'mpv|vlc'
//!
//! Prints the video file currently opened by a matching player process.

use kansoku_detect::{FileProbe, ProcessProbe};

#[tokio::main]
async fn main() {
    let process_name = std::env::args().nth(1).unwrap_or_else(|| "mpv".into());
    let mut probe = ProcessProbe::new(process_name);

    match probe.playing_file().await {
        Ok(Some(file)) => println!("Playing: {file}"),
        Ok(None) => println!("No video open by {}.", probe.process_name()),
        Err(e) => eprintln!("Probe failed: {e}"),
    }
}
