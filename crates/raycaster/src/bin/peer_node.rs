//! # RAYCASTER Peer Node
//!
//! Runs one headless peer: minimap renderer, scripted circling input,
//! checksum presenter. Useful to keep a session populated on a server or to
//! watch position traffic with `RUST_LOG=debug`.
//!
//! ```bash
//! peer_node peer.toml
//! peer_node peer.toml --frames 600
//! RUST_LOG=raycaster=debug peer_node peer.toml
//! ```
//!
//! Stops on Ctrl-C, or after `--frames` frames.

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use raycaster::headless::{ArenaMap, ChecksumPresenter, MinimapRenderer, ScriptedInput};
use raycaster::{FrameControl, Session, SessionConfig};
use tracing_subscriber::EnvFilter;

/// Frame pacing for the headless loop, about 60 FPS.
const FRAME_SLEEP: Duration = Duration::from_micros(16_666);

static SHOULD_STOP: AtomicBool = AtomicBool::new(false);

struct Args {
    config: String,
    frames: Option<u64>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = std::env::args().skip(1);
    let mut config = None;
    let mut frames = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--frames" => {
                let value = args.next().ok_or("--frames needs a value")?;
                frames = Some(
                    value
                        .parse()
                        .map_err(|_| format!("invalid frame count `{value}`"))?,
                );
            }
            "--help" | "-h" => return Err(String::new()),
            _ if config.is_none() => config = Some(arg),
            _ => return Err(format!("unexpected argument `{arg}`")),
        }
    }

    let config = config.ok_or("missing configuration file")?;
    Ok(Args { config, frames })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            if !message.is_empty() {
                eprintln!("error: {message}");
            }
            eprintln!("usage: peer_node <config.toml> [--frames N]");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = ctrlc::set_handler(|| SHOULD_STOP.store(true, Ordering::Relaxed)) {
        tracing::warn!(error = %e, "could not install Ctrl-C handler");
    }

    let config = match SessionConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "cannot load configuration");
            return ExitCode::FAILURE;
        }
    };

    let mut session = match Session::start(&config) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = %e, "cannot start session");
            return ExitCode::FAILURE;
        }
    };

    let map = ArenaMap::default();
    let mut renderer = MinimapRenderer::new(map);
    let mut presenter = ChecksumPresenter::new();
    let mut input = ScriptedInput::circling();

    while !SHOULD_STOP.load(Ordering::Relaxed) {
        if session.frame(&mut renderer, &mut presenter, &mut input, &map) == FrameControl::Quit {
            break;
        }
        if args.frames.is_some_and(|max| session.frames() >= max) {
            break;
        }
        std::thread::sleep(FRAME_SLEEP);
    }

    let summary = session.shutdown();
    tracing::info!(
        frames = summary.frames,
        avg_frame_us = summary.frame_stats.avg_frame_us,
        sent = summary.sent.packets_sent,
        send_errors = summary.sent.send_errors,
        received = summary.received.packets_received,
        malformed = summary.received.malformed,
        peers = summary.known_peers,
        checksum = %format!("{:016x}", presenter.checksum()),
        "peer node stopped"
    );

    ExitCode::SUCCESS
}
