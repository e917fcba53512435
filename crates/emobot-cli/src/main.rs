//! `emobot` – companion-robot behavior engine.
//!
//! This binary wires the whole stack together.  It:
//!
//! 1. Loads `~/.emobot/config.toml` (writing defaults on first run) and
//!    applies `EMOBOT_*` environment overrides.
//! 2. Opens the motor controller on the configured serial port, falling
//!    back to the simulator when no hardware answers.
//! 3. Plays detector frames through the behavior engine at the configured
//!    tick rate – from a JSONL recording named on the command line, or the
//!    built-in demo scenario.
//! 4. Prints issued actions as they happen plus a once-a-second status line
//!    from the telemetry bus, and intercepts **Ctrl-C** so the run always
//!    ends with the motors stopped.

mod config;
mod feed;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use colored::Colorize;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use emobot_engine::Engine;
use emobot_types::{AttentionState, BreakerState, TickTelemetry};

#[tokio::main]
async fn main() {
    // ── Structured logging ────────────────────────────────────────────────
    // Initialise tracing-subscriber using RUST_LOG (defaults to "info").
    // Set EMOBOT_LOG_FORMAT=json to emit newline-delimited JSON logs
    // suitable for log aggregators. The user-facing output below still uses
    // println! for UX consistency.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("EMOBOT_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .init();
    }

    print_banner();

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    // The control loop checks the flag once per tick; the current motor
    // script still runs to completion, so the wheels always end on a stop.
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!(
            "{}",
            "⚠  Ctrl-C received – stopping after the current motion …"
                .yellow()
                .bold()
        );
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; graceful shutdown on Ctrl-C will not be available");
    }

    // ── Configuration ─────────────────────────────────────────────────────
    match config::load() {
        Ok(Some(_)) => println!(
            "  Config loaded from {}",
            config::config_path().display().to_string().bold()
        ),
        Ok(None) => match config::save(&config::Config::default()) {
            Ok(()) => println!(
                "  {} Default config written to {}",
                "✓".green().bold(),
                config::config_path().display().to_string().bold()
            ),
            Err(e) => println!("{}: {}", "Error saving config".red(), e),
        },
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
        }
    }

    let mut cfg = config::load().ok().flatten().unwrap_or_default();
    config::apply_env_overrides(&mut cfg);

    // ── Frame source ──────────────────────────────────────────────────────
    let mut feed = match std::env::args().nth(1) {
        Some(path) => match feed::Feed::from_jsonl(Path::new(&path)) {
            Ok(feed) => {
                println!(
                    "  Playing {} frames from {}",
                    feed.frame_count(),
                    path.bold()
                );
                feed
            }
            Err(e) => {
                println!("{}: {}", "Frame file error".red(), e);
                std::process::exit(1);
            }
        },
        None => {
            let feed = feed::Feed::demo();
            println!(
                "  No recording given – running the built-in demo ({} frames).",
                feed.frame_count()
            );
            feed
        }
    };

    // ── Engine ────────────────────────────────────────────────────────────
    let driver = emobot_hal::connect_or_simulate(&cfg.serial_port);
    let mut engine = Engine::new(driver, cfg.seed);

    // ── Status reporter ───────────────────────────────────────────────────
    // Receives every telemetry snapshot: issued actions print immediately,
    // the ambient state roughly once a second.
    let mut updates = engine.telemetry().subscribe();
    let reporter = tokio::spawn(async move {
        let mut last_line: Option<Instant> = None;
        loop {
            match updates.recv().await {
                Ok(snapshot) => {
                    if let Some(action) = snapshot.last_action {
                        println!(
                            "  {} {} ({:.2})",
                            "▶".cyan(),
                            action.name().bold(),
                            action.intensity()
                        );
                    }
                    if last_line.is_none_or(|t| t.elapsed() >= Duration::from_secs(1)) {
                        println!("{}", status_line(&snapshot));
                        last_line = Some(Instant::now());
                    }
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    // ── Control loop ──────────────────────────────────────────────────────
    let tick = Duration::from_secs_f64(1.0 / cfg.tick_hz.max(1) as f64);
    let mut ticker = tokio::time::interval(tick);
    let mut degraded_announced = false;

    while !shutdown.load(Ordering::SeqCst) {
        ticker.tick().await;
        let Some(frame) = feed.next() else { break };

        let snapshot = engine.tick(&frame);
        if snapshot.breaker == BreakerState::Degraded && !degraded_announced {
            println!(
                "{}",
                "⚠  Motor hardware degraded – continuing in simulation."
                    .yellow()
                    .bold()
            );
            degraded_announced = true;
        }
    }

    // Dropping the engine closes the command queue; the worker finishes the
    // script in flight (every script ends on a stop) and exits.
    engine.shutdown().await;
    let _ = reporter.await;

    println!();
    println!("  {} Motors stopped. Goodbye.", "✓".green());
}

// ─────────────────────────────────────────────────────────────────────────────
// Status line
// ─────────────────────────────────────────────────────────────────────────────

fn status_line(snapshot: &TickTelemetry) -> String {
    let attention = match snapshot.attention {
        AttentionState::Watching => snapshot.attention.to_string().green(),
        AttentionState::NotWatching => snapshot.attention.to_string().yellow(),
        AttentionState::NoUser => snapshot.attention.to_string().dimmed(),
    };
    let band = snapshot
        .distance_band
        .map(|b| b.to_string())
        .unwrap_or_else(|| "-".to_string());

    let mut line = format!(
        "  {}  •  {} {:.2}  •  level {:.1}  •  dist {}",
        attention, snapshot.dominant, snapshot.confidence, snapshot.interaction_level, band
    );
    if snapshot.following.is_some() {
        line.push_str(&format!("  •  {}", "following".cyan()));
    }
    if snapshot.breaker == BreakerState::Degraded {
        line.push_str(&format!("  •  {}", "degraded".yellow()));
    }
    line
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!(
        "{}",
        r#"███████╗███╗   ███╗ ██████╗ ██████╗  ██████╗ ████████╗"#
            .bold()
            .cyan()
    );
    println!(
        "{}",
        r#"██╔════╝████╗ ████║██╔═══██╗██╔══██╗██╔═══██╗╚══██╔══╝"#
            .bold()
            .cyan()
    );
    println!(
        "{}",
        r#"█████╗  ██╔████╔██║██║   ██║██████╔╝██║   ██║   ██║   "#
            .bold()
            .cyan()
    );
    println!(
        "{}",
        r#"██╔══╝  ██║╚██╔╝██║██║   ██║██╔══██╗██║   ██║   ██║   "#
            .bold()
            .cyan()
    );
    println!(
        "{}",
        r#"███████╗██║ ╚═╝ ██║╚██████╔╝██████╔╝╚██████╔╝   ██║   "#
            .bold()
            .cyan()
    );
    println!(
        "{}",
        r#"╚══════╝╚═╝     ╚═╝ ╚═════╝ ╚═════╝  ╚═════╝    ╚═╝   "#
            .bold()
            .cyan()
    );
    println!();
    println!(
        "  {} {}",
        "emobot".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Companion robot behavior engine");
    println!();
}
