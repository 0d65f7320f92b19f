//! CLI command implementations

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bounce_core::clock::{ClockSync, HttpTimeSource, SystemClock};
use bounce_core::config::{BounceConfig, DisplayConfig};
use bounce_core::{Frame, LogoSet, Screensaver};
use clap::{Args, Subcommand};
use tokio::time::MissedTickBehavior;

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the time reference server and serve the viewer page
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
        /// Directory holding index.html, simulation.js and logos/
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
    /// Print the logo trajectory for a seed over a range of ticks
    Simulate {
        /// Seed the starting position is derived from
        #[arg(short, long)]
        seed: String,
        /// First tick to print
        #[arg(long, default_value = "0")]
        from: i64,
        /// Last tick to print, inclusive
        #[arg(long, default_value = "20")]
        to: i64,
        /// Distance between printed ticks
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(i64).range(1..))]
        step: i64,
        #[command(flatten)]
        display: DisplayArgs,
    },
    /// Follow a running server and print the synchronised frame
    Watch {
        /// Seed the starting position is derived from
        #[arg(short, long)]
        seed: String,
        /// Time reference endpoint
        #[arg(long)]
        timer_url: Option<String>,
        /// Frames printed per second
        #[arg(long, default_value = "4", value_parser = clap::value_parser!(u32).range(1..=240))]
        fps: u32,
        /// Stop after this many frames
        #[arg(long)]
        frames: Option<u64>,
        #[command(flatten)]
        display: DisplayArgs,
    },
}

/// Display geometry overrides shared by the viewer commands
#[derive(Args, Debug, Default)]
pub struct DisplayArgs {
    #[arg(long)]
    canvas_width: Option<u32>,
    #[arg(long)]
    canvas_height: Option<u32>,
    #[arg(long)]
    logo_width: Option<u32>,
    #[arg(long)]
    logo_height: Option<u32>,
    /// Number of logos cycled through on wall hits
    #[arg(long)]
    logo_count: Option<u32>,
    #[arg(long)]
    ticks_per_second: Option<f64>,
}

impl DisplayArgs {
    fn apply(&self, display: &mut DisplayConfig) {
        if let Some(value) = self.canvas_width {
            display.canvas_width = value;
        }
        if let Some(value) = self.canvas_height {
            display.canvas_height = value;
        }
        if let Some(value) = self.logo_width {
            display.logo_width = value;
        }
        if let Some(value) = self.logo_height {
            display.logo_height = value;
        }
        if let Some(value) = self.logo_count {
            display.logo_count = value;
        }
        if let Some(value) = self.ticks_per_second {
            display.ticks_per_second = value;
        }
    }
}

/// Handle the CLI command
///
/// # Errors
/// Returns appropriate error based on the command that fails
pub async fn handle_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Serve {
            host,
            port,
            static_dir,
        } => serve(host, port, static_dir).await,
        Commands::Simulate {
            seed,
            from,
            to,
            step,
            display,
        } => simulate(&seed, from, to, step, &display),
        Commands::Watch {
            seed,
            timer_url,
            fps,
            frames,
            display,
        } => watch(&seed, timer_url, fps, frames, &display).await,
    }
}

/// Start the time reference server
///
/// # Errors
/// - `WebError::AddressInUse` - Another process holds the port
/// - `WebError::Bind` - The address could not be bound
pub async fn serve(
    host: Option<String>,
    port: Option<u16>,
    static_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut config = BounceConfig::from_env();
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(dir) = static_dir {
        config.server.static_dir = dir;
    }

    if !config.server.static_dir.is_dir() {
        tracing::warn!(
            static_dir = %config.server.static_dir.display(),
            "Static directory missing, only /timer will succeed"
        );
    }

    println!(
        "Serving on http://{}:{}/",
        config.server.host, config.server.port
    );
    bounce_web::run_server(&config.server)
        .await
        .context("time reference server stopped")
}

/// Print frames for `seed` between two ticks
///
/// # Errors
/// - `BounceError::Configuration` - Invalid display settings
/// - `BounceError::Simulation` - Logo does not fit or a tick is negative
pub fn simulate(
    seed: &str,
    from: i64,
    to: i64,
    step: i64,
    display_args: &DisplayArgs,
) -> anyhow::Result<()> {
    let mut config = BounceConfig::from_env();
    display_args.apply(&mut config.display);
    config.validate()?;

    let logos = LogoSet::from_display(&config.display)?;
    let screensaver = Screensaver::new(&config.display, seed, logos)?;
    let arena = screensaver.simulator().arena();
    let initial = screensaver.simulator().initial_state();

    println!("Seed: {seed}");
    println!("  Arena: {}x{}", arena.width(), arena.height());
    println!(
        "  Start: ({}, {}) moving {:?}/{:?}",
        initial.x, initial.y, initial.x_dir, initial.y_dir
    );
    match screensaver.simulator().corner_schedule() {
        Some(schedule) => println!(
            "  Corners: first at tick {}, then every {} ticks",
            schedule.first, schedule.period
        ),
        None => println!("  Corners: never"),
    }
    println!("{:-<60}", "");
    println!(
        "{:>12} {:>6} {:>6} {:>10} {:>8} {:>5}",
        "tick", "x", "y", "walls", "corners", "logo"
    );

    let mut tick = from;
    while tick <= to {
        print_frame(&screensaver.frame_at_tick(tick)?);
        tick = match tick.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }

    Ok(())
}

/// Follow the server clock and print the frame a browser would draw
///
/// # Errors
/// - `BounceError::Configuration` - Invalid display settings or timer URL
/// - `ClockSyncError::InvalidUrl` - The timer URL cannot be used
pub async fn watch(
    seed: &str,
    timer_url: Option<String>,
    fps: u32,
    frames: Option<u64>,
    display_args: &DisplayArgs,
) -> anyhow::Result<()> {
    let mut config = BounceConfig::from_env();
    if let Some(url) = timer_url {
        config.clock.timer_url = url;
    }
    display_args.apply(&mut config.display);
    config.validate()?;

    let logos = LogoSet::from_display(&config.display)?;
    let screensaver = Screensaver::new(&config.display, seed, logos)?;

    let source = HttpTimeSource::new(&config.clock)?;
    println!("Watching {} with seed {seed}", source.url());

    let sync = Arc::new(ClockSync::new(source, SystemClock, config.clock.clone()));
    let sync_task = Arc::clone(&sync).spawn();

    let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / f64::from(fps)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut drawn = 0u64;
    while frames.is_none_or(|limit| drawn < limit) {
        interval.tick().await;
        match screensaver.frame_at(sync.offset(), sync.local_now_ms()) {
            Ok(frame) => {
                tracing::trace!(tick = frame.tick, "Frame");
                print_frame(&frame);
            }
            Err(e) => tracing::warn!(error = %e, "Skipping frame"),
        }
        drawn += 1;
    }

    sync_task.abort();
    Ok(())
}

fn print_frame(frame: &Frame) {
    println!(
        "{:>12} {:>6} {:>6} {:>10} {:>8} {:>5}",
        frame.tick, frame.x, frame.y, frame.walls_hit, frame.corners_hit, frame.logo_index
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_args_override_only_given_fields() {
        let args = DisplayArgs {
            canvas_width: Some(800),
            logo_count: Some(3),
            ..Default::default()
        };
        let mut display = DisplayConfig::default();
        args.apply(&mut display);

        assert_eq!(display.canvas_width, 800);
        assert_eq!(display.logo_count, 3);
        assert_eq!(display.canvas_height, 360);
        assert_eq!(display.ticks_per_second, 60.0);
    }

    #[test]
    fn test_simulate_prints_table_for_valid_geometry() {
        assert!(simulate("abc", 0, 5, 2, &DisplayArgs::default()).is_ok());

        let oversized = DisplayArgs {
            logo_width: Some(700),
            ..Default::default()
        };
        assert!(simulate("abc", 0, 5, 1, &oversized).is_err());
    }
}
