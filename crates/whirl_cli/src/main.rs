//! Whirl CLI
//!
//! Drive carousel rows headlessly, inspect wraparound placement, and tune
//! fling settling.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use whirl_animation::{AnimationSpec, SyncSource, ValueAnimator};
use whirl_core::{Axis, SizeProposal, Vec2};
use whirl_layout::{DragGesture, WrapLayout};
use whirl_platform::{FrameDriver, HostDriver, PacedDriver};

mod config;
mod wall;

use config::WhirlConfig;
use wall::PhotoWall;

#[derive(Parser)]
#[command(name = "whirl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Infinite carousel playground", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./whirl.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the photo wall demo headlessly
    Demo {
        /// Number of frames to run
        #[arg(short, long, default_value = "360")]
        frames: u64,

        /// Pace frames in real time on a background thread
        #[arg(long)]
        paced: bool,

        /// Row that receives a simulated fling
        #[arg(long, default_value = "1")]
        drag_row: usize,

        /// Print row state every N frames
        #[arg(long, default_value = "60")]
        report_every: u64,
    },

    /// Show how a release velocity settles
    Fling {
        /// Release velocity in points per second
        #[arg(long, allow_hyphen_values = true)]
        velocity: f32,

        /// Translation at release in points
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        translation: f32,

        /// Platform-predicted resting translation
        #[arg(long, allow_hyphen_values = true)]
        predicted: Option<f32>,

        /// Offset when the drag began
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        start: f64,
    },

    /// Print placements for a scroll offset
    Layout {
        /// Scroll offset in points
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        offset: f64,

        /// Override the configured axis
        #[arg(long)]
        axis: Option<AxisArg>,
    },

    /// Write a default whirl.toml in a directory
    Init {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum AxisArg {
    Horizontal,
    Vertical,
}

impl From<AxisArg> for Axis {
    fn from(arg: AxisArg) -> Self {
        match arg {
            AxisArg::Horizontal => Axis::Horizontal,
            AxisArg::Vertical => Axis::Vertical,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config_path = cli.config;
    match cli.command {
        Commands::Demo {
            frames,
            paced,
            drag_row,
            report_every,
        } => {
            let config = load_config(config_path.as_deref())?;
            cmd_demo(&config, frames, paced, drag_row, report_every)
        }

        Commands::Fling {
            velocity,
            translation,
            predicted,
            start,
        } => {
            let config = load_config(config_path.as_deref())?;
            cmd_fling(&config, velocity, translation, predicted, start)
        }

        Commands::Layout { offset, axis } => {
            let config = load_config(config_path.as_deref())?;
            cmd_layout(config, offset, axis)
        }

        Commands::Init { path } => cmd_init(&path),
    }
}

fn load_config(path: Option<&Path>) -> Result<WhirlConfig> {
    match path {
        Some(path) => WhirlConfig::load(path),
        None => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            WhirlConfig::load_from_dir(&cwd)
        }
    }
}

/// Scripted interaction: grab a row, drag it, and fling it
struct DemoScript {
    row: usize,
    grab_at: u64,
    release_at: u64,
    axis_toggle_at: u64,
}

impl DemoScript {
    const DRAG_STEP: f32 = 12.0;
    const RELEASE_VELOCITY: f32 = 900.0;

    fn new(row: usize, frames: u64) -> Self {
        let grab_at = frames / 4;
        Self {
            row,
            grab_at,
            release_at: grab_at + 10,
            axis_toggle_at: frames * 3 / 4,
        }
    }

    /// Apply the events scheduled for `frame`
    fn step(&self, wall: &mut PhotoWall, frame: u64) {
        if frame == self.grab_at {
            info!(row = self.row, "demo: grab");
            wall.drag_start(self.row);
        } else if frame > self.grab_at && frame < self.release_at {
            let translation = (frame - self.grab_at) as f32 * Self::DRAG_STEP;
            wall.drag_to(self.row, translation);
        } else if frame == self.release_at {
            let translation = (self.release_at - self.grab_at - 1) as f32 * Self::DRAG_STEP;
            info!(row = self.row, velocity = Self::RELEASE_VELOCITY, "demo: release");
            wall.release(self.row, translation, Self::RELEASE_VELOCITY);
        }

        if frame == self.axis_toggle_at {
            wall.toggle_axis();
            info!(axis = ?wall.axis(), "demo: axis toggled");
        }
    }
}

fn cmd_demo(
    config: &WhirlConfig,
    frames: u64,
    paced: bool,
    drag_row: usize,
    report_every: u64,
) -> Result<()> {
    if paced {
        let mut driver = PacedDriver::new(config.pacing.clone())?;
        let main_thread = thread::current();
        driver.set_wake_callback(move || main_thread.unpark());

        let mut wall = PhotoWall::new(config, &driver);
        check_drag_row(&wall, drag_row)?;
        wall.start();
        driver.start()?;

        info!(
            driver = driver.name(),
            interval_us = driver.frame_interval().as_micros() as u64,
            rows = wall.row_count(),
            "demo: running"
        );

        run_wall(&mut driver, &mut wall, frames, drag_row, report_every, |driver| {
            // Spurious unparks are fine: pump reports whether a frame ran.
            loop {
                thread::park_timeout(Duration::from_millis(100));
                if driver.pump(Instant::now()) || !driver.wants_frames() {
                    return;
                }
            }
        })
    } else {
        let mut driver = HostDriver::new();
        let interval = Duration::from_nanos(1_000_000_000 / config.pacing.refresh_rate.max(1) as u64);
        let t0 = Instant::now();
        let mut frame = 0u32;

        let mut wall = PhotoWall::new(config, &driver);
        check_drag_row(&wall, drag_row)?;
        wall.start();

        info!(driver = driver.name(), rows = wall.row_count(), "demo: running (simulated clock)");

        run_wall(&mut driver, &mut wall, frames, drag_row, report_every, |driver| {
            driver.pump(t0 + interval * frame);
            frame += 1;
        })
    }
}

fn check_drag_row(wall: &PhotoWall, row: usize) -> Result<()> {
    if row >= wall.row_count() {
        anyhow::bail!(
            "--drag-row {} is out of range (the wall has {} rows)",
            row,
            wall.row_count()
        );
    }
    Ok(())
}

fn run_wall<D, F>(
    driver: &mut D,
    wall: &mut PhotoWall,
    frames: u64,
    drag_row: usize,
    report_every: u64,
    mut next_frame: F,
) -> Result<()>
where
    D: FrameDriver,
    F: FnMut(&mut D),
{
    let script = DemoScript::new(drag_row, frames);

    for frame in 0..frames {
        script.step(wall, frame);
        next_frame(driver);

        if report_every > 0 && frame % report_every == 0 {
            print_rows(frame, wall);
        }
    }

    wall.stop();
    print_rows(frames, wall);
    debug!(delivered = driver.scheduler().frame_count(), "demo: finished");
    Ok(())
}

fn print_rows(frame: u64, wall: &PhotoWall) {
    println!("frame {frame:>5}  axis {:?}", wall.axis());
    for (index, row) in wall.snapshot().iter().enumerate() {
        let visible: Vec<String> = row.visible.iter().map(|i| i.to_string()).collect();
        println!(
            "  row {index}  offset {:>9.2}  {}  [{}]",
            row.offset,
            if row.touching { "touching" } else { "        " },
            visible.join(" ")
        );
    }
}

fn cmd_fling(
    config: &WhirlConfig,
    velocity: f32,
    translation: f32,
    predicted: Option<f32>,
    start: f64,
) -> Result<()> {
    let axis = config.wall.axis;
    let along = |v: f32| match axis {
        Axis::Horizontal => Vec2::new(v, 0.0),
        Axis::Vertical => Vec2::new(0.0, v),
    };

    let mut gesture = DragGesture::new(along(translation), along(velocity));
    if let Some(predicted) = predicted {
        gesture = gesture.predicted(along(predicted));
    }

    let current = start - f64::from(translation);
    let spec = config.drag.plan_settle(axis, start, current, &gesture);

    println!("projection time  {:.3}s", config.drag.projection_time());
    println!("from             {:.2}", spec.from);
    println!("to               {:.2}", spec.to);
    println!("duration         {:.3}s", spec.duration.as_secs_f32());

    let curve = sample_settle(spec, config.pacing.refresh_rate);
    let step = (curve.values.len() / 10).max(1);
    for (i, value) in curve.values.iter().enumerate().step_by(step) {
        println!("  frame {i:>4}  {value:>9.2}");
    }
    if let Some(last) = curve.values.last() {
        let note = if curve.truncated {
            format!("(sampling stopped after {MAX_SAMPLED_SECS}s)")
        } else {
            "(rest)".to_string()
        };
        println!("  frame {:>4}  {last:>9.2}  {note}", curve.values.len() - 1);
    }
    Ok(())
}

/// Longest stretch of a settle curve `fling` samples
const MAX_SAMPLED_SECS: u32 = 60;

/// Settle values as a display at `refresh_rate` would see them
struct SettleCurve {
    values: Vec<f64>,
    /// The settle outlasted `MAX_SAMPLED_SECS` and was cut short
    truncated: bool,
}

fn sample_settle(spec: AnimationSpec, refresh_rate: u32) -> SettleCurve {
    let refresh_rate = refresh_rate.max(1);
    let interval = Duration::from_nanos(1_000_000_000 / u64::from(refresh_rate));
    let max_frames = refresh_rate.saturating_mul(MAX_SAMPLED_SECS);

    let driver = HostDriver::new();
    let mut animator = ValueAnimator::new(driver.display_sync());
    let values = Rc::new(RefCell::new(Vec::new()));
    animator.start(
        spec,
        {
            let values = Rc::clone(&values);
            move |v: &f64| values.borrow_mut().push(*v)
        },
        |reason| debug!(?reason, "fling: finished"),
    );

    let t0 = Instant::now();
    let mut frame = 0u32;
    while frame < max_frames && driver.on_frame(t0 + interval * frame) {
        frame += 1;
    }

    let truncated = animator.is_running();
    if truncated {
        animator.cancel();
    }
    let values = values.take();
    SettleCurve { values, truncated }
}

fn cmd_layout(mut config: WhirlConfig, offset: f64, axis: Option<AxisArg>) -> Result<()> {
    if let Some(axis) = axis {
        config.wall.axis = axis.into();
    }
    let wall = &config.wall;
    let items = wall.items();
    let bounds = wall.bounds();
    let layout = WrapLayout::new(wall.axis, offset);

    let placements = layout.place(&items, bounds, SizeProposal::fixed(bounds.size));
    if placements.is_empty() {
        anyhow::bail!("nothing to place: photos have no extent along the scroll axis");
    }

    println!(
        "axis {:?}  offset {offset}  content {}  viewport {}",
        wall.axis,
        wall.content_extent(),
        wall.viewport
    );
    for p in &placements {
        let visible = if p.rect.intersects(&bounds) { "*" } else { " " };
        println!(
            "  {visible} #{:<3} x {:>8.2}  y {:>8.2}  {:>6.1} x {:<6.1}  {:?}",
            p.index,
            p.rect.x(),
            p.rect.y(),
            p.rect.width(),
            p.rect.height(),
            p.wrapped
        );
    }
    Ok(())
}

fn cmd_init(path: &Path) -> Result<()> {
    WhirlConfig::write_default(path)?;
    info!("Created {}", path.join(config::CONFIG_FILE).display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use whirl_layout::DragConfig;

    #[test]
    fn test_sampled_settle_ends_at_rest() {
        let spec = AnimationSpec::new(0.0, -120.0, Duration::from_millis(500));
        let curve = sample_settle(spec, 120);

        assert!(!curve.truncated);
        assert_eq!(curve.values.first(), Some(&0.0));
        assert_eq!(curve.values.last(), Some(&-120.0));
    }

    #[test]
    fn test_uncapped_slow_fling_sampling_is_bounded() {
        let config = DragConfig {
            max_settle_secs: 0.0,
            ..DragConfig::default()
        };
        // A crawl toward a distant prediction plans a settle of many hours.
        let gesture = DragGesture::new(Vec2::ZERO, Vec2::new(0.001, 0.0))
            .predicted(Vec2::new(100_000.0, 0.0));
        let spec = config.plan_settle(Axis::Horizontal, 0.0, 0.0, &gesture);
        assert!(spec.duration > Duration::from_secs(3600));

        let curve = sample_settle(spec, 60);
        assert!(curve.truncated);
        assert_eq!(curve.values.len(), 60 * MAX_SAMPLED_SECS as usize);
    }
}
