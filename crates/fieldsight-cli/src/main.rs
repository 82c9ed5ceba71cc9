//! `fieldsight` – simulated driver for the vision core.
//!
//! 1. Loads `~/.fieldsight/config.toml`, writing the defaults on first run.
//! 2. Initialises tracing (see `fieldsight_runtime::telemetry`).
//! 3. Builds a [`VisionCycle`] over simulated pipelines and runs the
//!    scenario at the configured rate, printing a status line periodically.
//! 4. Stops cleanly on **Ctrl-C** or after the configured number of ticks.

mod config;
mod scenario;

use colored::Colorize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

use fieldsight_geometry::Pose2d;
use fieldsight_hal::{LimelightPipeline, MemoryTable, TagCamera};
use fieldsight_runtime::{VisionBackends, VisionCycle, VisionSnapshot};
use fieldsight_types::SourceFamily;

use scenario::{Scenario, ScenarioCamera};

fn main() {
    let _telemetry = fieldsight_runtime::init_tracing("fieldsight");

    print_banner();

    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping after this tick …".yellow().bold());
        shutdown_flag.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "failed to install Ctrl-C handler");
    }

    // ── Composition ───────────────────────────────────────────────────────
    let fiducial_table = MemoryTable::new(cfg.vision.fiducial_table.clone());
    let detector_table = MemoryTable::new(cfg.vision.detector_table.clone());
    let scenario = Scenario::new(&cfg.vision, fiducial_table.clone(), detector_table.clone());

    let tag_cameras: Vec<Box<dyn TagCamera>> = cfg
        .vision
        .tag_cameras
        .iter()
        .map(|c| {
            Box::new(ScenarioCamera::new(c.name.clone(), &c.mount, scenario.truth()))
                as Box<dyn TagCamera>
        })
        .collect();
    let backends = VisionBackends {
        fiducial: Some(Box::new(LimelightPipeline::new(fiducial_table))),
        detector: Some(Box::new(LimelightPipeline::new(detector_table))),
        tag_cameras,
    };
    let mut cycle = VisionCycle::new(&cfg.vision, backends);

    for (family, error) in cycle.fusion().disabled_families() {
        println!("  {} {} family disabled: {}", "!".yellow().bold(), family, error);
    }
    println!();

    // ── Tick loop ─────────────────────────────────────────────────────────
    let period = 1.0 / cfg.tick_hz;
    let mut tick: u64 = 0;
    let mut worst_error: f64 = 0.0;
    info!(ticks = cfg.ticks, hz = cfg.tick_hz, "starting scenario");

    while !shutdown.load(Ordering::SeqCst) && (cfg.ticks == 0 || tick < cfg.ticks) {
        let now = tick as f64 * period;
        let truth = scenario.step(tick, now);
        let odometry = cfg.use_odometry.then_some(truth);
        let snapshot = cycle.tick(now, odometry);

        if snapshot.fused.last_source.is_some() {
            worst_error = worst_error.max(position_error(&snapshot, truth));
        }
        if cfg.report_every > 0 && tick % cfg.report_every == 0 {
            print_status(&snapshot, truth);
        }

        tick += 1;
        if cfg.realtime {
            std::thread::sleep(Duration::from_secs_f64(period));
        }
    }

    // ── Summary ───────────────────────────────────────────────────────────
    let last = cycle.board().read();
    println!();
    println!("  {} ticks run, worst fused position error {:.3} m", tick, worst_error);
    match serde_json::to_string_pretty(&last) {
        Ok(json) => println!("{}", json.dimmed()),
        Err(e) => warn!(error = %e, "failed to serialise final snapshot"),
    }
    println!("{}", "  ✓ Exiting FieldSight.".green());
}

fn position_error(snapshot: &VisionSnapshot, truth: Pose2d) -> f64 {
    snapshot
        .fused
        .accepted_pose
        .translation
        .distance(truth.translation)
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

fn print_status(snapshot: &VisionSnapshot, truth: Pose2d) {
    let pose = snapshot.fused.accepted_pose;
    let source = match &snapshot.accepted_source {
        Some(s) => match s.family {
            SourceFamily::Fiducial => s.to_string().green(),
            SourceFamily::MultiCamera => s.to_string().cyan(),
            SourceFamily::ObjectDetection => s.to_string().magenta(),
        },
        None => "held".dimmed(),
    };
    let object = if snapshot.object_visible {
        let o = snapshot.object.field_relative;
        format!("object ({:>6.2}, {:>5.2})", o.x(), o.y()).normal()
    } else {
        "object not in view".dimmed()
    };
    println!(
        "  t={:>6.2}s  pose ({:>6.2}, {:>5.2}, {:>7.1}°)  err {:>5.2} m  {:<28} {}",
        snapshot.timestamp,
        pose.x(),
        pose.y(),
        pose.heading().degrees(),
        position_error(snapshot, truth),
        source,
        object,
    );
}

fn print_banner() {
    println!();
    println!("{}", r#"   ___ _     _    _ ___ _      _   _   "#.bold().cyan());
    println!("{}", r#"  | __(_)___| |__| / __(_)__ _| |_| |_ "#.bold().cyan());
    println!("{}", r#"  | _|| / -_) / _` \__ \ / _` | ' \  _|"#.bold().cyan());
    println!("{}", r#"  |_| |_\___|_\__,_|___/_\__, |_||_\__|"#.bold().cyan());
    println!("{}", r#"                         |___/         "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "FieldSight".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Vision pose fusion and game-object localization");
    println!();
}
