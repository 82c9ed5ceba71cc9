//! Driver configuration – reads/writes `~/.fieldsight/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use fieldsight_perception::VisionConfig;
use fieldsight_types::VisionError;

/// Field layout shipped with the repository.
pub const DEFAULT_FIELD_LAYOUT: &str = "config/crescendo-2024.json";

/// Persisted driver configuration stored in `~/.fieldsight/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Number of simulated ticks to run; `0` runs until Ctrl-C.
    #[serde(default = "default_ticks")]
    pub ticks: u64,

    /// Control loop rate.
    #[serde(default = "default_tick_hz")]
    pub tick_hz: f64,

    /// Sleep between ticks so the loop runs in wall-clock time.
    #[serde(default = "default_realtime")]
    pub realtime: bool,

    /// Print a status line every this many ticks.
    #[serde(default = "default_report_every")]
    pub report_every: u64,

    /// Feed the simulated drivetrain pose to the localizer.  When off the
    /// fused pose is used.
    #[serde(default = "default_use_odometry")]
    pub use_odometry: bool,

    #[serde(default = "default_vision")]
    pub vision: VisionConfig,
}

fn default_ticks() -> u64 {
    500
}
fn default_tick_hz() -> f64 {
    50.0
}
fn default_realtime() -> bool {
    true
}
fn default_report_every() -> u64 {
    25
}
fn default_use_odometry() -> bool {
    true
}
fn default_vision() -> VisionConfig {
    VisionConfig {
        multi_camera_enabled: true,
        field_layout_path: Some(PathBuf::from(DEFAULT_FIELD_LAYOUT)),
        ..VisionConfig::default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ticks: default_ticks(),
            tick_hz: default_tick_hz(),
            realtime: default_realtime(),
            report_every: default_report_every(),
            use_odometry: default_use_odometry(),
            vision: default_vision(),
        }
    }
}

impl Config {
    /// Reject values the driver loop cannot run with.
    pub fn validate(&self) -> Result<(), VisionError> {
        if !(self.tick_hz.is_finite() && self.tick_hz > 0.0) {
            return Err(VisionError::Config(format!(
                "tick_hz must be positive, got {}",
                self.tick_hz
            )));
        }
        if !(0.0..=1.0).contains(&self.vision.ambiguity_cutoff) {
            return Err(VisionError::Config(format!(
                "ambiguity_cutoff must be within [0, 1], got {}",
                self.vision.ambiguity_cutoff
            )));
        }
        Ok(())
    }
}

/// Return the path to `~/.fieldsight/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".fieldsight").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, VisionError> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, VisionError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        VisionError::Config(format!("failed to read config at {}: {e}", path.display()))
    })?;
    let mut cfg: Config = toml::from_str(&raw)
        .map_err(|e| VisionError::Config(format!("failed to parse config: {e}")))?;
    apply_env_overrides(&mut cfg);
    cfg.validate()?;
    Ok(Some(cfg))
}

/// Apply `FIELDSIGHT_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `FIELDSIGHT_FIELD_LAYOUT` | `vision.field_layout_path` |
/// | `FIELDSIGHT_AMBIGUITY_CUTOFF` | `vision.ambiguity_cutoff` |
/// | `FIELDSIGHT_TICKS` | `ticks` |
///
/// Unparsable numbers are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides(cfg, |key| std::env::var(key).ok());
}

fn apply_overrides(cfg: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("FIELDSIGHT_FIELD_LAYOUT") {
        cfg.vision.field_layout_path = Some(PathBuf::from(v));
    }
    if let Some(v) = var("FIELDSIGHT_AMBIGUITY_CUTOFF")
        && let Ok(cutoff) = v.parse::<f64>()
    {
        cfg.vision.ambiguity_cutoff = cutoff;
    }
    if let Some(v) = var("FIELDSIGHT_TICKS")
        && let Ok(ticks) = v.parse::<u64>()
    {
        cfg.ticks = ticks;
    }
}

/// Save the config to disk, creating `~/.fieldsight/` if necessary.
pub fn save(cfg: &Config) -> Result<(), VisionError> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), VisionError> {
    let io_err = |what: &str, e: std::io::Error| {
        VisionError::Config(format!("failed to {what} {}: {e}", path.display()))
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err("create directory for", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| io_err("restrict directory of", e))?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| VisionError::Config(format!("failed to serialize config: {e}")))?;
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(|e| io_err("write", e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw).map_err(|e| io_err("write", e))?;
    Ok(())
}
