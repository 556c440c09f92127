//! Engine configuration.
//!
//! Loaded from a TOML file with env-var overrides. The compliance
//! thresholds are exact regulatory constants: they are configurable for
//! other jurisdictions but never derived from one another at runtime.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RecertError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub compliance: ComplianceConfig,
}

/// Database location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("recert.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Continuous-training compliance thresholds.
///
/// Reference-domain values: 3 days of 7.15 hours over a rolling 6-year
/// window, at least 70% of hours delivered live, with an at-risk check
/// over a distinct trailing 5-year window against 2.5 days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceConfig {
    /// Rolling compliance window in years
    /// Default: 6
    #[serde(default = "default_window_years")]
    pub window_years: u32,

    /// Required training days inside the window
    /// Default: 3.0
    #[serde(default = "default_required_days")]
    pub required_days: f64,

    /// Hours counted per training day
    /// Default: 7.15
    #[serde(default = "default_hours_per_day")]
    pub hours_per_day: f64,

    /// Minimum live-hours ratio (0.0-1.0)
    /// Default: 0.70
    #[serde(default = "default_live_ratio_threshold")]
    pub live_ratio_threshold: f64,

    /// Trailing window for the at-risk heuristic, in years
    /// Default: 5
    #[serde(default = "default_at_risk_window_years")]
    pub at_risk_window_years: u32,

    /// Day threshold for the at-risk heuristic
    /// Default: 2.5
    #[serde(default = "default_at_risk_days")]
    pub at_risk_days: f64,
}

fn default_window_years() -> u32 {
    6
}

fn default_required_days() -> f64 {
    3.0
}

fn default_hours_per_day() -> f64 {
    7.15
}

fn default_live_ratio_threshold() -> f64 {
    0.70
}

fn default_at_risk_window_years() -> u32 {
    5
}

fn default_at_risk_days() -> f64 {
    2.5
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            window_years: default_window_years(),
            required_days: default_required_days(),
            hours_per_day: default_hours_per_day(),
            live_ratio_threshold: default_live_ratio_threshold(),
            at_risk_window_years: default_at_risk_window_years(),
            at_risk_days: default_at_risk_days(),
        }
    }
}

/// Round to thousandths of an hour. The regulatory thresholds are exact
/// short decimals; the float product 3.0 * 7.15 is not quite 21.45, and
/// an inclusive `total >= required` comparison must use the exact value.
fn round_hours(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

impl ComplianceConfig {
    /// Required hours inside the compliance window.
    #[must_use]
    pub fn required_hours(&self) -> f64 {
        round_hours(self.required_days * self.hours_per_day)
    }

    /// Hour threshold of the at-risk heuristic.
    #[must_use]
    pub fn at_risk_hours(&self) -> f64 {
        round_hours(self.at_risk_days * self.hours_per_day)
    }
}

impl Config {
    /// Load configuration.
    ///
    /// Resolution order: explicit path argument, `RECERT_CONFIG` env var,
    /// `recert.toml` next to the database, then built-in defaults. The
    /// `RECERT_DB` env var overrides the database path last.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("RECERT_CONFIG").ok().map(PathBuf::from));

        let path = explicit.unwrap_or_else(|| PathBuf::from("recert.toml"));
        if path.exists() {
            config = Self::load_file(&path)?;
        }

        if let Ok(db) = std::env::var("RECERT_DB") {
            config.database.path = PathBuf::from(db);
        }

        config.validate()?;
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| RecertError::Config(format!("read config {}: {err}", path.display())))?;
        toml::from_str(&raw)
            .map_err(|err| RecertError::Config(format!("parse config {}: {err}", path.display())))
    }

    /// Reject configs that would make the thresholds meaningless.
    pub fn validate(&self) -> Result<()> {
        let c = &self.compliance;
        if c.window_years == 0 {
            return Err(RecertError::Config("window_years must be positive".into()));
        }
        if c.hours_per_day <= 0.0 || c.required_days < 0.0 || c.at_risk_days < 0.0 {
            return Err(RecertError::Config(
                "hour and day thresholds must be non-negative".into(),
            ));
        }
        if !(0.0..=1.0).contains(&c.live_ratio_threshold) {
            return Err(RecertError::Config(
                "live_ratio_threshold must be between 0.0 and 1.0".into(),
            ));
        }
        Ok(())
    }
}
