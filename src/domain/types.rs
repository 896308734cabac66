//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during estimation
//! - exported to JSON/CSV
//! - reloaded later for plotting

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// One subject: time under observation and whether the event was seen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Time from entry to event or censoring.
    pub duration: f64,
    /// `true` = event observed at `duration`, `false` = censored at `duration`.
    pub event_observed: bool,
}

impl Observation {
    pub fn new(duration: f64, event_observed: bool) -> Self {
        Self {
            duration,
            event_observed,
        }
    }

    pub fn event(duration: f64) -> Self {
        Self::new(duration, true)
    }

    pub fn censored(duration: f64) -> Self {
        Self::new(duration, false)
    }

    /// Durations must be finite and non-negative.
    pub fn validate(&self, index: usize) -> Result<(), DataError> {
        if !self.duration.is_finite() {
            return Err(DataError::invalid_observation(index, "duration is not finite"));
        }
        if self.duration < 0.0 {
            return Err(DataError::invalid_observation(
                index,
                format!("duration {} is negative", self.duration),
            ));
        }
        Ok(())
    }
}

/// One row of the product-limit table (one distinct event time).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub time: f64,
    /// Cumulative survival probability; holds on `[time, next time)`.
    pub survival: f64,
    /// Subjects with `duration >= time`.
    pub at_risk: usize,
    /// Events at exactly `time`.
    pub events: usize,
    /// Censorings at exactly `time`.
    pub censored: usize,
    /// Greenwood standard error of `survival`.
    pub std_err: f64,
    /// 95% pointwise limits (log(-log) transform).
    pub ci_lower: f64,
    pub ci_upper: f64,
}

/// Kaplan-Meier estimate: a right-continuous, non-increasing step function.
///
/// `points` only holds event times. Before the first one the survival
/// probability is 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivalCurve {
    pub points: Vec<CurvePoint>,
    /// Durations of censored subjects (sorted, duplicates kept).
    pub censor_times: Vec<f64>,
    pub n_observations: usize,
    pub n_events: usize,
    pub n_censored: usize,
    /// Longest follow-up time in the dataset.
    pub max_duration: f64,
}

impl SurvivalCurve {
    /// Step-post lookup of `S(t)`.
    pub fn survival_at(&self, t: f64) -> f64 {
        let idx = self.points.partition_point(|p| p.time <= t);
        if idx == 0 {
            1.0
        } else {
            self.points[idx - 1].survival
        }
    }

    /// Smallest event time at which `S(t) <= 1 - p`.
    ///
    /// `None` when the curve never falls that far ("not reached").
    pub fn quantile(&self, p: f64) -> Option<f64> {
        if !(0.0..=1.0).contains(&p) {
            return None;
        }
        let level = 1.0 - p;
        self.points
            .iter()
            .find(|pt| pt.survival <= level + 1e-12)
            .map(|pt| pt.time)
    }

    pub fn median(&self) -> Option<f64> {
        self.quantile(0.5)
    }

    /// True when no event time produced a drop (e.g. censoring-only data).
    pub fn is_flat(&self) -> bool {
        self.points.iter().all(|p| p.survival >= 1.0)
    }

    /// Last event time, if any event was observed.
    pub fn last_event_time(&self) -> Option<f64> {
        self.points.last().map(|p| p.time)
    }
}

/// Where the observations of a run came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum DataSource {
    Uploaded { path: PathBuf },
    Reference,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Uploaded { path } => write!(f, "uploaded ({})", path.display()),
            DataSource::Reference => write!(f, "built-in reference dataset"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
}

/// A user-visible message about how the dataset was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn is_warning(&self) -> bool {
        self.level == NoticeLevel::Warning
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct KmConfig {
    /// `None` means "use the reference dataset".
    pub input: Option<PathBuf>,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    /// Draw `+` at censoring times.
    pub censor_marks: bool,
    /// Raw rows shown in the data preview.
    pub preview_rows: usize,
    pub export_table: Option<PathBuf>,
    pub export_curve: Option<PathBuf>,
}

impl Default for KmConfig {
    fn default() -> Self {
        Self {
            input: None,
            plot: true,
            plot_width: 100,
            plot_height: 25,
            censor_marks: false,
            preview_rows: 10,
            export_table: None,
            export_curve: None,
        }
    }
}

/// A saved curve file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub source: DataSource,
    pub curve: SurvivalCurve,
}
