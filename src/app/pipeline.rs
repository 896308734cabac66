//! Shared "estimate pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! read table -> validate (or fall back to the reference cohort) -> estimate -> plot data
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::io::Read;
use std::path::Path;

use log::{info, warn};

use crate::data::reference_observations;
use crate::domain::{DataSource, KmConfig, Notice, Observation, SurvivalCurve};
use crate::error::{AppError, DataError};
use crate::estimate::estimate;
use crate::io::ingest::{IngestedData, RawTable, extract_observations, open_table, read_table};
use crate::plot::{StepPlot, step_plot};

pub const UPLOADED_NOTICE: &str = "Using uploaded data for survival analysis.";

/// The observations of a run plus how they were obtained.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub source: DataSource,
    pub notice: Notice,
    pub observations: Vec<Observation>,
    /// The uploaded table, kept for previews even when it was rejected.
    pub table: Option<RawTable>,
    /// Present only when the uploaded table was used.
    pub ingest: Option<IngestedData>,
}

impl Dataset {
    /// The built-in cohort with a warning explaining why it is in use.
    pub fn reference(reason: impl Into<String>) -> Self {
        Self {
            source: DataSource::Reference,
            notice: Notice::warning(reason),
            observations: reference_observations(),
            table: None,
            ingest: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == DataSource::Reference
    }
}

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub dataset: Dataset,
    pub curve: SurvivalCurve,
    pub plot: StepPlot,
}

/// Resolve the input path (if any) into a dataset.
///
/// Only failing to open the file is an error; unusable contents fall back to
/// the reference cohort.
pub fn resolve_dataset(input: Option<&Path>) -> Result<Dataset, AppError> {
    let Some(path) = input else {
        info!("no input table supplied; using reference cohort");
        return Ok(Dataset::reference(
            "No dataset supplied. Using the built-in reference dataset (20 patients).",
        ));
    };

    let file = open_table(path)?;
    Ok(load_dataset(
        file,
        DataSource::Uploaded {
            path: path.to_path_buf(),
        },
    ))
}

/// Read a table and validate it, substituting the reference cohort on `DataError`.
pub fn load_dataset<R: Read>(reader: R, source: DataSource) -> Dataset {
    let table = match read_table(reader) {
        Ok(table) => table,
        Err(err) => return fallback(err, None),
    };

    match extract_observations(&table) {
        Ok(ingest) => {
            info!(
                "loaded {} observations from {source} ({} rows skipped)",
                ingest.rows_used,
                ingest.row_errors.len()
            );
            Dataset {
                source,
                notice: Notice::success(UPLOADED_NOTICE),
                observations: ingest.observations.clone(),
                table: Some(table),
                ingest: Some(ingest),
            }
        }
        Err(err) => fallback(err, Some(table)),
    }
}

fn fallback(err: DataError, table: Option<RawTable>) -> Dataset {
    warn!("falling back to reference cohort: {err}");
    let reason = match err {
        DataError::MissingColumn { .. } => {
            "Columns 'time' (duration) and 'event' (1=death/event, 0=censored) not found.".to_string()
        }
        other => format!("Dataset unusable ({other})."),
    };
    let mut dataset = Dataset::reference(format!("{reason} Using the built-in reference dataset."));
    dataset.table = table;
    dataset
}

/// Execute the full pipeline for a config.
pub fn run_estimate(config: &KmConfig) -> Result<RunOutput, AppError> {
    let dataset = resolve_dataset(config.input.as_deref())?;
    run_with_dataset(dataset)
}

/// Estimate and prepare plot data for an already-resolved dataset.
pub fn run_with_dataset(dataset: Dataset) -> Result<RunOutput, AppError> {
    let curve = estimate(&dataset.observations)?;
    let plot = step_plot(&curve);
    info!(
        "estimated curve: {} event times, median {:?}",
        curve.points.len(),
        curve.median()
    );
    Ok(RunOutput { dataset, curve, plot })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NoticeLevel;

    fn uploaded() -> DataSource {
        DataSource::Uploaded {
            path: "upload.csv".into(),
        }
    }

    #[test]
    fn valid_upload_is_used() {
        let dataset = load_dataset("time,event\n5,1\n6,0\n6,1\n7,1\n".as_bytes(), uploaded());
        assert_eq!(dataset.source, uploaded());
        assert_eq!(dataset.notice.level, NoticeLevel::Success);
        assert_eq!(dataset.observations.len(), 4);

        let run = run_with_dataset(dataset).unwrap();
        assert_eq!(run.curve.points.len(), 3);
        assert_eq!(run.curve.median(), Some(6.0));
    }

    #[test]
    fn missing_event_column_falls_back_with_warning() {
        let dataset = load_dataset("PatientID,time\n1,5\n2,6\n".as_bytes(), uploaded());
        assert!(dataset.is_fallback());
        assert!(dataset.notice.is_warning());
        assert!(dataset.notice.message.contains("not found"));
        assert_eq!(dataset.observations, reference_observations());
        // The rejected upload is still available for preview.
        assert_eq!(dataset.table.as_ref().map(|t| t.records.len()), Some(2));

        let run = run_with_dataset(dataset).unwrap();
        assert_eq!(run.curve.n_observations, 20);
    }

    #[test]
    fn empty_after_validation_falls_back() {
        let dataset = load_dataset("time,event\nn/a,1\n".as_bytes(), uploaded());
        assert!(dataset.is_fallback());
        assert!(dataset.notice.message.contains("no valid rows"));
    }

    #[test]
    fn no_input_uses_reference() {
        let dataset = resolve_dataset(None).unwrap();
        assert!(dataset.is_fallback());
        assert!(dataset.notice.is_warning());
    }

    #[test]
    fn missing_file_is_a_hard_error() {
        let err = resolve_dataset(Some(Path::new("definitely/not/here.csv"))).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn resolves_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cohort.csv");
        crate::data::write_fixture_csv(&path, &crate::data::fixed_fixture()).unwrap();

        let run = run_estimate(&KmConfig {
            input: Some(path.clone()),
            ..KmConfig::default()
        })
        .unwrap();
        assert_eq!(run.dataset.source, DataSource::Uploaded { path });
        assert_eq!(run.curve.n_observations, 20);
        assert_eq!(run.plot.vertices[0], (0.0, 1.0));
    }
}
