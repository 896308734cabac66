//! Error types.
//!
//! Two layers:
//! - `SurvivalError` (and its `DataError` / `ComputationError` parts) is what the
//!   library raises while reading and estimating
//! - `AppError` is what the binary reports: a message plus a process exit code

use thiserror::Error;

/// The input table cannot be turned into observations.
///
/// Recovered by the pipeline: the reference dataset is substituted and a
/// warning notice is shown.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("missing required column: `{column}`")]
    MissingColumn { column: &'static str },

    #[error("unreadable table: {message}")]
    Unreadable { message: String },

    #[error("no valid rows remain after validation ({rows_read} rows read)")]
    EmptyDataset { rows_read: usize },

    #[error("invalid observation #{index}: {message}")]
    InvalidObservation { index: usize, message: String },
}

/// The estimator reached a state that valid input cannot produce.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("estimator invariant violated at t={time}: {message}")]
pub struct ComputationError {
    pub time: f64,
    pub message: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurvivalError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Computation(#[from] ComputationError),
}

impl DataError {
    pub fn unreadable(message: impl Into<String>) -> Self {
        Self::Unreadable {
            message: message.into(),
        }
    }

    pub fn invalid_observation(index: usize, message: impl Into<String>) -> Self {
        Self::InvalidObservation {
            index,
            message: message.into(),
        }
    }
}

impl ComputationError {
    pub fn new(time: f64, message: impl Into<String>) -> Self {
        Self {
            time,
            message: message.into(),
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<SurvivalError> for AppError {
    fn from(err: SurvivalError) -> Self {
        match err {
            SurvivalError::Data(e) => AppError::new(3, format!("Data error: {e}")),
            SurvivalError::Computation(e) => AppError::new(4, format!("Computation error: {e}")),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survival_errors_map_to_exit_codes() {
        let data: AppError = SurvivalError::from(DataError::EmptyDataset { rows_read: 3 }).into();
        assert_eq!(data.exit_code(), 3);
        assert!(data.to_string().contains("3 rows read"));

        let comp: AppError = SurvivalError::from(ComputationError::new(2.0, "d > n")).into();
        assert_eq!(comp.exit_code(), 4);
        assert!(comp.to_string().contains("t=2"));
    }
}
