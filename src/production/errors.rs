//! Error types for the structural TFP model.
//!
//! This module defines [`TfpError`], the single error enum for panel
//! shapes, model data, parameter layouts, domain failures of the CES
//! aggregate, TFP recovery and fitting. It converts to and from
//! [`OptError`] at the optimizer boundary and, with the `python-bindings`
//! feature, to `PyErr`.
//!
//! ## Conventions
//! - Row indices are 0-based and refer to the state-major observation
//!   order (row `i` = state `i / T`, year `i % T`).
//! - Shape errors are raised before any residual is evaluated.
use crate::{inference::errors::InferenceError, optimization::errors::OptError};
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*};

/// Result alias for TFP model operations that may produce [`TfpError`].
pub type TfpResult<T> = Result<T, TfpError>;

#[derive(Debug, Clone, PartialEq)]
pub enum TfpError {
    // ---- Panel shape ----
    /// Panel dimensions must both be at least one.
    InvalidPanelShape {
        n_states: usize,
        n_years: usize,
        reason: &'static str,
    },

    // ---- Data ----
    /// The observation matrix must have exactly four columns.
    DataColumnMismatch {
        expected: usize,
        actual: usize,
    },
    /// The observation matrix must have `S·T` rows.
    DataRowMismatch {
        expected: usize,
        actual: usize,
    },
    /// Every observation must be finite.
    NonFiniteData {
        row: usize,
        col: usize,
        value: f64,
    },

    // ---- Parameters ----
    /// Flat parameter vector has the wrong length for the layout.
    ThetaLengthMismatch {
        expected: usize,
        actual: usize,
    },
    /// State fixed-effect segment has the wrong length.
    StateEffectsLengthMismatch {
        expected: usize,
        actual: usize,
    },
    /// Year fixed-effect segment has the wrong length.
    TimeEffectsLengthMismatch {
        expected: usize,
        actual: usize,
    },
    /// Task-share segment disagrees with the configured specification.
    TaskShareLengthMismatch {
        expected: usize,
        actual: usize,
    },
    /// Parameter values must be finite.
    NonFiniteParameter {
        index: usize,
        value: f64,
    },
    /// Initial-guess constants must be finite.
    InvalidInitValue {
        value: f64,
    },

    // ---- Bounds ----
    /// A per-segment bound is invalid (NaN or `lower >= upper`).
    InvalidBound {
        name: &'static str,
        lower: f64,
        upper: f64,
    },

    // ---- Domain ----
    /// The CES labor aggregate is not finite for an observation.
    NonFiniteLabor {
        row: usize,
        value: f64,
    },
    /// `1 − θ` is too close to zero to invert the production function.
    DegenerateCapitalShare {
        value: f64,
    },
    /// Recovered TFP is not finite for an observation.
    NonFiniteTfp {
        row: usize,
        value: f64,
    },
    /// Residual vector passed to recovery has the wrong length.
    ResidualLengthMismatch {
        expected: usize,
        actual: usize,
    },

    // ---- Fitting ----
    /// The optimizer stopped without meeting a convergence criterion.
    NotConverged {
        status: String,
        iterations: usize,
    },
    /// Operation requires a fitted model.
    ModelNotFitted,
    /// Fewer observations than parameters leaves no residual degrees of
    /// freedom for inference.
    InsufficientDof {
        n_obs: usize,
        n_params: usize,
    },
    /// Wrapped optimizer failure.
    Optimization(OptError),
    /// Wrapped inference failure other than degrees of freedom.
    Inference(InferenceError),
}

impl std::error::Error for TfpError {}

impl std::fmt::Display for TfpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Panel shape ----
            TfpError::InvalidPanelShape { n_states, n_years, reason } => {
                write!(f, "Invalid panel shape ({n_states} states x {n_years} years): {reason}")
            }

            // ---- Data ----
            TfpError::DataColumnMismatch { expected, actual } => {
                write!(f, "Data must have {expected} columns [logY, logK, F, D], found {actual}")
            }
            TfpError::DataRowMismatch { expected, actual } => {
                write!(f, "Data must have {expected} rows (states x years), found {actual}")
            }
            TfpError::NonFiniteData { row, col, value } => {
                write!(f, "Non-finite data at row {row}, column {col}: {value}")
            }

            // ---- Parameters ----
            TfpError::ThetaLengthMismatch { expected, actual } => {
                write!(f, "Parameter vector length mismatch: expected {expected}, actual {actual}")
            }
            TfpError::StateEffectsLengthMismatch { expected, actual } => {
                write!(f, "State effects length mismatch: expected {expected}, actual {actual}")
            }
            TfpError::TimeEffectsLengthMismatch { expected, actual } => {
                write!(f, "Year effects length mismatch: expected {expected}, actual {actual}")
            }
            TfpError::TaskShareLengthMismatch { expected, actual } => {
                write!(f, "Task share length mismatch: expected {expected}, actual {actual}")
            }
            TfpError::NonFiniteParameter { index, value } => {
                write!(f, "Non-finite parameter at index {index}: {value}")
            }
            TfpError::InvalidInitValue { value } => {
                write!(f, "Invalid initial value {value}: must be finite")
            }

            // ---- Bounds ----
            TfpError::InvalidBound { name, lower, upper } => {
                write!(f, "Invalid bound for {name}: [{lower}, {upper}]")
            }

            // ---- Domain ----
            TfpError::NonFiniteLabor { row, value } => {
                write!(f, "CES labor aggregate is not finite at row {row}: {value}")
            }
            TfpError::DegenerateCapitalShare { value } => {
                write!(f, "Capital share {value} leaves 1 - theta too close to zero to recover TFP")
            }
            TfpError::NonFiniteTfp { row, value } => {
                write!(f, "Recovered TFP is not finite at row {row}: {value}")
            }
            TfpError::ResidualLengthMismatch { expected, actual } => {
                write!(f, "Residual length mismatch: expected {expected}, actual {actual}")
            }

            // ---- Fitting ----
            TfpError::NotConverged { status, iterations } => {
                write!(f, "Estimation did not converge after {iterations} iterations: {status}")
            }
            TfpError::ModelNotFitted => {
                write!(f, "Model has not been fitted yet")
            }
            TfpError::InsufficientDof { n_obs, n_params } => {
                write!(
                    f,
                    "Insufficient degrees of freedom: {n_obs} observations for {n_params} parameters"
                )
            }
            TfpError::Optimization(err) => {
                write!(f, "Optimization error: {err}")
            }
            TfpError::Inference(err) => {
                write!(f, "{err}")
            }
        }
    }
}

impl From<OptError> for TfpError {
    fn from(err: OptError) -> Self {
        match err {
            OptError::ThetaLengthMismatch { expected, actual } => {
                TfpError::ThetaLengthMismatch { expected, actual }
            }
            OptError::InvalidThetaInput { index, value } => {
                TfpError::NonFiniteParameter { index, value }
            }
            OptError::DomainViolation { index, value, .. } => {
                TfpError::NonFiniteLabor { row: index, value }
            }
            other => TfpError::Optimization(other),
        }
    }
}

impl From<TfpError> for OptError {
    fn from(err: TfpError) -> Self {
        match err {
            TfpError::ThetaLengthMismatch { expected, actual } => {
                OptError::ThetaLengthMismatch { expected, actual }
            }
            TfpError::NonFiniteParameter { index, value } => {
                OptError::InvalidThetaInput { index, value }
            }
            TfpError::NonFiniteLabor { row, value } => OptError::DomainViolation {
                index: row,
                value,
                reason: "CES labor aggregate is not finite",
            },
            TfpError::Optimization(inner) => inner,
            other => OptError::ModelError { text: other.to_string() },
        }
    }
}

impl From<InferenceError> for TfpError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::InsufficientDof { n_obs, n_params } => {
                TfpError::InsufficientDof { n_obs, n_params }
            }
            other => TfpError::Inference(other),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl std::convert::From<TfpError> for PyErr {
    fn from(err: TfpError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Scope ---------------------------------------------------------------
    //
    // These tests cover:
    // - Round trip of domain and shape errors across the optimizer boundary.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // A CES domain failure raised inside the residual map survives the trip
    // through `OptError` with its row index intact.
    //
    // Given
    // -----
    // - `TfpError::NonFiniteLabor { row: 7 }`.
    //
    // Expect
    // ------
    // - Converting to `OptError` and back yields the same variant and row.
    fn domain_error_round_trips_through_opt_error() {
        let err = TfpError::NonFiniteLabor { row: 7, value: f64::INFINITY };
        let back = TfpError::from(OptError::from(err));
        assert_eq!(back, TfpError::NonFiniteLabor { row: 7, value: f64::INFINITY });
    }

    #[test]
    // Purpose
    // -------
    // Errors without an optimizer counterpart are carried as text and
    // other optimizer errors are wrapped, not lost.
    //
    // Given
    // -----
    // - `TfpError::ModelNotFitted` and `OptError::NoTolerancesProvided`.
    //
    // Expect
    // ------
    // - `OptError::ModelError` with the display text; `TfpError::Optimization`.
    fn unmatched_errors_are_wrapped() {
        let opt = OptError::from(TfpError::ModelNotFitted);
        assert_eq!(opt, OptError::ModelError { text: "Model has not been fitted yet".to_string() });
        assert_eq!(
            TfpError::from(OptError::NoTolerancesProvided),
            TfpError::Optimization(OptError::NoTolerancesProvided)
        );
    }
}
