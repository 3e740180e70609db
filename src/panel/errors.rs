//! Error types for panel assembly.
use crate::production::errors::TfpError;
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*};

pub type PanelResult<T> = Result<T, PanelError>;

#[derive(Debug, Clone, PartialEq)]
pub enum PanelError {
    /// No macro or labor records were supplied.
    Empty,
    /// A state-year cell lacks macro data or one nativity group.
    MissingCell {
        state: u32,
        year: i32,
        what: &'static str,
    },
    /// A raw or derived value is non-finite or out of range.
    InvalidValue {
        state: u32,
        year: i32,
        field: &'static str,
        value: f64,
    },
    /// A column attached to the panel has the wrong length.
    LengthMismatch {
        expected: usize,
        actual: usize,
    },
    /// The assembled panel was rejected by the model layer.
    Model(TfpError),
}

impl std::error::Error for PanelError {}

impl std::fmt::Display for PanelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PanelError::Empty => write!(f, "Panel Error: no records supplied"),
            PanelError::MissingCell { state, year, what } => {
                write!(f, "Panel Error: unbalanced panel, state {state} year {year} has no {what}")
            }
            PanelError::InvalidValue { state, year, field, value } => {
                write!(f, "Panel Error: invalid {field} = {value} for state {state} year {year}")
            }
            PanelError::LengthMismatch { expected, actual } => {
                write!(f, "Panel Error: expected {expected} values, got {actual}")
            }
            PanelError::Model(err) => write!(f, "Panel Error: {err}"),
        }
    }
}

impl From<TfpError> for PanelError {
    fn from(err: TfpError) -> Self {
        PanelError::Model(err)
    }
}

#[cfg(feature = "python-bindings")]
impl std::convert::From<PanelError> for PyErr {
    fn from(err: PanelError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
