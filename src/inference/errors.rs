//! Error handling for post-estimation inference.
//!
//! `InferenceError` covers the failures of the classical least-squares
//! covariance: too few observations for the parameter count, inconsistent
//! dimensions, non-finite inputs, and Student-t construction failures from
//! `statrs`. An alias `InferenceResult<T>` standardizes the return type.
use statrs::distribution::StudentsTError;

#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    // ---- Sample size ----
    /// No residual degrees of freedom remain (`n_obs <= n_params`).
    InsufficientDof {
        n_obs: usize,
        n_params: usize,
    },

    // ---- Inputs ----
    /// Jacobian column count disagrees with the parameter vector.
    DimensionMismatch {
        expected: usize,
        actual: usize,
    },
    /// Jacobian, estimate or SSR holds a non-finite value.
    NonFiniteInput {
        name: &'static str,
    },

    // ---- Distribution ----
    /// The reference Student-t distribution could not be constructed.
    Distribution {
        text: String,
    },
}

pub type InferenceResult<T> = Result<T, InferenceError>;

impl std::error::Error for InferenceError {}

impl From<StudentsTError> for InferenceError {
    fn from(err: StudentsTError) -> Self {
        InferenceError::Distribution { text: err.to_string() }
    }
}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Sample size ----
            InferenceError::InsufficientDof { n_obs, n_params } => write!(
                f,
                "Inference Error: {} observations leave no degrees of freedom for {} parameters",
                n_obs, n_params
            ),

            // ---- Inputs ----
            InferenceError::DimensionMismatch { expected, actual } => write!(
                f,
                "Inference Error: Jacobian has {} columns but {} parameters were given",
                actual, expected
            ),
            InferenceError::NonFiniteInput { name } => {
                write!(f, "Inference Error: Non-finite values in {}", name)
            }

            // ---- Distribution ----
            InferenceError::Distribution { text } => {
                write!(f, "Inference Error: Student-t distribution: {}", text)
            }
        }
    }
}
