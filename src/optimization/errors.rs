use argmin::core::{ArgminError, Error};

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Jacobian ----
    /// Implies that finite differences should be used.
    JacobianNotImplemented,

    /// Jacobian dimensions do not match `(n_residuals, n_params)`.
    JacobianDimMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Jacobian entries need to be finite.
    InvalidJacobian {
        row: usize,
        col: usize,
        value: f64,
    },

    // ---- Residuals ----
    /// Residual vector changed length between evaluations.
    ResidualDimMismatch {
        expected: usize,
        found: usize,
    },

    /// Residual entries need to be finite.
    NonFiniteResidual {
        index: usize,
        value: f64,
    },

    /// The model rejected a parameter vector outside its domain.
    DomainViolation {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    /// Model-side failure that has no dedicated optimizer variant.
    ModelError {
        text: String,
    },

    // ---- Gradient ----
    /// Gradient dimensions do not match parameter dimensions.
    GradientDimMismatch {
        expected: usize,
        found: usize,
    },

    /// Gradient elements need to be finite.
    InvalidGradient {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    // ---- LsOptions ----
    /// Gradient tolerance needs to be positive and finite.
    InvalidTolGrad {
        tol: f64,
        reason: &'static str,
    },
    /// Cost change tolerance needs to be positive and finite.
    InvalidTolCost {
        tol: f64,
        reason: &'static str,
    },
    /// Step tolerance needs to be positive and finite.
    InvalidTolStep {
        tol: f64,
        reason: &'static str,
    },
    /// Maximum iterations needs to be positive.
    InvalidMaxIter {
        max_iter: usize,
        reason: &'static str,
    },
    /// At least one tolerance must be provided.
    NoTolerancesProvided,

    /// Invalid line searcher name.
    InvalidLineSearch {
        name: String,
        reason: &'static str,
    },

    /// Invalid solver name.
    InvalidSolver {
        name: String,
        reason: &'static str,
    },

    /// lbfgs_mem needs to be at least 1.
    InvalidLBFGSMem {
        mem: usize,
        reason: &'static str,
    },

    /// Initial Levenberg–Marquardt damping needs to be positive and finite.
    InvalidDamping {
        value: f64,
        reason: &'static str,
    },

    // ---- Bounds ----
    /// Lower bound must be strictly below the upper bound and not NaN.
    InvalidBound {
        index: usize,
        lower: f64,
        upper: f64,
        reason: &'static str,
    },

    /// Bound arrays must match the parameter dimension.
    BoundsLengthMismatch {
        expected: usize,
        actual: usize,
    },

    // ---- Cost function ----
    /// Cost function returned a non-finite value.
    NonFiniteCost {
        value: f64,
    },

    // ---- Optimizer outcome ----
    /// Estimated parameters must be finite.
    InvalidThetaHat {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    /// Theta hat is missing
    MissingThetaHat,

    // ---- Parameter input ----
    /// Theta length does not match the problem dimension.
    ThetaLengthMismatch {
        expected: usize,
        actual: usize,
    },

    /// Optimization input must have finite values.
    InvalidThetaInput {
        index: usize,
        value: f64,
    },

    // ---- Argmin ----
    /// A native argmin error; `kind` names the argmin variant.
    Argmin {
        kind: &'static str,
        text: String,
    },
    /// Any other error raised inside the argmin executor.
    BackendError {
        text: String,
    },
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Jacobian ----
            OptError::JacobianNotImplemented => {
                write!(f, "Analytic Jacobian not implemented")
            }
            OptError::JacobianDimMismatch { expected, found } => {
                write!(f, "Jacobian dimension mismatch: expected {expected:?}, found {found:?}")
            }
            OptError::InvalidJacobian { row, col, value } => {
                write!(f, "Invalid Jacobian at ({row}, {col}): {value}, must be finite")
            }

            // ---- Residuals ----
            OptError::ResidualDimMismatch { expected, found } => {
                write!(f, "Residual dimension mismatch: expected {expected}, found {found}")
            }
            OptError::NonFiniteResidual { index, value } => {
                write!(f, "Non-finite residual at index {index}: {value}")
            }
            OptError::DomainViolation { index, value, reason } => {
                write!(f, "Domain violation at index {index}: {value}: {reason}")
            }
            OptError::ModelError { text } => {
                write!(f, "Model error: {text}")
            }

            // ---- Gradient ----
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }

            // ---- LsOptions ----
            OptError::InvalidTolGrad { tol, reason } => {
                write!(f, "Invalid gradient tolerance {tol}: {reason}")
            }
            OptError::InvalidTolCost { tol, reason } => {
                write!(f, "Invalid cost function change tolerance {tol}: {reason}")
            }
            OptError::InvalidTolStep { tol, reason } => {
                write!(f, "Invalid step tolerance {tol}: {reason}")
            }
            OptError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            OptError::NoTolerancesProvided => {
                write!(f, "No tolerances provided")
            }
            OptError::InvalidLineSearch { name, reason } => {
                write!(f, "Invalid line searcher '{name}': {reason}")
            }
            OptError::InvalidSolver { name, reason } => {
                write!(f, "Invalid solver '{name}': {reason}")
            }
            OptError::InvalidLBFGSMem { mem, reason } => {
                write!(f, "Invalid L-BFGS memory {mem}: {reason}")
            }
            OptError::InvalidDamping { value, reason } => {
                write!(f, "Invalid initial damping {value}: {reason}")
            }

            // ---- Bounds ----
            OptError::InvalidBound { index, lower, upper, reason } => {
                write!(f, "Invalid bound at index {index}: [{lower}, {upper}]: {reason}")
            }
            OptError::BoundsLengthMismatch { expected, actual } => {
                write!(f, "Bounds length mismatch: expected {expected}, actual {actual}")
            }

            // ---- Cost function ----
            OptError::NonFiniteCost { value } => {
                write!(f, "Non-finite cost value: {value}")
            }

            // ---- Optimizer outcome ----
            OptError::InvalidThetaHat { index, value, reason } => {
                write!(f, "Invalid estimated parameter at index {index}: {value}: {reason}")
            }
            OptError::MissingThetaHat => {
                write!(f, "Missing estimated parameters (theta hat)")
            }

            // ---- Parameter input ----
            OptError::ThetaLengthMismatch { expected, actual } => {
                write!(f, "Theta length mismatch: expected {expected}, actual {actual}")
            }
            OptError::InvalidThetaInput { index, value } => {
                write!(f, "Invalid theta input at index {index}: {value}, must be finite")
            }

            // ---- Argmin ----
            OptError::Argmin { kind, text } => write!(f, "argmin {kind}: {text}"),
            OptError::BackendError { text } => write!(f, "Backend error: {text}"),
        }
    }
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        // Problem-side errors travel through argmin boxed as `OptError`.
        let original_err = match original_err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        match original_err.downcast::<ArgminError>() {
            Ok(argmin_err) => {
                let kind = match &argmin_err {
                    ArgminError::InvalidParameter { .. } => "invalid parameter",
                    ArgminError::NotImplemented { .. } => "not implemented",
                    ArgminError::NotInitialized { .. } => "not initialized",
                    ArgminError::ConditionViolated { .. } => "condition violated",
                    ArgminError::CheckpointNotFound { .. } => "checkpoint not found",
                    ArgminError::PotentialBug { .. } => "potential bug",
                    ArgminError::ImpossibleError { .. } => "impossible error",
                    _ => "error",
                };
                OptError::Argmin { kind, text: argmin_err.to_string() }
            }
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Scope ---------------------------------------------------------------
    //
    // These tests cover:
    // - Conversion of argmin errors into `OptError`, including the round trip
    //   of problem-side `OptError`s boxed inside `argmin::core::Error`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // A problem-side `OptError` boxed into argmin's error type comes back out
    // unchanged instead of collapsing into a `BackendError`.
    //
    // Given
    // -----
    // - `OptError::DomainViolation` converted into `argmin::core::Error`.
    //
    // Expect
    // ------
    // - `OptError::from` recovers the exact original variant.
    fn boxed_opt_error_round_trips_through_argmin_error() {
        // Arrange
        let original =
            OptError::DomainViolation { index: 3, value: f64::NAN, reason: "test domain" };
        let boxed: Error = original.clone().into();

        // Act
        let recovered = OptError::from(boxed);

        // Assert
        match recovered {
            OptError::DomainViolation { index, reason, .. } => {
                assert_eq!(index, 3);
                assert_eq!(reason, "test domain");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Native argmin errors keep their argmin kind.
    //
    // Given
    // -----
    // - `ArgminError::NotImplemented` converted into `argmin::core::Error`.
    //
    // Expect
    // ------
    // - `OptError::Argmin` tagged "not implemented".
    fn argmin_not_implemented_maps_to_wrapper_variant() {
        // Arrange
        let boxed: Error = ArgminError::NotImplemented { text: "hessian".to_string() }.into();

        // Act
        let err = OptError::from(boxed);

        // Assert
        assert!(matches!(err, OptError::Argmin { kind: "not implemented", .. }));
    }
}
