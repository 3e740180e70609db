//! Validation helpers for least-squares optimization.
//!
//! This module centralizes the consistency checks used across the
//! optimizer interface:
//!
//! - **Tolerance checks**: [`verify_tol_grad`], [`verify_tol_cost`],
//!   [`verify_tol_step`] ensure numeric tolerances are finite and strictly
//!   positive when provided.
//! - **Residual / Jacobian validation**: [`validate_residuals`] and
//!   [`validate_jacobian`] enforce shapes and finite entries.
//! - **Gradient validation**: [`validate_grad`].
//! - **Parameter vectors**: [`validate_theta_input`] and
//!   [`validate_theta_hat`].
//! - **Objective values**: [`validate_value`].
use crate::optimization::{
    errors::{OptError, OptResult},
    least_squares::types::{Grad, Jacobian, Residuals, Theta},
};

/// Validate the optional gradient‐norm tolerance.
///
/// # Errors
/// Returns [`OptError::InvalidTolGrad`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_grad(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Validate the optional relative cost‐change tolerance.
///
/// # Errors
/// Returns [`OptError::InvalidTolCost`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_cost(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Validate the optional relative step tolerance.
///
/// # Errors
/// Returns [`OptError::InvalidTolStep`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_step(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolStep { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolStep { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Validate a residual vector against its expected length and finiteness.
///
/// # Errors
/// - [`OptError::ResidualDimMismatch`] if `residuals.len() != expected`.
/// - [`OptError::NonFiniteResidual`] for the first non-finite entry.
pub fn validate_residuals(residuals: &Residuals, expected: usize) -> OptResult<()> {
    if residuals.len() != expected {
        return Err(OptError::ResidualDimMismatch { expected, found: residuals.len() });
    }
    for (index, &value) in residuals.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::NonFiniteResidual { index, value });
        }
    }
    Ok(())
}

/// Validate the shape and entries of a Jacobian.
///
/// # Errors
/// - [`OptError::JacobianDimMismatch`] if the shape is not `rows × cols`.
/// - [`OptError::InvalidJacobian`] for the first non-finite entry.
pub fn validate_jacobian(jacobian: &Jacobian, rows: usize, cols: usize) -> OptResult<()> {
    if jacobian.nrows() != rows || jacobian.ncols() != cols {
        return Err(OptError::JacobianDimMismatch {
            expected: (rows, cols),
            found: (jacobian.nrows(), jacobian.ncols()),
        });
    }
    for ((row, col), &value) in jacobian.indexed_iter() {
        if !value.is_finite() {
            return Err(OptError::InvalidJacobian { row, col, value });
        }
    }
    Ok(())
}

/// Validate a gradient vector against dimension and finiteness.
///
/// # Errors
/// - [`OptError::GradientDimMismatch`] if length does not match `dim`.
/// - [`OptError::InvalidGradient`] with the index/value/reason of the first
///   offending element.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

/// Require every entry of an input parameter vector to be finite.
///
/// # Errors
/// Returns [`OptError::InvalidThetaInput`] for the first non-finite entry.
pub fn validate_theta_input(theta: &Theta) -> OptResult<()> {
    for (index, &value) in theta.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidThetaInput { index, value });
        }
    }
    Ok(())
}

/// Validate and unwrap an estimated parameter vector (`theta_hat`).
///
/// # Errors
/// - [`OptError::MissingThetaHat`] if no vector was provided.
/// - [`OptError::InvalidThetaHat`] if any element is non-finite.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    match theta_hat {
        Some(t) => {
            for (index, &value) in t.iter().enumerate() {
                if !value.is_finite() {
                    return Err(OptError::InvalidThetaHat {
                        index,
                        value,
                        reason: "Parameter estimates must be finite.",
                    });
                }
            }
            Ok(t)
        }
        None => Err(OptError::MissingThetaHat),
    }
}

/// Validate that a scalar cost value is finite.
///
/// # Errors
/// Returns [`OptError::NonFiniteCost`] if the value is `NaN` or infinite.
pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}
