//! least_squares::finite_diff — finite-difference Jacobians and gradients.
//!
//! Purpose
//! -------
//! Provide derivative approximations for problems that do not implement an
//! analytic Jacobian, with error capture and validation, so that solvers
//! can request derivatives without depending directly on `finitediff`.
//!
//! Key behaviors
//! -------------
//! - [`fd_jacobian`] builds `∂r/∂θ` column by column with one-sided
//!   differences. The step direction respects the box and flips when the
//!   forward evaluation leaves the model's domain.
//! - [`run_fd_diff`] computes a forward-difference gradient of a scalar
//!   objective with error capture, as used by the L-BFGS adapter.
//!
//! Invariants & assumptions
//! ------------------------
//! - Any error raised by the objective during finite differencing is
//!   captured in the shared `closure_err` cell and treated as a hard
//!   failure for the gradient computation.
//! - Derivatives returned from this module satisfy [`validate_jacobian`] /
//!   [`validate_grad`].
//!
//! Testing notes
//! -------------
//! - Unit tests compare [`fd_jacobian`] with an analytic Jacobian on a
//!   linear model, check the bound-aware step flip, and cover the error
//!   propagation of [`run_fd_diff`].
use crate::optimization::{
    errors::OptResult,
    least_squares::{
        bounds::Bounds,
        traits::LeastSquares,
        types::{Grad, Jacobian, Residuals, Theta},
        validation::{validate_grad, validate_jacobian},
    },
};
use argmin::core::Error;
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// Base relative step, roughly `sqrt(f64::EPSILON)`.
pub const FD_REL_STEP: f64 = 1.490_116_119_384_765_6e-8;

/// fd_jacobian — forward/backward-difference Jacobian of a residual map.
///
/// Parameters
/// ----------
/// - `f`, `data`: the least-squares problem.
/// - `theta`: evaluation point (inside `bounds`).
/// - `r0`: residuals already evaluated at `theta`.
/// - `bounds`: box used to choose the step direction.
///
/// Returns
/// -------
/// A validated `r0.len() × theta.len()` Jacobian.
///
/// Errors
/// ------
/// - The residual error of the backward attempt when both directions fail
///   for some column.
/// - Validation errors for non-finite entries.
///
/// Notes
/// -----
/// - Step `h_j = FD_REL_STEP · max(1, |θ_j|)`; the forward step is used
///   unless it would cross the upper bound.
pub fn fd_jacobian<F: LeastSquares>(
    f: &F, theta: &Theta, data: &F::Data, r0: &Residuals, bounds: &Bounds,
) -> OptResult<Jacobian> {
    let n = r0.len();
    let k = theta.len();
    let mut jac = Jacobian::zeros((n, k));
    let mut probe = theta.clone();

    for j in 0..k {
        let h = FD_REL_STEP * theta[j].abs().max(1.0);
        let forward_fits = theta[j] + h <= bounds.upper()[j];
        let first = if forward_fits { h } else { -h };

        probe[j] = theta[j] + first;
        let (step, r_step) = match f.residuals(&probe, data) {
            Ok(r) if r.iter().all(|v| v.is_finite()) => (first, r),
            _ => {
                probe[j] = theta[j] - first;
                (-first, f.residuals(&probe, data)?)
            }
        };
        probe[j] = theta[j];

        let mut col = jac.column_mut(j);
        for i in 0..n {
            col[i] = (r_step[i] - r0[i]) / step;
        }
    }
    validate_jacobian(&jac, n, k)?;
    Ok(jac)
}

/// run_fd_diff — forward-difference gradient with error capture and validation.
///
/// Purpose
/// -------
/// Compute a forward-difference approximation to the gradient of a scalar
/// objective at `theta`, while capturing any error raised inside the
/// evaluation closure.
///
/// Parameters
/// ----------
/// - `theta`: point at which to differentiate.
/// - `func`: scalar objective returning `NaN` after storing an error in
///   `closure_err`.
/// - `closure_err`: shared error slot; cleared before differencing.
///
/// Errors
/// ------
/// - Any error captured during evaluation of `func` inside the FD routine.
/// - Validation errors for the resulting gradient.
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    let dim = theta.len();
    if let Some(err) = closure_err.take() {
        return Err(err.into());
    }
    validate_grad(&fd_grad, dim)?;
    Ok(fd_grad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::{OptError, OptResult};
    use approx::assert_abs_diff_eq;
    use argmin::core::ArgminError;
    use ndarray::{Array1, Array2, array};

    // ---- Scope ---------------------------------------------------------------
    //
    // These tests cover:
    // - `fd_jacobian` agreement with an exact Jacobian.
    // - Step-direction flip at an upper bound.
    // - Error propagation in `run_fd_diff`.
    //
    // They intentionally DO NOT cover:
    // - End-to-end solver behavior (see `lm` tests).
    // -------------------------------------------------------------------------

    /// r(θ) = y − X θ, so ∂r/∂θ = −X.
    struct Linear {
        x: Array2<f64>,
    }

    impl LeastSquares for Linear {
        type Data = Array1<f64>;

        fn residuals(&self, theta: &Theta, y: &Array1<f64>) -> OptResult<Residuals> {
            Ok(y - &self.x.dot(theta))
        }

        fn check(&self, _theta: &Theta, _y: &Array1<f64>) -> OptResult<()> {
            Ok(())
        }
    }

    /// r(θ) = θ² − 1 with θ ≤ 1 enforced by returning an error above 1.
    struct CappedSquare;

    impl LeastSquares for CappedSquare {
        type Data = ();

        fn residuals(&self, theta: &Theta, _: &()) -> OptResult<Residuals> {
            if theta[0] > 1.0 {
                return Err(OptError::DomainViolation {
                    index: 0,
                    value: theta[0],
                    reason: "above cap",
                });
            }
            Ok(array![theta[0] * theta[0] - 1.0])
        }

        fn check(&self, _theta: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }
    }

    #[test]
    // Purpose
    // -------
    // For a linear residual map the forward-difference Jacobian equals −X.
    //
    // Given
    // -----
    // - A 3×2 design `X`, an arbitrary `θ`, unbounded box.
    //
    // Expect
    // ------
    // - `fd_jacobian ≈ −X` entrywise.
    fn fd_jacobian_matches_linear_model() {
        // Arrange
        let model = Linear { x: array![[1.0, 2.0], [0.5, -1.0], [3.0, 0.0]] };
        let y = array![1.0, 2.0, 3.0];
        let theta = array![0.2, -0.4];
        let r0 = model.residuals(&theta, &y).unwrap();

        // Act
        let jac = fd_jacobian(&model, &theta, &y, &r0, &Bounds::unbounded(2)).unwrap();

        // Assert
        for ((i, j), &v) in jac.indexed_iter() {
            assert_abs_diff_eq!(v, -model.x[[i, j]], epsilon = 1e-6);
        }
    }

    #[test]
    // Purpose
    // -------
    // At the upper bound the derivative is taken with a backward step, so
    // the model is never evaluated outside its domain.
    //
    // Given
    // -----
    // - `CappedSquare` at θ = 1 with bound `θ ≤ 1`.
    //
    // Expect
    // ------
    // - `fd_jacobian` succeeds with ∂r/∂θ ≈ 2.
    fn fd_jacobian_steps_backward_at_upper_bound() {
        // Arrange
        let theta = array![1.0];
        let r0 = CappedSquare.residuals(&theta, &()).unwrap();
        let bounds = Bounds::new(array![f64::NEG_INFINITY], array![1.0]).unwrap();

        // Act
        let jac = fd_jacobian(&CappedSquare, &theta, &(), &r0, &bounds).unwrap();

        // Assert
        assert_abs_diff_eq!(jac[[0, 0]], 2.0, epsilon = 1e-6);
    }

    #[test]
    // Purpose
    // -------
    // Ensure that `run_fd_diff` propagates an error captured in `closure_err`
    // as an `OptError` via the `From<Error>` implementation.
    //
    // Given
    // -----
    // - An objective closure that writes an `ArgminError` into `closure_err`
    //   and returns `NaN`.
    //
    // Expect
    // ------
    // - `run_fd_diff` returns `Err(OptError::Argmin { kind: "not implemented", .. })`.
    fn run_fd_diff_closure_error_is_propagated() {
        // Arrange
        let theta: Theta = Array1::from(vec![1.0_f64]);
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let f = |_: &Theta| {
            let argmin_err = ArgminError::NotImplemented { text: "fd test".to_string() };
            closure_err.replace(Some(argmin_err.into()));
            f64::NAN
        };

        // Act
        let result = run_fd_diff(&theta, &f, &closure_err);

        // Assert
        match result {
            Err(OptError::Argmin { kind: "not implemented", .. }) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
