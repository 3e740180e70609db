//! Adapter that exposes a user `LeastSquares` problem to `argmin`.
//!
//! The L-BFGS path runs in an unconstrained coordinate `u` with
//! `θ = T(u)` given by the box transforms of [`Bounds`]. The cost is
//! `SSR(T(u))`. With an analytic Jacobian the gradient is
//! `∇_u SSR = (2 Jᵀ r) ⊙ T'(u)`; otherwise we finite-difference the cost
//! closure directly in `u`, so no chain rule is needed in that branch.
use std::cell::RefCell;

use crate::optimization::{
    errors::OptError,
    least_squares::{
        bounds::Bounds,
        finite_diff::run_fd_diff,
        traits::LeastSquares,
        types::{Cost, Grad, Theta},
        validation::{validate_grad, validate_jacobian},
    },
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Bridges a user `LeastSquares` problem to `argmin`'s `CostFunction` and
/// `Gradient` in unconstrained coordinates.
#[derive(Debug, Clone)]
pub struct SsrAdapter<'a, F: LeastSquares> {
    pub f: &'a F,
    pub data: &'a F::Data,
    pub bounds: &'a Bounds,
}

impl<'a, F: LeastSquares> SsrAdapter<'a, F> {
    /// Construct a new adapter over a user problem, its data, and its box.
    pub fn new(f: &'a F, data: &'a F::Data, bounds: &'a Bounds) -> Self {
        Self { f, data, bounds }
    }

    /// Residual sum of squares at a constrained point `θ`.
    pub fn ssr_at(&self, theta: &Theta) -> Result<Cost, Error> {
        let r = self.f.residuals(theta, self.data)?;
        let ssr = r.dot(&r);
        if !ssr.is_finite() {
            return Err((OptError::NonFiniteCost { value: ssr }).into());
        }
        Ok(ssr)
    }
}

impl<'a, F: LeastSquares> CostFunction for SsrAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate `SSR(T(u))`.
    ///
    /// # Errors
    /// Propagates residual errors and rejects non-finite sums.
    fn cost(&self, u: &Self::Param) -> Result<Self::Output, Error> {
        let theta = self.bounds.to_constrained(u);
        self.ssr_at(&theta)
    }
}

impl<'a, F: LeastSquares> Gradient for SsrAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Evaluate `∇_u SSR(T(u))`.
    ///
    /// Behavior:
    /// - With an analytic Jacobian: validate it, form `2 Jᵀ r` and scale
    ///   elementwise by `T'(u)`.
    /// - Otherwise: central differences of the cost in `u`, retried with
    ///   forward differences if any cost evaluation failed or the result
    ///   is not finite.
    fn gradient(&self, u: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = u.len();
        let theta = self.bounds.to_constrained(u);
        match self.f.jacobian(&theta, self.data) {
            Ok(jac) => {
                let r = self.f.residuals(&theta, self.data)?;
                validate_jacobian(&jac, r.len(), dim)?;
                let grad_theta = jac.t().dot(&r) * 2.0;
                let grad = grad_theta * self.bounds.chain_factors(u);
                validate_grad(&grad, dim)?;
                Ok(grad)
            }
            Err(OptError::JacobianNotImplemented) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                let cost_func = |u: &Theta| -> f64 {
                    match self.cost(u) {
                        Ok(val) => val,
                        Err(e) => {
                            let mut slot = closure_err.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            f64::NAN
                        }
                    }
                };
                let fd_grad = u.central_diff(&cost_func);
                if closure_err.borrow().is_some() || validate_grad(&fd_grad, dim).is_err() {
                    return Ok(run_fd_diff(u, &cost_func, &closure_err)?);
                }
                Ok(fd_grad)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{
        errors::OptResult,
        least_squares::types::{Jacobian, Residuals},
    };
    use approx::assert_abs_diff_eq;
    use ndarray::{Array1, array};

    // ---- Scope ---------------------------------------------------------------
    //
    // These tests cover:
    // - The analytic-gradient branch (2 Jᵀ r with the chain rule) against
    //   finite differences of the adapter's own cost.
    // - The finite-difference branch for problems without a Jacobian.
    // -------------------------------------------------------------------------

    /// r(θ) = [θ₀ − 1, θ₀ θ₁ − 2].
    struct Curve {
        analytic: bool,
    }

    impl LeastSquares for Curve {
        type Data = ();

        fn residuals(&self, theta: &Theta, _: &()) -> OptResult<Residuals> {
            Ok(array![theta[0] - 1.0, theta[0] * theta[1] - 2.0])
        }

        fn check(&self, _theta: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }

        fn jacobian(&self, theta: &Theta, _: &()) -> OptResult<Jacobian> {
            if !self.analytic {
                return Err(OptError::JacobianNotImplemented);
            }
            Ok(array![[1.0, 0.0], [theta[1], theta[0]]])
        }
    }

    #[test]
    // Purpose
    // -------
    // The analytic branch reproduces the finite-difference gradient of the
    // reparameterized cost, including the interval and upper-bound chain
    // factors.
    //
    // Given
    // -----
    // - `Curve` with θ₀ ∈ [0, 3] and θ₁ ≤ 5, at an interior point `u`.
    //
    // Expect
    // ------
    // - Analytic gradient ≈ central difference of `cost`.
    fn analytic_gradient_matches_fd_of_cost() {
        // Arrange
        let model = Curve { analytic: true };
        let bounds = Bounds::new(array![0.0, f64::NEG_INFINITY], array![3.0, 5.0]).unwrap();
        let adapter = SsrAdapter::new(&model, &(), &bounds);
        let u: Array1<f64> = bounds.to_unconstrained(&array![0.8, 1.5]);

        // Act
        let grad = adapter.gradient(&u).unwrap();
        let fd = u.central_diff(&|x: &Theta| adapter.cost(x).unwrap());

        // Assert
        for (a, b) in grad.iter().zip(fd.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-5);
        }
    }

    #[test]
    // Purpose
    // -------
    // Without a Jacobian the adapter falls back to finite differences and
    // still produces the correct gradient.
    //
    // Given
    // -----
    // - `Curve` without analytic Jacobian, unbounded, θ = (2, 1).
    //
    // Expect
    // ------
    // - ∇SSR = 2 Jᵀ r = [2(θ₀−1) + 2θ₁(θ₀θ₁−2), 2θ₀(θ₀θ₁−2)] = [2, 0].
    fn fd_branch_used_when_jacobian_missing() {
        // Arrange
        let model = Curve { analytic: false };
        let bounds = Bounds::unbounded(2);
        let adapter = SsrAdapter::new(&model, &(), &bounds);

        // Act
        let grad = adapter.gradient(&array![2.0, 1.0]).unwrap();

        // Assert
        assert_abs_diff_eq!(grad[0], 2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(grad[1], 0.0, epsilon = 1e-5);
    }
}
