//! High-level entry point for minimizing the residual sum of squares of a
//! user-provided `LeastSquares` problem on a box.
//!
//! Dispatches on [`LsSolver`]: the projected Levenberg–Marquardt solver
//! runs directly on `θ`; L-BFGS wraps the problem in an [`SsrAdapter`]
//! (unconstrained reparameterization) and delegates to `run_lbfgs`.
use crate::optimization::{
    errors::{OptError, OptResult},
    least_squares::{
        adapter::SsrAdapter,
        bounds::Bounds,
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        lm::run_levenberg_marquardt,
        run::run_lbfgs,
        traits::{LeastSquares, LineSearcher, LsOptions, LsOutcome, LsSolver},
        types::Theta,
        validation::validate_theta_input,
    },
};

/// Minimize `SSR(θ) = Σ rᵢ(θ)²` subject to `bounds`.
///
/// # Behavior
/// - Checks that `theta0` is finite and matches the bound dimension.
/// - Projects `theta0` onto the box and runs `f.check` on the result.
/// - Runs the solver selected by `opts.solver`.
///
/// # Errors
/// - [`OptError::ThetaLengthMismatch`] when `theta0` and `bounds` disagree.
/// - [`OptError::InvalidThetaInput`] for non-finite starting values.
/// - Propagates any error from `f.check` and from the chosen solver.
///
/// # Returns
/// An [`LsOutcome`]; `converged == false` signals that the iteration cap or
/// damping limit was hit and `theta_hat` is the best point found.
pub fn minimize_ssr<F: LeastSquares>(
    f: &F, theta0: &Theta, data: &F::Data, bounds: &Bounds, opts: &LsOptions,
) -> OptResult<LsOutcome> {
    if theta0.len() != bounds.len() {
        return Err(OptError::ThetaLengthMismatch {
            expected: bounds.len(),
            actual: theta0.len(),
        });
    }
    validate_theta_input(theta0)?;
    let start = bounds.project(theta0);
    f.check(&start, data)?;
    match opts.solver {
        LsSolver::LevenbergMarquardt => run_levenberg_marquardt(f, &start, data, bounds, opts),
        LsSolver::Lbfgs(LineSearcher::MoreThuente) => {
            let problem = SsrAdapter::new(f, data, bounds);
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(start, opts, problem, solver)
        }
        LsSolver::Lbfgs(LineSearcher::HagerZhang) => {
            let problem = SsrAdapter::new(f, data, bounds);
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(start, opts, problem, solver)
        }
    }
}
