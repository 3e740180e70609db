//! Execution helper that runs an `argmin` solver on the reparameterized SSR
//! and returns a crate-friendly [`LsOutcome`].
use crate::optimization::{
    errors::OptResult,
    least_squares::{
        adapter::SsrAdapter,
        traits::{LeastSquares, LsOptions, LsOutcome},
        types::{Grad, Theta},
    },
};
#[cfg(feature = "obs_slog")]
use argmin::core::Gradient;
use argmin::core::{Executor, State};
use argmin_math::ArgminL2Norm;
use tracing::debug;

/// Run an `argmin` L-BFGS optimization for a least-squares problem.
///
/// Wires up the problem via [`SsrAdapter`], maps `theta0` into the
/// unconstrained space, configures `max_iters`, optionally attaches a slog
/// observer (behind `obs_slog`, when `opts.verbose`), executes the solver
/// and maps the best point back into the box.
///
/// # Arguments
/// - `theta0`: initial parameter vector inside the box.
/// - `opts`: optimizer options.
/// - `problem`: an [`SsrAdapter`] wrapping the user problem, data and box.
/// - `solver`: a fully constructed solver (see `least_squares::builders`).
///
/// # Returns
/// An [`LsOutcome`] whose `ssr_history` holds the initial and best SSR.
///
/// # Errors
/// - Propagates any `argmin` runtime error, including residual errors raised
///   inside line-search evaluations, via `From<argmin::core::Error>`.
/// - Propagates validation errors when constructing [`LsOutcome`].
pub fn run_lbfgs<'a, F, S>(
    theta0: Theta, opts: &LsOptions, problem: SsrAdapter<'a, F>, solver: S,
) -> OptResult<LsOutcome>
where
    F: LeastSquares,
    S: argmin::core::Solver<
            SsrAdapter<'a, F>,
            argmin::core::IterState<Theta, Grad, (), (), (), f64>,
        > + Send
        + 'static,
{
    let bounds = problem.bounds;
    let ssr0 = problem.ssr_at(&theta0)?;
    let u0 = bounds.to_unconstrained(&theta0);
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        log_initial_state(ssr0, &u0, &problem);
    }

    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(u0));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    let max_iter = opts.tols.iteration_limit();
    optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter() as usize;
    let fn_evals = result.get_func_counts().clone();
    let (converged, status) = LsOutcome::classify_termination(result.get_termination_status());
    let grad_norm = result.take_gradient().map(|g| g.l2_norm());
    let ssr = result.get_best_cost();
    let theta_hat = result.take_best_param().map(|u| bounds.to_constrained(&u));
    debug!(iterations, ssr, converged, "L-BFGS finished");

    LsOutcome::new(
        theta_hat,
        ssr,
        converged,
        status,
        iterations,
        fn_evals,
        grad_norm,
        vec![ssr0, ssr],
    )
}

// ---- Helper Methods ----

#[cfg(feature = "obs_slog")]
fn log_initial_state<F: LeastSquares>(ssr0: f64, u0: &Theta, problem: &SsrAdapter<'_, F>) {
    let g0n = problem.gradient(u0).ok().map(|g| g.l2_norm());
    eprintln!(
        "init: ssr(theta0) = {:.6}{}",
        ssr0,
        g0n.map(|n| format!(", ||grad|| = {:.6}", n)).unwrap_or_default()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{
        errors::OptResult,
        least_squares::{
            bounds::Bounds,
            builders::build_optimizer_more_thuente,
            types::{Jacobian, Residuals},
        },
    };
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // ---- Scope ---------------------------------------------------------------
    //
    // These tests cover:
    // - A full L-BFGS run on a small bounded curve-fitting problem.
    // -------------------------------------------------------------------------

    /// r(θ) = θ − c, minimized at θ = c.
    struct Shift;

    impl LeastSquares for Shift {
        type Data = Theta;

        fn residuals(&self, theta: &Theta, c: &Theta) -> OptResult<Residuals> {
            Ok(theta - c)
        }

        fn check(&self, _theta: &Theta, _c: &Theta) -> OptResult<()> {
            Ok(())
        }

        fn jacobian(&self, theta: &Theta, _c: &Theta) -> OptResult<Jacobian> {
            Ok(Jacobian::eye(theta.len()))
        }
    }

    #[test]
    // Purpose
    // -------
    // L-BFGS in the reparameterized space reaches an interior optimum of a
    // bounded problem and maps it back into the box.
    //
    // Given
    // -----
    // - `Shift` with target `c = [0.3, −0.5]`, bounds `θ₀ ∈ [0, 1]`,
    //   `θ₁ ≤ 1`, start `[0.6, 0.2]`.
    //
    // Expect
    // ------
    // - `theta_hat ≈ c`, SSR ≈ 0, SSR history endpoints decreasing.
    fn run_lbfgs_recovers_interior_optimum() {
        // Arrange
        let c = array![0.3, -0.5];
        let bounds = Bounds::new(array![0.0, f64::NEG_INFINITY], array![1.0, 1.0]).unwrap();
        let opts = LsOptions::default();
        let problem = SsrAdapter::new(&Shift, &c, &bounds);
        let solver = build_optimizer_more_thuente(&opts).unwrap();

        // Act
        let out = run_lbfgs(array![0.6, 0.2], &opts, problem, solver).unwrap();

        // Assert
        assert_abs_diff_eq!(out.theta_hat[0], 0.3, epsilon = 1e-5);
        assert_abs_diff_eq!(out.theta_hat[1], -0.5, epsilon = 1e-5);
        assert!(out.ssr < 1e-9);
        assert!(out.ssr_history[1] < out.ssr_history[0]);
    }
}
