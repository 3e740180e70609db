//! least_squares::lm — projected Levenberg–Marquardt for box-constrained NLS.
//!
//! Purpose
//! -------
//! Minimize `SSR(θ) = ‖r(θ)‖²` subject to `lower ≤ θ ≤ upper` with a damped
//! Gauss–Newton iteration. This is the default solver for structural
//! panel models, where the Jacobian is cheap and the residual map has a
//! restricted domain.
//!
//! Key behaviors
//! -------------
//! - Each iteration solves `(JᵀJ + μ D) h = −Jᵀr` by Cholesky (nalgebra),
//!   with Marquardt scaling `D = diag(JᵀJ)` floored at [`DIAG_FLOOR`].
//!   Coordinates sitting on a bound with the gradient pushing outward are
//!   held fixed for the step (active set).
//! - The trial point `θ + h` is projected onto the box. It is accepted only
//!   if its residuals are finite and its SSR is strictly lower; otherwise
//!   the damping grows (`μ ← μ ν`, `ν ← 2ν`).
//! - On acceptance the damping shrinks by Nielsen's rule
//!   `μ ← μ · max(1/3, 1 − (2ρ − 1)³)` with gain ratio `ρ`.
//! - Residual errors at a trial point (e.g. a non-finite CES aggregate)
//!   count as rejections, never as fatal errors.
//! - A step-size or SSR-change stop within [`DOMAIN_STALL_WINDOW`]
//!   iterations of such a rejection, while the projected gradient is still
//!   above `tol_grad`, is a stall at the edge of the residual domain and
//!   reports `converged = false`.
//!
//! Invariants & assumptions
//! ------------------------
//! - The initial point is projected onto the box and must produce finite
//!   residuals; failures there propagate as errors.
//! - `ssr_history` starts at the initial SSR and is strictly decreasing.
//! - Iterates never leave the box.
//!
//! Conventions
//! -----------
//! - Stopping rules, checked in this order: SSR ≤ [`SSR_FLOOR`];
//!   projected-gradient ∞-norm ≤ `tol_grad`; relative step
//!   `‖Δθ‖ ≤ tol_step (‖θ‖ + tol_step)`; relative SSR decrease of an
//!   accepted step ≤ `tol_cost`. These report `converged = true` unless
//!   the iterate is stalled at the domain edge.
//! - Reaching `max_iter` or a damping above [`MAX_DAMPING`] reports
//!   `converged = false` with the best point so far.
//!
//! Testing notes
//! -------------
//! - Unit tests cover an exactly solvable linear problem, an active bound
//!   at the optimum, rejection of steps into a restricted domain, a stall
//!   against a domain edge, the damping limit, and the non-converged
//!   outcome when the iteration cap binds.
use crate::optimization::{
    errors::{OptError, OptResult},
    least_squares::{
        bounds::Bounds,
        finite_diff::fd_jacobian,
        traits::{LeastSquares, LsOptions, LsOutcome},
        types::{FnEvalMap, Grad, Jacobian, Residuals, Theta},
        validation::{validate_jacobian, validate_residuals},
    },
};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};
use tracing::{debug, trace};

/// Lower floor on the Marquardt scaling diagonal.
pub const DIAG_FLOOR: f64 = 1e-12;

/// Damping above which the solver gives up.
pub const MAX_DAMPING: f64 = 1e32;

/// SSR at or below which the fit is exact to machine precision.
pub const SSR_FLOOR: f64 = 1e-30;

/// Iterations after an out-of-domain trial during which a small-step stop
/// needs a small projected gradient to count as converged.
pub const DOMAIN_STALL_WINDOW: usize = 10;

const STALL_STATUS: &str = "Stalled at residual domain boundary";

/// run_levenberg_marquardt — minimize SSR on a box.
///
/// Parameters
/// ----------
/// - `f`, `data`: the least-squares problem.
/// - `theta0`: initial guess; projected onto `bounds` before use.
/// - `bounds`: box constraints, one pair per coordinate.
/// - `opts`: tolerances, iteration cap and initial damping factor.
///
/// Returns
/// -------
/// An [`LsOutcome`] with the best point, its SSR, the accepted-SSR
/// history and `residual_count` / `jacobian_count` evaluation counters.
///
/// Errors
/// ------
/// - Residual or Jacobian errors at the (projected) initial point.
/// - `OptError::ThetaLengthMismatch` / `BoundsLengthMismatch` for
///   inconsistent dimensions.
/// - Jacobian errors after an accepted step when the finite-difference
///   fallback also fails.
///
/// Panics
/// ------
/// - Never panics.
pub fn run_levenberg_marquardt<F: LeastSquares>(
    f: &F, theta0: &Theta, data: &F::Data, bounds: &Bounds, opts: &LsOptions,
) -> OptResult<LsOutcome> {
    bounds.check_dim(theta0.len())?;
    let tols = opts.tols;
    let max_iter = tols.iteration_limit();
    let mut counts = EvalCounts::default();

    let mut theta = bounds.project(theta0);
    let mut r = f.residuals(&theta, data)?;
    counts.residuals += 1;
    let n = r.len();
    validate_residuals(&r, n)?;
    let mut ssr = r.dot(&r);
    let mut jac = jacobian_at(f, &theta, data, &r, bounds, &mut counts)?;
    let mut grad: Grad = jac.t().dot(&r);
    let mut history = vec![ssr];

    let mut mu: Option<f64> = None;
    let mut nu = 2.0;
    let mut iterations = 0;
    let mut last_domain_reject: Option<usize> = None;
    let mut stop: Option<(bool, &'static str)> = None;

    while iterations < max_iter {
        if ssr <= SSR_FLOOR {
            stop = Some((true, "Residual sum of squares reached zero"));
            break;
        }
        if let Some(tol_grad) = tols.tol_grad {
            if projected_gradient_norm(&theta, &grad, bounds) <= tol_grad {
                stop = Some((true, "Projected gradient below tolerance"));
                break;
            }
        }
        iterations += 1;

        let jtj = jac.t().dot(&jac);
        let scale = jtj.diag().mapv(|d| d.max(DIAG_FLOOR));
        let mu_k = *mu.get_or_insert_with(|| {
            opts.initial_damping * scale.iter().cloned().fold(DIAG_FLOOR, f64::max)
        });

        let free = free_coordinates(&theta, &grad, bounds);
        let step = match solve_damped(&jtj, &scale, mu_k, &grad, &free) {
            Some(step) => step,
            None => {
                trace!(iteration = iterations, mu = mu_k, "damped system not positive definite");
                match escalate_damping(mu_k, nu) {
                    Some((next_mu, next_nu)) => (mu, nu) = (Some(next_mu), next_nu),
                    None => {
                        stop = Some((false, "Damping exceeded limit"));
                        break;
                    }
                }
                continue;
            }
        };

        let trial = bounds.project(&(&theta + &step));
        let delta = &trial - &theta;
        let delta_norm = delta.dot(&delta).sqrt();
        if let Some(tol_step) = tols.tol_step {
            let theta_norm = theta.dot(&theta).sqrt();
            if delta_norm <= tol_step * (theta_norm + tol_step) {
                let stalled = stalled_at_domain(
                    last_domain_reject,
                    iterations,
                    &theta,
                    &grad,
                    bounds,
                    tols.tol_grad,
                );
                stop = Some(small_step_stop("Step below tolerance", stalled));
                break;
            }
        }

        counts.residuals += 1;
        let trial_eval = match f.residuals(&trial, data) {
            Ok(r_trial) if r_trial.len() == n && r_trial.iter().all(|v| v.is_finite()) => {
                let ssr_trial = r_trial.dot(&r_trial);
                if ssr_trial < ssr { Trial::Accepted(r_trial, ssr_trial) } else { Trial::NoDecrease }
            }
            Ok(_) => Trial::OutOfDomain,
            Err(err) => {
                trace!(iteration = iterations, error = %err, "trial point rejected");
                Trial::OutOfDomain
            }
        };

        if matches!(trial_eval, Trial::OutOfDomain) {
            last_domain_reject = Some(iterations);
        }
        match trial_eval {
            Trial::Accepted(r_trial, ssr_trial) => {
                let jd = jac.dot(&delta);
                let predicted = -2.0 * grad.dot(&delta) - jd.dot(&jd);
                let gain = if predicted > 0.0 { (ssr - ssr_trial) / predicted } else { 1.0 };
                let rel_change = (ssr - ssr_trial) / ssr;

                theta = trial;
                r = r_trial;
                ssr = ssr_trial;
                history.push(ssr);
                jac = jacobian_at(f, &theta, data, &r, bounds, &mut counts)?;
                grad = jac.t().dot(&r);

                mu = Some(mu_k * (1.0_f64 / 3.0).max(1.0 - (2.0 * gain - 1.0).powi(3)));
                nu = 2.0;
                debug!(iteration = iterations, ssr, mu = mu_k, gain, "LM step accepted");

                if let Some(tol_cost) = tols.tol_cost {
                    if rel_change <= tol_cost {
                        let stalled = stalled_at_domain(
                            last_domain_reject,
                            iterations,
                            &theta,
                            &grad,
                            bounds,
                            tols.tol_grad,
                        );
                        let status = "Relative SSR change below tolerance";
                        stop = Some(small_step_stop(status, stalled));
                        break;
                    }
                }
            }
            Trial::NoDecrease | Trial::OutOfDomain => {
                match escalate_damping(mu_k, nu) {
                    Some((next_mu, next_nu)) => (mu, nu) = (Some(next_mu), next_nu),
                    None => {
                        stop = Some((false, "Damping exceeded limit"));
                        break;
                    }
                }
            }
        }
    }
    if let Some((false, status)) = stop {
        debug!(iterations, ssr, status, "LM stopped without convergence");
    }

    let (converged, status) = stop.unwrap_or((false, "Maximum iterations reached"));
    let grad_norm = 2.0 * grad.dot(&grad).sqrt();
    LsOutcome::new(
        Some(theta),
        ssr,
        converged,
        status.to_string(),
        iterations,
        counts.into_map(),
        Some(grad_norm),
        history,
    )
}

// ---- Helper methods ----

/// Outcome of evaluating a trial point.
enum Trial {
    Accepted(Residuals, f64),
    NoDecrease,
    OutOfDomain,
}

/// `μ ← μ ν`, `ν ← 2ν`; `None` once the new damping exceeds [`MAX_DAMPING`].
fn escalate_damping(mu: f64, nu: f64) -> Option<(f64, f64)> {
    let next = mu * nu;
    if next > MAX_DAMPING { None } else { Some((next, 2.0 * nu)) }
}

/// A recent out-of-domain rejection with the projected gradient above
/// `tol_grad` (or no gradient tolerance to check against).
fn stalled_at_domain(
    last_domain_reject: Option<usize>, iteration: usize, theta: &Theta, grad: &Grad,
    bounds: &Bounds, tol_grad: Option<f64>,
) -> bool {
    let recent = last_domain_reject.is_some_and(|k| iteration - k <= DOMAIN_STALL_WINDOW);
    recent
        && tol_grad.map_or(true, |tol| projected_gradient_norm(theta, grad, bounds) > tol)
}

fn small_step_stop(status: &'static str, stalled: bool) -> (bool, &'static str) {
    if stalled { (false, STALL_STATUS) } else { (true, status) }
}

#[derive(Debug, Default, Clone, Copy)]
struct EvalCounts {
    residuals: u64,
    jacobians: u64,
}

impl EvalCounts {
    fn into_map(self) -> FnEvalMap {
        let mut map = FnEvalMap::new();
        map.insert("residual_count".to_string(), self.residuals);
        map.insert("jacobian_count".to_string(), self.jacobians);
        map
    }
}

/// Analytic Jacobian when available and finite, forward differences
/// otherwise.
fn jacobian_at<F: LeastSquares>(
    f: &F, theta: &Theta, data: &F::Data, r: &Residuals, bounds: &Bounds,
    counts: &mut EvalCounts,
) -> OptResult<Jacobian> {
    counts.jacobians += 1;
    match f.jacobian(theta, data) {
        Ok(jac) => match validate_jacobian(&jac, r.len(), theta.len()) {
            Ok(()) => return Ok(jac),
            Err(err @ OptError::JacobianDimMismatch { .. }) => return Err(err),
            Err(err) => trace!(error = %err, "analytic Jacobian rejected, using finite differences"),
        },
        Err(OptError::JacobianNotImplemented) => {}
        Err(err) => return Err(err),
    }
    fd_jacobian(f, theta, data, r, bounds)
}

/// ∞-norm of `P(θ − g) − θ`, the first-order optimality measure on a box.
fn projected_gradient_norm(theta: &Theta, grad: &Grad, bounds: &Bounds) -> f64 {
    theta
        .iter()
        .zip(grad.iter())
        .zip(bounds.lower().iter().zip(bounds.upper().iter()))
        .map(|((&t, &g), (&lo, &hi))| ((t - g).max(lo).min(hi) - t).abs())
        .fold(0.0, f64::max)
}

/// Coordinates not pinned to a bound by the gradient. A coordinate at its
/// lower (upper) bound whose descent direction points further down (up)
/// is held fixed for the step.
fn free_coordinates(theta: &Theta, grad: &Grad, bounds: &Bounds) -> Vec<usize> {
    (0..theta.len())
        .filter(|&j| {
            let pinned_low = theta[j] <= bounds.lower()[j] && grad[j] > 0.0;
            let pinned_high = theta[j] >= bounds.upper()[j] && grad[j] < 0.0;
            !(pinned_low || pinned_high)
        })
        .collect()
}

/// Solve `(JᵀJ + μ diag(scale)) h = −g` over the free coordinates, with
/// `h_j = 0` elsewhere; `None` if the reduced system is not numerically
/// positive definite.
fn solve_damped(
    jtj: &Array2<f64>, scale: &Array1<f64>, mu: f64, grad: &Grad, free: &[usize],
) -> Option<Theta> {
    let m = free.len();
    let mut a = DMatrix::<f64>::zeros(m, m);
    for (cj, &j) in free.iter().enumerate() {
        for (ci, &i) in free.iter().enumerate() {
            a[(ci, cj)] = jtj[[i, j]];
        }
        a[(cj, cj)] += mu * scale[j];
    }
    let b = DVector::from_iterator(m, free.iter().map(|&j| -grad[j]));
    let h = a.cholesky()?.solve(&b);
    if !h.iter().all(|v| v.is_finite()) {
        return None;
    }
    let mut step = Array1::<f64>::zeros(grad.len());
    for (c, &j) in free.iter().enumerate() {
        step[j] = h[c];
    }
    Some(step)
}
