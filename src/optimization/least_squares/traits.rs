//! Public API surface for bounded nonlinear least squares.
//!
//! - [`LeastSquares`]: trait users implement for their model.
//! - [`LsOptions`] and [`Tolerances`]: configuration for the optimizer.
//! - [`LsSolver`] / [`LineSearcher`]: solver choice.
//! - [`LsOutcome`]: normalized result returned by [`minimize_ssr`](super::api::minimize_ssr).
//!
//! Convention: the objective is always the residual sum of squares
//! `SSR(θ) = Σ rᵢ(θ)²`. An analytic Jacobian, if provided, is `∂r/∂θ`
//! (residuals, not predictions).
use crate::optimization::{
    errors::{OptError, OptResult},
    least_squares::{
        types::{DEFAULT_INITIAL_DAMPING, DEFAULT_MAX_ITER, FnEvalMap, Jacobian, Residuals, Theta},
        validation::{
            validate_theta_hat, validate_value, verify_tol_cost, verify_tol_grad, verify_tol_step,
        },
    },
};
use argmin::core::{TerminationReason, TerminationStatus};
use std::str::FromStr;

/// User-implemented least-squares interface.
///
/// - `type Data`: per-model data carried into `residuals`/`jacobian`/`check`.
///
/// Required:
/// - `residuals(&Theta, &Data) -> OptResult<Residuals>`: evaluate `r(θ)`.
///   Domain failures (e.g. a non-finite model prediction) are reported as
///   `OptError` values; the Levenberg–Marquardt solver treats them as a
///   rejected trial step rather than a fatal error.
/// - `check(&Theta, &Data) -> OptResult<()>`: validation hook called once
///   before optimization.
///
/// Optional:
/// - `jacobian(&Theta, &Data) -> OptResult<Jacobian>`: analytic `∂r/∂θ`.
///   If not implemented, forward differences are used.
pub trait LeastSquares {
    type Data: 'static;

    // Required methods
    fn residuals(&self, theta: &Theta, data: &Self::Data) -> OptResult<Residuals>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    // Optional methods
    fn jacobian(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Jacobian> {
        Err(OptError::JacobianNotImplemented)
    }
}

/// Choice of line search used inside the L-BFGS solver.
///
/// Parsing:
/// This enum implements `FromStr` and accepts case-insensitive names
/// (`"MoreThuente"`, `"HagerZhang"`). Unknown names return
/// `OptError::InvalidLineSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Choice of least-squares solver.
///
/// Variants:
/// - `LevenbergMarquardt`: projected, damped Gauss–Newton on the box. Uses
///   the Jacobian directly and only accepts SSR-decreasing steps.
/// - `Lbfgs(LineSearcher)`: argmin L-BFGS on the SSR in an unconstrained
///   reparameterization of the box.
///
/// Parsing (case-insensitive): `"lm"`, `"levenbergmarquardt"`,
/// `"levenberg_marquardt"`, `"lbfgs"` (More–Thuente),
/// `"lbfgs_morethuente"`, `"lbfgs_hagerzhang"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LsSolver {
    #[default]
    LevenbergMarquardt,
    Lbfgs(LineSearcher),
}

impl FromStr for LsSolver {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lm" | "levenbergmarquardt" | "levenberg_marquardt" => {
                Ok(LsSolver::LevenbergMarquardt)
            }
            "lbfgs" | "lbfgs_morethuente" => Ok(LsSolver::Lbfgs(LineSearcher::MoreThuente)),
            "lbfgs_hagerzhang" => Ok(LsSolver::Lbfgs(LineSearcher::HagerZhang)),
            _ => Err(OptError::InvalidSolver {
                name: s.to_string(),
                reason: "Valid options are 'lm', 'lbfgs', 'lbfgs_morethuente' or 'lbfgs_hagerzhang'.",
            }),
        }
    }
}

impl std::fmt::Display for LsSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LsSolver::LevenbergMarquardt => write!(f, "levenberg_marquardt"),
            LsSolver::Lbfgs(LineSearcher::MoreThuente) => write!(f, "lbfgs_morethuente"),
            LsSolver::Lbfgs(LineSearcher::HagerZhang) => write!(f, "lbfgs_hagerzhang"),
        }
    }
}

/// Numerical tolerances and iteration limits used by the optimizer.
///
/// - `tol_grad`: stop when the projected-gradient infinity norm falls
///   below this threshold (LM) or the gradient norm does (L-BFGS).
/// - `tol_cost`: stop when the relative SSR decrease of an accepted step
///   falls below this threshold.
/// - `tol_step`: stop when the relative step length falls below this
///   threshold (LM only).
/// - `max_iter`: hard cap on the number of iterations.
///
/// Any field can be `None` but **at least one** must be provided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub tol_step: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all four are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] /
    ///   [`OptError::InvalidTolStep`] for non-finite or non-positive values.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, tol_step: Option<f64>,
        max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && tol_step.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_grad(tol_grad)?;
        verify_tol_cost(tol_cost)?;
        verify_tol_step(tol_step)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_grad, tol_cost, tol_step, max_iter })
    }

    /// Iteration cap, falling back to [`DEFAULT_MAX_ITER`].
    pub fn iteration_limit(&self) -> usize {
        self.max_iter.unwrap_or(DEFAULT_MAX_ITER)
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            tol_grad: Some(1e-10),
            tol_cost: Some(1e-12),
            tol_step: Some(1e-12),
            max_iter: Some(DEFAULT_MAX_ITER),
        }
    }
}

/// Optimizer-level configuration.
///
/// Fields:
/// - `tols`: numerical tolerances and iteration limits.
/// - `solver`: which least-squares solver to run.
/// - `verbose`: with the `obs_slog` feature, attach argmin's slog observer
///   on the L-BFGS path. Levenberg–Marquardt iterations are always traced
///   through `tracing` at `debug` level.
/// - `lbfgs_mem`: L-BFGS history size (`None` uses the default of 7).
/// - `initial_damping`: LM factor `τ` in `μ₀ = τ · max diag(JᵀJ)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LsOptions {
    pub tols: Tolerances,
    pub solver: LsSolver,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
    pub initial_damping: f64,
}

impl LsOptions {
    /// Create a validated set of optimizer options.
    ///
    /// # Errors
    /// - [`OptError::InvalidLBFGSMem`] when `lbfgs_mem == Some(0)`.
    /// - [`OptError::InvalidDamping`] when `initial_damping` is not finite
    ///   and strictly positive.
    pub fn new(
        tols: Tolerances, solver: LsSolver, verbose: bool, lbfgs_mem: Option<usize>,
        initial_damping: Option<f64>,
    ) -> OptResult<Self> {
        if let Some(m) = lbfgs_mem {
            if m == 0 {
                return Err(OptError::InvalidLBFGSMem {
                    mem: m,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        let initial_damping = initial_damping.unwrap_or(DEFAULT_INITIAL_DAMPING);
        if !initial_damping.is_finite() || initial_damping <= 0.0 {
            return Err(OptError::InvalidDamping {
                value: initial_damping,
                reason: "Initial damping must be finite and positive.",
            });
        }
        Ok(Self { tols, solver, verbose, lbfgs_mem, initial_damping })
    }
}

impl Default for LsOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances::default(),
            solver: LsSolver::default(),
            verbose: false,
            lbfgs_mem: None,
            initial_damping: DEFAULT_INITIAL_DAMPING,
        }
    }
}

/// Canonical result returned by `minimize_ssr`.
///
/// - `theta_hat`: best parameter vector found (always inside the box).
/// - `ssr`: residual sum of squares at `theta_hat`.
/// - `converged`: `true` only when a convergence criterion fired; hitting
///   the iteration cap, exhausting the damping or stalling against the
///   residual domain is `false`.
/// - `status`: human-readable termination status.
/// - `iterations`: number of optimizer iterations performed.
/// - `fn_evals`: evaluation counters (`residual_count`, `jacobian_count`
///   for LM, argmin's counters for L-BFGS).
/// - `grad_norm`: Euclidean norm of the last SSR gradient, if available.
/// - `ssr_history`: SSR at the initial point followed by the SSR after each
///   accepted step (LM). The L-BFGS path records the endpoints only.
#[derive(Debug, Clone, PartialEq)]
pub struct LsOutcome {
    pub theta_hat: Theta,
    pub ssr: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
    pub ssr_history: Vec<f64>,
}

impl LsOutcome {
    /// Build a validated outcome from raw solver state.
    ///
    /// # Errors
    /// Propagates validation errors for `theta_hat` or `ssr`.
    pub fn new(
        theta_hat_opt: Option<Theta>, ssr: f64, converged: bool, status: String,
        iterations: usize, fn_evals: FnEvalMap, grad_norm: Option<f64>, ssr_history: Vec<f64>,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(ssr)?;
        Ok(Self { theta_hat, ssr, converged, status, iterations, fn_evals, grad_norm, ssr_history })
    }

    /// Map an argmin `TerminationStatus` into `(converged, status)`.
    pub fn classify_termination(termination: &TerminationStatus) -> (bool, String) {
        match termination {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            TerminationStatus::Terminated(reason) => {
                let converged = matches!(
                    reason,
                    TerminationReason::SolverConverged | TerminationReason::TargetCostReached
                );
                (converged, format!("{reason:?}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Scope ---------------------------------------------------------------
    //
    // These tests cover:
    // - Parsing of solver and line-search names.
    // - Tolerance / option validation.
    // - Classification of argmin termination statuses.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Solver names parse case-insensitively and unknown names are rejected.
    //
    // Given
    // -----
    // - `"LM"`, `"lbfgs_HagerZhang"`, `"newton"`.
    //
    // Expect
    // ------
    // - LM, L-BFGS + Hager–Zhang, and `InvalidSolver`.
    fn ls_solver_parses_known_names() {
        assert_eq!("LM".parse::<LsSolver>().unwrap(), LsSolver::LevenbergMarquardt);
        assert_eq!(
            "lbfgs_HagerZhang".parse::<LsSolver>().unwrap(),
            LsSolver::Lbfgs(LineSearcher::HagerZhang)
        );
        assert!(matches!("newton".parse::<LsSolver>(), Err(OptError::InvalidSolver { .. })));
    }

    #[test]
    // Purpose
    // -------
    // `Tolerances::new` requires at least one criterion and a positive cap.
    //
    // Given
    // -----
    // - All-`None` tolerances and `max_iter = Some(0)`.
    //
    // Expect
    // ------
    // - `NoTolerancesProvided` and `InvalidMaxIter`.
    fn tolerances_require_a_criterion_and_positive_cap() {
        assert_eq!(Tolerances::new(None, None, None, None), Err(OptError::NoTolerancesProvided));
        assert!(matches!(
            Tolerances::new(None, None, None, Some(0)),
            Err(OptError::InvalidMaxIter { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Options reject a zero L-BFGS memory and a non-positive damping.
    //
    // Given
    // -----
    // - `lbfgs_mem = Some(0)`; `initial_damping = Some(-1.0)`.
    //
    // Expect
    // ------
    // - `InvalidLBFGSMem` and `InvalidDamping`.
    fn ls_options_validate_memory_and_damping() {
        let tols = Tolerances::default();
        assert!(matches!(
            LsOptions::new(tols, LsSolver::default(), false, Some(0), None),
            Err(OptError::InvalidLBFGSMem { .. })
        ));
        assert!(matches!(
            LsOptions::new(tols, LsSolver::default(), false, None, Some(-1.0)),
            Err(OptError::InvalidDamping { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Only genuine convergence counts as converged; the iteration cap does
    // not.
    //
    // Given
    // -----
    // - `SolverConverged` and `MaxItersReached` termination statuses.
    //
    // Expect
    // ------
    // - `true` for the first, `false` for the second.
    fn classify_termination_separates_convergence_from_cap() {
        let (ok, _) = LsOutcome::classify_termination(&TerminationStatus::Terminated(
            TerminationReason::SolverConverged,
        ));
        let (capped, status) = LsOutcome::classify_termination(&TerminationStatus::Terminated(
            TerminationReason::MaxItersReached,
        ));
        assert!(ok);
        assert!(!capped);
        assert!(status.contains("MaxIters"));
    }
}
