//! least_squares::types — shared numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Centralize the numeric types and solver aliases used by the
//! least-squares optimizer so that the rest of the layer stays agnostic to
//! `ndarray` and Argmin generics.
//!
//! Conventions
//! -----------
//! - `Theta` and `Grad` have length equal to the number of free
//!   parameters; `Residuals` has one entry per observation and `Jacobian`
//!   is `n_residuals × n_params`, row `i` holding `∂rᵢ/∂θ`.
//! - `Cost` is always the residual sum of squares `Σ rᵢ²`.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    quasinewton::LBFGS,
};
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Parameter vector `θ`.
pub type Theta = Array1<f64>;

/// Gradient vector of the cost, same shape as `Theta`.
pub type Grad = Array1<f64>;

/// Residual vector `r(θ)`.
pub type Residuals = Array1<f64>;

/// Dense Jacobian `∂r/∂θ` of shape `n_residuals × n_params`.
pub type Jacobian = Array2<f64>;

/// Scalar objective value: the residual sum of squares.
pub type Cost = f64;

/// Function-evaluation counters as reported by the solver.
///
/// Maps counter names (e.g., `"cost_count"`, `"residual_count"`) to counts.
pub type FnEvalMap = HashMap<String, u64>;

/// Default history size (`m`) for L-BFGS runs.
pub const DEFAULT_LBFGS_MEM: usize = 7;

/// Default iteration cap when no `max_iter` is configured.
pub const DEFAULT_MAX_ITER: usize = 1000;

/// Default initial damping factor `τ` for Levenberg–Marquardt; the first
/// damping is `τ · max diag(JᵀJ)`.
pub const DEFAULT_INITIAL_DAMPING: f64 = 1e-3;

/// Hager–Zhang line search specialized to this crate’s numeric types.
pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

/// More–Thuente line search specialized to this crate’s numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// L-BFGS solver wired to the Hager–Zhang line search.
pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

/// L-BFGS solver wired to the More–Thuente line search.
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;
