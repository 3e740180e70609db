//! optimization — bounded least-squares stack, numerical helpers, and a
//! unified error surface.
//!
//! Purpose
//! -------
//! Provide the optimization layer used for model fitting: bounded
//! nonlinear least squares (`least_squares`), numerically stable transforms
//! (`numerical_stability`), and a single error/result surface (`errors`).
//! Callers implement a residual map, choose tolerances and a solver, and
//! obtain fitted parameters plus diagnostics without touching backend
//! solver details.
//!
//! Key behaviors
//! -------------
//! - Expose [`least_squares::minimize_ssr`] with a projected
//!   Levenberg–Marquardt solver and an argmin L-BFGS alternative.
//! - Supply the box transforms and guarded softplus/logistic maps used by
//!   the L-BFGS reparameterization.
//! - Normalize configuration issues, numerical failures, and backend solver
//!   errors into `errors::OptError` with the alias `OptResult<T>`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Iterates always satisfy the configured box; invalid states are
//!   reported as `OptError`, not panics.
//! - Problems report domain violations as recoverable errors.
//!
//! Conventions
//! -----------
//! - The objective is always `SSR(θ) = Σ rᵢ(θ)²`.
//! - Parameters, residuals and Jacobians are `ndarray` aliases (`Theta`,
//!   `Residuals`, `Jacobian`). nalgebra is used internally for the damped
//!   normal equations.
//! - Progress is reported through `tracing` at `debug`/`trace` level; the
//!   crate never installs a subscriber.
//!
//! Downstream usage
//! ----------------
//! - `production` implements `LeastSquares` for the structural TFP model.
//! - Front-ends import the curated surface via `optimization::prelude::*`.
//!
//! Testing notes
//! -------------
//! - Unit tests in the submodules cover solver wiring, tolerance handling,
//!   bound projection, derivative agreement and error conversions on toy
//!   models.

pub mod errors;
pub mod least_squares;
pub mod numerical_stability;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::least_squares::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
