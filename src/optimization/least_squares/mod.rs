//! least_squares — bounded nonlinear least squares.
//!
//! Purpose
//! -------
//! Provide a small, model-agnostic layer for minimizing a residual sum of
//! squares `SSR(θ) = Σ rᵢ(θ)²` on a box. Models implement
//! [`LeastSquares`]; callers choose a solver and tolerances through
//! [`LsOptions`] and receive an [`LsOutcome`].
//!
//! Key behaviors
//! -------------
//! - [`minimize_ssr`] validates the starting point, projects it onto the
//!   box and dispatches to the selected solver.
//! - `lm`: projected Levenberg–Marquardt (default). Works directly with the
//!   Jacobian and tolerates residual-domain failures at trial points.
//! - `adapter` / `builders` / `run`: argmin L-BFGS with More–Thuente or
//!   Hager–Zhang line search on an unconstrained reparameterization of the
//!   box.
//! - `finite_diff`: Jacobian and gradient approximations when a model does
//!   not provide an analytic Jacobian.
//!
//! Invariants & assumptions
//! ------------------------
//! - Residual vectors keep a fixed length for a given data set.
//! - Bounds satisfy `lower < upper` per coordinate; infinite ends are
//!   allowed.
//! - All fallible operations return [`OptResult`](crate::optimization::errors::OptResult).
//!
//! Downstream usage
//! ----------------
//! - `production::models::tfp::TfpModel` implements [`LeastSquares`] and
//!   calls [`minimize_ssr`] from `fit`.
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests on toy problems (linear, decay,
//!   domain-restricted) covering convergence, bound handling, option
//!   validation and derivative agreement.

pub mod adapter;
pub mod api;
pub mod bounds;
pub mod builders;
pub mod finite_diff;
pub mod lm;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

pub use self::api::minimize_ssr;
pub use self::bounds::{Bound, Bounds};
pub use self::traits::{LeastSquares, LineSearcher, LsOptions, LsOutcome, LsSolver, Tolerances};
pub use self::types::{Cost, FnEvalMap, Grad, Jacobian, Residuals, Theta};

pub mod prelude {
    pub use super::api::minimize_ssr;
    pub use super::bounds::{Bound, Bounds};
    pub use super::traits::{
        LeastSquares, LineSearcher, LsOptions, LsOutcome, LsSolver, Tolerances,
    };
    pub use super::types::{Jacobian, Residuals, Theta};
}
