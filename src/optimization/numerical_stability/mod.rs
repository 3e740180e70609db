//! numerical_stability — guarded transforms for the optimizer layer.
//!
//! Purpose
//! -------
//! Collect the small numerical primitives shared by the least-squares
//! solvers and by inference: overflow-safe softplus/logistic maps, the
//! per-coordinate box transforms used by the L-BFGS path, and shared
//! tolerances.
//!
//! Key behaviors
//! -------------
//! - Provide [`safe_softplus`], [`safe_softplus_inv`], [`safe_logistic`]
//!   and [`safe_logit`] with explicit cutoffs so that extreme
//!   unconstrained values never produce `inf`/`NaN`.
//! - Provide [`BoundTransform`] for mapping an unconstrained coordinate
//!   onto `[lower, upper]` (either side possibly infinite) together with
//!   its derivative for the chain rule.
//! - Define [`EIGEN_EPS`] for eigenvalue truncation in pseudoinverses.
//!
//! Invariants & assumptions
//! ------------------------
//! - Interval transforms assume `lower < upper`; bound validation happens
//!   upstream in `least_squares::bounds`.
//! - Forward transforms map into the open interior of the box.
//!
//! Downstream usage
//! ----------------
//! - `least_squares::bounds::Bounds` builds one [`BoundTransform`] per
//!   coordinate for the L-BFGS reparameterization.
//! - `inference` uses [`EIGEN_EPS`] when truncating the spectrum of `JᵀJ`.
//!
//! Testing notes
//! -------------
//! - Unit tests in `transformations` check agreement with naïve formulas,
//!   forward/inverse consistency, and derivatives against finite
//!   differences.

pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::transformations::{
    BoundTransform, EIGEN_EPS, LOGIT_EPS, SOFTPLUS_FLOOR, safe_logistic, safe_logit,
    safe_softplus, safe_softplus_inv,
};

pub mod prelude {
    pub use super::transformations::{
        BoundTransform, EIGEN_EPS, safe_logistic, safe_logit, safe_softplus, safe_softplus_inv,
    };
}
