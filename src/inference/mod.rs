//! inference — standard errors for fitted least-squares models.
//!
//! Purpose
//! -------
//! Provide post-estimation uncertainty quantification for models fit by
//! nonlinear least squares. The covariance is the classical Gauss–Newton
//! estimate built from the residual Jacobian at the optimum, expressed in
//! the flat parameter space of the fit.
//!
//! Key behaviors
//! -------------
//! - Define [`InferenceError`] and [`InferenceResult`] for inference
//!   failures (degrees of freedom, dimensions, non-finite inputs).
//! - Compute `σ̂² (JᵀJ)⁺`, standard errors, t-statistics and Student-t
//!   p-values via [`calc_nls_inference`], returned as [`ParamInference`].
//!
//! Invariants & assumptions
//! ------------------------
//! - The Jacobian is `N × k` with `N > k`.
//! - Weakly or un-identified directions are truncated in the
//!   pseudoinverse rather than inverted.
//!
//! Downstream usage
//! ----------------
//! - Model layers call [`calc_nls_inference`] with their analytic Jacobian
//!   at `θ̂` and the fitted SSR.

pub mod covariance;
pub mod errors;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::covariance::{ParamInference, calc_nls_inference};
pub use self::errors::{InferenceError, InferenceResult};

pub mod prelude {
    pub use super::covariance::{ParamInference, calc_nls_inference};
    pub use super::errors::{InferenceError, InferenceResult};
}
