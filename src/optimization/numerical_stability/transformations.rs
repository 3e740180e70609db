//! Numerical stability utilities.
//!
//! Provides safe implementations of common nonlinear transforms
//! that are prone to overflow/underflow in naïve form, together with
//! the per-coordinate maps used to turn box constraints into an
//! unconstrained search space.
//! The functions here follow guarded strategies similar to those
//! in major ML libraries (e.g. PyTorch, TensorFlow), using explicit
//! cutoffs (`x > 20.0`) to keep `f64` arithmetic in a well-conditioned regime.
//!
//! # Provided items
//! - [`EIGEN_EPS`]: relative eigenvalue cutoff for pseudoinverses.
//! - [`LOGIT_EPS`]: clamp used before inverting the logistic map.
//! - [`safe_softplus(x)`]: stable version of `ln(1 + exp(x))`,
//!   mapping ℝ → (0, ∞) without overflow.
//! - [`safe_softplus_inv(x)`]: inverse of softplus, mapping
//!   (0, ∞) → ℝ without catastrophic cancellation.
//! - [`safe_logistic(x)`]: `1 / (1 + exp(-x))` without overflow.
//! - [`BoundTransform`]: identity / lower / upper / interval maps between
//!   an unconstrained coordinate `u` and a bounded coordinate `θ`.

/// Relative eigenvalue cutoff used when forming Moore–Penrose
/// pseudoinverses: eigenvalues at or below `EIGEN_EPS · λ_max` are dropped.
pub const EIGEN_EPS: f64 = 1e-10;

/// Clamp applied to a unit-interval value before taking its logit.
pub const LOGIT_EPS: f64 = 1e-12;

/// Smallest admissible gap between a parameter and a one-sided bound when
/// inverting the softplus map.
pub const SOFTPLUS_FLOOR: f64 = 1e-12;

/// Numerically stable softplus: `softplus(x) = ln(1 + exp(x))`.
///
/// Computes softplus without overflow for large positive `x` and
/// with good precision for large negative `x`. This implementation
/// uses a simple piecewise guard:
///
/// - For sufficiently large `x`, `softplus(x) ≈ x + ln1p(exp(-x)) ≈ x`.
/// - Otherwise, it falls back to `ln1p(exp(x))`.
///
/// # Parameters
/// - `x`: real input
///
/// # Returns
/// - `softplus(x)` as `f64`.
pub fn safe_softplus(x: f64) -> f64 {
    if x > 20.0 { x } else { x.exp().ln_1p() }
}

/// Stable inverse of softplus on `(0, ∞)`: solves for `t` in
/// `softplus(t) = x`, returning `t = ln(exp(x) - 1)`.
///
/// - For sufficiently large `x`, `ln(exp(x) - 1) ≈ x`.
/// - Otherwise, it uses `ln(expm1(x))`.
///
/// # Parameters
/// - `x`: a positive real (the softplus output), must be finite and `> 0`.
pub fn safe_softplus_inv(x: f64) -> f64 {
    if x > 20.0 { x } else { x.exp_m1().ln() }
}

/// Numerically stable logistic function `σ(x) = 1 / (1 + exp(-x))`.
///
/// Evaluates `exp` only on non-positive arguments so neither branch can
/// overflow.
pub fn safe_logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Inverse of [`safe_logistic`] for `p ∈ (0, 1)`, clamped by [`LOGIT_EPS`].
pub fn safe_logit(p: f64) -> f64 {
    let p = p.clamp(LOGIT_EPS, 1.0 - LOGIT_EPS);
    (p / (1.0 - p)).ln()
}

/// Per-coordinate map between an unconstrained value `u ∈ ℝ` and a
/// box-constrained parameter `θ`.
///
/// - `Identity`: `θ = u`.
/// - `Lower(l)`: `θ = l + softplus(u)`.
/// - `Upper(h)`: `θ = h − softplus(u)`.
/// - `Interval(l, h)`: `θ = l + (h − l)·σ(u)`.
///
/// The mapped value never touches a finite bound exactly, so `inverse` is
/// applied after clamping into the open interior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundTransform {
    Identity,
    Lower(f64),
    Upper(f64),
    Interval(f64, f64),
}

impl BoundTransform {
    /// Pick the transform matching a `[lower, upper]` pair, where either
    /// end may be infinite.
    pub fn from_bounds(lower: f64, upper: f64) -> Self {
        match (lower.is_finite(), upper.is_finite()) {
            (false, false) => BoundTransform::Identity,
            (true, false) => BoundTransform::Lower(lower),
            (false, true) => BoundTransform::Upper(upper),
            (true, true) => BoundTransform::Interval(lower, upper),
        }
    }

    /// Map an unconstrained coordinate into the bounded space.
    pub fn forward(&self, u: f64) -> f64 {
        match *self {
            BoundTransform::Identity => u,
            BoundTransform::Lower(l) => l + safe_softplus(u),
            BoundTransform::Upper(h) => h - safe_softplus(u),
            BoundTransform::Interval(l, h) => l + (h - l) * safe_logistic(u),
        }
    }

    /// Map a bounded coordinate back into ℝ.
    pub fn inverse(&self, theta: f64) -> f64 {
        match *self {
            BoundTransform::Identity => theta,
            BoundTransform::Lower(l) => safe_softplus_inv((theta - l).max(SOFTPLUS_FLOOR)),
            BoundTransform::Upper(h) => safe_softplus_inv((h - theta).max(SOFTPLUS_FLOOR)),
            BoundTransform::Interval(l, h) => safe_logit((theta - l) / (h - l)),
        }
    }

    /// Derivative `dθ/du` evaluated at the unconstrained coordinate `u`.
    pub fn derivative(&self, u: f64) -> f64 {
        match *self {
            BoundTransform::Identity => 1.0,
            BoundTransform::Lower(_) => safe_logistic(u),
            BoundTransform::Upper(_) => -safe_logistic(u),
            BoundTransform::Interval(l, h) => {
                let s = safe_logistic(u);
                (h - l) * s * (1.0 - s)
            }
        }
    }
}
