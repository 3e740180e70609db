//! TFP recovery from a fitted production model.
//!
//! Inverting the fitted model gives, per observation,
//!
//! ```text
//! Z = exp((r + δ_s + β) / (1 − θ))
//! ```
//!
//! where `r` is the residual at the fitted parameters and `δ_s` follows the
//! zero-reference-state convention. Year effects are not part of `Z`.
use crate::production::{
    core::{params::TfpParams, shape::PanelShape},
    errors::{TfpError, TfpResult},
};
use ndarray::Array1;

/// `|1 − θ|` at or below this value cannot be inverted.
pub const CAPITAL_SHARE_DEGENERACY_EPS: f64 = 1e-12;

/// Recover the implied productivity series `Z` in input row order.
///
/// # Errors
/// - [`TfpError::ResidualLengthMismatch`] when `residuals.len() != S·T`.
/// - [`TfpError::DegenerateCapitalShare`] when `|1 − θ| ≤ 1e-12`.
/// - [`TfpError::NonFiniteTfp`] for the first row whose `Z` overflows or is
///   otherwise not finite.
pub fn recover_tfp(
    params: &TfpParams, residuals: &Array1<f64>, shape: PanelShape,
) -> TfpResult<Array1<f64>> {
    if residuals.len() != shape.n_obs() {
        return Err(TfpError::ResidualLengthMismatch {
            expected: shape.n_obs(),
            actual: residuals.len(),
        });
    }
    let labor_weight = 1.0 - params.capital_share;
    if labor_weight.abs() <= CAPITAL_SHARE_DEGENERACY_EPS {
        return Err(TfpError::DegenerateCapitalShare { value: params.capital_share });
    }
    let mut z = Array1::<f64>::zeros(residuals.len());
    for (i, (z_i, &r)) in z.iter_mut().zip(residuals.iter()).enumerate() {
        let value = ((r + params.state_effect(shape.state_of(i)) + params.intercept)
            / labor_weight)
            .exp();
        if !value.is_finite() {
            return Err(TfpError::NonFiniteTfp { row: i, value });
        }
        *z_i = value;
    }
    Ok(z)
}
