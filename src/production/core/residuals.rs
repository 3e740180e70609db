//! Residual map and analytic Jacobian of the structural production model.
//!
//! Purpose
//! -------
//! Evaluate `r = logY − pred` for every state-year observation, where
//!
//! ```text
//! logL = ρ⁻¹ · ln( λ^(1−ρ)·(αF·F)^ρ + (1−λ)^(1−ρ)·(αD·D)^ρ )
//! pred = β + δ_s + γ_t + θ·logK + (1−θ)·logL
//! ```
//!
//! and the `N × k` Jacobian `∂r/∂θ` in flat layout order.
//!
//! Key behaviors
//! -------------
//! - Fixed effects are applied by direct indexed accumulation: row `i`
//!   receives `δ[i / T] + γ[i % T]` with the reference entries at zero.
//! - For `|ρ| < CD_LIMIT_EPS` the CES aggregate is replaced by its
//!   Cobb–Douglas limit `λ·ln(αF·F/λ) + (1−λ)·ln(αD·D/(1−λ))`, and the
//!   Jacobian uses the first-order expansion of the aggregate in `ρ`.
//! - A non-finite aggregate (log of a non-positive argument, fractional
//!   power of a negative base) is reported as
//!   [`TfpError::NonFiniteLabor`] for the first offending row.
//!
//! Invariants & assumptions
//! ------------------------
//! - `θ = 0` and `θ = 1` are valid inputs to both functions.
//! - Inputs are already shape-checked by the caller ([`TfpData`] rows match
//!   the layout's panel shape, parameters match the layout).
//!
//! Testing notes
//! -------------
//! - Hand-computed Cobb–Douglas limit on a 2 × 2 panel and continuity for
//!   small `|ρ|`.
//! - Analytic Jacobian against finite differences lives in the model tests.
use crate::production::{
    core::{data::TfpData, params::{ParamLayout, TfpParams}},
    errors::{TfpError, TfpResult},
};
use ndarray::{Array1, Array2};

/// Below this `|ρ|` the Cobb–Douglas limit of the CES aggregate is used.
pub const CD_LIMIT_EPS: f64 = 1e-8;

/// Log CES labor aggregate for one observation.
///
/// Returns the raw value; callers decide how to treat non-finite results.
#[inline]
pub fn ces_log_labor(
    foreign: f64, domestic: f64, share: f64, alpha_f: f64, alpha_d: f64, rho: f64,
) -> f64 {
    if rho.abs() < CD_LIMIT_EPS {
        return share * (alpha_f * foreign / share).ln()
            + (1.0 - share) * (alpha_d * domestic / (1.0 - share)).ln();
    }
    let a = share.powf(1.0 - rho);
    let b = (1.0 - share).powf(1.0 - rho);
    let u = (alpha_f * foreign).powf(rho);
    let v = (alpha_d * domestic).powf(rho);
    (a * u + b * v).ln() / rho
}

/// Residuals `logY − pred` of length `S·T`.
///
/// # Errors
/// [`TfpError::NonFiniteLabor`] for the first row whose CES aggregate is
/// not finite.
pub fn compute_residuals(params: &TfpParams, data: &TfpData) -> TfpResult<Array1<f64>> {
    let shape = data.shape;
    let log_y = data.log_output();
    let log_k = data.log_capital();
    let foreign = data.foreign();
    let domestic = data.domestic();
    let theta = params.capital_share;

    let mut out = Array1::<f64>::zeros(data.n_obs());
    for (i, r) in out.iter_mut().enumerate() {
        let (s, t) = (shape.state_of(i), shape.year_of(i));
        let log_l = ces_log_labor(
            foreign[i],
            domestic[i],
            params.task_share(t),
            params.foreign_advantage,
            params.domestic_advantage,
            params.ces,
        );
        if !log_l.is_finite() {
            return Err(TfpError::NonFiniteLabor { row: i, value: log_l });
        }
        let pred = params.intercept
            + params.state_effect(s)
            + params.time_effect(t)
            + theta * log_k[i]
            + (1.0 - theta) * log_l;
        *r = log_y[i] - pred;
    }
    Ok(out)
}

/// Partial derivatives of `logL` with respect to (λ, αF, αD, ρ).
struct LaborSensitivity {
    log_l: f64,
    d_share: f64,
    d_alpha_f: f64,
    d_alpha_d: f64,
    d_rho: f64,
}

fn labor_sensitivity(
    foreign: f64, domestic: f64, share: f64, alpha_f: f64, alpha_d: f64, rho: f64,
) -> LaborSensitivity {
    if rho.abs() < CD_LIMIT_EPS {
        let c_f = (alpha_f * foreign / share).ln();
        let c_d = (alpha_d * domestic / (1.0 - share)).ln();
        let gap = c_f - c_d;
        return LaborSensitivity {
            log_l: share * c_f + (1.0 - share) * c_d,
            d_share: gap,
            d_alpha_f: share / alpha_f,
            d_alpha_d: (1.0 - share) / alpha_d,
            d_rho: 0.5 * share * (1.0 - share) * gap * gap,
        };
    }
    let x_f = alpha_f * foreign;
    let x_d = alpha_d * domestic;
    let a = share.powf(1.0 - rho);
    let b = (1.0 - share).powf(1.0 - rho);
    let u = x_f.powf(rho);
    let v = x_d.powf(rho);
    let total = a * u + b * v;
    let ln_total = total.ln();
    LaborSensitivity {
        log_l: ln_total / rho,
        d_share: (1.0 - rho) * (share.powf(-rho) * u - (1.0 - share).powf(-rho) * v)
            / (rho * total),
        d_alpha_f: a * u / (total * alpha_f),
        d_alpha_d: b * v / (total * alpha_d),
        d_rho: -ln_total / (rho * rho)
            + (a * u * (x_f.ln() - share.ln()) + b * v * (x_d.ln() - (1.0 - share).ln()))
                / (rho * total),
    }
}

/// Analytic Jacobian `∂r/∂θ` (`S·T × layout.len()`).
///
/// Columns follow the flat layout. Fixed-effect columns are indicator
/// entries of −1 (none for the reference categories).
///
/// # Errors
/// [`TfpError::NonFiniteLabor`] for the first row whose CES aggregate is
/// not finite. Non-finite derivatives at a finite aggregate (e.g. λ on a
/// boundary) are returned as-is for the caller to validate.
pub fn residual_jacobian(
    params: &TfpParams, data: &TfpData, layout: &ParamLayout,
) -> TfpResult<Array2<f64>> {
    let shape = data.shape;
    let log_k = data.log_capital();
    let foreign = data.foreign();
    let domestic = data.domestic();
    let labor_weight = 1.0 - params.capital_share;

    let state_start = layout.state_effects().start;
    let time_start = layout.time_effects().start;
    let mut jac = Array2::<f64>::zeros((data.n_obs(), layout.len()));
    for (i, mut row) in jac.rows_mut().into_iter().enumerate() {
        let (s, t) = (shape.state_of(i), shape.year_of(i));
        let sens = labor_sensitivity(
            foreign[i],
            domestic[i],
            params.task_share(t),
            params.foreign_advantage,
            params.domestic_advantage,
            params.ces,
        );
        if !sens.log_l.is_finite() {
            return Err(TfpError::NonFiniteLabor { row: i, value: sens.log_l });
        }
        if s > 0 {
            row[state_start + s - 1] = -1.0;
        }
        if t > 0 {
            row[time_start + t - 1] = -1.0;
        }
        row[layout.share_index(t)] = -labor_weight * sens.d_share;
        row[layout.intercept()] = -1.0;
        row[layout.capital_share()] = -(log_k[i] - sens.log_l);
        row[layout.foreign_advantage()] = -labor_weight * sens.d_alpha_f;
        row[layout.domestic_advantage()] = -labor_weight * sens.d_alpha_d;
        row[layout.ces()] = -labor_weight * sens.d_rho;
    }
    Ok(jac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::production::core::{
        params::{TaskShareSpec, TaskShares},
        shape::PanelShape,
    };
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // ---- Scope ---------------------------------------------------------------
    //
    // These tests cover:
    // - The Cobb–Douglas limit against a hand computation.
    // - Continuity of the aggregate across the limit threshold.
    // - Fixed-effect accumulation and the θ ∈ {0, 1} edge cases.
    // - Domain errors for non-positive labor.
    //
    // They intentionally DO NOT cover:
    // - Jacobian accuracy (see `models::tfp` tests).
    // -------------------------------------------------------------------------

    fn panel() -> TfpData {
        let data = array![
            [1.0, 0.5, 10.0, 20.0],
            [1.2, 0.6, 12.0, 18.0],
            [0.9, 0.4, 8.0, 22.0],
            [1.1, 0.55, 11.0, 19.0]
        ];
        TfpData::new(data, PanelShape::new(2, 2).unwrap()).unwrap()
    }

    fn params(rho: f64, theta: f64) -> TfpParams {
        TfpParams::new(
            array![0.0],
            array![0.0],
            TaskShares::Scalar(0.5),
            0.0,
            theta,
            1.0,
            1.0,
            rho,
        )
        .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // At ρ = 0 with λ = ½ and unit advantages, the aggregate equals
    // `½ln F + ½ln D + ln 2`, so residuals follow by hand.
    //
    // Given
    // -----
    // - The 2 × 2 panel, all effects zero, β = 0, θ = 0.5.
    //
    // Expect
    // ------
    // - `r_i = logY_i − 0.5·logK_i − 0.5·(½ln F_i + ½ln D_i + ln 2)`.
    fn cobb_douglas_limit_matches_hand_computation() {
        let data = panel();
        let r = compute_residuals(&params(0.0, 0.5), &data).unwrap();
        assert_eq!(r.len(), 4);
        for i in 0..4 {
            let row = data.data.row(i);
            let log_l = 0.5 * row[2].ln() + 0.5 * row[3].ln() + 2f64.ln();
            let expected = row[0] - 0.5 * row[1] - 0.5 * log_l;
            assert_abs_diff_eq!(r[i], expected, epsilon = 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // The CES aggregate is continuous across the Cobb–Douglas threshold.
    //
    // Given
    // -----
    // - F = 10, D = 20, λ = 0.3, αF = 1.2, αD = 0.8 at ρ = 0 and ρ = ±1e-6.
    //
    // Expect
    // ------
    // - Values agree to within 1e-6.
    fn aggregate_is_continuous_near_zero_rho() {
        let at_zero = ces_log_labor(10.0, 20.0, 0.3, 1.2, 0.8, 0.0);
        for rho in [1e-6, -1e-6] {
            let near = ces_log_labor(10.0, 20.0, 0.3, 1.2, 0.8, rho);
            assert_abs_diff_eq!(near, at_zero, epsilon = 1e-6);
        }
    }

    #[test]
    // Purpose
    // -------
    // State and year effects enter additively with zero reference
    // categories, and the capital-share edge values evaluate.
    //
    // Given
    // -----
    // - δ₁ = 0.2, γ₁ = −0.1; θ = 0 and θ = 1.
    //
    // Expect
    // ------
    // - Row 3 (state 1, year 1) shifts by 0.1 and row 0 by nothing,
    //   relative to zero effects.
    // - At θ = 1 the residual is `logY − β − δ − γ − logK`.
    fn effects_and_capital_share_edges() {
        let data = panel();
        let base = compute_residuals(&params(0.5, 0.0), &data).unwrap();
        let mut shifted = params(0.5, 0.0);
        shifted.state_effects = array![0.2];
        shifted.time_effects = array![-0.1];
        let r = compute_residuals(&shifted, &data).unwrap();
        assert_abs_diff_eq!(r[0], base[0], epsilon = 1e-14);
        assert_abs_diff_eq!(r[1], base[1] + 0.1, epsilon = 1e-14);
        assert_abs_diff_eq!(r[2], base[2] - 0.2, epsilon = 1e-14);
        assert_abs_diff_eq!(r[3], base[3] - 0.1, epsilon = 1e-14);

        let r_one = compute_residuals(&params(0.5, 1.0), &data).unwrap();
        for i in 0..4 {
            let row = data.data.row(i);
            assert_abs_diff_eq!(r_one[i], row[0] - row[1], epsilon = 1e-14);
        }
    }

    #[test]
    // Purpose
    // -------
    // Non-positive labor yields a domain error naming the row instead of a
    // NaN residual.
    //
    // Given
    // -----
    // - Row 2 with F = −8 and ρ = 0.5.
    //
    // Expect
    // ------
    // - `NonFiniteLabor { row: 2 }` from residuals and Jacobian.
    fn negative_labor_is_a_domain_error() {
        let mut raw = panel().data;
        raw[[2, 2]] = -8.0;
        let data = TfpData::new(raw, PanelShape::new(2, 2).unwrap()).unwrap();
        let p = params(0.5, 0.3);
        assert!(matches!(
            compute_residuals(&p, &data),
            Err(TfpError::NonFiniteLabor { row: 2, .. })
        ));
        let layout = ParamLayout::new(data.shape, TaskShareSpec::Scalar);
        assert!(matches!(
            residual_jacobian(&p, &data, &layout),
            Err(TfpError::NonFiniteLabor { row: 2, .. })
        ));
    }
}
