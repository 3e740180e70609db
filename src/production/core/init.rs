//! Initial-guess policies for TFP estimation.
//!
//! Purpose
//! -------
//! Decide how the starting parameter vector is built when the caller does
//! not pass one to `fit`. The policy is carried in the model options so a
//! configuration file can select it.
//!
//! Key behaviors
//! -------------
//! - [`Init::Constant`] sets every parameter to one value (0.5 by default).
//! - [`Init::Calibrated`] uses economically sensible magnitudes: effects at
//!   1, λ at 0.5, β / αF / αD at 1, θ at 0.3, ρ at 0.85.
//! - [`Init::Fixed`] starts from an explicit [`TfpParams`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Constant values are finite (checked by [`Init::constant`]).
//! - Fixed parameters must match the model layout; this is checked when the
//!   policy is resolved, before any optimization.
//! - The optimizer projects the resolved start into the bounds, so a
//!   constant outside a bound (e.g. ρ = 2) is clamped rather than rejected.
use crate::production::{
    core::params::{ParamLayout, TaskShareSpec, TaskShares, TfpParams},
    errors::{TfpError, TfpResult},
};
use ndarray::Array1;

pub const DEFAULT_INIT_VALUE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub enum Init {
    Constant(f64),
    Calibrated,
    Fixed(TfpParams),
}

impl Default for Init {
    fn default() -> Self {
        Init::Constant(DEFAULT_INIT_VALUE)
    }
}

impl Init {
    /// Validated constant policy.
    ///
    /// # Errors
    /// [`TfpError::InvalidInitValue`] for non-finite `value`.
    pub fn constant(value: f64) -> TfpResult<Self> {
        if !value.is_finite() {
            return Err(TfpError::InvalidInitValue { value });
        }
        Ok(Init::Constant(value))
    }

    pub fn calibrated() -> Self {
        Init::Calibrated
    }

    pub fn fixed(params: TfpParams) -> Self {
        Init::Fixed(params)
    }

    /// Resolve the policy into parameters shaped for `layout`.
    ///
    /// # Errors
    /// - [`TfpError::InvalidInitValue`] for a non-finite constant.
    /// - Segment-length errors when fixed parameters disagree with `layout`.
    pub fn resolve(&self, layout: &ParamLayout) -> TfpResult<TfpParams> {
        match self {
            Init::Constant(value) => {
                if !value.is_finite() {
                    return Err(TfpError::InvalidInitValue { value: *value });
                }
                Ok(TfpParams::constant(layout, *value))
            }
            Init::Calibrated => Ok(calibrated_start(layout)),
            Init::Fixed(params) => {
                params.check_layout(layout)?;
                Ok(params.clone())
            }
        }
    }
}

fn calibrated_start(layout: &ParamLayout) -> TfpParams {
    let task_shares = match layout.task_shares {
        TaskShareSpec::Scalar => TaskShares::Scalar(0.5),
        TaskShareSpec::TimeVarying => TaskShares::TimeVarying(Array1::from_elem(layout.n_shares(), 0.5)),
    };
    TfpParams {
        state_effects: Array1::ones(layout.n_state_effects()),
        time_effects: Array1::ones(layout.n_time_effects()),
        task_shares,
        intercept: 1.0,
        capital_share: 0.3,
        foreign_advantage: 1.0,
        domestic_advantage: 1.0,
        ces: 0.85,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::production::core::shape::PanelShape;

    #[test]
    // Purpose
    // -------
    // Each policy resolves to parameters shaped for the layout.
    //
    // Given
    // -----
    // - S = 3, T = 2, time-varying shares.
    //
    // Expect
    // ------
    // - Default: every flat entry is 0.5.
    // - Calibrated: θ = 0.3, ρ = 0.85, shares 0.5, effects 1.
    fn policies_resolve_to_layout() {
        let layout =
            ParamLayout::new(PanelShape::new(3, 2).unwrap(), TaskShareSpec::TimeVarying);
        let theta = Init::default().resolve(&layout).unwrap().to_theta(&layout).unwrap();
        assert_eq!(theta.len(), layout.len());
        assert!(theta.iter().all(|&v| v == 0.5));

        let cal = Init::calibrated().resolve(&layout).unwrap();
        assert_eq!(cal.capital_share, 0.3);
        assert_eq!(cal.ces, 0.85);
        assert_eq!(cal.task_share(1), 0.5);
        assert_eq!(cal.state_effect(2), 1.0);
    }

    #[test]
    // Purpose
    // -------
    // Invalid policies fail before optimization.
    //
    // Given
    // -----
    // - A NaN constant; fixed scalar-share parameters against a
    //   time-varying layout.
    //
    // Expect
    // ------
    // - `InvalidInitValue` and `TaskShareLengthMismatch`.
    fn invalid_policies_are_rejected() {
        assert!(matches!(Init::constant(f64::NAN), Err(TfpError::InvalidInitValue { .. })));

        let shape = PanelShape::new(2, 3).unwrap();
        let scalar = ParamLayout::new(shape, TaskShareSpec::Scalar);
        let varying = ParamLayout::new(shape, TaskShareSpec::TimeVarying);
        let fixed = Init::fixed(TfpParams::constant(&scalar, 0.2));
        assert!(matches!(
            fixed.resolve(&varying),
            Err(TfpError::TaskShareLengthMismatch { expected: 3, actual: 1 })
        ));
    }
}
