//! Structural TFP parameters and their flat optimizer layout.
//!
//! Purpose
//! -------
//! Hold the named parameters of the production model ([`TfpParams`]) and
//! describe how they are packed into the flat vector the optimizer sees
//! ([`ParamLayout`]). The flat vector exists only at the optimizer boundary;
//! model code works with the tagged record.
//!
//! Key behaviors
//! -------------
//! - [`TaskShareSpec`] fixes whether the CES task share λ is a single scalar
//!   or one value per year. It alone determines the λ-segment length.
//! - [`ParamLayout`] computes segment offsets for a given panel shape and
//!   task-share specification.
//! - [`TfpParams::to_theta`] / [`TfpParams::from_theta`] convert between the
//!   record and the flat vector, checking every segment length.
//!
//! Invariants & assumptions
//! ------------------------
//! - Flat layout, in order:
//!   `[δ (S−1)][γ (T−1)][λ (1 or T)][β][θ][αF][αD][ρ]`.
//! - The reference state and year (index 0) carry an implicit zero effect
//!   and are not stored.
//! - All stored values are finite.
//!
//! Conventions
//! -----------
//! - δ = state effects, γ = year effects, β = intercept, θ = capital share,
//!   αF / αD = foreign / domestic labor advantage, ρ = CES parameter.
use crate::production::{
    core::shape::PanelShape,
    errors::{TfpError, TfpResult},
};
use ndarray::{Array1, s};
use std::ops::Range;

/// Number of scalar structural parameters after the share segment
/// (β, θ, αF, αD, ρ).
pub const N_SCALAR_PARAMS: usize = 5;

/// Whether the CES task share λ is common to all years or year-specific.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskShareSpec {
    #[default]
    Scalar,
    TimeVarying,
}

impl TaskShareSpec {
    /// Length of the λ segment for a panel with `n_years` years.
    pub fn n_shares(&self, n_years: usize) -> usize {
        match self {
            TaskShareSpec::Scalar => 1,
            TaskShareSpec::TimeVarying => n_years,
        }
    }
}

impl std::str::FromStr for TaskShareSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scalar" => Ok(TaskShareSpec::Scalar),
            "time_varying" | "timevarying" => Ok(TaskShareSpec::TimeVarying),
            _ => Err(format!(
                "Unknown task share specification '{s}'. Valid options are 'scalar' or 'time_varying'."
            )),
        }
    }
}

/// CES task share(s) λ.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskShares {
    Scalar(f64),
    TimeVarying(Array1<f64>),
}

impl TaskShares {
    /// Share applying to year `t`. The scalar variant broadcasts.
    #[inline]
    pub fn share(&self, t: usize) -> f64 {
        match self {
            TaskShares::Scalar(v) => *v,
            TaskShares::TimeVarying(v) => v[t],
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TaskShares::Scalar(_) => 1,
            TaskShares::TimeVarying(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn spec(&self) -> TaskShareSpec {
        match self {
            TaskShares::Scalar(_) => TaskShareSpec::Scalar,
            TaskShares::TimeVarying(_) => TaskShareSpec::TimeVarying,
        }
    }

    fn values(&self) -> Vec<f64> {
        match self {
            TaskShares::Scalar(v) => vec![*v],
            TaskShares::TimeVarying(v) => v.to_vec(),
        }
    }
}

/// Segment offsets of the flat parameter vector for one model configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamLayout {
    pub shape: PanelShape,
    pub task_shares: TaskShareSpec,
}

impl ParamLayout {
    pub fn new(shape: PanelShape, task_shares: TaskShareSpec) -> Self {
        ParamLayout { shape, task_shares }
    }

    pub fn n_state_effects(&self) -> usize {
        self.shape.n_states - 1
    }

    pub fn n_time_effects(&self) -> usize {
        self.shape.n_years - 1
    }

    pub fn n_shares(&self) -> usize {
        self.task_shares.n_shares(self.shape.n_years)
    }

    /// Total length `S−1 + T−1 + |λ| + 5`.
    pub fn len(&self) -> usize {
        self.n_state_effects() + self.n_time_effects() + self.n_shares() + N_SCALAR_PARAMS
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn state_effects(&self) -> Range<usize> {
        0..self.n_state_effects()
    }

    pub fn time_effects(&self) -> Range<usize> {
        let start = self.n_state_effects();
        start..start + self.n_time_effects()
    }

    pub fn task_shares(&self) -> Range<usize> {
        let start = self.time_effects().end;
        start..start + self.n_shares()
    }

    pub fn intercept(&self) -> usize {
        self.task_shares().end
    }

    pub fn capital_share(&self) -> usize {
        self.intercept() + 1
    }

    pub fn foreign_advantage(&self) -> usize {
        self.intercept() + 2
    }

    pub fn domestic_advantage(&self) -> usize {
        self.intercept() + 3
    }

    pub fn ces(&self) -> usize {
        self.intercept() + 4
    }

    /// Flat column of the λ applying to year `t`.
    #[inline]
    pub fn share_index(&self, t: usize) -> usize {
        match self.task_shares {
            TaskShareSpec::Scalar => self.task_shares().start,
            TaskShareSpec::TimeVarying => self.task_shares().start + t,
        }
    }

    /// Human-readable name of flat coordinate `index`.
    pub fn param_name(&self, index: usize) -> String {
        if self.state_effects().contains(&index) {
            return format!("state_effect[{}]", index - self.state_effects().start + 1);
        }
        if self.time_effects().contains(&index) {
            return format!("time_effect[{}]", index - self.time_effects().start + 1);
        }
        if self.task_shares().contains(&index) {
            return match self.task_shares {
                TaskShareSpec::Scalar => "task_share".to_string(),
                TaskShareSpec::TimeVarying => {
                    format!("task_share[{}]", index - self.task_shares().start)
                }
            };
        }
        let name = match index - self.intercept() {
            0 => "intercept",
            1 => "capital_share",
            2 => "foreign_advantage",
            3 => "domestic_advantage",
            4 => "ces",
            _ => "out_of_range",
        };
        name.to_string()
    }
}

/// Named structural parameters of the TFP production model.
///
/// Fields
/// ------
/// - `state_effects`: δ for states `1..S` (state 0 is the reference).
/// - `time_effects`: γ for years `1..T` (year 0 is the reference).
/// - `task_shares`: CES share(s) λ.
/// - `intercept`: β.
/// - `capital_share`: θ, the Cobb–Douglas capital share.
/// - `foreign_advantage` / `domestic_advantage`: αF / αD.
/// - `ces`: ρ; `ρ → 0` is the Cobb–Douglas labor limit.
#[derive(Debug, Clone, PartialEq)]
pub struct TfpParams {
    pub state_effects: Array1<f64>,
    pub time_effects: Array1<f64>,
    pub task_shares: TaskShares,
    pub intercept: f64,
    pub capital_share: f64,
    pub foreign_advantage: f64,
    pub domestic_advantage: f64,
    pub ces: f64,
}

impl TfpParams {
    /// Construct parameters, checking that every value is finite.
    ///
    /// Segment lengths are checked against a layout by
    /// [`TfpParams::check_layout`] / [`TfpParams::to_theta`].
    ///
    /// # Errors
    /// [`TfpError::NonFiniteParameter`] with the position in flat order.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        state_effects: Array1<f64>, time_effects: Array1<f64>, task_shares: TaskShares,
        intercept: f64, capital_share: f64, foreign_advantage: f64, domestic_advantage: f64,
        ces: f64,
    ) -> TfpResult<Self> {
        let params = TfpParams {
            state_effects,
            time_effects,
            task_shares,
            intercept,
            capital_share,
            foreign_advantage,
            domestic_advantage,
            ces,
        };
        if let Some((index, &value)) =
            params.flat_values().iter().enumerate().find(|(_, v)| !v.is_finite())
        {
            return Err(TfpError::NonFiniteParameter { index, value });
        }
        Ok(params)
    }

    /// Every parameter set to `value`, shaped for `layout`.
    pub fn constant(layout: &ParamLayout, value: f64) -> Self {
        let task_shares = match layout.task_shares {
            TaskShareSpec::Scalar => TaskShares::Scalar(value),
            TaskShareSpec::TimeVarying => {
                TaskShares::TimeVarying(Array1::from_elem(layout.n_shares(), value))
            }
        };
        TfpParams {
            state_effects: Array1::from_elem(layout.n_state_effects(), value),
            time_effects: Array1::from_elem(layout.n_time_effects(), value),
            task_shares,
            intercept: value,
            capital_share: value,
            foreign_advantage: value,
            domestic_advantage: value,
            ces: value,
        }
    }

    /// Effect of state `s`; exactly zero for the reference state.
    #[inline]
    pub fn state_effect(&self, s: usize) -> f64 {
        if s == 0 { 0.0 } else { self.state_effects[s - 1] }
    }

    /// Effect of year `t`; exactly zero for the reference year.
    #[inline]
    pub fn time_effect(&self, t: usize) -> f64 {
        if t == 0 { 0.0 } else { self.time_effects[t - 1] }
    }

    /// Task share applying to year `t`.
    #[inline]
    pub fn task_share(&self, t: usize) -> f64 {
        self.task_shares.share(t)
    }

    /// Check every segment length against `layout`.
    ///
    /// # Errors
    /// - [`TfpError::StateEffectsLengthMismatch`]
    /// - [`TfpError::TimeEffectsLengthMismatch`]
    /// - [`TfpError::TaskShareLengthMismatch`] when the share variant or its
    ///   length disagrees with the layout's specification.
    pub fn check_layout(&self, layout: &ParamLayout) -> TfpResult<()> {
        if self.state_effects.len() != layout.n_state_effects() {
            return Err(TfpError::StateEffectsLengthMismatch {
                expected: layout.n_state_effects(),
                actual: self.state_effects.len(),
            });
        }
        if self.time_effects.len() != layout.n_time_effects() {
            return Err(TfpError::TimeEffectsLengthMismatch {
                expected: layout.n_time_effects(),
                actual: self.time_effects.len(),
            });
        }
        if self.task_shares.spec() != layout.task_shares
            || self.task_shares.len() != layout.n_shares()
        {
            return Err(TfpError::TaskShareLengthMismatch {
                expected: layout.n_shares(),
                actual: self.task_shares.len(),
            });
        }
        Ok(())
    }

    /// Pack into the flat optimizer vector.
    ///
    /// # Errors
    /// Segment-length errors from [`TfpParams::check_layout`].
    pub fn to_theta(&self, layout: &ParamLayout) -> TfpResult<Array1<f64>> {
        self.check_layout(layout)?;
        Ok(Array1::from(self.flat_values()))
    }

    /// Unpack a flat optimizer vector.
    ///
    /// # Errors
    /// [`TfpError::ThetaLengthMismatch`] if `theta.len() != layout.len()`.
    pub fn from_theta(theta: &Array1<f64>, layout: &ParamLayout) -> TfpResult<Self> {
        if theta.len() != layout.len() {
            return Err(TfpError::ThetaLengthMismatch {
                expected: layout.len(),
                actual: theta.len(),
            });
        }
        let shares = theta.slice(s![layout.task_shares()]);
        let task_shares = match layout.task_shares {
            TaskShareSpec::Scalar => TaskShares::Scalar(shares[0]),
            TaskShareSpec::TimeVarying => TaskShares::TimeVarying(shares.to_owned()),
        };
        Ok(TfpParams {
            state_effects: theta.slice(s![layout.state_effects()]).to_owned(),
            time_effects: theta.slice(s![layout.time_effects()]).to_owned(),
            task_shares,
            intercept: theta[layout.intercept()],
            capital_share: theta[layout.capital_share()],
            foreign_advantage: theta[layout.foreign_advantage()],
            domestic_advantage: theta[layout.domestic_advantage()],
            ces: theta[layout.ces()],
        })
    }

    fn flat_values(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(
            self.state_effects.len() + self.time_effects.len() + self.task_shares.len() + 5,
        );
        out.extend(self.state_effects.iter());
        out.extend(self.time_effects.iter());
        out.extend(self.task_shares.values());
        out.extend([
            self.intercept,
            self.capital_share,
            self.foreign_advantage,
            self.domestic_advantage,
            self.ces,
        ]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // ---- Scope ---------------------------------------------------------------
    //
    // These tests cover:
    // - Segment offsets for scalar and time-varying task shares.
    // - Reference-category accessors.
    // - Flat vector packing and its length checks.
    // -------------------------------------------------------------------------

    fn layout(s: usize, t: usize, spec: TaskShareSpec) -> ParamLayout {
        ParamLayout::new(PanelShape::new(s, t).unwrap(), spec)
    }

    #[test]
    // Purpose
    // -------
    // Offsets follow `[δ][γ][λ][β][θ][αF][αD][ρ]`.
    //
    // Given
    // -----
    // - S = 3, T = 4 with scalar and time-varying shares.
    //
    // Expect
    // ------
    // - Lengths 11 and 14; β at 6 and 9; ρ last.
    fn layout_offsets_match_flat_order() {
        let scalar = layout(3, 4, TaskShareSpec::Scalar);
        assert_eq!(scalar.len(), 2 + 3 + 1 + 5);
        assert_eq!(scalar.state_effects(), 0..2);
        assert_eq!(scalar.time_effects(), 2..5);
        assert_eq!(scalar.task_shares(), 5..6);
        assert_eq!(scalar.intercept(), 6);
        assert_eq!(scalar.ces(), 10);
        assert_eq!(scalar.share_index(3), 5);

        let varying = layout(3, 4, TaskShareSpec::TimeVarying);
        assert_eq!(varying.len(), 14);
        assert_eq!(varying.intercept(), 9);
        assert_eq!(varying.share_index(3), 8);
        assert_eq!(varying.param_name(8), "task_share[3]");
        assert_eq!(varying.param_name(0), "state_effect[1]");
        assert_eq!(varying.param_name(13), "ces");
    }

    #[test]
    // Purpose
    // -------
    // Reference state and year effects are exactly zero; others are read
    // from the stored segments.
    //
    // Given
    // -----
    // - δ = [0.3], γ = [−0.1, 0.2].
    //
    // Expect
    // ------
    // - `state_effect(0) == 0`, `state_effect(1) == 0.3`,
    //   `time_effect(0) == 0`, `time_effect(2) == 0.2`.
    fn reference_effects_are_zero() {
        let p = TfpParams::new(
            array![0.3],
            array![-0.1, 0.2],
            TaskShares::Scalar(0.4),
            1.0,
            0.3,
            1.0,
            1.0,
            0.5,
        )
        .unwrap();
        assert_eq!(p.state_effect(0), 0.0);
        assert_eq!(p.state_effect(1), 0.3);
        assert_eq!(p.time_effect(0), 0.0);
        assert_eq!(p.time_effect(2), 0.2);
        assert_eq!(p.task_share(2), 0.4);
    }

    #[test]
    // Purpose
    // -------
    // Packing checks the share segment against the layout and unpacking
    // checks the total length.
    //
    // Given
    // -----
    // - Scalar-share parameters against a time-varying layout.
    // - A flat vector one element too short.
    //
    // Expect
    // ------
    // - `TaskShareLengthMismatch` and `ThetaLengthMismatch`.
    fn packing_rejects_mismatched_lengths() {
        let scalar = layout(2, 3, TaskShareSpec::Scalar);
        let varying = layout(2, 3, TaskShareSpec::TimeVarying);
        let p = TfpParams::constant(&scalar, 0.5);
        assert!(matches!(
            p.to_theta(&varying),
            Err(TfpError::TaskShareLengthMismatch { expected: 3, actual: 1 })
        ));
        let short = Array1::zeros(scalar.len() - 1);
        assert!(matches!(
            TfpParams::from_theta(&short, &scalar),
            Err(TfpError::ThetaLengthMismatch { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // A time-varying parameter record survives packing and unpacking, and
    // non-finite values are reported at their flat position.
    //
    // Given
    // -----
    // - S = 2, T = 2, time-varying shares [0.4, 0.6].
    //
    // Expect
    // ------
    // - Identical record after the round trip; NaN in θ reported at index 5.
    fn flat_vector_preserves_named_values() {
        let lay = layout(2, 2, TaskShareSpec::TimeVarying);
        let p = TfpParams::new(
            array![0.1],
            array![0.2],
            TaskShares::TimeVarying(array![0.4, 0.6]),
            1.5,
            0.3,
            2.0,
            1.0,
            0.7,
        )
        .unwrap();
        let theta = p.to_theta(&lay).unwrap();
        assert_eq!(theta, array![0.1, 0.2, 0.4, 0.6, 1.5, 0.3, 2.0, 1.0, 0.7]);
        assert_eq!(TfpParams::from_theta(&theta, &lay).unwrap(), p);

        let bad = TfpParams::new(
            array![0.1],
            array![0.2],
            TaskShares::TimeVarying(array![0.4, 0.6]),
            1.5,
            f64::NAN,
            2.0,
            1.0,
            0.7,
        );
        assert!(matches!(bad, Err(TfpError::NonFiniteParameter { index: 5, .. })));
    }
}
