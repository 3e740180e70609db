//! Per-segment box constraints for the TFP parameters.
//!
//! [`ParamBounds`] holds one interval per parameter segment. Expanding it
//! against a [`ParamLayout`] yields the flat [`Bounds`] the optimizer
//! consumes, so the bound array always has the same shape as the parameter
//! vector for the configured task-share specification.
use crate::{
    optimization::least_squares::bounds::{Bound, Bounds},
    production::{
        core::params::ParamLayout,
        errors::{TfpError, TfpResult},
    },
};
use std::iter;

/// Interval per parameter segment. Fixed-effect and task-share intervals
/// apply to every element of their segment.
///
/// Defaults: θ ∈ [0, 1], ρ ≤ 1, everything else unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamBounds {
    pub state_effects: Bound,
    pub time_effects: Bound,
    pub task_shares: Bound,
    pub intercept: Bound,
    pub capital_share: Bound,
    pub foreign_advantage: Bound,
    pub domestic_advantage: Bound,
    pub ces: Bound,
}

impl Default for ParamBounds {
    fn default() -> Self {
        ParamBounds {
            state_effects: Bound::unbounded(),
            time_effects: Bound::unbounded(),
            task_shares: Bound::unbounded(),
            intercept: Bound::unbounded(),
            capital_share: Bound { lower: 0.0, upper: 1.0 },
            foreign_advantage: Bound::unbounded(),
            domestic_advantage: Bound::unbounded(),
            ces: Bound { lower: f64::NEG_INFINITY, upper: 1.0 },
        }
    }
}

impl ParamBounds {
    /// Check every segment interval.
    ///
    /// # Errors
    /// [`TfpError::InvalidBound`] naming the first segment with a NaN end or
    /// `lower >= upper`.
    pub fn validate(&self) -> TfpResult<()> {
        for (name, bound) in self.named() {
            if bound.lower.is_nan() || bound.upper.is_nan() || bound.lower >= bound.upper {
                return Err(TfpError::InvalidBound {
                    name,
                    lower: bound.lower,
                    upper: bound.upper,
                });
            }
        }
        Ok(())
    }

    /// Intersect with the CES domain: task shares in `[0, 1]` and positive
    /// advantage scales. The L-BFGS path maps these finite bounds to
    /// interior transforms, so its line searches never evaluate a share
    /// outside `(0, 1)`.
    pub fn within_ces_domain(&self) -> ParamBounds {
        let intersect = |b: Bound, lower: f64, upper: f64| Bound {
            lower: b.lower.max(lower),
            upper: b.upper.min(upper),
        };
        ParamBounds {
            task_shares: intersect(self.task_shares, 0.0, 1.0),
            foreign_advantage: intersect(self.foreign_advantage, 0.0, f64::INFINITY),
            domestic_advantage: intersect(self.domestic_advantage, 0.0, f64::INFINITY),
            ..*self
        }
    }

    /// Expand into flat bounds matching `layout`.
    ///
    /// # Errors
    /// [`TfpError::InvalidBound`] from [`ParamBounds::validate`].
    pub fn to_bounds(&self, layout: &ParamLayout) -> TfpResult<Bounds> {
        self.validate()?;
        let flat = iter::repeat(self.state_effects)
            .take(layout.n_state_effects())
            .chain(iter::repeat(self.time_effects).take(layout.n_time_effects()))
            .chain(iter::repeat(self.task_shares).take(layout.n_shares()))
            .chain([
                self.intercept,
                self.capital_share,
                self.foreign_advantage,
                self.domestic_advantage,
                self.ces,
            ]);
        Ok(Bounds::from_bounds(flat)?)
    }

    fn named(&self) -> [(&'static str, Bound); 8] {
        [
            ("state_effects", self.state_effects),
            ("time_effects", self.time_effects),
            ("task_shares", self.task_shares),
            ("intercept", self.intercept),
            ("capital_share", self.capital_share),
            ("foreign_advantage", self.foreign_advantage),
            ("domestic_advantage", self.domestic_advantage),
            ("ces", self.ces),
        ]
    }
}
