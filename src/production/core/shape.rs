//! Panel dimensions for the structural TFP model.
//!
//! Observations are ordered state-major, year-minor: row `i` belongs to
//! state `i / T` and year `i % T`. State 0 and year 0 are the reference
//! categories for the fixed effects.
use crate::production::errors::{TfpError, TfpResult};

/// Balanced panel of `n_states` × `n_years`.
///
/// Invariant: both dimensions are at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelShape {
    pub n_states: usize,
    pub n_years: usize,
}

impl PanelShape {
    /// Construct a validated [`PanelShape`].
    ///
    /// # Errors
    /// [`TfpError::InvalidPanelShape`] if either dimension is zero.
    pub fn new(n_states: usize, n_years: usize) -> TfpResult<Self> {
        if n_states == 0 {
            return Err(TfpError::InvalidPanelShape {
                n_states,
                n_years,
                reason: "At least one state is required.",
            });
        }
        if n_years == 0 {
            return Err(TfpError::InvalidPanelShape {
                n_states,
                n_years,
                reason: "At least one year is required.",
            });
        }
        Ok(PanelShape { n_states, n_years })
    }

    /// Number of observations `S·T`.
    pub fn n_obs(&self) -> usize {
        self.n_states * self.n_years
    }

    /// State index of observation `row`.
    #[inline]
    pub fn state_of(&self, row: usize) -> usize {
        row / self.n_years
    }

    /// Year index of observation `row`.
    #[inline]
    pub fn year_of(&self, row: usize) -> usize {
        row % self.n_years
    }
}
