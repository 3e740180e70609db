//! Estimation options for the TFP model.
//!
//! [`TfpOptions`] bundles the task-share specification, the initial-guess
//! policy, per-segment bounds and the least-squares optimizer options. Its
//! components validate themselves; [`TfpOptions::new`] adds the one
//! cross-field check (bounds are well formed) so a model never starts with
//! an unusable configuration.
use crate::{
    optimization::least_squares::LsOptions,
    production::{
        core::{bounds::ParamBounds, init::Init, params::TaskShareSpec},
        errors::TfpResult,
    },
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TfpOptions {
    pub task_shares: TaskShareSpec,
    pub init: Init,
    pub bounds: ParamBounds,
    pub ls_opts: LsOptions,
}

impl TfpOptions {
    /// # Errors
    /// [`TfpError::InvalidBound`](crate::production::errors::TfpError::InvalidBound)
    /// for a malformed segment interval.
    pub fn new(
        task_shares: TaskShareSpec, init: Init, bounds: ParamBounds, ls_opts: LsOptions,
    ) -> TfpResult<Self> {
        bounds.validate()?;
        Ok(TfpOptions { task_shares, init, bounds, ls_opts })
    }
}
