//! production — structural state-level TFP estimation.
//!
//! Purpose
//! -------
//! Estimate total factor productivity from a panel model relating log
//! output to a Cobb–Douglas combination of capital and a CES aggregate of
//! foreign and domestic labor, with state and year fixed effects. The model
//! is fit by bounded nonlinear least squares; productivity `Z` is recovered
//! by inverting the fitted production function.
//!
//! Key behaviors
//! -------------
//! - [`core`]: panel shape, validated data, parameters and layout, bounds,
//!   initial-guess policies, residual map, Jacobian and TFP recovery.
//! - [`models`]: [`TfpModel`] and [`TfpFit`].
//! - [`errors`]: [`TfpError`] / [`TfpResult`], with conversions to and from
//!   the optimizer error type.
//!
//! Conventions
//! -----------
//! - Observations are ordered state-major then year-minor; flat parameters
//!   follow `[δ (S−1)][γ (T−1)][λ (1 or T)][β][θ][αF][αD][ρ]`.
//! - Logging goes through `tracing` at the model layer only (fit start and
//!   finish, non-convergence); the core is silent.
//!
//! Downstream usage
//! ----------------
//! 1. Build or assemble a `[logY, logK, F, D]` matrix (see `panel`) and
//!    wrap it in [`TfpData`] with its [`PanelShape`].
//! 2. Choose [`TfpOptions`] (task shares, init policy, bounds, solver).
//! 3. `TfpModel::new(shape, options).fit(&data, None)`.
//! 4. `fit.tfp()` for `Z`; `model.standard_errors(&data)` for inference.

pub mod core;
pub mod errors;
pub mod models;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::core::{
    Init, PanelShape, ParamBounds, ParamLayout, TaskShareSpec, TaskShares, TfpData, TfpOptions,
    TfpParams, recover_tfp,
};
pub use self::errors::{TfpError, TfpResult};
pub use self::models::{TfpFit, TfpModel};

pub mod prelude {
    pub use super::{
        Init, PanelShape, ParamBounds, ParamLayout, TaskShareSpec, TaskShares, TfpData, TfpError,
        TfpFit, TfpModel, TfpOptions, TfpParams, TfpResult, recover_tfp,
    };
}
