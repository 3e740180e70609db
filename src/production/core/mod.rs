//! core — panel shape, data, parameters, residual map and TFP recovery.
//!
//! Purpose
//! -------
//! Collect the numerical building blocks of the structural TFP model: the
//! validated observation panel, the named parameter record and its flat
//! layout, per-segment bounds, initial-guess policies, the residual map
//! with its analytic Jacobian, and the inversion that recovers productivity.
//! The model type in `production::models` builds on these primitives.
//!
//! Key behaviors
//! -------------
//! - [`PanelShape`] and [`TfpData`] fix the balanced, state-major panel.
//! - [`TfpParams`] / [`ParamLayout`] translate between named parameters and
//!   the flat optimizer vector.
//! - [`ParamBounds`] expands per-segment intervals into flat bounds.
//! - [`compute_residuals`] / [`residual_jacobian`] evaluate `r(θ)` and
//!   `∂r/∂θ` without dense indicator matrices.
//! - [`recover_tfp`] inverts the fitted model into `Z`.
//!
//! Conventions
//! -----------
//! - Row `i` is state `i / T`, year `i % T`; state 0 and year 0 carry zero
//!   effects.
//! - Pure functions over `ndarray` containers; no I/O and no logging.

pub mod bounds;
pub mod data;
pub mod init;
pub mod options;
pub mod params;
pub mod recovery;
pub mod residuals;
pub mod shape;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::bounds::ParamBounds;
pub use self::data::TfpData;
pub use self::init::Init;
pub use self::options::TfpOptions;
pub use self::params::{ParamLayout, TaskShareSpec, TaskShares, TfpParams};
pub use self::recovery::recover_tfp;
pub use self::residuals::{CD_LIMIT_EPS, ces_log_labor, compute_residuals, residual_jacobian};
pub use self::shape::PanelShape;
pub use self::validation::{validate_data, validate_theta};

pub mod prelude {
    pub use super::bounds::ParamBounds;
    pub use super::data::TfpData;
    pub use super::init::Init;
    pub use super::options::TfpOptions;
    pub use super::params::{ParamLayout, TaskShareSpec, TaskShares, TfpParams};
    pub use super::recovery::recover_tfp;
    pub use super::shape::PanelShape;
}
