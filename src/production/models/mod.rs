//! models — the user-facing structural TFP model.
//!
//! Purpose
//! -------
//! Expose [`TfpModel`], which implements [`LeastSquares`] over a balanced
//! state-year panel and provides `compute_res`, `jacobian`, `fit`,
//! `recover_tfp` and `standard_errors`, plus the [`TfpFit`] result type.
//!
//! Invariants & assumptions
//! ------------------------
//! - The flat parameter layout is fixed at construction from the panel
//!   shape and the task-share specification in the options.
//! - Data passed to any method must have the model's panel shape; this is
//!   checked before evaluation.
//!
//! Downstream usage
//! ----------------
//! - Build a [`PanelShape`] and [`TfpOptions`], construct the model with
//!   `TfpModel::new(shape, options)`, then `fit(&data, None)`.
//! - Use `TfpFit::tfp()` or `TfpModel::recover_tfp(&data)` for `Z`.
//!
//! [`LeastSquares`]: crate::optimization::least_squares::LeastSquares
//! [`PanelShape`]: crate::production::core::PanelShape
//! [`TfpOptions`]: crate::production::core::TfpOptions

pub mod tfp;

pub use self::tfp::{TfpFit, TfpModel};

pub mod prelude {
    pub use super::tfp::{TfpFit, TfpModel};
}
