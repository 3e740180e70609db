//! config — TOML configuration for TFP estimation.
//!
//! Purpose
//! -------
//! Deserialize a TOML document into [`TfpConfig`] and map it onto validated
//! [`TfpOptions`]. Every field is optional; omitted fields keep the library
//! defaults.
//!
//! Layout
//! ------
//! ```toml
//! task_shares = "time_varying"      # or "scalar"
//!
//! [init]
//! policy = "constant"               # or "calibrated"
//! value = 0.5
//!
//! [bounds]                          # [lower, upper] per segment
//! capital_share = [0.0, 1.0]
//! ces = [-5.0, 1.0]
//!
//! [solver]
//! name = "lm"                       # "lbfgs", "lbfgs_hagerzhang", ...
//! tol_grad = 1e-10
//! max_iter = 500
//! ```
//!
//! Conventions
//! -----------
//! - Unknown keys are rejected (`deny_unknown_fields`).
//! - A fixed initial parameter vector depends on the panel shape and is
//!   supplied in code through `Init::Fixed`, not through TOML.
use crate::{
    optimization::{
        errors::OptError,
        least_squares::{Bound, LsOptions, LsSolver, Tolerances},
    },
    production::{
        core::{bounds::ParamBounds, init::Init, options::TfpOptions, params::TaskShareSpec},
        errors::TfpError,
    },
};
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*};
use serde::Deserialize;
use std::str::FromStr;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The document is not valid TOML or does not match the schema.
    Parse { text: String },
    /// A field holds a value outside its accepted set.
    Invalid { field: &'static str, reason: String },
    /// Optimizer options were rejected.
    Optimization(OptError),
    /// Model options were rejected.
    Model(TfpError),
}

impl std::error::Error for ConfigError {}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Parse { text } => write!(f, "Config Error: failed to parse TOML: {text}"),
            ConfigError::Invalid { field, reason } => {
                write!(f, "Config Error: invalid `{field}`: {reason}")
            }
            ConfigError::Optimization(err) => write!(f, "Config Error: {err}"),
            ConfigError::Model(err) => write!(f, "Config Error: {err}"),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse { text: err.to_string() }
    }
}

impl From<OptError> for ConfigError {
    fn from(err: OptError) -> Self {
        ConfigError::Optimization(err)
    }
}

impl From<TfpError> for ConfigError {
    fn from(err: TfpError) -> Self {
        ConfigError::Model(err)
    }
}

#[cfg(feature = "python-bindings")]
impl std::convert::From<ConfigError> for PyErr {
    fn from(err: ConfigError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

/// Top-level estimation configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TfpConfig {
    /// `"scalar"` or `"time_varying"`.
    #[serde(default)]
    pub task_shares: Option<String>,
    #[serde(default)]
    pub init: InitToml,
    #[serde(default)]
    pub bounds: BoundsToml,
    #[serde(default)]
    pub solver: SolverToml,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitToml {
    pub policy: Option<String>,
    pub value: Option<f64>,
}

/// Per-segment `[lower, upper]` overrides.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoundsToml {
    pub state_effects: Option<[f64; 2]>,
    pub time_effects: Option<[f64; 2]>,
    pub task_shares: Option<[f64; 2]>,
    pub intercept: Option<[f64; 2]>,
    pub capital_share: Option<[f64; 2]>,
    pub foreign_advantage: Option<[f64; 2]>,
    pub domestic_advantage: Option<[f64; 2]>,
    pub ces: Option<[f64; 2]>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolverToml {
    pub name: Option<String>,
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub tol_step: Option<f64>,
    pub max_iter: Option<usize>,
    pub lbfgs_mem: Option<usize>,
    pub initial_damping: Option<f64>,
    #[serde(default)]
    pub verbose: bool,
}

impl TfpConfig {
    /// # Errors
    /// [`ConfigError::Parse`] for malformed TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Map the configuration onto validated estimation options.
    ///
    /// # Errors
    /// - [`ConfigError::Invalid`] for unknown task-share or init names, or a
    ///   constant policy without a value.
    /// - [`ConfigError::Optimization`] for rejected tolerances, solver names
    ///   or damping.
    /// - [`ConfigError::Model`] for malformed bounds or a non-finite init
    ///   value.
    pub fn into_options(self) -> ConfigResult<TfpOptions> {
        let task_shares = match self.task_shares.as_deref() {
            Some(name) => TaskShareSpec::from_str(name)
                .map_err(|reason| ConfigError::Invalid { field: "task_shares", reason })?,
            None => TaskShareSpec::default(),
        };
        let init = self.init.into_init()?;
        let bounds = self.bounds.into_bounds();
        let ls_opts = self.solver.into_ls_options()?;
        Ok(TfpOptions::new(task_shares, init, bounds, ls_opts)?)
    }
}

impl InitToml {
    fn into_init(self) -> ConfigResult<Init> {
        match self.policy.as_deref().map(str::to_lowercase).as_deref() {
            None => match self.value {
                Some(value) => Ok(Init::constant(value)?),
                None => Ok(Init::default()),
            },
            Some("constant") => {
                let value = self.value.ok_or_else(|| ConfigError::Invalid {
                    field: "init.value",
                    reason: "required when policy = \"constant\"".to_string(),
                })?;
                Ok(Init::constant(value)?)
            }
            Some("calibrated") => Ok(Init::calibrated()),
            Some(other) => Err(ConfigError::Invalid {
                field: "init.policy",
                reason: format!("unknown policy '{other}', expected 'constant' or 'calibrated'"),
            }),
        }
    }
}

impl BoundsToml {
    fn into_bounds(self) -> ParamBounds {
        let defaults = ParamBounds::default();
        let pick = |over: Option<[f64; 2]>, default: Bound| match over {
            Some([lower, upper]) => Bound { lower, upper },
            None => default,
        };
        ParamBounds {
            state_effects: pick(self.state_effects, defaults.state_effects),
            time_effects: pick(self.time_effects, defaults.time_effects),
            task_shares: pick(self.task_shares, defaults.task_shares),
            intercept: pick(self.intercept, defaults.intercept),
            capital_share: pick(self.capital_share, defaults.capital_share),
            foreign_advantage: pick(self.foreign_advantage, defaults.foreign_advantage),
            domestic_advantage: pick(self.domestic_advantage, defaults.domestic_advantage),
            ces: pick(self.ces, defaults.ces),
        }
    }
}

impl SolverToml {
    fn into_ls_options(self) -> ConfigResult<LsOptions> {
        let defaults = Tolerances::default();
        let tols = Tolerances::new(
            self.tol_grad.or(defaults.tol_grad),
            self.tol_cost.or(defaults.tol_cost),
            self.tol_step.or(defaults.tol_step),
            self.max_iter.or(defaults.max_iter),
        )?;
        let solver = match self.name.as_deref() {
            Some(name) => LsSolver::from_str(name)?,
            None => LsSolver::default(),
        };
        Ok(LsOptions::new(tols, solver, self.verbose, self.lbfgs_mem, self.initial_damping)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::least_squares::LineSearcher;

    #[test]
    // Purpose
    // -------
    // An empty document yields the library defaults.
    //
    // Given
    // -----
    // - `""`.
    //
    // Expect
    // ------
    // - `TfpOptions::default()`.
    fn empty_document_gives_defaults() {
        let opts = TfpConfig::from_toml_str("").unwrap().into_options().unwrap();
        assert_eq!(opts, TfpOptions::default());
    }

    #[test]
    // Purpose
    // -------
    // Every section maps onto the matching option field.
    //
    // Given
    // -----
    // - Time-varying shares, calibrated init, capital-share and CES
    //   overrides, and an L-BFGS solver with custom tolerances.
    //
    // Expect
    // ------
    // - Overrides applied; untouched segments keep their defaults.
    fn full_document_maps_onto_options() {
        let text = r#"
            task_shares = "time_varying"

            [init]
            policy = "calibrated"

            [bounds]
            capital_share = [0.05, 0.95]
            ces = [-5.0, 0.99]

            [solver]
            name = "lbfgs_hagerzhang"
            tol_grad = 1e-8
            max_iter = 250
            lbfgs_mem = 10
        "#;
        let opts = TfpConfig::from_toml_str(text).unwrap().into_options().unwrap();

        assert_eq!(opts.task_shares, TaskShareSpec::TimeVarying);
        assert_eq!(opts.init, Init::Calibrated);
        assert_eq!(opts.bounds.capital_share, Bound { lower: 0.05, upper: 0.95 });
        assert_eq!(opts.bounds.ces, Bound { lower: -5.0, upper: 0.99 });
        assert_eq!(opts.bounds.task_shares, ParamBounds::default().task_shares);
        assert_eq!(opts.ls_opts.solver, LsSolver::Lbfgs(LineSearcher::HagerZhang));
        assert_eq!(opts.ls_opts.tols.tol_grad, Some(1e-8));
        assert_eq!(opts.ls_opts.tols.max_iter, Some(250));
        assert_eq!(opts.ls_opts.tols.tol_cost, Tolerances::default().tol_cost);
        assert_eq!(opts.ls_opts.lbfgs_mem, Some(10));
    }

    #[test]
    // Purpose
    // -------
    // Malformed documents fail with the layer that rejected them.
    //
    // Given
    // -----
    // - An unknown key, an unknown task-share name, a constant policy with
    //   no value, an inverted bound, and an unknown solver.
    //
    // Expect
    // ------
    // - `Parse`, `Invalid`, `Invalid`, `Model(InvalidBound)`,
    //   `Optimization(InvalidSolver)` respectively.
    fn malformed_documents_are_rejected() {
        assert!(matches!(
            TfpConfig::from_toml_str("unknown_key = 1"),
            Err(ConfigError::Parse { .. })
        ));

        let parse_opts = |text: &str| TfpConfig::from_toml_str(text).unwrap().into_options();
        assert!(matches!(
            parse_opts("task_shares = \"quarterly\""),
            Err(ConfigError::Invalid { field: "task_shares", .. })
        ));
        assert!(matches!(
            parse_opts("[init]\npolicy = \"constant\""),
            Err(ConfigError::Invalid { field: "init.value", .. })
        ));
        assert!(matches!(
            parse_opts("[bounds]\ncapital_share = [1.0, 0.0]"),
            Err(ConfigError::Model(TfpError::InvalidBound { name: "capital_share", .. }))
        ));
        assert!(matches!(
            parse_opts("[solver]\nname = \"newton\""),
            Err(ConfigError::Optimization(OptError::InvalidSolver { .. }))
        ));
    }
}
