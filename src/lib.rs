//! state_tfp — state-level total factor productivity estimation.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the TFP model to Python via the `_state_tfp` extension module.
//! The model is a Cobb–Douglas production function in capital and a CES
//! aggregate of foreign- and domestic-born labor, with state and year fixed
//! effects, fit by bounded nonlinear least squares on a state-year panel.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`production`, `panel`, `optimization`,
//!   `inference`, `config`) as the public crate surface.
//! - Define `#[pyclass]` wrappers and the `#[pymodule]` initializer for the
//!   `_state_tfp` Python extension when `python-bindings` is enabled.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner modules; this file performs only
//!   FFI glue, input conversion and error mapping.
//! - Panel rows are ordered state-major: row `i` belongs to state `i / T`
//!   and year `i % T`.
//!
//! Conventions
//! -----------
//! - Python-exposed classes live under `_state_tfp.tfp_models` and are
//!   wrapped by a thin pure-Python facade.
//! - Errors from core Rust code are converted to `ValueError` at the PyO3
//!   boundary.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code should depend directly on the inner modules; a typical
//!   pipeline is [`panel::assemble`] → [`panel::Panel::to_tfp_data`] →
//!   [`production::TfpModel::fit`] → [`production::TfpFit::tfp`] →
//!   [`panel::Panel::attach_tfp`].
//!
//! Testing notes
//! -------------
//! - Numerical behavior is covered by unit tests in the inner modules and by
//!   the integration tests under `tests/`.

pub mod config;
pub mod inference;
pub mod optimization;
pub mod panel;
pub mod production;
pub mod utils;

#[cfg(feature = "python-bindings")]
use pyo3::prelude::*;

#[cfg(feature = "python-bindings")]
use pyo3::types::PyAny;

#[cfg(feature = "python-bindings")]
use crate::{
    inference::ParamInference,
    production::{
        core::params::{TaskShares, TfpParams},
        models::tfp::{TfpFit, TfpModel},
    },
    utils::{build_tfp_model, extract_tfp_data, extract_vector},
};

/// TFPModel — Python-facing wrapper for the structural TFP model.
///
/// Purpose
/// -------
/// Expose [`TfpModel`] to Python callers while preserving the core Rust
/// invariants and error handling.
///
/// Parameters
/// ----------
/// Constructed from Python via `TFPModel(n_states, n_years, ...)`:
/// - `task_shares`: `"scalar"` (default) or `"time_varying"`.
/// - `init`, `init_value`: `"constant"` with a value (default 0.5) or
///   `"calibrated"`.
/// - `solver`, `tol_grad`, `tol_cost`, `tol_step`, `max_iter`, `lbfgs_mem`,
///   `initial_damping`, `verbose`: optimizer configuration.
/// - `capital_share_bounds`, `ces_bounds`: optional `(lower, upper)`
///   overrides.
///
/// Notes
/// -----
/// - `data` arguments are `S·T × 4` matrices `[logY, logK, F, D]`.
/// - Native Rust callers should work with [`TfpModel`] directly.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "state_tfp.tfp_models")]
pub struct TFPModel {
    pub inner: TfpModel,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl TFPModel {
    #[new]
    #[pyo3(
        signature = (
            n_states,
            n_years,
            task_shares = None,
            init = None,
            init_value = None,
            solver = None,
            tol_grad = None,
            tol_cost = None,
            tol_step = None,
            max_iter = None,
            lbfgs_mem = None,
            initial_damping = None,
            capital_share_bounds = None,
            ces_bounds = None,
            verbose = None,
        ),
        text_signature = "(n_states, n_years, /, task_shares='scalar', init=None, \
                          init_value=None, solver='lm', tol_grad=None, tol_cost=None, \
                          tol_step=None, max_iter=None, lbfgs_mem=None, initial_damping=None, \
                          capital_share_bounds=None, ces_bounds=None, verbose=False)"
    )]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        n_states: usize, n_years: usize, task_shares: Option<&str>, init: Option<&str>,
        init_value: Option<f64>, solver: Option<&str>, tol_grad: Option<f64>,
        tol_cost: Option<f64>, tol_step: Option<f64>, max_iter: Option<usize>,
        lbfgs_mem: Option<usize>, initial_damping: Option<f64>,
        capital_share_bounds: Option<(f64, f64)>, ces_bounds: Option<(f64, f64)>,
        verbose: Option<bool>,
    ) -> PyResult<Self> {
        let inner = build_tfp_model(
            n_states,
            n_years,
            task_shares,
            init,
            init_value,
            solver,
            tol_grad,
            tol_cost,
            tol_step,
            max_iter,
            lbfgs_mem,
            initial_damping,
            capital_share_bounds,
            ces_bounds,
            verbose,
        )?;
        Ok(TFPModel { inner })
    }

    #[pyo3(signature = (data, p0 = None), text_signature = "(self, data, /, p0=None)")]
    pub fn fit<'py>(
        &mut self, py: Python<'py>, data: &Bound<'py, PyAny>, p0: Option<&Bound<'py, PyAny>>,
    ) -> PyResult<TFPFitResult> {
        let tfp_data = extract_tfp_data(data, self.inner.shape)?;
        let start = match p0 {
            Some(raw) => {
                let theta = extract_vector(py, raw, "p0")?;
                Some(TfpParams::from_theta(&theta, &self.inner.layout)?)
            }
            None => None,
        };
        let fit = self.inner.fit(&tfp_data, start)?;
        Ok(TFPFitResult { inner: fit })
    }

    #[pyo3(text_signature = "(self, theta, data, /)")]
    pub fn compute_res<'py>(
        &self, py: Python<'py>, theta: &Bound<'py, PyAny>, data: &Bound<'py, PyAny>,
    ) -> PyResult<Vec<f64>> {
        let theta = extract_vector(py, theta, "theta")?;
        let tfp_data = extract_tfp_data(data, self.inner.shape)?;
        Ok(self.inner.compute_res(&theta, &tfp_data)?.to_vec())
    }

    #[pyo3(text_signature = "(self, data, /)")]
    pub fn recover_tfp<'py>(&self, data: &Bound<'py, PyAny>) -> PyResult<Vec<f64>> {
        let tfp_data = extract_tfp_data(data, self.inner.shape)?;
        Ok(self.inner.recover_tfp(&tfp_data)?.to_vec())
    }

    #[pyo3(text_signature = "(self, data, /)")]
    pub fn standard_errors<'py>(&self, data: &Bound<'py, PyAny>) -> PyResult<TFPInference> {
        let tfp_data = extract_tfp_data(data, self.inner.shape)?;
        Ok(TFPInference { inner: self.inner.standard_errors(&tfp_data)? })
    }

    #[getter]
    pub fn n_params(&self) -> usize {
        self.inner.n_params()
    }

    #[getter]
    pub fn param_names(&self) -> Vec<String> {
        (0..self.inner.n_params()).map(|i| self.inner.layout.param_name(i)).collect()
    }

    #[getter]
    pub fn results(&self) -> PyResult<TFPFitResult> {
        Ok(TFPFitResult { inner: self.inner.fitted()?.clone() })
    }
}

/// TFPFitResult — fitted parameters and optimizer diagnostics.
///
/// Instances are produced by `TFPModel.fit` and `TFPModel.results`; Rust
/// code should use [`TfpFit`] directly.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "state_tfp.tfp_models")]
pub struct TFPFitResult {
    pub inner: TfpFit,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl TFPFitResult {
    #[getter]
    pub fn theta_hat(&self) -> Vec<f64> {
        self.inner.theta_hat.to_vec()
    }

    #[getter]
    pub fn ssr(&self) -> f64 {
        self.inner.ssr
    }

    #[getter]
    pub fn converged(&self) -> bool {
        self.inner.converged()
    }

    #[getter]
    pub fn status(&self) -> String {
        self.inner.outcome.status.clone()
    }

    #[getter]
    pub fn iterations(&self) -> usize {
        self.inner.outcome.iterations
    }

    #[getter]
    pub fn grad_norm(&self) -> Option<f64> {
        self.inner.outcome.grad_norm
    }

    #[getter]
    pub fn fn_evals(&self) -> Vec<(String, u64)> {
        self.inner.outcome.fn_evals.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[getter]
    pub fn ssr_history(&self) -> Vec<f64> {
        self.inner.outcome.ssr_history.clone()
    }

    #[getter]
    pub fn residuals(&self) -> Vec<f64> {
        self.inner.residuals.to_vec()
    }

    /// Recovered productivity `Z`, one value per panel row.
    #[getter]
    pub fn tfp(&self) -> PyResult<Vec<f64>> {
        Ok(self.inner.tfp()?.to_vec())
    }

    #[getter]
    pub fn state_effects(&self) -> Vec<f64> {
        self.inner.params.state_effects.to_vec()
    }

    #[getter]
    pub fn time_effects(&self) -> Vec<f64> {
        self.inner.params.time_effects.to_vec()
    }

    #[getter]
    pub fn task_shares(&self) -> Vec<f64> {
        match &self.inner.params.task_shares {
            TaskShares::Scalar(share) => vec![*share],
            TaskShares::TimeVarying(shares) => shares.to_vec(),
        }
    }

    #[getter]
    pub fn intercept(&self) -> f64 {
        self.inner.params.intercept
    }

    #[getter]
    pub fn capital_share(&self) -> f64 {
        self.inner.params.capital_share
    }

    #[getter]
    pub fn foreign_advantage(&self) -> f64 {
        self.inner.params.foreign_advantage
    }

    #[getter]
    pub fn domestic_advantage(&self) -> f64 {
        self.inner.params.domestic_advantage
    }

    #[getter]
    pub fn ces(&self) -> f64 {
        self.inner.params.ces
    }
}

/// TFPInference — classical NLS standard errors in flat parameter order.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "state_tfp.tfp_models")]
pub struct TFPInference {
    pub inner: ParamInference,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl TFPInference {
    #[getter]
    pub fn std_errors(&self) -> Vec<f64> {
        self.inner.std_errors.to_vec()
    }

    #[getter]
    pub fn t_stats(&self) -> Vec<f64> {
        self.inner.t_stats.to_vec()
    }

    #[getter]
    pub fn p_values(&self) -> Vec<f64> {
        self.inner.p_values.to_vec()
    }

    #[getter]
    pub fn sigma2(&self) -> f64 {
        self.inner.sigma2
    }

    #[getter]
    pub fn dof(&self) -> usize {
        self.inner.dof
    }

    #[getter]
    pub fn covariance(&self) -> Vec<Vec<f64>> {
        self.inner.covariance.rows().into_iter().map(|row| row.to_vec()).collect()
    }
}

/// _state_tfp — PyO3 module initializer for the Python extension.
///
/// Creates the `tfp_models` submodule, attaches it to `_state_tfp`, and
/// registers it in `sys.modules` so `state_tfp.tfp_models` imports work.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _state_tfp<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let tfp_models_mod = PyModule::new(_py, "tfp_models")?;
    tfp_models(_py, m, &tfp_models_mod)?;

    // Manually add submodules into sys.modules to allow for dot notation.
    _py.import("sys")?.getattr("modules")?.set_item("state_tfp.tfp_models", tfp_models_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn tfp_models<'py>(
    _py: Python, state_tfp: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<TFPModel>()?;
    m.add_class::<TFPFitResult>()?;
    m.add_class::<TFPInference>()?;
    state_tfp.add_submodule(m)?;
    Ok(())
}
