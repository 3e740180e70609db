//! utils — Python-boundary helpers for the PyO3 bindings.
//!
//! Converts Python array-likes into contiguous `ndarray` buffers and builds
//! a configured [`TfpModel`] from keyword arguments. Option mapping goes
//! through [`TfpConfig`] so the Python surface and TOML files share one
//! validation path.
#[cfg(feature = "python-bindings")]
use ndarray::{Array1, Array2};

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    config::{BoundsToml, InitToml, SolverToml, TfpConfig},
    production::{
        core::{data::TfpData, shape::PanelShape},
        models::tfp::TfpModel,
    },
};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
    PyReadonlyArray2,
};

#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64",
        )
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Copy a 1-D array-like into an owned vector.
#[cfg(feature = "python-bindings")]
pub fn extract_vector<'py>(
    py: Python<'py>, raw: &Bound<'py, PyAny>, name: &str,
) -> PyResult<Array1<f64>> {
    let arr = extract_f64_array(py, raw)?;
    let slice = arr.as_slice().map_err(|_| {
        PyValueError::new_err(format!("{name} must be a 1-D contiguous float64 array or sequence"))
    })?;
    Ok(Array1::from(slice.to_vec()))
}

/// Copy a 2-D array-like (`numpy.ndarray`, `pandas.DataFrame`, or nested
/// sequences) into an owned matrix.
#[cfg(feature = "python-bindings")]
pub fn extract_matrix<'py>(raw: &Bound<'py, PyAny>) -> PyResult<Array2<f64>> {
    if let Ok(arr_ro) = raw.extract::<PyReadonlyArray2<f64>>() {
        return Ok(arr_ro.as_array().to_owned());
    }

    if let Ok(obj) = raw.call_method("to_numpy", (), None) {
        if let Ok(frame_ro) = obj.extract::<PyReadonlyArray2<f64>>() {
            return Ok(frame_ro.as_array().to_owned());
        }
    }

    let rows: Vec<Vec<f64>> = raw.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 2-D numpy.ndarray, pandas.DataFrame, or nested sequence of float64",
        )
    })?;
    let n_cols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|row| row.len() != n_cols) {
        return Err(PyValueError::new_err("data rows must all have the same length"));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((flat.len().checked_div(n_cols).unwrap_or(0), n_cols), flat)
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Validated model input from a Python `[logY, logK, F, D]` matrix.
#[cfg(feature = "python-bindings")]
pub fn extract_tfp_data<'py>(raw: &Bound<'py, PyAny>, shape: PanelShape) -> PyResult<TfpData> {
    let matrix = extract_matrix(raw)?;
    Ok(TfpData::new(matrix, shape)?)
}

/// Build a [`TfpModel`] from Python keyword arguments.
#[cfg(feature = "python-bindings")]
#[allow(clippy::too_many_arguments)]
pub fn build_tfp_model(
    n_states: usize, n_years: usize, task_shares: Option<&str>, init: Option<&str>,
    init_value: Option<f64>, solver: Option<&str>, tol_grad: Option<f64>, tol_cost: Option<f64>,
    tol_step: Option<f64>, max_iter: Option<usize>, lbfgs_mem: Option<usize>,
    initial_damping: Option<f64>, capital_share_bounds: Option<(f64, f64)>,
    ces_bounds: Option<(f64, f64)>, verbose: Option<bool>,
) -> PyResult<TfpModel> {
    let shape = PanelShape::new(n_states, n_years)?;
    let config = TfpConfig {
        task_shares: task_shares.map(str::to_string),
        init: InitToml { policy: init.map(str::to_string), value: init_value },
        bounds: BoundsToml {
            capital_share: capital_share_bounds.map(|(lo, hi)| [lo, hi]),
            ces: ces_bounds.map(|(lo, hi)| [lo, hi]),
            ..BoundsToml::default()
        },
        solver: SolverToml {
            name: solver.map(str::to_string),
            tol_grad,
            tol_cost,
            tol_step,
            max_iter,
            lbfgs_mem,
            initial_damping,
            verbose: verbose.unwrap_or(false),
        },
    };
    let options = config.into_options()?;
    Ok(TfpModel::new(shape, options))
}
