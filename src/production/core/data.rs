//! Observation matrix for the structural TFP model.
//!
//! Purpose
//! -------
//! Provide a validated container for the balanced state-year panel the
//! model is estimated on. Validation happens once at construction so the
//! residual map can index rows and columns without further checks.
//!
//! Invariants & assumptions
//! ------------------------
//! - Exactly four columns in the fixed order `[logY, logK, F, D]`.
//! - Exactly `S·T` rows, ordered state-major then year-minor.
//! - Every value is finite. Positivity of `F` and `D` is not required here;
//!   non-positive labor surfaces as a CES domain error during evaluation.
use crate::production::{
    core::shape::PanelShape,
    errors::{TfpError, TfpResult},
};
use ndarray::{Array2, ArrayView1};

pub const COL_LOG_OUTPUT: usize = 0;
pub const COL_LOG_CAPITAL: usize = 1;
pub const COL_FOREIGN: usize = 2;
pub const COL_DOMESTIC: usize = 3;
pub const N_COLUMNS: usize = 4;

/// Validated `[logY, logK, F, D]` panel plus its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct TfpData {
    pub data: Array2<f64>,
    pub shape: PanelShape,
}

impl TfpData {
    /// Validate and wrap an observation matrix.
    ///
    /// # Errors
    /// - [`TfpError::DataColumnMismatch`] unless there are four columns.
    /// - [`TfpError::DataRowMismatch`] unless there are `S·T` rows.
    /// - [`TfpError::NonFiniteData`] for the first non-finite entry.
    pub fn new(data: Array2<f64>, shape: PanelShape) -> TfpResult<Self> {
        if data.ncols() != N_COLUMNS {
            return Err(TfpError::DataColumnMismatch { expected: N_COLUMNS, actual: data.ncols() });
        }
        if data.nrows() != shape.n_obs() {
            return Err(TfpError::DataRowMismatch { expected: shape.n_obs(), actual: data.nrows() });
        }
        if let Some(((row, col), &value)) = data.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(TfpError::NonFiniteData { row, col, value });
        }
        Ok(TfpData { data, shape })
    }

    pub fn n_obs(&self) -> usize {
        self.data.nrows()
    }

    pub fn log_output(&self) -> ArrayView1<'_, f64> {
        self.data.column(COL_LOG_OUTPUT)
    }

    pub fn log_capital(&self) -> ArrayView1<'_, f64> {
        self.data.column(COL_LOG_CAPITAL)
    }

    pub fn foreign(&self) -> ArrayView1<'_, f64> {
        self.data.column(COL_FOREIGN)
    }

    pub fn domestic(&self) -> ArrayView1<'_, f64> {
        self.data.column(COL_DOMESTIC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Construction enforces column count, row count and finiteness.
    //
    // Given
    // -----
    // - A 2 × 2 panel shape and matrices that break each rule in turn.
    //
    // Expect
    // ------
    // - The matching error variant for each, `Ok` for a valid matrix.
    fn new_validates_shape_and_finiteness() {
        let shape = PanelShape::new(2, 2).unwrap();
        let valid = array![
            [1.0, 0.5, 10.0, 20.0],
            [1.2, 0.6, 12.0, 18.0],
            [0.9, 0.4, 8.0, 22.0],
            [1.1, 0.55, 11.0, 19.0]
        ];
        assert!(TfpData::new(valid.clone(), shape).is_ok());

        let three_cols = Array2::<f64>::zeros((4, 3));
        assert!(matches!(
            TfpData::new(three_cols, shape),
            Err(TfpError::DataColumnMismatch { expected: 4, actual: 3 })
        ));

        let short = Array2::<f64>::zeros((3, 4));
        assert!(matches!(
            TfpData::new(short, shape),
            Err(TfpError::DataRowMismatch { expected: 4, actual: 3 })
        ));

        let mut nan = valid;
        nan[[2, 3]] = f64::NAN;
        assert!(matches!(
            TfpData::new(nan, shape),
            Err(TfpError::NonFiniteData { row: 2, col: 3, .. })
        ));
    }
}
