//! Shape checks shared by the TFP model entry points.
//!
//! All checks run before any residual is evaluated so that misconfigured
//! calls fail fast with a shape error.
use crate::production::{
    core::{data::TfpData, params::ParamLayout},
    errors::{TfpError, TfpResult},
};
use ndarray::Array1;

/// Require `theta.len()` to match the layout and every entry to be finite.
///
/// # Errors
/// - [`TfpError::ThetaLengthMismatch`]
/// - [`TfpError::NonFiniteParameter`] for the first non-finite entry.
pub fn validate_theta(theta: &Array1<f64>, layout: &ParamLayout) -> TfpResult<()> {
    if theta.len() != layout.len() {
        return Err(TfpError::ThetaLengthMismatch { expected: layout.len(), actual: theta.len() });
    }
    if let Some((index, &value)) = theta.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(TfpError::NonFiniteParameter { index, value });
    }
    Ok(())
}

/// Require the data panel to have the layout's shape.
///
/// # Errors
/// [`TfpError::DataRowMismatch`] when the panels differ.
pub fn validate_data(data: &TfpData, layout: &ParamLayout) -> TfpResult<()> {
    if data.shape != layout.shape {
        return Err(TfpError::DataRowMismatch {
            expected: layout.shape.n_obs(),
            actual: data.n_obs(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::production::core::{params::TaskShareSpec, shape::PanelShape};
    use ndarray::{Array2, array};

    #[test]
    // Purpose
    // -------
    // Length, finiteness and panel-shape checks each fire.
    //
    // Given
    // -----
    // - A 2 × 2 scalar-share layout (length 8) and a 3 × 2 data panel.
    //
    // Expect
    // ------
    // - `ThetaLengthMismatch`, `NonFiniteParameter`, `DataRowMismatch`.
    fn shape_checks_fire() {
        let layout = ParamLayout::new(PanelShape::new(2, 2).unwrap(), TaskShareSpec::Scalar);
        assert!(matches!(
            validate_theta(&Array1::zeros(7), &layout),
            Err(TfpError::ThetaLengthMismatch { expected: 8, actual: 7 })
        ));
        let mut theta = Array1::<f64>::zeros(8);
        theta[4] = f64::INFINITY;
        assert!(matches!(
            validate_theta(&theta, &layout),
            Err(TfpError::NonFiniteParameter { index: 4, .. })
        ));

        let other = TfpData::new(Array2::ones((6, 4)), PanelShape::new(3, 2).unwrap()).unwrap();
        assert!(matches!(
            validate_data(&other, &layout),
            Err(TfpError::DataRowMismatch { expected: 4, actual: 6 })
        ));
        assert!(validate_theta(&array![0., 0., 0., 0., 0., 0., 0., 0.], &layout).is_ok());
    }
}
