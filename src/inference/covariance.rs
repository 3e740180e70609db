//! inference::covariance — classical NLS covariance and standard errors.
//!
//! Purpose
//! -------
//! Turn the residual Jacobian at a least-squares optimum into the classical
//! Gauss–Newton covariance `σ̂² (JᵀJ)⁺`, per-parameter standard errors,
//! t-statistics and two-sided p-values.
//!
//! Key behaviors
//! -------------
//! - `σ̂² = SSR / (N − k)` with `N` Jacobian rows and `k` parameters.
//! - The pseudoinverse of `JᵀJ` comes from a `nalgebra` symmetric
//!   eigendecomposition; eigenvalues at or below `EIGEN_EPS · λ_max` are
//!   dropped, so unidentified directions contribute no variance instead of
//!   exploding.
//! - p-values use a Student-t reference with `N − k` degrees of freedom
//!   (`statrs`).
//!
//! Invariants & assumptions
//! ------------------------
//! - `JᵀJ` is symmetric by construction; no extra symmetrization is done.
//! - A parameter with zero standard error (every direction it loads on was
//!   dropped) reports NaN for its t-statistic and p-value.
//!
//! Conventions
//! -----------
//! - Standard errors refer to the flat parameter vector passed in; mapping
//!   to named parameters is the caller's job.
use crate::{
    inference::errors::{InferenceError, InferenceResult},
    optimization::numerical_stability::transformations::EIGEN_EPS,
};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Classical least-squares inference at an optimum.
///
/// Fields
/// ------
/// - `covariance`: `k × k` matrix `σ̂² (JᵀJ)⁺`.
/// - `std_errors`: square roots of the covariance diagonal.
/// - `t_stats`: `θ̂ᵢ / SEᵢ`.
/// - `p_values`: two-sided Student-t p-values for `H₀: θᵢ = 0`.
/// - `sigma2`: residual variance `SSR / dof`.
/// - `dof`: residual degrees of freedom `N − k`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamInference {
    pub covariance: Array2<f64>,
    pub std_errors: Array1<f64>,
    pub t_stats: Array1<f64>,
    pub p_values: Array1<f64>,
    pub sigma2: f64,
    pub dof: usize,
}

/// calc_nls_inference — covariance, SEs, t-stats and p-values.
///
/// Parameters
/// ----------
/// - `jacobian`: `N × k` residual Jacobian at `theta_hat`.
/// - `theta_hat`: length-`k` estimate.
/// - `ssr`: residual sum of squares at `theta_hat`.
///
/// Errors
/// ------
/// - [`InferenceError::DimensionMismatch`] when `jacobian.ncols() != k`.
/// - [`InferenceError::InsufficientDof`] when `N <= k`.
/// - [`InferenceError::NonFiniteInput`] for non-finite Jacobian entries,
///   estimates or SSR.
/// - [`InferenceError::Distribution`] if the Student-t cannot be built.
pub fn calc_nls_inference(
    jacobian: &Array2<f64>, theta_hat: &Array1<f64>, ssr: f64,
) -> InferenceResult<ParamInference> {
    let (n_obs, n_params) = jacobian.dim();
    if n_params != theta_hat.len() {
        return Err(InferenceError::DimensionMismatch {
            expected: theta_hat.len(),
            actual: n_params,
        });
    }
    if n_obs <= n_params {
        return Err(InferenceError::InsufficientDof { n_obs, n_params });
    }
    if jacobian.iter().any(|v| !v.is_finite()) {
        return Err(InferenceError::NonFiniteInput { name: "jacobian" });
    }
    if theta_hat.iter().any(|v| !v.is_finite()) {
        return Err(InferenceError::NonFiniteInput { name: "theta_hat" });
    }
    if !ssr.is_finite() {
        return Err(InferenceError::NonFiniteInput { name: "ssr" });
    }

    let dof = n_obs - n_params;
    let sigma2 = ssr / dof as f64;
    let jtj = jacobian.t().dot(jacobian);
    let mut jtj_nalg = DMatrix::<f64>::zeros(n_params, n_params);
    fill_dmatrix(&jtj, &mut jtj_nalg);
    let covariance = pseudo_inverse(jtj_nalg, n_params).mapv(|v| sigma2 * v);
    let std_errors = covariance.diag().mapv(|v| v.max(0.0).sqrt());

    let t_dist = StudentsT::new(0.0, 1.0, dof as f64)?;
    let t_stats = Array1::from_iter(
        theta_hat.iter().zip(std_errors.iter()).map(|(&est, &se)| {
            if se > 0.0 { est / se } else { f64::NAN }
        }),
    );
    let p_values = t_stats.mapv(|t| {
        if t.is_finite() { 2.0 * (1.0 - t_dist.cdf(t.abs())) } else { f64::NAN }
    });

    Ok(ParamInference { covariance, std_errors, t_stats, p_values, sigma2, dof })
}

// ---- Helper methods ----

/// Copy a symmetric `ndarray` matrix into a preallocated `DMatrix`.
fn fill_dmatrix(src: &Array2<f64>, dst: &mut DMatrix<f64>) {
    let n = src.ncols();
    for j in 0..n {
        for i in j..n {
            if j == i {
                dst[(i, i)] = src[[i, i]];
            } else {
                dst[(i, j)] = src[[i, j]];
                dst[(j, i)] = src[[j, i]];
            }
        }
    }
}

/// Moore–Penrose pseudoinverse of a symmetric PSD matrix.
///
/// `A⁺ = Σ_{k: λ_k > EIGEN_EPS·λ_max} q_k q_kᵀ / λ_k`.
fn pseudo_inverse(matrix: DMatrix<f64>, n: usize) -> Array2<f64> {
    let eigen_decomp = matrix.symmetric_eigen();
    let q = eigen_decomp.eigenvectors;
    let eigenvals = eigen_decomp.eigenvalues;
    let lambda_max = eigenvals.iter().copied().fold(0.0_f64, f64::max);
    let cutoff = EIGEN_EPS * lambda_max;
    let mut out = Array2::<f64>::zeros((n, n));
    for (k, &lambda) in eigenvals.iter().enumerate() {
        if lambda <= cutoff || lambda <= 0.0 {
            continue;
        }
        for i in 0..n {
            let qi = q[(i, k)] / lambda;
            for j in 0..n {
                out[[i, j]] += qi * q[(j, k)];
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // ---- Scope ---------------------------------------------------------------
    //
    // These tests cover:
    // - Agreement with textbook OLS standard errors for a linear model.
    // - Rank-deficient Jacobians (pseudoinverse truncation).
    // - Degrees-of-freedom and dimension errors.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // For a linear model the Gauss–Newton covariance is the OLS covariance
    // `σ̂² (XᵀX)⁻¹`.
    //
    // Given
    // -----
    // - `r = y − (a + b x)` with x = [0, 1, 2, 3], so `J = −[1, x]`, and
    //   SSR = 0.8 (dof = 2, σ̂² = 0.4).
    // - `XᵀX = [[4, 6], [6, 14]]`, `(XᵀX)⁻¹ = [[0.7, −0.3], [−0.3, 0.2]]`.
    //
    // Expect
    // ------
    // - SE(a) = √(0.4·0.7), SE(b) = √(0.4·0.2); p-values in (0, 1).
    fn linear_model_matches_ols_formula() {
        let jac = array![[-1.0, 0.0], [-1.0, -1.0], [-1.0, -2.0], [-1.0, -3.0]];
        let theta_hat = array![1.0, 2.0];
        let out = calc_nls_inference(&jac, &theta_hat, 0.8).unwrap();

        assert_eq!(out.dof, 2);
        assert_relative_eq!(out.sigma2, 0.4, epsilon = 1e-12);
        assert_relative_eq!(out.std_errors[0], (0.4f64 * 0.7).sqrt(), epsilon = 1e-10);
        assert_relative_eq!(out.std_errors[1], (0.4f64 * 0.2).sqrt(), epsilon = 1e-10);
        assert_relative_eq!(out.covariance[[0, 1]], -0.4 * 0.3, epsilon = 1e-10);
        assert_relative_eq!(out.t_stats[1], 2.0 / (0.08f64).sqrt(), epsilon = 1e-9);
        assert!(out.p_values.iter().all(|&p| p > 0.0 && p < 1.0));
    }

    #[test]
    // Purpose
    // -------
    // Duplicated columns (an unidentified direction) stay finite.
    //
    // Given
    // -----
    // - Two identical Jacobian columns.
    //
    // Expect
    // ------
    // - Finite standard errors; both equal, since the pseudoinverse splits
    //   the identified direction evenly.
    fn collinear_columns_remain_finite() {
        let jac = array![[-1.0, -1.0], [-2.0, -2.0], [-3.0, -3.0]];
        let out = calc_nls_inference(&jac, &array![0.5, 0.5], 0.3).unwrap();
        assert!(out.std_errors.iter().all(|v| v.is_finite()));
        assert_relative_eq!(out.std_errors[0], out.std_errors[1], epsilon = 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // Invalid shapes are rejected before any linear algebra.
    //
    // Given
    // -----
    // - A 2 × 2 Jacobian (no dof) and a 3 × 2 Jacobian with a 3-vector.
    //
    // Expect
    // ------
    // - `InsufficientDof` and `DimensionMismatch`.
    fn invalid_shapes_are_rejected() {
        let square = array![[1.0, 0.0], [0.0, 1.0]];
        assert_eq!(
            calc_nls_inference(&square, &array![1.0, 1.0], 0.1),
            Err(InferenceError::InsufficientDof { n_obs: 2, n_params: 2 })
        );
        let tall = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        assert!(matches!(
            calc_nls_inference(&tall, &array![1.0, 1.0, 1.0], 0.1),
            Err(InferenceError::DimensionMismatch { expected: 3, actual: 2 })
        ));
    }
}
