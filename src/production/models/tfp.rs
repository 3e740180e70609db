//! Structural TFP model: residuals, bounded least-squares fit, recovery.
//!
//! This module wires the production-function residual map to the
//! `LeastSquares` trait so it plugs into the bounded optimizer, and adds the
//! post-fit operations: TFP recovery and classical standard errors.
//!
//! Key ideas:
//! - The optimizer works on the flat vector
//!   `[δ (S−1)][γ (T−1)][λ (1 or T)][β][θ][αF][αD][ρ]`; everything else
//!   works on [`TfpParams`].
//! - Residuals and the analytic Jacobian are pure functions of `(θ, data)`;
//!   the model holds no interior mutability.
//! - Non-convergence is not an error: the best point is returned with
//!   `converged = false` and a warning is logged. [`TfpFit::ensure_converged`]
//!   turns it into one on request.
use crate::{
    inference::{ParamInference, calc_nls_inference},
    optimization::{
        errors::{OptError, OptResult},
        least_squares::{
            Jacobian, LeastSquares, LsOutcome, LsSolver, Residuals, Theta, minimize_ssr,
        },
    },
    production::{
        core::{
            data::TfpData,
            options::TfpOptions,
            params::{ParamLayout, TfpParams},
            recovery::recover_tfp,
            residuals::{compute_residuals, residual_jacobian},
            shape::PanelShape,
            validation::{validate_data, validate_theta},
        },
        errors::{TfpError, TfpResult},
    },
};
use ndarray::{Array1, Array2};
use tracing::{info, warn};

/// Result of a TFP fit.
///
/// Fields
/// ------
/// - `shape`: panel the model was fit on.
/// - `params`: fitted structural parameters.
/// - `theta_hat`: the same parameters in flat layout.
/// - `residuals`: residuals at `theta_hat`, in input row order.
/// - `ssr`: residual sum of squares at `theta_hat`.
/// - `outcome`: raw optimizer outcome (iterations, evaluation counts,
///   status, gradient norm, accepted-SSR history).
#[derive(Debug, Clone, PartialEq)]
pub struct TfpFit {
    pub shape: PanelShape,
    pub params: TfpParams,
    pub theta_hat: Array1<f64>,
    pub residuals: Array1<f64>,
    pub ssr: f64,
    pub outcome: LsOutcome,
}

impl TfpFit {
    pub fn converged(&self) -> bool {
        self.outcome.converged
    }

    /// # Errors
    /// [`TfpError::NotConverged`] when the optimizer stopped on a limit.
    pub fn ensure_converged(&self) -> TfpResult<()> {
        if self.outcome.converged {
            return Ok(());
        }
        Err(TfpError::NotConverged {
            status: self.outcome.status.clone(),
            iterations: self.outcome.iterations,
        })
    }

    /// Recovered productivity `Z` from the stored residuals.
    ///
    /// # Errors
    /// Domain errors from [`recover_tfp`].
    pub fn tfp(&self) -> TfpResult<Array1<f64>> {
        recover_tfp(&self.params, &self.residuals, self.shape)
    }
}

/// Structural TFP model over a balanced `S × T` panel.
///
/// Encapsulates the panel `shape`, the flat parameter `layout` implied by
/// the shape and task-share specification, estimation `options`, and the
/// last fit in `results`.
#[derive(Debug, Clone, PartialEq)]
pub struct TfpModel {
    pub shape: PanelShape,
    pub layout: ParamLayout,
    pub options: TfpOptions,
    pub results: Option<TfpFit>,
}

impl TfpModel {
    pub fn new(shape: PanelShape, options: TfpOptions) -> TfpModel {
        let layout = ParamLayout::new(shape, options.task_shares);
        TfpModel { shape, layout, options, results: None }
    }

    /// Number of flat parameters `S−1 + T−1 + |λ| + 5`.
    pub fn n_params(&self) -> usize {
        self.layout.len()
    }

    /// Residuals `logY − pred` at the flat vector `theta`.
    ///
    /// # Errors
    /// - [`TfpError::ThetaLengthMismatch`] / [`TfpError::NonFiniteParameter`]
    ///   before any evaluation.
    /// - [`TfpError::DataRowMismatch`] when `data` has another panel shape.
    /// - [`TfpError::NonFiniteLabor`] for a row outside the CES domain.
    pub fn compute_res(&self, theta: &Array1<f64>, data: &TfpData) -> TfpResult<Array1<f64>> {
        validate_theta(theta, &self.layout)?;
        validate_data(data, &self.layout)?;
        let params = TfpParams::from_theta(theta, &self.layout)?;
        compute_residuals(&params, data)
    }

    /// Analytic Jacobian `∂r/∂θ` (`S·T × n_params`).
    ///
    /// # Errors
    /// As for [`TfpModel::compute_res`].
    pub fn jacobian(&self, theta: &Array1<f64>, data: &TfpData) -> TfpResult<Array2<f64>> {
        validate_theta(theta, &self.layout)?;
        validate_data(data, &self.layout)?;
        let params = TfpParams::from_theta(theta, &self.layout)?;
        residual_jacobian(&params, data, &self.layout)
    }

    /// Fit the model by bounded nonlinear least squares and cache the result.
    ///
    /// ## Steps
    /// 1. Check the data panel against the model shape.
    /// 2. Take `p0` or resolve `options.init`; check its segment lengths.
    /// 3. Expand `options.bounds` for the layout. L-BFGS searches the
    ///    bounds intersected with the CES domain
    ///    ([`ParamBounds::within_ces_domain`](crate::production::core::bounds::ParamBounds::within_ces_domain)).
    /// 4. Minimize SSR with the configured solver.
    /// 5. Recompute residuals at the optimum and store a [`TfpFit`].
    ///
    /// ## Errors
    /// - Shape and configuration errors before optimizing (including a `p0`
    ///   whose task-share segment disagrees with `options.task_shares`).
    /// - Optimizer errors, e.g. when the initial point is outside the CES
    ///   domain.
    pub fn fit(&mut self, data: &TfpData, p0: Option<TfpParams>) -> TfpResult<TfpFit> {
        validate_data(data, &self.layout)?;
        let start = match p0 {
            Some(params) => params,
            None => self.options.init.resolve(&self.layout)?,
        };
        let theta0 = start.to_theta(&self.layout)?;
        let ls_opts = &self.options.ls_opts;
        let bounds = match ls_opts.solver {
            LsSolver::LevenbergMarquardt => self.options.bounds.to_bounds(&self.layout)?,
            LsSolver::Lbfgs(_) => self.options.bounds.within_ces_domain().to_bounds(&self.layout)?,
        };
        info!(
            n_obs = data.n_obs(),
            n_params = self.layout.len(),
            solver = %ls_opts.solver,
            "fitting TFP model"
        );

        let outcome = minimize_ssr(&*self, &theta0, data, &bounds, ls_opts)?;
        let params = TfpParams::from_theta(&outcome.theta_hat, &self.layout)?;
        let residuals = compute_residuals(&params, data)?;
        let ssr = residuals.dot(&residuals);
        if outcome.converged {
            info!(ssr, iterations = outcome.iterations, status = %outcome.status, "TFP fit converged");
        } else {
            warn!(
                ssr,
                iterations = outcome.iterations,
                status = %outcome.status,
                "TFP fit did not converge; returning best point"
            );
        }

        let fit = TfpFit {
            shape: self.shape,
            params,
            theta_hat: outcome.theta_hat.clone(),
            residuals,
            ssr,
            outcome,
        };
        self.results = Some(fit.clone());
        Ok(fit)
    }

    /// The cached fit.
    ///
    /// # Errors
    /// [`TfpError::ModelNotFitted`] before a successful `fit`.
    pub fn fitted(&self) -> TfpResult<&TfpFit> {
        self.results.as_ref().ok_or(TfpError::ModelNotFitted)
    }

    /// Recover `Z` for `data` at the fitted parameters.
    ///
    /// Residuals are recomputed from `data`, so this also applies the fitted
    /// model to a different panel of the same shape.
    ///
    /// # Errors
    /// - [`TfpError::ModelNotFitted`] before fitting.
    /// - Shape and domain errors from the residual map and [`recover_tfp`].
    pub fn recover_tfp(&self, data: &TfpData) -> TfpResult<Array1<f64>> {
        let fit = self.fitted()?;
        validate_data(data, &self.layout)?;
        let residuals = compute_residuals(&fit.params, data)?;
        recover_tfp(&fit.params, &residuals, self.shape)
    }

    /// Classical NLS standard errors at the fitted parameters.
    ///
    /// # Errors
    /// - [`TfpError::ModelNotFitted`] before fitting.
    /// - [`TfpError::InsufficientDof`] when `S·T <= n_params`.
    /// - Domain errors from the residual map.
    pub fn standard_errors(&self, data: &TfpData) -> TfpResult<ParamInference> {
        let fit = self.fitted()?;
        validate_data(data, &self.layout)?;
        let residuals = compute_residuals(&fit.params, data)?;
        let jac = residual_jacobian(&fit.params, data, &self.layout)?;
        Ok(calc_nls_inference(&jac, &fit.theta_hat, residuals.dot(&residuals))?)
    }
}

impl LeastSquares for TfpModel {
    type Data = TfpData;

    /// Residuals at `θ`; domain errors become `OptError::DomainViolation`
    /// so the solver can reject the trial point.
    fn residuals(&self, theta: &Theta, data: &Self::Data) -> OptResult<Residuals> {
        Ok(self.compute_res(theta, data)?)
    }

    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()> {
        validate_theta(theta, &self.layout)?;
        validate_data(data, &self.layout)?;
        Ok(())
    }

    fn jacobian(&self, theta: &Theta, data: &Self::Data) -> OptResult<Jacobian> {
        TfpModel::jacobian(self, theta, data).map_err(OptError::from)
    }
}
