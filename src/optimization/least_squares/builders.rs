//! least_squares::builders — L-BFGS solver construction helpers.
//!
//! Build L-BFGS solvers with either line search and apply the optional
//! gradient / cost-change tolerances from [`LsOptions`]. Initial parameters
//! and iteration caps are left to the runner.
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    least_squares::{
        traits::LsOptions,
        types::{
            Cost, DEFAULT_LBFGS_MEM, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente,
            MoreThuenteLS, Theta,
        },
    },
};

/// Construct L-BFGS with Hager–Zhang line search.
///
/// # Errors
/// `OptError` (via `From<argmin::core::Error>`) when argmin rejects a
/// configured tolerance.
pub fn build_optimizer_hager_zhang(opts: &LsOptions) -> OptResult<LbfgsHagerZhang> {
    let hager_zhang = HagerZhangLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsHagerZhang::new(hager_zhang, mem);
    configure_lbfgs(lbfgs, opts)
}

/// Construct L-BFGS with More–Thuente line search.
///
/// # Errors
/// `OptError` (via `From<argmin::core::Error>`) when argmin rejects a
/// configured tolerance.
pub fn build_optimizer_more_thuente(opts: &LsOptions) -> OptResult<LbfgsMoreThuente> {
    let more_thuente = MoreThuenteLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsMoreThuente::new(more_thuente, mem);
    configure_lbfgs(lbfgs, opts)
}

/// Apply `tol_grad` / `tol_cost` to an L-BFGS instance, whatever its line
/// search.
pub fn configure_lbfgs<L>(
    mut lbfgs: LBFGS<L, Theta, Grad, Cost>, opts: &LsOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(tol_grad) = opts.tols.tol_grad {
        lbfgs = lbfgs.with_tolerance_grad(tol_grad)?;
    }
    if let Some(tol_cost) = opts.tols.tol_cost {
        lbfgs = lbfgs.with_tolerance_cost(tol_cost)?;
    }
    Ok(lbfgs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::least_squares::traits::{LineSearcher, LsSolver, Tolerances};

    // ---- Scope ---------------------------------------------------------------
    //
    // These tests cover:
    // - Successful construction with default and custom tolerances.
    //
    // They intentionally DO NOT cover:
    // - Solver runs (see `run` and `api` tests).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Both builders accept validated options, with and without a custom
    // L-BFGS memory.
    //
    // Given
    // -----
    // - Default options, and options with `lbfgs_mem = Some(3)` and only a
    //   gradient tolerance.
    //
    // Expect
    // ------
    // - `Ok` from both builders in both configurations.
    fn builders_accept_validated_options() {
        let default_opts = LsOptions::default();
        assert!(build_optimizer_more_thuente(&default_opts).is_ok());
        assert!(build_optimizer_hager_zhang(&default_opts).is_ok());

        let tols = Tolerances::new(Some(1e-6), None, None, Some(50)).unwrap();
        let custom = LsOptions::new(
            tols,
            LsSolver::Lbfgs(LineSearcher::HagerZhang),
            false,
            Some(3),
            None,
        )
        .unwrap();
        assert!(build_optimizer_hager_zhang(&custom).is_ok());
        assert!(build_optimizer_more_thuente(&custom).is_ok());
    }
}
