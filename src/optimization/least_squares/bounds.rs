//! least_squares::bounds — box constraints on the parameter vector.
//!
//! Purpose
//! -------
//! Represent per-coordinate lower/upper bounds for a least-squares problem,
//! with projection for the Levenberg–Marquardt path and an unconstrained
//! reparameterization for the L-BFGS path.
//!
//! Invariants & assumptions
//! ------------------------
//! - Each coordinate satisfies `lower < upper`; either side may be
//!   infinite, neither may be NaN.
//! - `lower.len() == upper.len()` equals the problem dimension.
use crate::optimization::{
    errors::{OptError, OptResult},
    least_squares::types::Theta,
    numerical_stability::BoundTransform,
};
use ndarray::{Array1, Zip};

/// A single `[lower, upper]` interval. Infinite ends mean "unbounded".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub lower: f64,
    pub upper: f64,
}

impl Bound {
    /// Construct a validated interval.
    ///
    /// # Errors
    /// [`OptError::InvalidBound`] if either end is NaN or `lower >= upper`.
    pub fn new(lower: f64, upper: f64) -> OptResult<Self> {
        check_pair(0, lower, upper)?;
        Ok(Self { lower, upper })
    }

    /// `(−∞, ∞)`.
    pub const fn unbounded() -> Self {
        Self { lower: f64::NEG_INFINITY, upper: f64::INFINITY }
    }

    /// `(−∞, upper]`.
    pub fn at_most(upper: f64) -> OptResult<Self> {
        Self::new(f64::NEG_INFINITY, upper)
    }

    /// `[lower, ∞)`.
    pub fn at_least(lower: f64) -> OptResult<Self> {
        Self::new(lower, f64::INFINITY)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.lower).min(self.upper)
    }
}

impl Default for Bound {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Flat per-coordinate bounds matching a parameter vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    lower: Array1<f64>,
    upper: Array1<f64>,
}

impl Bounds {
    /// Build validated bounds from lower/upper arrays.
    ///
    /// # Errors
    /// - [`OptError::BoundsLengthMismatch`] if the arrays differ in length.
    /// - [`OptError::InvalidBound`] for the first coordinate with a NaN end
    ///   or `lower >= upper`.
    pub fn new(lower: Array1<f64>, upper: Array1<f64>) -> OptResult<Self> {
        if lower.len() != upper.len() {
            return Err(OptError::BoundsLengthMismatch {
                expected: lower.len(),
                actual: upper.len(),
            });
        }
        for (index, (&lo, &hi)) in lower.iter().zip(upper.iter()).enumerate() {
            check_pair(index, lo, hi)?;
        }
        Ok(Self { lower, upper })
    }

    /// Fully unbounded box of dimension `dim`.
    pub fn unbounded(dim: usize) -> Self {
        Self {
            lower: Array1::from_elem(dim, f64::NEG_INFINITY),
            upper: Array1::from_elem(dim, f64::INFINITY),
        }
    }

    /// Concatenate per-coordinate [`Bound`]s in order.
    pub fn from_bounds<I: IntoIterator<Item = Bound>>(iter: I) -> OptResult<Self> {
        let (lower, upper): (Vec<f64>, Vec<f64>) =
            iter.into_iter().map(|b| (b.lower, b.upper)).unzip();
        Self::new(Array1::from(lower), Array1::from(upper))
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    pub fn lower(&self) -> &Array1<f64> {
        &self.lower
    }

    pub fn upper(&self) -> &Array1<f64> {
        &self.upper
    }

    /// Require `dim` to match the bound dimension.
    pub fn check_dim(&self, dim: usize) -> OptResult<()> {
        if self.len() != dim {
            return Err(OptError::BoundsLengthMismatch { expected: dim, actual: self.len() });
        }
        Ok(())
    }

    /// Clamp `theta` into the box.
    pub fn project(&self, theta: &Theta) -> Theta {
        let mut out = theta.clone();
        self.project_inplace(&mut out);
        out
    }

    pub fn project_inplace(&self, theta: &mut Theta) {
        Zip::from(theta).and(&self.lower).and(&self.upper).for_each(|t, &lo, &hi| {
            *t = t.max(lo).min(hi);
        });
    }

    /// One [`BoundTransform`] per coordinate.
    pub fn transforms(&self) -> Vec<BoundTransform> {
        self.lower
            .iter()
            .zip(self.upper.iter())
            .map(|(&lo, &hi)| BoundTransform::from_bounds(lo, hi))
            .collect()
    }

    /// Map a bounded parameter vector into unconstrained coordinates.
    pub fn to_unconstrained(&self, theta: &Theta) -> Theta {
        let transforms = self.transforms();
        Array1::from_iter(theta.iter().zip(transforms.iter()).map(|(&t, tr)| tr.inverse(t)))
    }

    /// Map unconstrained coordinates back into the box.
    pub fn to_constrained(&self, u: &Theta) -> Theta {
        let transforms = self.transforms();
        Array1::from_iter(u.iter().zip(transforms.iter()).map(|(&x, tr)| tr.forward(x)))
    }

    /// Elementwise `dθ/du` at the unconstrained point `u`.
    pub fn chain_factors(&self, u: &Theta) -> Array1<f64> {
        let transforms = self.transforms();
        Array1::from_iter(u.iter().zip(transforms.iter()).map(|(&x, tr)| tr.derivative(x)))
    }
}

fn check_pair(index: usize, lower: f64, upper: f64) -> OptResult<()> {
    if lower.is_nan() || upper.is_nan() {
        return Err(OptError::InvalidBound {
            index,
            lower,
            upper,
            reason: "Bounds must not be NaN.",
        });
    }
    if lower >= upper {
        return Err(OptError::InvalidBound {
            index,
            lower,
            upper,
            reason: "Lower bound must be strictly below the upper bound.",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // ---- Scope ---------------------------------------------------------------
    //
    // These tests cover:
    // - Validation of bound pairs and lengths.
    // - Projection into the box.
    // - Unconstrained round trip for mixed bound types.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Inverted, degenerate, or NaN bounds are rejected with the coordinate
    // that caused the failure.
    //
    // Given
    // -----
    // - `[0, 1]`, `[2, 1]`, `[NaN, 1]` in a single bound set.
    //
    // Expect
    // ------
    // - `InvalidBound { index: 1 }` (the first offender).
    fn bounds_new_reports_first_invalid_pair() {
        let lower = array![0.0, 2.0, f64::NAN];
        let upper = array![1.0, 1.0, 1.0];
        match Bounds::new(lower, upper) {
            Err(OptError::InvalidBound { index, .. }) => assert_eq!(index, 1),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Projection clamps only the coordinates that leave the box.
    //
    // Given
    // -----
    // - Bounds `(−∞, ∞)`, `[0, 1]`, `(−∞, 1]` and a point violating the last
    //   two.
    //
    // Expect
    // ------
    // - `[−5, 1, 1]`.
    fn project_clamps_violating_coordinates() {
        let bounds = Bounds::from_bounds([
            Bound::unbounded(),
            Bound::new(0.0, 1.0).unwrap(),
            Bound::at_most(1.0).unwrap(),
        ])
        .unwrap();
        let projected = bounds.project(&array![-5.0, 1.7, 3.0]);
        assert_eq!(projected, array![-5.0, 1.0, 1.0]);
    }

    #[test]
    // Purpose
    // -------
    // Interior points survive the unconstrained round trip for every bound
    // type.
    //
    // Given
    // -----
    // - Mixed bounds and an interior point.
    //
    // Expect
    // ------
    // - `to_constrained(to_unconstrained(θ)) ≈ θ`.
    fn unconstrained_round_trip_recovers_interior_point() {
        let bounds = Bounds::from_bounds([
            Bound::unbounded(),
            Bound::new(0.0, 1.0).unwrap(),
            Bound::at_most(1.0).unwrap(),
            Bound::at_least(-2.0).unwrap(),
        ])
        .unwrap();
        let theta = array![0.7, 0.3, 0.85, 4.0];
        let back = bounds.to_constrained(&bounds.to_unconstrained(&theta));
        for (a, b) in back.iter().zip(theta.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-10);
        }
    }
}
