//! Linear system solvers.
//!
//! Solves the small dense interface systems Ax = b assembled per transform
//! sample.
//!
//! # Solver Backends
//!
//! - [`DenseLuSolver`]: nalgebra partial-pivot LU. The default; fastest for
//!   the 4n − 2 square systems produced here.
//! - [`DenseQrSolver`]: nalgebra Householder QR. Slower, somewhat more
//!   forgiving on badly scaled stacks.
//!
//! Both reject a factorization whose smallest diagonal pivot is below
//! `pivot_tolerance` times the largest one, and any non-finite solution.
//! There is no pseudo-inverse fallback: a singular system is reported as
//! [`Error::SingularSystem`].

use crate::error::{Error, Result};
use nalgebra::{DMatrix, DVector};

/// Default smallest admissible ratio between diagonal pivots.
///
/// Frictionless stacks lose rank as m → 0 (the pivot ratio falls roughly
/// like 0.4·m), so this has to sit well below the ratios met at `zro`.
pub const DEFAULT_PIVOT_TOLERANCE: f64 = 1e-12;

/// Linear solver interface.
pub trait Solver: Send + Sync {
    /// Solve the linear system Ax = b.
    ///
    /// # Arguments
    ///
    /// * `matrix` - Square system matrix
    /// * `rhs` - Right-hand side vector
    ///
    /// # Returns
    ///
    /// Solution vector
    fn solve(&self, matrix: &DMatrix<f64>, rhs: &DVector<f64>) -> Result<DVector<f64>>;

    /// Solver name for diagnostics.
    fn name(&self) -> &str;
}

/// Solver selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolverType {
    /// Partial-pivot LU.
    #[default]
    Lu,
    /// Householder QR.
    Qr,
}

/// Solver configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Solver type to use.
    pub solver_type: SolverType,
    /// Smallest admissible min/max ratio of the factor's diagonal.
    pub pivot_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            solver_type: SolverType::Lu,
            pivot_tolerance: DEFAULT_PIVOT_TOLERANCE,
        }
    }
}

impl SolverConfig {
    /// Check the tolerance is usable.
    pub fn validate(&self) -> Result<()> {
        if !(self.pivot_tolerance.is_finite() && (0.0..1.0).contains(&self.pivot_tolerance)) {
            return Err(Error::InvalidConfiguration(format!(
                "pivot_tolerance must lie in [0, 1), got {}",
                self.pivot_tolerance
            )));
        }
        Ok(())
    }
}

/// Direct solver using nalgebra dense LU factorization.
#[derive(Debug, Clone, Copy)]
pub struct DenseLuSolver {
    pivot_tolerance: f64,
}

impl DenseLuSolver {
    pub fn new(pivot_tolerance: f64) -> Self {
        Self { pivot_tolerance }
    }
}

impl Default for DenseLuSolver {
    fn default() -> Self {
        Self::new(DEFAULT_PIVOT_TOLERANCE)
    }
}

impl Solver for DenseLuSolver {
    fn solve(&self, matrix: &DMatrix<f64>, rhs: &DVector<f64>) -> Result<DVector<f64>> {
        if check_dimensions(matrix, rhs)? {
            return Ok(DVector::zeros(0));
        }

        let lu = matrix.clone().lu();
        check_pivots(&lu.u().diagonal(), self.pivot_tolerance)?;
        let solution = lu.solve(rhs).ok_or_else(|| Error::SingularSystem {
            m: f64::NAN,
            detail: "LU factorization failed".into(),
        })?;
        check_finite(solution)
    }

    fn name(&self) -> &str {
        "nalgebra dense LU"
    }
}

/// Direct solver using nalgebra Householder QR.
#[derive(Debug, Clone, Copy)]
pub struct DenseQrSolver {
    pivot_tolerance: f64,
}

impl DenseQrSolver {
    pub fn new(pivot_tolerance: f64) -> Self {
        Self { pivot_tolerance }
    }
}

impl Default for DenseQrSolver {
    fn default() -> Self {
        Self::new(DEFAULT_PIVOT_TOLERANCE)
    }
}

impl Solver for DenseQrSolver {
    fn solve(&self, matrix: &DMatrix<f64>, rhs: &DVector<f64>) -> Result<DVector<f64>> {
        if check_dimensions(matrix, rhs)? {
            return Ok(DVector::zeros(0));
        }

        let qr = matrix.clone().qr();
        check_pivots(&qr.r().diagonal(), self.pivot_tolerance)?;
        let solution = qr.solve(rhs).ok_or_else(|| Error::SingularSystem {
            m: f64::NAN,
            detail: "QR factorization failed".into(),
        })?;
        check_finite(solution)
    }

    fn name(&self) -> &str {
        "nalgebra dense QR"
    }
}

/// Select solver based on configuration.
pub fn select_solver(config: &SolverConfig) -> Box<dyn Solver> {
    match config.solver_type {
        SolverType::Lu => Box::new(DenseLuSolver::new(config.pivot_tolerance)),
        SolverType::Qr => Box::new(DenseQrSolver::new(config.pivot_tolerance)),
    }
}

/// Returns `true` for the empty system.
fn check_dimensions(matrix: &DMatrix<f64>, rhs: &DVector<f64>) -> Result<bool> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(Error::Solver("Matrix must be square".into()));
    }
    if n != rhs.len() {
        return Err(Error::Solver("RHS size mismatch".into()));
    }
    Ok(n == 0)
}

fn check_pivots(diagonal: &DVector<f64>, tolerance: f64) -> Result<()> {
    let (min, max) = diagonal
        .iter()
        .fold((f64::INFINITY, 0.0_f64), |(lo, hi), &d| (lo.min(d.abs()), hi.max(d.abs())));
    if !(max > 0.0 && max.is_finite()) || !(min >= tolerance * max) {
        return Err(Error::SingularSystem {
            m: f64::NAN,
            detail: format!("pivot ratio {:.3e} below tolerance {:.1e}", min / max, tolerance),
        });
    }
    Ok(())
}

fn check_finite(solution: DVector<f64>) -> Result<DVector<f64>> {
    if solution.iter().all(|x| x.is_finite()) {
        Ok(solution)
    } else {
        Err(Error::SingularSystem {
            m: f64::NAN,
            detail: "non-finite coefficients".into(),
        })
    }
}
