//! Response accumulation in transform space.
//!
//! The physical response at (ρ, λ) is recovered by the inverse Hankel
//! transform
//!
//! ```text
//! R(ρ, λ) = ∫ R*(m; ρ, λ) · α J1(mα) / m  dm
//! ```
//!
//! evaluated on a [`HankelGrid`]. At each node the interface system is
//! solved afresh and six kernels are accumulated: σz, σr, σθ, τrz, w and u.
//! Strains follow from the stresses through the containing layer's
//! compliance.

use crate::bessel::bessel_j0_j1;
use crate::error::Result;
use crate::load::LoadSpec;
use crate::quadrature::HankelGrid;
use crate::solver::Solver;
use crate::system::{NormalizedLayer, NormalizedStack, StateRows, TransformSample};
use crate::types::{EvaluationPoint, StrainState, StressState};
use nalgebra::Vector4;

const N_QUANTITIES: usize = 6;

/// How well the transform integral settled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Convergence {
    /// Oscillation panels integrated.
    pub panels: usize,
    /// The grid ran past the depth decay cutoff.
    pub reached_cutoff: bool,
    /// Largest relative change of any quantity over the last panel.
    pub tail_estimate: f64,
    /// Whether the result is considered converged.
    pub converged: bool,
}

/// Response at a single evaluation point.
///
/// Compressive stress and strain are positive, downward vertical
/// displacement is positive and radial displacement is positive toward the
/// load axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponseField {
    /// Where the response was evaluated.
    pub point: EvaluationPoint,
    /// Index of the layer the point was evaluated in.
    pub layer: usize,
    /// Vertical displacement w.
    pub vertical_displacement: f64,
    /// Radial displacement u.
    pub radial_displacement: f64,
    /// [σz, σr, σθ, τrz]
    pub stress: StressState,
    /// [εz, εr, εθ]
    pub strain: StrainState,
    pub convergence: Convergence,
}

impl ResponseField {
    /// Whether every component is finite.
    pub fn is_finite(&self) -> bool {
        self.vertical_displacement.is_finite()
            && self.radial_displacement.is_finite()
            && self.stress.0.iter().all(|x| x.is_finite())
            && self.strain.0.iter().all(|x| x.is_finite())
    }
}

/// Transform-space kernels of one evaluation point.
#[derive(Debug, Clone, Copy)]
pub struct Integrand<'a> {
    geometry: &'a NormalizedStack,
    layer_idx: usize,
    layer: &'a NormalizedLayer,
    rho: f64,
    lambda: f64,
}

impl<'a> Integrand<'a> {
    /// Kernels at normalised offset `rho` and depth `lambda` inside `layer_idx`.
    ///
    /// Returns `None` if the layer index is out of range.
    pub fn new(geometry: &'a NormalizedStack, layer_idx: usize, rho: f64, lambda: f64) -> Option<Self> {
        Some(Self {
            geometry,
            layer_idx,
            layer: geometry.layer(layer_idx)?,
            rho,
            lambda,
        })
    }

    /// Unweighted kernels [σz*, σr*, σθ*, τ*, w*, u*] of a solved sample.
    pub fn kernels(&self, sample: &TransformSample) -> [f64; N_QUANTITIES] {
        let m = sample.m();
        let x = sample
            .layer(self.layer_idx)
            .map(|c| c.0)
            .unwrap_or_else(Vector4::zeros);
        let rows = StateRows::at(m, self.lambda, self.layer);
        let material = &self.layer.material;
        let nu = material.poissons_ratio;
        let factor = material.displacement_factor();

        let (j0, j1) = bessel_j0_j1(m * self.rho);
        // J1(mρ)/ρ → m/2 on the axis
        let j1_over_rho = if self.rho > 0.0 { j1 / self.rho } else { 0.5 * m };

        let radial = rows.radial.dot(&x);
        let dilatation = rows.dilatation.dot(&x);
        let volumetric = 2.0 * nu * m * j0 * dilatation;

        [
            -m * j0 * rows.normal.dot(&x),
            (m * j0 - j1_over_rho) * radial + volumetric,
            j1_over_rho * radial + volumetric,
            m * j1 * rows.shear.dot(&x),
            -factor * j0 * rows.vertical.dot(&x),
            factor * j1 * radial,
        ]
    }

    /// Integrate over `grid`, solving one interface system per node.
    ///
    /// # Errors
    ///
    /// Propagates the first [`crate::Error::SingularSystem`] met.
    pub fn integrate(
        &self,
        grid: &HankelGrid,
        load: &LoadSpec,
        solver: &dyn Solver,
    ) -> Result<TransformSums> {
        let length_scale = self.geometry.length_scale();
        let mut sums = [0.0; N_QUANTITIES];
        let mut partials = Vec::with_capacity(grid.n_panels());
        let mut ends = grid.panel_ends().iter().peekable();

        for (idx, node) in grid.nodes().iter().enumerate() {
            let sample = TransformSample::solve(node.m, self.geometry, solver)?;
            let f = node.weight * load.kernel(node.m, length_scale);
            for (sum, k) in sums.iter_mut().zip(self.kernels(&sample)) {
                *sum += f * k;
            }
            if ends.peek().is_some_and(|&&end| end == idx + 1) {
                ends.next();
                partials.push(sums);
            }
        }

        Ok(TransformSums {
            sums,
            partials,
            reached_cutoff: grid.reached_cutoff(),
        })
    }
}

/// Accumulated transform integrals with the partial sums at panel ends.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformSums {
    sums: [f64; N_QUANTITIES],
    partials: Vec<[f64; N_QUANTITIES]>,
    reached_cutoff: bool,
}

impl TransformSums {
    /// Final integrals [σz, σr, σθ, τ, w, u] in normalised units.
    pub fn totals(&self) -> &[f64; N_QUANTITIES] {
        &self.sums
    }

    /// max over quantities of |S_N − S_{N−1}| / max_k |S_k|.
    ///
    /// Quantities that vanish identically (shear and radial displacement on
    /// the axis) are skipped. A single panel ended by the decay cutoff has
    /// no tail.
    pub fn tail_estimate(&self) -> f64 {
        let (previous, last) = match self.partials.as_slice() {
            [] => return f64::INFINITY,
            [_] if self.reached_cutoff => return 0.0,
            [only] => ([0.0; N_QUANTITIES], *only),
            [.., previous, last] => (*previous, *last),
        };

        (0..N_QUANTITIES)
            .filter_map(|q| {
                let scale = self.partials.iter().map(|p| p[q].abs()).fold(0.0, f64::max);
                (scale > 0.0).then(|| (last[q] - previous[q]).abs() / scale)
            })
            .fold(0.0, f64::max)
    }

    /// Convergence report against `tolerance`.
    pub fn convergence(&self, tolerance: f64) -> Convergence {
        let tail_estimate = self.tail_estimate();
        Convergence {
            panels: self.partials.len(),
            reached_cutoff: self.reached_cutoff,
            tail_estimate,
            converged: self.reached_cutoff || tail_estimate <= tolerance,
        }
    }

    /// Scale to physical units and derive strains.
    pub fn into_response(
        self,
        point: EvaluationPoint,
        layer: usize,
        geometry: &NormalizedStack,
        load: &LoadSpec,
        tolerance: f64,
    ) -> ResponseField {
        let q = load.pressure();
        let h = geometry.length_scale();
        let [sz, sr, st, tau, w, u] = self.sums;

        let stress = StressState::new(-q * sz, -q * sr, -q * st, -q * tau);
        let strain = geometry
            .layer(layer)
            .map(|l| l.material.strain(&stress))
            .unwrap_or_else(StrainState::zero);

        ResponseField {
            point,
            layer,
            vertical_displacement: h * q * w,
            radial_displacement: -h * q * u,
            stress,
            strain,
            convergence: self.convergence(tolerance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LayerStack;
    use crate::quadrature::{GridPolicy, ZeroTable};
    use crate::solver::DenseLuSolver;
    use approx::assert_relative_eq;

    fn half_space_response(r: f64, z: f64) -> ResponseField {
        let stack = LayerStack::half_space(100.0, 0.35).unwrap();
        let load = LoadSpec::new(0.7, 0.15).unwrap();
        let geometry = NormalizedStack::new(&stack, load.radius());
        let h = geometry.length_scale();
        let (rho, lambda) = (r / h, z / h);

        let grid = HankelGrid::build(
            &ZeroTable::new(40),
            load.radius() / h,
            rho,
            lambda,
            &GridPolicy::default(),
        );
        let integrand = Integrand::new(&geometry, 0, rho, lambda).unwrap();
        integrand
            .integrate(&grid, &load, &DenseLuSolver::default())
            .unwrap()
            .into_response(EvaluationPoint::new(r, z), 0, &geometry, &load, 1e-3)
    }

    #[test]
    fn test_surface_centre_of_half_space() {
        let field = half_space_response(0.0, 0.0);
        assert_relative_eq!(field.stress.vertical(), 0.7, max_relative = 1e-3);
        // 2(1 - ν²) q a / E
        assert_relative_eq!(field.vertical_displacement, 0.001_842_75, max_relative = 1e-3);
        assert!(field.convergence.converged);
        assert_eq!(field.convergence.panels, 40);
        assert!(field.is_finite());
    }

    #[test]
    fn test_boussinesq_below_centre() {
        let (q, a) = (0.7_f64, 0.15_f64);
        for &z in &[0.05, 0.15, 0.3] {
            let field = half_space_response(0.0, z);
            let expected = q * (1.0 - z.powi(3) / (a * a + z * z).powf(1.5));
            assert_relative_eq!(field.stress.vertical(), expected, max_relative = 2e-3);
            assert_relative_eq!(field.stress.shear(), 0.0);
            assert_relative_eq!(field.radial_displacement, 0.0);
            assert!(field.convergence.reached_cutoff);
        }
    }

    #[test]
    fn test_tail_estimate() {
        let sums = TransformSums {
            sums: [1.0, 2.0, 0.0, 0.0, 0.0, 0.0],
            partials: vec![
                [0.5, 1.0, 0.0, 0.0, 0.0, 0.0],
                [1.2, 1.9, 0.0, 0.0, 0.0, 0.0],
                [1.0, 2.0, 0.0, 0.0, 0.0, 0.0],
            ],
            reached_cutoff: false,
        };
        // σz: |1.0 - 1.2| / 1.2, σr: |2.0 - 1.9| / 2.0
        assert_relative_eq!(sums.tail_estimate(), 0.2 / 1.2, epsilon = 1e-12);
        assert!(!sums.convergence(1e-3).converged);
        assert!(sums.convergence(0.2).converged);

        let cut = TransformSums {
            reached_cutoff: true,
            ..sums
        };
        assert!(cut.convergence(1e-3).converged);
    }

    #[test]
    fn test_single_panel_tail() {
        let sums = TransformSums {
            sums: [0.4, 0.1, 0.1, 0.0, 0.0, 0.0],
            partials: vec![[0.4, 0.1, 0.1, 0.0, 0.0, 0.0]],
            reached_cutoff: true,
        };
        let convergence = sums.convergence(1e-3);
        assert!(convergence.converged);
        assert_eq!(convergence.tail_estimate, 0.0);

        // Without the cutoff one panel says nothing about the rest
        let open = TransformSums {
            reached_cutoff: false,
            ..sums
        };
        assert_relative_eq!(open.tail_estimate(), 1.0);
        assert!(!open.convergence(1e-3).converged);
    }

    #[test]
    fn test_deep_point_ends_in_first_panel() {
        // λ far beyond the first J0 zero: the cutoff truncates panel one
        let field = half_space_response(0.0, 60.0);
        assert_eq!(field.convergence.panels, 1);
        assert!(field.convergence.reached_cutoff);
        assert!(field.convergence.converged);
        assert_eq!(field.convergence.tail_estimate, 0.0);
        assert!(field.stress.vertical() > 0.0);
    }

    #[test]
    fn test_empty_grid_is_unconverged() {
        let sums = TransformSums {
            sums: [0.0; N_QUANTITIES],
            partials: Vec::new(),
            reached_cutoff: false,
        };
        assert!(!sums.convergence(1e-3).converged);
        assert_eq!(sums.convergence(1e-3).panels, 0);
    }
}
