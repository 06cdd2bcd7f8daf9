//! Analysis driver.
//!
//! An [`Analysis`] binds one layer stack, one load and one configuration,
//! precomputes everything that does not depend on the evaluation point
//! (normalised geometry, Bessel zero tables, the solver backend) and then
//! evaluates any number of points. Points are independent, so batches and
//! grids run in parallel with rayon.
//!
//! ```
//! use mle_core::{Analysis, AnalysisConfig, EvaluationPoint, LayerStack, LoadSpec};
//!
//! let stack = LayerStack::builder()
//!     .layer(5500.0, 0.35, 0.04)
//!     .bonded()
//!     .layer(600.0, 0.35, 0.15)
//!     .bonded()
//!     .half_space(50.0, 0.35)
//!     .build()
//!     .unwrap();
//! let load = LoadSpec::new(0.667, 0.1125).unwrap();
//!
//! let analysis = Analysis::new(stack, load, AnalysisConfig::default()).unwrap();
//! let field = analysis.evaluate(&EvaluationPoint::new(0.0, 0.1)).unwrap();
//! assert_eq!(field.layer, 1);
//! assert!(field.vertical_displacement > 0.0);
//! ```

use crate::error::{Error, Result};
use crate::layer::LayerStack;
use crate::load::LoadSpec;
use crate::quadrature::{GridPolicy, HankelGrid, ZeroTable};
use crate::response::{Integrand, ResponseField};
use crate::solver::{select_solver, Solver, SolverConfig};
use crate::system::{NormalizedStack, TransformSample};
use crate::types::{EvaluationPoint, InterfaceSide};
use nalgebra::DMatrix;
use rayon::prelude::*;

/// Analysis configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Oscillation panels integrated per point.
    pub iterations: usize,
    /// Lower limit of the transform integral, standing in for m = 0.
    pub zro: f64,
    /// Gauss-Legendre points per sub-panel (1 to 4).
    pub gauss_points: usize,
    /// Integration stops once m·λ exceeds this value.
    pub decay_cutoff: f64,
    /// Largest relative tail accepted as converged.
    pub convergence_tolerance: f64,
    /// Linear solver settings.
    pub solver: SolverConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let grid = GridPolicy::default();
        Self {
            iterations: grid.iterations,
            zro: grid.zro,
            gauss_points: grid.gauss_points,
            decay_cutoff: grid.decay_cutoff,
            convergence_tolerance: 1e-3,
            solver: SolverConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Grid construction parameters.
    pub fn grid_policy(&self) -> GridPolicy {
        GridPolicy {
            iterations: self.iterations,
            zro: self.zro,
            gauss_points: self.gauss_points,
            decay_cutoff: self.decay_cutoff,
        }
    }

    /// Check every parameter is usable.
    pub fn validate(&self) -> Result<()> {
        self.grid_policy().validate()?;
        self.solver.validate()?;
        if !(self.convergence_tolerance.is_finite() && self.convergence_tolerance > 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "convergence_tolerance must be positive, got {}",
                self.convergence_tolerance
            )));
        }
        Ok(())
    }
}

/// A layered system under one load, ready to evaluate.
pub struct Analysis {
    stack: LayerStack,
    load: LoadSpec,
    config: AnalysisConfig,
    geometry: NormalizedStack,
    zeros: ZeroTable,
    solver: Box<dyn Solver>,
}

impl Analysis {
    /// Prepare an analysis.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfiguration`] if `config` does not validate.
    pub fn new(stack: LayerStack, load: LoadSpec, config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let geometry = NormalizedStack::new(&stack, load.radius());
        let zeros = ZeroTable::new(config.iterations);
        let solver = select_solver(&config.solver);

        tracing::debug!(
            layers = stack.n_layers(),
            length_scale = geometry.length_scale(),
            iterations = config.iterations,
            solver = solver.name(),
            "analysis prepared"
        );

        Ok(Self {
            stack,
            load,
            config,
            geometry,
            zeros,
            solver,
        })
    }

    /// Analysis with the default configuration.
    pub fn with_defaults(stack: LayerStack, load: LoadSpec) -> Result<Self> {
        Self::new(stack, load, AnalysisConfig::default())
    }

    pub fn stack(&self) -> &LayerStack {
        &self.stack
    }

    pub fn load(&self) -> &LoadSpec {
        &self.load
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Normalised geometry shared by all points.
    pub fn geometry(&self) -> &NormalizedStack {
        &self.geometry
    }

    /// Solve the interface system at a single normalised transform parameter.
    pub fn transform_sample(&self, m: f64) -> Result<TransformSample> {
        TransformSample::solve(m, &self.geometry, self.solver.as_ref())
    }

    /// Response at one point.
    ///
    /// A depth on an interface is evaluated in the layer chosen by
    /// `point.side`. Unconverged integrals are returned with
    /// `convergence.converged == false` and logged as a warning.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidEvaluationPoint`] for negative or non-finite
    /// coordinates, [`Error::SingularSystem`] if any transform sample fails.
    pub fn evaluate(&self, point: &EvaluationPoint) -> Result<ResponseField> {
        point.validate()?;

        let h = self.geometry.length_scale();
        let layer = self.stack.locate(point.depth, point.side);
        let lambda = self.normalised_depth(point, layer);
        let rho = point.radius / h;
        let alpha = self.load.radius() / h;

        let grid = HankelGrid::build(&self.zeros, alpha, rho, lambda, &self.config.grid_policy());
        let integrand = Integrand::new(&self.geometry, layer, rho, lambda).ok_or_else(|| {
            Error::InvalidEvaluationPoint(format!("no layer {} at depth {}", layer, point.depth))
        })?;
        let field = integrand
            .integrate(&grid, &self.load, self.solver.as_ref())?
            .into_response(
                *point,
                layer,
                &self.geometry,
                &self.load,
                self.config.convergence_tolerance,
            );

        tracing::trace!(
            radius = point.radius,
            depth = point.depth,
            layer,
            nodes = grid.nodes().len(),
            "point evaluated"
        );
        if !field.convergence.converged {
            tracing::warn!(
                radius = point.radius,
                depth = point.depth,
                panels = field.convergence.panels,
                tail = field.convergence.tail_estimate,
                "transform integral not converged; increase iterations"
            );
        }
        Ok(field)
    }

    /// Responses at many points, evaluated in parallel.
    ///
    /// Failures are isolated: each point gets its own result.
    pub fn evaluate_batch(&self, points: &[EvaluationPoint]) -> Vec<Result<ResponseField>> {
        let results: Vec<_> = points.par_iter().map(|p| self.evaluate(p)).collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        tracing::debug!(points = points.len(), failed, "batch evaluated");
        results
    }

    /// Responses on the tensor grid `depths × offsets`.
    ///
    /// # Errors
    ///
    /// The first error met at any grid point.
    pub fn evaluate_grid(&self, offsets: &[f64], depths: &[f64]) -> Result<ResponseGrid> {
        let points: Vec<EvaluationPoint> = depths
            .iter()
            .flat_map(|&z| offsets.iter().map(move |&r| EvaluationPoint::new(r, z)))
            .collect();

        let fields = points
            .par_iter()
            .map(|p| self.evaluate(p))
            .collect::<Result<Vec<_>>>()?;

        Ok(ResponseGrid {
            offsets: offsets.to_vec(),
            depths: depths.to_vec(),
            fields,
        })
    }

    /// Normalised depth, snapped onto the interface when the point lies on one.
    fn normalised_depth(&self, point: &EvaluationPoint, layer: usize) -> f64 {
        let on_interface = self.stack.interface_at(point.depth).is_some();
        match (on_interface, self.geometry.layer(layer)) {
            (true, Some(l)) => match point.side {
                InterfaceSide::Upper => l.bottom.unwrap_or(l.top),
                InterfaceSide::Lower => l.top,
            },
            _ => point.depth / self.geometry.length_scale(),
        }
    }
}

/// Responses on a rectangular grid: rows are depths, columns are offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseGrid {
    offsets: Vec<f64>,
    depths: Vec<f64>,
    /// Row-major, one row per depth.
    fields: Vec<ResponseField>,
}

impl ResponseGrid {
    pub fn offsets(&self) -> &[f64] {
        &self.offsets
    }

    pub fn depths(&self) -> &[f64] {
        &self.depths
    }

    pub fn fields(&self) -> &[ResponseField] {
        &self.fields
    }

    pub fn n_rows(&self) -> usize {
        self.depths.len()
    }

    pub fn n_cols(&self) -> usize {
        self.offsets.len()
    }

    /// Field at depth index `row`, offset index `col`.
    pub fn get(&self, row: usize, col: usize) -> Option<&ResponseField> {
        if row < self.n_rows() && col < self.n_cols() {
            self.fields.get(row * self.n_cols() + col)
        } else {
            None
        }
    }

    /// One scalar per grid point as a depths × offsets matrix.
    ///
    /// ```ignore
    /// let strain = grid.component(|f| f.strain.vertical());
    /// ```
    pub fn component<F>(&self, extract: F) -> DMatrix<f64>
    where
        F: Fn(&ResponseField) -> f64,
    {
        let cols = self.n_cols();
        DMatrix::from_fn(self.n_rows(), cols, |i, j| extract(&self.fields[i * cols + j]))
    }

    /// Whether every entry is finite.
    pub fn is_finite(&self) -> bool {
        self.fields.iter().all(ResponseField::is_finite)
    }

    /// Whether every entry converged.
    pub fn all_converged(&self) -> bool {
        self.fields.iter().all(|f| f.convergence.converged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::Interface;
    use approx::assert_relative_eq;

    fn reference_analysis(kind: Interface) -> Analysis {
        let stack = LayerStack::builder()
            .layer(5500.0, 0.35, 0.04)
            .interface(kind)
            .layer(600.0, 0.35, 0.15)
            .interface(kind)
            .half_space(50.0, 0.35)
            .build()
            .unwrap();
        let load = LoadSpec::new(0.667, 0.1125).unwrap();
        Analysis::with_defaults(stack, load).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.iterations, 40);
        assert_relative_eq!(config.zro, 1e-7);
        assert_eq!(config.gauss_points, 4);
        assert_relative_eq!(config.convergence_tolerance, 1e-3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let stack = LayerStack::half_space(100.0, 0.3).unwrap();
        let load = LoadSpec::new(0.7, 0.15).unwrap();
        let config = AnalysisConfig {
            iterations: 0,
            ..Default::default()
        };
        assert!(matches!(
            Analysis::new(stack.clone(), load, config),
            Err(Error::InvalidConfiguration(_))
        ));

        let config = AnalysisConfig {
            convergence_tolerance: -1.0,
            ..Default::default()
        };
        assert!(Analysis::new(stack, load, config).is_err());
    }

    #[test]
    fn test_negative_depth_rejected() {
        let analysis = reference_analysis(Interface::Bonded);
        let err = analysis.evaluate(&EvaluationPoint::new(0.0, -0.01)).unwrap_err();
        assert!(matches!(err, Error::InvalidEvaluationPoint(_)));
    }

    #[test]
    fn test_interface_side_selects_layer() {
        let analysis = reference_analysis(Interface::Bonded);
        let upper = analysis.evaluate(&EvaluationPoint::new(0.0, 0.04)).unwrap();
        let lower = analysis
            .evaluate(&EvaluationPoint::new(0.0, 0.04).on_side(InterfaceSide::Lower))
            .unwrap();
        assert_eq!(upper.layer, 0);
        assert_eq!(lower.layer, 1);
        // Stiff asphalt above, soft granular layer below
        assert!(lower.strain.vertical() > 2.0 * upper.strain.vertical());
    }

    #[test]
    fn test_batch_isolates_failures() {
        let analysis = reference_analysis(Interface::Bonded);
        let points = [
            EvaluationPoint::new(0.0, 0.1),
            EvaluationPoint::new(0.0, -1.0),
            EvaluationPoint::new(0.05, 0.3),
        ];
        let results = analysis.evaluate_batch(&points);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(Error::InvalidEvaluationPoint(_))));
        assert!(results[2].is_ok());
        assert_eq!(results[2].as_ref().unwrap().layer, 2);
    }

    #[test]
    fn test_batch_matches_sequential() {
        let analysis = reference_analysis(Interface::Bonded);
        let points = [EvaluationPoint::new(0.0, 0.1), EvaluationPoint::new(0.2, 0.5)];
        let batch = analysis.evaluate_batch(&points);
        for (point, result) in points.iter().zip(batch) {
            let parallel = result.unwrap();
            let sequential = analysis.evaluate(point).unwrap();
            assert_eq!(parallel.layer, sequential.layer);
            assert_relative_eq!(
                parallel.strain.vertical(),
                sequential.strain.vertical(),
                max_relative = 1e-12
            );
            assert_relative_eq!(
                parallel.vertical_displacement,
                sequential.vertical_displacement,
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn test_grid_layout() {
        let analysis = reference_analysis(Interface::Bonded);
        let offsets = [0.0, 0.2];
        let depths = [0.1, 0.3, 0.6];
        let grid = analysis.evaluate_grid(&offsets, &depths).unwrap();

        assert_eq!(grid.n_rows(), 3);
        assert_eq!(grid.n_cols(), 2);
        assert!(grid.is_finite());
        let field = grid.get(2, 1).unwrap();
        assert_relative_eq!(field.point.depth, 0.6);
        assert_relative_eq!(field.point.radius, 0.2);
        assert!(grid.get(3, 0).is_none());

        let w = grid.component(|f| f.vertical_displacement);
        assert_eq!(w.shape(), (3, 2));
        // Deflection decays with depth under the load
        assert!(w[(0, 0)] > w[(1, 0)] && w[(1, 0)] > w[(2, 0)]);
    }

    #[test]
    fn test_grid_fails_fast() {
        let analysis = reference_analysis(Interface::Bonded);
        assert!(analysis.evaluate_grid(&[0.0], &[0.1, -0.5]).is_err());
    }

    #[test]
    fn test_singular_systems_surface() {
        let stack = LayerStack::builder()
            .layer(5500.0, 0.35, 0.04)
            .bonded()
            .half_space(50.0, 0.35)
            .build()
            .unwrap();
        let load = LoadSpec::new(0.667, 0.1125).unwrap();
        let config = AnalysisConfig {
            solver: SolverConfig {
                pivot_tolerance: 0.99,
                ..Default::default()
            },
            ..Default::default()
        };
        let analysis = Analysis::new(stack, load, config).unwrap();
        let results = analysis.evaluate_batch(&[EvaluationPoint::new(0.0, 0.1)]);
        assert!(results[0].as_ref().unwrap_err().is_singular());
    }

    #[test]
    fn test_qr_backend_matches_lu() {
        let lu = reference_analysis(Interface::Bonded);
        let config = AnalysisConfig {
            solver: SolverConfig {
                solver_type: crate::solver::SolverType::Qr,
                ..Default::default()
            },
            ..Default::default()
        };
        let qr = Analysis::new(lu.stack().clone(), *lu.load(), config).unwrap();

        for point in [
            EvaluationPoint::new(0.0, 0.04).on_side(InterfaceSide::Lower),
            EvaluationPoint::new(0.1, 0.19),
            EvaluationPoint::new(0.0, 0.0),
        ] {
            let a = lu.evaluate(&point).unwrap();
            let b = qr.evaluate(&point).unwrap();
            assert_eq!(a.layer, b.layer);
            assert_eq!(a.convergence.converged, b.convergence.converged);
            for i in 0..4 {
                assert_relative_eq!(a.stress.0[i], b.stress.0[i], epsilon = 1e-13, max_relative = 1e-10);
            }
            for i in 0..3 {
                assert_relative_eq!(a.strain.0[i], b.strain.0[i], epsilon = 1e-16, max_relative = 1e-10);
            }
            assert_relative_eq!(a.vertical_displacement, b.vertical_displacement, max_relative = 1e-10);
        }
    }

    #[test]
    fn test_deep_point_reports_no_tail() {
        let analysis = reference_analysis(Interface::Bonded);
        let field = analysis.evaluate(&EvaluationPoint::new(0.0, 5.0)).unwrap();
        assert!(field.convergence.converged);
        assert!(field.convergence.reached_cutoff);
        assert_eq!(field.convergence.panels, 1);
        assert_eq!(field.convergence.tail_estimate, 0.0);
    }

    #[test]
    fn test_transform_sample_diagnostics() {
        let analysis = reference_analysis(Interface::Bonded);
        let sample = analysis.transform_sample(3.0).unwrap();
        assert_eq!(sample.coefficients().len(), 3);
        assert_eq!(sample.layer(2).unwrap().a(), 0.0);
        assert!(analysis.transform_sample(-1.0).is_err());
    }
}
