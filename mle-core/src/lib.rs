//! MLE Core - Multi-layer elastic pavement response
//!
//! Computes stresses, strains and displacements in a layered elastic
//! half-space under a uniform circular surface load:
//! - Layer stacks with bonded or frictionless interfaces
//! - Hankel-transform solution with a per-sample interface system
//! - Dense LU / QR solvers with singularity detection
//! - Parallel evaluation of many points using Rayon
//!
//! # Architecture
//!
//! - [`LayerStack`]: validated layer geometry and materials
//! - [`LoadSpec`]: circular contact load
//! - [`system`]: interface system assembly for one transform parameter
//! - [`Solver`] trait: linear system solution strategies
//! - [`quadrature`] and [`response`]: transform-space integration
//! - [`Analysis`]: binds everything and evaluates [`EvaluationPoint`]s
//!
//! # Sign convention
//!
//! Compressive stress and strain are positive, downward vertical
//! displacement is positive and radial displacement is positive toward the
//! load axis.

pub mod analysis;
pub mod bessel;
pub mod error;
pub mod layer;
pub mod load;
pub mod material;
pub mod quadrature;
pub mod response;
pub mod solver;
pub mod system;
pub mod types;
pub mod units;

pub use analysis::{Analysis, AnalysisConfig, ResponseGrid};
pub use error::{Error, Result};
pub use layer::{Interface, Layer, LayerStack};
pub use load::LoadSpec;
pub use material::Material;
pub use response::{Convergence, ResponseField};
pub use solver::{Solver, SolverConfig, SolverType};
pub use system::TransformSample;
pub use types::{EvaluationPoint, InterfaceSide, StrainState, StressState};
