//! Interface system assembly per transform sample.
//!
//! For a fixed transform parameter m the axisymmetric stress function of
//! layer i is
//!
//! ```text
//! φ_i = [A_i e^{-m(λ_i - λ)} - B_i e^{-m(λ - λ_{i-1})}
//!        + C_i mλ e^{-m(λ_i - λ)} - D_i mλ e^{-m(λ - λ_{i-1})}] J0(mρ) / m²
//! ```
//!
//! with depths normalised by a characteristic length H, so every exponential
//! is at most 1. The half-space keeps only the decaying pair (B, D), which
//! gives 4n − 2 unknowns for n layers.
//!
//! Rows, in order:
//!
//! | rows            | condition                                      |
//! |-----------------|------------------------------------------------|
//! | 0, 1            | surface: σz* = 1, τ* = 0                       |
//! | 4i + 2, 4i + 3  | interface i: σz and w continuous               |
//! | 4i + 4, 4i + 5  | bonded: τ and u continuous                     |
//! |                 | frictionless: τ = 0 on both faces              |
//!
//! Displacement rows carry the ratio R_i = (E_i / E_{i+1})·(1 + ν_{i+1}) /
//! (1 + ν_i) so that every row is dimensionless.

use crate::error::{Error, Result};
use crate::layer::{Interface, LayerStack};
use crate::material::Material;
use crate::solver::Solver;
use nalgebra::{DMatrix, DVector, Vector4};

/// One layer in normalised coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedLayer {
    /// Normalised depth of the top face.
    pub top: f64,
    /// Normalised depth of the bottom face; `None` for the half-space.
    pub bottom: Option<f64>,
    /// Elastic properties (unnormalised).
    pub material: Material,
}

/// A [`LayerStack`] with depths divided by its characteristic length.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedStack {
    length_scale: f64,
    layers: Vec<NormalizedLayer>,
    interfaces: Vec<Interface>,
    /// Stiffness ratio applied to the displacement rows of each interface.
    ratios: Vec<f64>,
}

impl NormalizedStack {
    /// Normalise `stack`. The length scale is the total finite thickness, or
    /// `load_radius` for a homogeneous half-space.
    pub fn new(stack: &LayerStack, load_radius: f64) -> Self {
        let total = stack.total_thickness();
        let length_scale = if stack.n_layers() > 1 && total > 0.0 {
            total
        } else {
            load_radius
        };

        let n = stack.n_layers();
        let layers = stack
            .layers()
            .iter()
            .enumerate()
            .map(|(i, layer)| NormalizedLayer {
                top: stack.depth_to_top(i).unwrap_or_default() / length_scale,
                bottom: if i + 1 < n {
                    stack.depth_to_top(i + 1).map(|d| d / length_scale)
                } else {
                    None
                },
                material: *layer.material(),
            })
            .collect::<Vec<_>>();

        let ratios = layers
            .windows(2)
            .map(|pair| {
                let (upper, lower) = (&pair[0].material, &pair[1].material);
                upper.youngs_modulus / lower.youngs_modulus * (1.0 + lower.poissons_ratio)
                    / (1.0 + upper.poissons_ratio)
            })
            .collect();

        Self {
            length_scale,
            layers,
            interfaces: stack.interfaces().to_vec(),
            ratios,
        }
    }

    /// Characteristic length H.
    pub fn length_scale(&self) -> f64 {
        self.length_scale
    }

    pub fn n_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn layer(&self, idx: usize) -> Option<&NormalizedLayer> {
        self.layers.get(idx)
    }

    /// Number of unknowns, 4n − 2.
    pub fn n_unknowns(&self) -> usize {
        4 * self.layers.len() - 2
    }

    /// Column of coefficient `k` (0 = A .. 3 = D) of `layer`, if it is an unknown.
    pub fn column(&self, layer: usize, k: usize) -> Option<usize> {
        let last = self.layers.len() - 1;
        if layer < last {
            Some(4 * layer + k)
        } else {
            match k {
                1 => Some(4 * last),
                3 => Some(4 * last + 1),
                _ => None,
            }
        }
    }
}

/// Coefficient rows of the transformed state variables at one depth.
///
/// Each row, dotted with [A, B, C, D], gives the m-dependent factor of a
/// quantity before its Bessel term:
///
/// | row          | quantity                          |
/// |--------------|-----------------------------------|
/// | `normal`     | σz / (−m J0)                      |
/// | `shear`      | τrz / (m J1)                      |
/// | `vertical`   | w / (−(1+ν)/E · J0)               |
/// | `radial`     | u / ((1+ν)/E · J1)                |
/// | `dilatation` | C, D part shared by σr and σθ     |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateRows {
    pub normal: Vector4<f64>,
    pub shear: Vector4<f64>,
    pub vertical: Vector4<f64>,
    pub radial: Vector4<f64>,
    pub dilatation: Vector4<f64>,
}

impl StateRows {
    /// Rows for `layer` at normalised depth `lambda`.
    pub fn at(m: f64, lambda: f64, layer: &NormalizedLayer) -> Self {
        let nu = layer.material.poissons_ratio;
        let ea = match layer.bottom {
            Some(bottom) => (-m * (bottom - lambda)).exp(),
            None => 0.0,
        };
        let eb = (-m * (lambda - layer.top)).exp();
        let ml = m * lambda;

        Self {
            normal: Vector4::new(ea, eb, -(1.0 - 2.0 * nu - ml) * ea, (1.0 - 2.0 * nu + ml) * eb),
            shear: Vector4::new(ea, -eb, (2.0 * nu + ml) * ea, (2.0 * nu - ml) * eb),
            vertical: Vector4::new(
                ea,
                -eb,
                -(2.0 - 4.0 * nu - ml) * ea,
                -(2.0 - 4.0 * nu + ml) * eb,
            ),
            radial: Vector4::new(ea, eb, (1.0 + ml) * ea, -(1.0 - ml) * eb),
            dilatation: Vector4::new(0.0, 0.0, ea, -eb),
        }
    }
}

/// Assemble the interface system for transform parameter `m`.
pub fn assemble(m: f64, geometry: &NormalizedStack) -> (DMatrix<f64>, DVector<f64>) {
    let size = geometry.n_unknowns();
    let mut matrix = DMatrix::zeros(size, size);
    let mut rhs = DVector::zeros(size);

    let mut put = |row: usize, layer: usize, values: &Vector4<f64>, scale: f64| {
        for k in 0..4 {
            if let Some(col) = geometry.column(layer, k) {
                matrix[(row, col)] += scale * values[k];
            }
        }
    };

    let surface = StateRows::at(m, 0.0, &geometry.layers[0]);
    put(0, 0, &surface.normal, 1.0);
    put(1, 0, &surface.shear, 1.0);
    rhs[0] = 1.0;

    for (i, (&kind, &ratio)) in geometry.interfaces.iter().zip(&geometry.ratios).enumerate() {
        let upper_layer = &geometry.layers[i];
        let depth = upper_layer.bottom.unwrap_or(upper_layer.top);
        let upper = StateRows::at(m, depth, upper_layer);
        let lower = StateRows::at(m, depth, &geometry.layers[i + 1]);
        let row = 4 * i + 2;

        put(row, i, &upper.normal, 1.0);
        put(row, i + 1, &lower.normal, -1.0);
        put(row + 1, i, &upper.vertical, 1.0);
        put(row + 1, i + 1, &lower.vertical, -ratio);
        match kind {
            Interface::Bonded => {
                put(row + 2, i, &upper.shear, 1.0);
                put(row + 2, i + 1, &lower.shear, -1.0);
                put(row + 3, i, &upper.radial, 1.0);
                put(row + 3, i + 1, &lower.radial, -ratio);
            }
            Interface::Frictionless => {
                put(row + 2, i, &upper.shear, 1.0);
                put(row + 3, i + 1, &lower.shear, 1.0);
            }
        }
    }

    (matrix, rhs)
}

/// Stress-function coefficients [A, B, C, D] of one layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerCoefficients(pub Vector4<f64>);

impl LayerCoefficients {
    #[inline]
    pub fn a(&self) -> f64 {
        self.0[0]
    }

    #[inline]
    pub fn b(&self) -> f64 {
        self.0[1]
    }

    #[inline]
    pub fn c(&self) -> f64 {
        self.0[2]
    }

    #[inline]
    pub fn d(&self) -> f64 {
        self.0[3]
    }
}

/// Solved coefficients of every layer at one transform parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformSample {
    m: f64,
    coefficients: Vec<LayerCoefficients>,
}

impl TransformSample {
    /// Assemble and solve the interface system at `m`.
    ///
    /// # Errors
    ///
    /// [`Error::SingularSystem`] carrying `m` if the solver rejects the
    /// system, [`Error::InvalidConfiguration`] for a non-positive `m`.
    pub fn solve(m: f64, geometry: &NormalizedStack, solver: &dyn Solver) -> Result<Self> {
        if !(m.is_finite() && m > 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "transform parameter must be positive and finite, got {}",
                m
            )));
        }

        let (matrix, rhs) = assemble(m, geometry);
        let x = solver.solve(&matrix, &rhs).map_err(|e| e.at_sample(m))?;

        let coefficients = (0..geometry.n_layers())
            .map(|layer| {
                LayerCoefficients(Vector4::from_fn(|k, _| {
                    geometry.column(layer, k).map_or(0.0, |col| x[col])
                }))
            })
            .collect();

        Ok(Self { m, coefficients })
    }

    /// Transform parameter of this sample.
    pub fn m(&self) -> f64 {
        self.m
    }

    pub fn coefficients(&self) -> &[LayerCoefficients] {
        &self.coefficients
    }

    pub fn layer(&self, idx: usize) -> Option<&LayerCoefficients> {
        self.coefficients.get(idx)
    }
}
