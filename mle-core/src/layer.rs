//! Layered half-space geometry.
//!
//! A [`LayerStack`] is an ordered sequence of layers, top to bottom, where
//! every layer but the last has a finite thickness and the last one extends
//! to infinite depth. Adjacent layers meet at an [`Interface`] whose bonding
//! condition decides which continuity equations hold there.
//!
//! The stack is validated once on construction and is immutable afterwards.
//!
//! ```
//! use mle_core::layer::{Interface, LayerStack};
//!
//! let stack = LayerStack::builder()
//!     .layer(5500.0, 0.35, 0.04)
//!     .interface(Interface::Bonded)
//!     .layer(600.0, 0.35, 0.15)
//!     .interface(Interface::Frictionless)
//!     .half_space(50.0, 0.35)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(stack.n_layers(), 3);
//! assert_eq!(stack.interface(1), Some(Interface::Frictionless));
//! ```

use crate::error::{Error, Result};
use crate::material::Material;
use crate::types::InterfaceSide;

/// Relative tolerance (of the total finite thickness) within which a depth
/// counts as lying on an interface.
const INTERFACE_TOLERANCE: f64 = 1e-9;

/// Bonding condition between two adjacent layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interface {
    /// Full continuity of displacements and tractions.
    #[default]
    Bonded,
    /// Vertical displacement and normal stress continuous, no shear transfer.
    Frictionless,
}

/// A single elastic layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layer {
    material: Material,
    /// `None` for the semi-infinite bottom layer.
    thickness: Option<f64>,
}

impl Layer {
    /// Finite layer of the given thickness.
    pub fn new(youngs_modulus: f64, poissons_ratio: f64, thickness: f64) -> Result<Self> {
        if !thickness.is_finite() || thickness <= 0.0 {
            return Err(Error::InvalidLayerConfiguration(format!(
                "layer thickness must be positive and finite, got {}",
                thickness
            )));
        }
        Ok(Self {
            material: Material::new(youngs_modulus, poissons_ratio)?,
            thickness: Some(thickness),
        })
    }

    /// Semi-infinite bottom layer.
    pub fn half_space(youngs_modulus: f64, poissons_ratio: f64) -> Result<Self> {
        Ok(Self {
            material: Material::new(youngs_modulus, poissons_ratio)?,
            thickness: None,
        })
    }

    /// Elastic properties of the layer.
    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Thickness, or `None` for the half-space.
    pub fn thickness(&self) -> Option<f64> {
        self.thickness
    }

    /// Whether the layer extends to infinite depth.
    pub fn is_half_space(&self) -> bool {
        self.thickness.is_none()
    }
}

/// Validated, immutable layered half-space.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerStack {
    layers: Vec<Layer>,
    interfaces: Vec<Interface>,
    /// Depth to the top of each layer; `tops[0] == 0`.
    tops: Vec<f64>,
}

impl LayerStack {
    /// Build a stack from layers (top to bottom) and the interfaces between them.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLayerConfiguration`] if there are no layers, if any
    /// layer other than the last is a half-space, if the last layer has a
    /// finite thickness, or if `interfaces.len() != layers.len() - 1`.
    pub fn new(layers: Vec<Layer>, interfaces: Vec<Interface>) -> Result<Self> {
        let n = layers.len();
        if n == 0 {
            return Err(Error::InvalidLayerConfiguration(
                "a layer stack needs at least one layer".into(),
            ));
        }
        if interfaces.len() != n - 1 {
            return Err(Error::InvalidLayerConfiguration(format!(
                "{} layers need {} interfaces, got {}",
                n,
                n - 1,
                interfaces.len()
            )));
        }
        if let Some(idx) = layers[..n - 1].iter().position(Layer::is_half_space) {
            return Err(Error::InvalidLayerConfiguration(format!(
                "only the bottom layer may be semi-infinite, layer {} is too",
                idx
            )));
        }
        if !layers[n - 1].is_half_space() {
            return Err(Error::InvalidLayerConfiguration(
                "the bottom layer must be semi-infinite".into(),
            ));
        }

        let mut tops = Vec::with_capacity(n);
        let mut depth = 0.0;
        tops.push(depth);
        for layer in &layers[..n - 1] {
            depth += layer.thickness.unwrap_or_default();
            tops.push(depth);
        }

        Ok(Self {
            layers,
            interfaces,
            tops,
        })
    }

    /// Homogeneous half-space of a single material.
    pub fn half_space(youngs_modulus: f64, poissons_ratio: f64) -> Result<Self> {
        Self::new(vec![Layer::half_space(youngs_modulus, poissons_ratio)?], Vec::new())
    }

    /// Start a builder.
    pub fn builder() -> LayerStackBuilder {
        LayerStackBuilder::default()
    }

    /// Number of layers, half-space included.
    pub fn n_layers(&self) -> usize {
        self.layers.len()
    }

    /// Number of interfaces (`n_layers() - 1`).
    pub fn n_interfaces(&self) -> usize {
        self.interfaces.len()
    }

    /// Layer by index (0 = surface layer).
    pub fn layer(&self, idx: usize) -> Option<&Layer> {
        self.layers.get(idx)
    }

    /// All layers, top to bottom.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Bonding condition of interface `idx` (between layers `idx` and `idx + 1`).
    pub fn interface(&self, idx: usize) -> Option<Interface> {
        self.interfaces.get(idx).copied()
    }

    /// All interfaces, top to bottom.
    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    /// Depth to the top of layer `idx`.
    pub fn depth_to_top(&self, idx: usize) -> Option<f64> {
        self.tops.get(idx).copied()
    }

    /// Depths of the interfaces, top to bottom.
    pub fn interface_depths(&self) -> &[f64] {
        &self.tops[1..]
    }

    /// Sum of the finite layer thicknesses (depth of the half-space top).
    pub fn total_thickness(&self) -> f64 {
        self.tops[self.tops.len() - 1]
    }

    /// Index of the layer containing `depth`.
    ///
    /// A depth within a small relative tolerance of an interface is treated as
    /// lying on it, and `side` picks the layer above or below.
    pub fn locate(&self, depth: f64, side: InterfaceSide) -> usize {
        let tol = INTERFACE_TOLERANCE * self.total_thickness().max(f64::MIN_POSITIVE);
        for (idx, &bottom) in self.interface_depths().iter().enumerate() {
            if (depth - bottom).abs() <= tol {
                return match side {
                    InterfaceSide::Upper => idx,
                    InterfaceSide::Lower => idx + 1,
                };
            }
            if depth < bottom {
                return idx;
            }
        }
        self.n_layers() - 1
    }

    /// Interface index if `depth` lies on one.
    pub fn interface_at(&self, depth: f64) -> Option<usize> {
        let tol = INTERFACE_TOLERANCE * self.total_thickness().max(f64::MIN_POSITIVE);
        self.interface_depths()
            .iter()
            .position(|&d| (depth - d).abs() <= tol)
    }

    /// Copy of this stack with every interface set to `kind`.
    pub fn with_all_interfaces(&self, kind: Interface) -> Self {
        Self {
            layers: self.layers.clone(),
            interfaces: vec![kind; self.interfaces.len()],
            tops: self.tops.clone(),
        }
    }
}

/// Incremental constructor for [`LayerStack`].
///
/// Values are checked when [`LayerStackBuilder::build`] is called.
#[derive(Debug, Clone, Default)]
pub struct LayerStackBuilder {
    layers: Vec<(f64, f64, Option<f64>)>,
    interfaces: Vec<Interface>,
}

impl LayerStackBuilder {
    /// Append a finite layer.
    pub fn layer(mut self, youngs_modulus: f64, poissons_ratio: f64, thickness: f64) -> Self {
        self.layers.push((youngs_modulus, poissons_ratio, Some(thickness)));
        self
    }

    /// Append the interface below the last layer added.
    pub fn interface(mut self, kind: Interface) -> Self {
        self.interfaces.push(kind);
        self
    }

    /// Shorthand for `interface(Interface::Bonded)`.
    pub fn bonded(self) -> Self {
        self.interface(Interface::Bonded)
    }

    /// Shorthand for `interface(Interface::Frictionless)`.
    pub fn frictionless(self) -> Self {
        self.interface(Interface::Frictionless)
    }

    /// Append the semi-infinite bottom layer.
    pub fn half_space(mut self, youngs_modulus: f64, poissons_ratio: f64) -> Self {
        self.layers.push((youngs_modulus, poissons_ratio, None));
        self
    }

    /// Validate and build the stack.
    pub fn build(self) -> Result<LayerStack> {
        let layers = self
            .layers
            .into_iter()
            .map(|(e, nu, h)| match h {
                Some(h) => Layer::new(e, nu, h),
                None => Layer::half_space(e, nu),
            })
            .collect::<Result<Vec<_>>>()?;
        LayerStack::new(layers, self.interfaces)
    }
}
