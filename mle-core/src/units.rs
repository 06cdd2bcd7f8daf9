//! Unit systems and result conversion.
//!
//! The engine itself is unit agnostic: any consistent pair of length and
//! stress units works. This module converts inputs and outputs between the
//! common pavement conventions.
//!
//! | preset              | length | stress |
//! |---------------------|--------|--------|
//! | [`SI`]              | m      | Pa     |
//! | [`PAVEMENT_METRIC`] | m      | MPa    |
//! | [`US_CUSTOMARY`]    | in     | psi    |
//! | [`US_CUSTOMARY_KSI`]| in     | ksi    |
//!
//! Strains are dimensionless and never converted.
//!
//! ```
//! use mle_core::units::{PAVEMENT_METRIC, US_CUSTOMARY};
//!
//! let psi = PAVEMENT_METRIC.stress_to(0.7, &US_CUSTOMARY);
//! assert!((psi - 101.526).abs() < 1e-3);
//! ```

use crate::error::Result;
use crate::layer::{Layer, LayerStack};
use crate::load::LoadSpec;
use crate::response::ResponseField;
use crate::types::EvaluationPoint;
use std::fmt;

const METRES_PER_INCH: f64 = 0.0254;
const PASCALS_PER_PSI: f64 = 6_894.757_293_168_361;

/// A consistent pair of length and stress units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitSystem {
    /// Short label, e.g. "in/psi".
    pub name: &'static str,
    /// Length units per metre.
    pub length_per_metre: f64,
    /// Stress units per pascal.
    pub stress_per_pascal: f64,
}

/// Metres and pascals.
pub const SI: UnitSystem = UnitSystem {
    name: "m/Pa",
    length_per_metre: 1.0,
    stress_per_pascal: 1.0,
};

/// Metres and megapascals.
pub const PAVEMENT_METRIC: UnitSystem = UnitSystem {
    name: "m/MPa",
    length_per_metre: 1.0,
    stress_per_pascal: 1e-6,
};

/// Inches and pounds per square inch.
pub const US_CUSTOMARY: UnitSystem = UnitSystem {
    name: "in/psi",
    length_per_metre: 1.0 / METRES_PER_INCH,
    stress_per_pascal: 1.0 / PASCALS_PER_PSI,
};

/// Inches and kips per square inch.
pub const US_CUSTOMARY_KSI: UnitSystem = UnitSystem {
    name: "in/ksi",
    length_per_metre: 1.0 / METRES_PER_INCH,
    stress_per_pascal: 1e-3 / PASCALS_PER_PSI,
};

impl UnitSystem {
    /// Convert a length from this system to `target`.
    pub fn length_to(&self, value: f64, target: &UnitSystem) -> f64 {
        value * (target.length_per_metre / self.length_per_metre)
    }

    /// Convert a stress (or modulus) from this system to `target`.
    pub fn stress_to(&self, value: f64, target: &UnitSystem) -> f64 {
        value * (target.stress_per_pascal / self.stress_per_pascal)
    }

    /// Re-express a layer stack in `target` units.
    pub fn convert_stack(&self, stack: &LayerStack, target: &UnitSystem) -> Result<LayerStack> {
        let layers = stack
            .layers()
            .iter()
            .map(|layer| {
                let mat = layer.material();
                let e = self.stress_to(mat.youngs_modulus, target);
                match layer.thickness() {
                    Some(h) => Layer::new(e, mat.poissons_ratio, self.length_to(h, target)),
                    None => Layer::half_space(e, mat.poissons_ratio),
                }
            })
            .collect::<Result<Vec<_>>>()?;
        LayerStack::new(layers, stack.interfaces().to_vec())
    }

    /// Re-express a load in `target` units.
    pub fn convert_load(&self, load: &LoadSpec, target: &UnitSystem) -> Result<LoadSpec> {
        LoadSpec::new(
            self.stress_to(load.pressure(), target),
            self.length_to(load.radius(), target),
        )
    }

    /// Re-express an evaluation point in `target` units.
    pub fn convert_point(&self, point: &EvaluationPoint, target: &UnitSystem) -> EvaluationPoint {
        EvaluationPoint {
            radius: self.length_to(point.radius, target),
            depth: self.length_to(point.depth, target),
            side: point.side,
        }
    }

    /// Re-express a response in `target` units. Strains are unchanged.
    pub fn convert_response(&self, field: &ResponseField, target: &UnitSystem) -> ResponseField {
        ResponseField {
            point: self.convert_point(&field.point, target),
            vertical_displacement: self.length_to(field.vertical_displacement, target),
            radial_displacement: self.length_to(field.radial_displacement, target),
            stress: field.stress.scaled(self.stress_to(1.0, target)),
            ..*field
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Strain in millionths.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Microstrain(pub f64);

impl Microstrain {
    /// From a dimensionless strain.
    pub fn from_strain(strain: f64) -> Self {
        Microstrain(strain * 1e6)
    }

    /// Back to a dimensionless strain.
    pub fn to_strain(self) -> f64 {
        self.0 * 1e-6
    }
}

impl fmt::Display for Microstrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} µε", self.0)
    }
}

/// Dimensionless strain expressed in microstrain.
pub fn microstrain(strain: f64) -> f64 {
    Microstrain::from_strain(strain).0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::Interface;
    use crate::types::InterfaceSide;
    use approx::assert_relative_eq;

    #[test]
    fn test_length_and_stress_factors() {
        assert_relative_eq!(SI.length_to(1.0, &US_CUSTOMARY), 39.370_078_740_157_48, epsilon = 1e-10);
        assert_relative_eq!(US_CUSTOMARY.length_to(12.0, &SI), 0.3048, epsilon = 1e-15);
        assert_relative_eq!(PAVEMENT_METRIC.stress_to(1.0, &SI), 1e6, max_relative = 1e-15);
        assert_relative_eq!(US_CUSTOMARY.stress_to(1000.0, &US_CUSTOMARY_KSI), 1.0, max_relative = 1e-14);
        assert_relative_eq!(US_CUSTOMARY_KSI.stress_to(1.0, &SI), 6_894_757.293_168, max_relative = 1e-12);
    }

    #[test]
    fn test_round_trip_is_identity() {
        let x = 0.1125;
        let there = PAVEMENT_METRIC.length_to(x, &US_CUSTOMARY);
        assert_relative_eq!(US_CUSTOMARY.length_to(there, &PAVEMENT_METRIC), x, max_relative = 1e-15);
    }

    #[test]
    fn test_convert_stack_keeps_structure() {
        let stack = LayerStack::builder()
            .layer(5500.0, 0.35, 0.04)
            .frictionless()
            .half_space(50.0, 0.35)
            .build()
            .unwrap();
        let us = PAVEMENT_METRIC.convert_stack(&stack, &US_CUSTOMARY).unwrap();

        assert_eq!(us.n_layers(), 2);
        assert_eq!(us.interface(0), Some(Interface::Frictionless));
        assert_relative_eq!(us.layer(0).unwrap().thickness().unwrap(), 0.04 / 0.0254, max_relative = 1e-14);
        assert_relative_eq!(
            us.layer(1).unwrap().material().youngs_modulus,
            50.0e6 / PASCALS_PER_PSI,
            max_relative = 1e-14
        );
        assert!(us.layer(1).unwrap().is_half_space());
    }

    #[test]
    fn test_convert_load_and_point() {
        let load = LoadSpec::new(0.667, 0.1125).unwrap();
        let us = PAVEMENT_METRIC.convert_load(&load, &US_CUSTOMARY).unwrap();
        assert_relative_eq!(us.radius(), 4.429_133_858, max_relative = 1e-9);
        assert_relative_eq!(us.pressure(), 96.740_171, max_relative = 1e-7);

        let p = EvaluationPoint::new(0.0254, 0.254).on_side(InterfaceSide::Lower);
        let q = SI.convert_point(&p, &US_CUSTOMARY);
        assert_relative_eq!(q.radius, 1.0, max_relative = 1e-14);
        assert_relative_eq!(q.depth, 10.0, max_relative = 1e-14);
        assert_eq!(q.side, InterfaceSide::Lower);
    }

    #[test]
    fn test_microstrain() {
        assert_relative_eq!(microstrain(7.115e-4), 711.5, max_relative = 1e-14);
        let m = Microstrain::from_strain(2.5e-4);
        assert_relative_eq!(m.to_strain(), 2.5e-4, max_relative = 1e-15);
        assert_eq!(m.to_string(), "250.0 µε");
        assert_eq!(US_CUSTOMARY.to_string(), "in/psi");
    }
}
