use crate::{
    core::{error::SimulatorError, simulator::crop::matches_name},
    quantity::water::Millimetres,
};

/// Soil texture class with its volumetric water contents, in m³/m³.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Soil {
    pub name: &'static str,
    pub field_capacity: f64,
    pub wilting_point: f64,
}

impl Soil {
    pub const CATALOGUE: [Self; 10] = [
        Self { name: "Sand", field_capacity: 0.10, wilting_point: 0.04 },
        Self { name: "LoamySand", field_capacity: 0.14, wilting_point: 0.06 },
        Self { name: "SandyLoam", field_capacity: 0.22, wilting_point: 0.10 },
        Self { name: "Loam", field_capacity: 0.31, wilting_point: 0.15 },
        Self { name: "SiltLoam", field_capacity: 0.33, wilting_point: 0.13 },
        Self { name: "SandyClayLoam", field_capacity: 0.32, wilting_point: 0.20 },
        Self { name: "ClayLoam", field_capacity: 0.39, wilting_point: 0.23 },
        Self { name: "SiltClayLoam", field_capacity: 0.44, wilting_point: 0.23 },
        Self { name: "SiltClay", field_capacity: 0.50, wilting_point: 0.32 },
        Self { name: "Clay", field_capacity: 0.54, wilting_point: 0.39 },
    ];

    pub fn from_name(name: &str) -> Result<Self, SimulatorError> {
        Self::CATALOGUE
            .into_iter()
            .find(|soil| matches_name(soil.name, name))
            .ok_or_else(|| SimulatorError::UnknownSoil(name.to_owned()))
    }

    /// Water held between field capacity and wilting point over the given depth, in metres.
    pub fn available_water(&self, depth: f64) -> Millimetres {
        Millimetres(1000.0 * (self.field_capacity - self.wilting_point) * depth)
    }
}
