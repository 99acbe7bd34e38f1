//! Boundary of the crop-growth simulator.
//!
//! The engine treats the simulator as an opaque, pure function of the irrigation management
//! and the simulation context. Everything it needs is passed explicitly: there is no ambient
//! weather or configuration state.

mod crop;
mod soil;
mod water_balance;

use bon::Builder;
use chrono::NaiveDate;

pub use self::{
    crop::{Crop, CropCoefficients, GrowthStages, RootDepth},
    soil::Soil,
    water_balance::WaterBalance,
};
use crate::{
    core::{error::SimulatorError, schedule::Schedule},
    quantity::{crop_yield::TonnesPerHectare, water::Millimetres},
    weather::Weather,
};

pub trait Simulator: Sync {
    fn simulate(
        &self,
        management: &IrrigationManagement<'_>,
        context: &SimulationContext<'_>,
    ) -> Result<Outcome, SimulatorError>;
}

/// Immutable crop, soil, window and weather context, shared by every evaluation.
#[derive(Builder)]
pub struct SimulationContext<'a> {
    pub crop: Crop,
    pub soil: Soil,

    /// Planting date and simulation start.
    pub start: NaiveDate,

    /// Last simulated day, unless the crop matures earlier.
    pub end: NaiveDate,

    /// Initial root-zone water content as a fraction of the available water, `0` is wilting point.
    #[builder(default = 0.0)]
    pub initial_water_content: f64,

    pub weather: &'a Weather,
}

/// Scheduled irrigation with a cap on the seasonal total.
#[derive(Copy, Clone)]
pub struct IrrigationManagement<'a> {
    pub schedule: &'a Schedule,

    /// The simulator never applies more than this over a season.
    pub max_seasonal_irrigation: Millimetres,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Season {
    pub crop_yield: TonnesPerHectare,

    /// Irrigation actually applied, after the seasonal cap.
    pub seasonal_irrigation: Millimetres,

    pub harvest_date: NaiveDate,
}

/// Simulation results, one entry per simulated season.
#[derive(Clone, Debug, Default, PartialEq)]
#[must_use]
pub struct Outcome {
    pub seasons: Vec<Season>,
}

impl Outcome {
    pub fn mean_yield(&self) -> TonnesPerHectare {
        self.mean(|season| season.crop_yield.0).map_or(TonnesPerHectare::ZERO, TonnesPerHectare)
    }

    pub fn mean_seasonal_irrigation(&self) -> Millimetres {
        self.mean(|season| season.seasonal_irrigation.0).map_or(Millimetres::ZERO, Millimetres)
    }

    /// Harvest date of the last season.
    #[must_use]
    pub fn harvest_date(&self) -> Option<NaiveDate> {
        self.seasons.last().map(|season| season.harvest_date)
    }

    fn mean(&self, value: impl Fn(&Season) -> f64) -> Option<f64> {
        if self.seasons.is_empty() {
            return None;
        }
        #[expect(clippy::cast_precision_loss)]
        let n_seasons = self.seasons.len() as f64;
        Some(self.seasons.iter().map(value).sum::<f64>() / n_seasons)
    }
}
