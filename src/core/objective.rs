use bon::Builder;
use chrono::NaiveDate;

use crate::{
    core::{
        error::SimulatorError,
        schedule::{DepthPrecision, Schedule},
        simulator::{IrrigationManagement, Outcome, SimulationContext, Simulator},
    },
    quantity::{crop_yield::TonnesPerHectare, water::Millimetres},
};

/// Simulator wrapped into a scalar function of the depth vector.
///
/// Every call runs the simulator, there is no caching.
#[derive(Builder)]
pub struct Objective<'a> {
    simulator: &'a dyn Simulator,
    context: &'a SimulationContext<'a>,

    /// Provides the watering dates, its depths are ignored.
    template: &'a Schedule,

    /// Seasonal cap handed to the simulator.
    max_seasonal_irrigation: Millimetres,

    #[builder(default)]
    precision: DepthPrecision,
}

/// Evaluation-mode result.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub crop_yield: TonnesPerHectare,

    /// Irrigation the simulator actually applied.
    pub seasonal_irrigation: Millimetres,

    pub harvest_date: NaiveDate,
}

impl Objective<'_> {
    /// Schedule the simulator sees for the given depths.
    pub fn schedule(&self, depths: &[f64]) -> Schedule {
        self.template.with_depths(depths, self.precision)
    }

    /// Negated mean yield, so that minimizing it maximizes the yield.
    pub fn loss(&self, depths: &[f64]) -> Result<f64, SimulatorError> {
        Ok(-self.simulate(depths)?.mean_yield().0)
    }

    pub fn evaluate(&self, depths: &[f64]) -> Result<Evaluation, SimulatorError> {
        let outcome = self.simulate(depths)?;
        Ok(Evaluation {
            crop_yield: outcome.mean_yield(),
            seasonal_irrigation: outcome.mean_seasonal_irrigation(),
            harvest_date: outcome.harvest_date().ok_or(SimulatorError::NoSeason)?,
        })
    }

    fn simulate(&self, depths: &[f64]) -> Result<Outcome, SimulatorError> {
        let schedule = self.schedule(depths);
        let management = IrrigationManagement {
            schedule: &schedule,
            max_seasonal_irrigation: self.max_seasonal_irrigation,
        };
        self.simulator.simulate(&management, self.context)
    }
}
