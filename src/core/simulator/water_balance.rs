use crate::{
    core::{
        error::SimulatorError,
        simulator::{IrrigationManagement, Outcome, Season, SimulationContext, Simulator},
    },
    quantity::{temperature::DegreeDays, water::Millimetres},
};

/// Single-season daily root-zone water balance.
///
/// Development follows the accumulated thermal time. Every day the root zone receives
/// rain and scheduled irrigation (up to the seasonal cap), loses whatever exceeds field
/// capacity, and gives up the crop evapotranspiration reduced by the water stress.
/// The yield follows the FAO-33 response to the relative evapotranspiration deficit,
/// scaled down when the window ends before maturity.
#[derive(Copy, Clone, Debug, Default)]
pub struct WaterBalance;

impl Simulator for WaterBalance {
    fn simulate(
        &self,
        management: &IrrigationManagement<'_>,
        context: &SimulationContext<'_>,
    ) -> Result<Outcome, SimulatorError> {
        let crop = &context.crop;
        let soil = &context.soil;

        let mut irrigations = management
            .schedule
            .iter()
            .filter(|irrigation| irrigation.date >= context.start)
            .peekable();
        let mut thermal_time = DegreeDays::ZERO;
        let mut progress = 0.0;
        let mut stored = soil.available_water(crop.root_depth.initial)
            * context.initial_water_content.clamp(0.0, 1.0);
        let mut applied = Millimetres::ZERO;
        let mut actual_total = Millimetres::ZERO;
        let mut potential_total = Millimetres::ZERO;
        let mut harvest_date = context.end;

        for date in context.start.iter_days().take_while(|date| *date <= context.end) {
            let day = context.weather.get(date).ok_or(SimulatorError::MissingWeather(date))?;
            thermal_time += crop.degree_days(day);
            progress = (thermal_time / crop.maturity).min(1.0);
            let capacity = soil.available_water(crop.rooting_depth(progress));

            while let Some(irrigation) = irrigations.next_if(|irrigation| irrigation.date <= date) {
                let remaining =
                    (management.max_seasonal_irrigation - applied).max(Millimetres::ZERO);
                let depth = irrigation.depth.min(remaining);
                applied += depth;
                stored += depth;
            }

            // Anything above field capacity drains away:
            stored = (stored + day.precipitation).min(capacity);

            let stress_threshold = capacity - capacity * crop.depletion_fraction;
            let stress = if stored >= stress_threshold { 1.0 } else { stored / stress_threshold };
            let potential = day.reference_evapotranspiration * crop.coefficient(progress);
            let actual = (potential * stress).min(stored);
            stored -= actual;
            actual_total += actual;
            potential_total += potential;

            if progress >= 1.0 {
                harvest_date = date;
                break;
            }
        }

        let relative_evapotranspiration =
            if potential_total > Millimetres::ZERO { actual_total / potential_total } else { 1.0 };
        let response =
            (1.0 - crop.yield_response_factor * (1.0 - relative_evapotranspiration)).max(0.0);
        Ok(Outcome {
            seasons: vec![Season {
                crop_yield: crop.potential_yield * (response * progress),
                seasonal_irrigation: applied,
                harvest_date,
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{
        core::{
            schedule::{Irrigation, Schedule},
            simulator::{Crop, Soil},
        },
        weather::{Weather, synthetic},
    };

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn weekly_schedule(depth: f64) -> Schedule {
        Schedule::new(
            date(1982, 5, 1)
                .iter_weeks()
                .take(30)
                .map(|date| Irrigation { date, depth: Millimetres(depth) })
                .collect(),
        )
    }

    fn simulate(weather: &Weather, schedule: &Schedule, cap: f64, end: NaiveDate) -> Season {
        let context = SimulationContext::builder()
            .crop(Crop::MAIZE)
            .soil(Soil::from_name("SandyLoam").unwrap())
            .start(date(1982, 5, 1))
            .end(end)
            .weather(weather)
            .build();
        let management =
            IrrigationManagement { schedule, max_seasonal_irrigation: Millimetres(cap) };
        WaterBalance.simulate(&management, &context).unwrap().seasons[0]
    }

    #[test]
    fn irrigation_increases_yield() {
        let weather = synthetic::climate(date(1982, 5, 1), date(1983, 6, 1));
        let end = date(1983, 6, 1);
        let dry = simulate(&weather, &Schedule::default(), 0.0, end);
        let irrigated = simulate(&weather, &weekly_schedule(20.0), 1000.0, end);
        assert!(dry.crop_yield > crate::quantity::crop_yield::TonnesPerHectare::ZERO);
        assert!(irrigated.crop_yield > dry.crop_yield, "{irrigated:?} vs {dry:?}");
        assert!(irrigated.crop_yield <= Crop::MAIZE.potential_yield);
    }

    #[test]
    fn seasonal_cap_is_honoured() {
        let weather = synthetic::climate(date(1982, 5, 1), date(1983, 6, 1));
        let season = simulate(&weather, &weekly_schedule(20.0), 100.0, date(1983, 6, 1));
        assert_eq!(season.seasonal_irrigation, Millimetres(100.0));
    }

    #[test]
    fn crop_matures_within_window() {
        let weather = synthetic::climate(date(1982, 5, 1), date(1983, 6, 1));
        let dry = simulate(&weather, &Schedule::default(), 0.0, date(1983, 6, 1));
        let irrigated = simulate(&weather, &weekly_schedule(20.0), 1000.0, date(1983, 6, 1));
        assert!(dry.harvest_date > date(1982, 5, 1));
        assert!(dry.harvest_date < date(1982, 12, 31));
        assert_eq!(dry.harvest_date, irrigated.harvest_date);
    }

    #[test]
    fn immature_crop_is_harvested_at_window_end() {
        let weather = synthetic::climate(date(1982, 5, 1), date(1983, 6, 1));
        let end = date(1982, 6, 1);
        let season = simulate(&weather, &weekly_schedule(20.0), 1000.0, end);
        assert_eq!(season.harvest_date, end);
        assert!(season.crop_yield < Crop::MAIZE.potential_yield * 0.5);
    }

    #[test]
    fn same_inputs_same_outcome() {
        let weather = synthetic::climate(date(1982, 5, 1), date(1983, 6, 1));
        let schedule = weekly_schedule(7.0);
        assert_eq!(
            simulate(&weather, &schedule, 150.0, date(1983, 6, 1)),
            simulate(&weather, &schedule, 150.0, date(1983, 6, 1)),
        );
    }

    #[test]
    fn missing_weather() {
        let weather = synthetic::climate(date(1982, 5, 1), date(1982, 6, 1));
        let context = SimulationContext::builder()
            .crop(Crop::MAIZE)
            .soil(Soil::from_name("SandyLoam").unwrap())
            .start(date(1982, 5, 1))
            .end(date(1983, 6, 1))
            .weather(&weather)
            .build();
        let schedule = Schedule::default();
        let management =
            IrrigationManagement { schedule: &schedule, max_seasonal_irrigation: Millimetres::ZERO };
        assert!(matches!(
            WaterBalance.simulate(&management, &context),
            Err(SimulatorError::MissingWeather(date)) if date == NaiveDate::from_ymd_opt(1982, 6, 2).unwrap(),
        ));
    }
}
