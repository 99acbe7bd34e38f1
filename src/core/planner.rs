use std::num::NonZeroUsize;

use bon::Builder;
use chrono::NaiveDate;
use tracing::{info, instrument};

use crate::{
    core::{
        coordinator::{SearchCoordinator, SearchOutcome},
        error::{Error, Result},
        minimizer::NelderMead,
        schedule::{DATE_FORMAT, DepthPrecision, parse_date},
        simulator::{Crop, SimulationContext, Simulator, Soil},
        table::ScheduleTable,
    },
    quantity::{area::SquareMetres, water::Litres},
    weather::Weather,
};

/// What the caller wants irrigated.
#[derive(Clone, Debug, Builder)]
pub struct ScheduleRequest {
    /// Planting date, `YYYY/MM/DD`.
    #[builder(into)]
    pub start_date: String,

    /// Last day of the season, `YYYY/MM/DD`.
    #[builder(into)]
    pub end_date: String,

    #[builder(into)]
    pub crop: String,

    #[builder(into, default = String::from("SandyLoam"))]
    pub soil: String,

    pub field_size: SquareMetres,

    /// Water available over the whole field and season.
    pub max_water: Litres,

    /// Log every scenario of the sweep.
    #[builder(default)]
    pub verbose: bool,

    #[builder(default)]
    pub options: SearchOptions,
}

/// Search tuning.
#[derive(Copy, Clone, Debug, Builder)]
pub struct SearchOptions {
    /// Defaults to the available parallelism.
    pub workers: Option<NonZeroUsize>,

    #[builder(default = NonZeroUsize::MIN)]
    pub num_searches: NonZeroUsize,

    #[builder(default = 4)]
    pub events_per_month: u32,

    /// Random seed when `None`.
    pub seed: Option<u64>,

    #[builder(default)]
    pub precision: DepthPrecision,

    /// Per-restart minimizer iteration cap, defaults to `200` per watering event.
    pub max_iterations: Option<usize>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Clone, Debug)]
pub struct BestSchedule {
    pub table: ScheduleTable,
    pub harvest_date: NaiveDate,

    /// The whole sweep, for reporting.
    pub search: SearchOutcome,
}

impl BestSchedule {
    /// Harvest date as exchanged with the outer layers.
    #[must_use]
    pub fn harvest_date_string(&self) -> String {
        self.harvest_date.format(DATE_FORMAT).to_string()
    }
}

/// Find the most water-efficient irrigation schedule for the request.
#[instrument(
    name = "Finding the best schedule…",
    fields(crop = %request.crop, start = %request.start_date, end = %request.end_date),
    skip_all,
)]
pub fn find_best_schedule(
    request: &ScheduleRequest,
    simulator: &dyn Simulator,
    weather: &Weather,
) -> Result<BestSchedule> {
    let start = parse_date(&request.start_date)?;
    let end = parse_date(&request.end_date)?;
    if end <= start {
        return Err(Error::InvalidRange { start, end });
    }

    let context = SimulationContext::builder()
        .crop(Crop::from_name(&request.crop)?)
        .soil(Soil::from_name(&request.soil)?)
        .start(start)
        .end(end)
        .weather(weather)
        .build();
    let options = &request.options;
    let search = SearchCoordinator::builder()
        .simulator(simulator)
        .context(&context)
        .maybe_workers(options.workers)
        .num_searches(options.num_searches)
        .events_per_month(options.events_per_month)
        .precision(options.precision)
        .minimizer(NelderMead::builder().maybe_max_iterations(options.max_iterations).build())
        .maybe_seed(options.seed)
        .build()
        .search(request.field_size, request.max_water)?;

    if request.verbose {
        for scenario in search.scenarios() {
            info!(
                budget = %scenario.budget,
                crop_yield = %scenario.evaluation.crop_yield,
                irrigation = %scenario.evaluation.seasonal_irrigation,
                score = scenario.score(),
                converged = scenario.converged,
                "scenario",
            );
        }
    }

    let winner = search.winner();
    let table = ScheduleTable::from_schedule(&winner.schedule, request.field_size);
    let harvest_date = winner.evaluation.harvest_date;
    info!(n_days = table.len(), total = %table.total_volume(), %harvest_date, "done");
    Ok(BestSchedule { table, harvest_date, search })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{error::SimulatorError, simulator::WaterBalance},
        quantity::water::Millimetres,
        weather::synthetic,
    };

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn request(max_water: f64) -> ScheduleRequest {
        ScheduleRequest::builder()
            .start_date("1982/05/01")
            .end_date("1983/06/01")
            .crop("Maize")
            .field_size(SquareMetres(1.0))
            .max_water(Litres(max_water))
            .options(
                SearchOptions::builder()
                    .workers(NonZeroUsize::new(2).unwrap())
                    .events_per_month(1)
                    .seed(42)
                    .max_iterations(40)
                    .build(),
            )
            .build()
    }

    fn weather() -> Weather {
        synthetic::climate(date(1982, 5, 1), date(1983, 6, 1))
    }

    #[test]
    fn maize_with_water() {
        let best = find_best_schedule(&request(500.0), &WaterBalance, &weather()).unwrap();
        assert!(!best.table.is_empty());
        assert!(best.table.rows().iter().all(|row| row.volume > Litres::ZERO));
        assert!(best.table.total_volume() <= Litres(500.0));
        assert!(best.harvest_date > date(1982, 5, 1));
        assert!(best.harvest_date <= date(1983, 6, 1));
        assert_eq!(best.search.scenarios().len(), 8);
    }

    #[test]
    fn no_water_gives_empty_table() {
        let best = find_best_schedule(&request(0.0), &WaterBalance, &weather()).unwrap();
        assert!(best.table.is_empty());
        assert_eq!(best.search.winner().budget, Millimetres::ZERO);
        assert!(best.harvest_date > date(1982, 5, 1));
    }

    #[test]
    fn same_seed_same_schedule() {
        let first = find_best_schedule(&request(300.0), &WaterBalance, &weather()).unwrap();
        let second = find_best_schedule(&request(300.0), &WaterBalance, &weather()).unwrap();
        assert_eq!(first.table, second.table);
        assert_eq!(first.harvest_date_string(), second.harvest_date_string());
    }

    #[test]
    fn invalid_requests() {
        let weather = weather();
        let mut request = request(100.0);

        request.end_date = "1982/04/01".to_owned();
        assert!(matches!(
            find_best_schedule(&request, &WaterBalance, &weather),
            Err(Error::InvalidRange { .. }),
        ));

        request.end_date = "next summer".to_owned();
        assert!(matches!(
            find_best_schedule(&request, &WaterBalance, &weather),
            Err(Error::InvalidDate { .. }),
        ));

        request.end_date = "1983/06/01".to_owned();
        request.crop = "Banana".to_owned();
        assert!(matches!(
            find_best_schedule(&request, &WaterBalance, &weather),
            Err(Error::Simulator(SimulatorError::UnknownCrop(_))),
        ));

        request.crop = "Maize".to_owned();
        request.field_size = SquareMetres::ZERO;
        assert!(matches!(
            find_best_schedule(&request, &WaterBalance, &weather),
            Err(Error::InvalidFieldSize(_)),
        ));
    }
}
