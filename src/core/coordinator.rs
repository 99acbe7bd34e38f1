use std::{num::NonZeroUsize, thread::available_parallelism, time::Instant};

use bon::Builder;
use rand::{SeedableRng, rngs::StdRng};
use rayon::{ThreadPoolBuilder, prelude::*};
use tracing::{info, instrument, warn};

use crate::{
    core::{
        error::{Error, Result},
        generator::ScheduleGenerator,
        minimizer::NelderMead,
        objective::{Evaluation, Objective},
        optimizer::BudgetOptimizer,
        schedule::{DepthPrecision, Schedule},
        simulator::{SimulationContext, Simulator},
    },
    quantity::{
        area::SquareMetres,
        crop_yield::TonnesPerHectare,
        water::{Litres, Millimetres},
    },
};

/// Budgets above this are not worth exploring.
pub const MAX_BUDGET: Millimetres = Millimetres(500.0);

/// Minimal number of budget scenarios, regardless of the worker count.
pub const MIN_SCENARIOS: usize = 8;

/// Evenly spaced budgets from zero to `min(500 mm, max_depth)`, truncated to whole millimetres.
///
/// There are `max(8, n_workers)` budgets. Small maximums produce duplicates, which are kept.
#[must_use]
pub fn budget_sweep(max_depth: Millimetres, n_workers: usize) -> Vec<Millimetres> {
    let n_scenarios = n_workers.max(MIN_SCENARIOS);
    let top = max_depth.min(MAX_BUDGET).max(Millimetres::ZERO);
    #[expect(clippy::cast_precision_loss)]
    let last = (n_scenarios - 1) as f64;
    (0..n_scenarios)
        .map(|index| {
            #[expect(clippy::cast_precision_loss)]
            let index = index as f64;
            Millimetres((top.0 * index / last).floor())
        })
        .collect()
}

/// Water used per unit of squared yield, lower is better.
#[must_use]
pub fn score(budget: Millimetres, crop_yield: TonnesPerHectare) -> f64 {
    budget.0 / crop_yield.0.powi(2)
}

/// Index of the scenario with the lowest score.
///
/// Zero scores (no water) and non-finite scores (no yield) never win. The first one wins on ties.
/// Returns `None` when no scenario is eligible.
pub fn select_winner(
    scenarios: impl IntoIterator<Item = (Millimetres, TonnesPerHectare)>,
) -> Option<usize> {
    scenarios
        .into_iter()
        .map(|(budget, crop_yield)| score(budget, crop_yield))
        .enumerate()
        .filter(|(_, score)| score.is_finite() && *score > 0.0)
        .min_by(|(_, lhs), (_, rhs)| lhs.total_cmp(rhs))
        .map(|(index, _)| index)
}

/// Fans the budget scenarios out over a worker pool and picks the most water-efficient one.
#[derive(Builder)]
pub struct SearchCoordinator<'a> {
    simulator: &'a dyn Simulator,
    context: &'a SimulationContext<'a>,

    /// Worker threads, also the minimal number of scenarios above eight.
    #[builder(default = available_parallelism().unwrap_or(NonZeroUsize::MIN))]
    workers: NonZeroUsize,

    /// Restarts per scenario.
    #[builder(default = NonZeroUsize::MIN)]
    num_searches: NonZeroUsize,

    #[builder(default = 4)]
    events_per_month: u32,

    #[builder(default)]
    precision: DepthPrecision,

    #[builder(default)]
    minimizer: NelderMead,

    /// Base seed: scenario `i` draws from `seed + i`, a fixed seed reproduces the search.
    seed: Option<u64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScenarioResult {
    pub budget: Millimetres,
    pub schedule: Schedule,
    pub evaluation: Evaluation,
    pub converged: bool,
}

impl ScenarioResult {
    #[must_use]
    pub fn score(&self) -> f64 {
        score(self.budget, self.evaluation.crop_yield)
    }
}

/// Successful scenarios, in the sweep order, and the selected one.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchOutcome {
    scenarios: Vec<ScenarioResult>,
    winner: usize,
}

impl SearchOutcome {
    #[must_use]
    pub fn scenarios(&self) -> &[ScenarioResult] {
        &self.scenarios
    }

    #[must_use]
    pub fn winner(&self) -> &ScenarioResult {
        &self.scenarios[self.winner]
    }

    #[must_use]
    pub const fn winner_index(&self) -> usize {
        self.winner
    }
}

impl SearchCoordinator<'_> {
    #[instrument(
        name = "Searching…",
        fields(field_size = %field_size, max_water = %max_water, workers = self.workers.get()),
        skip_all,
    )]
    pub fn search(&self, field_size: SquareMetres, max_water: Litres) -> Result<SearchOutcome> {
        if !(field_size.0.is_finite() && field_size.0 > 0.0) {
            return Err(Error::InvalidFieldSize(field_size));
        }
        if !(max_water.0.is_finite() && max_water.0 >= 0.0) {
            return Err(Error::InvalidWaterVolume(max_water));
        }

        let generator = ScheduleGenerator::builder()
            .start(self.context.start)
            .end(self.context.end)
            .events_per_month(self.events_per_month)
            .build();
        let n_events = generator.watering_dates()?.len();

        let budgets = budget_sweep(max_water / field_size, self.workers.get());
        let seed = self.seed.unwrap_or_else(rand::random);
        info!(n_scenarios = budgets.len(), n_events, seed, "built the budget sweep");

        let pool = ThreadPoolBuilder::new().num_threads(self.workers.get()).build()?;
        let start_time = Instant::now();
        let results: Vec<Result<ScenarioResult>> = pool.install(|| {
            budgets
                .par_iter()
                .enumerate()
                .map(|(index, budget)| self.run_scenario(&generator, index, *budget, seed))
                .collect()
        });

        let n_scenarios = results.len();
        let scenarios: Vec<ScenarioResult> = results
            .into_iter()
            .zip(&budgets)
            .filter_map(|(result, budget)| {
                result.inspect_err(|error| warn!(%budget, %error, "scenario failed")).ok()
            })
            .collect();
        if scenarios.is_empty() {
            return Err(Error::NoScenarios(n_scenarios));
        }

        // Nothing eligible means no water or no yield anywhere, fall back to the first scenario:
        let winner = select_winner(
            scenarios.iter().map(|scenario| (scenario.budget, scenario.evaluation.crop_yield)),
        )
        .unwrap_or(0);
        let best = &scenarios[winner];
        info!(
            n_succeeded = scenarios.len(),
            budget = %best.budget,
            crop_yield = %best.evaluation.crop_yield,
            elapsed = ?start_time.elapsed(),
            "selected the winner",
        );
        Ok(SearchOutcome { scenarios, winner })
    }

    fn run_scenario(
        &self,
        generator: &ScheduleGenerator,
        index: usize,
        budget: Millimetres,
        seed: u64,
    ) -> Result<ScenarioResult> {
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(index as u64));
        let optimized = BudgetOptimizer::builder()
            .simulator(self.simulator)
            .context(self.context)
            .generator(*generator)
            .minimizer(self.minimizer)
            .num_searches(self.num_searches)
            .precision(self.precision)
            .build()
            .optimize(budget, &mut rng)?;
        let evaluation = Objective::builder()
            .simulator(self.simulator)
            .context(self.context)
            .template(&optimized.schedule)
            .max_seasonal_irrigation(budget)
            .precision(self.precision)
            .build()
            .evaluate(&optimized.schedule.depths())?;
        info!(
            index,
            %budget,
            crop_yield = %evaluation.crop_yield,
            irrigation = %evaluation.seasonal_irrigation,
            converged = optimized.converged,
            "scenario finished",
        );
        Ok(ScenarioResult {
            budget,
            schedule: optimized.schedule,
            evaluation,
            converged: optimized.converged,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{
        core::simulator::{
            Crop, Soil,
            stub::{ByBudget, Concave},
        },
        weather::Weather,
    };

    fn context(weather: &Weather) -> SimulationContext<'_> {
        SimulationContext::builder()
            .crop(Crop::MAIZE)
            .soil(Soil::from_name("SandyLoam").unwrap())
            .start(NaiveDate::from_ymd_opt(2016, 5, 1).unwrap())
            .end(NaiveDate::from_ymd_opt(2016, 7, 1).unwrap())
            .weather(weather)
            .build()
    }

    fn coordinator<'a>(
        simulator: &'a dyn Simulator,
        context: &'a SimulationContext<'a>,
        workers: usize,
    ) -> SearchCoordinator<'a> {
        SearchCoordinator::builder()
            .simulator(simulator)
            .context(context)
            .workers(NonZeroUsize::new(workers).unwrap())
            .events_per_month(2)
            .minimizer(NelderMead::builder().max_iterations(10).build())
            .seed(42)
            .build()
    }

    #[test]
    fn sweep() {
        assert_eq!(
            budget_sweep(Millimetres(70.0), 4),
            [0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0].map(Millimetres),
        );
        assert_eq!(
            budget_sweep(Millimetres(10_000.0), 1),
            [0.0, 71.0, 142.0, 214.0, 285.0, 357.0, 428.0, 500.0].map(Millimetres),
        );
        assert_eq!(budget_sweep(Millimetres(3.0), 1).len(), 8);
        assert_eq!(budget_sweep(Millimetres(100.0), 16).len(), 16);
        assert!(budget_sweep(Millimetres::ZERO, 8).iter().all(|budget| *budget == Millimetres::ZERO));
    }

    #[test]
    fn winner_never_has_zero_yield() {
        let scenarios = [
            (Millimetres(0.0), TonnesPerHectare(2.0)),
            (Millimetres(10.0), TonnesPerHectare(0.0)),
            (Millimetres(20.0), TonnesPerHectare(4.0)),
            (Millimetres(30.0), TonnesPerHectare(5.0)),
        ];
        assert_eq!(select_winner(scenarios), Some(3));
    }

    #[test]
    fn first_wins_on_ties() {
        let scenarios = [
            (Millimetres(10.0), TonnesPerHectare(1.0)),
            (Millimetres(40.0), TonnesPerHectare(2.0)),
            (Millimetres(90.0), TonnesPerHectare(3.0)),
        ];
        assert_eq!(select_winner(scenarios), Some(0));
    }

    #[test]
    fn nothing_eligible() {
        let scenarios = [
            (Millimetres(0.0), TonnesPerHectare(2.0)),
            (Millimetres(10.0), TonnesPerHectare(0.0)),
        ];
        assert_eq!(select_winner(scenarios), None);
    }

    #[test]
    fn picks_the_most_efficient_budget() {
        // Yield saturates, so the smallest non-zero budget has the lowest score:
        let simulator = ByBudget(|budget| Some(1.0 + budget.min(10.0)));
        let weather = Weather::default();
        let context = context(&weather);
        let outcome = coordinator(&simulator, &context, 2)
            .search(SquareMetres(10.0), Litres(700.0))
            .unwrap();
        assert_eq!(outcome.scenarios().len(), 8);
        assert_eq!(outcome.winner().budget, Millimetres(10.0));
        assert_eq!(outcome.winner_index(), 1);
    }

    #[test]
    fn failed_scenarios_are_excluded() {
        let simulator = ByBudget(|budget| (budget < 25.0).then_some(1.0 + budget));
        let weather = Weather::default();
        let context = context(&weather);
        let outcome = coordinator(&simulator, &context, 2)
            .search(SquareMetres(10.0), Litres(700.0))
            .unwrap();
        let budgets: Vec<_> = outcome.scenarios().iter().map(|scenario| scenario.budget).collect();
        assert_eq!(budgets, [0.0, 10.0, 20.0].map(Millimetres));
    }

    #[test]
    fn all_scenarios_failed() {
        let simulator = ByBudget(|_| None);
        let weather = Weather::default();
        let context = context(&weather);
        let result = coordinator(&simulator, &context, 2).search(SquareMetres(10.0), Litres(700.0));
        assert!(matches!(result, Err(Error::NoScenarios(8))));
    }

    #[test]
    fn no_water_falls_back_to_dry_scenario() {
        let weather = Weather::default();
        let context = context(&weather);
        let outcome =
            coordinator(&Concave, &context, 2).search(SquareMetres(10.0), Litres::ZERO).unwrap();
        assert_eq!(outcome.winner_index(), 0);
        assert_eq!(outcome.winner().schedule.total_depth(), Millimetres::ZERO);
    }

    #[test]
    fn scenarios_report_non_convergence() {
        let weather = Weather::default();
        let context = context(&weather);
        let outcome = SearchCoordinator::builder()
            .simulator(&Concave)
            .context(&context)
            .workers(NonZeroUsize::new(2).unwrap())
            .events_per_month(2)
            .minimizer(NelderMead::builder().max_iterations(1).build())
            .seed(42)
            .build()
            .search(SquareMetres(10.0), Litres(700.0))
            .unwrap();
        let scenarios = outcome.scenarios();
        assert_eq!(scenarios.len(), 8);

        // Nothing to search for without water:
        assert!(scenarios[0].converged);
        assert!(scenarios[1..].iter().all(|scenario| !scenario.converged));
    }

    #[test]
    fn invalid_inputs() {
        let weather = Weather::default();
        let context = context(&weather);
        let coordinator = coordinator(&Concave, &context, 1);
        assert!(matches!(
            coordinator.search(SquareMetres::ZERO, Litres(1.0)),
            Err(Error::InvalidFieldSize(_)),
        ));
        assert!(matches!(
            coordinator.search(SquareMetres(1.0), Litres(-1.0)),
            Err(Error::InvalidWaterVolume(_)),
        ));
    }

    #[test]
    fn fixed_seed_is_reproducible_across_pool_sizes() {
        let weather = Weather::default();
        let context = context(&weather);
        let sequential =
            coordinator(&Concave, &context, 1).search(SquareMetres(2.0), Litres(200.0)).unwrap();
        let parallel =
            coordinator(&Concave, &context, 4).search(SquareMetres(2.0), Litres(200.0)).unwrap();
        assert_eq!(sequential, parallel);
    }
}
