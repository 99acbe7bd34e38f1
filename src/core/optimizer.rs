use std::num::NonZeroUsize;

use bon::Builder;
use rand::Rng;
use tracing::{debug, instrument, warn};

use crate::{
    core::{
        error::Result,
        generator::ScheduleGenerator,
        minimizer::{NelderMead, Problem},
        objective::Objective,
        schedule::{DepthPrecision, Schedule},
        simulator::{SimulationContext, Simulator},
    },
    quantity::water::Millimetres,
};

/// Optimizes the schedule for a single water budget.
#[derive(Builder)]
pub struct BudgetOptimizer<'a> {
    simulator: &'a dyn Simulator,
    context: &'a SimulationContext<'a>,
    generator: ScheduleGenerator,

    #[builder(default)]
    minimizer: NelderMead,

    /// Independent restarts, each from a fresh random schedule.
    #[builder(default = NonZeroUsize::MIN)]
    num_searches: NonZeroUsize,

    #[builder(default)]
    precision: DepthPrecision,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Optimized {
    pub budget: Millimetres,

    /// Final point written back into the template dates, as the simulator saw it.
    pub schedule: Schedule,

    /// Negated mean yield of the schedule.
    pub loss: f64,

    pub converged: bool,
}

impl BudgetOptimizer<'_> {
    /// Run the restarts and keep the one with the lowest loss.
    #[instrument(name = "Optimising…", fields(budget = %budget), skip_all)]
    pub fn optimize<R: Rng + ?Sized>(&self, budget: Millimetres, rng: &mut R) -> Result<Optimized> {
        let mut best = self.search(budget, rng)?;
        for restart in 1..self.num_searches.get() {
            let candidate = self.search(budget, rng)?;
            debug!(restart, loss = candidate.loss, best_loss = best.loss, "restart finished");
            // Strict comparison, the earlier restart wins on ties:
            if candidate.loss < best.loss {
                best = candidate;
            }
        }
        Ok(best)
    }

    fn search<R: Rng + ?Sized>(&self, budget: Millimetres, rng: &mut R) -> Result<Optimized> {
        let initial = self.generator.generate(budget, rng)?;
        let objective = Objective::builder()
            .simulator(self.simulator)
            .context(self.context)
            .template(&initial)
            .max_seasonal_irrigation(budget)
            .precision(self.precision)
            .build();
        let problem = Problem::uniform(initial.len(), 0.0, budget.0).with_max_sum(budget.0);
        let minimum =
            self.minimizer.minimize(|depths| objective.loss(depths), &initial.depths(), &problem)?;
        if !minimum.converged {
            warn!(
                %budget,
                n_iterations = minimum.n_iterations,
                n_evaluations = minimum.n_evaluations,
                "the minimizer did not converge, keeping its best point",
            );
        }
        Ok(Optimized {
            budget,
            schedule: objective.schedule(&minimum.point),
            loss: minimum.value,
            converged: minimum.converged,
        })
    }
}
