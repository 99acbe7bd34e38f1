use bon::Builder;
use chrono::{Days, NaiveDate};
use itertools::Itertools;
use rand::Rng;
use rand_distr::{Distribution, Exp1};

use crate::{
    core::{
        error::{Error, Result},
        schedule::{Irrigation, Schedule},
    },
    quantity::water::Millimetres,
};

/// Average month length, in days.
const DAYS_PER_MONTH: f64 = 365.0 / 12.0;

/// Randomized initial schedules spread over the simulation window.
#[derive(Copy, Clone, Debug, Builder)]
pub struct ScheduleGenerator {
    start: NaiveDate,
    end: NaiveDate,

    /// Number of watering events per calendar month.
    #[builder(default = 4)]
    events_per_month: u32,
}

impl ScheduleGenerator {
    /// Generate a random schedule whose depths add up to the budget.
    ///
    /// The depths are a uniform Dirichlet split of the budget, so every call
    /// yields a different starting point.
    pub fn generate<R: Rng + ?Sized>(&self, budget: Millimetres, rng: &mut R) -> Result<Schedule> {
        let dates = self.watering_dates()?;
        let draws: Vec<f64> = (0..dates.len()).map(|_| Exp1.sample(rng)).collect();
        let total: f64 = draws.iter().sum();
        #[expect(clippy::cast_precision_loss)]
        let n_dates = dates.len() as f64;
        let events = dates
            .into_iter()
            .zip(draws)
            .map(|(date, draw)| {
                // Degenerate draw, fall back to an even split:
                let share = if total > 0.0 { draw / total } else { 1.0 / n_dates };
                Irrigation { date, depth: budget * share }
            })
            .collect();
        Ok(Schedule::new(events))
    }

    /// Watering dates evenly spread over the window, both ends included.
    ///
    /// A window shorter than the generation interval gets a single event at its start.
    pub fn watering_dates(&self) -> Result<Vec<NaiveDate>> {
        if self.end <= self.start {
            return Err(Error::InvalidRange { start: self.start, end: self.end });
        }
        let n_days = (self.end - self.start).num_days();

        #[expect(clippy::cast_precision_loss)]
        #[expect(clippy::cast_possible_truncation)]
        #[expect(clippy::cast_sign_loss)]
        let n_months = (n_days as f64 / DAYS_PER_MONTH).round() as u64;
        let n_events = (n_months * u64::from(self.events_per_month)).max(1);
        if n_events == 1 {
            return Ok(vec![self.start]);
        }

        #[expect(clippy::cast_precision_loss)]
        let spacing = n_days as f64 / (n_events - 1) as f64;
        Ok((0..n_events)
            .map(|index| {
                #[expect(clippy::cast_precision_loss)]
                #[expect(clippy::cast_possible_truncation)]
                #[expect(clippy::cast_sign_loss)]
                let offset = (index as f64 * spacing).round() as u64;
                self.start + Days::new(offset)
            })
            // Dense schedules over short windows land on the same day more than once:
            .dedup()
            .collect())
    }
}
