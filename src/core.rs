//! Search engine: random initial schedules, per-budget optimization, and the budget sweep.

pub mod coordinator;
pub mod error;
pub mod generator;
pub mod minimizer;
pub mod objective;
pub mod optimizer;
pub mod planner;
pub mod schedule;
pub mod simulator;
pub mod table;

pub use self::{
    error::{Error, Result, SimulatorError},
    planner::{BestSchedule, ScheduleRequest, SearchOptions, find_best_schedule},
};
