use std::num::NonZeroUsize;

use clap::Parser;
use irrigo::core::{SearchOptions, schedule::DepthPrecision};

#[derive(Copy, Clone, Parser)]
pub struct SearchArgs {
    /// Worker threads, defaults to the available parallelism.
    #[clap(long, env = "WORKERS")]
    workers: Option<NonZeroUsize>,

    /// Independent minimizer restarts per budget.
    #[clap(long, default_value = "1", env = "RESTARTS")]
    restarts: NonZeroUsize,

    #[clap(long, default_value = "4", env = "EVENTS_PER_MONTH")]
    events_per_month: u32,

    /// Fixed random seed for reproducible runs.
    #[clap(long, env = "SEED")]
    seed: Option<u64>,

    /// Minimizer iteration cap per restart, defaults to 200 per watering event.
    #[clap(long, env = "MAX_ITERATIONS")]
    max_iterations: Option<usize>,

    /// Pass fractional millimetres to the simulator instead of whole ones.
    #[clap(long = "no-truncate")]
    no_truncate: bool,
}

impl From<SearchArgs> for SearchOptions {
    fn from(args: SearchArgs) -> Self {
        Self::builder()
            .maybe_workers(args.workers)
            .num_searches(args.restarts)
            .events_per_month(args.events_per_month)
            .maybe_seed(args.seed)
            .maybe_max_iterations(args.max_iterations)
            .precision(if args.no_truncate {
                DepthPrecision::Exact
            } else {
                DepthPrecision::WholeMillimetres
            })
            .build()
    }
}
