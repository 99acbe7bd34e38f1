mod maturity;
mod optimize;
mod search;
mod store;

use clap::{Parser, Subcommand};
use irrigo::prelude::*;

use crate::cli::{
    maturity::MaturityArgs,
    optimize::OptimizeArgs,
    store::{ListArgs, ShowArgs},
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: find the most water-efficient irrigation schedule.
    #[clap(name = "optimize")]
    Optimize(Box<OptimizeArgs>),

    /// Print the typical number of days from planting to maturity.
    #[clap(name = "maturity")]
    Maturity(MaturityArgs),

    /// Print a stored simulation.
    #[clap(name = "show")]
    Show(ShowArgs),

    /// List the stored simulations of an owner.
    #[clap(name = "list")]
    List(ListArgs),
}

impl Command {
    pub fn run(self) -> Result {
        match self {
            Self::Optimize(args) => args.run(),
            Self::Maturity(args) => args.run(),
            Self::Show(args) => args.run(),
            Self::List(args) => args.run(),
        }
    }
}
