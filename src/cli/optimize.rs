use std::path::PathBuf;

use clap::Parser;
use irrigo::{
    core::{ScheduleRequest, find_best_schedule, schedule::parse_date, simulator::WaterBalance},
    prelude::*,
    quantity::{area::SquareMetres, water::Litres},
    record::{RecordStore, SimulationRecord},
    weather::Weather,
};

use crate::{
    cli::search::SearchArgs,
    tables::{build_schedule_table, build_sweep_table},
};

#[derive(Parser)]
pub struct OptimizeArgs {
    /// Planting date, `YYYY/MM/DD`.
    #[clap(long, env = "START_DATE")]
    start: String,

    /// Last day of the season, `YYYY/MM/DD`.
    #[clap(long, env = "END_DATE")]
    end: String,

    #[clap(long, env = "CROP")]
    crop: String,

    #[clap(long, default_value = "SandyLoam", env = "SOIL")]
    soil: String,

    /// Field size in square metres.
    #[clap(long = "field-size", env = "FIELD_SIZE")]
    field_size: SquareMetres,

    /// Water available for the whole season, in litres.
    #[clap(long = "max-water", env = "MAX_WATER")]
    max_water: Litres,

    /// Daily weather CSV.
    #[clap(long = "weather", env = "WEATHER_PATH")]
    weather_path: PathBuf,

    #[clap(flatten)]
    search: SearchArgs,

    /// Print the whole budget sweep.
    #[clap(long, short)]
    verbose: bool,

    /// Store the result into this directory.
    #[clap(long = "store", env = "IRRIGO_STORE")]
    store_path: Option<PathBuf>,

    /// Identifier of the stored result, a fresh one by default.
    #[clap(long, requires = "store_path")]
    id: Option<String>,

    /// Owner of the stored result.
    #[clap(long, env = "OWNER", requires = "store_path")]
    owner: Option<String>,

    /// Growth stage at the start date, only stored along with the result.
    #[clap(long, default_value = "0")]
    crop_stage: u32,
}

impl OptimizeArgs {
    pub fn run(self) -> Result {
        let weather = Weather::read_from(&self.weather_path)?;
        let request = ScheduleRequest::builder()
            .start_date(self.start.as_str())
            .end_date(self.end.as_str())
            .crop(self.crop.as_str())
            .soil(self.soil.as_str())
            .field_size(self.field_size)
            .max_water(self.max_water)
            .verbose(self.verbose)
            .options(self.search.into())
            .build();
        let best = find_best_schedule(&request, &WaterBalance, &weather)?;

        if self.verbose {
            println!("{}", build_sweep_table(&best.search));
        }
        println!("{}", build_schedule_table(&best.table, self.field_size));
        println!("Harvest: {}", best.harvest_date_string());

        if let Some(store_path) = self.store_path {
            let record = SimulationRecord::builder()
                .maybe_id(self.id)
                .maybe_owner(self.owner)
                .crop_type(self.crop)
                .crop_stage(self.crop_stage)
                .start_date(parse_date(&self.start)?)
                .end_date(parse_date(&self.end)?)
                .max_water(self.max_water)
                .field_size(self.field_size)
                .schedule(best.table)
                .harvest_date(best.harvest_date)
                .build();
            RecordStore::open(store_path)?.upsert(&record)?;
            println!("Stored: {}", record.id);
        }

        Ok(())
    }
}
