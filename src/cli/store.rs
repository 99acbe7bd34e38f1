use std::path::PathBuf;

use clap::Parser;
use irrigo::{prelude::*, record::RecordStore};

use crate::tables::{build_record_table, build_schedule_table};

#[derive(Parser)]
pub struct StoreArgs {
    /// Directory with the stored simulations.
    #[clap(long = "store", env = "IRRIGO_STORE")]
    path: PathBuf,
}

impl StoreArgs {
    pub fn open(&self) -> Result<RecordStore> {
        RecordStore::open(&self.path)
    }
}

#[derive(Parser)]
pub struct ShowArgs {
    #[clap(flatten)]
    store: StoreArgs,

    /// Simulation identifier.
    id: String,
}

impl ShowArgs {
    pub fn run(self) -> Result {
        let record = self
            .store
            .open()?
            .get(&self.id)?
            .with_context(|| format!("simulation `{}` is not found", self.id))?;
        println!("{}", build_record_table(&record));
        println!("{}", build_schedule_table(&record.schedule, record.field_size));
        Ok(())
    }
}

#[derive(Parser)]
pub struct ListArgs {
    #[clap(flatten)]
    store: StoreArgs,

    #[clap(long, env = "OWNER")]
    owner: String,
}

impl ListArgs {
    pub fn run(self) -> Result {
        let records = self.store.open()?.list_by_owner(&self.owner)?;
        info!(n_records = records.len(), "found");
        for record in &records {
            println!("{}", build_record_table(record));
        }
        Ok(())
    }
}
