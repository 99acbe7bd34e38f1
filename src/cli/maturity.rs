use clap::Parser;
use irrigo::{core::simulator::Crop, prelude::*};

#[derive(Parser)]
pub struct MaturityArgs {
    /// Crop name, for example `Maize`.
    crop: String,
}

impl MaturityArgs {
    pub fn run(self) -> Result {
        let crop = Crop::from_name(&self.crop)?;
        info!(crop = crop.name, thermal_time = %crop.maturity, "found");
        println!("{}", crop.maturity_days);
        Ok(())
    }
}
