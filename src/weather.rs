use std::{collections::BTreeMap, fmt::Debug, fs::File, io::Read, path::Path};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    core::schedule::parse_date,
    prelude::*,
    quantity::{temperature::Celsius, water::Millimetres},
};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DailyWeather {
    pub min_temperature: Celsius,
    pub max_temperature: Celsius,
    pub precipitation: Millimetres,
    pub reference_evapotranspiration: Millimetres,
}

/// Daily weather series, loaded once and shared read-only by all simulations.
#[derive(Clone, Debug, Default)]
pub struct Weather(BTreeMap<NaiveDate, DailyWeather>);

impl Weather {
    #[instrument(skip_all, fields(path = ?path))]
    pub fn read_from<P: AsRef<Path> + Debug>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())
            .with_context(|| format!("failed to open `{}`", path.as_ref().display()))?;
        let weather = Self::from_reader(file)?;
        info!(n_days = weather.len(), first = ?weather.first_date(), last = ?weather.last_date(), "loaded");
        Ok(weather)
    }

    /// Read comma-separated daily records with a header row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut days = BTreeMap::new();
        for (index, record) in csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader)
            .into_deserialize::<Record>()
            .enumerate()
        {
            let record = record.with_context(|| format!("malformed weather record #{index}"))?;
            let date = parse_date(&record.date)?;
            record.validate().with_context(|| format!("invalid weather record for {date}"))?;
            let previous = days.insert(date, DailyWeather::from(record));
            ensure!(previous.is_none(), "duplicate weather record for {date}");
        }
        Ok(Self(days))
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DailyWeather> {
        self.0.get(&date)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.0.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.0.keys().next_back().copied()
    }
}

impl FromIterator<(NaiveDate, DailyWeather)> for Weather {
    fn from_iter<T: IntoIterator<Item = (NaiveDate, DailyWeather)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Deserialize)]
struct Record {
    date: String,
    min_temperature: Celsius,
    max_temperature: Celsius,
    precipitation: Millimetres,
    reference_evapotranspiration: Millimetres,
}

impl Record {
    fn validate(&self) -> Result {
        ensure!(
            self.min_temperature.is_finite() && self.max_temperature.is_finite(),
            "temperatures must be finite",
        );
        ensure!(
            self.min_temperature <= self.max_temperature,
            "minimum temperature exceeds maximum",
        );
        for (name, value) in [
            ("precipitation", self.precipitation),
            ("reference evapotranspiration", self.reference_evapotranspiration),
        ] {
            ensure!(
                value.is_finite() && value >= Millimetres::ZERO,
                "{name} must be finite and non-negative, got {value}",
            );
        }
        Ok(())
    }
}

impl From<Record> for DailyWeather {
    fn from(record: Record) -> Self {
        Self {
            min_temperature: record.min_temperature,
            max_temperature: record.max_temperature,
            precipitation: record.precipitation,
            reference_evapotranspiration: record.reference_evapotranspiration,
        }
    }
}
