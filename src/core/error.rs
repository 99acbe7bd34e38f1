use chrono::NaiveDate;

use crate::quantity::{area::SquareMetres, water::Litres};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by the search engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("end date {end} must be after start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid date `{value}`, expected `YYYY/MM/DD`")]
    InvalidDate {
        value: String,

        #[source]
        source: chrono::ParseError,
    },

    #[error("field size must be positive, got {0}")]
    InvalidFieldSize(SquareMetres),

    #[error("maximum water volume must be non-negative, got {0}")]
    InvalidWaterVolume(Litres),

    #[error("watering volume on {date} must be finite and non-negative, got {volume}")]
    InvalidVolume { date: NaiveDate, volume: Litres },

    #[error("more than one watering volume for {0}")]
    DuplicateDate(NaiveDate),

    #[error(transparent)]
    Simulator(#[from] SimulatorError),

    #[error("all {0} budget scenarios failed")]
    NoScenarios(usize),

    #[error("failed to build the worker pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Opaque failures of the crop simulator.
#[derive(Debug, thiserror::Error)]
pub enum SimulatorError {
    #[error("unknown crop `{0}`")]
    UnknownCrop(String),

    #[error("unknown soil `{0}`")]
    UnknownSoil(String),

    #[error("missing weather data for {0}")]
    MissingWeather(NaiveDate),

    #[error("the simulation produced no season")]
    NoSeason,
}
