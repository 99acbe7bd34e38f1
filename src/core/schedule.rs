use chrono::NaiveDate;

use crate::{
    core::error::{Error, Result},
    quantity::water::Millimetres,
};

/// Calendar date format exchanged with the outer layers.
pub const DATE_FORMAT: &str = "%Y/%m/%d";

/// Parse a `YYYY/MM/DD` date, also accepting ISO `YYYY-MM-DD`.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .map_err(|source| Error::InvalidDate { value: value.to_owned(), source })
}

/// Single watering event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Irrigation {
    pub date: NaiveDate,

    /// Water applied per unit of field area.
    pub depth: Millimetres,
}

/// Precision of the depths handed to the simulator.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DepthPrecision {
    /// Truncate towards zero to whole millimetres.
    ///
    /// Keeps the optimizer steps meaningful against the simulator granularity,
    /// at the cost of sub-millimetre resolution.
    #[default]
    WholeMillimetres,

    Exact,
}

impl DepthPrecision {
    pub fn apply(self, depth: Millimetres) -> Millimetres {
        match self {
            Self::WholeMillimetres => depth.trunc(),
            Self::Exact => depth,
        }
    }
}

/// Irrigation schedule: watering events with strictly increasing dates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[must_use]
pub struct Schedule(Vec<Irrigation>);

impl Schedule {
    pub fn new(events: Vec<Irrigation>) -> Self {
        debug_assert!(
            events.windows(2).all(|pair| pair[0].date < pair[1].date),
            "dates must be strictly increasing",
        );
        debug_assert!(
            events.iter().all(|event| event.depth.is_finite() && event.depth >= Millimetres::ZERO),
            "depths must be finite and non-negative",
        );
        Self(events)
    }

    pub const fn len(&self) -> usize {
        self.0.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Irrigation> {
        self.0.iter()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        self.0.iter().map(|event| event.date)
    }

    /// Raw depth vector, in millimetres, as seen by the optimizer.
    #[must_use]
    pub fn depths(&self) -> Vec<f64> {
        self.0.iter().map(|event| event.depth.0).collect()
    }

    pub fn total_depth(&self) -> Millimetres {
        self.0.iter().map(|event| event.depth).sum()
    }

    /// Build a new schedule with the same dates and the given depths.
    ///
    /// The template is left untouched, so concurrent evaluations may share it.
    /// Non-finite and negative depths are treated as no watering.
    pub fn with_depths(&self, depths: &[f64], precision: DepthPrecision) -> Self {
        debug_assert_eq!(depths.len(), self.0.len());
        Self(
            self.0
                .iter()
                .zip(depths)
                .map(|(event, depth)| {
                    let depth = if depth.is_finite() { depth.max(0.0) } else { 0.0 };
                    Irrigation { date: event.date, depth: precision.apply(Millimetres(depth)) }
                })
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = &'a Irrigation;
    type IntoIter = std::slice::Iter<'a, Irrigation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
