use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    core::{
        error::Error,
        schedule::{DATE_FORMAT, Irrigation, Schedule, parse_date},
    },
    quantity::{area::SquareMetres, water::Litres},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ScheduleRow {
    pub date: NaiveDate,
    pub volume: Litres,
}

/// Watering volumes over the whole field, only the days that actually get water.
///
/// Serializes as an object mapping `YYYY/MM/DD` dates to litres.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Litres>", into = "BTreeMap<String, Litres>")]
#[must_use]
pub struct ScheduleTable(Vec<ScheduleRow>);

impl ScheduleTable {
    pub fn from_schedule(schedule: &Schedule, field_size: SquareMetres) -> Self {
        Self(
            schedule
                .iter()
                .map(|irrigation| ScheduleRow {
                    date: irrigation.date,
                    volume: irrigation.depth * field_size,
                })
                .filter(|row| row.volume > Litres::ZERO)
                .collect(),
        )
    }

    #[must_use]
    pub fn rows(&self) -> &[ScheduleRow] {
        &self.0
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total_volume(&self) -> Litres {
        self.0.iter().map(|row| row.volume).sum()
    }

    /// Convert back into per-area depths.
    pub fn to_schedule(&self, field_size: SquareMetres) -> Schedule {
        Schedule::new(
            self.0
                .iter()
                .map(|row| Irrigation { date: row.date, depth: row.volume / field_size })
                .collect(),
        )
    }
}

impl From<ScheduleTable> for BTreeMap<String, Litres> {
    fn from(table: ScheduleTable) -> Self {
        table
            .0
            .into_iter()
            .map(|row| (row.date.format(DATE_FORMAT).to_string(), row.volume))
            .collect()
    }
}

impl TryFrom<BTreeMap<String, Litres>> for ScheduleTable {
    type Error = Error;

    /// Zero volumes are dropped, like in [`ScheduleTable::from_schedule`].
    fn try_from(map: BTreeMap<String, Litres>) -> Result<Self, Self::Error> {
        let mut volumes = BTreeMap::new();
        for (date, volume) in map {
            let date = parse_date(&date)?;
            if !(volume.is_finite() && volume >= Litres::ZERO) {
                return Err(Error::InvalidVolume { date, volume });
            }
            // `1982/05/03` and `1982-05-03` are the same day:
            if volumes.insert(date, volume).is_some() {
                return Err(Error::DuplicateDate(date));
            }
        }
        Ok(Self(
            volumes
                .into_iter()
                .filter(|(_, volume)| *volume > Litres::ZERO)
                .map(|(date, volume)| ScheduleRow { date, volume })
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::quantity::water::Millimetres;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn schedule() -> Schedule {
        Schedule::new(vec![
            Irrigation { date: date(1982, 5, 1), depth: Millimetres(12.0) },
            Irrigation { date: date(1982, 5, 8), depth: Millimetres::ZERO },
            Irrigation { date: date(1982, 5, 15), depth: Millimetres(3.0) },
        ])
    }

    #[test]
    fn zero_days_are_dropped() {
        let table = ScheduleTable::from_schedule(&schedule(), SquareMetres(2.5));
        assert_eq!(
            table.rows(),
            [
                ScheduleRow { date: date(1982, 5, 1), volume: Litres(30.0) },
                ScheduleRow { date: date(1982, 5, 15), volume: Litres(7.5) },
            ],
        );
        assert_eq!(table.total_volume(), Litres(37.5));
    }

    #[test]
    fn dry_schedule_gives_empty_table() {
        let schedule =
            Schedule::new(vec![Irrigation { date: date(1982, 5, 1), depth: Millimetres::ZERO }]);
        let table = ScheduleTable::from_schedule(&schedule, SquareMetres(100.0));
        assert!(table.is_empty());
        assert_eq!(serde_json::to_string(&table).unwrap(), "{}");
    }

    #[test]
    fn back_to_depths() {
        let table = ScheduleTable::from_schedule(&schedule(), SquareMetres(2.5));
        let depths = table.to_schedule(SquareMetres(2.5)).depths();
        assert_eq!(depths.len(), 2);
        assert_abs_diff_eq!(depths[0], 12.0);
        assert_abs_diff_eq!(depths[1], 3.0);
    }

    #[test]
    fn json_is_a_date_map() {
        let table = ScheduleTable::from_schedule(&schedule(), SquareMetres(2.0));
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"{"1982/05/01":24.0,"1982/05/15":6.0}"#);
        assert_eq!(serde_json::from_str::<ScheduleTable>(&json).unwrap(), table);
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(serde_json::from_str::<ScheduleTable>(r#"{"first of May":1.0}"#).is_err());
    }

    #[test]
    fn deserialized_zero_days_are_dropped() {
        let table: ScheduleTable =
            serde_json::from_str(r#"{"1982/05/01":0.0,"1982/05/03":2.0}"#).unwrap();
        assert_eq!(table.rows(), [ScheduleRow { date: date(1982, 5, 3), volume: Litres(2.0) }]);
        assert_eq!(table.to_schedule(SquareMetres(1.0)).depths(), vec![2.0]);
    }

    #[test]
    fn rejects_negative_volumes() {
        let result = serde_json::from_str::<ScheduleTable>(r#"{"1982/05/02":-3.0}"#);
        assert!(result.is_err());

        let map = BTreeMap::from([("1982/05/02".to_owned(), Litres(-3.0))]);
        assert!(matches!(
            ScheduleTable::try_from(map),
            Err(Error::InvalidVolume { volume, .. }) if volume == Litres(-3.0),
        ));
    }

    #[test]
    fn rejects_non_finite_volumes() {
        let map = BTreeMap::from([("1982/05/02".to_owned(), Litres(f64::NAN))]);
        assert!(matches!(ScheduleTable::try_from(map), Err(Error::InvalidVolume { .. })));

        let map = BTreeMap::from([("1982/05/02".to_owned(), Litres(f64::INFINITY))]);
        assert!(matches!(ScheduleTable::try_from(map), Err(Error::InvalidVolume { .. })));
    }

    #[test]
    fn rejects_same_day_twice() {
        let json = r#"{"1982-05-03":1.0,"1982/05/03":2.0}"#;
        assert!(serde_json::from_str::<ScheduleTable>(json).is_err());

        let map = BTreeMap::from([
            ("1982-05-03".to_owned(), Litres(1.0)),
            ("1982/05/03".to_owned(), Litres(2.0)),
        ]);
        assert!(matches!(
            ScheduleTable::try_from(map),
            Err(Error::DuplicateDate(duplicate)) if duplicate == date(1982, 5, 3),
        ));
    }
}
