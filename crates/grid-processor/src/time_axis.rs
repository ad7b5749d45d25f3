//! Decoding of CF-style time coordinates (`"<unit> since <datetime>"`).

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chunk_store::ChunkedArrayStore;
use geo_common::DatasetLocator;

use crate::error::{GridError, Result};

/// Unit of a time coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    fn parse(unit: &str) -> Option<Self> {
        match unit.to_ascii_lowercase().as_str() {
            "seconds" | "second" | "secs" | "sec" | "s" => Some(TimeUnit::Seconds),
            "minutes" | "minute" | "mins" | "min" => Some(TimeUnit::Minutes),
            "hours" | "hour" | "hrs" | "hr" | "h" => Some(TimeUnit::Hours),
            "days" | "day" | "d" => Some(TimeUnit::Days),
            _ => None,
        }
    }

    fn milliseconds(&self) -> f64 {
        match self {
            TimeUnit::Seconds => 1_000.0,
            TimeUnit::Minutes => 60_000.0,
            TimeUnit::Hours => 3_600_000.0,
            TimeUnit::Days => 86_400_000.0,
        }
    }
}

/// Parsed `units` attribute of a time coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeUnits {
    pub unit: TimeUnit,
    pub epoch: DateTime<Utc>,
}

impl TimeUnits {
    pub fn parse(units: &str) -> Result<Self> {
        let (unit, reference) = units
            .split_once(" since ")
            .ok_or_else(|| GridError::invalid_time(format!("'{}' has no reference date", units)))?;
        let unit = TimeUnit::parse(unit.trim())
            .ok_or_else(|| GridError::invalid_time(format!("unknown time unit '{}'", unit.trim())))?;
        Ok(Self {
            unit,
            epoch: parse_reference(reference.trim())?,
        })
    }

    pub fn decode(&self, value: f64) -> Result<DateTime<Utc>> {
        if !value.is_finite() {
            return Err(GridError::invalid_time(format!("non-finite time value {}", value)));
        }
        let out_of_range = || GridError::invalid_time(format!("time value {} out of range", value));
        // the cast saturates, so fill-sized values land on an out-of-range offset
        let offset = Duration::try_milliseconds((value * self.unit.milliseconds()).round() as i64)
            .ok_or_else(out_of_range)?;
        self.epoch.checked_add_signed(offset).ok_or_else(out_of_range)
    }
}

fn parse_reference(text: &str) -> Result<DateTime<Utc>> {
    let text = text
        .trim_end_matches('Z')
        .trim_end_matches(" UTC")
        .trim_end_matches("+00:00")
        .trim();

    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| GridError::invalid_time(format!("unparseable reference date '{}'", text)))
}

fn check_calendar(calendar: Option<&str>) -> Result<()> {
    match calendar.map(str::to_ascii_lowercase).as_deref() {
        None | Some("standard") | Some("gregorian") | Some("proleptic_gregorian") => Ok(()),
        Some(other) => Err(GridError::invalid_time(format!("unsupported calendar '{}'", other))),
    }
}

/// Decode raw time coordinate values.
pub fn decode_time_values(
    values: &[f64],
    units: &str,
    calendar: Option<&str>,
) -> Result<Vec<DateTime<Utc>>> {
    check_calendar(calendar)?;
    let units = TimeUnits::parse(units)?;
    values.iter().map(|&v| units.decode(v)).collect()
}

/// Read and decode a whole time variable using its `units` and `calendar` attributes.
pub async fn read_time_axis(
    store: &ChunkedArrayStore,
    locator: &DatasetLocator,
    name: &str,
) -> Result<Vec<DateTime<Utc>>> {
    let variable = store.resolve_variable(locator, name).await?;
    let units = variable
        .units()
        .ok_or_else(|| GridError::invalid_time(format!("{} has no units", name)))?
        .to_string();
    let calendar = variable.attribute_str("calendar").map(String::from);

    let values = store.read_all(locator, name).await?;
    decode_time_values(&values.to_f64(), &units, calendar.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_decode_days_since() {
        let times = decode_time_values(&[0.0, 31.0, 59.5], "days since 2000-01-01", None).unwrap();
        assert_eq!(times, vec![utc(2000, 1, 1, 0), utc(2000, 2, 1, 0), utc(2000, 2, 29, 12)]);
    }

    #[test]
    fn test_decode_hours_since_with_time_of_day() {
        let times =
            decode_time_values(&[6.0], "hours since 1970-01-01 00:00:00", Some("gregorian")).unwrap();
        assert_eq!(times, vec![utc(1970, 1, 1, 6)]);

        let iso = decode_time_values(&[90.0], "minutes since 2020-05-01T12:00:00Z", None).unwrap();
        assert_eq!(iso, vec![utc(2020, 5, 1, 13) + Duration::minutes(30)]);
    }

    #[test]
    fn test_rejects_bad_units_and_calendars() {
        assert!(matches!(
            decode_time_values(&[0.0], "days", None),
            Err(GridError::InvalidTime(_))
        ));
        assert!(decode_time_values(&[0.0], "fortnights since 2000-01-01", None).is_err());
        assert!(decode_time_values(&[0.0], "days since 2000-01-01", Some("360_day")).is_err());
        assert!(decode_time_values(&[f64::NAN], "days since 2000-01-01", None).is_err());
    }

    #[test]
    fn test_fill_sized_offsets_are_errors() {
        for value in [-9.99e33, 9.99e33, 1e20] {
            assert!(matches!(
                decode_time_values(&[value], "days since 2000-01-01", None),
                Err(GridError::InvalidTime(_))
            ));
        }
        assert!(matches!(
            decode_time_values(&[0.0, -9.99e33], "seconds since 1970-01-01", None),
            Err(GridError::InvalidTime(_))
        ));
    }
}
