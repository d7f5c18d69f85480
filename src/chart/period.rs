//! Calendar periods used to group chart points.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Bucketing granularity for a chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Period {
    #[default]
    Day,
    Week,
    Month,
    Year,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown period: {0:?}")]
pub struct ParsePeriodError(pub String);

/// Grouping key for a date under a period. Only meaningful for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketKey(String);

impl BucketKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Period {
    pub fn all() -> &'static [Period] {
        &[Period::Day, Period::Week, Period::Month, Period::Year]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Period::Day => "Day",
            Period::Week => "Week",
            Period::Month => "Month",
            Period::Year => "Year",
        }
    }

    /// Value used by the server-side period selector
    pub fn selector_value(&self) -> &'static str {
        match self {
            Period::Day => "jour",
            Period::Week => "semaine",
            Period::Month => "mois",
            Period::Year => "annee",
        }
    }

    /// Compute the bucket a date falls into.
    ///
    /// Weeks are ISO weeks keyed by their ISO week-year, so the days around
    /// New Year that belong to week 1 or week 53 stay together.
    pub fn bucket_key(&self, date: NaiveDate) -> BucketKey {
        let pattern = match self {
            Period::Day => "%Y-%m-%d",
            Period::Week => "%G-W%V",
            Period::Month => "%Y-%m",
            Period::Year => "%Y",
        };
        BucketKey(date.format(pattern).to_string())
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Period {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jour" | "day" => Ok(Period::Day),
            "semaine" | "week" => Ok(Period::Week),
            "mois" | "month" => Ok(Period::Month),
            "annee" | "année" | "year" => Ok(Period::Year),
            _ => Err(ParsePeriodError(s.to_string())),
        }
    }
}

/// Stored as the selector value, read back through [`FromStr`]
impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.selector_value())
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_selector_values() {
        assert_eq!("jour".parse::<Period>().unwrap(), Period::Day);
        assert_eq!("semaine".parse::<Period>().unwrap(), Period::Week);
        assert_eq!("mois".parse::<Period>().unwrap(), Period::Month);
        assert_eq!("annee".parse::<Period>().unwrap(), Period::Year);
        assert_eq!(" Month ".parse::<Period>().unwrap(), Period::Month);
        assert!("fortnight".parse::<Period>().is_err());
    }

    #[test]
    fn serde_uses_selector_values() {
        for period in Period::all() {
            let json = serde_json::to_string(period).unwrap();
            assert_eq!(json, format!("\"{}\"", period.selector_value()));
            assert_eq!(serde_json::from_str::<Period>(&json).unwrap(), *period);
        }
        assert_eq!(serde_json::from_str::<Period>("\"Week\"").unwrap(), Period::Week);
        assert!(serde_json::from_str::<Period>("\"hour\"").is_err());
    }

    #[test]
    fn week_keys_follow_iso_weeks() {
        // Monday 2020-05-18 and Sunday 2020-05-24 share ISO week 21
        assert_eq!(
            Period::Week.bucket_key(date(2020, 5, 18)),
            Period::Week.bucket_key(date(2020, 5, 24))
        );
        assert_ne!(
            Period::Week.bucket_key(date(2020, 5, 24)),
            Period::Week.bucket_key(date(2020, 5, 25))
        );
        // 2019-12-30 is in ISO week 1 of 2020
        assert_eq!(Period::Week.bucket_key(date(2019, 12, 30)).as_str(), "2020-W01");
        assert_ne!(
            Period::Week.bucket_key(date(2019, 12, 30)),
            Period::Week.bucket_key(date(2019, 1, 1))
        );
    }

    #[test]
    fn month_and_year_keys() {
        assert_eq!(Period::Month.bucket_key(date(2020, 5, 31)).as_str(), "2020-05");
        assert_ne!(
            Period::Month.bucket_key(date(2020, 5, 31)),
            Period::Month.bucket_key(date(2021, 5, 31))
        );
        assert_eq!(Period::Year.bucket_key(date(2020, 12, 31)).as_str(), "2020");
    }
}
