//! Chart data types matching the server's JSON.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single day count: `{"x": "2020-05-18", "y": 15}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePoint {
    pub x: NaiveDate,
    pub y: u64,
}

impl TimePoint {
    pub fn new(x: NaiveDate, y: u64) -> Self {
        Self { x, y }
    }
}

/// A named, date-ascending sequence of points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub data: Vec<TimePoint>,
}

fn default_label() -> String {
    "Tweets".to_string()
}

impl Series {
    pub fn new(label: impl Into<String>, data: Vec<TimePoint>) -> Self {
        Self {
            label: label.into(),
            hidden: false,
            data,
        }
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.data.iter().map(|p| p.y).sum()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.data.first().map(|p| p.x)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.data.last().map(|p| p.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hashtag_series() {
        let json = r#"[{"label":"agriculture","hidden":false,"data":[{"x":"2020-05-18","y":15},{"x":"2020-05-19","y":366}]}]"#;
        let series: Vec<Series> = serde_json::from_str(json).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].label, "agriculture");
        assert_eq!(series[0].data[1].x, NaiveDate::from_ymd_opt(2020, 5, 19).unwrap());
        assert_eq!(series[0].total(), 381);
    }

    #[test]
    fn tweet_series_defaults_label_and_visibility() {
        let json = r#"{"data":[{"x":"2021-01-02","y":4}]}"#;
        let series: Series = serde_json::from_str(json).unwrap();
        assert_eq!(series.label, "Tweets");
        assert!(!series.hidden);
        assert_eq!(series.first_date(), series.last_date());
    }
}
