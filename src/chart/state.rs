//! Chart state owned by the dashboard: original data, active period, visibility.

use super::bucket::rebucket_all;
use super::period::Period;
use super::types::Series;
use chrono::{Datelike, NaiveDate};
use std::collections::HashSet;

/// Which chart a state drives. Hashtag drill-downs also carry the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Tweets,
    Hashtags,
}

impl ChartKind {
    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::Tweets => "Tweet volume",
            ChartKind::Hashtags => "Hashtag frequency",
        }
    }
}

pub struct ChartState {
    kind: ChartKind,
    /// Data as received from the server, never re-bucketed in place
    original: Vec<Series>,
    /// Data bucketed under `period`, what the plot draws
    displayed: Vec<Series>,
    period: Period,
    hidden: HashSet<String>,
    result_path: Option<String>,
}

impl ChartState {
    pub fn new(kind: ChartKind, series: Vec<Series>, period: Period) -> Self {
        let hidden = series
            .iter()
            .filter(|s| s.hidden)
            .map(|s| s.label.clone())
            .collect();
        let mut state = Self {
            kind,
            original: series,
            displayed: Vec::new(),
            period,
            hidden,
            result_path: None,
        };
        state.recompute();
        state
    }

    /// Base URL of the result page opened when a point is clicked
    pub fn with_result_path(mut self, path: impl Into<String>) -> Self {
        self.result_path = Some(path.into());
        self
    }

    pub fn kind(&self) -> ChartKind {
        self.kind
    }

    pub fn set_period(&mut self, period: Period) {
        if self.period != period {
            self.period = period;
            self.recompute();
        }
    }

    /// Series under the active period, with visibility applied
    pub fn series(&self) -> &[Series] {
        &self.displayed
    }

    #[cfg(test)]
    pub fn original(&self) -> &[Series] {
        &self.original
    }

    pub fn is_empty(&self) -> bool {
        self.original.iter().all(|s| s.data.is_empty())
    }

    pub fn is_hidden(&self, label: &str) -> bool {
        self.hidden.contains(label)
    }

    /// Show or hide one series. Returns false for an unknown label.
    pub fn set_hidden(&mut self, label: &str, hidden: bool) -> bool {
        if !self.original.iter().any(|s| s.label == label) {
            return false;
        }
        if hidden {
            self.hidden.insert(label.to_string());
        } else {
            self.hidden.remove(label);
        }
        self.apply_visibility();
        true
    }

    pub fn set_all_hidden(&mut self, hidden: bool) {
        if hidden {
            self.hidden = self.original.iter().map(|s| s.label.clone()).collect();
        } else {
            self.hidden.clear();
        }
        self.apply_visibility();
    }

    /// X-axis bounds: first and last date of the first series
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.original.first()?;
        Some((first.first_date()?, first.last_date()?))
    }

    /// Result page link for a displayed point
    pub fn drilldown_url(&self, series_index: usize, point_index: usize) -> Option<String> {
        let base = self.result_path.as_ref()?;
        let series = self.displayed.get(series_index)?;
        let point = series.data.get(point_index)?;
        let mut url = format!("{}?date={}", base, point.x.format("%Y-%m-%d"));
        if self.kind == ChartKind::Hashtags {
            url.push_str("&hashtag=");
            url.push_str(&urlencoding::encode(&series.label));
        }
        Some(url)
    }

    /// Nearest visible point to a plot coordinate.
    ///
    /// `scale` is the visible plot extent on each axis; distances are compared
    /// in that normalized space and must be under `max_distance`.
    pub fn nearest_point(
        &self,
        coord: [f64; 2],
        scale: [f64; 2],
        max_distance: f64,
    ) -> Option<(usize, usize)> {
        let sx = if scale[0] > 0.0 { scale[0] } else { 1.0 };
        let sy = if scale[1] > 0.0 { scale[1] } else { 1.0 };
        let mut best: Option<((usize, usize), f64)> = None;

        for (si, series) in self.displayed.iter().enumerate() {
            if series.hidden {
                continue;
            }
            for (pi, point) in series.data.iter().enumerate() {
                let dx = (date_to_plot_x(point.x) - coord[0]) / sx;
                let dy = (point.y as f64 - coord[1]) / sy;
                let distance = (dx * dx + dy * dy).sqrt();
                if distance <= max_distance && best.map_or(true, |(_, d)| distance < d) {
                    best = Some(((si, pi), distance));
                }
            }
        }

        best.map(|(idx, _)| idx)
    }

    fn recompute(&mut self) {
        self.displayed = rebucket_all(&self.original, self.period);
        self.apply_visibility();
    }

    fn apply_visibility(&mut self) {
        for series in &mut self.displayed {
            series.hidden = self.hidden.contains(&series.label);
        }
    }
}

/// Plot x coordinate for a date (days since the common era)
pub fn date_to_plot_x(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

/// Inverse of [`date_to_plot_x`], rounding to the nearest day
pub fn plot_x_to_date(x: f64) -> Option<NaiveDate> {
    if !x.is_finite() || x.abs() > i32::MAX as f64 {
        return None;
    }
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::types::TimePoint;

    fn point(m: u32, d: u32, y: u64) -> TimePoint {
        TimePoint::new(NaiveDate::from_ymd_opt(2020, m, d).unwrap(), y)
    }

    fn hashtags() -> Vec<Series> {
        vec![
            Series::new("agriculture", vec![point(5, 18, 15), point(5, 19, 366), point(6, 1, 4)]),
            Series::new("climat", vec![point(5, 18, 2), point(6, 3, 9)]),
        ]
    }

    #[test]
    fn period_changes_recompute_from_original() {
        let mut chart = ChartState::new(ChartKind::Hashtags, hashtags(), Period::Day);
        chart.set_period(Period::Month);
        assert_eq!(chart.series()[0].data, vec![point(5, 18, 381), point(6, 1, 4)]);

        // Going through a coarser period must not compound
        chart.set_period(Period::Year);
        chart.set_period(Period::Month);
        assert_eq!(chart.series()[0].data, vec![point(5, 18, 381), point(6, 1, 4)]);

        chart.set_period(Period::Day);
        assert_eq!(chart.series(), chart.original());
    }

    #[test]
    fn hidden_series_survive_period_changes() {
        let mut chart = ChartState::new(ChartKind::Hashtags, hashtags(), Period::Day);
        assert!(chart.set_hidden("climat", true));
        chart.set_period(Period::Week);
        assert!(chart.series()[1].hidden);
        assert!(!chart.series()[0].hidden);

        assert!(!chart.set_hidden("unknown", true));

        chart.set_all_hidden(true);
        assert!(chart.series().iter().all(|s| s.hidden));
        chart.set_all_hidden(false);
        assert!(chart.series().iter().all(|s| !s.hidden));
    }

    #[test]
    fn server_hidden_flags_seed_visibility() {
        let mut series = hashtags();
        series[0].hidden = true;
        let chart = ChartState::new(ChartKind::Hashtags, series, Period::Month);
        assert!(chart.is_hidden("agriculture"));
        assert!(chart.series()[0].hidden);
    }

    #[test]
    fn bounds_come_from_first_series() {
        let chart = ChartState::new(ChartKind::Hashtags, hashtags(), Period::Day);
        assert_eq!(
            chart.bounds(),
            Some((
                NaiveDate::from_ymd_opt(2020, 5, 18).unwrap(),
                NaiveDate::from_ymd_opt(2020, 6, 1).unwrap()
            ))
        );
        let empty = ChartState::new(ChartKind::Tweets, vec![], Period::Day);
        assert_eq!(empty.bounds(), None);
        assert!(empty.is_empty());
    }

    #[test]
    fn drilldown_links() {
        let chart = ChartState::new(ChartKind::Hashtags, vec![Series::new("santé publique", vec![point(5, 18, 1)])], Period::Day)
            .with_result_path("http://localhost/projets/p/resultat_hashtags");
        assert_eq!(
            chart.drilldown_url(0, 0).unwrap(),
            "http://localhost/projets/p/resultat_hashtags?date=2020-05-18&hashtag=sant%C3%A9%20publique"
        );
        assert_eq!(chart.drilldown_url(0, 5), None);

        let tweets = ChartState::new(ChartKind::Tweets, vec![Series::new("Tweets", vec![point(5, 18, 1)])], Period::Day)
            .with_result_path("/projets/p/resultat");
        assert_eq!(tweets.drilldown_url(0, 0).unwrap(), "/projets/p/resultat?date=2020-05-18");

        let no_path = ChartState::new(ChartKind::Tweets, vec![Series::new("Tweets", vec![point(5, 18, 1)])], Period::Day);
        assert_eq!(no_path.drilldown_url(0, 0), None);
    }

    #[test]
    fn nearest_point_skips_hidden_series() {
        let mut chart = ChartState::new(ChartKind::Hashtags, hashtags(), Period::Day);
        let x = date_to_plot_x(NaiveDate::from_ymd_opt(2020, 5, 18).unwrap());
        assert_eq!(chart.nearest_point([x, 3.0], [30.0, 400.0], 0.05), Some((1, 0)));

        chart.set_hidden("climat", true);
        assert_eq!(chart.nearest_point([x, 3.0], [30.0, 400.0], 0.05), Some((0, 0)));
        assert_eq!(chart.nearest_point([x + 10.0, 300.0], [30.0, 400.0], 0.05), None);
    }

    #[test]
    fn plot_x_round_trips_dates() {
        let d = NaiveDate::from_ymd_opt(2023, 2, 28).unwrap();
        assert_eq!(plot_x_to_date(date_to_plot_x(d)), Some(d));
        assert_eq!(plot_x_to_date(f64::NAN), None);
    }
}
