//! Keyword collection form: keywords, networks, post limit and date range.

use crate::api::{CollectRequest, Source};
use crate::notify::Level;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};

/// Posts per keyword and network when the limit is left at zero
pub const DEFAULT_LIMIT: usize = 10;

/// Twitter rejects an end time closer to now than this
const END_MARGIN_SECS: i64 = 30;

/// Twitter recent search only reaches this far back
const RECENT_SEARCH_DAYS: i64 = 7;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Server calls made from the collect tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectAction {
    Start,
    Delete,
    Update,
}

impl CollectAction {
    pub fn label(&self) -> &'static str {
        match self {
            CollectAction::Start => "Start collection",
            CollectAction::Delete => "Delete collected data",
            CollectAction::Update => "Update data",
        }
    }

    pub fn busy_label(&self) -> &'static str {
        match self {
            CollectAction::Start => "Collecting…",
            CollectAction::Delete => "Deleting…",
            CollectAction::Update => "Updating…",
        }
    }

    /// Question asked before running, for actions that need one
    pub fn confirmation(&self) -> Option<&'static str> {
        match self {
            CollectAction::Start => None,
            CollectAction::Delete => {
                Some("Delete all collected data? This cannot be undone.")
            }
            CollectAction::Update => {
                Some("Update all data? This can take several minutes.")
            }
        }
    }
}

/// Why a collect action could not start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectBlocked {
    Busy,
    NoName,
    NoKeywords,
    NoNetwork,
    InvalidDate,
    StartAfterEnd,
}

impl CollectBlocked {
    pub fn level(&self) -> Level {
        match self {
            CollectBlocked::Busy | CollectBlocked::NoNetwork => Level::Warning,
            _ => Level::Error,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            CollectBlocked::Busy => "A collection request is already running",
            CollectBlocked::NoName => "Enter a name for the collection",
            CollectBlocked::NoKeywords => "Add at least one keyword",
            CollectBlocked::NoNetwork => "Select at least one network",
            CollectBlocked::InvalidDate => "Dates must be written YYYY-MM-DD",
            CollectBlocked::StartAfterEnd => "The start date must be before the end date",
        }
    }
}

#[derive(Debug)]
pub struct CollectForm {
    pub name: String,
    keywords: Vec<String>,
    /// Keyword being typed
    pub keyword_input: String,
    pub twitter: bool,
    pub bluesky: bool,
    pub limit: usize,
    /// `YYYY-MM-DD`, empty for no bound
    pub start_date: String,
    pub end_date: String,
    running: Option<CollectAction>,
}

impl Default for CollectForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            keywords: Vec::new(),
            keyword_input: String::new(),
            twitter: false,
            bluesky: false,
            limit: DEFAULT_LIMIT,
            start_date: String::new(),
            end_date: String::new(),
            running: None,
        }
    }
}

impl CollectForm {
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn running(&self) -> Option<CollectAction> {
        self.running
    }

    pub fn is_busy(&self) -> bool {
        self.running.is_some()
    }

    /// Move the typed keyword into the list. Blank and repeated keywords are
    /// ignored and stay in the input.
    pub fn add_keyword(&mut self) -> bool {
        let keyword = self.keyword_input.trim();
        if keyword.is_empty() || self.keywords.iter().any(|k| k == keyword) {
            return false;
        }
        self.keywords.push(keyword.to_string());
        self.keyword_input.clear();
        true
    }

    pub fn remove_keyword(&mut self, keyword: &str) {
        self.keywords.retain(|k| k != keyword);
    }

    pub fn networks(&self) -> Vec<Source> {
        let mut networks = Vec::new();
        if self.twitter {
            networks.push(Source::Twitter);
        }
        if self.bluesky {
            networks.push(Source::Bluesky);
        }
        networks
    }

    /// Once a start date is set, an empty end date defaults to today
    pub fn fill_end_date(&mut self, today: NaiveDate) {
        if !self.start_date.trim().is_empty() && self.end_date.trim().is_empty() {
            self.end_date = today.format(DATE_FORMAT).to_string();
        }
    }

    /// Twitter collection reaching further back than recent search allows
    pub fn needs_full_archive(&self, now: DateTime<Utc>) -> bool {
        match parse_date(&self.start_date) {
            Ok(Some(start)) => {
                self.twitter && start_of_day(start) < now - Duration::days(RECENT_SEARCH_DAYS)
            }
            _ => false,
        }
    }

    /// Mark a delete or update as running
    pub fn begin(&mut self, action: CollectAction) -> Result<(), CollectBlocked> {
        if self.is_busy() {
            return Err(CollectBlocked::Busy);
        }
        self.running = Some(action);
        Ok(())
    }

    /// Check the form, mark the collection as running and build the request
    pub fn begin_start(&mut self, now: DateTime<Utc>) -> Result<CollectRequest, CollectBlocked> {
        if self.is_busy() {
            return Err(CollectBlocked::Busy);
        }
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CollectBlocked::NoName);
        }
        if self.keywords.is_empty() {
            return Err(CollectBlocked::NoKeywords);
        }
        let networks = self.networks();
        if networks.is_empty() {
            return Err(CollectBlocked::NoNetwork);
        }
        let start = parse_date(&self.start_date)?;
        let end = parse_date(&self.end_date)?;
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(CollectBlocked::StartAfterEnd);
            }
        }

        let limit = if self.limit == 0 { DEFAULT_LIMIT } else { self.limit };
        let request = CollectRequest {
            name: name.to_string(),
            keywords: self.keywords.clone(),
            networks,
            limit: Some(limit),
            start_date: start.map(|d| to_iso(start_of_day(d))),
            end_date: end.map(|d| to_iso(end_time(d, now))),
            target_schema: None,
        };
        self.running = Some(CollectAction::Start);
        Ok(request)
    }

    /// Server answered. A successful collection clears the form.
    pub fn finish(&mut self, success: bool) {
        let finished = self.running.take();
        if success && finished == Some(CollectAction::Start) {
            *self = Self::default();
        }
    }
}

fn parse_date(raw: &str) -> Result<Option<NaiveDate>, CollectBlocked> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map(Some)
        .map_err(|_| CollectBlocked::InvalidDate)
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Last second of `date`, kept at least 30 s in the past
fn end_time(date: NaiveDate, now: DateTime<Utc>) -> DateTime<Utc> {
    let end = start_of_day(date) + Duration::days(1) - Duration::seconds(1);
    end.min(now - Duration::seconds(END_MARGIN_SECS))
}

fn to_iso(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}
