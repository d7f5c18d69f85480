//! CSV import form state: file validation, busy flags and the import timeout.

use crate::api::{AnalyzeResponse, CsvAnalysis, ImportMode, ImportRequest, Source};
use crate::notify::Level;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// The import flag is released after this long without a response
pub const IMPORT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

impl SelectedFile {
    pub fn new(path: PathBuf, size: u64) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name, size }
    }

    /// Read the size from disk
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let meta = std::fs::metadata(path)?;
        Ok(Self::new(path.to_path_buf(), meta.len()))
    }

    pub fn is_csv(&self) -> bool {
        self.name.to_lowercase().ends_with(".csv")
    }
}

/// Result of offering files to the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    /// An analysis or import is running
    Busy,
    NoValidFiles,
    TooManyForSingle,
    /// Names of files above [`MAX_FILE_SIZE`]
    Oversized(Vec<String>),
    /// Files kept; the first one should be analysed
    Accepted,
}

/// Why an import could not start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportBlocked {
    AlreadyImporting,
    /// The current analysis is not back yet
    Analyzing,
    NoFiles,
    NotAnalyzed,
    NoSource,
    NoName,
}

impl ImportBlocked {
    pub fn level(&self) -> Level {
        match self {
            ImportBlocked::AlreadyImporting
            | ImportBlocked::Analyzing
            | ImportBlocked::NoSource => Level::Warning,
            _ => Level::Error,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ImportBlocked::AlreadyImporting => "An import is already running",
            ImportBlocked::Analyzing => "Wait for the file analysis to finish",
            ImportBlocked::NoFiles => "Select at least one CSV file",
            ImportBlocked::NotAnalyzed => "Analyse a CSV file first",
            ImportBlocked::NoSource => "Select a source (Twitter or Bluesky)",
            ImportBlocked::NoName => "Enter a name for the import",
        }
    }
}

#[derive(Debug, Default)]
pub struct ImportForm {
    mode: ImportMode,
    files: Vec<SelectedFile>,
    pub name: String,
    pub source: Option<Source>,
    schema_name: Option<String>,
    analysis: Option<CsvAnalysis>,
    is_analyzing: bool,
    is_importing: bool,
    import_started_at: Option<Instant>,
}

impl ImportForm {
    pub fn mode(&self) -> ImportMode {
        self.mode
    }

    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    pub fn analysis(&self) -> Option<&CsvAnalysis> {
        self.analysis.as_ref()
    }

    pub fn schema_name(&self) -> Option<&str> {
        self.schema_name.as_deref()
    }

    pub fn is_analyzing(&self) -> bool {
        self.is_analyzing
    }

    pub fn is_importing(&self) -> bool {
        self.is_importing
    }

    pub fn is_busy(&self) -> bool {
        self.is_analyzing || self.is_importing
    }

    /// Switch between single and multiple files. Clears the selection.
    pub fn set_mode(&mut self, mode: ImportMode) -> bool {
        if self.is_busy() || self.mode == mode {
            return false;
        }
        self.mode = mode;
        self.files.clear();
        self.clear_analysis();
        true
    }

    /// Replace the selection with `candidates`, keeping only CSV files
    pub fn select_files(&mut self, candidates: Vec<SelectedFile>) -> SelectOutcome {
        if self.is_busy() {
            return SelectOutcome::Busy;
        }

        let valid: Vec<SelectedFile> = candidates.into_iter().filter(|f| f.is_csv()).collect();
        if valid.is_empty() {
            return SelectOutcome::NoValidFiles;
        }
        if self.mode == ImportMode::Single && valid.len() > 1 {
            return SelectOutcome::TooManyForSingle;
        }
        let oversized: Vec<String> = valid
            .iter()
            .filter(|f| f.size > MAX_FILE_SIZE)
            .map(|f| f.name.clone())
            .collect();
        if !oversized.is_empty() {
            return SelectOutcome::Oversized(oversized);
        }

        if self.mode == ImportMode::Single {
            self.name = import_name_from_file(&valid[0].name);
        }
        self.files = valid;
        // The previous analysis described other files
        self.clear_analysis();
        SelectOutcome::Accepted
    }

    /// Drop one file. Returns the outcome of re-offering the rest, `None`
    /// when the form is busy or the selection became empty.
    pub fn remove_file(&mut self, name: &str) -> Option<SelectOutcome> {
        if self.is_busy() {
            return None;
        }
        let remaining: Vec<SelectedFile> = self
            .files
            .iter()
            .filter(|f| f.name != name)
            .cloned()
            .collect();
        if remaining.is_empty() {
            self.files.clear();
            self.name.clear();
            self.clear_analysis();
            return None;
        }
        Some(self.select_files(remaining))
    }

    /// Mark analysis as running and return what to send. `None` if one is running.
    pub fn begin_analysis(&mut self) -> Option<(Vec<PathBuf>, ImportMode)> {
        if self.is_analyzing {
            return None;
        }
        let first = self.files.first()?;
        self.is_analyzing = true;
        Some((vec![first.path.clone()], self.mode))
    }

    pub fn finish_analysis(&mut self, result: Result<AnalyzeResponse, String>) -> Result<(), String> {
        self.is_analyzing = false;
        match result {
            Ok(resp) => {
                self.schema_name = Some(resp.schema_name);
                self.analysis = Some(resp.analysis);
                Ok(())
            }
            Err(e) => {
                self.clear_analysis();
                Err(e)
            }
        }
    }

    /// Check preconditions, set the busy flag and build the request
    pub fn begin_import(&mut self, now: Instant) -> Result<ImportRequest, ImportBlocked> {
        if self.is_importing {
            return Err(ImportBlocked::AlreadyImporting);
        }
        if self.is_analyzing {
            return Err(ImportBlocked::Analyzing);
        }
        if self.files.is_empty() {
            return Err(ImportBlocked::NoFiles);
        }
        let (Some(schema_name), Some(analysis)) = (&self.schema_name, &self.analysis) else {
            return Err(ImportBlocked::NotAnalyzed);
        };
        let Some(source) = self.source else {
            return Err(ImportBlocked::NoSource);
        };
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ImportBlocked::NoName);
        }

        let request = ImportRequest {
            files: self.files.iter().map(|f| f.path.clone()).collect(),
            mode: self.mode,
            schema_name: schema_name.clone(),
            source,
            name: name.to_string(),
            analysis: analysis.clone(),
        };
        self.is_importing = true;
        self.import_started_at = Some(now);
        Ok(request)
    }

    /// Server answered. A success resets the form.
    pub fn finish_import(&mut self, success: bool) {
        self.is_importing = false;
        self.import_started_at = None;
        if success {
            self.reset();
        }
    }

    /// Release the busy flag once [`IMPORT_TIMEOUT`] has passed. Returns true
    /// exactly once per timed-out import.
    pub fn check_timeout(&mut self, now: Instant) -> bool {
        match self.import_started_at {
            Some(started) if self.is_importing && now.duration_since(started) >= IMPORT_TIMEOUT => {
                self.is_importing = false;
                self.import_started_at = None;
                true
            }
            _ => false,
        }
    }

    /// Time left before the import is considered lost
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let started = self.import_started_at?;
        Some(IMPORT_TIMEOUT.saturating_sub(now.duration_since(started)))
    }

    fn clear_analysis(&mut self) {
        self.schema_name = None;
        self.analysis = None;
    }

    fn reset(&mut self) {
        let mode = self.mode;
        *self = Self {
            mode,
            ..Self::default()
        };
    }
}

/// Import name for a single file: its name without the `.csv` extension
pub fn import_name_from_file(file_name: &str) -> String {
    let lower = file_name.to_lowercase();
    if lower.ends_with(".csv") {
        file_name[..file_name.len() - 4].to_string()
    } else {
        file_name.to_string()
    }
}

/// `1.5 MB` style size
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let exp = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exp as i32);
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[exp])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn file(name: &str, size: u64) -> SelectedFile {
        SelectedFile::new(PathBuf::from(format!("/data/{}", name)), size)
    }

    fn analysis() -> AnalyzeResponse {
        AnalyzeResponse {
            schema_name: "import_20240105".into(),
            analysis: CsvAnalysis {
                total_rows: 10,
                total_columns: 2,
                headers: vec!["id".into(), "text".into()],
                preview: vec![],
                encoding: "UTF-8".into(),
                delimiter: ',',
                potential_issues: vec![],
                data_types: HashMap::new(),
            },
        }
    }

    fn analysed_form() -> ImportForm {
        let mut form = ImportForm::default();
        assert_eq!(form.select_files(vec![file("Tweets.CSV", 10)]), SelectOutcome::Accepted);
        assert!(form.begin_analysis().is_some());
        form.finish_analysis(Ok(analysis())).unwrap();
        form
    }

    #[test]
    fn filters_non_csv_files() {
        let mut form = ImportForm::default();
        assert_eq!(form.select_files(vec![file("notes.txt", 1)]), SelectOutcome::NoValidFiles);
        assert_eq!(
            form.select_files(vec![file("notes.txt", 1), file("a.csv", 1)]),
            SelectOutcome::Accepted
        );
        assert_eq!(form.files().len(), 1);
        assert_eq!(form.name, "a");
    }

    #[test]
    fn single_mode_takes_one_file() {
        let mut form = ImportForm::default();
        assert_eq!(
            form.select_files(vec![file("a.csv", 1), file("b.csv", 1)]),
            SelectOutcome::TooManyForSingle
        );
        assert!(form.set_mode(ImportMode::Multiple));
        assert_eq!(
            form.select_files(vec![file("a.csv", 1), file("b.csv", 1)]),
            SelectOutcome::Accepted
        );
        assert_eq!(form.name, "", "multiple mode leaves the name alone");
    }

    #[test]
    fn rejects_oversized_files() {
        let mut form = ImportForm::default();
        let outcome = form.select_files(vec![file("big.csv", MAX_FILE_SIZE + 1)]);
        assert_eq!(outcome, SelectOutcome::Oversized(vec!["big.csv".into()]));
        assert!(form.files().is_empty());
        assert_eq!(form.select_files(vec![file("ok.csv", MAX_FILE_SIZE)]), SelectOutcome::Accepted);
    }

    #[test]
    fn busy_form_ignores_changes() {
        let mut form = ImportForm::default();
        form.select_files(vec![file("a.csv", 1)]);
        let (paths, mode) = form.begin_analysis().unwrap();
        assert_eq!(paths, vec![PathBuf::from("/data/a.csv")]);
        assert_eq!(mode, ImportMode::Single);

        assert!(form.begin_analysis().is_none());
        assert_eq!(form.select_files(vec![file("b.csv", 1)]), SelectOutcome::Busy);
        assert!(!form.set_mode(ImportMode::Multiple));
        assert_eq!(form.remove_file("a.csv"), None);
        assert_eq!(form.files()[0].name, "a.csv");
    }

    #[test]
    fn failed_analysis_clears_previous_result() {
        let mut form = analysed_form();
        form.begin_analysis();
        assert!(form.finish_analysis(Err("boom".into())).is_err());
        assert!(form.analysis().is_none());
        assert!(!form.is_analyzing());
    }

    #[test]
    fn import_guards_in_order() {
        let mut form = ImportForm::default();
        let now = Instant::now();
        assert_eq!(form.begin_import(now).unwrap_err(), ImportBlocked::NoFiles);

        form.select_files(vec![file("a.csv", 1)]);
        assert_eq!(form.begin_import(now).unwrap_err(), ImportBlocked::NotAnalyzed);

        let mut form = analysed_form();
        assert_eq!(form.begin_import(now).unwrap_err(), ImportBlocked::NoSource);
        assert_eq!(ImportBlocked::NoSource.level(), Level::Warning);

        form.source = Some(Source::Twitter);
        form.name = "   ".into();
        assert_eq!(form.begin_import(now).unwrap_err(), ImportBlocked::NoName);

        form.name = " Tweets janvier ".into();
        let request = form.begin_import(now).unwrap();
        assert_eq!(request.name, "Tweets janvier");
        assert_eq!(request.schema_name, "import_20240105");
        assert_eq!(request.source, Source::Twitter);
        assert!(form.is_importing());

        assert_eq!(form.begin_import(now).unwrap_err(), ImportBlocked::AlreadyImporting);
    }

    #[test]
    fn import_waits_for_running_analysis() {
        let mut form = analysed_form();
        form.source = Some(Source::Twitter);

        // Re-selecting drops the analysis of the old file
        assert_eq!(form.select_files(vec![file("b.csv", 1)]), SelectOutcome::Accepted);
        assert!(form.analysis().is_none());
        assert!(form.begin_analysis().is_some());

        let err = form.begin_import(Instant::now()).unwrap_err();
        assert_eq!(err, ImportBlocked::Analyzing);
        assert_eq!(err.level(), Level::Warning);
        assert!(!form.is_importing());

        form.finish_analysis(Ok(analysis())).unwrap();
        let request = form.begin_import(Instant::now()).unwrap();
        assert_eq!(request.files, vec![PathBuf::from("/data/b.csv")]);
    }

    #[test]
    fn success_resets_form() {
        let mut form = analysed_form();
        form.set_mode(ImportMode::Single);
        form.source = Some(Source::Bluesky);
        form.begin_import(Instant::now()).unwrap();
        form.finish_import(true);
        assert!(!form.is_importing());
        assert!(form.files().is_empty());
        assert!(form.analysis().is_none());
        assert_eq!(form.source, None);
        assert_eq!(form.name, "");
    }

    #[test]
    fn failure_keeps_form() {
        let mut form = analysed_form();
        form.source = Some(Source::Twitter);
        form.begin_import(Instant::now()).unwrap();
        form.finish_import(false);
        assert!(!form.is_importing());
        assert_eq!(form.files().len(), 1);
        assert!(form.analysis().is_some());
    }

    #[test]
    fn timeout_releases_flag_once() {
        let mut form = analysed_form();
        form.source = Some(Source::Twitter);
        let start = Instant::now();
        form.begin_import(start).unwrap();

        assert!(!form.check_timeout(start + Duration::from_secs(60)));
        assert!(form.is_importing());
        assert_eq!(form.remaining(start + Duration::from_secs(60)), Some(IMPORT_TIMEOUT - Duration::from_secs(60)));

        assert!(form.check_timeout(start + IMPORT_TIMEOUT));
        assert!(!form.is_importing());
        assert!(!form.check_timeout(start + IMPORT_TIMEOUT * 2));

        // A new import may start right away
        assert!(form.begin_import(start + IMPORT_TIMEOUT).is_ok());
    }

    #[test]
    fn removing_last_file_clears_form() {
        let mut form = analysed_form();
        assert_eq!(form.remove_file("Tweets.CSV"), None);
        assert!(form.files().is_empty());
        assert_eq!(form.name, "");
        assert!(form.schema_name().is_none());
    }

    #[test]
    fn removing_one_of_many_reselects_rest() {
        let mut form = ImportForm::default();
        form.set_mode(ImportMode::Multiple);
        form.select_files(vec![file("a.csv", 1), file("b.csv", 1)]);
        assert_eq!(form.remove_file("a.csv"), Some(SelectOutcome::Accepted));
        assert_eq!(form.files()[0].name, "b.csv");
    }

    #[test]
    fn names_and_sizes() {
        assert_eq!(import_name_from_file("Tweets.CSV"), "Tweets");
        assert_eq!(import_name_from_file("data.tsv"), "data.tsv");
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(100 * 1024 * 1024), "100 MB");
    }
}
