//! Import tab UI.

use super::form::{format_file_size, ImportForm, SelectOutcome, SelectedFile, MAX_FILE_SIZE};
use crate::api::types::{CsvAnalysis, DataType};
use crate::api::{ImportMode, ImportRequest, Source};
use crate::notify::Level;
use crate::theme;
use egui_extras::{Column, TableBuilder};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// What the import tab asks the app to do
#[derive(Debug)]
pub enum ImportEvent {
    Analyze(Vec<PathBuf>, ImportMode),
    Import(ImportRequest),
    Notify(Level, String, String),
}

/// Import form plus the transient text field state
#[derive(Debug, Default)]
pub struct ImportPanel {
    pub form: ImportForm,
    path_input: String,
}

impl ImportPanel {
    /// Offer files to the form and turn the outcome into events
    pub fn offer(&mut self, files: Vec<SelectedFile>) -> Vec<ImportEvent> {
        let outcome = self.form.select_files(files);
        let mut events = Vec::new();
        if let Some((level, message)) = describe_outcome(&outcome) {
            events.push(ImportEvent::Notify(level, "Import".into(), message));
        }
        if outcome == SelectOutcome::Accepted {
            if let Some((paths, mode)) = self.form.begin_analysis() {
                events.push(ImportEvent::Analyze(paths, mode));
            }
        }
        events
    }

    /// Files dropped onto the window this frame
    pub fn take_dropped(&mut self, ctx: &egui::Context) -> Vec<ImportEvent> {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if dropped.is_empty() {
            return Vec::new();
        }
        let files = dropped
            .into_iter()
            .filter_map(|f| match f.path {
                Some(path) => stat_file(&path),
                None => {
                    tracing::warn!("dropped file {} has no path", f.name);
                    None
                }
            })
            .collect();
        self.offer(files)
    }

    pub fn show(&mut self, ui: &mut egui::Ui) -> Vec<ImportEvent> {
        let mut events = Vec::new();
        let busy = self.form.is_busy();

        ui.heading("Import CSV data");
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            ui.label("Mode:");
            let mut mode = self.form.mode();
            ui.add_enabled_ui(!busy, |ui| {
                ui.radio_value(&mut mode, ImportMode::Single, "Single file");
                ui.radio_value(&mut mode, ImportMode::Multiple, "Multiple files");
            });
            self.form.set_mode(mode);
        });

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            let field = ui.add_enabled(
                !busy,
                egui::TextEdit::singleline(&mut self.path_input)
                    .hint_text("Path to a .csv file, or drop files on the window")
                    .desired_width(420.0),
            );
            let submitted = field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.add_enabled(!busy, egui::Button::new("Add")).clicked() || submitted {
                events.extend(self.add_from_input());
            }
        });
        ui.label(
            egui::RichText::new(format!("Maximum {} per file", format_file_size(MAX_FILE_SIZE)))
                .small()
                .color(theme::text::MUTED),
        );

        self.file_list(ui, &mut events);

        if self.form.is_analyzing() {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Analysing file…");
            });
            theme::skeleton_lines(ui, 4, 360.0);
        } else if let Some(analysis) = self.form.analysis() {
            ui.add_space(8.0);
            analysis_summary(ui, analysis);
            ui.add_space(6.0);
            preview_table(ui, analysis);
        }

        ui.add_space(12.0);
        ui.separator();
        self.import_controls(ui, &mut events);
        events
    }

    fn add_from_input(&mut self) -> Vec<ImportEvent> {
        let raw = self.path_input.trim();
        if raw.is_empty() {
            return Vec::new();
        }
        let path = PathBuf::from(raw);
        match SelectedFile::from_path(&path) {
            Ok(file) => {
                self.path_input.clear();
                let mut files = match self.form.mode() {
                    ImportMode::Multiple => self.form.files().to_vec(),
                    ImportMode::Single => Vec::new(),
                };
                files.retain(|f| f.path != file.path);
                files.push(file);
                self.offer(files)
            }
            Err(e) => vec![ImportEvent::Notify(
                Level::Error,
                "Import".into(),
                format!("Cannot read {}: {}", path.display(), e),
            )],
        }
    }

    fn file_list(&mut self, ui: &mut egui::Ui, events: &mut Vec<ImportEvent>) {
        if self.form.files().is_empty() {
            return;
        }
        ui.add_space(8.0);
        let mut removed = None;
        egui::Frame::none()
            .fill(theme::bg::SURFACE)
            .stroke(egui::Stroke::new(1.0, theme::border::SUBTLE))
            .rounding(4.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                for file in self.form.files() {
                    ui.horizontal(|ui| {
                        ui.colored_label(theme::text::PRIMARY, &file.name);
                        ui.colored_label(theme::text::SECONDARY, format_file_size(file.size));
                        if ui
                            .add_enabled(!self.form.is_busy(), egui::Button::new("✕").small())
                            .on_hover_text("Remove")
                            .clicked()
                        {
                            removed = Some(file.name.clone());
                        }
                    });
                }
            });

        if let Some(name) = removed {
            if let Some(outcome) = self.form.remove_file(&name) {
                if let Some((level, message)) = describe_outcome(&outcome) {
                    events.push(ImportEvent::Notify(level, "Import".into(), message));
                }
                if outcome == SelectOutcome::Accepted {
                    if let Some((paths, mode)) = self.form.begin_analysis() {
                        events.push(ImportEvent::Analyze(paths, mode));
                    }
                }
            }
        }
    }

    fn import_controls(&mut self, ui: &mut egui::Ui, events: &mut Vec<ImportEvent>) {
        let importing = self.form.is_importing();

        ui.horizontal(|ui| {
            ui.label("Source:");
            ui.add_enabled_ui(!importing, |ui| {
                for source in Source::all() {
                    let selected = self.form.source == Some(*source);
                    if ui.radio(selected, source.label()).clicked() {
                        self.form.source = Some(*source);
                    }
                }
            });
        });

        ui.horizontal(|ui| {
            ui.label("Name:");
            ui.add_enabled(
                !importing,
                egui::TextEdit::singleline(&mut self.form.name).desired_width(300.0),
            );
        });

        if let Some(schema) = self.form.schema_name() {
            ui.label(
                egui::RichText::new(format!("Schema: {}", schema))
                    .small()
                    .color(theme::text::MUTED),
            );
        }

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            let label = if importing { "Importing…" } else { "Start import" };
            let button = egui::Button::new(egui::RichText::new(label).color(egui::Color32::WHITE))
                .fill(theme::accent::BLUE);
            if ui.add(button).clicked() {
                match self.form.begin_import(Instant::now()) {
                    Ok(request) => events.push(ImportEvent::Import(request)),
                    Err(blocked) => events.push(ImportEvent::Notify(
                        blocked.level(),
                        "Import".into(),
                        blocked.message().into(),
                    )),
                }
            }
            if importing {
                ui.spinner();
                if let Some(left) = self.form.remaining(Instant::now()) {
                    ui.colored_label(
                        theme::text::MUTED,
                        format!("gives up in {} min", left.as_secs() / 60 + 1),
                    );
                }
            }
        });
    }
}

fn stat_file(path: &Path) -> Option<SelectedFile> {
    match SelectedFile::from_path(path) {
        Ok(file) => Some(file),
        Err(e) => {
            tracing::warn!("cannot read {}: {}", path.display(), e);
            None
        }
    }
}

/// Notification for a selection outcome, `None` when nothing should be shown
pub fn describe_outcome(outcome: &SelectOutcome) -> Option<(Level, String)> {
    match outcome {
        SelectOutcome::Busy | SelectOutcome::Accepted => None,
        SelectOutcome::NoValidFiles => Some((Level::Error, "Select at least one valid CSV file".into())),
        SelectOutcome::TooManyForSingle => Some((
            Level::Error,
            "Single mode takes one file. Switch to multiple mode to import several.".into(),
        )),
        SelectOutcome::Oversized(names) => Some((
            Level::Warning,
            format!(
                "Files larger than {} are not accepted: {}",
                format_file_size(MAX_FILE_SIZE),
                names.join(", ")
            ),
        )),
    }
}

fn data_type_label(data_type: Option<&DataType>) -> &'static str {
    match data_type {
        Some(DataType::Text) => "text",
        Some(DataType::Number) => "number",
        Some(DataType::Date) => "date",
        Some(DataType::Boolean) => "boolean",
        Some(DataType::Unknown) | None => "?",
    }
}

fn analysis_summary(ui: &mut egui::Ui, analysis: &CsvAnalysis) {
    ui.horizontal_wrapped(|ui| {
        ui.strong(format!("{} rows", analysis.total_rows));
        ui.label("·");
        ui.strong(format!("{} columns", analysis.total_columns));
        ui.label("·");
        ui.label(format!("encoding {}", analysis.encoding));
        ui.label("·");
        ui.label(format!("delimiter {:?}", analysis.delimiter));
    });

    if analysis.potential_issues.is_empty() {
        return;
    }
    egui::CollapsingHeader::new(format!("{} potential issues", analysis.potential_issues.len()))
        .id_salt("csv_issues")
        .show(ui, |ui| {
            for issue in &analysis.potential_issues {
                ui.horizontal_wrapped(|ui| {
                    ui.colored_label(theme::accent::YELLOW, "⚠");
                    ui.label(&issue.message);
                    if !issue.affected_rows.is_empty() {
                        let rows: Vec<String> =
                            issue.affected_rows.iter().take(10).map(|r| r.to_string()).collect();
                        ui.colored_label(theme::text::MUTED, format!("rows {}", rows.join(", ")));
                    }
                });
            }
        });
}

fn preview_table(ui: &mut egui::Ui, analysis: &CsvAnalysis) {
    if analysis.headers.is_empty() {
        return;
    }
    egui::ScrollArea::horizontal()
        .id_salt("csv_preview")
        .show(ui, |ui| {
            TableBuilder::new(ui)
                .striped(true)
                .columns(Column::auto().at_least(80.0).clip(true), analysis.headers.len())
                .max_scroll_height(260.0)
                .header(36.0, |mut header| {
                    for name in &analysis.headers {
                        header.col(|ui| {
                            ui.vertical(|ui| {
                                ui.strong(name);
                                ui.colored_label(
                                    theme::accent::CYAN,
                                    data_type_label(analysis.data_types.get(name)),
                                );
                            });
                        });
                    }
                })
                .body(|mut body| {
                    for row in &analysis.preview {
                        body.row(20.0, |mut table_row| {
                            for name in &analysis.headers {
                                table_row.col(|ui| {
                                    ui.label(row.get(name).map(String::as_str).unwrap_or(""));
                                });
                            }
                        });
                    }
                });
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_files_trigger_analysis() {
        let mut panel = ImportPanel::default();
        let events = panel.offer(vec![SelectedFile::new(PathBuf::from("/tmp/a.csv"), 10)]);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            ImportEvent::Analyze(paths, ImportMode::Single) if paths == &vec![PathBuf::from("/tmp/a.csv")]
        ));
        assert!(panel.form.is_analyzing());

        // Busy: no second analysis, no notification
        let events = panel.offer(vec![SelectedFile::new(PathBuf::from("/tmp/b.csv"), 10)]);
        assert!(events.is_empty());
    }

    #[test]
    fn rejected_files_notify() {
        let mut panel = ImportPanel::default();
        let events = panel.offer(vec![SelectedFile::new(PathBuf::from("/tmp/a.json"), 10)]);
        assert!(matches!(&events[..], [ImportEvent::Notify(Level::Error, _, _)]));

        let events = panel.offer(vec![SelectedFile::new(PathBuf::from("/tmp/big.csv"), MAX_FILE_SIZE + 1)]);
        match &events[..] {
            [ImportEvent::Notify(Level::Warning, _, message)] => assert!(message.contains("big.csv")),
            other => panic!("unexpected events: {:?}", other),
        }
    }

    #[test]
    fn outcome_messages() {
        assert!(describe_outcome(&SelectOutcome::Accepted).is_none());
        assert!(describe_outcome(&SelectOutcome::Busy).is_none());
        assert_eq!(describe_outcome(&SelectOutcome::TooManyForSingle).unwrap().0, Level::Error);
    }
}
