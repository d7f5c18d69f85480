//! Collect tab UI.

use super::form::{CollectAction, CollectForm};
use crate::api::CollectRequest;
use crate::notify::Level;
use crate::theme;
use chrono::{DateTime, Utc};

/// What the collect tab asks the app to do
#[derive(Debug)]
pub enum CollectEvent {
    Start(CollectRequest),
    Delete,
    Update,
    Notify(Level, String, String),
}

#[derive(Debug, Default)]
pub struct CollectPanel {
    pub form: CollectForm,
    /// Action waiting for the user to confirm
    confirming: Option<CollectAction>,
}

impl CollectPanel {
    /// A button was pressed. Actions with a confirmation wait for [`Self::confirm`].
    pub fn request(&mut self, action: CollectAction, now: DateTime<Utc>) -> Vec<CollectEvent> {
        if action.confirmation().is_some() && !self.form.is_busy() {
            self.confirming = Some(action);
            return Vec::new();
        }
        self.run(action, now)
    }

    pub fn confirm(&mut self, now: DateTime<Utc>) -> Vec<CollectEvent> {
        match self.confirming.take() {
            Some(action) => self.run(action, now),
            None => Vec::new(),
        }
    }

    pub fn cancel(&mut self) {
        self.confirming = None;
    }

    pub fn confirming(&self) -> Option<CollectAction> {
        self.confirming
    }

    fn run(&mut self, action: CollectAction, now: DateTime<Utc>) -> Vec<CollectEvent> {
        let result = match action {
            CollectAction::Start => self.form.begin_start(now).map(CollectEvent::Start),
            CollectAction::Delete => self.form.begin(action).map(|_| CollectEvent::Delete),
            CollectAction::Update => self.form.begin(action).map(|_| CollectEvent::Update),
        };
        match result {
            Ok(event) => vec![event],
            Err(blocked) => vec![CollectEvent::Notify(
                blocked.level(),
                "Collection".into(),
                blocked.message().into(),
            )],
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, has_project: bool) -> Vec<CollectEvent> {
        let mut events = Vec::new();
        let busy = self.form.is_busy();
        let now = Utc::now();

        ui.heading("Collect posts");
        ui.add_space(8.0);
        if !has_project {
            ui.colored_label(theme::text::MUTED, "Enter a project id and press Connect");
            return events;
        }

        ui.add_enabled_ui(!busy, |ui| {
            egui::Grid::new("collect_form").num_columns(2).show(ui, |ui| {
                ui.label("Name");
                ui.add(egui::TextEdit::singleline(&mut self.form.name).desired_width(300.0));
                ui.end_row();

                ui.label("Keyword");
                ui.horizontal(|ui| {
                    let field = ui.add(
                        egui::TextEdit::singleline(&mut self.form.keyword_input)
                            .hint_text("#hashtag or word")
                            .desired_width(220.0),
                    );
                    let submitted =
                        field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    if ui.button("Add").clicked() || submitted {
                        self.form.add_keyword();
                    }
                });
                ui.end_row();

                ui.label("Networks");
                ui.horizontal(|ui| {
                    ui.checkbox(&mut self.form.twitter, "Twitter / X");
                    ui.checkbox(&mut self.form.bluesky, "Bluesky");
                });
                ui.end_row();

                ui.label("Limit");
                ui.add(egui::DragValue::new(&mut self.form.limit).range(0..=100_000))
                    .on_hover_text("Posts per keyword and network");
                ui.end_row();

                ui.label("From");
                let start = ui.add(
                    egui::TextEdit::singleline(&mut self.form.start_date)
                        .hint_text("YYYY-MM-DD")
                        .desired_width(110.0),
                );
                if start.lost_focus() {
                    self.form.fill_end_date(now.date_naive());
                }
                ui.end_row();

                ui.label("To");
                ui.add(
                    egui::TextEdit::singleline(&mut self.form.end_date)
                        .hint_text("YYYY-MM-DD")
                        .desired_width(110.0),
                );
                ui.end_row();
            });
        });

        self.keyword_list(ui, busy);

        if self.form.needs_full_archive(now) {
            ui.colored_label(
                theme::state::WARNING,
                "Twitter posts older than 7 days need full-archive API access on the server",
            );
        }

        ui.add_space(12.0);
        ui.separator();
        ui.horizontal(|ui| {
            for (action, fill) in [
                (CollectAction::Start, theme::accent::BLUE),
                (CollectAction::Update, theme::bg::SURFACE),
                (CollectAction::Delete, theme::accent::RED),
            ] {
                let label = if self.form.running() == Some(action) {
                    action.busy_label()
                } else {
                    action.label()
                };
                let button = egui::Button::new(egui::RichText::new(label).color(egui::Color32::WHITE))
                    .fill(fill);
                if ui.add_enabled(!busy, button).clicked() {
                    events.extend(self.request(action, now));
                }
            }
            if busy {
                ui.spinner();
            }
        });

        if let Some(action) = self.confirming() {
            ui.add_space(8.0);
            egui::Frame::none()
                .fill(theme::bg::SURFACE)
                .stroke(egui::Stroke::new(1.0, theme::state::WARNING))
                .rounding(4.0)
                .inner_margin(8.0)
                .show(ui, |ui| {
                    ui.label(action.confirmation().unwrap_or_default());
                    ui.horizontal(|ui| {
                        if ui.button("Confirm").clicked() {
                            events.extend(self.confirm(now));
                        }
                        if ui.button("Cancel").clicked() {
                            self.cancel();
                        }
                    });
                });
        }
        events
    }

    fn keyword_list(&mut self, ui: &mut egui::Ui, busy: bool) {
        if self.form.keywords().is_empty() {
            return;
        }
        ui.add_space(6.0);
        let mut removed = None;
        ui.horizontal_wrapped(|ui| {
            for keyword in self.form.keywords() {
                egui::Frame::none()
                    .fill(theme::bg::SURFACE)
                    .stroke(egui::Stroke::new(1.0, theme::border::SUBTLE))
                    .rounding(10.0)
                    .inner_margin(egui::Margin::symmetric(8.0, 2.0))
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.colored_label(theme::accent::CYAN, keyword);
                            if ui.add_enabled(!busy, egui::Button::new("×").small()).clicked() {
                                removed = Some(keyword.clone());
                            }
                        });
                    });
            }
        });
        if let Some(keyword) = removed {
            self.form.remove_keyword(&keyword);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn delete_waits_for_confirmation() {
        let mut panel = CollectPanel::default();
        assert!(panel.request(CollectAction::Delete, now()).is_empty());
        assert_eq!(panel.confirming(), Some(CollectAction::Delete));
        assert!(!panel.form.is_busy());

        let events = panel.confirm(now());
        assert!(matches!(&events[..], [CollectEvent::Delete]));
        assert_eq!(panel.confirming(), None);
        assert_eq!(panel.form.running(), Some(CollectAction::Delete));
    }

    #[test]
    fn cancelled_update_does_nothing() {
        let mut panel = CollectPanel::default();
        panel.request(CollectAction::Update, now());
        panel.cancel();
        assert!(panel.confirm(now()).is_empty());
        assert!(!panel.form.is_busy());
    }

    #[test]
    fn invalid_start_notifies() {
        let mut panel = CollectPanel::default();
        let events = panel.request(CollectAction::Start, now());
        match &events[..] {
            [CollectEvent::Notify(Level::Error, _, message)] => assert!(message.contains("name")),
            other => panic!("unexpected events: {:?}", other),
        }
    }

    #[test]
    fn valid_start_sends_request() {
        let mut panel = CollectPanel::default();
        panel.form.name = "Climat".into();
        panel.form.keyword_input = "#climat".into();
        panel.form.add_keyword();
        panel.form.bluesky = true;

        let events = panel.request(CollectAction::Start, now());
        assert!(matches!(
            &events[..],
            [CollectEvent::Start(request)] if request.keywords == vec!["#climat".to_string()]
        ));

        // Busy: a second press is refused without asking for confirmation
        let events = panel.request(CollectAction::Delete, now());
        assert!(matches!(&events[..], [CollectEvent::Notify(Level::Warning, _, _)]));
        assert_eq!(panel.confirming(), None);
    }
}
