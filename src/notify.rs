//! Toast notifications shown in the top-right corner.

use crate::theme;
use egui::Color32;
use std::time::{Duration, Instant};

/// How long a non-persistent notification stays up
const LIFETIME: Duration = Duration::from_secs(8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    fn color(&self) -> Color32 {
        match self {
            Level::Info => theme::state::INFO,
            Level::Success => theme::state::SUCCESS,
            Level::Warning => theme::state::WARNING,
            Level::Error => theme::state::ERROR,
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            Level::Info => "ℹ",
            Level::Success => "✔",
            Level::Warning => "⚠",
            Level::Error => "✖",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub level: Level,
    pub title: String,
    pub message: String,
    created: Instant,
    /// Stays until dismissed or replaced
    persistent: bool,
}

#[derive(Debug, Default)]
pub struct Notifications {
    items: Vec<Notification>,
    next_id: u64,
}

impl Notifications {
    pub fn push(&mut self, level: Level, title: impl Into<String>, message: impl Into<String>) -> u64 {
        self.push_at(level, title.into(), message.into(), false, Instant::now())
    }

    /// Notification that stays until [`Notifications::dismiss`]
    pub fn push_persistent(
        &mut self,
        level: Level,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> u64 {
        self.push_at(level, title.into(), message.into(), true, Instant::now())
    }

    fn push_at(
        &mut self,
        level: Level,
        title: String,
        message: String,
        persistent: bool,
        now: Instant,
    ) -> u64 {
        match level {
            Level::Error => tracing::error!("{}: {}", title, message),
            Level::Warning => tracing::warn!("{}: {}", title, message),
            _ => tracing::info!("{}: {}", title, message),
        }
        let id = self.next_id;
        self.next_id += 1;
        self.items.push(Notification {
            id,
            level,
            title,
            message,
            created: now,
            persistent,
        });
        id
    }

    pub fn info(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.push(Level::Info, title, message);
    }

    pub fn success(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.push(Level::Success, title, message);
    }

    pub fn error(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.push(Level::Error, title, message);
    }

    pub fn dismiss(&mut self, id: u64) {
        self.items.retain(|n| n.id != id);
    }

    /// Drop expired notifications
    pub fn expire(&mut self, now: Instant) {
        self.items
            .retain(|n| n.persistent || now.duration_since(n.created) < LIFETIME);
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        self.expire(Instant::now());
        if self.items.is_empty() {
            return;
        }

        let mut dismissed = Vec::new();
        egui::Area::new(egui::Id::new("notifications"))
            .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-12.0, 40.0))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                ui.set_max_width(340.0);
                for n in self.items() {
                    egui::Frame::none()
                        .fill(theme::bg::SURFACE)
                        .stroke(egui::Stroke::new(1.0, n.level.color()))
                        .rounding(6.0)
                        .inner_margin(10.0)
                        .show(ui, |ui| {
                            ui.horizontal(|ui| {
                                ui.colored_label(n.level.color(), n.level.icon());
                                ui.vertical(|ui| {
                                    ui.strong(&n.title);
                                    ui.label(&n.message);
                                });
                                if ui.small_button("✕").clicked() {
                                    dismissed.push(n.id);
                                }
                            });
                        });
                    ui.add_space(6.0);
                }
            });

        for id in dismissed {
            self.dismiss(id);
        }
        ctx.request_repaint_after(Duration::from_millis(500));
    }
}
