//! Cocktail Dashboard
//!
//! Native desktop viewer for Cocktail study results: tweet and hashtag
//! charts, community graphs, keyword collection and CSV imports.

mod api;
mod app;
mod chart;
mod collect;
mod graph;
mod import;
mod notify;
mod settings;
mod theme;

use eframe::egui;

fn main() -> eframe::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_title("Cocktail Dashboard")
            .with_drag_and_drop(true),
        persist_window: true,
        ..Default::default()
    };

    eframe::run_native(
        "Cocktail Dashboard",
        options,
        Box::new(|cc| Ok(Box::new(app::DashboardApp::new(cc)))),
    )
}
