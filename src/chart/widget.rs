//! Line chart rendering with egui_plot.

use super::period::Period;
use super::state::{date_to_plot_x, plot_x_to_date, ChartState};
use crate::theme;
use egui_plot::{Line, Plot, PlotPoints, Points};

/// Normalized click tolerance for drill-down
const CLICK_TOLERANCE: f64 = 0.04;

/// Period selector shared by all charts
pub fn period_selector(ui: &mut egui::Ui, id: &str, period: &mut Period) -> bool {
    let previous = *period;
    ui.horizontal(|ui| {
        ui.label("Display by:");
        egui::ComboBox::from_id_salt(id)
            .selected_text(period.label())
            .show_ui(ui, |ui| {
                for p in Period::all() {
                    ui.selectable_value(period, *p, p.label());
                }
            });
    });
    *period != previous
}

/// Render one chart. Returns a drill-down link when a point is clicked.
pub fn render_chart(ui: &mut egui::Ui, chart: &ChartState, y_label: &str) -> Option<String> {
    if chart.is_empty() {
        ui.label("No data for this chart");
        return None;
    }

    let mut plot = Plot::new(chart.kind().title())
        .height(400.0)
        .y_axis_label(y_label)
        .include_y(0.0)
        .allow_scroll(false)
        .x_axis_formatter(|mark, _range| {
            plot_x_to_date(mark.value)
                .map(|d| d.format("%d/%m/%Y").to_string())
                .unwrap_or_default()
        })
        .label_formatter(|name, value| {
            let date = plot_x_to_date(value.x)
                .map(|d| d.format("%d/%m/%Y").to_string())
                .unwrap_or_default();
            if name.is_empty() {
                format!("{}\n{:.0}", date, value.y)
            } else {
                format!("{}\n{}: {:.0}", date, name, value.y)
            }
        });

    if let Some((min, max)) = chart.bounds() {
        plot = plot.include_x(date_to_plot_x(min)).include_x(date_to_plot_x(max));
    }

    let response = plot.show(ui, |plot_ui| {
        for series in chart.series().iter().filter(|s| !s.hidden) {
            let color = theme::label_color(&series.label);
            let coords: Vec<[f64; 2]> = series
                .data
                .iter()
                .map(|p| [date_to_plot_x(p.x), p.y as f64])
                .collect();
            plot_ui.line(
                Line::new(PlotPoints::new(coords.clone()))
                    .name(&series.label)
                    .color(color)
                    .width(1.5),
            );
            plot_ui.points(Points::new(PlotPoints::new(coords)).color(color).radius(2.0));
        }

        if !plot_ui.response().clicked() {
            return None;
        }
        let coord = plot_ui.pointer_coordinate()?;
        let bounds = plot_ui.plot_bounds();
        chart.nearest_point([coord.x, coord.y], [bounds.width(), bounds.height()], CLICK_TOLERANCE)
    });

    let (series_index, point_index) = response.inner?;
    chart.drilldown_url(series_index, point_index)
}

/// Visibility toggles for a multi-series chart
pub fn render_legend(ui: &mut egui::Ui, chart: &mut ChartState) {
    ui.horizontal(|ui| {
        if ui.button("Show all").clicked() {
            chart.set_all_hidden(false);
        }
        if ui.button("Hide all").clicked() {
            chart.set_all_hidden(true);
        }
    });

    let entries: Vec<(String, bool, u64)> = chart
        .series()
        .iter()
        .map(|s| (s.label.clone(), chart.is_hidden(&s.label), s.total()))
        .collect();

    egui::ScrollArea::vertical()
        .id_salt("chart_legend")
        .max_height(300.0)
        .show(ui, |ui| {
            for (label, hidden, total) in entries {
                let mut visible = !hidden;
                ui.horizontal(|ui| {
                    ui.colored_label(theme::label_color(&label), "●");
                    if ui.checkbox(&mut visible, format!("#{} ({})", label, total)).changed() {
                        chart.set_hidden(&label, !visible);
                    }
                });
            }
        });
}
