//! Main application state and UI.

use crate::api::{AnalyzeResponse, ApiClient, ApiResult, CollectResponse, GraphQuery, ImportResponse};
use crate::chart::{widget as chart_widget, ChartKind, ChartState, Series};
use crate::collect::{CollectEvent, CollectPanel};
use crate::graph::export::{default_export_dir, export_file_name, write_png};
use crate::graph::{neighbor_entries, panel_title, Graph, GraphPayload, GraphState, GraphView};
use crate::import::{ImportEvent, ImportPanel};
use crate::notify::{Level, Notifications};
use crate::settings::Settings;
use crate::theme;
use eframe::egui::{self, ColorImage, Pos2, Rect, Vec2};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Charts,
    Communities,
    Collect,
    Import,
}

impl Tab {
    fn label(&self) -> &'static str {
        match self {
            Tab::Charts => "Charts",
            Tab::Communities => "Communities",
            Tab::Collect => "Collect",
            Tab::Import => "Import",
        }
    }
}

/// Result of polling a worker channel
#[derive(Debug, PartialEq)]
enum Poll<T> {
    Pending,
    Ready(T),
    /// Worker ended without sending
    Lost,
}

/// Take the worker result if it arrived. Clears the slot once done.
fn poll_receiver<T>(slot: &mut Option<Receiver<T>>) -> Poll<T> {
    let Some(rx) = slot.as_ref() else {
        return Poll::Pending;
    };
    match rx.try_recv() {
        Ok(value) => {
            *slot = None;
            Poll::Ready(value)
        }
        Err(TryRecvError::Empty) => Poll::Pending,
        Err(TryRecvError::Disconnected) => {
            *slot = None;
            Poll::Lost
        }
    }
}

/// Run a blocking request on a worker thread
fn spawn_request<T, F>(api: &ApiClient, ctx: &egui::Context, request: F) -> Receiver<ApiResult<T>>
where
    T: Send + 'static,
    F: FnOnce(&ApiClient) -> ApiResult<T> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let api = api.clone();
    let ctx = ctx.clone();
    std::thread::spawn(move || {
        let _ = tx.send(request(&api));
        ctx.request_repaint();
    });
    rx
}

/// Main dashboard application
pub struct DashboardApp {
    // API client
    api: ApiClient,
    api_connected: Option<bool>,
    health_receiver: Option<Receiver<ApiResult<()>>>,

    tab: Tab,

    // Charts
    tweets_chart: Option<ChartState>,
    hashtags_chart: Option<ChartState>,
    tweets_receiver: Option<Receiver<ApiResult<Series>>>,
    hashtags_receiver: Option<Receiver<ApiResult<Vec<Series>>>>,

    // Communities
    graph: Option<GraphState>,
    graph_view: GraphView,
    graph_receiver: Option<Receiver<ApiResult<GraphPayload>>>,
    /// Parameters being edited; applied on reload
    query_draft: GraphQuery,
    export_requested: bool,

    // Collect
    collect: CollectPanel,
    collect_receiver: Option<Receiver<ApiResult<CollectResponse>>>,

    // Import
    import: ImportPanel,
    analyze_receiver: Option<Receiver<ApiResult<AnalyzeResponse>>>,
    import_receiver: Option<Receiver<ApiResult<ImportResponse>>>,
    /// Persistent "in progress" notification
    import_notice: Option<u64>,

    notifications: Notifications,

    // Connection fields being edited
    base_url_draft: String,
    project_draft: String,

    // Settings persistence
    settings: Settings,
    settings_dirty: bool,
    last_settings_save: Instant,
}

impl DashboardApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = Settings::load();

        let graph_view = GraphView {
            node_scale: settings.node_scale,
            show_edges: settings.show_edges,
            ..GraphView::default()
        };

        let mut app = Self {
            api: ApiClient::new(&settings.api_base_url),
            api_connected: None,
            health_receiver: None,
            tab: Tab::Charts,
            tweets_chart: None,
            hashtags_chart: None,
            tweets_receiver: None,
            hashtags_receiver: None,
            graph: None,
            graph_view,
            graph_receiver: None,
            query_draft: settings.graph_query.clone(),
            export_requested: false,
            collect: CollectPanel::default(),
            collect_receiver: None,
            import: ImportPanel::default(),
            analyze_receiver: None,
            import_receiver: None,
            import_notice: None,
            notifications: Notifications::default(),
            base_url_draft: settings.api_base_url.clone(),
            project_draft: settings.project_id.clone(),
            settings,
            settings_dirty: false,
            last_settings_save: Instant::now(),
        };

        app.connect(&cc.egui_ctx);
        app
    }

    /// Check the server and load everything for the current project
    fn connect(&mut self, ctx: &egui::Context) {
        tracing::info!(
            "Connecting to {} (project {:?})",
            self.api.base_url(),
            self.settings.project_id
        );
        self.api_connected = None;
        self.health_receiver = Some(spawn_request(&self.api, ctx, |api| api.health()));

        if self.settings.project_id.is_empty() {
            return;
        }
        self.load_charts(ctx);
        self.load_graph(ctx);
    }

    /// Apply edited connection fields
    fn apply_connection(&mut self, ctx: &egui::Context) {
        let base_url = self.base_url_draft.trim().to_string();
        let project = self.project_draft.trim().to_string();
        if base_url != self.settings.api_base_url {
            self.api = ApiClient::new(&base_url);
            self.settings.api_base_url = base_url;
        }
        self.settings.project_id = project;
        self.mark_settings_dirty();
        self.connect(ctx);
    }

    fn load_charts(&mut self, ctx: &egui::Context) {
        let project = self.settings.project_id.clone();
        let tweets_project = project.clone();
        self.tweets_chart = None;
        self.hashtags_chart = None;
        self.tweets_receiver = Some(spawn_request(&self.api, ctx, move |api| {
            api.fetch_tweets_chart(&tweets_project)
        }));
        self.hashtags_receiver = Some(spawn_request(&self.api, ctx, move |api| {
            api.fetch_hashtags_chart(&project)
        }));
    }

    fn load_graph(&mut self, ctx: &egui::Context) {
        let project = self.settings.project_id.clone();
        let query = self.settings.graph_query.clone();
        self.graph = None;
        self.graph_receiver = Some(spawn_request(&self.api, ctx, move |api| {
            api.fetch_graph(&project, &query)
        }));
    }

    /// Mark settings as needing to be saved
    fn mark_settings_dirty(&mut self) {
        self.settings_dirty = true;
    }

    /// Copy current UI state to settings struct
    fn sync_settings_from_ui(&mut self) {
        self.settings.node_scale = self.graph_view.node_scale;
        self.settings.show_edges = self.graph_view.show_edges;
    }

    /// Save settings if dirty and enough time has passed (debounce)
    fn maybe_save_settings(&mut self) {
        if self.settings_dirty && self.last_settings_save.elapsed().as_secs() >= 2 {
            self.sync_settings_from_ui();
            self.settings.save();
            self.settings_dirty = false;
            self.last_settings_save = Instant::now();
        }
    }

    fn poll_workers(&mut self, ctx: &egui::Context) {
        match poll_receiver(&mut self.health_receiver) {
            Poll::Ready(Ok(())) => self.api_connected = Some(true),
            Poll::Ready(Err(e)) => {
                self.api_connected = Some(false);
                self.notifications
                    .error("Server unreachable", e.user_message("The analysis server did not answer"));
            }
            Poll::Lost => self.api_connected = Some(false),
            Poll::Pending => {}
        }

        let period = self.settings.period;
        match poll_receiver(&mut self.tweets_receiver) {
            Poll::Ready(Ok(series)) => {
                self.tweets_chart = Some(
                    ChartState::new(ChartKind::Tweets, vec![series], period)
                        .with_result_path(self.api.tweets_result_path(&self.settings.project_id)),
                );
            }
            Poll::Ready(Err(e)) => self
                .notifications
                .error("Charts", e.user_message("Could not load the tweet chart")),
            _ => {}
        }
        match poll_receiver(&mut self.hashtags_receiver) {
            Poll::Ready(Ok(series)) => {
                self.hashtags_chart = Some(
                    ChartState::new(ChartKind::Hashtags, series, period)
                        .with_result_path(self.api.hashtags_result_path(&self.settings.project_id)),
                );
            }
            Poll::Ready(Err(e)) => self
                .notifications
                .error("Charts", e.user_message("Could not load the hashtag chart")),
            _ => {}
        }

        match poll_receiver(&mut self.graph_receiver) {
            Poll::Ready(Ok(payload)) => {
                let graph = Graph::from_payload(payload);
                let seed = Rect::from_center_size(Pos2::ZERO, Vec2::new(800.0, 600.0));
                self.graph = Some(GraphState::new(graph, seed));
                self.graph_view.fit_pending = true;
            }
            Poll::Ready(Err(e)) => self
                .notifications
                .error("Communities", e.user_message("Could not load the community graph")),
            _ => {}
        }

        match poll_receiver(&mut self.analyze_receiver) {
            Poll::Ready(result) => {
                let result = result.map_err(|e| e.user_message("Could not analyse the file"));
                if let Err(message) = self.import.form.finish_analysis(result) {
                    self.notifications.error("Analysis failed", message);
                }
            }
            Poll::Lost => {
                let _ = self.import.form.finish_analysis(Err("interrupted".into()));
                self.notifications.error("Analysis failed", "The analysis was interrupted");
            }
            Poll::Pending => {}
        }

        match poll_receiver(&mut self.collect_receiver) {
            Poll::Ready(Ok(response)) => {
                self.collect.form.finish(response.success);
                if response.success {
                    self.notifications.success("Collection", response.message);
                    // Charts and graph now describe different data
                    if !self.settings.project_id.is_empty() {
                        self.load_charts(ctx);
                        self.load_graph(ctx);
                    }
                } else {
                    self.notifications.error("Collection", response.message);
                }
            }
            Poll::Ready(Err(e)) => {
                self.collect.form.finish(false);
                self.notifications
                    .error("Collection", e.user_message("The collection request failed"));
            }
            Poll::Lost => {
                self.collect.form.finish(false);
                self.notifications.error("Collection", "The collection request was interrupted");
            }
            Poll::Pending => {}
        }

        let import_result = poll_receiver(&mut self.import_receiver);
        let timed_out = self.import.form.check_timeout(Instant::now());
        if !matches!(import_result, Poll::Pending) || timed_out {
            if let Some(id) = self.import_notice.take() {
                self.notifications.dismiss(id);
            }
        }
        match import_result {
            Poll::Ready(Ok(response)) => {
                self.import.form.finish_import(true);
                self.notifications.success("Import complete", import_summary(&response));
            }
            Poll::Ready(Err(e)) => {
                self.import.form.finish_import(false);
                self.notifications
                    .error("Import failed", e.user_message("The import did not complete"));
            }
            Poll::Lost => {
                self.import.form.finish_import(false);
                self.notifications.error("Import failed", "The import was interrupted");
            }
            Poll::Pending => {}
        }

        if timed_out {
            self.notifications.error(
                "Timeout",
                "No answer from the server after 30 minutes. The import may still finish.",
            );
        }
    }

    fn is_loading(&self) -> bool {
        self.health_receiver.is_some()
            || self.tweets_receiver.is_some()
            || self.hashtags_receiver.is_some()
            || self.graph_receiver.is_some()
            || self.analyze_receiver.is_some()
            || self.collect_receiver.is_some()
            || self.import_receiver.is_some()
    }

    fn handle_collect_events(&mut self, ctx: &egui::Context, events: Vec<CollectEvent>) {
        let project = self.settings.project_id.clone();
        for event in events {
            let project = project.clone();
            match event {
                CollectEvent::Notify(level, title, message) => {
                    self.notifications.push(level, title, message);
                }
                CollectEvent::Start(request) => {
                    tracing::info!(
                        "Starting collection {:?}: {} keywords on {} networks",
                        request.name,
                        request.keywords.len(),
                        request.networks.len()
                    );
                    self.notifications.info(
                        "Collection started",
                        "The server answers once every keyword has been collected",
                    );
                    self.collect_receiver = Some(spawn_request(&self.api, ctx, move |api| {
                        api.start_collect(&project, &request)
                    }));
                }
                CollectEvent::Delete => {
                    self.collect_receiver = Some(spawn_request(&self.api, ctx, move |api| {
                        api.delete_collect(&project)
                    }));
                }
                CollectEvent::Update => {
                    self.collect_receiver = Some(spawn_request(&self.api, ctx, move |api| {
                        api.update_collect(&project)
                    }));
                }
            }
        }
    }

    fn handle_import_events(&mut self, ctx: &egui::Context, events: Vec<ImportEvent>) {
        for event in events {
            match event {
                ImportEvent::Notify(level, title, message) => {
                    self.notifications.push(level, title, message);
                }
                ImportEvent::Analyze(files, mode) => {
                    self.analyze_receiver = Some(spawn_request(&self.api, ctx, move |api| {
                        api.analyze_csv(&files, mode)
                    }));
                }
                ImportEvent::Import(request) => {
                    tracing::info!(
                        "Starting import {:?} ({} files, {})",
                        request.name,
                        request.files.len(),
                        request.source.as_str()
                    );
                    self.import_notice = Some(self.notifications.push_persistent(
                        Level::Info,
                        "Import in progress",
                        "Large files can take several minutes to import",
                    ));
                    self.import_receiver = Some(spawn_request(&self.api, ctx, move |api| {
                        api.import_csv(&request)
                    }));
                }
            }
        }
    }

    /// Crop a pending screenshot to the graph and write it
    fn handle_screenshot(&mut self, ctx: &egui::Context) {
        if !self.export_requested {
            return;
        }
        let image: Option<Arc<ColorImage>> = ctx.input(|i| {
            i.raw.events.iter().find_map(|e| match e {
                egui::Event::Screenshot { image, .. } => Some(image.clone()),
                _ => None,
            })
        });
        let Some(image) = image else {
            return;
        };
        self.export_requested = false;

        let Some(rect) = self.graph_view.last_rect else {
            return;
        };
        let Some(capture) = crop_capture(&image, rect, ctx.pixels_per_point()) else {
            self.notifications.error("Export failed", "The graph area is empty");
            return;
        };

        let dir = self.settings.export_dir.clone().unwrap_or_else(default_export_dir);
        let file_name = export_file_name(&self.settings.graph_query);
        match write_png(&dir, &file_name, &capture) {
            Ok(path) => self
                .notifications
                .success("Graph exported", path.display().to_string()),
            Err(e) => self.notifications.error("Export failed", e.to_string()),
        }
    }

    fn render_top_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Cocktail");
            ui.separator();
            for tab in [Tab::Charts, Tab::Communities, Tab::Collect, Tab::Import] {
                ui.selectable_value(&mut self.tab, tab, tab.label());
            }
            ui.separator();

            ui.label("Server:");
            ui.add(egui::TextEdit::singleline(&mut self.base_url_draft).desired_width(180.0));
            ui.label("Project:");
            ui.add(egui::TextEdit::singleline(&mut self.project_draft).desired_width(120.0));
            if ui.button("Connect").clicked() {
                self.apply_connection(ui.ctx());
            }

            match self.api_connected {
                Some(true) => ui.colored_label(theme::state::SUCCESS, "● Connected"),
                Some(false) => ui.colored_label(theme::state::ERROR, "● Disconnected"),
                None => ui.colored_label(theme::text::MUTED, "● Checking…"),
            };
            if self.is_loading() {
                ui.spinner();
            }
        });
    }

    fn render_charts(&mut self, ui: &mut egui::Ui) {
        if self.settings.project_id.is_empty() {
            ui.label("Enter a project id and press Connect");
            return;
        }

        let mut period = self.settings.period;
        if chart_widget::period_selector(ui, "chart_period", &mut period) {
            self.settings.period = period;
            for chart in [&mut self.tweets_chart, &mut self.hashtags_chart].into_iter().flatten() {
                chart.set_period(period);
            }
            self.mark_settings_dirty();
        }

        let mut drilldown = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            let width = ui.available_width();
            ui.heading(ChartKind::Tweets.title());
            match &self.tweets_chart {
                Some(chart) => drilldown = chart_widget::render_chart(ui, chart, "Tweets"),
                None if self.tweets_receiver.is_some() => theme::skeleton_rect(ui, width, 400.0),
                None => {
                    ui.colored_label(theme::text::MUTED, "No tweet data loaded");
                }
            }

            ui.add_space(16.0);
            ui.heading(ChartKind::Hashtags.title());
            match &mut self.hashtags_chart {
                Some(chart) => {
                    ui.columns(2, |cols| {
                        if let Some(url) = chart_widget::render_chart(&mut cols[0], chart, "Occurrences") {
                            drilldown = Some(url);
                        }
                        chart_widget::render_legend(&mut cols[1], chart);
                    });
                }
                None if self.hashtags_receiver.is_some() => theme::skeleton_rect(ui, width, 400.0),
                None => {
                    ui.colored_label(theme::text::MUTED, "No hashtag data loaded");
                }
            }
        });

        if let Some(url) = drilldown {
            tracing::info!("Opening {}", url);
            ui.ctx().open_url(egui::OpenUrl::new_tab(url));
        }
    }

    fn render_graph_controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("Community graph");
        ui.add_space(6.0);

        egui::Grid::new("graph_query").num_columns(2).show(ui, |ui| {
            ui.label("Interaction");
            ui.text_edit_singleline(&mut self.query_draft.tab);
            ui.end_row();
            ui.label("Community");
            ui.text_edit_singleline(&mut self.query_draft.community);
            ui.end_row();
            ui.label("Centrality");
            ui.text_edit_singleline(&mut self.query_draft.centrality);
            ui.end_row();
            ui.label("Max rank");
            ui.add(egui::DragValue::new(&mut self.query_draft.max_rank).range(1..=100_000));
            ui.end_row();
        });
        ui.checkbox(&mut self.query_draft.show_interaction, "Show interactions");

        ui.horizontal(|ui| {
            let enabled = !self.settings.project_id.is_empty() && self.graph_receiver.is_none();
            if ui.add_enabled(enabled, egui::Button::new("Load graph")).clicked() {
                self.settings.graph_query = self.query_draft.clone();
                self.mark_settings_dirty();
                self.load_graph(ui.ctx());
            }
            if ui
                .add_enabled(self.graph.is_some(), egui::Button::new("Export PNG"))
                .clicked()
            {
                self.export_requested = true;
                ui.ctx()
                    .send_viewport_cmd(egui::ViewportCommand::Screenshot);
            }
        });

        ui.add_space(8.0);
        egui::CollapsingHeader::new("Display").default_open(false).show(ui, |ui| {
            if ui
                .add(egui::Slider::new(&mut self.graph_view.node_scale, 0.5..=10.0).text("Node size"))
                .changed()
            {
                self.mark_settings_dirty();
            }
            if ui.checkbox(&mut self.graph_view.show_edges, "Show edges").changed() {
                self.mark_settings_dirty();
            }
            if ui.button("Fit to view").clicked() {
                self.graph_view.fit_pending = true;
            }
        });
    }

    fn render_neighbor_panel(&mut self, ui: &mut egui::Ui) {
        let Some(state) = self.graph.as_mut() else {
            return;
        };

        ui.add_space(8.0);
        ui.separator();
        ui.horizontal(|ui| {
            if state.selection.is_active() && ui.button("← Back").clicked() {
                state.select(None);
            }
            ui.strong(panel_title(&state.selection));
        });

        if !state.selection.is_active() {
            ui.colored_label(
                theme::text::SECONDARY,
                format!(
                    "{} accounts, {} links, {} communities",
                    state.graph.node_count(),
                    state.graph.edge_count(),
                    state.graph.communities().len()
                ),
            );
            ui.colored_label(theme::text::MUTED, "Click an account to see its connections");
            return;
        }

        let entries = neighbor_entries(&state.graph, &state.selection);
        if entries.is_empty() {
            ui.colored_label(theme::text::MUTED, "No connections");
            return;
        }

        let mut chosen = None;
        egui::ScrollArea::vertical().id_salt("neighbors").show(ui, |ui| {
            for entry in &entries {
                ui.horizontal(|ui| {
                    if ui.link(&entry.label).clicked() {
                        chosen = Some(entry.id.clone());
                    }
                    ui.hyperlink_to("profile ↗", &entry.profile_url);
                });
            }
        });
        if let Some(id) = chosen {
            state.select(Some(&id));
        }
    }

    fn render_communities(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("graph_sidebar")
            .min_width(260.0)
            .frame(
                egui::Frame::none()
                    .fill(theme::bg::PANEL)
                    .inner_margin(egui::Margin::same(10.0)),
            )
            .show(ctx, |ui| {
                self.render_graph_controls(ui);
                self.render_neighbor_panel(ui);
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(theme::bg::GRAPH))
            .show(ctx, |ui| match self.graph.as_mut() {
                Some(state) => {
                    if let Some(id) = self.graph_view.show(ui, state) {
                        state.select(Some(&id));
                    }
                }
                None if self.graph_receiver.is_some() => {
                    ui.centered_and_justified(|ui| ui.spinner());
                }
                None => {
                    ui.centered_and_justified(|ui| {
                        ui.colored_label(theme::text::ON_GRAPH, "No community graph loaded");
                    });
                }
            });
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.maybe_save_settings();
        self.poll_workers(ctx);
        self.handle_screenshot(ctx);

        if self.is_loading() {
            ctx.request_repaint_after(std::time::Duration::from_millis(250));
        }

        // Dark theme
        ctx.set_visuals(egui::Visuals::dark());

        egui::TopBottomPanel::top("top_bar")
            .frame(
                egui::Frame::none()
                    .fill(theme::bg::SURFACE)
                    .inner_margin(egui::Margin::symmetric(12.0, 8.0)),
            )
            .show(ctx, |ui| self.render_top_bar(ui));

        // Files can be dropped from any tab
        let mut import_events = self.import.take_dropped(ctx);
        if !import_events.is_empty() {
            self.tab = Tab::Import;
        }

        match self.tab {
            Tab::Charts => {
                egui::CentralPanel::default()
                    .frame(
                        egui::Frame::none()
                            .fill(theme::bg::PANEL)
                            .inner_margin(egui::Margin::same(12.0)),
                    )
                    .show(ctx, |ui| self.render_charts(ui));
            }
            Tab::Communities => self.render_communities(ctx),
            Tab::Collect => {
                let has_project = !self.settings.project_id.is_empty();
                let events = egui::CentralPanel::default()
                    .frame(
                        egui::Frame::none()
                            .fill(theme::bg::PANEL)
                            .inner_margin(egui::Margin::same(12.0)),
                    )
                    .show(ctx, |ui| {
                        egui::ScrollArea::vertical()
                            .show(ui, |ui| self.collect.show(ui, has_project))
                            .inner
                    })
                    .inner;
                self.handle_collect_events(ctx, events);
            }
            Tab::Import => {
                egui::CentralPanel::default()
                    .frame(
                        egui::Frame::none()
                            .fill(theme::bg::PANEL)
                            .inner_margin(egui::Margin::same(12.0)),
                    )
                    .show(ctx, |ui| {
                        egui::ScrollArea::vertical().show(ui, |ui| {
                            import_events.extend(self.import.show(ui));
                        });
                    });
            }
        }
        self.handle_import_events(ctx, import_events);

        self.notifications.show(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        // Force save settings on exit
        if self.settings_dirty {
            self.sync_settings_from_ui();
            self.settings.save();
        }
    }
}

/// Success text for a finished import
fn import_summary(response: &ImportResponse) -> String {
    let mut text = format!("{} rows imported", response.rows_imported);
    if response.errors > 0 {
        text.push_str(&format!(" ({} errors)", response.errors));
    }
    text
}

/// Cut the graph area out of a full-window screenshot.
///
/// `rect` is in points; the screenshot is in physical pixels.
fn crop_capture(image: &ColorImage, rect: Rect, pixels_per_point: f32) -> Option<ColorImage> {
    let [width, height] = image.size;
    let to_px = |v: f32, max: usize| ((v * pixels_per_point).round().max(0.0) as usize).min(max);
    let (x0, x1) = (to_px(rect.min.x, width), to_px(rect.max.x, width));
    let (y0, y1) = (to_px(rect.min.y, height), to_px(rect.max.y, height));
    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    let mut pixels = Vec::with_capacity((x1 - x0) * (y1 - y0));
    for y in y0..y1 {
        pixels.extend_from_slice(&image.pixels[y * width + x0..y * width + x1]);
    }
    Some(ColorImage {
        size: [x1 - x0, y1 - y0],
        pixels,
    })
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
