//! Painter-based rendering of the community graph.

use super::layout::ForceLayout;
use super::selection::{edge_reducer, node_reducer};
use super::state::GraphState;
use crate::theme;
use egui::{Color32, Pos2, Rect, Sense, Stroke, Vec2};

/// Extra pick radius around a node, in screen points
const PICK_SLOP: f32 = 6.0;

/// Graph space to screen space: `screen = anchor + (pos - origin) * zoom + pan`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub origin: Pos2,
    pub zoom: f32,
    pub pan: Vec2,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            origin: Pos2::ZERO,
            zoom: 1.0,
            pan: Vec2::ZERO,
        }
    }
}

impl ViewTransform {
    /// Transform showing `extent` inside `rect` with a margin
    pub fn fit(extent: Rect, rect: Rect) -> Self {
        let margin = 40.0;
        let avail = (rect.size() - Vec2::splat(2.0 * margin)).max(Vec2::splat(1.0));
        let w = extent.width().max(1.0);
        let h = extent.height().max(1.0);
        let zoom = (avail.x / w).min(avail.y / h).clamp(0.001, 20.0);
        Self {
            origin: extent.center(),
            zoom,
            pan: Vec2::ZERO,
        }
    }

    pub fn to_screen(&self, anchor: Pos2, pos: Pos2) -> Pos2 {
        anchor + (pos - self.origin) * self.zoom + self.pan
    }

    pub fn to_graph(&self, anchor: Pos2, screen: Pos2) -> Pos2 {
        self.origin + (screen - anchor - self.pan) / self.zoom
    }

    /// Zoom by `factor` keeping the point under `cursor` fixed
    pub fn zoom_at(&mut self, anchor: Pos2, cursor: Pos2, factor: f32) {
        let new_zoom = (self.zoom * factor).clamp(0.001, 50.0);
        let cursor_offset = cursor - anchor - self.pan;
        self.pan += cursor_offset * (1.0 - new_zoom / self.zoom);
        self.zoom = new_zoom;
    }
}

/// Index of the visible node under `pointer`, closest first
pub fn pick_node(
    state: &GraphState,
    transform: &ViewTransform,
    anchor: Pos2,
    pointer: Pos2,
    radius_of: impl Fn(usize) -> f32,
) -> Option<usize> {
    state
        .graph
        .nodes()
        .enumerate()
        .filter(|(_, node)| !node_reducer(node, &state.selection).hidden)
        .filter_map(|(i, _)| {
            let screen = transform.to_screen(anchor, state.positions[i]);
            let distance = screen.distance(pointer);
            (distance <= radius_of(i) + PICK_SLOP).then_some((i, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Pan/zoom state and drawing options for the graph canvas
pub struct GraphView {
    pub transform: ViewTransform,
    pub layout: ForceLayout,
    /// Multiplier on normalized node sizes
    pub node_scale: f32,
    pub show_edges: bool,
    /// Fit the graph on the next frame
    pub fit_pending: bool,
    /// Canvas rect of the last frame, used to crop exports
    pub last_rect: Option<Rect>,
}

impl Default for GraphView {
    fn default() -> Self {
        Self {
            transform: ViewTransform::default(),
            layout: ForceLayout::default(),
            node_scale: 3.0,
            show_edges: true,
            fit_pending: true,
            last_rect: None,
        }
    }
}

impl GraphView {
    /// Draw the graph. Returns `Some(id)` when a node was clicked.
    pub fn show(&mut self, ui: &mut egui::Ui, state: &mut GraphState) -> Option<String> {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;
        let anchor = rect.center();
        self.last_rect = Some(rect);

        painter.rect_filled(rect, 0.0, theme::bg::GRAPH);

        if state.graph.is_empty() {
            painter.text(
                anchor,
                egui::Align2::CENTER_CENTER,
                "No nodes in this community graph",
                egui::FontId::proportional(18.0),
                theme::text::MUTED,
            );
            return None;
        }

        if state.physics_enabled {
            self.layout.step(state, Pos2::ZERO);
            if self.layout.is_settled(state) {
                state.physics_enabled = false;
                self.fit_pending = true;
            } else {
                ui.ctx().request_repaint();
            }
        }

        if self.fit_pending {
            if let Some(extent) = state.extent() {
                self.transform = ViewTransform::fit(extent, rect);
            }
            self.fit_pending = false;
        }

        self.handle_input(ui, &response, anchor);

        let transform = self.transform;
        let to_screen = |pos: Pos2| transform.to_screen(anchor, pos);

        let size_factor = self.node_scale * transform.zoom.sqrt().clamp(0.5, 3.0);
        let radii: Vec<f32> = state
            .graph
            .nodes()
            .map(|n| n.display_size * size_factor)
            .collect();
        state.hovered = response
            .hover_pos()
            .and_then(|p| pick_node(state, &transform, anchor, p, |i| radii[i]));

        if self.show_edges {
            let colors: Vec<Color32> = state.graph.nodes().map(|n| n.color).collect();
            for (view, (a, b)) in state.graph.edges().zip(state.graph.edge_endpoints()) {
                if edge_reducer(&view, &state.selection).hidden {
                    continue;
                }
                let color = view.edge.color.unwrap_or_else(|| colors[a].gamma_multiply(0.6));
                let width = (view.edge.width * transform.zoom.sqrt() * 2.0).max(0.5);
                painter.line_segment(
                    [to_screen(state.positions[a]), to_screen(state.positions[b])],
                    Stroke::new(width, color),
                );
            }
        }

        let mut labels = Vec::new();
        for (i, node) in state.graph.nodes().enumerate() {
            let display = node_reducer(node, &state.selection);
            if display.hidden {
                continue;
            }
            let center = to_screen(state.positions[i]);
            if !rect.expand(radii[i]).contains(center) {
                continue;
            }
            let hovered = state.hovered == Some(i);
            let radius = if hovered || display.highlighted { radii[i] * 1.3 } else { radii[i] };

            painter.circle_filled(center, radius, node.color);
            let (stroke_color, stroke_width) = if display.highlighted {
                (theme::state::SELECTED, theme::stroke_width::SELECTED)
            } else if hovered {
                (theme::state::HOVER, theme::stroke_width::HOVER)
            } else {
                (node.color.gamma_multiply(0.7), theme::stroke_width::NORMAL)
            };
            painter.circle_stroke(center, radius, Stroke::new(stroke_width, stroke_color));

            if display.highlighted || hovered || state.selection.is_neighbor(&node.id) {
                labels.push((center + Vec2::new(radius + 4.0, 0.0), node.label.clone()));
            }
        }

        for (pos, label) in labels {
            painter.text(
                pos,
                egui::Align2::LEFT_CENTER,
                label,
                egui::FontId::proportional(12.0),
                theme::text::ON_GRAPH,
            );
        }

        let hovered = state.hovered_id().and_then(|id| state.graph.node(id));
        if let Some(title) = hovered.and_then(|n| n.title.as_deref()).filter(|t| !t.is_empty()) {
            response.clone().on_hover_text(title);
        }

        if response.clicked() {
            return hovered.map(|n| n.id.clone());
        }
        None
    }

    fn handle_input(&mut self, ui: &egui::Ui, response: &egui::Response, anchor: Pos2) {
        if response.dragged_by(egui::PointerButton::Primary) {
            self.transform.pan += response.drag_delta();
        }

        if !response.hovered() {
            return;
        }
        let (scroll, zoom) = ui.input(|i| (i.smooth_scroll_delta, i.zoom_delta()));
        if let Some(cursor) = response.hover_pos() {
            if zoom != 1.0 {
                self.transform.zoom_at(anchor, cursor, zoom);
            } else if scroll.y != 0.0 {
                self.transform.zoom_at(anchor, cursor, (scroll.y * 0.002).exp());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::{Graph, GraphPayload};

    fn state() -> GraphState {
        let payload: GraphPayload = serde_json::from_str(
            r#"{"nodes":[{"id":"a","x":0,"y":0},{"id":"b","x":100,"y":0},{"id":"c","x":0,"y":100}],
                "edges":[{"from":"a","to":"b"}]}"#,
        )
        .unwrap();
        GraphState::new(Graph::from_payload(payload), Rect::ZERO)
    }

    #[test]
    fn transform_round_trips() {
        let t = ViewTransform {
            origin: Pos2::new(50.0, 50.0),
            zoom: 2.0,
            pan: Vec2::new(10.0, -5.0),
        };
        let anchor = Pos2::new(400.0, 300.0);
        let p = Pos2::new(12.0, -7.0);
        let back = t.to_graph(anchor, t.to_screen(anchor, p));
        assert!((back - p).length() < 1e-4);
    }

    #[test]
    fn fit_centres_extent() {
        let extent = Rect::from_min_max(Pos2::new(-1000.0, -500.0), Pos2::new(1000.0, 500.0));
        let rect = Rect::from_min_size(Pos2::ZERO, Vec2::new(840.0, 640.0));
        let t = ViewTransform::fit(extent, rect);
        assert!((t.zoom - 0.38).abs() < 1e-4);
        assert_eq!(t.to_screen(rect.center(), extent.center()), rect.center());
    }

    #[test]
    fn zoom_keeps_cursor_point_fixed() {
        let mut t = ViewTransform::default();
        let anchor = Pos2::new(100.0, 100.0);
        let cursor = Pos2::new(150.0, 80.0);
        let under = t.to_graph(anchor, cursor);
        t.zoom_at(anchor, cursor, 2.0);
        assert!((t.to_screen(anchor, under) - cursor).length() < 1e-3);
    }

    #[test]
    fn picks_nearest_visible_node() {
        let mut s = state();
        let t = ViewTransform::default();
        let anchor = Pos2::ZERO;
        assert_eq!(pick_node(&s, &t, anchor, Pos2::new(2.0, 1.0), |_| 5.0), Some(0));
        assert_eq!(pick_node(&s, &t, anchor, Pos2::new(50.0, 50.0), |_| 5.0), None);

        // c is hidden once a is selected
        s.select(Some("a"));
        assert_eq!(pick_node(&s, &t, anchor, Pos2::new(0.0, 99.0), |_| 5.0), None);
        assert_eq!(pick_node(&s, &t, anchor, Pos2::new(99.0, 0.0), |_| 5.0), Some(1));
    }
}
