//! View state for one loaded community graph.

use super::selection::{select_node, SelectionState};
use super::types::Graph;
use egui::{Pos2, Rect, Vec2};
use rand::Rng;

/// A loaded graph plus everything the view mutates frame to frame
pub struct GraphState {
    pub graph: Graph,
    /// Positions in graph space, indexed like [`Graph::nodes`]
    pub positions: Vec<Pos2>,
    pub velocities: Vec<Vec2>,
    /// Nodes placed by the server layout stay where they are
    pub pinned: Vec<bool>,
    pub selection: SelectionState,
    pub hovered: Option<usize>,
    pub physics_enabled: bool,
}

impl GraphState {
    /// Place nodes at their server positions, scattering the rest inside `seed_area`.
    pub fn new(graph: Graph, seed_area: Rect) -> Self {
        let mut rng = rand::thread_rng();
        let mut positions = Vec::with_capacity(graph.node_count());
        let mut pinned = Vec::with_capacity(graph.node_count());

        for node in graph.nodes() {
            match node.position {
                Some(pos) => {
                    positions.push(pos);
                    pinned.push(true);
                }
                None => {
                    let x = rng.gen_range(seed_area.min.x..=seed_area.max.x);
                    let y = rng.gen_range(seed_area.min.y..=seed_area.max.y);
                    positions.push(Pos2::new(x, y));
                    pinned.push(false);
                }
            }
        }

        let physics_enabled = pinned.iter().any(|p| !p);
        if physics_enabled {
            tracing::debug!(
                "{} of {} nodes have no server position, running layout",
                pinned.iter().filter(|p| !**p).count(),
                pinned.len()
            );
        }

        Self {
            velocities: vec![Vec2::ZERO; positions.len()],
            graph,
            positions,
            pinned,
            selection: SelectionState::default(),
            hovered: None,
            physics_enabled,
        }
    }

    /// Apply a click on `id` (or a clear) through the pure selector
    pub fn select(&mut self, id: Option<&str>) {
        self.selection = select_node(&self.graph, &self.selection, id);
    }

    /// Bounding box of all node positions
    pub fn extent(&self) -> Option<Rect> {
        let mut rect = Rect::NOTHING;
        for pos in &self.positions {
            rect.extend_with(*pos);
        }
        (rect.min.x <= rect.max.x).then_some(rect)
    }

    pub fn hovered_id(&self) -> Option<&str> {
        let i = self.hovered?;
        self.graph.nodes().nth(i).map(|n| n.id.as_str())
    }
}
