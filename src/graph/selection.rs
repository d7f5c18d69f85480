//! Neighbour selection: pure state transitions and per-redraw display reducers.

use super::types::{EdgeView, Graph, Node};
use std::collections::HashSet;

/// Selected node and its neighbour set. Both are set or unset together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected_node: Option<String>,
    selected_neighbors: Option<HashSet<String>>,
}

impl SelectionState {
    pub fn selected_node(&self) -> Option<&str> {
        self.selected_node.as_deref()
    }

    pub fn selected_neighbors(&self) -> Option<&HashSet<String>> {
        self.selected_neighbors.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.selected_node.is_some()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_node.as_deref() == Some(id)
    }

    pub fn is_neighbor(&self, id: &str) -> bool {
        self.selected_neighbors
            .as_ref()
            .is_some_and(|n| n.contains(id))
    }
}

/// Next selection after a click on `node` (or a clear when `None`).
///
/// Clicking the selected node again clears the selection, as does an id the
/// graph does not know.
pub fn select_node(graph: &Graph, current: &SelectionState, node: Option<&str>) -> SelectionState {
    let Some(id) = node else {
        return SelectionState::default();
    };
    if current.is_selected(id) {
        return SelectionState::default();
    }
    if !graph.contains(id) {
        tracing::warn!("Ignoring selection of unknown node {}", id);
        return SelectionState::default();
    }

    let neighbors = graph
        .neighbors(id)
        .into_iter()
        .map(str::to_string)
        .collect();

    SelectionState {
        selected_node: Some(id.to_string()),
        selected_neighbors: Some(neighbors),
    }
}

/// Transient display overrides for a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeDisplay {
    pub hidden: bool,
    pub highlighted: bool,
}

/// Transient display overrides for an edge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeDisplay {
    pub hidden: bool,
}

pub fn node_reducer(node: &Node, state: &SelectionState) -> NodeDisplay {
    if !state.is_active() {
        return NodeDisplay::default();
    }
    let selected = state.is_selected(&node.id);
    NodeDisplay {
        hidden: !selected && !state.is_neighbor(&node.id),
        highlighted: selected,
    }
}

pub fn edge_reducer(edge: &EdgeView<'_>, state: &SelectionState) -> EdgeDisplay {
    match state.selected_node() {
        Some(selected) => EdgeDisplay {
            hidden: !edge.has_extremity(selected),
        },
        None => EdgeDisplay::default(),
    }
}

/// One row of the neighbour side panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborEntry {
    pub id: String,
    pub label: String,
    pub profile_url: String,
}

/// Neighbours of the selected node, in the graph's neighbour order
pub fn neighbor_entries(graph: &Graph, state: &SelectionState) -> Vec<NeighborEntry> {
    let Some(selected) = state.selected_node() else {
        return Vec::new();
    };
    graph
        .neighbors(selected)
        .into_iter()
        .filter_map(|id| graph.node(id))
        .map(|node| NeighborEntry {
            id: node.id.clone(),
            label: format!("@{}", node.label),
            profile_url: profile_url(&node.id),
        })
        .collect()
}

pub fn profile_url(id: &str) -> String {
    format!("https://twitter.com/{}", urlencoding::encode(id))
}

pub fn panel_title(state: &SelectionState) -> String {
    match state.selected_node() {
        Some(id) => format!("Connections of {}", id),
        None => "Full community".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::GraphPayload;

    fn graph() -> Graph {
        let payload: GraphPayload = serde_json::from_str(
            r#"{"nodes":[{"id":"a","size":5},{"id":"b","size":2},{"id":"c","size":1},
                         {"id":"d","size":1},{"id":"lonely","size":1}],
                "edges":[{"from":"a","to":"b"},{"from":"c","to":"a"},{"from":"b","to":"d"}]}"#,
        )
        .unwrap();
        Graph::from_payload(payload)
    }

    fn set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn selects_with_undirected_neighbors() {
        let g = graph();
        let state = select_node(&g, &SelectionState::default(), Some("a"));
        assert_eq!(state.selected_node(), Some("a"));
        assert_eq!(state.selected_neighbors(), Some(&set(&["b", "c"])));

        let state = select_node(&g, &state, Some("c"));
        assert_eq!(state.selected_node(), Some("c"));
        assert_eq!(state.selected_neighbors(), Some(&set(&["a"])));
    }

    #[test]
    fn selecting_twice_toggles_off() {
        let g = graph();
        let once = select_node(&g, &SelectionState::default(), Some("b"));
        let twice = select_node(&g, &once, Some("b"));
        assert_eq!(twice, SelectionState::default());
        assert_eq!(twice.selected_neighbors(), None);
    }

    #[test]
    fn none_and_unknown_ids_clear() {
        let g = graph();
        let state = select_node(&g, &SelectionState::default(), Some("a"));
        assert!(!select_node(&g, &state, None).is_active());
        assert!(!select_node(&g, &state, Some("ghost")).is_active());
    }

    #[test]
    fn isolated_node_hides_everything_else() {
        let g = graph();
        let state = select_node(&g, &SelectionState::default(), Some("lonely"));
        assert_eq!(state.selected_neighbors(), Some(&HashSet::new()));

        for node in g.nodes() {
            let display = node_reducer(node, &state);
            if node.id == "lonely" {
                assert_eq!(display, NodeDisplay { hidden: false, highlighted: true });
            } else {
                assert!(display.hidden, "{} should be hidden", node.id);
            }
        }
        assert!(g.edges().all(|e| edge_reducer(&e, &state).hidden));
    }

    #[test]
    fn reducers_without_selection_change_nothing() {
        let g = graph();
        let state = SelectionState::default();
        assert!(g.nodes().all(|n| node_reducer(n, &state) == NodeDisplay::default()));
        assert!(g.edges().all(|e| edge_reducer(&e, &state) == EdgeDisplay::default()));
    }

    #[test]
    fn reducers_follow_selection() {
        let g = graph();
        let state = select_node(&g, &SelectionState::default(), Some("b"));

        let shown: Vec<&str> = g
            .nodes()
            .filter(|n| !node_reducer(n, &state).hidden)
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(shown, vec!["a", "b", "d"]);
        assert!(!node_reducer(g.node("a").unwrap(), &state).highlighted);

        // c-a does not touch the selection
        let visible_edges: Vec<(&str, &str)> = g
            .edges()
            .filter(|e| !edge_reducer(e, &state).hidden)
            .map(|e| (e.source, e.target))
            .collect();
        assert_eq!(visible_edges, vec![("a", "b"), ("b", "d")]);
    }

    #[test]
    fn side_panel_entries() {
        let g = graph();
        assert!(neighbor_entries(&g, &SelectionState::default()).is_empty());
        assert_eq!(panel_title(&SelectionState::default()), "Full community");

        let state = select_node(&g, &SelectionState::default(), Some("a"));
        let entries = neighbor_entries(&g, &state);
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, g.neighbors("a"));
        assert_eq!(ids.iter().copied().collect::<HashSet<_>>(), HashSet::from(["b", "c"]));
        assert_eq!(entries[0].label, format!("@{}", entries[0].id));
        assert_eq!(entries[0].profile_url, format!("https://twitter.com/{}", entries[0].id));
        assert_eq!(panel_title(&state), "Connections of a");

        // Clicking an entry chains the exploration
        let next = select_node(&g, &state, Some(&entries[0].id));
        assert_eq!(next.selected_node(), Some(entries[0].id.as_str()));
    }
}
