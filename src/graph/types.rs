//! Community graph data: wire records from the server and the in-memory graph.

use super::normalize::{observed_range, rescale, EDGE_WIDTH_RANGE, NODE_SIZE_RANGE};
use crate::theme;
use egui::{Color32, Pos2};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};

/// Node as sent by the server (pyvis export)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub size: f64,
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
    /// Community the node belongs to
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub group: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Edge as sent by the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub from: String,
    #[serde(deserialize_with = "string_or_number")]
    pub to: String,
    #[serde(default, alias = "weight")]
    pub size: f64,
    #[serde(default)]
    pub color: Option<String>,
}

/// `{ nodes, edges }` payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphPayload {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
}

impl From<Scalar> for String {
    fn from(s: Scalar) -> Self {
        match s {
            Scalar::Str(s) => s,
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Scalar::deserialize(d).map(String::from)
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Option::<Scalar>::deserialize(d).map(|s| s.map(String::from))
}

/// A node of the community graph
#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub title: Option<String>,
    pub community: Option<String>,
    pub color: Color32,
    /// Server size (centrality score) rescaled to [`NODE_SIZE_RANGE`]
    pub display_size: f32,
    /// Server layout position, if any
    pub position: Option<Pos2>,
}

/// An undirected link between two nodes
#[derive(Debug, Clone)]
pub struct Edge {
    /// Server weight rescaled to [`EDGE_WIDTH_RANGE`]
    pub width: f32,
    pub color: Option<Color32>,
}

/// Borrowed view of an edge with its endpoint ids
#[derive(Debug, Clone, Copy)]
pub struct EdgeView<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub edge: &'a Edge,
}

impl EdgeView<'_> {
    /// Whether `id` is one of the edge's endpoints
    pub fn has_extremity(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }
}

/// Community graph built once per load. Display sizes are fixed at build time.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    inner: UnGraph<Node, Edge>,
    index: HashMap<String, NodeIndex>,
}

impl Graph {
    /// Build from the server payload, normalizing display sizes.
    ///
    /// Duplicate node ids keep the first record. Edges to unknown nodes and
    /// repeated edges between the same pair are dropped.
    pub fn from_payload(payload: GraphPayload) -> Self {
        let mut seen = HashSet::new();
        let nodes: Vec<NodeRecord> = payload
            .nodes
            .into_iter()
            .filter(|record| {
                let fresh = seen.insert(record.id.clone());
                if !fresh {
                    tracing::warn!("Duplicate node {} ignored", record.id);
                }
                fresh
            })
            .collect();

        let mut pairs = HashSet::new();
        let total_edges = payload.edges.len();
        let edges: Vec<EdgeRecord> = payload
            .edges
            .into_iter()
            .filter(|record| {
                if !seen.contains(&record.from) || !seen.contains(&record.to) {
                    return false;
                }
                let pair = if record.from <= record.to {
                    (record.from.clone(), record.to.clone())
                } else {
                    (record.to.clone(), record.from.clone())
                };
                pairs.insert(pair)
            })
            .collect();
        let dropped = total_edges - edges.len();

        // Ranges over what is actually kept
        let node_range = observed_range(nodes.iter().map(|n| n.size));
        let edge_range = observed_range(edges.iter().map(|e| e.size));

        let mut graph = Graph::default();

        for record in nodes {
            let color = record
                .color
                .as_deref()
                .and_then(theme::parse_css_color)
                .unwrap_or_else(|| theme::community_color(record.group.as_deref()));
            let position = match (record.x, record.y) {
                (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some(Pos2::new(x, y)),
                _ => None,
            };
            let node = Node {
                label: record.label.clone().unwrap_or_else(|| record.id.clone()),
                id: record.id.clone(),
                title: record.title,
                community: record.group,
                color,
                display_size: rescale(record.size, node_range, NODE_SIZE_RANGE),
                position,
            };
            let idx = graph.inner.add_node(node);
            graph.index.insert(record.id, idx);
        }

        for record in edges {
            let (Some(&a), Some(&b)) = (graph.index.get(&record.from), graph.index.get(&record.to))
            else {
                continue;
            };
            let edge = Edge {
                width: rescale(record.size, edge_range, EDGE_WIDTH_RANGE),
                color: record.color.as_deref().and_then(theme::parse_css_color),
            };
            graph.inner.add_edge(a, b, edge);
        }

        if dropped > 0 {
            tracing::warn!("Dropped {} edges with unknown or repeated endpoints", dropped);
        }
        tracing::info!(
            "Built graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        graph
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&idx| &self.inner[idx])
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.inner.node_weights()
    }

    /// Edge endpoints as positions in [`Graph::nodes`] order
    pub fn edge_endpoints(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.inner
            .edge_references()
            .map(|e| (e.source().index(), e.target().index()))
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeView<'_>> {
        self.inner.edge_references().map(move |e| EdgeView {
            source: &self.inner[e.source()].id,
            target: &self.inner[e.target()].id,
            edge: e.weight(),
        })
    }

    /// Neighbours of `id` in the graph's iteration order, each listed once.
    /// A self-loop does not make a node its own neighbour.
    pub fn neighbors(&self, id: &str) -> Vec<&str> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        self.inner
            .neighbors(idx)
            .filter(|&n| n != idx && seen.insert(n))
            .map(|n| self.inner[n].id.as_str())
            .collect()
    }

    /// Distinct communities, sorted
    pub fn communities(&self) -> Vec<&str> {
        let mut communities: Vec<&str> = self
            .nodes()
            .filter_map(|n| n.community.as_deref())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        communities.sort_unstable();
        communities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn payload(json: &str) -> GraphPayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_pyvis_payload() {
        let p = payload(
            r##"{"nodes":[{"id":"alice","size":3.5,"x":12.0,"y":-4.0,"group":2,"title":"Rank: 1","color":"rgb(10,20,30)"},
                         {"id":42,"size":1}],
                "edges":[{"from":"alice","to":42,"weight":0.7,"color":"#ff0000"}]}"##,
        );
        assert_eq!(p.nodes[0].group.as_deref(), Some("2"));
        assert_eq!(p.nodes[1].id, "42");
        assert_eq!(p.edges[0].to, "42");
        assert_eq!(p.edges[0].size, 0.7);

        let g = Graph::from_payload(p);
        let alice = g.node("alice").unwrap();
        assert_eq!(alice.position, Some(Pos2::new(12.0, -4.0)));
        assert_eq!(alice.color, Color32::from_rgb(10, 20, 30));
        assert_eq!(alice.display_size, 7.0);
        assert_eq!(g.node("42").unwrap().display_size, 1.0);
        assert_eq!(g.node("42").unwrap().position, None);
    }

    #[test]
    fn drops_unknown_and_repeated_edges() {
        let g = Graph::from_payload(payload(
            r#"{"nodes":[{"id":"a","size":1},{"id":"b","size":2}],
                "edges":[{"from":"a","to":"b","size":1},{"from":"b","to":"a","size":5},{"from":"a","to":"zzz","size":1}]}"#,
        ));
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.neighbors("a"), vec!["b"]);
        assert_eq!(g.neighbors("b"), vec!["a"]);
    }

    #[test]
    fn neighbors_are_undirected_and_unique() {
        let g = Graph::from_payload(payload(
            r#"{"nodes":[{"id":"a"},{"id":"b"},{"id":"c"},{"id":"d"}],
                "edges":[{"from":"a","to":"b"},{"from":"c","to":"a"},{"from":"a","to":"a"}]}"#,
        ));
        let mut n = g.neighbors("a");
        n.sort_unstable();
        assert_eq!(n, vec!["b", "c"]);
        assert!(g.neighbors("d").is_empty());
        assert!(g.neighbors("missing").is_empty());
    }

    #[test]
    fn equal_sizes_stay_finite() {
        let g = Graph::from_payload(payload(
            r#"{"nodes":[{"id":"a","size":3},{"id":"b","size":3}],"edges":[{"from":"a","to":"b","size":2}]}"#,
        ));
        for node in g.nodes() {
            assert!(node.display_size.is_finite());
            assert_eq!(node.display_size, 4.0);
        }
        let edge = g.edges().next().unwrap();
        assert!((edge.edge.width - 0.35).abs() < 1e-6);
    }

    #[test]
    fn dropped_records_do_not_widen_ranges() {
        let g = Graph::from_payload(payload(
            r#"{"nodes":[{"id":"a","size":1},{"id":"b","size":2},{"id":"c","size":3},{"id":"a","size":900}],
                "edges":[{"from":"a","to":"b","size":1},{"from":"b","to":"c","size":2},
                         {"from":"a","to":"ghost","size":1000},{"from":"c","to":"b","size":-50}]}"#,
        ));
        assert_eq!(g.edge_count(), 2);
        let widths: Vec<f32> = g.edges().map(|e| e.edge.width).collect();
        assert!((widths[0] - 0.2).abs() < 1e-6);
        assert!((widths[1] - 0.5).abs() < 1e-6);

        assert_eq!(g.node("a").unwrap().display_size, 1.0);
        assert_eq!(g.node("b").unwrap().display_size, 4.0);
        assert_eq!(g.node("c").unwrap().display_size, 7.0);
    }

    #[test]
    fn edge_widths_use_edge_range() {
        let g = Graph::from_payload(payload(
            r#"{"nodes":[{"id":"a","size":100},{"id":"b","size":1},{"id":"c","size":50}],
                "edges":[{"from":"a","to":"b","size":1},{"from":"b","to":"c","size":3}]}"#,
        ));
        let widths: Vec<f32> = g.edges().map(|e| e.edge.width).collect();
        assert!((widths[0] - 0.2).abs() < 1e-6);
        assert!((widths[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn lists_communities() {
        let g = Graph::from_payload(payload(
            r#"{"nodes":[{"id":"a","group":2},{"id":"b","group":1},{"id":"c","group":2},{"id":"d"}]}"#,
        ));
        assert_eq!(g.communities(), vec!["1", "2"]);
    }
}
