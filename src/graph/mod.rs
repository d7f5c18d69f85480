//! Community graph: data, neighbour selection, layout and export.

pub mod export;
pub mod layout;
pub mod normalize;
mod quadtree;
pub mod selection;
pub mod state;
pub mod types;
pub mod view;

pub use selection::{neighbor_entries, panel_title};
pub use state::GraphState;
pub use types::{Graph, GraphPayload};
pub use view::GraphView;
