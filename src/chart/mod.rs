//! Time-series charts: period bucketing, chart state and plot rendering.

pub mod bucket;
pub mod period;
pub mod state;
pub mod types;
pub mod widget;

pub use period::Period;
pub use state::{ChartKind, ChartState};
pub use types::Series;
