//! CSV import: form state machine and the import tab.

pub mod form;
pub mod widget;

pub use widget::{ImportEvent, ImportPanel};
