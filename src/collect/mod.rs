//! Keyword collection from Twitter and Bluesky, run by the analysis server.

pub mod form;
pub mod widget;

pub use widget::{CollectEvent, CollectPanel};
