//! API client module for communicating with the analysis server.

mod client;
pub mod types;

pub use client::{ApiClient, ApiResult, ImportRequest, DEFAULT_API_BASE};
pub use types::{
    AnalyzeResponse, CollectRequest, CollectResponse, CsvAnalysis, GraphQuery, ImportMode,
    ImportResponse, Source,
};
