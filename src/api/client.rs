//! Blocking HTTP client for the Cocktail analysis server.
//!
//! Calls are made from worker threads; nothing here touches the UI.

use super::types::{
    AnalyzeResponse, CollectRequest, CollectResponse, CsvAnalysis, ErrorBody, GraphQuery,
    ImportMode, ImportResponse, Source,
};
use crate::chart::Series;
use crate::graph::GraphPayload;
use reqwest::blocking::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:3000";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Failed to connect to the server: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server returned {status}")]
    Status {
        status: reqwest::StatusCode,
        /// `message` field of the error body, when present
        message: Option<String>,
    },

    #[error("Failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Cannot read {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// Text for a notification: the server's own message if it sent one
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Everything needed to submit an import
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub files: Vec<PathBuf>,
    pub mode: ImportMode,
    pub schema_name: String,
    pub source: Source,
    pub name: String,
    pub analysis: CsvAnalysis,
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    /// Long imports must not hit the default request timeout
    upload_client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });
        let upload_client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .unwrap_or_else(|_| client.clone());

        Self {
            client,
            upload_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the server answers
    pub fn health(&self) -> ApiResult<()> {
        let url = format!("{}/health", self.base_url);
        check_status(self.client.get(&url).send()?)?;
        Ok(())
    }

    pub fn fetch_graph(&self, project: &str, query: &GraphQuery) -> ApiResult<GraphPayload> {
        let url = graph_url(&self.base_url, project, query);
        tracing::debug!("GET {}", url);
        decode(self.client.get(&url).send()?)
    }

    /// Tweet volume per day
    pub fn fetch_tweets_chart(&self, project: &str) -> ApiResult<Series> {
        let url = format!(
            "{}/api/projets/{}/charts/tweets",
            self.base_url,
            urlencoding::encode(project)
        );
        decode(self.client.get(&url).send()?)
    }

    /// Frequency per day for each hashtag
    pub fn fetch_hashtags_chart(&self, project: &str) -> ApiResult<Vec<Series>> {
        let url = format!(
            "{}/api/projets/{}/charts/hashtags",
            self.base_url,
            urlencoding::encode(project)
        );
        decode(self.client.get(&url).send()?)
    }

    pub fn analyze_csv(&self, files: &[PathBuf], mode: ImportMode) -> ApiResult<AnalyzeResponse> {
        let url = format!("{}/api/import/csv/analyze", self.base_url);
        let form = attach_files(multipart::Form::new(), files)?.text("mode", mode.as_str());
        decode(self.upload_client.post(&url).multipart(form).send()?)
    }

    pub fn import_csv(&self, request: &ImportRequest) -> ApiResult<ImportResponse> {
        let url = format!("{}/api/import/csv", self.base_url);
        let analysis = serde_json::to_string(&request.analysis)?;
        let form = attach_files(multipart::Form::new(), &request.files)?
            .text("mode", request.mode.as_str())
            .text("schema_name", request.schema_name.clone())
            .text("source", request.source.as_str())
            .text("name", request.name.clone())
            .text("analysis", analysis);
        decode(self.upload_client.post(&url).multipart(form).send()?)
    }

    /// Run a keyword collection. The server answers once every keyword and
    /// network has been collected, so this uses the upload client.
    pub fn start_collect(&self, project: &str, request: &CollectRequest) -> ApiResult<CollectResponse> {
        let url = collect_url(&self.base_url, project, "start");
        tracing::debug!("POST {}", url);
        decode(self.upload_client.post(&url).json(request).send()?)
    }

    /// Drop everything collected so far
    pub fn delete_collect(&self, project: &str) -> ApiResult<CollectResponse> {
        let url = collect_url(&self.base_url, project, "delete");
        decode(self.client.post(&url).send()?)
    }

    /// Re-run the processing pipeline over collected data
    pub fn update_collect(&self, project: &str) -> ApiResult<CollectResponse> {
        let url = collect_url(&self.base_url, project, "update");
        decode(self.upload_client.post(&url).send()?)
    }

    /// Page listing tweets behind a tweet-volume point
    pub fn tweets_result_path(&self, project: &str) -> String {
        format!("{}/projets/{}/resultat", self.base_url, urlencoding::encode(project))
    }

    /// Page listing tweets behind a hashtag point
    pub fn hashtags_result_path(&self, project: &str) -> String {
        format!(
            "{}/projets/{}/resultat_hashtags",
            self.base_url,
            urlencoding::encode(project)
        )
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

pub fn graph_url(base_url: &str, project: &str, query: &GraphQuery) -> String {
    format!(
        "{}/api/projets/{}/communities/{}/{}/{}?max_rank={}&show_interaction={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(project),
        urlencoding::encode(&query.tab),
        urlencoding::encode(&query.community),
        urlencoding::encode(&query.centrality),
        query.max_rank,
        query.show_interaction
    )
}

fn collect_url(base_url: &str, project: &str, action: &str) -> String {
    format!(
        "{}/projets/{}/collect/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(project),
        action
    )
}

fn attach_files(mut form: multipart::Form, files: &[PathBuf]) -> ApiResult<multipart::Form> {
    for path in files {
        form = form.file("files", path).map_err(|source| file_error(path, source))?;
    }
    Ok(form)
}

fn file_error(path: &Path, source: std::io::Error) -> ApiError {
    ApiError::File {
        path: path.to_path_buf(),
        source,
    }
}

fn check_status(resp: Response) -> ApiResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(ApiError::Status {
        status,
        message: error_message(&body),
    })
}

fn decode<T: DeserializeOwned>(resp: Response) -> ApiResult<T> {
    let body = check_status(resp)?.text()?;
    Ok(serde_json::from_str(&body)?)
}

/// `message` from a JSON error body
pub(crate) fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
}
