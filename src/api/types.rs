//! Request parameters and response bodies exchanged with the analysis server.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which community graph to load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphQuery {
    /// Interaction graph, e.g. `user_user_retweet`
    pub tab: String,
    /// Community detection algorithm
    pub community: String,
    pub centrality: String,
    /// Keep the top N authors by centrality
    pub max_rank: u32,
    pub show_interaction: bool,
}

impl Default for GraphQuery {
    fn default() -> Self {
        Self {
            tab: "user_user_retweet".to_string(),
            community: "louvain_community".to_string(),
            centrality: "page_rank_centrality".to_string(),
            max_rank: 200,
            show_interaction: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    #[default]
    Single,
    Multiple,
}

impl ImportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportMode::Single => "single",
            ImportMode::Multiple => "multiple",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Twitter,
    Bluesky,
}

impl Source {
    pub fn all() -> &'static [Source] {
        &[Source::Twitter, Source::Bluesky]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Twitter => "twitter",
            Source::Bluesky => "bluesky",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Source::Twitter => "Twitter / X",
            Source::Bluesky => "Bluesky",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Text,
    Number,
    Date,
    Boolean,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueType {
    MissingValue,
    InvalidDateFormat,
    InvalidNumber,
    SpecialCharacters,
    InconsistentDataType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvIssue {
    pub issue_type: IssueType,
    pub message: String,
    #[serde(default)]
    pub affected_rows: Vec<usize>,
}

/// Server-side analysis of an uploaded CSV
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvAnalysis {
    pub total_rows: usize,
    pub total_columns: usize,
    pub headers: Vec<String>,
    #[serde(default)]
    pub preview: Vec<HashMap<String, String>>,
    pub encoding: String,
    pub delimiter: char,
    #[serde(default)]
    pub potential_issues: Vec<CsvIssue>,
    #[serde(default)]
    pub data_types: HashMap<String, DataType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub schema_name: String,
    pub analysis: CsvAnalysis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResponse {
    pub message: String,
    #[serde(default)]
    pub rows_imported: usize,
    /// Error count; older servers send the list of errors instead
    #[serde(default, deserialize_with = "count_or_list")]
    pub errors: usize,
}

fn count_or_list<'de, D: serde::Deserializer<'de>>(d: D) -> Result<usize, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum CountOrList {
        Count(usize),
        List(Vec<serde_json::Value>),
    }
    Ok(match CountOrList::deserialize(d)? {
        CountOrList::Count(n) => n,
        CountOrList::List(items) => items.len(),
    })
}

/// Body of `POST /projets/{id}/collect/start`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectRequest {
    pub name: String,
    pub keywords: Vec<String>,
    pub networks: Vec<Source>,
    pub limit: Option<usize>,
    /// RFC 3339, UTC
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// The server always writes to its own collection schema
    pub target_schema: Option<String>,
}

/// Answer to the collect start, delete and update calls
#[derive(Debug, Clone, Deserialize)]
pub struct CollectResponse {
    pub success: bool,
    pub message: String,
    /// Posts collected
    #[serde(default)]
    pub count: usize,
}

/// Error body `{ "message": ... }`
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_analysis() {
        let json = r#"{
            "schema_name": "import_20240105",
            "analysis": {
                "total_rows": 2, "total_columns": 2,
                "headers": ["id", "text"],
                "preview": [{"id": "1", "text": "bonjour"}],
                "encoding": "UTF-8", "delimiter": ";",
                "potential_issues": [{"issue_type": "MissingValue", "message": "Empty cell", "affected_rows": [2]}],
                "data_types": {"id": "Number", "text": "Text"}
            }
        }"#;
        let resp: AnalyzeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.schema_name, "import_20240105");
        assert_eq!(resp.analysis.delimiter, ';');
        assert_eq!(resp.analysis.data_types["id"], DataType::Number);
        assert_eq!(resp.analysis.potential_issues[0].issue_type, IssueType::MissingValue);
    }

    #[test]
    fn import_response_defaults_missing_counts() {
        let resp: ImportResponse = serde_json::from_str(r#"{"message":"ok"}"#).unwrap();
        assert_eq!(resp.rows_imported, 0);
        assert_eq!(resp.errors, 0);

        let resp: ImportResponse =
            serde_json::from_str(r#"{"message":"ok","rows_imported":12,"errors":["bad row 3","bad row 9"]}"#)
                .unwrap();
        assert_eq!(resp.rows_imported, 12);
        assert_eq!(resp.errors, 2);
    }

    #[test]
    fn graph_query_fills_missing_fields() {
        let q: GraphQuery = serde_json::from_str(r#"{"max_rank": 50}"#).unwrap();
        assert_eq!(q.max_rank, 50);
        assert_eq!(q.tab, "user_user_retweet");
        assert_eq!(serde_json::to_value(Source::Bluesky).unwrap(), "bluesky");
    }

    #[test]
    fn collect_request_omits_empty_dates() {
        let request = CollectRequest {
            name: "climat".into(),
            keywords: vec!["#climat".into()],
            networks: vec![Source::Twitter, Source::Bluesky],
            limit: Some(10),
            start_date: None,
            end_date: Some("2024-01-31T23:59:59.000Z".into()),
            target_schema: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["networks"], serde_json::json!(["twitter", "bluesky"]));
        assert_eq!(json["target_schema"], serde_json::Value::Null);
        assert!(json.get("start_date").is_none());
        assert_eq!(json["end_date"], "2024-01-31T23:59:59.000Z");

        let resp: CollectResponse =
            serde_json::from_str(r#"{"success":false,"message":"Collection successful but automation failed"}"#)
                .unwrap();
        assert!(!resp.success);
        assert_eq!(resp.count, 0);
    }
}
