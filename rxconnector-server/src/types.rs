use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RunKeywordRequest {
    pub name: String,

    #[serde(default)]
    pub args: Vec<Value>,

    #[serde(default)]
    pub kwargs: Map<String, Value>,

    /// Cancels the call once it runs longer than this.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeywordStatus {
    Pass,
    Fail,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeywordResponse {
    pub status: KeywordStatus,

    #[serde(rename = "return", skip_serializing_if = "Option::is_none")]
    pub return_value: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,

    pub request_id: String,
}

impl KeywordResponse {
    pub fn pass(request_id: String, value: Value) -> Self {
        Self {
            status: KeywordStatus::Pass,
            return_value: Some(value),
            error: None,
            error_kind: None,
            traceback: None,
            request_id,
        }
    }

    pub fn fail(request_id: String, error: String, kind: &str, traceback: Option<String>) -> Self {
        Self {
            status: KeywordStatus::Fail,
            return_value: None,
            error: Some(error),
            error_kind: Some(kind.to_string()),
            traceback,
            request_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KeywordList {
    pub keywords: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeywordInfo {
    pub name: &'static str,
    pub args: Vec<String>,
    pub doc: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelResponse {
    pub request_id: String,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub debug: bool,
    pub active_requests: usize,
}
