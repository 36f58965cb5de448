use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::keywords::{self, KEYWORDS};
use crate::session::AppState;
use crate::types::{
    CancelResponse, HealthResponse, KeywordInfo, KeywordList, KeywordResponse, RunKeywordRequest,
};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

// ============================================================================
// Error Handling
// ============================================================================

pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: String) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({
                "error": self.message
            })),
        )
            .into_response()
    }
}

// ============================================================================
// Health Check
// ============================================================================

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        debug: state.debug_enabled(),
        active_requests: state.requests.active_count().await,
    })
}

// ============================================================================
// Keyword Discovery
// ============================================================================

pub async fn list_keywords() -> Json<KeywordList> {
    Json(KeywordList {
        keywords: KEYWORDS.iter().map(|s| s.name).collect(),
    })
}

pub async fn describe_keyword(Path(name): Path<String>) -> Result<Json<KeywordInfo>, ApiError> {
    let signature = keywords::signature(&name)
        .ok_or_else(|| ApiError::not_found(format!("No keyword named '{name}'")))?;
    Ok(Json(KeywordInfo {
        name: signature.name,
        args: signature.params.iter().map(|p| p.render()).collect(),
        doc: signature.doc,
    }))
}

// ============================================================================
// Run Keyword
// ============================================================================

/// Keyword failures are reported in the body with status `FAIL`, not as HTTP errors.
pub async fn run_keyword(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<RunKeywordRequest>,
) -> Json<KeywordResponse> {
    let RunKeywordRequest {
        name,
        args,
        kwargs,
        timeout_ms,
    } = request;
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let debug = state.debug_enabled();

    info!("📥 POST /api/run_keyword - {} ({})", name, request_id);

    let context = state
        .requests
        .register(request_id.clone(), name.clone(), timeout_ms)
        .await;
    let outcome = match keywords::bind(&name, args, kwargs) {
        Ok(call) => state.run(&context, call).await,
        Err(e) => Err(e),
    };
    let elapsed = context.elapsed();
    state.requests.unregister(&context).await;

    let response = match outcome {
        Ok(value) => {
            info!("✅ {} passed in {:?}", name, elapsed);
            KeywordResponse::pass(request_id, value)
        }
        Err(err) => {
            warn!("❌ {} failed after {:?}: {}", name, elapsed, err);
            let traceback = debug.then(|| format!("{err:#?}"));
            KeywordResponse::fail(request_id, err.to_string(), err.kind(), traceback)
        }
    };
    Json(response)
}

// ============================================================================
// Cancellation
// ============================================================================

pub async fn cancel_request(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<String>,
) -> Json<CancelResponse> {
    let cancelled = state.requests.cancel_request(&request_id).await;
    info!("📥 POST /api/requests/{}/cancel - cancelled: {}", request_id, cancelled);
    Json(CancelResponse {
        request_id,
        cancelled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KeywordStatus;
    use axum::http::HeaderValue;
    use rxconnector::platforms::simulated::SceneNode;
    use rxconnector::{Connector, ConnectorConfig, ElementTag, SimulatedBackend, SystemProcessHost};
    use serde_json::{json, Map, Value};
    use std::time::Duration;

    fn state_with(backend: &SimulatedBackend) -> Arc<AppState> {
        let config = ConnectorConfig {
            settle_delay_ms: 0,
            key_settle_delay_ms: 0,
            ..ConnectorConfig::default()
        };
        let connector = Connector::new(
            Arc::new(backend.clone()),
            Arc::new(SystemProcessHost),
            config,
        );
        Arc::new(AppState::new(connector))
    }

    fn call(name: &str, args: Vec<Value>) -> Json<RunKeywordRequest> {
        Json(RunKeywordRequest {
            name: name.to_string(),
            args,
            kwargs: Map::new(),
            timeout_ms: None,
        })
    }

    #[tokio::test]
    async fn test_run_keyword_pass() {
        let backend = SimulatedBackend::new();
        backend.insert(
            "/form/checkbox",
            SceneNode::new(ElementTag::CheckBox).with_attribute("Checked", false),
        );
        let state = state_with(&backend);

        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("req-42"));
        let Json(response) = run_keyword(
            State(state.clone()),
            headers,
            call("check", vec![json!("/form/checkbox")]),
        )
        .await;

        assert_eq!(response.status, KeywordStatus::Pass);
        assert_eq!(response.return_value, Some(json!(true)));
        assert_eq!(response.request_id, "req-42");
        assert_eq!(state.requests.active_count().await, 0);
    }

    #[tokio::test]
    async fn test_run_keyword_fail_reports_kind() {
        let backend = SimulatedBackend::new();
        let state = state_with(&backend);

        let Json(response) = run_keyword(
            State(state.clone()),
            HeaderMap::new(),
            call("click_element", vec![json!("/form/spinner")]),
        )
        .await;
        assert_eq!(response.status, KeywordStatus::Fail);
        assert_eq!(response.error_kind.as_deref(), Some("UnsupportedElementError"));
        assert!(response.error.unwrap().contains("/form/spinner"));
        assert!(response.traceback.is_none());

        let Json(response) =
            run_keyword(State(state), HeaderMap::new(), call("frobnicate", Vec::new())).await;
        assert_eq!(response.error_kind.as_deref(), Some("InvalidArgumentError"));
    }

    #[tokio::test]
    async fn test_debug_adds_traceback() {
        let backend = SimulatedBackend::new();
        let state = state_with(&backend);

        let Json(response) =
            run_keyword(State(state.clone()), HeaderMap::new(), call("start_debug", Vec::new()))
                .await;
        assert_eq!(response.status, KeywordStatus::Pass);
        assert!(state.debug_enabled());

        let Json(response) = run_keyword(
            State(state.clone()),
            HeaderMap::new(),
            call("set_focus", vec![json!("/form/button")]),
        )
        .await;
        assert_eq!(response.status, KeywordStatus::Fail);
        assert!(response.traceback.unwrap().contains("ElementNotFound"));

        run_keyword(State(state.clone()), HeaderMap::new(), call("stop_debug", Vec::new())).await;
        assert!(!state.debug_enabled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_in_flight_wait() {
        let backend = SimulatedBackend::new();
        let state = state_with(&backend);

        let canceller = state.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(12)).await;
            let Json(response) =
                cancel_request(State(canceller), Path("req-wait".to_string())).await;
            assert!(response.cancelled);
        });

        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("req-wait"));
        let Json(response) = run_keyword(
            State(state),
            headers,
            call("wait_for_element", vec![json!("/form/button"), json!(60000)]),
        )
        .await;
        assert_eq!(response.status, KeywordStatus::Fail);
        assert_eq!(response.error_kind.as_deref(), Some("CancelledError"));
    }

    #[tokio::test]
    async fn test_describe_keyword() {
        let Json(info) = describe_keyword(Path("wait_for_element_attribute".to_string()))
            .await
            .ok()
            .unwrap();
        assert_eq!(info.args, ["locator", "attribute", "expected", "timeout=60000"]);
        assert!(describe_keyword(Path("nope".to_string())).await.is_err());

        let Json(list) = list_keywords().await;
        assert!(list.keywords.contains(&"take_desktop_screenshot"));
    }
}
