use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// One in-flight keyword call that can be cancelled
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub request_id: String,
    pub keyword: String,
    pub cancellation_token: CancellationToken,
    pub timeout_duration: Option<Duration>,
    pub started_at: Instant,
    /// Distinguishes calls that share a client-supplied request id.
    instance: Uuid,
}

impl RequestContext {
    pub fn new(request_id: String, keyword: String, timeout_ms: Option<u64>) -> Self {
        Self {
            request_id,
            keyword,
            cancellation_token: CancellationToken::new(),
            timeout_duration: timeout_ms.map(Duration::from_millis),
            started_at: Instant::now(),
            instance: Uuid::new_v4(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    pub fn cancel(&self) {
        self.cancellation_token.cancel();
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Token for the keyword call; cancelled together with the request.
    pub fn child_token(&self) -> CancellationToken {
        self.cancellation_token.child_token()
    }
}

/// Tracks in-flight keyword calls by request id
#[derive(Clone, Default)]
pub struct RequestManager {
    active_requests: Arc<RwLock<HashMap<String, RequestContext>>>,
}

impl RequestManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a call. With a timeout, the call is cancelled once it runs longer.
    pub async fn register(
        &self,
        request_id: String,
        keyword: String,
        timeout_ms: Option<u64>,
    ) -> RequestContext {
        let context = RequestContext::new(request_id.clone(), keyword, timeout_ms);

        if let Some(timeout) = context.timeout_duration {
            let context_clone = context.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(timeout) => {
                        warn!(
                            "Request {} ({}) timed out after {:?}",
                            context_clone.request_id, context_clone.keyword, timeout
                        );
                        context_clone.cancel();
                    }
                    _ = context_clone.cancellation_token.cancelled() => {}
                }
            });
        }

        let mut requests = self.active_requests.write().await;
        if requests.insert(request_id.clone(), context.clone()).is_some() {
            warn!("Request id {} reused while still active", request_id);
        }
        context
    }

    /// Removes a finished call and releases its timeout task. A later call that
    /// reused the same id keeps its entry.
    pub async fn unregister(&self, context: &RequestContext) {
        let mut requests = self.active_requests.write().await;
        if requests
            .get(&context.request_id)
            .is_some_and(|active| active.instance == context.instance)
        {
            requests.remove(&context.request_id);
        }
        if !context.is_cancelled() {
            context.cancel();
        }
    }

    pub async fn cancel_request(&self, request_id: &str) -> bool {
        let requests = self.active_requests.read().await;
        if let Some(context) = requests.get(request_id) {
            info!(
                "Cancelling request {} ({}) after {:?}",
                request_id,
                context.keyword,
                context.elapsed()
            );
            context.cancel();
            true
        } else {
            false
        }
    }

    pub async fn active_count(&self) -> usize {
        self.active_requests.read().await.len()
    }

    pub async fn cancel_all(&self) {
        let requests = self.active_requests.read().await;
        for (id, context) in requests.iter() {
            info!("Cancelling request {} ({}) during shutdown", id, context.keyword);
            context.cancel();
        }
    }
}
