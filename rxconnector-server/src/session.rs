use rxconnector::{AutomationError, CallContext, Connector};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::cancellation::{RequestContext, RequestManager};
use crate::keywords::Call;

/// Shared server state: one connector, one desktop.
pub struct AppState {
    connector: Connector,
    /// Serializes every call that touches the backend.
    backend_lock: Mutex<()>,
    debug: AtomicBool,
    pub requests: RequestManager,
}

impl AppState {
    pub fn new(connector: Connector) -> Self {
        Self {
            connector,
            backend_lock: Mutex::new(()),
            debug: AtomicBool::new(false),
            requests: RequestManager::new(),
        }
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    pub fn set_debug(&self, enabled: bool) {
        self.debug.store(enabled, Ordering::Relaxed);
        info!("Debug detail {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Runs a bound call. Keyword calls wait for the backend lock, which the
    /// request can be cancelled out of.
    pub async fn run(&self, request: &RequestContext, call: Call) -> Result<Value, AutomationError> {
        debug!("Running {} for {}", call.name(), request.request_id);
        let command = match call {
            Call::StartDebug => {
                self.set_debug(true);
                return Ok(Value::Bool(true));
            }
            Call::StopDebug => {
                self.set_debug(false);
                return Ok(Value::Bool(true));
            }
            Call::Keyword(command) => command,
        };

        let _guard = tokio::select! {
            guard = self.backend_lock.lock() => guard,
            _ = request.cancellation_token.cancelled() => {
                return Err(AutomationError::Cancelled(format!(
                    "{} was cancelled while waiting for the backend",
                    command.name()
                )));
            }
        };
        debug!(
            "Backend acquired for {} after {:?}",
            request.request_id,
            request.elapsed()
        );

        let ctx = CallContext::new(self.debug_enabled(), request.child_token());
        let result = self.connector.execute(&ctx, command).await?;
        serde_json::to_value(result)
            .map_err(|e| AutomationError::PlatformError(format!("Cannot encode result: {e}")))
    }
}
