use tokio_util::sync::CancellationToken;

/// Per-call settings threaded through every keyword.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    /// Log resolved tags, handles and intermediate values at info level.
    pub debug: bool,
    /// Aborts any polling wait of the call when cancelled.
    pub cancellation_token: CancellationToken,
}

impl CallContext {
    pub fn new(debug: bool, cancellation_token: CancellationToken) -> Self {
        Self {
            debug,
            cancellation_token,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }
}
