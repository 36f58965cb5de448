use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("No element entered in locator: {0:?}")]
    EmptyLocator(String),

    #[error("Element is not supported. Entered element: {tag} (locator: {locator})")]
    UnsupportedElement { tag: String, locator: String },

    #[error("Element |{tag}| is not supported for {operation} (locator: {locator})")]
    UnsupportedOperation {
        operation: String,
        tag: String,
        locator: String,
    },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Element {0} still exists")]
    ElementStillExists(String),

    #[error("Invalid click location {location:?}: {reason}")]
    InvalidLocation { location: String, reason: String },

    #[error("Element did not become accessible: {0}")]
    AccessibilityTimeout(String),

    #[error("Attribute {attribute} of {locator} did not become {expected:?} within {timeout_ms}ms")]
    AttributeWaitTimeout {
        locator: String,
        attribute: String,
        expected: String,
        timeout_ms: u64,
    },

    #[error("Process {0} is not running")]
    ProcessNotFound(String),

    #[error("Process {name} not found within {timeout_ms}ms")]
    ProcessWaitTimeout { name: String, timeout_ms: u64 },

    #[error("Process {name} not terminated because of: {reason}")]
    ProcessTermination { name: String, reason: String },

    #[error("Wait cancelled: {0}")]
    Cancelled(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Platform-specific error: {0}")]
    PlatformError(String),
}

impl AutomationError {
    /// Short, stable name of the failure kind, used as the exception type on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            AutomationError::EmptyLocator(_) => "EmptyLocatorError",
            AutomationError::UnsupportedElement { .. } => "UnsupportedElementError",
            AutomationError::UnsupportedOperation { .. } => "UnsupportedOperationError",
            AutomationError::ElementNotFound(_) => "ElementNotFoundError",
            AutomationError::ElementStillExists(_) => "ElementStillExistsError",
            AutomationError::InvalidLocation { .. } => "InvalidLocationError",
            AutomationError::AccessibilityTimeout(_) => "AccessibilityTimeoutError",
            AutomationError::AttributeWaitTimeout { .. } => "AttributeWaitTimeoutError",
            AutomationError::ProcessNotFound(_) => "ProcessNotFoundError",
            AutomationError::ProcessWaitTimeout { .. } => "ProcessNotFoundError",
            AutomationError::ProcessTermination { .. } => "ProcessTerminationError",
            AutomationError::Cancelled(_) => "CancelledError",
            AutomationError::InvalidArgument(_) => "InvalidArgumentError",
            AutomationError::Io(_) => "IOError",
            AutomationError::PlatformError(_) => "PlatformError",
        }
    }
}
