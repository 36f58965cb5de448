use crate::{AutomationError, Element, ElementTag, MouseButton};

/// The capability surface of a UI automation backend.
///
/// One backend drives one interactive desktop. Callers serialize mutating
/// calls; implementations need not guard against concurrent input.
pub trait AutomationBackend: Send + Sync {
    /// Materialize a handle of kind `tag` for `locator`.
    ///
    /// Fails with [`AutomationError::ElementNotFound`] when nothing matches, or
    /// when the match is not of kind `tag`. Any other error means the backend
    /// could not answer.
    fn locate(&self, tag: ElementTag, locator: &str) -> Result<Element, AutomationError>;

    /// PNG encoded image of the whole desktop.
    fn capture_desktop(&self) -> Result<Vec<u8>, AutomationError>;

    /// Press (`down == true`) or release a mouse button at the current pointer position.
    fn mouse_button(&self, button: MouseButton, down: bool) -> Result<(), AutomationError>;

    /// Turn the mouse wheel at the current pointer position. Positive scrolls up.
    fn scroll_wheel(&self, amount: i32) -> Result<(), AutomationError>;

    /// Open a URL in the named browser.
    fn open_url(&self, url: &str, browser: &str, maximize: bool) -> Result<(), AutomationError>;
}

pub mod simulated;

pub use simulated::SimulatedBackend;
