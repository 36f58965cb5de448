use crate::errors::AutomationError;
use crate::registry::ElementTag;
use crate::types::{AttributeValue, Location};
use std::fmt;
use std::fmt::Debug;

/// Per-element primitives a backend implements for the handles it hands out.
pub trait ElementImpl: Send + Sync + Debug {
    /// Backend description of the element, used in logs and error messages.
    fn describe(&self) -> String;
    fn click(&self, location: Option<Location>) -> Result<(), AutomationError>;
    fn double_click(&self, location: Option<Location>) -> Result<(), AutomationError>;
    fn right_click(&self, location: Option<Location>) -> Result<(), AutomationError>;
    /// Sends a key sequence. `{name}` tokens are named keys, everything else is typed.
    fn press_keys(&self, keys: &str) -> Result<(), AutomationError>;
    /// Focuses the element and reports whether it holds the focus afterwards.
    fn focus(&self) -> Result<bool, AutomationError>;
    fn get_attribute(&self, name: &str) -> Result<AttributeValue, AutomationError>;
    fn set_attribute(&self, name: &str, value: AttributeValue) -> Result<(), AutomationError>;
    /// PNG encoded image of the element.
    fn capture_image(&self) -> Result<Vec<u8>, AutomationError>;
    fn children(&self, child_locator: &str) -> Result<Vec<Element>, AutomationError>;
    fn move_to(&self, location: Location) -> Result<(), AutomationError>;
    fn ensure_visible(&self) -> Result<(), AutomationError>;
    fn clone_box(&self) -> Box<dyn ElementImpl>;
}

/// Opaque handle to a live UI element, valid for the duration of one call.
///
/// Handles are never cached between calls; every keyword resolves its locator
/// again because the UI changes underneath.
pub struct Element {
    inner: Box<dyn ElementImpl>,
}

impl Element {
    pub fn new(inner: Box<dyn ElementImpl>) -> Self {
        Self { inner }
    }

    pub fn describe(&self) -> String {
        self.inner.describe()
    }

    pub fn click(&self, location: Option<Location>) -> Result<(), AutomationError> {
        self.inner.click(location)
    }

    pub fn double_click(&self, location: Option<Location>) -> Result<(), AutomationError> {
        self.inner.double_click(location)
    }

    pub fn right_click(&self, location: Option<Location>) -> Result<(), AutomationError> {
        self.inner.right_click(location)
    }

    pub fn press_keys(&self, keys: &str) -> Result<(), AutomationError> {
        self.inner.press_keys(keys)
    }

    pub fn focus(&self) -> Result<bool, AutomationError> {
        self.inner.focus()
    }

    pub fn get_attribute(&self, name: &str) -> Result<AttributeValue, AutomationError> {
        self.inner.get_attribute(name)
    }

    pub fn set_attribute(&self, name: &str, value: AttributeValue) -> Result<(), AutomationError> {
        self.inner.set_attribute(name, value)
    }

    pub fn capture_image(&self) -> Result<Vec<u8>, AutomationError> {
        self.inner.capture_image()
    }

    pub fn children(&self, child_locator: &str) -> Result<Vec<Element>, AutomationError> {
        self.inner.children(child_locator)
    }

    pub fn move_to(&self, location: Location) -> Result<(), AutomationError> {
        self.inner.move_to(location)
    }

    pub fn ensure_visible(&self) -> Result<(), AutomationError> {
        self.inner.ensure_visible()
    }

    /// Enabled and visible at the same time.
    pub fn is_accessible(&self) -> Result<bool, AutomationError> {
        let enabled = self.get_attribute("Enabled")?;
        let visible = self.get_attribute("Visible")?;
        Ok(enabled.is_true() && visible.is_true())
    }
}

impl Clone for Element {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_box(),
        }
    }
}

impl Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("inner", &self.inner)
            .finish()
    }
}

/// An element together with the validated tag it was materialized as.
#[derive(Debug, Clone)]
pub struct TypedElement {
    pub tag: ElementTag,
    pub locator: String,
    pub element: Element,
}

impl std::ops::Deref for TypedElement {
    type Target = Element;

    fn deref(&self) -> &Element {
        &self.element
    }
}
