use crate::element::TypedElement;
use crate::errors::AutomationError;
use crate::locator::extract_tag;
use crate::platforms::AutomationBackend;
use crate::registry::{self, ElementTag};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Turns locators into typed element handles. Nothing is cached: every call
/// parses the locator and asks the backend again.
#[derive(Clone)]
pub struct ElementResolver {
    backend: Arc<dyn AutomationBackend>,
}

impl ElementResolver {
    pub fn new(backend: Arc<dyn AutomationBackend>) -> Self {
        Self { backend }
    }

    /// Tag of the element a locator addresses. Does not touch the backend.
    pub fn resolve_tag(&self, locator: &str) -> Result<ElementTag, AutomationError> {
        registry::validate(extract_tag(locator), locator)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn resolve(&self, locator: &str) -> Result<TypedElement, AutomationError> {
        match self.lookup(locator)? {
            Lookup::Found(element) => Ok(element),
            Lookup::Missing(msg) => Err(AutomationError::ElementNotFound(msg)),
        }
    }

    /// Like [`resolve`](Self::resolve), but a missing element is `Ok(None)`.
    /// Backend failures are still errors.
    pub fn try_resolve(&self, locator: &str) -> Result<Option<TypedElement>, AutomationError> {
        match self.lookup(locator)? {
            Lookup::Found(element) => Ok(Some(element)),
            Lookup::Missing(msg) => {
                debug!("{msg}");
                Ok(None)
            }
        }
    }

    fn lookup(&self, locator: &str) -> Result<Lookup, AutomationError> {
        let tag = self.resolve_tag(locator)?;
        let element = match self.backend.locate(tag, locator) {
            Ok(element) => element,
            Err(AutomationError::ElementNotFound(msg)) => return Ok(Lookup::Missing(msg)),
            Err(other) => {
                return Err(AutomationError::ElementNotFound(format!(
                    "{tag} {locator}: {other}"
                )))
            }
        };
        debug!(%tag, element = %element.describe(), "resolved");
        Ok(Lookup::Found(TypedElement {
            tag,
            locator: locator.to_string(),
            element,
        }))
    }
}

enum Lookup {
    Found(TypedElement),
    Missing(String),
}
