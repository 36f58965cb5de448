//! Desktop UI automation keywords over an accessibility backend
//!
//! Elements are addressed by path-like locators such as
//! `/form[@title='Login']/text[@accessiblename='User']`. The element kind is read
//! from the locator itself, checked against a fixed registry, and decides which
//! operations the element supports. Every keyword resolves its locator again, so
//! no element handle outlives a call.

pub mod config;
pub mod connector;
pub mod context;
pub mod element;
pub mod errors;
pub mod keywords;
pub mod locator;
pub mod operation;
pub mod platforms;
pub mod process;
pub mod registry;
pub mod resolver;
pub mod types;
pub mod wait;

pub use config::ConnectorConfig;
pub use connector::Connector;
pub use context::CallContext;
pub use element::{Element, ElementImpl, TypedElement};
pub use errors::AutomationError;
pub use keywords::Command;
pub use locator::{extract_tag, Locator};
pub use operation::Operation;
pub use platforms::{AutomationBackend, SimulatedBackend};
pub use process::{ProcessHost, ScriptOutput, SystemProcessHost};
pub use registry::ElementTag;
pub use resolver::ElementResolver;
pub use types::{AttributeValue, Location, MouseButton, OperationResult};
pub use wait::{poll_until, WaitSpec};
