//! The keyword library: every remote call lands on one method of [`Connector`].
//!
//! Element keywords resolve their locator afresh, check the operation against the
//! resolved tag and then drive the backend. Waits poll through [`poll_until`].
//! All keywords return a value or fail; none report success as an absent value.

use crate::config::ConnectorConfig;
use crate::context::CallContext;
use crate::element::TypedElement;
use crate::errors::AutomationError;
use crate::operation::Operation;
use crate::platforms::AutomationBackend;
use crate::process::{self, ProcessHost, ScriptOutput};
use crate::resolver::ElementResolver;
use crate::types::{AttributeValue, Location, MouseButton};
use crate::wait::{poll_until, WaitSpec};
use base64::{engine::general_purpose, Engine as _};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// Logs at info level when the call runs in debug mode, at debug level otherwise.
macro_rules! trace_call {
    ($ctx:expr, $($arg:tt)+) => {
        if $ctx.debug {
            tracing::info!($($arg)+);
        } else {
            tracing::debug!($($arg)+);
        }
    };
}

const CLEAR_TEXT_KEYS: &str = "{End}{Shift down}{Home}{Shift up}{Delete}";

/// Maps a browser name to the process image that hosts it.
fn browser_process(browser: &str) -> Option<&'static str> {
    match browser {
        "firefox" => Some("firefox"),
        "ie" => Some("iexplore"),
        "chrome" => Some("chrome"),
        _ => None,
    }
}

#[derive(Clone)]
pub struct Connector {
    resolver: ElementResolver,
    backend: Arc<dyn AutomationBackend>,
    processes: Arc<dyn ProcessHost>,
    config: ConnectorConfig,
}

impl Connector {
    pub fn new(
        backend: Arc<dyn AutomationBackend>,
        processes: Arc<dyn ProcessHost>,
        config: ConnectorConfig,
    ) -> Self {
        Self {
            resolver: ElementResolver::new(backend.clone()),
            backend,
            processes,
            config,
        }
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    pub fn resolver(&self) -> &ElementResolver {
        &self.resolver
    }

    fn wait_spec(&self, timeout_ms: u64) -> WaitSpec {
        WaitSpec::from_millis(timeout_ms, self.config.poll_interval())
    }

    async fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    async fn settle(&self) {
        self.pause(self.config.settle_delay()).await;
    }

    /// Resolves `locator` and checks that `operation` accepts its tag.
    fn resolve_for(
        &self,
        ctx: &CallContext,
        locator: &str,
        operation: Operation,
    ) -> Result<TypedElement, AutomationError> {
        let element = self.resolver.resolve(locator)?;
        trace_call!(
            ctx,
            operation = %operation,
            locator,
            tag = %element.tag,
            element = %element.describe(),
            "resolved element"
        );
        operation.check(&element)?;
        Ok(element)
    }

    async fn wait_until_accessible(
        &self,
        ctx: &CallContext,
        element: &TypedElement,
    ) -> Result<(), AutomationError> {
        let timeout_ms = self.config.default_timeout_ms;
        let accessible = poll_until(self.wait_spec(timeout_ms), &ctx.cancellation_token, || {
            let accessible = element.is_accessible()?;
            trace_call!(ctx, locator = %element.locator, accessible, "accessibility check");
            Ok(accessible)
        })
        .await?;
        if accessible {
            Ok(())
        } else {
            Err(AutomationError::AccessibilityTimeout(format!(
                "{} {} was not enabled and visible within {timeout_ms}ms",
                element.tag, element.locator
            )))
        }
    }

    async fn wait_for_presence(
        &self,
        ctx: &CallContext,
        locator: &str,
        timeout_ms: u64,
        present: bool,
    ) -> Result<bool, AutomationError> {
        poll_until(self.wait_spec(timeout_ms), &ctx.cancellation_token, || {
            let found = self.resolver.try_resolve(locator)?.is_some();
            trace_call!(ctx, locator, found, "presence check");
            Ok(found == present)
        })
        .await
    }

    // ---------------------------------------------------------------------
    // Pointer actions
    // ---------------------------------------------------------------------

    /// Clicks the element, optionally at an anchor name or an `x,y` offset. With
    /// `accessible` set, first waits for the element to be enabled and visible.
    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn click_element(
        &self,
        ctx: &CallContext,
        locator: &str,
        location: Option<&str>,
        accessible: bool,
    ) -> Result<bool, AutomationError> {
        let element = self.resolve_for(ctx, locator, Operation::Click)?;
        let location = location.map(Location::parse).transpose()?;
        if accessible {
            self.wait_until_accessible(ctx, &element).await?;
        }
        element.click(location)?;
        self.settle().await;
        Ok(true)
    }

    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn double_click_element(
        &self,
        ctx: &CallContext,
        locator: &str,
        location: Option<&str>,
        accessible: bool,
    ) -> Result<bool, AutomationError> {
        let element = self.resolve_for(ctx, locator, Operation::DoubleClick)?;
        let location = location.map(Location::parse).transpose()?;
        if accessible {
            self.wait_until_accessible(ctx, &element).await?;
        }
        element.double_click(location)?;
        self.settle().await;
        Ok(true)
    }

    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn right_click_element(
        &self,
        ctx: &CallContext,
        locator: &str,
        location: Option<&str>,
    ) -> Result<bool, AutomationError> {
        let element = self.resolve_for(ctx, locator, Operation::RightClick)?;
        let location = location.map(Location::parse).transpose()?;
        element.right_click(location)?;
        self.settle().await;
        Ok(true)
    }

    /// Drags the first element onto the second with the left mouse button.
    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn drag(
        &self,
        ctx: &CallContext,
        from: &str,
        to: &str,
    ) -> Result<bool, AutomationError> {
        let source = self.resolve_for(ctx, from, Operation::Drag)?;
        let target = self.resolve_for(ctx, to, Operation::Drag)?;
        let step = self.config.key_settle_delay();

        source.move_to(Location::Center)?;
        self.pause(step).await;
        self.backend.mouse_button(MouseButton::Left, true)?;

        let moved = async {
            self.pause(step).await;
            target.move_to(Location::Center)?;
            self.pause(step).await;
            // Wiggle so drop targets register the hover before the release.
            target.move_to(Location::CenterLeft)?;
            target.move_to(Location::Center)
        }
        .await;
        let released = self.backend.mouse_button(MouseButton::Left, false);
        moved?;
        released?;
        Ok(true)
    }

    /// Hovers the element and turns the mouse wheel by `amount` notches.
    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn scroll(
        &self,
        ctx: &CallContext,
        locator: &str,
        amount: i32,
    ) -> Result<bool, AutomationError> {
        let element = self.resolve_for(ctx, locator, Operation::Scroll)?;
        element.move_to(Location::Center)?;
        self.backend.scroll_wheel(amount)?;
        Ok(true)
    }

    // ---------------------------------------------------------------------
    // Toggles
    // ---------------------------------------------------------------------

    /// Checks a check box or radio button. Clicks only if it is not checked yet.
    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn check(&self, ctx: &CallContext, locator: &str) -> Result<bool, AutomationError> {
        self.set_checked(ctx, locator, Operation::Check, true).await
    }

    /// Unchecks a check box or radio button. Clicks only if it is checked.
    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn uncheck(&self, ctx: &CallContext, locator: &str) -> Result<bool, AutomationError> {
        self.set_checked(ctx, locator, Operation::Uncheck, false).await
    }

    async fn set_checked(
        &self,
        ctx: &CallContext,
        locator: &str,
        operation: Operation,
        wanted: bool,
    ) -> Result<bool, AutomationError> {
        let element = self.resolve_for(ctx, locator, operation)?;
        let checked = element.get_attribute("Checked")?.is_true();
        trace_call!(ctx, locator, checked, wanted, "toggle state");
        if checked != wanted {
            element.click(None)?;
            self.settle().await;
        }
        Ok(true)
    }

    // ---------------------------------------------------------------------
    // Text and selection
    // ---------------------------------------------------------------------

    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn clear_text(&self, ctx: &CallContext, locator: &str) -> Result<bool, AutomationError> {
        let element = self.resolve_for(ctx, locator, Operation::ClearText)?;
        element.press_keys(CLEAR_TEXT_KEYS)?;
        Ok(true)
    }

    #[instrument(level = "debug", skip(self, ctx, text))]
    pub async fn input_text(
        &self,
        ctx: &CallContext,
        locator: &str,
        text: &str,
    ) -> Result<bool, AutomationError> {
        let element = self.resolve_for(ctx, locator, Operation::InputText)?;
        trace_call!(ctx, locator, text, "input text");
        element.press_keys(text)?;
        self.settle().await;
        Ok(true)
    }

    /// Focuses the element and sends a key sequence to it.
    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn send_keys(
        &self,
        ctx: &CallContext,
        locator: &str,
        key_seq: &str,
    ) -> Result<bool, AutomationError> {
        let element = self.resolve_for(ctx, locator, Operation::SendKeys)?;
        element.focus()?;
        element.press_keys(key_seq)?;
        self.pause(self.config.key_settle_delay()).await;
        Ok(true)
    }

    /// Moves the selection to `index` with one `{up}` or `{down}` press per step.
    ///
    /// The backend exposes no way to set the index of a combo box directly, so the
    /// selection is walked from the current index instead.
    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn select_by_index(
        &self,
        ctx: &CallContext,
        locator: &str,
        index: i64,
    ) -> Result<bool, AutomationError> {
        let element = self.resolve_for(ctx, locator, Operation::SelectByIndex)?;
        let reported = element.get_attribute("SelectedItemIndex")?;
        let selected = reported.as_i64().ok_or_else(|| {
            AutomationError::InvalidArgument(format!(
                "{} {locator} reports a non-numeric SelectedItemIndex: {reported}",
                element.tag
            ))
        })?;
        let diff = selected - index;
        let key = if diff >= 0 { "{up}" } else { "{down}" };
        trace_call!(ctx, locator, selected, index, diff, "select by index");
        for _ in 0..diff.unsigned_abs() {
            element.press_keys(key)?;
        }
        Ok(true)
    }

    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn set_list_selected_index(
        &self,
        ctx: &CallContext,
        locator: &str,
        index: i64,
    ) -> Result<bool, AutomationError> {
        let element = self.resolve_for(ctx, locator, Operation::SetListSelectedIndex)?;
        element.set_attribute("selectedIndex", AttributeValue::Int(index))?;
        Ok(true)
    }

    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn make_visible(&self, ctx: &CallContext, locator: &str) -> Result<bool, AutomationError> {
        let element = self.resolve_for(ctx, locator, Operation::MakeVisible)?;
        element.ensure_visible()?;
        self.settle().await;
        Ok(true)
    }

    /// Focuses the element and reports whether it holds the focus.
    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn set_focus(&self, ctx: &CallContext, locator: &str) -> Result<bool, AutomationError> {
        let element = self.resolve_for(ctx, locator, Operation::SetFocus)?;
        let focused = element.focus()?;
        self.settle().await;
        Ok(focused)
    }

    // ---------------------------------------------------------------------
    // Reading
    // ---------------------------------------------------------------------

    /// Cell texts of a table, row by row, without headers.
    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn get_table(
        &self,
        ctx: &CallContext,
        locator: &str,
    ) -> Result<Vec<Vec<String>>, AutomationError> {
        let table = self.resolve_for(ctx, locator, Operation::GetTable)?;
        let mut content = Vec::new();
        for row in table.children("row")? {
            let mut cells = Vec::new();
            for cell in row.children("cell")? {
                cells.push(match cell.get_attribute("Text")? {
                    AttributeValue::Null => String::new(),
                    value => value.to_string(),
                });
            }
            content.push(cells);
        }
        Ok(content)
    }

    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn count_list_items(
        &self,
        ctx: &CallContext,
        locator: &str,
        child_locator: &str,
    ) -> Result<usize, AutomationError> {
        let list = self.resolve_for(ctx, locator, Operation::CountListItems)?;
        let count = list.children(child_locator)?.len();
        trace_call!(ctx, locator, child_locator, count, "counted list items");
        Ok(count)
    }

    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn get_element_attribute(
        &self,
        ctx: &CallContext,
        locator: &str,
        attribute: &str,
    ) -> Result<AttributeValue, AutomationError> {
        let element = self.resolve_for(ctx, locator, Operation::GetElementAttribute)?;
        let value = element.get_attribute(attribute)?;
        trace_call!(ctx, locator, attribute, %value, "read attribute");
        Ok(value)
    }

    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn get_list_items_attribute(
        &self,
        ctx: &CallContext,
        locator: &str,
        child_locator: &str,
        attribute: &str,
    ) -> Result<Vec<AttributeValue>, AutomationError> {
        let list = self.resolve_for(ctx, locator, Operation::GetListItemsAttribute)?;
        list.children(child_locator)?
            .iter()
            .map(|item| item.get_attribute(attribute))
            .collect()
    }

    /// PNG image of the element, base64 encoded.
    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn take_screenshot(&self, ctx: &CallContext, locator: &str) -> Result<String, AutomationError> {
        let element = self.resolve_for(ctx, locator, Operation::TakeScreenshot)?;
        let png = element.capture_image()?;
        Ok(general_purpose::STANDARD.encode(png))
    }

    /// PNG image of the whole desktop, base64 encoded.
    #[instrument(level = "debug", skip(self))]
    pub async fn take_desktop_screenshot(&self) -> Result<String, AutomationError> {
        let png = self.backend.capture_desktop()?;
        Ok(general_purpose::STANDARD.encode(png))
    }

    // ---------------------------------------------------------------------
    // Waits
    // ---------------------------------------------------------------------

    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn check_if_element_exists(
        &self,
        ctx: &CallContext,
        locator: &str,
        duration_ms: u64,
    ) -> Result<bool, AutomationError> {
        if self.wait_for_presence(ctx, locator, duration_ms, true).await? {
            Ok(true)
        } else {
            Err(AutomationError::ElementNotFound(format!(
                "{locator} (waited {duration_ms}ms)"
            )))
        }
    }

    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn check_if_element_does_not_exist(
        &self,
        ctx: &CallContext,
        locator: &str,
        duration_ms: u64,
    ) -> Result<bool, AutomationError> {
        if self.wait_for_presence(ctx, locator, duration_ms, false).await? {
            Ok(true)
        } else {
            Err(AutomationError::ElementStillExists(format!(
                "{locator} (waited {duration_ms}ms)"
            )))
        }
    }

    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn wait_for_element(
        &self,
        ctx: &CallContext,
        locator: &str,
        timeout_ms: u64,
    ) -> Result<bool, AutomationError> {
        if self.wait_for_presence(ctx, locator, timeout_ms, true).await? {
            Ok(true)
        } else {
            Err(AutomationError::ElementNotFound(format!(
                "{locator} (waited {timeout_ms}ms)"
            )))
        }
    }

    /// Waits until the textual value of `attribute` equals `expected`. An element
    /// that does not exist yet counts as not matching.
    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn wait_for_element_attribute(
        &self,
        ctx: &CallContext,
        locator: &str,
        attribute: &str,
        expected: &str,
        timeout_ms: u64,
    ) -> Result<bool, AutomationError> {
        let matched = poll_until(self.wait_spec(timeout_ms), &ctx.cancellation_token, || {
            let Some(element) = self.resolver.try_resolve(locator)? else {
                trace_call!(ctx, locator, "element not present yet");
                return Ok(false);
            };
            let value = element.get_attribute(attribute)?;
            trace_call!(ctx, locator, attribute, %value, expected, "attribute check");
            Ok(value.to_string() == expected)
        })
        .await?;
        if matched {
            Ok(true)
        } else {
            Err(AutomationError::AttributeWaitTimeout {
                locator: locator.to_string(),
                attribute: attribute.to_string(),
                expected: expected.to_string(),
                timeout_ms,
            })
        }
    }

    // ---------------------------------------------------------------------
    // Processes, applications, files
    // ---------------------------------------------------------------------

    pub fn check_if_process_is_running(&self, name: &str) -> Result<bool, AutomationError> {
        process::is_running(self.processes.as_ref(), name)
    }

    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn wait_for_process_to_start(
        &self,
        ctx: &CallContext,
        name: &str,
        timeout_ms: u64,
    ) -> Result<bool, AutomationError> {
        let started = poll_until(self.wait_spec(timeout_ms), &ctx.cancellation_token, || {
            let running = self.check_if_process_is_running(name)?;
            trace_call!(ctx, name, running, "process check");
            Ok(running)
        })
        .await?;
        if started {
            Ok(true)
        } else {
            Err(AutomationError::ProcessWaitTimeout {
                name: name.to_string(),
                timeout_ms,
            })
        }
    }

    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn kill_process(&self, ctx: &CallContext, name: &str) -> Result<bool, AutomationError> {
        let running = self.check_if_process_is_running(name)?;
        trace_call!(ctx, name, running, "kill process");
        if !running {
            return Err(AutomationError::ProcessNotFound(name.to_string()));
        }
        let killed = self.processes.kill_by_name(name)?;
        info!("Killed {} process(es) named {}", killed, name);
        Ok(true)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn run_application(&self, app: &str, params: Option<&str>) -> Result<bool, AutomationError> {
        self.processes.run_application(app, params)?;
        Ok(true)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn run_script(
        &self,
        script: &str,
        params: Option<&str>,
    ) -> Result<ScriptOutput, AutomationError> {
        self.processes.run_script(script, params)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn open_browser(
        &self,
        url: &str,
        browser: &str,
        maximize: bool,
    ) -> Result<bool, AutomationError> {
        self.backend.open_url(url, browser, maximize)?;
        self.settle().await;
        Ok(true)
    }

    /// Closes every window of `firefox`, `ie` or `chrome`.
    #[instrument(level = "debug", skip(self))]
    pub async fn close_browser(&self, browser: &str) -> Result<bool, AutomationError> {
        let image = browser_process(browser).ok_or_else(|| {
            AutomationError::InvalidArgument(format!("Browser not recognised: {browser}"))
        })?;
        if self.check_if_process_is_running(image)? {
            self.processes.kill_by_name(image)?;
        }
        self.settle().await;
        Ok(true)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn kill_browser(&self, browser: &str) -> Result<bool, AutomationError> {
        let image = browser_process(browser).unwrap_or(browser);
        self.processes.kill_by_name(image)?;
        self.pause(self.config.key_settle_delay()).await;
        Ok(true)
    }

    /// Reads a file addressed relative to the home directory. `name` is appended
    /// to the home path as is, so it normally starts with a separator.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_file_contents(&self, name: &str) -> Result<String, AutomationError> {
        let home = dirs::home_dir().ok_or_else(|| {
            AutomationError::PlatformError("Cannot determine the home directory".to_string())
        })?;
        let path = PathBuf::from(format!("{}{name}", home.display()));
        Ok(tokio::fs::read_to_string(&path).await?)
    }
}
