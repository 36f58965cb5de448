//! Keyword calls as data, and their uniform execution.

use crate::connector::Connector;
use crate::context::CallContext;
use crate::errors::AutomationError;
use crate::types::OperationResult;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// One keyword call with its arguments bound.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ClickElement {
        locator: String,
        location: Option<String>,
        accessible: bool,
    },
    DoubleClickElement {
        locator: String,
        location: Option<String>,
        accessible: bool,
    },
    RightClickElement {
        locator: String,
        location: Option<String>,
    },
    Check {
        locator: String,
    },
    Uncheck {
        locator: String,
    },
    ClearText {
        locator: String,
    },
    InputText {
        locator: String,
        text: String,
    },
    SelectByIndex {
        locator: String,
        index: i64,
    },
    SetListSelectedIndex {
        locator: String,
        index: i64,
    },
    GetTable {
        locator: String,
    },
    CountListItems {
        locator: String,
        child_locator: String,
    },
    GetElementAttribute {
        locator: String,
        attribute: String,
    },
    GetListItemsAttribute {
        locator: String,
        child_locator: String,
        attribute: String,
    },
    CheckIfElementExists {
        locator: String,
        duration_ms: u64,
    },
    CheckIfElementDoesNotExist {
        locator: String,
        duration_ms: u64,
    },
    WaitForElement {
        locator: String,
        timeout_ms: u64,
    },
    WaitForElementAttribute {
        locator: String,
        attribute: String,
        expected: String,
        timeout_ms: u64,
    },
    MakeVisible {
        locator: String,
    },
    SetFocus {
        locator: String,
    },
    Drag {
        from: String,
        to: String,
    },
    Scroll {
        locator: String,
        amount: i32,
    },
    SendKeys {
        locator: String,
        key_seq: String,
    },
    TakeScreenshot {
        locator: String,
    },
    TakeDesktopScreenshot,
    RunApplication {
        app: String,
    },
    RunApplicationWithParameters {
        app: String,
        params: String,
    },
    RunScript {
        script: String,
    },
    RunScriptWithParameters {
        script: String,
        params: String,
    },
    KillProcess {
        name: String,
    },
    WaitForProcessToStart {
        name: String,
        timeout_ms: u64,
    },
    CheckIfProcessIsRunning {
        name: String,
    },
    GetFileContents {
        name: String,
    },
    OpenBrowser {
        url: String,
        browser: String,
        maximize: bool,
    },
    CloseBrowser {
        browser: String,
    },
    KillBrowser {
        browser: String,
    },
}

impl Command {
    /// Keyword name the command is invoked by.
    pub fn name(&self) -> &'static str {
        match self {
            Command::ClickElement { .. } => "click_element",
            Command::DoubleClickElement { .. } => "double_click_element",
            Command::RightClickElement { .. } => "right_click_element",
            Command::Check { .. } => "check",
            Command::Uncheck { .. } => "uncheck",
            Command::ClearText { .. } => "clear_text",
            Command::InputText { .. } => "input_text",
            Command::SelectByIndex { .. } => "select_by_index",
            Command::SetListSelectedIndex { .. } => "set_list_selected_index",
            Command::GetTable { .. } => "get_table",
            Command::CountListItems { .. } => "count_list_items",
            Command::GetElementAttribute { .. } => "get_element_attribute",
            Command::GetListItemsAttribute { .. } => "get_list_items_attribute",
            Command::CheckIfElementExists { .. } => "check_if_element_exists",
            Command::CheckIfElementDoesNotExist { .. } => "check_if_element_does_not_exist",
            Command::WaitForElement { .. } => "wait_for_element",
            Command::WaitForElementAttribute { .. } => "wait_for_element_attribute",
            Command::MakeVisible { .. } => "make_visible",
            Command::SetFocus { .. } => "set_focus",
            Command::Drag { .. } => "drag",
            Command::Scroll { .. } => "scroll",
            Command::SendKeys { .. } => "send_keys",
            Command::TakeScreenshot { .. } => "take_screenshot",
            Command::TakeDesktopScreenshot => "take_desktop_screenshot",
            Command::RunApplication { .. } => "run_application",
            Command::RunApplicationWithParameters { .. } => "run_application_with_parameters",
            Command::RunScript { .. } => "run_script",
            Command::RunScriptWithParameters { .. } => "run_script_with_parameters",
            Command::KillProcess { .. } => "kill_process",
            Command::WaitForProcessToStart { .. } => "wait_for_process_to_start",
            Command::CheckIfProcessIsRunning { .. } => "check_if_process_is_running",
            Command::GetFileContents { .. } => "get_file_contents",
            Command::OpenBrowser { .. } => "open_browser",
            Command::CloseBrowser { .. } => "close_browser",
            Command::KillBrowser { .. } => "kill_browser",
        }
    }
}

impl Connector {
    /// Runs one bound keyword call.
    #[instrument(level = "debug", skip_all, fields(keyword = command.name()))]
    pub async fn execute(
        &self,
        ctx: &CallContext,
        command: Command,
    ) -> Result<OperationResult, AutomationError> {
        if ctx.is_cancelled() {
            return Err(AutomationError::Cancelled(command.name().to_string()));
        }
        debug!(?command, debug = ctx.debug, "executing keyword");

        let result = match command {
            Command::ClickElement {
                locator,
                location,
                accessible,
            } => self
                .click_element(ctx, &locator, location.as_deref(), accessible)
                .await?
                .into(),
            Command::DoubleClickElement {
                locator,
                location,
                accessible,
            } => self
                .double_click_element(ctx, &locator, location.as_deref(), accessible)
                .await?
                .into(),
            Command::RightClickElement { locator, location } => self
                .right_click_element(ctx, &locator, location.as_deref())
                .await?
                .into(),
            Command::Check { locator } => self.check(ctx, &locator).await?.into(),
            Command::Uncheck { locator } => self.uncheck(ctx, &locator).await?.into(),
            Command::ClearText { locator } => self.clear_text(ctx, &locator).await?.into(),
            Command::InputText { locator, text } => {
                self.input_text(ctx, &locator, &text).await?.into()
            }
            Command::SelectByIndex { locator, index } => {
                self.select_by_index(ctx, &locator, index).await?.into()
            }
            Command::SetListSelectedIndex { locator, index } => self
                .set_list_selected_index(ctx, &locator, index)
                .await?
                .into(),
            Command::GetTable { locator } => {
                OperationResult::Table(self.get_table(ctx, &locator).await?)
            }
            Command::CountListItems {
                locator,
                child_locator,
            } => OperationResult::Count(
                self.count_list_items(ctx, &locator, &child_locator)
                    .await?,
            ),
            Command::GetElementAttribute { locator, attribute } => OperationResult::Attribute(
                self.get_element_attribute(ctx, &locator, &attribute)
                    .await?,
            ),
            Command::GetListItemsAttribute {
                locator,
                child_locator,
                attribute,
            } => OperationResult::Values(
                self.get_list_items_attribute(ctx, &locator, &child_locator, &attribute)
                    .await?,
            ),
            Command::CheckIfElementExists {
                locator,
                duration_ms,
            } => self
                .check_if_element_exists(ctx, &locator, duration_ms)
                .await?
                .into(),
            Command::CheckIfElementDoesNotExist {
                locator,
                duration_ms,
            } => self
                .check_if_element_does_not_exist(ctx, &locator, duration_ms)
                .await?
                .into(),
            Command::WaitForElement {
                locator,
                timeout_ms,
            } => self
                .wait_for_element(ctx, &locator, timeout_ms)
                .await?
                .into(),
            Command::WaitForElementAttribute {
                locator,
                attribute,
                expected,
                timeout_ms,
            } => self
                .wait_for_element_attribute(ctx, &locator, &attribute, &expected, timeout_ms)
                .await?
                .into(),
            Command::MakeVisible { locator } => self.make_visible(ctx, &locator).await?.into(),
            Command::SetFocus { locator } => self.set_focus(ctx, &locator).await?.into(),
            Command::Drag { from, to } => self.drag(ctx, &from, &to).await?.into(),
            Command::Scroll { locator, amount } => {
                self.scroll(ctx, &locator, amount).await?.into()
            }
            Command::SendKeys { locator, key_seq } => {
                self.send_keys(ctx, &locator, &key_seq).await?.into()
            }
            Command::TakeScreenshot { locator } => {
                self.take_screenshot(ctx, &locator).await?.into()
            }
            Command::TakeDesktopScreenshot => self.take_desktop_screenshot().await?.into(),
            Command::RunApplication { app } => self.run_application(&app, None).await?.into(),
            Command::RunApplicationWithParameters { app, params } => self
                .run_application(&app, Some(&params))
                .await?
                .into(),
            Command::RunScript { script } => {
                script_result(self.run_script(&script, None).await?)
            }
            Command::RunScriptWithParameters { script, params } => {
                script_result(self.run_script(&script, Some(&params)).await?)
            }
            Command::KillProcess { name } => self.kill_process(ctx, &name).await?.into(),
            Command::WaitForProcessToStart { name, timeout_ms } => self
                .wait_for_process_to_start(ctx, &name, timeout_ms)
                .await?
                .into(),
            Command::CheckIfProcessIsRunning { name } => {
                self.check_if_process_is_running(&name)?.into()
            }
            Command::GetFileContents { name } => self.get_file_contents(&name).await?.into(),
            Command::OpenBrowser {
                url,
                browser,
                maximize,
            } => self.open_browser(&url, &browser, maximize).await?.into(),
            Command::CloseBrowser { browser } => self.close_browser(&browser).await?.into(),
            Command::KillBrowser { browser } => self.kill_browser(&browser).await?.into(),
        };
        Ok(result)
    }
}

fn script_result(output: crate::process::ScriptOutput) -> OperationResult {
    OperationResult::Map(BTreeMap::from([
        ("stdout".to_string(), output.stdout),
        ("stderr".to_string(), output.stderr),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names() {
        assert_eq!(Command::TakeDesktopScreenshot.name(), "take_desktop_screenshot");
        let command = Command::WaitForElementAttribute {
            locator: "/form/text".to_string(),
            attribute: "Text".to_string(),
            expected: "done".to_string(),
            timeout_ms: 5000,
        };
        assert_eq!(command.name(), "wait_for_element_attribute");
    }
}
