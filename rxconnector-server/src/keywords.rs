//! Remote keyword signatures and argument binding.
//!
//! Arguments bind positionally first, then by parameter name, then from
//! defaults. Numeric parameters accept JSON numbers or numeric strings and
//! boolean parameters accept JSON booleans or `"True"`/`"False"`.

use rxconnector::{AutomationError, Command};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    None,
    Bool(bool),
    Int(i64),
}

impl DefaultValue {
    fn to_json(self) -> Value {
        match self {
            DefaultValue::None => Value::Null,
            DefaultValue::Bool(b) => Value::Bool(b),
            DefaultValue::Int(i) => Value::from(i),
        }
    }

    fn render(self) -> String {
        match self {
            DefaultValue::None => "None".to_string(),
            DefaultValue::Bool(true) => "True".to_string(),
            DefaultValue::Bool(false) => "False".to_string(),
            DefaultValue::Int(i) => i.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Param {
    pub name: &'static str,
    pub default: Option<DefaultValue>,
}

const fn req(name: &'static str) -> Param {
    Param {
        name,
        default: None,
    }
}

const fn opt(name: &'static str, default: DefaultValue) -> Param {
    Param {
        name,
        default: Some(default),
    }
}

impl Param {
    /// `name` or `name=default`, as listed by the keyword endpoints.
    pub fn render(&self) -> String {
        match self.default {
            Some(default) => format!("{}={}", self.name, default.render()),
            None => self.name.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct Signature {
    pub name: &'static str,
    pub params: &'static [Param],
    pub doc: &'static str,
}

const WAIT_DEFAULT: DefaultValue = DefaultValue::Int(60000);

macro_rules! keyword {
    ($name:literal, [$($param:expr),* $(,)?], $doc:literal) => {
        Signature {
            name: $name,
            params: &[$($param),*],
            doc: $doc,
        }
    };
}

pub static KEYWORDS: &[Signature] = &[
    keyword!("start_debug", [], "Log resolved elements and attach tracebacks to failures."),
    keyword!("stop_debug", [], "Turn debug detail off again."),
    keyword!(
        "click_element",
        [req("locator"), opt("location", DefaultValue::None), opt("accessible", DefaultValue::Bool(true))],
        "Click an element, optionally at an anchor name or an `x,y` offset."
    ),
    keyword!(
        "double_click_element",
        [req("locator"), opt("location", DefaultValue::None), opt("accessible", DefaultValue::Bool(true))],
        "Double-click an element."
    ),
    keyword!(
        "right_click_element",
        [req("locator"), opt("location", DefaultValue::None)],
        "Right-click an element."
    ),
    keyword!("check", [req("locator")], "Check a check box or radio button."),
    keyword!("uncheck", [req("locator")], "Uncheck a check box or radio button."),
    keyword!("clear_text", [req("locator")], "Clear a text field."),
    keyword!("input_text", [req("locator"), req("text")], "Type text into a text field."),
    keyword!(
        "select_by_index",
        [req("locator"), req("index")],
        "Move the selection to an index with arrow keys."
    ),
    keyword!(
        "set_list_selected_index",
        [req("locator"), req("index")],
        "Set the selected index of a list."
    ),
    keyword!("get_table", [req("locator")], "Cell texts of a table, row by row."),
    keyword!(
        "count_list_items",
        [req("locator"), req("childLocator")],
        "Number of list children matching a child locator."
    ),
    keyword!(
        "get_element_attribute",
        [req("locator"), req("attribute")],
        "Value of an element attribute."
    ),
    keyword!(
        "get_list_items_attribute",
        [req("locator"), req("childLocator"), req("attribute")],
        "Attribute value of every matching list child."
    ),
    keyword!(
        "check_if_element_exists",
        [req("locator"), opt("duration", WAIT_DEFAULT)],
        "Wait up to `duration` ms for an element to exist."
    ),
    keyword!(
        "check_if_element_does_not_exist",
        [req("locator"), opt("duration", WAIT_DEFAULT)],
        "Wait up to `duration` ms for an element to disappear."
    ),
    keyword!(
        "wait_for_element",
        [req("locator"), opt("timeout", WAIT_DEFAULT)],
        "Wait up to `timeout` ms for an element to exist."
    ),
    keyword!(
        "wait_for_element_attribute",
        [req("locator"), req("attribute"), req("expected"), opt("timeout", WAIT_DEFAULT)],
        "Wait up to `timeout` ms for an attribute to read as `expected`."
    ),
    keyword!("make_visible", [req("locator")], "Scroll an element into view."),
    keyword!("set_focus", [req("locator")], "Focus an element; returns whether it took focus."),
    keyword!("drag", [req("locator1"), req("locator2")], "Drag one element onto another."),
    keyword!("scroll", [req("locator"), req("amount")], "Turn the mouse wheel over an element."),
    keyword!("send_keys", [req("locator"), req("key_seq")], "Focus an element and send keys to it."),
    keyword!("take_screenshot", [req("locator")], "Base64 PNG of an element."),
    keyword!("take_desktop_screenshot", [], "Base64 PNG of the desktop."),
    keyword!("run_application", [req("app")], "Start a program."),
    keyword!(
        "run_application_with_parameters",
        [req("app"), req("params")],
        "Start a program with whitespace-separated parameters."
    ),
    keyword!("run_script", [req("script_path")], "Run a script; returns stdout and stderr."),
    keyword!(
        "run_script_with_parameters",
        [req("script_path"), req("params")],
        "Run a script with parameters; returns stdout and stderr."
    ),
    keyword!("kill_process", [req("process_name")], "Kill every process with this image name."),
    keyword!(
        "wait_for_process_to_start",
        [req("process_name"), req("timeout")],
        "Wait up to `timeout` ms for a process to appear."
    ),
    keyword!(
        "check_if_process_is_running",
        [req("process_name")],
        "Whether any process name contains the given text."
    ),
    keyword!("get_file_contents", [req("name")], "Contents of a file below the home directory."),
    keyword!(
        "open_browser",
        [req("url"), req("browser"), opt("maximize", DefaultValue::Bool(false))],
        "Open a URL in a browser."
    ),
    keyword!("close_browser", [req("browser")], "Close firefox, ie or chrome."),
    keyword!("kill_browser", [req("browser")], "Kill a browser process."),
];

pub fn signature(name: &str) -> Option<&'static Signature> {
    KEYWORDS.iter().find(|s| s.name == name)
}

/// A bound call: either a session toggle or a keyword for the connector.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    StartDebug,
    StopDebug,
    Keyword(Command),
}

impl Call {
    pub fn name(&self) -> &'static str {
        match self {
            Call::StartDebug => "start_debug",
            Call::StopDebug => "stop_debug",
            Call::Keyword(command) => command.name(),
        }
    }
}

fn invalid(message: String) -> AutomationError {
    AutomationError::InvalidArgument(message)
}

/// Argument values in parameter order, defaults filled in.
struct Bound {
    keyword: &'static str,
    params: &'static [Param],
    values: Vec<Value>,
}

impl Bound {
    fn value(&self, index: usize) -> &Value {
        &self.values[index]
    }

    fn param(&self, index: usize) -> &'static str {
        self.params[index].name
    }

    fn string(&self, index: usize) -> Result<String, AutomationError> {
        match self.value(index) {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(invalid(format!(
                "{}: argument '{}' must be a string, got {other}",
                self.keyword,
                self.param(index)
            ))),
        }
    }

    fn opt_string(&self, index: usize) -> Result<Option<String>, AutomationError> {
        match self.value(index) {
            Value::Null => Ok(None),
            Value::String(s) if s == "None" => Ok(None),
            _ => self.string(index).map(Some),
        }
    }

    fn bool(&self, index: usize) -> Result<bool, AutomationError> {
        match self.value(index) {
            Value::Bool(b) => Ok(*b),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
            other => Err(invalid(format!(
                "{}: argument '{}' must be a boolean, got {other}",
                self.keyword,
                self.param(index)
            ))),
        }
    }

    fn int(&self, index: usize) -> Result<i64, AutomationError> {
        let parsed = match self.value(index) {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| {
            invalid(format!(
                "{}: argument '{}' must be an integer, got {}",
                self.keyword,
                self.param(index),
                self.value(index)
            ))
        })
    }

    fn millis(&self, index: usize) -> Result<u64, AutomationError> {
        let value = self.int(index)?;
        u64::try_from(value).map_err(|_| {
            invalid(format!(
                "{}: argument '{}' must not be negative, got {value}",
                self.keyword,
                self.param(index)
            ))
        })
    }

    fn amount(&self, index: usize) -> Result<i32, AutomationError> {
        let value = self.int(index)?;
        i32::try_from(value).map_err(|_| {
            invalid(format!(
                "{}: argument '{}' is out of range: {value}",
                self.keyword,
                self.param(index)
            ))
        })
    }
}

fn bind_values(
    signature: &'static Signature,
    args: Vec<Value>,
    mut kwargs: Map<String, Value>,
) -> Result<Bound, AutomationError> {
    let params = signature.params;
    if args.len() > params.len() {
        return Err(invalid(format!(
            "{} takes at most {} argument(s), {} given",
            signature.name,
            params.len(),
            args.len()
        )));
    }

    let positional = args.len();
    let mut values: Vec<Option<Value>> = args.into_iter().map(Some).collect();
    values.resize(params.len(), None);

    for (index, param) in params.iter().enumerate() {
        if let Some(value) = kwargs.remove(param.name) {
            if index < positional {
                return Err(invalid(format!(
                    "{} got multiple values for argument '{}'",
                    signature.name, param.name
                )));
            }
            values[index] = Some(value);
        }
    }
    if let Some(unknown) = kwargs.keys().next() {
        return Err(invalid(format!(
            "{} got an unexpected keyword argument '{unknown}'",
            signature.name
        )));
    }

    let values = params
        .iter()
        .zip(values)
        .map(|(param, value)| {
            value
                .or_else(|| param.default.map(DefaultValue::to_json))
                .ok_or_else(|| {
                    invalid(format!(
                        "{} missing required argument '{}'",
                        signature.name, param.name
                    ))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Bound {
        keyword: signature.name,
        params,
        values,
    })
}

/// Binds a remote call to a [`Call`].
pub fn bind(
    name: &str,
    args: Vec<Value>,
    kwargs: Map<String, Value>,
) -> Result<Call, AutomationError> {
    let signature =
        signature(name).ok_or_else(|| invalid(format!("No keyword named '{name}'")))?;
    let b = bind_values(signature, args, kwargs)?;

    let command = match signature.name {
        "start_debug" => return Ok(Call::StartDebug),
        "stop_debug" => return Ok(Call::StopDebug),
        "click_element" => Command::ClickElement {
            locator: b.string(0)?,
            location: b.opt_string(1)?,
            accessible: b.bool(2)?,
        },
        "double_click_element" => Command::DoubleClickElement {
            locator: b.string(0)?,
            location: b.opt_string(1)?,
            accessible: b.bool(2)?,
        },
        "right_click_element" => Command::RightClickElement {
            locator: b.string(0)?,
            location: b.opt_string(1)?,
        },
        "check" => Command::Check {
            locator: b.string(0)?,
        },
        "uncheck" => Command::Uncheck {
            locator: b.string(0)?,
        },
        "clear_text" => Command::ClearText {
            locator: b.string(0)?,
        },
        "input_text" => Command::InputText {
            locator: b.string(0)?,
            text: b.string(1)?,
        },
        "select_by_index" => Command::SelectByIndex {
            locator: b.string(0)?,
            index: b.int(1)?,
        },
        "set_list_selected_index" => Command::SetListSelectedIndex {
            locator: b.string(0)?,
            index: b.int(1)?,
        },
        "get_table" => Command::GetTable {
            locator: b.string(0)?,
        },
        "count_list_items" => Command::CountListItems {
            locator: b.string(0)?,
            child_locator: b.string(1)?,
        },
        "get_element_attribute" => Command::GetElementAttribute {
            locator: b.string(0)?,
            attribute: b.string(1)?,
        },
        "get_list_items_attribute" => Command::GetListItemsAttribute {
            locator: b.string(0)?,
            child_locator: b.string(1)?,
            attribute: b.string(2)?,
        },
        "check_if_element_exists" => Command::CheckIfElementExists {
            locator: b.string(0)?,
            duration_ms: b.millis(1)?,
        },
        "check_if_element_does_not_exist" => Command::CheckIfElementDoesNotExist {
            locator: b.string(0)?,
            duration_ms: b.millis(1)?,
        },
        "wait_for_element" => Command::WaitForElement {
            locator: b.string(0)?,
            timeout_ms: b.millis(1)?,
        },
        "wait_for_element_attribute" => Command::WaitForElementAttribute {
            locator: b.string(0)?,
            attribute: b.string(1)?,
            expected: b.string(2)?,
            timeout_ms: b.millis(3)?,
        },
        "make_visible" => Command::MakeVisible {
            locator: b.string(0)?,
        },
        "set_focus" => Command::SetFocus {
            locator: b.string(0)?,
        },
        "drag" => Command::Drag {
            from: b.string(0)?,
            to: b.string(1)?,
        },
        "scroll" => Command::Scroll {
            locator: b.string(0)?,
            amount: b.amount(1)?,
        },
        "send_keys" => Command::SendKeys {
            locator: b.string(0)?,
            key_seq: b.string(1)?,
        },
        "take_screenshot" => Command::TakeScreenshot {
            locator: b.string(0)?,
        },
        "take_desktop_screenshot" => Command::TakeDesktopScreenshot,
        "run_application" => Command::RunApplication { app: b.string(0)? },
        "run_application_with_parameters" => Command::RunApplicationWithParameters {
            app: b.string(0)?,
            params: b.string(1)?,
        },
        "run_script" => Command::RunScript {
            script: b.string(0)?,
        },
        "run_script_with_parameters" => Command::RunScriptWithParameters {
            script: b.string(0)?,
            params: b.string(1)?,
        },
        "kill_process" => Command::KillProcess { name: b.string(0)? },
        "wait_for_process_to_start" => Command::WaitForProcessToStart {
            name: b.string(0)?,
            timeout_ms: b.millis(1)?,
        },
        "check_if_process_is_running" => Command::CheckIfProcessIsRunning { name: b.string(0)? },
        "get_file_contents" => Command::GetFileContents { name: b.string(0)? },
        "open_browser" => Command::OpenBrowser {
            url: b.string(0)?,
            browser: b.string(1)?,
            maximize: b.bool(2)?,
        },
        "close_browser" => Command::CloseBrowser {
            browser: b.string(0)?,
        },
        "kill_browser" => Command::KillBrowser {
            browser: b.string(0)?,
        },
        other => return Err(invalid(format!("Keyword '{other}' has no binding"))),
    };
    Ok(Call::Keyword(command))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kwargs(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_every_keyword_has_a_binding() {
        for signature in KEYWORDS {
            let args = vec![json!("1"); signature.params.len()];
            let call = bind(signature.name, args, Map::new());
            match call {
                Ok(call) => assert_eq!(call.name(), signature.name),
                // Boolean parameters reject "1"; everything else must bind.
                Err(AutomationError::InvalidArgument(msg)) => {
                    assert!(msg.contains("boolean"), "{}: {msg}", signature.name)
                }
                Err(e) => panic!("{}: {e}", signature.name),
            }
        }
    }

    #[test]
    fn test_defaults_fill_missing_arguments() {
        let call = bind("click_element", vec![json!("/form/button")], Map::new()).unwrap();
        assert_eq!(
            call,
            Call::Keyword(Command::ClickElement {
                locator: "/form/button".to_string(),
                location: None,
                accessible: true,
            })
        );

        let call = bind("wait_for_element", vec![json!("/form/button")], Map::new()).unwrap();
        assert_eq!(
            call,
            Call::Keyword(Command::WaitForElement {
                locator: "/form/button".to_string(),
                timeout_ms: 60000,
            })
        );
    }

    #[test]
    fn test_positional_then_named() {
        let call = bind(
            "click_element",
            vec![json!("/form/button"), json!("Center")],
            kwargs(json!({"accessible": "False"})),
        )
        .unwrap();
        assert_eq!(
            call,
            Call::Keyword(Command::ClickElement {
                locator: "/form/button".to_string(),
                location: Some("Center".to_string()),
                accessible: false,
            })
        );

        let call = bind(
            "count_list_items",
            Vec::new(),
            kwargs(json!({"locator": "/form/list", "childLocator": "listitem"})),
        )
        .unwrap();
        assert_eq!(call.name(), "count_list_items");
    }

    #[test]
    fn test_numeric_strings() {
        let call = bind(
            "select_by_index",
            vec![json!("/form/combobox"), json!(" 3 ")],
            Map::new(),
        )
        .unwrap();
        assert_eq!(
            call,
            Call::Keyword(Command::SelectByIndex {
                locator: "/form/combobox".to_string(),
                index: 3,
            })
        );

        let err = bind(
            "select_by_index",
            vec![json!("/form/combobox"), json!("third")],
            Map::new(),
        )
        .unwrap_err();
        assert!(matches!(err, AutomationError::InvalidArgument(_)));

        let err = bind(
            "wait_for_element",
            vec![json!("/form/button"), json!(-5)],
            Map::new(),
        )
        .unwrap_err();
        assert!(matches!(err, AutomationError::InvalidArgument(_)));
    }

    #[test]
    fn test_binding_errors() {
        assert!(bind("frobnicate", Vec::new(), Map::new()).is_err());
        assert!(bind("check", Vec::new(), Map::new()).is_err());
        assert!(bind("check", vec![json!("a"), json!("b")], Map::new()).is_err());
        assert!(bind(
            "check",
            vec![json!("/form/checkbox")],
            kwargs(json!({"locator": "/form/checkbox"}))
        )
        .is_err());
        assert!(bind(
            "check",
            vec![json!("/form/checkbox")],
            kwargs(json!({"force": true}))
        )
        .is_err());
    }

    #[test]
    fn test_rendered_parameters() {
        let rendered: Vec<String> = signature("click_element")
            .unwrap()
            .params
            .iter()
            .map(Param::render)
            .collect();
        assert_eq!(rendered, ["locator", "location=None", "accessible=True"]);
        assert_eq!(
            signature("check_if_element_exists").unwrap().params[1].render(),
            "duration=60000"
        );
    }
}
