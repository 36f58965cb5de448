//! Timing of the polling keywords, run on a paused tokio clock.

use rxconnector::platforms::simulated::{Action, SceneNode};
use rxconnector::{
    AttributeValue, AutomationBackend, AutomationError, CallContext, Connector, ConnectorConfig,
    Element, ElementTag, MouseButton, ProcessHost, ScriptOutput, SimulatedBackend,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Default)]
struct FakeProcesses {
    running: Mutex<Vec<String>>,
}

impl FakeProcesses {
    fn start(&self, name: &str) {
        self.running.lock().unwrap().push(name.to_string());
    }
}

impl ProcessHost for FakeProcesses {
    fn process_names(&self) -> Result<Vec<String>, AutomationError> {
        Ok(self.running.lock().unwrap().clone())
    }

    fn kill_by_name(&self, name: &str) -> Result<usize, AutomationError> {
        let mut running = self.running.lock().unwrap();
        let before = running.len();
        running.retain(|p| p != name);
        Ok(before - running.len())
    }

    fn run_application(&self, app: &str, _params: Option<&str>) -> Result<(), AutomationError> {
        self.start(app);
        Ok(())
    }

    fn run_script(&self, _script: &str, _params: Option<&str>) -> Result<ScriptOutput, AutomationError> {
        Ok(ScriptOutput::default())
    }
}

fn setup() -> (Connector, SimulatedBackend, Arc<FakeProcesses>) {
    let backend = SimulatedBackend::new();
    let processes = Arc::new(FakeProcesses::default());
    let config = ConnectorConfig {
        settle_delay_ms: 0,
        key_settle_delay_ms: 0,
        ..ConnectorConfig::default()
    };
    let connector = Connector::new(Arc::new(backend.clone()), processes.clone(), config);
    (connector, backend, processes)
}

/// A desktop whose automation API has stopped answering.
struct LockedDesktop;

impl AutomationBackend for LockedDesktop {
    fn locate(&self, _tag: ElementTag, _locator: &str) -> Result<Element, AutomationError> {
        Err(AutomationError::PlatformError("session is locked".into()))
    }
    fn capture_desktop(&self) -> Result<Vec<u8>, AutomationError> {
        Err(AutomationError::PlatformError("session is locked".into()))
    }
    fn mouse_button(&self, _button: MouseButton, _down: bool) -> Result<(), AutomationError> {
        Err(AutomationError::PlatformError("session is locked".into()))
    }
    fn scroll_wheel(&self, _amount: i32) -> Result<(), AutomationError> {
        Err(AutomationError::PlatformError("session is locked".into()))
    }
    fn open_url(&self, _url: &str, _browser: &str, _maximize: bool) -> Result<(), AutomationError> {
        Err(AutomationError::PlatformError("session is locked".into()))
    }
}

/// Runs `change` once `delay` of virtual time has passed.
fn after(delay: Duration, change: impl FnOnce() + Send + 'static) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        change();
    });
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_element_succeeds_on_next_poll() {
    let (connector, backend, _) = setup();
    let late = backend.clone();
    after(Duration::from_secs(12), move || {
        late.insert("/form[@title='Done']", SceneNode::new(ElementTag::Form));
    });

    let start = Instant::now();
    let found = connector
        .wait_for_element(&CallContext::default(), "/form[@title='Done']", 20000)
        .await
        .unwrap();
    assert!(found);
    assert_eq!(start.elapsed(), Duration::from_secs(15));
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_element_times_out() {
    let (connector, backend, _) = setup();

    let start = Instant::now();
    let err = connector
        .wait_for_element(&CallContext::default(), "/form/button", 10000)
        .await
        .unwrap_err();
    assert!(matches!(err, AutomationError::ElementNotFound(_)));
    assert_eq!(start.elapsed(), Duration::from_secs(10));

    // Polled at 0, 5 and 10 seconds.
    let locates = backend
        .actions()
        .iter()
        .filter(|a| matches!(a, Action::Locate { .. }))
        .count();
    assert_eq!(locates, 3);
}

#[tokio::test(start_paused = true)]
async fn test_short_timeouts_round_up_to_one_poll_step() {
    let (connector, _, _) = setup();

    let start = Instant::now();
    let err = connector
        .check_if_element_exists(&CallContext::default(), "/form/button", 3000)
        .await
        .unwrap_err();
    assert!(matches!(err, AutomationError::ElementNotFound(_)));
    assert_eq!(start.elapsed(), Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_element_disappears() {
    let (connector, backend, _) = setup();
    backend.insert("/form/progressbar", SceneNode::new(ElementTag::ProgressBar));
    let late = backend.clone();
    after(Duration::from_secs(4), move || {
        late.remove("/form/progressbar");
    });

    let start = Instant::now();
    assert!(connector
        .check_if_element_does_not_exist(&CallContext::default(), "/form/progressbar", 30000)
        .await
        .unwrap());
    assert_eq!(start.elapsed(), Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_element_still_exists() {
    let (connector, backend, _) = setup();
    backend.insert("/form/progressbar", SceneNode::new(ElementTag::ProgressBar));

    let err = connector
        .check_if_element_does_not_exist(&CallContext::default(), "/form/progressbar", 5000)
        .await
        .unwrap_err();
    assert!(matches!(err, AutomationError::ElementStillExists(_)));
}

#[tokio::test(start_paused = true)]
async fn test_backend_failure_is_not_absence() {
    let connector = Connector::new(
        Arc::new(LockedDesktop),
        Arc::new(FakeProcesses::default()),
        ConnectorConfig::default(),
    );

    let start = Instant::now();
    let err = connector
        .check_if_element_does_not_exist(&CallContext::default(), "/form/progressbar", 30000)
        .await
        .unwrap_err();
    match err {
        AutomationError::ElementNotFound(msg) => assert!(msg.contains("session is locked")),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_float_attribute() {
    let (connector, backend, _) = setup();
    let locator = "/form/progressbar";
    backend.insert(
        locator,
        SceneNode::new(ElementTag::ProgressBar).with_attribute("Value", AttributeValue::Float(20.0)),
    );
    let late = backend.clone();
    after(Duration::from_secs(3), move || {
        late.update_attribute(locator, "Value", AttributeValue::Float(50.0));
    });

    let start = Instant::now();
    assert!(connector
        .wait_for_element_attribute(&CallContext::default(), locator, "Value", "50.0", 30000)
        .await
        .unwrap());
    assert_eq!(start.elapsed(), Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_element_attribute() {
    let (connector, backend, _) = setup();
    let locator = "/form/text[@accessiblename='Status']";
    backend.insert(
        locator,
        SceneNode::new(ElementTag::Text).with_attribute("Text", "working"),
    );
    let late = backend.clone();
    after(Duration::from_secs(6), move || {
        late.update_attribute(locator, "Text", "finished");
    });

    let start = Instant::now();
    assert!(connector
        .wait_for_element_attribute(&CallContext::default(), locator, "Text", "finished", 30000)
        .await
        .unwrap());
    assert_eq!(start.elapsed(), Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_boolean_attribute_compares_text() {
    let (connector, backend, _) = setup();
    backend.insert(
        "/form/button",
        SceneNode::new(ElementTag::Button).with_attribute("Enabled", false),
    );

    let err = connector
        .wait_for_element_attribute(&CallContext::default(), "/form/button", "Enabled", "True", 5000)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AutomationError::AttributeWaitTimeout { ref expected, timeout_ms: 5000, .. } if expected == "True"
    ));

    backend.update_attribute("/form/button", "Enabled", true);
    assert!(connector
        .wait_for_element_attribute(&CallContext::default(), "/form/button", "Enabled", "True", 5000)
        .await
        .unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_accessible_click_waits_for_enabled() {
    let (connector, backend, _) = setup();
    backend.insert(
        "/form/button[@text='Save']",
        SceneNode::new(ElementTag::Button).with_attribute("Enabled", false),
    );
    let late = backend.clone();
    after(Duration::from_secs(7), move || {
        late.update_attribute("/form/button[@text='Save']", "Enabled", true);
    });

    let start = Instant::now();
    connector
        .click_element(&CallContext::default(), "/form/button[@text='Save']", None, true)
        .await
        .unwrap();
    assert_eq!(start.elapsed(), Duration::from_secs(10));
    assert!(backend
        .actions()
        .iter()
        .any(|a| matches!(a, Action::Click { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_accessible_click_gives_up() {
    let (connector, backend, _) = setup();
    backend.insert(
        "/form/button",
        SceneNode::new(ElementTag::Button).with_attribute("Visible", false),
    );

    let start = Instant::now();
    let err = connector
        .click_element(&CallContext::default(), "/form/button", None, true)
        .await
        .unwrap_err();
    assert!(matches!(err, AutomationError::AccessibilityTimeout(_)));
    assert_eq!(start.elapsed(), Duration::from_secs(60));
    assert!(!backend
        .actions()
        .iter()
        .any(|a| matches!(a, Action::Click { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_process_to_start() {
    let (connector, _, processes) = setup();
    let late = processes.clone();
    after(Duration::from_secs(3), move || late.start("report.exe"));

    let start = Instant::now();
    assert!(connector
        .wait_for_process_to_start(&CallContext::default(), "report", 3000)
        .await
        .unwrap());
    assert_eq!(start.elapsed(), Duration::from_secs(5));

    let err = connector
        .wait_for_process_to_start(&CallContext::default(), "never", 10000)
        .await
        .unwrap_err();
    assert!(matches!(err, AutomationError::ProcessWaitTimeout { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_wait_stops_early() {
    let (connector, _, _) = setup();
    let ctx = CallContext::default();
    let token = ctx.cancellation_token.clone();
    after(Duration::from_secs(7), move || token.cancel());

    let start = Instant::now();
    let err = connector
        .wait_for_element(&ctx, "/form/button", 60000)
        .await
        .unwrap_err();
    assert!(matches!(err, AutomationError::Cancelled(_)));
    assert_eq!(start.elapsed(), Duration::from_secs(7));
}
