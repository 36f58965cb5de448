//! In-memory backend driven by a scene description.
//!
//! Elements are registered under the exact locator text that addresses them. The
//! backend records every primitive it receives and reacts to input the way the
//! real controls would where it matters for the keywords: clicking a check box
//! flips `Checked`, `{up}`/`{down}` move `SelectedItemIndex`, typed text and the
//! select-all-then-delete sequence edit `Text`.

use crate::platforms::AutomationBackend;
use crate::{AttributeValue, AutomationError, Element, ElementImpl, ElementTag, Location, MouseButton};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

const DESKTOP_SIZE: (u32, u32) = (64, 48);
const DEFAULT_ELEMENT_SIZE: (u32, u32) = (16, 12);

/// One element of a scene, with the elements reachable from it by child locator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneNode {
    pub tag: ElementTag,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
    #[serde(default)]
    pub children: BTreeMap<String, Vec<SceneNode>>,
}

impl SceneNode {
    pub fn new(tag: ElementTag) -> Self {
        Self {
            tag,
            attributes: BTreeMap::new(),
            children: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn with_children(mut self, child_locator: &str, children: Vec<SceneNode>) -> Self {
        self.children.insert(child_locator.to_string(), children);
        self
    }
}

/// Top-level elements keyed by the locator that addresses them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub elements: BTreeMap<String, SceneNode>,
}

/// A primitive the backend received, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Locate { tag: ElementTag, locator: String },
    Click { target: String, location: Option<Location> },
    DoubleClick { target: String, location: Option<Location> },
    RightClick { target: String, location: Option<Location> },
    PressKeys { target: String, keys: String },
    Focus { target: String },
    SetAttribute { target: String, name: String, value: AttributeValue },
    CaptureImage { target: String },
    MoveTo { target: String, location: Location },
    EnsureVisible { target: String },
    MouseButton { button: MouseButton, down: bool },
    ScrollWheel { amount: i32 },
    CaptureDesktop,
    OpenUrl { url: String, browser: String, maximize: bool },
}

#[derive(Debug)]
struct Node {
    label: String,
    tag: ElementTag,
    attributes: BTreeMap<String, AttributeValue>,
    children: BTreeMap<String, Vec<usize>>,
}

#[derive(Debug, Default)]
struct World {
    nodes: Vec<Node>,
    roots: BTreeMap<String, usize>,
    actions: Vec<Action>,
    focused: Option<usize>,
}

impl World {
    fn add(&mut self, label: String, scene: SceneNode) -> usize {
        let mut attributes = scene.attributes;
        attributes
            .entry("Enabled".to_string())
            .or_insert(AttributeValue::Bool(true));
        attributes
            .entry("Visible".to_string())
            .or_insert(AttributeValue::Bool(true));

        let id = self.nodes.len();
        self.nodes.push(Node {
            label: label.clone(),
            tag: scene.tag,
            attributes,
            children: BTreeMap::new(),
        });

        for (child_locator, nodes) in scene.children {
            let ids = nodes
                .into_iter()
                .enumerate()
                .map(|(i, child)| self.add(format!("{label}/{child_locator}[{}]", i + 1), child))
                .collect();
            self.nodes[id].children.insert(child_locator, ids);
        }
        id
    }

    fn record(&mut self, action: Action) {
        debug!("simulated backend: {:?}", action);
        self.actions.push(action);
    }

    fn label(&self, id: usize) -> String {
        self.nodes[id].label.clone()
    }
}

fn lock(world: &Mutex<World>) -> MutexGuard<'_, World> {
    world.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn encode_png(width: u32, height: u32, fill: [u8; 4]) -> Result<Vec<u8>, AutomationError> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(fill));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| AutomationError::PlatformError(format!("Failed to encode image: {e}")))?;
    Ok(bytes)
}

fn dimension(node: &Node, name: &str, fallback: u32) -> u32 {
    node.attributes
        .get(name)
        .and_then(AttributeValue::as_i64)
        .and_then(|v| u32::try_from(v).ok())
        .filter(|v| *v > 0)
        .unwrap_or(fallback)
}

/// Applies a key sequence to the text and selection state of a node.
fn apply_keys(node: &mut Node, keys: &str) {
    let mut text = match node.attributes.get("Text") {
        None | Some(AttributeValue::Null) => String::new(),
        Some(value) => value.to_string(),
    };
    let original_text = text.clone();
    let mut index = node
        .attributes
        .get("SelectedItemIndex")
        .and_then(AttributeValue::as_i64);
    let mut shift = false;
    let mut all_selected = false;

    let mut chars = keys.chars();
    while let Some(c) = chars.next() {
        if c != '{' {
            if all_selected {
                text.clear();
                all_selected = false;
            }
            text.push(c);
            continue;
        }
        let token: String = chars.by_ref().take_while(|&c| c != '}').collect();
        match token.to_ascii_lowercase().as_str() {
            "up" => {
                if let Some(i) = index.as_mut() {
                    *i = (*i - 1).max(0);
                }
            }
            "down" => {
                if let Some(i) = index.as_mut() {
                    *i += 1;
                }
            }
            "shift down" => shift = true,
            "shift up" => shift = false,
            "home" if shift => all_selected = true,
            "delete" | "back" if all_selected => {
                text.clear();
                all_selected = false;
            }
            "back" => {
                text.pop();
            }
            _ => {}
        }
    }

    if text != original_text {
        node.attributes
            .insert("Text".to_string(), AttributeValue::Text(text));
    }
    if let Some(i) = index {
        node.attributes
            .insert("SelectedItemIndex".to_string(), AttributeValue::Int(i));
    }
}

#[derive(Debug, Clone)]
struct SimulatedElement {
    id: usize,
    world: Arc<Mutex<World>>,
}

impl SimulatedElement {
    fn element(&self, id: usize) -> Element {
        Element::new(Box::new(SimulatedElement {
            id,
            world: self.world.clone(),
        }))
    }
}

impl ElementImpl for SimulatedElement {
    fn describe(&self) -> String {
        lock(&self.world).label(self.id)
    }

    fn click(&self, location: Option<Location>) -> Result<(), AutomationError> {
        let mut world = lock(&self.world);
        let target = world.label(self.id);
        world.record(Action::Click { target, location });
        let node = &mut world.nodes[self.id];
        match node.tag {
            ElementTag::CheckBox => {
                let checked = node
                    .attributes
                    .get("Checked")
                    .map(AttributeValue::is_true)
                    .unwrap_or(false);
                node.attributes
                    .insert("Checked".to_string(), AttributeValue::Bool(!checked));
            }
            ElementTag::RadioButton => {
                node.attributes
                    .insert("Checked".to_string(), AttributeValue::Bool(true));
            }
            _ => {}
        }
        Ok(())
    }

    fn double_click(&self, location: Option<Location>) -> Result<(), AutomationError> {
        let mut world = lock(&self.world);
        let target = world.label(self.id);
        world.record(Action::DoubleClick { target, location });
        Ok(())
    }

    fn right_click(&self, location: Option<Location>) -> Result<(), AutomationError> {
        let mut world = lock(&self.world);
        let target = world.label(self.id);
        world.record(Action::RightClick { target, location });
        Ok(())
    }

    fn press_keys(&self, keys: &str) -> Result<(), AutomationError> {
        let mut world = lock(&self.world);
        let target = world.label(self.id);
        world.record(Action::PressKeys {
            target,
            keys: keys.to_string(),
        });
        apply_keys(&mut world.nodes[self.id], keys);
        Ok(())
    }

    fn focus(&self) -> Result<bool, AutomationError> {
        let mut world = lock(&self.world);
        let target = world.label(self.id);
        world.record(Action::Focus { target });
        let previous = world.focused.replace(self.id);
        if let Some(previous) = previous {
            world.nodes[previous]
                .attributes
                .insert("HasFocus".to_string(), AttributeValue::Bool(false));
        }
        let node = &mut world.nodes[self.id];
        let focusable = node
            .attributes
            .get("Enabled")
            .map(AttributeValue::is_true)
            .unwrap_or(true);
        node.attributes
            .insert("HasFocus".to_string(), AttributeValue::Bool(focusable));
        Ok(focusable)
    }

    fn get_attribute(&self, name: &str) -> Result<AttributeValue, AutomationError> {
        let world = lock(&self.world);
        Ok(world.nodes[self.id]
            .attributes
            .get(name)
            .cloned()
            .unwrap_or(AttributeValue::Null))
    }

    fn set_attribute(&self, name: &str, value: AttributeValue) -> Result<(), AutomationError> {
        let mut world = lock(&self.world);
        let target = world.label(self.id);
        world.record(Action::SetAttribute {
            target,
            name: name.to_string(),
            value: value.clone(),
        });
        world.nodes[self.id]
            .attributes
            .insert(name.to_string(), value);
        Ok(())
    }

    fn capture_image(&self) -> Result<Vec<u8>, AutomationError> {
        let mut world = lock(&self.world);
        let target = world.label(self.id);
        world.record(Action::CaptureImage { target });
        let node = &world.nodes[self.id];
        let width = dimension(node, "Width", DEFAULT_ELEMENT_SIZE.0);
        let height = dimension(node, "Height", DEFAULT_ELEMENT_SIZE.1);
        encode_png(width, height, [0x33, 0x66, 0x99, 0xff])
    }

    fn children(&self, child_locator: &str) -> Result<Vec<Element>, AutomationError> {
        let world = lock(&self.world);
        let ids = world.nodes[self.id]
            .children
            .get(child_locator)
            .cloned()
            .unwrap_or_default();
        Ok(ids.into_iter().map(|id| self.element(id)).collect())
    }

    fn move_to(&self, location: Location) -> Result<(), AutomationError> {
        let mut world = lock(&self.world);
        let target = world.label(self.id);
        world.record(Action::MoveTo { target, location });
        Ok(())
    }

    fn ensure_visible(&self) -> Result<(), AutomationError> {
        let mut world = lock(&self.world);
        let target = world.label(self.id);
        world.record(Action::EnsureVisible { target });
        world.nodes[self.id]
            .attributes
            .insert("Visible".to_string(), AttributeValue::Bool(true));
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn ElementImpl> {
        Box::new(self.clone())
    }
}

/// Backend over an in-memory [`Scene`]. Cloning shares the same scene.
#[derive(Debug, Clone, Default)]
pub struct SimulatedBackend {
    world: Arc<Mutex<World>>,
}

impl SimulatedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_scene(scene: Scene) -> Self {
        let backend = Self::new();
        for (locator, node) in scene.elements {
            backend.insert(&locator, node);
        }
        backend
    }

    /// Loads a scene from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AutomationError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let scene: Scene = serde_json::from_str(&content).map_err(|e| {
            AutomationError::InvalidArgument(format!(
                "Invalid scene file {}: {e}",
                path.display()
            ))
        })?;
        info!(
            "Loaded scene {} with {} elements",
            path.display(),
            scene.elements.len()
        );
        Ok(Self::from_scene(scene))
    }

    /// Adds or replaces the element addressed by `locator`.
    pub fn insert(&self, locator: &str, node: SceneNode) {
        let mut world = lock(&self.world);
        let id = world.add(locator.to_string(), node);
        world.roots.insert(locator.to_string(), id);
    }

    /// Removes the element addressed by `locator`. Returns whether it existed.
    pub fn remove(&self, locator: &str) -> bool {
        lock(&self.world).roots.remove(locator).is_some()
    }

    pub fn contains(&self, locator: &str) -> bool {
        lock(&self.world).roots.contains_key(locator)
    }

    /// Current attribute value of a top-level element, without recording an action.
    pub fn attribute(&self, locator: &str, name: &str) -> Option<AttributeValue> {
        let world = lock(&self.world);
        let id = *world.roots.get(locator)?;
        world.nodes[id].attributes.get(name).cloned()
    }

    /// Changes an attribute of a top-level element, without recording an action.
    pub fn update_attribute(&self, locator: &str, name: &str, value: impl Into<AttributeValue>) {
        let mut world = lock(&self.world);
        if let Some(&id) = world.roots.get(locator) {
            world.nodes[id]
                .attributes
                .insert(name.to_string(), value.into());
        }
    }

    pub fn actions(&self) -> Vec<Action> {
        lock(&self.world).actions.clone()
    }

    pub fn clear_actions(&self) {
        lock(&self.world).actions.clear();
    }
}

impl AutomationBackend for SimulatedBackend {
    fn locate(&self, tag: ElementTag, locator: &str) -> Result<Element, AutomationError> {
        let mut world = lock(&self.world);
        world.record(Action::Locate {
            tag,
            locator: locator.to_string(),
        });
        let id = *world
            .roots
            .get(locator)
            .ok_or_else(|| AutomationError::ElementNotFound(format!("No element matches {locator}")))?;
        let actual = world.nodes[id].tag;
        if actual != tag {
            return Err(AutomationError::ElementNotFound(format!(
                "{locator} is a {actual}, not a {tag}"
            )));
        }
        Ok(Element::new(Box::new(SimulatedElement {
            id,
            world: self.world.clone(),
        })))
    }

    fn capture_desktop(&self) -> Result<Vec<u8>, AutomationError> {
        lock(&self.world).record(Action::CaptureDesktop);
        encode_png(DESKTOP_SIZE.0, DESKTOP_SIZE.1, [0x20, 0x20, 0x20, 0xff])
    }

    fn mouse_button(&self, button: MouseButton, down: bool) -> Result<(), AutomationError> {
        lock(&self.world).record(Action::MouseButton { button, down });
        Ok(())
    }

    fn scroll_wheel(&self, amount: i32) -> Result<(), AutomationError> {
        lock(&self.world).record(Action::ScrollWheel { amount });
        Ok(())
    }

    fn open_url(&self, url: &str, browser: &str, maximize: bool) -> Result<(), AutomationError> {
        lock(&self.world).record(Action::OpenUrl {
            url: url.to_string(),
            browser: browser.to_string(),
            maximize,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_from_json() {
        let json = r#"{
            "elements": {
                "/form/checkbox[@name='remember']": {
                    "tag": "CheckBox",
                    "attributes": { "Checked": false }
                },
                "/form/table": {
                    "tag": "Table",
                    "children": {
                        "row": [
                            { "tag": "Row", "children": { "cell": [
                                { "tag": "Cell", "attributes": { "Text": "a" } }
                            ] } }
                        ]
                    }
                }
            }
        }"#;
        let scene: Scene = serde_json::from_str(json).unwrap();
        let backend = SimulatedBackend::from_scene(scene);
        assert!(backend.contains("/form/table"));
        assert_eq!(
            backend.attribute("/form/checkbox[@name='remember']", "Checked"),
            Some(AttributeValue::Bool(false))
        );
        // Unspecified accessibility attributes default to true.
        assert_eq!(
            backend.attribute("/form/table", "Enabled"),
            Some(AttributeValue::Bool(true))
        );
    }

    #[test]
    fn test_locate_checks_kind() {
        let backend = SimulatedBackend::new();
        backend.insert("/form/ok", SceneNode::new(ElementTag::Button));
        assert!(backend.locate(ElementTag::Button, "/form/ok").is_ok());
        assert!(matches!(
            backend.locate(ElementTag::Text, "/form/ok"),
            Err(AutomationError::ElementNotFound(_))
        ));
        assert!(matches!(
            backend.locate(ElementTag::Button, "/form/cancel"),
            Err(AutomationError::ElementNotFound(_))
        ));
    }

    #[test]
    fn test_keys_edit_text_and_index() {
        let backend = SimulatedBackend::new();
        backend.insert(
            "/form/text",
            SceneNode::new(ElementTag::Text).with_attribute("Text", "old"),
        );
        backend.insert(
            "/form/combo",
            SceneNode::new(ElementTag::ComboBox).with_attribute("SelectedItemIndex", 1i64),
        );

        let text = backend.locate(ElementTag::Text, "/form/text").unwrap();
        text.press_keys("{End}{Shift down}{Home}{Shift up}{Delete}").unwrap();
        assert_eq!(
            backend.attribute("/form/text", "Text"),
            Some(AttributeValue::Text(String::new()))
        );
        text.press_keys("new").unwrap();
        assert_eq!(
            backend.attribute("/form/text", "Text"),
            Some(AttributeValue::Text("new".into()))
        );

        let combo = backend.locate(ElementTag::ComboBox, "/form/combo").unwrap();
        combo.press_keys("{down}").unwrap();
        combo.press_keys("{down}").unwrap();
        combo.press_keys("{up}").unwrap();
        assert_eq!(
            backend.attribute("/form/combo", "SelectedItemIndex"),
            Some(AttributeValue::Int(2))
        );
    }

    #[test]
    fn test_capture_is_png() {
        let backend = SimulatedBackend::new();
        let bytes = backend.capture_desktop().unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
