//! Which element kinds each element operation accepts.

use crate::element::TypedElement;
use crate::errors::AutomationError;
use crate::registry::ElementTag;
use std::fmt;

const TOGGLES: &[ElementTag] = &[ElementTag::CheckBox, ElementTag::RadioButton];
const TEXT_FIELDS: &[ElementTag] = &[ElementTag::Text];
const LISTS: &[ElementTag] = &[ElementTag::List];
const TABLES: &[ElementTag] = &[ElementTag::Table];

/// An operation performed on a resolved element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Click,
    DoubleClick,
    RightClick,
    Check,
    Uncheck,
    ClearText,
    InputText,
    SelectByIndex,
    SetListSelectedIndex,
    GetTable,
    CountListItems,
    GetElementAttribute,
    GetListItemsAttribute,
    MakeVisible,
    SetFocus,
    Drag,
    Scroll,
    SendKeys,
    TakeScreenshot,
}

impl Operation {
    /// Tags the operation is restricted to; `None` accepts every tag.
    pub fn required_tags(self) -> Option<&'static [ElementTag]> {
        match self {
            Operation::Check | Operation::Uncheck => Some(TOGGLES),
            Operation::ClearText | Operation::InputText => Some(TEXT_FIELDS),
            Operation::SetListSelectedIndex
            | Operation::CountListItems
            | Operation::GetListItemsAttribute => Some(LISTS),
            Operation::GetTable => Some(TABLES),
            _ => None,
        }
    }

    pub fn accepts(self, tag: ElementTag) -> bool {
        self.required_tags()
            .map_or(true, |tags| tags.contains(&tag))
    }

    /// Fails with [`AutomationError::UnsupportedOperation`] unless `element` has an accepted tag.
    pub fn check(self, element: &TypedElement) -> Result<(), AutomationError> {
        if self.accepts(element.tag) {
            Ok(())
        } else {
            Err(AutomationError::UnsupportedOperation {
                operation: self.to_string(),
                tag: element.tag.to_string(),
                locator: element.locator.clone(),
            })
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Operation::Click => "click_element",
            Operation::DoubleClick => "double_click_element",
            Operation::RightClick => "right_click_element",
            Operation::Check => "check",
            Operation::Uncheck => "uncheck",
            Operation::ClearText => "clear_text",
            Operation::InputText => "input_text",
            Operation::SelectByIndex => "select_by_index",
            Operation::SetListSelectedIndex => "set_list_selected_index",
            Operation::GetTable => "get_table",
            Operation::CountListItems => "count_list_items",
            Operation::GetElementAttribute => "get_element_attribute",
            Operation::GetListItemsAttribute => "get_list_items_attribute",
            Operation::MakeVisible => "make_visible",
            Operation::SetFocus => "set_focus",
            Operation::Drag => "drag",
            Operation::Scroll => "scroll",
            Operation::SendKeys => "send_keys",
            Operation::TakeScreenshot => "take_screenshot",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_operations() {
        assert!(Operation::Check.accepts(ElementTag::CheckBox));
        assert!(Operation::Uncheck.accepts(ElementTag::RadioButton));
        assert!(!Operation::Check.accepts(ElementTag::Button));
        assert!(!Operation::Check.accepts(ElementTag::ToggleButton));
    }

    #[test]
    fn test_text_and_list_operations() {
        assert!(Operation::ClearText.accepts(ElementTag::Text));
        assert!(!Operation::InputText.accepts(ElementTag::ComboBox));
        assert!(Operation::CountListItems.accepts(ElementTag::List));
        assert!(!Operation::GetListItemsAttribute.accepts(ElementTag::Tree));
        assert!(!Operation::GetTable.accepts(ElementTag::List));
    }

    #[test]
    fn test_unrestricted_operations() {
        for tag in ElementTag::ALL {
            assert!(Operation::Click.accepts(*tag));
            assert!(Operation::SelectByIndex.accepts(*tag));
            assert!(Operation::GetElementAttribute.accepts(*tag));
        }
    }
}
