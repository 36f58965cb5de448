//! The closed set of element kinds the automation backend can materialize.

use crate::errors::AutomationError;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! element_tags {
    ($($variant:ident),+ $(,)?) => {
        /// Interactive kind of a UI element. Matching against tag text is
        /// case-insensitive; the canonical spelling is the variant name.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum ElementTag {
            $($variant),+
        }

        impl ElementTag {
            /// Every supported tag, in registry order.
            pub const ALL: &'static [ElementTag] = &[$(ElementTag::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(ElementTag::$variant => stringify!($variant)),+
                }
            }
        }
    };
}

element_tags! {
    AbbrTag, AcronymTag, AddressTag, AreaTag,
    ArticleTag, AsideTag, ATag, AudioTag,
    BaseFontTag, BaseTag, BdoTag, BigTag,
    BodyTag, BrTag, BTag, Button,
    ButtonTag, CanvasTag, Cell, CenterTag,
    CheckBox, CiteTag, CodeTag, ColGroupTag,
    ColTag, Column, ComboBox, CommandTag,
    Container, ContextMenu, DataListTag, DateTime,
    DdTag, DelTag, DetailsTag, DfnTag,
    DirTag, DivTag, DlTag, EmbedTag, EmTag,
    FieldSetTag, FigureTag, FontTag, Form, FormTag,
    Link, List, ListItem, MenuBar,
    MenuItem, Picture, ProgressBar,
    RadioButton, Row, ScrollBar, Slider,
    StatusBar, Table, TabPage, Text, TitleBar,
    ToggleButton, Tree, TreeItem, Unknown,
}

impl ElementTag {
    /// Case-insensitive exact lookup. No fuzzy matching.
    pub fn lookup(tag: &str) -> Option<ElementTag> {
        ElementTag::ALL
            .iter()
            .copied()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(tag))
    }
}

impl fmt::Display for ElementTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validates raw tag text extracted from `locator`.
///
/// Blank text fails with [`AutomationError::EmptyLocator`]; text naming no known
/// tag fails with [`AutomationError::UnsupportedElement`].
pub fn validate(tag: &str, locator: &str) -> Result<ElementTag, AutomationError> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        return Err(AutomationError::EmptyLocator(locator.to_string()));
    }
    ElementTag::lookup(trimmed).ok_or_else(|| AutomationError::UnsupportedElement {
        tag: tag.to_string(),
        locator: locator.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive() {
        for text in ["button", "Button", "BUTTON"] {
            assert_eq!(validate(text, "/x").unwrap(), ElementTag::Button);
        }
        assert_eq!(validate("checkbox", "/x").unwrap(), ElementTag::CheckBox);
    }

    #[test]
    fn test_empty_tag() {
        assert!(matches!(
            validate("", "/form/"),
            Err(AutomationError::EmptyLocator(_))
        ));
        assert!(matches!(
            validate("   ", "/form/   "),
            Err(AutomationError::EmptyLocator(_))
        ));
    }

    #[test]
    fn test_unknown_tag() {
        let err = validate("spinner", "/form/spinner").unwrap_err();
        match err {
            AutomationError::UnsupportedElement { tag, locator } => {
                assert_eq!(tag, "spinner");
                assert_eq!(locator, "/form/spinner");
            }
            e => panic!("Expected UnsupportedElement, got {e:?}"),
        }
    }

    #[test]
    fn test_no_partial_match() {
        assert!(ElementTag::lookup("butt").is_none());
        assert!(ElementTag::lookup("buttons").is_none());
    }

    #[test]
    fn test_catch_all_is_registered() {
        assert_eq!(ElementTag::lookup("unknown"), Some(ElementTag::Unknown));
        assert_eq!(ElementTag::ALL.len(), 66);
    }
}
