//! Value types shared by the backend interface and the keyword surface

use crate::errors::AutomationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Where on an element a pointer action lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Location {
    Center,
    CenterLeft,
    CenterRight,
    LowerCenter,
    LowerLeft,
    LowerRight,
    UpperCenter,
    UpperLeft,
    UpperRight,
    /// Offset in pixels from the element's upper left corner.
    Point { x: i32, y: i32 },
}

impl Location {
    pub const ANCHORS: [Location; 9] = [
        Location::Center,
        Location::CenterLeft,
        Location::CenterRight,
        Location::LowerCenter,
        Location::LowerLeft,
        Location::LowerRight,
        Location::UpperCenter,
        Location::UpperLeft,
        Location::UpperRight,
    ];

    fn anchor_name(self) -> Option<&'static str> {
        Some(match self {
            Location::Center => "Center",
            Location::CenterLeft => "CenterLeft",
            Location::CenterRight => "CenterRight",
            Location::LowerCenter => "LowerCenter",
            Location::LowerLeft => "LowerLeft",
            Location::LowerRight => "LowerRight",
            Location::UpperCenter => "UpperCenter",
            Location::UpperLeft => "UpperLeft",
            Location::UpperRight => "UpperRight",
            Location::Point { .. } => return None,
        })
    }

    /// Parses one of the nine anchor names (exact spelling) or an `x,y` pair.
    pub fn parse(text: &str) -> Result<Location, AutomationError> {
        if let Some(anchor) = Location::ANCHORS
            .iter()
            .copied()
            .find(|a| a.anchor_name() == Some(text))
        {
            return Ok(anchor);
        }

        let invalid = |reason: &str| AutomationError::InvalidLocation {
            location: text.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = text.split(',').map(str::trim).collect();
        if parts.len() != 2 {
            return Err(invalid("expected an anchor name or an `x,y` pair"));
        }
        let x = parts[0]
            .parse::<i32>()
            .map_err(|_| invalid("x is not an integer"))?;
        let y = parts[1]
            .parse::<i32>()
            .map_err(|_| invalid("y is not an integer"))?;
        Ok(Location::Point { x, y })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Point { x, y } => write!(f, "{x},{y}"),
            other => f.write_str(other.anchor_name().unwrap_or_default()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
}

/// Value of an element attribute as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl AttributeValue {
    pub fn is_true(&self) -> bool {
        matches!(self, AttributeValue::Bool(true))
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(i) => Some(*i),
            AttributeValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Textual rendering used when comparing against an expected value sent by a
/// test suite: booleans read `True`/`False`, a missing value reads `None` and
/// whole floats keep their `.0`.
impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => f.write_str("None"),
            AttributeValue::Bool(true) => f.write_str("True"),
            AttributeValue::Bool(false) => f.write_str("False"),
            AttributeValue::Int(i) => write!(f, "{i}"),
            AttributeValue::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            AttributeValue::Float(v) => write!(f, "{v}"),
            AttributeValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Int(i)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

/// Success value of a keyword. Failures travel as [`AutomationError`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OperationResult {
    Bool(bool),
    Count(usize),
    Text(String),
    Attribute(AttributeValue),
    Table(Vec<Vec<String>>),
    Values(Vec<AttributeValue>),
    Map(BTreeMap<String, String>),
}

impl From<bool> for OperationResult {
    fn from(b: bool) -> Self {
        OperationResult::Bool(b)
    }
}

impl From<String> for OperationResult {
    fn from(s: String) -> Self {
        OperationResult::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_names() {
        assert_eq!(Location::parse("Center").unwrap(), Location::Center);
        assert_eq!(Location::parse("UpperRight").unwrap(), Location::UpperRight);
        for anchor in Location::ANCHORS {
            assert_eq!(Location::parse(&anchor.to_string()).unwrap(), anchor);
        }
    }

    #[test]
    fn test_point_location() {
        assert_eq!(
            Location::parse("10,20").unwrap(),
            Location::Point { x: 10, y: 20 }
        );
        assert_eq!(
            Location::parse(" -5 , 7 ").unwrap(),
            Location::Point { x: -5, y: 7 }
        );
    }

    #[test]
    fn test_invalid_location() {
        for text in ["center", "Middle", "10", "1,2,3", "a,b", ""] {
            assert!(
                matches!(
                    Location::parse(text),
                    Err(AutomationError::InvalidLocation { .. })
                ),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_attribute_rendering() {
        assert_eq!(AttributeValue::Bool(true).to_string(), "True");
        assert_eq!(AttributeValue::Bool(false).to_string(), "False");
        assert_eq!(AttributeValue::Int(3).to_string(), "3");
        assert_eq!(AttributeValue::Null.to_string(), "None");
        assert_eq!(AttributeValue::Float(1.0).to_string(), "1.0");
        assert_eq!(AttributeValue::Float(50.0).to_string(), "50.0");
        assert_eq!(AttributeValue::Float(-3.0).to_string(), "-3.0");
        assert_eq!(AttributeValue::Float(2.5).to_string(), "2.5");
        assert_eq!(AttributeValue::Text("3".into()).as_i64(), Some(3));
    }

    #[test]
    fn test_attribute_from_json() {
        let values: Vec<AttributeValue> =
            serde_json::from_str(r#"[true, 4, "OK", null, 1.5]"#).unwrap();
        assert_eq!(
            values,
            vec![
                AttributeValue::Bool(true),
                AttributeValue::Int(4),
                AttributeValue::Text("OK".into()),
                AttributeValue::Null,
                AttributeValue::Float(1.5),
            ]
        );
    }
}
