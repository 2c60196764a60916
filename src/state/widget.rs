use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::identity::{ConcreteId, FieldParseError, fingerprint};

/// Screen rectangle, persisted as `x:y:width:height`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}:{}", self.x, self.y, self.width, self.height)
    }
}

impl FromStr for Rect {
    type Err = FieldParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .trim()
            .split(':')
            .map(|v| v.trim().parse::<i32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| FieldParseError::new("Rect", s))?;

        match values.as_slice() {
            [x, y, width, height] => Ok(Rect::new(*x, *y, *width, *height)),
            _ => Err(FieldParseError::new("Rect", s)),
        }
    }
}

/// Interaction capabilities reported by the UI automation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Capabilities {
    pub clickable: bool,
    pub long_clickable: bool,
    /// `None` when the element is not checkable at all
    pub checked: Option<bool>,
    pub scrollable: bool,
    pub is_input_field: bool,
    pub enabled: bool,
    pub focused: bool,
}

/// A single UI element of a state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Widget {
    pub id: ConcreteId,
    pub class_name: String,
    pub text: String,
    pub content_desc: String,
    pub bounds: Rect,
    pub visible_bounds: Rect,
    pub capabilities: Capabilities,

    /// Lookup-only reference to the parent element of the same state
    pub parent_id: Option<ConcreteId>,
}

impl Widget {
    /// Recompute the identifier from the widget's attributes.
    ///
    /// The persisted `id` is ignored, so comparing the result against it
    /// reveals identifier drift.
    pub fn compute_id(&self) -> ConcreteId {
        let uid = fingerprint([
            self.class_name.as_str(),
            self.text.as_str(),
            self.content_desc.as_str(),
            bool_str(self.capabilities.is_input_field),
        ]);

        let caps = &self.capabilities;
        let bounds = self.bounds.to_string();
        let visible = self.visible_bounds.to_string();
        let checked = match caps.checked {
            Some(true) => "true",
            Some(false) => "false",
            None => "null",
        };
        let config_id = fingerprint([
            bounds.as_str(),
            visible.as_str(),
            bool_str(caps.clickable),
            bool_str(caps.long_clickable),
            checked,
            bool_str(caps.scrollable),
            bool_str(caps.enabled),
            bool_str(caps.focused),
        ]);

        ConcreteId::new(uid, config_id)
    }

    /// Replace the identifier with the recomputed one.
    pub fn with_computed_id(mut self) -> Self {
        self.id = self.compute_id();
        self
    }

    pub fn uid(&self) -> uuid::Uuid {
        self.id.uid
    }
}

fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
