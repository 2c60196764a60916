use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::state::{ConcreteId, FieldParseError, Widget};

/// Timestamp layout of the start/end columns.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Action type tag of a recorded interaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionType {
    Click,
    ClickEvent,
    LongClick,
    LongClickEvent,
    Tick,
    TextInsert,
    Swipe,
    RotateUI,
    Other(String),
}

impl ActionType {
    pub fn name(&self) -> &str {
        match self {
            ActionType::Click => "Click",
            ActionType::ClickEvent => "ClickEvent",
            ActionType::LongClick => "LongClick",
            ActionType::LongClickEvent => "LongClickEvent",
            ActionType::Tick => "Tick",
            ActionType::TextInsert => "TextInsert",
            ActionType::Swipe => "Swipe",
            ActionType::RotateUI => "RotateUI",
            ActionType::Other(name) => name,
        }
    }

    pub fn is_click(&self) -> bool {
        matches!(self, ActionType::Click | ActionType::ClickEvent)
    }

    pub fn is_long_click(&self) -> bool {
        matches!(self, ActionType::LongClick | ActionType::LongClickEvent)
    }

    pub fn is_tick(&self) -> bool {
        matches!(self, ActionType::Tick)
    }

    pub fn is_text_insert(&self) -> bool {
        matches!(self, ActionType::TextInsert)
    }
}

impl From<&str> for ActionType {
    fn from(name: &str) -> Self {
        match name.trim() {
            "Click" => ActionType::Click,
            "ClickEvent" => ActionType::ClickEvent,
            "LongClick" => ActionType::LongClick,
            "LongClickEvent" => ActionType::LongClickEvent,
            "Tick" => ActionType::Tick,
            "TextInsert" => ActionType::TextInsert,
            "Swipe" => ActionType::Swipe,
            "RotateUI" => ActionType::RotateUI,
            other => ActionType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Action-specific data of an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionPayload {
    None,
    Text(String),
    Swipe { start: (i32, i32), end: (i32, i32) },
    Rotation(i32),
}

impl ActionPayload {
    /// Interpret the raw data column for the given action type.
    ///
    /// Action types without a payload ignore whatever was persisted.
    pub fn parse(action_type: &ActionType, data: &str) -> Result<Self, FieldParseError> {
        match action_type {
            ActionType::TextInsert => Ok(ActionPayload::Text(data.to_string())),
            ActionType::Swipe => {
                let invalid = || FieldParseError::new("swipe payload", data);
                let (start, end) = data.split_once("TO").ok_or_else(invalid)?;
                Ok(ActionPayload::Swipe {
                    start: parse_point(start).ok_or_else(invalid)?,
                    end: parse_point(end).ok_or_else(invalid)?,
                })
            }
            ActionType::RotateUI => data
                .trim()
                .parse()
                .map(ActionPayload::Rotation)
                .map_err(|_| FieldParseError::new("rotation payload", data)),
            _ => Ok(ActionPayload::None),
        }
    }
}

impl fmt::Display for ActionPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionPayload::None => Ok(()),
            ActionPayload::Text(text) => f.write_str(text),
            ActionPayload::Swipe { start, end } => {
                write!(f, "{},{} TO {},{}", start.0, start.1, end.0, end.1)
            }
            ActionPayload::Rotation(degrees) => write!(f, "{}", degrees),
        }
    }
}

fn parse_point(raw: &str) -> Option<(i32, i32)> {
    let (x, y) = raw.trim().split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

/// A transition edge between two states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub action_type: ActionType,
    pub target_widget: Option<Arc<Widget>>,
    pub start_timestamp: NaiveDateTime,
    pub end_timestamp: NaiveDateTime,
    pub successful: bool,
    pub exception: String,
    pub prev_state: ConcreteId,
    pub res_state: ConcreteId,

    /// Used to match the interaction with its result screenshot
    pub action_id: i32,
    pub payload: ActionPayload,
}

impl Interaction {
    /// Milliseconds between start and end of the action.
    pub fn decision_time(&self) -> i64 {
        (self.end_timestamp - self.start_timestamp).num_milliseconds()
    }

    /// Persisted row form, in trace column order.
    pub fn to_record(&self, sep: &str) -> String {
        let target = self
            .target_widget
            .as_ref()
            .map(|w| w.id.to_string())
            .unwrap_or_else(|| "null".to_string());

        [
            self.action_type.name().to_string(),
            target,
            self.start_timestamp.format(TIMESTAMP_FORMAT).to_string(),
            self.end_timestamp.format(TIMESTAMP_FORMAT).to_string(),
            self.successful.to_string(),
            self.exception.clone(),
            self.prev_state.to_string(),
            self.res_state.to_string(),
            self.action_id.to_string(),
            self.payload.to_string(),
        ]
        .join(sep)
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widget = self
            .target_widget
            .as_ref()
            .map(|w| w.id.to_string())
            .unwrap_or_default();
        write!(
            f,
            "{}: widget[{}]: {}->{}",
            self.action_type, widget, self.prev_state, self.res_state
        )
    }
}
