//! Statically declared column layout of trace and state files.
//!
//! Trace rows are addressed positionally. State files carry a header row,
//! so their columns are located by name and legacy header names can be
//! translated through a renaming map.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::loading::error::LoadError;
use crate::loading::reader::Row;
use crate::state::{ConcreteId, Rect, Widget};
use crate::trace::interaction::TIMESTAMP_FORMAT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    ConcreteId,
    OptionalConcreteId,
    DateTime,
    Boolean,
    OptionalBoolean,
    Int,
    Rect,
}

/// One persisted column: header name, value type and default position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub index: usize,
}

const fn column(name: &'static str, column_type: ColumnType, index: usize) -> Column {
    Column {
        name,
        column_type,
        index,
    }
}

// ============================================================================
// Action records
// ============================================================================

pub const ACTION_TYPE: Column = column("Action", ColumnType::Text, 0);
pub const TARGET_WIDGET: Column = column("Interacted Widget", ColumnType::OptionalConcreteId, 1);
pub const START_TIME: Column = column("StartTime", ColumnType::DateTime, 2);
pub const END_TIME: Column = column("EndTime", ColumnType::DateTime, 3);
pub const SUCCESSFUL: Column = column("SuccessFul", ColumnType::Boolean, 4);
pub const EXCEPTION: Column = column("Exception", ColumnType::Text, 5);
pub const SOURCE_STATE: Column = column("Source State", ColumnType::ConcreteId, 6);
pub const RESULT_STATE: Column = column("Resulting State", ColumnType::ConcreteId, 7);
pub const ACTION_ID: Column = column("Action-Id", ColumnType::Int, 8);
pub const DATA: Column = column("Data", ColumnType::Text, 9);

pub const ACTION_COLUMNS: [Column; 10] = [
    ACTION_TYPE,
    TARGET_WIDGET,
    START_TIME,
    END_TIME,
    SUCCESSFUL,
    EXCEPTION,
    SOURCE_STATE,
    RESULT_STATE,
    ACTION_ID,
    DATA,
];

// ============================================================================
// Widget rows (state files)
// ============================================================================

pub const WIDGET_ID: Column = column("Id", ColumnType::ConcreteId, 0);
pub const PARENT_ID: Column = column("ParentId", ColumnType::OptionalConcreteId, 1);
pub const CLASS_NAME: Column = column("Class", ColumnType::Text, 2);
pub const TEXT: Column = column("Text", ColumnType::Text, 3);
pub const DESCRIPTION: Column = column("Description", ColumnType::Text, 4);
pub const BOUNDS: Column = column("Bounds", ColumnType::Rect, 5);
pub const VISIBLE_BOUNDS: Column = column("VisibleBounds", ColumnType::Rect, 6);
pub const CLICKABLE: Column = column("Clickable", ColumnType::Boolean, 7);
pub const LONG_CLICKABLE: Column = column("LongClickable", ColumnType::Boolean, 8);
pub const CHECKED: Column = column("Checked", ColumnType::OptionalBoolean, 9);
pub const SCROLLABLE: Column = column("Scrollable", ColumnType::Boolean, 10);
pub const INPUT_FIELD: Column = column("IsInputField", ColumnType::Boolean, 11);
pub const ENABLED: Column = column("Enabled", ColumnType::Boolean, 12);
pub const FOCUSED: Column = column("Focused", ColumnType::Boolean, 13);

pub const WIDGET_COLUMNS: [Column; 14] = [
    WIDGET_ID,
    PARENT_ID,
    CLASS_NAME,
    TEXT,
    DESCRIPTION,
    BOUNDS,
    VISIBLE_BOUNDS,
    CLICKABLE,
    LONG_CLICKABLE,
    CHECKED,
    SCROLLABLE,
    INPUT_FIELD,
    ENABLED,
    FOCUSED,
];

/// Header row for the given column table.
pub fn header(columns: &[Column], sep: &str) -> String {
    columns
        .iter()
        .map(|c| c.name)
        .collect::<Vec<_>>()
        .join(sep)
}

/// Whether a split line is the header row of `columns`.
pub fn is_header(columns: &[Column], fields: &[String], renaming: &HashMap<String, String>) -> bool {
    fields.first().is_some_and(|first| {
        let name = first.trim();
        let name = renaming.get(name).map(String::as_str).unwrap_or(name);
        name == columns[0].name
    })
}

/// Persisted row form of a widget, in `WIDGET_COLUMNS` order.
pub fn widget_row(widget: &Widget, sep: &str) -> String {
    let caps = &widget.capabilities;
    let checked = match caps.checked {
        Some(value) => value.to_string(),
        None => "null".to_string(),
    };

    [
        widget.id.to_string(),
        widget
            .parent_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "null".to_string()),
        widget.class_name.clone(),
        widget.text.clone(),
        widget.content_desc.clone(),
        widget.bounds.to_string(),
        widget.visible_bounds.to_string(),
        caps.clickable.to_string(),
        caps.long_clickable.to_string(),
        checked,
        caps.scrollable.to_string(),
        caps.is_input_field.to_string(),
        caps.enabled.to_string(),
        caps.focused.to_string(),
    ]
    .join(sep)
}

// ============================================================================
// Layout: column -> field position
// ============================================================================

/// Resolved positions of a column table within the rows of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    positions: Vec<usize>,
}

impl Layout {
    /// Every column at its declared index.
    pub fn positional(columns: &[Column]) -> Self {
        Self {
            positions: columns.iter().map(|c| c.index).collect(),
        }
    }

    /// Locate every column by name in a header row.
    ///
    /// Header names are first translated through `renaming`, which lets state
    /// files written by older schema versions load.
    pub fn from_header(
        columns: &[Column],
        header: &[String],
        renaming: &HashMap<String, String>,
    ) -> Result<Self, String> {
        let names: HashMap<&str, usize> = header
            .iter()
            .enumerate()
            .map(|(pos, name)| {
                let name = name.trim();
                (renaming.get(name).map(String::as_str).unwrap_or(name), pos)
            })
            .collect();

        let positions = columns
            .iter()
            .map(|c| {
                names
                    .get(c.name)
                    .copied()
                    .ok_or_else(|| format!("header lacks column '{}'", c.name))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { positions })
    }

    /// Minimum number of fields a row needs.
    pub fn width(&self) -> usize {
        self.positions.iter().max().map_or(0, |max| max + 1)
    }

    pub fn raw<'a>(&self, row: &'a Row, column: &Column) -> Result<&'a str, LoadError> {
        let pos = self.positions[column.index];
        row.fields.get(pos).map(String::as_str).ok_or_else(|| {
            LoadError::malformed(
                &row.location,
                format!("missing column '{}' (expected {} fields, got {})", column.name, self.width(), row.fields.len()),
            )
        })
    }

    pub fn text(&self, row: &Row, column: &Column) -> Result<String, LoadError> {
        debug_assert_eq!(column.column_type, ColumnType::Text);
        Ok(self.raw(row, column)?.to_string())
    }

    pub fn id(&self, row: &Row, column: &Column) -> Result<ConcreteId, LoadError> {
        debug_assert_eq!(column.column_type, ColumnType::ConcreteId);
        let raw = self.raw(row, column)?;
        raw.parse().map_err(|e| invalid(row, column, e))
    }

    pub fn optional_id(&self, row: &Row, column: &Column) -> Result<Option<ConcreteId>, LoadError> {
        debug_assert_eq!(column.column_type, ColumnType::OptionalConcreteId);
        let raw = self.raw(row, column)?;
        ConcreteId::parse_optional(raw).map_err(|e| invalid(row, column, e))
    }

    pub fn boolean(&self, row: &Row, column: &Column) -> Result<bool, LoadError> {
        debug_assert_eq!(column.column_type, ColumnType::Boolean);
        let raw = self.raw(row, column)?;
        parse_bool(raw).ok_or_else(|| invalid(row, column, format!("'{}' is not a boolean", raw)))
    }

    pub fn optional_boolean(&self, row: &Row, column: &Column) -> Result<Option<bool>, LoadError> {
        debug_assert_eq!(column.column_type, ColumnType::OptionalBoolean);
        let raw = self.raw(row, column)?;
        if raw.trim().is_empty() || raw.trim().eq_ignore_ascii_case("null") {
            return Ok(None);
        }
        parse_bool(raw)
            .map(Some)
            .ok_or_else(|| invalid(row, column, format!("'{}' is not a boolean", raw)))
    }

    pub fn int(&self, row: &Row, column: &Column) -> Result<i32, LoadError> {
        debug_assert_eq!(column.column_type, ColumnType::Int);
        let raw = self.raw(row, column)?;
        raw.trim()
            .parse()
            .map_err(|_| invalid(row, column, format!("'{}' is not an integer", raw)))
    }

    pub fn timestamp(&self, row: &Row, column: &Column) -> Result<NaiveDateTime, LoadError> {
        debug_assert_eq!(column.column_type, ColumnType::DateTime);
        let raw = self.raw(row, column)?;
        NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
            .map_err(|e| invalid(row, column, format!("'{}': {}", raw, e)))
    }

    pub fn rect(&self, row: &Row, column: &Column) -> Result<Rect, LoadError> {
        debug_assert_eq!(column.column_type, ColumnType::Rect);
        let raw = self.raw(row, column)?;
        raw.parse().map_err(|e| invalid(row, column, e))
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        s if s.eq_ignore_ascii_case("true") => Some(true),
        s if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

fn invalid(row: &Row, column: &Column, reason: impl std::fmt::Display) -> LoadError {
    LoadError::malformed(
        &row.location,
        format!("column '{}' ({:?}): {}", column.name, column.column_type, reason),
    )
}
