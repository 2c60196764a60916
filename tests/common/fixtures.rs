use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use exploration_model::loading::ModelConfig;
use exploration_model::loading::schema::{self, ACTION_COLUMNS, WIDGET_COLUMNS};
use exploration_model::state::{Capabilities, ConcreteId, Rect, State, Widget};
use tempfile::TempDir;

pub const SEP: &str = ";";

// ============================================================================
// Widgets
// ============================================================================

pub fn widget(class_name: &str, text: &str, y: i32, capabilities: Capabilities) -> Widget {
    let bounds = Rect::new(0, y, 200, 50);
    Widget {
        class_name: class_name.into(),
        text: text.into(),
        bounds,
        visible_bounds: bounds,
        capabilities,
        ..Widget::default()
    }
    .with_computed_id()
}

pub fn button(text: &str, y: i32) -> Widget {
    widget(
        "android.widget.Button",
        text,
        y,
        Capabilities {
            clickable: true,
            enabled: true,
            ..Capabilities::default()
        },
    )
}

pub fn input(text: &str, y: i32) -> Widget {
    widget(
        "android.widget.EditText",
        text,
        y,
        Capabilities {
            clickable: true,
            is_input_field: true,
            enabled: true,
            ..Capabilities::default()
        },
    )
}

pub fn checkbox(text: &str, y: i32) -> Widget {
    widget(
        "android.widget.CheckBox",
        text,
        y,
        Capabilities {
            checked: Some(false),
            enabled: true,
            ..Capabilities::default()
        },
    )
}

pub fn label(text: &str, y: i32) -> Widget {
    widget(
        "android.widget.TextView",
        text,
        y,
        Capabilities {
            enabled: true,
            ..Capabilities::default()
        },
    )
}

/// Same element, moved: same uid, different config id.
pub fn moved(widget: &Widget, dy: i32) -> Widget {
    let mut moved = widget.clone();
    moved.bounds.y += dy;
    moved.visible_bounds.y += dy;
    moved.with_computed_id()
}

pub fn state_of(widgets: &[Widget]) -> State {
    State::new(widgets.iter().cloned().map(Arc::new).collect())
}

// ============================================================================
// Model directory on disk
// ============================================================================

/// Temporary model directory holding trace files and a `states/` folder.
pub struct ModelDir {
    dir: TempDir,
    pub config: ModelConfig,
}

impl ModelDir {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = ModelConfig::new(dir.path());
        fs::create_dir_all(config.states_path()).unwrap();
        Self { dir, config }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Persist a state under its computed identifier.
    pub fn write_state(&self, widgets: &[Widget]) -> ConcreteId {
        let id = state_of(widgets).id;
        self.write_state_as(id, widgets);
        id
    }

    /// Persist a state under an arbitrary identifier; widget rows keep their `id`.
    pub fn write_state_as(&self, id: ConcreteId, widgets: &[Widget]) {
        let header = schema::header(&WIDGET_COLUMNS, SEP);
        self.write_state_with_header(id, &header, widgets);
    }

    pub fn write_state_with_header(&self, id: ConcreteId, header: &str, widgets: &[Widget]) {
        let mut lines = vec![header.to_string()];
        lines.extend(widgets.iter().map(|w| schema::widget_row(w, SEP)));
        fs::write(self.config.state_file(&id), lines.join("\n")).unwrap();
    }

    /// Write `trace<name>.csv` with a header row.
    pub fn write_trace(&self, name: &str, rows: &[String]) -> PathBuf {
        let path = self.path().join(format!("trace{}.csv", name));
        let mut lines = vec![schema::header(&ACTION_COLUMNS, SEP)];
        lines.extend(rows.iter().cloned());
        fs::write(&path, lines.join("\n")).unwrap();
        path
    }
}

// ============================================================================
// Action rows
// ============================================================================

pub fn action(
    action_type: &str,
    target: Option<ConcreteId>,
    source: ConcreteId,
    result: ConcreteId,
    action_id: i32,
    data: &str,
) -> String {
    [
        action_type.to_string(),
        target.map(|id| id.to_string()).unwrap_or_else(|| "null".into()),
        format!("2024-05-01T12:00:{:02}.000", action_id % 60),
        format!("2024-05-01T12:00:{:02}.250", action_id % 60),
        "true".into(),
        String::new(),
        source.to_string(),
        result.to_string(),
        action_id.to_string(),
        data.to_string(),
    ]
    .join(SEP)
}

pub fn click(target: &Widget, source: ConcreteId, result: ConcreteId, action_id: i32) -> String {
    action("Click", Some(target.id), source, result, action_id, "")
}

/// Untargeted action moving from `source` to `result`.
pub fn press_back(source: ConcreteId, result: ConcreteId, action_id: i32) -> String {
    action("PressBack", None, source, result, action_id, "")
}
