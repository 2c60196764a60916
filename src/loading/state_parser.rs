use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, warn};

use crate::graph::ModelGraph;
use crate::loading::cache::IdentityCache;
use crate::loading::config::ModelConfig;
use crate::loading::error::LoadError;
use crate::loading::reader::{ContentReader, Row, split_rows};
use crate::loading::repair::IdRemap;
use crate::loading::schema::{self, Layout, WIDGET_COLUMNS};
use crate::state::{Capabilities, ConcreteId, State, Widget};

/// Options shared by every reconstruction of one load.
#[derive(Debug, Clone, Default)]
pub struct ParseMode {
    pub compatibility_mode: bool,
    pub enable_checks: bool,
    /// Resolve the widgets of one state concurrently
    pub concurrent_widgets: bool,
    pub header_renaming: HashMap<String, String>,
}

/// Reconstructs states (and their widgets) from state files, at most once per
/// persisted identifier.
pub struct StateParser {
    config: Arc<ModelConfig>,
    reader: Arc<dyn ContentReader>,
    model: Arc<ModelGraph>,
    mode: ParseMode,
    states: IdentityCache<State>,
    widgets: IdentityCache<Widget>,
    state_remap: Arc<IdRemap>,
    widget_remap: Arc<IdRemap>,
}

impl StateParser {
    pub fn new(
        config: Arc<ModelConfig>,
        reader: Arc<dyn ContentReader>,
        model: Arc<ModelGraph>,
        mode: ParseMode,
        widget_remap: Arc<IdRemap>,
    ) -> Self {
        let states = IdentityCache::new("states");
        // every trace starts from the empty state, which has no file
        states.seed(ConcreteId::EMPTY, model.empty_state());

        Self {
            config,
            reader,
            model,
            mode,
            states,
            widgets: IdentityCache::new("widgets"),
            state_remap: Arc::new(IdRemap::default()),
            widget_remap,
        }
    }

    /// The state persisted under `id`, reconstructing it on first reference.
    pub async fn resolve(&self, id: ConcreteId) -> Result<Arc<State>, LoadError> {
        self.states.resolve(id, || self.parse_state(id)).await
    }

    pub fn state_remap(&self) -> &Arc<IdRemap> {
        &self.state_remap
    }

    pub fn cached_states(&self) -> usize {
        self.states.len()
    }

    pub fn cached_widgets(&self) -> usize {
        self.widgets.len()
    }

    /// Drop every cached entity; the model keeps its own references.
    pub fn clear(&self) {
        self.states.clear();
        self.widgets.clear();
    }

    async fn parse_state(&self, id: ConcreteId) -> Result<Arc<State>, LoadError> {
        let path = self.config.state_file(&id);
        let lines = {
            let reader = Arc::clone(&self.reader);
            let path = path.clone();
            tokio::task::spawn_blocking(move || reader.read_lines(&path)).await?
        };
        let lines = match lines {
            Ok(lines) => lines,
            Err(LoadError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoadError::IdentityMismatch(format!(
                    "state {} has no persisted state file {}",
                    id,
                    path.display()
                )));
            }
            Err(e) => return Err(e),
        };

        let renaming = &self.mode.header_renaming;
        let (header, rows) =
            split_rows(&path, &lines, &self.config.separator, &WIDGET_COLUMNS, renaming);
        let layout = match header {
            Some(header) => Layout::from_header(&WIDGET_COLUMNS, &header, renaming)
                .map_err(|reason| LoadError::malformed(format!("{}:header", path.display()), reason))?,
            None => Layout::positional(&WIDGET_COLUMNS),
        };

        let widgets = if self.mode.concurrent_widgets {
            try_join_all(rows.iter().map(|row| self.resolve_widget(row, &layout))).await?
        } else {
            let mut widgets = Vec::with_capacity(rows.len());
            for row in &rows {
                widgets.push(self.resolve_widget(row, &layout).await?);
            }
            widgets
        };

        let widgets = self.dedup_widgets(id, widgets)?;
        let mut state = State::new(widgets);
        if !self.mode.enable_checks {
            // trust the persisted identifier
            state.id = id;
        }
        self.reconcile("state", id, state.id, &self.state_remap)?;

        let state = Arc::new(state);
        self.model.add_state(Arc::clone(&state));
        debug!(persisted = %id, id = %state.id, widgets = state.widgets.len(), "state reconstructed");
        Ok(state)
    }

    async fn resolve_widget(&self, row: &Row, layout: &Layout) -> Result<Arc<Widget>, LoadError> {
        let persisted = layout.id(row, &schema::WIDGET_ID)?;
        self.widgets
            .resolve(persisted, || async {
                let mut widget = parse_widget(row, layout)?;
                if self.mode.enable_checks {
                    widget.id = widget.compute_id();
                    self.reconcile("widget", persisted, widget.id, &self.widget_remap)?;
                }
                Ok::<_, LoadError>(Arc::new(widget))
            })
            .await
    }

    /// Enforce unique widget identifiers within one state.
    fn dedup_widgets(
        &self,
        state: ConcreteId,
        widgets: Vec<Arc<Widget>>,
    ) -> Result<Vec<Arc<Widget>>, LoadError> {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(widgets.len());
        for widget in widgets {
            if seen.insert(widget.id) {
                unique.push(widget);
            } else if self.mode.compatibility_mode || !self.mode.enable_checks {
                warn!(%state, widget = %widget.id, "dropping duplicate widget");
            } else {
                return Err(LoadError::IdentityMismatch(format!(
                    "widget {} occurs twice in state {}",
                    widget.id, state
                )));
            }
        }
        Ok(unique)
    }

    /// Compare a persisted identifier with the recomputed one.
    fn reconcile(
        &self,
        kind: &str,
        persisted: ConcreteId,
        computed: ConcreteId,
        remap: &IdRemap,
    ) -> Result<(), LoadError> {
        if persisted == computed {
            return Ok(());
        }
        if !self.mode.compatibility_mode {
            return Err(LoadError::IdentityMismatch(format!(
                "{} id {} recomputes to {}",
                kind, persisted, computed
            )));
        }
        debug!(kind, %persisted, %computed, "identifier drift, recording mapping");
        remap.insert(persisted, computed);
        Ok(())
    }
}

fn parse_widget(row: &Row, layout: &Layout) -> Result<Widget, LoadError> {
    Ok(Widget {
        id: layout.id(row, &schema::WIDGET_ID)?,
        class_name: layout.text(row, &schema::CLASS_NAME)?,
        text: layout.text(row, &schema::TEXT)?,
        content_desc: layout.text(row, &schema::DESCRIPTION)?,
        bounds: layout.rect(row, &schema::BOUNDS)?,
        visible_bounds: layout.rect(row, &schema::VISIBLE_BOUNDS)?,
        capabilities: Capabilities {
            clickable: layout.boolean(row, &schema::CLICKABLE)?,
            long_clickable: layout.boolean(row, &schema::LONG_CLICKABLE)?,
            checked: layout.optional_boolean(row, &schema::CHECKED)?,
            scrollable: layout.boolean(row, &schema::SCROLLABLE)?,
            is_input_field: layout.boolean(row, &schema::INPUT_FIELD)?,
            enabled: layout.boolean(row, &schema::ENABLED)?,
            focused: layout.boolean(row, &schema::FOCUSED)?,
        },
        parent_id: layout.optional_id(row, &schema::PARENT_ID)?,
    })
}
