use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::loading::error::LoadError;
use crate::state::{ConcreteId, State, Widget};
use crate::trace::ActionType;

// ============================================================================
// Identifier remapping
// ============================================================================

/// Mapping from persisted identifiers to their repaired counterparts.
#[derive(Debug, Default)]
pub struct IdRemap {
    entries: Mutex<HashMap<ConcreteId, ConcreteId>>,
}

impl IdRemap {
    pub fn get(&self, id: &ConcreteId) -> Option<ConcreteId> {
        self.entries.lock().get(id).copied()
    }

    /// Record a mapping unless one exists; returns the mapping in effect.
    pub fn insert(&self, original: ConcreteId, repaired: ConcreteId) -> ConcreteId {
        *self.entries.lock().entry(original).or_insert(repaired)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Sorted copy, for callers migrating dependent artifacts.
    pub fn snapshot(&self) -> BTreeMap<ConcreteId, ConcreteId> {
        self.entries.lock().iter().map(|(k, v)| (*k, *v)).collect()
    }
}

// ============================================================================
// Repair engine
// ============================================================================

/// Reconciles drifted widget references in compatibility mode.
pub struct RepairEngine {
    widget_remap: Arc<IdRemap>,
}

impl RepairEngine {
    pub fn new(widget_remap: Arc<IdRemap>) -> Self {
        Self { widget_remap }
    }

    /// The identifier a reference currently maps to.
    pub fn fixed_widget_id(&self, recorded: ConcreteId) -> ConcreteId {
        self.widget_remap.get(&recorded).unwrap_or(recorded)
    }

    /// Find the widget of `source` that the recorded reference denotes.
    ///
    /// Candidates are tried in order: a prior mapping, the exact identifier
    /// with a capability fitting the action, the same uid with a fitting
    /// capability, and finally the same uid with any capability. The first
    /// candidate in widget order wins.
    pub fn repair(
        &self,
        recorded: ConcreteId,
        action_type: &ActionType,
        source: &State,
    ) -> Result<ConcreteId, LoadError> {
        if let Some(mapped) = self.widget_remap.get(&recorded) {
            if source.widget(&mapped).is_some() {
                debug!(%recorded, %mapped, "reusing widget mapping");
                return Ok(mapped);
            }
        }

        if let Some(exact) = source
            .widget(&recorded)
            .filter(|w| accepts_action(w, action_type))
        {
            return Ok(exact.id);
        }

        let typed: Vec<&Arc<Widget>> = source
            .widgets_with_uid(recorded.uid)
            .filter(|w| accepts_action(w, action_type))
            .collect();

        let candidates = if typed.is_empty() {
            let relaxed: Vec<&Arc<Widget>> = source.widgets_with_uid(recorded.uid).collect();
            if !relaxed.is_empty() {
                warn!(
                    widget = %recorded,
                    state = %source.id,
                    action = %action_type,
                    "no widget with matching action type, falling back to uid match"
                );
            }
            relaxed
        } else {
            typed
        };

        let chosen = match candidates.as_slice() {
            [] => {
                return Err(LoadError::RepairExhausted {
                    widget: recorded,
                    state: source.id,
                });
            }
            [only] => only.id,
            [first, ..] => {
                warn!(
                    widget = %recorded,
                    state = %source.id,
                    candidates = candidates.len(),
                    "multiple options for the interacted widget, choosing the first"
                );
                first.id
            }
        };

        if chosen != recorded {
            self.widget_remap.insert(recorded, chosen);
        }
        debug!(%recorded, %chosen, "repaired widget reference");
        Ok(chosen)
    }
}

/// Whether a widget offers the capability an action type needs.
pub fn accepts_action(widget: &Widget, action_type: &ActionType) -> bool {
    let caps = &widget.capabilities;
    caps.enabled
        && if action_type.is_tick() {
            caps.checked.is_some()
        } else if action_type.is_click() {
            // long-clickable counts because click actions may fall back to a long click
            caps.clickable || caps.checked.is_some() || caps.long_clickable
        } else if action_type.is_long_click() {
            caps.long_clickable
        } else if action_type.is_text_insert() {
            caps.is_input_field
        } else {
            false
        }
}
