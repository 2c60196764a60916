use std::sync::Arc;

use uuid::Uuid;

use super::identity::{ConcreteId, fingerprint};
use super::widget::Widget;

/// A reconstructed application state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub id: ConcreteId,

    /// Widgets in persisted order; identifiers are unique within the state
    pub widgets: Vec<Arc<Widget>>,

    /// Marks the placeholder state every trace starts from
    pub is_root: bool,
}

impl State {
    pub fn empty() -> Self {
        State {
            id: ConcreteId::EMPTY,
            widgets: vec![],
            is_root: true,
        }
    }

    /// Build a state whose identifier is derived from its widgets.
    pub fn new(widgets: Vec<Arc<Widget>>) -> Self {
        State {
            id: Self::compute_id(&widgets),
            widgets,
            is_root: false,
        }
    }

    /// Order-independent identifier over the widget identifiers.
    pub fn compute_id(widgets: &[Arc<Widget>]) -> ConcreteId {
        let mut uids: Vec<String> = widgets.iter().map(|w| w.id.uid.to_string()).collect();
        let mut ids: Vec<String> = widgets.iter().map(|w| w.id.to_string()).collect();
        uids.sort();
        ids.sort();

        ConcreteId::new(
            fingerprint(uids.iter().map(String::as_str)),
            fingerprint(ids.iter().map(String::as_str)),
        )
    }

    pub fn widget(&self, id: &ConcreteId) -> Option<&Arc<Widget>> {
        self.widgets.iter().find(|w| &w.id == id)
    }

    pub fn widgets_with_uid(&self, uid: Uuid) -> impl Iterator<Item = &Arc<Widget>> {
        self.widgets.iter().filter(move |w| w.uid() == uid)
    }
}
