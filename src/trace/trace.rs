use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::state::State;
use crate::trace::interaction::Interaction;

/// Identifier of one exploration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TraceId {
    Uuid(Uuid),
    /// Position of the trace file in the enumeration, used when the file name
    /// carries no valid UUID (test fixtures)
    Ordinal(usize),
}

impl TraceId {
    /// Parse `<prefix><uuid><extension>`, falling back to `ordinal`.
    pub fn from_file_name(file_name: &str, prefix: &str, extension: &str, ordinal: usize) -> Self {
        let stem = file_name.strip_prefix(prefix).unwrap_or(file_name);
        let stem = stem.strip_suffix(extension).unwrap_or(stem);

        match Uuid::parse_str(stem) {
            Ok(uuid) => TraceId::Uuid(uuid),
            Err(_) => TraceId::Ordinal(ordinal),
        }
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceId::Uuid(uuid) => write!(f, "{}", uuid),
            TraceId::Ordinal(n) => write!(f, "#{}", n),
        }
    }
}

impl Serialize for TraceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// External listener that needs to see every interaction as it is applied.
pub trait ModelObserver: Send + Sync {
    fn on_new_interaction(&self, trace: TraceId, interaction: &Interaction, result: &State);
}

/// Ordered interactions of one exploration run.
pub struct Trace {
    id: TraceId,
    actions: RwLock<Vec<Interaction>>,
    observers: Vec<Arc<dyn ModelObserver>>,
}

impl Trace {
    pub fn new(id: TraceId, observers: Vec<Arc<dyn ModelObserver>>) -> Self {
        Self {
            id,
            actions: RwLock::new(Vec::new()),
            observers,
        }
    }

    pub fn id(&self) -> TraceId {
        self.id
    }

    /// Append a single interaction and notify every observer.
    pub fn update(&self, action: Interaction, result: &State) {
        for observer in &self.observers {
            observer.on_new_interaction(self.id, &action, result);
        }
        self.actions.write().push(action);
    }

    /// Append a fully resolved sequence at once; observers are not notified.
    pub fn update_all(&self, actions: Vec<Interaction>) {
        self.actions.write().extend(actions);
    }

    pub fn actions(&self) -> Vec<Interaction> {
        self.actions.read().clone()
    }

    pub fn len(&self) -> usize {
        self.actions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.read().is_empty()
    }

    pub fn last(&self) -> Option<Interaction> {
        self.actions.read().last().cloned()
    }
}

impl fmt::Debug for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trace")
            .field("id", &self.id)
            .field("actions", &self.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}
