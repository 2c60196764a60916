use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::state::{ConcreteId, State, Widget};
use crate::trace::{ModelObserver, Trace, TraceId};

// ============================================================================
// Model graph
// ============================================================================

/// Graph of reconstructed states, widgets and traces.
///
/// States and widgets are registered once, on first reconstruction, and are
/// owned by the graph afterwards. Registering a trace goes through a single
/// async mutex so concurrent workers never interleave on the trace list.
pub struct ModelGraph {
    states: RwLock<BTreeMap<ConcreteId, Arc<State>>>,
    widgets: RwLock<BTreeMap<ConcreteId, Arc<Widget>>>,
    traces: Mutex<Vec<Arc<Trace>>>,
    empty_state: Arc<State>,
}

impl ModelGraph {
    /// Create a graph holding only the empty root state.
    pub fn new() -> Self {
        let empty_state = Arc::new(State::empty());
        let mut states = BTreeMap::new();
        states.insert(empty_state.id, Arc::clone(&empty_state));

        Self {
            states: RwLock::new(states),
            widgets: RwLock::new(BTreeMap::new()),
            traces: Mutex::new(Vec::new()),
            empty_state,
        }
    }

    pub fn empty_state(&self) -> Arc<State> {
        Arc::clone(&self.empty_state)
    }

    /// Register a new, empty trace for the given run.
    pub async fn init_new_trace(
        &self,
        id: TraceId,
        observers: &[Arc<dyn ModelObserver>],
    ) -> Arc<Trace> {
        let trace = Arc::new(Trace::new(id, observers.to_vec()));
        self.traces.lock().await.push(Arc::clone(&trace));
        trace
    }

    /// Register a state and its widgets. Already known identifiers are kept.
    pub fn add_state(&self, state: Arc<State>) {
        {
            let mut widgets = self.widgets.write();
            for widget in &state.widgets {
                widgets
                    .entry(widget.id)
                    .or_insert_with(|| Arc::clone(widget));
            }
        }
        self.states.write().entry(state.id).or_insert(state);
    }

    pub fn state(&self, id: &ConcreteId) -> Option<Arc<State>> {
        self.states.read().get(id).cloned()
    }

    pub fn has_state(&self, id: &ConcreteId) -> bool {
        self.states.read().contains_key(id)
    }

    pub fn widget(&self, id: &ConcreteId) -> Option<Arc<Widget>> {
        self.widgets.read().get(id).cloned()
    }

    /// All states, ordered by identifier. Includes the empty root state.
    pub fn states(&self) -> Vec<Arc<State>> {
        self.states.read().values().cloned().collect()
    }

    pub fn state_count(&self) -> usize {
        self.states.read().len()
    }

    pub fn widget_count(&self) -> usize {
        self.widgets.read().len()
    }

    /// All traces, ordered by trace identifier.
    pub async fn traces(&self) -> Vec<Arc<Trace>> {
        let mut traces = self.traces.lock().await.clone();
        traces.sort_by_key(|t| t.id());
        traces
    }

    pub async fn trace(&self, id: TraceId) -> Option<Arc<Trace>> {
        self.traces
            .lock()
            .await
            .iter()
            .find(|t| t.id() == id)
            .cloned()
    }

    /// Interaction endpoints that do not resolve to a registered state.
    pub async fn dangling_references(&self) -> Vec<(TraceId, ConcreteId)> {
        let mut dangling = Vec::new();
        for trace in self.traces().await {
            for action in trace.actions() {
                for id in [action.prev_state, action.res_state] {
                    if !self.has_state(&id) {
                        dangling.push((trace.id(), id));
                    }
                }
            }
        }
        dangling
    }

    /// Order-stable view of the graph, used to compare loads.
    pub async fn summary(&self) -> GraphSummary {
        let traces = self
            .traces()
            .await
            .iter()
            .map(|trace| TraceSummary {
                id: trace.id(),
                edges: trace
                    .actions()
                    .iter()
                    .map(|a| EdgeSummary {
                        action_type: a.action_type.name().to_string(),
                        source: a.prev_state,
                        target_widget: a.target_widget.as_ref().map(|w| w.id),
                        result: a.res_state,
                        action_id: a.action_id,
                        payload: a.payload.to_string(),
                    })
                    .collect(),
            })
            .collect();

        GraphSummary {
            states: self.states.read().keys().copied().collect(),
            widgets: self.widgets.read().keys().copied().collect(),
            traces,
        }
    }
}

impl Default for ModelGraph {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Summary view
// ============================================================================

/// Sorted snapshot of a model graph; equal summaries mean equal graphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    pub states: Vec<ConcreteId>,
    pub widgets: Vec<ConcreteId>,
    pub traces: Vec<TraceSummary>,
}

impl GraphSummary {
    pub fn interaction_count(&self) -> usize {
        self.traces.iter().map(|t| t.edges.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceSummary {
    pub id: TraceId,
    pub edges: Vec<EdgeSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeSummary {
    pub action_type: String,
    pub source: ConcreteId,
    pub target_widget: Option<ConcreteId>,
    pub result: ConcreteId,
    pub action_id: i32,
    pub payload: String,
}
