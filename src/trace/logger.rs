use std::{fs::OpenOptions, io::Write, path::Path, sync::Mutex};

use serde::Serialize;
use tracing::warn;

use crate::state::{ConcreteId, State};
use crate::trace::interaction::Interaction;
use crate::trace::trace::{ModelObserver, TraceId};

/// One applied interaction, as written to the JSONL log.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub trace: TraceId,
    pub action_id: i32,
    pub action_type: String,
    pub source: ConcreteId,
    pub target_widget: Option<ConcreteId>,
    pub result: ConcreteId,
    pub result_widgets: usize,
    pub successful: bool,
    pub decision_time_ms: i64,
}

impl TraceEvent {
    pub fn new(trace: TraceId, interaction: &Interaction, result: &State) -> Self {
        Self {
            trace,
            action_id: interaction.action_id,
            action_type: interaction.action_type.name().to_string(),
            source: interaction.prev_state,
            target_widget: interaction.target_widget.as_ref().map(|w| w.id),
            result: interaction.res_state,
            result_widgets: result.widgets.len(),
            successful: interaction.successful,
            decision_time_ms: interaction.decision_time(),
        }
    }
}

/// Observer appending every applied interaction to a JSONL file.
pub struct TraceLogger {
    file: Option<Mutex<std::fs::File>>,
}

impl TraceLogger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let file = OpenOptions::new().create(true).append(true).open(path);

        match file {
            Ok(f) => Self {
                file: Some(Mutex::new(f)),
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not open interaction log");
                Self { file: None }
            }
        }
    }

    pub fn log(&self, event: &TraceEvent) {
        let file_mutex = match &self.file {
            Some(f) => f,
            None => return, // logging disabled
        };

        let json = match serde_json::to_string(event) {
            Ok(j) => j,
            Err(e) => {
                warn!(error = %e, "failed to serialize interaction event");
                return;
            }
        };

        let mut file = match file_mutex.lock() {
            Ok(f) => f,
            Err(e) => {
                warn!(error = %e, "interaction log lock poisoned");
                return;
            }
        };

        if let Err(e) = writeln!(file, "{}", json) {
            warn!(error = %e, "failed to write interaction event");
        }
    }
}

impl ModelObserver for TraceLogger {
    fn on_new_interaction(&self, trace: TraceId, interaction: &Interaction, result: &State) {
        self.log(&TraceEvent::new(trace, interaction, result));
    }
}
