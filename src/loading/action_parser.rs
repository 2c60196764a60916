use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{debug, trace};

use crate::loading::error::LoadError;
use crate::loading::reader::Row;
use crate::loading::repair::RepairEngine;
use crate::loading::schema::{self, ACTION_COLUMNS, Layout};
use crate::loading::state_parser::StateParser;
use crate::state::{ConcreteId, State};
use crate::trace::{ActionPayload, ActionType, Interaction};

/// One row of a trace file, typed but not yet resolved against any state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    pub location: String,
    pub action_type: ActionType,
    pub target_widget: Option<ConcreteId>,
    pub start_timestamp: NaiveDateTime,
    pub end_timestamp: NaiveDateTime,
    pub successful: bool,
    pub exception: String,
    pub source_state: ConcreteId,
    pub result_state: ConcreteId,
    pub action_id: i32,
    pub payload: ActionPayload,
}

impl ActionRecord {
    pub fn from_row(row: &Row) -> Result<Self, LoadError> {
        if row.fields.len() != ACTION_COLUMNS.len() {
            return Err(LoadError::malformed(
                &row.location,
                format!(
                    "expected {} columns, found {}",
                    ACTION_COLUMNS.len(),
                    row.fields.len()
                ),
            ));
        }

        let layout = Layout::positional(&ACTION_COLUMNS);
        let action_type = ActionType::from(layout.raw(row, &schema::ACTION_TYPE)?);
        let data = layout.text(row, &schema::DATA)?;
        let payload = ActionPayload::parse(&action_type, &data)
            .map_err(|e| LoadError::malformed(&row.location, e))?;

        Ok(Self {
            location: row.location.clone(),
            target_widget: layout.optional_id(row, &schema::TARGET_WIDGET)?,
            start_timestamp: layout.timestamp(row, &schema::START_TIME)?,
            end_timestamp: layout.timestamp(row, &schema::END_TIME)?,
            successful: layout.boolean(row, &schema::SUCCESSFUL)?,
            exception: layout.text(row, &schema::EXCEPTION)?,
            source_state: layout.id(row, &schema::SOURCE_STATE)?,
            result_state: layout.id(row, &schema::RESULT_STATE)?,
            action_id: layout.int(row, &schema::ACTION_ID)?,
            action_type,
            payload,
        })
    }
}

/// Turns action records into interactions between reconstructed states.
pub struct ActionRecordParser {
    states: Arc<StateParser>,
    repair: RepairEngine,
    compatibility_mode: bool,
    enable_checks: bool,
    debug: bool,
}

impl ActionRecordParser {
    pub fn new(
        states: Arc<StateParser>,
        repair: RepairEngine,
        compatibility_mode: bool,
        enable_checks: bool,
        debug: bool,
    ) -> Self {
        Self {
            states,
            repair,
            compatibility_mode,
            enable_checks,
            debug,
        }
    }

    /// Resolve a record into its interaction and result state.
    ///
    /// The returned interaction carries the identifiers of the reconstructed
    /// states, which differ from the recorded ones after a repair.
    pub async fn parse(&self, record: ActionRecord) -> Result<(Interaction, Arc<State>), LoadError> {
        if self.debug {
            debug!(location = %record.location, "parse action {} -> {}", record.source_state, record.result_state);
        }

        let res_state = self.states.resolve(record.result_state).await?;
        let src_state = self.states.resolve(record.source_state).await?;

        // an exact match beats any mapping recorded by other traces
        let mut target = record.target_widget.and_then(|id| {
            src_state
                .widget(&id)
                .or_else(|| src_state.widget(&self.repair.fixed_widget_id(id)))
                .cloned()
        });

        if let Some(recorded) = record.target_widget {
            let verified = !self.enable_checks
                || (res_state.id == record.result_state && target.is_some());
            if !verified {
                if !self.compatibility_mode {
                    return Err(LoadError::IdentityMismatch(format!(
                        "{}: target widget {} of action {} does not resolve in source state {} (result state {} is now {})",
                        record.location,
                        recorded,
                        record.action_id,
                        record.source_state,
                        record.result_state,
                        res_state.id
                    )));
                }
                debug!(location = %record.location, widget = %recorded, "applying repair");
                let fixed = self.repair.repair(recorded, &record.action_type, &src_state)?;
                target = src_state.widget(&fixed).cloned();
            }
        }

        let interaction = Interaction {
            action_type: record.action_type,
            target_widget: target,
            start_timestamp: record.start_timestamp,
            end_timestamp: record.end_timestamp,
            successful: record.successful,
            exception: record.exception,
            // the reconstructed ids, not the recorded ones
            prev_state: src_state.id,
            res_state: res_state.id,
            action_id: record.action_id,
            payload: record.payload,
        };

        if interaction.prev_state != record.source_state || interaction.res_state != record.result_state {
            trace!(location = %record.location, "ids changed due to automatic repair: {}", interaction);
        }
        Ok((interaction, res_state))
    }
}
