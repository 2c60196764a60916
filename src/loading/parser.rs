use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::graph::ModelGraph;
use crate::loading::action_parser::ActionRecordParser;
use crate::loading::config::ModelConfig;
use crate::loading::error::LoadError;
use crate::loading::reader::{ContentReader, FsContentReader};
use crate::loading::repair::{IdRemap, RepairEngine};
use crate::loading::scheduler::{ExecutionStrategy, Parallel, Sequential, TraceScheduler};
use crate::loading::state_parser::{ParseMode, StateParser};
use crate::state::ConcreteId;
use crate::trace::ModelObserver;

/// Original identifier → repaired identifier.
pub type RemapTable = BTreeMap<ConcreteId, ConcreteId>;

/// Options of a single load.
#[derive(Clone)]
pub struct LoadOptions {
    /// Listeners that see every interaction as it is applied
    pub observers: Vec<Arc<dyn ModelObserver>>,

    /// Compatibility mode: repair identifier drift instead of failing
    pub auto_fix: bool,

    /// One worker, strictly ordered
    pub sequential: bool,

    /// Verify identifiers at all; when off, persisted ids are trusted
    pub enable_checks: bool,

    /// Source of trace and state files; the filesystem when `None`
    pub reader: Option<Arc<dyn ContentReader>>,

    /// Legacy state-file header name → current column name
    pub header_renaming: HashMap<String, String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            observers: Vec::new(),
            auto_fix: false,
            sequential: false,
            enable_checks: true,
            reader: None,
            header_renaming: HashMap::new(),
        }
    }
}

impl LoadOptions {
    pub fn sequential() -> Self {
        Self {
            sequential: true,
            ..Self::default()
        }
    }

    pub fn parallel() -> Self {
        Self::default()
    }

    pub fn with_auto_fix(mut self, auto_fix: bool) -> Self {
        self.auto_fix = auto_fix;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ModelObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn with_reader(mut self, reader: Arc<dyn ContentReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn with_checks(mut self, enable_checks: bool) -> Self {
        self.enable_checks = enable_checks;
        self
    }

    pub fn with_header_renaming(mut self, renaming: HashMap<String, String>) -> Self {
        self.header_renaming = renaming;
        self
    }
}

impl fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("observers", &self.observers.len())
            .field("auto_fix", &self.auto_fix)
            .field("sequential", &self.sequential)
            .field("enable_checks", &self.enable_checks)
            .field("custom_reader", &self.reader.is_some())
            .field("header_renaming", &self.header_renaming)
            .finish()
    }
}

/// Result of a completed load.
pub struct LoadedModel {
    pub model: Arc<ModelGraph>,
    pub state_remap: RemapTable,
    pub widget_remap: RemapTable,
}

/// Entry point for loading persisted exploration models.
pub struct ModelParser;

impl ModelParser {
    /// Load the model under `config.base_dir`.
    ///
    /// Any fatal condition aborts the load; no partial model is returned.
    pub async fn load(config: &ModelConfig, options: LoadOptions) -> Result<Arc<ModelGraph>, LoadError> {
        Ok(TraceLoader::new(config, options).run().await?.model)
    }

    /// Load with compatibility mode forced on and report every identifier the
    /// repairs changed, for migrating artifacts that reference the old ids.
    ///
    /// Remap entries are first-wins; only a `sequential` run pins which
    /// mapping is kept when repairs disagree.
    pub async fn load_and_repair(config: &ModelConfig, sequential: bool) -> Result<LoadedModel, LoadError> {
        let options = LoadOptions {
            sequential,
            ..LoadOptions::default()
        }
        .with_auto_fix(true);
        let loaded = TraceLoader::new(config, options).run().await?;
        info!(
            states = loaded.model.state_count(),
            state_repairs = loaded.state_remap.len(),
            widget_repairs = loaded.widget_remap.len(),
            "model parsing complete"
        );
        Ok(loaded)
    }
}

/// One load: the shared model handle plus every component wired to it.
struct TraceLoader {
    model: Arc<ModelGraph>,
    states: Arc<StateParser>,
    widget_remap: Arc<IdRemap>,
    scheduler: TraceScheduler,
    enable_checks: bool,
}

impl TraceLoader {
    fn new(config: &ModelConfig, options: LoadOptions) -> Self {
        let config = Arc::new(config.clone());
        let reader: Arc<dyn ContentReader> = match options.reader {
            Some(reader) => reader,
            None => Arc::new(FsContentReader),
        };
        let strategy: Arc<dyn ExecutionStrategy> = if options.sequential {
            Arc::new(Sequential)
        } else {
            Arc::new(Parallel)
        };

        // constructed before any worker starts
        let model = Arc::new(ModelGraph::new());
        let widget_remap = Arc::new(IdRemap::default());

        let mode = ParseMode {
            compatibility_mode: options.auto_fix,
            enable_checks: options.enable_checks,
            concurrent_widgets: !options.sequential,
            header_renaming: options.header_renaming,
        };
        let states = Arc::new(StateParser::new(
            Arc::clone(&config),
            Arc::clone(&reader),
            Arc::clone(&model),
            mode,
            Arc::clone(&widget_remap),
        ));
        let parser = Arc::new(ActionRecordParser::new(
            Arc::clone(&states),
            RepairEngine::new(Arc::clone(&widget_remap)),
            options.auto_fix,
            options.enable_checks,
            config.debug,
        ));
        let scheduler = TraceScheduler::new(
            Arc::clone(&config),
            reader,
            Arc::clone(&model),
            parser,
            strategy,
            options.observers,
        );

        Self {
            model,
            states,
            widget_remap,
            scheduler,
            enable_checks: options.enable_checks,
        }
    }

    async fn run(self) -> Result<LoadedModel, LoadError> {
        let started = Instant::now();
        let mode = self.scheduler.strategy_name();

        self.scheduler.run().await?;

        if self.enable_checks {
            if let Some((trace, id)) = self.model.dangling_references().await.into_iter().next() {
                return Err(LoadError::IdentityMismatch(format!(
                    "trace {} references state {} which is not part of the model",
                    trace, id
                )));
            }
        }

        debug!(
            cached_states = self.states.cached_states(),
            cached_widgets = self.states.cached_widgets(),
            "clearing identity caches"
        );
        self.states.clear();

        info!(
            mode,
            elapsed_ms = started.elapsed().as_millis() as u64,
            states = self.model.state_count(),
            widgets = self.model.widget_count(),
            "model loading complete"
        );

        Ok(LoadedModel {
            state_remap: self.states.state_remap().snapshot(),
            widget_remap: self.widget_remap.snapshot(),
            model: self.model,
        })
    }
}
