use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, trace, warn};

use crate::graph::ModelGraph;
use crate::loading::action_parser::{ActionRecord, ActionRecordParser};
use crate::loading::config::ModelConfig;
use crate::loading::error::LoadError;
use crate::loading::reader::{ContentReader, split_rows};
use crate::loading::schema::ACTION_COLUMNS;
use crate::state::State;
use crate::trace::{Interaction, ModelObserver};

/// Trace paths buffered between the producer and the workers.
pub const QUEUE_CAPACITY: usize = 5;

/// Traces processed concurrently in parallel mode.
pub const PARALLEL_WORKERS: usize = 5;

type Parsed = (Interaction, Arc<State>);

// ============================================================================
// Execution strategies
// ============================================================================

/// Spawned action parse; aborted when dropped before completion.
pub struct ActionTask(JoinHandle<Result<Parsed, LoadError>>);

impl ActionTask {
    pub fn spawn(parser: Arc<ActionRecordParser>, record: ActionRecord) -> Self {
        Self(tokio::spawn(async move { parser.parse(record).await }))
    }
}

impl Drop for ActionTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// A submitted action: either already resolved or still running.
pub enum PendingAction {
    Resolved(Parsed),
    Spawned(ActionTask),
}

impl PendingAction {
    pub async fn resolve(self) -> Result<Parsed, LoadError> {
        match self {
            PendingAction::Resolved(parsed) => Ok(parsed),
            PendingAction::Spawned(mut task) => (&mut task.0).await?,
        }
    }

    /// Wait for the action to finish, discarding its outcome.
    ///
    /// Used on failure paths: the task may be inside a blocking state read,
    /// which aborting would not stop.
    pub async fn settle(self) {
        if let PendingAction::Spawned(mut task) = self {
            let _ = (&mut task.0).await;
        }
    }
}

/// How traces and their actions are scheduled.
#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn worker_count(&self) -> usize;

    async fn submit(
        &self,
        parser: &Arc<ActionRecordParser>,
        record: ActionRecord,
    ) -> Result<PendingAction, LoadError>;
}

/// One worker, every action resolved before the next is read.
pub struct Sequential;

#[async_trait]
impl ExecutionStrategy for Sequential {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn worker_count(&self) -> usize {
        1
    }

    async fn submit(
        &self,
        parser: &Arc<ActionRecordParser>,
        record: ActionRecord,
    ) -> Result<PendingAction, LoadError> {
        Ok(PendingAction::Resolved(parser.parse(record).await?))
    }
}

/// Several workers, each action of a trace parsed in its own task.
pub struct Parallel;

#[async_trait]
impl ExecutionStrategy for Parallel {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn worker_count(&self) -> usize {
        PARALLEL_WORKERS
    }

    async fn submit(
        &self,
        parser: &Arc<ActionRecordParser>,
        record: ActionRecord,
    ) -> Result<PendingAction, LoadError> {
        Ok(PendingAction::Spawned(ActionTask::spawn(Arc::clone(parser), record)))
    }
}

// ============================================================================
// Scheduler
// ============================================================================

struct TraceFile {
    path: PathBuf,
    ordinal: usize,
}

/// Everything a worker needs; cheap to clone into each task.
#[derive(Clone)]
struct TraceWorker {
    config: Arc<ModelConfig>,
    reader: Arc<dyn ContentReader>,
    model: Arc<ModelGraph>,
    parser: Arc<ActionRecordParser>,
    strategy: Arc<dyn ExecutionStrategy>,
    observers: Arc<Vec<Arc<dyn ModelObserver>>>,
    /// Flipped to `true` once any worker failed
    cancel: watch::Receiver<bool>,
}

/// Streams trace files from a bounded producer to a fixed pool of workers.
pub struct TraceScheduler {
    worker: TraceWorker,
    cancel: watch::Sender<bool>,
}

impl TraceScheduler {
    pub fn new(
        config: Arc<ModelConfig>,
        reader: Arc<dyn ContentReader>,
        model: Arc<ModelGraph>,
        parser: Arc<ActionRecordParser>,
        strategy: Arc<dyn ExecutionStrategy>,
        observers: Vec<Arc<dyn ModelObserver>>,
    ) -> Self {
        let (cancel, cancelled) = watch::channel(false);
        Self {
            worker: TraceWorker {
                config,
                reader,
                model,
                parser,
                strategy,
                observers: Arc::new(observers),
                cancel: cancelled,
            },
            cancel,
        }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.worker.strategy.name()
    }

    /// Process every trace file.
    ///
    /// The first fatal error cancels the load: the producer stops, workers
    /// take no further trace, and the call returns only after every in-flight
    /// action has finished, so nothing touches the model afterwards.
    pub async fn run(&self) -> Result<(), LoadError> {
        let (tx, rx) = mpsc::channel::<TraceFile>(QUEUE_CAPACITY);
        let producer = tokio::spawn(produce(
            Arc::clone(&self.worker.config),
            Arc::clone(&self.worker.reader),
            tx,
        ));
        debug!("producer launched");

        let queue = Arc::new(Mutex::new(rx));
        let mut workers = JoinSet::new();
        for index in 0..self.worker.strategy.worker_count() {
            let worker = self.worker.clone();
            let queue = Arc::clone(&queue);
            workers.spawn(async move { worker.drain(index, queue).await });
        }

        let mut failure = None;
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined.map_err(LoadError::from).and_then(|r| r) {
                if failure.is_none() {
                    warn!(error = %e, "aborting load");
                    let _ = self.cancel.send(true);
                    producer.abort();
                    failure = Some(e);
                }
            }
        }

        match failure {
            Some(e) => {
                // cancelled producer; its outcome no longer matters
                let _ = producer.await;
                Err(e)
            }
            None => producer.await?,
        }
    }
}

/// Send every trace file of the base directory, in file name order.
async fn produce(
    config: Arc<ModelConfig>,
    reader: Arc<dyn ContentReader>,
    tx: mpsc::Sender<TraceFile>,
) -> Result<(), LoadError> {
    let dir = config.base_dir.clone();
    let files = tokio::task::spawn_blocking(move || reader.list_files(&dir)).await??;

    let traces = files.into_iter().filter(|p| config.is_trace_file(p));
    for (ordinal, path) in traces.enumerate() {
        trace!(path = %path.display(), "producer: trace file");
        if tx.send(TraceFile { path, ordinal }).await.is_err() {
            // every worker is gone
            break;
        }
    }
    Ok(())
}

impl TraceWorker {
    async fn drain(
        self,
        index: usize,
        queue: Arc<Mutex<mpsc::Receiver<TraceFile>>>,
    ) -> Result<(), LoadError> {
        trace!(worker = index, "trace processor launched");
        loop {
            let next = queue.lock().await.recv().await;
            let Some(file) = next else { break };
            if self.cancelled() {
                break;
            }
            self.process(file).await?;
        }
        Ok(())
    }

    fn cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    async fn process(&self, file: TraceFile) -> Result<(), LoadError> {
        let trace_id = self.config.trace_id(&file.path, file.ordinal);
        if self.config.debug {
            info!(trace = %trace_id, path = %file.path.display(), "process trace");
        }

        let trace = self.model.init_new_trace(trace_id, &self.observers).await;
        let records = self.read_records(&file.path).await?;

        let mut pending = Vec::with_capacity(records.len());
        for record in records {
            if self.cancelled() {
                debug!(trace = %trace_id, "load cancelled, stop submitting");
                settle_all(pending).await;
                return Ok(());
            }
            match self.strategy.submit(&self.parser, record).await {
                Ok(action) => pending.push(action),
                Err(e) => {
                    settle_all(pending).await;
                    return Err(e);
                }
            }
        }

        if pending.is_empty() {
            info!(trace = %trace_id, "trace is empty");
            return Ok(());
        }

        let observed = !self.observers.is_empty();
        if observed {
            // observers need every step, in file order
            debug!(trace = %trace_id, "wait for completion of each action");
        } else {
            debug!(trace = %trace_id, "wait for completion of actions");
        }

        let mut actions = Vec::with_capacity(pending.len());
        let mut pending = pending.into_iter();
        while let Some(action) = pending.next() {
            match action.resolve().await {
                Ok((interaction, result)) if observed => trace.update(interaction, &result),
                Ok((interaction, _)) => actions.push(interaction),
                Err(e) => {
                    settle_all(pending).await;
                    return Err(e);
                }
            }
        }
        if !observed {
            trace.update_all(actions);
        }

        debug!(trace = %trace_id, actions = trace.len(), "consumed trace");
        Ok(())
    }

    async fn read_records(&self, path: &std::path::Path) -> Result<Vec<ActionRecord>, LoadError> {
        let lines = {
            let reader = Arc::clone(&self.reader);
            let path = path.to_path_buf();
            tokio::task::spawn_blocking(move || reader.read_lines(&path)).await??
        };

        let no_renaming = Default::default();
        let (_header, rows) = split_rows(path, &lines, &self.config.separator, &ACTION_COLUMNS, &no_renaming);
        rows.iter().map(ActionRecord::from_row).collect()
    }
}

/// Wait for every remaining action of a failed or cancelled trace.
async fn settle_all(pending: impl IntoIterator<Item = PendingAction>) {
    for action in pending {
        action.settle().await;
    }
}
