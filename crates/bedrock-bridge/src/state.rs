//! State shared between the manager and its ingestion task

use bedrock_core::{ConsoleState, LogBuffer, LogEntry, PatternTable};
use std::sync::Arc;
use tokio::process::{Child, ChildStdin};
use tokio::sync::{Mutex, RwLock, broadcast};
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// Capacity of the console line broadcast channel
const LOG_BROADCAST_CAPACITY: usize = 256;

/// Liveness of the current child, as seen by status readers
#[derive(Debug, Clone, Copy)]
pub(crate) struct LiveProcess {
    pub pid: Option<u32>,
    pub generation: u64,
}

/// Snapshot state; the ingestion task is the only writer of `console`
#[derive(Debug, Default)]
pub(crate) struct RuntimeState {
    pub console: ConsoleState,
    pub live: Option<LiveProcess>,
}

/// Child stdin, locked only for the duration of one write
pub(crate) type SharedStdin = Arc<Mutex<ChildStdin>>;

/// Handles owned while a child is running
pub(crate) struct ProcessSlot {
    pub generation: u64,
    pub pid: Option<u32>,
    pub child: Child,
    pub stdin: SharedStdin,
    pub ingest: JoinHandle<()>,
}

/// Lock order: `process` before `state`. Neither is held across a write
/// to the child's stdin.
pub(crate) struct Shared {
    pub state: RwLock<RuntimeState>,
    pub process: Mutex<Option<ProcessSlot>>,
    pub patterns: PatternTable,
    pub log_tx: broadcast::Sender<LogEntry>,
}

impl Shared {
    pub fn new(patterns: PatternTable, log_capacity: usize) -> Self {
        let (log_tx, _) = broadcast::channel(LOG_BROADCAST_CAPACITY);
        Self {
            state: RwLock::new(RuntimeState {
                console: ConsoleState {
                    logs: LogBuffer::with_capacity(log_capacity),
                    ..Default::default()
                },
                live: None,
            }),
            process: Mutex::new(None),
            patterns,
            log_tx,
        }
    }

    /// Take the slot out if it still belongs to `generation`
    pub async fn take_slot(&self, generation: u64) -> Option<ProcessSlot> {
        let mut process = self.process.lock().await;
        if !process
            .as_ref()
            .is_some_and(|slot| slot.generation == generation)
        {
            return None;
        }
        let slot = process.take();
        self.state.write().await.live = None;
        slot
    }

    /// Called when the console stream of `generation` ended on its own.
    ///
    /// A process already taken by `stop`, or replaced by a newer start, is
    /// left alone.
    pub async fn release(&self, generation: u64) {
        let Some(slot) = self.take_slot(generation).await else {
            return;
        };
        let ProcessSlot {
            pid,
            mut child,
            stdin,
            ..
        } = slot;
        drop(stdin);

        match child.wait().await {
            Ok(status) => warn!("Bedrock server (pid {:?}) exited: {}", pid, status),
            Err(e) => error!("Failed to reap Bedrock server (pid {:?}): {}", pid, e),
        }
    }
}
