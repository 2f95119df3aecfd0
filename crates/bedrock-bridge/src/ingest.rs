//! Console ingestion: merge stdout/stderr and feed the shared state

use crate::state::Shared;
use chrono::Local;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Lines buffered between the pipe readers and the ingestion loop
pub(crate) const LINE_CHANNEL_CAPACITY: usize = 256;

/// Read `stream` line by line into `tx` until EOF.
///
/// Both stdout and stderr forward into the same channel, which is the
/// merged console stream. Bytes that are not UTF-8 are replaced.
pub(crate) fn forward_lines<R>(stream: R, tx: mpsc::Sender<String>, label: &'static str) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf).into_owned();
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Error reading server {}: {}", label, e);
                    break;
                }
            }
        }
        debug!("Server {} closed", label);
    })
}

/// Ingestion loop for one child process.
///
/// Runs until every forwarder has hit EOF, then releases the process it
/// was started for so `running` cannot outlive the child.
pub(crate) async fn run(mut lines: mpsc::Receiver<String>, shared: Arc<Shared>, generation: u64) {
    while let Some(raw) = lines.recv().await {
        let entry = {
            let mut state = shared.state.write().await;
            state
                .console
                .ingest(Local::now().time(), &raw, &shared.patterns)
        };
        // No subscribers is fine
        let _ = shared.log_tx.send(entry);
    }

    info!("Console stream ended (generation {})", generation);
    shared.release(generation).await;
}
