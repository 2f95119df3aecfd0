//! Bedrock server process manager

use crate::channel::write_line;
use crate::config::ManagerConfig;
use crate::executable::{locate_executable, working_dir};
use crate::ingest::{self, LINE_CHANNEL_CAPACITY};
use crate::state::{LiveProcess, ProcessSlot, Shared, SharedStdin};
use async_trait::async_trait;
use bedrock_core::{BedrockError, CommandTelemetry, LogEntry, Result, ServerStatus};
use bedrock_server::console::ConsoleServer;
use chrono::Local;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::{Mutex, broadcast, mpsc};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

/// How long `stop` waits for the ingestion task once the child is gone
const INGEST_DRAIN: Duration = Duration::from_secs(1);

/// Supervises one Bedrock Dedicated Server process.
///
/// Log buffer and presence outlive restarts of the child; presence is
/// cleared each time a new child is spawned.
pub struct BedrockManager {
    config: ManagerConfig,
    shared: Arc<Shared>,
    lifecycle: Mutex<()>,
    next_generation: AtomicU64,
}

impl BedrockManager {
    pub fn new(config: ManagerConfig) -> Self {
        let shared = Arc::new(Shared::new(config.patterns.clone(), config.log_capacity));
        Self {
            config,
            shared,
            lifecycle: Mutex::new(()),
            next_generation: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Spawn the server if it is not already running
    pub async fn start(&self) -> Result<()> {
        let _lifecycle = self.lifecycle.lock().await;
        let mut process = self.shared.process.lock().await;
        if process.is_some() {
            debug!("Bedrock server already running");
            return Ok(());
        }

        let executable = locate_executable(&self.config.server_path, &self.config.executable_names)
            .inspect_err(|e| error!("{}", e))?;
        let dir = working_dir(&self.config.server_path);
        info!("Starting Bedrock server: {}", executable.display());

        let mut child = Command::new(&executable)
            .current_dir(&dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                error!("Failed to spawn {}: {}", executable.display(), e);
                BedrockError::SpawnFailure(e.to_string())
            })?;

        let (Some(stdin), Some(stdout), Some(stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            return Err(BedrockError::SpawnFailure(
                "child stdio was not captured".to_string(),
            ));
        };

        let pid = child.id();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        let (line_tx, line_rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
        ingest::forward_lines(stdout, line_tx.clone(), "stdout");
        ingest::forward_lines(stderr, line_tx, "stderr");

        {
            let mut state = self.shared.state.write().await;
            state.console.players.clear();
            state.live = Some(LiveProcess { pid, generation });
        }

        let ingest = tokio::spawn(ingest::run(line_rx, self.shared.clone(), generation));
        *process = Some(ProcessSlot {
            generation,
            pid,
            child,
            stdin: Arc::new(Mutex::new(stdin)),
            ingest,
        });

        info!("Bedrock server started (pid {:?})", pid);
        Ok(())
    }

    /// Ask the server to shut down, killing it after the grace period
    pub async fn stop(&self) {
        let _lifecycle = self.lifecycle.lock().await;
        let slot = {
            let mut process = self.shared.process.lock().await;
            let slot = process.take();
            if slot.is_some() {
                self.shared.state.write().await.live = None;
            }
            slot
        };

        let Some(ProcessSlot {
            pid,
            mut child,
            stdin,
            mut ingest,
            ..
        }) = slot
        else {
            debug!("Stop requested but Bedrock server is not running");
            return;
        };

        info!("Stopping Bedrock server (pid {:?})", pid);
        // A stuck writer must not keep the kill below from running
        let sent = write_bounded(&stdin, &self.config.stop_command, self.config.stop_grace).await;
        if let Err(e) = sent {
            warn!("Could not send stop command: {}", e);
        }

        match timeout(self.config.stop_grace, child.wait()).await {
            Ok(Ok(status)) => info!("Bedrock server exited: {}", status),
            Ok(Err(e)) => warn!("Failed to wait for Bedrock server: {}", e),
            Err(_) => {
                warn!(
                    "Bedrock server did not exit within {:?}, killing",
                    self.config.stop_grace
                );
                if let Err(e) = child.kill().await {
                    error!("Failed to kill Bedrock server: {}", e);
                }
            }
        }
        drop(stdin);

        if timeout(INGEST_DRAIN, &mut ingest).await.is_err() {
            debug!("Console ingestion did not drain, aborting");
            ingest.abort();
        }
    }

    /// Write a command and snapshot the console after the settle delay
    pub async fn send(&self, command: &str) -> Result<CommandTelemetry> {
        let requested_at = Local::now();
        let (stdin, cursor) = {
            let process = self.shared.process.lock().await;
            let slot = process.as_ref().ok_or(BedrockError::NotRunning)?;
            let cursor = self.shared.state.read().await.console.logs.cursor();
            (slot.stdin.clone(), cursor)
        };

        write_bounded(&stdin, command, self.config.write_timeout)
            .await
            .inspect_err(|e| warn!("{}", e))?;
        debug!("Sent command: {}", command);

        sleep(self.config.settle_delay).await;

        let state = self.shared.state.read().await;
        Ok(CommandTelemetry::capture(
            command,
            requested_at,
            &state.console.logs,
            cursor,
        ))
    }

    pub async fn status(&self) -> ServerStatus {
        let state = self.shared.state.read().await;
        ServerStatus::new(
            state.live.is_some(),
            &state.console.players,
            state.live.and_then(|live| live.pid),
        )
    }

    pub async fn is_running(&self) -> bool {
        self.shared.state.read().await.live.is_some()
    }

    /// Last `lines` formatted console lines; zero means all of them
    pub async fn recent_logs(&self, lines: usize) -> Vec<String> {
        self.shared.state.read().await.console.logs.recent_lines(lines)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.shared.log_tx.subscribe()
    }
}

/// Write one line to the child's stdin, giving up after `limit`.
///
/// The limit covers waiting for another writer as well as the write itself.
async fn write_bounded(stdin: &SharedStdin, line: &str, limit: Duration) -> Result<()> {
    let write = async {
        let mut stdin = stdin.lock().await;
        write_line(&mut *stdin, line).await
    };
    match timeout(limit, write).await {
        Ok(result) => result,
        Err(_) => Err(BedrockError::SendFailed(format!(
            "server did not accept input within {:?}",
            limit
        ))),
    }
}

#[async_trait]
impl ConsoleServer for BedrockManager {
    async fn start(&self) -> Result<()> {
        BedrockManager::start(self).await
    }

    async fn stop(&self) {
        BedrockManager::stop(self).await
    }

    async fn send(&self, command: &str) -> Result<CommandTelemetry> {
        BedrockManager::send(self, command).await
    }

    async fn status(&self) -> ServerStatus {
        BedrockManager::status(self).await
    }

    async fn recent_logs(&self, lines: usize) -> Vec<String> {
        BedrockManager::recent_logs(self, lines).await
    }

    fn subscribe_logs(&self) -> Option<broadcast::Receiver<LogEntry>> {
        Some(self.subscribe())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use bedrock_core::logs::NO_LOGS_PLACEHOLDER;
    use std::time::Instant;

    /// `/bin/sh` reading its stdin behaves like a console: every line is
    /// a command and `echo` produces log output.
    fn shell_config(stop_command: &str, stop_grace: Duration) -> ManagerConfig {
        ManagerConfig {
            settle_delay: Duration::from_millis(300),
            stop_grace,
            stop_command: stop_command.to_string(),
            ..ManagerConfig::new("/bin/sh")
        }
    }

    fn shell_manager() -> BedrockManager {
        BedrockManager::new(shell_config("exit", Duration::from_secs(5)))
    }

    async fn wait_for_status(
        manager: &BedrockManager,
        check: impl Fn(&ServerStatus) -> bool,
    ) -> ServerStatus {
        for _ in 0..50 {
            let status = manager.status().await;
            if check(&status) {
                return status;
            }
            sleep(Duration::from_millis(100)).await;
        }
        manager.status().await
    }

    async fn wait_for_log(manager: &BedrockManager, needle: &str) -> bool {
        for _ in 0..50 {
            if manager
                .recent_logs(0)
                .await
                .iter()
                .any(|line| line.ends_with(needle))
            {
                return true;
            }
            sleep(Duration::from_millis(100)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_send_when_not_running() {
        let manager = shell_manager();

        let err = manager.send("list").await.unwrap_err();
        assert!(matches!(err, BedrockError::NotRunning));
        assert_eq!(manager.send_text("list").await, "Error: Server is not running");
        assert_eq!(manager.recent_logs(10).await, vec![NO_LOGS_PLACEHOLDER]);

        let status = manager.status().await;
        assert!(!status.running);
        assert_eq!(status.player_count, 0);
        assert_eq!(status.pid, None);
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let manager = shell_manager();
        manager.start().await.unwrap();
        let first = manager.status().await;
        assert!(first.running);
        assert!(first.pid.is_some());

        manager.start().await.unwrap();
        assert_eq!(manager.status().await.pid, first.pid);

        manager.stop().await;
    }

    #[tokio::test]
    async fn test_send_observes_output() {
        let manager = shell_manager();
        manager.start().await.unwrap();

        let telemetry = manager.send("echo hello").await.unwrap();
        assert_eq!(telemetry.command, "echo hello");
        assert!(telemetry.recent_logs.len() <= 10);
        assert!(wait_for_log(&manager, "] hello").await);

        manager.stop().await;
    }

    #[tokio::test]
    async fn test_presence_from_console() {
        let manager = shell_manager();
        manager.start().await.unwrap();

        manager
            .send("echo 'Player connected: Alice, xuid: 1'")
            .await
            .unwrap();
        manager
            .send("echo 'Player connected: Bob, xuid: 2'")
            .await
            .unwrap();
        manager
            .send("echo 'Player disconnected: Alice, xuid: 1'")
            .await
            .unwrap();

        let status = wait_for_status(&manager, |s| s.player_list == ["Bob"]).await;
        assert_eq!(status.player_list, vec!["Bob"]);
        assert_eq!(status.player_count, 1);

        manager.stop().await;
    }

    #[tokio::test]
    async fn test_stderr_is_merged() {
        let manager = shell_manager();
        manager.start().await.unwrap();

        manager.send("echo oops 1>&2").await.unwrap();
        assert!(wait_for_log(&manager, "] oops").await);

        manager.stop().await;
    }

    #[tokio::test]
    async fn test_stop_kills_unresponsive_server() {
        // The shell does not know "stop", so only the kill ends it
        let manager = BedrockManager::new(shell_config("stop", Duration::from_millis(500)));
        manager.start().await.unwrap();

        manager.stop().await;
        let status = manager.status().await;
        assert!(!status.running);
        assert_eq!(status.pid, None);

        // Stopping again is a no-op
        manager.stop().await;
        assert!(!manager.is_running().await);
    }

    #[tokio::test]
    async fn test_graceful_stop() {
        let manager = shell_manager();
        manager.start().await.unwrap();

        let started = Instant::now();
        manager.stop().await;
        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(!manager.is_running().await);
    }

    #[tokio::test]
    async fn test_crash_is_detected_and_restart_works() {
        let manager = shell_manager();
        manager.start().await.unwrap();

        manager.send("exit").await.unwrap();
        let status = wait_for_status(&manager, |s| !s.running).await;
        assert!(!status.running);
        assert_eq!(status.pid, None);

        manager.start().await.unwrap();
        assert!(manager.is_running().await);
        manager.stop().await;
    }

    #[tokio::test]
    async fn test_restart_clears_presence_keeps_logs() {
        let manager = shell_manager();
        manager.start().await.unwrap();
        manager
            .send("echo 'Player connected: Steve, xuid: 3'")
            .await
            .unwrap();
        wait_for_status(&manager, |s| s.player_count == 1).await;
        manager.stop().await;

        assert_eq!(manager.status().await.player_list, vec!["Steve"]);

        manager.start().await.unwrap();
        assert_eq!(manager.status().await.player_count, 0);
        assert!(wait_for_log(&manager, "Player connected: Steve, xuid: 3").await);

        manager.stop().await;
    }

    #[tokio::test]
    async fn test_log_subscription() {
        let manager = shell_manager();
        let mut rx = manager.subscribe_logs().unwrap();
        manager.start().await.unwrap();

        manager.send("echo streamed").await.unwrap();
        let entry = timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.text, "streamed");

        manager.stop().await;
    }

    /// Replace the shell with a process that never reads stdin again
    async fn start_deaf_server(manager: &BedrockManager) {
        manager.start().await.unwrap();
        manager.send("exec sleep 30").await.unwrap();
    }

    /// Larger than any pipe buffer, so the write cannot complete unread
    fn oversized_command() -> String {
        "x".repeat(1 << 20)
    }

    #[tokio::test]
    async fn test_stop_not_blocked_by_stuck_write() {
        let manager = Arc::new(BedrockManager::new(ManagerConfig {
            write_timeout: Duration::from_secs(30),
            ..shell_config("stop", Duration::from_millis(200))
        }));
        start_deaf_server(&manager).await;

        let sender = manager.clone();
        let stuck = tokio::spawn(async move { sender.send(&oversized_command()).await });
        sleep(Duration::from_millis(200)).await;
        assert!(!stuck.is_finished());

        let status = timeout(Duration::from_secs(1), manager.status())
            .await
            .unwrap();
        assert!(status.running);

        timeout(Duration::from_secs(5), manager.stop()).await.unwrap();
        assert!(!manager.is_running().await);
        assert_eq!(manager.status().await.pid, None);

        // The killed child closes the pipe under the blocked writer
        let result = timeout(Duration::from_secs(5), stuck).await.unwrap().unwrap();
        assert!(matches!(result, Err(BedrockError::SendFailed(_))));
    }

    #[tokio::test]
    async fn test_write_timeout_is_send_failure() {
        let manager = BedrockManager::new(ManagerConfig {
            write_timeout: Duration::from_millis(300),
            ..shell_config("stop", Duration::from_millis(200))
        });
        start_deaf_server(&manager).await;

        let started = Instant::now();
        let err = manager.send(&oversized_command()).await.unwrap_err();
        assert!(matches!(err, BedrockError::SendFailed(_)));
        assert!(err.to_string().starts_with("Error sending command: "));
        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(manager.is_running().await);

        timeout(Duration::from_secs(5), manager.stop()).await.unwrap();
        assert!(!manager.is_running().await);
    }

    #[tokio::test]
    async fn test_executable_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let manager = BedrockManager::new(ManagerConfig::new(dir.path()));

        let err = manager.start().await.unwrap_err();
        assert!(matches!(err, BedrockError::ExecutableNotFound(ref p) if p == dir.path()));
        assert!(!manager.is_running().await);
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let dir = tempfile::tempdir().unwrap();
        // Present but not executable
        std::fs::write(dir.path().join("bedrock_server"), b"not a program").unwrap();
        let manager = BedrockManager::new(ManagerConfig::new(dir.path()));

        let err = manager.start().await.unwrap_err();
        assert!(matches!(err, BedrockError::SpawnFailure(_)));
        assert!(err.to_string().starts_with("Failed to start server: "));
        assert!(!manager.is_running().await);
    }
}
