//! Write half of the command channel

use bedrock_core::{BedrockError, Result};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Write one console command and flush it through to the child.
///
/// The console is line oriented, so a command containing a line break
/// would run as several commands and is rejected.
pub async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, command: &str) -> Result<()> {
    let command = command.trim_end_matches(['\r', '\n']);
    if command.contains(['\r', '\n']) {
        return Err(BedrockError::InvalidArguments(
            "command must be a single line".to_string(),
        ));
    }

    let mut line = String::with_capacity(command.len() + 1);
    line.push_str(command);
    line.push('\n');

    writer
        .write_all(line.as_bytes())
        .await
        .map_err(|e| BedrockError::SendFailed(e.to_string()))?;
    writer
        .flush()
        .await
        .map_err(|e| BedrockError::SendFailed(e.to_string()))?;
    Ok(())
}
