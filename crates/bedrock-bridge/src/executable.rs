//! Locating the server executable

use bedrock_core::{BedrockError, Result};
use std::path::{Path, PathBuf};

/// Directory the server runs in: the path itself if it is a directory,
/// otherwise its parent
pub fn working_dir(server_path: &Path) -> PathBuf {
    if server_path.is_dir() {
        return server_path.to_path_buf();
    }
    match server_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Find the executable to spawn.
///
/// A server path naming a file is used as-is; otherwise the first of
/// `names` that exists in the working directory wins.
pub fn locate_executable(server_path: &Path, names: &[String]) -> Result<PathBuf> {
    if server_path.is_file() {
        return Ok(server_path.to_path_buf());
    }
    let dir = working_dir(server_path);
    let found = names
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file());
    found.ok_or(BedrockError::ExecutableNotFound(dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_EXECUTABLE_NAMES;
    use std::fs;

    fn names() -> Vec<String> {
        DEFAULT_EXECUTABLE_NAMES.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_candidate_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("BedrockServer.exe"), b"").unwrap();
        fs::write(dir.path().join("bedrock_server.exe"), b"").unwrap();

        let found = locate_executable(dir.path(), &names()).unwrap();
        assert_eq!(found, dir.path().join("bedrock_server.exe"));
    }

    #[test]
    fn test_file_path_used_directly() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("custom_server");
        fs::write(&exe, b"").unwrap();

        assert_eq!(working_dir(&exe), dir.path());
        assert_eq!(locate_executable(&exe, &names()).unwrap(), exe);
    }

    #[test]
    fn test_missing_file_searches_parent() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bedrock_server"), b"").unwrap();

        let stale = dir.path().join("bedrock_server.old");
        assert_eq!(
            locate_executable(&stale, &names()).unwrap(),
            dir.path().join("bedrock_server")
        );
    }

    #[test]
    fn test_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = locate_executable(dir.path(), &names()).unwrap_err();
        match err {
            BedrockError::ExecutableNotFound(searched) => assert_eq!(searched, dir.path()),
            other => panic!("unexpected error: {other}"),
        }
    }
}
