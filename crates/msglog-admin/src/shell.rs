//! Executable resolution.

use std::path::{Path, PathBuf};

/// Resolve an executable by name.
///
/// Explicit absolute paths are used as-is when they exist; anything else is
/// looked up on the current `PATH`.
pub async fn resolve_executable_path(executable: &str) -> Option<PathBuf> {
    if executable.trim().is_empty() {
        return None;
    }

    let path = Path::new(executable);
    if path.is_absolute() && path.is_file() {
        return Some(path.to_path_buf());
    }

    which_async(executable).await
}

async fn which_async(executable: &str) -> Option<PathBuf> {
    let executable = executable.to_string();
    tokio::task::spawn_blocking(move || which::which(executable))
        .await
        .ok()
        .and_then(Result::ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blank_name_does_not_resolve() {
        assert!(resolve_executable_path("   ").await.is_none());
    }

    #[tokio::test]
    async fn test_missing_executable_does_not_resolve() {
        assert!(
            resolve_executable_path("msglog-no-such-binary-3f9c")
                .await
                .is_none()
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_resolves_on_path() {
        let resolved = resolve_executable_path("sh").await.unwrap();
        assert!(resolved.is_absolute());
    }
}
