//! Workspace context assembly for the lead's planning prompt.

use crate::Result;
use async_trait::async_trait;
use std::path::Path;

const DEFAULT_MAX_ENTRIES: usize = 200;

/// Produces a textual snapshot of the workspace for prompting.
#[async_trait]
pub trait ContextAssembler: Send + Sync {
    async fn assemble(&self, workspace_root: &Path) -> Result<String>;
}

/// Lists the workspace file tree, dotfiles and build output excluded.
pub struct FileTreeContext {
    max_entries: usize,
}

impl FileTreeContext {
    pub fn new() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl Default for FileTreeContext {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContextAssembler for FileTreeContext {
    async fn assemble(&self, workspace_root: &Path) -> Result<String> {
        let mut entries = Vec::new();
        collect(workspace_root, workspace_root, &mut entries)?;
        entries.sort();

        if entries.is_empty() {
            return Ok("(empty workspace)".to_string());
        }
        let truncated = entries.len() > self.max_entries;
        entries.truncate(self.max_entries);
        let mut listing = entries.join("\n");
        if truncated {
            listing.push_str("\n… (truncated)");
        }
        Ok(listing)
    }
}

fn collect(dir: &Path, root: &Path, out: &mut Vec<String>) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') || name == "target" || name == "__pycache__" {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            collect(&path, root, out)?;
        } else if let Ok(relative) = path.strip_prefix(root) {
            out.push(relative.to_string_lossy().into_owned());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lists_files_skips_hidden_and_target() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::create_dir_all(dir.path().join("target")).unwrap();
        std::fs::write(dir.path().join("src/main.rs"), "fn main() {}").unwrap();
        std::fs::write(dir.path().join("target/junk"), "x").unwrap();
        std::fs::write(dir.path().join(".env"), "SECRET=1").unwrap();

        let context = FileTreeContext::new()
            .assemble(dir.path())
            .await
            .unwrap();
        assert!(context.contains("src/main.rs"));
        assert!(!context.contains("junk"));
        assert!(!context.contains(".env"));
    }

    #[tokio::test]
    async fn test_empty_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let context = FileTreeContext::new()
            .assemble(dir.path())
            .await
            .unwrap();
        assert_eq!(context, "(empty workspace)");
    }
}
