//! File operations over a workspace, with review-gate staging.
//!
//! Write and edit operations can be flagged for review: instead of touching
//! the real file the change is staged in memory with a line-delta summary,
//! to be applied or discarded once a human has looked at it.

use crate::{Result, ToolingError};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const SEARCH_MATCH_LIMIT: usize = 100;
const LIST_ENTRY_LIMIT: usize = 500;

/// A change held back by the review gate.
#[derive(Debug, Clone)]
pub struct StagedChange {
    /// Workspace-relative path of the target file.
    pub path: String,

    /// Full new content of the file.
    pub content: String,

    /// Line counts before/after, for the review summary.
    pub lines_before: usize,
    pub lines_after: usize,
}

impl StagedChange {
    /// One-line description of the staged change.
    pub fn summary(&self) -> String {
        format!(
            "{}: {} -> {} lines",
            self.path, self.lines_before, self.lines_after
        )
    }
}

/// File tools rooted at a workspace directory.
///
/// Paths passed in are expected to be pre-validated (see
/// [`crate::SecurityValidator::validate_path`]); this type only performs the
/// operations and the bookkeeping of staged and changed files.
pub struct WorkspaceTools {
    root: PathBuf,
    staged: BTreeMap<String, StagedChange>,
    changed: Vec<String>,
}

impl WorkspaceTools {
    /// Create workspace tools rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            staged: BTreeMap::new(),
            changed: Vec::new(),
        }
    }

    /// The workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read a file's content. Staged content wins over the on-disk version so
    /// the agent sees its own pending edits.
    pub fn read_file(&self, relative: &str, resolved: &Path) -> Result<String> {
        if let Some(staged) = self.staged.get(relative) {
            return Ok(staged.content.clone());
        }
        Ok(fs::read_to_string(resolved)?)
    }

    /// Write a file, either directly or staged behind the review gate.
    pub fn write_file(
        &mut self,
        relative: &str,
        resolved: &Path,
        content: &str,
        review_gate: bool,
    ) -> Result<String> {
        let lines_before = match fs::read_to_string(resolved) {
            Ok(existing) => existing.lines().count(),
            Err(_) => 0,
        };
        let lines_after = content.lines().count();

        if review_gate {
            let change = StagedChange {
                path: relative.to_string(),
                content: content.to_string(),
                lines_before,
                lines_after,
            };
            let summary = change.summary();
            self.staged.insert(relative.to_string(), change);
            tracing::debug!(path = relative, "staged write behind review gate");
            return Ok(format!("Staged for review: {}", summary));
        }

        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(resolved, content)?;
        self.record_change(relative);
        Ok(format!(
            "Wrote {}: {} -> {} lines",
            relative, lines_before, lines_after
        ))
    }

    /// Replace an exact substring in a file. The search string must occur
    /// exactly once; anything else is reported back as an error.
    pub fn edit_file(
        &mut self,
        relative: &str,
        resolved: &Path,
        search: &str,
        replacement: &str,
        review_gate: bool,
    ) -> Result<String> {
        let current = self.read_file(relative, resolved)?;

        let occurrences = current.matches(search).count();
        if occurrences == 0 {
            return Err(ToolingError::InvalidArguments {
                tool: "edit_file".to_string(),
                reason: "search string not found in file".to_string(),
            });
        }
        if occurrences > 1 {
            return Err(ToolingError::InvalidArguments {
                tool: "edit_file".to_string(),
                reason: format!("search string occurs {} times, expected exactly 1", occurrences),
            });
        }

        let updated = current.replacen(search, replacement, 1);
        self.write_file(relative, resolved, &updated, review_gate)
    }

    /// List files under a directory, recursively, as workspace-relative paths.
    pub fn list_files(&self, resolved: &Path) -> Result<String> {
        let mut entries = Vec::new();
        collect_files(resolved, &self.root, &mut entries)?;
        entries.sort();

        let truncated = entries.len() > LIST_ENTRY_LIMIT;
        entries.truncate(LIST_ENTRY_LIMIT);

        let mut out = entries.join("\n");
        if truncated {
            out.push_str("\n... (truncated)");
        }
        if out.is_empty() {
            out.push_str("(empty)");
        }
        Ok(out)
    }

    /// Search file contents under the workspace with a regex, returning
    /// `path:line: text` matches.
    pub fn search_code(&self, pattern: &str) -> Result<String> {
        let regex = Regex::new(pattern)?;
        let mut files = Vec::new();
        collect_files(&self.root, &self.root, &mut files)?;
        files.sort();

        let mut matches = Vec::new();
        'outer: for relative in &files {
            let path = self.root.join(relative);
            let Ok(content) = fs::read_to_string(&path) else {
                continue; // skip binary/unreadable files
            };
            for (idx, line) in content.lines().enumerate() {
                if regex.is_match(line) {
                    matches.push(format!("{}:{}: {}", relative, idx + 1, line.trim()));
                    if matches.len() >= SEARCH_MATCH_LIMIT {
                        break 'outer;
                    }
                }
            }
        }

        if matches.is_empty() {
            Ok(format!("No matches for pattern: {}", pattern))
        } else {
            Ok(matches.join("\n"))
        }
    }

    /// Apply every staged change to disk and clear the staging area.
    pub fn apply_staged(&mut self) -> Result<Vec<String>> {
        let staged = std::mem::take(&mut self.staged);
        let mut applied = Vec::new();
        for (relative, change) in staged {
            let path = self.root.join(&relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &change.content)?;
            self.record_change(&relative);
            applied.push(relative);
        }
        Ok(applied)
    }

    /// Discard every staged change.
    pub fn discard_staged(&mut self) -> usize {
        let count = self.staged.len();
        self.staged.clear();
        count
    }

    /// Currently staged changes, in path order.
    pub fn staged_changes(&self) -> impl Iterator<Item = &StagedChange> {
        self.staged.values()
    }

    /// Workspace-relative paths written during this session (staged paths
    /// included once applied).
    pub fn changed_files(&self) -> &[String] {
        &self.changed
    }

    fn record_change(&mut self, relative: &str) {
        if !self.changed.iter().any(|p| p == relative) {
            self.changed.push(relative.to_string());
        }
    }
}

fn collect_files(dir: &Path, root: &Path, out: &mut Vec<String>) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue; // hidden files and VCS metadata
        }
        if path.is_dir() {
            collect_files(&path, root, out)?;
        } else {
            let relative = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .to_string_lossy()
                .into_owned();
            out.push(relative);
        }
    }
    Ok(())
}
