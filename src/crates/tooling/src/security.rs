//! Security validation for commands, code, and file paths.
//!
//! Defense in depth: a command deny-list checked first, an allow-list in
//! strict mode, dangerous-pattern scanning for code snippets, injection
//! character checks on arguments, and workspace containment for every path.

use crate::{Result, ToolingError};
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Commands that are never executed.
const DENIED_COMMANDS: &[&str] = &[
    "rm", "rmdir", "del", "format", "dd", "mkfs", "shutdown", "reboot", "halt", "poweroff", "nc",
    "netcat", "telnet", "wget", "curl", "chmod", "chown", "chgrp", "su", "sudo", "doas", "passwd",
    "useradd", "userdel", "usermod", "iptables", "nft", "ufw", "systemctl", "service", "crontab",
    "at",
];

/// Commands allowed in strict mode.
const ALLOWED_COMMANDS: &[&str] = &[
    "cargo", "rustc", "rustfmt", "python3", "python", "pip", "pytest", "git", "ls", "cat", "echo",
    "grep", "find", "sed", "awk", "mkdir", "touch", "cp", "mv", "head", "tail", "wc", "sort",
    "uniq", "diff", "patch", "tar", "gzip", "gunzip", "zip", "unzip",
];

/// Patterns that mark a code snippet as dangerous regardless of language.
const DANGEROUS_CODE_PATTERNS: &[&str] = &[
    // dynamic evaluation / process escape
    r"(?i)os\.system\s*\(",
    r"(?i)subprocess\.(call|Popen|run)\s*\(",
    r"(?i)\beval\s*\(",
    r"(?i)\bexec\s*\(",
    r"(?i)__import__\s*\(",
    r"(?i)std::process::Command",
    // sensitive filesystem locations
    r#"(?i)open\s*\(['"]/(etc|bin|boot|dev|proc|sys)"#,
    r"/etc/(passwd|shadow|sudoers)",
    // network access
    r"(?i)\bimport\s+socket\b",
    r"(?i)\bimport\s+urllib\b",
    r"(?i)\bimport\s+requests\b",
    r"(?i)\bsocket\.",
    r"(?i)\burllib\.",
    r"(?i)\brequests\.",
    // deserialization / shell escape
    r"(?i)pickle\.loads\s*\(",
    r"(?i)marshal\.loads\s*\(",
    r"(?i)shell\s*=\s*True",
];

/// Path fragments that indicate a traversal attempt, checked case-insensitively.
const TRAVERSAL_FRAGMENTS: &[&str] = &["../", r"..\", "%2e%2e", "...."];

/// Characters/sequences that indicate command injection in an argument.
const INJECTION_FRAGMENTS: &[&str] = &[";", "|", "&", "`", "$(", "\n", "\r"];

/// File name fragments that must never be touched.
const SENSITIVE_FRAGMENTS: &[&str] = &[
    ".env",
    ".git/",
    ".ssh",
    "id_rsa",
    "private_key",
    "credentials",
    "secrets",
    "password",
    "token",
];

/// Validates commands, code, and paths before tool execution.
pub struct SecurityValidator {
    workspace_root: PathBuf,
    strict_mode: bool,
    denied: HashSet<&'static str>,
    allowed: HashSet<&'static str>,
    dangerous_patterns: Vec<Regex>,
}

impl SecurityValidator {
    /// Create a validator rooted at the given workspace directory.
    ///
    /// In strict mode (the default for workflows) only allow-listed commands
    /// may run; otherwise anything not on the deny-list passes the command
    /// name check.
    pub fn new(workspace_root: impl Into<PathBuf>, strict_mode: bool) -> Self {
        let dangerous_patterns = DANGEROUS_CODE_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect();

        Self {
            workspace_root: workspace_root.into(),
            strict_mode,
            denied: DENIED_COMMANDS.iter().copied().collect(),
            allowed: ALLOWED_COMMANDS.iter().copied().collect(),
            dangerous_patterns,
        }
    }

    /// Validate a command given as program + arguments.
    pub fn validate_command(&self, command: &[String]) -> Result<()> {
        let Some(program) = command.first() else {
            return Err(ToolingError::SecurityRejection("empty command".to_string()));
        };

        let base = Path::new(program)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(program);

        if self.denied.contains(base) {
            return Err(ToolingError::SecurityRejection(format!(
                "denied command: {}",
                base
            )));
        }

        if self.strict_mode && !self.allowed.contains(base) {
            return Err(ToolingError::SecurityRejection(format!(
                "command not in allow-list: {}",
                base
            )));
        }

        for arg in &command[1..] {
            if is_traversal(arg) {
                return Err(ToolingError::SecurityRejection(format!(
                    "path traversal in argument: {}",
                    arg
                )));
            }
            if is_injection(arg) {
                return Err(ToolingError::SecurityRejection(format!(
                    "command injection in argument: {}",
                    arg
                )));
            }
        }

        Ok(())
    }

    /// Validate a code snippet before sandboxed execution.
    pub fn validate_code(&self, code: &str) -> Result<()> {
        for pattern in &self.dangerous_patterns {
            if let Some(found) = pattern.find(code) {
                return Err(ToolingError::SecurityRejection(format!(
                    "dangerous pattern detected: {}",
                    found.as_str()
                )));
            }
        }
        Ok(())
    }

    /// Validate a file path: inside the workspace, no traversal, no
    /// sensitive names. Returns the resolved absolute path on success.
    pub fn validate_path(&self, path: &str) -> Result<PathBuf> {
        if is_traversal(path) {
            return Err(ToolingError::SecurityRejection(format!(
                "path traversal detected: {}",
                path
            )));
        }

        let candidate = if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.workspace_root.join(path)
        };

        // Canonicalize the deepest existing ancestor so paths for files that
        // do not exist yet are still checked for containment.
        let resolved = resolve_lexically(&candidate);
        let root = self
            .workspace_root
            .canonicalize()
            .unwrap_or_else(|_| resolve_lexically(&self.workspace_root));

        if !resolved.starts_with(&root) {
            return Err(ToolingError::PathOutsideWorkspace(path.to_string()));
        }

        let lower = resolved.to_string_lossy().to_lowercase();
        let root_lower = root.to_string_lossy().to_lowercase();
        let relative = lower.strip_prefix(&root_lower).unwrap_or(&lower);
        for fragment in SENSITIVE_FRAGMENTS {
            if relative.contains(fragment) {
                return Err(ToolingError::SecurityRejection(format!(
                    "access to sensitive path not allowed: {}",
                    path
                )));
            }
        }

        Ok(resolved)
    }

    /// The workspace root this validator protects.
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }
}

/// Normalize a path lexically: resolve `.` and `..` without touching the
/// filesystem, after anchoring at the canonicalized deepest existing ancestor.
fn resolve_lexically(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut base = path.to_path_buf();
    let mut remainder: Vec<std::ffi::OsString> = Vec::new();
    while !base.exists() {
        match (base.parent(), base.file_name()) {
            (Some(parent), Some(name)) => {
                remainder.push(name.to_os_string());
                base = parent.to_path_buf();
            }
            _ => break,
        }
    }

    let mut resolved = base.canonicalize().unwrap_or(base);
    for name in remainder.iter().rev() {
        match Path::new(name).components().next() {
            Some(Component::ParentDir) => {
                resolved.pop();
            }
            Some(Component::CurDir) | None => {}
            _ => resolved.push(name),
        }
    }
    resolved
}

fn is_traversal(value: &str) -> bool {
    let lower = value.to_lowercase();
    TRAVERSAL_FRAGMENTS.iter().any(|f| lower.contains(f))
}

fn is_injection(value: &str) -> bool {
    INJECTION_FRAGMENTS.iter().any(|f| value.contains(f))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> SecurityValidator {
        let dir = std::env::temp_dir();
        SecurityValidator::new(dir, true)
    }

    fn cmd(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_denied_command_rejected() {
        let v = validator();
        assert!(v.validate_command(&cmd(&["rm", "-rf", "/"])).is_err());
        assert!(v.validate_command(&cmd(&["sudo", "ls"])).is_err());
        // deny-list wins even via a path
        assert!(v.validate_command(&cmd(&["/usr/bin/curl", "x"])).is_err());
    }

    #[test]
    fn test_strict_mode_requires_allow_list() {
        let v = validator();
        assert!(v.validate_command(&cmd(&["cargo", "test"])).is_ok());
        assert!(v.validate_command(&cmd(&["nmap", "localhost"])).is_err());

        let relaxed = SecurityValidator::new(std::env::temp_dir(), false);
        assert!(relaxed.validate_command(&cmd(&["nmap", "localhost"])).is_ok());
    }

    #[test]
    fn test_injection_in_arguments_rejected() {
        let v = validator();
        assert!(v.validate_command(&cmd(&["ls", "; rm -rf /"])).is_err());
        assert!(v.validate_command(&cmd(&["cat", "$(whoami)"])).is_err());
        assert!(v.validate_command(&cmd(&["cat", "notes.txt"])).is_ok());
    }

    #[test]
    fn test_dangerous_code_rejected() {
        let v = validator();
        assert!(v.validate_code("eval(input())").is_err());
        assert!(v.validate_code("import socket").is_err());
        assert!(v.validate_code("subprocess.run(['ls'], shell=True)").is_err());
        assert!(v.validate_code("print('hello')").is_ok());
    }

    #[test]
    fn test_path_traversal_rejected() {
        let v = validator();
        assert!(v.validate_path("../outside.txt").is_err());
        assert!(v.validate_path("%2e%2e/etc/passwd").is_err());
    }

    #[test]
    fn test_path_outside_workspace_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let v = SecurityValidator::new(dir.path(), true);
        assert!(v.validate_path("/etc/hostname").is_err());
        assert!(v.validate_path("src/main.rs").is_ok());
    }

    #[test]
    fn test_sensitive_names_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let v = SecurityValidator::new(dir.path(), true);
        assert!(v.validate_path(".env").is_err());
        assert!(v.validate_path("config/credentials.yaml").is_err());
        assert!(v.validate_path("src/lib.rs").is_ok());
    }
}
