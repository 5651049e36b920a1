//! Mechanical verification of an implementation attempt.
//!
//! This runs between the lead's review and the human gate. It is not a test
//! run; it is a cheap sanity pass whose report is surfaced alongside the
//! implementation for the operator's decision.

use crate::workflow::{ImplementationArtifact, VerificationCheck, VerificationReport};
use crate::Result;
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(
        &self,
        workspace_root: &Path,
        artifact: &ImplementationArtifact,
    ) -> Result<VerificationReport>;
}

/// Checks that the agent finished on its own, that every file it claims to
/// have changed exists, and that none of them is empty.
pub struct QuickVerifier;

#[async_trait]
impl Verifier for QuickVerifier {
    async fn verify(
        &self,
        workspace_root: &Path,
        artifact: &ImplementationArtifact,
    ) -> Result<VerificationReport> {
        let mut checks = Vec::new();

        checks.push(VerificationCheck {
            name: "agent_completed".to_string(),
            passed: artifact.success,
            detail: if artifact.success {
                format!("finished in {} iterations", artifact.iterations)
            } else {
                "stopped at the iteration ceiling".to_string()
            },
        });

        let mut missing = Vec::new();
        let mut empty = Vec::new();
        for relative in &artifact.files_changed {
            let path = workspace_root.join(relative);
            match std::fs::metadata(&path) {
                Ok(meta) if meta.len() == 0 => empty.push(relative.clone()),
                Ok(_) => {}
                Err(_) => missing.push(relative.clone()),
            }
        }

        checks.push(VerificationCheck {
            name: "files_exist".to_string(),
            passed: missing.is_empty(),
            detail: if missing.is_empty() {
                format!("{} changed file(s) present", artifact.files_changed.len())
            } else {
                format!("missing: {}", missing.join(", "))
            },
        });
        checks.push(VerificationCheck {
            name: "files_non_empty".to_string(),
            passed: empty.is_empty(),
            detail: if empty.is_empty() {
                "no empty files".to_string()
            } else {
                format!("empty: {}", empty.join(", "))
            },
        });

        Ok(VerificationReport::from_checks(checks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(success: bool, files: &[&str]) -> ImplementationArtifact {
        ImplementationArtifact {
            success,
            summary: "done".to_string(),
            iterations: 3,
            tool_invocations: Vec::new(),
            files_changed: files.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_passes_when_files_present() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.rs"), "fn a() {}").unwrap();

        let report = QuickVerifier
            .verify(dir.path(), &artifact(true, &["a.rs"]))
            .await
            .unwrap();
        assert!(report.passed);
        assert_eq!(report.checks.len(), 3);
    }

    #[tokio::test]
    async fn test_flags_missing_and_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("empty.rs"), "").unwrap();

        let report = QuickVerifier
            .verify(dir.path(), &artifact(true, &["empty.rs", "gone.rs"]))
            .await
            .unwrap();
        assert!(!report.passed);
        let by_name = |name: &str| report.checks.iter().find(|c| c.name == name).unwrap();
        assert!(!by_name("files_exist").passed);
        assert!(!by_name("files_non_empty").passed);
        assert!(by_name("agent_completed").passed);
    }

    #[tokio::test]
    async fn test_ceiling_fails_completion_check() {
        let dir = tempfile::tempdir().unwrap();
        let report = QuickVerifier
            .verify(dir.path(), &artifact(false, &[]))
            .await
            .unwrap();
        assert!(!report.passed);
    }
}
