//! External action execution
//!
//! The pot never brews anything itself. Brewing and stopping are opaque
//! commands configured by the operator; this module runs them and turns
//! every outcome into a value the pot can report.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::observability::OperationTimer;

#[cfg(test)]
use mockall::automock;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOutput {
    pub status_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ActionOutput {
    /// Output reported for an action that is not configured
    pub fn skipped() -> Self {
        Self::default()
    }

    pub fn success(&self) -> bool {
        self.status_code == 0
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("Action not found: {action}")]
    NotFound { action: String },
    #[error("Action {action} exited with status {status_code}: {stderr}")]
    Failed {
        action: String,
        status_code: i32,
        stderr: String,
    },
    #[error("Action {action} timed out after {timeout_ms}ms")]
    Timeout { action: String, timeout_ms: u64 },
    #[error("IO error running {action}: {message}")]
    Io { action: String, message: String },
}

/// Runs a named external action
///
/// Implementations must report every failure through `ActionError`; the pot
/// relies on this to keep serving after a broken brew script.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ActionRunner: Send + Sync {
    async fn run(&self, action: &str, args: &[String]) -> Result<ActionOutput, ActionError>;
}

/// Runs actions as child processes
pub struct CommandActionRunner {
    timeout: Duration,
}

impl CommandActionRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for CommandActionRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

#[async_trait]
impl ActionRunner for CommandActionRunner {
    async fn run(&self, action: &str, args: &[String]) -> Result<ActionOutput, ActionError> {
        if action.trim().is_empty() {
            debug!("No action configured, skipping");
            return Ok(ActionOutput::skipped());
        }

        let timer = OperationTimer::new(action);
        let child = tokio::process::Command::new(action)
            .args(args)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(result) => result.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ActionError::NotFound {
                        action: action.to_string(),
                    }
                } else {
                    ActionError::Io {
                        action: action.to_string(),
                        message: e.to_string(),
                    }
                }
            })?,
            Err(_) => {
                warn!(action, timeout_ms = self.timeout.as_millis() as u64, "Action timed out");
                return Err(ActionError::Timeout {
                    action: action.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                });
            }
        };
        timer.finish();

        let result = ActionOutput {
            status_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !result.success() {
            return Err(ActionError::Failed {
                action: action.to_string(),
                status_code: result.status_code,
                stderr: result.stderr,
            });
        }

        info!(action, stdout = %result.stdout.trim_end(), "Action completed");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::*;

    #[tokio::test]
    async fn test_command_runner_success() {
        let runner = CommandActionRunner::default();
        let output = runner
            .run("echo", &["brewing".to_string()])
            .await
            .unwrap();

        assert!(output.success());
        assert!(output.stdout.contains("brewing"));
    }

    #[tokio::test]
    async fn test_command_runner_not_found() {
        let runner = CommandActionRunner::default();
        let result = runner.run("nonexistent_brew_script_xyz", &[]).await;

        assert!(matches!(result, Err(ActionError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_command_runner_non_zero_exit_is_failure() {
        let runner = CommandActionRunner::default();
        let result = runner.run("false", &[]).await;

        match result {
            Err(ActionError::Failed { action, status_code, .. }) => {
                assert_eq!(action, "false");
                assert_ne!(status_code, 0);
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_command_runner_timeout() {
        let runner = CommandActionRunner::new(Duration::from_millis(50));
        let result = runner.run("sleep", &["5".to_string()]).await;

        assert!(matches!(result, Err(ActionError::Timeout { timeout_ms: 50, .. })));
    }

    #[tokio::test]
    async fn test_empty_action_is_skipped() {
        let runner = CommandActionRunner::default();
        let output = runner.run("  ", &[]).await.unwrap();

        assert_eq!(output, ActionOutput::skipped());
    }

    #[tokio::test]
    async fn test_mock_action_runner() {
        let mut mock = MockActionRunner::new();
        mock.expect_run()
            .with(eq("./brew.sh"), eq(Vec::<String>::new()))
            .times(1)
            .returning(|_, _| {
                Ok(ActionOutput {
                    status_code: 0,
                    stdout: "ok\n".to_string(),
                    stderr: String::new(),
                })
            });

        let output = mock.run("./brew.sh", &[]).await.unwrap();
        assert_eq!(output.stdout, "ok\n");
    }
}
