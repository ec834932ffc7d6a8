//! Subprocess adapter for coreference models.
//!
//! Spawns a model program (e.g. `python3 scripts/spacy_coref.py`), writes
//! the document to its stdin and parses an [`Analysis`] JSON document from
//! its stdout.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use super::CorefModel;
use crate::config::ModelSettings;
use crate::domain::Analysis;

/// Coreference model running as a child process
pub struct SubprocessModel {
    /// Program to execute
    program: String,
    /// Arguments passed to the program
    args: Vec<String>,
    /// Maximum time to wait for the analysis
    timeout: Duration,
}

impl SubprocessModel {
    /// Create a model adapter for `program` with no arguments
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout,
        }
    }

    /// Append arguments passed to the program
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Create from the resolved model settings
    pub fn from_settings(settings: &ModelSettings) -> Self {
        Self::new(
            settings.command.clone(),
            Duration::from_secs(settings.timeout_seconds),
        )
        .with_args(settings.args.iter().cloned())
    }

    /// Command line for messages
    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    async fn run(&self, text: &str) -> Result<String> {
        let command_line = self.command_line();

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn coreference model '{}'", command_line))?;

        let mut stdin = child.stdin.take().context("Model stdin was not captured")?;
        let write = async move {
            let written = stdin.write_all(text.as_bytes()).await;
            // Dropping stdin signals EOF
            drop(stdin);
            written
        };

        // Feed stdin while draining stdout, all under one deadline
        let (written, output) = timeout(self.timeout, async move {
            tokio::join!(write, child.wait_with_output())
        })
        .await
        .with_context(|| {
            format!(
                "Coreference model '{}' timed out after {:?}",
                command_line, self.timeout
            )
        })?;
        let output = output
            .with_context(|| format!("Failed to wait for coreference model '{}'", command_line))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let exit_code = output.status.code().unwrap_or(-1);
            anyhow::bail!(
                "Coreference model '{}' failed with exit code {}: {}",
                command_line,
                exit_code,
                stderr.trim()
            );
        }

        written.context("Failed to write document to model stdin")?;
        String::from_utf8(output.stdout).context("Model output is not valid UTF-8")
    }
}

#[async_trait]
impl CorefModel for SubprocessModel {
    fn name(&self) -> &str {
        &self.program
    }

    async fn analyze(&self, text: &str) -> Result<Analysis> {
        let stdout = self.run(text).await?;
        let analysis: Analysis = serde_json::from_str(&stdout)
            .with_context(|| format!("Failed to parse analysis from '{}'", self.command_line()))?;

        debug!(
            tokens = analysis.tokens.len(),
            groups = analysis.spans.len(),
            mentions = analysis.mention_count(),
            "Model analysis received"
        );
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings() {
        let settings = ModelSettings {
            command: "python3".to_string(),
            args: vec!["scripts/spacy_coref.py".to_string()],
            timeout_seconds: 42,
        };
        let model = SubprocessModel::from_settings(&settings);
        assert_eq!(model.name(), "python3");
        assert_eq!(model.command_line(), "python3 scripts/spacy_coref.py");
        assert_eq!(model.timeout, Duration::from_secs(42));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_parses_model_stdout() {
        let model = SubprocessModel::new("sh", Duration::from_secs(10)).with_args([
            "-c",
            r#"cat > /dev/null; echo '{"tokens":[{"text":"Hi","idx":0,"whitespace_":""}],"spans":{}}'"#,
        ]);
        let analysis = model.analyze("Hi").await.unwrap();
        assert_eq!(analysis.reconstruct(), "Hi");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_reports_stderr() {
        let model = SubprocessModel::new("sh", Duration::from_secs(10))
            .with_args(["-c", "cat > /dev/null; echo 'model not installed' >&2; exit 3"]);
        let err = model.analyze("text").await.unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("exit code 3"));
        assert!(message.contains("model not installed"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_invalid_json_rejected() {
        let model = SubprocessModel::new("sh", Duration::from_secs(10))
            .with_args(["-c", "cat > /dev/null; echo 'not json'"]);
        let err = model.analyze("text").await.unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse analysis"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout() {
        let model = SubprocessModel::new("sleep", Duration::from_millis(100)).with_args(["5"]);
        let err = model.analyze("").await.unwrap_err();
        assert!(format!("{:#}", err).contains("timed out"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_covers_blocked_stdin() {
        // Larger than a pipe buffer, and the child never reads it
        let document = "a ".repeat(200_000);
        let model = SubprocessModel::new("sleep", Duration::from_millis(200)).with_args(["3"]);

        let started = std::time::Instant::now();
        let err = model.analyze(&document).await.unwrap_err();
        assert!(format!("{:#}", err).contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_early_exit_reports_stderr_not_broken_pipe() {
        let document = "a ".repeat(200_000);
        let model = SubprocessModel::new("sh", Duration::from_secs(10))
            .with_args(["-c", "echo 'model refused input' >&2; exit 2"]);

        let err = model.analyze(&document).await.unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("exit code 2"));
        assert!(message.contains("model refused input"));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let model = SubprocessModel::new("/nonexistent/coref-model", Duration::from_secs(1));
        let err = model.analyze("text").await.unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to spawn"));
    }
}
