use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::config::AgentConfig;
use crate::plugins::traits::{AutomationEngine, AutomationOutcome, AutomationRequest};
use crate::utils::error::AppError;

/// Runs the automation agent as an external CLI and reads its stdout as the transcript.
pub struct CommandEngine {
    config: AgentConfig,
}

impl CommandEngine {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    pub fn build_args(&self, request: &AutomationRequest) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(subcommand) = &self.config.subcommand {
            args.push(subcommand.clone());
        }
        args.push(request.script.clone());
        args.push("--steps".to_string());
        args.push(request.max_steps.to_string());

        let session = &request.session;
        if let Some(provider) = &session.provider {
            args.push("--provider".to_string());
            args.push(provider.clone());
        }
        if let Some(model) = &session.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }
        if let Some(serial) = &session.device_serial {
            args.push("--device".to_string());
            args.push(serial.clone());
        }

        args
    }

    fn parse_output(stdout: &[u8]) -> AutomationOutcome {
        let transcript = String::from_utf8_lossy(stdout).to_string();
        let result = transcript
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or_default()
            .to_string();

        AutomationOutcome { transcript, result }
    }
}

#[async_trait]
impl AutomationEngine for CommandEngine {
    fn name(&self) -> &str {
        &self.config.program
    }

    async fn run(&self, request: AutomationRequest) -> Result<AutomationOutcome, AppError> {
        let args = self.build_args(&request);
        let timeout = Duration::from_secs(self.config.timeout_secs);

        tracing::debug!(
            "Invoking {} with {} steps ({} char script)",
            self.config.program,
            request.max_steps,
            request.script.len()
        );

        let child = Command::new(&self.config.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AppError::Agent(format!("Failed to start {}: {}", self.config.program, e)))?;

        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| AppError::Agent(format!("Agent timed out after {}s", timeout.as_secs())))?
            .map_err(|e| AppError::Agent(format!("Agent I/O failed: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("Agent exited with {}", output.status)
            } else {
                stderr
            };
            return Err(AppError::Agent(message));
        }

        let outcome = Self::parse_output(&output.stdout);
        tracing::debug!("Captured {} chars of agent output", outcome.transcript.len());
        Ok(outcome)
    }
}
