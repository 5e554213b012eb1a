//! Prober backed by the system `ping` binary
//!
//! Runs `ping -n -w <deadline> -c <count> <address>` and maps its exit
//! status: 0 means at least one reply came back, 1 means no reply, anything
//! else is an error of the ping facility itself.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::trace;

use super::{ProbeOutcome, Prober};

/// Echo requests sent per probe
const DEFAULT_COUNT: u32 = 3;

/// Deadline handed to `ping -w`
const DEFAULT_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct PingProber {
    /// Path or name of the ping binary
    program: String,

    count: u32,
    deadline: Duration,
}

impl PingProber {
    pub fn new() -> Self {
        Self {
            program: "ping".to_string(),
            count: DEFAULT_COUNT,
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Use a different ping binary
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count.max(1);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Arguments passed to the ping binary for `address`
    pub fn args(&self, address: &str) -> Vec<String> {
        vec![
            "-n".to_string(),
            format!("-w{}", self.deadline.as_secs().max(1)),
            format!("-c{}", self.count),
            address.to_string(),
        ]
    }
}

impl Default for PingProber {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a ping exit code to an outcome
pub fn outcome_from_exit_code(code: Option<i32>) -> ProbeOutcome {
    match code {
        Some(0) => ProbeOutcome::Online,
        Some(1) => ProbeOutcome::NoResponse,
        Some(code) => ProbeOutcome::Failed(format!("ping exited with status {code}")),
        None => ProbeOutcome::Failed("ping was terminated by a signal".to_string()),
    }
}

#[async_trait]
impl Prober for PingProber {
    async fn probe(&self, address: &str) -> ProbeOutcome {
        let args = self.args(address);
        trace!("running {} {}", self.program, args.join(" "));

        let status = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await;

        match status {
            Ok(status) => outcome_from_exit_code(status.code()),
            Err(e) => ProbeOutcome::Failed(format!("failed to run {}: {e}", self.program)),
        }
    }

    fn deadline(&self) -> Duration {
        self.deadline
    }
}
