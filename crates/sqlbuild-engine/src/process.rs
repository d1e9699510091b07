//! Blocking subprocess invocation shared by the toolchain and the executor

use std::process::{Command, ExitStatus, Stdio};

/// Outcome of a finished subprocess
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Whether the process exited with status 0
    pub success: bool,

    /// Exit code; `None` when terminated by a signal
    pub code: Option<i32>,

    /// Captured standard error
    pub stderr: String,
}

impl ProcessOutput {
    /// A successful run with no output
    pub fn succeeded() -> Self {
        Self {
            success: true,
            code: Some(0),
            stderr: String::new(),
        }
    }

    /// A failed run with the given exit code and stderr
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stderr: stderr.into(),
        }
    }

    /// Human-readable exit description
    pub fn describe_exit(&self) -> String {
        match self.code {
            Some(code) => format!("exited with status {}", code),
            None => "terminated by a signal".to_string(),
        }
    }

    fn from_status(status: ExitStatus, stderr: Vec<u8>) -> Self {
        Self {
            success: status.success(),
            code: status.code(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        }
    }
}

/// Run to completion; stdout is inherited, stderr captured
///
/// Blocks until the child exits. There is no timeout.
pub fn run(command: &mut Command) -> std::io::Result<ProcessOutput> {
    let output = command
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped())
        .output()?;

    Ok(ProcessOutput::from_status(output.status, output.stderr))
}
