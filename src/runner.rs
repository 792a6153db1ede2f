// Executor: runs a built `ShadowCommand` and reports how the tool exited.
// A failing tool never aborts the batch; the status is handed back to the
// caller instead.

use crate::shadow::ShadowCommand;
use log::{debug, warn};
use serde::Serialize;
use std::process::{Command, Stdio};

/// Exit state of one external tool run.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolStatus {
    Succeeded,
    /// Tool ran but exited non-zero. `code` is `None` when killed by a signal.
    Failed { code: Option<i32> },
    /// Tool could not be started at all (not installed, not executable).
    LaunchFailed { message: String },
}

impl ToolStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolStatus::Succeeded)
    }
}

/// Seam between the pipeline and the operating system.
pub trait CommandRunner {
    fn run(&mut self, command: &ShadowCommand) -> ToolStatus;
}

/// Runs the tool as a child process, inheriting stdout/stderr so ImageMagick
/// diagnostics reach the terminal.
#[derive(Debug, Default, Clone)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, command: &ShadowCommand) -> ToolStatus {
        debug!(
            "event=tool_start program={} input={}",
            command.program,
            command.input.display()
        );
        let status = Command::new(&command.program)
            .args(command.args())
            .stdin(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => ToolStatus::Succeeded,
            Ok(status) => {
                warn!(
                    "event=tool_failed program={} output={} code={:?}",
                    command.program,
                    command.output.display(),
                    status.code()
                );
                ToolStatus::Failed {
                    code: status.code(),
                }
            }
            Err(e) => {
                warn!(
                    "event=tool_launch_failed program={} error={}",
                    command.program, e
                );
                ToolStatus::LaunchFailed {
                    message: format!("failed to launch `{}`: {}", command.program, e),
                }
            }
        }
    }
}
