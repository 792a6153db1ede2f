// UI layer: confirmation prompt, a progress bar while the batch runs, and
// the summary printed at the end. Kept synchronous like the rest of the tool.

use crate::logging;
use crate::pipeline::{BatchObserver, FileReport, Summary};
use crate::runner::ToolStatus;
use crate::shadow::ShadowCommand;
use anyhow::{Context, Result};
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

/// Ask before touching picked files. The list is shown first so the user
/// sees exactly what will be moved into `originals`.
pub fn confirm_batch(paths: &[PathBuf], opacity: u8) -> Result<bool> {
    println!("{} file(s) selected:", paths.len());
    for path in paths {
        println!("  {}", path.display());
    }
    let go = Confirm::new()
        .with_prompt(format!(
            "Archive originals and add shadows (opacity {})?",
            opacity
        ))
        .default(true)
        .interact()?;
    Ok(go)
}

/// Progress bar over the batch. Command lines and per-file failures are
/// printed through the bar, and log lines are routed around it while it is
/// attached, so the terminal output does not tear.
pub struct ProgressObserver {
    bar: Option<ProgressBar>,
    style: ProgressStyle,
}

impl ProgressObserver {
    pub fn new() -> Result<Self> {
        let style = ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
            .context("Invalid progress bar template")?;
        Ok(ProgressObserver { bar: None, style })
    }

    fn println(&self, line: String) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => println!("{}", line),
        }
    }
}

impl BatchObserver for ProgressObserver {
    fn on_start(&mut self, total: usize) {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(self.style.clone());
        logging::attach_progress_bar(&bar);
        self.bar = Some(bar);
    }

    fn on_command(&mut self, command: &ShadowCommand) {
        self.println(command.display_line());
        if let Some(bar) = &self.bar {
            bar.set_message(file_label(&command.output));
        }
    }

    fn on_file_done(&mut self, report: &FileReport) {
        match &report.tool {
            ToolStatus::Succeeded => {}
            ToolStatus::Failed { code: Some(code) } => {
                self.println(format!("  failed (exit {}): {}", code, report.output.display()))
            }
            ToolStatus::Failed { code: None } => {
                self.println(format!("  failed (killed): {}", report.output.display()))
            }
            ToolStatus::LaunchFailed { message } => self.println(format!("  {}", message)),
        }
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }
}

impl Drop for ProgressObserver {
    fn drop(&mut self) {
        if let Some(bar) = &self.bar {
            logging::detach_progress_bar();
            bar.finish_and_clear();
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// One-line outcome for the batch.
pub fn format_summary(summary: &Summary) -> String {
    let mut line = format!(
        "{} file(s): {} succeeded, {} failed",
        summary.total, summary.succeeded, summary.failed
    );
    if summary.archive_skipped > 0 {
        line.push_str(&format!(
            ", {} left in place (already in originals)",
            summary.archive_skipped
        ));
    }
    line
}

/// Writes the per-file reports as pretty JSON.
pub fn write_report(path: &Path, reports: &[FileReport]) -> Result<()> {
    let json = serde_json::to_string_pretty(reports).context("Failed to serialize report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    Ok(())
}
