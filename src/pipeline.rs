// Batch pipeline: archive -> build command -> run, one file at a time.
//
// File-system failures stop the batch (everything processed so far stays
// as it is). Tool failures are recorded per file and the batch moves on.

use crate::archive::{archive_original, ArchiveOutcome, SourceParts};
use crate::config::Settings;
use crate::runner::{CommandRunner, ToolStatus};
use crate::shadow::{png_output_path, ShadowCommand};
use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Everything that happened to one picked file.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub source: PathBuf,
    pub archive: ArchiveOutcome,
    pub input: PathBuf,
    pub output: PathBuf,
    /// The command line as printed before running.
    pub command: String,
    pub tool: ToolStatus,
}

/// Hooks for progress display. All methods default to doing nothing.
pub trait BatchObserver {
    fn on_start(&mut self, _total: usize) {}
    /// Called right before the tool runs; the command line is the audit print.
    fn on_command(&mut self, _command: &ShadowCommand) {}
    fn on_file_done(&mut self, _report: &FileReport) {}
}

/// Silent observer.
impl BatchObserver for () {}

/// Aggregate counts over a finished batch.
#[derive(Serialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub archive_skipped: usize,
}

impl Summary {
    pub fn of(reports: &[FileReport]) -> Self {
        let mut summary = Summary {
            total: reports.len(),
            ..Summary::default()
        };
        for report in reports {
            if report.tool.is_success() {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            if report.archive.is_skipped() {
                summary.archive_skipped += 1;
            }
        }
        summary
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

pub struct Pipeline<R: CommandRunner> {
    settings: Settings,
    runner: R,
}

impl<R: CommandRunner> Pipeline<R> {
    pub fn new(settings: Settings, runner: R) -> Self {
        Pipeline { settings, runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Builds the shadow command reading the archived `input`; the output
    /// goes next to where the user picked the file.
    pub fn build_command(&self, parts: &SourceParts, input: &Path) -> ShadowCommand {
        ShadowCommand::new(
            self.settings.tool.clone(),
            input.to_path_buf(),
            png_output_path(&parts.dir, &parts.file_name),
        )
        .with_opacity(self.settings.opacity)
        .with_blur_radius(self.settings.blur_radius)
    }

    /// Archives, composites and reports on a single file.
    pub fn process_file(
        &mut self,
        path: &Path,
        observer: &mut dyn BatchObserver,
    ) -> Result<FileReport> {
        let parts = SourceParts::of(path)?;
        let archive = archive_original(path, self.settings.on_collision)
            .with_context(|| format!("Failed to archive {}", path.display()))?;
        let input = archive.archived_path().to_path_buf();

        let command = self.build_command(&parts, &input);
        observer.on_command(&command);
        let tool = self.runner.run(&command);
        info!(
            "event=tool_finished output={} success={}",
            command.output.display(),
            tool.is_success()
        );

        Ok(FileReport {
            source: path.to_path_buf(),
            archive,
            input,
            output: command.output.clone(),
            command: command.display_line(),
            tool,
        })
    }

    /// Processes `paths` in order. Returns one report per path, or the
    /// first file-system error, which halts the batch.
    pub fn run(
        &mut self,
        paths: &[PathBuf],
        observer: &mut dyn BatchObserver,
    ) -> Result<Vec<FileReport>> {
        if paths.is_empty() {
            info!("event=batch_empty");
            return Ok(Vec::new());
        }

        info!(
            "event=batch_start files={} opacity={} tool={} on_collision={}",
            paths.len(),
            self.settings.opacity,
            self.settings.tool,
            self.settings.on_collision
        );
        observer.on_start(paths.len());

        let mut reports = Vec::with_capacity(paths.len());
        for path in paths {
            let report = self.process_file(path, observer)?;
            observer.on_file_done(&report);
            reports.push(report);
        }

        let summary = Summary::of(&reports);
        info!(
            "event=batch_done total={} succeeded={} failed={} archive_skipped={}",
            summary.total, summary.succeeded, summary.failed, summary.archive_skipped
        );
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(tool: ToolStatus, skipped: bool) -> FileReport {
        let archive = if skipped {
            ArchiveOutcome::Skipped {
                existing: PathBuf::from("/d/originals/a.jpg"),
            }
        } else {
            ArchiveOutcome::Moved {
                to: PathBuf::from("/d/originals/a.jpg"),
            }
        };
        FileReport {
            source: PathBuf::from("/d/a.jpg"),
            archive,
            input: PathBuf::from("/d/originals/a.jpg"),
            output: PathBuf::from("/d/a.png"),
            command: String::new(),
            tool,
        }
    }

    #[test]
    fn summary_counts_failures_and_skips() {
        let reports = vec![
            report(ToolStatus::Succeeded, false),
            report(ToolStatus::Failed { code: Some(1) }, true),
            report(
                ToolStatus::LaunchFailed {
                    message: "nope".into(),
                },
                false,
            ),
        ];
        let summary = Summary::of(&reports);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.archive_skipped, 1);
        assert!(!summary.all_succeeded());
    }

    #[test]
    fn empty_batch_summary_is_success() {
        assert!(Summary::of(&[]).all_succeeded());
    }

    #[test]
    fn build_command_uses_settings() {
        let settings = Settings {
            opacity: 90,
            tool: "magick".into(),
            ..Settings::default()
        };
        let pipeline = Pipeline::new(settings, crate::runner::SystemRunner);
        let parts = SourceParts::of(Path::new("/d/pawn.jpeg")).unwrap();
        let cmd = pipeline.build_command(&parts, Path::new("/d/originals/pawn.jpeg"));
        assert_eq!(cmd.program, "magick");
        assert_eq!(cmd.output, PathBuf::from("/d/pawn.png"));
        assert_eq!(cmd.shadow_geometry(), "90x7+0+0");
    }
}
