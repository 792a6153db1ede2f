// Entrypoint for the shadow batch tool.
// - Parses flags, loads settings and starts logging.
// - Collects paths (dialog or arguments) and hands them to the pipeline.
// - Exits non-zero when any file failed so scripts can tell.

use anyhow::{anyhow, Result};
use clap::Parser;
use shadow_batch::config::{parse_opacity, Overrides};
use shadow_batch::picker::{DialogPicker, FixedPaths, PathSource};
use shadow_batch::pipeline::Summary;
use shadow_batch::{logging, ui, CollisionPolicy, Pipeline, Settings, SystemRunner};
use std::path::PathBuf;

/// Archive images into `originals/` and write drop-shadowed PNGs in their place.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Images to process. Opens a file picker when omitted.
    paths: Vec<PathBuf>,

    /// Shadow opacity, 0-100 (default 50)
    #[arg(long, value_parser = parse_opacity)]
    opacity: Option<u8>,

    /// Shadow blur radius in pixels (default 7)
    #[arg(long)]
    blur: Option<u32>,

    /// ImageMagick program to run, e.g. `convert` or `magick`
    #[arg(long)]
    tool: Option<String>,

    /// What to do when originals/ already holds a file of the same name
    #[arg(long, value_parser = parse_policy)]
    on_collision: Option<CollisionPolicy>,

    /// Settings file (JSON). Defaults to <config dir>/shadow-batch/config.json
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write a JSON report of every file to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Do not ask for confirmation after picking files
    #[arg(short, long)]
    yes: bool,

    /// Log level: trace, debug, info, warn, error
    #[arg(long)]
    log_level: Option<String>,
}

fn parse_policy(raw: &str) -> Result<CollisionPolicy, String> {
    raw.parse()
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = logging::resolve_level(args.log_level.as_deref());
    logging::init_logging(&level).map_err(|e| anyhow!(e))?;

    let overrides = Overrides {
        opacity: args.opacity,
        blur_radius: args.blur,
        tool: args.tool.clone(),
        on_collision: args.on_collision,
    };
    let settings = Settings::load(args.config.as_deref(), &overrides)?;

    // Paths on the command line skip the dialog and the confirmation.
    let from_cli = !args.paths.is_empty();
    let paths = if from_cli {
        FixedPaths::new(args.paths.clone()).collect()
    } else {
        DialogPicker::default().collect()
    };

    if paths.is_empty() {
        println!("No files selected.");
        return Ok(());
    }
    if !from_cli && !args.yes && !ui::confirm_batch(&paths, settings.opacity)? {
        println!("Cancelled.");
        return Ok(());
    }

    let mut pipeline = Pipeline::new(settings, SystemRunner);
    let reports = {
        let mut progress = ui::ProgressObserver::new()?;
        pipeline.run(&paths, &mut progress)?
    };

    if let Some(report_path) = &args.report {
        ui::write_report(report_path, &reports)?;
    }

    let summary = Summary::of(&reports);
    println!("{}", ui::format_summary(&summary));
    if !summary.all_succeeded() {
        std::process::exit(1);
    }
    Ok(())
}
