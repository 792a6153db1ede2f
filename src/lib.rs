// Library root
// -----------
// This crate exposes the pieces of the shadow batch tool. The binary
// (`main.rs`) wires them together for one run.
//
// Module responsibilities:
// - `picker`: collects the paths to process, from the native dialog or
//   from the command line.
// - `archive`: moves each original into a sibling `originals` folder.
// - `shadow`: builds the ImageMagick invocation for one file.
// - `runner`: executes that invocation and reports the tool's status.
// - `pipeline`: drives the steps above, one file at a time.
// - `config`: layered settings (defaults, config file, env, CLI).
// - `logging`: stderr logger bootstrap.
// - `ui`: confirmation prompt, progress bar and summary.
pub mod archive;
pub mod config;
pub mod logging;
pub mod picker;
pub mod pipeline;
pub mod runner;
pub mod shadow;
pub mod ui;

pub use archive::{ArchiveError, ArchiveOutcome, CollisionPolicy};
pub use config::{ConfigError, Settings};
pub use pipeline::{FileReport, Pipeline};
pub use runner::{CommandRunner, SystemRunner, ToolStatus};
pub use shadow::ShadowCommand;
