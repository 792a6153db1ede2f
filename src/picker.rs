// Path collection: where the batch's file list comes from.

use log::debug;
use std::path::PathBuf;

/// Supplies the ordered list of files for one batch. An empty list means
/// the user cancelled or picked nothing.
pub trait PathSource {
    fn collect(&mut self) -> Vec<PathBuf>;
}

/// Native multi-select dialog. Blocks until the user confirms or cancels.
#[derive(Debug, Clone)]
pub struct DialogPicker {
    title: String,
}

impl Default for DialogPicker {
    fn default() -> Self {
        DialogPicker {
            title: "Select images to add shadows to".to_string(),
        }
    }
}

impl PathSource for DialogPicker {
    fn collect(&mut self) -> Vec<PathBuf> {
        let picked = rfd::FileDialog::new()
            .set_title(&self.title)
            .pick_files()
            .unwrap_or_default();
        debug!("event=dialog_closed picked={}", picked.len());
        picked
    }
}

/// Paths given up front, e.g. on the command line. Yields them once.
#[derive(Debug, Default, Clone)]
pub struct FixedPaths {
    paths: Vec<PathBuf>,
}

impl FixedPaths {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        FixedPaths { paths }
    }
}

impl PathSource for FixedPaths {
    fn collect(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.paths)
    }
}
