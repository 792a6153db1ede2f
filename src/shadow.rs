// Command builder for the ImageMagick drop-shadow composite.
//
// The invocation is kept as a program plus argument vector and is never
// handed to a shell. `display_line` renders the shell-quoted form only so
// the user can see (and copy) what is being run.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default ImageMagick entry point (IM6 name; IM7 ships it as `magick`).
pub const DEFAULT_TOOL: &str = "convert";
pub const DEFAULT_OPACITY: u8 = 50;
pub const DEFAULT_BLUR_RADIUS: u32 = 7;

/// One shadow-compositing run: read `input`, write `output` as PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowCommand {
    pub program: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub opacity: u8,
    pub blur_radius: u32,
}

/// `dir/<stem>.png` for a picked file `dir/<stem>.<ext>`.
pub fn png_output_path(dir: &Path, file_name: &OsStr) -> PathBuf {
    let mut name = Path::new(file_name)
        .file_stem()
        .unwrap_or(file_name)
        .to_os_string();
    name.push(".png");
    dir.join(name)
}

impl ShadowCommand {
    pub fn new(program: impl Into<String>, input: PathBuf, output: PathBuf) -> Self {
        ShadowCommand {
            program: program.into(),
            input,
            output,
            opacity: DEFAULT_OPACITY,
            blur_radius: DEFAULT_BLUR_RADIUS,
        }
    }

    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_blur_radius(mut self, blur_radius: u32) -> Self {
        self.blur_radius = blur_radius;
        self
    }

    /// `-shadow` geometry: `<opacity>x<sigma>+<x>+<y>`, zero offset.
    pub fn shadow_geometry(&self) -> String {
        format!("{}x{}+0+0", self.opacity, self.blur_radius)
    }

    /// Arguments in order, without the program name.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::with_capacity(15);
        args.push(self.input.clone().into_os_string());
        for arg in [
            "(",
            "+clone",
            "-background",
            "black",
            "-shadow",
        ] {
            args.push(arg.into());
        }
        args.push(self.shadow_geometry().into());
        for arg in [
            ")",
            "+swap",
            "-background",
            "none",
            "-layers",
            "merge",
            "+repage",
        ] {
            args.push(arg.into());
        }
        args.push(self.output.clone().into_os_string());
        args
    }

    /// Shell-style rendering for the audit print. Paths are double-quoted
    /// and parentheses escaped, matching what a user would type.
    pub fn display_line(&self) -> String {
        format!(
            "{} \"{}\" \\( +clone -background black -shadow {} \\) +swap -background none -layers merge +repage \"{}\"",
            self.program,
            self.input.display(),
            self.shadow_geometry(),
            self.output.display()
        )
    }
}

impl fmt::Display for ShadowCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_line())
    }
}
