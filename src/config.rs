// Settings for a run. Each value has one authoritative default and is
// layered: defaults < config file < environment < command-line flags.

use crate::archive::CollisionPolicy;
use crate::shadow::{DEFAULT_BLUR_RADIUS, DEFAULT_OPACITY, DEFAULT_TOOL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_OPACITY: &str = "SHADOW_BATCH_OPACITY";
pub const ENV_TOOL: &str = "SHADOW_BATCH_TOOL";
pub const MAX_OPACITY: u8 = 100;

const CONFIG_DIR_NAME: &str = "shadow-batch";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid value for {field}: {message}")]
    Invalid { field: String, message: String },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Shadow strength passed to `-shadow`, 0-100.
    pub opacity: u8,
    pub blur_radius: u32,
    /// ImageMagick program name or path.
    pub tool: String,
    pub on_collision: CollisionPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            opacity: DEFAULT_OPACITY,
            blur_radius: DEFAULT_BLUR_RADIUS,
            tool: DEFAULT_TOOL.to_string(),
            on_collision: CollisionPolicy::default(),
        }
    }
}

/// Values supplied on the command line; `None` keeps the lower layer.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub opacity: Option<u8>,
    pub blur_radius: Option<u32>,
    pub tool: Option<String>,
    pub on_collision: Option<CollisionPolicy>,
}

/// `<config_dir>/shadow-batch/config.json`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

impl Settings {
    /// Reads a JSON settings file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Full layering for a run. `config_path` names an explicit file that
    /// must exist; otherwise the default location is used when present.
    pub fn load(config_path: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut settings = match config_path {
            Some(path) => Settings::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.is_file() => Settings::from_file(&path)?,
                _ => Settings::default(),
            },
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        settings.apply_overrides(overrides);
        settings.validate()?;
        Ok(settings)
    }

    /// Applies environment values looked up through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_OPACITY) {
            self.opacity = parse_opacity(&raw).map_err(|message| ConfigError::Invalid {
                field: ENV_OPACITY.to_string(),
                message,
            })?;
        }
        if let Some(tool) = lookup(ENV_TOOL) {
            let tool = tool.trim();
            if !tool.is_empty() {
                self.tool = tool.to_string();
            }
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(opacity) = overrides.opacity {
            self.opacity = opacity;
        }
        if let Some(blur_radius) = overrides.blur_radius {
            self.blur_radius = blur_radius;
        }
        if let Some(tool) = &overrides.tool {
            self.tool = tool.clone();
        }
        if let Some(policy) = overrides.on_collision {
            self.on_collision = policy;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.opacity > MAX_OPACITY {
            return Err(ConfigError::Invalid {
                field: "opacity".to_string(),
                message: format!("{} is above {}", self.opacity, MAX_OPACITY),
            });
        }
        if self.tool.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "tool".to_string(),
                message: "program name cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Parses an opacity in `0..=100`. Shared by the env layer and CLI flag.
pub fn parse_opacity(raw: &str) -> Result<u8, String> {
    let value: u8 = raw
        .trim()
        .parse()
        .map_err(|_| format!("`{}` is not an integer between 0 and {}", raw.trim(), MAX_OPACITY))?;
    if value > MAX_OPACITY {
        return Err(format!("{value} is above {MAX_OPACITY}"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let s = Settings::default();
        assert_eq!(s.opacity, 50);
        assert_eq!(s.blur_radius, 7);
        assert_eq!(s.tool, "convert");
        assert_eq!(s.on_collision, CollisionPolicy::Skip);
    }

    #[test]
    fn file_layer_fills_missing_keys_with_defaults() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{ "opacity": 90, "on_collision": "rename" }"#).unwrap();

        let s = Settings::from_file(&path).unwrap();
        assert_eq!(s.opacity, 90);
        assert_eq!(s.on_collision, CollisionPolicy::Rename);
        assert_eq!(s.tool, "convert");
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{ opacity: ").unwrap();
        assert!(matches!(
            Settings::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn env_then_overrides_take_precedence() {
        let mut s = Settings::default();
        s.apply_env(env(&[(ENV_OPACITY, "80"), (ENV_TOOL, "magick")]))
            .unwrap();
        assert_eq!(s.opacity, 80);
        assert_eq!(s.tool, "magick");

        s.apply_overrides(&Overrides {
            opacity: Some(30),
            ..Overrides::default()
        });
        assert_eq!(s.opacity, 30);
        assert_eq!(s.tool, "magick");
    }

    #[test]
    fn bad_env_opacity_is_rejected() {
        let mut s = Settings::default();
        let err = s.apply_env(env(&[(ENV_OPACITY, "150")])).unwrap_err();
        assert!(err.to_string().contains(ENV_OPACITY));
        let err = s.apply_env(env(&[(ENV_OPACITY, "dark")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn validate_rejects_out_of_range_and_empty_tool() {
        let s = Settings {
            opacity: 101,
            ..Settings::default()
        };
        assert!(s.validate().is_err());

        let s = Settings {
            tool: "  ".to_string(),
            ..Settings::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn explicit_missing_config_is_read_error() {
        let tmp = tempdir().unwrap();
        let err = Settings::load(Some(&tmp.path().join("absent.json")), &Overrides::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
