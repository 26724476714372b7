//! Engine configuration, read from a JSON file. Every field has a default, so an empty
//! object (or a partial one) is a valid configuration.

use crate::compiler::DEFAULT_COMMENT_MARKER;
use crate::error::ConfigError;
use crate::session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub catalog: CatalogConfig,
    pub compiler: CompilerConfig,
    pub session: SessionConfig,
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

/// Where the block catalog and its mods live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: PathBuf,
    pub mods_dir: PathBuf,
    pub allow_mods: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("blocks_config.json"),
            mods_dir: PathBuf::from("mods"),
            allow_mods: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub indent_width: usize,
    /// Overrides `indent_width`.
    pub use_tabs: bool,
    pub comment_marker: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            indent_width: 4,
            use_tabs: false,
            comment_marker: DEFAULT_COMMENT_MARKER.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::EngineRoots;

    #[test]
    fn empty_object_yields_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config.catalog, CatalogConfig::default());
        assert_eq!(config.compiler.indent_width, 4);
        assert_eq!(config.session.interpreter.args, vec!["-u".to_string()]);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = EngineConfig::from_json(
            r#"{
                "catalog": { "allow_mods": false },
                "compiler": { "use_tabs": true },
                "session": {
                    "interpreter": { "candidates": ["python3"] },
                    "roots": { "app_root": "/opt/turtcd", "projects_dir": "/opt/turtcd/projects",
                               "compiled_dir": "/opt/turtcd/compiled", "source_dir": "/opt/turtcd/source" }
                }
            }"#,
        )
        .unwrap();

        assert!(!config.catalog.allow_mods);
        assert_eq!(config.catalog.mods_dir, PathBuf::from("mods"));
        assert!(config.compiler.use_tabs);
        assert_eq!(config.compiler.comment_marker, "# ");
        assert_eq!(config.session.interpreter.candidates, vec!["python3".to_string()]);
        assert_eq!(config.session.roots, EngineRoots::from_app_root("/opt/turtcd"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            EngineConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
