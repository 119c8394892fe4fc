use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const DEFAULT_EXTENSION: &str = "kwd";
const DEFAULT_EFFECTS_PATH: &str = "Data/editor/Effects.kwd";
const DEFAULT_EFFECT_ELEMENTS_PATH: &str = "Data/editor/EffectElements.kwd";

/// Path handling options for [`crate::archive::ArchiveLoader`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Extension appended to path-table entries that have none
    pub default_extension: String,
    /// Add the effect catalogs when the level lists no globals file
    pub inject_default_paths: bool,
    pub effects_path: String,
    pub effect_elements_path: String,
    /// Match path components ignoring ASCII case when the exact path is absent
    pub case_insensitive_paths: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            default_extension: DEFAULT_EXTENSION.to_string(),
            inject_default_paths: true,
            effects_path: DEFAULT_EFFECTS_PATH.to_string(),
            effect_elements_path: DEFAULT_EFFECT_ELEMENTS_PATH.to_string(),
            case_insensitive_paths: true,
        }
    }
}

impl LoaderConfig {
    /// Read a JSON config; missing keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = LoaderConfig::from_json(r#"{ "default_extension": "dat" }"#).unwrap();
        assert_eq!(config.default_extension, "dat");
        assert!(config.inject_default_paths);
        assert_eq!(config.effects_path, DEFAULT_EFFECTS_PATH);
    }

    #[test]
    fn test_bad_json_is_config_error() {
        let err = LoaderConfig::from_json("{ nope").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loader.json");
        std::fs::write(&path, r#"{ "case_insensitive_paths": false }"#).unwrap();
        let config = LoaderConfig::from_json_file(&path).unwrap();
        assert!(!config.case_insensitive_paths);

        let missing = LoaderConfig::from_json_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(missing, Error::Io { .. }));
    }
}
