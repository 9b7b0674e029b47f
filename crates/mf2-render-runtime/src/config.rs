use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::RuntimeResult;

pub const DEFAULT_CONFIG_PATH: &str = "mf2-render.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub default_locale: String,
    /// Locale to JSON bundle path, relative to the config file.
    pub bundles: BTreeMap<String, PathBuf>,
    pub bidi_isolation: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            default_locale: "en".to_string(),
            bundles: BTreeMap::new(),
            bidi_isolation: true,
        }
    }
}

pub fn load_config(path: &Path) -> RuntimeResult<RenderConfig> {
    let contents = fs::read_to_string(path)?;
    let config = toml::from_str(&contents)?;
    Ok(config)
}

pub fn load_config_or_default(path: &Path) -> RuntimeResult<RenderConfig> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(RenderConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::{RenderConfig, load_config_or_default};
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        path.push(format!("mf2_render_{name}_{nanos}.toml"));
        path
    }

    #[test]
    fn uses_default_when_missing() {
        let path = temp_path("missing");
        let config = load_config_or_default(&path).expect("config");
        assert_eq!(config.default_locale, "en");
        assert!(config.bundles.is_empty());
        assert!(config.bidi_isolation);
    }

    #[test]
    fn loads_from_file() {
        let path = temp_path("config");
        let contents = r#"
default_locale = "fr"
bidi_isolation = false

[bundles]
fr = "locales/fr.json"
en-US = "locales/en-US.json"
"#;
        fs::write(&path, contents).expect("write");
        let config = load_config_or_default(&path).expect("config");
        assert_eq!(config.default_locale, "fr");
        assert!(!config.bidi_isolation);
        assert_eq!(
            config.bundles.get("en-US").map(PathBuf::as_path),
            Some(Path::new("locales/en-US.json"))
        );
        fs::remove_file(&path).ok();
    }

    #[test]
    fn partial_files_keep_defaults() {
        let path = temp_path("partial");
        fs::write(&path, "default_locale = \"de\"\n").expect("write");
        let config = load_config_or_default(&path).expect("config");
        assert_eq!(config.default_locale, "de");
        assert!(config.bidi_isolation);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn default_values_are_stable() {
        let config = RenderConfig::default();
        assert_eq!(config.default_locale, "en");
    }
}
