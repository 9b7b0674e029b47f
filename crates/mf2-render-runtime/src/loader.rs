use std::fs;
use std::path::Path;

use tracing::debug;

use crate::bundle::Bundle;
use crate::composer::ComposerOptions;
use crate::config::RenderConfig;
use crate::error::RuntimeResult;

pub fn load_bundle(locale: &str, path: &Path) -> RuntimeResult<Bundle> {
    let contents = fs::read_to_string(path)?;
    let bundle = Bundle::from_json_str(locale, &contents)?;
    debug!(
        "loaded {} message(s) for {locale} from {}",
        bundle.len(),
        path.display()
    );
    Ok(bundle)
}

/// Loads every bundle named by `config`; relative paths resolve against `base_dir`.
pub fn load_bundles(config: &RenderConfig, base_dir: &Path) -> RuntimeResult<Vec<Bundle>> {
    let mut bundles = Vec::with_capacity(config.bundles.len());
    for (locale, path) in &config.bundles {
        let path = if path.is_absolute() {
            path.clone()
        } else {
            base_dir.join(path)
        };
        bundles.push(load_bundle(locale, &path)?);
    }
    Ok(bundles)
}

pub fn composer_options_from_config(
    config: &RenderConfig,
    base_dir: &Path,
) -> RuntimeResult<ComposerOptions> {
    let bundles = load_bundles(config, base_dir)?;
    Ok(ComposerOptions::new(config.default_locale.clone())
        .with_bundles(bundles)
        .with_bidi_isolation(config.bidi_isolation))
}

#[cfg(test)]
mod tests {
    use super::{composer_options_from_config, load_bundle};
    use crate::{Composer, RenderConfig, RuntimeError};
    use mf2_render_core::Args;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        path.push(format!("mf2_render_{name}_{nanos}"));
        fs::create_dir_all(&path).expect("dir");
        path
    }

    #[test]
    fn builds_composer_from_config() {
        let dir = temp_dir("loader");
        fs::write(dir.join("en.json"), r#"{"hi": "Hi {$name}"}"#).expect("write");
        fs::write(dir.join("fr.json"), r#"{"hi": "Salut {$name}"}"#).expect("write");

        let mut config = RenderConfig {
            bidi_isolation: false,
            ..RenderConfig::default()
        };
        config.bundles.insert("en".to_string(), PathBuf::from("en.json"));
        config.bundles.insert("fr".to_string(), PathBuf::from("fr.json"));

        let options = composer_options_from_config(&config, &dir).expect("options");
        let composer = Composer::new(options).expect("composer");
        let args = Args::new().with("name", "Ada");
        assert_eq!(composer.t("hi", &args), "Hi Ada");
        composer.set_locale("fr");
        assert_eq!(composer.t("hi", &args), "Salut Ada");
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_bundle_file_is_io_error() {
        let dir = temp_dir("loader_missing");
        let err = load_bundle("en", &dir.join("nope.json")).expect_err("should fail");
        assert!(matches!(err, RuntimeError::Io(_)));
        fs::remove_dir_all(&dir).ok();
    }
}
