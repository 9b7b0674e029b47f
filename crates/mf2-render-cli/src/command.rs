use std::path::{Path, PathBuf};

use mf2_render_core::{Args, Value};
use mf2_render_runtime::{composer_options_from_config, load_config_or_default};
use mf2_render_view::{Mf2, Mf2Message, Mf2Options};
use tracing::debug;

use crate::error::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Format,
    Parts,
    Render,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandOptions {
    pub command: Command,
    pub key: String,
    pub config_path: PathBuf,
    pub locale: Option<String>,
    pub args: Args,
    pub tag: Option<String>,
}

pub fn run_command(options: &CommandOptions) -> Result<String, CliError> {
    let mf2 = load_mf2(&options.config_path, options.locale.as_deref())?;
    let composer = mf2.global();
    match options.command {
        Command::Format => Ok(composer.t(&options.key, &options.args)),
        Command::Parts => {
            let parts = composer.tp(&options.key, &options.args);
            Ok(serde_json::to_string_pretty(&parts)?)
        }
        Command::Render => {
            let mut message = Mf2Message::new(options.key.as_str()).with_args(options.args.clone());
            if let Some(tag) = &options.tag {
                message = message.with_tag(tag.as_str());
            }
            Ok(message.render_html(&mf2))
        }
    }
}

fn load_mf2(config_path: &Path, locale: Option<&str>) -> Result<Mf2, CliError> {
    let mut config = load_config_or_default(config_path)?;
    if let Some(locale) = locale {
        config.default_locale = locale.to_string();
    }
    let base_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    debug!(
        "loading {} bundle(s) relative to {}",
        config.bundles.len(),
        base_dir.display()
    );
    let composer = composer_options_from_config(&config, &base_dir)?;
    Ok(Mf2::new(Mf2Options::from_composer(composer))?)
}

/// Parses a `--arg` value: JSON scalars and containers keep their type,
/// anything else is taken as a string.
pub fn parse_arg_value(raw: &str) -> Value {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value) => Value::from(value),
        Err(_) => Value::from(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::{Command, CommandOptions, parse_arg_value, run_command};
    use mf2_render_core::{Args, Value};
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        path.push(format!("mf2_render_cli_{name}_{nanos}"));
        fs::create_dir_all(&path).expect("dir");
        path
    }

    fn write_project(dir: &Path) -> PathBuf {
        fs::write(
            dir.join("en.json"),
            r#"{"hi": "Hi {$name}", "terms": "Please {#bold}read{/bold}."}"#,
        )
        .expect("write");
        fs::write(dir.join("fr.json"), r#"{"hi": "Salut {$name}"}"#).expect("write");
        let config = dir.join("mf2-render.toml");
        fs::write(
            &config,
            "default_locale = \"en\"\nbidi_isolation = false\n\n[bundles]\nen = \"en.json\"\nfr = \"fr.json\"\n",
        )
        .expect("write");
        config
    }

    fn options(command: Command, key: &str, config_path: PathBuf) -> CommandOptions {
        CommandOptions {
            command,
            key: key.to_string(),
            config_path,
            locale: None,
            args: Args::new().with("name", "Ada"),
            tag: None,
        }
    }

    #[test]
    fn formats_with_locale_override() {
        let dir = temp_dir("format");
        let config = write_project(&dir);
        let mut opts = options(Command::Format, "hi", config);
        assert_eq!(run_command(&opts).expect("run"), "Hi Ada");
        opts.locale = Some("fr".to_string());
        assert_eq!(run_command(&opts).expect("run"), "Salut Ada");
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn renders_html_with_tag() {
        let dir = temp_dir("render");
        let config = write_project(&dir);
        let mut opts = options(Command::Render, "terms", config);
        opts.tag = Some("p".to_string());
        assert_eq!(
            run_command(&opts).expect("run"),
            "<p>Please <strong>read</strong>.</p>"
        );
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn prints_parts_as_json() {
        let dir = temp_dir("parts");
        let config = write_project(&dir);
        let output = run_command(&options(Command::Parts, "terms", config)).expect("run");
        let parsed: serde_json::Value = serde_json::from_str(&output).expect("json");
        assert_eq!(parsed[0]["type"], "text");
        assert_eq!(parsed[1]["type"], "markup");
        assert_eq!(parsed[1]["kind"], "open");
        assert_eq!(parsed[1]["name"], "bold");
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn parses_typed_arg_values() {
        assert_eq!(parse_arg_value("3"), Value::Num(3.0));
        assert_eq!(parse_arg_value("true"), Value::Bool(true));
        assert_eq!(parse_arg_value("Ada"), Value::from("Ada"));
        assert_eq!(parse_arg_value("\"42\""), Value::from("42"));
    }
}
