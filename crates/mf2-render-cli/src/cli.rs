use std::path::PathBuf;

use mf2_render_core::Args;
use mf2_render_runtime::DEFAULT_CONFIG_PATH;
use thiserror::Error;

use crate::command::{Command, CommandOptions, parse_arg_value, run_command};
use crate::error::CliError;

#[derive(Debug, Error)]
pub enum CliAppError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Command(#[from] CliError),
}

pub fn run() -> Result<String, CliAppError> {
    let options = parse_options(std::env::args().skip(1).collect())?;
    Ok(run_command(&options)?)
}

fn parse_options(args: Vec<String>) -> Result<CommandOptions, CliAppError> {
    let mut iter = args.into_iter();
    let command = match iter.next().as_deref() {
        Some("format") => Command::Format,
        Some("parts") => Command::Parts,
        Some("render") => Command::Render,
        _ => return Err(CliAppError::Usage(usage())),
    };

    let mut key = None;
    let mut config_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut locale = None;
    let mut message_args = Args::new();
    let mut tag = None;
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => config_path = PathBuf::from(next_value("--config", &mut iter)?),
            "--locale" => locale = Some(next_value("--locale", &mut iter)?),
            "--tag" => tag = Some(next_value("--tag", &mut iter)?),
            "--arg" => {
                let pair = next_value("--arg", &mut iter)?;
                let (name, value) = pair.split_once('=').ok_or_else(|| {
                    CliAppError::Usage(format!("--arg expects name=value\n\n{}", usage()))
                })?;
                message_args.insert(name, parse_arg_value(value));
            }
            "--help" | "-h" => return Err(CliAppError::Usage(usage())),
            flag if flag.starts_with("--") => return Err(CliAppError::Usage(usage())),
            _ if key.is_none() => key = Some(arg.clone()),
            _ => return Err(CliAppError::Usage(usage())),
        }
    }

    let key = key.ok_or_else(|| CliAppError::Usage(usage()))?;
    if tag.is_some() && command != Command::Render {
        return Err(CliAppError::Usage(format!("--tag only applies to render\n\n{}", usage())));
    }
    Ok(CommandOptions {
        command,
        key,
        config_path,
        locale,
        args: message_args,
        tag,
    })
}

fn next_value(flag: &str, iter: &mut impl Iterator<Item = String>) -> Result<String, CliAppError> {
    iter.next()
        .ok_or_else(|| CliAppError::Usage(format!("{flag} requires a value\n\n{}", usage())))
}

fn usage() -> String {
    "usage: mf2-render format [--config <path>] [--locale <tag>] [--arg <name=value>...] <key>\n       mf2-render parts [--config <path>] [--locale <tag>] [--arg <name=value>...] <key>\n       mf2-render render [--config <path>] [--locale <tag>] [--arg <name=value>...] [--tag <name>] <key>".to_string()
}
