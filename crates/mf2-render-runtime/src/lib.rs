#![forbid(unsafe_code)]

mod bundle;
mod composer;
mod config;
mod error;
mod loader;

pub use crate::bundle::Bundle;
pub use crate::composer::{Composer, ComposerOptions, MessageResolution};
pub use crate::config::{DEFAULT_CONFIG_PATH, RenderConfig, load_config, load_config_or_default};
pub use crate::error::{RuntimeError, RuntimeResult};
pub use crate::loader::{composer_options_from_config, load_bundle, load_bundles};
