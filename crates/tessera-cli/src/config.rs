use std::path::{Path, PathBuf};

use miette::{NamedSource, SourceSpan};
use serde::{Deserialize, Serialize};
use tessera_bridge::wasm::{ExportNames, WasmRuntimeConfig};
use tessera_bridge::ParserOptions;

use crate::error::{convert_io_error, CliError};
use crate::utils::find_config_file;

pub const CONFIG_FILE: &str = "tessera.toml";

/// Contents of `tessera.toml`.
///
/// ```toml
/// module = "build/hermes-parser.wasm"
///
/// [parser]
/// flow = "detect"
/// tokens = true
///
/// [runtime]
/// max-memory-pages = 4096
/// fuel = 50000000
///
/// [exports]
/// parse = "hermesParse"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
    /// Path to the parser module. Relative paths are resolved against the
    /// directory holding the configuration file.
    pub module: Option<PathBuf>,
    pub parser: ParserOptions,
    pub runtime: WasmRuntimeConfig,
    pub exports: ExportNames,
}

impl Config {
    pub fn from_toml(contents: &str, path: &Path) -> Result<Self, CliError> {
        let mut config: Config = toml::from_str(contents).map_err(|e| CliError::ConfigError {
            path: path.to_path_buf(),
            message: e.message().to_string(),
            src: NamedSource::new(path.display().to_string(), contents.to_string()),
            span: e.span().map(SourceSpan::from),
        })?;

        if let (Some(module), Some(dir)) = (config.module.as_mut(), path.parent()) {
            if module.is_relative() {
                *module = dir.join(&*module);
            }
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, CliError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| convert_io_error(e, path.to_path_buf()))?;
        let config = Self::from_toml(&contents, path)?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `explicit` if given, otherwise the nearest `tessera.toml` above
    /// `start`, otherwise the defaults.
    pub fn resolve(explicit: Option<&Path>, start: &Path) -> Result<Self, CliError> {
        match explicit {
            Some(path) => Self::load(path),
            None => match find_config_file(start) {
                Some(path) => Self::load(&path),
                None => {
                    log::debug!("no {CONFIG_FILE} found above {}", start.display());
                    Ok(Self::default())
                }
            },
        }
    }
}
