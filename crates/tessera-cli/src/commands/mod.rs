pub mod check;
pub mod parse;

use std::path::{Path, PathBuf};

use tessera_bridge::wasm::{WasmParserModule, WasmRuntime};
use tessera_bridge::{FlowMode, Parser};

use crate::config::Config;
use crate::error::CliError;

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowArg {
    /// Parse every file as Flow
    All,
    /// Only parse files with an @flow pragma as Flow
    Detect,
}

impl From<FlowArg> for FlowMode {
    fn from(arg: FlowArg) -> Self {
        match arg {
            FlowArg::All => FlowMode::All,
            FlowArg::Detect => FlowMode::Detect,
        }
    }
}

/// Options shared by every command that runs the parser. Anything given
/// here overrides `tessera.toml`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ParserArgs {
    /// Parser module (.wasm, or .wat text)
    #[arg(short, long, value_name = "PATH")]
    pub module: Option<PathBuf>,
    /// Configuration file (defaults to the nearest tessera.toml)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// How Flow syntax is recognised
    #[arg(long, value_enum, value_name = "MODE")]
    pub flow: Option<FlowArg>,
    /// Enable experimental component syntax
    #[arg(long)]
    pub component_syntax: bool,
    /// Enable experimental Flow match syntax
    #[arg(long)]
    pub flow_match_syntax: bool,
    /// Accept `return` at the top level
    #[arg(long)]
    pub allow_return_outside_function: bool,
    /// Execution budget for each call into the module
    #[arg(long, value_name = "UNITS")]
    pub fuel: Option<u64>,
}

impl ParserArgs {
    /// The configuration for a run started in `start`, with command line
    /// overrides applied.
    pub fn resolve_config(&self, start: &Path) -> Result<Config, CliError> {
        let config = Config::resolve(self.config.as_deref(), start)?;
        Ok(self.apply(config))
    }

    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(module) = &self.module {
            config.module = Some(module.clone());
        }
        if let Some(flow) = self.flow {
            config.parser.flow = flow.into();
        }
        config.parser.enable_experimental_component_syntax |= self.component_syntax;
        config.parser.enable_experimental_flow_match_syntax |= self.flow_match_syntax;
        config.parser.allow_return_outside_function |= self.allow_return_outside_function;
        if self.fuel.is_some() {
            config.runtime.fuel = self.fuel;
        }
        config
    }
}

/// Compile and instantiate the configured parser module.
pub fn load_parser(config: &Config) -> Result<Parser<WasmParserModule>, CliError> {
    let path = config.module.as_deref().ok_or(CliError::NoModule)?;
    let runtime = WasmRuntime::new(config.runtime.clone())?;
    let compiled = runtime
        .compile_file(path)?
        .with_exports(config.exports.clone());
    let module = compiled.instantiate()?;
    log::debug!("instantiated parser module {}", path.display());
    Ok(Parser::new(module))
}

pub fn current_dir() -> Result<PathBuf, CliError> {
    std::env::current_dir().map_err(|e| CliError::IoError {
        path: PathBuf::from("."),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_the_file() {
        let mut config = Config::default();
        config.parser.tokens = true;
        config.runtime.fuel = Some(10);

        let args = ParserArgs {
            module: Some(PathBuf::from("parser.wasm")),
            flow: Some(FlowArg::Detect),
            component_syntax: true,
            ..ParserArgs::default()
        };
        let config = args.apply(config);
        assert_eq!(config.module, Some(PathBuf::from("parser.wasm")));
        assert_eq!(config.parser.flow, FlowMode::Detect);
        assert!(config.parser.enable_experimental_component_syntax);
        assert!(!config.parser.enable_experimental_flow_match_syntax);
        assert!(config.parser.tokens);
        assert_eq!(config.runtime.fuel, Some(10));
    }

    #[test]
    fn missing_module_is_reported() {
        assert!(matches!(load_parser(&Config::default()), Err(CliError::NoModule)));
    }
}
