use serde::{Deserialize, Serialize};

use crate::module::NativeFlags;

/// How Flow syntax is recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowMode {
    /// Parse every file as Flow.
    #[default]
    All,
    /// Only parse as Flow when the file carries an `@flow` pragma, so that
    /// ambiguous syntax falls back to plain JavaScript.
    Detect,
}

/// Options for a single parse.
///
/// Each field maps to exactly one positional flag of the native call; see
/// [`ParserOptions::native_flags`]. Deserializes from the `[parser]` table of
/// `tessera.toml` with every key optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ParserOptions {
    pub flow: FlowMode,
    pub enable_experimental_component_syntax: bool,
    pub enable_experimental_flow_match_syntax: bool,
    /// Emit the raw token list alongside the tree.
    pub tokens: bool,
    /// Accept `return` at the top level of a program.
    pub allow_return_outside_function: bool,
}

impl ParserOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flow(mut self, flow: FlowMode) -> Self {
        self.flow = flow;
        self
    }

    pub fn with_component_syntax(mut self, enabled: bool) -> Self {
        self.enable_experimental_component_syntax = enabled;
        self
    }

    pub fn with_flow_match_syntax(mut self, enabled: bool) -> Self {
        self.enable_experimental_flow_match_syntax = enabled;
        self
    }

    pub fn with_tokens(mut self, enabled: bool) -> Self {
        self.tokens = enabled;
        self
    }

    pub fn with_return_outside_function(mut self, enabled: bool) -> Self {
        self.allow_return_outside_function = enabled;
        self
    }

    /// The positional flags passed to the native `parse` entry point.
    pub fn native_flags(&self) -> NativeFlags {
        NativeFlags::default()
            .with(NativeFlags::DETECT_FLOW, self.flow == FlowMode::Detect)
            .with(NativeFlags::COMPONENT_SYNTAX, self.enable_experimental_component_syntax)
            .with(NativeFlags::FLOW_MATCH_SYNTAX, self.enable_experimental_flow_match_syntax)
            .with(NativeFlags::TOKENS, self.tokens)
            .with(
                NativeFlags::ALLOW_RETURN_OUTSIDE_FUNCTION,
                self.allow_return_outside_function,
            )
    }
}
