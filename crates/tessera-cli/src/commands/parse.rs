use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use tessera_ast::{Comment, Node, Program, SourceLocation, Token, Value, Visitor};
use tessera_bridge::{Parser, ParserModule, ParserOptions};

use super::{current_dir, load_parser, ParserArgs};
use crate::error::{convert_io_error, convert_parse_error, CliError};
use crate::io::{display_name, read_source};

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// ESTree JSON
    #[default]
    Json,
    /// Indented node outline
    Tree,
}

pub fn handle_parse(
    file: &Path,
    format: OutputFormat,
    pretty: bool,
    tokens: bool,
    args: &ParserArgs,
) -> Result<(), CliError> {
    let mut config = args.resolve_config(&current_dir()?)?;
    config.parser.tokens |= tokens;

    let source = read_source(file)?;
    let mut parser = load_parser(&config)?;
    let output = parse_to_string(
        &mut parser,
        &source,
        &display_name(file),
        &config.parser,
        format,
        pretty,
    )?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(output.as_bytes())
        .map_err(|e| convert_io_error(e, PathBuf::from("<stdout>")))
}

/// Parse `source` and render the tree in `format`.
pub fn parse_to_string<M: ParserModule>(
    parser: &mut Parser<M>,
    source: &str,
    name: &str,
    options: &ParserOptions,
    format: OutputFormat,
    pretty: bool,
) -> Result<String, CliError> {
    let program = parser
        .parse(source, options)
        .map_err(|e| convert_parse_error(e, name, source))?;
    log::info!("{name}: {} nodes", program.node_count());

    let mut output = match format {
        OutputFormat::Json if pretty => serde_json::to_string_pretty(&program)?,
        OutputFormat::Json => serde_json::to_string(&program)?,
        OutputFormat::Tree => render_tree(&program),
    };
    if !output.ends_with('\n') {
        output.push('\n');
    }
    Ok(output)
}

/// One line per node, indented by depth, followed by comments and tokens.
pub fn render_tree(program: &Program) -> String {
    let mut printer = TreePrinter {
        out: String::new(),
        depth: 1,
    };
    let _ = writeln!(printer.out, "Program {}", span(&program.loc));
    // Writing into a String cannot fail.
    let _ = printer.visit_program(program);
    printer.out
}

struct TreePrinter {
    out: String,
    depth: usize,
}

impl Visitor for TreePrinter {
    type Error = std::fmt::Error;

    fn visit_node(&mut self, node: &Node) -> Result<(), Self::Error> {
        write!(
            self.out,
            "{:indent$}{} {}",
            "",
            node.kind.name(),
            span(&node.loc),
            indent = self.depth * 2
        )?;
        for field in &node.fields {
            match &field.value {
                Value::String(Some(s)) => write!(self.out, " {}={s:?}", field.name)?,
                Value::Number(n) => write!(self.out, " {}={n}", field.name)?,
                Value::Boolean(true) => write!(self.out, " {}", field.name)?,
                _ => {}
            }
        }
        self.out.push('\n');

        self.depth += 1;
        let result = tessera_ast::visitor::walk_node(self, node);
        self.depth -= 1;
        result
    }

    fn visit_comment(&mut self, comment: &Comment) -> Result<(), Self::Error> {
        writeln!(
            self.out,
            "{} {} {:?}",
            comment.kind.name(),
            span(&comment.loc),
            comment.value
        )
    }

    fn visit_token(&mut self, token: &Token) -> Result<(), Self::Error> {
        writeln!(
            self.out,
            "{} {} {:?}",
            token.kind.name(),
            span(&token.loc),
            token.value
        )
    }
}

fn span(loc: &SourceLocation) -> String {
    format!(
        "{}:{}-{}:{}",
        loc.start.line, loc.start.column, loc.end.line, loc.end.column
    )
}
