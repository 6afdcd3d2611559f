use std::path::PathBuf;

use tessera_bridge::{Parser, ParserModule, ParserOptions};

use super::{current_dir, load_parser, ParserArgs};
use crate::error::{convert_parse_error, CliError};
use crate::io::{display_name, read_source};

/// Parse every file and report syntax errors. Failures that blame the parser
/// module rather than the input stop the run.
pub fn handle_check(files: &[PathBuf], args: &ParserArgs) -> Result<(), CliError> {
    let config = args.resolve_config(&current_dir()?)?;
    let mut parser = load_parser(&config)?;

    let mut failed = 0;
    for file in files {
        let name = display_name(file);
        let result = read_source(file)
            .and_then(|source| check_source(&mut parser, &source, &name, &config.parser));
        match result {
            Ok(nodes) => log::info!("{name}: ok ({nodes} nodes)"),
            Err(error @ (CliError::SyntaxError { .. } | CliError::IoError { .. })) => {
                failed += 1;
                eprintln!("{:?}", miette::Report::new(error));
            }
            Err(error) => return Err(error),
        }
    }

    if failed > 0 {
        return Err(CliError::CheckFailed {
            failed,
            total: files.len(),
        });
    }
    println!("Checked {} file(s)", files.len());
    Ok(())
}

/// Parse one source and return the node count of its tree.
pub fn check_source<M: ParserModule>(
    parser: &mut Parser<M>,
    source: &str,
    name: &str,
    options: &ParserOptions,
) -> Result<usize, CliError> {
    parser
        .parse(source, options)
        .map(|program| program.node_count())
        .map_err(|e| convert_parse_error(e, name, source))
}
