use std::path::PathBuf;

use clap::Parser;
use clap_verbosity_flag::Verbosity;

mod commands;
mod config;
mod error;
mod io;
mod utils;

use commands::parse::OutputFormat;
use commands::ParserArgs;

#[derive(Parser, Debug)]
#[command(name = "tessera")]
#[command(about = "Parse JavaScript and Flow through a WASM parser module", long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Command,

    #[command(flatten)]
    verbose: Verbosity,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Parse a file and print its syntax tree
    Parse {
        /// Source file, or - for standard input
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,
        /// Include the raw token list
        #[arg(short, long)]
        tokens: bool,
        #[command(flatten)]
        parser: ParserArgs,
    },

    /// Check files for syntax errors
    Check {
        /// Source files to check
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        parser: ParserArgs,
    },
}

fn main() -> miette::Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    match args.command {
        Command::Parse {
            file,
            format,
            pretty,
            tokens,
            parser,
        } => commands::parse::handle_parse(&file, format, pretty, tokens, &parser)?,
        Command::Check { files, parser } => commands::check::handle_check(&files, &parser)?,
    }
    Ok(())
}
