//! CLI surface (§6 "CLI", SPEC_FULL.md "Configuration / CLI").

use std::path::PathBuf;

use structopt::StructOpt;

#[derive(Debug, StructOpt, Clone)]
#[structopt(name = "cascadelang", about = "CascadeLang interpreter")]
pub struct Options {
    /// Source file to parse and evaluate.
    #[structopt(parse(from_os_str))]
    pub path: PathBuf,

    /// Raise log verbosity to `debug` for this run, regardless of `RUST_LOG`.
    #[structopt(long = "verbose", help = "Enable verbose logging")]
    pub verbose: bool,

    /// Print the parsed AST to stderr before evaluating.
    #[structopt(long = "dump-ast", help = "Dump the parsed AST before running")]
    pub dump_ast: bool,
}
