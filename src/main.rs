use std::fs;
use std::process::exit;

use structopt::StructOpt;

use cascadelang::cli::Options;
use cascadelang::{lexer, parser, CascadeError, Interpreter};

fn main() {
    let opts = Options::from_args();

    let level = if opts.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(err) = run(&opts) {
        eprintln!("{}", err);
        exit(1);
    }
}

fn run(opts: &Options) -> Result<(), CascadeError> {
    let source = fs::read_to_string(&opts.path).map_err(|e| {
        CascadeError::lex(format!("cannot read {}: {}", opts.path.display(), e), Default::default())
    })?;

    let tokens = lexer::lex(&source)?;
    let program = parser::Parser::new(tokens).parse_program()?;

    if opts.dump_ast {
        eprintln!("{:#?}", program);
    }

    let mut interp = Interpreter::new();
    interp.run(&program)
}
