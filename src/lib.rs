pub mod ast;
pub mod cli;
pub mod error;
pub mod heap;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod registry;
pub mod value;

pub use error::{CascadeError, Location};
pub use heap::{Heap, ObjectId};
pub use interpreter::Interpreter;
pub use value::Value;

/// Parses and evaluates a complete CascadeLang source string, printing
/// `print` output to stdout as a side effect. Returns an error describing
/// the first lex, parse, or runtime failure encountered.
pub fn run(source: &str) -> Result<(), CascadeError> {
    let tokens = lexer::lex(source)?;
    let program = parser::Parser::new(tokens).parse_program()?;
    let mut interp = Interpreter::new();
    interp.run(&program)?;
    Ok(())
}
