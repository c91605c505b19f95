pub mod ast;
pub mod ast_printer;
pub mod class;
pub mod diag;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;

use crate::diag::Diagnostics;
use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;

/// Run the full pipeline (scan → parse → resolve → interpret) over `source`
/// with the given interpreter.  Static errors end up in `diag` and stop the
/// run before evaluation; a runtime error is returned to the caller.
pub fn run(source: &[u8], interpreter: &mut Interpreter, diag: &mut Diagnostics) -> Result<()> {
    let tokens = scanner::scan(source, diag);

    let statements = Parser::new(&tokens, diag).parse();

    if diag.had_error() {
        return Ok(()); // diagnostics already collected; nothing to execute
    }

    Resolver::new(interpreter, diag).resolve(&statements);

    if diag.had_error() {
        return Ok(());
    }

    interpreter.interpret(&statements)
}
