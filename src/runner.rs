use crate::ast::Program;
use crate::error::CodeError;
use crate::interpreter::{Config, Interpreter};
use crate::lexer::Lexer;
use crate::parser::Parser;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Exit code for a program that ran to `END CODE`.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code when the source file cannot be read.
pub const EXIT_IO: i32 = 1;

pub const VALID_MESSAGE: &str = "Code is VALID";

/// Lex and parse `source` into a program.
pub fn parse(source: &str) -> Result<Program, CodeError> {
    let mut lexer = Lexer::new(source.to_string());
    let tokens = lexer.scan_tokens()?;
    debug!(tokens = tokens.len(), "lexed");

    let mut parser = Parser::new(tokens);
    let program = parser.parse()?;
    debug!(statements = program.statements.len(), "parsed");
    Ok(program)
}

/// Run `source` on stdin/stdout, reporting any error on stderr. Returns the
/// process exit code.
pub fn run(source: &str, filename: Option<&str>, config: Config) -> i32 {
    let mut interpreter = Interpreter::stdio(config);
    run_with(source, filename, &mut interpreter)
}

/// Run `source` with an existing interpreter, so callers choose the streams.
pub fn run_with<R: BufRead, W: Write>(
    source: &str,
    filename: Option<&str>,
    interpreter: &mut Interpreter<R, W>,
) -> i32 {
    let program = match parse(source) {
        Ok(program) => program,
        Err(error) => {
            error.report(source, filename);
            return error.exit_code();
        }
    };

    if let Err(error) = interpreter.execute_program(&program) {
        error.report(source, filename);
        return error.exit_code();
    }

    let at_line_start = interpreter.at_line_start();
    if let Err(error) = write_confirmation(interpreter.output_mut(), at_line_start) {
        eprintln!("Error writing output: {}", error);
        return EXIT_IO;
    }

    EXIT_SUCCESS
}

fn write_confirmation<W: Write>(output: &mut W, at_line_start: bool) -> io::Result<()> {
    if !at_line_start {
        writeln!(output)?;
    }
    writeln!(output, "{}", VALID_MESSAGE)?;
    output.flush()
}
