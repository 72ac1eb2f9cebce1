// CODE Language Interpreter Library
//
// Lexer, parser and tree-walking interpreter for CODE, a small statically
// declared teaching language whose programs sit between `BEGIN CODE` and
// `END CODE`.

pub mod ast;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod runner;
pub mod value;

// Re-export commonly used items
pub use ast::{Expr, Program, Stmt};
pub use environment::Environment;
pub use error::{CodeError, ErrorKind, Span};
pub use interpreter::{Config, Interpreter};
pub use lexer::{Lexer, Token, TokenType};
pub use parser::Parser;
pub use value::{DataType, Value};

pub use runner::run;
