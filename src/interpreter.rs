use crate::ast::{Declarator, Expr, Name, Program, Stmt, SwitchCase};
use crate::environment::{EnvError, Environment};
use crate::error::{CodeError, Span};
use crate::evaluator::{evaluate, variable_error};
use crate::value::{DataType, Value};
use std::io::{self, BufRead, Write};
use tracing::{debug, trace, warn};

pub const DEFAULT_MAX_LOOP_ITERATIONS: usize = 1000;

/// Runtime settings for one interpreter.
#[derive(Debug, Clone)]
pub struct Config {
    /// A WHILE body may run this many times; one more is reported as a
    /// possible infinite loop.
    pub max_loop_iterations: usize,
    /// Print `Enter value for <name>: ` before each SCAN read.
    pub scan_prompts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_loop_iterations: DEFAULT_MAX_LOOP_ITERATIONS,
            scan_prompts: true,
        }
    }
}

/// Executes a parsed program against one environment, reading SCAN input
/// from `input` and writing DISPLAY output to `output`.
pub struct Interpreter<R, W> {
    environment: Environment,
    input: R,
    output: W,
    config: Config,
    warnings: Vec<CodeError>,
    at_line_start: bool,
}

impl Interpreter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio(config: Config) -> Self {
        Interpreter::new(io::stdin().lock(), io::stdout(), config)
    }
}

impl<R: BufRead, W: Write> Interpreter<R, W> {
    pub fn new(input: R, output: W, config: Config) -> Self {
        Self {
            environment: Environment::new(),
            input,
            output,
            config,
            warnings: Vec::new(),
            at_line_start: true,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Recoverable errors reported so far, in the order they occurred.
    pub fn warnings(&self) -> &[CodeError] {
        &self.warnings
    }

    pub fn output_mut(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Whether everything written so far ended with a newline.
    pub fn at_line_start(&self) -> bool {
        self.at_line_start
    }

    /// Checks the `BEGIN CODE` / `END CODE` envelope, then runs every
    /// top-level statement. Stops at the first fatal error.
    pub fn execute_program(&mut self, program: &Program) -> Result<(), CodeError> {
        if !program.has_begin || !program.has_end {
            return Err(CodeError::structure_error(
                program.span.clone(),
                "Code must start with 'BEGIN CODE' and end with 'END CODE'.".to_string(),
            )
            .with_help("Wrap the whole program between 'BEGIN CODE' and 'END CODE' lines."));
        }

        let result = self.execute_block(&program.statements);
        // Flushed on every path so output precedes any error report.
        let flushed = self.output.flush().map_err(|e| io_error(&program.span, e));
        result.and(flushed)
    }

    fn execute_block(&mut self, statements: &[Stmt]) -> Result<(), CodeError> {
        for statement in statements {
            self.execute_statement(statement)?;
        }
        Ok(())
    }

    pub fn execute_statement(&mut self, stmt: &Stmt) -> Result<(), CodeError> {
        trace!(span = ?stmt.span(), "execute statement");

        match stmt {
            Stmt::Declaration {
                data_type,
                type_span,
                declarators,
                ..
            } => {
                let data_type = DataType::from_keyword(data_type).ok_or_else(|| {
                    CodeError::declaration_error(
                        type_span.clone(),
                        format!("Invalid data type '{}'", data_type),
                    )
                    .with_help("Valid types are INT, FLOAT, CHAR, BOOL and STRING.")
                })?;

                for declarator in declarators {
                    self.declare(data_type, declarator)?;
                }
                Ok(())
            }
            Stmt::Assignment { targets, value, .. } => {
                let value = evaluate(value, &self.environment)?;
                for target in targets {
                    self.environment
                        .assign(&target.name, value.clone())
                        .map_err(|error| variable_error(error, &target.span))?;
                }
                Ok(())
            }
            Stmt::Display { expr, span } => {
                let value = evaluate(expr, &self.environment)?;
                self.write(&value.to_string(), span)
            }
            Stmt::Scan { targets, .. } => {
                for target in targets {
                    self.scan(target)?;
                }
                Ok(())
            }
            Stmt::If {
                branches,
                else_branch,
                ..
            } => {
                for (index, branch) in branches.iter().enumerate() {
                    if self.condition(&branch.condition, "IF")? {
                        debug!(branch = index, "IF branch taken");
                        return self.execute_block(&branch.body);
                    }
                }
                if let Some(else_body) = else_branch {
                    debug!("ELSE branch taken");
                    self.execute_block(else_body)?;
                }
                Ok(())
            }
            Stmt::While {
                condition,
                body,
                span,
            } => {
                let mut iterations = 0;
                while self.condition(condition, "WHILE")? {
                    iterations += 1;
                    if iterations > self.config.max_loop_iterations {
                        return Err(CodeError::loop_limit(
                            span.clone(),
                            self.config.max_loop_iterations,
                        ));
                    }
                    self.execute_block(body)?;
                }
                debug!(iterations, "WHILE finished");
                Ok(())
            }
            Stmt::Switch {
                scrutinee,
                cases,
                default,
                ..
            } => self.execute_switch(scrutinee, cases, default.as_deref()),
        }
    }

    fn declare(&mut self, data_type: DataType, declarator: &Declarator) -> Result<(), CodeError> {
        let Declarator { name, initializer } = declarator;

        // Redeclaration is reported before the initializer is evaluated.
        if self.environment.is_declared(&name.name) {
            return Err(variable_error(
                EnvError::Redeclared(name.name.clone()),
                &name.span,
            ));
        }

        let value = match initializer {
            Some(expr) => {
                let value = evaluate(expr, &self.environment)?;
                match value.clone().coerce(data_type) {
                    Ok(converted) => Some(converted),
                    Err(error) => {
                        self.recoverable(CodeError::conversion_error(
                            expr.span().clone(),
                            format!(
                                "Cannot assign {} to {} variable '{}': {}",
                                value.type_name(),
                                data_type,
                                name.name,
                                error
                            ),
                        ))?;
                        Some(value)
                    }
                }
            }
            None => None,
        };

        debug!(name = %name.name, %data_type, ?value, "declare");
        self.environment
            .declare(&name.name, data_type, value)
            .map_err(|error| variable_error(error, &name.span))
    }

    fn scan(&mut self, target: &Name) -> Result<(), CodeError> {
        let data_type = self
            .environment
            .type_of(&target.name)
            .map_err(|error| variable_error(error, &target.span))?;

        if self.config.scan_prompts {
            self.write(&format!("Enter value for {}: ", target.name), &target.span)?;
            self.output
                .flush()
                .map_err(|e| io_error(&target.span, e))?;
        }

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| io_error(&target.span, e))?;
        if read == 0 {
            return Err(CodeError::runtime_error(
                target.span.clone(),
                format!("Unexpected end of input while scanning '{}'", target.name),
            ));
        }
        // The echoed newline ends the prompt line.
        if self.config.scan_prompts {
            self.at_line_start = true;
        }

        let text = line.trim();
        debug!(name = %target.name, %data_type, input = text, "scan");

        match parse_input(text, data_type) {
            Some(value) => self
                .environment
                .assign(&target.name, value)
                .map_err(|error| variable_error(error, &target.span)),
            None => self.recoverable(CodeError::input_error(
                target.span.clone(),
                format!(
                    "Invalid input '{}' for {} variable '{}'",
                    text, data_type, target.name
                ),
            )),
        }
    }

    fn execute_switch(
        &mut self,
        scrutinee: &Expr,
        cases: &[SwitchCase],
        default: Option<&[Stmt]>,
    ) -> Result<(), CodeError> {
        let subject = evaluate(scrutinee, &self.environment)?;

        for (index, case) in cases.iter().enumerate() {
            let candidate = evaluate(&case.value, &self.environment)?;
            if candidate.data_type() != subject.data_type() {
                return Err(CodeError::runtime_error_with_help(
                    case.value.span().clone(),
                    format!(
                        "SWITCH type mismatch: case is {} but the switch value is {}",
                        candidate.type_name(),
                        subject.type_name()
                    ),
                    "Every CASE value must have the same type as the SWITCH expression.".to_string(),
                ));
            }
            if candidate == subject {
                debug!(case = index, "SWITCH case matched");
                return self.execute_block(&case.body);
            }
        }

        if let Some(default_body) = default {
            debug!("SWITCH default taken");
            self.execute_block(default_body)?;
        }
        Ok(())
    }

    fn condition(&mut self, expr: &Expr, keyword: &str) -> Result<bool, CodeError> {
        match evaluate(expr, &self.environment)? {
            Value::Bool(b) => Ok(b),
            other => Err(CodeError::runtime_error(
                expr.span().clone(),
                format!("{} condition must be BOOL, got {}", keyword, other.type_name()),
            )),
        }
    }

    /// Report a recoverable error on the output stream and keep going.
    fn recoverable(&mut self, error: CodeError) -> Result<(), CodeError> {
        warn!(kind = ?error.kind, "{}", error.message);
        let span = error.span.clone();
        let mut line = String::new();
        if !self.at_line_start {
            line.push('\n');
        }
        line.push_str(&error.message);
        line.push('\n');
        self.warnings.push(error);
        self.write(&line, &span)
    }

    fn write(&mut self, text: &str, span: &Span) -> Result<(), CodeError> {
        if text.is_empty() {
            return Ok(());
        }
        self.output
            .write_all(text.as_bytes())
            .map_err(|e| io_error(span, e))?;
        self.at_line_start = text.ends_with('\n');
        Ok(())
    }
}

/// Parse one SCAN line as `data_type`. Numeric and text types only accept
/// input that is not more naturally another kind: `5` is an INT, never a
/// FLOAT or STRING.
pub fn parse_input(text: &str, data_type: DataType) -> Option<Value> {
    let kind = classify_input(text);
    match data_type {
        DataType::Int => match kind {
            InputKind::Int(n) => Some(Value::Int(n)),
            _ => None,
        },
        DataType::Float => match kind {
            InputKind::Float(x) => Some(Value::Float(x)),
            _ => None,
        },
        DataType::Bool => match kind {
            InputKind::Bool(b) => Some(Value::Bool(b)),
            _ => None,
        },
        DataType::Char => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(Value::Char(c)),
                _ => None,
            }
        }
        DataType::String => match kind {
            InputKind::Text => Some(Value::String(text.to_string())),
            _ => None,
        },
    }
}

enum InputKind {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text,
}

fn classify_input(text: &str) -> InputKind {
    match text {
        "TRUE" => return InputKind::Bool(true),
        "FALSE" => return InputKind::Bool(false),
        _ => {}
    }
    if let Ok(n) = text.parse::<i64>() {
        return InputKind::Int(n);
    }
    // Rust accepts "inf" and "NaN"; a numeric literal needs a digit.
    if text.chars().any(|c| c.is_ascii_digit()) {
        if let Ok(x) = text.parse::<f64>() {
            return InputKind::Float(x);
        }
    }
    InputKind::Text
}

fn io_error(span: &Span, error: io::Error) -> CodeError {
    CodeError::runtime_error(span.clone(), format!("I/O error: {}", error))
}
