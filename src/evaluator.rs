//! Expression evaluation.
//!
//! Expressions never change the environment; they only read variables.
//! The first operand combination that has no meaning raises a runtime
//! error and no partial result is produced.

use crate::ast::{BinaryOp, Expr, LiteralKind, UnaryOp};
use crate::environment::{EnvError, Environment};
use crate::error::{CodeError, Span};
use crate::value::Value;

pub fn evaluate(expr: &Expr, env: &Environment) -> Result<Value, CodeError> {
    match expr {
        Expr::Literal { kind, lexeme, span } => evaluate_literal(*kind, lexeme, span),
        Expr::Escape { lexeme, span } => evaluate_escape(lexeme, span),
        Expr::Newline { .. } => Ok(Value::String("\n".to_string())),
        Expr::Variable { name, span } => match env.read(name) {
            Ok(Some(value)) => Ok(value.clone()),
            Ok(None) => Err(CodeError::runtime_error_with_help(
                span.clone(),
                format!("Variable '{}' has no value", name),
                format!("Assign '{}' a value or SCAN it before using it.", name),
            )),
            Err(error) => Err(variable_error(error, span)),
        },
        Expr::Unary {
            operator,
            operand,
            span,
        } => {
            let operand_val = evaluate(operand, env)?;
            evaluate_unary_op(*operator, operand_val, span)
        }
        Expr::Not { operand, span } => match evaluate(operand, env)? {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            other => Err(CodeError::runtime_error(
                span.clone(),
                format!("NOT requires a BOOL operand, got {}", other.type_name()),
            )),
        },
        Expr::Binary {
            left,
            operator,
            right,
            span,
        } => {
            let left_val = evaluate(left, env)?;
            let right_val = evaluate(right, env)?;
            evaluate_binary_op(*operator, left_val, right_val, span)
        }
        Expr::Grouping { expr, .. } => evaluate(expr, env),
    }
}

/// Map an environment failure onto the error the program reports.
pub(crate) fn variable_error(error: EnvError, span: &Span) -> CodeError {
    match error {
        EnvError::Undeclared(name) => CodeError::runtime_error_with_help(
            span.clone(),
            format!("Undeclared variable '{}'", name),
            format!("Declare it first, e.g. 'INT {}'.", name),
        ),
        EnvError::Redeclared(name) => CodeError::declaration_error(
            span.clone(),
            format!("Variable '{}' is already declared", name),
        )
        .with_help("Each variable may be declared only once per program."),
    }
}

fn evaluate_literal(kind: LiteralKind, lexeme: &str, span: &Span) -> Result<Value, CodeError> {
    let invalid = || {
        CodeError::runtime_error(
            span.clone(),
            format!("Invalid literal '{}'", lexeme),
        )
    };

    match kind {
        LiteralKind::Int => lexeme.parse().map(Value::Int).map_err(|_| invalid()),
        LiteralKind::Float => lexeme.parse().map(Value::Float).map_err(|_| invalid()),
        LiteralKind::Bool => Ok(Value::Bool(lexeme == "TRUE")),
        LiteralKind::Char => {
            let mut chars = strip_quotes(lexeme, '\'').chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Char(c)),
                _ => Err(invalid()),
            }
        }
        LiteralKind::String => Ok(Value::String(strip_quotes(lexeme, '"').to_string())),
    }
}

fn strip_quotes(lexeme: &str, quote: char) -> &str {
    let inner = lexeme.strip_prefix(quote).unwrap_or(lexeme);
    inner.strip_suffix(quote).unwrap_or(inner)
}

/// `[c]` is the character `c`; `[\n]`, `[\t]`, `[\r]` and `[\\]` are control escapes.
fn evaluate_escape(lexeme: &str, span: &Span) -> Result<Value, CodeError> {
    let inner = lexeme
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(lexeme);

    let c = match inner {
        "\\n" => '\n',
        "\\t" => '\t',
        "\\r" => '\r',
        "\\\\" => '\\',
        "\\[" => '[',
        "\\]" => ']',
        _ => {
            let mut chars = inner.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => {
                    return Err(CodeError::runtime_error(
                        span.clone(),
                        format!("Invalid escape literal '{}'", lexeme),
                    ))
                }
            }
        }
    };

    Ok(Value::Char(c))
}

fn evaluate_unary_op(operator: UnaryOp, operand: Value, span: &Span) -> Result<Value, CodeError> {
    match (operator, operand) {
        (UnaryOp::Plus, value @ (Value::Int(_) | Value::Float(_))) => Ok(value),
        (UnaryOp::Negate, Value::Int(n)) => n.checked_neg().map(Value::Int).ok_or_else(|| {
            CodeError::runtime_error(span.clone(), "Integer overflow in negation".to_string())
        }),
        (UnaryOp::Negate, Value::Float(n)) => Ok(Value::Float(-n)),
        (operator, operand) => {
            let symbol = match operator {
                UnaryOp::Plus => '+',
                UnaryOp::Negate => '-',
            };
            Err(CodeError::runtime_error(
                span.clone(),
                format!(
                    "Unary '{}' requires an INT or FLOAT operand, got {}",
                    symbol,
                    operand.type_name()
                ),
            ))
        }
    }
}

pub fn evaluate_binary_op(
    operator: BinaryOp,
    left: Value,
    right: Value,
    span: &Span,
) -> Result<Value, CodeError> {
    match operator {
        BinaryOp::Multiply
        | BinaryOp::Divide
        | BinaryOp::Modulo
        | BinaryOp::Add
        | BinaryOp::Subtract => arithmetic(operator, left, right, span),
        BinaryOp::Greater
        | BinaryOp::Less
        | BinaryOp::GreaterEqual
        | BinaryOp::LessEqual
        | BinaryOp::Equal
        | BinaryOp::NotEqual => comparison(operator, left, right, span),
        BinaryOp::And | BinaryOp::Or => match (left, right) {
            (Value::Bool(l), Value::Bool(r)) => Ok(Value::Bool(if operator == BinaryOp::And {
                l && r
            } else {
                l || r
            })),
            (l, r) => Err(operand_error(operator, &l, &r, span)),
        },
        BinaryOp::Concat => Ok(Value::String(format!("{}{}", left, right))),
    }
}

fn arithmetic(operator: BinaryOp, left: Value, right: Value, span: &Span) -> Result<Value, CodeError> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => int_arithmetic(operator, l, r, span),
        (Value::Float(l), Value::Float(r)) => float_arithmetic(operator, l, r, span),
        (Value::Int(l), Value::Float(r)) => float_arithmetic(operator, l as f64, r, span),
        (Value::Float(l), Value::Int(r)) => float_arithmetic(operator, l, r as f64, span),
        (l, r) => Err(operand_error(operator, &l, &r, span)),
    }
}

fn int_arithmetic(operator: BinaryOp, l: i64, r: i64, span: &Span) -> Result<Value, CodeError> {
    if matches!(operator, BinaryOp::Divide | BinaryOp::Modulo) && r == 0 {
        return Err(division_by_zero(span));
    }

    let result = match operator {
        BinaryOp::Multiply => l.checked_mul(r),
        BinaryOp::Divide => l.checked_div(r),
        BinaryOp::Modulo => l.checked_rem(r),
        BinaryOp::Add => l.checked_add(r),
        BinaryOp::Subtract => l.checked_sub(r),
        _ => unreachable!("arithmetic is only called with arithmetic operators"),
    };

    result.map(Value::Int).ok_or_else(|| {
        CodeError::runtime_error(
            span.clone(),
            format!("Integer overflow in {} {} {}", l, operator.symbol(), r),
        )
    })
}

fn float_arithmetic(operator: BinaryOp, l: f64, r: f64, span: &Span) -> Result<Value, CodeError> {
    let result = match operator {
        BinaryOp::Multiply => l * r,
        BinaryOp::Divide | BinaryOp::Modulo if r == 0.0 => return Err(division_by_zero(span)),
        BinaryOp::Divide => l / r,
        BinaryOp::Modulo => l % r,
        BinaryOp::Add => l + r,
        BinaryOp::Subtract => l - r,
        _ => unreachable!("arithmetic is only called with arithmetic operators"),
    };
    Ok(Value::Float(result))
}

fn comparison(operator: BinaryOp, left: Value, right: Value, span: &Span) -> Result<Value, CodeError> {
    let equality_only = matches!(operator, BinaryOp::Equal | BinaryOp::NotEqual);

    let result = match (&left, &right) {
        (Value::Int(l), Value::Int(r)) => compare_ordered(operator, l, r),
        (Value::Float(l), Value::Float(r)) => compare_ordered(operator, l, r),
        (Value::Int(l), Value::Float(r)) => compare_ordered(operator, &(*l as f64), r),
        (Value::Float(l), Value::Int(r)) => compare_ordered(operator, l, &(*r as f64)),
        (Value::Bool(l), Value::Bool(r)) if equality_only => compare_ordered(operator, l, r),
        (Value::Char(l), Value::Char(r)) if equality_only => compare_ordered(operator, l, r),
        (Value::String(l), Value::String(r)) if equality_only => compare_ordered(operator, l, r),
        _ => return Err(operand_error(operator, &left, &right, span)),
    };

    Ok(Value::Bool(result))
}

fn compare_ordered<T: PartialOrd + ?Sized>(operator: BinaryOp, l: &T, r: &T) -> bool {
    match operator {
        BinaryOp::Greater => l > r,
        BinaryOp::Less => l < r,
        BinaryOp::GreaterEqual => l >= r,
        BinaryOp::LessEqual => l <= r,
        BinaryOp::Equal => l == r,
        BinaryOp::NotEqual => l != r,
        _ => unreachable!("comparison is only called with comparison operators"),
    }
}

fn division_by_zero(span: &Span) -> CodeError {
    CodeError::runtime_error_with_help(
        span.clone(),
        "Division by zero".to_string(),
        "Check the divisor before dividing, e.g. IF (d <> 0).".to_string(),
    )
}

fn operand_error(operator: BinaryOp, left: &Value, right: &Value, span: &Span) -> CodeError {
    CodeError::runtime_error(
        span.clone(),
        format!(
            "Operator '{}' is not defined for {} and {}",
            operator.symbol(),
            left.type_name(),
            right.type_name()
        ),
    )
}
