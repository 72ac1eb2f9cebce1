use std::fmt;
use thiserror::Error;

/// The five scalar types a variable can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Int,
    Float,
    Char,
    Bool,
    String,
}

impl DataType {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "INT" => Some(DataType::Int),
            "FLOAT" => Some(DataType::Float),
            "CHAR" => Some(DataType::Char),
            "BOOL" => Some(DataType::Bool),
            "STRING" => Some(DataType::String),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            DataType::Int => "INT",
            DataType::Float => "FLOAT",
            DataType::Char => "CHAR",
            DataType::Bool => "BOOL",
            DataType::String => "STRING",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Runtime value. Always exactly one kind; an unassigned variable holds no
/// `Value` at all (see `Environment`).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Char(char),
    Bool(bool),
    String(String),
}

/// Raised when a value has no exact representation in the target type.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot convert {from} to {to}")]
pub struct ConversionError {
    pub from: DataType,
    pub to: DataType,
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::Char(_) => DataType::Char,
            Value::Bool(_) => DataType::Bool,
            Value::String(_) => DataType::String,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.data_type().keyword()
    }

    /// Declaration-time conversion. Only exact representations are accepted.
    pub fn coerce(self, target: DataType) -> Result<Value, ConversionError> {
        let from = self.data_type();
        match (self, target) {
            (value, target) if value.data_type() == target => Ok(value),
            (Value::Int(n), DataType::Float) => Ok(Value::Float(n as f64)),
            (Value::Float(x), DataType::Int)
                if x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64 =>
            {
                Ok(Value::Int(x as i64))
            }
            (Value::Char(c), DataType::String) => Ok(Value::String(c.to_string())),
            (Value::String(s), DataType::Char) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Char(c)),
                    _ => Err(ConversionError { from, to: target }),
                }
            }
            (_, to) => Err(ConversionError { from, to }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => {
                // Always show at least one decimal place for floats
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{:.1}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Char(c) => write!(f, "{}", c),
            Value::Bool(true) => write!(f, "TRUE"),
            Value::Bool(false) => write!(f, "FALSE"),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_render_upper_case() {
        assert_eq!(Value::Bool(true).to_string(), "TRUE");
        assert_eq!(Value::Bool(false).to_string(), "FALSE");
    }

    #[test]
    fn floats_keep_a_decimal_place() {
        assert_eq!(Value::Float(3.0).to_string(), "3.0");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Float(-0.25).to_string(), "-0.25");
    }

    #[test]
    fn int_widens_to_float() {
        assert_eq!(Value::Int(4).coerce(DataType::Float), Ok(Value::Float(4.0)));
    }

    #[test]
    fn float_narrows_only_when_integral() {
        assert_eq!(Value::Float(7.0).coerce(DataType::Int), Ok(Value::Int(7)));
        assert_eq!(
            Value::Float(7.5).coerce(DataType::Int),
            Err(ConversionError {
                from: DataType::Float,
                to: DataType::Int
            })
        );
    }

    #[test]
    fn no_coercion_between_text_and_numbers() {
        assert!(Value::String("5".into()).coerce(DataType::Int).is_err());
        assert!(Value::Bool(true).coerce(DataType::Int).is_err());
        assert!(Value::Int(1).coerce(DataType::Bool).is_err());
        assert!(Value::Char('a').coerce(DataType::Float).is_err());
    }

    #[test]
    fn conversion_error_names_both_types() {
        let error = Value::Float(2.5).coerce(DataType::Int).unwrap_err();
        assert_eq!(error.to_string(), "cannot convert FLOAT to INT");
        let boxed: Box<dyn std::error::Error> = Box::new(error);
        assert!(boxed.source().is_none());
    }

    #[test]
    fn single_characters_move_between_char_and_string() {
        assert_eq!(
            Value::Char('x').coerce(DataType::String),
            Ok(Value::String("x".into()))
        );
        assert_eq!(
            Value::String("y".into()).coerce(DataType::Char),
            Ok(Value::Char('y'))
        );
        assert!(Value::String("yz".into()).coerce(DataType::Char).is_err());
    }

    #[test]
    fn keywords_round_trip() {
        for keyword in ["INT", "FLOAT", "CHAR", "BOOL", "STRING"] {
            let data_type = DataType::from_keyword(keyword).unwrap();
            assert_eq!(data_type.keyword(), keyword);
        }
        assert_eq!(DataType::from_keyword("DOUBLE"), None);
    }
}
