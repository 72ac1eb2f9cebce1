use crate::value::{DataType, Value};
use std::collections::HashMap;
use thiserror::Error;

/// A declared variable. `value` is `None` until the variable is first
/// given a value, which is distinct from any zero or empty value.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub data_type: DataType,
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    #[error("variable '{0}' is already declared")]
    Redeclared(String),
    #[error("variable '{0}' is not declared")]
    Undeclared(String),
}

/// The single flat scope of a CODE program.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    bindings: HashMap<String, Binding>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(
        &mut self,
        name: &str,
        data_type: DataType,
        value: Option<Value>,
    ) -> Result<(), EnvError> {
        if self.bindings.contains_key(name) {
            return Err(EnvError::Redeclared(name.to_string()));
        }
        self.bindings
            .insert(name.to_string(), Binding { data_type, value });
        Ok(())
    }

    /// Replace the stored value. The declared type is not enforced here.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), EnvError> {
        match self.bindings.get_mut(name) {
            Some(binding) => {
                binding.value = Some(value);
                Ok(())
            }
            None => Err(EnvError::Undeclared(name.to_string())),
        }
    }

    pub fn read(&self, name: &str) -> Result<Option<&Value>, EnvError> {
        self.binding(name).map(|binding| binding.value.as_ref())
    }

    pub fn type_of(&self, name: &str) -> Result<DataType, EnvError> {
        self.binding(name).map(|binding| binding.data_type)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    fn binding(&self, name: &str) -> Result<&Binding, EnvError> {
        self.bindings
            .get(name)
            .ok_or_else(|| EnvError::Undeclared(name.to_string()))
    }
}
