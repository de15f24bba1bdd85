//! Function and constant registries
//!
//! Name → entry maps with configurable case folding. Registries are mutated
//! only through explicit registration calls from the embedding application;
//! the parser and evaluator treat them as read-only.

use crate::error::ConfigError;
use ahash::AHashMap;
use std::fmt;
use std::sync::Arc;

/// Calling contract for registered functions: an arity-free slice of already
/// evaluated arguments in source order. An `Err` surfaces from evaluation as
/// a function runtime error, never as a panic.
pub type FunctionResult = Result<f64, Box<dyn std::error::Error + Send + Sync>>;

/// A registered callable.
pub type NativeFunction = Arc<dyn Fn(&[f64]) -> FunctionResult + Send + Sync>;

#[derive(Clone)]
pub struct FunctionInfo {
    pub name: String,
    pub body: NativeFunction,
    pub overwritable: bool,
    pub idempotent: bool,
}

impl fmt::Debug for FunctionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionInfo")
            .field("name", &self.name)
            .field("overwritable", &self.overwritable)
            .field("idempotent", &self.idempotent)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantInfo {
    pub name: String,
    pub value: f64,
    pub overwritable: bool,
}

#[derive(Clone)]
pub struct FunctionRegistry {
    case_sensitive: bool,
    functions: AHashMap<String, FunctionInfo>,
}

impl FunctionRegistry {
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            case_sensitive,
            functions: AHashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FunctionInfo> {
        self.functions.get(&self.fold(name))
    }

    /// Registering over an existing non-overwritable entry is a
    /// configuration error.
    pub fn register(
        &mut self,
        name: &str,
        body: NativeFunction,
        overwritable: bool,
        idempotent: bool,
    ) -> Result<(), ConfigError> {
        let key = self.fold(name);
        if let Some(existing) = self.functions.get(&key) {
            if !existing.overwritable {
                return Err(ConfigError::FunctionNotOverwritable(existing.name.clone()));
            }
        }
        self.functions.insert(
            key.clone(),
            FunctionInfo {
                name: key,
                body,
                overwritable,
                idempotent,
            },
        );
        Ok(())
    }

    fn fold(&self, name: &str) -> String {
        if self.case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConstantRegistry {
    case_sensitive: bool,
    constants: AHashMap<String, ConstantInfo>,
}

impl ConstantRegistry {
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            case_sensitive,
            constants: AHashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.constants.get(&self.fold(name)).map(|c| c.value)
    }

    pub fn register(
        &mut self,
        name: &str,
        value: f64,
        overwritable: bool,
    ) -> Result<(), ConfigError> {
        let key = self.fold(name);
        if let Some(existing) = self.constants.get(&key) {
            if !existing.overwritable {
                return Err(ConfigError::ConstantNotOverwritable(existing.name.clone()));
            }
        }
        self.constants.insert(
            key.clone(),
            ConstantInfo {
                name: key,
                value,
                overwritable,
            },
        );
        Ok(())
    }

    /// Sorted name/value pairs, used to canonicalize cache keys for
    /// compiled-constant builds.
    pub fn sorted_entries(&self) -> Vec<(&str, f64)> {
        let mut entries: Vec<(&str, f64)> = self
            .constants
            .iter()
            .map(|(k, c)| (k.as_str(), c.value))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    fn fold(&self, name: &str) -> String {
        if self.case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }
}
