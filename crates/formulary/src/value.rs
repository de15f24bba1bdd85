//! Caller-supplied variable values
//!
//! Bindings arrive as heterogeneous values and are normalized into plain
//! `f64` once per evaluation call; anything that cannot be interpreted as a
//! number is rejected with a typed error rather than defaulted.

use crate::error::EvalError;
use crate::evaluator::Bindings;
use ahash::AHashMap;

/// A value bound to a variable name or a compiled constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Value {
    /// Interpret the value as a number: booleans become 1/0, strings parse
    /// with `.` as decimal separator.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Bool(true) => Some(1.0),
            Value::Bool(false) => Some(0.0),
            Value::Str(s) => s.trim().parse().ok(),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value as f64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

/// Variable name → value, as supplied by the caller.
pub type Variables = AHashMap<String, Value>;

/// Build a `Variables` map from name/value pairs.
///
/// ```
/// use formulary::variables;
///
/// let vars = variables([("width", 3.0), ("height", 4.5)]);
/// assert_eq!(vars.len(), 2);
/// ```
pub fn variables<N, V>(pairs: impl IntoIterator<Item = (N, V)>) -> Variables
where
    N: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(name, value)| (name.into(), value.into()))
        .collect()
}

/// Flatten caller bindings into case-normalized `f64` bindings for one
/// evaluation call.
pub(crate) fn flatten(vars: &Variables, case_sensitive: bool) -> Result<Bindings, EvalError> {
    let mut bindings = Bindings::with_capacity(vars.len());
    for (name, value) in vars {
        let number = value.as_number().ok_or_else(|| EvalError::NotNumeric {
            name: name.clone(),
        })?;
        let name = if case_sensitive {
            name.clone()
        } else {
            name.to_lowercase()
        };
        bindings.insert(name, number);
    }
    Ok(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Value::Int(3).as_number(), Some(3.0));
        assert_eq!(Value::Float(2.5).as_number(), Some(2.5));
        assert_eq!(Value::Bool(true).as_number(), Some(1.0));
        assert_eq!(Value::Bool(false).as_number(), Some(0.0));
        assert_eq!(Value::Str("1.25".into()).as_number(), Some(1.25));
        assert_eq!(Value::Str("not a number".into()).as_number(), None);
    }

    #[test]
    fn test_flatten_case_folds() {
        let vars = variables([("VaR1", 1.0), ("var2", 2.0)]);
        let bindings = flatten(&vars, false).unwrap();
        assert_eq!(bindings.get("var1"), Some(&1.0));

        let bindings = flatten(&vars, true).unwrap();
        assert_eq!(bindings.get("var1"), None);
        assert_eq!(bindings.get("VaR1"), Some(&1.0));
    }

    #[test]
    fn test_flatten_rejects_non_numeric() {
        let vars = variables([("name", "Ada")]);
        assert_eq!(
            flatten(&vars, false),
            Err(EvalError::NotNumeric { name: "name".into() })
        );
    }
}
