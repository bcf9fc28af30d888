/// Typed parameters of clustering methods
use crate::error::ParameterError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    Integer,
    Real,
    Boolean,
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Integer => "an integer",
            Self::Real => "a real number",
            Self::Boolean => "a boolean",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Boolean(bool),
    Integer(i64),
    Real(f64),
}

impl ParameterValue {
    pub fn kind(&self) -> ParameterKind {
        match self {
            Self::Integer(_) => ParameterKind::Integer,
            Self::Real(_) => ParameterKind::Real,
            Self::Boolean(_) => ParameterKind::Boolean,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Real(v) => write!(f, "{}", v),
            Self::Boolean(v) => write!(f, "{}", v),
        }
    }
}

/// Declared parameter of a method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: ParameterKind,
    pub default: ParameterValue,
}

impl ParameterSpec {
    pub const fn integer(name: &'static str, label: &'static str, default: i64) -> Self {
        Self {
            name,
            label,
            kind: ParameterKind::Integer,
            default: ParameterValue::Integer(default),
        }
    }

    pub const fn real(name: &'static str, label: &'static str, default: f64) -> Self {
        Self {
            name,
            label,
            kind: ParameterKind::Real,
            default: ParameterValue::Real(default),
        }
    }

    pub const fn boolean(name: &'static str, label: &'static str, default: bool) -> Self {
        Self {
            name,
            label,
            kind: ParameterKind::Boolean,
            default: ParameterValue::Boolean(default),
        }
    }

    /// Coerces a committed form value to this parameter's kind.
    ///
    /// Integers widen to reals, integral reals narrow to integers, and
    /// strings are parsed (`"inf"` is accepted for reals). Anything else is a
    /// [`ParameterError::TypeMismatch`].
    pub fn coerce(&self, value: &Value) -> Result<ParameterValue, ParameterError> {
        let coerced = match (self.kind, value) {
            (ParameterKind::Boolean, Value::Bool(b)) => Some(ParameterValue::Boolean(*b)),
            (ParameterKind::Boolean, Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" => Some(ParameterValue::Boolean(true)),
                "false" => Some(ParameterValue::Boolean(false)),
                _ => None,
            },
            (ParameterKind::Integer, Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15).map(|f| f as i64))
                .map(ParameterValue::Integer),
            (ParameterKind::Integer, Value::String(s)) => {
                s.trim().parse::<i64>().ok().map(ParameterValue::Integer)
            }
            (ParameterKind::Real, Value::Number(n)) => n.as_f64().map(ParameterValue::Real),
            (ParameterKind::Real, Value::String(s)) => {
                s.trim().parse::<f64>().ok().map(ParameterValue::Real)
            }
            _ => None,
        };
        coerced.ok_or_else(|| ParameterError::TypeMismatch {
            name: self.name.to_string(),
            expected: self.kind,
            found: value.to_string(),
        })
    }
}

/// Validated parameter values keyed by name.
///
/// The committed `{name: value}` map is coerced into this once, against the
/// method's declared [`ParameterSpec`]s. Clustering code only sees these.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParameterValues(BTreeMap<String, ParameterValue>);

impl ParameterValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: ParameterValue) {
        self.0.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<ParameterValue> {
        self.0.get(name).copied()
    }

    pub fn integer(&self, name: &str) -> Result<i64, ParameterError> {
        match self.get(name) {
            Some(ParameterValue::Integer(v)) => Ok(v),
            other => Err(self.mismatch(name, ParameterKind::Integer, other)),
        }
    }

    /// Real values also accept integers.
    pub fn real(&self, name: &str) -> Result<f64, ParameterError> {
        match self.get(name) {
            Some(ParameterValue::Real(v)) => Ok(v),
            Some(ParameterValue::Integer(v)) => Ok(v as f64),
            other => Err(self.mismatch(name, ParameterKind::Real, other)),
        }
    }

    pub fn boolean(&self, name: &str) -> Result<bool, ParameterError> {
        match self.get(name) {
            Some(ParameterValue::Boolean(v)) => Ok(v),
            other => Err(self.mismatch(name, ParameterKind::Boolean, other)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn mismatch(&self, name: &str, expected: ParameterKind, found: Option<ParameterValue>) -> ParameterError {
        ParameterError::TypeMismatch {
            name: name.to_string(),
            expected,
            found: found.map_or_else(|| "nothing".to_string(), |v| v.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const EPS: ParameterSpec = ParameterSpec::real("eps", "Neighbourhood radius", 0.5);
    const MIN: ParameterSpec = ParameterSpec::integer("min_samples", "Minimum samples", 5);
    const FLAG: ParameterSpec = ParameterSpec::boolean("flag", "Flag", false);

    #[test]
    fn numbers_coerce_between_kinds() {
        assert_eq!(EPS.coerce(&json!(2)).unwrap(), ParameterValue::Real(2.0));
        assert_eq!(MIN.coerce(&json!(3.0)).unwrap(), ParameterValue::Integer(3));
        assert_eq!(MIN.coerce(&json!("7")).unwrap(), ParameterValue::Integer(7));
        assert_eq!(EPS.coerce(&json!("inf")).unwrap(), ParameterValue::Real(f64::INFINITY));
        assert_eq!(FLAG.coerce(&json!("True")).unwrap(), ParameterValue::Boolean(true));
    }

    #[test]
    fn incompatible_values_are_rejected() {
        for (spec, value) in [
            (MIN, json!(2.5)),
            (MIN, json!("two")),
            (EPS, json!(true)),
            (FLAG, json!(1)),
            (EPS, json!([1.0])),
        ] {
            let err = spec.coerce(&value).unwrap_err();
            assert!(matches!(err, ParameterError::TypeMismatch { ref name, .. } if name == spec.name));
        }
    }

    #[test]
    fn typed_getters() {
        let mut values = ParameterValues::new();
        values.insert("eps", ParameterValue::Real(2.5));
        values.insert("min_samples", ParameterValue::Integer(2));
        assert_eq!(values.real("eps").unwrap(), 2.5);
        assert_eq!(values.real("min_samples").unwrap(), 2.0);
        assert_eq!(values.integer("min_samples").unwrap(), 2);
        assert!(values.integer("eps").is_err());
        assert!(values.boolean("missing").is_err());
    }

    #[test]
    fn kinds_serialise_lowercase() {
        assert_eq!(serde_json::to_value(ParameterKind::Real).unwrap(), json!("real"));
        assert_eq!(serde_json::to_value(ParameterValue::Integer(3)).unwrap(), json!(3));
    }
}
