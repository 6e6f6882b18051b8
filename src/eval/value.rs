use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Runtime value of a story variable or expression.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    String(String),
    Bool(bool),
    List(Vec<Value>),
    #[default]
    Null,
}

impl Value {
    /// `false`, `0`, `NaN`, `""` and `null` are falsy; everything else,
    /// including empty lists, is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::List(_) => true,
            Value::Null => false,
        }
    }

    /// Numeric coercion: booleans are 1/0, null is 0, numeric strings parse,
    /// anything else is NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Bool(true) => 1.0,
            Value::Bool(false) | Value::Null => 0.0,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Value::List(_) => f64::NAN,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Equality without coercion: values of different kinds are never equal.
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.strict_eq(y))
            }
            _ => false,
        }
    }

    /// Ordering for number/number and string/string pairs only.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Value::Null => f.write_str("null"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_drops_trailing_zero() {
        assert_eq!(Value::Number(42.0).to_string(), "42");
        assert_eq!(Value::Number(-0.0).to_string(), "0");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(
            Value::List(vec![1.0.into(), "a".into(), true.into()]).to_string(),
            "1,a,true"
        );
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(Value::String("0".into()).is_truthy());
        assert!(Value::List(vec![]).is_truthy());
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Value::Bool(true).to_number(), 1.0);
        assert_eq!(Value::Null.to_number(), 0.0);
        assert_eq!(Value::from(" 12 ").to_number(), 12.0);
        assert!(Value::from("abc").to_number().is_nan());
    }

    #[test]
    fn test_strict_equality() {
        assert!(Value::from(1.0).strict_eq(&Value::from(1.0)));
        assert!(!Value::from(1.0).strict_eq(&Value::from("1")));
        assert!(!Value::from(1.0).strict_eq(&Value::Bool(true)));
    }

    #[test]
    fn test_untagged_json() {
        let values = vec![Value::from(1.5), "x".into(), true.into(), Value::Null];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[1.5,"x",true,null]"#);
        let back: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }
}
