//! Typed extractors over `Option<&Value>`: lenient on absence (falls back to
//! the caller-supplied default), strict on the wrong type (an
//! `InvalidArgument` naming the actual discriminant.

use core_collab::Value;
use core_errors::ShellError;

fn wrong_type(expected: &str, actual: &Value) -> ShellError {
    ShellError::invalid_argument(format!(
        "expected {expected}, got {}",
        actual.type_name()
    ))
}

pub fn get_string(value: Option<&Value>, default: &str) -> Result<String, ShellError> {
    match value {
        None => Ok(default.to_string()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(wrong_type("String", other)),
    }
}

pub fn get_int(value: Option<&Value>, default: i64) -> Result<i64, ShellError> {
    match value {
        None => Ok(default),
        Some(Value::Int(i)) => Ok(*i),
        Some(other) => Err(wrong_type("Int", other)),
    }
}

pub fn get_float(value: Option<&Value>, default: f64) -> Result<f64, ShellError> {
    match value {
        None => Ok(default),
        Some(Value::Float(f)) => Ok(*f),
        Some(other) => Err(wrong_type("Float", other)),
    }
}

pub fn get_bool(value: Option<&Value>, default: bool) -> Result<bool, ShellError> {
    match value {
        None => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(wrong_type("Bool", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_value_returns_default() {
        assert_eq!(get_string(None, "fallback").unwrap(), "fallback");
        assert_eq!(get_int(None, 7).unwrap(), 7);
    }

    #[test]
    fn present_matching_value_is_extracted() {
        let v = Value::Int(42);
        assert_eq!(get_int(Some(&v), 0).unwrap(), 42);
    }

    #[test]
    fn present_mismatched_value_is_strict_error() {
        let v = Value::Int(42);
        let err = get_string(Some(&v), "x").unwrap_err();
        assert!(err.to_string().contains("Int"));
    }
}
