//! Discriminator token canonicalization.
//!
//! # Responsibilities
//! - Normalize a decoded request value into a [`DispatchKey`]
//! - Decide whether an optional field counts as present
//!
//! # Rules (applied in order)
//! - absent, `null`, `""` → wildcard
//! - the literal `"*"` → wildcard key, so it selects the default branch directly
//! - whole numbers → integer key (`3` and `3.0` are the same key)
//! - other numbers → float key
//! - booleans and non-empty strings → themselves
//! - objects carrying a non-empty string `"Value"` member → that string
//! - any other object or array → composite key
//!
//! # Design Decisions
//! - Canonicalization is total: every value maps to some key
//! - Composite keys cannot be produced through `From`, so the builder never
//!   registers one and they always fall through to optional/default handling
//! - The literal `"*"` names the wildcard key, both when registering and when
//!   matching; the evaluator tells it apart from a missing token with
//!   [`is_present`]

use std::fmt;

use serde_json::{Number, Value};

/// Label of the wildcard (default) branch.
pub const WILDCARD: &str = "*";

/// Canonical key used for child lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DispatchKey {
    /// The default branch.
    Wildcard,
    /// Any whole number.
    Int(i64),
    /// Bit pattern of a number with a fractional part.
    Float(u64),
    Bool(bool),
    Str(String),
    /// Serialized form of an object or array token.
    Composite(String),
}

impl DispatchKey {
    /// Canonicalize a token read from the request data.
    pub fn canonicalize(token: Option<&Value>) -> Self {
        match token {
            None | Some(Value::Null) => Self::Wildcard,
            Some(Value::Bool(b)) => Self::Bool(*b),
            Some(Value::Number(n)) => Self::from_number(n),
            Some(Value::String(s)) => Self::from(s.as_str()),
            Some(Value::Object(map)) => match map.get("Value") {
                Some(Value::String(inner)) if !inner.is_empty() => Self::from(inner.as_str()),
                _ => Self::Composite(Value::Object(map.clone()).to_string()),
            },
            Some(array @ Value::Array(_)) => Self::Composite(array.to_string()),
        }
    }

    fn from_number(n: &Number) -> Self {
        if let Some(i) = n.as_i64() {
            return Self::Int(i);
        }
        match n.as_f64() {
            Some(f) => Self::from(f),
            None => Self::Composite(n.to_string()),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }
}

/// Returns true if an optional field carries a usable value.
///
/// Only absence, `null` and the empty string are treated as missing;
/// `false` and `0` count as present.
pub fn is_present(token: Option<&Value>) -> bool {
    match token {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

impl From<&str> for DispatchKey {
    fn from(s: &str) -> Self {
        if s.is_empty() || s == WILDCARD {
            Self::Wildcard
        } else {
            Self::Str(s.to_string())
        }
    }
}

impl From<String> for DispatchKey {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<&String> for DispatchKey {
    fn from(s: &String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<i64> for DispatchKey {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for DispatchKey {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u32> for DispatchKey {
    fn from(i: u32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for DispatchKey {
    fn from(f: f64) -> Self {
        // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound.
        if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
            Self::Int(f as i64)
        } else {
            Self::Float(f.to_bits())
        }
    }
}

impl From<bool> for DispatchKey {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl fmt::Display for DispatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wildcard => f.write_str(WILDCARD),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Str(s) | Self::Composite(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(value: Value) -> DispatchKey {
        DispatchKey::canonicalize(Some(&value))
    }

    #[test]
    fn test_missing_tokens_are_wildcard() {
        assert_eq!(DispatchKey::canonicalize(None), DispatchKey::Wildcard);
        assert_eq!(key(Value::Null), DispatchKey::Wildcard);
        assert_eq!(key(json!("")), DispatchKey::Wildcard);
        assert!(!is_present(Some(&json!(""))));
    }

    #[test]
    fn test_star_is_a_present_key() {
        // Same key as the default branch, but not a missing token.
        assert_eq!(key(json!("*")), DispatchKey::from(WILDCARD));
        assert!(is_present(Some(&json!("*"))));
    }

    #[test]
    fn test_whole_numbers_share_a_key() {
        assert_eq!(key(json!(3)), DispatchKey::Int(3));
        assert_eq!(key(json!(3.0)), DispatchKey::Int(3));
        assert_eq!(key(json!(-7.0)), key(json!(-7)));
        assert_eq!(key(json!(-0.0)), DispatchKey::Int(0));
        assert_eq!(DispatchKey::from(2.0), DispatchKey::from(2));
    }

    #[test]
    fn test_fractional_numbers_keep_their_value() {
        assert_eq!(key(json!(2.5)), DispatchKey::Float(2.5f64.to_bits()));
        assert_ne!(key(json!(2.5)), key(json!(2)));
        assert_eq!(key(json!(2.5)).to_string(), "2.5");
    }

    #[test]
    fn test_huge_unsigned_falls_back_to_float() {
        let token = key(json!(u64::MAX));
        assert!(matches!(token, DispatchKey::Float(_)));
    }

    #[test]
    fn test_bools_and_strings() {
        assert_eq!(key(json!(true)), DispatchKey::Bool(true));
        assert_eq!(key(json!("move")), DispatchKey::Str("move".into()));
        // "true" the string is not true the boolean
        assert_ne!(key(json!("true")), key(json!(true)));
    }

    #[test]
    fn test_object_value_member() {
        assert_eq!(key(json!({"Value": "create"})), DispatchKey::Str("create".into()));
        assert!(matches!(key(json!({"Value": ""})), DispatchKey::Composite(_)));
        assert!(matches!(key(json!({"Value": 1})), DispatchKey::Composite(_)));
        assert!(matches!(key(json!({"other": "x"})), DispatchKey::Composite(_)));
        assert!(matches!(key(json!([1, 2])), DispatchKey::Composite(_)));
    }

    #[test]
    fn test_presence() {
        assert!(!is_present(None));
        assert!(!is_present(Some(&Value::Null)));
        assert!(!is_present(Some(&json!(""))));
        assert!(is_present(Some(&json!(false))));
        assert!(is_present(Some(&json!(0))));
        assert!(is_present(Some(&json!([]))));
        assert!(is_present(Some(&json!("x"))));
    }
}
