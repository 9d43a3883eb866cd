//! Soft-value handling for shape-varying registry JSON.
//!
//! The detail API is duck-typed: the same logical field may arrive as a bare
//! scalar, as a `{"value": ...}` wrapper (sometimes nested one level deeper),
//! or not at all. [`SoftValue`] centralizes the degrade-to-default contract:
//! classification is explicit, unwrapping is bounded to a fixed depth, and
//! every coercion is total. No accessor in this module can fail.

use serde_json::Value;

/// How many `{"value": ...}` wrapper levels a coercion will look through.
const MAX_UNWRAP_DEPTH: usize = 2;

/// A JSON node classified by shape.
///
/// Constructed with [`SoftValue::of`]; the coercion methods ([`as_str`],
/// [`as_list`], [`as_f64`], [`as_i64`]) implement the three-shape contract:
/// absent nodes yield defaults, scalars are used directly, wrappers are
/// unwrapped up to [`MAX_UNWRAP_DEPTH`] levels, and anything else is
/// stringified as a best-effort fallback.
///
/// [`as_str`]: SoftValue::as_str
/// [`as_list`]: SoftValue::as_list
/// [`as_f64`]: SoftValue::as_f64
/// [`as_i64`]: SoftValue::as_i64
#[derive(Clone, Copy, Debug)]
pub enum SoftValue<'a> {
    /// Node is missing or JSON null
    Absent,
    /// Bare scalar (string, number, or boolean)
    Scalar(&'a Value),
    /// Object, treated as a `{"value": ...}` wrapper
    Wrapper(&'a Value),
    /// Bare sequence
    List(&'a Vec<Value>),
}

impl<'a> SoftValue<'a> {
    /// Classify an optional JSON node by shape.
    pub fn of(node: Option<&'a Value>) -> Self {
        match node {
            None | Some(Value::Null) => SoftValue::Absent,
            Some(v @ Value::Object(_)) => SoftValue::Wrapper(v),
            Some(Value::Array(items)) => SoftValue::List(items),
            Some(v) => SoftValue::Scalar(v),
        }
    }

    /// Classify a key within an optional JSON object.
    ///
    /// A missing key, a non-object parent, or an absent parent all classify
    /// as [`SoftValue::Absent`].
    pub fn key(node: Option<&'a Value>, key: &str) -> Self {
        Self::of(node.and_then(|v| v.get(key)))
    }

    /// Step one level into a wrapper's `value` key.
    ///
    /// Non-wrapper shapes are returned unchanged; a wrapper without a
    /// `value` key becomes [`SoftValue::Absent`].
    pub fn unwrap_once(self) -> Self {
        match self {
            SoftValue::Wrapper(obj) => Self::of(obj.get("value")),
            other => other,
        }
    }

    /// Unwrap until a non-wrapper shape is reached, bounded to
    /// [`MAX_UNWRAP_DEPTH`] levels.
    fn unwrap_bounded(self) -> Self {
        let mut current = self;
        for _ in 0..MAX_UNWRAP_DEPTH {
            match current {
                SoftValue::Wrapper(_) => current = current.unwrap_once(),
                _ => break,
            }
        }
        current
    }

    /// Coerce to a string, degrading to `default` when absent.
    ///
    /// Wrappers are unwrapped first; a wrapper that still is not a scalar
    /// after the bounded unwrap degrades to `default`. Bare lists are
    /// stringified wholesale as the fallback shape.
    pub fn as_str(self, default: &str) -> String {
        match self.unwrap_bounded() {
            SoftValue::Absent => default.to_string(),
            SoftValue::Scalar(v) => scalar_to_string(v),
            // Wrapper survived the bounded unwrap: give up on structure
            SoftValue::Wrapper(_) => default.to_string(),
            SoftValue::List(items) => Value::Array(items.clone()).to_string(),
        }
    }

    /// Coerce to a list of strings, degrading to empty when absent.
    ///
    /// Accepts a bare sequence, or a wrapper whose `value` is a sequence.
    /// Null elements are dropped; non-list scalars become a one-element
    /// sequence. Input order is preserved and duplicates pass through.
    pub fn as_list(self) -> Vec<String> {
        match self {
            SoftValue::Absent => Vec::new(),
            SoftValue::List(items) => items
                .iter()
                .filter(|v| !v.is_null())
                .map(element_to_string)
                .collect(),
            SoftValue::Wrapper(_) => match self.unwrap_once() {
                SoftValue::Absent => Vec::new(),
                SoftValue::List(items) => items
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(element_to_string)
                    .collect(),
                SoftValue::Scalar(v) => vec![scalar_to_string(v)],
                SoftValue::Wrapper(_) => Vec::new(),
            },
            SoftValue::Scalar(v) => vec![scalar_to_string(v)],
        }
    }

    /// Coerce to a float, degrading to `0.0` for anything non-numeric.
    ///
    /// Accepts JSON numbers, numeric strings, and booleans (1.0/0.0).
    pub fn as_f64(self) -> f64 {
        match self.unwrap_bounded() {
            SoftValue::Scalar(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            SoftValue::Scalar(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
            SoftValue::Scalar(Value::Bool(b)) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            _ => 0.0,
        }
    }

    /// Coerce to an integer, degrading to `0` for anything non-numeric.
    pub fn as_i64(self) -> i64 {
        match self.unwrap_bounded() {
            SoftValue::Scalar(Value::Number(n)) => {
                n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0)
            }
            SoftValue::Scalar(Value::String(s)) => s.trim().parse().unwrap_or(0),
            SoftValue::Scalar(Value::Bool(b)) => i64::from(*b),
            _ => 0,
        }
    }

    /// Coerce to a boolean, degrading to `false` when absent or misshapen.
    pub fn as_bool(self) -> bool {
        match self.unwrap_bounded() {
            SoftValue::Scalar(Value::Bool(b)) => *b,
            SoftValue::Scalar(Value::Number(n)) => n.as_f64().unwrap_or(0.0) != 0.0,
            _ => false,
        }
    }
}

/// String form of a scalar: strings verbatim, numbers and booleans via
/// their JSON rendering.
fn scalar_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// String form of a list element, which unlike a field scalar may itself
/// be any shape.
fn element_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_yields_default() {
        assert_eq!(SoftValue::of(None).as_str("fallback"), "fallback");
        assert_eq!(SoftValue::of(Some(&Value::Null)).as_str(""), "");
        assert_eq!(SoftValue::of(None).as_f64(), 0.0);
        assert!(SoftValue::of(None).as_list().is_empty());
        assert!(!SoftValue::of(None).as_bool());
    }

    #[test]
    fn test_bare_scalar_used_directly() {
        let v = json!("Test LLC");
        assert_eq!(SoftValue::of(Some(&v)).as_str(""), "Test LLC");

        let n = json!(42);
        assert_eq!(SoftValue::of(Some(&n)).as_str(""), "42");
        assert_eq!(SoftValue::of(Some(&n)).as_f64(), 42.0);
    }

    #[test]
    fn test_single_wrapper_unwrapped() {
        let v = json!({"value": "wrapped"});
        assert_eq!(SoftValue::of(Some(&v)).as_str(""), "wrapped");
    }

    #[test]
    fn test_double_wrapper_unwrapped() {
        let v = json!({"value": {"value": "deep"}});
        assert_eq!(SoftValue::of(Some(&v)).as_str(""), "deep");
    }

    #[test]
    fn test_unwrap_is_bounded() {
        // Triple nesting exceeds the bound; degrade instead of recursing
        let v = json!({"value": {"value": {"value": "too deep"}}});
        assert_eq!(SoftValue::of(Some(&v)).as_str("x"), "x");
    }

    #[test]
    fn test_wrapper_without_value_key_degrades() {
        let v = json!({"other": "field"});
        assert_eq!(SoftValue::of(Some(&v)).as_str("d"), "d");
    }

    #[test]
    fn test_list_bare_sequence() {
        let v = json!(["62.01", null, "62.02", 63]);
        assert_eq!(SoftValue::of(Some(&v)).as_list(), vec!["62.01", "62.02", "63"]);
    }

    #[test]
    fn test_list_preserves_order_and_duplicates() {
        let v = json!(["a", "b", "a"]);
        assert_eq!(SoftValue::of(Some(&v)).as_list(), vec!["a", "b", "a"]);
    }

    #[test]
    fn test_list_wrapped_sequence() {
        let v = json!({"value": ["one", "two"]});
        assert_eq!(SoftValue::of(Some(&v)).as_list(), vec!["one", "two"]);
    }

    #[test]
    fn test_list_wrapped_scalar_becomes_single_element() {
        let v = json!({"value": "solo"});
        assert_eq!(SoftValue::of(Some(&v)).as_list(), vec!["solo"]);
    }

    #[test]
    fn test_scalar_becomes_single_element_list() {
        let v = json!("solo");
        assert_eq!(SoftValue::of(Some(&v)).as_list(), vec!["solo"]);
    }

    #[test]
    fn test_f64_coercions() {
        assert_eq!(SoftValue::of(Some(&json!(12.5))).as_f64(), 12.5);
        assert_eq!(SoftValue::of(Some(&json!("7.25"))).as_f64(), 7.25);
        assert_eq!(SoftValue::of(Some(&json!("garbage"))).as_f64(), 0.0);
        assert_eq!(SoftValue::of(Some(&json!({"a": 1}))).as_f64(), 0.0);
        assert_eq!(SoftValue::of(Some(&json!([1, 2]))).as_f64(), 0.0);
        assert_eq!(SoftValue::of(Some(&json!(true))).as_f64(), 1.0);
    }

    #[test]
    fn test_i64_coercions() {
        assert_eq!(SoftValue::of(Some(&json!(3))).as_i64(), 3);
        assert_eq!(SoftValue::of(Some(&json!(3.9))).as_i64(), 3);
        assert_eq!(SoftValue::of(Some(&json!("14"))).as_i64(), 14);
        assert_eq!(SoftValue::of(Some(&json!("nope"))).as_i64(), 0);
    }

    #[test]
    fn test_key_on_missing_parent() {
        let v = json!({"basicInfo": {"titleRu": "T"}});
        assert_eq!(SoftValue::key(Some(&v), "missing").as_str(""), "");
        assert_eq!(SoftValue::key(None, "anything").as_str(""), "");
        // Keying into a scalar parent is absent, not a panic
        let s = json!("scalar");
        assert_eq!(SoftValue::key(Some(&s), "k").as_str(""), "");
    }
}
