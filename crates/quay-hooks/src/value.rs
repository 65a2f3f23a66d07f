use std::cmp::Ordering;
use std::collections::BTreeMap;

use thiserror::Error;

use crate::model::ComparisonOperator;

/// A runtime value flowing through hook conditions.
///
/// Values are heterogeneous at run time because they originate from inline
/// JSON literals and from arbitrary request fields; comparison dispatches on
/// the pair of tags.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Array(Vec<FieldValue>),
    Object(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    pub fn class_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Uint(_) => "uint",
            FieldValue::Float(_) => "float",
            FieldValue::Str(_) => "string",
            FieldValue::Bytes(_) => "bytes",
            FieldValue::Array(_) => "array",
            FieldValue::Object(_) => "object",
        }
    }
}

impl From<&serde_json::Value> for FieldValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    FieldValue::Uint(u)
                } else {
                    FieldValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => FieldValue::Str(s.clone()),
            serde_json::Value::Array(items) => {
                FieldValue::Array(items.iter().map(FieldValue::from).collect())
            }
            serde_json::Value::Object(fields) => FieldValue::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), FieldValue::from(v)))
                    .collect(),
            ),
        }
    }
}

/// The two operands belong to incompatible comparison classes (or one of
/// them does not participate in the requested comparison, e.g. NaN, or an
/// ordering over nulls or mappings).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot compare {left} with {right}")]
pub struct InvalidComparison {
    pub left: &'static str,
    pub right: &'static str,
}

impl InvalidComparison {
    fn between(left: &FieldValue, right: &FieldValue) -> Self {
        Self {
            left: left.class_name(),
            right: right.class_name(),
        }
    }
}

/// Apply a comparison operator to two runtime values.
///
/// Equality admits nulls and mappings; the four ordering operators reject
/// them. Numeric operands promote to a common domain and compare by exact
/// value, with no float tolerance.
pub fn evaluate(
    op: ComparisonOperator,
    left: &FieldValue,
    right: &FieldValue,
) -> Result<bool, InvalidComparison> {
    match op {
        ComparisonOperator::Equal => equals(left, right),
        ComparisonOperator::GreaterThan => Ok(ordering(left, right)? == Ordering::Greater),
        ComparisonOperator::GreaterThanOrEqual => Ok(ordering(left, right)? != Ordering::Less),
        ComparisonOperator::LessThan => Ok(ordering(left, right)? == Ordering::Less),
        ComparisonOperator::LessThanOrEqual => Ok(ordering(left, right)? != Ordering::Greater),
    }
}

fn equals(left: &FieldValue, right: &FieldValue) -> Result<bool, InvalidComparison> {
    use FieldValue::*;

    match (left, right) {
        // null is equal only to null
        (Null, Null) => Ok(true),
        (Null, _) | (_, Null) => Ok(false),

        // mappings support equality only: keys must match as a set and
        // per-key values must compare equal
        (Object(a), Object(b)) => {
            if a.len() != b.len() {
                return Ok(false);
            }
            for (key, value_a) in a {
                match b.get(key) {
                    Some(value_b) if equals(value_a, value_b)? => {}
                    _ => return Ok(false),
                }
            }
            Ok(true)
        }
        (Object(_), _) | (_, Object(_)) => Err(InvalidComparison::between(left, right)),

        (Array(a), Array(b)) => {
            if a.len() != b.len() {
                return Ok(false);
            }
            for (value_a, value_b) in a.iter().zip(b) {
                if !equals(value_a, value_b)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }

        _ => Ok(ordering(left, right)? == Ordering::Equal),
    }
}

fn ordering(left: &FieldValue, right: &FieldValue) -> Result<Ordering, InvalidComparison> {
    use FieldValue::*;

    match (left, right) {
        (Bool(_) | Int(_) | Uint(_) | Float(_), Bool(_) | Int(_) | Uint(_) | Float(_)) => {
            numeric_ordering(left, right)
        }
        // lexicographic over code units / octets
        (Str(a), Str(b)) => Ok(a.cmp(b)),
        (Bytes(a), Bytes(b)) => Ok(a.cmp(b)),
        (Array(a), Array(b)) => {
            for (value_a, value_b) in a.iter().zip(b) {
                match ordering(value_a, value_b)? {
                    Ordering::Equal => continue,
                    unequal => return Ok(unequal),
                }
            }
            // prefixes order before their extensions
            Ok(a.len().cmp(&b.len()))
        }
        _ => Err(InvalidComparison::between(left, right)),
    }
}

enum Num {
    I(i64),
    U(u64),
    F(f64),
}

fn numeric_ordering(left: &FieldValue, right: &FieldValue) -> Result<Ordering, InvalidComparison> {
    let fail = || InvalidComparison::between(left, right);

    let promote = |value: &FieldValue| match value {
        FieldValue::Bool(b) => Num::I(i64::from(*b)),
        FieldValue::Int(i) => Num::I(*i),
        FieldValue::Uint(u) => Num::U(*u),
        FieldValue::Float(f) => Num::F(*f),
        _ => unreachable!("numeric_ordering called with non-numeric operand"),
    };

    match (promote(left), promote(right)) {
        (Num::I(a), Num::I(b)) => Ok(a.cmp(&b)),
        (Num::U(a), Num::U(b)) => Ok(a.cmp(&b)),
        (Num::I(a), Num::U(b)) => Ok(cmp_i64_u64(a, b)),
        (Num::U(a), Num::I(b)) => Ok(cmp_i64_u64(b, a).reverse()),
        (Num::F(a), Num::F(b)) => a.partial_cmp(&b).ok_or_else(fail),
        (Num::I(a), Num::F(b)) => cmp_i64_f64(a, b).ok_or_else(fail),
        (Num::F(a), Num::I(b)) => cmp_i64_f64(b, a).map(Ordering::reverse).ok_or_else(fail),
        (Num::U(a), Num::F(b)) => cmp_u64_f64(a, b).ok_or_else(fail),
        (Num::F(a), Num::U(b)) => cmp_u64_f64(b, a).map(Ordering::reverse).ok_or_else(fail),
    }
}

fn cmp_i64_u64(a: i64, b: u64) -> Ordering {
    if a < 0 {
        Ordering::Less
    } else {
        (a as u64).cmp(&b)
    }
}

// Exact i64-vs-f64 comparison. Every f64 with magnitude below 2^63 truncates
// to an exactly-representable i64, so the integral part compares without
// rounding; the fractional part only matters on ties. NaN yields None.
fn cmp_i64_f64(a: i64, b: f64) -> Option<Ordering> {
    if b.is_nan() {
        return None;
    }
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    if b >= TWO_POW_63 {
        return Some(Ordering::Less);
    }
    if b < -TWO_POW_63 {
        return Some(Ordering::Greater);
    }
    let truncated = b.trunc();
    match a.cmp(&(truncated as i64)) {
        Ordering::Equal if b > truncated => Some(Ordering::Less),
        Ordering::Equal if b < truncated => Some(Ordering::Greater),
        other => Some(other),
    }
}

fn cmp_u64_f64(a: u64, b: f64) -> Option<Ordering> {
    if b.is_nan() {
        return None;
    }
    const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;
    if b >= TWO_POW_64 {
        return Some(Ordering::Less);
    }
    if b < 0.0 {
        return Some(Ordering::Greater);
    }
    let truncated = b.trunc();
    match a.cmp(&(truncated as u64)) {
        Ordering::Equal if b > truncated => Some(Ordering::Less),
        other => Some(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ComparisonOperator::*;
    use FieldValue::*;

    fn obj(pairs: &[(&str, FieldValue)]) -> FieldValue {
        Object(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_integer_widths_compare_by_value() {
        assert!(evaluate(Equal, &Int(3), &Uint(3)).unwrap());
        assert!(evaluate(LessThan, &Int(-1), &Uint(0)).unwrap());
        assert!(evaluate(GreaterThan, &Uint(u64::MAX), &Int(i64::MAX)).unwrap());
    }

    #[test]
    fn test_bool_promotes_into_the_numeric_class() {
        assert!(evaluate(LessThan, &Bool(false), &Bool(true)).unwrap());
        assert!(evaluate(Equal, &Bool(true), &Int(1)).unwrap());
        assert!(evaluate(LessThan, &Bool(false), &Float(0.5)).unwrap());
    }

    #[test]
    fn test_int_float_comparison_is_exact() {
        assert!(evaluate(Equal, &Int(3), &Float(3.0)).unwrap());
        assert!(evaluate(LessThan, &Int(3), &Float(3.5)).unwrap());
        assert!(evaluate(GreaterThan, &Int(-3), &Float(-3.5)).unwrap());

        // 2^63 rounds to itself as a float; i64::MAX must still order below it
        assert!(evaluate(LessThan, &Int(i64::MAX), &Float(9_223_372_036_854_775_808.0)).unwrap());
        assert!(evaluate(GreaterThan, &Uint(u64::MAX), &Float(-1.0)).unwrap());

        // a float the integer cannot exactly equal
        assert!(!evaluate(Equal, &Int(1 << 50), &Float((1u64 << 50) as f64 + 0.5)).unwrap());
    }

    #[test]
    fn test_nan_fails_every_comparison() {
        assert!(evaluate(Equal, &Float(f64::NAN), &Float(1.0)).is_err());
        assert!(evaluate(LessThan, &Int(1), &Float(f64::NAN)).is_err());
    }

    #[test]
    fn test_infinities_order_beyond_integers() {
        assert!(evaluate(LessThan, &Int(i64::MAX), &Float(f64::INFINITY)).unwrap());
        assert!(evaluate(GreaterThan, &Int(i64::MIN), &Float(f64::NEG_INFINITY)).unwrap());
    }

    #[test]
    fn test_strings_and_bytes_are_lexicographic() {
        assert!(evaluate(LessThan, &Str("abc".into()), &Str("abd".into())).unwrap());
        assert!(evaluate(LessThan, &Str("ab".into()), &Str("abc".into())).unwrap());
        assert!(evaluate(GreaterThan, &Bytes(vec![2, 0]), &Bytes(vec![1, 255])).unwrap());
    }

    #[test]
    fn test_null_is_equal_only_to_null() {
        assert!(evaluate(Equal, &Null, &Null).unwrap());
        assert!(!evaluate(Equal, &Null, &Int(0)).unwrap());
        assert!(evaluate(LessThanOrEqual, &Null, &Null).is_err());
        assert!(evaluate(LessThan, &Null, &Int(1)).is_err());
    }

    #[test]
    fn test_sequences_compare_element_wise() {
        let short = Array(vec![Int(1), Int(2)]);
        let long = Array(vec![Int(1), Int(2), Int(3)]);
        let bigger = Array(vec![Int(1), Int(9)]);

        assert!(evaluate(LessThan, &short, &long).unwrap());
        assert!(evaluate(LessThan, &short, &bigger).unwrap());
        assert!(evaluate(Equal, &short, &Array(vec![Int(1), Uint(2)])).unwrap());
    }

    #[test]
    fn test_mappings_support_equality_only() {
        let a = obj(&[("x", Int(1)), ("y", Str("v".into()))]);
        let b = obj(&[("y", Str("v".into())), ("x", Uint(1))]);
        let c = obj(&[("x", Int(1))]);

        assert!(evaluate(Equal, &a, &b).unwrap());
        assert!(!evaluate(Equal, &a, &c).unwrap());
        assert!(evaluate(LessThan, &a, &b).is_err());
        assert!(evaluate(Equal, &a, &Int(1)).is_err());
    }

    #[test]
    fn test_cross_class_comparison_fails() {
        assert!(evaluate(Equal, &Str("1".into()), &Int(1)).is_err());
        assert!(evaluate(LessThan, &Bytes(vec![1]), &Str("x".into())).is_err());
        assert!(evaluate(Equal, &Array(vec![]), &Str("[]".into())).is_err());
    }

    #[test]
    fn test_from_json_number_tags() {
        let v: serde_json::Value = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(FieldValue::from(&v), Uint(u64::MAX));

        let v: serde_json::Value = serde_json::from_str("-7").unwrap();
        assert_eq!(FieldValue::from(&v), Int(-7));

        let v: serde_json::Value = serde_json::from_str("2.5").unwrap();
        assert_eq!(FieldValue::from(&v), Float(2.5));
    }
}
