//! Deep structural equality, ordering, sort and reverse over [`Value`]s
//!
//! Sequences compare by length first and only then element by element, so a
//! shorter array is always less than a longer one. Values of different kinds
//! order by kind: null, bool, integers, string, binary, address, array, map.

use crate::core::value::Value;
use std::cmp::Ordering;

/// Signed view of the two integer variants
#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum Number {
    Negative(i128),
    NonNegative(u128),
}

fn as_number(value: &Value) -> Option<Number> {
    match value {
        Value::Uint(n) => Some(Number::NonNegative(*n)),
        Value::Int(n) if *n < 0 => Some(Number::Negative(*n)),
        Value::Int(n) => Some(Number::NonNegative(*n as u128)),
        _ => None,
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Uint(_) | Value::Int(_) => 2,
        Value::String(_) => 3,
        Value::Binary(_) => 4,
        Value::Address(_) => 5,
        Value::Array(_) => 6,
        Value::Map(_) => 7,
    }
}

/// Structural equality
///
/// Scalars are equal when primitively equal. Arrays (and maps) are equal only
/// when both sides are the same kind of sequence with equal length and equal
/// elements. Mixed kinds are never equal.
pub fn equals(left: &Value, right: &Value) -> bool {
    if let (Some(l), Some(r)) = (as_number(left), as_number(right)) {
        return l == r;
    }
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(l), Value::Bool(r)) => l == r,
        (Value::String(l), Value::String(r)) => l == r,
        (Value::Binary(l), Value::Binary(r)) => l == r,
        (Value::Address(l), Value::Address(r)) => l == r,
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(a, b)| equals(a, b))
        }
        (Value::Map(l), Value::Map(r)) => {
            l.len() == r.len()
                && l
                    .iter()
                    .zip(r)
                    .all(|((lk, lv), (rk, rv))| equals(lk, rk) && equals(lv, rv))
        }
        _ => false,
    }
}

/// Total order used by `compare`, `sort` and map keys
pub fn compare(left: &Value, right: &Value) -> Ordering {
    if let (Some(l), Some(r)) = (as_number(left), as_number(right)) {
        return l.cmp(&r);
    }
    match (left, right) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(l), Value::Bool(r)) => l.cmp(r),
        (Value::String(l), Value::String(r)) => l.cmp(r),
        (Value::Binary(l), Value::Binary(r)) => l.cmp(r),
        (Value::Address(l), Value::Address(r)) => l.cmp(r),
        (Value::Array(l), Value::Array(r)) => l.len().cmp(&r.len()).then_with(|| {
            l.iter()
                .zip(r)
                .map(|(a, b)| compare(a, b))
                .find(|ord| ord.is_ne())
                .unwrap_or(Ordering::Equal)
        }),
        (Value::Map(l), Value::Map(r)) => l.len().cmp(&r.len()).then_with(|| {
            l.iter()
                .zip(r)
                .map(|((lk, lv), (rk, rv))| compare(lk, rk).then_with(|| compare(lv, rv)))
                .find(|ord| ord.is_ne())
                .unwrap_or(Ordering::Equal)
        }),
        _ => rank(left).cmp(&rank(right)),
    }
}

/// `"LT"`, `"EQ"` or `"GT"`
pub fn compare_label(left: &Value, right: &Value) -> &'static str {
    match compare(left, right) {
        Ordering::Less => "LT",
        Ordering::Equal => "EQ",
        Ordering::Greater => "GT",
    }
}

/// Stable ascending sort by adjacent swaps. The input is left untouched.
pub fn sort(items: &[Value]) -> Vec<Value> {
    let mut sorted = items.to_vec();
    let len = sorted.len();
    for pass in 0..len {
        let mut swapped = false;
        for i in 0..len - 1 - pass {
            if compare(&sorted[i], &sorted[i + 1]) == Ordering::Greater {
                sorted.swap(i, i + 1);
                swapped = true;
            }
        }
        if !swapped {
            break;
        }
    }
    sorted
}

/// Reversed copy of `items`
pub fn reverse(items: &[Value]) -> Vec<Value> {
    let len = items.len();
    (0..len).map(|i| items[len - 1 - i].clone()).collect()
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        equals(self, other)
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::address::Address;

    fn uints(values: &[u64]) -> Vec<Value> {
        values.iter().map(|&v| Value::from(v)).collect()
    }

    fn samples() -> Vec<Value> {
        vec![
            Value::Null,
            Value::from(false),
            Value::from(3u64),
            Value::int(-4),
            Value::from("b"),
            Value::from("a"),
            Value::binary(vec![1, 2]),
            Value::Address(Address::hash_of(b"x")),
            Value::Array(uints(&[9])),
            Value::Array(uints(&[1, 2])),
            Value::Array(vec![Value::Array(uints(&[5])), Value::from("z")]),
            Value::object([("k", Value::from(1u64))]),
        ]
    }

    #[test]
    fn test_equals_reflexive_and_reverse_involution() {
        for value in samples() {
            assert!(equals(&value, &value));
        }
        let items = samples();
        let twice = reverse(&reverse(&items));
        assert!(equals(&Value::Array(items), &Value::Array(twice)));
    }

    #[test]
    fn test_equals_heterogeneous_is_false() {
        assert!(!equals(&Value::Array(uints(&[1])), &Value::from(1u64)));
        assert!(!equals(&Value::from("1"), &Value::from(1u64)));
        assert!(!equals(&Value::Null, &Value::from(false)));
        assert!(!equals(&Value::Array(uints(&[1, 2])), &Value::Array(uints(&[1]))));
    }

    #[test]
    fn test_equals_numeric_across_variants() {
        assert!(equals(&Value::Int(5), &Value::Uint(5)));
        assert!(!equals(&Value::Int(-5), &Value::Uint(5)));
    }

    #[test]
    fn test_shorter_sequence_is_less() {
        let short = Value::Array(uints(&[100]));
        let long = Value::Array(uints(&[1, 2]));
        assert_eq!(compare(&short, &long), Ordering::Less);
        assert_eq!(compare_label(&long, &short), "GT");
    }

    #[test]
    fn test_compare_elementwise_and_natural() {
        assert_eq!(
            compare(&Value::Array(uints(&[1, 3])), &Value::Array(uints(&[1, 2]))),
            Ordering::Greater
        );
        assert_eq!(compare(&Value::int(-1), &Value::from(0u64)), Ordering::Less);
        assert_eq!(compare(&Value::from("a"), &Value::from("b")), Ordering::Less);
        assert_eq!(compare_label(&Value::Null, &Value::Null), "EQ");
    }

    #[test]
    fn test_compare_antisymmetric() {
        let items = samples();
        for a in &items {
            assert_eq!(compare(a, a), Ordering::Equal);
            for b in &items {
                assert_eq!(compare(a, b), compare(b, a).reverse());
                assert_eq!(compare(a, b) == Ordering::Equal, equals(a, b));
            }
        }
    }

    #[test]
    fn test_sort_properties() {
        let items = samples();
        let sorted = sort(&items);
        assert_eq!(sorted.len(), items.len());
        assert!(sorted
            .windows(2)
            .all(|pair| compare(&pair[0], &pair[1]) != Ordering::Greater));
        assert!(equals(
            &Value::Array(sort(&sorted)),
            &Value::Array(sorted.clone())
        ));
    }

    #[test]
    fn test_sort_does_not_touch_input() {
        let items = uints(&[3, 1, 2]);
        let sorted = sort(&items);
        assert_eq!(sorted, uints(&[1, 2, 3]));
        assert_eq!(items, uints(&[3, 1, 2]));
    }

    #[test]
    fn test_sort_is_stable() {
        // Int(2) and Uint(2) compare equal but are distinguishable by variant.
        let items = vec![Value::Uint(2), Value::from(1u64), Value::Int(2)];
        let sorted = sort(&items);
        assert!(matches!(sorted[1], Value::Uint(2)));
        assert!(matches!(sorted[2], Value::Int(2)));
    }

    #[test]
    fn test_sort_and_reverse_empty() {
        assert!(sort(&[]).is_empty());
        assert!(reverse(&[]).is_empty());
        assert_eq!(reverse(&uints(&[1, 2, 3])), uints(&[3, 2, 1]));
    }
}
