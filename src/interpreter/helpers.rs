use super::*;

// §9.2 ToBoolean
pub(crate) fn to_boolean(val: &JsValue) -> bool {
    match val {
        JsValue::Undefined | JsValue::Null => false,
        JsValue::Boolean(b) => *b,
        JsValue::Number(n) => *n != 0.0 && !n.is_nan(),
        JsValue::String(s) => !s.is_empty(),
        JsValue::Object(_) => true,
    }
}

// §9.3 ToNumber for primitives; objects go through Interpreter::to_number
pub(crate) fn to_number(val: &JsValue) -> f64 {
    match val {
        JsValue::Undefined => f64::NAN,
        JsValue::Null => 0.0,
        JsValue::Boolean(b) => *b as u8 as f64,
        JsValue::Number(n) => *n,
        JsValue::String(s) => string_to_number(s),
        JsValue::Object(_) => f64::NAN,
    }
}

// §9.3.1 ToNumber applied to the String type
pub(crate) fn string_to_number(s: &JsString) -> f64 {
    let rust_str = s.to_rust_string();
    let trimmed = rust_str.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    if trimmed.is_empty() {
        return 0.0;
    }
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return f64::NAN;
        }
        return hex
            .chars()
            .fold(0.0, |acc, c| acc * 16.0 + c.to_digit(16).unwrap_or(0) as f64);
    }
    let unsigned = trimmed.trim_start_matches(['+', '-']);
    if unsigned == "Infinity" {
        return if trimmed.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }
    // Rust accepts "inf", "nan" and friends; ES5 does not
    if !unsigned
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

// §9.8 ToString for primitives
pub(crate) fn to_js_string(val: &JsValue) -> JsString {
    match val {
        JsValue::String(s) => s.clone(),
        other => JsString::from_str(&other.to_string()),
    }
}

pub(crate) fn same_value(left: &JsValue, right: &JsValue) -> bool {
    match (left, right) {
        (JsValue::Number(a), JsValue::Number(b)) => {
            if a.is_nan() && b.is_nan() {
                return true;
            }
            if *a == 0.0 && *b == 0.0 {
                return a.is_sign_positive() == b.is_sign_positive();
            }
            a == b
        }
        _ => strict_equality(left, right),
    }
}

// §11.9.6
pub(crate) fn strict_equality(left: &JsValue, right: &JsValue) -> bool {
    match (left, right) {
        (JsValue::Undefined, JsValue::Undefined) => true,
        (JsValue::Null, JsValue::Null) => true,
        (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
        (JsValue::Number(a), JsValue::Number(b)) => a == b,
        (JsValue::String(a), JsValue::String(b)) => a == b,
        (JsValue::Object(a), JsValue::Object(b)) => a.id == b.id,
        _ => false,
    }
}

// §11.9.3 restricted to primitives; the object cases are handled by
// Interpreter::loose_equals before calling in here.
pub(crate) fn abstract_equality(left: &JsValue, right: &JsValue) -> bool {
    if std::mem::discriminant(left) == std::mem::discriminant(right) {
        return strict_equality(left, right);
    }
    if (left.is_null() && right.is_undefined()) || (left.is_undefined() && right.is_null()) {
        return true;
    }
    if left.is_number() && right.is_string() {
        return abstract_equality(left, &JsValue::Number(to_number(right)));
    }
    if left.is_string() && right.is_number() {
        return abstract_equality(&JsValue::Number(to_number(left)), right);
    }
    if left.is_boolean() {
        return abstract_equality(&JsValue::Number(to_number(left)), right);
    }
    if right.is_boolean() {
        return abstract_equality(left, &JsValue::Number(to_number(right)));
    }
    false
}

// §11.8.5 on primitives. `None` stands for undefined (a NaN operand).
pub(crate) fn abstract_relational(left: &JsValue, right: &JsValue) -> Option<bool> {
    if let (JsValue::String(l), JsValue::String(r)) = (left, right) {
        return Some(l.code_units < r.code_units);
    }
    number_ops::less_than(to_number(left), to_number(right))
}

pub(crate) fn typeof_val(val: &JsValue, objects: &[Option<ObjectRef>]) -> &'static str {
    match val {
        JsValue::Undefined => "undefined",
        JsValue::Null => "object",
        JsValue::Boolean(_) => "boolean",
        JsValue::Number(_) => "number",
        JsValue::String(_) => "string",
        JsValue::Object(o) => {
            if let Some(Some(obj)) = objects.get(o.id as usize)
                && obj.borrow().is_callable()
            {
                return "function";
            }
            "object"
        }
    }
}

/// Canonical array index of a property key, if it is one.
pub(crate) fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<u32>()
        .ok()
        .filter(|&n| n != u32::MAX)
        .map(|n| n as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> JsValue {
        JsValue::string(v)
    }

    #[test]
    fn string_numbers() {
        assert_eq!(to_number(&s("  42 ")), 42.0);
        assert_eq!(to_number(&s("0x1F")), 31.0);
        assert_eq!(to_number(&s("")), 0.0);
        assert_eq!(to_number(&s("-Infinity")), f64::NEG_INFINITY);
        assert!(to_number(&s("inf")).is_nan());
        assert!(to_number(&s("12px")).is_nan());
        assert!(to_number(&s("0x")).is_nan());
    }

    #[test]
    fn loose_equality_on_primitives() {
        assert!(abstract_equality(&JsValue::Null, &JsValue::Undefined));
        assert!(abstract_equality(&s("1"), &JsValue::Number(1.0)));
        assert!(abstract_equality(&JsValue::Boolean(true), &s("1")));
        assert!(!abstract_equality(&JsValue::Null, &JsValue::Number(0.0)));
        assert!(!strict_equality(&s("1"), &JsValue::Number(1.0)));
        assert!(!strict_equality(&JsValue::Number(f64::NAN), &JsValue::Number(f64::NAN)));
    }

    #[test]
    fn same_value_distinguishes_zeroes() {
        assert!(same_value(&JsValue::Number(f64::NAN), &JsValue::Number(f64::NAN)));
        assert!(!same_value(&JsValue::Number(0.0), &JsValue::Number(-0.0)));
    }

    #[test]
    fn relational_compares_code_units() {
        assert_eq!(abstract_relational(&s("a"), &s("b")), Some(true));
        assert_eq!(abstract_relational(&s("10"), &s("9")), Some(true));
        assert_eq!(abstract_relational(&JsValue::Number(10.0), &s("9")), Some(false));
        assert_eq!(abstract_relational(&JsValue::Undefined, &JsValue::Number(1.0)), None);
    }

    #[test]
    fn array_indices() {
        assert_eq!(array_index("0"), Some(0));
        assert_eq!(array_index("17"), Some(17));
        assert_eq!(array_index("01"), None);
        assert_eq!(array_index("length"), None);
        assert_eq!(array_index("4294967295"), None);
    }
}
