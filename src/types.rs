use std::fmt;

/// An ECMAScript 5.1 language value (§8).
#[derive(Clone, Debug, Default, PartialEq)]
pub enum JsValue {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
    Object(JsObject),
}

// UTF-16 code unit string per §8.4
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct JsString {
    pub code_units: Vec<u16>,
}

impl JsString {
    pub fn from_str(s: &str) -> Self {
        Self {
            code_units: s.encode_utf16().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.code_units.is_empty()
    }

    pub fn len(&self) -> usize {
        self.code_units.len()
    }

    pub fn to_rust_string(&self) -> String {
        String::from_utf16_lossy(&self.code_units)
    }

    pub fn concat(&self, other: &JsString) -> JsString {
        let mut code_units = Vec::with_capacity(self.len() + other.len());
        code_units.extend_from_slice(&self.code_units);
        code_units.extend_from_slice(&other.code_units);
        JsString { code_units }
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rust_string())
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        JsString::from_str(s)
    }
}

/// Handle to an object living in the interpreter's object table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JsObject {
    pub id: u64,
}

impl JsValue {
    pub fn string(s: &str) -> Self {
        JsValue::String(JsString::from_str(s))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, JsValue::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, JsValue::Null)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, JsValue::Boolean(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, JsValue::Number(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, JsValue::String(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, JsValue::Object(_))
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, JsValue::Undefined | JsValue::Null)
    }

    pub fn as_object(&self) -> Option<JsObject> {
        match self {
            JsValue::Object(o) => Some(*o),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            JsValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

// §8.5 / §11 Number operations
pub mod number_ops {
    pub fn unary_minus(x: f64) -> f64 {
        if x.is_nan() { f64::NAN } else { -x }
    }

    pub fn bitwise_not(x: f64) -> f64 {
        f64::from(!to_int32(x))
    }

    pub fn left_shift(x: f64, y: f64) -> f64 {
        let shift = to_uint32(y) & 0x1F;
        f64::from(to_int32(x).wrapping_shl(shift))
    }

    pub fn signed_right_shift(x: f64, y: f64) -> f64 {
        let shift = to_uint32(y) & 0x1F;
        f64::from(to_int32(x).wrapping_shr(shift))
    }

    pub fn unsigned_right_shift(x: f64, y: f64) -> f64 {
        let shift = to_uint32(y) & 0x1F;
        f64::from(to_uint32(x).wrapping_shr(shift))
    }

    pub fn less_than(x: f64, y: f64) -> Option<bool> {
        if x.is_nan() || y.is_nan() {
            None
        } else {
            Some(x < y)
        }
    }

    pub fn bitwise_and(x: f64, y: f64) -> f64 {
        f64::from(to_int32(x) & to_int32(y))
    }

    pub fn bitwise_xor(x: f64, y: f64) -> f64 {
        f64::from(to_int32(x) ^ to_int32(y))
    }

    pub fn bitwise_or(x: f64, y: f64) -> f64 {
        f64::from(to_int32(x) | to_int32(y))
    }

    // §9.8.1 ToString applied to the Number type
    pub fn to_string(x: f64) -> String {
        if x.is_nan() {
            return "NaN".to_string();
        }
        if x == 0.0 {
            return "0".to_string();
        }
        if x.is_infinite() {
            return if x > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
        }
        let mut buf = ryu_js::Buffer::new();
        buf.format(x).to_string()
    }

    // §9.5 ToInt32
    pub fn to_int32(x: f64) -> i32 {
        to_uint32(x) as i32
    }

    // §9.6 ToUint32
    pub fn to_uint32(x: f64) -> u32 {
        if x.is_nan() || x.is_infinite() || x == 0.0 {
            return 0;
        }
        let int_val = x.trunc();
        (int_val.rem_euclid(4_294_967_296.0)) as u32
    }
}

impl fmt::Display for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "undefined"),
            JsValue::Null => write!(f, "null"),
            JsValue::Boolean(b) => write!(f, "{b}"),
            JsValue::Number(n) => write!(f, "{}", number_ops::to_string(*n)),
            JsValue::String(s) => write!(f, "{s}"),
            JsValue::Object(_) => write!(f, "[object Object]"),
        }
    }
}
