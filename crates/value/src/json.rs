use std::rc::Rc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::value::Value;

/// Largest magnitude at which every integer is exactly representable in f64.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

impl Value {
    /// Convert to a plain JSON tree. NaN and infinities become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(x) => number_to_json(*x),
            Self::String(s) => serde_json::Value::String(s.to_string()),
            Self::Array(items) => {
                serde_json::Value::Array(items.borrow().iter().map(Value::to_json).collect())
            }
            Self::Object(entries) => serde_json::Value::Object(
                entries
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

// Whole numbers print without a trailing `.0`.
fn number_to_json(x: f64) -> serde_json::Value {
    if x.fract() == 0.0 && x.abs() <= MAX_SAFE_INTEGER {
        serde_json::Value::from(x as i64)
    } else {
        serde_json::Number::from_f64(x).map_or(serde_json::Value::Null, serde_json::Value::Number)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::String(Rc::from(s)),
            serde_json::Value::Array(items) => Self::array(items.into_iter().map(Value::from)),
            serde_json::Value::Object(entries) => {
                Self::object(entries.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        value.to_json()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_roundtrip_preserves_content() {
        let source = json!({ "list": [1, 2.5, null, true], "name": "x" });
        let value = Value::from(source.clone());
        assert_eq!(value.to_json(), source);
    }

    #[test]
    fn non_finite_numbers_become_null() {
        assert_eq!(Value::from(f64::NAN).to_json(), serde_json::Value::Null);
        assert_eq!(
            Value::from(f64::INFINITY).to_json(),
            serde_json::Value::Null
        );
    }

    #[test]
    fn serde_goes_through_json() {
        let value: Value = serde_json::from_str(r#"{"a":[1,2]}"#).unwrap();
        assert_eq!(value.kind(), "object");
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"a":[1,2]}"#);
    }

    #[test]
    fn deserialized_containers_are_fresh_allocations() {
        let a: Value = serde_json::from_str("[1]").unwrap();
        let b: Value = serde_json::from_str("[1]").unwrap();
        assert_eq!(a, b);
        assert!(!rewind_kernel::Snapshot::same_ref(&a, &b));
    }
}
