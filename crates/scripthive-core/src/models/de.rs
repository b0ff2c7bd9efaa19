//! Lenient deserializers for backend fields whose JSON type varies between
//! endpoints (ids and amounts arrive as either strings or numbers).

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

fn value_to_string<E: de::Error>(value: Value) -> Result<Option<String>, E> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(E::custom(format!("expected string or number, got {}", other))),
    }
}

/// Accept a string or a number, producing a `String`. Null becomes empty.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_string(value)?.unwrap_or_default())
}

/// Optional variant of [`string_or_number`].
pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_string(value)
}

/// Accept a number or a numeric string, producing an `f64`. Null becomes zero.
pub fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0.0),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| de::Error::custom("number out of range")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("not a number: {}", s))),
        other => Err(de::Error::custom(format!("expected number, got {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "string_or_number")]
        id: String,
        #[serde(default, deserialize_with = "opt_string_or_number")]
        other: Option<String>,
        #[serde(default, deserialize_with = "number_or_string")]
        amount: f64,
    }

    #[test]
    fn test_mixed_id_types() {
        let a: Probe = serde_json::from_str(r#"{"id": 42, "amount": "1500"}"#).unwrap();
        assert_eq!(a.id, "42");
        assert_eq!(a.other, None);
        assert_eq!(a.amount, 1500.0);

        let b: Probe =
            serde_json::from_str(r#"{"id": "abc", "other": 7, "amount": 12.5}"#).unwrap();
        assert_eq!(b.id, "abc");
        assert_eq!(b.other.as_deref(), Some("7"));
        assert_eq!(b.amount, 12.5);
    }

    #[test]
    fn test_rejects_objects() {
        assert!(serde_json::from_str::<Probe>(r#"{"id": {"x": 1}}"#).is_err());
        assert!(serde_json::from_str::<Probe>(r#"{"id": "1", "amount": "ten"}"#).is_err());
    }
}
