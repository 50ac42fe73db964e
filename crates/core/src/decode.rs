use crate::money::MoneyValue;
use serde_json::Value;
use std::fmt;

/// JSON-shape failure while reading an API response tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    FieldMissing { path: String },
    TypeMismatch { path: String, expected: &'static str },
}

impl DecodeError {
    pub fn prefixed(self, parent: &str) -> Self {
        match self {
            DecodeError::FieldMissing { path } => DecodeError::FieldMissing {
                path: format!("{parent}.{path}"),
            },
            DecodeError::TypeMismatch { path, expected } => DecodeError::TypeMismatch {
                path: format!("{parent}.{path}"),
                expected,
            },
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::FieldMissing { path } => write!(f, "missing field {path}"),
            DecodeError::TypeMismatch { path, expected } => {
                write!(f, "field {path} is not a {expected}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Follows a fixed field path and returns the string leaf.
pub fn extract_str<'a>(node: &'a Value, path: &[&str]) -> Result<&'a str, DecodeError> {
    let mut cur = node;
    for (i, key) in path.iter().enumerate() {
        cur = cur.get(key).ok_or_else(|| DecodeError::FieldMissing {
            path: path[..=i].join("."),
        })?;
    }
    cur.as_str().ok_or_else(|| DecodeError::TypeMismatch {
        path: path.join("."),
        expected: "string",
    })
}

/// Reads the sibling `units` (string-encoded integer) and `nano` (number)
/// fields. Both must be present; a partial pair is a decode error.
pub fn extract_money(node: &Value) -> Result<MoneyValue, DecodeError> {
    let units_node = node.get("units").ok_or_else(|| DecodeError::FieldMissing {
        path: "units".to_string(),
    })?;
    let units = units_node
        .as_str()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(DecodeError::TypeMismatch {
            path: "units".to_string(),
            expected: "string-encoded integer",
        })?;

    let nano_node = node.get("nano").ok_or_else(|| DecodeError::FieldMissing {
        path: "nano".to_string(),
    })?;
    let nano = nano_node
        .as_i64()
        .and_then(|n| i32::try_from(n).ok())
        .ok_or(DecodeError::TypeMismatch {
            path: "nano".to_string(),
            expected: "number",
        })?;

    Ok(MoneyValue { units, nano })
}

/// `extract_money` for a named sub-object, with the parent field on the
/// error path.
pub fn extract_money_at(node: &Value, field: &str) -> Result<MoneyValue, DecodeError> {
    let sub = node.get(field).ok_or_else(|| DecodeError::FieldMissing {
        path: field.to_string(),
    })?;
    extract_money(sub).map_err(|err| err.prefixed(field))
}

/// Picks the last account whose `id` is a non-empty string. Last match wins.
pub fn select_account_id(accounts: &Value) -> Result<String, DecodeError> {
    let list = accounts
        .get("accounts")
        .and_then(Value::as_array)
        .ok_or_else(|| DecodeError::FieldMissing {
            path: "accounts".to_string(),
        })?;

    let mut selected: Option<&str> = None;
    for entry in list {
        if let Some(id) = entry.get("id").and_then(Value::as_str) {
            if !id.is_empty() {
                selected = Some(id);
            }
        }
    }

    selected
        .map(str::to_string)
        .ok_or_else(|| DecodeError::FieldMissing {
            path: "accounts[].id".to_string(),
        })
}
