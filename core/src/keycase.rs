//! Recursive key renaming between `camelCase` and `snake_case`.
//!
//! # Design
//! The backend speaks `snake_case`, UI state is `camelCase`. Conversion runs
//! over a borrowed `serde_json::Value` and always builds a new value, so the
//! caller's payload is never touched. Only mapping keys are renamed; string
//! values, numbers, booleans and `null` pass through untouched.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::CaseError;

/// Which way keys are renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `firstName` -> `first_name`. Used for outgoing payloads.
    ToSnakeCase,
    /// `first_name` -> `firstName`. Used for incoming payloads.
    ToCamelCase,
}

impl FromStr for Direction {
    type Err = CaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "toSnakeCase" | "snake_case" | "send" => Ok(Direction::ToSnakeCase),
            "toCamelCase" | "camelCase" | "receive" => Ok(Direction::ToCamelCase),
            other => Err(CaseError::InvalidDirection(other.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ToSnakeCase => write!(f, "toSnakeCase"),
            Direction::ToCamelCase => write!(f, "toCamelCase"),
        }
    }
}

/// Convert every key of `data` in the given direction.
///
/// The top level must be a JSON object; arrays and scalars are rejected with
/// [`CaseError::InvalidInput`]. Below the top level any shape is accepted.
pub fn convert_keys(data: &Value, direction: Direction) -> Result<Value, CaseError> {
    if !data.is_object() {
        return Err(CaseError::InvalidInput);
    }
    let rename = match direction {
        Direction::ToSnakeCase => to_snake_case,
        Direction::ToCamelCase => to_camel_case,
    };
    Ok(walk(data, rename))
}

/// Same as [`convert_keys`] but takes the direction by name.
///
/// Input shape is validated before the direction name.
pub fn convert_keys_str(data: &Value, direction: &str) -> Result<Value, CaseError> {
    if !data.is_object() {
        return Err(CaseError::InvalidInput);
    }
    convert_keys(data, direction.parse()?)
}

fn walk(value: &Value, rename: fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => {
            let converted: Map<String, Value> = map
                .iter()
                .map(|(key, inner)| (rename(key), walk(inner, rename)))
                .collect();
            Value::Object(converted)
        }
        Value::Array(items) => Value::Array(items.iter().map(|item| walk(item, rename)).collect()),
        scalar => scalar.clone(),
    }
}

/// Replace each ASCII uppercase letter with `_` plus its lowercase form.
///
/// No acronym handling: `userID` becomes `user_i_d`, `Name` becomes `_name`.
pub fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Drop each `-` or `_` that precedes a word character and uppercase that
/// character.
pub fn to_camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '-' || c == '_' {
            if let Some(&next) = chars.peek() {
                if is_word_char(next) {
                    chars.next();
                    out.push(next.to_ascii_uppercase());
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snake_case_splits_on_uppercase() {
        assert_eq!(to_snake_case("firstName"), "first_name");
        assert_eq!(to_snake_case("hasMenstruation"), "has_menstruation");
        assert_eq!(to_snake_case("email"), "email");
    }

    #[test]
    fn snake_case_does_not_special_case_acronyms() {
        assert_eq!(to_snake_case("userID"), "user_i_d");
        assert_eq!(to_snake_case("Name"), "_name");
    }

    #[test]
    fn camel_case_joins_on_separators() {
        assert_eq!(to_camel_case("first_name"), "firstName");
        assert_eq!(to_camel_case("delete-account"), "deleteAccount");
        assert_eq!(to_camel_case("access_token_2"), "accessToken2");
    }

    #[test]
    fn camel_case_keeps_trailing_separator() {
        assert_eq!(to_camel_case("name_"), "name_");
        assert_eq!(to_camel_case("a_-b"), "a_B");
    }

    #[test]
    fn camel_case_collapses_doubled_underscore_once() {
        assert_eq!(to_camel_case("a__b"), "a_b");
    }

    #[test]
    fn converts_nested_objects_and_arrays() {
        let input = json!({
            "userProfile": {
                "firstName": "John",
                "medicationList": [
                    { "doseMg": 50, "takenAt": null },
                    "plainString",
                    42
                ]
            }
        });
        let out = convert_keys(&input, Direction::ToSnakeCase).unwrap();
        assert_eq!(
            out,
            json!({
                "user_profile": {
                    "first_name": "John",
                    "medication_list": [
                        { "dose_mg": 50, "taken_at": null },
                        "plainString",
                        42
                    ]
                }
            })
        );
    }

    #[test]
    fn string_values_are_not_renamed() {
        let input = json!({ "note": "someCamelValue" });
        let out = convert_keys(&input, Direction::ToSnakeCase).unwrap();
        assert_eq!(out["note"], "someCamelValue");
    }

    #[test]
    fn input_is_left_untouched() {
        let input = json!({ "firstName": "John" });
        let _ = convert_keys(&input, Direction::ToSnakeCase).unwrap();
        assert_eq!(input, json!({ "firstName": "John" }));
    }

    #[test]
    fn round_trip_restores_simple_keys() {
        let input = json!({ "firstName": "John", "lastName": "Doe" });
        let snake = convert_keys(&input, Direction::ToSnakeCase).unwrap();
        assert_eq!(snake, json!({ "first_name": "John", "last_name": "Doe" }));
        let camel = convert_keys(&snake, Direction::ToCamelCase).unwrap();
        assert_eq!(camel, input);
    }

    #[test]
    fn double_application_is_stable() {
        let snake = json!({ "first_name": "John" });
        let once = convert_keys(&snake, Direction::ToSnakeCase).unwrap();
        let twice = convert_keys(&once, Direction::ToSnakeCase).unwrap();
        assert_eq!(once, snake);
        assert_eq!(twice, snake);
    }

    #[test]
    fn top_level_array_is_rejected() {
        let err = convert_keys(&json!([{ "a": 1 }]), Direction::ToSnakeCase).unwrap_err();
        assert!(matches!(err, CaseError::InvalidInput));
    }

    #[test]
    fn top_level_scalars_are_rejected() {
        for value in [json!(1), json!("x"), json!(true), Value::Null] {
            let err = convert_keys(&value, Direction::ToCamelCase).unwrap_err();
            assert!(matches!(err, CaseError::InvalidInput));
        }
    }

    #[test]
    fn direction_parses_all_spellings() {
        for s in ["toSnakeCase", "snake_case", "send"] {
            assert_eq!(s.parse::<Direction>().unwrap(), Direction::ToSnakeCase);
        }
        for s in ["toCamelCase", "camelCase", "receive"] {
            assert_eq!(s.parse::<Direction>().unwrap(), Direction::ToCamelCase);
        }
    }

    #[test]
    fn unknown_direction_is_rejected() {
        let err = convert_keys_str(&json!({}), "kebab-case").unwrap_err();
        assert!(matches!(err, CaseError::InvalidDirection(ref d) if d == "kebab-case"));
    }

    #[test]
    fn input_shape_is_checked_before_direction() {
        let err = convert_keys_str(&json!([]), "kebab-case").unwrap_err();
        assert!(matches!(err, CaseError::InvalidInput));
    }
}
