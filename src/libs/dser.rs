use std::str::FromStr;

use mysql::{FromValueError, Value};
use serde::{Deserialize, Deserializer};

/// Intermediate used to read a [`choices!`](crate::choices) enum out of a
/// VARCHAR column.
pub struct ChoiceIr<T>(pub T);

impl<T: FromStr> TryFrom<Value> for ChoiceIr<T> {
    type Error = FromValueError;
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let parsed = match &value {
            Value::Bytes(bytes) => std::str::from_utf8(bytes).ok().and_then(|s| s.parse().ok()),
            _ => None,
        };
        parsed.map(ChoiceIr).ok_or(FromValueError(value))
    }
}

impl<T: Into<Value>> From<ChoiceIr<T>> for Value {
    fn from(ir: ChoiceIr<T>) -> Value {
        ir.0.into()
    }
}

/// A closed set of string values, stored as VARCHAR and sent as JSON strings.
#[macro_export]
macro_rules! choices {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($var:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($var),+
        }
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$var),+];
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$var => $text),+
                }
            }
        }
        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
        impl std::str::FromStr for $name {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($text => Ok($name::$var),)+
                    other => Err(format!("invalid {} `{}`", stringify!($name), other)),
                }
            }
        }
        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(self.as_str())
            }
        }
        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let s = <String as serde::Deserialize>::deserialize(d)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
        impl From<$name> for mysql::Value {
            fn from(value: $name) -> mysql::Value {
                mysql::Value::from(value.as_str())
            }
        }
        impl From<$crate::libs::dser::ChoiceIr<$name>> for $name {
            fn from(ir: $crate::libs::dser::ChoiceIr<$name>) -> $name {
                ir.0
            }
        }
        impl mysql::prelude::FromValue for $name {
            type Intermediate = $crate::libs::dser::ChoiceIr<$name>;
        }
    };
}

/// Treat `""` (as sent by empty form fields) the same as a missing value.
pub fn deser_empty_to_none<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Deserialize::deserialize(de)?;
    Ok(value.and_then(|v| op::ternary!(v.trim().is_empty() => None; Some(v))))
}

/// Accept either a JSON number or a numeric string such as `"1,250.50"`.
pub fn deser_lenient_f64<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Num {
        F(f64),
        S(String),
    }
    match Option::<Num>::deserialize(de)? {
        None => Ok(None),
        Some(Num::F(f)) => Ok(Some(f)),
        Some(Num::S(s)) if s.trim().is_empty() => Ok(None),
        Some(Num::S(s)) => s
            .replace(',', "")
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "deser_empty_to_none")]
        priority: Option<String>,
        #[serde(default, deserialize_with = "deser_lenient_f64")]
        price: Option<f64>,
    }

    #[test]
    fn empty_strings_become_none() {
        let form: Form = serde_json::from_str(r#"{"priority": "  ", "price": ""}"#).unwrap();
        assert!(form.priority.is_none());
        assert!(form.price.is_none());
    }

    #[test]
    fn prices_accept_strings_with_commas() {
        let form: Form = serde_json::from_str(r#"{"price": "1,250.50"}"#).unwrap();
        assert_eq!(form.price, Some(1250.5));
        let form: Form = serde_json::from_str(r#"{"price": 99}"#).unwrap();
        assert_eq!(form.price, Some(99.0));
        assert!(serde_json::from_str::<Form>(r#"{"price": "cheap"}"#).is_err());
    }
}
