//! Serde helpers for the exchange's "everything is a string" wire format.
//!
//! Numbers travel as strings and are parsed with `FromStr`, so decimals keep
//! their exact value. Request flags are written as `True`/`False`.

/// Numbers encoded as JSON strings, e.g. `"31872.14"` or `"1700000000"`.
pub mod number {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use std::{fmt::Display, str::FromStr};

    pub fn serialize<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.trim()
            .parse()
            .map_err(|e| D::Error::custom(format!("invalid number {:?}: {}", raw, e)))
    }
}

/// Optional string-encoded numbers. Pair with `skip_serializing_if = "Option::is_none"`.
pub mod option_number {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use std::{fmt::Display, str::FromStr};

    pub fn serialize<T: Display, S: Serializer>(
        value: &Option<T>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| D::Error::custom(format!("invalid number {:?}: {}", raw, e))),
        }
    }
}

fn format_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

/// Optional request flags, written as `"True"` / `"False"`. Pair with
/// `skip_serializing_if = "Option::is_none"`. No response carries a boolean.
pub mod option_boolean {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Option<bool>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_str(super::format_bool(*v)),
            None => serializer.serialize_none(),
        }
    }
}

/// Exchange order timestamps, e.g. `2024-01-31 14:43:15.796000`.
pub mod datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .map_err(|e| D::Error::custom(format!("invalid datetime {:?}: {}", raw, e)))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        #[serde(with = "super::number")]
        amount: Decimal,
        #[serde(with = "super::number")]
        timestamp: i64,
    }

    #[derive(Serialize)]
    struct Flags {
        #[serde(with = "super::option_boolean", skip_serializing_if = "Option::is_none")]
        daily: Option<bool>,
        #[serde(with = "super::option_boolean", skip_serializing_if = "Option::is_none")]
        ioc: Option<bool>,
        #[serde(with = "super::option_boolean", skip_serializing_if = "Option::is_none")]
        fok: Option<bool>,
    }

    #[test]
    fn decimals_keep_every_digit() {
        let s: Sample =
            serde_json::from_str(r#"{"amount": "0.10000000000000000001", "timestamp": "1700000000"}"#)
                .unwrap();
        assert_eq!(s.amount.to_string(), "0.10000000000000000001");
        assert_eq!(s.timestamp, 1_700_000_000);
    }

    #[test]
    fn numbers_are_written_as_strings() {
        let s = Sample {
            amount: Decimal::new(15, 1),
            timestamp: 1,
        };
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"{"amount":"1.5","timestamp":"1"}"#);
    }

    #[test]
    fn flags_are_written_capitalised() {
        let flags = Flags {
            daily: Some(true),
            ioc: Some(false),
            fok: None,
        };
        assert_eq!(serde_urlencoded::to_string(&flags).unwrap(), "daily=True&ioc=False");
    }

    #[test]
    fn raw_numbers_and_junk_are_rejected() {
        assert!(serde_json::from_str::<Sample>(r#"{"amount": 1.5, "timestamp": "1"}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"amount": "1,5", "timestamp": "1"}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"amount": "1.5", "timestamp": "x"}"#).is_err());
    }
}
