// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Kafkaconf Authors

//! Serde helpers for [`Duration`] configuration values
//!
//! Durations are written in the human readable form (`250ms`, `10s`,
//! `1m 30s`). Integers and strings made only of digits are read as
//! nanoseconds.
//!
//! Use with `#[serde(with = "crate::config::duration")]`.

use serde::{de, Deserializer, Serializer};
use std::{fmt, time::Duration};

pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&humantime::format_duration(*value))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(DurationVisitor)
}

/// Parse a duration in the configuration syntax
pub fn parse(input: &str) -> Result<Duration, humantime::DurationError> {
    let input = input.trim();
    if !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(nanos) = input.parse::<u64>() {
            return Ok(Duration::from_nanos(nanos));
        }
    }
    humantime::parse_duration(input)
}

struct DurationVisitor;

impl<'de> de::Visitor<'de> for DurationVisitor {
    type Value = Duration;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a duration such as \"250ms\" or nanoseconds")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Duration, E> {
        parse(value).map_err(|e| {
            E::custom(format!("invalid duration '{value}': {e}"))
        })
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Duration, E> {
        Ok(Duration::from_nanos(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Duration, E> {
        u64::try_from(value)
            .map(Duration::from_nanos)
            .map_err(|_| E::custom(format!("negative duration {value}")))
    }
}
