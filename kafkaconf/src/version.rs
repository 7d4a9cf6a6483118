// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Kafkaconf Authors

//! Kafka broker protocol versions
//!
//! A [`KafkaVersion`] is parsed from the dotted form used by the broker
//! releases: `0.a.b.c` for the 0.x series and `a.b.c` from 1.0 onwards. The
//! name of a known version constant, such as `V0_8_2_0`, is accepted as well.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VersionError {
    /// The version input was malformed
    #[error("input '{input}' malformed as a version")]
    MalformedVersion { input: String },

    /// The parts of the version were not numbers
    #[error("parts of version '{input}' were not numbers")]
    ParseError {
        input: String,
        source: std::num::ParseIntError,
    },

    /// The configured version was not given as a string
    #[error("version must be a string, got '{value}'")]
    NotAString { value: String },
}

impl VersionError {
    /// The offending value
    pub fn input(&self) -> &str {
        match self {
            VersionError::MalformedVersion { input } => input,
            VersionError::ParseError { input, source: _ } => input,
            VersionError::NotAString { value } => value,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct KafkaVersion {
    version: [u32; 4],
}

impl KafkaVersion {
    /// Create a new version from its four numeric components.
    ///
    /// Releases from 1.0 onwards only use three components, the last one is
    /// then 0.
    pub const fn new(
        major: u32,
        minor: u32,
        very_minor: u32,
        patch: u32,
    ) -> Self {
        KafkaVersion {
            version: [major, minor, very_minor, patch],
        }
    }

    pub const V0_8_2_0: KafkaVersion = KafkaVersion::new(0, 8, 2, 0);
    pub const V0_8_2_1: KafkaVersion = KafkaVersion::new(0, 8, 2, 1);
    pub const V0_8_2_2: KafkaVersion = KafkaVersion::new(0, 8, 2, 2);
    pub const V0_9_0_0: KafkaVersion = KafkaVersion::new(0, 9, 0, 0);
    pub const V0_9_0_1: KafkaVersion = KafkaVersion::new(0, 9, 0, 1);
    pub const V0_10_0_0: KafkaVersion = KafkaVersion::new(0, 10, 0, 0);
    pub const V0_10_0_1: KafkaVersion = KafkaVersion::new(0, 10, 0, 1);
    pub const V0_10_1_0: KafkaVersion = KafkaVersion::new(0, 10, 1, 0);
    pub const V0_10_1_1: KafkaVersion = KafkaVersion::new(0, 10, 1, 1);
    pub const V0_10_2_0: KafkaVersion = KafkaVersion::new(0, 10, 2, 0);
    pub const V0_10_2_1: KafkaVersion = KafkaVersion::new(0, 10, 2, 1);
    pub const V0_10_2_2: KafkaVersion = KafkaVersion::new(0, 10, 2, 2);
    pub const V0_11_0_0: KafkaVersion = KafkaVersion::new(0, 11, 0, 0);
    pub const V0_11_0_1: KafkaVersion = KafkaVersion::new(0, 11, 0, 1);
    pub const V0_11_0_2: KafkaVersion = KafkaVersion::new(0, 11, 0, 2);
    pub const V1_0_0_0: KafkaVersion = KafkaVersion::new(1, 0, 0, 0);
    pub const V1_0_1_0: KafkaVersion = KafkaVersion::new(1, 0, 1, 0);
    pub const V1_0_2_0: KafkaVersion = KafkaVersion::new(1, 0, 2, 0);
    pub const V1_1_0_0: KafkaVersion = KafkaVersion::new(1, 1, 0, 0);
    pub const V1_1_1_0: KafkaVersion = KafkaVersion::new(1, 1, 1, 0);
    pub const V2_0_0_0: KafkaVersion = KafkaVersion::new(2, 0, 0, 0);
    pub const V2_0_1_0: KafkaVersion = KafkaVersion::new(2, 0, 1, 0);
    pub const V2_1_0_0: KafkaVersion = KafkaVersion::new(2, 1, 0, 0);
    pub const V2_2_0_0: KafkaVersion = KafkaVersion::new(2, 2, 0, 0);
    pub const V2_3_0_0: KafkaVersion = KafkaVersion::new(2, 3, 0, 0);
    pub const V2_4_0_0: KafkaVersion = KafkaVersion::new(2, 4, 0, 0);
    pub const V2_5_0_0: KafkaVersion = KafkaVersion::new(2, 5, 0, 0);
    pub const V2_6_0_0: KafkaVersion = KafkaVersion::new(2, 6, 0, 0);
    pub const V2_7_0_0: KafkaVersion = KafkaVersion::new(2, 7, 0, 0);
    pub const V2_8_0_0: KafkaVersion = KafkaVersion::new(2, 8, 0, 0);
    pub const V3_0_0_0: KafkaVersion = KafkaVersion::new(3, 0, 0, 0);
    pub const V3_1_0_0: KafkaVersion = KafkaVersion::new(3, 1, 0, 0);
    pub const V3_2_0_0: KafkaVersion = KafkaVersion::new(3, 2, 0, 0);
    pub const V3_3_0_0: KafkaVersion = KafkaVersion::new(3, 3, 0, 0);
    pub const V3_4_0_0: KafkaVersion = KafkaVersion::new(3, 4, 0, 0);
    pub const V3_5_0_0: KafkaVersion = KafkaVersion::new(3, 5, 0, 0);
    pub const V3_6_0_0: KafkaVersion = KafkaVersion::new(3, 6, 0, 0);

    /// Version assumed when none is configured
    pub const DEFAULT: KafkaVersion = KafkaVersion::V2_1_0_0;
    /// Oldest version a client can talk to
    pub const MIN: KafkaVersion = KafkaVersion::V0_8_2_0;
    /// Newest known version
    pub const MAX: KafkaVersion = KafkaVersion::V3_6_0_0;

    /// Returns true if this version is the same as or newer than `other`
    pub fn is_at_least(&self, other: KafkaVersion) -> bool {
        *self >= other
    }

    /// Returns the name of the version constant, if this is a known release
    pub fn name(&self) -> Option<&'static str> {
        SUPPORTED_VERSIONS
            .iter()
            .find(|(_, v)| v == self)
            .map(|(name, _)| *name)
    }
}

impl Default for KafkaVersion {
    fn default() -> Self {
        KafkaVersion::DEFAULT
    }
}

/// Every known release, by constant name
pub const SUPPORTED_VERSIONS: &[(&str, KafkaVersion)] = &[
    ("V0_8_2_0", KafkaVersion::V0_8_2_0),
    ("V0_8_2_1", KafkaVersion::V0_8_2_1),
    ("V0_8_2_2", KafkaVersion::V0_8_2_2),
    ("V0_9_0_0", KafkaVersion::V0_9_0_0),
    ("V0_9_0_1", KafkaVersion::V0_9_0_1),
    ("V0_10_0_0", KafkaVersion::V0_10_0_0),
    ("V0_10_0_1", KafkaVersion::V0_10_0_1),
    ("V0_10_1_0", KafkaVersion::V0_10_1_0),
    ("V0_10_1_1", KafkaVersion::V0_10_1_1),
    ("V0_10_2_0", KafkaVersion::V0_10_2_0),
    ("V0_10_2_1", KafkaVersion::V0_10_2_1),
    ("V0_10_2_2", KafkaVersion::V0_10_2_2),
    ("V0_11_0_0", KafkaVersion::V0_11_0_0),
    ("V0_11_0_1", KafkaVersion::V0_11_0_1),
    ("V0_11_0_2", KafkaVersion::V0_11_0_2),
    ("V1_0_0_0", KafkaVersion::V1_0_0_0),
    ("V1_0_1_0", KafkaVersion::V1_0_1_0),
    ("V1_0_2_0", KafkaVersion::V1_0_2_0),
    ("V1_1_0_0", KafkaVersion::V1_1_0_0),
    ("V1_1_1_0", KafkaVersion::V1_1_1_0),
    ("V2_0_0_0", KafkaVersion::V2_0_0_0),
    ("V2_0_1_0", KafkaVersion::V2_0_1_0),
    ("V2_1_0_0", KafkaVersion::V2_1_0_0),
    ("V2_2_0_0", KafkaVersion::V2_2_0_0),
    ("V2_3_0_0", KafkaVersion::V2_3_0_0),
    ("V2_4_0_0", KafkaVersion::V2_4_0_0),
    ("V2_5_0_0", KafkaVersion::V2_5_0_0),
    ("V2_6_0_0", KafkaVersion::V2_6_0_0),
    ("V2_7_0_0", KafkaVersion::V2_7_0_0),
    ("V2_8_0_0", KafkaVersion::V2_8_0_0),
    ("V3_0_0_0", KafkaVersion::V3_0_0_0),
    ("V3_1_0_0", KafkaVersion::V3_1_0_0),
    ("V3_2_0_0", KafkaVersion::V3_2_0_0),
    ("V3_3_0_0", KafkaVersion::V3_3_0_0),
    ("V3_4_0_0", KafkaVersion::V3_4_0_0),
    ("V3_5_0_0", KafkaVersion::V3_5_0_0),
    ("V3_6_0_0", KafkaVersion::V3_6_0_0),
];

impl fmt::Display for KafkaVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [major, minor, very_minor, patch] = self.version;
        if major == 0 {
            write!(f, "0.{minor}.{very_minor}.{patch}")
        } else {
            write!(f, "{major}.{minor}.{very_minor}")
        }
    }
}

/// Splits `input` into exactly `N` dot separated numbers
fn parse_parts<const N: usize>(
    input: &str,
    parts: &str,
) -> Result<[u32; N], VersionError> {
    let mut out = [0u32; N];
    let mut split = parts.split('.');

    for slot in out.iter_mut() {
        let part = match split.next() {
            Some(p) if !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()) => p,
            _ => {
                return Err(VersionError::MalformedVersion {
                    input: input.to_string(),
                })
            }
        };
        *slot = part.parse().map_err(|e| VersionError::ParseError {
            input: input.to_string(),
            source: e,
        })?;
    }

    if split.next().is_some() {
        return Err(VersionError::MalformedVersion {
            input: input.to_string(),
        });
    }

    Ok(out)
}

impl FromStr for KafkaVersion {
    type Err = VersionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if let Some((_, v)) =
            SUPPORTED_VERSIONS.iter().find(|(name, _)| *name == input)
        {
            return Ok(*v);
        }

        if input.len() < 5 {
            return Err(VersionError::MalformedVersion {
                input: input.to_string(),
            });
        }

        if input.starts_with('0') {
            let rest = input.strip_prefix("0.").ok_or_else(|| {
                VersionError::MalformedVersion {
                    input: input.to_string(),
                }
            })?;
            let [minor, very_minor, patch] = parse_parts::<3>(input, rest)?;
            Ok(KafkaVersion::new(0, minor, very_minor, patch))
        } else {
            let [major, minor, very_minor] = parse_parts::<3>(input, input)?;
            Ok(KafkaVersion::new(major, minor, very_minor, 0))
        }
    }
}

impl TryFrom<&str> for KafkaVersion {
    type Error = VersionError;

    fn try_from(input: &str) -> Result<Self, Self::Error> {
        KafkaVersion::from_str(input)
    }
}

impl TryFrom<String> for KafkaVersion {
    type Error = VersionError;

    fn try_from(input: String) -> Result<Self, Self::Error> {
        KafkaVersion::from_str(input.as_str())
    }
}

impl Serialize for KafkaVersion {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for KafkaVersion {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        KafkaVersion::from_str(&s).map_err(de::Error::custom)
    }
}
