// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Kafkaconf Authors
use crate::config::duration;
use config::{Config, ConfigError, Value, ValueKind};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Typed read access to a hierarchical configuration provider
///
/// Keys are dotted paths (`net.sasl.user`) and are case insensitive.
pub trait ConfigGetter {
    fn get_value(&self, key: &str) -> Result<Value, ConfigError>;

    fn get_bool(&self, key: &str) -> Result<bool, ConfigError> {
        self.get_value(key)?.into_bool()
    }

    fn get_float64(&self, key: &str) -> Result<f64, ConfigError> {
        self.get_value(key)?.into_float()
    }

    fn get_int(&self, key: &str) -> Result<i64, ConfigError> {
        self.get_value(key)?.into_int()
    }

    fn get_string(&self, key: &str) -> Result<String, ConfigError> {
        self.get_value(key)?.into_string()
    }

    /// A list of integers, given as an array or as a separated string
    fn get_int_slice(&self, key: &str) -> Result<Vec<i64>, ConfigError> {
        let value = self.get_value(key)?;
        match value.kind {
            ValueKind::String(s) => split_list(&s)
                .map(|item| {
                    item.parse::<i64>().map_err(|e| {
                        ConfigError::Message(format!(
                            "invalid integer '{item}' in {key}: {e}"
                        ))
                    })
                })
                .collect(),
            _ => value.into_array()?.into_iter().map(Value::into_int).collect(),
        }
    }

    /// A list of strings, given as an array or as a string separated by
    /// commas or whitespace
    fn get_string_slice(&self, key: &str) -> Result<Vec<String>, ConfigError> {
        let value = self.get_value(key)?;
        match value.kind {
            ValueKind::String(s) => Ok(split_list(&s).map(String::from).collect()),
            _ => value
                .into_array()?
                .into_iter()
                .map(Value::into_string)
                .collect(),
        }
    }

    /// A duration such as `250ms`, or an integer number of nanoseconds
    fn get_duration(&self, key: &str) -> Result<Duration, ConfigError> {
        let value = self.get_value(key)?;
        match value.kind {
            ValueKind::String(s) => duration::parse(&s).map_err(|e| {
                ConfigError::Message(format!(
                    "invalid duration '{s}' in {key}: {e}"
                ))
            }),
            _ => {
                let nanos = value.into_uint()?;
                Ok(Duration::from_nanos(nanos))
            }
        }
    }

    /// A point in time, as an RFC 3339 date or seconds since the epoch
    fn get_time(&self, key: &str) -> Result<SystemTime, ConfigError> {
        let value = self.get_value(key)?;
        match value.kind {
            ValueKind::String(s) => humantime::parse_rfc3339_weak(&s)
                .map_err(|e| {
                    ConfigError::Message(format!(
                        "invalid time '{s}' in {key}: {e}"
                    ))
                }),
            _ => {
                let secs = value.into_uint()?;
                Ok(UNIX_EPOCH + Duration::from_secs(secs))
            }
        }
    }

    /// Whether a non-nil value exists at `key`, either a leaf or a subtree
    fn is_set(&self, key: &str) -> bool {
        self.get_value(key)
            .is_ok_and(|value| !matches!(value.kind, ValueKind::Nil))
    }
}

fn split_list(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|item| !item.is_empty())
}

impl ConfigGetter for Config {
    fn get_value(&self, key: &str) -> Result<Value, ConfigError> {
        self.get::<Value>(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn provider() -> Config {
        Config::builder()
            .set_override("net.tls.enable", true)
            .unwrap() //#[allow_ci]
            .set_override("net.sasl.user", "alice")
            .unwrap() //#[allow_ci]
            .set_override("admin.retry.max", "100")
            .unwrap() //#[allow_ci]
            .set_override("admin.timeout", "25ms")
            .unwrap() //#[allow_ci]
            .set_override("net.keep_alive", 1_000_000_000)
            .unwrap() //#[allow_ci]
            .set_override("producer.ratio", "0.5")
            .unwrap() //#[allow_ci]
            .set_override("brokers", "kafka-0:9092, kafka-1:9092")
            .unwrap() //#[allow_ci]
            .set_override("partitions", vec![1, 2, 3])
            .unwrap() //#[allow_ci]
            .set_override("partition_list", "4,5")
            .unwrap() //#[allow_ci]
            .set_override("started", "2024-01-02T03:04:05Z")
            .unwrap() //#[allow_ci]
            .set_override("epoch", 86400)
            .unwrap() //#[allow_ci]
            .build()
            .unwrap() //#[allow_ci]
    }

    #[test]
    fn test_scalars() {
        let p = provider();
        assert!(p.get_bool("net.tls.enable").unwrap()); //#[allow_ci]
        assert_eq!(ConfigGetter::get_string(&p, "net.sasl.user").unwrap(), "alice"); //#[allow_ci]
        assert_eq!(ConfigGetter::get_int(&p, "admin.retry.max").unwrap(), 100); //#[allow_ci]
        assert_eq!(p.get_float64("producer.ratio").unwrap(), 0.5); //#[allow_ci]
        assert!(ConfigGetter::get_int(&p, "net.sasl.user").is_err());
    }

    #[test]
    fn test_durations() {
        let p = provider();
        assert_eq!(
            p.get_duration("admin.timeout").unwrap(), //#[allow_ci]
            Duration::from_millis(25)
        );
        assert_eq!(
            p.get_duration("net.keep_alive").unwrap(), //#[allow_ci]
            Duration::from_secs(1)
        );
        assert!(p.get_duration("net.sasl.user").is_err());
    }

    #[test]
    fn test_slices() {
        let p = provider();
        assert_eq!(
            p.get_string_slice("brokers").unwrap(), //#[allow_ci]
            vec!["kafka-0:9092", "kafka-1:9092"]
        );
        assert_eq!(p.get_int_slice("partitions").unwrap(), vec![1, 2, 3]); //#[allow_ci]
        assert_eq!(p.get_int_slice("partition_list").unwrap(), vec![4, 5]); //#[allow_ci]
        assert!(p.get_int_slice("brokers").is_err());
    }

    #[test]
    fn test_time() {
        let p = provider();
        let started = p.get_time("started").unwrap(); //#[allow_ci]
        assert_eq!(
            started.duration_since(UNIX_EPOCH).unwrap().as_secs(), //#[allow_ci]
            1_704_164_645
        );
        assert_eq!(
            p.get_time("epoch").unwrap(), //#[allow_ci]
            UNIX_EPOCH + Duration::from_secs(86400)
        );
    }

    #[test]
    fn test_is_set() {
        let p = provider();
        assert!(p.is_set("net.sasl.user"));
        assert!(p.is_set("NET.SASL.USER"));
        assert!(p.is_set("net"));
        assert!(!p.is_set("tls"));
        assert!(!p.is_set("net.sasl.password"));

        let with_nil = Config::builder()
            .set_override("version", None::<String>)
            .unwrap() //#[allow_ci]
            .build()
            .unwrap(); //#[allow_ci]
        assert!(!with_nil.is_set("version"));
    }
}
