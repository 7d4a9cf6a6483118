// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Kafkaconf Authors
use crate::config::{ConfigKeys, DEFAULT_ENV_PREFIX};
use config::{ConfigError, Map, Source, Value, ValueKind};
use log::*;

const ORIGIN: &str = "environment";

/// Keys whose values are not written to the logs
const SECRET_KEYS: &[&str] = &["password", "clientkey"];

/// Configuration source reading one environment variable per known key
///
/// Only the registered keys are looked up. The variable name is the prefix,
/// an underscore, then the key in upper case with `.` replaced by `_`:
/// `net.sasl.user` is read from `KAFKA_NET_SASL_USER`. Unset and empty
/// variables are skipped. Values are kept as strings and converted when
/// the configuration is decoded.
#[derive(Clone, Debug)]
pub struct EnvSource {
    prefix: String,
    keys: Vec<String>,
    source: Option<Map<String, String>>,
}

impl Default for EnvSource {
    fn default() -> Self {
        EnvSource::with_prefix(DEFAULT_ENV_PREFIX)
    }
}

impl EnvSource {
    /// Create a source for variables starting with `prefix`
    ///
    /// An empty prefix maps keys to bare variable names.
    pub fn with_prefix(prefix: &str) -> Self {
        EnvSource {
            prefix: prefix.to_string(),
            keys: Vec::new(),
            source: None,
        }
    }

    /// Register every leaf key of `T`
    pub fn bind<T: ConfigKeys>(self) -> Self {
        self.bind_keys(T::key_paths())
    }

    /// Register `key` under the `prefix` subtree for every leaf key of `T`
    pub fn bind_nested<T: ConfigKeys>(self, prefix: &str) -> Self {
        self.bind_keys(
            T::key_paths()
                .into_iter()
                .map(|path| format!("{prefix}.{path}")),
        )
    }

    /// Register additional keys
    pub fn bind_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for key in keys {
            let key = key.into().to_lowercase();
            if !self.keys.contains(&key) {
                self.keys.push(key);
            }
        }
        self
    }

    /// Read variables from the given map instead of the process environment
    pub fn source(mut self, source: Option<Map<String, String>>) -> Self {
        self.source = source;
        self
    }

    /// The registered keys, in registration order
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Name of the environment variable bound to `key`
    pub fn var_name(&self, key: &str) -> String {
        let name = key.replace('.', "_").to_uppercase();
        if self.prefix.is_empty() {
            name
        } else {
            format!("{}_{}", self.prefix.to_uppercase(), name)
        }
    }

    /// Every registered key with its environment variable name
    pub fn bindings(&self) -> Vec<(&str, String)> {
        self.keys
            .iter()
            .map(|key| (key.as_str(), self.var_name(key)))
            .collect()
    }

    fn lookup(&self, name: &str) -> Option<String> {
        match &self.source {
            Some(map) => map.get(name).cloned(),
            None => std::env::var(name).ok(),
        }
    }
}

fn is_secret(key: &str) -> bool {
    key.rsplit('.')
        .next()
        .is_some_and(|leaf| SECRET_KEYS.contains(&leaf))
}

impl Source for EnvSource {
    fn collect(&self) -> Result<Map<String, Value>, ConfigError> {
        let origin = ORIGIN.to_string();
        let mut map = Map::new();

        for (key, name) in self.bindings() {
            let value = match self.lookup(&name) {
                Some(value) if !value.is_empty() => value,
                _ => continue,
            };

            if is_secret(key) {
                debug!("Environment configuration {key}=<redacted> from {name}");
            } else {
                debug!("Environment configuration {key}={value} from {name}");
            }

            _ = map.insert(
                key.to_string(),
                Value::new(Some(&origin), ValueKind::String(value)),
            );
        }

        Ok(map)
    }

    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::{ClientConfig, RootTls};
    use config::Config;

    fn env(vars: &[(&str, &str)]) -> Option<Map<String, String>> {
        Some(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_var_name() {
        let source = EnvSource::default();
        assert_eq!(source.var_name("admin.retry.max"), "KAFKA_ADMIN_RETRY_MAX");
        assert_eq!(
            source.var_name("net.sasl.scramclientgeneratorfunc"),
            "KAFKA_NET_SASL_SCRAMCLIENTGENERATORFUNC"
        );

        let source = EnvSource::with_prefix("broker");
        assert_eq!(source.var_name("tls.ca"), "BROKER_TLS_CA");

        let source = EnvSource::with_prefix("");
        assert_eq!(source.var_name("client_id"), "CLIENT_ID");
    }

    #[test]
    fn test_bind_registers_schema_keys() {
        let source = EnvSource::default()
            .bind::<ClientConfig>()
            .bind::<RootTls>()
            .bind_keys(["version", "VERSION"]);

        let keys = source.keys();
        for key in [
            "admin.retry.max",
            "admin.timeout",
            "net.dial_timeout",
            "net.sasl.mechanism",
            "net.sasl.scramclientgeneratorfunc",
            "consumer.offsets.auto_commit.interval",
            "producer.return.successes",
            "tls.ca",
            "tls.clientpem",
            "tls.clientkey",
            "version",
        ] {
            assert!(keys.contains(&key.to_string()), "{key} not bound");
        }
        assert_eq!(keys.iter().filter(|k| *k == "version").count(), 1);
        assert!(!keys.contains(&"net.tls.config".to_string()));
    }

    #[test]
    fn test_collect() {
        let source = EnvSource::default()
            .bind_keys(["admin.retry.max", "net.sasl.user", "client_id"])
            .source(env(&[
                ("KAFKA_ADMIN_RETRY_MAX", "100"),
                ("KAFKA_NET_SASL_USER", "alice"),
                ("KAFKA_CLIENT_ID", ""),
                ("KAFKA_UNKNOWN_KEY", "ignored"),
            ]));

        let map = source.collect().unwrap(); //#[allow_ci]
        assert_eq!(map.len(), 2);
        assert_eq!(
            map["admin.retry.max"].clone().into_string().unwrap(), //#[allow_ci]
            "100"
        );
        assert_eq!(
            map["net.sasl.user"].clone().into_string().unwrap(), //#[allow_ci]
            "alice"
        );
    }

    #[test]
    fn test_env_source_nests_keys() {
        let source = EnvSource::default()
            .bind_nested::<RootTls>("outer")
            .source(env(&[("KAFKA_OUTER_TLS_CA", "Y2E=")]));

        let config = Config::builder()
            .add_source(source)
            .build()
            .unwrap(); //#[allow_ci]
        assert_eq!(config.get_string("outer.tls.ca").unwrap(), "Y2E="); //#[allow_ci]
    }

    #[test]
    fn test_secret_keys() {
        assert!(is_secret("net.sasl.password"));
        assert!(is_secret("tls.clientkey"));
        assert!(!is_secret("net.sasl.user"));
        assert!(!is_secret("tls.clientpem"));
    }
}
