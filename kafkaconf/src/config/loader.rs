// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Kafkaconf Authors
use crate::config::{ClientConfig, ResolveError, Resolver};
use config::{Config, ConfigError, File, FileFormat, Map, Value};
use log::*;
use std::path::{Path, PathBuf};

/// Loads a [`ClientConfig`] from TOML files, the environment and overrides
///
/// # Examples
///
/// ```rust,no_run
/// use kafkaconf::config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .add_file("/etc/kafka/client.toml")
///     .env_prefix("BROKER")
///     .set_override("client_id", "orders")
///     .load()?;
/// # Ok::<(), kafkaconf::config::ResolveError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct ConfigLoader {
    files: Vec<PathBuf>,
    resolver: Resolver,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a TOML file, later files take precedence over earlier ones
    pub fn add_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files.push(path.as_ref().to_path_buf());
        self
    }

    /// See [`Resolver::env_prefix`]
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.resolver = self.resolver.env_prefix(prefix);
        self
    }

    /// See [`Resolver::env_source`]
    pub fn env_source(mut self, vars: Option<Map<String, String>>) -> Self {
        self.resolver = self.resolver.env_source(vars);
        self
    }

    /// See [`Resolver::set_override`]
    pub fn set_override<T: Into<Value>>(mut self, key: &str, value: T) -> Self {
        self.resolver = self.resolver.set_override(key, value);
        self
    }

    /// The files added so far
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// The resolver applied to the files
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Merge the files into a single provider
    ///
    /// Every file has to exist.
    pub fn provider(&self) -> Result<Config, ResolveError> {
        let mut builder = Config::builder();

        for path in &self.files {
            if !path.exists() {
                return Err(ResolveError::Config(ConfigError::Message(
                    format!(
                        "Specified configuration file not found: {}",
                        path.display()
                    ),
                )));
            }
            debug!("Loading config from: {}", path.display());
            builder = builder
                .add_source(File::from(path.as_path()).format(FileFormat::Toml));
        }

        builder.build().map_err(ResolveError::Config)
    }

    /// Resolve the client configuration
    pub fn load(&self) -> Result<ClientConfig, ResolveError> {
        let provider = self.provider()?;
        if self.files.is_empty() {
            info!("No configuration files given, using defaults and environment variables");
        }
        self.resolver.resolve(&provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{io::Write, time::Duration};

    fn write_toml(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap(); //#[allow_ci]
        file.write_all(content.as_bytes()).unwrap(); //#[allow_ci]
        path
    }

    #[test]
    fn test_load_files() {
        let dir = tempfile::tempdir().unwrap(); //#[allow_ci]
        let base = write_toml(
            &dir,
            "base.toml",
            r#"
client_id = "base"

[admin]
timeout = "25ms"

[producer.flush]
max_messages = 100
"#,
        );
        let local = write_toml(
            &dir,
            "local.toml",
            r#"
client_id = "local"
"#,
        );

        let config = ConfigLoader::new()
            .add_file(&base)
            .add_file(&local)
            .env_source(Some(Map::new()))
            .load()
            .unwrap(); //#[allow_ci]

        assert_eq!(config.client_id, "local");
        assert_eq!(config.admin.timeout, Duration::from_millis(25));
        assert_eq!(config.producer.flush.max_messages, 100);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap(); //#[allow_ci]
        let result = ConfigLoader::new()
            .add_file(dir.path().join("absent.toml"))
            .load();
        match result {
            Err(ResolveError::Config(ConfigError::Message(message))) => {
                assert!(message.contains("absent.toml"))
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_override_wins_over_file() {
        let dir = tempfile::tempdir().unwrap(); //#[allow_ci]
        let path = write_toml(&dir, "conf.toml", "[net.tls]\nenable = false\n");

        let config = ConfigLoader::new()
            .add_file(path)
            .env_source(Some(Map::new()))
            .set_override("net.tls.enable", true)
            .load()
            .unwrap(); //#[allow_ci]
        assert!(config.net.tls.enable);
    }
}
