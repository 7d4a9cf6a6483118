// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Kafkaconf Authors
use crate::{
    config::{
        ClientConfig, ConfigGetter, EnvSource, ResolveError, RootTls,
        TlsSettings, DEFAULT_ENV_PREFIX, KEY_ROOT_TLS,
        KEY_SCRAM_CLIENT_GENERATOR, KEY_VERSION,
    },
    crypto,
    scram::{HashGenerator, ScramClientGenerator, ScramError},
    version::{KafkaVersion, VersionError},
};
use config::{Config, Map, Value, ValueKind};
use log::*;
use std::sync::Arc;

/// Resolve a [`ClientConfig`] from `provider` and the `KAFKA_*` environment
///
/// Shorthand for [`Resolver::default().resolve(provider)`](Resolver::resolve).
pub fn resolve(provider: &Config) -> Result<ClientConfig, ResolveError> {
    Resolver::default().resolve(provider)
}

/// Builds validated client configurations from layered sources
///
/// Later layers take precedence: the schema defaults, the provider given to
/// [`Resolver::resolve`], the environment, then the overrides set here.
#[derive(Clone, Debug)]
pub struct Resolver {
    env_prefix: String,
    env_source: Option<Map<String, String>>,
    overrides: Vec<(String, Value)>,
}

impl Default for Resolver {
    fn default() -> Self {
        Resolver {
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            env_source: None,
            overrides: Vec::new(),
        }
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read environment variables starting with `prefix` instead of `KAFKA`
    ///
    /// With an empty prefix the variables are named after the keys only,
    /// `TLS_CA` for `tls.ca`.
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = prefix.to_string();
        self
    }

    /// Read the environment from `vars` instead of the process
    pub fn env_source(mut self, vars: Option<Map<String, String>>) -> Self {
        self.env_source = vars;
        self
    }

    /// Set `key` to `value` over every other source
    pub fn set_override<T: Into<Value>>(mut self, key: &str, value: T) -> Self {
        self.overrides.push((key.to_string(), value.into()));
        self
    }

    /// The environment source with every recognized key bound
    pub fn env(&self) -> EnvSource {
        EnvSource::with_prefix(&self.env_prefix)
            .bind::<ClientConfig>()
            .bind::<RootTls>()
            .bind_keys([KEY_SCRAM_CLIENT_GENERATOR, KEY_VERSION])
            .source(self.env_source.clone())
    }

    /// Merge the defaults, `provider`, the environment and the overrides
    pub fn layered(&self, provider: &Config) -> Result<Config, ResolveError> {
        let defaults = Config::try_from(&ClientConfig::default())
            .map_err(ResolveError::Config)?;

        let mut builder = Config::builder()
            .add_source(defaults)
            .add_source(provider.clone())
            .add_source(self.env());

        for (key, value) in &self.overrides {
            builder = builder
                .set_override(key, value.clone())
                .map_err(ResolveError::Config)?;
        }

        builder.build().map_err(ResolveError::Config)
    }

    /// Resolve and validate the client configuration
    ///
    /// `provider` is only read. The SCRAM generator, the version and the TLS
    /// context are resolved from their keys and attached to the decoded
    /// configuration.
    pub fn resolve(
        &self,
        provider: &Config,
    ) -> Result<ClientConfig, ResolveError> {
        let layered = self.layered(provider)?;

        let scram_client_generator = resolve_scram_client_generator(&layered)
            .map_err(ResolveError::ScramMechanism)?;

        let version =
            resolve_version(&layered).map_err(ResolveError::Version)?;

        let mut cfg: ClientConfig = layered
            .clone()
            .try_deserialize()
            .map_err(ResolveError::Decode)?;

        cfg.version = version;
        if scram_client_generator.is_some() {
            cfg.net.sasl.scram_client_generator = scram_client_generator;
        }

        if layered.is_set(KEY_ROOT_TLS) {
            let settings: TlsSettings = layered
                .get(KEY_ROOT_TLS)
                .map_err(ResolveError::TlsDecode)?;
            let context = crypto::tls_context_from_encoded_certs(
                &settings.ca,
                &settings.client_pem,
                &settings.client_key,
            )
            .map_err(ResolveError::Tls)?;
            info!(
                "Loaded TLS client certificate with {} trusted CA certificate(s)",
                context.root_certificates().len()
            );
            cfg.net.tls.config = Some(Arc::new(context));
        }

        cfg.validate().map_err(ResolveError::Validation)?;

        debug!(
            "Resolved client configuration '{}' for version {}",
            cfg.client_id, cfg.version
        );
        Ok(cfg)
    }
}

/// Read the SCRAM hash generator from `net.sasl.scramclientgeneratorfunc`
///
/// Returns `None` when the key is not set.
pub fn resolve_scram_client_generator<G: ConfigGetter>(
    provider: &G,
) -> Result<Option<ScramClientGenerator>, ScramError> {
    if !provider.is_set(KEY_SCRAM_CLIENT_GENERATOR) {
        return Ok(None);
    }

    let value = provider
        .get_value(KEY_SCRAM_CLIENT_GENERATOR)
        .map_err(|e| ScramError::UnsupportedMechanism {
            value: format!("{KEY_SCRAM_CLIENT_GENERATOR}: {e}"),
        })?
        .to_string();

    let hash = HashGenerator::try_from(value.as_str())?;
    debug!("Using SCRAM hash generator {hash}");
    Ok(Some(ScramClientGenerator::from_hash(hash)))
}

/// Read the broker version from `version`
///
/// Returns the default version when the key is not set. The value has to be
/// a string.
pub fn resolve_version<G: ConfigGetter>(
    provider: &G,
) -> Result<KafkaVersion, VersionError> {
    if !provider.is_set(KEY_VERSION) {
        return Ok(KafkaVersion::DEFAULT);
    }

    let value =
        provider
            .get_value(KEY_VERSION)
            .map_err(|e| VersionError::NotAString {
                value: format!("{KEY_VERSION}: {e}"),
            })?;

    match value.kind {
        ValueKind::String(s) => KafkaVersion::try_from(s),
        kind => Err(VersionError::NotAString {
            value: kind.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(values: &[(&str, Value)]) -> Config {
        let mut builder = Config::builder();
        for (key, value) in values {
            builder = builder.set_override(*key, value.clone()).unwrap(); //#[allow_ci]
        }
        builder.build().unwrap() //#[allow_ci]
    }

    fn no_env() -> Resolver {
        Resolver::default().env_source(Some(Map::new()))
    }

    #[test]
    fn test_resolve_scram_unset() {
        let p = provider(&[]);
        assert!(resolve_scram_client_generator(&p).unwrap().is_none()); //#[allow_ci]
    }

    #[test]
    fn test_resolve_scram() {
        let p = provider(&[(KEY_SCRAM_CLIENT_GENERATOR, "SHA512".into())]);
        let generator = resolve_scram_client_generator(&p).unwrap().unwrap(); //#[allow_ci]
        assert_eq!(generator.hash(), Some(HashGenerator::Sha512));

        let p = provider(&[(KEY_SCRAM_CLIENT_GENERATOR, "sha256".into())]);
        match resolve_scram_client_generator(&p) {
            Err(ScramError::UnsupportedMechanism { value }) => {
                assert_eq!(value, "sha256")
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_resolve_version() {
        let p = provider(&[]);
        assert_eq!(resolve_version(&p).unwrap(), KafkaVersion::DEFAULT); //#[allow_ci]

        let p = provider(&[(KEY_VERSION, "0.11.0.1".into())]);
        assert_eq!(
            resolve_version(&p).unwrap(), //#[allow_ci]
            KafkaVersion::new(0, 11, 0, 1)
        );

        let p = provider(&[(KEY_VERSION, "V0_8_2_0".into())]);
        assert_eq!(resolve_version(&p).unwrap(), KafkaVersion::V0_8_2_0); //#[allow_ci]

        let p = provider(&[(KEY_VERSION, "test".into())]);
        let err = resolve_version(&p).unwrap_err(); //#[allow_ci]
        assert_eq!(err.input(), "test");

        let p = provider(&[(KEY_VERSION, 123.into())]);
        assert!(matches!(
            resolve_version(&p),
            Err(VersionError::NotAString { .. })
        ));
    }

    /// Reports every key as set but fails to read it
    struct Unreadable;

    impl ConfigGetter for Unreadable {
        fn get_value(&self, key: &str) -> Result<Value, config::ConfigError> {
            Err(config::ConfigError::NotFound(key.to_string()))
        }

        fn is_set(&self, _key: &str) -> bool {
            true
        }
    }

    #[test]
    fn test_read_errors_are_reported() {
        match resolve_scram_client_generator(&Unreadable) {
            Err(ScramError::UnsupportedMechanism { value }) => {
                assert!(value.starts_with(KEY_SCRAM_CLIENT_GENERATOR))
            }
            other => panic!("unexpected result {other:?}"),
        }
        match resolve_version(&Unreadable) {
            Err(VersionError::NotAString { value }) => {
                assert!(value.starts_with(KEY_VERSION))
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_resolve_defaults() {
        let cfg = no_env().resolve(&provider(&[])).unwrap(); //#[allow_ci]
        assert_eq!(cfg.admin.retry.max, 5);
        assert_eq!(cfg.version, KafkaVersion::DEFAULT);
        assert!(cfg.net.tls.config.is_none());
        assert!(cfg.net.sasl.scram_client_generator.is_none());
    }

    #[test]
    fn test_layer_precedence() {
        let p = provider(&[
            ("admin.retry.max", 10.into()),
            ("net.sasl.user", "from-provider".into()),
            ("client_id", "provider".into()),
        ]);
        let mut vars = Map::new();
        _ = vars.insert("KAFKA_NET_SASL_USER".to_string(), "from-env".to_string());
        _ = vars.insert("KAFKA_CLIENT_ID".to_string(), "env".to_string());

        let cfg = Resolver::default()
            .env_source(Some(vars))
            .set_override("client_id", "override")
            .resolve(&p)
            .unwrap(); //#[allow_ci]

        assert_eq!(cfg.admin.retry.max, 10);
        assert_eq!(cfg.net.sasl.user, "from-env");
        assert_eq!(cfg.client_id, "override");
        assert_eq!(p.get_string("client_id").unwrap(), "provider"); //#[allow_ci]
    }

    #[test]
    fn test_provider_not_modified() {
        let p = provider(&[
            (KEY_SCRAM_CLIENT_GENERATOR, "SHA256".into()),
            (KEY_VERSION, "2.0.0".into()),
        ]);
        let cfg = no_env().resolve(&p).unwrap(); //#[allow_ci]
        assert!(cfg.net.sasl.scram_client_generator.is_some());
        assert_eq!(cfg.version, KafkaVersion::V2_0_0_0);
        assert_eq!(
            p.get_string(KEY_SCRAM_CLIENT_GENERATOR).unwrap(), //#[allow_ci]
            "SHA256"
        );
        assert_eq!(p.get_string(KEY_VERSION).unwrap(), "2.0.0"); //#[allow_ci]
    }

    #[test]
    fn test_decode_error() {
        let p = provider(&[("admin.retry.max", "many".into())]);
        assert!(matches!(
            no_env().resolve(&p),
            Err(ResolveError::Decode(_))
        ));
    }

    #[test]
    fn test_env_prefix() {
        let mut vars = Map::new();
        _ = vars.insert("NET_TLS_ENABLE".to_string(), "true".to_string());
        _ = vars.insert("KAFKA_NET_SASL_USER".to_string(), "ignored".to_string());

        let cfg = Resolver::default()
            .env_prefix("")
            .env_source(Some(vars))
            .resolve(&provider(&[]))
            .unwrap(); //#[allow_ci]
        assert!(cfg.net.tls.enable);
        assert_eq!(cfg.net.sasl.user, "");
    }
}
