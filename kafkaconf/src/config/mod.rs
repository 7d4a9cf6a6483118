// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Kafkaconf Authors

//! Kafka client configuration
//!
//! The configuration is assembled from layered sources, lowest precedence
//! first:
//!
//! 1. the defaults of [`ClientConfig`]
//! 2. the provider given to [`resolve`] (files, explicit values)
//! 3. environment variables named after the keys, e.g.
//!    `KAFKA_ADMIN_RETRY_MAX` for `admin.retry.max`
//! 4. overrides set on the [`Resolver`]
//!
//! Besides the schema keys, `net.sasl.scramclientgeneratorfunc` selects the
//! SCRAM hash (`SHA256` or `SHA512`), `version` the broker version and the
//! `tls` subtree carries base64 encoded mutual TLS material.

pub mod duration;
mod env;
mod error;
mod getter;
mod loader;
mod options;
mod resolver;
mod schema;
mod validation;

pub use env::*;
pub use error::*;
pub use getter::*;
pub use kafkaconf_macros::ConfigKeys;
pub use loader::*;
pub use options::*;
pub use resolver::*;
pub use schema::*;
pub use validation::*;

/// Prefix of the environment variables read by default
pub const DEFAULT_ENV_PREFIX: &str = "KAFKA";

/// Key selecting the SCRAM hash generator
pub const KEY_SCRAM_CLIENT_GENERATOR: &str =
    "net.sasl.scramclientgeneratorfunc";

/// Key holding the broker version
pub const KEY_VERSION: &str = "version";

/// Root of the TLS material subtree
pub const KEY_ROOT_TLS: &str = "tls";

/// Types whose leaf configuration keys are known statically
///
/// Usually derived with `#[derive(ConfigKeys)]`, see [`kafkaconf_macros`].
pub trait ConfigKeys {
    /// Dotted path of every leaf field, nested structures flattened
    fn key_paths() -> Vec<String>;
}
