// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Kafkaconf Authors
use crate::{
    config::ValidationError, crypto::CryptoError, scram::ScramError,
    version::VersionError,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    /// Error assembling the layered configuration sources
    #[error("failed to load configuration sources: {0}")]
    Config(#[source] config::ConfigError),

    /// The SCRAM hash generator could not be resolved
    #[error("failed parsing scram generator func with error {0}")]
    ScramMechanism(#[source] ScramError),

    /// The broker version could not be resolved
    #[error("failed parsing version with error {0}")]
    Version(#[source] VersionError),

    /// The configuration did not match the schema
    #[error("unable to decode into struct, {0}")]
    Decode(#[source] config::ConfigError),

    /// The `tls` subtree did not match the TLS material schema
    #[error("unable to decode tls settings, {0}")]
    TlsDecode(#[source] config::ConfigError),

    /// The TLS context could not be assembled
    #[error("failed configuring TLS with error {0}")]
    Tls(#[source] CryptoError),

    /// The decoded configuration is not valid
    #[error("failed validating client config with error {0}")]
    Validation(#[source] ValidationError),
}
