// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Kafkaconf Authors

//! # kafkaconf
//!
//! Resolves a Kafka client configuration the way a client application would
//! and prints the result, or lists the environment variables it reads.

use clap::Parser;
use kafkaconf::config::{
    ClientConfig, ConfigLoader, ResolveError, DEFAULT_ENV_PREFIX,
};
use log::*;
use serde_json::{json, Value};
use std::{path::PathBuf, process};
use thiserror::Error;

#[derive(Error, Debug)]
enum CliError {
    #[error("invalid override '{0}', expected KEY=VALUE")]
    InvalidOverride(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("failed to serialize the configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Resolve and print a Kafka client configuration
#[derive(Parser, Debug)]
#[command(
    name = "kafkaconf",
    version,
    about = "Resolve and print a Kafka client configuration",
    after_long_help = "CONFIGURATION SOURCES (highest to lowest priority):\n  \
        1. --set KEY=VALUE arguments\n  \
        2. Environment variables (KAFKA_ADMIN_RETRY_MAX, KAFKA_TLS_CA, etc.)\n  \
        3. Configuration files given with --config, later files first\n  \
        4. Built-in defaults"
)]
struct Cli {
    /// TOML configuration file, may be repeated
    #[arg(short, long, value_name = "FILE")]
    config: Vec<PathBuf>,

    /// Prefix of the environment variables, empty for none
    #[arg(long, value_name = "PREFIX", default_value = DEFAULT_ENV_PREFIX)]
    env_prefix: String,

    /// Override a key, e.g. `--set net.sasl.user=alice`
    #[arg(short = 's', long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// List the recognized keys with their environment variable and exit
    #[arg(long)]
    list_env: bool,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8) {
    let log_level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    pretty_env_logger::formatted_builder()
        .filter_level(log_level)
        .target(pretty_env_logger::env_logger::Target::Stderr)
        .init();
}

fn parse_override(arg: &str) -> Result<(&str, &str), CliError> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim(), value))
        }
        _ => Err(CliError::InvalidOverride(arg.to_string())),
    }
}

fn loader(cli: &Cli) -> Result<ConfigLoader, CliError> {
    let mut loader = ConfigLoader::new().env_prefix(&cli.env_prefix);
    for path in &cli.config {
        loader = loader.add_file(path);
    }
    for arg in &cli.overrides {
        let (key, value) = parse_override(arg)?;
        loader = loader.set_override(key, value);
    }
    Ok(loader)
}

/// The configuration as JSON, including the values resolved outside of the
/// serialized schema. The SASL password is masked.
fn summary(config: &ClientConfig) -> Result<Value, CliError> {
    let mut value = serde_json::to_value(config)?;

    if let Some(password) = value.pointer_mut("/net/sasl/password") {
        if password.as_str().is_some_and(|p| !p.is_empty()) {
            *password = json!("<redacted>");
        }
    }

    if let Some(object) = value.as_object_mut() {
        _ = object.insert("version".into(), json!(config.version));
    }
    if let Some(sasl) = value.pointer_mut("/net/sasl") {
        let hash = config
            .net
            .sasl
            .scram_client_generator
            .as_ref()
            .and_then(|generator| generator.hash())
            .map(|hash| hash.to_string());
        sasl["scramclientgeneratorfunc"] = json!(hash);
    }
    if let Some(tls) = value.pointer_mut("/net/tls") {
        tls["config"] = match &config.net.tls.config {
            Some(context) => json!({
                "client_certificates": context.certificates().len(),
                "root_certificates": context.root_certificates().len(),
            }),
            None => Value::Null,
        };
    }

    Ok(value)
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let loader = loader(cli)?;

    if cli.list_env {
        for (key, name) in loader.resolver().env().bindings() {
            println!("{name:<56} {key}");
        }
        return Ok(());
    }

    let config = loader.load()?;
    println!("{}", serde_json::to_string_pretty(&summary(&config)?)?);
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    debug!("Starting with {cli:?}");

    if let Err(e) = run(&cli) {
        error!("{e}");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
