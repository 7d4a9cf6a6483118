// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Kafkaconf Authors
use crate::{config::ClientConfig, crypto::TlsContext};
use std::{sync::Arc, time::Duration};

/// A change applied to a resolved configuration
///
/// Options are applied in order with [`ClientConfig::with_options`], later
/// options overwrite earlier ones.
pub type ConfigOption = Box<dyn Fn(&mut ClientConfig) + Send + Sync>;

impl ClientConfig {
    /// Apply every option in order and return the updated configuration
    ///
    /// The result is not validated again.
    pub fn with_options<I>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = ConfigOption>,
    {
        for option in options {
            option(&mut self);
        }
        self
    }
}

/// Do not retry failed produce requests
pub fn producer_no_retries() -> ConfigOption {
    Box::new(|cfg| cfg.producer.retry.max = 0)
}

/// Retry failed produce requests up to `retries` times
pub fn producer_max_retries(retries: i32) -> ConfigOption {
    Box::new(move |cfg| cfg.producer.retry.max = retries)
}

/// Let the broker accumulate at least `min_fetch_bytes` per fetch, waiting
/// at most `max_wait_time`
pub fn consumer_batch(
    min_fetch_bytes: i32,
    max_wait_time: Duration,
) -> ConfigOption {
    Box::new(move |cfg| {
        cfg.consumer.fetch.min = min_fetch_bytes;
        cfg.consumer.max_wait_time = max_wait_time;
    })
}

/// Commit consumed offsets in the background every `interval`
pub fn consumer_commit_async(interval: Duration) -> ConfigOption {
    Box::new(move |cfg| {
        cfg.consumer.offsets.auto_commit.enable = true;
        cfg.consumer.offsets.auto_commit.interval = interval;
    })
}

/// Use `timeout` for dialing, reading and administration requests
pub fn timeout(timeout: Duration) -> ConfigOption {
    Box::new(move |cfg| {
        cfg.net.dial_timeout = timeout;
        cfg.net.read_timeout = timeout;
        cfg.admin.timeout = timeout;
    })
}

/// Enable SASL authentication with the given mechanism and credentials
pub fn sasl(mechanism: &str, user: &str, password: &str) -> ConfigOption {
    let (mechanism, user, password) =
        (mechanism.to_string(), user.to_string(), password.to_string());
    Box::new(move |cfg| {
        cfg.net.sasl.enable = true;
        cfg.net.sasl.mechanism.clone_from(&mechanism);
        cfg.net.sasl.user.clone_from(&user);
        cfg.net.sasl.password.clone_from(&password);
    })
}

/// Connect over TLS with the given client certificate and trust store
pub fn tls(context: Arc<TlsContext>) -> ConfigOption {
    Box::new(move |cfg| {
        cfg.net.tls.enable = true;
        cfg.net.tls.config = Some(Arc::clone(&context));
    })
}
