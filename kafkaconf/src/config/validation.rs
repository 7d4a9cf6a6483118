// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Kafkaconf Authors
use crate::{
    config::{
        ClientConfig, CompressionCodec, IsolationLevel,
        COMPRESSION_LEVEL_DEFAULT, OFFSET_NEWEST, OFFSET_OLDEST,
        SASL_HANDSHAKE_V0, SASL_HANDSHAKE_V1, SASL_TYPE_GSSAPI,
        SASL_TYPE_OAUTH, SASL_TYPE_PLAINTEXT,
        SASL_TYPE_SCRAM_SHA256, SASL_TYPE_SCRAM_SHA512, WAIT_FOR_ALL,
    },
    version::KafkaVersion,
};
use log::*;
use std::time::Duration;
use thiserror::Error;

/// Largest request the brokers accept by default
const MAX_REQUEST_SIZE: i32 = 100 * 1024 * 1024;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// A count or size that has to be strictly positive
    #[error("{option} must be > 0")]
    NotPositive { option: &'static str },

    /// A count or size that cannot be negative
    #[error("{option} must be >= 0")]
    Negative { option: &'static str },

    /// A duration below its lower bound
    #[error("{option} must be >= {minimum:?}")]
    TooShort {
        option: &'static str,
        minimum: Duration,
    },

    /// Two related options in the wrong order
    #[error("{option} must be < {other}")]
    NotLessThan {
        option: &'static str,
        other: &'static str,
    },

    #[error("producer.flush.max_messages must be >= producer.flush.messages when set")]
    FlushMaxMessages,

    #[error("producer.required_acks must be >= -1, got {acks}")]
    RequiredAcks { acks: i16 },

    #[error("{codec:?} compression does not work with level {level}")]
    CompressionLevel { codec: CompressionCodec, level: i32 },

    /// A feature the configured broker version does not support
    #[error("{feature} requires version >= {required}, got {version}")]
    UnsupportedVersion {
        feature: &'static str,
        required: KafkaVersion,
        version: KafkaVersion,
    },

    #[error("idempotent producer requires {requirement}")]
    Idempotent { requirement: &'static str },

    #[error("consumer.offsets.initial must be -2 (oldest) or -1 (newest), got {offset}")]
    InitialOffset { offset: i64 },

    /// A SASL credential left empty while SASL is enabled
    #[error("{option} must not be empty when SASL is enabled")]
    MissingCredential { option: &'static str },

    #[error("a SCRAM client generator must be set through net.sasl.scramclientgeneratorfunc for {mechanism}")]
    MissingScramClientGenerator { mechanism: String },

    #[error("the {mechanism} SASL mechanism is not supported")]
    UnsupportedSaslMechanism { mechanism: String },

    #[error("the SASL mechanism '{mechanism}' is invalid, possible values are PLAIN, OAUTHBEARER, SCRAM-SHA-256, SCRAM-SHA-512 and GSSAPI")]
    InvalidSaslMechanism { mechanism: String },

    #[error("net.sasl.version must be 0 or 1, got {version}")]
    SaslVersion { version: i16 },

    #[error("client_id '{client_id}' is invalid, only ASCII letters, digits, '.', '_' and '-' are allowed")]
    ClientId { client_id: String },
}

fn positive(option: &'static str, value: i64) -> Result<(), ValidationError> {
    if value <= 0 {
        return Err(ValidationError::NotPositive { option });
    }
    Ok(())
}

fn not_negative(
    option: &'static str,
    value: i64,
) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::Negative { option });
    }
    Ok(())
}

fn at_least(
    option: &'static str,
    value: Duration,
    minimum: Duration,
) -> Result<(), ValidationError> {
    if value < minimum {
        return Err(ValidationError::TooShort { option, minimum });
    }
    Ok(())
}

fn non_zero(
    option: &'static str,
    value: Duration,
) -> Result<(), ValidationError> {
    if value.is_zero() {
        return Err(ValidationError::NotPositive { option });
    }
    Ok(())
}

fn requires_version(
    feature: &'static str,
    version: KafkaVersion,
    required: KafkaVersion,
) -> Result<(), ValidationError> {
    if !version.is_at_least(required) {
        return Err(ValidationError::UnsupportedVersion {
            feature,
            required,
            version,
        });
    }
    Ok(())
}

fn valid_client_id(client_id: &str) -> bool {
    !client_id.is_empty()
        && client_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
}

impl ClientConfig {
    /// Check the configuration for invalid values and incompatible options
    ///
    /// Returns the first problem found. Suspicious but usable values are
    /// only logged.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.warn_suspicious();
        self.validate_net()?;
        self.validate_admin()?;
        self.validate_metadata()?;
        self.validate_producer()?;
        self.validate_consumer()?;
        self.validate_consumer_group()?;

        not_negative("channel_buffer_size", self.channel_buffer_size.into())?;
        if !valid_client_id(&self.client_id) {
            return Err(ValidationError::ClientId {
                client_id: self.client_id.clone(),
            });
        }
        Ok(())
    }

    fn warn_suspicious(&self) {
        let sasl = &self.net.sasl;
        if self.net.tls.enable && self.net.tls.config.is_none() {
            warn!("net.tls.enable is set but no TLS material was provided, the system trust store will be used");
        }
        if !sasl.enable {
            if !sasl.user.is_empty() {
                warn!("net.sasl.user is set but SASL is disabled");
            }
            if !sasl.password.is_empty() {
                warn!("net.sasl.password is set but SASL is disabled");
            }
        }
        if self.producer.required_acks > 1 {
            warn!("producer.required_acks > 1 is deprecated and will raise an error on brokers >= 0.10");
        }
        if self.producer.max_message_bytes >= MAX_REQUEST_SIZE {
            warn!("producer.max_message_bytes must be smaller than the maximum request size of {MAX_REQUEST_SIZE}, it will be ignored");
        }
        if self.producer.flush.bytes >= MAX_REQUEST_SIZE {
            warn!("producer.flush.bytes must be smaller than the maximum request size of {MAX_REQUEST_SIZE}, it will be ignored");
        }
        if !self.producer.flush.frequency.is_zero()
            && self.producer.flush.frequency < Duration::from_millis(1)
        {
            warn!("producer.flush.frequency is below one millisecond");
        }
    }

    fn validate_net(&self) -> Result<(), ValidationError> {
        let net = &self.net;
        positive("net.max_open_requests", net.max_open_requests.into())?;
        non_zero("net.dial_timeout", net.dial_timeout)?;
        non_zero("net.read_timeout", net.read_timeout)?;
        non_zero("net.write_timeout", net.write_timeout)?;

        let sasl = &net.sasl;
        if !sasl.enable {
            return Ok(());
        }
        if sasl.version != SASL_HANDSHAKE_V0 && sasl.version != SASL_HANDSHAKE_V1
        {
            return Err(ValidationError::SaslVersion {
                version: sasl.version,
            });
        }

        let mechanism = if sasl.mechanism.is_empty() {
            SASL_TYPE_PLAINTEXT
        } else {
            sasl.mechanism.as_str()
        };
        match mechanism {
            SASL_TYPE_PLAINTEXT => self.require_credentials(),
            SASL_TYPE_SCRAM_SHA256 | SASL_TYPE_SCRAM_SHA512 => {
                self.require_credentials()?;
                if sasl.scram_client_generator.is_none() {
                    return Err(
                        ValidationError::MissingScramClientGenerator {
                            mechanism: mechanism.to_string(),
                        },
                    );
                }
                Ok(())
            }
            SASL_TYPE_OAUTH | SASL_TYPE_GSSAPI => {
                Err(ValidationError::UnsupportedSaslMechanism {
                    mechanism: mechanism.to_string(),
                })
            }
            _ => Err(ValidationError::InvalidSaslMechanism {
                mechanism: mechanism.to_string(),
            }),
        }
    }

    fn require_credentials(&self) -> Result<(), ValidationError> {
        if self.net.sasl.user.is_empty() {
            return Err(ValidationError::MissingCredential {
                option: "net.sasl.user",
            });
        }
        if self.net.sasl.password.is_empty() {
            return Err(ValidationError::MissingCredential {
                option: "net.sasl.password",
            });
        }
        Ok(())
    }

    fn validate_admin(&self) -> Result<(), ValidationError> {
        not_negative("admin.retry.max", self.admin.retry.max.into())?;
        non_zero("admin.timeout", self.admin.timeout)
    }

    fn validate_metadata(&self) -> Result<(), ValidationError> {
        not_negative("metadata.retry.max", self.metadata.retry.max.into())
    }

    fn validate_producer(&self) -> Result<(), ValidationError> {
        let producer = &self.producer;
        positive(
            "producer.max_message_bytes",
            producer.max_message_bytes.into(),
        )?;
        if producer.required_acks < WAIT_FOR_ALL {
            return Err(ValidationError::RequiredAcks {
                acks: producer.required_acks,
            });
        }
        non_zero("producer.timeout", producer.timeout)?;
        not_negative("producer.flush.bytes", producer.flush.bytes.into())?;
        not_negative(
            "producer.flush.messages",
            producer.flush.messages.into(),
        )?;
        not_negative(
            "producer.flush.max_messages",
            producer.flush.max_messages.into(),
        )?;
        if producer.flush.max_messages > 0
            && producer.flush.max_messages < producer.flush.messages
        {
            return Err(ValidationError::FlushMaxMessages);
        }
        not_negative("producer.retry.max", producer.retry.max.into())?;

        match producer.compression {
            CompressionCodec::Lz4 => requires_version(
                "lz4 compression",
                self.version,
                KafkaVersion::V0_10_0_0,
            )?,
            CompressionCodec::Zstd => requires_version(
                "zstd compression",
                self.version,
                KafkaVersion::V2_1_0_0,
            )?,
            CompressionCodec::Gzip => {
                let level = producer.compression_level;
                if level != COMPRESSION_LEVEL_DEFAULT
                    && !(-2..=9).contains(&level)
                {
                    return Err(ValidationError::CompressionLevel {
                        codec: producer.compression,
                        level,
                    });
                }
            }
            CompressionCodec::None | CompressionCodec::Snappy => {}
        }

        if producer.idempotent {
            requires_version(
                "idempotent producer",
                self.version,
                KafkaVersion::V0_11_0_0,
            )?;
            if producer.retry.max == 0 {
                return Err(ValidationError::Idempotent {
                    requirement: "producer.retry.max >= 1",
                });
            }
            if producer.required_acks != WAIT_FOR_ALL {
                return Err(ValidationError::Idempotent {
                    requirement: "producer.required_acks to be -1 (wait for all)",
                });
            }
            if self.net.max_open_requests > 1 {
                return Err(ValidationError::Idempotent {
                    requirement: "net.max_open_requests to be 1",
                });
            }
        }
        Ok(())
    }

    fn validate_consumer(&self) -> Result<(), ValidationError> {
        let consumer = &self.consumer;
        positive("consumer.fetch.min", consumer.fetch.min.into())?;
        positive("consumer.fetch.default", consumer.fetch.default.into())?;
        not_negative("consumer.fetch.max", consumer.fetch.max.into())?;
        at_least(
            "consumer.max_wait_time",
            consumer.max_wait_time,
            Duration::from_millis(1),
        )?;
        non_zero("consumer.max_processing_time", consumer.max_processing_time)?;
        non_zero(
            "consumer.offsets.auto_commit.interval",
            consumer.offsets.auto_commit.interval,
        )?;
        if consumer.offsets.initial != OFFSET_OLDEST
            && consumer.offsets.initial != OFFSET_NEWEST
        {
            return Err(ValidationError::InitialOffset {
                offset: consumer.offsets.initial,
            });
        }
        not_negative(
            "consumer.offsets.retry.max",
            consumer.offsets.retry.max.into(),
        )?;
        if consumer.isolation_level == IsolationLevel::ReadCommitted {
            requires_version(
                "read_committed isolation",
                self.version,
                KafkaVersion::V0_11_0_0,
            )?;
        }
        Ok(())
    }

    fn validate_consumer_group(&self) -> Result<(), ValidationError> {
        let group = &self.consumer.group;
        if group.session.timeout <= Duration::from_millis(2) {
            return Err(ValidationError::TooShort {
                option: "consumer.group.session.timeout",
                minimum: Duration::from_millis(2),
            });
        }
        at_least(
            "consumer.group.heartbeat.interval",
            group.heartbeat.interval,
            Duration::from_millis(1),
        )?;
        if group.heartbeat.interval >= group.session.timeout {
            return Err(ValidationError::NotLessThan {
                option: "consumer.group.heartbeat.interval",
                other: "consumer.group.session.timeout",
            });
        }
        at_least(
            "consumer.group.rebalance.timeout",
            group.rebalance.timeout,
            Duration::from_millis(1),
        )?;
        not_negative(
            "consumer.group.rebalance.retry.max",
            group.rebalance.retry.max.into(),
        )
    }
}
