// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Kafkaconf Authors
use crate::{
    config::ConfigKeys, crypto::TlsContext, scram::ScramClientGenerator,
    version::KafkaVersion,
};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};

/// SASL/PLAIN authentication
pub const SASL_TYPE_PLAINTEXT: &str = "PLAIN";
/// SASL/OAUTHBEARER authentication
pub const SASL_TYPE_OAUTH: &str = "OAUTHBEARER";
/// SCRAM authentication with SHA-256
pub const SASL_TYPE_SCRAM_SHA256: &str = "SCRAM-SHA-256";
/// SCRAM authentication with SHA-512
pub const SASL_TYPE_SCRAM_SHA512: &str = "SCRAM-SHA-512";
/// Kerberos authentication
pub const SASL_TYPE_GSSAPI: &str = "GSSAPI";

/// Version 0 of the SASL handshake
pub const SASL_HANDSHAKE_V0: i16 = 0;
/// Version 1 of the SASL handshake
pub const SASL_HANDSHAKE_V1: i16 = 1;

/// Do not wait for the broker to acknowledge produced messages
pub const NO_RESPONSE: i16 = 0;
/// Wait for the partition leader to commit produced messages
pub const WAIT_FOR_LOCAL: i16 = 1;
/// Wait for all in-sync replicas to commit produced messages
pub const WAIT_FOR_ALL: i16 = -1;

/// Start consuming from the newest available offset
pub const OFFSET_NEWEST: i64 = -1;
/// Start consuming from the oldest available offset
pub const OFFSET_OLDEST: i64 = -2;

/// Compression level selecting the codec's own default
pub const COMPRESSION_LEVEL_DEFAULT: i32 = -1000;

/// Kafka client configuration
///
/// Every field is addressable through a dotted key path (`net.sasl.user`,
/// `producer.flush.max_messages`), see [`ConfigKeys`].
///
/// # Fields
///
/// - `admin`: cluster administration requests
/// - `net`: broker connections, TLS and SASL
/// - `metadata`: cluster metadata refresh
/// - `producer`: message production
/// - `consumer`: message consumption and consumer groups
#[derive(Debug, Clone, Serialize, Deserialize, ConfigKeys)]
pub struct ClientConfig {
    /// Administration settings
    pub admin: AdminConfig,
    /// Network settings
    pub net: NetConfig,
    /// Metadata settings
    pub metadata: MetadataConfig,
    /// Producer settings
    pub producer: ProducerConfig,
    /// Consumer settings
    pub consumer: ConsumerConfig,
    /// Name sent to the brokers for logging and quotas
    pub client_id: String,
    /// Rack the client runs in, used for follower fetching
    pub rack_id: String,
    /// Number of events buffered in internal channels
    pub channel_buffer_size: i32,
    /// Query the broker for supported API versions on connect
    pub api_versions_request: bool,
    /// Broker version the client assumes
    ///
    /// Resolved separately from the other keys, see
    /// [`crate::config::resolve`].
    #[serde(skip)]
    #[config_keys(leaf)]
    pub version: KafkaVersion,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            admin: AdminConfig::default(),
            net: NetConfig::default(),
            metadata: MetadataConfig::default(),
            producer: ProducerConfig::default(),
            consumer: ConsumerConfig::default(),
            client_id: "kafkaconf".to_string(),
            rack_id: String::new(),
            channel_buffer_size: 256,
            api_versions_request: true,
            version: KafkaVersion::DEFAULT,
        }
    }
}

/// Number of attempts and pause between them
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ConfigKeys,
)]
pub struct RetryConfig {
    /// Maximum number of retries
    pub max: i32,
    /// Pause before each retry
    #[serde(with = "crate::config::duration")]
    pub backoff: Duration,
}

impl RetryConfig {
    fn new(max: i32, backoff: Duration) -> Self {
        Self { max, backoff }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ConfigKeys)]
pub struct AdminConfig {
    pub retry: RetryConfig,
    /// Maximum duration of an administration request
    #[serde(with = "crate::config::duration")]
    pub timeout: Duration,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::new(5, Duration::from_millis(100)),
            timeout: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ConfigKeys)]
pub struct NetConfig {
    /// Requests in flight per broker connection
    pub max_open_requests: i32,
    #[serde(with = "crate::config::duration")]
    pub dial_timeout: Duration,
    #[serde(with = "crate::config::duration")]
    pub read_timeout: Duration,
    #[serde(with = "crate::config::duration")]
    pub write_timeout: Duration,
    /// TCP keep-alive period, zero disables it
    #[serde(with = "crate::config::duration")]
    pub keep_alive: Duration,
    pub tls: NetTlsConfig,
    pub sasl: SaslConfig,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            max_open_requests: 5,
            dial_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
            keep_alive: Duration::ZERO,
            tls: NetTlsConfig::default(),
            sasl: SaslConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ConfigKeys)]
pub struct NetTlsConfig {
    /// Connect to the brokers over TLS
    pub enable: bool,
    /// Client certificate and trust store, built from the `tls` keys
    #[serde(skip)]
    #[config_keys(skip)]
    pub config: Option<Arc<TlsContext>>,
}

/// SASL authentication settings
#[derive(Debug, Clone, Serialize, Deserialize, ConfigKeys)]
pub struct SaslConfig {
    /// Authenticate with SASL after connecting
    pub enable: bool,
    /// Mechanism name, one of the `SASL_TYPE_*` constants
    pub mechanism: String,
    /// SASL handshake version
    pub version: i16,
    /// Send the Kafka SASL handshake first
    pub handshake: bool,
    /// Authorization identity used with SASL/PLAIN
    pub authz_id: String,
    pub user: String,
    pub password: String,
    /// Authorization identity used with SCRAM
    pub scram_authz_id: String,
    /// Factory of SCRAM conversations
    ///
    /// Set from the `SHA256` or `SHA512` value of this key.
    #[serde(skip)]
    #[config_keys(name = "scramclientgeneratorfunc")]
    pub scram_client_generator: Option<ScramClientGenerator>,
}

impl Default for SaslConfig {
    fn default() -> Self {
        Self {
            enable: false,
            mechanism: SASL_TYPE_PLAINTEXT.to_string(),
            version: SASL_HANDSHAKE_V0,
            handshake: true,
            authz_id: String::new(),
            user: String::new(),
            password: String::new(),
            scram_authz_id: String::new(),
            scram_client_generator: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ConfigKeys)]
pub struct MetadataConfig {
    pub retry: RetryConfig,
    /// Interval of the background metadata refresh, zero disables it
    #[serde(with = "crate::config::duration")]
    pub refresh_frequency: Duration,
    /// Fetch metadata for every topic, not only the ones in use
    pub full: bool,
    /// Upper bound of a metadata request including retries, zero for none
    #[serde(with = "crate::config::duration")]
    pub timeout: Duration,
    pub allow_auto_topic_creation: bool,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::new(3, Duration::from_millis(250)),
            refresh_frequency: Duration::from_secs(600),
            full: true,
            timeout: Duration::ZERO,
            allow_auto_topic_creation: true,
        }
    }
}

/// Compression codec of produced message batches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionCodec {
    #[default]
    None,
    Gzip,
    Snappy,
    Lz4,
    Zstd,
}

#[derive(Debug, Clone, Serialize, Deserialize, ConfigKeys)]
pub struct ProducerConfig {
    /// Largest message accepted, should match the broker setting
    pub max_message_bytes: i32,
    /// Acknowledgements required, one of `NO_RESPONSE`, `WAIT_FOR_LOCAL`
    /// and `WAIT_FOR_ALL`
    pub required_acks: i16,
    /// How long the broker waits for the required acknowledgements
    #[serde(with = "crate::config::duration")]
    pub timeout: Duration,
    #[config_keys(leaf)]
    pub compression: CompressionCodec,
    pub compression_level: i32,
    /// Produce every message exactly once
    pub idempotent: bool,
    #[serde(rename = "return")]
    pub returns: ProducerReturnConfig,
    pub flush: FlushConfig,
    pub retry: RetryConfig,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            max_message_bytes: 1_000_000,
            required_acks: WAIT_FOR_LOCAL,
            timeout: Duration::from_secs(10),
            compression: CompressionCodec::None,
            compression_level: COMPRESSION_LEVEL_DEFAULT,
            idempotent: false,
            returns: ProducerReturnConfig::default(),
            flush: FlushConfig::default(),
            retry: RetryConfig::new(3, Duration::from_millis(100)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ConfigKeys)]
pub struct ProducerReturnConfig {
    /// Report delivered messages
    pub successes: bool,
    /// Report failed messages
    pub errors: bool,
}

impl Default for ProducerReturnConfig {
    fn default() -> Self {
        Self {
            successes: false,
            errors: true,
        }
    }
}

/// Batching thresholds, zero leaves a threshold unset
#[derive(Debug, Clone, Default, Serialize, Deserialize, ConfigKeys)]
pub struct FlushConfig {
    pub bytes: i32,
    pub messages: i32,
    #[serde(with = "crate::config::duration")]
    pub frequency: Duration,
    /// Upper bound of messages per request
    pub max_messages: i32,
}

/// Visibility of transactional messages to the consumer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    #[default]
    ReadUncommitted,
    ReadCommitted,
}

#[derive(Debug, Clone, Serialize, Deserialize, ConfigKeys)]
pub struct ConsumerConfig {
    pub group: ConsumerGroupConfig,
    pub retry: ConsumerRetryConfig,
    pub fetch: FetchConfig,
    /// How long the broker may wait to fill a fetch response
    #[serde(with = "crate::config::duration")]
    pub max_wait_time: Duration,
    /// Time the application is expected to spend on a message
    #[serde(with = "crate::config::duration")]
    pub max_processing_time: Duration,
    #[serde(rename = "return")]
    pub returns: ConsumerReturnConfig,
    pub offsets: OffsetsConfig,
    #[config_keys(leaf)]
    pub isolation_level: IsolationLevel,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            group: ConsumerGroupConfig::default(),
            retry: ConsumerRetryConfig::default(),
            fetch: FetchConfig::default(),
            max_wait_time: Duration::from_millis(500),
            max_processing_time: Duration::from_millis(100),
            returns: ConsumerReturnConfig::default(),
            offsets: OffsetsConfig::default(),
            isolation_level: IsolationLevel::ReadUncommitted,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ConfigKeys)]
pub struct ConsumerGroupConfig {
    pub session: GroupSessionConfig,
    pub heartbeat: GroupHeartbeatConfig,
    pub rebalance: GroupRebalanceConfig,
}

impl Default for ConsumerGroupConfig {
    fn default() -> Self {
        Self {
            session: GroupSessionConfig {
                timeout: Duration::from_secs(10),
            },
            heartbeat: GroupHeartbeatConfig {
                interval: Duration::from_secs(3),
            },
            rebalance: GroupRebalanceConfig {
                timeout: Duration::from_secs(60),
                retry: RetryConfig::new(4, Duration::from_secs(2)),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ConfigKeys)]
pub struct GroupSessionConfig {
    #[serde(with = "crate::config::duration")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize, ConfigKeys)]
pub struct GroupHeartbeatConfig {
    #[serde(with = "crate::config::duration")]
    pub interval: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize, ConfigKeys)]
pub struct GroupRebalanceConfig {
    /// Time allowed for members to rejoin during a rebalance
    #[serde(with = "crate::config::duration")]
    pub timeout: Duration,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, ConfigKeys)]
pub struct ConsumerRetryConfig {
    /// Pause before reading a partition again after a failure
    #[serde(with = "crate::config::duration")]
    pub backoff: Duration,
}

impl Default for ConsumerRetryConfig {
    fn default() -> Self {
        Self {
            backoff: Duration::from_secs(2),
        }
    }
}

/// Fetch request sizes in bytes
#[derive(Debug, Clone, Serialize, Deserialize, ConfigKeys)]
pub struct FetchConfig {
    pub min: i32,
    pub default: i32,
    /// Zero means no limit
    pub max: i32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            min: 1,
            default: 1024 * 1024,
            max: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ConfigKeys)]
pub struct ConsumerReturnConfig {
    /// Report consumption errors instead of logging them
    pub errors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ConfigKeys)]
pub struct OffsetsConfig {
    pub auto_commit: AutoCommitConfig,
    /// Where to start without a committed offset, `OFFSET_NEWEST` or
    /// `OFFSET_OLDEST`
    pub initial: i64,
    /// Retention of committed offsets, zero keeps the broker setting
    #[serde(with = "crate::config::duration")]
    pub retention: Duration,
    pub retry: OffsetsRetryConfig,
}

impl Default for OffsetsConfig {
    fn default() -> Self {
        Self {
            auto_commit: AutoCommitConfig::default(),
            initial: OFFSET_NEWEST,
            retention: Duration::ZERO,
            retry: OffsetsRetryConfig { max: 3 },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ConfigKeys)]
pub struct AutoCommitConfig {
    pub enable: bool,
    #[serde(with = "crate::config::duration")]
    pub interval: Duration,
}

impl Default for AutoCommitConfig {
    fn default() -> Self {
        Self {
            enable: true,
            interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ConfigKeys)]
pub struct OffsetsRetryConfig {
    pub max: i32,
}

/// Base64 encoded PEM material for mutual TLS
///
/// Read from the `tls` subtree, see [`RootTls`]. Missing values are empty.
#[derive(Clone, Default, Serialize, Deserialize, ConfigKeys)]
#[serde(default)]
pub struct TlsSettings {
    /// CA certificates trusted to sign broker certificates
    pub ca: String,
    /// Client certificate chain, leaf first
    #[serde(rename = "clientpem")]
    pub client_pem: String,
    /// Private key of the client certificate
    #[serde(rename = "clientkey")]
    pub client_key: String,
}

impl std::fmt::Debug for TlsSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsSettings")
            .field("ca", &self.ca)
            .field("client_pem", &self.client_pem)
            .field("client_key", &"<redacted>")
            .finish()
    }
}

/// Top level document holding the `tls` subtree
#[derive(Debug, Clone, Default, Serialize, Deserialize, ConfigKeys)]
pub struct RootTls {
    pub tls: TlsSettings,
}
