// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Kafkaconf Authors

//! SCRAM authentication for SASL
//!
//! The configuration names the hash used by the SCRAM mechanism
//! (`SHA256` or `SHA512`). [`ScramClientGenerator`] turns that choice into a
//! factory producing one [`ScramClient`] per authentication attempt. Every
//! client drives its own RFC 5802 conversation, see [`conversation`].

pub mod conversation;

use crate::scram::conversation::{ClientConversation, MIN_ITERATIONS};
use log::*;
use openssl::hash::MessageDigest;
use std::{convert::TryFrom, fmt, sync::Arc};
use thiserror::Error;

/// Configuration value selecting SCRAM-SHA-256
pub const SHA256: &str = "SHA256";
/// Configuration value selecting SCRAM-SHA-512
pub const SHA512: &str = "SHA512";

#[derive(Error, Debug)]
pub enum ScramError {
    /// The configured hash generator is not known
    #[error("unsupported scram generator function {value}, only SHA256 and SHA512 values allowed")]
    UnsupportedMechanism { value: String },

    /// A step was requested before the conversation was started
    #[error("SCRAM conversation was not started, call begin first")]
    NotStarted,

    /// A step was requested after the conversation finished
    #[error("SCRAM conversation already finished")]
    ConversationDone,

    /// The server sent a message that could not be parsed
    #[error("malformed SCRAM {message_type} message: {reason}")]
    MalformedMessage {
        message_type: &'static str,
        reason: String,
    },

    /// The server nonce does not extend the client nonce
    #[error("server nonce does not start with the client nonce")]
    InvalidNonce,

    /// The server reported an authentication error
    #[error("SCRAM server error: {0}")]
    Server(String),

    /// The server signature did not match the expected one
    #[error("invalid SCRAM server signature")]
    InvalidServerSignature,

    /// The server requested fewer iterations than allowed
    #[error("SCRAM iteration count {iterations} is lower than the minimum {minimum}")]
    IterationCount { iterations: u32, minimum: u32 },

    /// Error decoding a base64 field
    #[error("failed to decode base64 {field}")]
    Base64Decode {
        field: &'static str,
        source: base64::DecodeError,
    },

    /// Error in a cryptographic primitive
    #[error("SCRAM crypto error: {message}")]
    Crypto {
        message: String,
        source: openssl::error::ErrorStack,
    },
}

/// Hash function used by the SCRAM mechanism
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HashGenerator {
    Sha256,
    Sha512,
}

impl HashGenerator {
    /// SASL mechanism name negotiated with the broker
    pub fn mechanism_name(&self) -> &'static str {
        match self {
            HashGenerator::Sha256 => "SCRAM-SHA-256",
            HashGenerator::Sha512 => "SCRAM-SHA-512",
        }
    }
}

impl TryFrom<&str> for HashGenerator {
    type Error = ScramError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            SHA256 => Ok(HashGenerator::Sha256),
            SHA512 => Ok(HashGenerator::Sha512),
            _ => Err(ScramError::UnsupportedMechanism {
                value: value.into(),
            }),
        }
    }
}

impl fmt::Display for HashGenerator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self {
            HashGenerator::Sha256 => SHA256,
            HashGenerator::Sha512 => SHA512,
        };
        write!(f, "{value}")
    }
}

impl From<HashGenerator> for MessageDigest {
    fn from(hash: HashGenerator) -> Self {
        match hash {
            HashGenerator::Sha256 => MessageDigest::sha256(),
            HashGenerator::Sha512 => MessageDigest::sha512(),
        }
    }
}

/// The handshake client used during SASL authentication
///
/// `begin` starts a new conversation, discarding any previous one. `step`
/// takes the latest server challenge (empty for the first step) and returns
/// the next client message. `done` reports whether the conversation has
/// completed.
pub trait ScramClient {
    fn begin(
        &mut self,
        user: &str,
        password: &str,
        authz_id: &str,
    ) -> Result<(), ScramError>;

    fn step(&mut self, challenge: &str) -> Result<String, ScramError>;

    fn done(&self) -> bool;
}

/// [`ScramClient`] running an RFC 5802 conversation with the given hash
#[derive(Debug)]
pub struct ScramAdapter {
    hash: HashGenerator,
    min_iterations: u32,
    conversation: Option<ClientConversation>,
}

impl ScramAdapter {
    pub fn new(hash: HashGenerator) -> Self {
        ScramAdapter {
            hash,
            min_iterations: MIN_ITERATIONS,
            conversation: None,
        }
    }

    /// Accept servers requesting at least `min_iterations` PBKDF2 rounds
    pub fn min_iterations(mut self, min_iterations: u32) -> Self {
        self.min_iterations = min_iterations;
        self
    }

    pub fn hash(&self) -> HashGenerator {
        self.hash
    }
}

impl ScramClient for ScramAdapter {
    fn begin(
        &mut self,
        user: &str,
        password: &str,
        authz_id: &str,
    ) -> Result<(), ScramError> {
        debug!(
            "Starting {} conversation for user {user}",
            self.hash.mechanism_name()
        );
        self.conversation = Some(ClientConversation::new(
            self.hash,
            user,
            password,
            authz_id,
            self.min_iterations,
        )?);
        Ok(())
    }

    fn step(&mut self, challenge: &str) -> Result<String, ScramError> {
        match self.conversation.as_mut() {
            Some(conversation) => conversation.step(challenge),
            None => Err(ScramError::NotStarted),
        }
    }

    fn done(&self) -> bool {
        self.conversation
            .as_ref()
            .is_some_and(|conversation| conversation.done())
    }
}

type ScramClientFactory =
    dyn Fn() -> Box<dyn ScramClient + Send> + Send + Sync;

/// Factory producing a fresh [`ScramClient`] for each authentication
///
/// The generator is cheap to clone and can be shared between threads. Every
/// call to [`ScramClientGenerator::generate`] returns an independent client.
#[derive(Clone)]
pub struct ScramClientGenerator {
    factory: Arc<ScramClientFactory>,
    hash: Option<HashGenerator>,
}

impl ScramClientGenerator {
    /// Wrap an arbitrary client factory
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Box<dyn ScramClient + Send> + Send + Sync + 'static,
    {
        ScramClientGenerator {
            factory: Arc::new(factory),
            hash: None,
        }
    }

    /// Generator producing [`ScramAdapter`] clients using `hash`
    pub fn from_hash(hash: HashGenerator) -> Self {
        ScramClientGenerator {
            factory: Arc::new(move || -> Box<dyn ScramClient + Send> {
                Box::new(ScramAdapter::new(hash))
            }),
            hash: Some(hash),
        }
    }

    pub fn generate(&self) -> Box<dyn ScramClient + Send> {
        (self.factory)()
    }

    /// The hash used by the generated clients, when built from a hash
    pub fn hash(&self) -> Option<HashGenerator> {
        self.hash
    }
}

impl From<HashGenerator> for ScramClientGenerator {
    fn from(hash: HashGenerator) -> Self {
        ScramClientGenerator::from_hash(hash)
    }
}

impl fmt::Debug for ScramClientGenerator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.hash {
            Some(hash) => write!(f, "ScramClientGenerator({hash})"),
            None => write!(f, "ScramClientGenerator(custom)"),
        }
    }
}
