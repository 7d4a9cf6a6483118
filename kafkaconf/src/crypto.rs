// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Kafkaconf Authors

use base64::{engine::general_purpose, Engine as _};
use log::*;
use openssl::{
    pkey::{PKey, Private},
    ssl::{SslConnector, SslMethod},
    x509::{
        store::{X509Store, X509StoreBuilder},
        X509,
    },
};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    /// Error decoding base64 encoded TLS material
    #[error("failed decoding tls {artifact}")]
    Base64Decode {
        artifact: &'static str,
        source: base64::DecodeError,
    },

    /// The client certificate input contained no certificate
    #[error("failed to find any certificate in the client certificate input")]
    MissingClientCertificate,

    /// The private key does not belong to the client certificate
    #[error("private key does not match the client certificate public key")]
    KeyPairMismatch,

    /// Error decoding private key from PEM
    #[error("failed to decode private key from PEM")]
    PrivateKeyFromPEMError(#[source] openssl::error::ErrorStack),

    /// Error generating TLS context
    #[error("Failed to generate TLS context: {message}")]
    SSLContextBuilderError {
        message: String,
        source: openssl::error::ErrorStack,
    },

    /// Trusted X509 certificate store builder error
    #[error("Trusted certificate store builder error: {message}")]
    X509StoreBuilderError {
        message: String,
        source: openssl::error::ErrorStack,
    },

    /// Error loading X509 certificate chain from PEM
    #[error("failed to load X509 certificate chain from PEM")]
    X509ChainFromPEMError(#[source] openssl::error::ErrorStack),

    /// Error obtaining certificate public key
    #[error("failed to get certificate public key")]
    X509GetPublicError(#[source] openssl::error::ErrorStack),

    /// Error encoding X509 certificate in DER format
    #[error("failed to encode X509 certificate in DER format")]
    X509ToDERError(#[source] openssl::error::ErrorStack),
}

/// A client certificate chain with its private key
pub struct ClientCertificate {
    /// DER encoded certificates, leaf first
    pub certificate: Vec<Vec<u8>>,
    leaf: X509,
    chain: Vec<X509>,
    private_key: PKey<Private>,
}

impl ClientCertificate {
    /// The end entity certificate
    pub fn leaf(&self) -> &X509 {
        &self.leaf
    }

    /// Intermediate certificates sent along with the leaf
    pub fn chain(&self) -> &[X509] {
        &self.chain
    }

    pub fn private_key(&self) -> &PKey<Private> {
        &self.private_key
    }
}

impl fmt::Debug for ClientCertificate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ClientCertificate")
            .field("subject", &self.leaf.subject_name())
            .field("chain_len", &self.chain.len())
            .finish_non_exhaustive()
    }
}

/// Mutual TLS material used when connecting to the brokers
///
/// Holds the client certificates presented to the server and the store of
/// trusted root certificates the server certificate is verified against.
/// No server name policy is attached.
pub struct TlsContext {
    certificates: Vec<ClientCertificate>,
    root_certificates: Vec<X509>,
    root_cas: X509Store,
}

impl TlsContext {
    pub fn certificates(&self) -> &[ClientCertificate] {
        &self.certificates
    }

    /// The trusted root certificates, in the order they were loaded
    pub fn root_certificates(&self) -> &[X509] {
        &self.root_certificates
    }

    pub fn root_cas(&self) -> &X509Store {
        &self.root_cas
    }

    /// Creates a TLS connector presenting the client certificate and
    /// trusting only the configured root certificates
    pub fn connector(&self) -> Result<SslConnector, CryptoError> {
        let mut builder = SslConnector::builder(SslMethod::tls()).map_err(
            |source| CryptoError::SSLContextBuilderError {
                message: "failed to create Context Builder object".into(),
                source,
            },
        )?;

        if let Some(client) = self.certificates.first() {
            builder.set_certificate(&client.leaf).map_err(|source| {
                CryptoError::SSLContextBuilderError {
                    message: "failed to set SSL client certificate".into(),
                    source,
                }
            })?;
            for cert in &client.chain {
                builder.add_extra_chain_cert(cert.clone()).map_err(
                    |source| CryptoError::SSLContextBuilderError {
                        message:
                            "failed to add client certificate chain".into(),
                        source,
                    },
                )?;
            }
            builder.set_private_key(&client.private_key).map_err(
                |source| CryptoError::SSLContextBuilderError {
                    message: "failed to set SSL client private key".into(),
                    source,
                },
            )?;
        }

        builder.set_cert_store(build_cert_store(&self.root_certificates)?);

        Ok(builder.build())
    }
}

impl fmt::Debug for TlsContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TlsContext")
            .field("certificates", &self.certificates)
            .field("root_certificates", &self.root_certificates.len())
            .finish_non_exhaustive()
    }
}

const PEM_CERTIFICATE_BEGIN: &str = "-----BEGIN CERTIFICATE-----";
const PEM_CERTIFICATE_END: &str = "-----END CERTIFICATE-----";

/// Load every certificate found in a PEM bundle
///
/// Blocks that cannot be parsed are skipped with a warning, the remaining
/// certificates are kept. Input holding no usable certificate results in an
/// empty list.
pub fn load_x509_cert_list(pem: &[u8]) -> Vec<X509> {
    let pem = String::from_utf8_lossy(pem);
    let mut certs = Vec::new();
    let mut rest = pem.as_ref();

    while let Some(start) = rest.find(PEM_CERTIFICATE_BEGIN) {
        let block = &rest[start..];
        let Some(end) = block.find(PEM_CERTIFICATE_END) else {
            warn!("Ignoring unterminated certificate block in the CA input");
            break;
        };
        let end = end + PEM_CERTIFICATE_END.len();

        match X509::from_pem(block[..end].as_bytes()) {
            Ok(cert) => certs.push(cert),
            Err(e) => {
                warn!("Ignoring malformed certificate block in the CA input: {e}")
            }
        }
        rest = &block[end..];
    }

    if certs.is_empty() {
        warn!("No certificate could be loaded from the CA input, the trusted root store is empty");
    }
    certs
}

/// Build a trusted certificate store holding the given certificates
pub fn build_cert_store(certs: &[X509]) -> Result<X509Store, CryptoError> {
    let mut store_builder = X509StoreBuilder::new().map_err(|source| {
        CryptoError::X509StoreBuilderError {
            message: "failed to create X509 certificate store builder object"
                .into(),
            source,
        }
    })?;
    for cert in certs {
        store_builder.add_cert(cert.clone()).map_err(|source| {
            CryptoError::X509StoreBuilderError {
                message: "failed to add certificate to X509 trusted certificate store".into(),
                source,
            }
        })?;
    }
    Ok(store_builder.build())
}

/// Parse a client certificate chain and its private key, both PEM encoded
///
/// The first certificate is the leaf; the key must match its public key.
pub fn x509_key_pair(
    cert_pem: &[u8],
    key_pem: &[u8],
) -> Result<ClientCertificate, CryptoError> {
    let mut certs = X509::stack_from_pem(cert_pem)
        .map_err(CryptoError::X509ChainFromPEMError)?;
    if certs.is_empty() {
        return Err(CryptoError::MissingClientCertificate);
    }

    let private_key = PKey::private_key_from_pem(key_pem)
        .map_err(CryptoError::PrivateKeyFromPEMError)?;

    let leaf = certs.remove(0);
    let public_key =
        leaf.public_key().map_err(CryptoError::X509GetPublicError)?;
    if !public_key.public_eq(&private_key) {
        return Err(CryptoError::KeyPairMismatch);
    }

    let certificate = std::iter::once(&leaf)
        .chain(certs.iter())
        .map(|c| c.to_der().map_err(CryptoError::X509ToDERError))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ClientCertificate {
        certificate,
        leaf,
        chain: certs,
        private_key,
    })
}

/// Build a [`TlsContext`] from PEM encoded material
pub fn tls_context_from_certs(
    ca_pem: &[u8],
    cert_pem: &[u8],
    key_pem: &[u8],
) -> Result<TlsContext, CryptoError> {
    let client = x509_key_pair(cert_pem, key_pem)?;
    let root_certificates = load_x509_cert_list(ca_pem);
    let root_cas = build_cert_store(&root_certificates)?;

    debug!(
        "Loaded client certificate {:?} and {} trusted root certificate(s)",
        client.leaf.subject_name(),
        root_certificates.len()
    );

    Ok(TlsContext {
        certificates: vec![client],
        root_certificates,
        root_cas,
    })
}

fn decode_base64(
    artifact: &'static str,
    input: &str,
) -> Result<Vec<u8>, CryptoError> {
    general_purpose::STANDARD
        .decode(input)
        .map_err(|source| CryptoError::Base64Decode { artifact, source })
}

/// Build a [`TlsContext`] from base64 encoded PEM material
///
/// The inputs are decoded in order: CA, client certificate, client key. The
/// first one failing to decode is reported.
pub fn tls_context_from_encoded_certs(
    ca: &str,
    client_pem: &str,
    client_key: &str,
) -> Result<TlsContext, CryptoError> {
    let ca_pem = decode_base64("CA", ca)?;
    let cert_pem = decode_base64("client certificate", client_pem)?;
    let key_pem = decode_base64("client key", client_key)?;

    tls_context_from_certs(&ca_pem, &cert_pem, &key_pem)
}
