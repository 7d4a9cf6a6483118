// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Kafkaconf Authors
#![allow(dead_code)]

use base64::{engine::general_purpose, Engine as _};
use openssl::{
    asn1::Asn1Time,
    bn::{BigNum, MsbOption},
    hash::MessageDigest,
    nid::Nid,
    pkey::{PKey, Private},
    rsa::Rsa,
    x509::{
        extension::{BasicConstraints, KeyUsage, SubjectAlternativeName},
        X509Name, X509NameRef, X509,
    },
};

/// A CA and a client certificate it signed
pub struct Material {
    pub ca: X509,
    pub ca_key: PKey<Private>,
    pub cert: X509,
    pub key: PKey<Private>,
}

/// Base64 encoded PEM, the form the tls keys are configured in
pub struct EncodedMaterial {
    pub ca: String,
    pub client_pem: String,
    pub client_key: String,
}

pub fn rsa_key() -> PKey<Private> {
    PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap() //#[allow_ci]
}

/// Create a certificate for `key`, self-signed unless an issuer is given
pub fn certificate(
    common_name: &str,
    key: &PKey<Private>,
    issuer: Option<(&X509, &PKey<Private>)>,
    is_ca: bool,
    dns_names: &[&str],
) -> X509 {
    let mut name = X509Name::builder().unwrap(); //#[allow_ci]
    name.append_entry_by_nid(Nid::COMMONNAME, common_name)
        .unwrap(); //#[allow_ci]
    let name = name.build();

    let mut builder = X509::builder().unwrap(); //#[allow_ci]
    builder.set_version(2).unwrap(); //#[allow_ci]
    let mut serial = BigNum::new().unwrap(); //#[allow_ci]
    serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap(); //#[allow_ci]
    builder
        .set_serial_number(&serial.to_asn1_integer().unwrap()) //#[allow_ci]
        .unwrap(); //#[allow_ci]
    builder.set_subject_name(&name).unwrap(); //#[allow_ci]
    let issuer_name: &X509NameRef = match issuer {
        Some((ca, _)) => ca.subject_name(),
        None => &name,
    };
    builder.set_issuer_name(issuer_name).unwrap(); //#[allow_ci]
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap()) //#[allow_ci]
        .unwrap(); //#[allow_ci]
    builder
        .set_not_after(&Asn1Time::days_from_now(365).unwrap()) //#[allow_ci]
        .unwrap(); //#[allow_ci]
    builder.set_pubkey(key).unwrap(); //#[allow_ci]

    let constraints = if is_ca {
        BasicConstraints::new().critical().ca().build()
    } else {
        BasicConstraints::new().critical().build()
    };
    builder.append_extension(constraints.unwrap()).unwrap(); //#[allow_ci]
    if is_ca {
        let usage = KeyUsage::new().critical().key_cert_sign().build();
        builder.append_extension(usage.unwrap()).unwrap(); //#[allow_ci]
    }
    if !dns_names.is_empty() {
        let mut san = SubjectAlternativeName::new();
        for dns_name in dns_names {
            _ = san.dns(dns_name);
        }
        let san = san.build(&builder.x509v3_context(None, None));
        builder.append_extension(san.unwrap()).unwrap(); //#[allow_ci]
    }

    let signing_key = issuer.map_or(key, |(_, ca_key)| ca_key);
    builder.sign(signing_key, MessageDigest::sha256()).unwrap(); //#[allow_ci]
    builder.build()
}

pub fn material() -> Material {
    let ca_key = rsa_key();
    let ca = certificate("Kafka CA", &ca_key, None, true, &[]);
    let key = rsa_key();
    let cert = certificate(
        "kafka-client",
        &key,
        Some((&ca, &ca_key)),
        false,
        &["localhost"],
    );
    Material {
        ca,
        ca_key,
        cert,
        key,
    }
}

pub fn encode(data: &[u8]) -> String {
    general_purpose::STANDARD.encode(data)
}

impl Material {
    pub fn encoded(&self) -> EncodedMaterial {
        EncodedMaterial {
            ca: encode(&self.ca.to_pem().unwrap()), //#[allow_ci]
            client_pem: encode(&self.cert.to_pem().unwrap()), //#[allow_ci]
            client_key: encode(&self.key.private_key_to_pem_pkcs8().unwrap()), //#[allow_ci]
        }
    }
}
