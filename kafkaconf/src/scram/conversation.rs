// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Kafkaconf Authors

//! Client side of a SCRAM exchange (RFC 5802, RFC 7677)
//!
//! The conversation goes through three client messages:
//!
//! 1. client-first: `n,[a=authzid],n=user,r=client_nonce`
//! 2. client-final, answering the server-first challenge with the proof
//! 3. the server-final message is verified and an empty response is returned

use crate::scram::{HashGenerator, ScramError};
use base64::{engine::general_purpose, Engine as _};
use openssl::{
    hash::{hash, MessageDigest},
    memcmp,
    pkcs5::pbkdf2_hmac,
    pkey::PKey,
    rand::rand_bytes,
    sign::Signer,
};
use std::fmt;

/// Lowest PBKDF2 iteration count accepted from a server
pub const MIN_ITERATIONS: u32 = 4096;

/// Random bytes in the client nonce, before base64 encoding
const NONCE_LEN: usize = 24;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    ClientFirst,
    ServerFirst,
    ServerFinal,
    Done,
}

pub struct ClientConversation {
    hash: HashGenerator,
    user: String,
    password: String,
    authz_id: String,
    nonce: String,
    min_iterations: u32,
    state: State,
    client_first_bare: String,
    server_signature: Vec<u8>,
    valid: bool,
}

// The password is kept out of debug output
impl fmt::Debug for ClientConversation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ClientConversation")
            .field("hash", &self.hash)
            .field("user", &self.user)
            .field("authz_id", &self.authz_id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Escapes `=` and `,` in a SCRAM `saslname`
fn escape_name(name: &str) -> String {
    name.replace('=', "=3D").replace(',', "=2C")
}

fn generate_nonce() -> Result<String, ScramError> {
    let mut bytes = [0u8; NONCE_LEN];
    rand_bytes(&mut bytes).map_err(|source| ScramError::Crypto {
        message: "failed to generate client nonce".into(),
        source,
    })?;
    Ok(general_purpose::STANDARD.encode(bytes))
}

fn hmac(
    digest: MessageDigest,
    key: &[u8],
    data: &[u8],
) -> Result<Vec<u8>, ScramError> {
    let pkey = PKey::hmac(key).map_err(|source| ScramError::Crypto {
        message: "failed to create HMAC key".into(),
        source,
    })?;
    let mut signer =
        Signer::new(digest, &pkey).map_err(|source| ScramError::Crypto {
            message: "failed creating Signer object".into(),
            source,
        })?;
    signer.update(data).map_err(|source| ScramError::Crypto {
        message: "failed to add input data to Signer".into(),
        source,
    })?;
    signer.sign_to_vec().map_err(|source| ScramError::Crypto {
        message: "failed to generate HMAC".into(),
        source,
    })
}

/// Parses `k=value` attributes in the order given by `keys`
///
/// Trailing extension attributes are ignored.
fn parse_attributes<'a, const N: usize>(
    message_type: &'static str,
    message: &'a str,
    keys: [char; N],
) -> Result<[&'a str; N], ScramError> {
    let mut values = [""; N];
    let mut fields = message.split(',');

    for (key, value) in keys.iter().zip(values.iter_mut()) {
        let field =
            fields.next().ok_or_else(|| ScramError::MalformedMessage {
                message_type,
                reason: format!("missing attribute '{key}'"),
            })?;
        *value = field
            .strip_prefix(*key)
            .and_then(|rest| rest.strip_prefix('='))
            .ok_or_else(|| ScramError::MalformedMessage {
                message_type,
                reason: format!("expected attribute '{key}', got '{field}'"),
            })?;
    }

    Ok(values)
}

impl ClientConversation {
    pub fn new(
        hash: HashGenerator,
        user: &str,
        password: &str,
        authz_id: &str,
        min_iterations: u32,
    ) -> Result<Self, ScramError> {
        Ok(Self::with_nonce(
            hash,
            user,
            password,
            authz_id,
            min_iterations,
            generate_nonce()?,
        ))
    }

    fn with_nonce(
        hash: HashGenerator,
        user: &str,
        password: &str,
        authz_id: &str,
        min_iterations: u32,
        nonce: String,
    ) -> Self {
        ClientConversation {
            hash,
            user: escape_name(user),
            password: password.to_string(),
            authz_id: escape_name(authz_id),
            nonce,
            min_iterations,
            state: State::ClientFirst,
            client_first_bare: String::new(),
            server_signature: Vec::new(),
            valid: false,
        }
    }

    /// Advance the conversation with the latest server message
    pub fn step(&mut self, challenge: &str) -> Result<String, ScramError> {
        match self.state {
            State::ClientFirst => {
                self.state = State::ServerFirst;
                Ok(self.client_first())
            }
            State::ServerFirst => {
                self.state = State::ServerFinal;
                self.client_final(challenge)
            }
            State::ServerFinal => {
                self.state = State::Done;
                self.verify_server_final(challenge)?;
                Ok(String::new())
            }
            State::Done => Err(ScramError::ConversationDone),
        }
    }

    pub fn done(&self) -> bool {
        self.state == State::Done
    }

    /// Whether the server proved knowledge of the password
    pub fn valid(&self) -> bool {
        self.valid
    }

    fn gs2_header(&self) -> String {
        if self.authz_id.is_empty() {
            "n,,".to_string()
        } else {
            format!("n,a={},", self.authz_id)
        }
    }

    fn client_first(&mut self) -> String {
        self.client_first_bare = format!("n={},r={}", self.user, self.nonce);
        format!("{}{}", self.gs2_header(), self.client_first_bare)
    }

    fn client_final(
        &mut self,
        server_first: &str,
    ) -> Result<String, ScramError> {
        if let Some(extension) = server_first.strip_prefix("m=") {
            return Err(ScramError::MalformedMessage {
                message_type: "server-first",
                reason: format!("unsupported mandatory extension '{extension}'"),
            });
        }

        let [nonce, salt, iterations] =
            parse_attributes("server-first", server_first, ['r', 's', 'i'])?;

        if !nonce.starts_with(&self.nonce) || nonce.len() <= self.nonce.len()
        {
            return Err(ScramError::InvalidNonce);
        }

        let salt = general_purpose::STANDARD.decode(salt).map_err(|source| {
            ScramError::Base64Decode {
                field: "salt",
                source,
            }
        })?;

        let iterations: u32 =
            iterations
                .parse()
                .map_err(|_| ScramError::MalformedMessage {
                    message_type: "server-first",
                    reason: format!("invalid iteration count '{iterations}'"),
                })?;
        if iterations < self.min_iterations {
            return Err(ScramError::IterationCount {
                iterations,
                minimum: self.min_iterations,
            });
        }

        let digest: MessageDigest = self.hash.into();

        let mut salted_password = vec![0u8; digest.size()];
        pbkdf2_hmac(
            self.password.as_bytes(),
            &salt,
            iterations as usize,
            digest,
            &mut salted_password,
        )
        .map_err(|source| ScramError::Crypto {
            message: "failed to derive salted password with PBKDF2".into(),
            source,
        })?;

        let client_key = hmac(digest, &salted_password, b"Client Key")?;
        let stored_key =
            hash(digest, &client_key).map_err(|source| ScramError::Crypto {
                message: "failed to calculate stored key".into(),
                source,
            })?;

        let without_proof = format!(
            "c={},r={}",
            general_purpose::STANDARD.encode(self.gs2_header()),
            nonce
        );
        let auth_message = format!(
            "{},{},{}",
            self.client_first_bare, server_first, without_proof
        );

        let client_signature =
            hmac(digest, &stored_key, auth_message.as_bytes())?;
        let proof: Vec<u8> = client_key
            .iter()
            .zip(client_signature.iter())
            .map(|(k, s)| k ^ s)
            .collect();

        let server_key = hmac(digest, &salted_password, b"Server Key")?;
        self.server_signature =
            hmac(digest, &server_key, auth_message.as_bytes())?;

        Ok(format!(
            "{},p={}",
            without_proof,
            general_purpose::STANDARD.encode(proof)
        ))
    }

    fn verify_server_final(
        &mut self,
        server_final: &str,
    ) -> Result<(), ScramError> {
        if let Some(error) = server_final.strip_prefix("e=") {
            return Err(ScramError::Server(error.to_string()));
        }

        let [verifier] =
            parse_attributes("server-final", server_final, ['v'])?;
        let signature =
            general_purpose::STANDARD.decode(verifier).map_err(|source| {
                ScramError::Base64Decode {
                    field: "server signature",
                    source,
                }
            })?;

        if signature.len() != self.server_signature.len()
            || !memcmp::eq(&signature, &self.server_signature)
        {
            return Err(ScramError::InvalidServerSignature);
        }

        self.valid = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 7677, section 3
    const USER: &str = "user";
    const PASSWORD: &str = "pencil";
    const CLIENT_NONCE: &str = "rOprNGfwEbeRWgbNEkqO";
    const SERVER_FIRST: &str = "r=rOprNGfwEbeRWgbNEkqO%hvYDpWUa2RaTCAfuxFIlj)hNlF$k0,s=W22ZaJ0SNY7soEsUEjb6gQ==,i=4096";
    const CLIENT_FINAL: &str = "c=biws,r=rOprNGfwEbeRWgbNEkqO%hvYDpWUa2RaTCAfuxFIlj)hNlF$k0,p=dHzbZapWIk4jUhN+Ute9ytag9zjfMHgsqmmiz7AndVQ=";
    const SERVER_FINAL: &str = "v=6rriTRBi23WpRR/wtup+mMhUZUn/dB5nLTJRsjl95G4=";

    fn rfc_conversation() -> ClientConversation {
        ClientConversation::with_nonce(
            HashGenerator::Sha256,
            USER,
            PASSWORD,
            "",
            MIN_ITERATIONS,
            CLIENT_NONCE.to_string(),
        )
    }

    /// Minimal SCRAM server: returns the expected client proof and the
    /// server-final message
    fn server_messages(
        generator: HashGenerator,
        password: &str,
        client_first: &str,
        server_first: &str,
        client_final_without_proof: &str,
    ) -> (String, String) {
        let digest: MessageDigest = generator.into();
        let [_, salt, iterations] =
            parse_attributes("server-first", server_first, ['r', 's', 'i'])
                .unwrap(); //#[allow_ci]
        let salt = general_purpose::STANDARD.decode(salt).unwrap(); //#[allow_ci]
        let mut salted = vec![0u8; digest.size()];
        pbkdf2_hmac(
            password.as_bytes(),
            &salt,
            iterations.parse().unwrap(), //#[allow_ci]
            digest,
            &mut salted,
        )
        .unwrap(); //#[allow_ci]

        let bare = client_first.splitn(3, ',').nth(2).unwrap(); //#[allow_ci]
        let auth_message =
            format!("{bare},{server_first},{client_final_without_proof}");

        let client_key = hmac(digest, &salted, b"Client Key").unwrap(); //#[allow_ci]
        let stored_key = hash(digest, &client_key).unwrap(); //#[allow_ci]
        let signature =
            hmac(digest, &stored_key, auth_message.as_bytes()).unwrap(); //#[allow_ci]
        let proof: Vec<u8> = client_key
            .iter()
            .zip(signature.iter())
            .map(|(k, s)| k ^ s)
            .collect();

        let server_key = hmac(digest, &salted, b"Server Key").unwrap(); //#[allow_ci]
        let server_signature =
            hmac(digest, &server_key, auth_message.as_bytes()).unwrap(); //#[allow_ci]

        (
            general_purpose::STANDARD.encode(proof),
            format!("v={}", general_purpose::STANDARD.encode(server_signature)),
        )
    }

    #[test]
    fn test_rfc7677_vector() {
        let mut conversation = rfc_conversation();

        let first = conversation.step("").unwrap(); //#[allow_ci]
        assert_eq!(first, format!("n,,n={USER},r={CLIENT_NONCE}"));
        assert!(!conversation.done());

        let last = conversation.step(SERVER_FIRST).unwrap(); //#[allow_ci]
        assert_eq!(last, CLIENT_FINAL);
        assert!(!conversation.done());

        let empty = conversation.step(SERVER_FINAL).unwrap(); //#[allow_ci]
        assert_eq!(empty, "");
        assert!(conversation.done());
        assert!(conversation.valid());

        assert!(matches!(
            conversation.step(""),
            Err(ScramError::ConversationDone)
        ));
    }

    #[test]
    fn test_full_exchange_sha512() {
        let mut conversation = ClientConversation::new(
            HashGenerator::Sha512,
            "admin",
            "s3cr3t",
            "",
            MIN_ITERATIONS,
        )
        .unwrap(); //#[allow_ci]

        let client_first = conversation.step("").unwrap(); //#[allow_ci]
        let nonce = client_first.rsplit_once("r=").unwrap().1; //#[allow_ci]
        let server_first =
            format!("r={nonce}serverpart,s=QSXCR+Q6sek8bf92,i=4096");

        let client_final = conversation.step(&server_first).unwrap(); //#[allow_ci]
        let (without_proof, proof) = client_final.rsplit_once(",p=").unwrap(); //#[allow_ci]
        let (expected_proof, server_final) = server_messages(
            HashGenerator::Sha512,
            "s3cr3t",
            &client_first,
            &server_first,
            without_proof,
        );
        assert_eq!(proof, expected_proof);

        conversation.step(&server_final).unwrap(); //#[allow_ci]
        assert!(conversation.done());
        assert!(conversation.valid());
    }

    #[test]
    fn test_authz_and_escaping() {
        let mut conversation = ClientConversation::with_nonce(
            HashGenerator::Sha256,
            "us=er,1",
            PASSWORD,
            "ad,min",
            MIN_ITERATIONS,
            CLIENT_NONCE.to_string(),
        );
        let first = conversation.step("").unwrap(); //#[allow_ci]
        assert_eq!(
            first,
            format!("n,a=ad=2Cmin,n=us=3Der=2C1,r={CLIENT_NONCE}")
        );
    }

    #[test]
    fn test_invalid_nonce() {
        let mut conversation = rfc_conversation();
        conversation.step("").unwrap(); //#[allow_ci]
        let result =
            conversation.step("r=somethingelse,s=W22ZaJ0SNY7soEsUEjb6gQ==,i=4096");
        assert!(matches!(result, Err(ScramError::InvalidNonce)));

        let mut conversation = rfc_conversation();
        conversation.step("").unwrap(); //#[allow_ci]
        let result = conversation
            .step(&format!("r={CLIENT_NONCE},s=W22ZaJ0SNY7soEsUEjb6gQ==,i=4096"));
        assert!(matches!(result, Err(ScramError::InvalidNonce)));
    }

    #[test]
    fn test_low_iteration_count() {
        let mut conversation = rfc_conversation();
        conversation.step("").unwrap(); //#[allow_ci]
        let result = conversation.step(&format!(
            "r={CLIENT_NONCE}xyz,s=W22ZaJ0SNY7soEsUEjb6gQ==,i=1024"
        ));
        assert!(matches!(
            result,
            Err(ScramError::IterationCount {
                iterations: 1024,
                minimum: MIN_ITERATIONS
            })
        ));
    }

    #[test]
    fn test_malformed_server_first() {
        for server_first in [
            "",
            "s=W22ZaJ0SNY7soEsUEjb6gQ==,i=4096",
            "r=rOprNGfwEbeRWgbNEkqOxyz,i=4096",
            "r=rOprNGfwEbeRWgbNEkqOxyz,s=W22ZaJ0SNY7soEsUEjb6gQ==",
            "r=rOprNGfwEbeRWgbNEkqOxyz,s=W22ZaJ0SNY7soEsUEjb6gQ==,i=many",
            "m=ext,r=rOprNGfwEbeRWgbNEkqOxyz,s=W22ZaJ0SNY7soEsUEjb6gQ==,i=4096",
        ] {
            let mut conversation = rfc_conversation();
            conversation.step("").unwrap(); //#[allow_ci]
            let result = conversation.step(server_first);
            assert!(
                matches!(result, Err(ScramError::MalformedMessage { .. })),
                "'{server_first}' should be rejected as malformed"
            );
        }

        let mut conversation = rfc_conversation();
        conversation.step("").unwrap(); //#[allow_ci]
        let result =
            conversation.step("r=rOprNGfwEbeRWgbNEkqOxyz,s=!!!,i=4096");
        assert!(matches!(
            result,
            Err(ScramError::Base64Decode { field: "salt", .. })
        ));
    }

    #[test]
    fn test_server_error() {
        let mut conversation = rfc_conversation();
        conversation.step("").unwrap(); //#[allow_ci]
        conversation.step(SERVER_FIRST).unwrap(); //#[allow_ci]
        let result = conversation.step("e=invalid-proof");
        assert!(
            matches!(result, Err(ScramError::Server(ref e)) if e == "invalid-proof")
        );
        assert!(conversation.done());
        assert!(!conversation.valid());
    }

    #[test]
    fn test_invalid_server_signature() {
        let mut conversation = rfc_conversation();
        conversation.step("").unwrap(); //#[allow_ci]
        conversation.step(SERVER_FIRST).unwrap(); //#[allow_ci]
        let result = conversation
            .step("v=AAAATRBi23WpRR/wtup+mMhUZUn/dB5nLTJRsjl95G4=");
        assert!(matches!(result, Err(ScramError::InvalidServerSignature)));
        assert!(!conversation.valid());

        let mut conversation = rfc_conversation();
        conversation.step("").unwrap(); //#[allow_ci]
        conversation.step(SERVER_FIRST).unwrap(); //#[allow_ci]
        let result = conversation.step("v=c2hvcnQ=");
        assert!(matches!(result, Err(ScramError::InvalidServerSignature)));
    }

    #[test]
    fn test_debug_hides_password() {
        let conversation = rfc_conversation();
        let output = format!("{conversation:?}");
        assert!(output.contains("user"));
        assert!(!output.contains(PASSWORD));
    }
}
