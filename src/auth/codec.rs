// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed token encoding and decoding.
//!
//! Tokens are compact HS256 JWS strings (`header.claims.signature`). The codec
//! only answers "was this signed with our secret and is the payload a
//! well-formed [`IdentityClaim`]". Expiry and issuer policy belong to the
//! [`AuthValidator`](super::AuthValidator).

use jsonwebtoken::{
    decode as jwt_decode, encode as jwt_encode, errors::ErrorKind, Algorithm, DecodingKey,
    EncodingKey, Header, Validation,
};

use super::{claims::IdentityClaim, AuthError};

/// HMAC token codec bound to one shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Create a codec for the given signing secret.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: signature_only_validation(),
        }
    }

    /// Sign a claim and return the token string.
    pub fn issue(&self, claim: &IdentityClaim) -> Result<String, jsonwebtoken::errors::Error> {
        jwt_encode(&Header::new(Algorithm::HS256), claim, &self.encoding_key)
    }

    /// Verify the signature and return the embedded claim.
    ///
    /// The claim is returned even if it has expired.
    pub fn decode(&self, token: &str) -> Result<IdentityClaim, AuthError> {
        jwt_decode::<IdentityClaim>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::SignatureInvalid,
                _ => AuthError::Malformed,
            })
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

/// Sign `claim` with `secret`.
pub fn issue(claim: &IdentityClaim, secret: &[u8]) -> Result<String, jsonwebtoken::errors::Error> {
    TokenCodec::new(secret).issue(claim)
}

/// Verify `token` against `secret` and return its claim.
pub fn decode(token: &str, secret: &[u8]) -> Result<IdentityClaim, AuthError> {
    TokenCodec::new(secret).decode(token)
}

/// HS256 only, signature only: no exp/nbf/aud checks and no registered
/// claims required beyond what [`IdentityClaim`] itself demands.
fn signature_only_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
}
