// ABOUTME: RSA key pair generation and loading for RS256 token signing
// ABOUTME: One pair is loaded at process start and shared read-only by all threads
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

//! RSA signing key management
//!
//! The service signs every token with a single RS256 key pair identified by
//! a `kid`. The pair is loaded (or generated) once at startup and treated as
//! immutable afterwards, so concurrent signing and verification need no
//! synchronization.

use anyhow::{anyhow, Result};
use jsonwebtoken::{DecodingKey, EncodingKey};
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};

/// RSA key size in bits (2048 bits minimum for RS256)
const RSA_KEY_SIZE: usize = 2048;

/// RSA key pair with the derived `jsonwebtoken` keys precomputed
pub struct SigningKeyPair {
    /// Key identifier stamped into every token header
    pub kid: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    private_key_pem: String,
    public_key_pem: String,
}

impl SigningKeyPair {
    /// Generate a new RSA key pair
    ///
    /// # Errors
    /// Returns an error if key generation or PEM encoding fails
    pub fn generate(kid: &str) -> Result<Self> {
        Self::generate_with_key_size(kid, RSA_KEY_SIZE)
    }

    /// Generate an RSA key pair with a configurable key size.
    ///
    /// Smaller sizes are only appropriate for tests.
    ///
    /// # Errors
    /// Returns an error if key generation or PEM encoding fails
    pub fn generate_with_key_size(kid: &str, key_size_bits: usize) -> Result<Self> {
        use rand::rngs::OsRng;

        let mut rng = OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, key_size_bits)
            .map_err(|e| anyhow!("Failed to generate RSA private key: {e}"))?;

        Self::from_private_key(kid, &private_key)
    }

    /// Import a key pair from a PKCS#8 PEM private key
    ///
    /// # Errors
    /// Returns an error if PEM parsing fails
    pub fn import_private_key_pem(kid: &str, pem: &str) -> Result<Self> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| anyhow!("Failed to parse private key PEM: {e}"))?;

        Self::from_private_key(kid, &private_key)
    }

    fn from_private_key(kid: &str, private_key: &RsaPrivateKey) -> Result<Self> {
        let public_key = RsaPublicKey::from(private_key);

        let private_key_pem = private_key
            .to_pkcs8_pem(rsa::pkcs8::LineEnding::LF)
            .map(|pem| pem.to_string())
            .map_err(|e| anyhow!("Failed to export private key as PEM: {e}"))?;

        let public_key_pem = public_key
            .to_public_key_pem(rsa::pkcs8::LineEnding::LF)
            .map_err(|e| anyhow!("Failed to export public key as PEM: {e}"))?;

        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| anyhow!("Failed to build encoding key: {e}"))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| anyhow!("Failed to build decoding key: {e}"))?;

        Ok(Self {
            kid: kid.to_owned(),
            encoding_key,
            decoding_key,
            private_key_pem,
            public_key_pem,
        })
    }

    /// Signing key for token issuance
    #[must_use]
    pub const fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    /// Verification key for token validation
    #[must_use]
    pub const fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    /// Export the private key as PKCS#8 PEM
    #[must_use]
    pub fn export_private_key_pem(&self) -> &str {
        &self.private_key_pem
    }

    /// Export the public key as SPKI PEM
    #[must_use]
    pub fn export_public_key_pem(&self) -> &str {
        &self.public_key_pem
    }
}

impl std::fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material stays out of debug output
        f.debug_struct("SigningKeyPair")
            .field("kid", &self.kid)
            .finish_non_exhaustive()
    }
}
