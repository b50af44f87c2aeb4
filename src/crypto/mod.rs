// ABOUTME: Cryptographic utilities module
// ABOUTME: RSA signing key management for token issuance
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

//! Cryptographic key management

pub mod keys;

pub use keys::SigningKeyPair;
