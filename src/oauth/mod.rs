// ABOUTME: OAuth module organizing the delegated-authorization client and token handling
// ABOUTME: Centralizes authorization URL construction, code exchange, and ID-token decoding
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # OAuth2 Delegated Authorization
//!
//! The portal never handles user credentials itself: login is a redirect to
//! the provider's authorization endpoint, and the callback trades the
//! returned one-time code for tokens with a single form-encoded POST to the
//! token endpoint. Identity claims are read locally from the ID token.

pub mod client;
pub mod id_token;

pub use client::{OAuth2Client, OAuth2Config, TokenSet};
pub use id_token::{decode_claims, IdTokenClaims};

use rand::RngCore;

/// Generate an unguessable anti-forgery state value, hex-encoded
#[must_use]
pub fn generate_state() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_values_are_unique() {
        assert_ne!(generate_state(), generate_state());
        assert_eq!(generate_state().len(), 32);
    }
}
