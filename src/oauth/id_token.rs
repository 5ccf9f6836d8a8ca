// ABOUTME: Local ID-token claims decoding for profile rendering
// ABOUTME: Reads the OpenID Connect payload segment without a network round-trip
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Local ID-token claims decode
//!
//! The ID token arrives directly from the issuer over TLS during the code
//! exchange, so the payload is read without signature verification; this is
//! a display aid, not an authentication decision.

use crate::errors::{AppError, AppResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

/// Identity claims surfaced on the profile view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Subject identifier
    pub sub: String,
    /// Email address
    pub email: Option<String>,
    /// Login name
    pub preferred_username: Option<String>,
    /// Display name
    pub name: Option<String>,
    /// Avatar URL
    pub picture: Option<String>,
}

/// Decode the claims segment of a compact-serialized ID token
///
/// # Errors
///
/// Returns an error if the token is not three dot-separated segments, the
/// payload is not valid base64url, or the claims do not parse as JSON.
pub fn decode_claims(id_token: &str) -> AppResult<IdTokenClaims> {
    let mut segments = id_token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(AppError::auth_invalid("malformed ID token"));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| AppError::auth_invalid(format!("ID token payload is not base64url: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| AppError::auth_invalid(format!("ID token claims are not valid JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Compact-serialize claims with an empty header and signature
    pub(crate) fn encode_token(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
        format!("{header}.{payload}.sig")
    }

    #[test]
    fn test_decode_claims_roundtrip() {
        let token = encode_token(&serde_json::json!({
            "sub": "42",
            "email": "dev@example.com",
            "preferred_username": "dev",
            "name": "Dev Eloper",
            "picture": "https://gitlab.example.com/avatar.png"
        }));

        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.email.as_deref(), Some("dev@example.com"));
        assert_eq!(claims.preferred_username.as_deref(), Some("dev"));
    }

    #[test]
    fn test_decode_claims_tolerates_missing_optional_fields() {
        let token = encode_token(&serde_json::json!({"sub": "42"}));
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert!(claims.email.is_none());
    }

    #[test]
    fn test_decode_rejects_wrong_segment_count() {
        assert!(decode_claims("only.two").is_err());
        assert!(decode_claims("a.b.c.d").is_err());
        assert!(decode_claims("").is_err());
    }

    #[test]
    fn test_decode_rejects_garbage_payload() {
        assert!(decode_claims("h.!!!.s").is_err());
    }
}
