//! Session token decoding.
//!
//! DESIGN
//! ======
//! A token is a dot-delimited string whose claims segment is base64-encoded
//! JSON. Decoding is strict: the result is a typed [`SessionClaims`] or a
//! [`TokenError`], never a partially-filled value. The signature segment, if
//! any, is not verified here; the issuing backend owns that.
//!
//! Two layouts are supported:
//! - [`TokenFormat::Compact`]: `claims.signature`, exactly two segments.
//! - [`TokenFormat::Jwt`]: `header.claims.signature`, exactly three segments.

#[cfg(test)]
#[path = "token_test.rs"]
mod tests;

use std::fmt;
use std::str::FromStr;

use base64::Engine as _;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use serde::{Deserialize, Serialize};

use crate::role::Role;

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_encode_padding(false)
    .with_decode_padding_mode(DecodePaddingMode::Indifferent);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("expected {expected} token segments, found {found}")]
    SegmentCount { expected: usize, found: usize },
    #[error("claims segment is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("claims segment is not a valid claims object: {0}")]
    Claims(#[from] serde_json::Error),
    #[error("unknown role_id {0}")]
    UnknownRoleId(u8),
    #[error("role {role} does not match role_id {role_id}")]
    RoleMismatch { role: Role, role_id: u8 },
}

// =============================================================================
// TOKEN FORMAT
// =============================================================================

/// Segment layout of session tokens accepted by the guard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TokenFormat {
    /// Two segments, claims first.
    #[default]
    Compact,
    /// Standard three-segment JWT layout, claims in the middle.
    Jwt,
}

impl TokenFormat {
    fn segment_count(self) -> usize {
        match self {
            Self::Compact => 2,
            Self::Jwt => 3,
        }
    }

    fn claims_index(self) -> usize {
        match self {
            Self::Compact => 0,
            Self::Jwt => 1,
        }
    }
}

impl fmt::Display for TokenFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Compact => "compact",
            Self::Jwt => "jwt",
        })
    }
}

impl FromStr for TokenFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "compact" | "two-segment" => Ok(Self::Compact),
            "jwt" | "three-segment" => Ok(Self::Jwt),
            other => Err(format!("unknown token format `{other}` (expected `compact` or `jwt`)")),
        }
    }
}

// =============================================================================
// CLAIMS
// =============================================================================

#[derive(Deserialize)]
struct WireClaims {
    role: Role,
    role_id: u8,
    exp: i64,
}

/// Validated claims carried by a session token.
///
/// `role` and `role_id` are guaranteed to agree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SessionClaims {
    role: Role,
    role_id: u8,
    exp: i64,
}

impl SessionClaims {
    #[must_use]
    pub fn new(role: Role, exp: i64) -> Self {
        Self { role, role_id: role.id(), exp }
    }

    /// Decode the claims segment of `token` laid out as `format`.
    ///
    /// # Errors
    ///
    /// Fails on a wrong segment count, bad base64, a claims object with
    /// missing or mistyped fields, an unknown `role_id`, or a `role` that
    /// disagrees with `role_id`.
    pub fn parse(token: &str, format: TokenFormat) -> Result<Self, TokenError> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != format.segment_count() {
            return Err(TokenError::SegmentCount { expected: format.segment_count(), found: segments.len() });
        }

        let bytes = decode_segment(segments[format.claims_index()])?;
        let wire: WireClaims = serde_json::from_slice(&bytes)?;

        let from_id = Role::from_id(wire.role_id).map_err(|_| TokenError::UnknownRoleId(wire.role_id))?;
        if from_id != wire.role {
            return Err(TokenError::RoleMismatch { role: wire.role, role_id: wire.role_id });
        }

        Ok(Self { role: wire.role, role_id: wire.role_id, exp: wire.exp })
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn role_id(&self) -> u8 {
        self.role_id
    }

    /// Expiry in seconds since the Unix epoch.
    #[must_use]
    pub fn exp(&self) -> i64 {
        self.exp
    }

    /// Expired strictly before `now`; a token expiring this second is still valid.
    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        self.exp < now
    }

    /// Encode these claims as an unsigned token of the given layout.
    ///
    /// Used for fixtures and local development; the issuing backend mints
    /// real tokens.
    #[must_use]
    pub fn encode_unsigned(&self, format: TokenFormat) -> String {
        let claims = serde_json::json!({ "role": self.role, "role_id": self.role_id, "exp": self.exp });
        let payload = URL_SAFE_LENIENT.encode(claims.to_string());
        match format {
            TokenFormat::Compact => format!("{payload}.unsigned"),
            TokenFormat::Jwt => {
                let header = URL_SAFE_LENIENT.encode(r#"{"alg":"none","typ":"JWT"}"#);
                format!("{header}.{payload}.unsigned")
            }
        }
    }
}

/// Decode a base64 segment in either the standard or URL-safe alphabet,
/// with or without padding.
fn decode_segment(segment: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD_LENIENT
        .decode(segment)
        .or_else(|_| URL_SAFE_LENIENT.decode(segment))
}
