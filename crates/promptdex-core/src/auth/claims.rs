//! Credential decoding.
//!
//! Credentials are JWTs issued and verified by the backend. The client never
//! holds the signing key, so decoding here is structural only: split the
//! compact form, base64-decode the payload, and deserialize the claims the
//! session needs. Decoding performs no I/O and has no side effects.

use std::collections::BTreeSet;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Role tag that grants access to the administrative application
pub const ADMIN_ROLE: &str = "ADMIN";

/// Prefix the backend puts in front of role names (`ROLE_ADMIN`)
const ROLE_PREFIX: &str = "ROLE_";

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Credential is not a decodable token: {0}")]
    Malformed(#[from] jsonwebtoken::errors::Error),

    #[error("Credential has an empty subject")]
    EmptySubject,
}

/// Decoded content of a credential.
///
/// Field names on the wire are the registered JWT names (`sub`, `iat`,
/// `exp`) plus the custom `roles` array. Timestamps are seconds since epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "sub")]
    pub subject: String,
    #[serde(default, deserialize_with = "roles_or_empty")]
    pub roles: BTreeSet<String>,
    #[serde(rename = "iat", default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<i64>,
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl Claims {
    /// True once `now` has reached the expiry timestamp.
    pub fn is_expired(&self, now: i64) -> bool {
        is_expired(self, now)
    }

    /// Check for a role, accepting both `ADMIN` and `ROLE_ADMIN` spellings.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| role_matches(r, role))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}

/// Expiry predicate: a credential is expired when `expires_at <= now`.
pub fn is_expired(claims: &Claims, now: i64) -> bool {
    claims.expires_at <= now
}

pub(crate) fn role_matches(tag: &str, role: &str) -> bool {
    tag == role || tag.strip_prefix(ROLE_PREFIX) == Some(role)
}

/// Decode a raw credential into claims.
///
/// Fails on anything that is not a three-part token with a JSON payload
/// carrying at least `sub` and `exp`. Expiry is not checked here.
pub fn decode(raw: &str) -> Result<Claims, DecodeError> {
    let key = DecodingKey::from_secret(&[]);
    let data = jsonwebtoken::decode::<Claims>(raw, &key, &structural_validation())?;

    if data.claims.subject.trim().is_empty() {
        return Err(DecodeError::EmptySubject);
    }

    Ok(data.claims)
}

/// Validation settings for a client that cannot verify signatures.
/// Expiry is evaluated by the session store against its own clock.
fn structural_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
}

fn roles_or_empty<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeSet<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn mint(payload: serde_json::Value) -> String {
        encode(
            &Header::default(),
            &payload,
            &EncodingKey::from_secret(b"backend-secret"),
        )
        .expect("Failed to mint test token")
    }

    #[test]
    fn test_decode_full_claims() {
        let token = mint(json!({
            "sub": "alice",
            "roles": ["USER"],
            "iat": 1000,
            "exp": 2000
        }));

        let claims = decode(&token).expect("valid token should decode");
        assert_eq!(claims.subject, "alice");
        assert!(claims.roles.contains("USER"));
        assert_eq!(claims.issued_at, Some(1000));
        assert_eq!(claims.expires_at, 2000);
    }

    #[test]
    fn test_decode_missing_roles_defaults_to_empty() {
        let token = mint(json!({ "sub": "alice", "iat": 1000, "exp": 2000 }));
        let claims = decode(&token).expect("roles are optional");
        assert!(claims.roles.is_empty());

        let token = mint(json!({ "sub": "alice", "roles": null, "exp": 2000 }));
        let claims = decode(&token).expect("null roles are treated as empty");
        assert!(claims.roles.is_empty());
        assert_eq!(claims.issued_at, None);
    }

    #[test]
    fn test_decode_missing_required_fields() {
        let no_subject = mint(json!({ "roles": ["USER"], "exp": 2000 }));
        assert!(matches!(decode(&no_subject), Err(DecodeError::Malformed(_))));

        let no_expiry = mint(json!({ "sub": "alice", "roles": ["USER"] }));
        assert!(matches!(decode(&no_expiry), Err(DecodeError::Malformed(_))));

        let blank_subject = mint(json!({ "sub": "  ", "exp": 2000 }));
        assert!(matches!(decode(&blank_subject), Err(DecodeError::EmptySubject)));
    }

    #[test]
    fn test_decode_string_timestamp_rejected() {
        // Timestamps must be integers
        let token = mint(json!({ "sub": "alice", "exp": "2000" }));
        assert!(decode(&token).is_err());
    }

    #[test]
    fn test_decode_garbage() {
        assert!(decode("").is_err());
        assert!(decode("not-a-token").is_err());
        assert!(decode("a.b").is_err());
        assert!(decode("a.b.c").is_err());
        assert!(decode("Bearer abc.def.ghi").is_err());
    }

    #[test]
    fn test_decode_ignores_signing_key() {
        // The client cannot know the backend key, any signature is accepted
        let token = encode(
            &Header::default(),
            &json!({ "sub": "alice", "exp": 2000 }),
            &EncodingKey::from_secret(b"some-other-key"),
        )
        .expect("Failed to mint test token");
        assert_eq!(decode(&token).expect("should decode").subject, "alice");
    }

    #[test]
    fn test_is_expired_boundary() {
        let token = mint(json!({ "sub": "alice", "exp": 2000 }));
        let claims = decode(&token).expect("should decode");
        assert!(!claims.is_expired(1999));
        assert!(claims.is_expired(2000));
        assert!(claims.is_expired(2500));
        assert!(is_expired(&claims, 2000));
    }

    #[test]
    fn test_has_role_accepts_prefixed_form() {
        let token = mint(json!({ "sub": "root", "roles": ["ROLE_ADMIN", "USER"], "exp": 2000 }));
        let claims = decode(&token).expect("should decode");
        assert!(claims.is_admin());
        assert!(claims.has_role("USER"));
        assert!(!claims.has_role("MODERATOR"));
    }

    #[test]
    fn test_role_matches() {
        assert!(role_matches("ADMIN", "ADMIN"));
        assert!(role_matches("ROLE_ADMIN", "ADMIN"));
        assert!(!role_matches("ADMINISTRATOR", "ADMIN"));
        assert!(!role_matches("admin", "ADMIN"));
    }
}
