use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;

pub const TOKEN_TYPE_BEARER: &str = "Bearer";

/// Identity carried inside every token: `aud` holds the user id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub aud: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBundle {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub jti: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token signing failed")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("invalid token")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    aud: String,
    name: String,
    jti: String,
    iat: i64,
    exp: i64,
    token_type: TokenKind,
}

/// Read side of the claims. Identity claims that are missing or not
/// strings decode as empty rather than failing.
#[derive(Debug, Deserialize)]
struct IdentityClaims {
    #[serde(default, deserialize_with = "lenient_string")]
    aud: String,
    #[serde(default, deserialize_with = "lenient_string")]
    name: String,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_owned).unwrap_or_default())
}

/// Issues and verifies HS256 bearer tokens with one symmetric key.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret_key.as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl: config.access_token_duration,
            refresh_ttl: config.refresh_token_duration,
        }
    }

    pub fn generate(&self, payload: &TokenPayload) -> Result<TokenBundle, TokenError> {
        let now = Utc::now().timestamp();
        let jti = Uuid::new_v4().to_string();
        let header = Header::new(Algorithm::HS256);

        let sign = |kind: TokenKind, ttl: Duration| {
            let claims = Claims {
                aud: payload.aud.clone(),
                name: payload.name.clone(),
                jti: jti.clone(),
                iat: now,
                exp: now.saturating_add(secs(ttl)),
                token_type: kind,
            };
            encode(&header, &claims, &self.encoding_key).map_err(TokenError::Signing)
        };

        let access_token = sign(TokenKind::Access, self.access_ttl)?;
        let refresh_token = sign(TokenKind::Refresh, self.refresh_ttl)?;

        Ok(TokenBundle {
            access_token,
            refresh_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: secs(self.access_ttl),
            jti,
        })
    }

    /// Verifies signature, algorithm and expiry. Every failure is reported
    /// as `TokenError::Invalid` so callers cannot tell causes apart.
    pub fn parse(&self, token: &str) -> Result<TokenPayload, TokenError> {
        let data = decode::<IdentityClaims>(token, &self.decoding_key, &self.validation())
            .map_err(TokenError::Invalid)?;
        Ok(TokenPayload {
            aud: data.claims.aud,
            name: data.claims.name,
        })
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        // `aud` carries the subject user id; it is read, not matched.
        validation.validate_aud = false;
        validation
    }
}

fn secs(d: Duration) -> i64 {
    i64::try_from(d.as_secs()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(&AuthConfig::new(secret))
    }

    fn payload() -> TokenPayload {
        TokenPayload {
            aud: "42".into(),
            name: "merchant".into(),
        }
    }

    fn raw_claims(exp_offset: i64) -> serde_json::Value {
        let now = Utc::now().timestamp();
        serde_json::json!({
            "aud": "42",
            "name": "merchant",
            "jti": "j",
            "iat": now,
            "exp": now + exp_offset,
            "token_type": "access",
        })
    }

    #[test]
    fn generate_then_parse_recovers_identity() {
        let svc = service("secret-a");
        let bundle = svc.generate(&payload()).unwrap();

        assert_eq!(bundle.token_type, "Bearer");
        assert_eq!(bundle.expires_in, 900);
        assert!(Uuid::parse_str(&bundle.jti).is_ok());
        assert_ne!(bundle.access_token, bundle.refresh_token);

        assert_eq!(svc.parse(&bundle.access_token).unwrap(), payload());
        assert_eq!(svc.parse(&bundle.refresh_token).unwrap(), payload());
    }

    #[test]
    fn both_tokens_share_one_jti_and_carry_their_kind() {
        let svc = service("secret-a");
        let bundle = svc.generate(&payload()).unwrap();
        let validation = svc.validation();

        let access =
            decode::<Claims>(&bundle.access_token, &svc.decoding_key, &validation).unwrap();
        let refresh =
            decode::<Claims>(&bundle.refresh_token, &svc.decoding_key, &validation).unwrap();
        assert_eq!(access.claims.jti, bundle.jti);
        assert_eq!(refresh.claims.jti, bundle.jti);
        assert_eq!(access.claims.token_type, TokenKind::Access);
        assert_eq!(refresh.claims.token_type, TokenKind::Refresh);
        assert_eq!(access.claims.exp - access.claims.iat, 900);
        assert_eq!(refresh.claims.exp - refresh.claims.iat, 432_000);
    }

    #[test]
    fn rejects_token_signed_with_another_key() {
        let bundle = service("secret-a").generate(&payload()).unwrap();
        assert!(matches!(
            service("secret-b").parse(&bundle.access_token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_expired_token() {
        let svc = service("secret-a");
        let token = encode(
            &Header::new(Algorithm::HS256),
            &raw_claims(-60),
            &svc.encoding_key,
        )
        .unwrap();
        assert!(svc.parse(&token).is_err());
    }

    #[test]
    fn rejects_tampered_payload() {
        let svc = service("secret-a");
        let bundle = svc.generate(&payload()).unwrap();
        let mut parts: Vec<String> = bundle.access_token.split('.').map(String::from).collect();

        let forged = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "aud": "1", "name": "admin", "exp": Utc::now().timestamp() + 600 }),
            &EncodingKey::from_secret(b"attacker"),
        )
        .unwrap();
        parts[1] = forged.split('.').nth(1).unwrap().to_string();

        assert!(svc.parse(&parts.join(".")).is_err());
    }

    #[test]
    fn rejects_other_algorithms_even_with_the_same_key() {
        let svc = service("secret-a");
        let token = encode(
            &Header::new(Algorithm::HS512),
            &raw_claims(600),
            &EncodingKey::from_secret(b"secret-a"),
        )
        .unwrap();
        assert!(svc.parse(&token).is_err());
    }

    #[test]
    fn missing_identity_claims_decode_as_empty() {
        let svc = service("secret-a");
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "aud": ["x", "y"], "exp": Utc::now().timestamp() + 600 }),
            &svc.encoding_key,
        )
        .unwrap();
        assert_eq!(svc.parse(&token).unwrap(), TokenPayload::default());
    }

    #[test]
    fn rejects_garbage() {
        let svc = service("secret-a");
        assert!(svc.parse("").is_err());
        assert!(svc.parse("not.a.jwt").is_err());
    }
}
