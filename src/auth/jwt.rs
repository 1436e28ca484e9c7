use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{config::JwtConfig, state::AppState};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Token payload. Access tokens carry the email as subject plus an explicit
/// `email` claim; refresh tokens carry only the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            access_ttl_hours,
            refresh_ttl_days,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl: Duration::from_secs((access_ttl_hours as u64) * 3600),
            refresh_ttl: Duration::from_secs((refresh_ttl_days as u64) * 24 * 3600),
        }
    }
}

impl JwtKeys {
    fn sign(&self, claims: &Claims) -> anyhow::Result<String> {
        let token = encode(&Header::default(), claims, &self.encoding)?;
        debug!(user_id = %claims.user_id, kind = ?claims.kind, "jwt signed");
        Ok(token)
    }

    fn timestamps(&self, ttl: Duration) -> (usize, usize) {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        (now.unix_timestamp() as usize, exp.unix_timestamp() as usize)
    }

    pub fn sign_access(&self, user_id: Uuid, email: &str) -> anyhow::Result<String> {
        let (iat, exp) = self.timestamps(self.access_ttl);
        self.sign(&Claims {
            sub: email.to_string(),
            user_id,
            email: Some(email.to_string()),
            kind: TokenKind::Access,
            iat,
            exp,
        })
    }

    pub fn sign_refresh(&self, user_id: Uuid) -> anyhow::Result<String> {
        let (iat, exp) = self.timestamps(self.refresh_ttl);
        self.sign(&Claims {
            sub: user_id.to_string(),
            user_id,
            email: None,
            kind: TokenKind::Refresh,
            iat,
            exp,
        })
    }

    /// Signature and expiry check. Every failure mode collapses into one
    /// error so callers cannot tell which check rejected the token.
    ///
    /// Expiry is compared in whole seconds with zero leeway: a token is
    /// still valid at exactly `exp` and invalid one second later.
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.user_id, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    /// `verify` plus the type cross-check: access tokens are rejected here.
    pub fn verify_refresh(&self, token: &str) -> anyhow::Result<Claims> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Refresh {
            anyhow::bail!("not a refresh token");
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        let state = AppState::fake();
        JwtKeys::from_ref(&state)
    }

    #[tokio::test]
    async fn sign_and_verify_access_token() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign_access(user_id, "a@b.com").expect("sign access");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.sub, "a@b.com");
        assert_eq!(claims.email.as_deref(), Some("a@b.com"));
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[tokio::test]
    async fn sign_and_verify_refresh_token() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign_refresh(user_id).expect("sign refresh");
        let claims = keys.verify_refresh(&token).expect("verify refresh");
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.sub, user_id.to_string());
        assert!(claims.email.is_none());
        assert_eq!(claims.kind, TokenKind::Refresh);
    }

    #[tokio::test]
    async fn verify_refresh_rejects_access_token() {
        let keys = make_keys();
        let token = keys
            .sign_access(Uuid::new_v4(), "a@b.com")
            .expect("sign access");
        let err = keys.verify_refresh(&token).unwrap_err();
        assert!(err.to_string().contains("not a refresh token"));
    }

    #[tokio::test]
    async fn verify_rejects_expired_token() {
        let keys = make_keys();
        let (iat, _) = keys.timestamps(Duration::from_secs(0));
        let claims = Claims {
            sub: "a@b.com".into(),
            user_id: Uuid::new_v4(),
            email: Some("a@b.com".into()),
            kind: TokenKind::Access,
            iat,
            exp: iat - 120,
        };
        let token = keys.sign(&claims).expect("sign");
        assert!(keys.verify(&token).is_err());
    }

    #[tokio::test]
    async fn verify_accepts_token_at_exact_expiry() {
        let keys = make_keys();
        // A zero-second ttl makes `exp` the current second; with zero leeway
        // that is the last moment the token verifies.
        let (iat, exp) = keys.timestamps(Duration::from_secs(0));
        assert_eq!(iat, exp);
        let claims = Claims {
            sub: "a@b.com".into(),
            user_id: Uuid::new_v4(),
            email: Some("a@b.com".into()),
            kind: TokenKind::Access,
            iat,
            exp,
        };
        let token = keys.sign(&claims).expect("sign");
        keys.verify(&token).expect("token at exp should verify");
    }

    #[tokio::test]
    async fn verify_rejects_tampered_token() {
        let keys = make_keys();
        let mut token = keys
            .sign_access(Uuid::new_v4(), "a@b.com")
            .expect("sign access");
        token.push('x');
        assert!(keys.verify(&token).is_err());
    }

    #[tokio::test]
    async fn verify_rejects_wrong_secret() {
        let keys = make_keys();
        let other = JwtKeys {
            encoding: EncodingKey::from_secret(b"different-secret"),
            decoding: DecodingKey::from_secret(b"different-secret"),
            access_ttl: keys.access_ttl,
            refresh_ttl: keys.refresh_ttl,
        };
        let token = keys
            .sign_access(Uuid::new_v4(), "a@b.com")
            .expect("sign access");
        assert!(other.verify(&token).is_err());
    }
}
