//! Caller identity for the notification endpoints.
//!
//! Tokens are issued by the platform's auth service; this crate only verifies
//! them. `Authenticator` is the seam the web layer depends on so tests (or a
//! different identity provider) can supply their own verification.

use crate::error::{AuthErrorKind, Error};
use crate::Id;
use async_trait::async_trait;
use chrono::Utc;
use entity::roles::Role;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};
use service::config::Config;
use std::time::Duration;

/// A verified caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Id,
    pub role: Role,
}

impl Identity {
    pub fn subscriber_id(&self) -> String {
        self.user_id.to_string()
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Verifies `credential` and returns who presented it.
    async fn authenticate(&self, credential: &str) -> Result<Identity, Error>;
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SessionClaims {
    pub(crate) sub: String,
    #[serde(default)]
    pub(crate) role: Role,
    pub(crate) exp: usize,
}

/// Verifies HS256 session tokens signed with a shared secret.
pub struct JwtAuthenticator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtAuthenticator {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let secret = config.jwt_secret().ok_or_else(|| {
            warn!("No JWT secret configured; session tokens cannot be verified");
            Error::config("missing JWT secret")
        })?;
        Ok(Self::new(&secret))
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn authenticate(&self, credential: &str) -> Result<Identity, Error> {
        let data = decode::<SessionClaims>(credential, &self.decoding_key, &self.validation)
            .map_err(|err| {
                debug!("Rejected session token: {err}");
                Error::from(err)
            })?;

        let user_id = Id::parse_str(&data.claims.sub)
            .map_err(|_| Error::auth(AuthErrorKind::InvalidCredential))?;

        Ok(Identity {
            user_id,
            role: data.claims.role,
        })
    }
}

/// Signs a session token for `identity` valid for `ttl`.
///
/// Production tokens come from the auth service; this exists for seeding
/// local environments and for tests.
pub fn issue_token(secret: &str, identity: &Identity, ttl: Duration) -> Result<String, Error> {
    let claims = SessionClaims {
        sub: identity.user_id.to_string(),
        role: identity.role,
        exp: (Utc::now().timestamp() as u64 + ttl.as_secs()) as usize,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainErrorKind;

    const SECRET: &str = "test-secret";
    const HOUR: Duration = Duration::from_secs(3600);

    fn identity(role: Role) -> Identity {
        Identity {
            user_id: Id::new_v4(),
            role,
        }
    }

    #[tokio::test]
    async fn accepts_a_token_signed_with_the_shared_secret() {
        let expected = identity(Role::Admin);
        let token = issue_token(SECRET, &expected, HOUR).unwrap();

        let verified = JwtAuthenticator::new(SECRET)
            .authenticate(&token)
            .await
            .unwrap();

        assert_eq!(verified, expected);
        assert_eq!(verified.subscriber_id(), expected.user_id.to_string());
    }

    #[tokio::test]
    async fn rejects_a_token_signed_with_another_secret() {
        let token = issue_token("other-secret", &identity(Role::User), HOUR).unwrap();

        let err = JwtAuthenticator::new(SECRET)
            .authenticate(&token)
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Auth(AuthErrorKind::InvalidCredential)
        );
    }

    #[tokio::test]
    async fn rejects_an_expired_token() {
        let claims = SessionClaims {
            sub: Id::new_v4().to_string(),
            role: Role::User,
            exp: (Utc::now().timestamp() - 3600) as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(JwtAuthenticator::new(SECRET)
            .authenticate(&token)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn rejects_a_subject_that_is_not_a_user_id() {
        let claims = SessionClaims {
            sub: "alice".to_string(),
            role: Role::User,
            exp: (Utc::now().timestamp() + 3600) as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let err = JwtAuthenticator::new(SECRET)
            .authenticate(&token)
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Auth(AuthErrorKind::InvalidCredential)
        );
    }

    #[tokio::test]
    async fn rejects_garbage() {
        assert!(JwtAuthenticator::new(SECRET)
            .authenticate("not.a.jwt")
            .await
            .is_err());
    }
}
