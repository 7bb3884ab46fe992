//! Bearer token verification.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

pub const AUDIENCE: &str = "authenticated";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthError {
    #[error("missing authorization header")]
    MissingToken,
    #[error("authorization header must use the Bearer scheme")]
    MalformedHeader,
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    InvalidToken,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
    pub aud: String,
}

/// Identity proven by a valid token.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

#[derive(Clone)]
pub struct AuthService {
    key: DecodingKey,
    validation: Validation,
}

impl AuthService {
    pub fn new(secret: &SecretString) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[AUDIENCE]);
        validation.set_required_spec_claims(&["exp", "aud", "sub"]);
        Self {
            key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
        }
    }

    /// Verifies an `Authorization` header value.
    pub fn authenticate_header(&self, header: Option<&str>) -> Result<AuthUser, AuthError> {
        let header = header.ok_or(AuthError::MissingToken)?;
        let token = bearer_token(header).ok_or(AuthError::MalformedHeader)?;
        self.verify(token)
    }

    pub fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken,
            }
        })?;
        let user_id = Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::InvalidToken)?;
        Ok(AuthUser {
            user_id,
            email: data.claims.email.unwrap_or_default(),
        })
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header, encode};

    use super::*;

    const SECRET: &str = "test-secret";

    fn token(sub: &str, aud: &str, exp_offset: i64, secret: &str) -> String {
        let exp = (chrono::Utc::now().timestamp() + exp_offset) as usize;
        let claims = Claims {
            sub: sub.to_string(),
            email: Some("tech@poolco.test".into()),
            exp,
            aud: aud.to_string(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn service() -> AuthService {
        AuthService::new(&SecretString::from(SECRET.to_string()))
    }

    #[test]
    fn accepts_valid_token() {
        let id = Uuid::new_v4();
        let header = format!("Bearer {}", token(&id.to_string(), AUDIENCE, 3600, SECRET));
        let user = service().authenticate_header(Some(&header)).unwrap();
        assert_eq!(user.user_id, id);
        assert_eq!(user.email, "tech@poolco.test");
    }

    #[test]
    fn rejects_bad_tokens() {
        let id = Uuid::new_v4().to_string();
        let svc = service();
        assert_eq!(svc.authenticate_header(None), Err(AuthError::MissingToken));
        assert_eq!(
            svc.authenticate_header(Some("Basic abc")),
            Err(AuthError::MalformedHeader)
        );
        assert_eq!(
            svc.verify(&token(&id, AUDIENCE, 3600, "other-secret")),
            Err(AuthError::InvalidToken)
        );
        assert_eq!(
            svc.verify(&token(&id, AUDIENCE, -3600, SECRET)),
            Err(AuthError::Expired)
        );
        assert_eq!(
            svc.verify(&token(&id, "anon", 3600, SECRET)),
            Err(AuthError::InvalidToken)
        );
        assert_eq!(
            svc.verify(&token("not-a-uuid", AUDIENCE, 3600, SECRET)),
            Err(AuthError::InvalidToken)
        );
    }
}
