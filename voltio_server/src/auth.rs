//! Session token handling.
//!
//! Session issuance is the auth collaborator's job; this server only consumes
//! bearer tokens whose claims identify the acting user (`sub`), their role
//! and their contact details. Tokens are HS256 JWTs validated against the
//! shared secret in [`crate::config::AuthConfig`]. [`TokenIssuer`] exists for
//! operational tooling and tests — the storefront itself never mints tokens
//! here.
use std::{future::ready, future::Ready, time::Duration};

use actix_web::{dev::Payload, web, FromRequest, HttpMessage, HttpRequest};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use serde::{Deserialize, Serialize};
use voltio_engine::db_types::{Role, UserId, UserInfo};

use crate::{config::AuthConfig, errors::ServerError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user id.
    pub sub: i64,
    pub role: Role,
    pub email: String,
    pub name: String,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

impl JwtClaims {
    pub fn user_id(&self) -> UserId {
        UserId(self.sub)
    }

    /// The claims as the engine's acting-user value.
    pub fn user_info(&self) -> UserInfo {
        UserInfo {
            id: UserId(self.sub),
            role: self.role,
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

/// Validates incoming bearer tokens.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        let validation = Validation::default();
        Self { decoding_key, validation }
    }

    pub fn decode(&self, token: &str) -> Result<JwtClaims, ServerError> {
        decode::<JwtClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| ServerError::InvalidAuthToken(e.to_string()))
    }
}

/// Signs access tokens. Used by ops tooling and the endpoint tests; real
/// sessions come from the auth collaborator with the same shared secret.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        Self { encoding_key }
    }

    pub fn issue_token(&self, user: &UserInfo, duration: Option<Duration>) -> Result<String, ServerError> {
        let duration = duration.unwrap_or_else(|| Duration::from_secs(60 * 60 * 24));
        let claims = JwtClaims {
            sub: user.id.0,
            role: user.role,
            email: user.email.clone(),
            name: user.name.clone(),
            exp: Utc::now().timestamp() + duration.as_secs() as i64,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServerError::Unspecified(format!("Could not sign access token. {e}")))
    }
}

/// Extracts the bearer token from the `Authorization` header.
pub fn bearer_token(req: &HttpRequest) -> Result<String, ServerError> {
    let header = req.headers().get("Authorization").ok_or(ServerError::MissingAuthToken)?;
    let value = header.to_str().map_err(|_| ServerError::MissingAuthToken)?;
    value
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .ok_or_else(|| ServerError::InvalidAuthToken("expected a Bearer token".to_string()))
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // the ACL middleware has usually decoded the token already
        if let Some(claims) = req.extensions().get::<JwtClaims>() {
            return ready(Ok(claims.clone()));
        }
        let result = match req.app_data::<web::Data<TokenVerifier>>() {
            Some(verifier) => bearer_token(req).and_then(|token| {
                let claims = verifier.decode(&token)?;
                debug!("💻️ Authenticated {} #{} ({})", claims.role, claims.sub, claims.email);
                Ok(claims)
            }),
            None => Err(ServerError::Unspecified("TokenVerifier is not configured".to_string())),
        };
        ready(result)
    }
}
