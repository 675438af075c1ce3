// ABOUTME: Bearer token authentication for user and scheduler requests
// ABOUTME: Validates HS256 JWTs with audience check and accepts a shared service secret
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

//! # Authentication
//!
//! User requests carry `Authorization: Bearer <jwt>` signed with the shared
//! HS256 secret of the hosted auth provider. The reminder scheduler may
//! instead present the configured service secret.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use http::header::AUTHORIZATION;
use http::HeaderMap;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::constants::messages;
use crate::errors::{AppError, AppResult, ErrorCode};

/// Detailed JWT validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token has expired
    TokenExpired {
        /// When the token expired
        expired_at: DateTime<Utc>,
    },
    /// Signature, audience or claims are invalid
    TokenInvalid {
        /// Reason for invalidity
        reason: String,
    },
    /// Token is not a well-formed JWT
    TokenMalformed {
        /// Details about malformation
        details: String,
    },
}

impl fmt::Display for JwtValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TokenExpired { expired_at } => write!(
                f,
                "JWT token expired at {}",
                expired_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            Self::TokenInvalid { reason } => write!(f, "JWT token is invalid: {reason}"),
            Self::TokenMalformed { details } => write!(f, "JWT token is malformed: {details}"),
        }
    }
}

impl std::error::Error for JwtValidationError {}

impl From<JwtValidationError> for AppError {
    fn from(error: JwtValidationError) -> Self {
        let code = match error {
            JwtValidationError::TokenExpired { .. } => ErrorCode::AuthExpired,
            _ => ErrorCode::AuthInvalid,
        };
        Self::new(code, messages::UNAUTHORIZED).with_source(error)
    }
}

/// JWT claims issued by the auth provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// User email
    #[serde(default)]
    pub email: Option<String>,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Audience
    pub aud: String,
    /// Provider role, "authenticated" for end users
    #[serde(default)]
    pub role: Option<String>,
}

/// How a request was authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// End-user JWT
    UserToken,
    /// Scheduler shared secret
    ServiceSecret,
}

/// Authentication result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResult {
    /// Authenticated user, absent for service calls
    pub user_id: Option<Uuid>,
    /// Authentication method used
    pub method: AuthMethod,
}

impl AuthResult {
    /// User ID or an auth error for service-only callers
    ///
    /// # Errors
    ///
    /// Returns `AUTH_INVALID` when the caller is the scheduler
    pub fn require_user(&self) -> AppResult<Uuid> {
        self.user_id
            .ok_or_else(|| AppError::auth_invalid(messages::UNAUTHORIZED))
    }
}

/// Validates and mints HS256 tokens
#[derive(Clone)]
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    audience: String,
    token_expiry_hours: i64,
    service_secret: Option<String>,
}

impl fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthManager")
            .field("audience", &self.audience)
            .field("token_expiry_hours", &self.token_expiry_hours)
            .field("service_secret", &self.service_secret.as_ref().map(|_| "***"))
            .finish_non_exhaustive()
    }
}

impl AuthManager {
    /// Create a new authentication manager
    #[must_use]
    pub fn new(config: &AuthConfig, service_secret: Option<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            audience: config.jwt_audience.clone(),
            token_expiry_hours: config.jwt_expiry_hours,
            service_secret,
        }
    }

    /// Mint a token for a user
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails
    pub fn generate_token(&self, user_id: Uuid, email: Option<&str>) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.map(str::to_owned),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.token_expiry_hours)).timestamp(),
            aud: self.audience.clone(),
            role: Some("authenticated".to_owned()),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode JWT: {e}")))
    }

    /// Validate a token and return its claims
    ///
    /// # Errors
    ///
    /// Returns a [`JwtValidationError`] describing why the token was rejected
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtValidationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_audience(&[self.audience.as_str()]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| Self::convert_jwt_error(token, &e))
    }

    fn convert_jwt_error(token: &str, e: &JwtError) -> JwtValidationError {
        warn!("JWT token validation failed: {e}");
        match e.kind() {
            ErrorKind::ExpiredSignature => JwtValidationError::TokenExpired {
                expired_at: Self::peek_expiry(token).unwrap_or_else(Utc::now),
            },
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                JwtValidationError::TokenMalformed {
                    details: e.to_string(),
                }
            }
            _ => JwtValidationError::TokenInvalid {
                reason: e.to_string(),
            },
        }
    }

    /// Best-effort read of `exp` for error reporting only
    fn peek_expiry(token: &str) -> Option<DateTime<Utc>> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        let claims = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation).ok()?;
        DateTime::from_timestamp(claims.claims.exp, 0)
    }

    /// Authenticate an end-user request
    ///
    /// # Errors
    ///
    /// Returns 401 "No authorization header" when the header is missing and
    /// 401 "Unauthorized" when the token is rejected
    pub fn authenticate_user(&self, headers: &HeaderMap) -> AppResult<Uuid> {
        let token = extract_bearer(headers)?;
        let claims = self.validate_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::auth_invalid(messages::UNAUTHORIZED))?;
        debug!(%user_id, "Authenticated user token");
        Ok(user_id)
    }

    /// Authenticate either the scheduler (service secret) or an end user
    ///
    /// # Errors
    ///
    /// Same as [`Self::authenticate_user`]
    pub fn authenticate_user_or_service(&self, headers: &HeaderMap) -> AppResult<AuthResult> {
        let token = extract_bearer(headers)?;
        if self.is_service_secret(token) {
            return Ok(AuthResult {
                user_id: None,
                method: AuthMethod::ServiceSecret,
            });
        }
        let user_id = self.authenticate_user(headers)?;
        Ok(AuthResult {
            user_id: Some(user_id),
            method: AuthMethod::UserToken,
        })
    }

    /// Authenticate the scheduler only
    ///
    /// # Errors
    ///
    /// Returns 401 when no credential is present or the token is invalid, and
    /// 403 when a valid user token is presented instead of the service secret
    pub fn authenticate_service(&self, headers: &HeaderMap) -> AppResult<AuthResult> {
        let result = self.authenticate_user_or_service(headers)?;
        if result.method != AuthMethod::ServiceSecret {
            warn!(user_id = ?result.user_id, "User token presented to a service-only endpoint");
            return Err(AppError::permission_denied(
                "This endpoint requires the service secret",
            ));
        }
        Ok(result)
    }

    fn is_service_secret(&self, token: &str) -> bool {
        self.service_secret
            .as_deref()
            .is_some_and(|secret| bool::from(token.as_bytes().ct_eq(secret.as_bytes())))
    }
}

/// Extract the bearer token from the `Authorization` header
///
/// # Errors
///
/// Returns `AUTH_REQUIRED` when the header is missing and `AUTH_INVALID` when
/// it is not a bearer credential
pub fn extract_bearer(headers: &HeaderMap) -> AppResult<&str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(AppError::auth_required)?
        .to_str()
        .map_err(|_| AppError::auth_invalid(messages::UNAUTHORIZED))?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::auth_invalid(messages::UNAUTHORIZED))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn manager() -> AuthManager {
        AuthManager::new(&AuthConfig::default(), Some("cron-secret".to_owned()))
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn test_generate_and_validate_roundtrip() {
        let auth = manager();
        let user_id = Uuid::new_v4();
        let token = auth.generate_token(user_id, Some("ana@example.com")).unwrap();

        assert_eq!(auth.authenticate_user(&bearer(&token)).unwrap(), user_id);
    }

    #[test]
    fn test_missing_header_is_auth_required() {
        let error = manager().authenticate_user(&HeaderMap::new()).unwrap_err();
        assert_eq!(error.code, ErrorCode::AuthRequired);
        assert_eq!(error.message, "No authorization header");
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let other = AuthManager::new(
            &AuthConfig {
                jwt_secret: "another-secret".to_owned(),
                ..AuthConfig::default()
            },
            None,
        );
        let token = other.generate_token(Uuid::new_v4(), None).unwrap();

        let error = manager().authenticate_user(&bearer(&token)).unwrap_err();
        assert_eq!(error.http_status(), 401);
        assert_eq!(error.message, "Unauthorized");
    }

    #[test]
    fn test_expired_token_reports_expiry() {
        let auth = AuthManager::new(
            &AuthConfig {
                jwt_expiry_hours: -1,
                ..AuthConfig::default()
            },
            None,
        );
        let token = auth.generate_token(Uuid::new_v4(), None).unwrap();

        assert!(matches!(
            auth.validate_token(&token),
            Err(JwtValidationError::TokenExpired { .. })
        ));
    }

    #[test]
    fn test_service_secret_is_accepted() {
        let result = manager()
            .authenticate_user_or_service(&bearer("cron-secret"))
            .unwrap();
        assert_eq!(result.method, AuthMethod::ServiceSecret);
        assert!(result.require_user().is_err());
    }

    #[test]
    fn test_service_secret_prefix_is_rejected() {
        let error = manager()
            .authenticate_user_or_service(&bearer("cron-secre"))
            .unwrap_err();
        assert_eq!(error.http_status(), 401);

        let longer = manager().authenticate_user_or_service(&bearer("cron-secret-x"));
        assert!(longer.is_err());
    }

    #[test]
    fn test_service_only_rejects_user_token() {
        let auth = manager();
        let token = auth.generate_token(Uuid::new_v4(), None).unwrap();

        let error = auth.authenticate_service(&bearer(&token)).unwrap_err();
        assert_eq!(error.http_status(), 403);
        let service = auth.authenticate_service(&bearer("cron-secret")).unwrap();
        assert_eq!(service.method, AuthMethod::ServiceSecret);
    }

    #[test]
    fn test_malformed_token() {
        assert!(matches!(
            manager().validate_token("not-a-jwt"),
            Err(JwtValidationError::TokenMalformed { .. })
        ));
    }
}
