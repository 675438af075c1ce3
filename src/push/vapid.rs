// ABOUTME: VAPID application server identification for Web Push
// ABOUTME: Signs ES256 JWTs with the configured P-256 key and builds the Authorization header
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING};
use serde::Serialize;
use url::Url;

use super::encryption::decode_base64url;
use crate::config::PushConfig;
use crate::constants::push::VAPID_TOKEN_LIFETIME_SECONDS;
use crate::errors::{AppError, AppResult};

const JWT_HEADER: &str = r#"{"typ":"JWT","alg":"ES256"}"#;

#[derive(Debug, Serialize)]
struct VapidClaims<'a> {
    aud: &'a str,
    exp: i64,
    sub: &'a str,
}

/// Signs VAPID tokens for one application server key
pub struct VapidSigner {
    key_pair: EcdsaKeyPair,
    public_key: String,
    subject: String,
    rng: SystemRandom,
}

impl VapidSigner {
    /// Build from a raw private scalar and uncompressed public key, both base64url
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the keys do not decode or do not form a pair
    pub fn from_raw_keys(private_key: &str, public_key: &str, subject: &str) -> AppResult<Self> {
        let private = decode_base64url(private_key)
            .map_err(|_| AppError::config("VAPID_PRIVATE_KEY is not base64url"))?;
        let public = decode_base64url(public_key)
            .map_err(|_| AppError::config("VAPID_PUBLIC_KEY is not base64url"))?;
        let rng = SystemRandom::new();
        let key_pair = EcdsaKeyPair::from_private_key_and_public_key(
            &ECDSA_P256_SHA256_FIXED_SIGNING,
            &private,
            &public,
            &rng,
        )
        .map_err(|e| AppError::config(format!("Invalid VAPID key pair: {e}")))?;
        Ok(Self::with_key_pair(key_pair, subject, rng))
    }

    /// Build from a PKCS#8 document
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the document is not a P-256 key
    pub fn from_pkcs8(pkcs8: &[u8], subject: &str) -> AppResult<Self> {
        let rng = SystemRandom::new();
        let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8, &rng)
            .map_err(|e| AppError::config(format!("Invalid VAPID PKCS#8 key: {e}")))?;
        Ok(Self::with_key_pair(key_pair, subject, rng))
    }

    /// Build from configuration; `None` when no keys are configured
    ///
    /// # Errors
    ///
    /// Returns a configuration error when only one key is set or the keys are invalid
    pub fn from_config(config: &PushConfig) -> AppResult<Option<Self>> {
        match (&config.vapid_private_key, &config.vapid_public_key) {
            (Some(private_key), Some(public_key)) => {
                Self::from_raw_keys(private_key, public_key, &config.subject).map(Some)
            }
            (None, None) => Ok(None),
            (None, Some(_)) => Err(AppError::config_missing("VAPID_PRIVATE_KEY")),
            (Some(_), None) => Err(AppError::config_missing("VAPID_PUBLIC_KEY")),
        }
    }

    fn with_key_pair(key_pair: EcdsaKeyPair, subject: &str, rng: SystemRandom) -> Self {
        let public_key = URL_SAFE_NO_PAD.encode(key_pair.public_key().as_ref());
        Self {
            key_pair,
            public_key,
            subject: subject.to_owned(),
            rng,
        }
    }

    /// Application server public key, base64url
    #[must_use]
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Signed token for the origin of `endpoint`
    ///
    /// # Errors
    ///
    /// Returns 400 when the endpoint is not an absolute URL, 500 if signing fails
    pub fn token(&self, endpoint: &str, now: DateTime<Utc>) -> AppResult<String> {
        let url = Url::parse(endpoint)
            .map_err(|e| AppError::invalid_input(format!("Invalid push endpoint: {e}")))?;
        let audience = url.origin().ascii_serialization();
        let claims = serde_json::to_vec(&VapidClaims {
            aud: &audience,
            exp: now.timestamp() + VAPID_TOKEN_LIFETIME_SECONDS,
            sub: &self.subject,
        })?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(JWT_HEADER),
            URL_SAFE_NO_PAD.encode(claims)
        );
        let signature = self
            .key_pair
            .sign(&self.rng, signing_input.as_bytes())
            .map_err(|_| AppError::internal("VAPID signing failed"))?;
        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature.as_ref())
        ))
    }

    /// `Authorization` header value for `endpoint`
    ///
    /// # Errors
    ///
    /// See [`VapidSigner::token`]
    pub fn authorization(&self, endpoint: &str, now: DateTime<Utc>) -> AppResult<String> {
        Ok(format!(
            "vapid t={}, k={}",
            self.token(endpoint, now)?,
            self.public_key
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ring::signature::{UnparsedPublicKey, ECDSA_P256_SHA256_FIXED};
    use serde_json::Value;

    fn test_signer() -> VapidSigner {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng).unwrap();
        VapidSigner::from_pkcs8(pkcs8.as_ref(), "mailto:coach@terminal-buddy.app").unwrap()
    }

    #[test]
    fn test_token_is_verifiable_es256() {
        let signer = test_signer();
        let now = Utc::now();
        let token = signer
            .token("https://fcm.googleapis.com/fcm/send/abc123", now)
            .unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);

        let header: Value = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[0]).unwrap()).unwrap();
        assert_eq!(header["alg"], "ES256");
        let claims: Value = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
        assert_eq!(claims["aud"], "https://fcm.googleapis.com");
        assert_eq!(claims["sub"], "mailto:coach@terminal-buddy.app");
        assert_eq!(claims["exp"], now.timestamp() + 12 * 3600);

        let signature = URL_SAFE_NO_PAD.decode(parts[2]).unwrap();
        assert_eq!(signature.len(), 64);
        let public_key = URL_SAFE_NO_PAD.decode(signer.public_key()).unwrap();
        UnparsedPublicKey::new(&ECDSA_P256_SHA256_FIXED, public_key)
            .verify(format!("{}.{}", parts[0], parts[1]).as_bytes(), &signature)
            .unwrap();
    }

    #[test]
    fn test_authorization_header_format() {
        let signer = test_signer();
        let header = signer
            .authorization("https://updates.push.services.mozilla.com/wpush/v2/x", Utc::now())
            .unwrap();
        assert!(header.starts_with("vapid t=ey"));
        assert!(header.ends_with(&format!(", k={}", signer.public_key())));
    }

    #[test]
    fn test_relative_endpoint_is_rejected() {
        assert_eq!(
            test_signer().token("/push", Utc::now()).unwrap_err().http_status(),
            400
        );
    }

    #[test]
    fn test_from_config() {
        assert!(VapidSigner::from_config(&PushConfig::default()).unwrap().is_none());
        let half = PushConfig {
            vapid_public_key: Some("BAAA".to_owned()),
            ..PushConfig::default()
        };
        assert!(VapidSigner::from_config(&half).is_err());
        let mismatched = PushConfig {
            vapid_public_key: Some(URL_SAFE_NO_PAD.encode([4_u8; 65])),
            vapid_private_key: Some(URL_SAFE_NO_PAD.encode([7_u8; 32])),
            ..PushConfig::default()
        };
        assert!(VapidSigner::from_config(&mismatched).is_err());
    }
}
