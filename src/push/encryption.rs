// ABOUTME: Web Push message encryption using the aes128gcm content coding
// ABOUTME: Ephemeral ECDH P-256, HKDF-SHA256 with the subscription auth secret, single record
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

//! Payload encryption for push messages (RFC 8291 over RFC 8188).
//!
//! Body layout: `salt(16) || rs(4, BE) || idlen(1) || as_public(65) || ciphertext`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_128_GCM, NONCE_LEN};
use ring::agreement::{agree_ephemeral, EphemeralPrivateKey, UnparsedPublicKey, ECDH_P256};
use ring::hkdf::{KeyType, Salt, HKDF_SHA256};
use ring::rand::{SecureRandom, SystemRandom};

use crate::errors::{AppError, AppResult};

/// Record size advertised in the header
pub const RECORD_SIZE: u32 = 4096;
/// Salt length
pub const SALT_LEN: usize = 16;
/// Uncompressed P-256 point length
pub const PUBLIC_KEY_LEN: usize = 65;
/// Header length before the ciphertext
pub const HEADER_LEN: usize = SALT_LEN + 4 + 1 + PUBLIC_KEY_LEN;

const KEY_ID_LEN: u8 = 65;
const AUTH_SECRET_LEN: usize = 16;
const TAG_LEN: usize = 16;
const PADDING_DELIMITER: u8 = 0x02;
/// Largest plaintext that still fits in one record
pub const MAX_PLAINTEXT_LEN: usize = RECORD_SIZE as usize - TAG_LEN - 1;

const KEY_INFO_PREFIX: &[u8] = b"WebPush: info\0";
const CEK_INFO: &[u8] = b"Content-Encoding: aes128gcm\0";
const NONCE_INFO: &[u8] = b"Content-Encoding: nonce\0";

struct OutputLen(usize);

impl KeyType for OutputLen {
    fn len(&self) -> usize {
        self.0
    }
}

/// Decode base64url with or without padding
///
/// # Errors
///
/// Returns 400 when the input is not base64url
pub fn decode_base64url(value: &str) -> AppResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(value.trim().trim_end_matches('='))
        .map_err(|e| AppError::invalid_input(format!("Invalid base64url value: {e}")))
}

fn crypto_error(step: &str) -> AppError {
    AppError::internal(format!("Push encryption failed: {step}"))
}

fn hkdf(salt: &[u8], ikm: &[u8], info: &[&[u8]], out: &mut [u8]) -> AppResult<()> {
    Salt::new(HKDF_SHA256, salt)
        .extract(ikm)
        .expand(info, OutputLen(out.len()))
        .and_then(|okm| okm.fill(out))
        .map_err(|_| crypto_error("hkdf"))
}

/// Content key and nonce for one message
pub(crate) struct ContentKeys {
    pub(crate) cek: [u8; 16],
    pub(crate) nonce: [u8; NONCE_LEN],
}

/// Derive the content encryption key and nonce from the shared secret
pub(crate) fn derive_content_keys(
    ecdh_secret: &[u8],
    auth_secret: &[u8],
    ua_public: &[u8],
    as_public: &[u8],
    salt: &[u8],
) -> AppResult<ContentKeys> {
    let mut ikm = [0_u8; 32];
    hkdf(
        auth_secret,
        ecdh_secret,
        &[KEY_INFO_PREFIX, ua_public, as_public],
        &mut ikm,
    )?;

    let mut keys = ContentKeys {
        cek: [0_u8; 16],
        nonce: [0_u8; NONCE_LEN],
    };
    hkdf(salt, &ikm, &[CEK_INFO], &mut keys.cek)?;
    hkdf(salt, &ikm, &[NONCE_INFO], &mut keys.nonce)?;
    Ok(keys)
}

/// Encrypt `plaintext` for a subscription
///
/// `p256dh` and `auth` are the subscription keys as sent by the browser.
///
/// # Errors
///
/// Returns 400 for malformed subscription keys or an oversized payload,
/// 500 if a crypto primitive fails
pub fn encrypt_payload(plaintext: &[u8], p256dh: &str, auth: &str) -> AppResult<Vec<u8>> {
    if plaintext.len() > MAX_PLAINTEXT_LEN {
        return Err(AppError::invalid_input(format!(
            "Push payload exceeds {MAX_PLAINTEXT_LEN} bytes"
        )));
    }
    let ua_public = decode_base64url(p256dh)?;
    if ua_public.len() != PUBLIC_KEY_LEN || ua_public.first() != Some(&0x04) {
        return Err(AppError::invalid_input("Invalid p256dh subscription key"));
    }
    let auth_secret = decode_base64url(auth)?;
    if auth_secret.len() != AUTH_SECRET_LEN {
        return Err(AppError::invalid_input("Invalid auth subscription secret"));
    }

    let rng = SystemRandom::new();
    let mut salt = [0_u8; SALT_LEN];
    rng.fill(&mut salt).map_err(|_| crypto_error("salt"))?;

    let private_key =
        EphemeralPrivateKey::generate(&ECDH_P256, &rng).map_err(|_| crypto_error("keygen"))?;
    let as_public = private_key
        .compute_public_key()
        .map_err(|_| crypto_error("public key"))?;
    let as_public = as_public.as_ref();

    let peer = UnparsedPublicKey::new(&ECDH_P256, &ua_public);
    let keys = agree_ephemeral(private_key, &peer, |secret| {
        derive_content_keys(secret, &auth_secret, &ua_public, as_public, &salt)
    })
    .map_err(|_| AppError::invalid_input("Invalid p256dh subscription key"))??;

    let key = UnboundKey::new(&AES_128_GCM, &keys.cek)
        .map(LessSafeKey::new)
        .map_err(|_| crypto_error("key"))?;
    let mut record = Vec::with_capacity(plaintext.len() + 1 + TAG_LEN);
    record.extend_from_slice(plaintext);
    record.push(PADDING_DELIMITER);
    key.seal_in_place_append_tag(
        Nonce::assume_unique_for_key(keys.nonce),
        Aad::empty(),
        &mut record,
    )
    .map_err(|_| crypto_error("seal"))?;

    let mut body = Vec::with_capacity(HEADER_LEN + record.len());
    body.extend_from_slice(&salt);
    body.extend_from_slice(&RECORD_SIZE.to_be_bytes());
    body.push(KEY_ID_LEN);
    body.extend_from_slice(as_public);
    body.extend_from_slice(&record);
    Ok(body)
}
