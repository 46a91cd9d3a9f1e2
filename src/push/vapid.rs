//! RFC 8292 VAPID identity: key handling and ES256 token signing.

use p256::PublicKey;
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::Serialize;
use time::OffsetDateTime;

use crate::codec::base64url_encode;
use crate::config;
use crate::error::WebPushError;
use crate::push::keys::{PUBLIC_KEY_LEN, decode_fixed, uncompressed_point};
use crate::types::push::{VapidConfig, VapidKeys};

pub const DEFAULT_VAPID_SUBJECT: &str = "mailto:admin@localhost";
pub const DEFAULT_JWT_TTL_SECS: u64 = 12 * 60 * 60;
pub const MAX_JWT_TTL_SECS: u64 = 24 * 60 * 60;

const PRIVATE_KEY_LEN: usize = 32;
const RAW_SIGNATURE_LEN: usize = 64;
const SCALAR_LEN: usize = 32;
const JWT_HEADER: &str = r#"{"typ":"JWT","alg":"ES256"}"#;

#[derive(Debug)]
pub(crate) enum VapidConfigStatus {
    Missing,
    Incomplete,
    Invalid(WebPushError),
    Ready(VapidConfig),
}

pub(crate) fn load_vapid_config(config: &config::AppConfig) -> VapidConfigStatus {
    let private_key = config.vapid_private_key.as_deref();
    let public_key = config.vapid_public_key.as_deref();
    let has_any = private_key.is_some() || public_key.is_some() || config.vapid_subject.is_some();

    match (private_key, public_key) {
        (Some(private_key), Some(public_key)) => {
            match VapidKeys::from_base64url(public_key, private_key) {
                Ok(keys) => VapidConfigStatus::Ready(VapidConfig {
                    keys,
                    subject: config
                        .vapid_subject
                        .clone()
                        .unwrap_or_else(|| DEFAULT_VAPID_SUBJECT.to_string()),
                }),
                Err(err) => VapidConfigStatus::Invalid(err),
            }
        }
        _ if has_any => VapidConfigStatus::Incomplete,
        _ => VapidConfigStatus::Missing,
    }
}

impl VapidKeys {
    /// Validates both halves and checks that they belong together.
    pub fn from_base64url(public_key: &str, private_key: &str) -> Result<Self, WebPushError> {
        let public = decode_fixed::<PUBLIC_KEY_LEN>("VAPID public key", public_key)?;
        if public[0] != 0x04 {
            return Err(WebPushError::InvalidPublicKey("VAPID public key"));
        }
        let signing_key = signing_key(private_key)?;
        let derived = uncompressed_point(&PublicKey::from(signing_key.verifying_key()))?;
        if derived != public {
            return Err(WebPushError::KeyMismatch);
        }
        Ok(Self {
            public_key: public_key.trim().to_string(),
            private_key: private_key.trim().to_string(),
        })
    }
}

pub fn generate_vapid_keys() -> Result<VapidKeys, WebPushError> {
    let mut rng = OsRng;
    generate_vapid_keys_with_rng(&mut rng)
}

pub fn generate_vapid_keys_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
) -> Result<VapidKeys, WebPushError> {
    let signing_key = generate_signing_key_with_rng(rng);
    let public_key = uncompressed_point(&PublicKey::from(signing_key.verifying_key()))?;
    Ok(VapidKeys {
        public_key: base64url_encode(public_key),
        private_key: base64url_encode(signing_key.to_bytes()),
    })
}

fn generate_signing_key_with_rng<R: RngCore + CryptoRng>(rng: &mut R) -> SigningKey {
    let mut key_bytes = [0u8; PRIVATE_KEY_LEN];
    loop {
        rng.fill_bytes(&mut key_bytes);
        if let Ok(key) = SigningKey::from_slice(&key_bytes) {
            return key;
        }
    }
}

fn signing_key(private_key_b64: &str) -> Result<SigningKey, WebPushError> {
    let bytes = decode_fixed::<PRIVATE_KEY_LEN>("VAPID private key", private_key_b64)?;
    SigningKey::from_slice(&bytes).map_err(|_| WebPushError::InvalidPrivateKey)
}

/// The `aud` claim for an endpoint: its origin, never the path.
pub fn audience(endpoint: &str) -> Result<String, WebPushError> {
    let url = url::Url::parse(endpoint).map_err(|err| WebPushError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: err.to_string(),
    })?;
    let origin = url.origin();
    if !origin.is_tuple() {
        return Err(WebPushError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: "endpoint has no origin".to_string(),
        });
    }
    Ok(origin.ascii_serialization())
}

pub fn create_vapid_jwt(
    audience: &str,
    subject: Option<&str>,
    private_key_b64: &str,
    ttl_seconds: u64,
) -> Result<String, WebPushError> {
    create_vapid_jwt_at(
        audience,
        subject,
        private_key_b64,
        ttl_seconds,
        OffsetDateTime::now_utc(),
    )
}

pub(crate) fn create_vapid_jwt_at(
    audience: &str,
    subject: Option<&str>,
    private_key_b64: &str,
    ttl_seconds: u64,
    now: OffsetDateTime,
) -> Result<String, WebPushError> {
    #[derive(Serialize)]
    struct Claims<'a> {
        aud: &'a str,
        exp: i64,
        sub: &'a str,
    }

    let ttl = ttl_seconds.min(MAX_JWT_TTL_SECS) as i64;
    let claims = Claims {
        aud: audience,
        exp: now.unix_timestamp() + ttl,
        sub: subject.unwrap_or(DEFAULT_VAPID_SUBJECT),
    };

    let signing_input = format!(
        "{}.{}",
        base64url_encode(JWT_HEADER),
        base64url_encode(serde_json::to_vec(&claims)?)
    );
    let signature: Signature = signing_key(private_key_b64)?.sign(signing_input.as_bytes());
    let raw = normalize_signature(&signature.to_bytes())?;

    Ok(format!("{signing_input}.{}", base64url_encode(raw)))
}

/// `Authorization` and `Crypto-Key` header values for one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VapidHeaders {
    pub authorization: String,
    pub crypto_key: String,
}

pub fn vapid_headers(
    endpoint: &str,
    keys: &VapidKeys,
    subject: Option<&str>,
) -> Result<VapidHeaders, WebPushError> {
    let token = create_vapid_jwt(
        &audience(endpoint)?,
        subject,
        &keys.private_key,
        DEFAULT_JWT_TTL_SECS,
    )?;
    Ok(VapidHeaders {
        authorization: format!("vapid t={token}, k={}", keys.public_key),
        crypto_key: format!("p256ecdsa={}", keys.public_key),
    })
}

/// Accepts either a raw `r || s` signature or a DER `SEQUENCE` of two
/// `INTEGER`s and returns the raw 64-byte form.
pub fn normalize_signature(signature: &[u8]) -> Result<[u8; RAW_SIGNATURE_LEN], WebPushError> {
    match <[u8; RAW_SIGNATURE_LEN]>::try_from(signature) {
        Ok(raw) => Ok(raw),
        Err(_) => der_to_raw(signature),
    }
}

fn der_to_raw(der: &[u8]) -> Result<[u8; RAW_SIGNATURE_LEN], WebPushError> {
    let body = match der {
        [0x30, len, body @ ..] if usize::from(*len) == body.len() => body,
        [0x30, ..] => return Err(WebPushError::MalformedSignature("sequence length mismatch")),
        _ => return Err(WebPushError::MalformedSignature("expected SEQUENCE")),
    };
    let (r, rest) = der_integer(body)?;
    let (s, rest) = der_integer(rest)?;
    if !rest.is_empty() {
        return Err(WebPushError::MalformedSignature("trailing bytes"));
    }

    let mut raw = [0u8; RAW_SIGNATURE_LEN];
    left_pad(r, &mut raw[..SCALAR_LEN])?;
    left_pad(s, &mut raw[SCALAR_LEN..])?;
    Ok(raw)
}

fn der_integer(input: &[u8]) -> Result<(&[u8], &[u8]), WebPushError> {
    match input {
        [0x02, len, rest @ ..] if usize::from(*len) <= rest.len() => {
            Ok(rest.split_at(usize::from(*len)))
        }
        [0x02, ..] => Err(WebPushError::MalformedSignature("integer length overflow")),
        _ => Err(WebPushError::MalformedSignature("expected INTEGER")),
    }
}

fn left_pad(mut value: &[u8], out: &mut [u8]) -> Result<(), WebPushError> {
    while value.len() > out.len() && value.first() == Some(&0) {
        value = &value[1..];
    }
    if value.len() > out.len() {
        return Err(WebPushError::MalformedSignature("integer too large"));
    }
    let offset = out.len() - value.len();
    out[offset..].copy_from_slice(value);
    Ok(())
}
