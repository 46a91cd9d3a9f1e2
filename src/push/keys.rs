//! RFC 8291 key agreement and content key derivation.

use hmac::{Hmac, Mac};
use p256::PublicKey;
use p256::ecdh::EphemeralSecret;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use sha2::Sha256;

use crate::codec::base64url_decode;
use crate::error::WebPushError;

pub const PUBLIC_KEY_LEN: usize = 65;
pub const AUTH_SECRET_LEN: usize = 16;
pub const SALT_LEN: usize = 16;
pub const CEK_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;

const IKM_INFO_PREFIX: &[u8] = b"WebPush: info\0";
const CEK_INFO: &[u8] = b"Content-Encoding: aes128gcm\0";
const NONCE_INFO: &[u8] = b"Content-Encoding: nonce\0";

type HmacSha256 = Hmac<Sha256>;

/// Per-message key material. Generated fresh for every encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentKeys {
    pub cek: [u8; CEK_LEN],
    pub nonce: [u8; NONCE_LEN],
    pub server_public_key: [u8; PUBLIC_KEY_LEN],
    pub salt: [u8; SALT_LEN],
}

pub fn derive_content_keys(
    subscriber_public_key: &[u8; PUBLIC_KEY_LEN],
    auth_secret: &[u8; AUTH_SECRET_LEN],
) -> Result<ContentKeys, WebPushError> {
    let mut rng = OsRng;
    derive_content_keys_with_rng(&mut rng, subscriber_public_key, auth_secret)
}

pub fn derive_content_keys_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
    subscriber_public_key: &[u8; PUBLIC_KEY_LEN],
    auth_secret: &[u8; AUTH_SECRET_LEN],
) -> Result<ContentKeys, WebPushError> {
    let subscriber = PublicKey::from_sec1_bytes(subscriber_public_key)
        .map_err(|_| WebPushError::InvalidPublicKey("p256dh"))?;

    let ephemeral = EphemeralSecret::random(&mut *rng);
    let server_public_key = uncompressed_point(&ephemeral.public_key())?;
    let shared_secret = ephemeral.diffie_hellman(&subscriber);

    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);

    let (cek, nonce) = derive_from_shared_secret(
        shared_secret.raw_secret_bytes().as_slice(),
        auth_secret,
        subscriber_public_key,
        &server_public_key,
        &salt,
    );

    Ok(ContentKeys {
        cek,
        nonce,
        server_public_key,
        salt,
    })
}

/// Two-stage HKDF shared by the sending side and the subscriber side.
pub(crate) fn derive_from_shared_secret(
    shared_secret: &[u8],
    auth_secret: &[u8; AUTH_SECRET_LEN],
    subscriber_public_key: &[u8; PUBLIC_KEY_LEN],
    server_public_key: &[u8; PUBLIC_KEY_LEN],
    salt: &[u8; SALT_LEN],
) -> ([u8; CEK_LEN], [u8; NONCE_LEN]) {
    let mut key_info = Vec::with_capacity(IKM_INFO_PREFIX.len() + 2 * PUBLIC_KEY_LEN);
    key_info.extend_from_slice(IKM_INFO_PREFIX);
    key_info.extend_from_slice(subscriber_public_key);
    key_info.extend_from_slice(server_public_key);

    let prk = hkdf_extract(auth_secret, shared_secret);
    let ikm: [u8; 32] = hkdf_expand(&prk, &key_info);

    let prk = hkdf_extract(salt, &ikm);
    (hkdf_expand(&prk, CEK_INFO), hkdf_expand(&prk, NONCE_INFO))
}

pub(crate) fn hkdf_extract(salt: &[u8], ikm: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(salt).expect("HMAC accepts any key length");
    mac.update(ikm);
    let mut prk = [0u8; 32];
    prk.copy_from_slice(&mac.finalize().into_bytes());
    prk
}

/// Single-block HKDF-Expand: `HMAC(prk, info || 0x01)` truncated to `N`.
pub(crate) fn hkdf_expand<const N: usize>(prk: &[u8], info: &[u8]) -> [u8; N] {
    const { assert!(N <= 32, "single-block expand yields at most 32 bytes") };
    let mut mac = HmacSha256::new_from_slice(prk).expect("HMAC accepts any key length");
    mac.update(info);
    mac.update(&[0x01]);
    let block = mac.finalize().into_bytes();
    let mut out = [0u8; N];
    out.copy_from_slice(&block[..N]);
    out
}

pub(crate) fn uncompressed_point(key: &PublicKey) -> Result<[u8; PUBLIC_KEY_LEN], WebPushError> {
    let point = key.to_encoded_point(false);
    let bytes = point.as_bytes();
    bytes.try_into().map_err(|_| WebPushError::InvalidLength {
        field: "public key",
        expected: PUBLIC_KEY_LEN,
        actual: bytes.len(),
    })
}

/// Decodes base64url key material that must have an exact length.
pub(crate) fn decode_fixed<const N: usize>(
    field: &'static str,
    input: &str,
) -> Result<[u8; N], WebPushError> {
    let bytes =
        base64url_decode(input).map_err(|source| WebPushError::Base64 { field, source })?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| WebPushError::InvalidLength {
        field,
        expected: N,
        actual,
    })
}
