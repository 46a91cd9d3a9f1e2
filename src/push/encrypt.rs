use aes_gcm::aead::Aead;
use aes_gcm::{Aes128Gcm, KeyInit, Nonce};

use crate::error::WebPushError;
use crate::push::keys::{
    AUTH_SECRET_LEN, ContentKeys, PUBLIC_KEY_LEN, SALT_LEN, decode_fixed, derive_content_keys,
};

/// Record size advertised in the aes128gcm header. Messages are always a
/// single record.
pub const RECORD_SIZE: u32 = 4096;
/// `salt(16) || rs(4) || idlen(1) || keyid(65)`.
pub const HEADER_LEN: usize = SALT_LEN + 4 + 1 + PUBLIC_KEY_LEN;

const FINAL_RECORD_DELIMITER: u8 = 0x02;
const TAG_LEN: usize = 16;
/// Largest plaintext that still fits one record with its delimiter and tag.
pub const MAX_PLAINTEXT_LEN: usize = RECORD_SIZE as usize - 1 - TAG_LEN;

#[derive(Debug, Clone)]
pub struct EncryptedPayload {
    /// Complete request body: header followed by ciphertext and tag.
    pub body: Vec<u8>,
    pub server_public_key: [u8; PUBLIC_KEY_LEN],
}

pub fn encrypt_payload(
    plaintext: &[u8],
    client_public_key_b64: &str,
    client_auth_b64: &str,
) -> Result<EncryptedPayload, WebPushError> {
    let client_public_key = decode_fixed::<PUBLIC_KEY_LEN>("p256dh", client_public_key_b64)?;
    let client_auth = decode_fixed::<AUTH_SECRET_LEN>("auth", client_auth_b64)?;
    let keys = derive_content_keys(&client_public_key, &client_auth)?;
    seal(plaintext, &keys)
}

pub(crate) fn seal(plaintext: &[u8], keys: &ContentKeys) -> Result<EncryptedPayload, WebPushError> {
    if plaintext.len() > MAX_PLAINTEXT_LEN {
        return Err(WebPushError::PayloadTooLarge {
            max: MAX_PLAINTEXT_LEN,
            actual: plaintext.len(),
        });
    }

    let mut padded = Vec::with_capacity(plaintext.len() + 1);
    padded.extend_from_slice(plaintext);
    padded.push(FINAL_RECORD_DELIMITER);

    let cipher = Aes128Gcm::new_from_slice(&keys.cek).map_err(|_| WebPushError::Encryption)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&keys.nonce), padded.as_slice())
        .map_err(|_| WebPushError::Encryption)?;

    let mut body = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    body.extend_from_slice(&keys.salt);
    body.extend_from_slice(&RECORD_SIZE.to_be_bytes());
    body.push(PUBLIC_KEY_LEN as u8);
    body.extend_from_slice(&keys.server_public_key);
    body.extend_from_slice(&ciphertext);

    Ok(EncryptedPayload {
        body,
        server_public_key: keys.server_public_key,
    })
}
