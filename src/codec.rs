use base64::{DecodeError, URL_SAFE_NO_PAD, decode_config, encode_config};

/// Encodes bytes as unpadded base64url.
pub fn base64url_encode(bytes: impl AsRef<[u8]>) -> String {
    encode_config(bytes, URL_SAFE_NO_PAD)
}

/// Decodes base64url text. Trailing `=` padding and the standard alphabet
/// (`+`, `/`) are accepted as well.
pub fn base64url_decode(input: &str) -> Result<Vec<u8>, DecodeError> {
    let normalized: String = input
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|ch| match ch {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    decode_config(normalized, URL_SAFE_NO_PAD)
}
