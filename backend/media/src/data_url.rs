//! `data:` URLs, the form in which record images are embedded.

use base64::{engine::general_purpose::STANDARD, Engine};

pub fn encode_data_url(mime_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(data))
}

/// Split a base64 `data:` URL into its mime type and decoded bytes.
pub fn parse_data_url(url: &str) -> Option<(String, Vec<u8>)> {
    let rest = url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime_type = meta.strip_suffix(";base64")?;
    let data = STANDARD.decode(payload).ok()?;
    Some((mime_type.to_string(), data))
}
