use super::FetchError;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;
use percent_encoding::percent_decode_str;
use url::{Position, Url};

/// Decode an RFC 2397 `data:[<mediatype>][;base64],<data>` URL.
pub(super) fn decode(url: &Url) -> Result<Vec<u8>, FetchError> {
    // The fragment is never part of the payload.
    let raw = &url[..Position::AfterQuery];
    let raw = raw
        .strip_prefix("data:")
        .ok_or_else(|| FetchError::InvalidDataUrl {
            reason: format!("not a data url: {}", url.scheme()),
        })?;

    let (meta, payload) = raw.split_once(',').ok_or_else(|| FetchError::InvalidDataUrl {
        reason: "missing ',' separator".to_string(),
    })?;

    let bytes: Vec<u8> = percent_decode_str(payload).collect();

    if !meta.to_ascii_lowercase().ends_with(";base64") {
        return Ok(bytes);
    }

    let cleaned: Vec<u8> = bytes
        .into_iter()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    STANDARD
        .decode(&cleaned)
        .or_else(|_| STANDARD_NO_PAD.decode(&cleaned))
        .map_err(|e| FetchError::InvalidDataUrl {
            reason: format!("bad base64 payload: {}", e),
        })
}
