//! `data:` URIs for images and audio embedded in a project.
//!
//! Only the base64 form is produced or accepted:
//! `data:<mime>;base64,<payload>`.

use super::backend::BackendError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// A borrowed, parsed `data:` URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataUri<'a> {
    pub mime: &'a str,
    /// Base64 payload, not yet decoded.
    pub payload: &'a str,
}

impl<'a> DataUri<'a> {
    /// Parse `data:<mime>;base64,<payload>`. Returns `None` for anything
    /// else, including external URLs and non-base64 data URIs.
    pub fn parse(uri: &'a str) -> Option<Self> {
        let rest = uri.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let mime = header.strip_suffix(";base64")?;
        Some(Self { mime, payload })
    }

    pub fn decode(&self) -> Result<Vec<u8>, BackendError> {
        Ok(STANDARD.decode(self.payload.trim())?)
    }
}

/// Whether `uri` is an embedded (`data:`) resource.
pub fn is_data_uri(uri: &str) -> bool {
    uri.starts_with("data:")
}

/// Decode the bytes of a base64 data URI.
pub fn decode(uri: &str) -> Result<Vec<u8>, BackendError> {
    DataUri::parse(uri)
        .ok_or(BackendError::InvalidDataUri)?
        .decode()
}

/// Build a data URI from raw bytes.
pub fn encode(mime: &str, bytes: &[u8]) -> String {
    from_base64(mime, &STANDARD.encode(bytes))
}

/// Build a data URI from an already base64-encoded payload.
pub fn from_base64(mime: &str, payload: &str) -> String {
    format!("data:{mime};base64,{payload}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_mime_and_payload() {
        let uri = DataUri::parse("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(uri.mime, "image/png");
        assert_eq!(uri.payload, "iVBORw0KGgo=");
    }

    #[test]
    fn parse_rejects_urls_and_plain_data() {
        assert!(DataUri::parse("https://example.com/pano.jpg").is_none());
        assert!(DataUri::parse("data:text/plain,hello").is_none());
    }

    #[test]
    fn encode_then_decode_bytes() {
        let uri = encode("audio/mpeg", &[1, 2, 3, 250]);
        assert_eq!(uri, "data:audio/mpeg;base64,AQID+g==");
        assert_eq!(decode(&uri).unwrap(), vec![1, 2, 3, 250]);
    }

    #[test]
    fn decode_reports_bad_payload() {
        assert!(matches!(
            decode("data:image/jpeg;base64,@@@"),
            Err(BackendError::Base64(_))
        ));
        assert!(matches!(
            decode("https://example.com"),
            Err(BackendError::InvalidDataUri)
        ));
    }
}
