//! Signature payload decoding.
//!
//! The browser captures the handwritten signature on a canvas and submits
//! it as a base64 `data:` URL. This module decodes that payload into raw
//! raster bytes and detects the actual image format from the bytes rather
//! than trusting the declared media type (signature pads routinely label
//! PNG data as JPEG).
//!
//! A blank payload is a validation error and is caught before this code
//! runs. A present but undecodable payload is the one failure class that
//! aborts a submission: a document that cannot carry its signature cannot
//! honestly be confirmed as sent.

use crate::error::{ConsentError, ConsentResult};
use base64::{engine::general_purpose, Engine as _};

/// Raster format of a decoded signature image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureFormat {
    Png,
    Jpeg,
}

impl SignatureFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            SignatureFormat::Png => "image/png",
            SignatureFormat::Jpeg => "image/jpeg",
        }
    }
}

/// A decoded signature raster.
#[derive(Debug, Clone)]
pub struct SignatureImage {
    format: SignatureFormat,
    bytes: Vec<u8>,
}

impl SignatureImage {
    /// Decodes a `data:image/...;base64,<payload>` URL.
    ///
    /// # Errors
    ///
    /// - [`ConsentError::SignatureNotDataUrl`] when the string is not a
    ///   base64 data URL;
    /// - [`ConsentError::SignatureDecode`] when the base64 payload is
    ///   malformed;
    /// - [`ConsentError::SignatureEmpty`] when the payload decodes to
    ///   nothing;
    /// - [`ConsentError::SignatureFormat`] when the decoded bytes are not
    ///   PNG or JPEG.
    pub fn from_data_url(data_url: &str) -> ConsentResult<Self> {
        let rest = data_url
            .trim()
            .strip_prefix("data:")
            .ok_or(ConsentError::SignatureNotDataUrl)?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or(ConsentError::SignatureNotDataUrl)?;
        if !meta.ends_with(";base64") {
            return Err(ConsentError::SignatureNotDataUrl);
        }

        let bytes = general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(ConsentError::SignatureDecode)?;
        if bytes.is_empty() {
            return Err(ConsentError::SignatureEmpty);
        }

        let format = match infer::get(&bytes).map(|kind| kind.mime_type()) {
            Some("image/png") => SignatureFormat::Png,
            Some("image/jpeg") => SignatureFormat::Jpeg,
            _ => return Err(ConsentError::SignatureFormat),
        };

        Ok(Self { format, bytes })
    }

    pub fn format(&self) -> SignatureFormat {
        self.format
    }

    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1x1 RGB PNG.
    pub const TINY_PNG_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAIAAACQd1PeAAAADElEQVR4nGP4z8AAAAMBAQDJ/pLvAAAAAElFTkSuQmCC";

    #[test]
    fn decodes_png_data_url() {
        let signature = SignatureImage::from_data_url(TINY_PNG_DATA_URL).unwrap();
        assert_eq!(signature.format(), SignatureFormat::Png);
        assert_eq!(signature.content_type(), "image/png");
        assert_eq!(&signature.bytes()[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn detects_format_from_bytes_not_declared_type() {
        // PNG bytes declared as JPEG, as signature pads commonly submit.
        let mislabelled = TINY_PNG_DATA_URL.replace("image/png", "image/jpeg");
        let signature = SignatureImage::from_data_url(&mislabelled).unwrap();
        assert_eq!(signature.format(), SignatureFormat::Png);
    }

    #[test]
    fn rejects_non_data_url() {
        assert!(matches!(
            SignatureImage::from_data_url("https://example.com/sig.png"),
            Err(ConsentError::SignatureNotDataUrl)
        ));
        assert!(matches!(
            SignatureImage::from_data_url("data:image/png,plain"),
            Err(ConsentError::SignatureNotDataUrl)
        ));
    }

    #[test]
    fn rejects_malformed_base64() {
        assert!(matches!(
            SignatureImage::from_data_url("data:image/png;base64,!!!"),
            Err(ConsentError::SignatureDecode(_))
        ));
    }

    #[test]
    fn rejects_empty_payload() {
        assert!(matches!(
            SignatureImage::from_data_url("data:image/png;base64,"),
            Err(ConsentError::SignatureEmpty)
        ));
    }

    #[test]
    fn rejects_non_raster_payload() {
        let text = general_purpose::STANDARD.encode("just some text");
        let url = format!("data:image/png;base64,{text}");
        assert!(matches!(
            SignatureImage::from_data_url(&url),
            Err(ConsentError::SignatureFormat)
        ));
    }
}
