#[derive(Debug, thiserror::Error)]
pub enum ConsentError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("form state has {0} unresolved validation error(s)")]
    NotValidated(usize),
    #[error("signature payload is not a base64 data URL")]
    SignatureNotDataUrl,
    #[error("failed to decode signature payload: {0}")]
    SignatureDecode(base64::DecodeError),
    #[error("signature payload is empty")]
    SignatureEmpty,
    #[error("signature payload is not a supported raster format (PNG or JPEG)")]
    SignatureFormat,
}

pub type ConsentResult<T> = std::result::Result<T, ConsentError>;
