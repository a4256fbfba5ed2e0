use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttestationError {
    #[error("Failed to parse template: {0}")]
    TemplateParse(String),

    #[error("Template has no pages")]
    EmptyTemplate,

    #[error("Failed to encode QR code: {0}")]
    QrEncode(String),

    #[error("PDF operation failed: {0}")]
    OperationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Unknown reason code: {0}")]
    UnknownReason(String),

    #[error("An attestation is already being generated")]
    Busy,
}
