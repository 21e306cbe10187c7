use std::path::PathBuf;

use crate::guestbook_entry::Field;

/// Failures that leave the draft untouched and are shown to the visitor.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("File is too large! Please upload an image under {} MB.", .limit / (1024 * 1024))]
    ImageTooLarge { size: u64, limit: u64 },

    #[error("{} is not an image file.", .path.display())]
    NotAnImage { path: PathBuf },

    #[error("Could not read {}: {source}", .path.display())]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Please fill out this field: {}", .0.label())]
    MissingField(Field),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("The guestbook endpoint is not configured. Set GUESTBOOK_ENDPOINT and restart.")]
    MissingEndpoint,

    #[error("The guestbook endpoint is still the placeholder value. Set GUESTBOOK_ENDPOINT and restart.")]
    PlaceholderEndpoint,

    #[error("The guestbook endpoint {value:?} is not a valid http(s) URL: {reason}")]
    InvalidEndpoint { value: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("endpoint rejected the entry with status {status}")]
    Rejected { status: u16 },
}
