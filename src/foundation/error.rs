/// Convenience result type used across slidecast.
pub type SlidecastResult<T> = Result<T, SlidecastError>;

/// Top-level error taxonomy used by the render pipeline.
///
/// Every stage of a render request (validate, fetch, decode, composite,
/// encode) fails with exactly one of these kinds; the HTTP layer maps kinds
/// to status codes via [`SlidecastError::http_status`].
#[derive(thiserror::Error, Debug)]
pub enum SlidecastError {
    /// Malformed or missing request data.
    #[error("validation error: {0}")]
    Validation(String),

    /// An image or audio reference could not be retrieved.
    #[error("failed to fetch '{source_ref}': {message}")]
    Fetch {
        /// The original image/audio reference as given in the request.
        source_ref: String,
        /// Underlying cause (transport error, timeout, HTTP status, IO).
        message: String,
    },

    /// Retrieved bytes are not a decodable image or audio payload.
    #[error("decode error: {0}")]
    Decode(String),

    /// The compositing/encoding stage failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SlidecastError {
    /// Build a [`SlidecastError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`SlidecastError::Fetch`] value.
    pub fn fetch(source_ref: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            source_ref: source_ref.into(),
            message: message.into(),
        }
    }

    /// Build a [`SlidecastError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`SlidecastError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// HTTP status code this error maps to at the service boundary.
    ///
    /// Request-side failures (bad input, unreachable or undecodable sources)
    /// are client errors; everything from the encoder onward is a server
    /// error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::Fetch { .. } | Self::Decode(_) => 400,
            Self::Encode(_) | Self::Other(_) => 500,
        }
    }
}
