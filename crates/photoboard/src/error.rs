use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhotoBoardError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Empty payload for {0}")]
    EmptyPayload(String),

    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("{0}")]
    Other(String),
}

impl PhotoBoardError {
    /// True for network-layer failures: unreachable host, timeout, bad status.
    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Status { .. } | Self::EmptyPayload(_)
        )
    }

    /// True when bytes arrived but were not a valid resource.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

pub type Result<T> = std::result::Result<T, PhotoBoardError>;
