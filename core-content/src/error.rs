use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Network error: {0}")]
    Network(#[from] BridgeError),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Invalid content endpoint {name}: {reason}")]
    InvalidEndpoint { name: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, ContentError>;
