// Mon Aug 3 2026 - Alex

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to read binary image: {0}")]
    Io(#[from] std::io::Error),

    #[error("unrecognized executable container: {0}")]
    Container(String),

    #[error("image has no sections")]
    NoSections,
}
