// Mon Aug 3 2026 - Alex

pub mod error;
pub mod pe;

pub use error::ImageError;
pub use pe::{BinaryImage, Section};
