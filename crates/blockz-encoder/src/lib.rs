#![warn(clippy::pedantic)]

pub mod compression;
pub mod encoder;
pub mod error;

pub use encoder::{encode_all, CompressedOutputStream, EncoderConfig};
pub use error::EncodeError;
