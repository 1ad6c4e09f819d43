#![warn(clippy::pedantic)]

pub mod error;
pub mod stream;

mod decompression;

pub use error::DecodeError;
pub use stream::{CompressedInputStream, DecoderConfig};
