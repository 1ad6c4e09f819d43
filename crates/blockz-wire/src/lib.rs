#![warn(clippy::pedantic)]

pub mod block_frame;
pub mod error;
pub mod header;
pub mod varint;

pub use block_frame::{clamp_jobs, DataFrame, Frame, FrameFlags, MAX_BLOCK_SIZE, MAX_JOBS};
pub use error::WireError;
pub use header::{BlockzHeader, HeaderFlags, HEADER_SIZE};
