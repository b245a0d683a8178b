//! Ogg Opus support for the audiodemux layer: identification header
//! parsing and a pull-based decode adapter over `opus`.

pub mod decoder;
pub mod header;

pub use decoder::open;
pub use header::{parse_header, OpusHeader};
