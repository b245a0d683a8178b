//! MP3 support for the audiodemux layer: Xing/LAME gapless tag parsing
//! and a pull-based decode adapter over `minimp3`.

pub mod decoder;
pub mod tag;

pub use decoder::{open, open_embedded, ContainerHints};
pub use tag::{read_gapless_info, GaplessInfo};
