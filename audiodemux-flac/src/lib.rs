//! FLAC support for the audiodemux layer: a pull-based decode adapter over
//! `claxon` plus the Ogg-to-native stream unwrapper it needs for Ogg FLAC.

pub mod decoder;
pub mod oggflac;

pub use decoder::{open, open_ogg};
pub use oggflac::OggFlacStream;
