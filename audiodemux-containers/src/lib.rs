//! Container detection and parsing for the audiodemux layer.
//!
//! Provides the magic-byte [`probe`], the RIFF/WAVE chunk walker, and the
//! Ogg first-page codec classifier. Decode adapters live in their own
//! crates; this one only resolves container structure.

pub mod ogg;
pub mod probe;
pub mod riff;

pub use ogg::{classify, OggCodec};
pub use probe::{probe, ContainerKind};
pub use riff::{parse_wave, Mp3Payload, WaveFormat, WaveOutcome};
