//! Core types for the audiodemux container-demux layer.
//!
//! This crate provides the stream abstraction everything else composes
//! over: the [`MediaStream`] trait with file/memory leaves, the bounded
//! and buffered adapters, the case-insensitive [`Properties`] store, the
//! [`PcmStream`] descriptor produced by every container parse, and the
//! shared error type.

pub mod bounded;
pub mod buffered;
pub mod error;
pub mod options;
pub mod pcm;
pub mod properties;
pub mod stream;

pub use bounded::BoundedStream;
pub use buffered::BufferedReader;
pub use error::{Error, Result};
pub use options::OpenOptions;
pub use pcm::{PcmFormat, PcmStream};
pub use properties::{keys, Properties, PropertyValue};
pub use stream::{FileStream, MediaStream, MemoryStream, SharedStream};
