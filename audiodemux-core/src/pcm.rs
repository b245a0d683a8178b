//! PCM stream descriptor and sample format tags.

use std::fmt;

use crate::properties::Properties;
use crate::stream::MediaStream;

/// Interleaved PCM sample layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PcmFormat {
    Mono8 = 1,
    Mono16 = 2,
    Stereo8 = 3,
    Stereo16 = 4,
}

impl PcmFormat {
    /// Map a WAVE channel count and bit depth to a format tag.
    pub const fn from_layout(channels: u16, bits_per_sample: u16) -> Option<Self> {
        match (channels, bits_per_sample) {
            (1, 8) => Some(PcmFormat::Mono8),
            (1, 16) => Some(PcmFormat::Mono16),
            (2, 8) => Some(PcmFormat::Stereo8),
            (2, 16) => Some(PcmFormat::Stereo16),
            _ => None,
        }
    }

    /// Number of channels.
    pub const fn channels(self) -> u16 {
        match self {
            PcmFormat::Mono8 | PcmFormat::Mono16 => 1,
            PcmFormat::Stereo8 | PcmFormat::Stereo16 => 2,
        }
    }

    /// Bits per sample.
    pub const fn bits_per_sample(self) -> u16 {
        match self {
            PcmFormat::Mono8 | PcmFormat::Stereo8 => 8,
            PcmFormat::Mono16 | PcmFormat::Stereo16 => 16,
        }
    }

    /// Bytes per interleaved sample frame.
    pub const fn bytes_per_frame(self) -> u16 {
        self.channels() * self.bits_per_sample() / 8
    }

    pub const fn is_stereo(self) -> bool {
        self.channels() == 2
    }

    /// Stable numeric tag exposed to collaborators.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for PcmFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PcmFormat::Mono8 => "mono8",
            PcmFormat::Mono16 => "mono16",
            PcmFormat::Stereo8 => "stereo8",
            PcmFormat::Stereo16 => "stereo16",
        };
        f.write_str(name)
    }
}

/// Decoded PCM output of a container parse.
///
/// The embedded stream lazily yields raw little-endian PCM at the stated
/// bit depth. Dropping the descriptor releases the whole adapter chain.
pub struct PcmStream {
    /// Sample rate in Hz.
    pub frequency: u32,
    pub format: PcmFormat,
    /// Total PCM byte length when statically known.
    pub data_size: Option<u32>,
    /// Read-size hint matching the producing decoder's natural frame size.
    pub block_size: usize,
    pub stream: Box<dyn MediaStream>,
    pub properties: Properties,
}

impl fmt::Debug for PcmStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PcmStream")
            .field("frequency", &self.frequency)
            .field("format", &self.format)
            .field("data_size", &self.data_size)
            .field("block_size", &self.block_size)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_layout_mapped() {
        assert_eq!(PcmFormat::from_layout(1, 8), Some(PcmFormat::Mono8));
        assert_eq!(PcmFormat::from_layout(1, 16), Some(PcmFormat::Mono16));
        assert_eq!(PcmFormat::from_layout(2, 8), Some(PcmFormat::Stereo8));
        assert_eq!(PcmFormat::from_layout(2, 16), Some(PcmFormat::Stereo16));
    }

    #[test]
    fn test_from_layout_unmapped() {
        assert_eq!(PcmFormat::from_layout(1, 24), None);
        assert_eq!(PcmFormat::from_layout(6, 16), None);
        assert_eq!(PcmFormat::from_layout(0, 16), None);
    }

    #[test]
    fn test_frame_geometry() {
        assert_eq!(PcmFormat::Stereo16.bytes_per_frame(), 4);
        assert_eq!(PcmFormat::Mono8.bytes_per_frame(), 1);
        assert_eq!(PcmFormat::Stereo16.code(), 4);
        assert!(PcmFormat::Stereo8.is_stereo());
        assert!(!PcmFormat::Mono16.is_stereo());
    }
}
