//! OpusHead identification header parsing (RFC 7845 section 5.1).

use byteorder::{ByteOrder, LittleEndian};

use audiodemux_core::{Error, Result};

/// Fields of the identification header relevant to decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpusHeader {
    pub channels: u8,
    /// Sample frames to discard from the head of the decoded stream.
    pub pre_skip: u16,
    /// Playback gain in Q7.8 dB, applied by players, not by this layer.
    pub output_gain: i16,
    pub mapping_family: u8,
}

/// Parse the first packet of an Ogg Opus stream.
///
/// Accepts any version with a zero upper nibble, as required for
/// encapsulation v1 compatibility.
pub fn parse_header(packet: &[u8]) -> Result<OpusHeader> {
    if packet.len() < 19 || &packet[..8] != b"OpusHead" {
        return Err(Error::decoder("ogg: missing OpusHead packet"));
    }
    if packet[8] & 0xF0 != 0 {
        return Err(Error::decoder(format!(
            "ogg: unsupported OpusHead version {}",
            packet[8]
        )));
    }
    Ok(OpusHeader {
        channels: packet[9],
        pre_skip: LittleEndian::read_u16(&packet[10..12]),
        output_gain: LittleEndian::read_i16(&packet[16..18]),
        mapping_family: packet[18],
    })
}
