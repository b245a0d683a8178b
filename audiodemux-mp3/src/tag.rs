//! Xing/LAME gapless tag extraction.
//!
//! Recovers sample-accurate trim metadata embedded by common MP3 encoders
//! without engaging the full decoder. The whole parse is best-effort: any
//! short read or signature mismatch yields no metadata, never an error,
//! and the caller falls back to an un-trimmed decode.

use std::io::SeekFrom;

use byteorder::{BigEndian, ByteOrder};

use audiodemux_core::MediaStream;

/// Samples per MPEG Layer 3 frame.
pub const SAMPLES_PER_FRAME: u32 = 1152;

/// Filter-bank priming latency of the reference decoder.
const DECODER_DELAY: u32 = 529;

/// Side-info byte counts by MPEG version and channel count. The Xing tag
/// begins immediately after the side info.
const SIDE_INFO_SIZES: [[i64; 2]; 3] = [[17, 32], [9, 17], [9, 17]];

/// Gapless decode window recovered from a Xing/LAME tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GaplessInfo {
    /// Sample frames to drop from the head of the decoded stream.
    pub trim_start: u32,
    /// Playable sample frame count after trimming.
    pub total_frames: u32,
}

fn read_bytes<const N: usize>(stream: &mut dyn MediaStream) -> Option<[u8; N]> {
    let mut buf = [0u8; N];
    stream.read_exact(&mut buf).ok()?;
    Some(buf)
}

/// Parse the leading MPEG frame for a Xing/LAME tag.
///
/// Expects the stream positioned at the first frame header; the position
/// is left wherever the parse stopped, so callers rewind afterwards.
pub fn read_gapless_info(stream: &mut dyn MediaStream) -> Option<GaplessInfo> {
    let header: [u8; 4] = read_bytes(stream)?;
    let sync = (u16::from(header[0]) << 8) | u16::from(header[1]);
    if sync & 0xFFE0 != 0xFFE0 {
        return None;
    }

    let version_index = match (header[1] >> 3) & 0x03 {
        3 => 0, // MPEG 1
        2 => 1, // MPEG 2
        0 => 2, // MPEG 2.5
        _ => return None,
    };
    let channel_mode = (header[3] >> 6) & 0x03;
    let channels: usize = if channel_mode == 3 { 1 } else { 2 };

    stream
        .seek(SeekFrom::Current(SIDE_INFO_SIZES[version_index][channels - 1]))
        .ok()?;
    let tag: [u8; 4] = read_bytes(stream)?;
    if &tag != b"Xing" && &tag != b"Info" {
        return None;
    }

    let flags = BigEndian::read_u32(&read_bytes::<4>(stream)?);
    if flags & 0x1 == 0 {
        // without a frame count the total length cannot be derived
        log::debug!("Xing tag without frame count, ignoring");
        return None;
    }
    let frame_count = BigEndian::read_u32(&read_bytes::<4>(stream)?);
    if flags & 0x2 != 0 {
        let _stream_size = BigEndian::read_u32(&read_bytes::<4>(stream)?);
    }

    // VBR quality and TOC region
    stream.seek(SeekFrom::Current(104)).ok()?;
    let encoder: [u8; 4] = read_bytes(stream)?;
    if &encoder != b"LAME" {
        return None;
    }
    stream.seek(SeekFrom::Current(17)).ok()?;

    let delay_pad: [u8; 3] = read_bytes(stream)?;
    let delay = (u32::from(delay_pad[0]) << 4) | (u32::from(delay_pad[1]) >> 4);
    let padding = ((u32::from(delay_pad[1]) & 0x0F) << 8) | u32::from(delay_pad[2]);

    let trim_start = delay + SAMPLES_PER_FRAME + DECODER_DELAY;
    let total_frames = frame_count
        .checked_mul(SAMPLES_PER_FRAME)?
        .checked_sub(padding + delay)?;
    log::debug!("LAME gapless: trim {trim_start}, total {total_frames}");
    Some(GaplessInfo {
        trim_start,
        total_frames,
    })
}
