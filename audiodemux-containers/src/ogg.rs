//! First-page Ogg codec classification.
//!
//! The Ogg layer here only classifies: it reads the first page header and
//! the opening bytes of the first packet to decide which codec adapter
//! should re-parse the container from scratch. Full page iteration stays
//! with the decoder side.

use std::io::SeekFrom;

use byteorder::{ByteOrder, LittleEndian};

use audiodemux_core::{Error, MediaStream, OpenOptions, Result};

/// Codec identified from the first Ogg packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OggCodec {
    Vorbis,
    Flac,
    Opus,
}

/// Fixed-layout fields of an Ogg page header.
#[derive(Debug, Clone, Copy)]
struct PageHeader {
    version: u8,
    header_type: u8,
    granule: u64,
    serial: u32,
    sequence: u32,
    segment_count: u8,
}

const TRUNCATED: &str = "Malformed ogg file: unexpected EOF";

fn read_page_header(stream: &mut dyn MediaStream, options: &OpenOptions) -> Result<PageHeader> {
    let mut raw = [0u8; 27];
    match stream.read_exact(&mut raw) {
        Ok(()) => {}
        Err(Error::EndOfStream) => {
            options.error(TRUNCATED);
            return Err(Error::malformed(TRUNCATED));
        }
        Err(other) => return Err(other),
    }
    if &raw[0..4] != b"OggS" {
        options.error("Malformed ogg file: bad capture pattern");
        return Err(Error::malformed("bad Ogg capture pattern"));
    }
    Ok(PageHeader {
        version: raw[4],
        header_type: raw[5],
        granule: LittleEndian::read_u64(&raw[6..14]),
        serial: LittleEndian::read_u32(&raw[14..18]),
        sequence: LittleEndian::read_u32(&raw[18..22]),
        segment_count: raw[26],
    })
}

/// Classify the codec carried by an Ogg container positioned at offset 0.
///
/// The stream is reset to 0 before returning so the codec adapter can
/// re-parse the full container. An unmatched packet signature fails with
/// [`Error::UnexpectedCodec`].
pub fn classify(stream: &mut dyn MediaStream, options: &OpenOptions) -> Result<OggCodec> {
    let header = read_page_header(stream, options)?;
    log::debug!(
        "ogg page: version {}, type {:#04x}, granule {}, serial {:#010x}, sequence {}",
        header.version,
        header.header_type,
        header.granule,
        header.serial,
        header.sequence
    );

    let mut segments = [0u8; 255];
    let mut ident = [0u8; 9];
    let read_rest = stream
        .read_exact(&mut segments[..usize::from(header.segment_count)])
        .and_then(|()| stream.read_exact(&mut ident));
    match read_rest {
        Ok(()) => {}
        Err(Error::EndOfStream) => {
            options.error(TRUNCATED);
            return Err(Error::malformed(TRUNCATED));
        }
        Err(other) => return Err(other),
    }
    stream.seek(SeekFrom::Start(0))?;

    if &ident[..7] == b"\x01vorbis" {
        return Ok(OggCodec::Vorbis);
    }
    if &ident[..5] == b"\x7FFLAC" {
        return Ok(OggCodec::Flac);
    }
    if &ident[..8] == b"OpusHead" {
        return Ok(OggCodec::Opus);
    }
    options.error("ogg: unexpected codec or stream found");
    Err(Error::UnexpectedCodec)
}
