//! FLAC decode adapter over `claxon`.
//!
//! Serves interleaved little-endian 16-bit PCM through the stream
//! contract. Native and Ogg-mapped inputs share one decode path; the Ogg
//! flavor goes through [`OggFlacStream`] first. Only 8 and 16 bit mono or
//! stereo streams map onto the PCM formats, anything else is rejected at
//! open time.

use std::io::{self, SeekFrom};
use std::mem;

use claxon::{Block, FlacReader};

use audiodemux_core::{
    keys, Error, MediaStream, OpenOptions, PcmFormat, PcmStream, Properties, Result,
    SharedStream,
};

use crate::oggflac::OggFlacStream;

const FLAC_BLOCK_SIZE: usize = 8192;

/// Byte source feeding `claxon`, either the raw stream or the Ogg unwrap.
enum FlacByteSource {
    Raw(SharedStream),
    Ogg(OggFlacStream),
}

impl io::Read for FlacByteSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            FlacByteSource::Raw(stream) => io::Read::read(stream, buf),
            FlacByteSource::Ogg(stream) => stream.read(buf),
        }
    }
}

fn byte_source(source: SharedStream, ogg: bool) -> Result<FlacByteSource> {
    if ogg {
        Ok(FlacByteSource::Ogg(OggFlacStream::new(source)?))
    } else {
        Ok(FlacByteSource::Raw(source))
    }
}

fn map_claxon(err: claxon::Error) -> Error {
    match err {
        claxon::Error::IoError(err) => Error::Io(err),
        claxon::Error::FormatError(msg) => Error::decoder(format!("flac: {msg}")),
        claxon::Error::Unsupported(msg) => Error::unsupported(format!("flac: {msg}")),
    }
}

/// Pull-based PCM view over a FLAC stream.
///
/// Blocks are decoded on demand into a pending byte buffer; the planar
/// claxon buffer is recycled between refills. Seeking supports only a
/// rewind to the start, which rebuilds the reader.
struct FlacStream {
    reader: FlacReader<FlacByteSource>,
    source: SharedStream,
    ogg: bool,
    /// Left shift widening sub-16-bit samples to 16 bits.
    shift: u32,
    pending: Vec<u8>,
    pending_offset: usize,
    scratch: Vec<i32>,
    bytes_delivered: u64,
    eof: bool,
}

impl FlacStream {
    fn ingest(&mut self, block: Block) {
        let channels = block.channels();
        let duration = block.duration();
        self.pending.clear();
        self.pending_offset = 0;
        self.pending
            .reserve(duration as usize * channels as usize * 2);
        for i in 0..duration {
            for ch in 0..channels {
                let sample = (block.sample(ch, i) << self.shift) as i16;
                self.pending.extend_from_slice(&sample.to_le_bytes());
            }
        }
        self.scratch = block.into_buffer();
    }

    fn refill(&mut self) -> Result<()> {
        let buffer = mem::take(&mut self.scratch);
        match self.reader.blocks().read_next_or_eof(buffer) {
            Ok(Some(block)) => {
                self.ingest(block);
                Ok(())
            }
            Ok(None) => {
                self.eof = true;
                Ok(())
            }
            Err(err) => Err(map_claxon(err)),
        }
    }
}

impl MediaStream for FlacStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut total = 0;
        while total < buf.len() {
            if self.pending_offset >= self.pending.len() {
                if self.eof {
                    break;
                }
                self.refill()?;
                continue;
            }
            let take = (buf.len() - total).min(self.pending.len() - self.pending_offset);
            buf[total..total + take]
                .copy_from_slice(&self.pending[self.pending_offset..self.pending_offset + take]);
            self.pending_offset += take;
            total += take;
        }
        self.bytes_delivered += total as u64;
        Ok(total)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        if pos != SeekFrom::Start(0) {
            log::error!("flac stream only seeks to the start");
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "flac stream only seeks to the start",
            )));
        }
        self.source.seek(SeekFrom::Start(0))?;
        let source = byte_source(self.source.clone(), self.ogg)?;
        self.reader = FlacReader::new(source).map_err(map_claxon)?;
        self.pending.clear();
        self.pending_offset = 0;
        self.scratch.clear();
        self.bytes_delivered = 0;
        self.eof = false;
        Ok(0)
    }

    fn tell(&mut self) -> Result<u64> {
        Ok(self.bytes_delivered)
    }
}

fn open_input(stream: Box<dyn MediaStream>, ogg: bool) -> Result<PcmStream> {
    let source = SharedStream::new(stream);
    let reader = FlacReader::new(byte_source(source.clone(), ogg)?).map_err(map_claxon)?;
    let info = reader.streaminfo();

    let format = PcmFormat::from_layout(info.channels as u16, info.bits_per_sample as u16)
        .ok_or_else(|| {
            Error::unsupported(format!(
                "flac: {} channels at {} bits per sample",
                info.channels, info.bits_per_sample
            ))
        })?;
    log::debug!(
        "flac: {} at {} Hz{}",
        format,
        info.sample_rate,
        if ogg { " (ogg)" } else { "" }
    );

    let mut properties = Properties::new();
    properties.set_string(keys::CONTAINER, if ogg { "ogg" } else { "flac" });
    properties.set_string(keys::CODEC, "flac");

    // STREAMINFO counts inter-channel sample frames; output is always
    // widened to 16-bit.
    let data_size = info
        .samples
        .and_then(|frames| u32::try_from(frames * u64::from(info.channels) * 2).ok());

    Ok(PcmStream {
        frequency: info.sample_rate,
        format,
        data_size,
        block_size: FLAC_BLOCK_SIZE,
        stream: Box::new(FlacStream {
            reader,
            source,
            ogg,
            shift: 16 - info.bits_per_sample,
            pending: Vec::new(),
            pending_offset: 0,
            scratch: Vec::new(),
            bytes_delivered: 0,
            eof: false,
        }),
        properties,
    })
}

/// Open a native FLAC stream positioned at its `fLaC` marker.
pub fn open(stream: Box<dyn MediaStream>, _options: &OpenOptions) -> Result<PcmStream> {
    open_input(stream, false)
}

/// Open an Ogg-mapped FLAC stream positioned at its first page.
pub fn open_ogg(stream: Box<dyn MediaStream>, _options: &OpenOptions) -> Result<PcmStream> {
    open_input(stream, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiodemux_core::MemoryStream;

    #[test]
    fn test_open_rejects_non_flac_data() {
        let result = open(
            Box::new(MemoryStream::new(vec![0x42; 1024])),
            &OpenOptions::new(),
        );
        assert!(matches!(result, Err(Error::Decoder(_))));
    }

    #[test]
    fn test_open_rejects_empty_stream() {
        let result = open(
            Box::new(MemoryStream::new(Vec::new())),
            &OpenOptions::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_open_ogg_rejects_non_ogg_data() {
        let result = open_ogg(
            Box::new(MemoryStream::new(vec![0x42; 1024])),
            &OpenOptions::new(),
        );
        assert!(matches!(result, Err(Error::Decoder(_))));
    }
}
