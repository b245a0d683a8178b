//! MP3 decode adapter over `minimp3`.
//!
//! Serves interleaved little-endian 16-bit PCM through the stream
//! contract, honoring gapless trim metadata from either an embedded
//! Xing/LAME tag (raw MP3) or container-provided hints (MP3-in-WAV).

use std::io::{self, SeekFrom};

use minimp3::{Decoder, Error as Mp3Error, Frame};

use audiodemux_core::{
    keys, Error, MediaStream, OpenOptions, PcmFormat, PcmStream, Properties, Result,
    SharedStream,
};

use crate::tag::{self, GaplessInfo};

const MP3_BLOCK_SIZE: usize = 8192;

/// Decode hints declared by an enclosing WAVE container.
#[derive(Debug, Clone, Copy)]
pub struct ContainerHints {
    pub channels: u16,
    pub sample_rate: u32,
    /// Trim-start frame count from the vendor `trim` chunk.
    pub trim_frames: Option<i32>,
    /// Total frame count from the legacy `fact` chunk.
    pub total_frames: Option<i32>,
}

fn next_frame(decoder: &mut Decoder<SharedStream>) -> Result<Option<Frame>> {
    loop {
        match decoder.next_frame() {
            Ok(frame) if frame.channels > 0 => return Ok(Some(frame)),
            Ok(_) => continue,
            Err(Mp3Error::SkippedData) => continue,
            Err(Mp3Error::Eof) | Err(Mp3Error::InsufficientData) => return Ok(None),
            Err(Mp3Error::Io(err)) => return Err(err.into()),
        }
    }
}

/// Pull-based PCM view over an MPEG Layer 3 stream.
///
/// Trim frames are decoded and discarded after every (re)initialization;
/// reads clamp to the playable total when one is known. Seeking supports
/// only a rewind to the start, which rebuilds the decoder.
struct Mp3Stream {
    decoder: Decoder<SharedStream>,
    source: SharedStream,
    pending: Vec<u8>,
    pending_offset: usize,
    channels: usize,
    trim_frames: u64,
    skip_remaining: u64,
    frames_remaining: Option<u64>,
    total_frames: Option<u64>,
    bytes_delivered: u64,
    eof: bool,
}

impl Mp3Stream {
    fn new(source: SharedStream, trim: u64, total: Option<u64>) -> Result<(Self, u32, usize)> {
        let mut decoder = Decoder::new(source.clone());
        let first = next_frame(&mut decoder)?
            .ok_or_else(|| Error::decoder("no MPEG audio frames found"))?;
        let channels = first.channels;
        let sample_rate = first.sample_rate as u32;
        let mut stream = Self {
            decoder,
            source,
            pending: Vec::new(),
            pending_offset: 0,
            channels,
            trim_frames: trim,
            skip_remaining: trim,
            frames_remaining: total,
            total_frames: total,
            bytes_delivered: 0,
            eof: false,
        };
        stream.ingest(&first);
        Ok((stream, sample_rate, channels))
    }

    /// Queue the playable slice of a decoded frame, applying head trim and
    /// the total-length clamp.
    fn ingest(&mut self, frame: &Frame) {
        let channels = frame.channels.max(1);
        let mut samples = frame.data.as_slice();
        let mut frame_count = (samples.len() / channels) as u64;

        if self.skip_remaining > 0 {
            let dropped = self.skip_remaining.min(frame_count);
            samples = &samples[(dropped as usize) * channels..];
            frame_count -= dropped;
            self.skip_remaining -= dropped;
        }
        if let Some(remaining) = self.frames_remaining {
            if frame_count > remaining {
                frame_count = remaining;
                samples = &samples[..(frame_count as usize) * channels];
            }
            let left = remaining - frame_count;
            self.frames_remaining = Some(left);
            if left == 0 {
                self.eof = true;
            }
        }

        self.pending.clear();
        self.pending_offset = 0;
        self.pending.reserve(samples.len() * 2);
        for &sample in samples {
            self.pending.extend_from_slice(&sample.to_le_bytes());
        }
    }
}

impl MediaStream for Mp3Stream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut total = 0;
        while total < buf.len() {
            if self.pending_offset >= self.pending.len() {
                if self.eof {
                    break;
                }
                match next_frame(&mut self.decoder)? {
                    Some(frame) => {
                        self.ingest(&frame);
                        if self.pending.is_empty() {
                            continue;
                        }
                    }
                    None => {
                        self.eof = true;
                        break;
                    }
                }
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
            log::error!("mp3 stream only seeks to the start");
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "mp3 stream only seeks to the start",
            )));
        }
        self.source.seek(SeekFrom::Start(0))?;
        self.decoder = Decoder::new(self.source.clone());
        self.pending.clear();
        self.pending_offset = 0;
        self.skip_remaining = self.trim_frames;
        self.frames_remaining = self.total_frames;
        self.bytes_delivered = 0;
        self.eof = false;
        Ok(0)
    }

    fn tell(&mut self) -> Result<u64> {
        Ok(self.bytes_delivered)
    }
}

fn format_for(channels: usize) -> PcmFormat {
    if channels >= 2 {
        PcmFormat::Stereo16
    } else {
        PcmFormat::Mono16
    }
}

fn descriptor(
    stream: Mp3Stream,
    sample_rate: u32,
    channels: usize,
    properties: Properties,
) -> PcmStream {
    PcmStream {
        frequency: sample_rate,
        format: format_for(channels),
        data_size: None,
        block_size: MP3_BLOCK_SIZE,
        stream: Box::new(stream),
        properties,
    }
}

/// Open a raw MP3 stream, deriving gapless trim from its Xing/LAME tag.
pub fn open(stream: Box<dyn MediaStream>, _options: &OpenOptions) -> Result<PcmStream> {
    let mut source = SharedStream::new(stream);
    let gapless: Option<GaplessInfo> = tag::read_gapless_info(&mut source);
    source.seek(SeekFrom::Start(0))?;

    let (trim, total) = match gapless {
        Some(info) => (
            u64::from(info.trim_start),
            Some(u64::from(info.total_frames)),
        ),
        None => (0, None),
    };
    let (mp3, sample_rate, channels) = Mp3Stream::new(source, trim, total)?;

    let mut properties = Properties::new();
    properties.set_string(keys::CONTAINER, "mp3");
    properties.set_string(keys::CODEC, "mp3");
    if let Some(info) = gapless {
        properties.set_int(keys::MP3_TRIM, info.trim_start as i32);
        properties.set_int(keys::MP3_SAMPLES, info.total_frames as i32);
    }
    Ok(descriptor(mp3, sample_rate, channels, properties))
}

/// Open an MP3 payload embedded in a WAVE container, trusting the
/// container's gapless hints.
pub fn open_embedded(
    stream: Box<dyn MediaStream>,
    hints: ContainerHints,
    options: &OpenOptions,
) -> Result<PcmStream> {
    let source = SharedStream::new(stream);
    let trim = hints.trim_frames.unwrap_or(0).max(0) as u64;
    let total = hints.total_frames.map(|t| t.max(0) as u64);
    let (mp3, sample_rate, channels) = Mp3Stream::new(source, trim, total)?;

    let mut properties = Properties::new();
    properties.set_string(keys::CONTAINER, "wav");
    properties.set_string(keys::CODEC, "mp3");
    if sample_rate != hints.sample_rate || channels as u16 != hints.channels {
        options.error(&format!(
            "wave fmt declares {} ch at {} Hz but MPEG stream is {} ch at {} Hz",
            hints.channels, hints.sample_rate, channels, sample_rate
        ));
    } else if let (Some(trim_v), Some(total_v)) = (hints.trim_frames, hints.total_frames) {
        properties.set_int(keys::CONTAINER_TRIM, trim_v);
        properties.set_int(keys::CONTAINER_SAMPLES, total_v);
    }
    Ok(descriptor(mp3, sample_rate, channels, properties))
}
