//! RIFF/WAVE chunk walker.
//!
//! Walks the chunk list of a WAVE file, extracting the typed `fmt ` fields
//! and the vendor `fact`/`trim` gapless pair, then dispatches on the audio
//! format code: plain PCM is served straight from the `data` chunk, an
//! MPEG Layer 3 payload is handed back for the MP3 adapter to decode.

use byteorder::{ByteOrder, LittleEndian};

use audiodemux_core::{
    keys, BoundedStream, Error, MediaStream, OpenOptions, PcmFormat, PcmStream, Properties,
    Result,
};

/// WAVE format code for uncompressed PCM.
pub const WAVE_FORMAT_PCM: u16 = 0x0001;
/// WAVE format code for an embedded MPEG Layer 3 payload.
pub const WAVE_FORMAT_MPEGLAYER3: u16 = 0x0055;

const PCM_BLOCK_SIZE: usize = 32768;

/// Typed fields of the 16-byte `fmt ` chunk.
#[derive(Debug, Clone, Copy)]
pub struct WaveFormat {
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

/// Embedded MP3 payload plus the container's decode-time hints.
pub struct Mp3Payload {
    /// Bounded view over the `data` chunk, positioned at its start.
    pub stream: BoundedStream<Box<dyn MediaStream>>,
    pub format: WaveFormat,
    /// Trim-start frame count from the vendor `trim` chunk.
    pub trim_frames: Option<i32>,
    /// Total frame count from the legacy `fact` chunk.
    pub total_frames: Option<i32>,
}

/// Outcome of walking a WAVE container.
pub enum WaveOutcome {
    Pcm(PcmStream),
    Mp3(Mp3Payload),
}

fn read_or_malformed(
    stream: &mut dyn MediaStream,
    buf: &mut [u8],
    options: &OpenOptions,
    what: &str,
) -> Result<()> {
    match stream.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(Error::EndOfStream) => {
            options.error(what);
            Err(Error::malformed(what))
        }
        Err(other) => Err(other),
    }
}

/// Walk a WAVE container from offset 0.
///
/// The stream is consumed; failures release it along with everything it
/// wraps.
pub fn parse_wave(mut stream: Box<dyn MediaStream>, options: &OpenOptions) -> Result<WaveOutcome> {
    let mut header = [0u8; 12];
    read_or_malformed(
        &mut stream,
        &mut header,
        options,
        "Malformed wave file: unexpected EOF",
    )?;
    if &header[0..4] != b"RIFF" || &header[8..12] != b"WAVE" {
        options.error("Malformed wave file: bad RIFF/WAVE tags");
        return Err(Error::malformed("bad RIFF/WAVE tags"));
    }

    let mut chunk = [0u8; 8];
    read_or_malformed(
        &mut stream,
        &mut chunk,
        options,
        "Malformed wave file: unexpected EOF",
    )?;
    if &chunk[0..4] != b"fmt " {
        options.error("Malformed wave file: fmt chunk not first");
        return Err(Error::malformed("fmt chunk not first"));
    }
    let fmt_size = LittleEndian::read_u32(&chunk[4..8]);
    if fmt_size < 16 {
        options.error("Malformed wave file: fmt chunk too small");
        return Err(Error::malformed("fmt chunk too small"));
    }
    let mut fmt_bytes = [0u8; 16];
    read_or_malformed(
        &mut stream,
        &mut fmt_bytes,
        options,
        "Malformed wave file: unexpected EOF",
    )?;
    let format = WaveFormat {
        audio_format: LittleEndian::read_u16(&fmt_bytes[0..2]),
        channels: LittleEndian::read_u16(&fmt_bytes[2..4]),
        sample_rate: LittleEndian::read_u32(&fmt_bytes[4..8]),
        byte_rate: LittleEndian::read_u32(&fmt_bytes[8..12]),
        block_align: LittleEndian::read_u16(&fmt_bytes[12..14]),
        bits_per_sample: LittleEndian::read_u16(&fmt_bytes[14..16]),
    };
    if fmt_size > 16 {
        stream.skip(i64::from(fmt_size - 16))?;
    }
    log::debug!(
        "wave fmt: code {:#06x}, {} ch, {} Hz, {} bits",
        format.audio_format,
        format.channels,
        format.sample_rate,
        format.bits_per_sample
    );

    let mut trim_frames: Option<i32> = None;
    let mut total_frames: Option<i32> = None;
    let data_size = loop {
        let mut chunk = [0u8; 8];
        match stream.read_exact(&mut chunk) {
            Ok(()) => {}
            Err(Error::EndOfStream) => {
                options.error("Unable to find WAVE data");
                return Err(Error::malformed("no data chunk"));
            }
            Err(other) => return Err(other),
        }
        let size = LittleEndian::read_u32(&chunk[4..8]);
        match &chunk[0..4] {
            b"data" => break size,
            b"fact" if size >= 4 => {
                let mut value = [0u8; 4];
                read_or_malformed(
                    &mut stream,
                    &mut value,
                    options,
                    "Malformed wave file: truncated fact chunk",
                )?;
                total_frames = Some(LittleEndian::read_i32(&value));
                stream.skip(i64::from(size - 4))?;
            }
            b"trim" if size >= 4 => {
                let mut value = [0u8; 4];
                read_or_malformed(
                    &mut stream,
                    &mut value,
                    options,
                    "Malformed wave file: truncated trim chunk",
                )?;
                trim_frames = Some(LittleEndian::read_i32(&value));
                stream.skip(i64::from(size - 4))?;
            }
            id => {
                log::debug!(
                    "skipping chunk {:?} ({} bytes)",
                    String::from_utf8_lossy(id),
                    size
                );
                stream.skip(i64::from(size))?;
            }
        }
    };
    // trim metadata is all-or-nothing
    if trim_frames.is_none() {
        total_frames = None;
    }

    match format.audio_format {
        WAVE_FORMAT_PCM => {
            let Some(pcm_format) = PcmFormat::from_layout(format.channels, format.bits_per_sample)
            else {
                let msg = format!(
                    "unsupported PCM layout: {} channels, {} bits",
                    format.channels, format.bits_per_sample
                );
                options.error(&msg);
                return Err(Error::unsupported(msg));
            };
            let bounded = BoundedStream::new(stream, u64::from(data_size))?;
            let mut properties = Properties::new();
            properties.set_string(keys::CONTAINER, "wav");
            properties.set_string(keys::CODEC, "pcm");
            Ok(WaveOutcome::Pcm(PcmStream {
                frequency: format.sample_rate,
                format: pcm_format,
                data_size: Some(data_size),
                block_size: PCM_BLOCK_SIZE,
                stream: Box::new(bounded),
                properties,
            }))
        }
        WAVE_FORMAT_MPEGLAYER3 => {
            let bounded = BoundedStream::new(stream, u64::from(data_size))?;
            Ok(WaveOutcome::Mp3(Mp3Payload {
                stream: bounded,
                format,
                trim_frames,
                total_frames,
            }))
        }
        code => {
            let msg = format!("WAVE format code {code:#06x}");
            options.error(&msg);
            Err(Error::unsupported(msg))
        }
    }
}
