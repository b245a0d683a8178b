//! Container demultiplexing and decode for compressed game audio assets.
//!
//! [`open`] sniffs the container from leading magic bytes, walks its
//! structure, and returns a [`PcmStream`] whose embedded stream lazily
//! yields interleaved little-endian PCM. Gapless trim metadata from WAVE
//! `fact`/`trim` chunks or MP3 Xing/LAME tags is applied at read time.
//!
//! ```no_run
//! use audiodemux::{open_path, OpenOptions};
//!
//! let pcm = open_path("music.wav", &OpenOptions::new())?;
//! println!("{} Hz {}", pcm.frequency, pcm.format);
//! # Ok::<(), audiodemux::Error>(())
//! ```

pub mod export;

use std::path::Path;

use audiodemux_containers::{classify, parse_wave, probe, ContainerKind, OggCodec, WaveOutcome};
use audiodemux_mp3::ContainerHints;

pub use audiodemux_core::{
    keys, BoundedStream, BufferedReader, Error, FileStream, MediaStream, MemoryStream,
    OpenOptions, PcmFormat, PcmStream, Properties, PropertyValue, Result,
};
pub use export::write_wav;

/// Buffer raw codec streams; RIFF stays unbuffered since the chunk walk
/// hands a bounded view to the decoder anyway.
fn buffered(stream: Box<dyn MediaStream>) -> Result<Box<dyn MediaStream>> {
    Ok(Box::new(BufferedReader::new(stream)?))
}

/// Open a media stream positioned at offset 0 and decode it to PCM.
///
/// The stream is consumed; on error it is released along with everything
/// already layered on top of it.
pub fn open(mut stream: Box<dyn MediaStream>, options: &OpenOptions) -> Result<PcmStream> {
    match probe(&mut stream)? {
        ContainerKind::Riff => match parse_wave(stream, options)? {
            WaveOutcome::Pcm(pcm) => Ok(pcm),
            WaveOutcome::Mp3(payload) => {
                let hints = ContainerHints {
                    channels: payload.format.channels,
                    sample_rate: payload.format.sample_rate,
                    trim_frames: payload.trim_frames,
                    total_frames: payload.total_frames,
                };
                audiodemux_mp3::open_embedded(Box::new(payload.stream), hints, options)
            }
        },
        ContainerKind::Ogg => match classify(&mut stream, options)? {
            OggCodec::Vorbis => {
                options.error("ogg: vorbis payloads are not supported");
                Err(Error::unsupported("ogg: vorbis payload"))
            }
            OggCodec::Flac => audiodemux_flac::open_ogg(buffered(stream)?, options),
            OggCodec::Opus => audiodemux_opus::open(buffered(stream)?, options),
        },
        ContainerKind::Flac => audiodemux_flac::open(buffered(stream)?, options),
        ContainerKind::Mp3 => audiodemux_mp3::open(buffered(stream)?, options),
    }
}

/// Open a file on disk and decode it to PCM.
pub fn open_path(path: impl AsRef<Path>, options: &OpenOptions) -> Result<PcmStream> {
    let file = FileStream::open(path)?;
    open(Box::new(file), options)
}
