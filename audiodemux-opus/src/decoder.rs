//! Ogg Opus decode adapter over `opus`.
//!
//! Opus always decodes at 48 kHz; the descriptor reports that rate
//! regardless of the input's original sample rate. Pre-skip frames from
//! the identification header are decoded and discarded after every
//! (re)initialization.

use std::io::{self, SeekFrom};
use std::sync::OnceLock;

use ogg::{OggReadError, Packet, PacketReader};

use audiodemux_core::{
    keys, Error, MediaStream, OpenOptions, PcmFormat, PcmStream, Properties, Result,
    SharedStream,
};

use crate::header::{parse_header, OpusHeader};

const OPUS_BLOCK_SIZE: usize = 32768;
const OPUS_SAMPLE_RATE: u32 = 48000;

/// Per-channel capacity for one decoded packet, 120 ms at 48 kHz.
const MAX_FRAME_SAMPLES: usize = 5760;

static CAPABILITY: OnceLock<std::result::Result<(), String>> = OnceLock::new();

/// Probe libopus once per process; later failures reuse the cached result.
fn ensure_decoder_available() -> Result<()> {
    let probe = CAPABILITY.get_or_init(|| {
        opus::Decoder::new(OPUS_SAMPLE_RATE, opus::Channels::Mono)
            .map(|_| ())
            .map_err(|err| err.to_string())
    });
    match probe {
        Ok(()) => Ok(()),
        Err(msg) => Err(Error::DecoderUnavailable(msg.clone())),
    }
}

fn new_decoder(channels: u8) -> Result<opus::Decoder> {
    let layout = if channels >= 2 {
        opus::Channels::Stereo
    } else {
        opus::Channels::Mono
    };
    opus::Decoder::new(OPUS_SAMPLE_RATE, layout)
        .map_err(|err| Error::decoder(format!("opus: {err}")))
}

fn next_packet(packets: &mut PacketReader<SharedStream>) -> Result<Option<Packet>> {
    match packets.read_packet() {
        Ok(packet) => Ok(packet),
        Err(OggReadError::ReadError(err)) => Err(Error::Io(err)),
        Err(err) => Err(Error::decoder(format!("ogg: {err}"))),
    }
}

/// Pull-based PCM view over an Ogg Opus stream.
struct OpusStream {
    packets: PacketReader<SharedStream>,
    source: SharedStream,
    decoder: opus::Decoder,
    channels: usize,
    pre_skip: u64,
    skip_remaining: u64,
    scratch: Vec<i16>,
    pending: Vec<u8>,
    pending_offset: usize,
    bytes_delivered: u64,
    eof: bool,
}

impl OpusStream {
    /// Decode the next audio packet into the pending buffer.
    ///
    /// Header and comment packets are skipped, so a rewound packet reader
    /// can be fed straight back in. The pending buffer may come out empty
    /// when pre-skip swallows a whole packet.
    fn refill(&mut self) -> Result<()> {
        loop {
            let packet = match next_packet(&mut self.packets)? {
                Some(packet) => packet,
                None => {
                    self.eof = true;
                    return Ok(());
                }
            };
            if packet.data.starts_with(b"OpusHead") || packet.data.starts_with(b"OpusTags") {
                continue;
            }
            let frames = self
                .decoder
                .decode(&packet.data, &mut self.scratch, false)
                .map_err(|err| Error::decoder(format!("opus: {err}")))?;
            let mut samples = &self.scratch[..frames * self.channels];
            if self.skip_remaining > 0 {
                let dropped = self.skip_remaining.min(frames as u64);
                samples = &samples[(dropped as usize) * self.channels..];
                self.skip_remaining -= dropped;
            }
            self.pending.clear();
            self.pending_offset = 0;
            self.pending.reserve(samples.len() * 2);
            for &sample in samples {
                self.pending.extend_from_slice(&sample.to_le_bytes());
            }
            return Ok(());
        }
    }
}

impl MediaStream for OpusStream {
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
            log::error!("opus stream only seeks to the start");
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "opus stream only seeks to the start",
            )));
        }
        self.source.seek(SeekFrom::Start(0))?;
        self.packets = PacketReader::new(self.source.clone());
        self.decoder = new_decoder(self.channels as u8)?;
        self.pending.clear();
        self.pending_offset = 0;
        self.skip_remaining = self.pre_skip;
        self.bytes_delivered = 0;
        self.eof = false;
        Ok(0)
    }

    fn tell(&mut self) -> Result<u64> {
        Ok(self.bytes_delivered)
    }
}

/// Open an Ogg Opus stream positioned at its first page.
pub fn open(stream: Box<dyn MediaStream>, _options: &OpenOptions) -> Result<PcmStream> {
    ensure_decoder_available()?;

    let mut source = SharedStream::new(stream);
    let mut packets = PacketReader::new(source.clone());
    let first = next_packet(&mut packets)?
        .ok_or_else(|| Error::decoder("ogg: empty stream"))?;
    let header: OpusHeader = parse_header(&first.data)?;
    if header.channels == 0 || header.channels > 2 {
        return Err(Error::unsupported(format!(
            "opus: {} channels",
            header.channels
        )));
    }
    log::debug!(
        "opus: {} ch, pre-skip {}, mapping family {}",
        header.channels,
        header.pre_skip,
        header.mapping_family
    );

    // Rewind and let the refill loop skip the header packets itself, so
    // the initial state matches the post-seek state exactly.
    source.seek(SeekFrom::Start(0))?;
    let packets = PacketReader::new(source.clone());
    let decoder = new_decoder(header.channels)?;

    let channels = usize::from(header.channels);
    let format = if channels >= 2 {
        PcmFormat::Stereo16
    } else {
        PcmFormat::Mono16
    };

    let mut properties = Properties::new();
    properties.set_string(keys::CONTAINER, "ogg");
    properties.set_string(keys::CODEC, "opus");

    Ok(PcmStream {
        frequency: OPUS_SAMPLE_RATE,
        format,
        data_size: None,
        block_size: OPUS_BLOCK_SIZE,
        stream: Box::new(OpusStream {
            packets,
            source,
            decoder,
            channels,
            pre_skip: u64::from(header.pre_skip),
            skip_remaining: u64::from(header.pre_skip),
            scratch: vec![0; MAX_FRAME_SAMPLES * channels],
            pending: Vec::new(),
            pending_offset: 0,
            bytes_delivered: 0,
            eof: false,
        }),
        properties,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiodemux_core::MemoryStream;

    fn ogg_crc(data: &[u8]) -> u32 {
        let mut crc: u32 = 0;
        for &byte in data {
            crc ^= u32::from(byte) << 24;
            for _ in 0..8 {
                crc = if crc & 0x8000_0000 != 0 {
                    (crc << 1) ^ 0x04c1_1db7
                } else {
                    crc << 1
                };
            }
        }
        crc
    }

    fn ogg_page(payload: &[u8], header_type: u8, sequence: u32) -> Vec<u8> {
        assert!(payload.len() < 255);
        let mut page = Vec::new();
        page.extend_from_slice(b"OggS");
        page.push(0);
        page.push(header_type);
        page.extend_from_slice(&0u64.to_le_bytes());
        page.extend_from_slice(&0x5EA1u32.to_le_bytes());
        page.extend_from_slice(&sequence.to_le_bytes());
        let crc_offset = page.len();
        page.extend_from_slice(&[0; 4]);
        page.push(1);
        page.push(payload.len() as u8);
        page.extend_from_slice(payload);
        let crc = ogg_crc(&page);
        page[crc_offset..crc_offset + 4].copy_from_slice(&crc.to_le_bytes());
        page
    }

    fn opus_head(channels: u8) -> Vec<u8> {
        let mut packet = Vec::new();
        packet.extend_from_slice(b"OpusHead");
        packet.push(1);
        packet.push(channels);
        packet.extend_from_slice(&312u16.to_le_bytes());
        packet.extend_from_slice(&48000u32.to_le_bytes());
        packet.extend_from_slice(&0i16.to_le_bytes());
        packet.push(if channels > 2 { 1 } else { 0 });
        packet
    }

    #[test]
    fn test_open_rejects_non_ogg_data() {
        let result = open(
            Box::new(MemoryStream::new(vec![0x42; 1024])),
            &OpenOptions::new(),
        );
        assert!(matches!(result, Err(Error::Decoder(_))));
    }

    #[test]
    fn test_open_rejects_missing_opus_head() {
        let mut ident = Vec::new();
        ident.push(0x01);
        ident.extend_from_slice(b"vorbis");
        let file = ogg_page(&ident, 0x02, 0);
        let result = open(Box::new(MemoryStream::new(file)), &OpenOptions::new());
        assert!(matches!(result, Err(Error::Decoder(_))));
    }

    #[test]
    fn test_open_rejects_surround_layout() {
        let file = ogg_page(&opus_head(6), 0x02, 0);
        let result = open(Box::new(MemoryStream::new(file)), &OpenOptions::new());
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_open_reports_48khz_stereo() {
        let file = ogg_page(&opus_head(2), 0x02, 0);
        let pcm = open(Box::new(MemoryStream::new(file)), &OpenOptions::new()).unwrap();
        assert_eq!(pcm.frequency, 48000);
        assert_eq!(pcm.format, PcmFormat::Stereo16);
        assert_eq!(pcm.data_size, None);
        assert_eq!(pcm.properties.get_string("codec").as_deref(), Some("opus"));
    }

    #[test]
    fn test_header_only_stream_reads_empty() {
        let file = ogg_page(&opus_head(1), 0x02, 0);
        let mut pcm = open(Box::new(MemoryStream::new(file)), &OpenOptions::new()).unwrap();
        let mut buf = [0u8; 64];
        assert_eq!(pcm.stream.read(&mut buf).unwrap(), 0);
    }
}
