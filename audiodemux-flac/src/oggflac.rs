//! Ogg-to-native FLAC stream unwrapping.
//!
//! `claxon` reads only native FLAC streams, so Ogg-mapped FLAC is rebuilt
//! on the fly: the first packet carries a 9-byte mapping preamble followed
//! by the native `fLaC` marker and STREAMINFO block, and every later packet
//! is a metadata block or audio frame verbatim. Dropping the preamble and
//! concatenating packet payloads yields a stream the decoder accepts.

use std::io;

use ogg::{OggReadError, PacketReader};

use audiodemux_core::{Error, Result, SharedStream};

/// Byte view reassembling a native FLAC stream from its Ogg mapping.
pub struct OggFlacStream {
    packets: PacketReader<SharedStream>,
    pending: Vec<u8>,
    offset: usize,
    eof: bool,
}

impl std::fmt::Debug for OggFlacStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OggFlacStream")
            .field("pending", &self.pending)
            .field("offset", &self.offset)
            .field("eof", &self.eof)
            .finish_non_exhaustive()
    }
}

impl OggFlacStream {
    /// Wrap an Ogg stream positioned at its first page.
    ///
    /// Fails when the first packet is not a FLAC mapping header.
    pub fn new(source: SharedStream) -> Result<Self> {
        let mut packets = PacketReader::new(source);
        let first = match packets.read_packet() {
            Ok(Some(packet)) => packet,
            Ok(None) => return Err(Error::decoder("ogg: empty stream")),
            Err(OggReadError::ReadError(err)) => return Err(Error::Io(err)),
            Err(err) => return Err(Error::decoder(format!("ogg: {err}"))),
        };
        let data = first.data;
        if data.len() < 13
            || data[0] != 0x7F
            || &data[1..5] != b"FLAC"
            || &data[9..13] != b"fLaC"
        {
            return Err(Error::decoder("ogg: invalid FLAC mapping header"));
        }
        log::debug!("ogg: FLAC mapping header, {} bytes in first packet", data.len());
        Ok(Self {
            packets,
            pending: data[9..].to_vec(),
            offset: 0,
            eof: false,
        })
    }
}

impl io::Read for OggFlacStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut total = 0;
        while total < buf.len() {
            if self.offset >= self.pending.len() {
                if self.eof {
                    break;
                }
                match self.packets.read_packet() {
                    Ok(Some(packet)) => {
                        self.pending = packet.data;
                        self.offset = 0;
                    }
                    Ok(None) => {
                        self.eof = true;
                        break;
                    }
                    Err(OggReadError::ReadError(err)) => return Err(err),
                    Err(err) => {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("ogg: {err}"),
                        ))
                    }
                }
            }
            let take = (buf.len() - total).min(self.pending.len() - self.offset);
            buf[total..total + take]
                .copy_from_slice(&self.pending[self.offset..self.offset + take]);
            self.offset += take;
            total += take;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    use audiodemux_core::MemoryStream;

    /// Ogg page CRC: polynomial 0x04c11db7, zero init, no reflection.
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

    fn ogg_page(payload: &[u8], header_type: u8, granule: u64, sequence: u32) -> Vec<u8> {
        assert!(payload.len() < 255);
        let mut page = Vec::new();
        page.extend_from_slice(b"OggS");
        page.push(0);
        page.push(header_type);
        page.extend_from_slice(&granule.to_le_bytes());
        page.extend_from_slice(&0x0EADu32.to_le_bytes());
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

    fn mapping_header(body: &[u8]) -> Vec<u8> {
        let mut packet = vec![0x7F];
        packet.extend_from_slice(b"FLAC");
        packet.push(1);
        packet.push(0);
        packet.extend_from_slice(&1u16.to_be_bytes());
        packet.extend_from_slice(b"fLaC");
        packet.extend_from_slice(body);
        packet
    }

    fn shared(bytes: Vec<u8>) -> SharedStream {
        SharedStream::new(Box::new(MemoryStream::new(bytes)))
    }

    #[test]
    fn test_unwraps_mapping_header_and_payloads() {
        let mut file = ogg_page(&mapping_header(&[0xAA, 0xBB]), 0x02, 0, 0);
        file.extend_from_slice(&ogg_page(&[0xCC, 0xDD, 0xEE], 0x04, 4096, 1));

        let mut stream = OggFlacStream::new(shared(file)).unwrap();
        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        assert_eq!(&out[..4], b"fLaC");
        assert_eq!(&out[4..], &[0xAA, 0xBB, 0xCC, 0xDD, 0xEE]);
    }

    #[test]
    fn test_rejects_wrong_mapping_magic() {
        let mut packet = mapping_header(&[]);
        packet[1..5].copy_from_slice(b"FLAK");
        let file = ogg_page(&packet, 0x02, 0, 0);
        let err = OggFlacStream::new(shared(file)).unwrap_err();
        assert!(matches!(err, Error::Decoder(_)));
    }

    #[test]
    fn test_rejects_short_first_packet() {
        let file = ogg_page(&[0x7F, b'F', b'L', b'A', b'C'], 0x02, 0, 0);
        let err = OggFlacStream::new(shared(file)).unwrap_err();
        assert!(matches!(err, Error::Decoder(_)));
    }

    #[test]
    fn test_rejects_non_ogg_bytes() {
        let err = OggFlacStream::new(shared(vec![0u8; 64])).unwrap_err();
        assert!(matches!(err, Error::Decoder(_)));
    }
}
