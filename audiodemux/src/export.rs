//! RIFF/WAVE export of a decoded PCM stream.
//!
//! The header is written with placeholder length fields, the stream is
//! drained in block-size reads, then the data length and the RIFF chunk
//! size (data length + 24) are backpatched.

use std::io::{Seek, SeekFrom, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use audiodemux_core::{Error, PcmStream, Result};

const RIFF_SIZE_OFFSET: u64 = 4;
const DATA_SIZE_OFFSET: u64 = 40;

/// Drain `pcm` into `out` as a WAVE file, returning the PCM byte count.
pub fn write_wav<W: Write + Seek>(pcm: &mut PcmStream, out: &mut W) -> Result<u64> {
    write_wav_with(pcm, out, |_| {})
}

/// [`write_wav`] with a progress callback fed the running byte count.
pub fn write_wav_with<W, F>(pcm: &mut PcmStream, out: &mut W, mut progress: F) -> Result<u64>
where
    W: Write + Seek,
    F: FnMut(u64),
{
    let channels = pcm.format.channels();
    let bits = pcm.format.bits_per_sample();
    let block_align = pcm.format.bytes_per_frame();
    let byte_rate = pcm.frequency * u32::from(block_align);

    out.write_all(b"RIFF")?;
    out.write_u32::<LittleEndian>(0)?;
    out.write_all(b"WAVE")?;
    out.write_all(b"fmt ")?;
    out.write_u32::<LittleEndian>(16)?;
    out.write_u16::<LittleEndian>(1)?;
    out.write_u16::<LittleEndian>(channels)?;
    out.write_u32::<LittleEndian>(pcm.frequency)?;
    out.write_u32::<LittleEndian>(byte_rate)?;
    out.write_u16::<LittleEndian>(block_align)?;
    out.write_u16::<LittleEndian>(bits)?;
    out.write_all(b"data")?;
    out.write_u32::<LittleEndian>(0)?;

    let mut block = vec![0u8; pcm.block_size.max(1)];
    let mut written: u64 = 0;
    loop {
        let n = pcm.stream.read(&mut block)?;
        if n == 0 {
            break;
        }
        out.write_all(&block[..n])?;
        written += n as u64;
        progress(written);
    }

    let data_len = u32::try_from(written)
        .map_err(|_| Error::unsupported("PCM data exceeds the WAVE size field"))?;
    out.seek(SeekFrom::Start(RIFF_SIZE_OFFSET))?;
    out.write_u32::<LittleEndian>(data_len + 24)?;
    out.seek(SeekFrom::Start(DATA_SIZE_OFFSET))?;
    out.write_u32::<LittleEndian>(data_len)?;
    out.seek(SeekFrom::End(0))?;
    log::debug!("wrote {written} PCM bytes");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use audiodemux_core::{MemoryStream, PcmFormat, Properties};

    fn pcm_of(data: Vec<u8>) -> PcmStream {
        PcmStream {
            frequency: 22050,
            format: PcmFormat::Mono16,
            data_size: Some(data.len() as u32),
            block_size: 7,
            stream: Box::new(MemoryStream::new(data)),
            properties: Properties::new(),
        }
    }

    #[test]
    fn test_header_layout_and_backpatch() {
        let data: Vec<u8> = (0..100).collect();
        let mut pcm = pcm_of(data.clone());
        let mut out = Cursor::new(Vec::new());
        assert_eq!(write_wav(&mut pcm, &mut out).unwrap(), 100);

        let bytes = out.into_inner();
        assert_eq!(bytes.len(), 44 + 100);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 124);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(u32::from_le_bytes(bytes[16..20].try_into().unwrap()), 16);
        assert_eq!(u16::from_le_bytes(bytes[20..22].try_into().unwrap()), 1);
        assert_eq!(u16::from_le_bytes(bytes[22..24].try_into().unwrap()), 1);
        assert_eq!(u32::from_le_bytes(bytes[24..28].try_into().unwrap()), 22050);
        assert_eq!(u32::from_le_bytes(bytes[28..32].try_into().unwrap()), 44100);
        assert_eq!(u16::from_le_bytes(bytes[32..34].try_into().unwrap()), 2);
        assert_eq!(u16::from_le_bytes(bytes[34..36].try_into().unwrap()), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32::from_le_bytes(bytes[40..44].try_into().unwrap()), 100);
        assert_eq!(&bytes[44..], &data[..]);
    }

    #[test]
    fn test_progress_reaches_total() {
        let mut pcm = pcm_of(vec![0u8; 50]);
        let mut out = Cursor::new(Vec::new());
        let mut last = 0;
        write_wav_with(&mut pcm, &mut out, |n| last = n).unwrap();
        assert_eq!(last, 50);
    }

    #[test]
    fn test_empty_stream_writes_bare_header() {
        let mut pcm = pcm_of(Vec::new());
        let mut out = Cursor::new(Vec::new());
        assert_eq!(write_wav(&mut pcm, &mut out).unwrap(), 0);
        let bytes = out.into_inner();
        assert_eq!(bytes.len(), 44);
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 24);
        assert_eq!(u32::from_le_bytes(bytes[40..44].try_into().unwrap()), 0);
    }
}
