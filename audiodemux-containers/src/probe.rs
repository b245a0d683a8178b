//! Magic-byte container detection.

use std::io::SeekFrom;

use audiodemux_core::{Error, MediaStream, Result};

/// Container classification from the leading magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// RIFF/WAVE.
    Riff,
    /// Ogg (codec resolved by the page classifier).
    Ogg,
    /// Raw FLAC.
    Flac,
    /// Raw MP3, either ID3-tagged or starting at a frame sync.
    Mp3,
}

/// Peek the first 4 bytes of `stream` and classify the container.
///
/// The stream position is restored to 0 before returning so the container
/// parser re-reads the header itself. Fewer than 4 readable bytes or an
/// unknown pattern fail with [`Error::FormatUnrecognized`].
pub fn probe(stream: &mut dyn MediaStream) -> Result<ContainerKind> {
    let mut magic = [0u8; 4];
    match stream.read_exact(&mut magic) {
        Ok(()) => {}
        Err(Error::EndOfStream) => return Err(Error::FormatUnrecognized),
        Err(other) => return Err(other),
    }
    stream.seek(SeekFrom::Start(0))?;

    let kind = match &magic {
        b"RIFF" => ContainerKind::Riff,
        b"OggS" => ContainerKind::Ogg,
        b"fLaC" => ContainerKind::Flac,
        [b'I', b'D', b'3', _] => ContainerKind::Mp3,
        [0xFF, second, _, _] if second & 0xE0 == 0xE0 => ContainerKind::Mp3,
        _ => {
            log::debug!("no container magic matched: {magic:02X?}");
            return Err(Error::FormatUnrecognized);
        }
    };
    log::debug!("detected container: {kind:?}");
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiodemux_core::MemoryStream;

    fn probe_bytes(data: &[u8]) -> Result<ContainerKind> {
        let mut stream = MemoryStream::new(data.to_vec());
        probe(&mut stream)
    }

    #[test]
    fn test_known_magics() {
        assert_eq!(probe_bytes(b"RIFF\x10\x00").unwrap(), ContainerKind::Riff);
        assert_eq!(probe_bytes(b"OggS\x00\x02").unwrap(), ContainerKind::Ogg);
        assert_eq!(probe_bytes(b"fLaC\x00\x00").unwrap(), ContainerKind::Flac);
        assert_eq!(probe_bytes(b"ID3\x04rest").unwrap(), ContainerKind::Mp3);
        assert_eq!(probe_bytes(&[0xFF, 0xFB, 0x90, 0x00]).unwrap(), ContainerKind::Mp3);
        assert_eq!(probe_bytes(&[0xFF, 0xE2, 0x00, 0x00]).unwrap(), ContainerKind::Mp3);
    }

    #[test]
    fn test_unknown_magic() {
        assert!(matches!(
            probe_bytes(b"MThd\x00\x00"),
            Err(Error::FormatUnrecognized)
        ));
        // sync byte without the full mask is not an MPEG frame
        assert!(matches!(
            probe_bytes(&[0xFF, 0x1B, 0x00, 0x00]),
            Err(Error::FormatUnrecognized)
        ));
    }

    #[test]
    fn test_truncated_input() {
        assert!(matches!(
            probe_bytes(b"RI"),
            Err(Error::FormatUnrecognized)
        ));
        assert!(matches!(probe_bytes(b""), Err(Error::FormatUnrecognized)));
    }

    #[test]
    fn test_position_restored() {
        let mut stream = MemoryStream::new(b"RIFFxxxxWAVE".to_vec());
        probe(&mut stream).unwrap();
        assert_eq!(stream.tell().unwrap(), 0);
    }
}
