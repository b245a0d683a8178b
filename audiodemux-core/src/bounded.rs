//! Bounded sub-stream restricting a parent stream to a byte range.

use std::io::{self, SeekFrom};

use crate::error::{Error, Result};
use crate::stream::MediaStream;

/// View over `[base_offset, base_offset + length)` of a parent stream.
///
/// Reads clip to the declared range and never cross into the parent's
/// out-of-range bytes. While the wrapper is alive the parent must not be
/// repositioned by any other code path; the wrapper tracks the parent's
/// absolute position as its own coordinate frame.
pub struct BoundedStream<S: MediaStream> {
    source: S,
    base_offset: u64,
    length: u64,
}

impl<S: MediaStream> BoundedStream<S> {
    /// Wrap `source` so the next `length` bytes from its current position
    /// form the visible range.
    pub fn new(mut source: S, length: u64) -> Result<Self> {
        let base_offset = source.tell()?;
        Ok(Self {
            source,
            base_offset,
            length,
        })
    }

    /// Visible byte extent.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Release the wrapper, leaving the parent stream open at its current
    /// position.
    pub fn into_inner(self) -> S {
        self.source
    }

    fn position(&mut self) -> Result<u64> {
        Ok(self.source.tell()?.saturating_sub(self.base_offset))
    }
}

impl<S: MediaStream> MediaStream for BoundedStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let remaining = self.length.saturating_sub(self.position()?);
        if remaining == 0 {
            return Ok(0);
        }
        let want = (buf.len() as u64).min(remaining) as usize;
        self.source.read(&mut buf[..want])
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let absolute = match pos {
            SeekFrom::Start(offset) => {
                self.source.seek(SeekFrom::Start(self.base_offset + offset))?
            }
            SeekFrom::End(offset) => {
                let target = (self.base_offset + self.length) as i64 + offset;
                if target < self.base_offset as i64 {
                    return Err(Error::Io(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "seek before start of bounded range",
                    )));
                }
                self.source.seek(SeekFrom::Start(target as u64))?
            }
            SeekFrom::Current(delta) => self.source.seek(SeekFrom::Current(delta))?,
        };
        Ok(absolute.saturating_sub(self.base_offset))
    }

    fn tell(&mut self) -> Result<u64> {
        self.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::MemoryStream;

    fn bounded_over(data: Vec<u8>, start: u64, len: u64) -> BoundedStream<MemoryStream> {
        let mut source = MemoryStream::new(data);
        source.seek(SeekFrom::Start(start)).unwrap();
        BoundedStream::new(source, len).unwrap()
    }

    #[test]
    fn test_read_clips_to_range() {
        let mut stream = bounded_over((0..20).collect(), 5, 8);
        let mut buf = [0u8; 16];
        assert_eq!(stream.read(&mut buf).unwrap(), 8);
        assert_eq!(&buf[..8], &[5, 6, 7, 8, 9, 10, 11, 12]);
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_total_bytes_never_exceed_length() {
        let mut stream = bounded_over((0..50).collect(), 10, 7);
        let mut total = 0;
        let mut buf = [0u8; 3];
        loop {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            total += n;
        }
        assert_eq!(total, 7);
    }

    #[test]
    fn test_seek_origins_translate() {
        let mut stream = bounded_over((0..30).collect(), 4, 10);
        assert_eq!(stream.seek(SeekFrom::Start(3)).unwrap(), 3);
        assert_eq!(stream.tell().unwrap(), 3);
        let mut buf = [0u8; 1];
        stream.read(&mut buf).unwrap();
        assert_eq!(buf[0], 7);

        assert_eq!(stream.seek(SeekFrom::Current(2)).unwrap(), 6);

        // End(0) lands exactly at length; the next read returns 0
        assert_eq!(stream.seek(SeekFrom::End(0)).unwrap(), 10);
        assert_eq!(stream.read(&mut buf).unwrap(), 0);

        assert_eq!(stream.seek(SeekFrom::End(-2)).unwrap(), 8);
        stream.read(&mut buf).unwrap();
        assert_eq!(buf[0], 12);
    }

    #[test]
    fn test_seek_before_start_rejected() {
        let mut stream = bounded_over((0..30).collect(), 4, 10);
        assert!(stream.seek(SeekFrom::End(-11)).is_err());
    }
}
