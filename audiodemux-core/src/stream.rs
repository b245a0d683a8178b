//! Byte stream abstraction shared by container parsers and decode adapters.
//!
//! Every component in the workspace composes over [`MediaStream`]: leaf
//! streams anchor the chain to a file or memory buffer, adapters wrap a
//! source they own, and decode adapters expose decoded PCM through the same
//! interface. Dropping a stream releases its whole source chain.

use std::cell::RefCell;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use std::rc::Rc;

use crate::error::{Error, Result};

/// Pull-based byte stream with optional seeking.
///
/// A return of 0 from [`read`](MediaStream::read) signals end of stream,
/// not an error. [`tell`](MediaStream::tell) is only meaningful for streams
/// anchored to a seekable origin.
pub trait MediaStream {
    /// Read up to `buf.len()` bytes, returning the count actually read.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Reposition the stream, returning the new absolute position.
    fn seek(&mut self, pos: SeekFrom) -> Result<u64>;

    /// Current absolute byte position.
    fn tell(&mut self) -> Result<u64>;

    /// Read exactly `buf.len()` bytes or fail with [`Error::EndOfStream`].
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read(&mut buf[filled..])?;
            if n == 0 {
                return Err(Error::EndOfStream);
            }
            filled += n;
        }
        Ok(())
    }

    /// Skip `count` bytes relative to the current position.
    fn skip(&mut self, count: i64) -> Result<()> {
        self.seek(SeekFrom::Current(count))?;
        Ok(())
    }
}

impl<S: MediaStream + ?Sized> MediaStream for Box<S> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        (**self).seek(pos)
    }

    fn tell(&mut self) -> Result<u64> {
        (**self).tell()
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read_exact(buf)
    }

    fn skip(&mut self, count: i64) -> Result<()> {
        (**self).skip(count)
    }
}

/// Leaf stream backed by a local file handle.
pub struct FileStream {
    file: File,
}

impl FileStream {
    /// Open a file for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            file: File::open(path)?,
        })
    }
}

impl MediaStream for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.file.read(buf)?)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        Ok(self.file.seek(pos)?)
    }

    fn tell(&mut self) -> Result<u64> {
        Ok(self.file.stream_position()?)
    }
}

/// Leaf stream over an in-memory byte buffer.
pub struct MemoryStream {
    cursor: Cursor<Vec<u8>>,
}

impl MemoryStream {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }
}

impl MediaStream for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.cursor.read(buf)?)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        Ok(self.cursor.seek(pos)?)
    }

    fn tell(&mut self) -> Result<u64> {
        Ok(self.cursor.position())
    }
}

fn into_io(err: Error) -> io::Error {
    match err {
        Error::Io(e) => e,
        Error::EndOfStream => io::Error::new(io::ErrorKind::UnexpectedEof, "end of stream"),
        other => io::Error::new(io::ErrorKind::Other, other.to_string()),
    }
}

/// Cloneable handle sharing one underlying stream.
///
/// Used where a decoder takes ownership of its input through the
/// [`io::Read`] bridge while a reset path still needs to rewind the same
/// source. All clones observe one shared position.
#[derive(Clone)]
pub struct SharedStream {
    inner: Rc<RefCell<Box<dyn MediaStream>>>,
}

impl SharedStream {
    pub fn new(stream: Box<dyn MediaStream>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(stream)),
        }
    }
}

impl MediaStream for SharedStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.inner.borrow_mut().read(buf)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.inner.borrow_mut().seek(pos)
    }

    fn tell(&mut self) -> Result<u64> {
        self.inner.borrow_mut().tell()
    }
}

impl Read for SharedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.borrow_mut().read(buf).map_err(into_io)
    }
}

impl Seek for SharedStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.borrow_mut().seek(pos).map_err(into_io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_stream_read_seek_tell() {
        let mut stream = MemoryStream::new(vec![1, 2, 3, 4, 5]);
        let mut buf = [0u8; 3];
        assert_eq!(stream.read(&mut buf).unwrap(), 3);
        assert_eq!(buf, [1, 2, 3]);
        assert_eq!(stream.tell().unwrap(), 3);

        assert_eq!(stream.seek(SeekFrom::Start(1)).unwrap(), 1);
        assert_eq!(stream.read(&mut buf).unwrap(), 3);
        assert_eq!(buf, [2, 3, 4]);

        assert_eq!(stream.seek(SeekFrom::End(-1)).unwrap(), 4);
        assert_eq!(stream.read(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], 5);
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_read_exact_eof() {
        let mut stream = MemoryStream::new(vec![1, 2]);
        let mut buf = [0u8; 4];
        let err = stream.read_exact(&mut buf).unwrap_err();
        assert!(err.is_eof());
    }

    #[test]
    fn test_shared_stream_clones_share_position() {
        let mut a = SharedStream::new(Box::new(MemoryStream::new(vec![9, 8, 7, 6])));
        let mut b = a.clone();
        let mut buf = [0u8; 2];
        MediaStream::read(&mut a, &mut buf).unwrap();
        assert_eq!(b.tell().unwrap(), 2);
        MediaStream::read(&mut b, &mut buf).unwrap();
        assert_eq!(buf, [7, 6]);
    }
}
