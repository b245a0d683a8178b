//! Buffered reader batching small reads through a fixed-size block.

use std::io::SeekFrom;

use crate::error::Result;
use crate::stream::MediaStream;

const BLOCK_SIZE: usize = 1024;

/// Forward reader that refills a fixed internal block from its source.
///
/// Invariant: `tell()` always reflects the logical position accounting for
/// unread buffered bytes. Any seek discards the buffer and re-synchronizes
/// from the source's own position.
pub struct BufferedReader<S: MediaStream> {
    source: S,
    block: [u8; BLOCK_SIZE],
    fill: usize,
    cursor: usize,
    block_start: u64,
}

impl<S: MediaStream> BufferedReader<S> {
    pub fn new(mut source: S) -> Result<Self> {
        let block_start = source.tell()?;
        Ok(Self {
            source,
            block: [0; BLOCK_SIZE],
            fill: 0,
            cursor: 0,
            block_start,
        })
    }

    /// Release the wrapper, leaving the source at its raw position (which
    /// may be ahead of the logical position by the unread buffered bytes).
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: MediaStream> MediaStream for BufferedReader<S> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut total = 0;
        while total < buf.len() {
            if self.cursor >= self.fill {
                self.block_start += self.fill as u64;
                self.fill = self.source.read(&mut self.block)?;
                self.cursor = 0;
                if self.fill == 0 {
                    break;
                }
            }
            let take = (buf.len() - total).min(self.fill - self.cursor);
            buf[total..total + take].copy_from_slice(&self.block[self.cursor..self.cursor + take]);
            self.cursor += take;
            total += take;
        }
        Ok(total)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        // A Current-origin delta is relative to the logical position, which
        // trails the source by the unread buffered bytes.
        let translated = match pos {
            SeekFrom::Current(delta) => {
                SeekFrom::Current(delta + self.cursor as i64 - self.fill as i64)
            }
            other => other,
        };
        self.source.seek(translated)?;
        self.fill = 0;
        self.cursor = 0;
        self.block_start = self.source.tell()?;
        Ok(self.block_start)
    }

    fn tell(&mut self) -> Result<u64> {
        Ok(self.block_start + self.cursor as u64)
    }
}
