use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Read past the end of the mapped buffer.")]
pub struct EndOfInput;

/// Bounds-checked little-endian reader over an in-memory buffer.
///
/// A failed read leaves the position untouched, so a caller scanning for a
/// section can keep going from where it stopped. The cursor never allocates.
pub(crate) struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Cursor { data, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], EndOfInput> {
        if self.remaining() < n {
            log::error!(
                "read of {n} bytes outside of mapped buffer (pos {}, len {})",
                self.pos(),
                self.data.len()
            );
            return Err(EndOfInput);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, EndOfInput> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, EndOfInput> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32, EndOfInput> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_exact(&mut self, out: &mut [u8]) -> Result<(), EndOfInput> {
        out.copy_from_slice(self.take(out.len())?);
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<(), EndOfInput> {
        self.take(n).map(|_| ())
    }
}
