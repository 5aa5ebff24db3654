use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result, Section};

/// Bounds-checked little-endian cursor over a borrowed blob.
///
/// Every read checks the remaining length first and reports the section it
/// was reading on failure, so a short blob never panics.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    position: usize,
    section: Section,
}

#[allow(clippy::missing_errors_doc)]
impl<'a> ByteReader<'a> {
    #[must_use]
    pub const fn new(bytes: &'a [u8], position: usize, section: Section) -> Self {
        Self {
            bytes,
            position,
            section,
        }
    }

    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.position)
    }

    /// Switches the section reported by subsequent failures.
    pub fn set_section(&mut self, section: Section) {
        self.section = section;
    }

    /// Returns the next `len` bytes and advances past them.
    ///
    /// # Errors
    ///
    /// Returns `Error::Truncated` if fewer than `len` bytes remain.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let available = self.remaining();
        if len > available {
            return Err(Error::Truncated {
                section: self.section.clone(),
                needed: len,
                available,
            });
        }
        let start = self.position;
        let slice = self
            .bytes
            .get(start..start + len)
            .ok_or_else(|| Error::Truncated {
                section: self.section.clone(),
                needed: len,
                available,
            })?;
        self.position += len;
        Ok(slice)
    }

    /// Advances past `len` bytes without inspecting them.
    ///
    /// # Errors
    ///
    /// Returns `Error::Truncated` if fewer than `len` bytes remain.
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(i8::from_le_bytes([self.read_u8()?]))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(LittleEndian::read_f64(self.take(8)?))
    }
}
