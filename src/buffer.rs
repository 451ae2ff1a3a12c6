//! Bounds-checked reads over untrusted table bytes.

use font_types::Uint24;

use crate::error::Error;

/// Big-endian reader over a borrowed slice.
///
/// Reads advance a cursor and fail cleanly instead of touching memory past
/// the end of the slice. `set_offset` may park the cursor anywhere; the next
/// read performs the range check.
pub struct Buffer<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Buffer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Buffer { data, offset: 0 }
    }

    #[inline(always)]
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let end = self.offset.checked_add(N).ok_or(Error::ParseFailed)?;
        let bytes = self.data.get(self.offset..end).ok_or(Error::ParseFailed)?;
        self.offset = end;
        Ok(bytes.try_into().unwrap())
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, Error> {
        Ok(self.read_array::<1>()?[0])
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16, Error> {
        Ok(u16::from_be_bytes(self.read_array::<2>()?))
    }

    #[inline]
    pub fn read_i16(&mut self) -> Result<i16, Error> {
        Ok(i16::from_be_bytes(self.read_array::<2>()?))
    }

    /// Reads a 24-bit unsigned integer, most-significant byte first.
    #[inline]
    pub fn read_u24(&mut self) -> Result<u32, Error> {
        Ok(Uint24::from_be_bytes(self.read_array::<3>()?).to_u32())
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32, Error> {
        Ok(u32::from_be_bytes(self.read_array::<4>()?))
    }

    pub fn skip(&mut self, n_bytes: usize) -> Result<(), Error> {
        let end = self.offset.checked_add(n_bytes).ok_or(Error::ParseFailed)?;
        if end > self.data.len() {
            return Err(Error::ParseFailed);
        }
        self.offset = end;
        Ok(())
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn set_offset(&mut self, new_offset: usize) {
        self.offset = new_offset;
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
