//! Output sink for sanitized tables.

use arrayvec::ArrayVec;

use crate::error::Error;

/// Compute the OpenType checksum of a byte slice: the wrapping sum of its
/// big-endian u32 words, with a trailing partial word treated as if padded
/// with zeros.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut state = ChecksumState::default();
    state.update(data);
    state.value()
}

/// Running OpenType checksum.
///
/// Writes rarely arrive in multiples of four bytes, so up to three bytes of
/// an unfinished word are carried between updates.
#[derive(Debug, Default, Clone)]
pub struct ChecksumState {
    sum: u32,
    hanging: ArrayVec<u8, 4>,
}

impl ChecksumState {
    fn update(&mut self, mut data: &[u8]) {
        // Top up a previously unfinished word first.
        if !self.hanging.is_empty() {
            while !data.is_empty() && !self.hanging.is_full() {
                self.hanging.push(data[0]);
                data = &data[1..];
            }
            if !self.hanging.is_full() {
                return;
            }
            let word = [
                self.hanging[0],
                self.hanging[1],
                self.hanging[2],
                self.hanging[3],
            ];
            self.sum = self.sum.wrapping_add(u32::from_be_bytes(word));
            self.hanging.clear();
        }

        let mut words = data.chunks_exact(4);
        for word in &mut words {
            self.sum = self
                .sum
                .wrapping_add(u32::from_be_bytes(word.try_into().unwrap()));
        }
        self.hanging.extend(words.remainder().iter().copied());
    }

    fn value(&self) -> u32 {
        let mut word = [0u8; 4];
        word[..self.hanging.len()].copy_from_slice(&self.hanging);
        self.sum.wrapping_add(u32::from_be_bytes(word))
    }
}

/// Seekable byte sink with a running checksum.
///
/// Serializers reserve directory space with `pad`, emit the bodies, then
/// seek back and fill the directory in. The checksum save/reset/restore
/// operations keep those patch writes from being counted twice: save before
/// seeking back, restore once the cursor has returned to the end.
#[derive(Debug, Default)]
pub struct OutputStream {
    data: Vec<u8>,
    pos: usize,
    checksum: ChecksumState,
}

impl OutputStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let end = self.pos.checked_add(bytes.len()).ok_or(Error::Stream)?;
        self.checksum.update(bytes);

        // The cursor is never past the written extent, so a write overlaps
        // existing bytes first and extends with whatever is left.
        let overlap = bytes.len().min(self.data.len() - self.pos);
        self.data[self.pos..self.pos + overlap].copy_from_slice(&bytes[..overlap]);
        self.data.extend_from_slice(&bytes[overlap..]);

        self.pos = end;
        Ok(())
    }

    pub fn write_u16(&mut self, value: u16) -> Result<(), Error> {
        self.write(&value.to_be_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), Error> {
        self.write(&value.to_be_bytes())
    }

    /// Writes `n_bytes` zeros.
    pub fn pad(&mut self, n_bytes: usize) -> Result<(), Error> {
        const ZEROS: [u8; 64] = [0; 64];
        let mut left = n_bytes;
        while left > 0 {
            let take = left.min(ZEROS.len());
            self.write(&ZEROS[..take])?;
            left -= take;
        }
        Ok(())
    }

    /// Current write position.
    pub fn tell(&self) -> usize {
        self.pos
    }

    /// Moves the write position anywhere within the written extent.
    pub fn seek(&mut self, pos: usize) -> Result<(), Error> {
        if pos > self.data.len() {
            return Err(Error::Stream);
        }
        self.pos = pos;
        Ok(())
    }

    pub fn save_checksum_state(&self) -> ChecksumState {
        self.checksum.clone()
    }

    pub fn reset_checksum(&mut self) {
        self.checksum = ChecksumState::default();
    }

    pub fn restore_checksum(&mut self, state: ChecksumState) {
        self.checksum = state;
    }

    /// Checksum of everything fed to the running state, with any hanging
    /// bytes zero-padded.
    pub fn checksum(&self) -> u32 {
        self.checksum.value()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}
