use std::borrow::Cow;

use crate::WireError;

/// A cursor over an encoded byte slice.
///
/// ```
/// use std::borrow::Cow;
/// let mut reader = kiwi_bridge_wire::WireReader::new(&[240, 159, 141, 149, 0, 149, 154, 239, 58]);
/// assert_eq!(reader.read_string(), Ok(Cow::Borrowed("🍕")));
/// assert_eq!(reader.read_var_uint(), Ok(123456789));
/// ```
pub struct WireReader<'a> {
    data:  &'a [u8],
    index: usize,
}

impl<'a> WireReader<'a> {
    /// Wraps `data`. The reader borrows the slice and cannot outlive it.
    pub fn new(data: &'a [u8]) -> WireReader<'a> {
        WireReader { data, index: 0 }
    }

    /// Current offset into the underlying slice. Starts at 0 and ends at
    /// `data.len()` once everything has been consumed.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_at_end(&self) -> bool {
        self.index >= self.data.len()
    }

    pub fn read_bool(&mut self) -> Result<bool, WireError> {
        let offset = self.index;
        match self.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(WireError::InvalidBool { value, offset }),
        }
    }

    pub fn read_byte(&mut self) -> Result<u8, WireError> {
        match self.data.get(self.index) {
            Some(&value) => {
                self.index += 1;
                Ok(value)
            }
            None => Err(WireError::UnexpectedEof { offset: self.index, wanted: 1 }),
        }
    }

    /// Reads exactly `len` bytes, borrowing them from the underlying slice.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        let end = self.index.checked_add(len).filter(|&end| end <= self.data.len());
        match end {
            Some(end) => {
                let value = &self.data[self.index..end];
                self.index = end;
                Ok(value)
            }
            None => Err(WireError::UnexpectedEof {
                offset: self.index,
                wanted: len - (self.data.len() - self.index),
            }),
        }
    }

    /// Reads a zig-zag encoded variable-length signed 32-bit integer.
    pub fn read_var_int(&mut self) -> Result<i32, WireError> {
        let value = self.read_var_uint()?;
        Ok((if (value & 1) != 0 { !(value >> 1) } else { value >> 1 }) as i32)
    }

    /// Reads a variable-length unsigned 32-bit integer. At most five bytes are
    /// consumed; the continuation bit of the fifth byte is ignored.
    pub fn read_var_uint(&mut self) -> Result<u32, WireError> {
        let mut shift: u8 = 0;
        let mut result: u32 = 0;

        loop {
            let byte = self.read_byte()?;
            result |= ((byte & 127) as u32) << shift;
            shift += 7;

            if (byte & 128) == 0 || shift >= 35 {
                break;
            }
        }

        Ok(result)
    }

    /// Reads a NUL-terminated UTF-8 string. Invalid sequences are replaced,
    /// so the result only borrows when the bytes were already valid.
    pub fn read_string(&mut self) -> Result<Cow<'a, str>, WireError> {
        let start = self.index;
        let rest = &self.data[start.min(self.data.len())..];

        match rest.iter().position(|&b| b == 0) {
            Some(len) => {
                self.index = start + len + 1;
                Ok(String::from_utf8_lossy(&rest[..len]))
            }
            None => Err(WireError::UnterminatedString { offset: start }),
        }
    }
}
