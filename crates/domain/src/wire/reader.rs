use super::name::MAX_NAME_LEN;
use crate::errors::WireError;
use std::sync::Arc;
use thiserror::Error;

/// Low-level read failures. The decoder maps them onto the [`WireError`]
/// variant for the region being parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("unexpected end of message at offset {0}")]
    UnexpectedEnd(usize),

    #[error("compression pointer at offset {0} does not point backwards")]
    BadPointer(usize),

    #[error("unsupported label type {0:#04x}")]
    BadLabelType(u8),

    #[error("name exceeds {MAX_NAME_LEN} bytes")]
    NameTooLong,

    #[error("label at offset {0} is not valid UTF-8")]
    InvalidLabel(usize),
}

impl From<ReadError> for WireError {
    fn from(err: ReadError) -> Self {
        WireError::MalformedResource(err.to_string())
    }
}

/// Cursor over a complete DNS message.
///
/// The whole message is kept (not just the remaining bytes) so that
/// compression pointers can be followed from anywhere in the buffer.
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn read_u8(&mut self) -> Result<u8, ReadError> {
        let byte = *self.buf.get(self.pos).ok_or(ReadError::UnexpectedEnd(self.pos))?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_u16(&mut self) -> Result<u16, ReadError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, ReadError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ReadError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or(ReadError::UnexpectedEnd(self.buf.len()))?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Reads a possibly compressed domain name and returns it in canonical
    /// trailing-dot form (`"."` for the root).
    pub fn read_name(&mut self) -> Result<Arc<str>, ReadError> {
        let mut name = String::new();
        let mut pos = self.pos;
        let mut resume_at: Option<usize> = None;
        let mut encoded_len = 1usize;

        loop {
            let len_byte = *self.buf.get(pos).ok_or(ReadError::UnexpectedEnd(pos))?;
            match len_byte & 0xC0 {
                0x00 => {
                    let len = len_byte as usize;
                    pos += 1;
                    if len == 0 {
                        break;
                    }

                    let label = self
                        .buf
                        .get(pos..pos + len)
                        .ok_or(ReadError::UnexpectedEnd(self.buf.len()))?;
                    encoded_len += len + 1;
                    if encoded_len > MAX_NAME_LEN {
                        return Err(ReadError::NameTooLong);
                    }

                    let text =
                        std::str::from_utf8(label).map_err(|_| ReadError::InvalidLabel(pos))?;
                    name.push_str(text);
                    name.push('.');
                    pos += len;
                }
                0xC0 => {
                    let low = *self.buf.get(pos + 1).ok_or(ReadError::UnexpectedEnd(pos + 1))?;
                    let target = (((len_byte & 0x3F) as usize) << 8) | low as usize;
                    if target >= pos {
                        return Err(ReadError::BadPointer(pos));
                    }
                    if resume_at.is_none() {
                        resume_at = Some(pos + 2);
                    }
                    pos = target;
                }
                other => return Err(ReadError::BadLabelType(other)),
            }
        }

        self.pos = resume_at.unwrap_or(pos);

        if name.is_empty() {
            name.push('.');
        }
        Ok(name.into())
    }
}
