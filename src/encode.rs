//! Wire encoding helpers: little-endian integers and CompactSize varints

use crate::error::{AuthError, Result};

/// Cursor over a byte slice
pub struct BufferReader<'a> {
    buf: &'a [u8],
    off: usize,
}

impl<'a> BufferReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, off: 0 }
    }

    pub fn offset(&self) -> usize {
        self.off
    }

    pub fn is_finished(&self) -> bool {
        self.off >= self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.off)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(AuthError::Serialization(format!(
                "unexpected EOF: wanted {} bytes at offset {}, {} left",
                n,
                self.off,
                self.remaining()
            )));
        }
        let v = &self.buf[self.off..self.off + n];
        self.off += n;
        Ok(v)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn peek_u8(&self) -> Option<u8> {
        self.buf.get(self.off).copied()
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32_le(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_hash(&mut self) -> Result<[u8; 32]> {
        self.read_array()
    }

    /// Read a CompactSize integer
    pub fn read_varint(&mut self) -> Result<u64> {
        match self.read_u8()? {
            tag @ 0x00..=0xfc => Ok(tag as u64),
            0xfd => Ok(self.read_u16_le()? as u64),
            0xfe => Ok(self.read_u32_le()? as u64),
            0xff => self.read_u64_le(),
        }
    }

    /// Read a varint length followed by that many bytes
    pub fn read_var_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_varint()?;
        let len = usize::try_from(len)
            .map_err(|_| AuthError::Serialization(format!("length {} overflows usize", len)))?;
        self.read_bytes(len)
    }
}

/// Growable output buffer
#[derive(Debug, Default, Clone)]
pub struct BufferWriter {
    buf: Vec<u8>,
}

impl BufferWriter {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn write(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn write_u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn write_u32_le(&mut self, v: u32) -> &mut Self {
        self.write(&v.to_le_bytes())
    }

    pub fn write_i32_le(&mut self, v: i32) -> &mut Self {
        self.write(&v.to_le_bytes())
    }

    pub fn write_u64_le(&mut self, v: u64) -> &mut Self {
        self.write(&v.to_le_bytes())
    }

    pub fn write_varint(&mut self, n: u64) -> &mut Self {
        encode_varint(n, &mut self.buf);
        self
    }

    pub fn write_var_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_varint(bytes.len() as u64);
        self.write(bytes)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

/// Encode a number as a CompactSize varint
pub fn encode_varint(n: u64, out: &mut Vec<u8>) {
    match n {
        0x00..=0xfc => out.push(n as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&n.to_le_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn varint(n: u64) -> Vec<u8> {
        let mut out = Vec::new();
        encode_varint(n, &mut out);
        out
    }

    #[test]
    fn test_encode_varint_small() {
        assert_eq!(varint(0), vec![0x00]);
        assert_eq!(varint(0xfc), vec![0xfc]);
    }

    #[test]
    fn test_encode_varint_boundaries() {
        assert_eq!(varint(0xfd), vec![0xfd, 0xfd, 0x00]);
        assert_eq!(varint(0xffff), vec![0xfd, 0xff, 0xff]);
        assert_eq!(varint(0x10000), vec![0xfe, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(varint(0x1_0000_0000), vec![0xff, 0, 0, 0, 0, 1, 0, 0, 0]);
    }

    #[test]
    fn test_read_varint_all_widths() {
        for n in [0u64, 0xfc, 0xfd, 0xffff, 0x10000, 0xffff_ffff, 0x1_0000_0000] {
            let bytes = varint(n);
            let mut reader = BufferReader::new(&bytes);
            assert_eq!(reader.read_varint().unwrap(), n);
            assert!(reader.is_finished());
        }
    }

    #[test]
    fn test_read_truncated() {
        let mut reader = BufferReader::new(&[0x01, 0x02]);
        assert!(reader.read_u32_le().is_err());
        // failed read does not advance
        assert_eq!(reader.offset(), 0);
        assert_eq!(reader.read_u16_le().unwrap(), 0x0201);
    }

    #[test]
    fn test_read_var_bytes_truncated() {
        let mut reader = BufferReader::new(&[0x05, 0xaa, 0xbb]);
        assert!(matches!(reader.read_var_bytes(), Err(AuthError::Serialization(_))));
    }

    #[test]
    fn test_writer_chaining() {
        let mut writer = BufferWriter::new();
        writer.write_u32_le(1).write_var_bytes(&[0xab, 0xcd]).write_u64_le(2);
        assert_eq!(
            hex::encode(writer.as_bytes()),
            "0100000002abcd0200000000000000"
        );
    }
}
