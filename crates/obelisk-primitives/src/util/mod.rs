//! Cursor types for Obelisk binary payloads.
//!
//! `WireReader` and `WireWriter` read and write the little-endian integers,
//! fixed-size byte runs and reversed hashes that make up every request and
//! response body.

use crate::address::{Address, ADDRESS_WIRE_SIZE};
use crate::chainhash::{Hash256, HASH_SIZE};
use crate::PrimitivesError;

// ---------------------------------------------------------------------------
// WireReader
// ---------------------------------------------------------------------------

/// A cursor-based reader over a response body.
///
/// Wraps a byte slice and maintains a read position. Every read checks
/// the remaining length first, so a short buffer yields
/// `PrimitivesError::UnexpectedEof` instead of a panic.
pub struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Create a new reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        WireReader { data, pos: 0 }
    }

    /// Read `n` bytes and advance the position.
    ///
    /// # Returns
    /// A byte slice of length `n`, or an error if insufficient data remains.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], PrimitivesError> {
        if n > self.remaining() {
            return Err(PrimitivesError::UnexpectedEof {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read exactly `N` bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], PrimitivesError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8, PrimitivesError> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Read a little-endian u32 and advance the position by 4 bytes.
    pub fn read_u32_le(&mut self) -> Result<u32, PrimitivesError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian u64 and advance the position by 8 bytes.
    pub fn read_u64_le(&mut self) -> Result<u64, PrimitivesError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read a 32-byte hash stored in wire order.
    pub fn read_hash(&mut self) -> Result<Hash256, PrimitivesError> {
        Ok(Hash256::from_wire(self.read_array::<HASH_SIZE>()?))
    }

    /// Read a 21-byte wire-form address.
    pub fn read_address(&mut self) -> Result<Address, PrimitivesError> {
        Address::from_wire(self.read_bytes(ADDRESS_WIRE_SIZE)?)
    }

    /// Consume everything that is left.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let rest = &self.data[self.pos..];
        self.pos = self.data.len();
        rest
    }

    /// Return the number of bytes remaining.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Whether the whole buffer has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Assert the buffer was consumed exactly.
    ///
    /// # Returns
    /// `Ok(())` when nothing is left, `PrimitivesError::TrailingBytes` otherwise.
    pub fn finish(self) -> Result<(), PrimitivesError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(PrimitivesError::TrailingBytes(n)),
        }
    }
}

// ---------------------------------------------------------------------------
// WireWriter
// ---------------------------------------------------------------------------

/// A buffer-based writer for request payloads.
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    /// Create a new empty writer.
    pub fn new() -> Self {
        WireWriter { buf: Vec::new() }
    }

    /// Create a new writer with a pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        WireWriter { buf: Vec::with_capacity(capacity) }
    }

    /// Append raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Append a single byte.
    pub fn write_u8(&mut self, val: u8) -> &mut Self {
        self.buf.push(val);
        self
    }

    /// Append a little-endian u32 (4 bytes).
    pub fn write_u32_le(&mut self, val: u32) -> &mut Self {
        self.buf.extend_from_slice(&val.to_le_bytes());
        self
    }

    /// Append a little-endian u64 (8 bytes).
    pub fn write_u64_le(&mut self, val: u64) -> &mut Self {
        self.buf.extend_from_slice(&val.to_le_bytes());
        self
    }

    /// Append a hash in wire order.
    pub fn write_hash(&mut self, hash: &Hash256) -> &mut Self {
        self.buf.extend_from_slice(hash.as_wire());
        self
    }

    /// Append a 21-byte wire-form address.
    pub fn write_address(&mut self, address: &Address) -> &mut Self {
        self.buf.extend_from_slice(&address.to_wire());
        self
    }

    /// Return the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consume the writer and return the buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_integers() {
        let data = [0x88, 0x6e, 0x04, 0x00, 0x01, 0, 0, 0, 0, 0, 0, 0x80, 0xff];
        let mut r = WireReader::new(&data);
        assert_eq!(r.read_u32_le().unwrap(), 290_440);
        assert_eq!(r.read_u64_le().unwrap(), 0x8000_0000_0000_0001);
        assert_eq!(r.read_u8().unwrap(), 0xff);
        assert!(r.is_empty());
        assert!(r.finish().is_ok());
    }

    #[test]
    fn test_reader_eof() {
        let data = [0x01, 0x02, 0x03];
        let mut r = WireReader::new(&data);
        assert_eq!(
            r.read_u32_le(),
            Err(PrimitivesError::UnexpectedEof { needed: 4, remaining: 3 })
        );
        // A failed read does not advance.
        assert_eq!(r.remaining(), 3);
    }

    #[test]
    fn test_reader_trailing_bytes() {
        let data = [0u8; 6];
        let mut r = WireReader::new(&data);
        r.read_u32_le().unwrap();
        assert_eq!(r.finish(), Err(PrimitivesError::TrailingBytes(2)));
    }

    #[test]
    fn test_reader_rest() {
        let data = [1u8, 2, 3, 4, 5];
        let mut r = WireReader::new(&data);
        r.read_u8().unwrap();
        assert_eq!(r.read_rest(), &[2, 3, 4, 5]);
        assert_eq!(r.read_rest(), &[] as &[u8]);
        assert!(r.finish().is_ok());
    }

    #[test]
    fn test_writer_chain() {
        let hash = Hash256::from_wire([7u8; 32]);
        let mut w = WireWriter::with_capacity(41);
        w.write_u8(3).write_hash(&hash).write_u32_le(1).write_u32_le(0xffff_ffff);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 41);
        assert_eq!(bytes[0], 3);
        assert_eq!(&bytes[1..33], &[7u8; 32]);
        assert_eq!(&bytes[33..37], &[1, 0, 0, 0]);
        assert_eq!(&bytes[37..41], &[0xff; 4]);
    }

    #[test]
    fn test_hash_and_address_roundtrip_through_cursor() {
        let hash = Hash256::from_wire([0xab; 32]);
        let address = Address::new(0x00, [0x42; 20]);
        let mut w = WireWriter::new();
        w.write_hash(&hash).write_address(&address);
        let bytes = w.into_bytes();
        let mut r = WireReader::new(&bytes);
        assert_eq!(r.read_hash().unwrap(), hash);
        assert_eq!(r.read_address().unwrap(), address);
        assert!(r.finish().is_ok());
    }
}
