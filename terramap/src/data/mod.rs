//! all the IO
//!
//! everything in the `.map` format and the schematic format is little endian.
use flate2::{Decompress, FlushDecompress, Status};
use std::fmt;
use thiserror::Error;

pub mod frames;
pub mod map;
pub mod schematic;

/// cursor over a byte slice. every read either succeeds completely or fails with [`ReadError::Underflow`].
pub struct DataRead<'d> {
    pub(crate) data: &'d [u8],
    /// how many bytes have been consumed so far
    pub read: usize,
}

impl fmt::Debug for DataRead<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataRead@{} (+{} left)", self.read, self.data.len())
    }
}

macro_rules! make_read {
    ($name:ident, $type:ty) => {
        pub fn $name(&mut self) -> Result<$type, ReadError> {
            const LEN: usize = std::mem::size_of::<$type>();
            let output = self.readN::<LEN>()?;
            Ok(<$type>::from_le_bytes(output))
        }
    };
}

impl<'d> DataRead<'d> {
    #[must_use]
    pub const fn new(data: &'d [u8]) -> Self {
        Self { data, read: 0 }
    }

    /// bytes left
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len()
    }

    /// offset from the start of the buffer
    #[must_use]
    pub const fn position(&self) -> usize {
        self.read
    }

    const fn underflow(&self, need: usize) -> ReadError {
        ReadError::Underflow {
            need,
            have: self.data.len(),
            at: self.read,
        }
    }

    pub fn read_bool(&mut self) -> Result<bool, ReadError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u8(&mut self) -> Result<u8, ReadError> {
        let [b] = self.readN::<1>()?;
        Ok(b)
    }

    pub fn read_i8(&mut self) -> Result<i8, ReadError> {
        Ok(self.read_u8()? as i8)
    }

    make_read!(read_u16, u16);
    make_read!(read_i16, i16);
    make_read!(read_u32, u32);
    make_read!(read_i32, i32);
    make_read!(read_u64, u64);

    #[allow(non_snake_case)]
    pub fn readN<const N: usize>(&mut self) -> Result<[u8; N], ReadError> {
        let Some((head, rest)) = self.data.split_first_chunk::<N>() else {
            return Err(self.underflow(N));
        };
        self.data = rest;
        self.read += N;
        Ok(*head)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'d [u8], ReadError> {
        if self.data.len() < len {
            return Err(self.underflow(len));
        }
        let (head, rest) = self.data.split_at(len);
        self.data = rest;
        self.read += len;
        Ok(head)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), ReadError> {
        self.read_bytes(len).map(|_| ())
    }

    /// read a utf8 string of `len` bytes, or prefixed by a length byte if `None`.
    /// ```
    /// # use terramap::data::DataRead;
    /// let mut r = DataRead::new(b"\x05hello");
    /// assert_eq!(r.read_string(None).unwrap(), "hello");
    /// ```
    pub fn read_string(&mut self, len: Option<usize>) -> Result<&'d str, ReadError> {
        let len = match len {
            Some(n) => n,
            None => self.read_u8()? as usize,
        };
        Ok(std::str::from_utf8(self.read_bytes(len)?)?)
    }

    /// read `len` booleans packed 8 to a byte (bit `i` of the array is `1 << (i % 8)`),
    /// prefixed by a [`u16`] length if `None`.
    pub fn read_bit_array(&mut self, len: Option<usize>) -> Result<Vec<bool>, ReadError> {
        let len = match len {
            Some(n) => n,
            None => self.read_u16()? as usize,
        };
        let bytes = self.read_bytes(len.div_ceil(8))?;
        Ok((0..len).map(|i| bytes[i / 8] & (1 << (i % 8)) != 0).collect())
    }

    /// inflate everything that is left (raw deflate, no zlib header).
    /// the cursor is exhausted afterwards.
    pub fn deflate(&mut self) -> Result<Vec<u8>, DecompressError> {
        let mut dec = Decompress::new(false);
        let mut raw = Vec::with_capacity(self.data.len().saturating_mul(4).max(1024));
        loop {
            if raw.len() == raw.capacity() {
                raw.reserve(raw.capacity());
            }
            let (din, dout) = (dec.total_in(), dec.total_out());
            let input = &self.data[din as usize..];
            match dec.decompress_vec(input, &mut raw, FlushDecompress::None)? {
                Status::StreamEnd => break,
                Status::Ok | Status::BufError => {
                    let stalled = dec.total_in() == din && dec.total_out() == dout;
                    if stalled && raw.len() < raw.capacity() {
                        return Err(DecompressError::Truncated {
                            at: self.read + dec.total_in() as usize,
                        });
                    }
                }
            }
        }
        self.read += self.data.len();
        self.data = &[];
        Ok(raw)
    }
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("buffer underflow at {at} (expected {need} bytes but got {have})")]
    Underflow { need: usize, have: usize, at: usize },
    #[error("malformed utf8 in string")]
    Utf8(#[from] std::str::Utf8Error),
}

#[derive(Debug, Error)]
pub enum DecompressError {
    #[error("zlib decompression failed")]
    Decompress(#[from] flate2::DecompressError),
    #[error("deflate stream ended early (at {at})")]
    Truncated { at: usize },
}

/// something that can be read out of a byte stream
pub trait Serializable: Sized {
    type ReadError;
    fn deserialize(buff: &mut DataRead<'_>) -> Result<Self, Self::ReadError>;
}

/// growable output buffer, mirror of [`DataRead`]
#[derive(Default, Debug)]
pub struct DataWrite {
    data: Vec<u8>,
}

impl DataWrite {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    #[must_use]
    pub fn with_capacity(n: usize) -> Self {
        Self {
            data: Vec::with_capacity(n),
        }
    }

    // grow by doubling
    fn ensure(&mut self, n: usize) {
        let need = self.data.len() + n;
        if need > self.data.capacity() {
            let grown = (self.data.capacity() * 2).max(need);
            self.data.reserve_exact(grown - self.data.len());
        }
    }

    pub fn write_bytes(&mut self, b: &[u8]) {
        self.ensure(b.len());
        self.data.extend_from_slice(b);
    }

    pub fn write_u8(&mut self, b: u8) {
        self.write_bytes(&[b]);
    }

    pub fn write_i8(&mut self, b: i8) {
        self.write_u8(b as u8);
    }

    pub fn write_bool(&mut self, b: bool) {
        self.write_u8(u8::from(b));
    }

    pub fn write_u16(&mut self, v: u16) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_i16(&mut self, v: i16) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write_bytes(&v.to_le_bytes());
    }

    /// utf8 string, with a length byte if `with_len`.
    /// strings are truncated to 255 bytes when prefixed.
    pub fn write_string(&mut self, s: &str, with_len: bool) {
        let mut b = s.as_bytes();
        if with_len {
            let mut n = b.len().min(u8::MAX as usize);
            while !s.is_char_boundary(n) {
                n -= 1;
            }
            b = &b[..n];
            self.write_u8(n as u8);
        }
        self.write_bytes(b);
    }

    /// booleans packed 8 to a byte, see [`DataRead::read_bit_array`]
    pub fn write_bit_array(&mut self, values: &[bool], with_len: bool) {
        if with_len {
            self.write_u16(values.len() as u16);
        }
        for chunk in values.chunks(8) {
            let byte = chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, &b)| acc | (u8::from(b) << i));
            self.write_u8(byte);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// drop the spare capacity.
    pub fn trim(&mut self) {
        self.data.shrink_to_fit();
    }

    #[must_use]
    pub fn get_data(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn into_inner(mut self) -> Vec<u8> {
        self.trim();
        self.data
    }
}

#[test]
fn read() {
    let mut read = DataRead::new("thé q".as_bytes());
    assert_eq!(read.read_bool().unwrap(), true);
    assert_eq!(read.read_u8().unwrap(), 104);
    assert_eq!(read.read_u16().unwrap(), 0xa9c3);
    assert_eq!(read.read_string(Some(2)).unwrap(), " q");
    assert!(matches!(
        read.read_u8(),
        Err(ReadError::Underflow {
            need: 1,
            have: 0,
            at: 6
        })
    ));
}

#[test]
fn underflow_consumes_nothing() {
    let mut read = DataRead::new(&[1, 2, 3]);
    assert!(read.read_u32().is_err());
    assert_eq!(read.position(), 0);
    assert_eq!(read.read_u16().unwrap(), 0x0201);
    assert!(read.read_u64().is_err());
    assert_eq!(read.remaining(), 1);
}

#[test]
fn ints_round_trip() {
    let mut w = DataWrite::default();
    for v in [0u16, 1, 0x7fff, 0x8000, 0xabcd, u16::MAX] {
        w.write_u16(v);
    }
    for v in [0u32, 1, 0x8000_0000, 0xdead_beef, u32::MAX] {
        w.write_u32(v);
    }
    w.write_u16(0x8000);
    w.write_u16(0xffff);
    let data = w.into_inner();
    let mut r = DataRead::new(&data);
    for v in [0u16, 1, 0x7fff, 0x8000, 0xabcd, u16::MAX] {
        assert_eq!(r.read_u16().unwrap(), v);
    }
    for v in [0u32, 1, 0x8000_0000, 0xdead_beef, u32::MAX] {
        assert_eq!(r.read_u32().unwrap(), v);
    }
    // sign extension
    assert_eq!(r.read_i16().unwrap(), -32768);
    assert_eq!(r.read_i16().unwrap(), -1);
    assert_eq!(r.remaining(), 0);
}

#[test]
fn bit_arrays() {
    for n in 0..=40usize {
        let bits = (0..n).map(|i| (i * 7 + n) % 3 == 0).collect::<Vec<_>>();
        let mut w = DataWrite::default();
        w.write_bit_array(&bits, false);
        assert_eq!(w.len(), n.div_ceil(8));
        let data = w.into_inner();
        assert_eq!(DataRead::new(&data).read_bit_array(Some(n)).unwrap(), bits);
    }
    let mut w = DataWrite::default();
    w.write_bit_array(&[true, false, false, true, true, false, false, false, false, true], true);
    assert_eq!(w.get_data(), [10, 0, 0b0001_1001, 0b10]);
    let mut r = DataRead::new(w.get_data());
    assert_eq!(
        r.read_bit_array(None).unwrap(),
        [true, false, false, true, true, false, false, false, false, true]
    );

    // lengths past i16::MAX keep their high bit
    let long = vec![true; 40_000];
    let mut w = DataWrite::default();
    w.write_bit_array(&long, true);
    let data = w.into_inner();
    let mut r = DataRead::new(&data);
    assert_eq!(r.read_bit_array(None).unwrap(), long);
    assert_eq!(r.remaining(), 0);
}

#[test]
fn strings() {
    let mut w = DataWrite::new();
    w.write_string("relogic", false);
    w.write_string("world é", true);
    let data = w.into_inner();
    let mut r = DataRead::new(&data);
    assert_eq!(r.read_string(Some(7)).unwrap(), "relogic");
    assert_eq!(r.read_string(None).unwrap(), "world é");
    assert!(matches!(
        DataRead::new(&[2, 0xff, 0xfe]).read_string(None),
        Err(ReadError::Utf8(_))
    ));
}

#[test]
fn inflate() {
    use flate2::{Compression, write::DeflateEncoder};
    use std::io::Write;
    let payload = (0..5000u32).map(|i| (i % 251) as u8).collect::<Vec<_>>();
    let mut e = DeflateEncoder::new(vec![9, 9], Compression::default());
    e.write_all(&payload).unwrap();
    let data = e.finish().unwrap();
    let mut r = DataRead::new(&data);
    r.skip(2).unwrap();
    assert_eq!(r.deflate().unwrap(), payload);
    assert_eq!(r.remaining(), 0);

    // inflates to far more than the first guess at the output size
    let zeros = vec![0u8; 1 << 20];
    let mut e = DeflateEncoder::new(vec![], Compression::best());
    e.write_all(&zeros).unwrap();
    let data = e.finish().unwrap();
    assert!(data.len() * 4 < zeros.len() / 64);
    assert_eq!(DataRead::new(&data).deflate().unwrap(), zeros);

    let mut r = DataRead::new(&data[2..data.len() / 2]);
    assert!(r.deflate().is_err());
}
