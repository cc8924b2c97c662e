//! Canonical binary encoding of parameters, keys and key shares
//!
//! # Layout
//!
//! Every top-level encoding starts with a one-byte type tag and a one-byte
//! format version, followed by the body of the type:
//!
//! ```text
//! [tag: u8][version: u8][body...]
//! ```
//!
//! - Integers are little-endian.
//! - Ring and LWE elements are bit-packed at the bit width of their modulus,
//!   least significant bit first, and every packed block is padded with zero
//!   bits to a byte boundary.
//! - Vector lengths come either from an explicit `u32` field or from a
//!   [`FhewParam`](crate::FhewParam) embedded earlier in the same encoding.
//!
//! Decoding accepts exactly one byte string per value. Out-of-range
//! coefficients, nonzero padding bits, unknown tags and trailing bytes are
//! all rejected, so `to_bytes(from_bytes(b)) == b` for every accepted `b`.

mod packing;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{malformed, FhewError, Result};
use crate::math::{ModQ, Poly};
use crate::params::{validate_modulus, Modulus};

pub use packing::{pack_bits, packed_len, unpack_bits};

/// Version byte written after every type tag.
pub const FORMAT_VERSION: u8 = 1;

/// Type tags of top-level encodings.
pub mod tag {
    pub const PARAM: u8 = 0x01;
    pub const CRS: u8 = 0x02;
    pub const RLWE_SECRET_KEY: u8 = 0x03;
    pub const LWE_SECRET_KEY: u8 = 0x04;
    pub const RLWE_PUBLIC_KEY: u8 = 0x05;
    pub const RLWE_PUBLIC_KEY_SHARE: u8 = 0x06;
    pub const BOOTSTRAPPING_KEY_SHARE: u8 = 0x07;
}

/// Types with a canonical byte encoding.
pub trait Codec: Sized {
    /// Tag identifying the type in its top-level encoding.
    const TAG: u8;

    /// Write the body without tag or version.
    fn encode_body(&self, writer: &mut ByteWriter);

    /// Read a body written by [`Codec::encode_body`].
    fn decode_body(reader: &mut ByteReader<'_>) -> Result<Self>;

    /// Canonical encoding of `self`.
    fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        writer.put_u8(Self::TAG);
        writer.put_u8(FORMAT_VERSION);
        self.encode_body(&mut writer);
        writer.into_bytes()
    }

    /// Decode a value from its canonical encoding.
    ///
    /// # Errors
    ///
    /// - [`FhewError::TruncatedInput`] when `bytes` ends early
    /// - [`FhewError::MalformedEncoding`] for any other non-canonical input
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let tag = reader.get_u8()?;
        if tag != Self::TAG {
            return Err(malformed!(
                "type tag {:#04x}, expected {:#04x}",
                tag,
                Self::TAG
            ));
        }
        let version = reader.get_u8()?;
        if version != FORMAT_VERSION {
            return Err(malformed!("unsupported format version {}", version));
        }
        let value = Self::decode_body(&mut reader)?;
        reader.finish()?;
        Ok(value)
    }
}

/// Append-only little-endian writer.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn put_u32(&mut self, v: u32) {
        let mut tmp = [0u8; 4];
        LittleEndian::write_u32(&mut tmp, v);
        self.buf.extend_from_slice(&tmp);
    }

    pub fn put_u64(&mut self, v: u64) {
        let mut tmp = [0u8; 8];
        LittleEndian::write_u64(&mut tmp, v);
        self.buf.extend_from_slice(&tmp);
    }

    pub fn put_i32(&mut self, v: i32) {
        let mut tmp = [0u8; 4];
        LittleEndian::write_i32(&mut tmp, v);
        self.buf.extend_from_slice(&tmp);
    }

    pub fn put_f64(&mut self, v: f64) {
        let mut tmp = [0u8; 8];
        LittleEndian::write_f64(&mut tmp, v);
        self.buf.extend_from_slice(&tmp);
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Modulus as a kind byte followed by its value.
    pub fn put_modulus(&mut self, modulus: Modulus) {
        match modulus {
            Modulus::PowerOfTwo(bits) => {
                self.put_u8(0);
                self.put_u8(bits as u8);
            }
            Modulus::Prime(q) => {
                self.put_u8(1);
                self.put_u64(q);
            }
        }
    }

    /// Bit-pack residues of `modulus`.
    pub fn put_packed(&mut self, values: &[u64], modulus: ModQ) {
        pack_bits(values, modulus.bits(), &mut self.buf);
    }

    /// Bit-pack the coefficients of a polynomial.
    pub fn put_poly(&mut self, poly: &Poly) {
        self.put_packed(poly.coeffs(), poly.modulus());
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
}

/// Cursor over an encoded byte string.
#[derive(Debug)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Consume exactly `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(FhewError::TruncatedInput {
                needed: n,
                remaining,
            });
        }
        let out = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn get_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn get_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn get_u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    pub fn get_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    pub fn get_f64(&mut self) -> Result<f64> {
        Ok(LittleEndian::read_f64(self.take(8)?))
    }

    pub fn get_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read a modulus written by [`ByteWriter::put_modulus`] and validate it.
    pub fn get_modulus(&mut self) -> Result<Modulus> {
        let modulus = match self.get_u8()? {
            0 => Modulus::PowerOfTwo(self.get_u8()? as u32),
            1 => Modulus::Prime(self.get_u64()?),
            kind => return Err(malformed!("unknown modulus kind {}", kind)),
        };
        validate_modulus("modulus", modulus).map_err(|err| malformed!("{}", err))?;
        Ok(modulus)
    }

    /// Read `count` bit-packed residues of `modulus`.
    pub fn get_packed(&mut self, count: usize, modulus: ModQ) -> Result<Vec<u64>> {
        let width = modulus.bits();
        let bytes = self.take(packed_len(count, width))?;
        let values = unpack_bits(bytes, count, width)?;
        if let Some(v) = values.iter().find(|&&v| !modulus.contains(v)) {
            return Err(malformed!("value {} is not reduced modulo {:?}", v, modulus.modulus()));
        }
        Ok(values)
    }

    /// Read a bit-packed polynomial of dimension `dim`.
    pub fn get_poly(&mut self, dim: usize, modulus: ModQ) -> Result<Poly> {
        Ok(Poly::from_coeffs(self.get_packed(dim, modulus)?, modulus))
    }

    /// Read a `u32` length field and check it against `1..=max`.
    pub fn get_len(&mut self, what: &str, max: usize) -> Result<usize> {
        let len = self.get_u32()? as usize;
        if len == 0 || len > max {
            return Err(malformed!("{} {} outside 1..={}", what, len, max));
        }
        Ok(len)
    }

    /// Fail unless every byte has been consumed.
    pub fn finish(&self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(malformed!("{} trailing bytes", n)),
        }
    }
}
