use crate::error::DecodeError;
use bitvec::prelude::*;
use std::fmt;
use std::str::FromStr;

/// An owned, append-only bit sequence, most significant bit first.
///
/// Every codec in this crate produces one of these. Fixed-width codes are
/// pushed with [`push_code`](BitString::push_code) and read back in the same
/// order through a [`BitReader`].
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct BitString {
    bits: BitVec<u8, Msb0>,
}

impl BitString {
    /// Creates an empty bitstring.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps raw bytes; every bit of every byte becomes part of the stream.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bits: BitVec::from_slice(bytes),
        }
    }

    /// Number of bits.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Appends the low `width` bits of `code`, most significant first.
    ///
    /// A zero width appends nothing, which is how singleton choices are coded.
    pub fn push_code(&mut self, code: u64, width: u32) {
        debug_assert!(width <= u64::BITS, "code width {width} exceeds 64 bits");
        debug_assert!(
            width == u64::BITS || code >> width == 0,
            "code {code} does not fit in {width} bits"
        );
        for shift in (0..width).rev() {
            self.bits.push((code >> shift) & 1 == 1);
        }
    }

    /// Appends the self-describing width header: `width` zeros then a one.
    pub fn push_header(&mut self, width: u32) {
        for _ in 0..width {
            self.bits.push(false);
        }
        self.bits.push(true);
    }

    /// Appends every bit of `other`.
    pub fn append(&mut self, other: &BitString) {
        self.bits.extend_from_bitslice(&other.bits);
    }

    /// Starts reading from the first bit.
    pub fn reader(&self) -> BitReader<'_> {
        BitReader::new(&self.bits)
    }

    /// The underlying bits.
    pub fn as_bitslice(&self) -> &BitSlice<u8, Msb0> {
        &self.bits
    }

    /// Packs the bits into bytes, zero-padding the last one.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bits = self.bits.clone();
        bits.set_uninitialized(false);
        bits.into_vec()
    }
}

impl FromIterator<bool> for BitString {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self {
            bits: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.bits.iter().by_vals() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitString({self})")
    }
}

/// Parses a string of `0` and `1` characters.
impl FromStr for BitString {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .enumerate()
            .map(|(position, c)| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                _ => Err(DecodeError::MalformedBlock { position }),
            })
            .collect()
    }
}

/// Left-to-right cursor over a bit slice.
///
/// Every read is bounds-checked against the remaining bits, so decoders
/// terminate with [`DecodeError::Truncated`] instead of running off the end.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bits: &'a BitSlice<u8, Msb0>,
    position: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bits: &'a BitSlice<u8, Msb0>) -> Self {
        Self { bits, position: 0 }
    }

    /// Index of the next unread bit.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of unread bits.
    pub fn remaining(&self) -> usize {
        self.bits.len() - self.position
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Reads a `width`-bit code. A zero width reads nothing and yields 0.
    pub fn read_code(&mut self, width: u32) -> Result<u64, DecodeError> {
        let needed = width as usize;
        if needed > self.remaining() {
            return Err(DecodeError::Truncated {
                needed: width,
                remaining: self.remaining(),
            });
        }

        let code = self.bits[self.position..self.position + needed]
            .iter()
            .by_vals()
            .fold(0u64, |acc, bit| (acc << 1) | u64::from(bit));
        self.position += needed;
        Ok(code)
    }

    /// Reads a width header, returning the number of zeros before the first one.
    pub fn read_header(&mut self) -> Result<u32, DecodeError> {
        let rest = &self.bits[self.position..];
        let zeros = rest.first_one().ok_or(DecodeError::MissingHeader)?;
        self.position += zeros + 1;
        u32::try_from(zeros).map_err(|_| DecodeError::MissingHeader)
    }
}
