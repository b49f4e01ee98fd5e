//! Bit-level codecs for lexicons, grammar tables and data-by-grammar.
//!
//! The lexicon, transition and emission codecs share one layout: a `0^w 1`
//! width header, then blocks of fixed-width symbol codes closed by the
//! enumeration's terminator. Each codec also answers the exact encoded length
//! without building the bitstring, which is what MDL scoring uses.
//!
//! The data-by-grammar codec has no header: both sides already know the
//! grammar, so it writes bare list indices.

mod data;
mod emissions;
mod lexicon;
mod transitions;

pub use data::DataCodec;
pub use emissions::{EmissionCodec, EmissionFraming, EmissionSymbol};
pub use lexicon::LexiconCodec;
pub use transitions::TransitionCodec;

use crate::bits::{BitReader, BitString};
use crate::enumeration::{Decoded, SymbolEnumeration};
use crate::error::{DecodeError, Error, Result};
use std::fmt::Display;
use std::hash::Hash;

/// An encode / decode / length-oracle triple for one artifact.
pub trait Codec {
    type Item;

    /// Appends the encoding of `item` to `bits`.
    fn encode_into(&self, item: &Self::Item, bits: &mut BitString) -> Result<()>;

    /// Reads one item, leaving the reader just past its encoding.
    fn decode_from(&self, reader: &mut BitReader<'_>) -> Result<Self::Item>;

    /// Exact number of bits [`encode`](Codec::encode) produces for `item`.
    ///
    /// Assumes `item` only uses symbols of the codec's enumeration.
    fn encoded_len(&self, item: &Self::Item) -> u64;

    fn encode(&self, item: &Self::Item) -> Result<BitString> {
        let mut bits = BitString::new();
        self.encode_into(item, &mut bits)?;
        Ok(bits)
    }

    fn decode(&self, bits: &BitString) -> Result<Self::Item> {
        self.decode_from(&mut bits.reader())
    }
}

/// Reads a width header and checks it against the enumeration.
fn expect_header(reader: &mut BitReader<'_>, expected: u32) -> Result<(), DecodeError> {
    let found = reader.read_header()?;
    if found == expected {
        Ok(())
    } else {
        Err(DecodeError::WidthMismatch { expected, found })
    }
}

fn push_symbol<T>(
    bits: &mut BitString,
    enumeration: &SymbolEnumeration<T>,
    symbol: &T,
    context: &'static str,
) -> Result<()>
where
    T: Ord + Hash + Clone + Display,
{
    let code = enumeration
        .code_of(symbol)
        .ok_or_else(|| Error::unknown_symbol(context, symbol))?;
    bits.push_code(code, enumeration.width());
    Ok(())
}

fn push_terminator<T: Ord + Hash + Clone>(bits: &mut BitString, enumeration: &SymbolEnumeration<T>) {
    bits.push_code(enumeration.terminator(), enumeration.width());
}

fn read_symbol<'e, T: Ord + Hash + Clone>(
    reader: &mut BitReader<'_>,
    enumeration: &'e SymbolEnumeration<T>,
) -> Result<Decoded<'e, T>, DecodeError> {
    let code = reader.read_code(enumeration.width())?;
    enumeration
        .symbol_of(code)
        .ok_or(DecodeError::UnknownCode { code })
}

/// Length of a headed, terminated block layout.
///
/// `symbols` counts every code written after the header, terminators included.
#[inline]
fn framed_len(width: u32, symbols: usize) -> u64 {
    u64::from(width) + 1 + symbols as u64 * u64::from(width)
}
