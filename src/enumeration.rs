use crate::bits::{BitReader, BitString};
use crate::error::DecodeError;
use ahash::AHashMap as HashMap;
use std::hash::Hash;

/// Number of bits needed to tell `count` alternatives apart.
///
/// Zero for zero or one alternative.
#[inline]
fn ceil_log2(count: usize) -> u32 {
    if count <= 1 {
        0
    } else {
        usize::BITS - (count - 1).leading_zeros()
    }
}

/// Code width for a set of `symbols` symbols plus the terminator.
///
/// Never less than one bit, so even a singleton set can spell its terminator.
pub fn symbol_width(symbols: usize) -> u32 {
    ceil_log2(symbols + 1).max(1)
}

/// Width of an index into a list of `len` items, as used by data-by-grammar
/// coding. Singleton lists cost nothing.
pub fn index_width(len: usize) -> u32 {
    ceil_log2(len)
}

/// Index code of `item` within `list`: `(index, width)`.
///
/// Returns `None` if the item is not in the list.
pub fn index_code<T: PartialEq>(list: &[T], item: &T) -> Option<(u64, u32)> {
    let index = list.iter().position(|candidate| candidate == item)?;
    Some((index as u64, index_width(list.len())))
}

/// Reads an index code for `list` and returns the item it names.
///
/// The inverse of [`index_code`]: consumes `index_width(list.len())` bits.
pub fn item_by_code<'a, T>(reader: &mut BitReader<'_>, list: &'a [T]) -> Result<&'a T, DecodeError> {
    let index = reader.read_code(index_width(list.len()))?;
    usize::try_from(index)
        .ok()
        .and_then(|i| list.get(i))
        .ok_or(DecodeError::IndexOutOfRange {
            index,
            len: list.len(),
        })
}

/// Result of looking a code up in an enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded<'a, T> {
    /// An ordinary member of the enumerated set.
    Symbol(&'a T),
    /// The synthetic end-of-block symbol.
    Terminator,
}

/// Fixed-width binary codes for a sorted symbol set plus a terminator.
///
/// Symbols are sorted and deduplicated; the first one gets code 0 and the
/// terminator gets the last code, `len()`. Built per encode or decode call and
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct SymbolEnumeration<T> {
    symbols: Vec<T>,
    codes: HashMap<T, u64>,
    width: u32,
}

impl<T: Ord + Hash + Clone> SymbolEnumeration<T> {
    /// Enumerates the given symbols. Duplicates collapse into one code.
    pub fn new<I: IntoIterator<Item = T>>(symbols: I) -> Self {
        let mut symbols: Vec<T> = symbols.into_iter().collect();
        symbols.sort();
        symbols.dedup();

        let codes = symbols
            .iter()
            .enumerate()
            .map(|(code, symbol)| (symbol.clone(), code as u64))
            .collect();
        let width = symbol_width(symbols.len());

        Self {
            symbols,
            codes,
            width,
        }
    }

    /// Bits per code.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of enumerated symbols, not counting the terminator.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// The enumerated symbols in code order.
    pub fn symbols(&self) -> &[T] {
        &self.symbols
    }

    /// Code of the terminator, always the largest one.
    pub fn terminator(&self) -> u64 {
        self.symbols.len() as u64
    }

    pub fn code_of(&self, symbol: &T) -> Option<u64> {
        self.codes.get(symbol).copied()
    }

    pub fn contains(&self, symbol: &T) -> bool {
        self.codes.contains_key(symbol)
    }

    /// Inverse lookup. `None` for codes past the terminator.
    pub fn symbol_of(&self, code: u64) -> Option<Decoded<'_, T>> {
        match usize::try_from(code).ok()? {
            index if index < self.symbols.len() => Some(Decoded::Symbol(&self.symbols[index])),
            index if index == self.symbols.len() => Some(Decoded::Terminator),
            _ => None,
        }
    }

    /// The code of `symbol` spelled out as bits.
    pub fn code_bits(&self, symbol: &T) -> Option<BitString> {
        let code = self.code_of(symbol)?;
        let mut bits = BitString::new();
        bits.push_code(code, self.width);
        Some(bits)
    }

    /// The terminator spelled out as bits.
    pub fn terminator_bits(&self) -> BitString {
        let mut bits = BitString::new();
        bits.push_code(self.terminator(), self.width);
        bits
    }
}
