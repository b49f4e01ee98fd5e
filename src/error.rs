//! Error types shared by the grammar builder and the bit codecs.
//!
//! A failed parse is not an error: the parser returns `None` and the scorer
//! disqualifies the hypothesis. Errors here describe broken inputs, such as a
//! grammar that references undeclared states or a bitstring that does not
//! match the enumeration it is decoded with.

/// Result type with [`Error`] as the default error.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level error for the crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A bitstring could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// An encoder was asked for a symbol outside its enumeration.
    #[error("{context}: symbol {symbol} is not part of the enumeration")]
    UnknownSymbol {
        context: &'static str,
        symbol: String,
    },

    /// The data-by-grammar encoder met a datum with no parse.
    #[error("no parse for datum {datum:?}")]
    NoParse { datum: String },

    /// Grammar or lexicon construction was rejected.
    #[error("invalid grammar: {0}")]
    InvalidGrammar(String),
}

/// Failure while reading an encoded stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The stream holds no `1` bit, so the width header is absent.
    #[error("missing width header")]
    MissingHeader,

    /// The header announces a width that differs from the enumeration's.
    #[error("header announces width {found}, enumeration uses {expected}")]
    WidthMismatch { expected: u32, found: u32 },

    /// The stream ended before the block was closed.
    #[error("stream truncated: needed {needed} bits, {remaining} left")]
    Truncated { needed: u32, remaining: usize },

    /// A code that no symbol of the enumeration carries.
    #[error("code {code} is not assigned")]
    UnknownCode { code: u64 },

    /// A data-by-grammar index past the end of its table row.
    #[error("index {index} out of range for a list of {len}")]
    IndexOutOfRange { index: u64, len: usize },

    /// A block whose structure is invalid, e.g. a terminator in origin position.
    #[error("malformed block at bit {position}")]
    MalformedBlock { position: usize },

    /// Zero-width choices cycle without ever reaching the final state.
    #[error("decoding stalled in state {state}")]
    Stalled { state: String },
}

impl Error {
    pub(crate) fn unknown_symbol(context: &'static str, symbol: impl std::fmt::Display) -> Self {
        Error::UnknownSymbol {
            context,
            symbol: symbol.to_string(),
        }
    }
}
