use super::{expect_header, framed_len, push_symbol, push_terminator, read_symbol, Codec};
use crate::bits::{BitReader, BitString};
use crate::enumeration::{Decoded, SymbolEnumeration};
use crate::error::{DecodeError, Result};
use crate::hmm::{EmissionTable, Grammar, State};
use crate::lexicon::LexicalComponent;
use crate::segment::Segment;
use std::fmt;

/// One symbol of the combined state-and-entry alphabet.
///
/// States and entries share one enumeration so a single terminator code
/// closes every block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EmissionSymbol {
    State(State),
    Segment(Segment),
}

impl fmt::Display for EmissionSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmissionSymbol::State(state) => write!(f, "state {state}"),
            EmissionSymbol::Segment(segment) => write!(f, "entry {segment}"),
        }
    }
}

/// Whether the emission block ends with its own terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmissionFraming {
    /// A closing terminator follows the last row, like the other table codecs.
    #[default]
    Terminated,
    /// No closing terminator; the block runs to the end of the stream.
    Open,
}

/// Emission table codec over states plus lexicon entries.
///
/// Layout: `0^w 1`, then one block per emitting state (state code, entry
/// codes, terminator), then a closing terminator under
/// [`EmissionFraming::Terminated`].
#[derive(Debug, Clone)]
pub struct EmissionCodec {
    symbols: SymbolEnumeration<EmissionSymbol>,
    framing: EmissionFraming,
}

impl EmissionCodec {
    pub fn new<I, J>(states: I, entries: J, framing: EmissionFraming) -> Self
    where
        I: IntoIterator<Item = State>,
        J: IntoIterator<Item = Segment>,
    {
        let symbols = states
            .into_iter()
            .map(EmissionSymbol::State)
            .chain(entries.into_iter().map(EmissionSymbol::Segment));
        Self {
            symbols: SymbolEnumeration::new(symbols),
            framing,
        }
    }

    /// Codec over every state of `grammar` and every entry of `lexicon`.
    pub fn for_grammar<G, L>(grammar: &G, lexicon: &L, framing: EmissionFraming) -> Self
    where
        G: Grammar + ?Sized,
        L: LexicalComponent + ?Sized,
    {
        Self::new(
            grammar.get_states(),
            lexicon.entries().iter().cloned(),
            framing,
        )
    }

    pub fn width(&self) -> u32 {
        self.symbols.width()
    }

    pub fn framing(&self) -> EmissionFraming {
        self.framing
    }
}

impl Codec for EmissionCodec {
    type Item = EmissionTable;

    fn encode_into(&self, table: &EmissionTable, bits: &mut BitString) -> Result<()> {
        bits.push_header(self.width());
        for (state, entries) in table.rows() {
            push_symbol(
                bits,
                &self.symbols,
                &EmissionSymbol::State(state.clone()),
                "emissions",
            )?;
            for entry in entries {
                push_symbol(
                    bits,
                    &self.symbols,
                    &EmissionSymbol::Segment(entry.clone()),
                    "emissions",
                )?;
            }
            push_terminator(bits, &self.symbols);
        }
        if self.framing == EmissionFraming::Terminated {
            push_terminator(bits, &self.symbols);
        }
        Ok(())
    }

    fn decode_from(&self, reader: &mut BitReader<'_>) -> Result<EmissionTable> {
        expect_header(reader, self.width())?;

        let mut rows = Vec::new();
        loop {
            if self.framing == EmissionFraming::Open && reader.is_exhausted() {
                break;
            }

            let position = reader.position();
            let state = match read_symbol(reader, &self.symbols)? {
                Decoded::Terminator if self.framing == EmissionFraming::Terminated => break,
                Decoded::Symbol(EmissionSymbol::State(state)) => state.clone(),
                _ => return Err(DecodeError::MalformedBlock { position }.into()),
            };

            let mut entries = Vec::new();
            loop {
                let position = reader.position();
                match read_symbol(reader, &self.symbols)? {
                    Decoded::Terminator => break,
                    Decoded::Symbol(EmissionSymbol::Segment(entry)) => entries.push(entry.clone()),
                    Decoded::Symbol(EmissionSymbol::State(_)) => {
                        return Err(DecodeError::MalformedBlock { position }.into())
                    }
                }
            }
            if entries.is_empty() {
                return Err(DecodeError::MalformedBlock { position }.into());
            }
            rows.push((state, entries));
        }

        Ok(EmissionTable::new(rows))
    }

    fn encoded_len(&self, table: &EmissionTable) -> u64 {
        let closing = match self.framing {
            EmissionFraming::Terminated => 1,
            EmissionFraming::Open => 0,
        };
        framed_len(self.width(), table.item_count() + 2 * table.len() + closing)
    }
}
