use super::{expect_header, framed_len, push_symbol, push_terminator, read_symbol, Codec};
use crate::bits::{BitReader, BitString};
use crate::enumeration::{Decoded, SymbolEnumeration};
use crate::error::{DecodeError, Result};
use crate::hmm::{Grammar, State, TransitionTable};

/// Transition table codec over the grammar's states.
///
/// Layout: `0^w 1`, then one block per state with successors (origin code,
/// successor codes, terminator), then a closing terminator.
#[derive(Debug, Clone)]
pub struct TransitionCodec {
    states: SymbolEnumeration<State>,
}

impl TransitionCodec {
    pub fn new<I: IntoIterator<Item = State>>(states: I) -> Self {
        Self {
            states: SymbolEnumeration::new(states),
        }
    }

    pub fn for_grammar<G: Grammar + ?Sized>(grammar: &G) -> Self {
        Self::new(grammar.get_states())
    }

    pub fn width(&self) -> u32 {
        self.states.width()
    }
}

impl Codec for TransitionCodec {
    type Item = TransitionTable;

    fn encode_into(&self, table: &TransitionTable, bits: &mut BitString) -> Result<()> {
        bits.push_header(self.width());
        for (origin, successors) in table.rows() {
            push_symbol(bits, &self.states, origin, "transitions")?;
            for successor in successors {
                push_symbol(bits, &self.states, successor, "transitions")?;
            }
            push_terminator(bits, &self.states);
        }
        push_terminator(bits, &self.states);
        Ok(())
    }

    fn decode_from(&self, reader: &mut BitReader<'_>) -> Result<TransitionTable> {
        expect_header(reader, self.width())?;

        let mut rows = Vec::new();
        loop {
            let position = reader.position();
            let origin = match read_symbol(reader, &self.states)? {
                Decoded::Terminator => break,
                Decoded::Symbol(origin) => origin.clone(),
            };

            let mut successors = Vec::new();
            while let Decoded::Symbol(successor) = read_symbol(reader, &self.states)? {
                successors.push(successor.clone());
            }
            if successors.is_empty() {
                return Err(DecodeError::MalformedBlock { position }.into());
            }
            rows.push((origin, successors));
        }

        Ok(TransitionTable::new(rows))
    }

    fn encoded_len(&self, table: &TransitionTable) -> u64 {
        // origin and terminator per row, plus the closing terminator
        framed_len(self.width(), table.item_count() + 2 * table.len() + 1)
    }
}
