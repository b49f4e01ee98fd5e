use crate::bits::{BitReader, BitString};
use crate::enumeration::{index_code, index_width, item_by_code};
use crate::error::{DecodeError, Error, Result};
use crate::hmm::{Grammar, State};
use crate::lexicon::LexicalComponent;
use crate::viterbi::{viterbi, ParseResult};

/// Data-by-grammar codec.
///
/// Each datum is coded along its best parse: for every step, the index of the
/// chosen successor in the current state's successor list, then (unless the
/// successor is final) the index of the emitted entry in that state's emission
/// list. A list of `n` choices costs `ceil(log2 n)` bits, so forced choices
/// are free. There is no header and no separator between data.
pub struct DataCodec<'g, G: ?Sized, L: ?Sized> {
    grammar: &'g G,
    lexicon: &'g L,
}

impl<'g, G, L> DataCodec<'g, G, L>
where
    G: Grammar + ?Sized,
    L: LexicalComponent + ?Sized,
{
    pub fn new(grammar: &'g G, lexicon: &'g L) -> Self {
        Self { grammar, lexicon }
    }

    /// Parses and encodes every datum, in order.
    pub fn encode<S: AsRef<str>>(&self, data: &[S]) -> Result<BitString> {
        let mut bits = BitString::new();
        for datum in data {
            let datum = datum.as_ref();
            let parse = viterbi(self.grammar, self.lexicon, datum).ok_or_else(|| {
                Error::NoParse {
                    datum: datum.to_owned(),
                }
            })?;
            self.encode_parse_into(&parse, &mut bits)?;
        }
        Ok(bits)
    }

    /// Encodes already computed parses, in order.
    pub fn encode_parses(&self, parses: &[ParseResult]) -> Result<BitString> {
        let mut bits = BitString::new();
        for parse in parses {
            self.encode_parse_into(parse, &mut bits)?;
        }
        Ok(bits)
    }

    pub fn encode_parse_into(&self, parse: &ParseResult, bits: &mut BitString) -> Result<()> {
        let final_state = self.grammar.final_state();
        for (step, pair) in parse.states.windows(2).enumerate() {
            let (from, to) = (&pair[0], &pair[1]);
            let (index, width) = index_code(self.grammar.outgoing_states(from), to)
                .ok_or_else(|| Error::unknown_symbol("data transitions", to))?;
            bits.push_code(index, width);

            if to == final_state {
                break;
            }
            let segment = parse
                .segments
                .get(step)
                .ok_or_else(|| Error::unknown_symbol("data emissions", to))?;
            let (index, width) = index_code(self.grammar.emissions(to), segment)
                .ok_or_else(|| Error::unknown_symbol("data emissions", segment))?;
            bits.push_code(index, width);
        }
        Ok(())
    }

    /// Exact cost of a parse, in bits.
    pub fn parse_len(&self, parse: &ParseResult) -> u64 {
        let final_state = self.grammar.final_state();
        parse
            .states
            .windows(2)
            .map(|pair| {
                let (from, to) = (&pair[0], &pair[1]);
                let transition = index_width(self.grammar.outgoing_states(from).len());
                let emission = if to == final_state {
                    0
                } else {
                    index_width(self.grammar.emissions(to).len())
                };
                u64::from(transition + emission)
            })
            .sum()
    }

    /// Cost of a single datum, or `None` if it has no parse.
    pub fn datum_len(&self, datum: &str) -> Option<u64> {
        viterbi(self.grammar, self.lexicon, datum).map(|parse| self.parse_len(&parse))
    }

    /// Cost of the whole data set, or `None` if any datum has no parse.
    pub fn encoded_len<S: AsRef<str>>(&self, data: &[S]) -> Option<u64> {
        data.iter().map(|datum| self.datum_len(datum.as_ref())).sum()
    }

    /// Decodes data until the stream is exhausted.
    pub fn decode(&self, bits: &BitString) -> Result<Vec<String>> {
        self.decode_from(&mut bits.reader())
    }

    /// Decodes data from the reader's position to the end of its stream.
    pub fn decode_from(&self, reader: &mut BitReader<'_>) -> Result<Vec<String>> {
        let start_bits = reader.position();
        let mut data = Vec::new();
        while !reader.is_exhausted() {
            let start = reader.position();
            let datum = self.decode_datum(reader)?;
            if reader.position() == start {
                // zero-cost data cannot be told apart from one another
                return Err(DecodeError::Stalled {
                    state: self.grammar.initial_state().to_string(),
                }
                .into());
            }
            data.push(datum);
        }
        log::debug!(
            "decoded {} data from {} bits",
            data.len(),
            reader.position() - start_bits
        );
        Ok(data)
    }

    /// Walks the grammar from the initial to the final state, reading one
    /// successor index and one emission index per step.
    pub fn decode_datum(&self, reader: &mut BitReader<'_>) -> Result<String> {
        let final_state = self.grammar.final_state();
        let step_limit = self.grammar.inner_states().len() + 1;
        let stalled = |state: &State| DecodeError::Stalled {
            state: state.to_string(),
        };

        let mut datum = String::new();
        let mut state = self.grammar.initial_state();
        let mut free_steps = 0;
        loop {
            let before = reader.position();

            let successors = self.grammar.outgoing_states(state);
            if successors.is_empty() {
                return Err(stalled(state).into());
            }
            state = item_by_code(reader, successors)?;
            if state == final_state {
                return Ok(datum);
            }

            let emissions = self.grammar.emissions(state);
            if emissions.is_empty() {
                return Err(stalled(state).into());
            }
            datum.push_str(item_by_code(reader, emissions)?.as_str());

            if reader.position() == before {
                free_steps += 1;
                if free_steps > step_limit {
                    return Err(stalled(state).into());
                }
            } else {
                free_steps = 0;
            }
        }
    }
}
