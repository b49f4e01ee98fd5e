//! Minimum description length scoring of grammar + lexicon hypotheses.
//!
//! The cost of a hypothesis is the length of its lexicon, transition table
//! and emission table encodings, plus the data-by-grammar encoding of the
//! corpus. Lower is better. A hypothesis that cannot parse some datum has no
//! finite cost and ranks after every hypothesis that can.

use crate::bits::{BitReader, BitString};
use crate::codec::{Codec, DataCodec, EmissionCodec, LexiconCodec, TransitionCodec};
use crate::config::ScoringConfig;
use crate::error::{Error, Result};
use crate::hmm::{EmissionTable, Grammar, Hmm, State, TransitionTable};
use crate::lexicon::{LexicalComponent, Lexicon};
use crate::segment::Glyph;
use rayon::prelude::*;
use std::cmp::Ordering;

/// Bit lengths of every part of a hypothesis' encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptionLength {
    pub lexicon: u64,
    pub transitions: u64,
    pub emissions: u64,
    /// `None` when some datum has no parse.
    pub data: Option<u64>,
}

impl DescriptionLength {
    /// Transition plus emission length.
    pub fn grammar(&self) -> u64 {
        self.transitions + self.emissions
    }

    /// Length of the hypothesis alone.
    pub fn hypothesis(&self) -> u64 {
        self.lexicon + self.grammar()
    }

    pub fn total(&self) -> Option<u64> {
        self.data.map(|data| self.hypothesis() + data)
    }

    /// Orders by total, treating a missing total as infinitely long.
    pub fn cmp_total(&self, other: &Self) -> Ordering {
        match (self.total(), other.total()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// A candidate grammar with its lexicon and the alphabet its lexicon is
/// spelled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hypothesis {
    grammar: Hmm,
    lexicon: Lexicon,
    alphabet: Vec<Glyph>,
}

impl Hypothesis {
    /// Pairs a grammar with a lexicon; the alphabet is the lexicon's own.
    ///
    /// Fails if the grammar emits an entry the lexicon does not hold.
    pub fn new(grammar: Hmm, lexicon: Lexicon) -> Result<Self> {
        for state in grammar.inner_states() {
            if let Some(missing) = grammar
                .emissions(state)
                .iter()
                .find(|segment| !lexicon.contains(segment))
            {
                return Err(Error::unknown_symbol("hypothesis lexicon", missing));
            }
        }
        let alphabet = lexicon.alphabet();
        Ok(Self {
            grammar,
            lexicon,
            alphabet,
        })
    }

    /// Spells the lexicon over a fixed character set, so hypotheses over the
    /// same corpus pay for the same alphabet.
    pub fn with_alphabet<I: IntoIterator<Item = char>>(mut self, chars: I) -> Result<Self> {
        let mut alphabet: Vec<Glyph> = chars.into_iter().map(Glyph::Char).collect();
        if self.lexicon.has_null() {
            alphabet.push(Glyph::Null);
        }
        alphabet.sort_unstable();
        alphabet.dedup();
        if let Some(missing) = self
            .lexicon
            .alphabet()
            .into_iter()
            .find(|glyph| alphabet.binary_search(glyph).is_err())
        {
            return Err(Error::unknown_symbol("hypothesis alphabet", missing));
        }
        self.alphabet = alphabet;
        Ok(self)
    }

    pub fn grammar(&self) -> &Hmm {
        &self.grammar
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn alphabet(&self) -> &[Glyph] {
        &self.alphabet
    }

    fn lexicon_codec(&self) -> LexiconCodec {
        LexiconCodec::new(self.alphabet.iter().copied())
    }

    /// Description length of this hypothesis on `data`.
    pub fn score<S: AsRef<str> + Sync>(&self, data: &[S], config: &ScoringConfig) -> DescriptionLength {
        let transitions = TransitionTable::from_grammar(&self.grammar);
        let emissions = EmissionTable::from_grammar(&self.grammar);
        let emission_codec =
            EmissionCodec::for_grammar(&self.grammar, &self.lexicon, config.emission_framing);
        let data_codec = DataCodec::new(&self.grammar, &self.lexicon);

        let data = if config.parallel {
            data.par_iter()
                .map(|datum| data_codec.datum_len(datum.as_ref()))
                .sum::<Option<u64>>()
        } else {
            data_codec.encoded_len(data)
        };

        let length = DescriptionLength {
            lexicon: self.lexicon_codec().encoded_len(&self.lexicon),
            transitions: TransitionCodec::for_grammar(&self.grammar).encoded_len(&transitions),
            emissions: emission_codec.encoded_len(&emissions),
            data,
        };
        log::debug!("scored hypothesis: {length:?}");
        length
    }

    /// Full encoding: lexicon, transitions, emissions, then the data.
    ///
    /// Its length equals [`score`](Hypothesis::score)'s total.
    pub fn encode<S: AsRef<str>>(&self, data: &[S], config: &ScoringConfig) -> Result<BitString> {
        let mut bits = BitString::new();
        self.lexicon_codec().encode_into(&self.lexicon, &mut bits)?;
        TransitionCodec::for_grammar(&self.grammar)
            .encode_into(&TransitionTable::from_grammar(&self.grammar), &mut bits)?;
        EmissionCodec::for_grammar(&self.grammar, &self.lexicon, config.emission_framing)
            .encode_into(&EmissionTable::from_grammar(&self.grammar), &mut bits)?;
        bits.append(&DataCodec::new(&self.grammar, &self.lexicon).encode(data)?);
        Ok(bits)
    }

    /// Inverse of [`encode`](Hypothesis::encode).
    ///
    /// The decoder must agree with the encoder on the glyph alphabet and on
    /// the set of state names, including the initial and final states. With
    /// [`EmissionFraming::Open`](crate::codec::EmissionFraming::Open) the
    /// emission block runs to the end of the stream, so no data follows it.
    pub fn decode<A, I>(
        bits: &BitString,
        alphabet: A,
        states: I,
        initial: &State,
        final_state: &State,
        config: &ScoringConfig,
    ) -> Result<(Self, Vec<String>)>
    where
        A: IntoIterator<Item = Glyph>,
        I: IntoIterator<Item = State>,
    {
        let alphabet: Vec<Glyph> = alphabet.into_iter().collect();
        let states: Vec<State> = states.into_iter().collect();
        let mut reader: BitReader<'_> = bits.reader();

        let lexicon = LexiconCodec::new(alphabet.iter().copied()).decode_from(&mut reader)?;
        let transitions = TransitionCodec::new(states.iter().cloned()).decode_from(&mut reader)?;
        let emissions = EmissionCodec::new(
            states,
            lexicon.entries().iter().cloned(),
            config.emission_framing,
        )
        .decode_from(&mut reader)?;

        let grammar = Hmm::from_tables(initial.clone(), final_state.clone(), &transitions, &emissions)?;
        let data = DataCodec::new(&grammar, &lexicon).decode_from(&mut reader)?;
        let hypothesis = Hypothesis::new(grammar, lexicon)?.with_alphabet(alphabet.iter().filter_map(
            |glyph| match glyph {
                Glyph::Char(c) => Some(*c),
                Glyph::Null => None,
            },
        ))?;
        Ok((hypothesis, data))
    }
}

/// Scores every hypothesis on `data` and sorts them from best to worst.
///
/// Returns `(index into hypotheses, length)` pairs; ties keep input order.
pub fn rank_hypotheses<S: AsRef<str> + Sync>(
    hypotheses: &[Hypothesis],
    data: &[S],
    config: &ScoringConfig,
) -> Vec<(usize, DescriptionLength)> {
    let mut ranked: Vec<(usize, DescriptionLength)> = if config.parallel {
        hypotheses
            .par_iter()
            .enumerate()
            .map(|(index, hypothesis)| (index, hypothesis.score(data, config)))
            .collect()
    } else {
        hypotheses
            .iter()
            .enumerate()
            .map(|(index, hypothesis)| (index, hypothesis.score(data, config)))
            .collect()
    };
    ranked.sort_by(|(_, a), (_, b)| a.cmp_total(b));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::EmissionFraming;
    use crate::segment::Segment;

    fn looping(words: &[&str]) -> Hypothesis {
        let grammar = Hmm::builder("q0", "qf")
            .initial_transitions(["q1"])
            .state("q1", ["qf", "q1"], words.iter().copied())
            .build()
            .unwrap();
        Hypothesis::new(grammar, Lexicon::new(words.iter().copied()).unwrap()).unwrap()
    }

    #[test]
    fn test_score_parts() {
        let hypothesis = looping(&["ab", "ba"]);
        let data = ["abba", "ab"];
        let length = hypothesis.score(&data, &ScoringConfig::default());

        // alphabet {a, b}: width 2, 4 glyphs + 2 word ends + 1
        assert_eq!(length.lexicon, 3 + 7 * 2);
        // {q0, q1, qf}: width 2, q0 [q1] and q1 [qf, q1]
        assert_eq!(length.transitions, 3 + 8 * 2);
        // {q0, q1, qf, ab, ba}: width 3, one row of two
        assert_eq!(length.emissions, 4 + 5 * 3);
        // one bit per word and one per transition out of q1
        assert_eq!(length.data, Some(6));
        assert_eq!(length.total(), Some(17 + 19 + 19 + 6));
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let hypothesis = looping(&["ab", "ba", "a"]);
        let data = ["abba", "ab", "aab", "baba"];
        assert_eq!(
            hypothesis.score(&data, &ScoringConfig::default()),
            hypothesis.score(&data, &ScoringConfig::default().with_parallel(false))
        );
    }

    #[test]
    fn test_encoding_length_matches_score() {
        let hypothesis = looping(&["ab", "ba", "a"]);
        let data = ["abba", "ab", "aab"];
        let config = ScoringConfig::default();
        let bits = hypothesis.encode(&data, &config).unwrap();
        let total = hypothesis.score(&data, &config).total().unwrap();
        assert_eq!(bits.len() as u64, total);
    }

    #[test]
    fn test_decode_recovers_hypothesis_and_data() {
        let grammar = Hmm::builder("q0", "qf")
            .initial_transitions(["q1"])
            .state("q1", ["q2"], ["cat", "dog"])
            .state("q2", ["qf"], [Segment::from("s"), Segment::Null])
            .build()
            .unwrap();
        let lexicon = Lexicon::new(["cat", "dog", "s"]).unwrap().with_null();
        let hypothesis = Hypothesis::new(grammar.clone(), lexicon)
            .unwrap()
            .with_alphabet("acdgost".chars())
            .unwrap();
        let data = ["cats", "dog"];
        let config = ScoringConfig::default();

        let bits = hypothesis.encode(&data, &config).unwrap();
        let (decoded, decoded_data) = Hypothesis::decode(
            &bits,
            hypothesis.alphabet().iter().copied(),
            grammar.get_states(),
            &State::from("q0"),
            &State::from("qf"),
            &config,
        )
        .unwrap();
        assert_eq!(decoded, hypothesis);
        assert_eq!(decoded_data, data);
    }

    #[test]
    fn test_unparsable_ranks_last() {
        let parsable = looping(&["a", "b"]);
        let partial = looping(&["a"]);
        let ranked = rank_hypotheses(&[partial, parsable], &["ab", "ba"], &ScoringConfig::default());
        assert_eq!(ranked[0].0, 1);
        assert_eq!(ranked[1].0, 0);
        assert_eq!(ranked[1].1.total(), None);
    }

    #[test]
    fn test_open_framing_is_one_code_shorter() {
        let hypothesis = looping(&["ab", "ba"]);
        let closed = hypothesis.score(&["ab"], &ScoringConfig::default());
        let open = hypothesis.score(
            &["ab"],
            &ScoringConfig::default().with_emission_framing(EmissionFraming::Open),
        );
        assert_eq!(closed.emissions - open.emissions, 3);
    }

    #[test]
    fn test_rejects_emission_outside_lexicon() {
        let grammar = Hmm::builder("q0", "qf")
            .initial_transitions(["q1"])
            .state("q1", ["qf"], ["ab"])
            .build()
            .unwrap();
        let result = Hypothesis::new(grammar, Lexicon::new(["a"]).unwrap());
        assert!(matches!(result, Err(Error::UnknownSymbol { .. })));
    }

    #[test]
    fn test_alphabet_must_cover_lexicon() {
        let hypothesis = looping(&["ab"]);
        assert!(hypothesis.clone().with_alphabet("a".chars()).is_err());
        let widened = hypothesis.with_alphabet("abc".chars()).unwrap();
        assert_eq!(widened.alphabet().len(), 3);
    }
}
