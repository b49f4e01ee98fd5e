use super::fixtures::{masked_grammar, random_walk, WORDS};
use crate::bits::BitString;
use crate::codec::{Codec, DataCodec, EmissionCodec, EmissionFraming, LexiconCodec, TransitionCodec};
use crate::enumeration::{index_width, symbol_width};
use crate::hmm::{EmissionTable, Grammar, Hmm, TransitionTable};
use crate::lexicon::Lexicon;
use proptest::prelude::*;

fn grammar_strategy(always_final: bool) -> impl Strategy<Value = Hmm> {
    (1usize..5)
        .prop_flat_map(|n| (any::<u8>(), prop::collection::vec((any::<u8>(), any::<u8>()), n)))
        .prop_map(move |(initial, rows)| masked_grammar(initial, &rows, always_final))
}

fn word_list() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-e]{1,6}", 0..12).prop_map(|set| set.into_iter().collect())
}

fn sample_lexicon() -> Lexicon {
    Lexicon::new(WORDS).unwrap()
}

proptest! {
    /// Every width leaves room for the terminator, and no narrower width would.
    #[test]
    fn prop_symbol_width_law(n in 0usize..5000) {
        let width = symbol_width(n);
        prop_assert!(width >= 1);
        prop_assert!((1u64 << width) >= n as u64 + 1);
        if width > 1 {
            prop_assert!((1u64 << (width - 1)) < n as u64 + 1);
        }
    }

    #[test]
    fn prop_index_width_law(len in 1usize..5000) {
        let width = index_width(len);
        prop_assert!((1u64 << width) >= len as u64);
        if width > 0 {
            prop_assert!((1u64 << (width - 1)) < len as u64);
        }
    }

    #[test]
    fn prop_lexicon_roundtrip(words in word_list(), null in any::<bool>()) {
        let mut lexicon = Lexicon::new(words).unwrap();
        if null {
            lexicon = lexicon.with_null();
        }
        let codec = LexiconCodec::for_lexicon(&lexicon);

        let bits = codec.encode(&lexicon).unwrap();
        prop_assert_eq!(bits.len() as u64, codec.encoded_len(&lexicon));
        prop_assert_eq!(codec.decode(&bits).unwrap(), lexicon);
    }

    #[test]
    fn prop_transition_roundtrip(grammar in grammar_strategy(false)) {
        let codec = TransitionCodec::for_grammar(&grammar);
        let table = TransitionTable::from_grammar(&grammar);

        let bits = codec.encode(&table).unwrap();
        prop_assert_eq!(bits.len() as u64, codec.encoded_len(&table));
        prop_assert_eq!(codec.decode(&bits).unwrap(), table);
    }

    #[test]
    fn prop_emission_roundtrip(grammar in grammar_strategy(false), open in any::<bool>()) {
        let framing = if open { EmissionFraming::Open } else { EmissionFraming::Terminated };
        let lexicon = sample_lexicon();
        let codec = EmissionCodec::for_grammar(&grammar, &lexicon, framing);
        let table = EmissionTable::from_grammar(&grammar);

        let bits = codec.encode(&table).unwrap();
        prop_assert_eq!(bits.len() as u64, codec.encoded_len(&table));
        prop_assert_eq!(codec.decode(&bits).unwrap(), table);
    }

    #[test]
    fn prop_grammar_survives_tables(grammar in grammar_strategy(false)) {
        let rebuilt = Hmm::from_tables(
            grammar.initial_state().clone(),
            grammar.final_state().clone(),
            &TransitionTable::from_grammar(&grammar),
            &EmissionTable::from_grammar(&grammar),
        )
        .unwrap();
        prop_assert_eq!(
            TransitionTable::from_grammar(&rebuilt),
            TransitionTable::from_grammar(&grammar)
        );
        prop_assert_eq!(
            EmissionTable::from_grammar(&rebuilt),
            EmissionTable::from_grammar(&grammar)
        );
    }

    /// Data decodes back to the same text and costs exactly what the oracle says.
    #[test]
    fn prop_data_roundtrip(
        grammar in grammar_strategy(true),
        walks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..16), 1..5),
    ) {
        let lexicon = sample_lexicon();
        let data: Vec<String> = walks
            .iter()
            .map(|choices| random_walk(&grammar, choices, 6).text)
            .collect();
        let codec = DataCodec::new(&grammar, &lexicon);

        let lengths: Vec<u64> = data.iter().map(|datum| codec.datum_len(datum).unwrap()).collect();
        prop_assume!(lengths.iter().all(|&len| len > 0));

        let bits = codec.encode(&data).unwrap();
        prop_assert_eq!(bits.len() as u64, lengths.iter().sum::<u64>());
        prop_assert_eq!(codec.encoded_len(&data), Some(bits.len() as u64));
        prop_assert_eq!(codec.decode(&bits).unwrap(), data);
    }
}

fn fuzz_grammar() -> Hmm {
    masked_grammar(0b011, &[(0b0110, 0b00011), (0b1001, 0b11100), (0b0011, 0b10101)], false)
}

/// Bolero fuzz test: table decoders reject arbitrary bits without panicking
#[cfg(test)]
#[test]
fn fuzz_table_decoders_no_panic() {
    let grammar = fuzz_grammar();
    let lexicon = sample_lexicon();
    let lexicon_codec = LexiconCodec::for_lexicon(&lexicon);
    let transitions = TransitionCodec::for_grammar(&grammar);
    let emissions = EmissionCodec::for_grammar(&grammar, &lexicon, EmissionFraming::Terminated);
    let open = EmissionCodec::for_grammar(&grammar, &lexicon, EmissionFraming::Open);

    bolero::check!().with_type::<Vec<u8>>().for_each(|input| {
        let bits = BitString::from_bytes(input);
        let _ = lexicon_codec.decode(&bits);
        let _ = transitions.decode(&bits);
        let _ = emissions.decode(&bits);
        let _ = open.decode(&bits);
    });
}

/// Bolero fuzz test: data decoding always terminates, and every decoded datum
/// parses again
#[cfg(test)]
#[test]
fn fuzz_data_decoder_no_panic() {
    let grammar = fuzz_grammar();
    let lexicon = sample_lexicon();
    let codec = DataCodec::new(&grammar, &lexicon);

    bolero::check!().with_type::<Vec<u8>>().for_each(|input| {
        let bits = BitString::from_bytes(input);
        if let Ok(data) = codec.decode(&bits) {
            for datum in &data {
                assert!(codec.datum_len(datum).is_some(), "{datum:?} has no parse");
            }
        }
    });
}
