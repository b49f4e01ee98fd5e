//! # morpho-mdl - MDL Scoring of Morphology Hypotheses
//!
//! A hypothesis is a probabilistic finite-state grammar plus the lexicon it
//! emits. Its cost on a corpus of unsegmented words is the number of bits
//! needed to transmit:
//! 1. **The hypothesis**: lexicon, transition table and emission table
//! 2. **The data given the hypothesis**: each word's best parse, as list indices
//!
//! Lower totals are better. Parsing uses a Viterbi search that segments the
//! observation while it walks the grammar, so null (zero-width) entries and
//! multi-character entries mix freely.
//!
//! ## Example
//!
//! ```
//! use morpho_mdl::{
//!     rank_hypotheses, Hmm, Hypothesis, LexicalComponent, Lexicon, ScoringConfig,
//! };
//!
//! let data = ["pabikugolatu", "golatupabiku"];
//!
//! let letters = Lexicon::from_data(data);
//! let naive = Hypothesis::new(
//!     Hmm::builder("q0", "qf")
//!         .initial_transitions(["q1"])
//!         .state("q1", ["qf", "q1"], letters.entries().to_vec())
//!         .build()
//!         .unwrap(),
//!     letters,
//! )
//! .unwrap();
//!
//! let words = ["pabiku", "golatu"];
//! let target = Hypothesis::new(
//!     Hmm::builder("q0", "qf")
//!         .initial_transitions(["q1"])
//!         .state("q1", ["qf", "q1"], words)
//!         .build()
//!         .unwrap(),
//!     Lexicon::new(words).unwrap(),
//! )
//! .unwrap();
//!
//! let ranked = rank_hypotheses(&[naive, target], &data, &ScoringConfig::default());
//! assert_eq!(ranked[0].0, 1);
//! ```
//!
//! ## Performance
//!
//! - The parser is polynomial in observation length, inner states and the
//!   number of entries that can start at each offset
//! - Length oracles give every codec's exact output size without building it
//! - Hypotheses and data are scored on the rayon pool unless
//!   [`ScoringConfig::parallel`] is off

mod bits;
pub mod codec;
mod config;
mod enumeration;
mod error;
mod hmm;
mod lexicon;
mod mdl;
mod segment;
mod viterbi;

#[cfg(test)]
mod tests;

pub use bits::{BitReader, BitString};
pub use codec::Codec;
pub use config::ScoringConfig;
pub use enumeration::{index_code, index_width, item_by_code, symbol_width, Decoded, SymbolEnumeration};
pub use error::{DecodeError, Error, Result};
pub use hmm::{EmissionTable, Grammar, Hmm, HmmBuilder, State, StateTable, TransitionTable};
pub use lexicon::{LexicalComponent, Lexicon};
pub use mdl::{rank_hypotheses, DescriptionLength, Hypothesis};
pub use segment::{Glyph, Segment};
pub use viterbi::{lexical_prefixes, viterbi, ParseResult};
