use crate::error::{Error, Result};
use crate::segment::{Glyph, Segment};
use ahash::AHashSet as HashSet;

/// The operations the parser and the codecs need from a lexicon.
///
/// Any type exposing an ordered entry list can stand in for [`Lexicon`],
/// including test fixtures.
pub trait LexicalComponent {
    /// Entries in their canonical order, without duplicates.
    fn entries(&self) -> &[Segment];

    /// Length in characters of the longest entry.
    fn maximal_entry_length(&self) -> usize {
        self.entries()
            .iter()
            .map(Segment::char_len)
            .max()
            .unwrap_or(0)
    }

    fn contains(&self, segment: &Segment) -> bool {
        self.entries().contains(segment)
    }

    fn has_null(&self) -> bool {
        self.contains(&Segment::Null)
    }
}

/// An ordered, duplicate-free set of lexical entries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Lexicon {
    entries: Vec<Segment>,
    maximal_length: usize,
}

impl Lexicon {
    /// Builds a lexicon, keeping the given order.
    ///
    /// Rejects duplicate entries and empty words; use [`Segment::Null`] for a
    /// zero-width entry.
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<Segment>,
    {
        let mut lexicon = Lexicon::default();
        let mut seen = HashSet::new();

        for entry in entries {
            let entry = entry.into();
            if matches!(&entry, Segment::Word(text) if text.is_empty()) {
                return Err(Error::InvalidGrammar(
                    "empty word in lexicon; use the null segment".to_owned(),
                ));
            }
            if !seen.insert(entry.clone()) {
                return Err(Error::InvalidGrammar(format!(
                    "duplicate lexicon entry {entry}"
                )));
            }
            lexicon.push(entry);
        }

        Ok(lexicon)
    }

    /// The naive lexicon of a corpus: every distinct character, sorted.
    pub fn from_data<I, S>(data: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut chars: Vec<char> = data
            .into_iter()
            .flat_map(|datum| datum.as_ref().chars().collect::<Vec<_>>())
            .collect();
        chars.sort_unstable();
        chars.dedup();

        let mut lexicon = Lexicon::default();
        for c in chars {
            lexicon.push(Segment::Word(c.to_string()));
        }
        lexicon
    }

    /// Adds the null segment if it is not already present.
    pub fn with_null(mut self) -> Self {
        if !self.has_null() {
            self.push(Segment::Null);
        }
        self
    }

    fn push(&mut self, entry: Segment) {
        self.maximal_length = self.maximal_length.max(entry.char_len());
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct glyphs spelling the entries, sorted.
    pub fn alphabet(&self) -> Vec<Glyph> {
        let mut glyphs: Vec<Glyph> = self.entries.iter().flat_map(Segment::glyphs).collect();
        glyphs.sort_unstable();
        glyphs.dedup();
        glyphs
    }
}

impl LexicalComponent for Lexicon {
    fn entries(&self) -> &[Segment] {
        &self.entries
    }

    fn maximal_entry_length(&self) -> usize {
        self.maximal_length
    }
}
