use std::fmt;

/// A lexical entry: either a word or the zero-width null segment.
///
/// The null segment consumes no characters of an observation; a state that
/// emits it models an optional morpheme slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Null,
    Word(String),
}

impl Segment {
    pub fn word(text: impl Into<String>) -> Self {
        Segment::Word(text.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Segment::Null)
    }

    /// The text this segment contributes to a reconstructed observation.
    pub fn as_str(&self) -> &str {
        match self {
            Segment::Null => "",
            Segment::Word(text) => text,
        }
    }

    /// Number of observation characters the segment covers.
    pub fn char_len(&self) -> usize {
        match self {
            Segment::Null => 0,
            Segment::Word(text) => text.chars().count(),
        }
    }

    /// The glyphs spelling this segment in the lexicon code.
    ///
    /// The null segment is spelled by the single [`Glyph::Null`].
    pub fn glyphs(&self) -> Vec<Glyph> {
        match self {
            Segment::Null => vec![Glyph::Null],
            Segment::Word(text) => text.chars().map(Glyph::Char).collect(),
        }
    }
}

impl From<&str> for Segment {
    fn from(text: &str) -> Self {
        Segment::Word(text.to_owned())
    }
}

impl From<String> for Segment {
    fn from(text: String) -> Self {
        Segment::Word(text)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Null => f.write_str("-"),
            Segment::Word(text) => f.write_str(text),
        }
    }
}

/// One symbol of the lexicon alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Glyph {
    /// Spells the null segment.
    Null,
    Char(char),
}

impl fmt::Display for Glyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Glyph::Null => f.write_str("-"),
            Glyph::Char(c) => write!(f, "{c:?}"),
        }
    }
}
