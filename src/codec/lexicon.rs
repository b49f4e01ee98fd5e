use super::{expect_header, framed_len, push_symbol, push_terminator, read_symbol, Codec};
use crate::bits::{BitReader, BitString};
use crate::enumeration::{Decoded, SymbolEnumeration};
use crate::error::{DecodeError, Result};
use crate::lexicon::{LexicalComponent, Lexicon};
use crate::segment::{Glyph, Segment};

/// Lexicon codec over a glyph alphabet.
///
/// Layout: `0^w 1`, then every entry spelled glyph by glyph and closed by the
/// terminator, then one more terminator for the whole block.
#[derive(Debug, Clone)]
pub struct LexiconCodec {
    alphabet: SymbolEnumeration<Glyph>,
}

impl LexiconCodec {
    pub fn new<I: IntoIterator<Item = Glyph>>(alphabet: I) -> Self {
        Self {
            alphabet: SymbolEnumeration::new(alphabet),
        }
    }

    /// Codec over plain characters.
    pub fn from_chars<I: IntoIterator<Item = char>>(chars: I) -> Self {
        Self::new(chars.into_iter().map(Glyph::Char))
    }

    /// Codec over exactly the glyphs `lexicon` uses.
    pub fn for_lexicon(lexicon: &Lexicon) -> Self {
        Self::new(lexicon.alphabet())
    }

    pub fn width(&self) -> u32 {
        self.alphabet.width()
    }

    pub fn alphabet(&self) -> &SymbolEnumeration<Glyph> {
        &self.alphabet
    }
}

fn segment_from_glyphs(glyphs: &[Glyph], position: usize) -> Result<Segment, DecodeError> {
    match glyphs {
        [Glyph::Null] => Ok(Segment::Null),
        _ => glyphs
            .iter()
            .map(|glyph| match glyph {
                Glyph::Char(c) => Ok(*c),
                Glyph::Null => Err(DecodeError::MalformedBlock { position }),
            })
            .collect::<Result<String, _>>()
            .map(Segment::Word),
    }
}

impl Codec for LexiconCodec {
    type Item = Lexicon;

    fn encode_into(&self, lexicon: &Lexicon, bits: &mut BitString) -> Result<()> {
        bits.push_header(self.width());
        for entry in lexicon.entries() {
            for glyph in entry.glyphs() {
                push_symbol(bits, &self.alphabet, &glyph, "lexicon")?;
            }
            push_terminator(bits, &self.alphabet);
        }
        push_terminator(bits, &self.alphabet);
        Ok(())
    }

    fn decode_from(&self, reader: &mut BitReader<'_>) -> Result<Lexicon> {
        expect_header(reader, self.width())?;

        let mut entries = Vec::new();
        let mut glyphs = Vec::new();
        loop {
            let position = reader.position();
            match read_symbol(reader, &self.alphabet)? {
                Decoded::Symbol(glyph) => glyphs.push(*glyph),
                // A terminator right after another one closes the block
                Decoded::Terminator if glyphs.is_empty() => break,
                Decoded::Terminator => {
                    entries.push(segment_from_glyphs(&glyphs, position)?);
                    glyphs.clear();
                }
            }
        }

        log::debug!("decoded lexicon of {} entries", entries.len());
        Lexicon::new(entries)
    }

    fn encoded_len(&self, lexicon: &Lexicon) -> u64 {
        let glyphs: usize = lexicon
            .entries()
            .iter()
            .map(|entry| entry.char_len().max(1))
            .sum();
        framed_len(self.width(), glyphs + lexicon.len() + 1)
    }
}
