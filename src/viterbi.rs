//! Viterbi search over unsegmented observations.
//!
//! The observation carries no word boundaries, so the parser searches jointly
//! over grammar states and segmentations. Its table is indexed by
//! `(seen_length, state)`, where `seen_length` counts the observation
//! characters consumed so far. Each table cell holds one prefix cell per
//! distinct lexicon entry that can end a partial parse there.
//!
//! Offsets are visited in increasing order from a frontier of reached
//! lengths. Null entries do not advance the offset; they are relaxed in place
//! before the offset is extended. All log-probabilities are non-positive and a
//! cell only changes on a strict improvement, so null cycles never improve a
//! cell and the relaxation settles after at most one pass per inner state.

use crate::hmm::{Grammar, State};
use crate::lexicon::LexicalComponent;
use crate::segment::Segment;
use ahash::AHashMap as HashMap;
use slotmap::{DefaultKey, SlotMap};
use std::collections::BTreeSet;

/// Best parse of an observation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    /// States from initial to final, inclusive.
    pub states: Vec<State>,
    /// Emitted segments; one per inner state of the path.
    pub segments: Vec<Segment>,
    /// Natural log of the path probability.
    pub log_probability: f64,
    /// Probability of each transition along the path.
    pub transition_probabilities: Vec<f64>,
    /// Probability of each emission along the path.
    pub emission_probabilities: Vec<f64>,
}

impl ParseResult {
    /// The observation the segments spell.
    pub fn text(&self) -> String {
        self.segments.iter().map(Segment::as_str).collect()
    }
}

/// A candidate entry ending a partial parse.
#[derive(Debug, Clone)]
struct PrefixCell {
    /// Inner state index.
    state: usize,
    /// Lexicon entry index.
    entry: usize,
    log_probability: f64,
    seen_length: usize,
    /// Previous cell; `None` means the initial state.
    back_pointer: Option<DefaultKey>,
}

/// A cell ending at some offset, seen as the origin of the next step.
#[derive(Debug, Clone, Copy)]
struct Source {
    /// Row in [`Model::transitions`]: 0 is the initial state.
    from: usize,
    entry: usize,
    key: Option<DefaultKey>,
    log_probability: f64,
}

impl Source {
    fn initial() -> Self {
        Source {
            from: 0,
            entry: usize::MAX,
            key: None,
            log_probability: 0.0,
        }
    }
}

#[inline]
fn ln(probability: f64) -> Option<f64> {
    (probability > 0.0).then(|| probability.ln())
}

/// Grammar probabilities resolved to indices for one parse.
struct Model {
    /// `transitions[from][to]`: `from` is 0 for the initial state and
    /// `i + 1` for inner state `i`; `to` is `i` for inner state `i` and
    /// `inner.len()` for the final state.
    transitions: Vec<Vec<Option<f64>>>,
    /// Per inner state: lexicon entry index to emission log-probability.
    emissions: Vec<HashMap<usize, f64>>,
}

impl Model {
    fn new<G, L>(grammar: &G, lexicon: &L) -> Self
    where
        G: Grammar + ?Sized,
        L: LexicalComponent + ?Sized,
    {
        let inner = grammar.inner_states();
        let targets: Vec<&State> = inner
            .iter()
            .chain(std::iter::once(grammar.final_state()))
            .collect();

        let transitions = std::iter::once(grammar.initial_state())
            .chain(inner)
            .map(|from| {
                targets
                    .iter()
                    .map(|to| ln(grammar.transition_probability(from, to)))
                    .collect()
            })
            .collect();

        let emissions = inner
            .iter()
            .map(|state| {
                lexicon
                    .entries()
                    .iter()
                    .enumerate()
                    .filter_map(|(entry, segment)| {
                        ln(grammar.emission_probability(state, segment)).map(|lp| (entry, lp))
                    })
                    .collect()
            })
            .collect();

        Self {
            transitions,
            emissions,
        }
    }

    fn inner_len(&self) -> usize {
        self.emissions.len()
    }
}

/// Finds lexicon entries starting at a given character offset.
struct PrefixFinder<'a> {
    observation: &'a str,
    /// Byte offset of every character boundary, including the end.
    offsets: Vec<usize>,
    words: HashMap<&'a str, usize>,
    maximal_length: usize,
    null: Option<usize>,
}

impl<'a> PrefixFinder<'a> {
    fn new<L: LexicalComponent + ?Sized>(lexicon: &'a L, observation: &'a str) -> Self {
        let offsets = observation
            .char_indices()
            .map(|(offset, _)| offset)
            .chain(std::iter::once(observation.len()))
            .collect();

        let mut words = HashMap::new();
        let mut null = None;
        for (entry, segment) in lexicon.entries().iter().enumerate() {
            match segment {
                Segment::Null => null = Some(entry),
                Segment::Word(text) => {
                    words.insert(text.as_str(), entry);
                }
            }
        }

        Self {
            observation,
            offsets,
            words,
            maximal_length: lexicon.maximal_entry_length(),
            null,
        }
    }

    /// Length of the observation in characters.
    fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    /// `(entry, char_len)` of every word that starts at `start`, shortest first.
    fn at(&self, start: usize) -> Vec<(usize, usize)> {
        let longest = self.maximal_length.min(self.len() - start);
        (1..=longest)
            .filter_map(|length| {
                let slice = &self.observation[self.offsets[start]..self.offsets[start + length]];
                self.words.get(slice).map(|&entry| (entry, length))
            })
            .collect()
    }
}

/// Prefix cells plus their `(seen_length, state, entry)` index.
struct Table {
    cells: SlotMap<DefaultKey, PrefixCell>,
    columns: Vec<Vec<HashMap<usize, DefaultKey>>>,
}

impl Table {
    fn new(positions: usize, states: usize) -> Self {
        Self {
            cells: SlotMap::new(),
            columns: vec![vec![HashMap::new(); states]; positions],
        }
    }

    /// Offers a score for `(state, entry)` ending at `seen_length`.
    ///
    /// Returns true if the cell was created or strictly improved.
    fn relax(
        &mut self,
        state: usize,
        entry: usize,
        seen_length: usize,
        log_probability: f64,
        back_pointer: Option<DefaultKey>,
    ) -> bool {
        let column = &mut self.columns[seen_length][state];
        match column.get(&entry).copied() {
            Some(key) => {
                let cell = &mut self.cells[key];
                if log_probability > cell.log_probability {
                    cell.log_probability = log_probability;
                    cell.back_pointer = back_pointer;
                    true
                } else {
                    false
                }
            }
            None => {
                let key = self.cells.insert(PrefixCell {
                    state,
                    entry,
                    log_probability,
                    seen_length,
                    back_pointer,
                });
                column.insert(entry, key);
                true
            }
        }
    }

    /// Every cell ending at `position`, in `(state, entry)` order so ties
    /// resolve the same way on every run.
    fn sources(&self, position: usize) -> Vec<Source> {
        let mut sources: Vec<Source> = self.columns[position]
            .iter()
            .flat_map(|cells| cells.values())
            .map(|&key| {
                let cell = &self.cells[key];
                debug_assert_eq!(cell.seen_length, position);
                Source {
                    from: cell.state + 1,
                    entry: cell.entry,
                    key: Some(key),
                    log_probability: cell.log_probability,
                }
            })
            .collect();
        sources.sort_by_key(|source| (source.from, source.entry));

        if position == 0 {
            sources.insert(0, Source::initial());
        }
        sources
    }
}

/// Finds the most probable state path and segmentation of `observation`.
///
/// Returns `None` when no path consumes the whole observation and reaches the
/// final state.
pub fn viterbi<G, L>(grammar: &G, lexicon: &L, observation: &str) -> Option<ParseResult>
where
    G: Grammar + ?Sized,
    L: LexicalComponent + ?Sized,
{
    let model = Model::new(grammar, lexicon);
    let finder = PrefixFinder::new(lexicon, observation);
    let states = model.inner_len();
    let length = finder.len();
    let final_column = states;

    let mut table = Table::new(length + 1, states);
    let mut frontier = BTreeSet::from([0usize]);
    let mut best_final: Option<(f64, Option<DefaultKey>)> = None;

    while let Some(position) = frontier.pop_first() {
        if let Some(null) = finder.null {
            for _ in 0..=states {
                let sources = table.sources(position);
                let mut changed = false;
                for state in 0..states {
                    let Some(&emission) = model.emissions[state].get(&null) else {
                        continue;
                    };
                    for source in &sources {
                        if let Some(transition) = model.transitions[source.from][state] {
                            changed |= table.relax(
                                state,
                                null,
                                position,
                                source.log_probability + transition + emission,
                                source.key,
                            );
                        }
                    }
                }
                if !changed {
                    break;
                }
            }
        }

        let sources = table.sources(position);
        log::trace!("offset {position}: {} live cells", sources.len());

        if position == length {
            for source in &sources {
                if let Some(transition) = model.transitions[source.from][final_column] {
                    let score = source.log_probability + transition;
                    if best_final.map_or(true, |(best, _)| score > best) {
                        best_final = Some((score, source.key));
                    }
                }
            }
            continue;
        }

        for (entry, entry_length) in finder.at(position) {
            let seen_length = position + entry_length;
            for state in 0..states {
                let Some(&emission) = model.emissions[state].get(&entry) else {
                    continue;
                };
                for source in &sources {
                    if let Some(transition) = model.transitions[source.from][state] {
                        let score = source.log_probability + transition + emission;
                        if table.relax(state, entry, seen_length, score, source.key) {
                            frontier.insert(seen_length);
                        }
                    }
                }
            }
        }
    }

    let Some((log_probability, last)) = best_final else {
        log::debug!("no parse for {observation:?}");
        return None;
    };

    let inner = grammar.inner_states();
    let entries = lexicon.entries();
    let mut path = Vec::new();
    let mut segments = Vec::new();
    let mut cursor = last;
    while let Some(key) = cursor {
        let cell = &table.cells[key];
        path.push(inner[cell.state].clone());
        segments.push(entries[cell.entry].clone());
        cursor = cell.back_pointer;
    }
    path.reverse();
    segments.reverse();

    let mut states_path = Vec::with_capacity(path.len() + 2);
    states_path.push(grammar.initial_state().clone());
    states_path.extend(path);
    states_path.push(grammar.final_state().clone());

    let transition_probabilities = states_path
        .windows(2)
        .map(|pair| grammar.transition_probability(&pair[0], &pair[1]))
        .collect();
    let emission_probabilities = states_path[1..states_path.len() - 1]
        .iter()
        .zip(&segments)
        .map(|(state, segment)| grammar.emission_probability(state, segment))
        .collect();

    Some(ParseResult {
        states: states_path,
        segments,
        log_probability,
        transition_probabilities,
        emission_probabilities,
    })
}

/// Distinct lexicon entries that start at any of the given character offsets,
/// in discovery order. The null entry, when present, is always included.
pub fn lexical_prefixes<L, I>(lexicon: &L, observation: &str, starts: I) -> Vec<Segment>
where
    L: LexicalComponent + ?Sized,
    I: IntoIterator<Item = usize>,
{
    let finder = PrefixFinder::new(lexicon, observation);
    let mut found: Vec<usize> = Vec::new();

    for start in starts {
        if start > finder.len() {
            continue;
        }
        for (entry, _) in finder.at(start) {
            if !found.contains(&entry) {
                found.push(entry);
            }
        }
    }
    if let Some(null) = finder.null {
        found.push(null);
    }

    found
        .into_iter()
        .map(|entry| lexicon.entries()[entry].clone())
        .collect()
}
