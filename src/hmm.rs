//! Probabilistic finite-state grammar over lexical entries.
//!
//! States are divided into one initial state, a list of inner states and one
//! final state. Only inner states emit, the final state has no successors, and
//! every choice (successor or emission) is uniform over its list.

use crate::error::{Error, Result};
use crate::segment::Segment;
use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use std::fmt;

/// Name of a grammar state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct State(String);

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        State(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for State {
    fn from(name: &str) -> Self {
        State(name.to_owned())
    }
}

impl From<String> for State {
    fn from(name: String) -> Self {
        State(name)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Probability of drawing `item` uniformly from `list`.
fn uniform<T: PartialEq>(list: &[T], item: &T) -> f64 {
    if list.contains(item) {
        1.0 / list.len() as f64
    } else {
        0.0
    }
}

/// The operations the parser and the codecs need from a grammar.
///
/// Implementations must treat the grammar as immutable once built. Lists are
/// ordered: the data-by-grammar code of a choice is its index in the list.
pub trait Grammar {
    fn initial_state(&self) -> &State;

    fn final_state(&self) -> &State;

    /// Inner states in declaration order.
    fn inner_states(&self) -> &[State];

    /// Successors of `state`; empty for the final state.
    fn outgoing_states(&self, state: &State) -> &[State];

    /// Entries `state` may emit; empty for the initial and final states.
    fn emissions(&self, state: &State) -> &[Segment];

    /// `[initial] + inner + [final]`.
    fn get_states(&self) -> Vec<State> {
        let mut states = Vec::with_capacity(self.inner_states().len() + 2);
        states.push(self.initial_state().clone());
        states.extend(self.inner_states().iter().cloned());
        states.push(self.final_state().clone());
        states
    }

    fn transition_probability(&self, from: &State, to: &State) -> f64 {
        uniform(self.outgoing_states(from), to)
    }

    fn emission_probability(&self, state: &State, segment: &Segment) -> f64 {
        uniform(self.emissions(state), segment)
    }
}

/// Per-state rows of a grammar table, in state order.
///
/// Only states with a non-empty list appear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTable<T> {
    rows: Vec<(State, Vec<T>)>,
}

/// Successor lists keyed by origin state.
pub type TransitionTable = StateTable<State>;

/// Emission lists keyed by emitting state.
pub type EmissionTable = StateTable<Segment>;

impl<T> Default for StateTable<T> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<T> StateTable<T> {
    /// Builds a table from rows, dropping rows with an empty list.
    pub fn new<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (State, Vec<T>)>,
    {
        Self {
            rows: rows.into_iter().filter(|(_, list)| !list.is_empty()).collect(),
        }
    }

    pub fn rows(&self) -> &[(State, Vec<T>)] {
        &self.rows
    }

    pub fn get(&self, state: &State) -> Option<&[T]> {
        self.rows
            .iter()
            .find(|(origin, _)| origin == state)
            .map(|(_, list)| list.as_slice())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Total number of list items across all rows.
    pub fn item_count(&self) -> usize {
        self.rows.iter().map(|(_, list)| list.len()).sum()
    }
}

impl TransitionTable {
    /// The transition rows of `grammar`, in `get_states()` order.
    pub fn from_grammar<G: Grammar + ?Sized>(grammar: &G) -> Self {
        Self::new(
            grammar
                .get_states()
                .into_iter()
                .map(|state| {
                    let outgoing = grammar.outgoing_states(&state).to_vec();
                    (state, outgoing)
                }),
        )
    }
}

impl EmissionTable {
    /// The emission rows of `grammar`, in `get_states()` order.
    pub fn from_grammar<G: Grammar + ?Sized>(grammar: &G) -> Self {
        Self::new(
            grammar
                .get_states()
                .into_iter()
                .map(|state| {
                    let emissions = grammar.emissions(&state).to_vec();
                    (state, emissions)
                }),
        )
    }
}

/// Table-backed grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hmm {
    initial: State,
    final_state: State,
    inner: Vec<State>,
    transitions: HashMap<State, Vec<State>>,
    emissions: HashMap<State, Vec<Segment>>,
}

impl Hmm {
    /// Starts a grammar with the given initial and final state names.
    pub fn builder(initial: impl Into<State>, final_state: impl Into<State>) -> HmmBuilder {
        HmmBuilder {
            initial: initial.into(),
            final_state: final_state.into(),
            initial_transitions: Vec::new(),
            inner: Vec::new(),
        }
    }

    /// Rebuilds a grammar from decoded tables.
    ///
    /// Inner states are taken in order of first appearance: transition
    /// origins, then emitting states, then states only ever reached.
    pub fn from_tables(
        initial: impl Into<State>,
        final_state: impl Into<State>,
        transitions: &TransitionTable,
        emissions: &EmissionTable,
    ) -> Result<Self> {
        let mut builder = Hmm::builder(initial, final_state);
        let mut order: Vec<State> = Vec::new();
        let mut seen = HashSet::new();
        seen.insert(builder.initial.clone());
        seen.insert(builder.final_state.clone());

        let mentioned = transitions
            .rows()
            .iter()
            .map(|(origin, _)| origin)
            .chain(emissions.rows().iter().map(|(state, _)| state))
            .chain(transitions.rows().iter().flat_map(|(_, successors)| successors));
        for state in mentioned {
            if seen.insert(state.clone()) {
                order.push(state.clone());
            }
        }

        if let Some(successors) = transitions.get(&builder.initial) {
            builder = builder.initial_transitions(successors.iter().cloned());
        }
        for state in order {
            let outgoing = transitions.get(&state).unwrap_or_default().to_vec();
            let emitted = emissions.get(&state).unwrap_or_default().to_vec();
            builder = builder.state(state, outgoing, emitted);
        }

        if emissions.get(&builder.initial).is_some() || emissions.get(&builder.final_state).is_some()
        {
            return Err(Error::InvalidGrammar(
                "initial and final states cannot emit".to_owned(),
            ));
        }
        if transitions.get(&builder.final_state).is_some() {
            return Err(Error::InvalidGrammar(
                "final state cannot have successors".to_owned(),
            ));
        }

        builder.build()
    }

    fn is_declared(&self, state: &State) -> bool {
        *state == self.initial || *state == self.final_state || self.transitions.contains_key(state)
    }
}

impl Grammar for Hmm {
    fn initial_state(&self) -> &State {
        &self.initial
    }

    fn final_state(&self) -> &State {
        &self.final_state
    }

    fn inner_states(&self) -> &[State] {
        &self.inner
    }

    /// # Panics
    ///
    /// Panics if `state` is not declared in this grammar.
    fn outgoing_states(&self, state: &State) -> &[State] {
        assert!(self.is_declared(state), "state {state} is not declared");
        self.transitions.get(state).map_or(&[], Vec::as_slice)
    }

    /// # Panics
    ///
    /// Panics if `state` is not declared in this grammar.
    fn emissions(&self, state: &State) -> &[Segment] {
        assert!(self.is_declared(state), "state {state} is not declared");
        self.emissions.get(state).map_or(&[], Vec::as_slice)
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidGrammar(message)
}

/// Collects grammar rows and validates them in [`build`](HmmBuilder::build).
#[derive(Debug, Clone)]
pub struct HmmBuilder {
    initial: State,
    final_state: State,
    initial_transitions: Vec<State>,
    inner: Vec<(State, Vec<State>, Vec<Segment>)>,
}

impl HmmBuilder {
    /// Sets the successors of the initial state.
    pub fn initial_transitions<I, S>(mut self, successors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<State>,
    {
        self.initial_transitions = successors.into_iter().map(Into::into).collect();
        self
    }

    /// Declares an inner state with its successors and emissions.
    pub fn state<I, S, J, E>(mut self, name: impl Into<State>, successors: I, emissions: J) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<State>,
        J: IntoIterator<Item = E>,
        E: Into<Segment>,
    {
        self.inner.push((
            name.into(),
            successors.into_iter().map(Into::into).collect(),
            emissions.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn build(self) -> Result<Hmm> {
        if self.initial == self.final_state {
            return Err(invalid(format!(
                "initial and final state are both {}",
                self.initial
            )));
        }

        let mut declared = HashSet::new();
        for (state, _, _) in &self.inner {
            if *state == self.initial || *state == self.final_state {
                return Err(invalid(format!(
                    "{state} is reserved for the initial or final state"
                )));
            }
            if !declared.insert(state.clone()) {
                return Err(invalid(format!("state {state} declared twice")));
            }
        }

        let check_successors = |origin: &State, successors: &[State]| -> Result<()> {
            let mut unique = HashSet::new();
            for successor in successors {
                if *successor == self.initial {
                    return Err(invalid(format!(
                        "{origin} transitions back to the initial state"
                    )));
                }
                if *successor != self.final_state && !declared.contains(successor) {
                    return Err(invalid(format!(
                        "{origin} transitions to undeclared state {successor}"
                    )));
                }
                if !unique.insert(successor) {
                    return Err(invalid(format!(
                        "{origin} lists successor {successor} twice"
                    )));
                }
            }
            Ok(())
        };

        check_successors(&self.initial, &self.initial_transitions)?;

        let mut transitions = HashMap::new();
        let mut emissions = HashMap::new();
        let mut inner = Vec::with_capacity(self.inner.len());

        for (state, successors, emitted) in &self.inner {
            check_successors(state, successors)?;
            let mut unique = HashSet::new();
            for segment in emitted {
                if !unique.insert(segment) {
                    return Err(invalid(format!("{state} lists emission {segment} twice")));
                }
            }
            inner.push(state.clone());
        }

        for (state, successors, emitted) in self.inner {
            transitions.insert(state.clone(), successors);
            emissions.insert(state, emitted);
        }
        transitions.insert(self.initial.clone(), self.initial_transitions);

        Ok(Hmm {
            initial: self.initial,
            final_state: self.final_state,
            inner,
            transitions,
            emissions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence_grammar() -> Hmm {
        Hmm::builder("q0", "qf")
            .initial_transitions(["q2"])
            .state("q1", ["qf"], ["dog", "mouse", "professor", "student"])
            .state("q2", ["q1", "q4"], ["a", "all", "some", "the"])
            .state("q3", ["q2"], ["adore", "bit", "chases", "like", "taught"])
            .state(
                "q4",
                ["q1"],
                ["beautiful", "big", "handsome", "nice", "thin", "thoughtful", "ugly"],
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_get_states_order() {
        let hmm = sentence_grammar();
        let names: Vec<String> = hmm.get_states().iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["q0", "q1", "q2", "q3", "q4", "qf"]);
    }

    #[test]
    fn test_uniform_probabilities() {
        let hmm = sentence_grammar();
        let q2 = State::from("q2");
        assert_eq!(hmm.transition_probability(&q2, &"q4".into()), 0.5);
        assert_eq!(hmm.transition_probability(&q2, &"q3".into()), 0.0);
        assert_eq!(hmm.emission_probability(&q2, &"the".into()), 0.25);
        assert_eq!(hmm.emission_probability(&q2, &"dog".into()), 0.0);
        assert_eq!(hmm.transition_probability(&"q0".into(), &q2), 1.0);
    }

    #[test]
    fn test_final_and_initial_are_silent() {
        let hmm = sentence_grammar();
        assert!(hmm.outgoing_states(&"qf".into()).is_empty());
        assert!(hmm.emissions(&"q0".into()).is_empty());
        assert!(hmm.emissions(&"qf".into()).is_empty());
    }

    #[test]
    #[should_panic(expected = "state q9 is not declared")]
    fn test_undeclared_lookup_panics() {
        sentence_grammar().outgoing_states(&"q9".into());
    }

    #[test]
    fn test_rejects_undeclared_successor() {
        let result = Hmm::builder("q0", "qf")
            .initial_transitions(["q1"])
            .state("q1", ["q7"], ["a"])
            .build();
        assert!(matches!(result, Err(Error::InvalidGrammar(_))));
    }

    #[test]
    fn test_rejects_duplicate_state() {
        let result = Hmm::builder("q0", "qf")
            .state("q1", ["qf"], ["a"])
            .state("q1", ["qf"], ["b"])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_return_to_initial() {
        let result = Hmm::builder("q0", "qf")
            .initial_transitions(["q1"])
            .state("q1", ["q0"], ["a"])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_tables_skip_silent_states() {
        let hmm = sentence_grammar();
        let transitions = TransitionTable::from_grammar(&hmm);
        let origins: Vec<&str> = transitions.rows().iter().map(|(s, _)| s.name()).collect();
        assert_eq!(origins, vec!["q0", "q1", "q2", "q3", "q4"]);
        assert_eq!(transitions.item_count(), 6);

        let emissions = EmissionTable::from_grammar(&hmm);
        let emitters: Vec<&str> = emissions.rows().iter().map(|(s, _)| s.name()).collect();
        assert_eq!(emitters, vec!["q1", "q2", "q3", "q4"]);
        assert_eq!(emissions.item_count(), 20);
    }

    #[test]
    fn test_from_tables_rebuilds_grammar() {
        let hmm = sentence_grammar();
        let rebuilt = Hmm::from_tables(
            "q0",
            "qf",
            &TransitionTable::from_grammar(&hmm),
            &EmissionTable::from_grammar(&hmm),
        )
        .unwrap();
        assert_eq!(rebuilt, hmm);
    }
}
