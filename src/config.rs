use crate::codec::EmissionFraming;

/// Options for scoring hypotheses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringConfig {
    /// Parse data and score hypotheses on the rayon thread pool.
    pub parallel: bool,
    pub emission_framing: EmissionFraming,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            emission_framing: EmissionFraming::Terminated,
        }
    }
}

impl ScoringConfig {
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_emission_framing(mut self, framing: EmissionFraming) -> Self {
        self.emission_framing = framing;
        self
    }
}
