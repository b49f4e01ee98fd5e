use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use morpho_mdl::codec::{DataCodec, LexiconCodec};
use morpho_mdl::{
    rank_hypotheses, viterbi, Codec, Hmm, Hypothesis, LexicalComponent, Lexicon, ScoringConfig,
};

const SYLLABLES: [&str; 4] = ["pabiku", "daropi", "tibudo", "golatu"];

/// Generate a corpus of words, each a run of syllables
fn generate_corpus(words: usize, syllables_per_word: usize) -> Vec<String> {
    let mut seed = 12345u64;
    (0..words)
        .map(|_| {
            (0..syllables_per_word)
                .map(|_| {
                    // Simple LCG random
                    seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
                    SYLLABLES[(seed >> 16) as usize % SYLLABLES.len()]
                })
                .collect()
        })
        .collect()
}

fn looping_hypothesis(lexicon: Lexicon) -> Hypothesis {
    let grammar = Hmm::builder("q0", "qf")
        .initial_transitions(["q1"])
        .state("q1", ["qf", "q1"], lexicon.entries().to_vec())
        .build()
        .unwrap();
    Hypothesis::new(grammar, lexicon).unwrap()
}

/// Syllables plus every prefix and suffix split, so the parser sees real
/// ambiguity
fn ambiguous_lexicon() -> Lexicon {
    let mut entries: Vec<String> = Vec::new();
    for syllable in SYLLABLES {
        for cut in 1..=syllable.len() {
            for part in [&syllable[..cut], &syllable[cut..]] {
                if !part.is_empty() && !entries.iter().any(|entry| entry == part) {
                    entries.push(part.to_owned());
                }
            }
        }
    }
    Lexicon::new(entries).unwrap()
}

fn bench_viterbi(c: &mut Criterion) {
    let lengths = [4, 16, 64];
    let mut group = c.benchmark_group("viterbi");

    let target = looping_hypothesis(Lexicon::new(SYLLABLES).unwrap());
    let ambiguous = looping_hypothesis(ambiguous_lexicon());

    for length in lengths.iter() {
        let observation = generate_corpus(1, *length).remove(0);

        group.bench_with_input(
            BenchmarkId::new("target", length),
            &observation,
            |b, observation| {
                b.iter(|| {
                    viterbi(
                        target.grammar(),
                        target.lexicon(),
                        black_box(observation.as_str()),
                    )
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("ambiguous", length),
            &observation,
            |b, observation| {
                b.iter(|| {
                    viterbi(
                        ambiguous.grammar(),
                        ambiguous.lexicon(),
                        black_box(observation.as_str()),
                    )
                });
            },
        );
    }

    group.finish();
}

fn bench_length_oracle(c: &mut Criterion) {
    let mut group = c.benchmark_group("length_oracle");

    let lexicon = ambiguous_lexicon();
    let codec = LexiconCodec::for_lexicon(&lexicon);
    group.bench_function("lexicon_encode", |b| {
        b.iter(|| codec.encode(black_box(&lexicon)).unwrap().len())
    });
    group.bench_function("lexicon_encoded_len", |b| {
        b.iter(|| codec.encoded_len(black_box(&lexicon)))
    });

    let hypothesis = looping_hypothesis(Lexicon::new(SYLLABLES).unwrap());
    let corpus = generate_corpus(50, 8);
    let data_codec = DataCodec::new(hypothesis.grammar(), hypothesis.lexicon());
    group.bench_function("data_encode", |b| {
        b.iter(|| data_codec.encode(black_box(&corpus)).unwrap().len())
    });
    group.bench_function("data_encoded_len", |b| {
        b.iter(|| data_codec.encoded_len(black_box(&corpus)))
    });

    group.finish();
}

fn bench_ranking(c: &mut Criterion) {
    let corpus = generate_corpus(100, 6);
    let hypotheses = vec![
        looping_hypothesis(Lexicon::from_data(&corpus)),
        looping_hypothesis(Lexicon::new(SYLLABLES).unwrap()),
        looping_hypothesis(ambiguous_lexicon()),
    ];
    let mut group = c.benchmark_group("rank_hypotheses");

    for parallel in [false, true] {
        let config = ScoringConfig::default().with_parallel(parallel);
        group.bench_with_input(
            BenchmarkId::new("parallel", parallel),
            &config,
            |b, config| {
                b.iter(|| rank_hypotheses(black_box(&hypotheses), black_box(&corpus), config));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_viterbi, bench_length_oracle, bench_ranking);
criterion_main!(benches);
