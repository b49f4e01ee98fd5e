use morpho_mdl::{rank_hypotheses, Hmm, Hypothesis, LexicalComponent, Lexicon, ScoringConfig};

const CORPUS: [&str; 9] = [
    "golatutibudopabikudaropidaropipabikupabikudaropipabiku",
    "tibudotibudodaropidaropipabikugolatupabikudaropigolatutibudodaropi",
    "pabikudaropidaropitibudopabikudaropigolatu",
    "tibudodaropigolatupabikutibudotibudo",
    "golatudaropigolatugolatudaropipabiku",
    "daropidaropigolatutibudogolatu",
    "tibudodaropidaropidaropipabikutibudogolatupabikupabikudaropi",
    "golatugolatupabikudaropitibudotibudogolatupabikutibudo",
    "tibudotibudotibudopabikutibudotibudo",
];

fn single_loop(lexicon: Lexicon) -> Hypothesis {
    let grammar = Hmm::builder("q0", "qf")
        .initial_transitions(["q1"])
        .state("q1", ["qf", "q1"], lexicon.entries().to_vec())
        .build()
        .expect("single-state grammar is valid");
    Hypothesis::new(grammar, lexicon).expect("grammar emits only lexicon entries")
}

fn main() -> Result<(), morpho_mdl::Error> {
    env_logger::init();

    println!("=== MDL Hypothesis Comparison ===\n");

    let target = ["pabiku", "daropi", "tibudo", "golatu"];
    let candidates = vec![
        ("naive", Lexicon::from_data(CORPUS)),
        ("target", Lexicon::new(target)?),
        (
            "over-segmented",
            Lexicon::new(target.into_iter().chain(["pabikodaropi"]))?,
        ),
        (
            "under-segmented",
            Lexicon::new(["daropi", "tibudo", "golatu", "pabi", "ku"])?,
        ),
    ];
    println!("Corpus: {} words", CORPUS.len());

    let names: Vec<&str> = candidates.iter().map(|(name, _)| *name).collect();
    let hypotheses: Vec<Hypothesis> = candidates
        .into_iter()
        .map(|(_, lexicon)| single_loop(lexicon))
        .collect();

    let config = ScoringConfig::default();
    println!(
        "\n{:<16} {:>8} {:>12} {:>10} {:>8} {:>8}",
        "hypothesis", "lexicon", "transitions", "emissions", "data", "total"
    );
    for (index, length) in rank_hypotheses(&hypotheses, &CORPUS, &config) {
        let show = |bits: Option<u64>| bits.map_or_else(|| "-".to_owned(), |b| b.to_string());
        println!(
            "{:<16} {:>8} {:>12} {:>10} {:>8} {:>8}",
            names[index],
            length.lexicon,
            length.transitions,
            length.emissions,
            show(length.data),
            show(length.total()),
        );
    }

    let best = &hypotheses[1];
    let bits = best.encode(&CORPUS, &config)?;
    println!("\nFull encoding of the target hypothesis: {} bits", bits.len());
    let first = morpho_mdl::viterbi(best.grammar(), best.lexicon(), CORPUS[0]);
    if let Some(parse) = first {
        let segments: Vec<String> = parse.segments.iter().map(ToString::to_string).collect();
        println!("First word segmented: {}", segments.join(" + "));
    }

    Ok(())
}
