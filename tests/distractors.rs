use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use quizgen::{
    error::ServiceError,
    nlp::{
        distractors::{
            capitalize_first, format_candidates, normalize_answer, numeric_value,
            DistractorGenerator, DistractorOutcome, NoDistractorsReason,
        },
        embeddings::Embedder,
        senses::{SenseLookup, SenseTag},
    },
};

struct FakeSenses {
    best: HashMap<String, SenseTag>,
    similar: Vec<(SenseTag, f32)>,
}

impl SenseLookup for FakeSenses {
    fn best_sense(&self, word: &str) -> Result<Option<SenseTag>, ServiceError> {
        Ok(self.best.get(word).cloned())
    }

    fn most_similar(&self, _sense: &SenseTag, n: usize) -> Result<Vec<(SenseTag, f32)>, ServiceError> {
        Ok(self.similar.iter().take(n).cloned().collect())
    }
}

struct BrokenSenses;

impl SenseLookup for BrokenSenses {
    fn best_sense(&self, _word: &str) -> Result<Option<SenseTag>, ServiceError> {
        Err(ServiceError::unavailable("sense", "index offline"))
    }

    fn most_similar(&self, _sense: &SenseTag, _n: usize) -> Result<Vec<(SenseTag, f32)>, ServiceError> {
        Err(ServiceError::unavailable("sense", "index offline"))
    }
}

/// Embeds known strings to fixed vectors and counts calls.
struct TableEmbedder {
    table: HashMap<String, Vec<f32>>,
    calls: AtomicUsize,
}

impl Embedder for TableEmbedder {
    fn dimension(&self) -> usize {
        3
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        texts
            .iter()
            .map(|t| {
                self.table
                    .get(&t.to_lowercase())
                    .cloned()
                    .ok_or_else(|| ServiceError::unavailable("embedding", format!("unknown {t}")))
            })
            .collect()
    }
}

struct DownEmbedder;

impl Embedder for DownEmbedder {
    fn dimension(&self) -> usize {
        3
    }

    fn encode(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError> {
        Err(ServiceError::unavailable("embedding", "connection refused"))
    }
}

fn tag(key: &str) -> SenseTag {
    key.parse().unwrap()
}

fn senses(answer_key: &str, similar: &[(&str, f32)]) -> Arc<FakeSenses> {
    let sense = tag(answer_key);
    let mut best = HashMap::new();
    best.insert(sense.word().to_string(), sense);
    Arc::new(FakeSenses {
        best,
        similar: similar.iter().map(|(k, s)| (tag(k), *s)).collect(),
    })
}

fn country_embedder() -> Arc<TableEmbedder> {
    let table = [
        ("france", vec![1.0, 0.0, 0.0]),
        ("usa", vec![0.9, 0.43, 0.0]),
        ("us", vec![0.89, 0.45, 0.01]),
        ("america", vec![0.88, 0.46, 0.02]),
        ("germany", vec![0.8, 0.0, 0.6]),
        ("spain", vec![0.7, -0.5, 0.5]),
        ("italy", vec![0.75, -0.6, -0.2]),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    Arc::new(TableEmbedder {
        table,
        calls: AtomicUsize::new(0),
    })
}

#[test]
fn cardinal_answers_skip_diversity_filtering() {
    let lookup = senses(
        "seven|CARDINAL",
        &[
            ("eight|CARDINAL", 0.95),
            ("six|CARDINAL", 0.94),
            ("7|CARDINAL", 0.93),
            ("nine|CARDINAL", 0.92),
            ("five|CARDINAL", 0.91),
            ("four|CARDINAL", 0.90),
        ],
    );
    let embedder = country_embedder();
    let generator = DistractorGenerator::new(lookup, embedder.clone());

    let outcome = generator.generate("seven");
    assert_eq!(
        outcome.distractors().unwrap(),
        ["Eight", "Six", "Nine", "Five"]
    );
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn unknown_answer_yields_no_distractors() {
    let generator = DistractorGenerator::new(senses("paris|GPE", &[]), country_embedder());
    let outcome = generator.generate("Atlantis");
    assert_eq!(
        outcome,
        DistractorOutcome::NoDistractors {
            reason: NoDistractorsReason::NoSenseFound
        }
    );
}

#[test]
fn service_failures_degrade_to_no_distractors() {
    let generator = DistractorGenerator::new(Arc::new(BrokenSenses), country_embedder());
    let outcome = generator.generate("France");
    assert!(matches!(
        outcome,
        DistractorOutcome::NoDistractors {
            reason: NoDistractorsReason::ServiceUnavailable(_)
        }
    ));

    let lookup = senses("france|GPE", &[("germany|GPE", 0.9)]);
    let generator = DistractorGenerator::new(lookup, Arc::new(DownEmbedder));
    assert!(!generator.generate("France").has_distractors());
}

#[test]
fn near_synonyms_collapse_to_one_distractor() {
    let lookup = senses(
        "france|GPE",
        &[
            ("usa|GPE", 0.9),
            ("US|GPE", 0.89),
            ("America|GPE", 0.88),
            ("Germany|GPE", 0.85),
            ("Spain|GPE", 0.8),
            ("Italy|GPE", 0.79),
        ],
    );
    let generator = DistractorGenerator::new(lookup, country_embedder());
    let outcome = generator.generate("France");
    let distractors = outcome.distractors().unwrap();

    assert_eq!(distractors.len(), 4);
    assert_eq!(distractors[0], "Usa");
    let american = distractors
        .iter()
        .filter(|d| ["Usa", "US", "America"].contains(&d.as_str()))
        .count();
    assert_eq!(american, 1);
    assert!(!distractors.iter().any(|d| d.eq_ignore_ascii_case("france")));
}

#[test]
fn all_candidates_duplicating_answer_is_no_candidates() {
    let lookup = senses("france|GPE", &[("France|GPE", 0.99), ("FRANCE|NORP", 0.9)]);
    let generator = DistractorGenerator::new(lookup, country_embedder());
    assert_eq!(
        generator.generate("france"),
        DistractorOutcome::NoDistractors {
            reason: NoDistractorsReason::NoCandidates
        }
    );
}

#[test]
fn formatting_dedupes_and_drops_the_answer() {
    let sense = tag("new_york|GPE");
    let similar = vec![
        (tag("New_York|GPE"), 0.99),
        (tag("los_angeles|GPE"), 0.9),
        (tag("Los_Angeles|GPE"), 0.89),
        (tag("U.S.|GPE"), 0.8),
        (tag("US|GPE"), 0.7),
    ];
    let formatted = format_candidates("New York", &sense, &similar);
    let texts: Vec<&str> = formatted.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["los angeles", "U.S."]);
    let scores: Vec<f32> = formatted.iter().map(|c| c.score).collect();
    assert_eq!(scores, vec![0.9, 0.8]);
}

#[test]
fn oversized_number_phrases_do_not_parse() {
    let hundreds = vec!["hundred"; 12].join(" ");
    assert_eq!(numeric_value(&format!("one {hundreds}")), None);
    assert_eq!(numeric_value("99999999999999999999"), None);
    assert_eq!(numeric_value("one hundred hundred"), Some(10_000));
}

#[test]
fn cardinal_answers_survive_huge_number_words() {
    let huge = format!("one_{}|CARDINAL", vec!["hundred"; 12].join("_"));
    let lookup = senses("seven|CARDINAL", &[(huge.as_str(), 0.9), ("eight|CARDINAL", 0.8)]);
    let generator = DistractorGenerator::new(lookup, country_embedder());
    let outcome = generator.generate("seven");
    let distractors = outcome.distractors().unwrap();
    assert_eq!(distractors.len(), 2);
    assert_eq!(distractors[1], "Eight");
}

#[test]
fn wrong_sized_answer_vectors_are_invalid_embeddings() {
    let lookup = senses("france|GPE", &[("germany|GPE", 0.9)]);
    let mut embedder = TableEmbedder {
        table: HashMap::new(),
        calls: AtomicUsize::new(0),
    };
    embedder.table.insert("france".into(), vec![1.0, 0.0]);
    embedder.table.insert("germany".into(), vec![0.8, 0.6]);
    let generator = DistractorGenerator::new(lookup, Arc::new(embedder));
    assert!(matches!(
        generator.generate("France"),
        DistractorOutcome::NoDistractors {
            reason: NoDistractorsReason::InvalidEmbeddings(_)
        }
    ));
}

#[test]
fn helpers_normalize_and_present() {
    assert_eq!(normalize_answer("  New   York "), "new_york");
    assert_eq!(capitalize_first("los angeles"), "Los angeles");
    assert_eq!(capitalize_first("iPhone"), "IPhone");
    assert_eq!(capitalize_first(""), "");
    assert_eq!(numeric_value("seven"), Some(7));
    assert_eq!(numeric_value("1,200"), Some(1200));
    assert_eq!(numeric_value("twenty-one"), Some(21));
    assert_eq!(numeric_value("two hundred and five"), Some(205));
    assert_eq!(numeric_value("three thousand"), Some(3000));
    assert_eq!(numeric_value("paris"), None);
}
