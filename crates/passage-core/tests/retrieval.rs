use passage_core::chunk::chunk_text;
use passage_core::lexical::LexicalScorer;
use passage_core::retrieve::{select_strategy, Retriever, Strategy, DEFAULT_TOP_K};
use passage_core::session::ContextSession;
use passage_core::vector::VectorIndex;
use proptest::prelude::*;

fn to_strings(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|t| t.to_string()).collect()
}

/// A corpus of exactly `n` characters that mentions "phoenix" once, at the end.
fn corpus_of_len(n: usize) -> String {
    let tail = " phoenix feather";
    let mut text = "a".repeat(n - tail.len());
    text.push_str(tail);
    assert_eq!(text.chars().count(), n);
    text
}

proptest! {
    #[test]
    fn prop_chunks_reconstruct_input(text in "(?s).{0,400}", size in 1usize..64) {
        let chunks = chunk_text(&text, size);
        prop_assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn prop_chunks_bounded(text in "[a-z .\n]{0,400}", size in 1usize..64) {
        for c in chunk_text(&text, size) {
            prop_assert!(c.chars().count() <= size);
        }
    }

    #[test]
    fn prop_short_text_single_chunk(text in "(?s).{0,50}") {
        let size = text.chars().count().max(1);
        prop_assert_eq!(chunk_text(&text, size), vec![text.clone()]);
    }

    #[test]
    fn prop_lexical_excludes_non_matching(query in "[a-z]{3,6}") {
        let chunks = to_strings(&["zzzz qqqq", "xxxx yyyy", "vvvv wwww"]);
        let hits = LexicalScorer::new(&chunks).rank(&query, 3);
        for h in hits {
            prop_assert!(chunks[h.index].to_lowercase().contains(&query));
        }
    }
}

#[test]
fn test_adversarial_no_boundaries_terminates() {
    let text = "é".repeat(10_001);
    let chunks = chunk_text(&text, 100);
    assert_eq!(chunks.len(), 101);
    assert_eq!(chunks.concat(), text);
}

#[test]
fn test_paragraph_scenario() {
    let chunks = chunk_text("Para one.\n\nPara two.\n\nPara three.", 12);
    assert_eq!(chunks, vec!["Para one.\n\n", "Para two.\n\n", "Para three."]);
}

#[test]
fn test_wand_scenario_top_two() {
    let chunks = to_strings(&[
        "Harry used his wand.",
        "Ron ate breakfast.",
        "Hermione read a wand-care book.",
    ]);
    let hits = LexicalScorer::new(&chunks).rank("wand", 2);
    let found: Vec<&str> = hits.iter().map(|h| chunks[h.index].as_str()).collect();
    assert_eq!(
        found,
        vec!["Harry used his wand.", "Hermione read a wand-care book."]
    );
}

#[test]
fn test_lexical_idempotent() {
    let mut session = ContextSession::new();
    session.load(
        "The owl flew.\n\nA letter came.\n\nThe owl brought a letter.",
        30,
    );
    let first: Vec<String> = session
        .search("owl letter", DEFAULT_TOP_K)
        .into_iter()
        .map(String::from)
        .collect();
    let second: Vec<String> = session
        .search("owl letter", DEFAULT_TOP_K)
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(first, second);
    assert_eq!(first[0], "The owl brought a letter.");
}

#[test]
fn test_empty_session_search() {
    let mut session = ContextSession::new();
    assert!(session.search("anything at all", 3).is_empty());
}

#[test]
fn test_router_boundary_exact() {
    assert_eq!(select_strategy(5000), Strategy::Lexical);
    assert_eq!(select_strategy(5001), Strategy::Vector);

    let mut session = ContextSession::new();
    session.load(corpus_of_len(5000), 1000);
    assert_eq!(session.strategy(), Strategy::Lexical);
    assert!(!session.search("phoenix", 1).is_empty());
    assert!(!session.has_current_index());

    session.load(corpus_of_len(5001), 1000);
    assert_eq!(session.strategy(), Strategy::Vector);
    assert!(!session.search("phoenix", 1).is_empty());
    assert!(session.has_current_index());
}

#[test]
fn test_vector_order_non_increasing() {
    let chunks = to_strings(&[
        "Snape brewed a potion in the dungeon.",
        "The potion smelled of pepper.",
        "Hagrid fed the hippogriff.",
        "Potion class, potion homework, potion exam.",
    ]);
    let index = VectorIndex::build(&chunks);
    let hits = index.rank("potion dungeon", 4);
    assert!(hits.len() >= 2);
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(hits.iter().all(|h| h.score > 0.0 && h.index != 2));
}
