/*!
 * Tests for boundary detection and semantic chunking
 */

use adaptrans::translation::boundary::{self, BoundaryKind};
use adaptrans::translation::chunker::{self, ChunkerConfig, SemanticChunker};
use adaptrans::translation::document::reassemble;

use crate::common::sample_text;

/// Generated text is stable across calls and shaped into paragraphs
#[test]
fn test_sampleText_shouldBeDeterministic() {
    let text = sample_text(1_000);
    assert_eq!(text, sample_text(1_000));
    assert!(text.len() >= 1_000);
    assert!(text.split("\n\n").count() >= 3);
    assert!(sample_text(2_000).starts_with(&text));
}

/// Chunks reassemble to the input for every size
#[test]
fn test_chunk_withGeneratedText_shouldRoundTrip() {
    let text = sample_text(5_000);
    for size in [1, 10, 64, 200, 999, 4_000, 10_000] {
        let chunks = chunker::chunk(&text, size);
        assert_eq!(reassemble(&chunks), text, "size {}", size);
        assert_eq!(chunks.first().map(|c| c.start_offset), Some(0));
        assert_eq!(chunks.last().map(|c| c.end_offset), Some(text.len()));
    }
}

/// Multi-byte text never gets cut inside a character
#[test]
fn test_chunk_withMixedScripts_shouldRoundTrip() {
    let text = "Grüße aus Köln. Ça va très bien! 東京は晴れです。Привет, мир.\n\nΚαλημέρα σας.";
    for size in [1, 3, 8, 20, 100] {
        let chunks = chunker::chunk(text, size);
        assert_eq!(reassemble(&chunks), text, "size {}", size);
        for c in &chunks {
            assert!(text.is_char_boundary(c.start_offset));
            assert!(text.is_char_boundary(c.end_offset));
        }
    }
}

/// Text at or below the size is one chunk covering everything
#[test]
fn test_chunk_withShortText_shouldReturnOneChunk() {
    let text = sample_text(300);
    let chunks = chunker::chunk(&text, text.chars().count());
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, text);
}

/// With ordinary words no chunk exceeds the size
#[test]
fn test_chunk_withOrdinaryWords_shouldRespectMaxSize() {
    let text = sample_text(3_000);
    for size in [40, 120, 500] {
        let chunks = chunker::chunk(&text, size);
        assert!(chunks.iter().all(|c| c.char_len() <= size), "size {}", size);
    }
}

/// Sentence ends win over word breaks when the window has one
#[test]
fn test_chunk_withRoomForSentence_shouldEndOnSentence() {
    let text = sample_text(2_000);
    let chunks = chunker::chunk(&text, 150);
    for c in &chunks[..chunks.len() - 1] {
        let trimmed = c.text.trim_end();
        assert!(trimmed.ends_with('.'), "chunk {} ends with {:?}", c.index, trimmed);
    }
}

/// The chunker is deterministic
#[test]
fn test_chunk_calledTwice_shouldGiveSameChunks() {
    let text = sample_text(2_500);
    let chunker = SemanticChunker::new(ChunkerConfig::default());
    assert_eq!(chunker.chunk(&text, 300), chunker.chunk(&text, 300));
}

/// Candidates are ordered and bracketed by the hard ends
#[test]
fn test_detect_shouldOrderCandidatesAndMarkEnds() {
    let text = "First sentence here. Second one, with a clause.\n\nNew paragraph.";
    let candidates = boundary::detect(text);

    assert!(candidates.windows(2).all(|w| w[0].offset < w[1].offset));
    assert_eq!(candidates.first().map(|c| c.offset), Some(0));
    assert_eq!(candidates.last().map(|c| c.offset), Some(text.len()));
    assert!(candidates.first().is_some_and(|c| c.is_hard()));

    let kinds: Vec<BoundaryKind> = candidates.iter().map(|c| c.kind).collect();
    assert!(kinds.contains(&BoundaryKind::Paragraph));
    assert!(kinds.contains(&BoundaryKind::Sentence));
    assert!(kinds.contains(&BoundaryKind::Clause));
}

/// Paragraph > sentence > clause > word
#[test]
fn test_boundaryKind_strength_shouldBeOrdered() {
    assert!(BoundaryKind::Paragraph.strength() > BoundaryKind::Sentence.strength());
    assert!(BoundaryKind::Sentence.strength() > BoundaryKind::Clause.strength());
    assert!(BoundaryKind::Clause.strength() > BoundaryKind::Word.strength());
}
