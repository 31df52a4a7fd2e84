use itertools::Itertools;

use super::DialogueTurn;

/// Pairs consecutive non-empty lines. An odd trailing line is dropped and the
/// result is shorter than `expected_count` when the text runs out.
pub fn extract(text: &str, expected_count: usize) -> Vec<DialogueTurn> {
    text.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .tuples()
        .map(|(speaker_a, speaker_b)| DialogueTurn::new(speaker_a, speaker_b))
        .take(expected_count)
        .collect()
}
