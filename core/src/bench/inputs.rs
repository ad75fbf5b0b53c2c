//! Per-node input files.
//!
//! Each line is a run of space-separated words no longer than
//! `max_line_bytes`. The generator is seeded from the node index, so the same
//! settings always produce the same file.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::types::config::InputSettings;

const WORDS: &[&str] = &[
    "apple", "orange", "banana", "grape", "melon", "kiwi", "pear", "peach",
    "table", "chair", "window", "book", "paper", "light", "phone", "clock",
    "green", "blue", "red", "white", "black", "silver", "gold", "yellow",
    "river", "mountain", "forest", "desert", "ocean", "valley", "sky", "cloud",
];

/// Build one line: keep drawing words until the next one would not fit.
fn line(rng: &mut StdRng, max_bytes: usize) -> String {
    let mut line = String::new();
    while let Some(word) = WORDS.choose(rng) {
        let sep = if line.is_empty() { 0 } else { 1 };
        if line.len() + sep + word.len() > max_bytes {
            break;
        }
        if sep == 1 {
            line.push(' ');
        }
        line.push_str(word);
    }
    line
}

/// Content of `input_<index>.txt`, newline-terminated.
pub fn input_content(index: usize, settings: &InputSettings) -> String {
    let mut rng = StdRng::seed_from_u64(index as u64);
    let mut out = String::new();
    for _ in 0..settings.lines_per_file {
        out.push_str(&line(&mut rng, settings.max_line_bytes));
        out.push('\n');
    }
    out
}


#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> InputSettings {
        InputSettings {
            lines_per_file: 100,
            max_line_bytes: 31,
        }
    }

    #[test]
    fn lines_respect_the_byte_limit() {
        let content = input_content(3, &settings());
        assert_eq!(content.lines().count(), 100);
        for l in content.lines() {
            assert!(l.len() <= 31, "line too long: {:?}", l);
            assert!(!l.is_empty());
            assert!(l.split(' ').all(|w| WORDS.contains(&w)));
        }
    }

    #[test]
    fn same_index_same_content() {
        assert_eq!(input_content(7, &settings()), input_content(7, &settings()));
        assert_ne!(input_content(0, &settings()), input_content(1, &settings()));
    }

    #[test]
    fn tiny_limit_gives_empty_lines() {
        let s = InputSettings {
            lines_per_file: 2,
            max_line_bytes: 2,
        };
        assert_eq!(input_content(0, &s), "\n\n");
    }
}
