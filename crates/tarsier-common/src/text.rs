//! String utilities shared by the accessibility and selector-generation
//! components.

/// Collapse runs of whitespace to single spaces and trim the ends.
///
/// Accessible names and `text=` selector matching both operate on
/// whitespace-normalized text, so the same element text compares equal no
/// matter how the markup was indented.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars() {
        if c.is_whitespace() || c == '\u{200b}' {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c);
        }
    }
    out
}

/// Heuristic for ids that look machine-generated (`:r5:`, `ember-2031`,
/// `x9fK2q`): such ids change between page loads and must not anchor a
/// generated selector.
///
/// The signal is "transition density": how often consecutive characters
/// switch between the character classes lower/upper/digit/other. Words and
/// dash-separated words transition rarely; hashes transition constantly.
#[must_use]
pub fn looks_machine_generated(id: &str) -> bool {
    #[derive(PartialEq, Clone, Copy)]
    enum Class {
        Lower,
        Upper,
        Digit,
        Other,
    }

    fn classify(c: char) -> Class {
        if c.is_ascii_lowercase() {
            Class::Lower
        } else if c.is_ascii_uppercase() {
            Class::Upper
        } else if c.is_ascii_digit() {
            Class::Digit
        } else {
            Class::Other
        }
    }

    if id.is_empty() {
        return true;
    }
    let mut transitions = 0usize;
    let mut digits = 0usize;
    let mut prev: Option<Class> = None;
    let mut len = 0usize;
    for c in id.chars() {
        len += 1;
        let class = classify(c);
        if class == Class::Digit {
            digits += 1;
        }
        if let Some(p) = prev
            && p != class
        {
            transitions += 1;
        }
        prev = Some(class);
    }
    // Short ids with any digit churn, or long ids with dense class
    // transitions, are treated as generated.
    if len <= 3 {
        return digits > 0;
    }
    transitions * 4 >= len * 2 || digits * 2 > len
}

/// Word-boundary-safe prefixes of a normalized string, longest first,
/// used by the selector generator to try shorter text alternatives.
///
/// `"Save all changes now"` yields `["Save all changes now", "Save all
/// changes", "Save all", "Save"]` (capped at `max_words` words for the
/// longest variant).
#[must_use]
pub fn word_prefixes(text: &str, max_words: usize) -> Vec<String> {
    let words: Vec<&str> = text.split(' ').filter(|w| !w.is_empty()).collect();
    let mut out = Vec::new();
    let upper = words.len().min(max_words);
    for count in (1..=upper).rev() {
        out.push(words[..count].join(" "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{looks_machine_generated, normalize_whitespace, word_prefixes};

    #[test]
    fn normalizes_runs_and_trims() {
        assert_eq!(normalize_whitespace("  Save \n\t all  "), "Save all");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn human_ids_survive_the_heuristic() {
        assert!(!looks_machine_generated("login-form"));
        assert!(!looks_machine_generated("main_navigation"));
        assert!(!looks_machine_generated("sidebar"));
    }

    #[test]
    fn generated_ids_are_rejected() {
        assert!(looks_machine_generated("x9fK2qZ8"));
        assert!(looks_machine_generated(":r5:"));
        assert!(looks_machine_generated("a1b2c3d4"));
    }

    #[test]
    fn prefixes_are_longest_first() {
        assert_eq!(
            word_prefixes("Save all changes", 5),
            vec!["Save all changes", "Save all", "Save"]
        );
    }
}
