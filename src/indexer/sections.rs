//! Article splitter and text normalizer.
//!
//! The extracted buffer is cut in front of every `Article <n>` marker and
//! each piece runs through [`CLEANING_RULES`] in order. Every rule is a pure
//! `&str -> String` transform so it can be tested on its own.
use std::sync::LazyLock;

use regex::Regex;

static ARTICLE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Article\s+\d+").unwrap());
static ARTICLE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(Article\s+\d+):?").unwrap());
static ARTICLE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(Article\s+\d+:)\s*(.*?)\n").unwrap());
static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d+\.\s*").unwrap());
static NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n+").unwrap());
static MULTI_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());
static UPPERCASE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z\s]{2,}\b").unwrap());

/// One article-sized piece of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// 1-based position in emission order.
    pub index: usize,
    pub raw_text: String,
    pub cleaned_text: String,
}

/// A named text transform.
pub type CleaningRule = (&'static str, fn(&str) -> String);

/// Cleaning rules in application order. Later rules rely on the output of
/// earlier ones (the title rule needs the colon, list-marker removal must
/// not see article numbers without their colon).
pub const CLEANING_RULES: [CleaningRule; 7] = [
    ("article_colon", add_article_colon),
    ("article_title", punctuate_article_title),
    ("list_markers", remove_list_markers),
    ("newlines", collapse_newlines),
    ("trim", trim),
    ("spaces", collapse_spaces),
    ("uppercase", remove_uppercase_runs),
];

/// `Article 12` → `Article 12:`; an existing colon is not doubled.
pub fn add_article_colon(text: &str) -> String {
    ARTICLE_NUMBER.replace_all(text, "${1}:").into_owned()
}

/// `Article 12:\nTitle\n` → `Article 12: Title. `
pub fn punctuate_article_title(text: &str) -> String {
    ARTICLE_TITLE.replace_all(text, "${1} ${2}. ").into_owned()
}

/// Drop numbered-list markers such as `1. ` and `23.`.
pub fn remove_list_markers(text: &str) -> String {
    LIST_MARKER.replace_all(text, "").into_owned()
}

pub fn collapse_newlines(text: &str) -> String {
    NEWLINES.replace_all(text, " ").into_owned()
}

pub fn trim(text: &str) -> String {
    text.trim().to_string()
}

pub fn collapse_spaces(text: &str) -> String {
    MULTI_SPACE.replace_all(text, " ").into_owned()
}

/// Strip all-caps runs (page headers and footers such as `EN` or
/// `OFFICIAL JOURNAL OF THE EUROPEAN UNION`).
///
/// Whitespace left dangling by a removal is re-collapsed and trimmed.
pub fn remove_uppercase_runs(text: &str) -> String {
    let stripped = UPPERCASE_RUN.replace_all(text, "");
    if stripped.len() == text.len() {
        return stripped.into_owned();
    }
    collapse_spaces(stripped.trim())
}

fn apply_rules(text: &str) -> String {
    CLEANING_RULES
        .iter()
        .fold(text.to_string(), |acc, (_, rule)| rule(&acc))
}

/// Apply the cleaning rules in order, repeating the pass until the text
/// stops changing.
///
/// Removing an uppercase run can expose a new `<n>.` list marker
/// (`in 1950 ECHR.` → `in 1950.`); the repeat strips it so that cleaning
/// clean text is a no-op. Later passes only remove characters or add a
/// missing article colon, so the loop terminates.
#[must_use]
pub fn clean_section(text: &str) -> String {
    let mut cleaned = apply_rules(text);
    loop {
        let again = apply_rules(&cleaned);
        if again == cleaned {
            return cleaned;
        }
        cleaned = again;
    }
}

/// Cut `raw` immediately before every `Article <n>` marker.
///
/// The marker stays at the head of the piece it introduces. Text before the
/// first marker is returned as its own (possibly empty) piece.
#[must_use]
pub fn split_articles(raw: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for marker in ARTICLE_MARKER.find_iter(raw) {
        pieces.push(&raw[start..marker.start()]);
        start = marker.start();
    }
    pieces.push(&raw[start..]);
    pieces
}

/// Split `raw` into cleaned sections, dropping blank ones.
///
/// Sections keep document order and are numbered from 1.
#[must_use]
pub fn split_and_clean(raw: &str) -> Vec<Section> {
    split_articles(raw)
        .into_iter()
        .filter(|piece| !piece.trim().is_empty())
        .filter_map(|piece| {
            let cleaned = clean_section(piece);
            (!cleaned.trim().is_empty()).then(|| (piece, cleaned))
        })
        .enumerate()
        .map(|(i, (raw_text, cleaned_text))| Section {
            index: i + 1,
            raw_text: raw_text.to_string(),
            cleaned_text,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHARTER_SAMPLE: &str = "CHARTER OF FUNDAMENTAL RIGHTS\nPreamble text of the Union.\n\
Article 1\nHuman dignity\nHuman dignity is inviolable. It must be respected and protected.\n\
Article 2\nRight to life\n1. Everyone has the right to life.\n2. No one shall be condemned to the death penalty, or executed.\n\
EN 18.12.2000 Official Journal of the European Communities C 364/9\n\
Article 3\nRight to the integrity of the person\n1. Everyone has the right to respect for his or her physical and mental integrity.\n";

    #[test]
    fn test_rule_article_colon() {
        assert_eq!(add_article_colon("Article 12\nTitle"), "Article 12:\nTitle");
        assert_eq!(add_article_colon("ARTICLE  3 applies"), "ARTICLE  3: applies");
        assert_eq!(add_article_colon("Article 12:\nTitle"), "Article 12:\nTitle");
    }

    #[test]
    fn test_rule_article_title() {
        assert_eq!(
            punctuate_article_title("Article 1:\nHuman Dignity\nBody"),
            "Article 1: Human Dignity. Body"
        );
        assert_eq!(
            punctuate_article_title("Article 7: Respect for private life\nEveryone"),
            "Article 7: Respect for private life. Everyone"
        );
        // No newline after the title: left alone
        assert_eq!(
            punctuate_article_title("Article 7: Respect for private life"),
            "Article 7: Respect for private life"
        );
    }

    #[test]
    fn test_rule_list_markers() {
        assert_eq!(
            remove_list_markers("1. Everyone has rights.\n2. No one"),
            "Everyone has rights.\nNo one"
        );
        assert_eq!(remove_list_markers("Article 1: Title. Body"), "Article 1: Title. Body");
    }

    #[test]
    fn test_rule_newlines() {
        assert_eq!(collapse_newlines("a\n\n\nb\nc"), "a b c");
    }

    #[test]
    fn test_rule_trim() {
        assert_eq!(trim("  padded \t"), "padded");
    }

    #[test]
    fn test_rule_spaces() {
        assert_eq!(collapse_spaces("a   b \t c"), "a b c");
    }

    #[test]
    fn test_rule_uppercase() {
        assert_eq!(remove_uppercase_runs("Title. EN body"), "Title. body");
        assert_eq!(remove_uppercase_runs("Body text. NOTES"), "Body text.");
        assert_eq!(remove_uppercase_runs("Human dignity"), "Human dignity");
    }

    #[test]
    fn test_split_keeps_marker_with_its_section() {
        let pieces = split_articles("Intro\nArticle 1\nA\narticle 2\nB");
        assert_eq!(pieces, vec!["Intro\n", "Article 1\nA\n", "article 2\nB"]);
    }

    #[test]
    fn test_split_marker_at_start() {
        let pieces = split_articles("Article 1\nA");
        assert_eq!(pieces, vec!["", "Article 1\nA"]);
    }

    #[test]
    fn test_split_requires_digits() {
        assert_eq!(split_articles("see the Article below"), vec!["see the Article below"]);
    }

    #[test]
    fn test_reference_example() {
        let raw = "Article 1\nHuman Dignity\n1. Human dignity is inviolable.\nArticle 2\nRight to Life\n...";
        let sections = split_and_clean(raw);

        assert_eq!(sections.len(), 2);
        assert_eq!(
            sections[0].cleaned_text,
            "Article 1: Human Dignity. Human dignity is inviolable."
        );
        assert!(sections[1].cleaned_text.starts_with("Article 2: Right to Life. "));
        assert_eq!(sections[0].index, 1);
        assert_eq!(sections[1].index, 2);
        assert_eq!(sections[0].raw_text, "Article 1\nHuman Dignity\n1. Human dignity is inviolable.\n");
    }

    #[test]
    fn test_charter_sample() {
        let sections = split_and_clean(CHARTER_SAMPLE);
        let texts: Vec<&str> = sections.iter().map(|s| s.cleaned_text.as_str()).collect();

        assert_eq!(
            texts,
            vec![
                "Preamble text of the Union.",
                "Article 1: Human dignity. Human dignity is inviolable. It must be respected and protected.",
                "Article 2: Right to life. Everyone has the right to life. No one shall be condemned to the death penalty, or executed. 2000 Official Journal of the European Communities364/9",
                "Article 3: Right to the integrity of the person. Everyone has the right to respect for his or her physical and mental integrity.",
            ]
        );
    }

    #[test]
    fn test_marker_preservation() {
        let marker = Regex::new(r"^Article \d+: \S.*?\. ").unwrap();
        let sections = split_and_clean(CHARTER_SAMPLE);
        for section in sections.iter().skip(1) {
            assert!(
                marker.is_match(&section.cleaned_text),
                "section {} lost its marker: {:?}",
                section.index,
                section.cleaned_text
            );
        }
    }

    #[test]
    fn test_no_empty_sections() {
        let raw = "   \nARTICLE HEADER\nArticle 1\nTitle\nText.\n\n\nArticle 2\nOther\nMore.";
        let sections = split_and_clean(raw);
        assert!(!sections.is_empty());
        for section in &sections {
            assert!(!section.cleaned_text.trim().is_empty());
        }
        // Indices stay contiguous after filtering
        let indices: Vec<usize> = sections.iter().map(|s| s.index).collect();
        assert_eq!(indices, (1..=sections.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_all_caps_piece_is_dropped() {
        let sections = split_and_clean("PAGE HEADER\nArticle 1\nTitle\nText.");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].cleaned_text, "Article 1: Title. Text.");
    }

    #[test]
    fn test_split_and_clean_empty() {
        assert!(split_and_clean("").is_empty());
        assert!(split_and_clean(" \n\n ").is_empty());
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(split_and_clean(CHARTER_SAMPLE), split_and_clean(CHARTER_SAMPLE));
    }

    #[test]
    fn test_order_follows_document() {
        let sections = split_and_clean(CHARTER_SAMPLE);
        let numbers: Vec<&str> = sections
            .iter()
            .skip(1)
            .map(|s| s.cleaned_text.split(':').next().unwrap())
            .collect();
        assert_eq!(numbers, vec!["Article 1", "Article 2", "Article 3"]);
    }

    #[test]
    fn test_reclean_is_noop() {
        for section in split_and_clean(CHARTER_SAMPLE) {
            assert_eq!(clean_section(&section.cleaned_text), section.cleaned_text);
        }
    }

    #[test]
    fn test_marker_exposed_by_uppercase_removal() {
        assert_eq!(
            clean_section("Article 6\nRight to liberty\nSigned in 1950 ECHR.\n"),
            "Article 6: Right to liberty. Signed in"
        );
        assert_eq!(clean_section("Body 2 EU."), "Body");
    }

    #[test]
    fn test_reclean_is_noop_after_uppercase_removal() {
        let inputs = [
            "Article 6\nRight to liberty\nSigned in 1950 ECHR.\n",
            "Body 2 EU.",
            "Article 52\nScope\nSee 12 TEU. and 3 OJ C.\n",
            "Article 9\nRight to marry\n1. As in 2000 EN EU. Text.\n",
        ];
        for input in inputs {
            let once = clean_section(input);
            assert_eq!(clean_section(&once), once, "input {input:?}");
        }
    }
}
