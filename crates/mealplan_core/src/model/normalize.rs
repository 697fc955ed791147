//! Text normalization shared by catalog, pantry and aggregation code.
//!
//! # Invariants
//! - Normalization is idempotent: `f(f(x)) == f(x)`.
//! - Blank input normalizes to `None`, never to an empty string.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Trims and collapses inner whitespace of a display name.
pub fn normalize_name(value: &str) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(value.trim(), " ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed.into_owned())
    }
}

/// Case-folded lookup key for a display name.
///
/// Folds every Unicode letter, so `Éclair` and `éclair` share a key.
pub fn name_key(value: &str) -> Option<String> {
    normalize_name(value).map(|value| value.to_lowercase())
}

/// Normalizes a unit label: trimmed, lowercase, single inner spaces.
///
/// Two units are compatible exactly when their normalized forms are equal;
/// no conversion between units is ever attempted.
pub fn normalize_unit(unit: &str) -> Option<String> {
    normalize_name(unit).map(|value| value.to_lowercase())
}

/// Returns whether two unit labels denote the same unit.
pub fn units_compatible(left: &str, right: &str) -> bool {
    match (normalize_unit(left), normalize_unit(right)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

/// Normalizes one label value.
pub fn normalize_label(label: &str) -> Option<String> {
    normalize_name(label).map(|value| value.to_lowercase())
}

/// Normalizes, deduplicates and sorts label values. Blank labels are dropped.
pub fn normalize_labels(labels: &[String]) -> Vec<String> {
    let mut unique = BTreeSet::new();
    for label in labels {
        if let Some(value) = normalize_label(label) {
            unique.insert(value);
        }
    }
    unique.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::{name_key, normalize_labels, normalize_name, normalize_unit, units_compatible};

    #[test]
    fn name_collapses_whitespace_and_keeps_case() {
        assert_eq!(
            normalize_name("  Olive   Oil ").as_deref(),
            Some("Olive Oil")
        );
        assert_eq!(normalize_name(" \t "), None);
    }

    #[test]
    fn name_key_folds_non_ascii_letters() {
        assert_eq!(name_key("  Éclair ").as_deref(), Some("éclair"));
        assert_eq!(name_key("ÉCLAIR"), name_key("éclair"));
        assert_eq!(name_key("   "), None);
    }

    #[test]
    fn unit_normalization_is_case_insensitive() {
        assert_eq!(normalize_unit(" Cups ").as_deref(), Some("cups"));
        assert!(units_compatible("Fl  Oz", "fl oz"));
        assert!(!units_compatible("cups", "cup"));
        assert!(!units_compatible("", ""));
    }

    #[test]
    fn labels_are_deduplicated_and_sorted() {
        let labels = vec![
            "Vegan".to_string(),
            " quick ".to_string(),
            "vegan".to_string(),
            "  ".to_string(),
        ];
        assert_eq!(
            normalize_labels(&labels),
            vec!["quick".to_string(), "vegan".to_string()]
        );
    }
}
