//! Canonical folder names for libraries.
//!
//! [`normalize`] is the only place a human-readable library name is turned
//! into the name of its directory. Folder operations and duplicate checks both
//! compare normalized forms, so "Les Géants" and "LES GEANTS" address the same
//! folder.

use unicode_general_category::{get_general_category, GeneralCategory};
use unicode_normalization::UnicodeNormalization;

const SEPARATORS: [char; 2] = ['/', '\\'];

/// Replacement for separators found inside a name.
const SEPARATOR_REPLACEMENT: char = '_';

/// Normalize a display name into a diacritic-free, upper-cased folder name.
///
/// Leading and trailing whitespace and path separators are removed; separators
/// inside the name are replaced so the result is always a single path
/// component. The transform is idempotent.
///
/// ```
/// use core_library::normalize::normalize;
///
/// assert_eq!(normalize("Les Géants"), "LES GEANTS");
/// assert_eq!(normalize("café"), normalize("CAFE"));
/// assert_eq!(normalize(""), "");
/// ```
pub fn normalize(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    // Upper-casing first: a few code points only gain combining marks when
    // upper-cased (e.g. U+01F0), and those must be stripped as well.
    let upper = input.to_uppercase();
    let stripped: String = upper.nfd().filter(|c| !is_diacritic(*c)).nfc().collect();

    stripped
        .trim_matches(|c: char| c.is_whitespace() || SEPARATORS.contains(&c))
        .chars()
        .map(|c| {
            if SEPARATORS.contains(&c) {
                SEPARATOR_REPLACEMENT
            } else {
                c
            }
        })
        .collect()
}

/// Only nonspacing marks (Mn) are dropped. Spacing marks (Mc) such as
/// Devanagari vowel signs carry the spelling of a word and are kept.
fn is_diacritic(c: char) -> bool {
    get_general_category(c) == GeneralCategory::NonspacingMark
}

/// True when a normalized name cannot be used as a folder name.
pub(crate) fn is_unusable_folder_name(normalized: &str) -> bool {
    normalized.is_empty() || normalized == "." || normalized == ".."
}
