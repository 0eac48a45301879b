use once_cell::sync::Lazy;
use regex::Regex;

/// Street-suffix and state abbreviations expanded during normalization
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("rd", "road"),
    ("dr", "drive"),
    ("st", "street"),
    ("ave", "avenue"),
    ("blvd", "boulevard"),
    ("ln", "lane"),
    ("ct", "court"),
    ("pkwy", "parkway"),
    ("ste", "suite"),
    ("fl", "florida"),
];

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

static ABBREVIATION_WORD: Lazy<Regex> = Lazy::new(|| {
    let alternation = ABBREVIATIONS
        .iter()
        .map(|(short, _)| *short)
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).expect("static regex")
});

/// Canonicalize a free-text address into a join key
///
/// Lower-cases, trims, collapses whitespace runs and expands the
/// abbreviations in [`ABBREVIATIONS`] when they appear as whole words.
/// Total: any input produces some key, and normalizing a key again is a
/// no-op.
pub fn normalize_address(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let collapsed = WHITESPACE.replace_all(&lowered, " ");

    ABBREVIATION_WORD
        .replace_all(&collapsed, |caps: &regex::Captures| {
            let word = &caps[0];
            expand(word).unwrap_or(word).to_string()
        })
        .into_owned()
}

#[inline]
fn expand(word: &str) -> Option<&'static str> {
    ABBREVIATIONS
        .iter()
        .find(|(short, _)| short.eq_ignore_ascii_case(word))
        .map(|(_, long)| *long)
}
