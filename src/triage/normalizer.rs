use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Marks the joint of a decimal written with `.` or `,`.
pub const DECIMAL_MARK: char = '_';

static DECIMAL_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d)[.,](\d)").expect("valid decimal separator pattern"));

/// Canonical form used for every keyword and vocabulary comparison.
///
/// Accents are stripped through NFKD decomposition, anything outside ASCII is
/// dropped, the text is lowercased, and every run of punctuation or whitespace
/// becomes a single space. Underscores count as word characters.
pub fn normalize_text(value: &str) -> String {
    let folded: String = value
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    folded
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalizes free-text anamnesis while keeping decimals readable.
///
/// A separator sitting between two digits becomes [`DECIMAL_MARK`] before
/// normalization, so `39,5` survives as `39_5`. Separators followed by a space
/// (`9, 40 kg`) are ordinary punctuation and still split the numbers.
pub fn normalize_anamnesis(value: &str) -> String {
    let marked = DECIMAL_SEPARATOR.replace_all(value, format!("${{1}}{DECIMAL_MARK}${{2}}"));
    normalize_text(&marked)
}

/// Missing values normalize to the empty string.
pub fn normalize_optional(value: Option<&str>) -> String {
    value.map(normalize_text).unwrap_or_default()
}
