//! Label escaping for Newick output.

/// Characters that end an unquoted Newick label
const NEWICK_SPECIAL_CHARS: &[char] = &[',', ';', '\t', '\n', '\r', '(', ')', ':', '[', ']', '\''];

/// Escapes a taxon label for safe use in a Newick string.
///
/// Labels containing punctuation or delimiters are wrapped in single quotes,
/// with internal single quotes doubled. Otherwise spaces become underscores.
///
/// # Examples
/// ```
/// # use protracted_speciation::newick::escape_label;
/// assert_eq!(escape_label("S4.L12"), "S4.L12");
/// assert_eq!(escape_label("Pu[ke]ko"), "'Pu[ke]ko'");
/// assert_eq!(escape_label("Australasian Swamphen"), "Australasian_Swamphen");
/// assert_eq!(escape_label("Baillon's Crake"), "'Baillon''s Crake'");
/// ```
pub fn escape_label(label: &str) -> String {
    if label.contains(NEWICK_SPECIAL_CHARS) {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.replace(' ', "_")
    }
}
