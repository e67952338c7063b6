/// Canonical spelling used to compare region names across sources.
///
/// Strips byte-order marks and zero-width spaces, drops quote and bracket
/// punctuation, treats hyphens and underscores as spaces, collapses runs of
/// whitespace, and upper-cases ASCII letters.
pub fn normalize_name(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, '\u{feff}' | '\u{200b}' | '.' | ',' | '\'' | '"' | '(' | ')'))
        .map(|c| match c {
            '-' | '_' | '\u{2013}' | '\u{2014}' => ' ',
            other => other,
        })
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_ascii_uppercase()
}
