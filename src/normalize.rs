//! Text folding for free-text labels coming out of the work-order export.
//!
//! Status, type, subtype and reason columns are typed by hand in the field
//! system, so the same label shows up as `"Finalizada"`, `" FINALIZADA "`
//! or `"finalizáda"`. Every comparison in the engine goes through [`fold`]
//! so those collapse to one key.

/// Fold a label into its comparison key.
///
/// Steps, in order:
/// - trim leading/trailing whitespace
/// - collapse internal whitespace runs to a single space
/// - lowercase
/// - strip Latin-1 / Portuguese diacritics (`ã` → `a`, `ç` → `c`, ...)
pub fn fold(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        for c in word.chars().flat_map(char::to_lowercase) {
            out.push(strip_accent(c));
        }
    }
    out
}

/// Fold every entry of a configured list, dropping entries that fold to
/// an empty key.
pub fn fold_all(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| fold(s))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Fold and join the non-empty parts with `|`.
///
/// Used to build composite identity keys (address, city + neighborhood).
pub fn fold_joined<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(fold)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("|")
}

/// Whether a folded text contains a keyword.
///
/// Keywords of three characters or fewer must match a whole word (`"tv"`
/// must not hit `"atvd"`); longer ones match as plain substrings.
pub fn contains_keyword(folded: &str, keyword: &str) -> bool {
    let keyword = fold(keyword);
    if keyword.is_empty() {
        return false;
    }
    if keyword.chars().count() <= 3 {
        folded
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == keyword)
    } else {
        folded.contains(&keyword)
    }
}

fn strip_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}
