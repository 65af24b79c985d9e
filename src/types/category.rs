//! Canonical service categories (TV / Fibra split)

use serde::{Deserialize, Serialize};

use crate::normalize;

/// Product line an order belongs to, derived once from its subtype text.
///
/// The export only carries free-text subtypes (`"Corretiva Fibra"`,
/// `"Instalação TV HD"`, ...). Reopening breakdowns and goal rules work on
/// this enum instead of on the raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    Tv,
    Fibra,
    Other,
}

impl ServiceCategory {
    /// Classify a subtype (already folded or raw) using keyword lists.
    ///
    /// Keywords go through `normalize::contains_keyword`. TV wins when both
    /// lists match, since combo subtypes are billed as TV.
    pub fn classify(subtype: &str, tv_keywords: &[String], fibra_keywords: &[String]) -> Self {
        let key = normalize::fold(subtype);
        if key.is_empty() {
            return Self::Other;
        }
        if tv_keywords.iter().any(|k| normalize::contains_keyword(&key, k)) {
            Self::Tv
        } else if fibra_keywords.iter().any(|k| normalize::contains_keyword(&key, k)) {
            Self::Fibra
        } else {
            Self::Other
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Tv => "TV",
            Self::Fibra => "Fibra",
            Self::Other => "Outros",
        }
    }
}

impl std::fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_classify_tv_and_fibra() {
        let tv = kw(&["tv"]);
        let fibra = kw(&["fibra", "ftth"]);
        assert_eq!(ServiceCategory::classify("Corretiva TV", &tv, &fibra), ServiceCategory::Tv);
        assert_eq!(ServiceCategory::classify("Corretiva Fibra", &tv, &fibra), ServiceCategory::Fibra);
        assert_eq!(ServiceCategory::classify("FTTH Residencial", &tv, &fibra), ServiceCategory::Fibra);
        assert_eq!(ServiceCategory::classify("Telefonia", &tv, &fibra), ServiceCategory::Other);
    }

    #[test]
    fn test_short_keyword_requires_word_boundary() {
        let tv = kw(&["tv"]);
        assert_eq!(ServiceCategory::classify("Atvd interna", &tv, &[]), ServiceCategory::Other);
        assert_eq!(ServiceCategory::classify("TV/Fibra combo", &tv, &[]), ServiceCategory::Tv);
    }

    #[test]
    fn test_empty_subtype_is_other() {
        assert_eq!(ServiceCategory::classify("  ", &kw(&["tv"]), &kw(&["fibra"])), ServiceCategory::Other);
    }
}
