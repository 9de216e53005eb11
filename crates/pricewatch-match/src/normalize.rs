//! Product-name normalization for similarity scoring.
//!
//! Manual character scanning rather than `regex` to stay dependency-light;
//! grocery names are short and the stoplists are fixed.

/// Packaging words that carry no identity signal. "tetra pack" is covered by
/// listing both halves; "pack" also appears alone ("Pack of 4").
const PACKAGING_STOPWORDS: &[&str] = &[
    "tetra", "pouch", "tub", "bottle", "carton", "box", "tin", "can", "jar", "packet", "sachet",
    "pack", "pcs", "pieces", "piece", "of", "and", "with",
];

/// Unit words stripped from names; quantity comparison happens on the
/// dedicated weight field, not the name.
const UNIT_STOPWORDS: &[&str] = &[
    "kg", "kgs", "g", "gm", "gms", "gram", "grams", "ml", "ltr", "litre", "litres", "liter",
    "liters", "l",
];

/// Canonicalize a raw product name for comparison.
///
/// Lowercases, removes parenthesized/bracketed substrings, collapses
/// non-alphanumeric characters to spaces, drops packaging and unit
/// stopwords, and collapses whitespace. Total function: never fails, and an
/// empty input yields an empty string. Idempotent — normalizing its own
/// output is a fixed point.
#[must_use]
pub fn normalize_name(raw: &str) -> String {
    let lower = raw.to_lowercase();

    // Strip (...) and [...] content, tracking nesting per delimiter kind.
    // Unbalanced closers are dropped as noise.
    let mut stripped = String::with_capacity(lower.len());
    let mut paren_depth = 0u32;
    let mut bracket_depth = 0u32;
    for c in lower.chars() {
        match c {
            '(' => paren_depth += 1,
            ')' => paren_depth = paren_depth.saturating_sub(1),
            '[' => bracket_depth += 1,
            ']' => bracket_depth = bracket_depth.saturating_sub(1),
            _ if paren_depth == 0 && bracket_depth == 0 => stripped.push(c),
            _ => {}
        }
    }

    let spaced: String = stripped
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();

    spaced
        .split_whitespace()
        .filter(|token| !PACKAGING_STOPWORDS.contains(token) && !UNIT_STOPWORDS.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tokenize a raw name for set-overlap scoring: normalize, split on
/// whitespace, and drop tokens of length ≤ 1.
#[must_use]
pub fn name_tokens(raw: &str) -> Vec<String> {
    normalize_name(raw)
        .split_whitespace()
        .filter(|t| t.len() > 1)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_parentheses_and_units() {
        let normalized = normalize_name("Amul Taaza Milk (Tetra Pack) 1 Ltr");
        assert_eq!(normalized, "amul taaza milk 1");
        assert!(!normalized.contains('('));
        assert!(!normalized.contains("ltr"));
        assert!(!normalized.contains("tetra"));
    }

    #[test]
    fn strips_bracketed_content() {
        assert_eq!(
            normalize_name("Maggi Noodles [Masala] 70 g"),
            "maggi noodles 70"
        );
    }

    #[test]
    fn collapses_punctuation_to_spaces() {
        // The orphaned "s" survives normalization; the tokenizer drops it.
        assert_eq!(
            normalize_name("Lay's Classic - Salted, Chips"),
            "lay s classic salted chips"
        );
        assert_eq!(
            name_tokens("Lay's Classic - Salted, Chips"),
            vec!["lay", "classic", "salted", "chips"]
        );
    }

    #[test]
    fn drops_packaging_words() {
        assert_eq!(
            normalize_name("Pack of 4 Dairy Milk Chocolate Bottle"),
            "4 dairy milk chocolate"
        );
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("   "), "");
        assert_eq!(normalize_name("(only noise)"), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        let inputs = [
            "Amul Taaza Milk (Tetra Pack) 1 Ltr",
            "Lay's Classic Salted 52g",
            "Pack of 2 [Combo] Tata Salt 1kg",
        ];
        for raw in inputs {
            let once = normalize_name(raw);
            assert_eq!(normalize_name(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn tokens_drop_short_fragments() {
        // "1" survives normalization but is too short to be a token.
        let tokens = name_tokens("Amul Taaza Milk 1 Ltr");
        assert_eq!(tokens, vec!["amul", "taaza", "milk"]);
    }

    #[test]
    fn tokens_of_empty_name_are_empty() {
        assert!(name_tokens("").is_empty());
    }

    #[test]
    fn nested_parentheses_are_fully_removed() {
        assert_eq!(normalize_name("Milk ((UHT) Long Life) 1l"), "milk");
    }
}
