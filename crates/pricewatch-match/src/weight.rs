//! Weight/quantity canonicalization and the binary compatibility check used
//! to gate matches.

/// Canonicalize a raw weight string: lowercase, strip whitespace, parens and
/// the word "pack", and map unit synonyms to a canonical short form
/// (ltr/litre/litres → l, gms/gm → g, kgs → kg).
#[must_use]
pub fn normalize_weight(raw: &str) -> String {
    let compact: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '(' && *c != ')')
        .collect();
    let compact = compact.replace("pack", "");

    // Longest synonym first so "litres" is not left as "les" by a shorter
    // replacement.
    compact
        .replace("litres", "l")
        .replace("litre", "l")
        .replace("liters", "l")
        .replace("liter", "l")
        .replace("ltr", "l")
        .replace("kgs", "kg")
        .replace("gms", "g")
        .replace("gm", "g")
}

/// Split a normalized weight into a numeric value and a unit via a
/// digits-then-letters scan, e.g. `"1.5l"` → `(1.5, "l")`.
///
/// Returns `None` when there is no leading number or the remainder contains
/// anything but letters.
fn parse_weight(normalized: &str) -> Option<(f64, String)> {
    let digits_end = normalized
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit() && *c != '.')
        .map_or(normalized.len(), |(i, _)| i);
    if digits_end == 0 {
        return None;
    }

    let value: f64 = normalized[..digits_end].parse().ok()?;
    let unit = &normalized[digits_end..];
    if !unit.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some((value, unit.to_string()))
}

fn values_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// Exact/binary weight compatibility.
///
/// A missing or empty weight on either side is "unknown, assume compatible"
/// so absent metadata never blocks matching on name alone. Otherwise both
/// sides are normalized; string equality passes, and numeric comparison
/// supports exactly the kg↔g and l↔ml conversions. Anything unparseable or
/// any other unit mismatch is incompatible.
#[must_use]
pub fn weights_match(a: Option<&str>, b: Option<&str>) -> bool {
    let (Some(a), Some(b)) = (a, b) else {
        return true;
    };
    if a.trim().is_empty() || b.trim().is_empty() {
        return true;
    }

    let na = normalize_weight(a);
    let nb = normalize_weight(b);
    if na == nb {
        return true;
    }

    let (Some((va, ua)), Some((vb, ub))) = (parse_weight(&na), parse_weight(&nb)) else {
        return false;
    };

    if ua == ub {
        return values_equal(va, vb);
    }
    match (ua.as_str(), ub.as_str()) {
        ("kg", "g") | ("l", "ml") => values_equal(va * 1000.0, vb),
        ("g", "kg") | ("ml", "l") => values_equal(va, vb * 1000.0),
        _ => false,
    }
}
