//! Parsing of amounts, quantities and descriptions from supplier exports.

/// Parses a currency cell such as `"$1,234.50"` or `"£ 12"`.
///
/// Everything except ASCII digits and the decimal point is dropped; a cell
/// with nothing left is zero. Returns `None` when what remains is not a
/// number (for example two decimal points).
pub fn clean_amount(raw: &str) -> Option<f64> {
    let kept: String = raw
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.')
        .collect();
    if kept.is_empty() {
        return Some(0.0);
    }
    kept.parse::<f64>().ok()
}

/// Parses an amount from a prepared dataset.
///
/// Currency symbols, whitespace and thousands separators are dropped. The
/// sign, decimal point and exponent are kept, so `"-10"` and `"1e-05"`
/// read back as written. Empty cells and any other character give `None`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let mut kept = String::with_capacity(raw.len());
    for ch in raw.trim().chars() {
        match ch {
            '0'..='9' | '.' | '-' | '+' | 'e' | 'E' => kept.push(ch),
            ',' | '$' | '£' | '€' | '¥' | '¤' => {}
            ch if ch.is_whitespace() => {}
            _ => return None,
        }
    }
    let value = kept.parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

/// Parses an order quantity. Accepts `"12"`, `"1,200"` and whole floats
/// like `"12.0"`; rejects fractional or empty values.
pub fn parse_quantity(raw: &str) -> Option<i64> {
    let cleaned: String = raw.trim().chars().filter(|ch| *ch != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    if let Ok(value) = cleaned.parse::<i64>() {
        return Some(value);
    }
    let value = cleaned.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

/// Trims and collapses runs of whitespace to a single space.
pub fn normalize_description(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when the code is non-empty and made only of ASCII digits.
pub fn is_numeric_code(code: &str) -> bool {
    let code = code.trim();
    !code.is_empty() && code.chars().all(|ch| ch.is_ascii_digit())
}
