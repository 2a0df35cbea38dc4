/// Turns a Brazilian-formatted decimal ("1.234,56") into "1234.56".
///
/// Every `.` is dropped as a thousands separator, then the first `,` becomes
/// the decimal point. No grouping validation happens here: "1,2,3" comes out
/// as "1.2,3" and fails later when parsed.
pub fn normalize_brazilian_number(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    raw.replace('.', "").replacen(',', ".", 1)
}

/// Normalizes a value typed by hand.
///
/// Text with a comma is read as Brazilian notation, anything else is kept
/// as a plain decimal so "1234.56" stays 1234.56.
pub fn normalize_manual_entry(raw: &str) -> String {
    let raw = raw.trim();
    if raw.contains(',') {
        normalize_brazilian_number(raw)
    } else {
        raw.to_string()
    }
}

/// Parses an already normalized decimal. Blank and non-finite input is `None`.
pub fn parse_decimal(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Same as `parse_decimal` but blank or broken text counts as zero.
pub fn parse_or_zero(s: &str) -> f64 {
    parse_decimal(s).unwrap_or(0.0)
}

/// Inverse of the normalizer for already normalized text ("1234.56" -> "1234,56").
pub fn to_brazilian_text(normalized: &str) -> String {
    normalized.replace('.', ",")
}

/// Formats an amount as Brazilian reais, e.g. `R$ 1.234,56`.
pub fn format_brl(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let cents = (value.abs() * 100.0).round() as u64;
    let units = cents / 100;
    let fraction = cents % 100;

    let digits = units.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}R$ {grouped},{fraction:02}")
}
