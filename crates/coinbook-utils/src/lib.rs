//! Utility functions and helpers

/// Group the integer digits of `digits` with commas
fn group_thousands(digits: &str) -> String {
    let mut result = String::new();
    let mut count = 0;
    for c in digits.chars().rev() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(c);
        count += 1;
    }
    result.chars().rev().collect()
}

/// Format a number with thousands separators and `decimals` fraction digits
pub fn format_number(n: f64, decimals: usize) -> String {
    let s = format!("{:.*}", decimals, n.abs());
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s.as_str(), None),
    };

    let mut result = String::new();
    if n < 0.0 && s.chars().any(|c| c.is_ascii_digit() && c != '0') {
        result.push('-');
    }
    result.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        result.push('.');
        result.push_str(frac);
    }
    result
}

/// Format a unit price. Small prices keep more precision; a missing price
/// renders as a dash.
pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) if p.abs() >= 1.0 || p == 0.0 => format_number(p, 2),
        Some(p) => format_number(p, 6),
        None => "-".to_string(),
    }
}

/// Format a free-text amount, leaving it untouched when it is not numeric
pub fn format_amount(amount: &str) -> String {
    match amount.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => format_number(v, 2),
        _ => amount.to_string(),
    }
}

/// Escape text for safe inclusion in HTML content and attributes
pub fn escape_html(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for c in content.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
