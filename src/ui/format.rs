/// `1234567.891` → `1,234,567.89` for `decimals = 2`.
pub fn format_with_commas(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let negative = value < 0.0 && formatted.chars().any(|c| c != '0' && c != '.');
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

pub fn format_count(value: usize) -> String {
    format_with_commas(value as f64, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_with_commas(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_with_commas(999.0, 2), "999.00");
        assert_eq!(format_with_commas(1000.0, 0), "1,000");
        assert_eq!(format_with_commas(0.0, 2), "0.00");
        assert_eq!(format_with_commas(-12345.5, 1), "-12,345.5");
        assert_eq!(format_count(1_000_000), "1,000,000");
    }
}
