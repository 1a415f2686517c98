// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

/// Whole Colombian pesos in the es-CO style: `$1.234.567`.
pub fn format_cop(pesos: i64) -> String {
    let (sign, pesos) = normalize_sign(pesos);
    format!("{sign}${}", group_thousands(pesos, '.'))
}

/// Rounds to the nearest peso before formatting.
pub fn format_cop_f64(pesos: f64) -> String {
    if !pesos.is_finite() {
        return "$0".to_owned();
    }
    format_cop(pesos.round() as i64)
}

/// Plain integer with comma grouping, for energy and power figures.
pub fn format_count(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_owned();
    }
    let (sign, value) = normalize_sign(value.round() as i64);
    format!("{sign}{}", group_thousands(value, ','))
}

fn group_thousands(value: u64, separator: char) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

fn normalize_sign(value: i64) -> (&'static str, u64) {
    if value < 0 {
        ("-", value.unsigned_abs())
    } else {
        ("", value.unsigned_abs())
    }
}

#[cfg(test)]
mod tests {
    use super::{format_cop, format_cop_f64, format_count};

    #[test]
    fn format_cop_groups_with_dots() {
        assert_eq!(format_cop(0), "$0");
        assert_eq!(format_cop(950), "$950");
        assert_eq!(format_cop(250_000), "$250.000");
        assert_eq!(format_cop(12_345_678), "$12.345.678");
    }

    #[test]
    fn format_cop_negative_and_min() {
        assert_eq!(format_cop(-85_000), "-$85.000");
        assert!(format_cop(i64::MIN).starts_with("-$9.223.372"));
    }

    #[test]
    fn format_cop_f64_rounds() {
        assert_eq!(format_cop_f64(850.4), "$850");
        assert_eq!(format_cop_f64(999.5), "$1.000");
        assert_eq!(format_cop_f64(f64::NAN), "$0");
    }

    #[test]
    fn format_count_uses_commas() {
        assert_eq!(format_count(3600.0), "3,600");
        assert_eq!(format_count(999.0), "999");
        assert_eq!(format_count(1_234_567.4), "1,234,567");
    }
}
