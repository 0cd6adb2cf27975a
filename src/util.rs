// Small numeric helpers shared by the parser, the digest and the ranker

/// Round to a fixed number of decimal places.
///
/// Goes through the shortest correctly-rounded decimal rendering, so the
/// exact binary value decides the direction and exact ties go to even:
/// `0.015` (stored just below) → `0.01`, `0.125` → `0.12`.
pub fn round_to(value: f64, places: usize) -> f64 {
    format!("{:.*}", places, value).parse().unwrap_or(value)
}

/// Format an amount with thousands separators and two decimals: `1234.5` → `"1,234.50"`
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac)
}
