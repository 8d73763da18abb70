//! Rupee formatting with Indian digit grouping (lakhs and crores)

/// Group the digits of a whole number the Indian way: 1234567 -> "12,34,567"
pub fn group_indian(n: u64) -> String {
    let digits = n.to_string();
    if digits.len() <= 3 {
        return digits;
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 2 {
        groups.push(&head[end - 2..end]);
        end -= 2;
    }
    groups.push(&head[..end]);
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

/// Format an amount as whole rupees: 250000.0 -> "₹2,50,000"
pub fn format_inr(amount: f64) -> String {
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let abs = if rounded.is_finite() { rounded.abs() as u64 } else { 0 };
    format!("{}₹{}", sign, group_indian(abs))
}

/// Percentage with trailing zeros dropped: 0.05 -> "5%", 0.125 -> "12.5%"
pub fn format_rate(rate: f64) -> String {
    let pct = (rate * 10_000.0).round() / 100.0;
    if pct.fract() == 0.0 {
        format!("{}%", pct as i64)
    } else {
        format!("{}%", pct)
    }
}
