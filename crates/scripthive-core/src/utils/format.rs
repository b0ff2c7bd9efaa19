use chrono::{DateTime, NaiveDateTime};

/// Format a Kenyan phone number for display
/// Handles 07XX, 2547XX and +2547XX inputs and normalizes to +254 7XX XXX XXX
pub fn format_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    let local = match digits.len() {
        12 if digits.starts_with("254") => &digits[3..],
        10 if digits.starts_with('0') => &digits[1..],
        9 => &digits[..],
        _ => return phone.to_string(),
    };
    format!("+254 {} {} {}", &local[0..3], &local[3..6], &local[6..9])
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional string, returning a default if None or blank
pub fn format_optional(value: Option<&str>, default: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

/// Format a date string to a more readable format.
///
/// Accepts RFC 3339 timestamps and the compact `yyyyMMddHHmmss` form M-Pesa
/// uses for transaction dates.
pub fn format_date(date: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        dt.format("%b %d, %Y").to_string()
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(date, "%Y%m%d%H%M%S") {
        dt.format("%b %d, %Y %H:%M").to_string()
    } else if date.len() >= 10 && date.is_char_boundary(10) {
        date[..10].to_string()
    } else {
        date.to_string()
    }
}

/// "KES 1,500" / "KES 1,500.50"
pub fn format_amount(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    if fraction == 0 {
        format!("KES {}{}", sign, grouped)
    } else {
        format!("KES {}{}.{:02}", sign, grouped, fraction)
    }
}

/// Up to two uppercase initials, used as an avatar placeholder.
pub fn initials(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();
    if letters.is_empty() {
        "?".to_string()
    } else {
        letters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("254712345678"), "+254 712 345 678");
        assert_eq!(format_phone("0712345678"), "+254 712 345 678");
        assert_eq!(format_phone("+254 712 345 678"), "+254 712 345 678");
        assert_eq!(format_phone("123"), "123"); // Too short, return as-is
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("Käse und Brot", 7), "Käse...");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-01-15T10:30:45Z"), "Jan 15, 2024");
        assert_eq!(format_date("20240115103045"), "Jan 15, 2024 10:30");
        assert_eq!(format_date("2024-06-01 17:00"), "2024-06-01");
        assert_eq!(format_date("soon"), "soon");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "KES 0");
        assert_eq!(format_amount(1500.0), "KES 1,500");
        assert_eq!(format_amount(1234567.5), "KES 1,234,567.50");
        assert_eq!(format_amount(-20.0), "KES -20");
    }

    #[test]
    fn test_format_optional_and_initials() {
        assert_eq!(format_optional(None, "N/A"), "N/A");
        assert_eq!(format_optional(Some(" "), "N/A"), "N/A");
        assert_eq!(format_optional(Some("RCX12"), "N/A"), "RCX12");
        assert_eq!(initials("Ada Admin"), "AA");
        assert_eq!(initials("ada lovelace king"), "AL");
        assert_eq!(initials(""), "?");
    }
}
