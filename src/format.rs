// 🔢 Number Formatting - Display helpers for the CLI report
//
// Space as thousands separator, comma as decimal separator
// (e.g. 2181500000 → "2 181,5 mln").

/// Format with space-separated thousands and comma decimals, trimming
/// trailing zeros: 2181.5 → "2 181,5", 2181.0 → "2 181".
pub fn format_number(num: f64, decimals: u32) -> String {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (num * factor).round() / factor;

    let mut text = format!("{:.*}", decimals as usize, rounded.abs());

    // Trim trailing zeros in the fraction
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }

    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (text, None),
    };

    let grouped = group_thousands(&int_part);
    let sign = if rounded < 0.0 { "-" } else { "" };

    match frac_part {
        Some(frac) => format!("{}{},{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// Format a currency value in millions: 2181500000 → "2 181,5 mln"
pub fn format_mln(value: f64) -> String {
    format!("{} mln", format_number(value / 1_000_000.0, 1))
}

/// Parse formatted input back to a number (tolerates spaces and commas);
/// unparseable input yields 0.
pub fn parse_formatted_number(text: &str) -> f64 {
    text.replace(' ', "")
        .replace(',', ".")
        .parse()
        .unwrap_or(0.0)
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }

    grouped
}

// ============================================================================
// TESTS
// ============================================================================
