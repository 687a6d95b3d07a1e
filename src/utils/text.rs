//! Number parsing from rendered labels.

use std::sync::LazyLock;

use regex::Regex;

/// First run of digits, with thousands groups separated by `,` `.` or a
/// (narrow) no-break space kept together.
static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[,.\u{a0}\u{202f}]\d{3})*").unwrap());

/// Parse the first integer appearing in `text`, e.g. `"(1,234 reviews)"` gives 1234.
pub fn first_integer(text: &str) -> Option<u64> {
    let found = FIRST_NUMBER.find(text)?;
    let digits: String = found
        .as_str()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
