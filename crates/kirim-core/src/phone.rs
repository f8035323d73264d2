use regex::Regex;

use crate::domain::NormalizedPhone;

/// Country code substituted for a local-format leading `0` (Indonesia).
pub const DEFAULT_COUNTRY_CODE: &str = "62";

/// Canonicalize a raw phone string.
///
/// Drops everything but digits (which also removes a leading `+`), replaces one
/// leading local `0` with `country_code`, then requires 8..=15 digits. Returns
/// `None` for anything that does not validate. Idempotent on its own output.
pub fn normalize(raw: &str, country_code: &str) -> Option<NormalizedPhone> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    let digits = if digits.starts_with('0') {
        format!("{country_code}{}", &digits[1..])
    } else {
        digits
    };

    if !Regex::new(r"^\d{8,15}$").ok()?.is_match(&digits) {
        return None;
    }
    Some(NormalizedPhone::new_unchecked(digits))
}
