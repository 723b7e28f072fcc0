//! Phone number validation for outbound dialing.

use once_cell::sync::Lazy;
use regex::Regex;

// US/Canada E.164: "+1" followed by exactly ten digits.
static US_E164: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+1\d{10}$").expect("valid pattern"));

/// Validate a dialable US/Canada number in E.164 form.
pub fn validate_phone_number(number: &str) -> bool {
    US_E164.is_match(number)
}
