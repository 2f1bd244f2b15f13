use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

use crate::constants::MAX_SEARCH_LENGTH;

static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[\d\s-]{10,}$").unwrap());

pub fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    if !PHONE_PATTERN.is_match(phone) {
        return Err(ValidationError::new("invalid_phone_number"));
    }
    Ok(())
}

pub fn validate_search_query(query: &str) -> Result<(), ValidationError> {
    if query.chars().count() > MAX_SEARCH_LENGTH {
        return Err(ValidationError::new("search_query_too_long"));
    }
    Ok(())
}
