use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

static TIME_24H_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("valid time regex"));

pub fn validate_pagination(page: Option<u32>, limit: Option<u32>) -> (u32, u32) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(20).clamp(1, 100);
    (page, limit)
}

/// Trim and lower-case an email address; emails are unique case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// 24-hour `HH:MM`.
pub fn is_valid_time_24h(time: &str) -> bool {
    TIME_24H_RE.is_match(time)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_is_clamped() {
        assert_eq!(validate_pagination(None, None), (1, 20));
        assert_eq!(validate_pagination(Some(0), Some(1000)), (1, 100));
    }

    #[test]
    fn email_is_normalized() {
        assert_eq!(normalize_email("  Jane.Doe@Campus.EDU "), "jane.doe@campus.edu");
        assert!(is_valid_email("jane@campus.edu"));
        assert!(!is_valid_email("jane@campus"));
    }

    #[test]
    fn time_must_be_24h() {
        assert!(is_valid_time_24h("00:00"));
        assert!(is_valid_time_24h("23:59"));
        assert!(!is_valid_time_24h("24:00"));
        assert!(!is_valid_time_24h("9:30"));
        assert!(!is_valid_time_24h("12:60"));
    }
}
