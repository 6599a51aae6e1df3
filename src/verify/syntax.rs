use std::sync::LazyLock;

use regex::Regex;

static ADDRESS_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("address regex compiles")
});

/// Split `email` into (local, domain) when it has the usual address shape.
pub fn parse_address(email: &str) -> Option<(&str, &str)> {
    if !ADDRESS_SHAPE.is_match(email) {
        return None;
    }
    email.split_once('@')
}
