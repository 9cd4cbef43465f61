use ulid::Ulid;

/// Generates a new ULID-based ID with the given prefix.
///
/// # Examples
/// ```
/// let id = relay_common::id::prefixed_ulid("ses");
/// assert!(id.starts_with("ses_"));
/// ```
pub fn prefixed_ulid(prefix: &str) -> String {
    format!("{}_{}", prefix, Ulid::new())
}

/// Well-known ID prefixes.
pub mod prefix {
    pub const SESSION: &str = "ses";
    pub const CLIENT: &str = "cli";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_ulid_format() {
        let id = prefixed_ulid("cli");
        assert!(id.starts_with("cli_"));
        // ULID is 26 chars, plus prefix + underscore
        assert_eq!(id.len(), 4 + 26);
    }

    #[test]
    fn test_uniqueness() {
        let a = prefixed_ulid("ses");
        let b = prefixed_ulid("ses");
        assert_ne!(a, b);
    }
}
