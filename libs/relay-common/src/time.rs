/// Current unix timestamp in seconds.
pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_unix_is_recent() {
        // 2023-11-14, well before any run of this suite.
        assert!(now_unix() > 1_700_000_000);
    }
}
