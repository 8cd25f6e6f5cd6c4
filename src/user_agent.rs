//! Shared User-Agent string for platform API clients.

/// Browser User-Agent sent by default.
///
/// Fanbox and Kemono reject obvious non-browser clients on their JSON APIs.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Default User-Agent for platform API requests.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    BROWSER_USER_AGENT.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_browser_like() {
        let ua = default_user_agent();
        assert!(ua.starts_with("Mozilla/5.0"));
        assert!(ua.contains("Chrome/"));
        assert!(!ua.contains("  "), "continuation must not leave double spaces: {ua}");
    }
}
