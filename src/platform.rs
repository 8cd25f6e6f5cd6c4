//! Immutable per-platform configuration.
//!
//! Every supported site is a variant of [`Platform`]. Endpoint roots, the
//! headers a site expects, its session cookie and its concurrency ceiling live
//! in a [`PlatformConfig`], and the full set is held by a
//! [`PlatformRegistry`] that is built once at startup and passed by
//! reference to every connector.

use std::fmt;

use serde::Serialize;

/// Maximum concurrent API calls against Pixiv Fanbox.
pub const FANBOX_MAX_CONCURRENCY: usize = 5;

/// Maximum concurrent API calls against Kemono.
pub const KEMONO_MAX_CONCURRENCY: usize = 3;

/// Supported content platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Pixiv Fanbox (`fanbox.cc`).
    PixivFanbox,
    /// Kemono archive (`kemono.su`).
    Kemono,
}

impl Platform {
    /// All platforms, in registry order.
    pub const ALL: [Self; 2] = [Self::PixivFanbox, Self::Kemono];

    /// Returns the stable lowercase label used on the command line and in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PixivFanbox => "fanbox",
            Self::Kemono => "kemono",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of one platform's HTTP contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Platform this config describes.
    pub platform: Platform,
    /// Human-readable name for messages.
    pub title: &'static str,
    /// Root of the JSON API (no trailing slash).
    pub api_base: String,
    /// Site URL sent as `Origin` and `Referer`.
    pub site_url: String,
    /// Root that relative file paths are joined onto (no trailing slash).
    pub content_base: String,
    /// Name of the session cookie the site authenticates with.
    pub session_cookie_name: &'static str,
    /// Cookie domain for the session cookie.
    pub cookie_domain: &'static str,
    /// Upper bound on concurrent calls for this platform.
    pub max_concurrency: usize,
}

impl PlatformConfig {
    /// Default configuration for Pixiv Fanbox.
    #[must_use]
    pub fn fanbox() -> Self {
        Self {
            platform: Platform::PixivFanbox,
            title: "Pixiv Fanbox",
            api_base: "https://api.fanbox.cc".to_string(),
            site_url: "https://www.fanbox.cc".to_string(),
            content_base: "https://downloads.fanbox.cc".to_string(),
            session_cookie_name: "FANBOXSESSID",
            cookie_domain: ".fanbox.cc",
            max_concurrency: FANBOX_MAX_CONCURRENCY,
        }
    }

    /// Default configuration for Kemono.
    #[must_use]
    pub fn kemono() -> Self {
        Self {
            platform: Platform::Kemono,
            title: "Kemono",
            api_base: "https://kemono.su/api/v1".to_string(),
            site_url: "https://kemono.su".to_string(),
            content_base: "https://kemono.su/data".to_string(),
            session_cookie_name: "session",
            cookie_domain: ".kemono.su",
            max_concurrency: KEMONO_MAX_CONCURRENCY,
        }
    }

    /// Points API, site and content roots at `base_url` (used by tests).
    #[must_use]
    pub fn rooted_at(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        self.api_base = base.to_string();
        self.site_url = base.to_string();
        self.content_base = format!("{base}/data");
        self
    }
}

/// Read-only lookup of every platform's configuration.
#[derive(Debug, Clone)]
pub struct PlatformRegistry {
    fanbox: PlatformConfig,
    kemono: PlatformConfig,
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformRegistry {
    /// Builds the registry with production endpoints.
    #[must_use]
    pub fn new() -> Self {
        Self {
            fanbox: PlatformConfig::fanbox(),
            kemono: PlatformConfig::kemono(),
        }
    }

    /// Replaces the configuration for `config.platform`, consuming the registry.
    #[must_use]
    pub fn with_override(mut self, config: PlatformConfig) -> Self {
        match config.platform {
            Platform::PixivFanbox => self.fanbox = config,
            Platform::Kemono => self.kemono = config,
        }
        self
    }

    /// Returns the configuration for `platform`.
    #[must_use]
    pub fn get(&self, platform: Platform) -> &PlatformConfig {
        match platform {
            Platform::PixivFanbox => &self.fanbox,
            Platform::Kemono => &self.kemono,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_returns_config_for_every_platform() {
        let registry = PlatformRegistry::new();
        for platform in Platform::ALL {
            assert_eq!(registry.get(platform).platform, platform);
        }
    }

    #[test]
    fn test_concurrency_constants_within_observed_range() {
        let registry = PlatformRegistry::new();
        for platform in Platform::ALL {
            let max = registry.get(platform).max_concurrency;
            assert!((3..=5).contains(&max), "{platform} concurrency {max}");
        }
    }

    #[test]
    fn test_override_replaces_only_target_platform() {
        let registry = PlatformRegistry::new()
            .with_override(PlatformConfig::kemono().rooted_at("http://127.0.0.1:9000/"));

        assert_eq!(
            registry.get(Platform::Kemono).api_base,
            "http://127.0.0.1:9000"
        );
        assert_eq!(
            registry.get(Platform::Kemono).content_base,
            "http://127.0.0.1:9000/data"
        );
        assert_eq!(registry.get(Platform::PixivFanbox), &PlatformConfig::fanbox());
    }

    #[test]
    fn test_platform_labels() {
        assert_eq!(Platform::PixivFanbox.to_string(), "fanbox");
        assert_eq!(Platform::Kemono.as_str(), "kemono");
    }
}
