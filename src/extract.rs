//! Link extraction, file-host classification and password detection for
//! post text.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::trace;
use url::Url;

/// Matches http:// and https:// URLs made of ASCII URL characters.
///
/// Any other character ends the match, so links glued to Japanese or
/// Chinese prose stop where the prose starts. Quotes and square brackets
/// also end it.
#[allow(clippy::expect_used)]
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://[A-Za-z0-9\-._~:/?#@!$&()*+,;=%]+").expect("URL regex is valid") // Static pattern, safe to panic
});

/// Substrings that mark a post as likely password-protected.
const PASSWORD_MARKERS: [&str; 4] = ["パス", "Pass", "pass", "密码"];

/// Third-party file hosts recognised in post text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalHost {
    /// Google Drive and Google Docs; handled by a dedicated downstream client.
    GoogleDrive,
    /// MEGA.
    Mega,
    /// MediaFire.
    MediaFire,
    /// Dropbox.
    Dropbox,
    /// Microsoft OneDrive.
    OneDrive,
    /// GigaFile便.
    GigaFile,
    /// FireStorage.
    FireStorage,
    /// BowlRoll.
    BowlRoll,
}

impl ExternalHost {
    /// Every recognised host.
    pub const ALL: [Self; 8] = [
        Self::GoogleDrive,
        Self::Mega,
        Self::MediaFire,
        Self::Dropbox,
        Self::OneDrive,
        Self::GigaFile,
        Self::FireStorage,
        Self::BowlRoll,
    ];

    /// Registrable domains served by this host.
    #[must_use]
    pub fn domains(self) -> &'static [&'static str] {
        match self {
            Self::GoogleDrive => &["drive.google.com", "docs.google.com"],
            Self::Mega => &["mega.nz", "mega.co.nz", "mega.io"],
            Self::MediaFire => &["mediafire.com"],
            Self::Dropbox => &["dropbox.com", "db.tt"],
            Self::OneDrive => &["onedrive.live.com", "1drv.ms"],
            Self::GigaFile => &["gigafile.nu"],
            Self::FireStorage => &["firestorage.jp"],
            Self::BowlRoll => &["bowlroll.net"],
        }
    }

    /// Returns true for the distinguished cloud-storage class.
    #[must_use]
    pub fn is_cloud_storage(self) -> bool {
        matches!(self, Self::GoogleDrive)
    }
}

impl fmt::Display for ExternalHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GoogleDrive => "Google Drive",
            Self::Mega => "MEGA",
            Self::MediaFire => "MediaFire",
            Self::Dropbox => "Dropbox",
            Self::OneDrive => "OneDrive",
            Self::GigaFile => "GigaFile",
            Self::FireStorage => "FireStorage",
            Self::BowlRoll => "BowlRoll",
        };
        f.write_str(name)
    }
}

/// Classifies `url` against the known file hosts by its host name.
///
/// Subdomains match (`46.gigafile.nu` is GigaFile). Returns `None` for
/// unparseable URLs and unknown hosts.
#[must_use]
pub fn classify_external(url: &str) -> Option<ExternalHost> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    ExternalHost::ALL.into_iter().find(|provider| {
        provider.domains().iter().any(|domain| {
            host == *domain
                || host
                    .strip_suffix(domain)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    })
}

/// Finds every http(s) URL in `text`, in order of first appearance.
///
/// HTML-escaped ampersands are decoded first and trailing sentence
/// punctuation is dropped. Repeated URLs are returned once.
#[tracing::instrument(level = "trace", skip(text), fields(text_len = text.len()))]
#[must_use]
pub fn extract_urls(text: &str) -> Vec<String> {
    let text = text.replace("&amp;", "&");
    let mut urls: Vec<String> = Vec::new();

    for found in URL_PATTERN.find_iter(&text) {
        let cleaned = clean_url_trailing(found.as_str());
        if Url::parse(cleaned).is_err() {
            trace!(url = %cleaned, "discarding unparseable URL candidate");
            continue;
        }
        if !urls.iter().any(|seen| seen == cleaned) {
            urls.push(cleaned.to_string());
        }
    }

    urls
}

/// Returns true if `text` hints that the post's files need a password.
#[must_use]
pub fn detect_password(text: &str) -> bool {
    PASSWORD_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Drops sentence punctuation and unbalanced closing brackets from the end
/// of a URL found in running text.
fn clean_url_trailing(url: &str) -> &str {
    let mut result = url;

    while let Some(last) = result.chars().last() {
        match last {
            '.' | ',' | ';' | ':' | '!' | '?' | '。' | '、' => {
                result = &result[..result.len() - last.len_utf8()];
            }
            ')' | ']' | '）' => {
                let open = match last {
                    ')' => '(',
                    ']' => '[',
                    _ => '（',
                };
                let opens = result.chars().filter(|&c| c == open).count();
                let closes = result.chars().filter(|&c| c == last).count();
                if closes > opens {
                    result = &result[..result.len() - last.len_utf8()];
                } else {
                    break;
                }
            }
            _ => break,
        }
    }

    result
}
