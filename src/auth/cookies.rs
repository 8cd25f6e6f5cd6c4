//! Netscape cookie file parser and session cookie selection.
//!
//! Parses the Netscape HTTP cookie file format (7 TAB-separated fields per
//! line) as exported by browsers and `curl`, then picks out the one cookie a
//! platform authenticates with.

use std::fmt;
use std::io::BufRead;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, instrument, warn};

use super::SessionCookie;
use crate::input::InputError;
use crate::platform::PlatformConfig;

/// Prefix `curl` and some exporters put on `HttpOnly` cookie lines.
const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

/// A single parsed cookie from a Netscape-format cookie file.
///
/// The value is redacted in `Debug` output.
#[derive(Clone)]
pub struct CookieLine {
    /// Domain the cookie belongs to (e.g. `.fanbox.cc`).
    pub domain: String,
    /// URL path scope.
    pub path: String,
    /// HTTPS-only flag.
    pub secure: bool,
    /// Unix expiry timestamp; 0 means a session cookie.
    pub expires: u64,
    /// Cookie name.
    pub name: String,
    value: String,
}

impl CookieLine {
    /// Cookie value. Sensitive; do not log.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns true if the cookie applies to `domain` (leading dots ignored).
    #[must_use]
    pub fn matches_domain(&self, domain: &str) -> bool {
        let own = self.domain.trim_start_matches('.');
        let wanted = domain.trim_start_matches('.');
        own.eq_ignore_ascii_case(wanted)
            || own
                .strip_suffix(wanted)
                .is_some_and(|prefix| prefix.ends_with('.'))
    }

    /// Returns true if the cookie expired before `now` (Unix seconds).
    #[must_use]
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expires != 0 && self.expires < now
    }
}

impl fmt::Debug for CookieLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieLine")
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .field("expires", &self.expires)
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Errors reading a cookie file.
#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    /// A line has an invalid format.
    #[error("line {line_number}: {reason}")]
    InvalidLine {
        /// 1-based line number.
        line_number: usize,
        /// What was wrong.
        reason: String,
    },

    /// I/O error reading the file.
    #[error("failed to read cookie file: {0}")]
    Io(#[from] std::io::Error),

    /// A non-empty file contained no valid cookie line.
    #[error("no valid cookies found in file ({malformed_count} lines failed to parse)")]
    NoCookiesFound {
        /// Number of malformed lines.
        malformed_count: usize,
    },
}

/// Parsed cookies plus warnings for skipped lines.
#[derive(Debug)]
pub struct ParseResult {
    /// Successfully parsed cookies, in file order.
    pub cookies: Vec<CookieLine>,
    /// `(line number, reason)` for each malformed line.
    pub warnings: Vec<(usize, String)>,
}

/// Parses a Netscape-format cookie file.
///
/// Blank lines and `#` comments are skipped, except `#HttpOnly_` lines which
/// carry a real cookie. Malformed lines become warnings.
///
/// # Errors
///
/// Returns [`CookieError::Io`] on read failure, or
/// [`CookieError::NoCookiesFound`] when data lines exist but none parse.
#[instrument(level = "debug", skip(reader))]
pub fn parse_netscape_cookies(reader: impl BufRead) -> Result<ParseResult, CookieError> {
    let mut cookies = Vec::new();
    let mut warnings = Vec::new();
    let mut data_lines = 0;

    for (idx, line) in reader.lines().enumerate() {
        let line_number = idx + 1;
        let line = line?;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        let line = match line.strip_prefix(HTTP_ONLY_PREFIX) {
            Some(rest) => rest,
            None if line.starts_with('#') => continue,
            None => line,
        };

        data_lines += 1;
        match parse_cookie_line(line, line_number) {
            Ok(cookie) => {
                debug!(line = line_number, domain = %cookie.domain, name = %cookie.name, "parsed cookie");
                cookies.push(cookie);
            }
            Err(error) => {
                warn!(line = line_number, reason = %error, "skipping malformed cookie line");
                warnings.push((line_number, error.to_string()));
            }
        }
    }

    if cookies.is_empty() && data_lines > 0 {
        return Err(CookieError::NoCookiesFound {
            malformed_count: warnings.len(),
        });
    }

    Ok(ParseResult { cookies, warnings })
}

fn parse_cookie_line(line: &str, line_number: usize) -> Result<CookieLine, CookieError> {
    let invalid = |reason: String| CookieError::InvalidLine {
        line_number,
        reason,
    };

    let fields: Vec<&str> = line.split('\t').collect();
    let [domain, _tailmatch, path, secure, expires, name, value] = fields.as_slice() else {
        return Err(invalid(format!(
            "expected 7 TAB-separated fields, found {}",
            fields.len()
        )));
    };

    if domain.is_empty() {
        return Err(invalid("domain field is empty".to_string()));
    }
    if name.is_empty() {
        return Err(invalid("cookie name field is empty".to_string()));
    }
    let secure = match *secure {
        "TRUE" => true,
        "FALSE" => false,
        other => {
            return Err(invalid(format!(
                "secure field must be TRUE or FALSE, got '{other}'"
            )));
        }
    };
    let expires = expires.parse::<u64>().map_err(|_| {
        invalid(format!(
            "expires field must be a non-negative integer, got '{expires}'"
        ))
    })?;

    Ok(CookieLine {
        domain: (*domain).to_string(),
        path: (*path).to_string(),
        secure,
        expires,
        name: (*name).to_string(),
        value: (*value).to_string(),
    })
}

/// Picks the platform's session cookie out of a parsed cookie file.
///
/// Expired cookies are ignored. When several lines match, the last one wins,
/// matching how browsers overwrite on export.
///
/// # Errors
///
/// Returns [`InputError::InvalidSession`] when no unexpired cookie with the
/// platform's session name and domain is present.
pub fn select_session_cookie(
    cookies: &[CookieLine],
    config: &PlatformConfig,
) -> Result<SessionCookie, InputError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs());

    cookies
        .iter()
        .rev()
        .filter(|cookie| cookie.name == config.session_cookie_name)
        .filter(|cookie| cookie.matches_domain(config.cookie_domain))
        .find(|cookie| !cookie.is_expired_at(now))
        .map(|cookie| SessionCookie::new(cookie.name.clone(), cookie.value.clone()))
        .ok_or_else(|| {
            InputError::session(
                &format!(
                    "no unexpired '{}' cookie for {} in the cookie file",
                    config.session_cookie_name, config.cookie_domain
                ),
                &format!(
                    "Export cookies from a browser logged in to {} and pass the file with --cookies",
                    config.site_url
                ),
            )
        })
}
