//! Session credentials from `--session` or `--cookies`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use harvester_core::auth::{parse_netscape_cookies, select_session_cookie};
use harvester_core::{InputError, PlatformConfig, SessionCookie};
use tracing::{debug, warn};

/// Resolves the session cookie for `config.platform`.
///
/// A raw `--session` value is sent under the platform's cookie name. A cookie
/// file must contain an unexpired session cookie for the platform's domain.
/// Returns `Ok(None)` when neither is given.
pub(crate) fn resolve_session(
    session: Option<&str>,
    cookies: Option<&Path>,
    config: &PlatformConfig,
) -> Result<Option<SessionCookie>> {
    match (session, cookies) {
        (Some(_), Some(_)) => Err(InputError::session(
            "both --session and --cookies were given",
            "Pass either a raw session value or a cookie file, not both",
        )
        .into()),
        (Some(value), None) => {
            let value = value.trim();
            if value.is_empty() {
                return Err(InputError::session(
                    "--session value is empty",
                    &format!(
                        "Copy the '{}' cookie value from a logged-in browser",
                        config.session_cookie_name
                    ),
                )
                .into());
            }
            debug!(platform = %config.platform, "using session from --session");
            Ok(Some(SessionCookie::new(config.session_cookie_name, value)))
        }
        (None, Some(path)) => load_cookie_file(path, config).map(Some),
        (None, None) => Ok(None),
    }
}

fn load_cookie_file(path: &Path, config: &PlatformConfig) -> Result<SessionCookie> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open cookie file '{}'", path.display()))?;
    let parsed = parse_netscape_cookies(BufReader::new(file))
        .with_context(|| format!("Failed to parse cookie file '{}'", path.display()))?;
    if !parsed.warnings.is_empty() {
        warn!(
            path = %path.display(),
            skipped = parsed.warnings.len(),
            "skipped malformed cookie lines"
        );
    }
    let cookie = select_session_cookie(&parsed.cookies, config)?;
    debug!(platform = %config.platform, path = %path.display(), "using session from cookie file");
    Ok(cookie)
}
