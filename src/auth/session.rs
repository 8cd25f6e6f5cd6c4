//! Session cookie handed to platform clients.

use std::fmt;

use reqwest::header::{HeaderValue, InvalidHeaderValue};

/// The one cookie a platform authenticates requests with.
///
/// The value is redacted in `Debug` output and the header built from it is
/// marked sensitive, so it never reaches logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCookie {
    name: String,
    value: String,
}

impl SessionCookie {
    /// Creates a session cookie.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Cookie name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cookie value. Sensitive; do not log.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Builds a `Cookie` request header (`name=value`), flagged sensitive.
    ///
    /// # Errors
    ///
    /// Returns an error when the value contains bytes not allowed in headers.
    pub fn header_value(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut header = HeaderValue::from_str(&format!("{}={}", self.name, self.value))?;
        header.set_sensitive(true);
        Ok(header)
    }
}

impl fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCookie")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}
