//! Session credentials.
//!
//! Loads the platform session cookie from a Netscape-format cookie file
//! (exported from a browser or browser extension) or from a raw value.

mod cookies;
mod session;

pub use cookies::{CookieError, CookieLine, ParseResult, parse_netscape_cookies, select_session_cookie};
pub use session::SessionCookie;
