//! Shared HTTP client policy for platform connectors.
//!
//! Centralizes timeouts, user agent, compression, the `Origin`/`Referer`
//! headers a platform expects and session cookie injection, so every
//! connector issues requests the same way and maps failures to
//! [`FetchError`] the same way.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{COOKIE, HeaderValue, ORIGIN, REFERER};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use super::{FetchCause, FetchError, FetchStage};
use crate::auth::SessionCookie;
use crate::platform::PlatformConfig;
use crate::user_agent;

/// Default connect timeout for API calls.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default whole-request deadline for API calls.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// Network settings shared by every connector in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
    /// Per-call deadline; an elapsed deadline becomes a `Timeout` fetch error.
    pub read_timeout: Duration,
    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
            user_agent: user_agent::default_user_agent(),
        }
    }
}

/// Errors building a platform client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The underlying reqwest client could not be built.
    #[error("HTTP client construction failed for {platform}: {reason}")]
    Build {
        /// Platform title.
        platform: &'static str,
        /// Builder error text.
        reason: String,
    },

    /// A configured value cannot be sent as a header.
    #[error("invalid header value for {platform}: {header}")]
    InvalidHeader {
        /// Platform title.
        platform: &'static str,
        /// Header name.
        header: &'static str,
    },
}

/// JSON API client bound to one platform.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    platform: &'static str,
    site: HeaderValue,
    cookie: Option<HeaderValue>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("platform", &self.platform)
            .field("site", &self.site)
            .field("has_session", &self.cookie.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Builds a client for `config` using `settings` and an optional session.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the client cannot be built or the site URL
    /// or cookie cannot be encoded as header values.
    pub fn new(
        config: &PlatformConfig,
        settings: &HttpSettings,
        session: Option<&SessionCookie>,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.read_timeout)
            .user_agent(settings.user_agent.clone())
            .gzip(true)
            .build()
            .map_err(|error| ClientError::Build {
                platform: config.title,
                reason: error.to_string(),
            })?;

        let site =
            HeaderValue::from_str(&config.site_url).map_err(|_| ClientError::InvalidHeader {
                platform: config.title,
                header: "origin",
            })?;

        let cookie = session
            .map(|session| {
                session
                    .header_value()
                    .map_err(|_| ClientError::InvalidHeader {
                        platform: config.title,
                        header: "cookie",
                    })
            })
            .transpose()?;

        Ok(Self {
            client,
            platform: config.title,
            site,
            cookie,
        })
    }

    /// Issues a GET and decodes the JSON body into `T`.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] for `subject` at `stage` on transport failure
    /// or timeout, a non-2xx status, or a body that does not decode.
    #[instrument(skip(self, url), fields(platform = self.platform, url = %url))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        subject: &str,
        stage: FetchStage,
    ) -> Result<T, FetchError> {
        let mut request = self
            .client
            .get(url.clone())
            .header(ORIGIN, self.site.clone())
            .header(REFERER, self.site.clone());
        if let Some(cookie) = &self.cookie {
            request = request.header(COOKIE, cookie.clone());
        }

        let response = request
            .send()
            .await
            .map_err(|error| FetchError::transport(subject, stage, url.as_str(), &error))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "non-success response");
            return Err(FetchError::new(
                subject,
                stage,
                FetchCause::Response {
                    url: url.to_string(),
                    status: status.as_u16(),
                },
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|error| FetchError::transport(subject, stage, url.as_str(), &error))?;

        serde_json::from_str(&body).map_err(|error| {
            debug!(error = %error, body_len = body.len(), "response did not match schema");
            FetchError::new(
                subject,
                stage,
                FetchCause::Json {
                    url: url.to_string(),
                    reason: error.to_string(),
                },
            )
        })
    }
}

/// Parses `base` joined with `path`, for connector endpoint construction.
///
/// # Errors
///
/// Returns a `Connection` fetch error when the result is not a valid URL.
pub fn endpoint(
    base: &str,
    path: &str,
    subject: &str,
    stage: FetchStage,
) -> Result<Url, FetchError> {
    let raw = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
    Url::parse(&raw).map_err(|error| {
        FetchError::new(
            subject,
            stage,
            FetchCause::Connection {
                url: raw.clone(),
                reason: format!("invalid URL: {error}"),
            },
        )
    })
}
