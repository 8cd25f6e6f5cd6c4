//! Creator and post identifiers.
//!
//! An [`Identifier`] addresses one creator, or one post of a creator, on a
//! [`Service`]. Identifiers are produced by [`parse_creator`] and
//! [`parse_post`] and never change afterwards.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use super::error::InputError;
use crate::platform::Platform;

/// Creator services mirrored by Kemono.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KemonoService {
    /// Patreon.
    Patreon,
    /// Pixiv Fanbox.
    Fanbox,
    /// Gumroad.
    Gumroad,
    /// SubscribeStar.
    SubscribeStar,
    /// DLsite.
    Dlsite,
    /// Fantia.
    Fantia,
    /// Boosty.
    Boosty,
}

impl KemonoService {
    /// Returns the path segment Kemono uses for this service.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Patreon => "patreon",
            Self::Fanbox => "fanbox",
            Self::Gumroad => "gumroad",
            Self::SubscribeStar => "subscribestar",
            Self::Dlsite => "dlsite",
            Self::Fantia => "fantia",
            Self::Boosty => "boosty",
        }
    }

    /// Parses a Kemono service path segment.
    #[must_use]
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "patreon" => Some(Self::Patreon),
            "fanbox" => Some(Self::Fanbox),
            "gumroad" => Some(Self::Gumroad),
            "subscribestar" => Some(Self::SubscribeStar),
            "dlsite" => Some(Self::Dlsite),
            "fantia" => Some(Self::Fantia),
            "boosty" => Some(Self::Boosty),
            _ => None,
        }
    }
}

/// Where an identifier's content lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case", tag = "platform", content = "service")]
pub enum Service {
    /// A creator on Pixiv Fanbox itself.
    Fanbox,
    /// A creator archived on Kemono, with the upstream service.
    Kemono(KemonoService),
}

impl Service {
    /// Platform whose API serves this service.
    #[must_use]
    pub fn platform(self) -> Platform {
        match self {
            Self::Fanbox => Platform::PixivFanbox,
            Self::Kemono(_) => Platform::Kemono,
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fanbox => f.write_str("fanbox"),
            Self::Kemono(service) => write!(f, "kemono/{}", service.as_str()),
        }
    }
}

/// A validated creator or post address.
///
/// Equality and hashing cover every field. Deduplication goes through
/// [`Identifier::dedupe_key`] instead, because a Fanbox post is unique by its
/// post ID alone and may be known without its creator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Identifier {
    service: Service,
    creator_id: String,
    post_id: Option<String>,
}

impl Identifier {
    /// Creates a creator identifier.
    #[must_use]
    pub fn creator(service: Service, creator_id: impl Into<String>) -> Self {
        Self {
            service,
            creator_id: creator_id.into(),
            post_id: None,
        }
    }

    /// Creates a post identifier.
    #[must_use]
    pub fn post(
        service: Service,
        creator_id: impl Into<String>,
        post_id: impl Into<String>,
    ) -> Self {
        Self {
            service,
            creator_id: creator_id.into(),
            post_id: Some(post_id.into()),
        }
    }

    /// Creates a Fanbox post identifier from a bare numeric post ID.
    ///
    /// The creator is unknown, so [`Identifier::creator_id`] is empty.
    #[must_use]
    pub fn fanbox_post(post_id: impl Into<String>) -> Self {
        Self {
            service: Service::Fanbox,
            creator_id: String::new(),
            post_id: Some(post_id.into()),
        }
    }

    /// Service the identifier belongs to.
    #[must_use]
    pub fn service(&self) -> Service {
        self.service
    }

    /// Platform whose API serves this identifier.
    #[must_use]
    pub fn platform(&self) -> Platform {
        self.service.platform()
    }

    /// Creator ID. Empty for a Fanbox post given by ID only.
    #[must_use]
    pub fn creator_id(&self) -> &str {
        &self.creator_id
    }

    /// Post ID, when this identifier addresses a post.
    #[must_use]
    pub fn post_id(&self) -> Option<&str> {
        self.post_id.as_deref()
    }

    /// Returns true when this identifier addresses a single post.
    #[must_use]
    pub fn is_post(&self) -> bool {
        self.post_id.is_some()
    }

    /// Key under which two identifiers count as the same request.
    ///
    /// Fanbox post IDs are global, so Fanbox posts ignore the creator.
    #[must_use]
    pub fn dedupe_key(&self) -> (Service, &str, Option<&str>) {
        match (self.service, self.post_id.as_deref()) {
            (Service::Fanbox, Some(post_id)) => (Service::Fanbox, "", Some(post_id)),
            (service, post_id) => (service, self.creator_id.as_str(), post_id),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.creator_id.is_empty() {
            write!(f, "{}/post", self.service)?;
        } else {
            write!(f, "{}/{}", self.service, self.creator_id)?;
        }
        if let Some(post_id) = &self.post_id {
            write!(f, "/{post_id}")?;
        }
        Ok(())
    }
}

#[allow(clippy::expect_used)]
static KEMONO_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://(?:www\.)?kemono\.(?:su|party|cr)/(?P<service>patreon|fanbox|gumroad|subscribestar|dlsite|fantia|boosty)/user/(?P<creator>[\w-]+)(?:/post/(?P<post>\d+))?/?$",
    )
    .expect("Kemono URL regex is valid")
});

#[allow(clippy::expect_used)]
static FANBOX_AT_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://(?:www\.)?fanbox\.cc/@(?P<creator>[\w-]+)(?:/posts/(?P<post>\d+))?/?$",
    )
    .expect("Fanbox @creator URL regex is valid")
});

#[allow(clippy::expect_used)]
static FANBOX_SUBDOMAIN_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?P<creator>[\w-]+)\.fanbox\.cc(?:/posts/(?P<post>\d+))?/?$")
        .expect("Fanbox subdomain URL regex is valid")
});

#[allow(clippy::expect_used)]
static BARE_CREATOR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w-]+$").expect("creator ID regex is valid"));

#[allow(clippy::expect_used)]
static BARE_POST_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("post ID regex is valid"));

/// Parses a creator URL or ID for `platform`.
///
/// # Errors
///
/// Returns [`InputError::InvalidCreator`] when the input is not a creator
/// address for the platform (including post URLs).
///
/// # Examples
///
/// ```
/// use harvester_core::input::{parse_creator, KemonoService, Service};
/// use harvester_core::Platform;
///
/// let id = parse_creator(Platform::Kemono, "https://kemono.su/patreon/user/123").unwrap();
/// assert_eq!(id.service(), Service::Kemono(KemonoService::Patreon));
/// assert_eq!(id.creator_id(), "123");
/// ```
pub fn parse_creator(platform: Platform, input: &str) -> Result<Identifier, InputError> {
    let trimmed = input.trim();
    let parsed = parse_address(platform, trimmed)
        .ok_or_else(|| InputError::creator(platform, trimmed, "unrecognised creator address"))?;
    if parsed.is_post() {
        return Err(InputError::creator(
            platform,
            trimmed,
            "this is a post URL, not a creator",
        ));
    }
    debug!(identifier = %parsed, "parsed creator");
    Ok(parsed)
}

/// Parses a post URL for `platform`.
///
/// Fanbox also accepts a bare numeric post ID.
///
/// # Errors
///
/// Returns [`InputError::InvalidPost`] when the input is not a post address
/// for the platform.
///
/// # Examples
///
/// ```
/// use harvester_core::input::parse_post;
/// use harvester_core::Platform;
///
/// let id = parse_post(Platform::PixivFanbox, "4567").unwrap();
/// assert_eq!(id.post_id(), Some("4567"));
/// ```
pub fn parse_post(platform: Platform, input: &str) -> Result<Identifier, InputError> {
    let trimmed = input.trim();
    if platform == Platform::PixivFanbox && BARE_POST_ID_PATTERN.is_match(trimmed) {
        let parsed = Identifier::fanbox_post(trimmed);
        debug!(identifier = %parsed, "parsed post ID");
        return Ok(parsed);
    }
    match parse_address(platform, trimmed) {
        Some(parsed) if parsed.is_post() => {
            debug!(identifier = %parsed, "parsed post");
            Ok(parsed)
        }
        Some(_) => Err(InputError::post(
            platform,
            trimmed,
            "this is a creator address, not a post",
        )),
        None => Err(InputError::post(
            platform,
            trimmed,
            "unrecognised post address",
        )),
    }
}

fn parse_address(platform: Platform, input: &str) -> Option<Identifier> {
    match platform {
        Platform::Kemono => {
            let caps = KEMONO_URL_PATTERN.captures(input)?;
            let service = KemonoService::from_segment(caps.name("service")?.as_str())?;
            Some(build(
                Service::Kemono(service),
                caps.name("creator")?.as_str(),
                caps.name("post").map(|m| m.as_str()),
            ))
        }
        Platform::PixivFanbox => {
            if let Some(caps) = FANBOX_AT_URL_PATTERN.captures(input) {
                return Some(build(
                    Service::Fanbox,
                    caps.name("creator")?.as_str(),
                    caps.name("post").map(|m| m.as_str()),
                ));
            }
            if let Some(caps) = FANBOX_SUBDOMAIN_URL_PATTERN.captures(input) {
                let creator = caps.name("creator")?.as_str();
                if creator.eq_ignore_ascii_case("www") || creator.eq_ignore_ascii_case("api") {
                    return None;
                }
                return Some(build(
                    Service::Fanbox,
                    creator,
                    caps.name("post").map(|m| m.as_str()),
                ));
            }
            BARE_CREATOR_PATTERN
                .is_match(input)
                .then(|| Identifier::creator(Service::Fanbox, input))
        }
    }
}

fn build(service: Service, creator: &str, post: Option<&str>) -> Identifier {
    match post {
        Some(post) => Identifier::post(service, creator, post),
        None => Identifier::creator(service, creator),
    }
}

/// Removes duplicate identifiers, keeping the first occurrence of each.
///
/// Duplicates are judged by [`Identifier::dedupe_key`]. Running it on its own
/// output returns the same sequence.
#[must_use]
pub fn dedupe_identifiers(identifiers: Vec<Identifier>) -> Vec<Identifier> {
    let mut seen = HashSet::with_capacity(identifiers.len());
    identifiers
        .into_iter()
        .filter(|identifier| {
            let (service, creator, post) = identifier.dedupe_key();
            seen.insert((service, creator.to_string(), post.map(str::to_string)))
        })
        .collect()
}
