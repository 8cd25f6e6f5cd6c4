//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use harvester_core::Platform;

/// Platforms selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlatformArg {
    /// Pixiv Fanbox.
    Fanbox,
    /// Kemono.
    Kemono,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Fanbox => Platform::PixivFanbox,
            PlatformArg::Kemono => Platform::Kemono,
        }
    }
}

/// Collect download targets from creator platforms.
///
/// Walks creators' post listings and posts, and prints every file URL and
/// third-party file host link found as JSON on stdout.
#[derive(Parser, Debug)]
#[command(name = "harvester")]
#[command(author, version, about)]
#[allow(clippy::struct_excessive_bools)]
pub struct Args {
    /// Platform to harvest from
    #[arg(value_enum)]
    pub platform: PlatformArg,

    /// Creator URL or ID (repeatable)
    #[arg(long = "creator", value_name = "URL_OR_ID")]
    pub creators: Vec<String>,

    /// Page range for the creator at the same position, e.g. "1-5", "3" (repeatable)
    #[arg(long = "pages", value_name = "SPEC")]
    pub pages: Vec<String>,

    /// Post URL, or a numeric post ID on fanbox (repeatable)
    #[arg(long = "post", value_name = "URL")]
    pub posts: Vec<String>,

    /// Session cookie value for the platform
    #[arg(long, value_name = "VALUE")]
    pub session: Option<String>,

    /// Netscape-format cookie file containing the platform session cookie
    #[arg(long, value_name = "FILE")]
    pub cookies: Option<PathBuf>,

    /// Skip inline post images
    #[arg(long)]
    pub no_images: bool,

    /// Skip file attachments
    #[arg(long)]
    pub no_attachments: bool,

    /// Skip cover images
    #[arg(long)]
    pub no_thumbnails: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Override the platform API root (testing against a mirror)
    #[arg(long, value_name = "URL", hide = true)]
    pub base_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_minimal_args_parse() {
        let args = Args::try_parse_from(["harvester", "fanbox"]).unwrap();
        assert_eq!(args.platform, PlatformArg::Fanbox);
        assert!(args.creators.is_empty());
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(!args.no_images);
    }

    #[test]
    fn test_cli_repeated_creators_and_pages_keep_order() {
        let args = Args::try_parse_from([
            "harvester",
            "kemono",
            "--creator",
            "https://kemono.su/patreon/user/1",
            "--pages",
            "1-3",
            "--creator",
            "https://kemono.su/fanbox/user/2",
            "--pages",
            "5",
        ])
        .unwrap();
        assert_eq!(args.platform, PlatformArg::Kemono);
        assert_eq!(args.creators.len(), 2);
        assert_eq!(args.pages, vec!["1-3", "5"]);
    }

    #[test]
    fn test_cli_media_flags() {
        let args = Args::try_parse_from([
            "harvester",
            "fanbox",
            "--no-images",
            "--no-attachments",
            "--no-thumbnails",
        ])
        .unwrap();
        assert!(args.no_images && args.no_attachments && args.no_thumbnails);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["harvester", "fanbox", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_unknown_platform_rejected() {
        let err = Args::try_parse_from(["harvester", "pixiv"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn test_cli_platform_required() {
        let err = Args::try_parse_from(["harvester"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["harvester", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_platform_arg_maps_to_platform() {
        assert_eq!(Platform::from(PlatformArg::Fanbox), Platform::PixivFanbox);
        assert_eq!(Platform::from(PlatformArg::Kemono), Platform::Kemono);
    }
}
