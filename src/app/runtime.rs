//! Run composition: resolve config and inputs, build the connector, harvest,
//! then print the report.

use std::io;

use anyhow::{Context, Result};
use harvester_core::{
    FetchStage, Harvester, MediaSelection, Platform, PlatformRegistry, build_connector,
};
use tracing::{debug, info, warn};

use crate::app::exit::ProcessExit;
use crate::app::{config, credentials, exit, input_processor, output, progress, terminal};
use crate::cli::Args;

pub(crate) async fn run_harvester(args: Args) -> Result<ProcessExit> {
    let file_config = config::load_default_file_config()?;
    let default_level = config::resolve_default_log_level(&args, file_config.as_ref());
    terminal::init_tracing(default_level, terminal::is_no_color_requested());
    let quiet = config::is_quiet(&args, file_config.as_ref());

    let platform = Platform::from(args.platform);
    debug!(
        %platform,
        creators = args.creators.len(),
        pages = args.pages.len(),
        posts = args.posts.len(),
        "CLI arguments parsed"
    );

    let registry = build_registry(platform, args.base_url.as_deref());
    let platform_config = registry.get(platform);

    let request =
        input_processor::build_request(platform, &args.creators, &args.pages, &args.posts)?;
    if request.is_empty() {
        warn!("no creators or posts given; nothing to harvest");
    }

    let session = credentials::resolve_session(
        args.session.as_deref(),
        args.cookies.as_deref(),
        platform_config,
    )?;
    if session.is_none() {
        info!(%platform, "no session given; only public content will be visible");
    }

    let media = MediaSelection {
        thumbnails: !args.no_thumbnails,
        images: !args.no_images,
        attachments: !args.no_attachments,
    };
    let settings = config::resolve_http_settings(file_config.as_ref());
    let connector = build_connector(platform, &registry, &settings, session.as_ref(), media)
        .context("Failed to set up the platform client")?;

    let harvester = Harvester::for_platform(connector, &registry)
        .with_progress(
            FetchStage::List,
            progress::reporter_for(FetchStage::List, quiet),
        )
        .with_progress(
            FetchStage::Detail,
            progress::reporter_for(FetchStage::Detail, quiet),
        );

    info!(%platform, "Harvest starting");
    let result = harvester.run(request).await?;
    info!(
        direct = result.direct_targets.len(),
        external = result.external_targets.len(),
        password_protected = result.password_protected_posts.len(),
        errors = result.errors.len(),
        "Harvest complete"
    );
    for error in &result.errors {
        warn!(stage = %error.stage, subject = %error.subject, cause = %error.cause, "item failed");
    }

    output::write_report(io::stdout().lock(), platform, &result)?;
    Ok(exit::determine_exit_outcome(&result))
}

fn build_registry(platform: Platform, base_url: Option<&str>) -> PlatformRegistry {
    let registry = PlatformRegistry::new();
    match base_url {
        Some(base_url) => {
            debug!(%platform, base_url, "overriding platform API root");
            let config = registry.get(platform).clone().rooted_at(base_url);
            registry.with_override(config)
        }
        None => registry,
    }
}
