use std::process::ExitCode;

use abs_cleanup::cli::Cli;
use abs_cleanup::client::{AbsClient, ClientInitError};
use abs_cleanup::config::{self, Config};
use abs_cleanup::Purger;
use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _cli = Cli::parse();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let loaded = config::collect_env()
        .context("loading configuration")
        .and_then(|env| Config::from_vars(&env.vars).map(|c| (env, c)).context("invalid configuration"));
    // Config errors still need a subscriber to be reported.
    init_tracing(loaded.as_ref().is_ok_and(|(_, c)| c.debug));
    let (env, config) = loaded?;

    if let Some(path) = &env.env_file {
        tracing::info!(path = %path.display(), "loaded settings from env file");
    }
    if let Some(value) = config::unrecognized_media_type(&env.vars) {
        tracing::warn!(value, "unrecognized MEDIA_TYPE, scanning EVERYTHING");
    }
    tracing::debug!(?config, "configuration");
    if !config.verify_ssl {
        tracing::warn!("SSL verification disabled");
    }
    if let Some(age) = config.min_age {
        tracing::info!(%age, "age filter: only deleting items added at least this long ago");
    }

    let client = AbsClient::new(&config).map_err(|e| match e {
        ClientInitError::Config(e) => anyhow::Error::new(e).context("invalid configuration"),
        ClientInitError::Api(e) => anyhow::Error::new(e),
    })?;
    tracing::info!(url = %client.base_url(), media_type = %config.media_type_filter, "connecting to Audiobookshelf");

    let report = Purger::new(client, &config).run().await?;
    if report.has_errors() {
        for e in &report.errors {
            tracing::warn!(item = %e.item_id, "{}", e.message);
        }
    }
    Ok(())
}

fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "abs_cleanup=debug,info" } else { "info" }));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}
