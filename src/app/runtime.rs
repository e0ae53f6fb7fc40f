use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use manifest_fetch::{
    BatchRunner, ConfigError, HttpClient, Manifest, Pacer, Settings, load_config,
};
use tracing::{debug, error, info};

use crate::ProcessExit;
use crate::app::{exit_handler, terminal};
use crate::cli::Args;

pub(crate) async fn run_manifest_fetch(args: Args) -> Result<ProcessExit> {
    let default_level = terminal::resolve_default_log_level(args.verbose, args.quiet);
    terminal::init_tracing(default_level);

    debug!(?args, "CLI arguments parsed");
    info!("manifest-fetch starting");

    let settings = match resolve_settings(&args) {
        Ok(settings) => settings,
        Err(err) => {
            error!(error = %err, "invalid configuration");
            return Ok(ProcessExit::Fatal);
        }
    };
    debug!(?settings, "settings resolved");

    // Manifest problems are fatal and must surface before any side effect.
    let manifest = match Manifest::from_path(&args.manifest)
        .and_then(|manifest| manifest.bind(settings.requirements).map(|_| manifest))
    {
        Ok(manifest) => manifest,
        Err(err) => {
            error!(error = %err, "cannot process manifest");
            return Ok(ProcessExit::Fatal);
        }
    };

    if !settings.output_dir.exists() {
        fs::create_dir_all(&settings.output_dir).with_context(|| {
            format!(
                "Failed to create output directory '{}'",
                settings.output_dir.display()
            )
        })?;
        info!(dir = %settings.output_dir.display(), "Created output directory");
    }

    let client =
        HttpClient::with_timeouts(settings.connect_timeout_secs, settings.read_timeout_secs)
            .context("Failed to build HTTP client")?
            .with_status_policy(settings.status_policy);
    let pacer = Arc::new(Pacer::new(settings.pacing));

    let runner = BatchRunner::new(client, Arc::clone(&pacer), settings.output_dir.clone())
        .with_template(settings.template.clone())
        .with_requirements(settings.requirements);

    let summary = match runner.run_manifest(&manifest).await {
        Ok(summary) => summary,
        Err(err) => {
            error!(error = %err, "cannot process manifest");
            return Ok(ProcessExit::Fatal);
        }
    };

    debug!(
        waited_ms = pacer.total_waited().await.as_millis(),
        "time spent pacing"
    );

    Ok(exit_handler::outcome_for_summary(&summary))
}

fn resolve_settings(args: &Args) -> Result<Settings, ConfigError> {
    let loaded = load_config(args.config.as_deref())?;
    if let Some(path) = loaded.path.as_deref()
        && loaded.loaded_from_file()
    {
        info!(path = %path.display(), "Loaded config file");
    }
    Settings::resolve(loaded.config.as_ref(), &args.overrides())
}
