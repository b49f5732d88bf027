//! Site build command.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pagewright_static::{SiteConfig, StaticBuilder};

/// Load the site configuration. A missing file means defaults.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(source: &Path, config: &Path) -> Result<SiteConfig> {
    let config_path = source.join(config);
    if !config_path.exists() {
        tracing::info!("No {} found, using defaults", config_path.display());
        return Ok(SiteConfig::default());
    }

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let site: SiteConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", config_path.display()))?;
    tracing::info!("Loaded config from {}", config_path.display());

    Ok(site)
}

/// Run the build command.
pub async fn run(
    source: PathBuf,
    config: &Path,
    output: Option<PathBuf>,
    minify: bool,
) -> Result<()> {
    tracing::info!("Building site in {}...", source.display());

    let mut site = load_config(&source, config)?;

    if let Some(output) = output {
        let output = std::env::current_dir()
            .context("Failed to resolve the current directory")?
            .join(output);
        site.output.dir = output.to_string_lossy().into_owned();
    }
    if minify {
        site.build.minify = true;
    }

    let builder = StaticBuilder::new(source, site);
    let result = tokio::task::spawn_blocking(move || builder.build())
        .await
        .context("Build task panicked")??;

    tracing::info!(
        "Built {} pages in {}ms",
        result.pages,
        result.duration_ms
    );
    if result.errors > 0 {
        tracing::warn!("{} pages reported errors", result.errors);
    }

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}
