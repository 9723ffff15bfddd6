//! Build command - renders posts and writes the listing and sitemap

use std::{path::Path, time::Instant};

use color_eyre::eyre::{Result, WrapErr};
use folio_generator::{BuildStats, Builder};

use crate::Site;

/// Run the build command.
pub fn run(
    config_path: &Path,
    output: Option<&Path>,
    base_url: Option<&str>,
    strict: bool,
) -> Result<BuildStats> {
    let start = Instant::now();
    tracing::info!(?config_path, ?output, ?base_url, strict, "Starting build");

    let mut site = Site::load(config_path)?;

    if let Some(url) = base_url {
        tracing::info!(base_url = url, "Overriding site base_url from CLI");
        site.config.site.base_url = url.to_string();
    }
    site.config.build.strict |= strict;

    let registry = site.registry();
    let mut builder = Builder::new(site.config, registry).with_root(&site.root);
    if let Some(dir) = output {
        // Relative to where the command runs, not the site root.
        let dir = std::env::current_dir()
            .wrap_err("Failed to resolve working directory")?
            .join(dir);
        builder = builder.with_output_dir(dir);
    }

    let output_dir = builder.output_dir();
    let stats = builder.build().wrap_err("Build failed")?;
    let duration = start.elapsed();

    println!();
    println!("  Build completed successfully!");
    println!();
    println!("  Posts:      {}", stats.posts);
    println!("  Skipped:    {}", stats.failed);
    println!("  Sitemap:    {} urls", stats.sitemap_entries);
    println!();
    println!("  Duration:   {:.2}s", duration.as_secs_f64());
    println!("  Output:     {}", output_dir.display());
    println!();

    tracing::info!(?stats, ?duration, "Build completed successfully");

    Ok(stats)
}
