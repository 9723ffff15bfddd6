//! New command - scaffold a post

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{Local, NaiveDate};
use color_eyre::eyre::{Result, WrapErr, bail};
use folio_core::{Config, Frontmatter, PostDate};
use folio_generator::is_plain_segment;

use crate::Site;

/// Run the new command.
///
/// Creates `<content>/<posts>/<slug>.<ext>` with a filled-in header.
pub fn run(config_path: &Path, slug: &str, title: Option<&str>) -> Result<PathBuf> {
    tracing::info!(?config_path, slug, ?title, "Creating new post");

    let site = Site::load(config_path)?;
    let today = Local::now().date_naive();
    let path = scaffold(&site.config, &site.root, slug, title, today)?;

    tracing::info!(?path, "Created new post");
    println!("Created: {}", path.display());

    Ok(path)
}

/// Write a new post file and return its path. Never overwrites.
pub fn scaffold(
    config: &Config,
    root: &Path,
    slug: &str,
    title: Option<&str>,
    date: NaiveDate,
) -> Result<PathBuf> {
    // Hidden files are never listed, so a leading dot is refused too.
    if slug.starts_with('.') || !is_plain_segment(slug) {
        bail!("Invalid slug '{slug}': use a plain file name such as my-first-post");
    }

    let dir = config.posts_dir(root);
    let path = dir.join(format!("{slug}.{}", config.content.extension));
    if path.exists() {
        bail!("Refusing to overwrite existing post: {}", path.display());
    }

    let title = title.map_or_else(|| default_title(slug), str::to_string);
    let frontmatter = Frontmatter::new(title, PostDate::from_date(date), "A short summary.");
    let document = frontmatter
        .to_document("Write your content here.\n")
        .wrap_err("Failed to serialize frontmatter")?;

    fs::create_dir_all(&dir).wrap_err("Failed to create directories")?;
    fs::write(&path, document).wrap_err("Failed to write file")?;

    Ok(path)
}

/// `my-first-post` -> `My first post`.
fn default_title(slug: &str) -> String {
    let words = slug.replace(['-', '_'], " ");
    let mut chars = words.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Untitled".to_string(),
    }
}
