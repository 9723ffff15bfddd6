//! List command - print the post listing, newest first

use std::{fmt::Write as _, path::Path};

use color_eyre::eyre::{Result, WrapErr};
use folio_core::Post;

use crate::Site;

/// Run the list command.
pub fn run(config_path: &Path, tag: Option<&str>) -> Result<()> {
    tracing::info!(?config_path, ?tag, "Listing posts");

    let site = Site::load(config_path)?;
    let listing = site
        .collector()
        .list_all(&site.config.content.posts)
        .wrap_err("Failed to list posts")?;

    let posts: Vec<&Post> = match tag {
        Some(tag) => listing.by_tag(tag),
        None => listing.posts.iter().collect(),
    };

    print!("{}", format_posts(&posts));

    if tag.is_none() && !listing.posts.is_empty() {
        let tags: Vec<_> = listing
            .tags()
            .into_iter()
            .map(|t| format!("{} ({})", t.tag, t.count))
            .collect();
        if !tags.is_empty() {
            println!();
            println!("Tags: {}", tags.join(", "));
        }
    }

    for failure in &listing.failures {
        println!("  ⚠ {}: {}", failure.slug, failure.error);
    }

    Ok(())
}

/// One line per post: date, reading time, title and slug.
pub fn format_posts(posts: &[&Post]) -> String {
    if posts.is_empty() {
        return "No posts found.\n".to_string();
    }

    let mut out = String::new();
    for post in posts {
        let _ = writeln!(
            out,
            "{}  {:>11}  {} ({})",
            post.date().date().format("%Y-%m-%d"),
            post.reading_time().to_string(),
            post.title(),
            post.slug
        );
    }
    out
}
