//! Build orchestration.
//!
//! Coordinates the full build: collect, render, write fragments, write the
//! listing and the sitemap.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use folio_core::{Config, Post};
use folio_parser::{ComponentRegistry, MarkdownRenderer};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    collector::ContentCollector,
    sitemap::SitemapGenerator,
    store::{ContentError, ContentStore},
};

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Content could not be scanned.
    #[error("content error: {0}")]
    Content(#[from] ContentError),

    /// Listing serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Cleaning the output directory would delete the site or its content.
    #[error("refusing to clean {}: it contains the site root or the content directory", path.display())]
    UnsafeOutput { path: PathBuf },

    /// Documents failed while strict mode was on.
    #[error("{0} document(s) failed to build")]
    Failures(usize),
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build statistics.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Number of post pages written.
    pub posts: usize,

    /// Number of documents skipped (load or render failures).
    pub failed: usize,

    /// Number of sitemap entries.
    pub sitemap_entries: usize,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// Site builder that orchestrates the build process.
#[derive(Debug)]
pub struct Builder {
    config: Config,
    registry: ComponentRegistry,
    root: PathBuf,
    output_dir: PathBuf,
}

impl Builder {
    /// Create a new builder. Paths in `config` resolve against the current
    /// directory.
    #[must_use]
    pub fn new(config: Config, registry: ComponentRegistry) -> Self {
        let output_dir = PathBuf::from(&config.build.output_dir);
        Self {
            config,
            registry,
            root: PathBuf::from("."),
            output_dir,
        }
    }

    /// Resolve content and output paths against `root`.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Override the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Resolved output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.output_dir)
    }

    /// Execute the full build process.
    pub fn build(&self) -> Result<BuildStats> {
        let start = Instant::now();
        let mut stats = BuildStats::default();
        let output_dir = self.output_dir();
        let content_type = &self.config.content.posts;

        let collector = ContentCollector::new(ContentStore::from_config(&self.config, &self.root))
            .with_renderer(MarkdownRenderer::with_theme(&self.config.build.syntax_theme));

        info!(
            content = %collector.store().root().display(),
            output = %output_dir.display(),
            "starting build"
        );

        // 1. Collect and render before touching the output directory
        let listing = collector.list_all(content_type)?;
        let rendered: Vec<_> = listing
            .posts
            .par_iter()
            .map(|post| (post, collector.render(post, &self.registry)))
            .collect();

        let mut pages = Vec::with_capacity(rendered.len());
        let mut render_failures = 0;
        for (post, result) in rendered {
            match result {
                Ok(document) => pages.push((post, document.to_html())),
                Err(e) => {
                    warn!(slug = %post.slug, error = %e, "failed to render post");
                    render_failures += 1;
                }
            }
        }

        stats.failed = listing.failures.len() + render_failures;
        if self.config.build.strict && stats.failed > 0 {
            return Err(BuildError::Failures(stats.failed));
        }

        // 2. Clean output directory
        self.check_output_dir(&output_dir, collector.store().root())?;
        self.clean_output(&output_dir)?;

        // 3. Post fragments
        let post_dir = output_dir.join(self.config.content.post_route.trim_matches('/'));
        fs::create_dir_all(&post_dir)?;
        for (post, html) in &pages {
            let path = post_dir.join(format!("{}.html", post.slug));
            fs::write(&path, html)?;
            debug!(path = %path.display(), "wrote post");
        }
        stats.posts = pages.len();

        // 4. Listing
        let published: Vec<&Post> = pages.iter().map(|(post, _)| *post).collect();
        self.write_listing(&output_dir, &published)?;

        // 5. Sitemap, posts in scan order
        let written: HashSet<&str> = published.iter().map(|p| p.slug.as_str()).collect();
        let slugs: Vec<String> = collector
            .store()
            .list_slugs(content_type)?
            .into_iter()
            .filter(|slug| written.contains(slug.as_str()))
            .collect();
        stats.sitemap_entries = self.write_sitemap(&output_dir, &slugs)?;

        stats.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            posts = stats.posts,
            failed = stats.failed,
            sitemap_entries = stats.sitemap_entries,
            duration_ms = stats.duration_ms,
            "build complete"
        );

        Ok(stats)
    }

    /// The output directory must not be the site root or hold the content.
    fn check_output_dir(&self, output_dir: &Path, content_root: &Path) -> Result<()> {
        let resolve = |p: &Path| fs::canonicalize(p).unwrap_or_else(|_| p.to_path_buf());
        let output = resolve(output_dir);

        if output == resolve(&self.root) || resolve(content_root).starts_with(&output) {
            return Err(BuildError::UnsafeOutput {
                path: output_dir.to_path_buf(),
            });
        }
        Ok(())
    }

    /// Clean the output directory.
    fn clean_output(&self, output_dir: &Path) -> Result<()> {
        if output_dir.exists() {
            debug!(dir = %output_dir.display(), "cleaning output directory");
            fs::remove_dir_all(output_dir)?;
        }
        fs::create_dir_all(output_dir)?;
        Ok(())
    }

    /// Write `posts.json`: every published post's header, newest first.
    fn write_listing(&self, output_dir: &Path, posts: &[&Post]) -> Result<()> {
        let json = serde_json::to_string_pretty(posts)?;
        fs::write(output_dir.join("posts.json"), json)?;
        debug!(count = posts.len(), "wrote posts.json");
        Ok(())
    }

    /// Write `sitemap.xml` and return the number of entries.
    fn write_sitemap(&self, output_dir: &Path, slugs: &[String]) -> Result<usize> {
        let generator = SitemapGenerator::from_config(&self.config);
        let entries =
            generator.build_manifest(self.config.sitemap.static_routes.as_slice(), slugs);

        let mut file = fs::File::create(output_dir.join("sitemap.xml"))?;
        generator.write_to(&entries, &mut file)?;
        debug!(count = entries.len(), "wrote sitemap.xml");
        Ok(entries.len())
    }
}
