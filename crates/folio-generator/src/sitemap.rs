//! Sitemap generation.
//!
//! Builds the ordered URL manifest (static routes, then one entry per post)
//! and serializes it to the sitemaps.org XML format.

use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use folio_core::Config;
use serde::Serialize;
use tracing::debug;

/// Default URL prefix for posts.
pub const DEFAULT_POST_ROUTE: &str = "/blog";

/// One URL of the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    /// Absolute URL.
    pub url: String,

    /// Generation time of the manifest.
    #[serde(rename = "lastModified")]
    pub last_modified: DateTime<Utc>,
}

/// Build a manifest with the default post route and the current time.
///
/// `base_url` is used as given and must not end with a slash.
pub fn build_manifest<R, S>(
    base_url: &str,
    static_routes: &[R],
    slugs: &[S],
) -> Vec<ManifestEntry>
where
    R: AsRef<str>,
    S: AsRef<str>,
{
    SitemapGenerator::new(base_url).build_manifest(static_routes, slugs)
}

/// Sitemap generator.
#[derive(Debug, Clone)]
pub struct SitemapGenerator {
    base_url: String,
    post_route: String,
}

impl SitemapGenerator {
    /// Create a new sitemap generator.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            post_route: DEFAULT_POST_ROUTE.to_string(),
        }
    }

    /// Create a generator using the site's base URL and post route.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.site.base_url).with_post_route(&config.content.post_route)
    }

    /// Use a different URL prefix for posts.
    #[must_use]
    pub fn with_post_route(mut self, route: impl Into<String>) -> Self {
        self.post_route = route.into();
        self
    }

    /// Absolute URL of a post.
    pub fn post_url(&self, slug: &str) -> String {
        let route = self.post_route.trim_end_matches('/');
        format!("{}{route}/{slug}", self.base_url)
    }

    /// Build the manifest stamped with the current time.
    pub fn build_manifest<R, S>(&self, static_routes: &[R], slugs: &[S]) -> Vec<ManifestEntry>
    where
        R: AsRef<str>,
        S: AsRef<str>,
    {
        self.build_manifest_at(static_routes, slugs, Utc::now())
    }

    /// Build the manifest with every entry stamped `now`.
    ///
    /// Static routes come first in the given order, then posts in the given
    /// order.
    pub fn build_manifest_at<R, S>(
        &self,
        static_routes: &[R],
        slugs: &[S],
        now: DateTime<Utc>,
    ) -> Vec<ManifestEntry>
    where
        R: AsRef<str>,
        S: AsRef<str>,
    {
        debug!(
            static_routes = static_routes.len(),
            posts = slugs.len(),
            "building manifest"
        );

        let statics = static_routes
            .iter()
            .map(|route| format!("{}{}", self.base_url, route.as_ref()));
        let posts = slugs.iter().map(|slug| self.post_url(slug.as_ref()));

        statics
            .chain(posts)
            .map(|url| ManifestEntry {
                url,
                last_modified: now,
            })
            .collect()
    }

    /// Serialize a manifest to sitemap XML.
    pub fn to_xml(&self, entries: &[ManifestEntry]) -> String {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
        xml.push('\n');

        for entry in entries {
            xml.push_str("  <url>\n");
            xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.url)));
            xml.push_str(&format!(
                "    <lastmod>{}</lastmod>\n",
                entry.last_modified.to_rfc3339_opts(SecondsFormat::Secs, true)
            ));
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }

    /// Write sitemap XML to a writer.
    pub fn write_to<W: Write>(
        &self,
        entries: &[ManifestEntry],
        writer: &mut W,
    ) -> std::io::Result<()> {
        writer.write_all(self.to_xml(entries).as_bytes())
    }
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
