//! Site configuration management.

use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Main configuration structure for Folio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Site-wide settings.
    pub site: SiteConfig,

    /// Content source settings.
    #[serde(default)]
    pub content: ContentConfig,

    /// Sitemap settings.
    #[serde(default)]
    pub sitemap: SitemapConfig,

    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,

    /// Embedded components: tag name to HTML template.
    #[serde(default)]
    pub components: BTreeMap<String, String>,
}

/// Site-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site title.
    pub title: String,

    /// Base URL for the site (e.g., "https://example.com"), without a
    /// trailing slash.
    pub base_url: String,

    /// Site description for meta tags.
    #[serde(default)]
    pub description: Option<String>,

    /// Site author name.
    #[serde(default)]
    pub author: Option<String>,
}

/// Where documents live and how they map to URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Content root directory.
    #[serde(default = "default_content_dir")]
    pub dir: String,

    /// Document file extension, without the dot.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Content type (directory under the root) holding blog posts.
    #[serde(default = "default_posts")]
    pub posts: String,

    /// URL prefix for post pages.
    #[serde(default = "default_post_route")]
    pub post_route: String,
}

/// Sitemap configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitemapConfig {
    /// Routes that are not backed by a document, in output order.
    #[serde(default = "default_static_routes")]
    pub static_routes: Vec<String>,
}

/// Build configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Output directory for generated files.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Syntax highlighting theme name.
    #[serde(default = "default_syntax_theme")]
    pub syntax_theme: String,

    /// Abort the build when any single document fails.
    #[serde(default)]
    pub strict: bool,
}

// Default value functions
fn default_content_dir() -> String {
    "content".to_string()
}

fn default_extension() -> String {
    "mdx".to_string()
}

fn default_posts() -> String {
    "posts".to_string()
}

fn default_post_route() -> String {
    "/blog".to_string()
}

fn default_static_routes() -> Vec<String> {
    vec!["/".to_string(), "/about".to_string()]
}

fn default_output_dir() -> String {
    "public".to_string()
}

fn default_syntax_theme() -> String {
    "base16-ocean.dark".to_string()
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            dir: default_content_dir(),
            extension: default_extension(),
            posts: default_posts(),
            post_route: default_post_route(),
        }
    }
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            static_routes: default_static_routes(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            syntax_theme: default_syntax_theme(),
            strict: false,
        }
    }
}

impl Config {
    /// Configuration with the given site identity and defaults elsewhere.
    pub fn new(title: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            site: SiteConfig {
                title: title.into(),
                base_url: base_url.into(),
                description: None,
                author: None,
            },
            content: ContentConfig::default(),
            sitemap: SitemapConfig::default(),
            build: BuildConfig::default(),
            components: BTreeMap::new(),
        }
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `FOLIO__SECTION__KEY` environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("FOLIO").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.site.title.is_empty() {
            return Err(CoreError::config("site.title cannot be empty"));
        }

        if self.site.base_url.is_empty() {
            return Err(CoreError::config("site.base_url cannot be empty"));
        }

        if self.content.extension.is_empty() || self.content.extension.starts_with('.') {
            return Err(CoreError::config(
                "content.extension must be a bare extension such as \"mdx\"",
            ));
        }

        let output_dir = self.build.output_dir.trim();
        if output_dir.is_empty() || output_dir == "." {
            return Err(CoreError::config(
                "build.output_dir must name a directory other than the site root",
            ));
        }

        if self.site.base_url.ends_with('/') {
            tracing::warn!("site.base_url should not have a trailing slash");
        }

        if !self.content.post_route.starts_with('/') {
            tracing::warn!(
                post_route = %self.content.post_route,
                "content.post_route should start with a slash"
            );
        }

        Ok(())
    }

    /// Path of the directory holding posts, relative to `root`.
    pub fn posts_dir(&self, root: &Path) -> std::path::PathBuf {
        root.join(&self.content.dir).join(&self.content.posts)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn create_test_config() -> String {
        r#"
[site]
title = "skorekm.dev"
base_url = "https://skorekm.dev"
author = "Kamil"

[content]
dir = "src/content"
extension = "md"
posts = "articles"
post_route = "/writing"

[sitemap]
static_routes = ["/", "/about", "/uses"]

[build]
output_dir = "dist"
syntax_theme = "InspiredGitHub"
strict = true

[components]
Callout = "<aside>{children}</aside>"
"#
        .to_string()
    }

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("folio.toml");
        let mut file = std::fs::File::create(&config_path).expect("create file");
        file.write_all(create_test_config().as_bytes())
            .expect("write");

        let config = Config::load(&config_path).expect("load config");

        assert_eq!(config.site.title, "skorekm.dev");
        assert_eq!(config.site.base_url, "https://skorekm.dev");
        assert_eq!(config.site.author.as_deref(), Some("Kamil"));
        assert_eq!(config.content.dir, "src/content");
        assert_eq!(config.content.extension, "md");
        assert_eq!(config.content.posts, "articles");
        assert_eq!(config.content.post_route, "/writing");
        assert_eq!(config.sitemap.static_routes, vec!["/", "/about", "/uses"]);
        assert_eq!(config.build.output_dir, "dist");
        assert_eq!(config.build.syntax_theme, "InspiredGitHub");
        assert!(config.build.strict);
        assert_eq!(
            config.components.get("Callout").map(String::as_str),
            Some("<aside>{children}</aside>")
        );
    }

    #[test]
    fn test_config_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("folio.toml");
        let minimal_config = r#"
[site]
title = "Minimal Site"
base_url = "https://example.com"
"#;
        std::fs::write(&config_path, minimal_config).expect("write");

        let config = Config::load(&config_path).expect("load config");

        assert_eq!(config.content.dir, "content");
        assert_eq!(config.content.extension, "mdx");
        assert_eq!(config.content.posts, "posts");
        assert_eq!(config.content.post_route, "/blog");
        assert_eq!(config.sitemap.static_routes, vec!["/", "/about"]);
        assert_eq!(config.build.output_dir, "public");
        assert_eq!(config.build.syntax_theme, "base16-ocean.dark");
        assert!(!config.build.strict);
        assert!(config.components.is_empty());
        assert_eq!(
            config.posts_dir(Path::new("/site")),
            Path::new("/site/content/posts")
        );
    }

    #[test]
    fn test_config_validation_empty_title() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("folio.toml");
        let config_content = r#"
[site]
title = ""
base_url = "https://example.com"
"#;
        std::fs::write(&config_path, config_content).expect("write");

        let result = Config::load(&config_path);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("title cannot be empty")
        );
    }

    #[test]
    fn test_config_validation_dotted_extension() {
        let mut config = Config::new("Site", "https://example.com");
        config.content.extension = ".mdx".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_output_dir_is_site_root() {
        for dir in ["", " ", "."] {
            let mut config = Config::new("Site", "https://example.com");
            config.build.output_dir = dir.to_string();
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("build.output_dir"), "{dir:?}");
        }
    }

    #[test]
    fn test_config_not_found() {
        let result = Config::load(Path::new("/nonexistent/folio.toml"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn test_load_with_env_reads_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("folio.toml");
        std::fs::write(&config_path, create_test_config()).expect("write");

        let config = Config::load_with_env(&config_path).expect("load config");
        assert_eq!(config.site.title, "skorekm.dev");
        assert_eq!(config.content.posts, "articles");
    }

    #[test]
    fn test_load_with_env_overrides_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("folio.toml");
        std::fs::write(&config_path, create_test_config()).expect("write");

        // SAFETY: no other test reads or writes this variable.
        unsafe { std::env::set_var("FOLIO__BUILD__SYNTAX_THEME", "Solarized (dark)") };
        let result = Config::load_with_env(&config_path);
        unsafe { std::env::remove_var("FOLIO__BUILD__SYNTAX_THEME") };

        let config = result.expect("load config");
        assert_eq!(config.build.syntax_theme, "Solarized (dark)");
        assert_eq!(config.build.output_dir, "dist");
        assert_eq!(config.site.title, "skorekm.dev");
    }
}
