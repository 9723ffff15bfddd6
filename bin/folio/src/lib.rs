//! Folio CLI Library
//!
//! Command implementations for the `folio` binary, plus the helpers they
//! share for loading a site.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (build, list, check, new)

pub mod cmd;

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
pub use folio_core::{Config, Post};
pub use folio_generator::{BuildStats, Builder, ContentCollector, Listing};
use folio_generator::ContentStore;
use folio_parser::{ComponentRegistry, MarkdownRenderer};

/// Initialize tracing with the specified verbosity level.
///
/// # Arguments
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

/// A loaded site: its configuration and the directory paths resolve from.
#[derive(Debug, Clone)]
pub struct Site {
    /// Parsed configuration.
    pub config: Config,

    /// Directory containing the configuration file.
    pub root: PathBuf,
}

impl Site {
    /// Load the configuration at `config_path`.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config = Config::load(config_path).wrap_err("Failed to load configuration")?;
        tracing::debug!(?config, "Loaded configuration");

        Ok(Self {
            config,
            root: site_root(config_path),
        })
    }

    /// Components declared in `[components]`.
    pub fn registry(&self) -> ComponentRegistry {
        ComponentRegistry::from_templates(self.config.components.clone())
    }

    /// Collector over the site's content directory.
    pub fn collector(&self) -> ContentCollector {
        ContentCollector::new(ContentStore::from_config(&self.config, &self.root))
            .with_renderer(MarkdownRenderer::with_theme(&self.config.build.syntax_theme))
    }
}

/// Directory a configuration file lives in (`.` for a bare file name).
pub fn site_root(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
