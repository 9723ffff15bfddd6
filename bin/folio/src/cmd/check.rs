//! Check command - validate configuration and content

use std::path::Path;

use color_eyre::eyre::{Result, bail};
use folio_parser::SyntaxHighlighter;

use crate::Site;

/// Validation result.
#[derive(Debug, Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Run the check command.
///
/// Loads and renders every post without writing anything.
pub fn run(config_path: &Path, strict: bool) -> Result<()> {
    tracing::info!(?config_path, strict, "Checking configuration and content");

    let mut result = ValidationResult::default();

    println!("Checking configuration...");
    let site = match Site::load(config_path) {
        Ok(site) => {
            println!("  ✓ Configuration valid");
            site
        }
        Err(e) => {
            println!("  ✗ Configuration invalid: {e:#}");
            bail!("Validation failed: {e:#}");
        }
    };

    println!("\nChecking configuration values...");
    check_config_values(&site, &mut result);

    println!("\nChecking content files...");
    validate_content(&site, &mut result);

    println!();
    println!("Summary:");
    println!("  Errors:   {}", result.errors.len());
    println!("  Warnings: {}", result.warnings.len());

    if result.has_errors() {
        println!();
        println!("Errors:");
        for err in &result.errors {
            println!("  ✗ {err}");
        }
    }

    if result.has_warnings() {
        println!();
        println!("Warnings:");
        for warn in &result.warnings {
            println!("  ⚠ {warn}");
        }
    }

    if result.has_errors() {
        bail!("Validation failed with {} error(s)", result.errors.len());
    }

    if strict && result.has_warnings() {
        bail!(
            "Validation failed with {} warning(s) (strict mode)",
            result.warnings.len()
        );
    }

    println!();
    println!("✓ All checks passed");

    Ok(())
}

/// Load and render every post.
fn validate_content(site: &Site, result: &mut ValidationResult) {
    let collector = site.collector();
    let registry = site.registry();

    let listing = match collector.list_all(&site.config.content.posts) {
        Ok(listing) => listing,
        Err(e) => {
            result.add_error(format!("Cannot scan content: {e}"));
            println!("  ✗ Cannot scan content: {e}");
            return;
        }
    };

    let checked = listing.posts.len() + listing.failures.len();
    let mut failed = 0;

    for failure in &listing.failures {
        result.add_error(format!("{}: {}", failure.slug, failure.error));
        failed += 1;
    }

    for post in &listing.posts {
        if let Err(e) = collector.render(post, &registry) {
            result.add_error(e.to_string());
            failed += 1;
        }
        if post.excerpt().trim().is_empty() {
            result.add_warning(format!("{}: empty excerpt", post.slug));
        }
    }

    if failed == 0 {
        println!("  ✓ All {checked} content files valid");
    } else {
        println!("  ✗ {failed}/{checked} content files have errors");
    }
}

/// Check configuration values for common issues.
fn check_config_values(site: &Site, result: &mut ValidationResult) {
    let config = &site.config;

    if !config.site.base_url.starts_with("http") {
        result.add_warning("site.base_url should start with http:// or https://");
    }

    if config.site.base_url.ends_with('/') {
        result.add_warning("site.base_url should not end with a slash");
    }

    if !config.content.post_route.starts_with('/') {
        result.add_warning("content.post_route should start with a slash");
    }

    let highlighter = SyntaxHighlighter::default();
    if !highlighter
        .available_themes()
        .contains(&config.build.syntax_theme.as_str())
    {
        result.add_warning(format!(
            "Unknown syntax theme '{}', the default theme will be used",
            config.build.syntax_theme
        ));
    }

    let output = site.root.join(&config.build.output_dir);
    if output.exists() && !output.is_dir() {
        result.add_error(format!(
            "Output path exists but is not a directory: {}",
            config.build.output_dir
        ));
    }

    println!("  ✓ Configuration values checked");
}
