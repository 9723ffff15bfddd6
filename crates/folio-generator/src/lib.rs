//! Folio Generator Library
//!
//! Content pipeline for Folio.
//!
//! # Modules
//!
//! - [`store`] - Document discovery and loading
//! - [`collector`] - Listing assembly and ordering
//! - [`sitemap`] - URL manifest and XML sitemap generation
//! - [`build`] - Build orchestration

pub mod build;
pub mod collector;
pub mod sitemap;
pub mod store;

pub use build::{BuildError, BuildStats, Builder};
pub use collector::{Article, ContentCollector, Listing, LoadFailure};
pub use sitemap::{ManifestEntry, SitemapGenerator, build_manifest};
pub use store::{ContentError, ContentStore, is_plain_segment};
