//! Folio Core Library
//!
//! Core types, configuration, and error handling for the Folio blog generator.

pub mod config;
pub mod content;
pub mod error;
pub mod frontmatter;

pub use config::Config;
pub use content::{Document, NormalizedFrontmatter, Post, ReadingTime, TagCount, normalize};
pub use error::{CoreError, Result};
pub use frontmatter::{Frontmatter, PostDate};
