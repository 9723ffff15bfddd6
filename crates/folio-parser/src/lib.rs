//! Folio Parser Library
//!
//! Renders document bodies (markdown with embedded components) into a
//! [`RenderedDocument`] tree.

pub mod components;
pub mod document;
pub mod markdown;
mod segment;
pub mod syntax;

pub use components::{ComponentCall, ComponentRegistry, Props};
pub use document::{Node, RenderedDocument, TocEntry};
pub use markdown::MarkdownRenderer;
pub use segment::{ComponentTag, parse_tag};
pub use syntax::SyntaxHighlighter;
use thiserror::Error;

/// Rendering errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A component tag with no entry in the registry.
    #[error("unknown component <{name}> at line {line}")]
    UnknownComponent { name: String, line: usize },

    /// Malformed component markup.
    #[error("syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },
}

impl RenderError {
    /// Create a syntax error.
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }

    /// Line (relative to the body) the error points at.
    pub fn line(&self) -> usize {
        match self {
            Self::UnknownComponent { line, .. } | Self::Syntax { line, .. } => *line,
        }
    }
}

/// Result type for rendering.
pub type Result<T> = std::result::Result<T, RenderError>;
