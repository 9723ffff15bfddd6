//! Document store.
//!
//! Discovers documents of a content type and loads them into
//! [`Document`]s. The content directory is read on every call; nothing is
//! cached between calls.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use folio_core::{Config, CoreError, Document, frontmatter::parse_frontmatter};
use folio_parser::RenderError;
use thiserror::Error;
use tracing::{debug, warn};

/// Default document extension.
pub const DEFAULT_EXTENSION: &str = "mdx";

/// Content access errors.
#[derive(Debug, Error)]
pub enum ContentError {
    /// No such content type directory or document.
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The document exists but could not be turned into a valid record.
    #[error(transparent)]
    Malformed(#[from] CoreError),

    /// The document body failed to render.
    #[error("failed to render {slug}: {source}")]
    Render {
        slug: String,
        #[source]
        source: RenderError,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ContentError {
    /// Whether this error means the requested item does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }
}

/// Result type for content operations.
pub type Result<T> = std::result::Result<T, ContentError>;

/// Read access to `<root>/<content_type>/<slug>.<extension>` files.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
    extension: String,
}

impl ContentStore {
    /// Create a store rooted at `root` using the default extension.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Create a store for the content directory named in `config`,
    /// resolved against `site_root`.
    pub fn from_config(config: &Config, site_root: &Path) -> Self {
        Self::new(site_root.join(&config.content.dir)).with_extension(&config.content.extension)
    }

    /// Use a different document extension (without the dot).
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Content root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Document extension.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// List the slugs of every document of `content_type`, ordered by file
    /// name.
    pub fn list_slugs(&self, content_type: &str) -> Result<Vec<String>> {
        let dir = self.root.join(content_type);
        if !is_plain_segment(content_type) {
            return Err(ContentError::not_found(dir));
        }

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ContentError::not_found(dir));
            }
            Err(e) => return Err(e.into()),
        };

        let mut slugs = Vec::new();
        for entry in entries {
            let path = entry?.path();

            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                warn!(path = %path.display(), "skipping file with non UTF-8 name");
                continue;
            };
            if name.starts_with('.') || !path.is_file() {
                continue;
            }

            if !self.matches_extension(&path) {
                continue;
            }

            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                slugs.push(stem.to_string());
            }
        }

        slugs.sort();
        debug!(content_type, count = slugs.len(), "listed slugs");
        Ok(slugs)
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }

    /// Path a document would be read from, using the configured extension.
    pub fn document_path(&self, content_type: &str, slug: &str) -> PathBuf {
        self.root
            .join(content_type)
            .join(format!("{slug}.{}", self.extension))
    }

    /// Path of the file backing `slug`. Falls back to a directory scan when
    /// the extension on disk differs in case from the configured one.
    fn resolve_path(&self, content_type: &str, slug: &str) -> Result<PathBuf> {
        let path = self.document_path(content_type, slug);
        if path.is_file() {
            return Ok(path);
        }

        let entries = match fs::read_dir(self.root.join(content_type)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ContentError::not_found(path));
            }
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let candidate = entry?.path();
            let stem = candidate.file_stem().and_then(|s| s.to_str());
            if stem == Some(slug) && self.matches_extension(&candidate) && candidate.is_file() {
                return Ok(candidate);
            }
        }

        Err(ContentError::not_found(path))
    }

    /// Load and validate one document.
    pub fn load(&self, content_type: &str, slug: &str) -> Result<Document> {
        if !is_plain_segment(content_type) || !is_plain_segment(slug) {
            return Err(ContentError::not_found(
                self.document_path(content_type, slug),
            ));
        }
        let path = self.resolve_path(content_type, slug)?;

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ContentError::not_found(path));
            }
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), "loading document");
        let (frontmatter, content) = parse_frontmatter(&raw, &path)?;

        Ok(Document {
            slug: slug.to_string(),
            frontmatter,
            content,
        })
    }
}

/// A single, non-empty path component that cannot leave its parent.
pub fn is_plain_segment(s: &str) -> bool {
    !s.is_empty() && s != "." && s != ".." && !s.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    const DOC: &str = "---\ntitle: Hello\ndate: 2024-01-01\nexcerpt: Hi there\n---\n\nBody text.\n";

    fn store_with(files: &[(&str, &str)]) -> (TempDir, ContentStore) {
        let dir = TempDir::new().unwrap();
        let posts = dir.path().join("posts");
        fs::create_dir_all(&posts).unwrap();
        for (name, content) in files {
            fs::write(posts.join(name), content).unwrap();
        }
        let store = ContentStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_list_slugs_filters_extension() {
        let (_dir, store) = store_with(&[
            ("b.mdx", DOC),
            ("a.mdx", DOC),
            ("C.MDX", DOC),
            ("notes.txt", "x"),
            (".hidden.mdx", DOC),
        ]);

        let slugs = store.list_slugs("posts").unwrap();
        assert_eq!(slugs, vec!["C", "a", "b"]);

        for slug in &slugs {
            let doc = store.load("posts", slug).unwrap();
            assert_eq!(&doc.slug, slug);
        }
    }

    #[test]
    fn test_listed_slugs_with_dots_load() {
        let (_dir, store) = store_with(&[("wait..what.mdx", DOC), ("v1.2.mdx", DOC)]);

        let slugs = store.list_slugs("posts").unwrap();
        assert_eq!(slugs, vec!["v1.2", "wait..what"]);
        for slug in &slugs {
            assert!(store.load("posts", slug).is_ok(), "slug {slug:?} did not load");
        }
    }

    #[test]
    fn test_is_plain_segment() {
        assert!(is_plain_segment("wait..what"));
        assert!(is_plain_segment("..hidden-ish"));
        for s in ["", ".", "..", "a/b", "a\\b", "../x"] {
            assert!(!is_plain_segment(s), "{s:?}");
        }
    }

    #[test]
    fn test_list_slugs_missing_dir() {
        let (_dir, store) = store_with(&[]);
        let err = store.list_slugs("projects").unwrap_err();
        assert!(err.is_not_found());

        let err = store.list_slugs("../posts").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_list_slugs_empty_dir() {
        let (_dir, store) = store_with(&[]);
        assert!(store.list_slugs("posts").unwrap().is_empty());
    }

    #[test]
    fn test_list_slugs_skips_directories() {
        let (dir, store) = store_with(&[("a.mdx", DOC)]);
        fs::create_dir_all(dir.path().join("posts").join("drafts.mdx")).unwrap();

        assert_eq!(store.list_slugs("posts").unwrap(), vec!["a"]);
    }

    #[test]
    fn test_load_document() {
        let (_dir, store) = store_with(&[("hello.mdx", DOC)]);
        let doc = store.load("posts", "hello").unwrap();

        assert_eq!(doc.slug, "hello");
        assert_eq!(doc.frontmatter.title, "Hello");
        assert_eq!(doc.content, "Body text.\n");
    }

    #[test]
    fn test_load_missing_and_escaping_slugs() {
        let (_dir, store) = store_with(&[("hello.mdx", DOC)]);

        for slug in ["missing", "", "..", "../posts/hello", "a/b", "a\\b"] {
            let err = store.load("posts", slug).unwrap_err();
            assert!(err.is_not_found(), "slug {slug:?} gave {err}");
        }
    }

    #[test]
    fn test_load_malformed() {
        let (_dir, store) = store_with(&[
            ("open.mdx", "---\ntitle: Open\n\nBody"),
            ("bare.mdx", "Just a body"),
        ]);

        let err = store.load("posts", "open").unwrap_err();
        assert!(matches!(
            err,
            ContentError::Malformed(CoreError::MalformedDocument { .. })
        ));

        let err = store.load("posts", "bare").unwrap_err();
        assert!(matches!(err, ContentError::Malformed(_)));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_custom_extension() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("notes")).unwrap();
        fs::write(dir.path().join("notes/one.md"), DOC).unwrap();
        fs::write(dir.path().join("notes/two.mdx"), DOC).unwrap();

        let store = ContentStore::new(dir.path()).with_extension("md");
        assert_eq!(store.list_slugs("notes").unwrap(), vec!["one"]);
        assert!(store.load("notes", "one").is_ok());
        assert!(store.load("notes", "two").unwrap_err().is_not_found());
    }
}
