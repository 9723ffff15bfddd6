//! Content types and derived metadata.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::frontmatter::Frontmatter;

/// Assumed reading speed used for reading time estimates.
pub const WORDS_PER_MINUTE: usize = 200;

/// Estimated minutes needed to read a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReadingTime(u32);

impl ReadingTime {
    /// Estimate from a body of text: whitespace-delimited words, rounded up
    /// to the next whole minute. Empty text reads in zero minutes.
    pub fn estimate(content: &str) -> Self {
        Self::from_words(word_count(content))
    }

    /// Estimate from a word count.
    pub fn from_words(words: usize) -> Self {
        let minutes = words.div_ceil(WORDS_PER_MINUTE);
        Self(u32::try_from(minutes).unwrap_or(u32::MAX))
    }

    /// Whole minutes.
    pub fn minutes(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ReadingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min read", self.0)
    }
}

impl Serialize for ReadingTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Count whitespace-delimited words.
pub fn word_count(content: &str) -> usize {
    content.split_whitespace().count()
}

/// A content document as stored on disk: header plus raw body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Identifier derived from the file name without extension.
    pub slug: String,

    /// Parsed and validated header.
    pub frontmatter: Frontmatter,

    /// Raw body text in the markdown dialect.
    pub content: String,
}

/// Frontmatter with computed fields merged in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedFrontmatter {
    /// Declared fields, unchanged.
    #[serde(flatten)]
    pub frontmatter: Frontmatter,

    /// Estimated reading time of the body.
    #[serde(rename = "readingTime")]
    pub reading_time: ReadingTime,
}

/// Compute derived metadata for a document.
///
/// The input header is left untouched; the result owns a copy.
pub fn normalize(frontmatter: &Frontmatter, content: &str) -> NormalizedFrontmatter {
    NormalizedFrontmatter {
        frontmatter: frontmatter.clone(),
        reading_time: ReadingTime::estimate(content),
    }
}

/// A document assembled for listing and detail views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    /// Stable identity of the post.
    pub slug: String,

    /// Header with derived fields.
    #[serde(flatten)]
    pub meta: NormalizedFrontmatter,

    /// Raw body text.
    #[serde(skip)]
    pub content: String,
}

impl Post {
    /// Normalize a loaded document into a post.
    pub fn from_document(document: Document) -> Self {
        let meta = normalize(&document.frontmatter, &document.content);
        Self {
            slug: document.slug,
            meta,
            content: document.content,
        }
    }

    /// Post title.
    pub fn title(&self) -> &str {
        &self.meta.frontmatter.title
    }

    /// Publication date.
    pub fn date(&self) -> &crate::frontmatter::PostDate {
        &self.meta.frontmatter.date
    }

    /// Listing summary.
    pub fn excerpt(&self) -> &str {
        &self.meta.frontmatter.excerpt
    }

    /// Tags in declaration order.
    pub fn tags(&self) -> &[String] {
        &self.meta.frontmatter.tags
    }

    /// Estimated reading time.
    pub fn reading_time(&self) -> ReadingTime {
        self.meta.reading_time
    }
}

/// A single tag with the number of posts carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    /// Tag name.
    pub tag: String,

    /// Number of posts.
    pub count: usize,
}
