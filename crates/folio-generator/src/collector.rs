//! Content collection and organization.
//!
//! Loads every document of a content type, normalizes it into a [`Post`]
//! and orders the result for listing.

use std::collections::HashMap;

use folio_core::{Post, TagCount};
use folio_parser::{ComponentRegistry, MarkdownRenderer, RenderedDocument};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::store::{ContentError, ContentStore, Result};

/// A document that could not be loaded during a listing.
#[derive(Debug)]
pub struct LoadFailure {
    /// Slug of the document.
    pub slug: String,

    /// Why it was skipped.
    pub error: ContentError,
}

/// Posts of one content type, newest first.
#[derive(Debug, Default)]
pub struct Listing {
    /// Successfully loaded posts, sorted by date descending.
    pub posts: Vec<Post>,

    /// Documents skipped because they failed to load, in scan order.
    pub failures: Vec<LoadFailure>,
}

impl Listing {
    /// Number of posts.
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    /// Whether there are no posts.
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Posts carrying `tag`, in listing order.
    pub fn by_tag(&self, tag: &str) -> Vec<&Post> {
        self.posts
            .iter()
            .filter(|post| post.tags().iter().any(|t| t == tag))
            .collect()
    }

    /// Every tag with its post count, most used first, then by name.
    pub fn tags(&self) -> Vec<TagCount> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for post in &self.posts {
            for tag in post.tags() {
                *counts.entry(tag.as_str()).or_default() += 1;
            }
        }

        let mut tags: Vec<_> = counts
            .into_iter()
            .map(|(tag, count)| TagCount {
                tag: tag.to_string(),
                count,
            })
            .collect();
        tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
        tags
    }
}

/// A post together with its rendered body.
#[derive(Debug, Clone)]
pub struct Article {
    /// The post.
    pub post: Post,

    /// Rendered body.
    pub document: RenderedDocument,
}

/// Content collector over a [`ContentStore`].
#[derive(Debug)]
pub struct ContentCollector {
    store: ContentStore,
    renderer: MarkdownRenderer,
}

impl ContentCollector {
    /// Create a new content collector.
    #[must_use]
    pub fn new(store: ContentStore) -> Self {
        Self {
            store,
            renderer: MarkdownRenderer::new(),
        }
    }

    /// Use a specific renderer (e.g. with a configured syntax theme).
    #[must_use]
    pub fn with_renderer(mut self, renderer: MarkdownRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    /// Load every document of `content_type`, newest first.
    ///
    /// Only a scan failure is fatal. Documents that fail to load are
    /// logged and reported in [`Listing::failures`].
    pub fn list_all(&self, content_type: &str) -> Result<Listing> {
        let slugs = self.store.list_slugs(content_type)?;
        info!(content_type, count = slugs.len(), "collecting content");

        let results: Vec<_> = slugs
            .par_iter()
            .map(|slug| (slug, self.post(content_type, slug)))
            .collect();

        let mut listing = Listing::default();
        for (slug, result) in results {
            match result {
                Ok(post) => listing.posts.push(post),
                Err(error) => {
                    warn!(slug = %slug, error = %error, "skipping document");
                    listing.failures.push(LoadFailure {
                        slug: slug.clone(),
                        error,
                    });
                }
            }
        }

        // Stable: equal dates keep scan order.
        listing
            .posts
            .sort_by(|a, b| b.date().date().cmp(&a.date().date()));

        info!(
            posts = listing.posts.len(),
            failures = listing.failures.len(),
            "content collection complete"
        );
        Ok(listing)
    }

    /// Load a single post.
    pub fn post(&self, content_type: &str, slug: &str) -> Result<Post> {
        let document = self.store.load(content_type, slug)?;
        debug!(slug, "loaded post");
        Ok(Post::from_document(document))
    }

    /// Load a single post and render its body.
    pub fn article(
        &self,
        content_type: &str,
        slug: &str,
        registry: &ComponentRegistry,
    ) -> Result<Article> {
        let post = self.post(content_type, slug)?;
        let document = self.render(&post, registry)?;
        Ok(Article { post, document })
    }

    /// Render the body of an already loaded post.
    pub fn render(&self, post: &Post, registry: &ComponentRegistry) -> Result<RenderedDocument> {
        self.renderer
            .render(&post.content, registry)
            .map_err(|source| ContentError::Render {
                slug: post.slug.clone(),
                source,
            })
    }
}
