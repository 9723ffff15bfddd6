//! End-to-end tests for the content pipeline.
//!
//! Each test lays out a small site in a temporary directory and drives it
//! through the public API.

use std::{fs, path::Path};

use folio_core::Config;
use folio_generator::{Builder, ContentCollector, ContentStore, build_manifest};
use folio_parser::ComponentRegistry;
use tempfile::TempDir;

fn write_post(root: &Path, slug: &str, content: &str) {
    let dir = root.join("content/posts");
    fs::create_dir_all(&dir).expect("create posts dir");
    fs::write(dir.join(format!("{slug}.mdx")), content).expect("write post");
}

fn post(title: &str, date: &str, body: &str) -> String {
    format!("---\ntitle: \"{title}\"\ndate: \"{date}\"\nexcerpt: \"{title} excerpt\"\ntags: [\"design\"]\n---\n\n{body}")
}

fn collector(root: &Path) -> ContentCollector {
    ContentCollector::new(ContentStore::new(root.join("content")))
}

#[test]
fn test_listing_newest_first() {
    let dir = TempDir::new().expect("tempdir");
    write_post(dir.path(), "a", &post("A", "2024-01-01", "First."));
    write_post(dir.path(), "b", &post("B", "2024-01-03", "Third."));

    let listing = collector(dir.path()).list_all("posts").expect("listing");
    let slugs: Vec<_> = listing.posts.iter().map(|p| p.slug.as_str()).collect();
    assert_eq!(slugs, vec!["b", "a"]);
}

#[test]
fn test_human_readable_dates_sort_by_calendar() {
    let dir = TempDir::new().expect("tempdir");
    write_post(dir.path(), "march", &post("March", "March 5, 2024", ""));
    write_post(dir.path(), "april", &post("April", "2024-04-01", ""));
    write_post(dir.path(), "feb", &post("Feb", "February 28, 2024", ""));

    let listing = collector(dir.path()).list_all("posts").expect("listing");
    let slugs: Vec<_> = listing.posts.iter().map(|p| p.slug.as_str()).collect();
    assert_eq!(slugs, vec!["april", "march", "feb"]);

    // Original date text is kept for display.
    assert_eq!(listing.posts[1].date().as_str(), "March 5, 2024");
}

#[test]
fn test_detail_view() {
    let dir = TempDir::new().expect("tempdir");
    write_post(dir.path(), "hello", &post("Hello", "2024-01-01", "one two three"));

    let collector = collector(dir.path());
    let hello = collector.post("posts", "hello").expect("post");
    assert_eq!(hello.title(), "Hello");
    assert_eq!(hello.excerpt(), "Hello excerpt");
    assert_eq!(hello.tags(), ["design"]);
    assert_eq!(hello.reading_time().to_string(), "1 min read");

    let missing = collector.post("posts", "nope").expect_err("missing post");
    assert!(missing.is_not_found());
}

#[test]
fn test_empty_body() {
    let dir = TempDir::new().expect("tempdir");
    write_post(dir.path(), "empty", &post("Empty", "2024-01-01", ""));

    let article = collector(dir.path())
        .article("posts", "empty", &ComponentRegistry::new())
        .expect("article");
    assert_eq!(article.post.reading_time().minutes(), 0);
    assert!(article.document.is_empty());
}

#[test]
fn test_manifest_example() {
    let entries = build_manifest("https://example.com", &["/", "/about"], &["post-1"]);
    let urls: Vec<_> = entries.iter().map(|e| e.url.as_str()).collect();

    assert_eq!(
        urls,
        vec![
            "https://example.com/",
            "https://example.com/about",
            "https://example.com/blog/post-1",
        ]
    );
}

#[test]
fn test_full_build() {
    let dir = TempDir::new().expect("tempdir");
    write_post(
        dir.path(),
        "white-space",
        &post(
            "The Power of White Space",
            "January 3, 2024",
            "## Breathing room\n\n<Callout kind=\"tip\">\nLess is **more**.\n</Callout>\n\n```rust\nlet x = 1;\n```\n",
        ),
    );
    write_post(dir.path(), "older", &post("Older", "2023-06-01", "Old news."));

    let mut config = Config::new("skorekm.dev", "https://skorekm.dev");
    config.components.insert(
        "Callout".to_string(),
        "<aside class=\"callout {kind}\">{children}</aside>".to_string(),
    );
    let registry = ComponentRegistry::from_templates(config.components.clone());

    let stats = Builder::new(config, registry)
        .with_root(dir.path())
        .build()
        .expect("build");
    assert_eq!(stats.posts, 2);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.sitemap_entries, 4);

    let out = dir.path().join("public");
    let page = fs::read_to_string(out.join("blog/white-space.html")).expect("page");
    assert!(page.contains("<h2 id=\"breathing-room\">Breathing room</h2>"));
    assert!(page.contains("<aside class=\"callout tip\"><p>Less is <strong>more</strong>.</p>"));
    assert!(page.contains("<pre"));

    let listing: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("posts.json")).expect("posts.json"))
            .expect("valid json");
    let first = &listing[0];
    assert_eq!(first["slug"], "white-space");
    assert_eq!(first["title"], "The Power of White Space");
    assert_eq!(first["date"], "January 3, 2024");
    assert_eq!(first["readingTime"], "1 min read");
    assert_eq!(listing[1]["slug"], "older");

    let sitemap = fs::read_to_string(out.join("sitemap.xml")).expect("sitemap");
    let older = sitemap.find("https://skorekm.dev/blog/older").expect("older url");
    let newer = sitemap.find("https://skorekm.dev/blog/white-space").expect("post url");
    assert!(sitemap.find("<loc>https://skorekm.dev/</loc>").expect("home") < older);
    // Posts follow scan order, not date order.
    assert!(older < newer);
}
