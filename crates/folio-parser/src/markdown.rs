//! Markdown renderer using pulldown-cmark.

use std::{collections::HashMap, ops::Range};

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html};

use crate::{
    RenderError, Result,
    components::{ComponentCall, ComponentRegistry},
    document::{Node, RenderedDocument, TocEntry, nodes_to_html},
    segment::{ComponentTag, Segment, parse_tag, segment, starts_component},
    syntax::SyntaxHighlighter,
};

/// Markdown renderer with syntax highlighting and component support.
#[derive(Debug)]
pub struct MarkdownRenderer {
    highlighter: SyntaxHighlighter,
    options: Options,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Headings seen so far, shared across nested components.
#[derive(Debug, Default)]
struct Outline {
    toc: Vec<TocEntry>,
    seen: HashMap<String, usize>,
}

impl Outline {
    fn unique_id(&mut self, base: &str) -> String {
        let base = if base.is_empty() { "section" } else { base };
        let count = self.seen.entry(base.to_string()).or_insert(0);
        *count += 1;
        if *count == 1 {
            base.to_string()
        } else {
            format!("{base}-{}", *count - 1)
        }
    }
}

impl MarkdownRenderer {
    /// Create a new renderer with default options.
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self {
            highlighter: SyntaxHighlighter::default(),
            options,
        }
    }

    /// Create a renderer with a custom syntax theme.
    pub fn with_theme(theme: &str) -> Self {
        Self {
            highlighter: SyntaxHighlighter::new(theme),
            ..Self::new()
        }
    }

    /// Render a document body.
    ///
    /// Components are resolved against `registry` only. Line numbers in
    /// errors count from the first line of `body`.
    pub fn render(&self, body: &str, registry: &ComponentRegistry) -> Result<RenderedDocument> {
        let mut outline = Outline::default();
        let nodes = self.render_nodes(body, 1, registry, &mut outline)?;

        Ok(RenderedDocument {
            nodes,
            toc: outline.toc,
        })
    }

    fn render_nodes(
        &self,
        body: &str,
        first_line: usize,
        registry: &ComponentRegistry,
        outline: &mut Outline,
    ) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();

        for piece in segment(body, first_line)? {
            match piece {
                Segment::Markdown { text, line } => {
                    self.render_markdown(text, line, registry, outline, &mut nodes)?;
                }
                Segment::Component {
                    tag,
                    children,
                    line,
                } => {
                    if !registry.contains(&tag.name) {
                        return Err(RenderError::UnknownComponent {
                            name: tag.name,
                            line,
                        });
                    }

                    let children = match children {
                        Some((text, child_line)) => {
                            self.render_nodes(&text, child_line, registry, outline)?
                        }
                        None => Vec::new(),
                    };
                    let children_html = nodes_to_html(&children);

                    let call = ComponentCall {
                        name: &tag.name,
                        props: &tag.props,
                        children: &children_html,
                    };
                    let html = registry
                        .render(&call)
                        .ok_or_else(|| RenderError::UnknownComponent {
                            name: tag.name.clone(),
                            line,
                        })?;

                    nodes.push(Node::Component {
                        name: tag.name,
                        props: tag.props,
                        children,
                        html,
                    });
                }
            }
        }

        Ok(nodes)
    }

    /// Render a markdown run, appending markup and code block nodes.
    fn render_markdown(
        &self,
        text: &str,
        first_line: usize,
        registry: &ComponentRegistry,
        outline: &mut Outline,
        nodes: &mut Vec<Node>,
    ) -> Result<()> {
        let line_of = |offset: usize| first_line + text[..offset].matches('\n').count();

        let mut events: Vec<(Event<'_>, Range<usize>)> =
            Parser::new_ext(text, self.options).into_offset_iter().collect();
        assign_heading_ids(&mut events, outline);
        let events = merge_text(events);
        let marker = marker_prefix(text);

        let mut output = Vec::with_capacity(events.len());
        let mut code_blocks: Vec<(Option<String>, String)> = Vec::new();
        let mut code: Option<(Option<String>, String)> = None;
        let mut depth = 0usize;

        for (event, range) in events {
            if let Some((_, buffer)) = code.as_mut() {
                match event {
                    Event::Text(t) => buffer.push_str(&t),
                    Event::End(TagEnd::CodeBlock) => {
                        if let Some((lang, source)) = code.take() {
                            let highlighted = self.highlighter.highlight(&source, lang.as_deref());
                            if depth == 0 {
                                output.push(Event::Html(
                                    code_marker(&marker, code_blocks.len()).into(),
                                ));
                                code_blocks.push((lang, highlighted));
                            } else {
                                output.push(Event::Html(highlighted.into()));
                            }
                        }
                    }
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split_whitespace()
                            .next()
                            .map(|lang| lang.trim_matches(['{', '}']).to_string())
                            .filter(|lang| !lang.is_empty()),
                        CodeBlockKind::Indented => None,
                    };
                    code = Some((lang, String::new()));
                }
                Event::Start(tag) => {
                    depth += 1;
                    output.push(Event::Start(tag));
                }
                Event::End(tag) => {
                    depth = depth.saturating_sub(1);
                    output.push(Event::End(tag));
                }
                Event::InlineHtml(raw) => {
                    match resolve_inline(&raw, line_of(range.start), registry)? {
                        Some(rendered) => output.push(Event::InlineHtml(rendered.into())),
                        None => output.push(Event::InlineHtml(raw)),
                    }
                }
                Event::Html(raw) => match resolve_inline(&raw, line_of(range.start), registry)? {
                    Some(rendered) => output.push(Event::Html(rendered.into())),
                    None => output.push(Event::Html(raw)),
                },
                Event::Text(t) => {
                    let source = &text[range.clone()];
                    resolve_text(t, source, line_of(range.start), registry, &mut output)?;
                }
                other => output.push(other),
            }
        }

        let mut markup = String::new();
        html::push_html(&mut markup, output.into_iter());

        let mut rest = markup.as_str();
        for (index, (language, highlighted)) in code_blocks.into_iter().enumerate() {
            let code_marker = code_marker(&marker, index);
            if let Some(at) = rest.find(&code_marker) {
                push_markup(nodes, &rest[..at]);
                nodes.push(Node::CodeBlock {
                    language,
                    html: highlighted,
                });
                rest = &rest[at + code_marker.len()..];
            }
        }
        push_markup(nodes, rest);

        Ok(())
    }
}

fn push_markup(nodes: &mut Vec<Node>, html: &str) {
    if !html.trim().is_empty() {
        nodes.push(Node::Markup(html.to_string()));
    }
}

/// A code block marker prefix that does not occur anywhere in `text`, so
/// raw HTML comments in the body can never be mistaken for one.
fn marker_prefix(text: &str) -> String {
    (0u32..)
        .map(|n| format!("<!--folio:code:{n}:"))
        .find(|prefix| !text.contains(prefix.as_str()))
        .unwrap_or_default()
}

fn code_marker(prefix: &str, index: usize) -> String {
    format!("{prefix}{index}-->")
}

/// Join adjacent text events so a tag split across them is seen whole.
fn merge_text(events: Vec<(Event<'_>, Range<usize>)>) -> Vec<(Event<'_>, Range<usize>)> {
    let mut merged: Vec<(Event<'_>, Range<usize>)> = Vec::with_capacity(events.len());
    for (event, range) in events {
        if let (Event::Text(next), Some((Event::Text(prev), prev_range))) =
            (&event, merged.last_mut())
        {
            *prev = CowStr::from(format!("{}{}", &**prev, &**next));
            prev_range.end = range.end;
            continue;
        }
        merged.push((event, range));
    }
    merged
}

/// First `<X` or `</X` in `s`.
fn find_component_start(s: &str) -> Option<usize> {
    s.match_indices('<')
        .map(|(i, _)| i)
        .find(|&i| starts_component(&s[i..], "<") || starts_component(&s[i..], "</"))
}

/// Whether `pat` occurs in `source` without a backslash escape in front.
fn unescaped_in_source(source: &str, pat: &str) -> bool {
    source
        .match_indices(pat)
        .any(|(i, _)| !source[..i].ends_with('\\'))
}

/// Resolve components that pulldown-cmark left as plain text, such as tags
/// with `{...}` values containing spaces. Escaped tags stay literal.
fn resolve_text<'a>(
    text: CowStr<'a>,
    source: &str,
    mut line: usize,
    registry: &ComponentRegistry,
    output: &mut Vec<Event<'a>>,
) -> Result<()> {
    if find_component_start(&text).is_none() {
        output.push(Event::Text(text));
        return Ok(());
    }

    let mut pending = String::new();
    let mut rest: &str = &text;

    while let Some(at) = find_component_start(rest) {
        let (before, candidate) = rest.split_at(at);
        line += before.matches('\n').count();
        pending.push_str(before);

        let name_start = if candidate.starts_with("</") { 2 } else { 1 };
        let name_len = candidate[name_start..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
            .unwrap_or(candidate.len() - name_start);
        if !unescaped_in_source(source, &candidate[..name_start + name_len]) {
            pending.push('<');
            rest = &candidate[1..];
            continue;
        }

        if name_start == 2 {
            let shown = &candidate[..name_start + name_len];
            return Err(RenderError::syntax(
                line,
                format!("unexpected closing tag `{shown}>`"),
            ));
        }

        let (tag, len) = parse_tag(candidate).map_err(|msg| RenderError::syntax(line, msg))?;
        let rendered = render_inline_tag(tag, line, registry)?;

        if !pending.is_empty() {
            output.push(Event::Text(CowStr::from(std::mem::take(&mut pending))));
        }
        output.push(Event::InlineHtml(rendered.into()));
        line += candidate[..len].matches('\n').count();
        rest = &candidate[len..];
    }

    pending.push_str(rest);
    if !pending.is_empty() {
        output.push(Event::Text(pending.into()));
    }
    Ok(())
}

/// Render a self-closing component found inside markdown flow.
fn render_inline_tag(
    tag: ComponentTag,
    line: usize,
    registry: &ComponentRegistry,
) -> Result<String> {
    if !tag.self_closing {
        return Err(RenderError::syntax(
            line,
            format!(
                "component <{}> inside a paragraph must be self-closing",
                tag.name
            ),
        ));
    }

    let call = ComponentCall {
        name: &tag.name,
        props: &tag.props,
        children: "",
    };
    registry
        .render(&call)
        .ok_or_else(|| RenderError::UnknownComponent {
            name: tag.name.clone(),
            line,
        })
}

/// Render a component appearing inside markdown flow (inline, or as an
/// HTML block inside a list or quote). Returns `None` for plain HTML.
fn resolve_inline(
    raw: &str,
    line: usize,
    registry: &ComponentRegistry,
) -> Result<Option<String>> {
    let trimmed = raw.trim();

    if starts_component(trimmed, "</") {
        return Err(RenderError::syntax(
            line,
            format!("unexpected closing tag `{trimmed}`"),
        ));
    }
    if !starts_component(trimmed, "<") {
        return Ok(None);
    }

    let (tag, len) = parse_tag(trimmed).map_err(|msg| RenderError::syntax(line, msg))?;
    let mut rendered = render_inline_tag(tag, line, registry)?;

    rendered.push_str(&trimmed[len..]);
    if raw.ends_with('\n') {
        rendered.push('\n');
    }
    Ok(Some(rendered))
}

/// Give every heading an id and record it in the outline.
fn assign_heading_ids(events: &mut [(Event<'_>, Range<usize>)], outline: &mut Outline) {
    let mut i = 0;
    while i < events.len() {
        let (level, explicit) = match &events[i].0 {
            Event::Start(Tag::Heading { level, id, .. }) => {
                (*level as u8, id.as_ref().map(|id| id.to_string()))
            }
            _ => {
                i += 1;
                continue;
            }
        };

        let mut text = String::new();
        let mut end = i + 1;
        while end < events.len() {
            match &events[end].0 {
                Event::End(TagEnd::Heading(_)) => break,
                Event::Text(t) | Event::Code(t) => text.push_str(t),
                _ => {}
            }
            end += 1;
        }

        let id = match explicit {
            Some(id) => {
                outline.unique_id(&id);
                id
            }
            None => {
                let id = outline.unique_id(&slugify(&text));
                if let Event::Start(Tag::Heading { id: slot, .. }) = &mut events[i].0 {
                    *slot = Some(CowStr::from(id.clone()));
                }
                id
            }
        };

        outline.toc.push(TocEntry { level, text, id });
        i = end + 1;
    }
}

/// Convert text to a URL-safe slug.
fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else if c.is_whitespace() || c == '-' || c == '_' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|c| *c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ComponentRegistry {
        ComponentRegistry::new()
            .with("Callout", |call| {
                format!(
                    "<aside class=\"callout {}\">{}</aside>",
                    call.prop("kind").unwrap_or("note"),
                    call.children
                )
            })
            .with("Badge", |call| {
                format!("<span class=\"badge\">{}</span>", call.prop("label").unwrap_or(""))
            })
    }

    #[test]
    fn test_render_empty_body() {
        let renderer = MarkdownRenderer::new();
        let doc = renderer.render("", &ComponentRegistry::new()).unwrap();
        assert!(doc.is_empty());
        assert!(doc.toc.is_empty());

        let doc = renderer.render("  \n\n ", &ComponentRegistry::new()).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_render_simple_markdown() {
        let renderer = MarkdownRenderer::new();
        let doc = renderer
            .render("# Hello World\n\nThis is *a* test.", &ComponentRegistry::new())
            .unwrap();

        let html = doc.to_html();
        assert!(html.contains("<h1 id=\"hello-world\">Hello World</h1>"));
        assert!(html.contains("<p>This is <em>a</em> test.</p>"));
        assert_eq!(doc.nodes.len(), 1);
    }

    #[test]
    fn test_code_block_is_highlighted_node() {
        let renderer = MarkdownRenderer::new();
        let body = "Before.\n\n```rust\nfn main() {}\n```\n\nAfter.\n";
        let doc = renderer.render(body, &ComponentRegistry::new()).unwrap();

        assert_eq!(doc.nodes.len(), 3);
        assert!(matches!(&doc.nodes[0], Node::Markup(html) if html.contains("Before.")));
        match &doc.nodes[1] {
            Node::CodeBlock { language, html } => {
                assert_eq!(language.as_deref(), Some("rust"));
                assert!(html.contains("<pre"));
                assert!(html.contains("<span"));
            }
            other => panic!("expected code block, got {other:?}"),
        }
        assert!(matches!(&doc.nodes[2], Node::Markup(html) if html.contains("After.")));
        assert!(!doc.to_html().contains("folio:code"));
    }

    #[test]
    fn test_code_block_in_list_stays_inline() {
        let renderer = MarkdownRenderer::new();
        let body = "- item\n\n  ```text\n  nested\n  ```\n";
        let doc = renderer.render(body, &ComponentRegistry::new()).unwrap();

        assert_eq!(doc.nodes.len(), 1);
        let html = doc.to_html();
        assert!(html.contains("<li>"));
        assert!(html.contains("nested"));
    }

    #[test]
    fn test_block_component_with_markdown_children() {
        let renderer = MarkdownRenderer::new();
        let body = "Intro\n\n<Callout kind=\"tip\">\n  Use **bold** text.\n</Callout>\n";
        let doc = renderer.render(body, &registry()).unwrap();

        assert_eq!(doc.components(), vec!["Callout"]);
        match &doc.nodes[1] {
            Node::Component {
                name,
                props,
                children,
                html,
            } => {
                assert_eq!(name, "Callout");
                assert_eq!(props["kind"], "tip");
                assert_eq!(children.len(), 1);
                assert_eq!(
                    html,
                    "<aside class=\"callout tip\"><p>Use <strong>bold</strong> text.</p>\n</aside>"
                );
            }
            other => panic!("expected component, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_components() {
        let renderer = MarkdownRenderer::new();
        let body = "<Callout>\n<Badge label=\"inner\" />\n</Callout>\n";
        let doc = renderer.render(body, &registry()).unwrap();

        assert_eq!(doc.components(), vec!["Callout", "Badge"]);
        assert_eq!(
            doc.to_html(),
            "<aside class=\"callout note\"><span class=\"badge\">inner</span></aside>"
        );
    }

    #[test]
    fn test_inline_component() {
        let renderer = MarkdownRenderer::new();
        let doc = renderer
            .render("Status: <Badge label=\"new\" /> today.", &registry())
            .unwrap();

        assert_eq!(
            doc.to_html(),
            "<p>Status: <span class=\"badge\">new</span> today.</p>\n"
        );
    }

    #[test]
    fn test_unknown_component_is_error() {
        let renderer = MarkdownRenderer::new();

        let err = renderer
            .render("Text\n\n<Chart src=\"a.csv\" />\n", &registry())
            .unwrap_err();
        assert_eq!(
            err,
            RenderError::UnknownComponent {
                name: "Chart".to_string(),
                line: 3
            }
        );

        let err = renderer
            .render("Inline <Chart /> here", &registry())
            .unwrap_err();
        assert!(matches!(err, RenderError::UnknownComponent { ref name, .. } if name == "Chart"));
    }

    #[test]
    fn test_component_left_as_text_is_resolved() {
        let renderer = MarkdownRenderer::new();
        let body = "Intro.\n\nSee <Chart data={{ a: 1 }} /> here.";

        let err = renderer.render(body, &ComponentRegistry::new()).unwrap_err();
        assert_eq!(
            err,
            RenderError::UnknownComponent {
                name: "Chart".to_string(),
                line: 3
            }
        );

        let registry = ComponentRegistry::new().with("Chart", |call| {
            format!("<figure>{}</figure>", call.prop("data").unwrap_or(""))
        });
        let doc = renderer.render(body, &registry).unwrap();
        assert_eq!(
            doc.to_html(),
            "<p>Intro.</p>\n<p>See <figure>{ a: 1 }</figure> here.</p>\n"
        );
    }

    #[test]
    fn test_broken_component_in_text_is_syntax_error() {
        let renderer = MarkdownRenderer::new();
        let err = renderer
            .render("A <Chart data={{ a: 1 } here", &ComponentRegistry::new())
            .unwrap_err();
        assert!(matches!(err, RenderError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_escaped_component_stays_literal() {
        let renderer = MarkdownRenderer::new();
        let doc = renderer
            .render("Write \\<Chart /> to embed a chart.", &ComponentRegistry::new())
            .unwrap();
        assert_eq!(
            doc.to_html(),
            "<p>Write &lt;Chart /&gt; to embed a chart.</p>\n"
        );
    }

    #[test]
    fn test_marker_lookalike_comment_in_body() {
        let renderer = MarkdownRenderer::new();
        let body = "<!--folio:code:0:0-->\n\nBefore.\n\n```rust\nfn main() {}\n```\n\nAfter.\n";
        let doc = renderer.render(body, &ComponentRegistry::new()).unwrap();

        assert_eq!(doc.nodes.len(), 3);
        match &doc.nodes[0] {
            Node::Markup(html) => {
                assert!(html.contains("<!--folio:code:0:0-->"));
                assert!(html.contains("Before."));
            }
            other => panic!("expected markup, got {other:?}"),
        }
        assert!(matches!(&doc.nodes[1], Node::CodeBlock { language: Some(l), .. } if l == "rust"));
        assert!(matches!(&doc.nodes[2], Node::Markup(html) if html.contains("After.")));
    }

    #[test]
    fn test_inline_component_must_self_close() {
        let renderer = MarkdownRenderer::new();
        let err = renderer
            .render("Some <Badge>text</Badge> here", &registry())
            .unwrap_err();
        assert!(matches!(err, RenderError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_lowercase_html_passes_through() {
        let renderer = MarkdownRenderer::new();
        let doc = renderer
            .render("<div class=\"note\">\nraw\n</div>\n", &ComponentRegistry::new())
            .unwrap();
        assert!(doc.to_html().contains("<div class=\"note\">"));
    }

    #[test]
    fn test_component_example_in_code_fence_is_not_resolved() {
        let renderer = MarkdownRenderer::new();
        let body = "```jsx\n<Chart data={rows} />\n```\n";
        let doc = renderer.render(body, &ComponentRegistry::new()).unwrap();

        assert!(matches!(&doc.nodes[0], Node::CodeBlock { language: Some(l), .. } if l == "jsx"));
        assert!(doc.to_html().contains("Chart"));
    }

    #[test]
    fn test_toc_extraction() {
        let renderer = MarkdownRenderer::new();
        let doc = renderer
            .render(
                "# Heading 1\n## Heading 2\n### Heading `3`\n## Heading 2\n## Custom {#my-id}",
                &ComponentRegistry::new(),
            )
            .unwrap();

        let ids: Vec<_> = doc.toc.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["heading-1", "heading-2", "heading-3", "heading-2-1", "my-id"]
        );
        assert_eq!(doc.toc[0].level, 1);
        assert_eq!(doc.toc[2].level, 3);
        assert_eq!(doc.toc[2].text, "Heading 3");
        assert!(doc.to_html().contains("id=\"heading-2-1\""));
    }

    #[test]
    fn test_table_rendering() {
        let renderer = MarkdownRenderer::new();
        let doc = renderer
            .render(
                "| Header 1 | Header 2 |\n|----------|----------|\n| Cell 1   | Cell 2   |",
                &ComponentRegistry::new(),
            )
            .unwrap();

        let html = doc.to_html();
        assert!(html.contains("<table>"));
        assert!(html.contains("<thead>"));
        assert!(html.contains("<td>"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Test 123 Post"), "test-123-post");
        assert_eq!(slugify("Multiple   Spaces"), "multiple-spaces");
        assert_eq!(slugify("Special!@#Chars"), "specialchars");
    }
}
