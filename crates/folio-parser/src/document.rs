//! Renderable document tree handed to the presentation layer.

use crate::components::Props;

/// A rendered document: an ordered list of nodes plus its outline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedDocument {
    /// Top-level nodes in document order.
    pub nodes: Vec<Node>,

    /// Table of contents extracted from headings.
    pub toc: Vec<TocEntry>,
}

/// A node of the rendered tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Markup produced from markdown.
    Markup(String),

    /// A fenced or indented code block after highlighting.
    CodeBlock {
        /// Language tag from the fence info string.
        language: Option<String>,
        /// Highlighted markup.
        html: String,
    },

    /// An embedded component resolved through the registry.
    Component {
        /// Tag name.
        name: String,
        /// Attributes.
        props: Props,
        /// Rendered children.
        children: Vec<Node>,
        /// Markup returned by the component's render function.
        html: String,
    },
}

impl Node {
    /// Markup for this node.
    pub fn html(&self) -> &str {
        match self {
            Self::Markup(html) | Self::CodeBlock { html, .. } | Self::Component { html, .. } => {
                html
            }
        }
    }
}

/// Table of contents entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,

    /// Heading text.
    pub text: String,

    /// Anchor ID for linking.
    pub id: String,
}

impl RenderedDocument {
    /// Whether nothing was rendered.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Project the tree into a single markup string.
    pub fn to_html(&self) -> String {
        nodes_to_html(&self.nodes)
    }

    /// Names of all components used, depth first, with repeats.
    pub fn components(&self) -> Vec<&str> {
        fn walk<'a>(nodes: &'a [Node], out: &mut Vec<&'a str>) {
            for node in nodes {
                if let Node::Component { name, children, .. } = node {
                    out.push(name);
                    walk(children, out);
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.nodes, &mut out);
        out
    }
}

/// Concatenate the markup of `nodes`.
pub(crate) fn nodes_to_html(nodes: &[Node]) -> String {
    nodes.iter().map(Node::html).collect()
}
