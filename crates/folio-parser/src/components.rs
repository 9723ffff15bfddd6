//! Registry of embedded components.
//!
//! Documents reference components by capitalized tag name
//! (`<Callout kind="tip">...</Callout>`). The renderer never looks them up
//! globally: callers hand it a [`ComponentRegistry`] that maps each tag name
//! to a render function.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::Arc,
};

use crate::syntax::html_escape;

/// Component attributes, by name.
pub type Props = BTreeMap<String, String>;

/// Everything a component needs to produce its markup.
#[derive(Debug, Clone, Copy)]
pub struct ComponentCall<'a> {
    /// Tag name as written in the document.
    pub name: &'a str,

    /// Attributes. Bare attributes carry the value `"true"`, `{expr}`
    /// attributes carry the raw expression text.
    pub props: &'a Props,

    /// Rendered markup of the children, empty for self-closing tags.
    pub children: &'a str,
}

impl ComponentCall<'_> {
    /// Look up an attribute.
    pub fn prop(&self, name: &str) -> Option<&str> {
        self.props.get(name).map(String::as_str)
    }
}

type RenderFn = Arc<dyn Fn(&ComponentCall<'_>) -> String + Send + Sync>;

/// Mapping from component tag name to render function.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    components: HashMap<String, RenderFn>,
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("components", &self.names())
            .finish()
    }
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry where each component is an HTML template.
    ///
    /// `{children}` expands to the rendered children, `{name}` to the
    /// escaped value of attribute `name` (empty when absent).
    pub fn from_templates<I, K, V>(templates: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut registry = Self::new();
        for (name, template) in templates {
            let template: String = template.into();
            registry.register(name, move |call| render_template(&template, call));
        }
        registry
    }

    /// Register (or replace) a component.
    pub fn register<F>(&mut self, name: impl Into<String>, render: F) -> &mut Self
    where
        F: Fn(&ComponentCall<'_>) -> String + Send + Sync + 'static,
    {
        self.components.insert(name.into(), Arc::new(render));
        self
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with<F>(mut self, name: impl Into<String>, render: F) -> Self
    where
        F: Fn(&ComponentCall<'_>) -> String + Send + Sync + 'static,
    {
        self.register(name, render);
        self
    }

    /// Whether a component is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.components.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Render a call, or `None` if the component is unknown.
    pub fn render(&self, call: &ComponentCall<'_>) -> Option<String> {
        self.components.get(call.name).map(|render| render(call))
    }
}

/// Expand `{children}` and `{prop}` placeholders in a template.
pub fn render_template(template: &str, call: &ComponentCall<'_>) -> String {
    let mut out = String::with_capacity(template.len() + call.children.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let placeholder = after.find('}').map(|close| &after[..close]).filter(|key| {
            !key.is_empty()
                && key
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        });

        match placeholder {
            Some("children") => {
                out.push_str(call.children);
                rest = &after["children".len() + 1..];
            }
            Some(key) => {
                if let Some(value) = call.prop(key) {
                    out.push_str(&html_escape(value));
                }
                rest = &after[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
