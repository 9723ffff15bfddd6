//! Splitting a document body into markdown runs and block components.
//!
//! A block component is a capitalized tag that starts a line (at most three
//! spaces of indent) outside a fenced code block. It is either self-closing
//! or wraps children up to the matching closing tag.

use crate::{RenderError, components::Props};

/// A parsed component tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentTag {
    /// Tag name.
    pub name: String,

    /// Attributes.
    pub props: Props,

    /// Whether the tag ends in `/>`.
    pub self_closing: bool,
}

/// One piece of a document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    /// Plain markdown, starting at `line`.
    Markdown { text: &'a str, line: usize },

    /// A block component. `children` is `None` for self-closing tags.
    Component {
        tag: ComponentTag,
        children: Option<(String, usize)>,
        line: usize,
    },
}

/// Split `body` into segments. `first_line` is the line number of the first
/// byte of `body` in the original document.
pub(crate) fn segment(body: &str, first_line: usize) -> Result<Vec<Segment<'_>>, RenderError> {
    let line_of = |offset: usize| first_line + body[..offset].matches('\n').count();

    let mut segments = Vec::new();
    let mut md_start = 0;
    let mut pos = 0;
    let mut fence: Option<(char, usize)> = None;

    while pos < body.len() {
        let line_end = body[pos..]
            .find('\n')
            .map_or(body.len(), |i| pos + i + 1);
        let line = &body[pos..line_end];
        let trimmed = line.trim_start_matches(' ');
        let indent = line.len() - trimmed.len();

        if let Some((ch, len)) = fence {
            if indent < 4 && closes_fence(trimmed, ch, len) {
                fence = None;
            }
            pos = line_end;
            continue;
        }

        if indent < 4 {
            if let Some(opened) = opens_fence(trimmed) {
                fence = Some(opened);
                pos = line_end;
                continue;
            }

            if starts_component(trimmed, "</") {
                return Err(RenderError::syntax(
                    line_of(pos),
                    format!("unexpected closing tag `{}`", trimmed.trim_end()),
                ));
            }

            if starts_component(trimmed, "<") {
                let tag_start = pos + indent;
                let line = line_of(tag_start);
                push_markdown(&mut segments, &body[md_start..pos], line_of(md_start));

                let (tag, tag_len) =
                    parse_tag(&body[tag_start..]).map_err(|msg| RenderError::syntax(line, msg))?;
                let mut end = tag_start + tag_len;

                let children = if tag.self_closing {
                    None
                } else {
                    let (inner_end, close_end) =
                        find_closing(body, end, &tag.name).ok_or_else(|| {
                            RenderError::syntax(line, format!("unclosed component <{}>", tag.name))
                        })?;
                    let children = (dedent(&body[end..inner_end]), line_of(end));
                    end = close_end;
                    Some(children)
                };

                segments.push(Segment::Component {
                    tag,
                    children,
                    line,
                });

                // Swallow the rest of the line when it is blank.
                let rest_end = body[end..].find('\n').map_or(body.len(), |i| end + i + 1);
                if body[end..rest_end].trim().is_empty() {
                    end = rest_end;
                }

                md_start = end;
                pos = end;
                continue;
            }
        }

        pos = line_end;
    }

    push_markdown(&mut segments, &body[md_start..], line_of(md_start));
    Ok(segments)
}

fn push_markdown<'a>(segments: &mut Vec<Segment<'a>>, text: &'a str, line: usize) {
    if !text.trim().is_empty() {
        segments.push(Segment::Markdown { text, line });
    }
}

/// `<X` or `</X` where `X` is an ASCII uppercase letter.
pub(crate) fn starts_component(s: &str, prefix: &str) -> bool {
    s.strip_prefix(prefix)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase())
}

/// Detect an opening code fence and return its character and length.
fn opens_fence(line: &str) -> Option<(char, usize)> {
    let ch = line.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = line.chars().take_while(|c| *c == ch).count();
    if len < 3 {
        return None;
    }
    if ch == '`' && line[len..].contains('`') {
        return None;
    }
    Some((ch, len))
}

fn closes_fence(line: &str, ch: char, len: usize) -> bool {
    let run = line.chars().take_while(|c| *c == ch).count();
    run >= len && line[run * ch.len_utf8()..].trim().is_empty()
}

/// Whether the tag name occupying `s[..i]` ends exactly at `i`.
fn name_ends_at(s: &str, i: usize) -> bool {
    s[i..]
        .chars()
        .next()
        .is_none_or(|c| c.is_whitespace() || c == '>' || c == '/')
}

/// Find the closing tag matching an open `<name ...>` whose children start at
/// `from`. Returns the end of the children and the end of the closing tag.
/// Tags inside fenced code are ignored.
fn find_closing(body: &str, from: usize, name: &str) -> Option<(usize, usize)> {
    let open_pat = format!("<{name}");
    let close_pat = format!("</{name}");
    let mut depth = 1usize;
    let mut pos = from;
    let mut fence: Option<(char, usize)> = None;

    while pos < body.len() {
        let line_end = body[pos..]
            .find('\n')
            .map_or(body.len(), |i| pos + i + 1);

        if pos == 0 || body.as_bytes()[pos - 1] == b'\n' {
            let line = &body[pos..line_end];
            let trimmed = line.trim_start_matches(' ');
            let indent = line.len() - trimmed.len();

            if let Some((ch, len)) = fence {
                if indent < 4 && closes_fence(trimmed, ch, len) {
                    fence = None;
                }
                pos = line_end;
                continue;
            }

            if indent < 4
                && let Some(opened) = opens_fence(trimmed)
            {
                fence = Some(opened);
                pos = line_end;
                continue;
            }
        }

        let Some(i) = body[pos..line_end].find('<') else {
            pos = line_end;
            continue;
        };
        let at = pos + i;
        let rest = &body[at..];

        if rest.starts_with(&close_pat) && name_ends_at(rest, close_pat.len()) {
            let after = rest[close_pat.len()..].trim_start();
            if let Some(after) = after.strip_prefix('>') {
                depth -= 1;
                let close_end = body.len() - after.len();
                if depth == 0 {
                    return Some((at, close_end));
                }
                pos = close_end;
                continue;
            }
        } else if rest.starts_with(&open_pat)
            && name_ends_at(rest, open_pat.len())
            && let Ok((tag, len)) = parse_tag(rest)
        {
            if !tag.self_closing {
                depth += 1;
            }
            pos = at + len;
            continue;
        }

        pos = at + 1;
    }

    None
}

/// Remove the indentation shared by every non-blank line.
fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    if indent == 0 {
        return text.to_string();
    }

    text.split_inclusive('\n')
        .map(|l| {
            let strip = l.len() - l.trim_start_matches([' ', '\t']).len();
            &l[strip.min(indent)..]
        })
        .collect()
}

/// Parse a component tag at the start of `src`.
///
/// Returns the tag and the number of bytes it occupies.
pub fn parse_tag(src: &str) -> Result<(ComponentTag, usize), String> {
    let mut cur = Cursor { src, pos: 0 };

    if cur.bump() != Some('<') {
        return Err("expected `<`".to_string());
    }

    let name = cur
        .take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        .to_string();
    if !name.starts_with(|c: char| c.is_ascii_uppercase()) {
        return Err("component names start with an uppercase letter".to_string());
    }

    let mut props = Props::new();
    loop {
        cur.skip_whitespace();
        match cur.peek() {
            None => return Err(format!("unterminated tag <{name}>")),
            Some('>') => {
                cur.bump();
                return Ok((
                    ComponentTag {
                        name,
                        props,
                        self_closing: false,
                    },
                    cur.pos,
                ));
            }
            Some('/') => {
                cur.bump();
                if cur.bump() != Some('>') {
                    return Err(format!("expected `>` after `/` in <{name}>"));
                }
                return Ok((
                    ComponentTag {
                        name,
                        props,
                        self_closing: true,
                    },
                    cur.pos,
                ));
            }
            Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {
                let key = cur
                    .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '.'))
                    .to_string();
                cur.skip_whitespace();
                let value = if cur.peek() == Some('=') {
                    cur.bump();
                    cur.skip_whitespace();
                    attribute_value(&mut cur, &name, &key)?
                } else {
                    "true".to_string()
                };
                props.insert(key, value);
            }
            Some(c) => return Err(format!("unexpected character `{c}` in <{name}>")),
        }
    }
}

fn attribute_value(cur: &mut Cursor<'_>, name: &str, key: &str) -> Result<String, String> {
    match cur.bump() {
        Some(quote @ ('"' | '\'')) => {
            let value = cur.take_while(|c| c != quote).to_string();
            if cur.bump() != Some(quote) {
                return Err(format!("unterminated value for `{key}` in <{name}>"));
            }
            Ok(value)
        }
        Some('{') => {
            let start = cur.pos;
            let mut depth = 1usize;
            while let Some(c) = cur.bump() {
                match c {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            let inner = &cur.src[start..cur.pos - 1];
                            return Ok(inner.trim().to_string());
                        }
                    }
                    _ => {}
                }
            }
            Err(format!("unterminated expression for `{key}` in <{name}>"))
        }
        _ => Err(format!(
            "attribute `{key}` in <{name}> needs a quoted or {{expression}} value"
        )),
    }
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let src = self.src;
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &src[start..self.pos]
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }
}
