//! Frontmatter parsing for content files.

use std::{collections::BTreeMap, fmt, path::Path};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, Result};

/// Date formats accepted in the `date` field, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%B %d, %Y", "%B %d %Y", "%d %B %Y", "%Y/%m/%d"];

/// Date-time formats accepted in the `date` field (date part is kept).
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Publication date of a document.
///
/// Keeps the text exactly as written in the header, so listings can show
/// "January 1, 2024" while sorting on the parsed calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostDate {
    raw: String,
    date: NaiveDate,
}

impl PostDate {
    /// Parse a human-readable or ISO date.
    pub fn parse(raw: &str) -> Option<Self> {
        let text = raw.trim();
        let date = parse_calendar_date(text)?;
        Some(Self {
            raw: text.to_string(),
            date,
        })
    }

    /// Build a date rendered in ISO form.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            raw: date.format("%Y-%m-%d").to_string(),
            date,
        }
    }

    /// The date as written in the document.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The calendar date used for ordering.
    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

impl fmt::Display for PostDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_calendar_date(text: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

impl Serialize for PostDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for PostDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // TOML headers may carry a native date instead of a string.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawDate {
            Text(String),
            Toml(toml::value::Datetime),
        }

        let raw = match RawDate::deserialize(deserializer)? {
            RawDate::Text(text) => text,
            RawDate::Toml(dt) => dt.to_string(),
        };

        PostDate::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognized date `{raw}`")))
    }
}

/// Frontmatter metadata for content files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frontmatter {
    /// Post title (required, non-empty).
    pub title: String,

    /// Publication date (required).
    pub date: PostDate,

    /// Short summary shown in listings and meta tags (required).
    pub excerpt: String,

    /// Tags for the post.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Every other declared field, kept verbatim.
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// Delimiter types for frontmatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontmatterFormat {
    /// YAML frontmatter delimited by `---`.
    Yaml,
    /// TOML frontmatter delimited by `+++`.
    Toml,
}

impl FrontmatterFormat {
    /// Get the delimiter string for this format.
    pub fn delimiter(&self) -> &'static str {
        match self {
            Self::Yaml => "---",
            Self::Toml => "+++",
        }
    }
}

/// An opening delimiter with no matching closing line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnterminatedFrontmatter(pub FrontmatterFormat);

impl fmt::Display for UnterminatedFrontmatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unterminated frontmatter: missing closing `{}` line",
            self.0.delimiter()
        )
    }
}

/// Split content into frontmatter and body.
///
/// Returns `Ok(None)` when the document does not open with a delimiter line.
/// Both delimiters must sit alone on their lines.
pub fn split_frontmatter(
    content: &str,
) -> std::result::Result<Option<(FrontmatterFormat, &str, &str)>, UnterminatedFrontmatter> {
    let content = content.trim_start_matches('\u{feff}').trim_start();

    let mut lines = content.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok(None);
    };

    let format = match first.trim_end() {
        "---" => FrontmatterFormat::Yaml,
        "+++" => FrontmatterFormat::Toml,
        _ => return Ok(None),
    };

    let header_start = first.len();
    let mut offset = header_start;
    for line in lines {
        if line.trim_end() == format.delimiter() {
            let header = &content[header_start..offset];
            let body = content[offset + line.len()..].trim_start_matches(['\r', '\n']);
            return Ok(Some((format, header, body)));
        }
        offset += line.len();
    }

    Err(UnterminatedFrontmatter(format))
}

/// Parse frontmatter from a raw document, returning the validated header
/// and the body text.
pub fn parse_frontmatter(content: &str, path: &Path) -> Result<(Frontmatter, String)> {
    let split = split_frontmatter(content).map_err(|e| CoreError::malformed(path, e.to_string()))?;

    let Some((format, fm_str, body)) = split else {
        return Err(CoreError::malformed(
            path,
            "no frontmatter header; title is required",
        ));
    };

    if fm_str.trim().is_empty() {
        return Err(CoreError::malformed(
            path,
            "empty frontmatter header; title is required",
        ));
    }

    let frontmatter: Frontmatter = match format {
        FrontmatterFormat::Yaml => {
            serde_yaml::from_str(fm_str).map_err(|e| CoreError::malformed(path, e.to_string()))?
        }
        FrontmatterFormat::Toml => {
            let table: toml::Table =
                toml::from_str(fm_str).map_err(|e| CoreError::malformed(path, e.to_string()))?;
            datetimes_to_strings(toml::Value::Table(table))
                .try_into::<Frontmatter>()
                .map_err(|e: toml::de::Error| CoreError::malformed(path, e.to_string()))?
        }
    };

    frontmatter.validate(path)?;
    Ok((frontmatter, body.to_string()))
}

/// Replace native TOML datetimes with their text form so they survive as
/// plain strings in `extra`.
fn datetimes_to_strings(value: toml::Value) -> toml::Value {
    match value {
        toml::Value::Datetime(dt) => toml::Value::String(dt.to_string()),
        toml::Value::Array(items) => {
            toml::Value::Array(items.into_iter().map(datetimes_to_strings).collect())
        }
        toml::Value::Table(table) => toml::Value::Table(
            table
                .into_iter()
                .map(|(k, v)| (k, datetimes_to_strings(v)))
                .collect(),
        ),
        other => other,
    }
}

impl Frontmatter {
    /// Create a header with the required fields and no tags.
    pub fn new(title: impl Into<String>, date: PostDate, excerpt: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            date,
            excerpt: excerpt.into(),
            tags: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Validate required fields.
    pub fn validate(&self, path: &Path) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(CoreError::malformed(path, "title is required"));
        }
        Ok(())
    }

    /// Serialize the header back to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write a complete document: YAML header followed by `body`.
    pub fn to_document(&self, body: &str) -> Result<String> {
        Ok(format!("---\n{}---\n\n{body}", self.to_yaml()?))
    }
}
