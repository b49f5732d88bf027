//! Pluggable front matter and body converters.

use std::collections::HashMap;

use pulldown_cmark::{html, Options, Parser};

/// Decoded front matter: string keys to loosely typed values.
pub type FrontMatterMap = serde_json::Map<String, serde_json::Value>;

/// Format used when a front matter format is absent or unknown.
pub const DEFAULT_FRONTMATTER_FORMAT: &str = "yaml";

/// Format used when a body format is absent or unknown.
pub const DEFAULT_BODY_FORMAT: &str = "markdown";

/// Errors that can occur while decoding front matter.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Invalid YAML in front matter: {0}")]
    InvalidYaml(String),

    #[error("Invalid INI in front matter: {0}")]
    InvalidIni(String),

    #[error("Front matter in {format} format must be a key/value map")]
    NotAMap { format: String },

    #[error("No front matter parser registered for format: {0}")]
    UnknownFormat(String),
}

/// Decodes a front matter block into a key/value map.
pub trait FrontMatterParser: Send + Sync {
    /// Format name this parser is registered under (e.g. "yaml")
    fn name(&self) -> &'static str;

    /// Parse the block text.
    fn parse(&self, text: &str) -> Result<FrontMatterMap, ConvertError>;
}

/// Renders a body block into HTML.
pub trait BodyConverter: Send + Sync {
    /// Format name this converter is registered under (e.g. "markdown")
    fn name(&self) -> &'static str;

    /// Convert body text to HTML. Malformed markup renders best-effort.
    fn convert(&self, text: &str) -> String;
}

/// YAML front matter.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlParser;

impl FrontMatterParser for YamlParser {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn parse(&self, text: &str) -> Result<FrontMatterMap, ConvertError> {
        if text.trim().is_empty() {
            return Ok(FrontMatterMap::new());
        }

        let value: serde_json::Value =
            serde_yaml::from_str(text).map_err(|e| ConvertError::InvalidYaml(e.to_string()))?;

        into_map(value, self.name())
    }
}

/// INI front matter. Sections become nested maps, values stay strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct IniParser;

impl FrontMatterParser for IniParser {
    fn name(&self) -> &'static str {
        "ini"
    }

    fn parse(&self, text: &str) -> Result<FrontMatterMap, ConvertError> {
        if text.trim().is_empty() {
            return Ok(FrontMatterMap::new());
        }

        let value: serde_json::Value =
            serde_ini::from_str(text).map_err(|e| ConvertError::InvalidIni(e.to_string()))?;

        into_map(value, self.name())
    }
}

fn into_map(value: serde_json::Value, format: &str) -> Result<FrontMatterMap, ConvertError> {
    match value {
        serde_json::Value::Object(map) => Ok(map),
        serde_json::Value::Null => Ok(FrontMatterMap::new()),
        _ => Err(ConvertError::NotAMap {
            format: format.to_string(),
        }),
    }
}

/// Markdown with tables, footnotes, strikethrough, task lists and heading attributes.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownConverter;

impl BodyConverter for MarkdownConverter {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn convert(&self, text: &str) -> String {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES;

        let parser = Parser::new_ext(text, options);

        let mut html_output = String::new();
        html::push_html(&mut html_output, parser);

        html_output
    }
}

/// Registry of converters keyed by format name.
#[derive(Default)]
pub struct Converters {
    frontmatter: HashMap<String, Box<dyn FrontMatterParser>>,
    body: HashMap<String, Box<dyn BodyConverter>>,
}

impl Converters {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in `yaml`, `ini` and `markdown` converters.
    pub fn with_defaults() -> Self {
        let mut converters = Self::new();
        converters.register_frontmatter(YamlParser);
        converters.register_frontmatter(IniParser);
        converters.register_body(MarkdownConverter);
        converters
    }

    /// Register a front matter parser under its own name, replacing any previous one.
    pub fn register_frontmatter(&mut self, parser: impl FrontMatterParser + 'static) {
        self.frontmatter
            .insert(parser.name().to_string(), Box::new(parser));
    }

    /// Register a body converter under its own name, replacing any previous one.
    pub fn register_body(&mut self, converter: impl BodyConverter + 'static) {
        self.body
            .insert(converter.name().to_string(), Box::new(converter));
    }

    /// Decode a front matter block. Absent or unknown formats fall back to YAML.
    pub fn convert_frontmatter(
        &self,
        text: &str,
        format: Option<&str>,
    ) -> Result<FrontMatterMap, ConvertError> {
        let parser = format
            .and_then(|f| self.frontmatter.get(&f.to_lowercase()))
            .or_else(|| self.frontmatter.get(DEFAULT_FRONTMATTER_FORMAT))
            .ok_or_else(|| {
                ConvertError::UnknownFormat(format.unwrap_or(DEFAULT_FRONTMATTER_FORMAT).to_string())
            })?;

        parser.parse(text)
    }

    /// Render a body block. Absent or unknown formats fall back to markdown.
    ///
    /// With no converter available at all the text passes through unchanged.
    pub fn convert_body(&self, text: &str, format: Option<&str>) -> String {
        format
            .and_then(|f| self.body.get(&f.to_lowercase()))
            .or_else(|| self.body.get(DEFAULT_BODY_FORMAT))
            .map(|converter| converter.convert(text))
            .unwrap_or_else(|| text.to_string())
    }
}

impl std::fmt::Debug for Converters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut frontmatter: Vec<_> = self.frontmatter.keys().collect();
        let mut body: Vec<_> = self.body.keys().collect();
        frontmatter.sort();
        body.sort();
        f.debug_struct("Converters")
            .field("frontmatter", &frontmatter)
            .field("body", &body)
            .finish()
    }
}
