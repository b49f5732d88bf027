//! The page entity and its variable bag.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::menu::MenuSpec;

/// Open key/value map holding every page variable.
pub type Variables = BTreeMap<String, Value>;

/// A dynamically typed page variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Date(DateTime<Utc>),
    List(Vec<Value>),
    Map(Variables),
    /// References to other pages, by id
    Pages(Vec<String>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Variables> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_pages(&self) -> Option<&[String]> {
        match self {
            Self::Pages(ids) => Some(ids),
            _ => None,
        }
    }

    /// Scalar rendered as text; `None` for null, lists, maps and page lists.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Bool(b) => Some(b.to_string()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::String(s) => Some(s.clone()),
            Self::Date(d) => Some(d.to_rfc3339()),
            Self::Null | Self::List(_) | Self::Map(_) | Self::Pages(_) => None,
        }
    }

    /// Null, empty strings and empty containers.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.trim().is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Map(map) => map.is_empty(),
            Self::Pages(ids) => ids.is_empty(),
            Self::Bool(_) | Self::Integer(_) | Self::Float(_) | Self::Date(_) => false,
        }
    }

    /// Scalars and lists of scalars as a list of strings.
    pub fn to_text_list(&self) -> Vec<String> {
        match self {
            Self::List(items) => items.iter().filter_map(Value::to_text).collect(),
            other => other.to_text().into_iter().collect(),
        }
    }

    /// JSON form. Dates become RFC 3339 strings and page lists become id lists.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Integer(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Value::from(*f),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Date(d) => serde_json::Value::String(d.to_rfc3339()),
            Self::List(items) => items.iter().map(Value::to_json).collect(),
            Self::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Self::Pages(ids) => ids
                .iter()
                .map(|id| serde_json::Value::String(id.clone()))
                .collect(),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Self::Date(d)
    }
}

impl From<Variables> for Value {
    fn from(map: Variables) -> Self {
        Self::Map(map)
    }
}

/// Parse a date given as a UNIX timestamp or a date string.
///
/// Accepted strings: RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`
/// and `YYYY-MM-DD`. Naive values are taken as UTC.
pub fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Date(d) => Some(*d),
        Value::Integer(ts) => Utc.timestamp_opt(*ts, 0).single(),
        Value::Float(ts) => Utc.timestamp_opt(*ts as i64, 0).single(),
        Value::String(s) => parse_date_str(s.trim()),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(ts) = s.parse::<i64>() {
        return Utc.timestamp_opt(ts, 0).single();
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// What kind of output unit a page is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeType {
    /// Ordinary content page
    #[default]
    None,
    Homepage,
    Section,
    Taxonomy,
    Terms,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Homepage => "homepage",
            Self::Section => "section",
            Self::Taxonomy => "taxonomy",
            Self::Terms => "terms",
        }
    }

    /// Listing pages that summarize other pages.
    pub fn is_node(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Where an explicit page came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSource {
    /// Path relative to the content directory, `/`-separated
    pub relative_path: String,

    /// File extension without the dot
    pub extension: String,
}

/// One output page, explicit or derived.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    id: String,
    pathname: String,
    name: String,
    path: String,
    node_type: NodeType,
    is_virtual: bool,
    source: Option<PageSource>,
    variables: Variables,
    frontmatter: Option<String>,
    body: Option<String>,
    html: Option<String>,
}

impl Page {
    /// Create a page backed by a content file.
    pub fn new(id: impl Into<String>, source: PageSource) -> Self {
        let id = id.into();
        Self {
            pathname: id.clone(),
            id,
            name: String::new(),
            path: String::new(),
            node_type: NodeType::None,
            is_virtual: false,
            source: Some(source),
            variables: Variables::new(),
            frontmatter: None,
            body: None,
            html: None,
        }
    }

    /// Create a derived page with no content file behind it.
    pub fn new_virtual(
        id: impl Into<String>,
        pathname: impl Into<String>,
        node_type: NodeType,
    ) -> Self {
        Self {
            id: id.into(),
            pathname: pathname.into(),
            name: String::new(),
            path: String::new(),
            node_type,
            is_virtual: true,
            source: None,
            variables: Variables::new(),
            frontmatter: None,
            body: None,
            html: None,
        }
    }

    /// A new page for another chunk of this listing.
    ///
    /// Structural fields and variables are copied; `menu`, `aliases`,
    /// `permalink` and `pagination` are not, so the chunk neither duplicates
    /// menu entries nor redirects nor inherits this page's URL.
    pub(crate) fn chunk_copy(&self, id: String, pathname: String) -> Self {
        let mut variables = self.variables.clone();
        for key in ["menu", "aliases", "permalink", "pagination"] {
            variables.remove(key);
        }

        Self {
            id,
            pathname,
            name: String::new(),
            path: self.path.clone(),
            node_type: self.node_type,
            is_virtual: true,
            source: None,
            variables,
            frontmatter: None,
            body: self.body.clone(),
            html: self.html.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pathname(&self) -> &str {
        &self.pathname
    }

    pub fn set_pathname(&mut self, pathname: impl Into<String>) {
        self.pathname = pathname.into();
    }

    /// Slug of the base filename.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Slug of the containing directory.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn set_node_type(&mut self, node_type: NodeType) {
        self.node_type = node_type;
    }

    pub fn is_virtual(&self) -> bool {
        self.is_virtual
    }

    pub fn source(&self) -> Option<&PageSource> {
        self.source.as_ref()
    }

    pub fn frontmatter(&self) -> Option<&str> {
        self.frontmatter.as_deref()
    }

    pub fn set_frontmatter(&mut self, frontmatter: Option<String>) {
        self.frontmatter = frontmatter;
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = Some(body.into());
    }

    pub fn has_body(&self) -> bool {
        self.body.as_deref().is_some_and(|b| !b.trim().is_empty())
    }

    pub fn html(&self) -> Option<&str> {
        self.html.as_deref()
    }

    /// Store the converted body. The raw front matter is no longer needed.
    pub fn set_html(&mut self, html: impl Into<String>) {
        self.html = Some(html.into());
        self.frontmatter = None;
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn variable(&self, key: &str) -> Option<&Value> {
        self.variables.get(key)
    }

    pub fn has_variable(&self, key: &str) -> bool {
        self.variables.contains_key(key)
    }

    pub fn set_variable(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(key.into(), value.into());
    }

    pub fn unset_variable(&mut self, key: &str) -> Option<Value> {
        self.variables.remove(key)
    }

    pub fn title(&self) -> &str {
        self.variable("title").and_then(Value::as_str).unwrap_or("")
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.set_variable("title", title.into());
    }

    /// Explicit `section` variable, else the first segment of `path`.
    pub fn section(&self) -> Option<&str> {
        self.variable("section")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .or_else(|| self.path.split('/').next().filter(|s| !s.is_empty()))
    }

    pub fn set_section(&mut self, section: impl Into<String>) {
        self.set_variable("section", section.into());
    }

    pub fn date(&self) -> Option<DateTime<Utc>> {
        match self.variable("date") {
            Some(Value::Date(d)) => Some(*d),
            _ => None,
        }
    }

    pub fn set_date(&mut self, date: DateTime<Utc>) {
        self.set_variable("date", date);
    }

    /// Explicit `permalink` variable, else `pathname`.
    pub fn permalink(&self) -> &str {
        self.variable("permalink")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.pathname)
    }

    pub fn set_permalink(&mut self, permalink: impl Into<String>) {
        self.set_variable("permalink", permalink.into());
    }

    pub fn layout(&self) -> Option<&str> {
        self.variable("layout")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn set_layout(&mut self, layout: impl Into<String>) {
        self.set_variable("layout", layout.into());
    }

    /// Ids of the pages a listing page summarizes.
    pub fn pages(&self) -> Option<&[String]> {
        self.variable("pages").and_then(Value::as_pages)
    }

    pub fn set_pages(&mut self, ids: Vec<String>) {
        self.set_variable("pages", Value::Pages(ids));
    }

    /// Redirect sources, from a single string or a list.
    pub fn aliases(&self) -> Vec<String> {
        self.variable("aliases")
            .map(Value::to_text_list)
            .unwrap_or_default()
            .into_iter()
            .filter(|a| !a.trim().is_empty())
            .collect()
    }

    pub fn add_alias(&mut self, alias: impl Into<String>) {
        let mut aliases: Vec<Value> = self.aliases().into_iter().map(Value::from).collect();
        aliases.push(Value::from(alias.into()));
        self.set_variable("aliases", Value::List(aliases));
    }

    /// Menu memberships declared by the `menu` variable.
    pub fn menu(&self) -> Option<MenuSpec> {
        self.variable("menu").and_then(MenuSpec::from_value)
    }

    /// Place the page in one menu with the given weight.
    pub fn set_menu_weight(&mut self, menu: &str, weight: i64) {
        let entry = Variables::from([("weight".to_string(), Value::Integer(weight))]);
        let menus = Variables::from([(menu.to_string(), Value::Map(entry))]);
        self.set_variable("menu", menus);
    }

    /// Public URL of this page.
    pub fn url(&self) -> String {
        permalink_to_url(self.permalink())
    }
}

/// Turn a permalink into a root-relative URL.
///
/// `""` becomes `/`, permalinks with a file extension keep their last segment
/// as a file name, everything else gets a trailing slash.
pub fn permalink_to_url(permalink: &str) -> String {
    let trimmed = collapse_slashes(permalink);
    if trimmed.is_empty() {
        "/".to_string()
    } else if has_extension(&trimmed) {
        format!("/{trimmed}")
    } else {
        format!("/{trimmed}/")
    }
}

/// Whether the last path segment carries a file extension.
pub fn has_extension(path: &str) -> bool {
    Path::new(path.trim_end_matches('/')).extension().is_some()
}

/// Drop empty segments, so `a//b/` becomes `a/b`.
pub fn collapse_slashes(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source(relative_path: &str) -> PageSource {
        PageSource {
            relative_path: relative_path.to_string(),
            extension: "md".to_string(),
        }
    }

    #[test]
    fn section_defaults_to_first_path_segment() {
        let mut page = Page::new("blog/2015/post", source("blog/2015/post.md"));
        page.set_path("blog/2015");

        assert_eq!(page.section(), Some("blog"));

        page.set_section("news");
        assert_eq!(page.section(), Some("news"));
    }

    #[test]
    fn root_page_has_no_section() {
        let page = Page::new("about", source("about.md"));

        assert_eq!(page.section(), None);
    }

    #[test]
    fn permalink_defaults_to_pathname() {
        let mut page = Page::new("blog/post", source("blog/post.md"));
        assert_eq!(page.permalink(), "blog/post");
        assert_eq!(page.url(), "/blog/post/");

        page.set_permalink("feed.xml");
        assert_eq!(page.permalink(), "feed.xml");
        assert_eq!(page.url(), "/feed.xml");
    }

    #[test]
    fn builds_urls_from_permalinks() {
        assert_eq!(permalink_to_url(""), "/");
        assert_eq!(permalink_to_url("blog"), "/blog/");
        assert_eq!(permalink_to_url("/blog//page/2/"), "/blog/page/2/");
        assert_eq!(permalink_to_url("assets/feed.xml"), "/assets/feed.xml");
    }

    #[test]
    fn parses_dates_from_strings_and_timestamps() {
        let from_day = parse_date(&Value::from("2015-03-01")).unwrap();
        let from_ts = parse_date(&Value::Integer(from_day.timestamp())).unwrap();
        let from_rfc = parse_date(&Value::from("2015-03-01T00:00:00Z")).unwrap();
        let from_time = parse_date(&Value::from("2015-03-01 00:00:00")).unwrap();

        assert_eq!(from_day, from_ts);
        assert_eq!(from_day, from_rfc);
        assert_eq!(from_day, from_time);
        assert_eq!(from_day.timestamp(), 1_425_168_000);
    }

    #[test]
    fn rejects_unparseable_dates() {
        assert!(parse_date(&Value::from("last tuesday")).is_none());
        assert!(parse_date(&Value::List(vec![])).is_none());
    }

    #[test]
    fn converts_json_values() {
        let value = Value::from(json!({
            "title": "Hi",
            "weight": 3,
            "ratio": 0.5,
            "tags": ["a", "b"],
            "draft": false,
        }));

        let map = value.as_map().unwrap();
        assert_eq!(map["title"], Value::from("Hi"));
        assert_eq!(map["weight"], Value::Integer(3));
        assert_eq!(map["ratio"], Value::Float(0.5));
        assert_eq!(map["tags"].to_text_list(), vec!["a", "b"]);
        assert_eq!(map["draft"], Value::Bool(false));
    }

    #[test]
    fn aliases_accept_string_or_list() {
        let mut page = Page::new_virtual("a", "a", NodeType::None);
        assert!(page.aliases().is_empty());

        page.set_variable("aliases", "old/a");
        assert_eq!(page.aliases(), vec!["old/a"]);

        page.add_alias("older/a");
        assert_eq!(page.aliases(), vec!["old/a", "older/a"]);
    }

    #[test]
    fn chunk_copy_drops_menu_and_urls() {
        let mut page = Page::new_virtual("blog/index", "blog", NodeType::Section);
        page.set_title("Blog");
        page.set_menu_weight("main", 100);
        page.add_alias("old-blog");
        page.set_permalink("blog");

        let chunk = page.chunk_copy("blog/page/2/index".into(), "blog/page/2".into());

        assert_eq!(chunk.id(), "blog/page/2/index");
        assert_eq!(chunk.pathname(), "blog/page/2");
        assert_eq!(chunk.permalink(), "blog/page/2");
        assert_eq!(chunk.title(), "Blog");
        assert_eq!(chunk.node_type(), NodeType::Section);
        assert!(chunk.menu().is_none());
        assert!(chunk.aliases().is_empty());
        assert!(page.menu().is_some());
    }

    #[test]
    fn set_html_clears_frontmatter() {
        let mut page = Page::new("a", source("a.md"));
        page.set_frontmatter(Some("title: A".into()));
        page.set_body("Body");

        page.set_html("<p>Body</p>");

        assert_eq!(page.frontmatter(), None);
        assert_eq!(page.body(), Some("Body"));
        assert!(page.has_body());
    }
}
