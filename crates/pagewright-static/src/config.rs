//! Site configuration.
//!
//! Every section carries defaults, so an empty configuration file describes a
//! working site: markdown content in `content/`, layouts in `layouts/`, output
//! in `_site/`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Complete configuration of one site.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Values exposed to templates as `site`
    pub site: SiteSection,

    /// Theme name, resolved under the themes directory
    pub theme: Option<String>,

    /// Content source settings
    pub content: ContentConfig,

    /// Default front matter format
    pub frontmatter: FrontmatterConfig,

    /// Default body format
    pub body: BodyConfig,

    /// Static asset copying
    #[serde(rename = "static")]
    pub static_files: StaticConfig,

    /// Site layout directory
    pub layouts: LayoutsConfig,

    /// Themes directory
    pub themes: ThemesConfig,

    /// Output location
    pub output: OutputConfig,

    /// Priority overrides, by generator name
    pub generators: BTreeMap<String, i32>,

    /// Build switches
    pub build: BuildSettings,
}

impl SiteConfig {
    /// Front matter and body formats for a content file extension.
    pub fn formats_for(&self, extension: &str) -> (&str, &str) {
        let over = self.content.formats.get(&extension.to_lowercase());

        let frontmatter = over
            .and_then(|f| f.frontmatter.as_deref())
            .unwrap_or(&self.frontmatter.format);
        let body = over
            .and_then(|f| f.body.as_deref())
            .unwrap_or(&self.body.format);

        (frontmatter, body)
    }
}

/// The `[site]` table.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteSection {
    pub title: String,

    pub baseurl: String,

    /// Vocabularies: plural name -> singular label
    pub taxonomies: BTreeMap<String, String>,

    pub paginate: PaginateConfig,

    /// Menu directives, by menu name
    pub menu: BTreeMap<String, Vec<MenuEntryConfig>>,

    /// Anything else, passed through to templates
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            title: "My Site".to_string(),
            baseurl: "/".to_string(),
            taxonomies: BTreeMap::from([
                ("categories".to_string(), "category".to_string()),
                ("tags".to_string(), "tag".to_string()),
            ]),
            paginate: PaginateConfig::default(),
            menu: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }
}

/// The `[site.paginate]` table.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PaginateConfig {
    /// Pages per chunk
    pub max: usize,

    /// URL segment between a listing and its chunk number
    pub path: String,

    pub disabled: bool,

    pub homepage: HomepagePaginate,
}

impl PaginateConfig {
    /// Whether a listing of `count` pages must be split.
    pub fn splits(&self, count: usize) -> bool {
        !self.disabled && self.max > 0 && count > self.max
    }
}

impl Default for PaginateConfig {
    fn default() -> Self {
        Self {
            max: 5,
            path: "page".to_string(),
            disabled: false,
            homepage: HomepagePaginate::default(),
        }
    }
}

/// The `[site.paginate.homepage]` table.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HomepagePaginate {
    /// Section listed on the homepage; every ordinary page when unset
    pub section: Option<String>,
}

/// One `[[site.menu.<name>]]` directive.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct MenuEntryConfig {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub weight: Option<i64>,

    /// Remove the entry with this id instead of adding or overriding it
    #[serde(default)]
    pub disabled: bool,
}

/// The `[content]` table.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentConfig {
    pub dir: String,

    /// Recognized file extensions
    pub ext: Vec<String>,

    /// Per-extension format overrides
    pub formats: BTreeMap<String, ContentFormat>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            dir: "content".to_string(),
            ext: ["md", "markdown", "textile", "txt"]
                .into_iter()
                .map(String::from)
                .collect(),
            formats: BTreeMap::new(),
        }
    }
}

/// Format override for one content extension.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContentFormat {
    #[serde(default)]
    pub frontmatter: Option<String>,

    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FrontmatterConfig {
    pub format: String,
}

impl Default for FrontmatterConfig {
    fn default() -> Self {
        Self {
            format: "yaml".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BodyConfig {
    pub format: String,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            format: "markdown".to_string(),
        }
    }
}

/// The `[static]` table.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticConfig {
    pub dir: String,

    /// File or directory names never copied
    pub exclude: Vec<String>,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            dir: "static".to_string(),
            exclude: vec![
                ".DS_Store".to_string(),
                "sass".to_string(),
                "scss".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LayoutsConfig {
    pub dir: String,
}

impl Default for LayoutsConfig {
    fn default() -> Self {
        Self {
            dir: "layouts".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ThemesConfig {
    pub dir: String,
}

impl Default for ThemesConfig {
    fn default() -> Self {
        Self {
            dir: "themes".to_string(),
        }
    }
}

/// The `[output]` table.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: String,

    /// File written inside every page directory
    pub filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "_site".to_string(),
            filename: "index.html".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Minify copied CSS
    pub minify: bool,
}
