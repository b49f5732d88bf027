//! Turning content units into pages.

use std::path::Path;

use pagewright_content::{slugify, split_frontmatter, Converters, FrontMatterMap};

use crate::builder::BuildError;
use crate::config::SiteConfig;
use crate::page::{parse_date, Page, PageSource, Value};
use crate::source::ContentUnit;

/// Front matter keys with dedicated accessors; they only override defaults
/// when present and non-empty.
const FIRST_CLASS_KEYS: &[&str] = &["title", "section", "date", "permalink", "layout"];

/// Builds explicit pages from content units, then converts them.
#[derive(Debug)]
pub struct PageFactory<'a> {
    config: &'a SiteConfig,
    converters: &'a Converters,
}

impl<'a> PageFactory<'a> {
    pub fn new(config: &'a SiteConfig, converters: &'a Converters) -> Self {
        Self { config, converters }
    }

    /// Create the page for one unit: slugs, defaults and the raw split.
    ///
    /// Purely mechanical; decoding happens later in [`PageFactory::convert`].
    pub fn create(&self, unit: &ContentUnit) -> Page {
        let relative = Path::new(&unit.relative_path);
        let dir = relative
            .parent()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();
        let stem = relative
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let file_id = if dir.is_empty() {
            stem.clone()
        } else {
            format!("{dir}/{stem}")
        };

        let id = slugify(&file_id);
        let mut page = Page::new(
            id.clone(),
            PageSource {
                relative_path: unit.relative_path.clone(),
                extension: unit.extension.clone(),
            },
        );
        page.set_pathname(id);
        page.set_path(slugify(&dir));
        page.set_name(slugify(&stem));

        page.set_title(stem);
        if let Some(section) = page.section().map(str::to_string) {
            page.set_section(section);
        }
        page.set_date(unit.last_modified);
        let permalink = page.pathname().to_string();
        page.set_permalink(permalink);

        let text = String::from_utf8_lossy(&unit.raw);
        let split = split_frontmatter(&text);
        page.set_frontmatter(split.frontmatter.map(str::to_string));
        page.set_body(split.body);

        page
    }

    /// Decode front matter and render the body of one page.
    ///
    /// The body is always converted. A malformed front matter block yields
    /// [`BuildError::Frontmatter`], which callers treat as recoverable; an
    /// unparseable date yields [`BuildError::InvalidDate`], which is fatal.
    pub fn convert(&self, page: &mut Page) -> Result<(), BuildError> {
        let extension = page
            .source()
            .map(|s| s.extension.clone())
            .unwrap_or_default();
        let (frontmatter_format, body_format) = self.config.formats_for(&extension);

        let decoded = page.frontmatter().map(|text| {
            self.converters
                .convert_frontmatter(text, Some(frontmatter_format))
        });

        let html = self
            .converters
            .convert_body(page.body().unwrap_or_default(), Some(body_format));
        page.set_html(html);

        match decoded {
            Some(Ok(map)) => apply_frontmatter(page, map),
            Some(Err(source)) => Err(BuildError::Frontmatter {
                page: page.id().to_string(),
                source,
            }),
            None => Ok(()),
        }
    }
}

/// Merge decoded front matter into a page's variables.
pub fn apply_frontmatter(page: &mut Page, map: FrontMatterMap) -> Result<(), BuildError> {
    for (key, raw) in map {
        let value = Value::from(raw);

        if !FIRST_CLASS_KEYS.contains(&key.as_str()) {
            page.set_variable(key, value);
            continue;
        }

        if value.is_empty() {
            continue;
        }

        match key.as_str() {
            "date" => {
                let date = parse_date(&value).ok_or_else(|| BuildError::InvalidDate {
                    page: page.name().to_string(),
                    value: value.to_text().unwrap_or_else(|| format!("{value:?}")),
                })?;
                page.set_date(date);
            }
            _ => {
                if let Some(text) = value.to_text() {
                    page.set_variable(key, text);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn unit(relative_path: &str, raw: &str) -> ContentUnit {
        ContentUnit {
            relative_path: relative_path.to_string(),
            extension: relative_path.rsplit('.').next().unwrap().to_string(),
            raw: raw.as_bytes().to_vec(),
            last_modified: Utc.with_ymd_and_hms(2020, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn creates_page_with_defaults() {
        let config = SiteConfig::default();
        let converters = Converters::with_defaults();
        let factory = PageFactory::new(&config, &converters);

        let page = factory.create(&unit("Blog/My First Post.md", "---\ntitle: X\n---\nHello"));

        assert_eq!(page.id(), "blog/my-first-post");
        assert_eq!(page.pathname(), "blog/my-first-post");
        assert_eq!(page.path(), "blog");
        assert_eq!(page.name(), "my-first-post");
        assert_eq!(page.title(), "My First Post");
        assert_eq!(page.section(), Some("blog"));
        assert_eq!(page.variable("section"), Some(&Value::from("blog")));
        assert_eq!(page.permalink(), "blog/my-first-post");
        assert_eq!(page.date(), Some(Utc.with_ymd_and_hms(2020, 5, 1, 12, 0, 0).unwrap()));
        assert_eq!(page.frontmatter(), Some("title: X"));
        assert_eq!(page.body(), Some("Hello"));
        assert!(!page.is_virtual());
    }

    #[test]
    fn root_files_have_no_leading_slash_or_section() {
        let config = SiteConfig::default();
        let converters = Converters::with_defaults();
        let factory = PageFactory::new(&config, &converters);

        let page = factory.create(&unit("about.md", "About me"));

        assert_eq!(page.id(), "about");
        assert_eq!(page.path(), "");
        assert_eq!(page.section(), None);
        assert_eq!(page.frontmatter(), None);
    }

    #[test]
    fn convert_overrides_defaults_and_passes_other_keys() {
        let config = SiteConfig::default();
        let converters = Converters::with_defaults();
        let factory = PageFactory::new(&config, &converters);

        let mut page = factory.create(&unit(
            "blog/post-1.md",
            "---\ntitle: Post 1\ndate: 2015-01-01\nlayout: post\nsection: ''\ntags: [rust]\nauthor: Ann\n---\n# Hello",
        ));
        factory.convert(&mut page).unwrap();

        assert_eq!(page.title(), "Post 1");
        assert_eq!(page.date(), Some(Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(page.layout(), Some("post"));
        assert_eq!(page.section(), Some("blog"));
        assert_eq!(page.variable("author"), Some(&Value::from("Ann")));
        assert_eq!(page.variable("tags").unwrap().to_text_list(), vec!["rust"]);
        assert_eq!(page.html(), Some("<h1>Hello</h1>\n"));
        assert_eq!(page.frontmatter(), None);
    }

    #[test]
    fn integer_dates_are_normalized() {
        let config = SiteConfig::default();
        let converters = Converters::with_defaults();
        let factory = PageFactory::new(&config, &converters);

        let mut page = factory.create(&unit("a.md", "---\ndate: 1420070400\n---\nA"));
        factory.convert(&mut page).unwrap();

        assert_eq!(page.date(), Some(Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn invalid_date_names_the_page() {
        let config = SiteConfig::default();
        let converters = Converters::with_defaults();
        let factory = PageFactory::new(&config, &converters);

        let mut page = factory.create(&unit("blog/bad.md", "---\ndate: someday\n---\nA"));
        let err = factory.convert(&mut page).unwrap_err();

        match err {
            BuildError::InvalidDate { page, value } => {
                assert_eq!(page, "bad");
                assert_eq!(value, "someday");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_frontmatter_still_converts_body() {
        let config = SiteConfig::default();
        let converters = Converters::with_defaults();
        let factory = PageFactory::new(&config, &converters);

        let mut page = factory.create(&unit("broken.md", "---\ntitle: [oops\n---\nBody"));
        let err = factory.convert(&mut page).unwrap_err();

        assert!(err.is_recoverable());
        assert_eq!(page.title(), "broken");
        assert_eq!(page.html(), Some("<p>Body</p>\n"));
    }

    #[test]
    fn ini_frontmatter_by_extension() {
        let mut config = SiteConfig::default();
        config.content.formats.insert(
            "txt".to_string(),
            crate::config::ContentFormat {
                frontmatter: Some("ini".to_string()),
                body: None,
            },
        );
        let converters = Converters::with_defaults();
        let factory = PageFactory::new(&config, &converters);

        let mut page = factory.create(&unit("notes.txt", "<!--\ntitle = Notes\n-->\nText"));
        factory.convert(&mut page).unwrap();

        assert_eq!(page.title(), "Notes");
    }
}
