//! Template engine bridge for rendering pages.

use std::fs;
use std::path::{Component, Path, PathBuf};

use minijinja::{context, Environment, Error, ErrorKind};
use serde_json::{json, Map};

use crate::collection::PageCollection;
use crate::config::SiteSection;
use crate::layout::REDIRECT_TEMPLATE;
use crate::menu::Menus;
use crate::page::{collapse_slashes, has_extension, permalink_to_url, Page, Value};

/// Template engine using minijinja, loading layouts from disk on demand.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create an engine searching `roots` in order.
    pub fn new(roots: Vec<PathBuf>) -> Result<Self, Error> {
        let mut env = Environment::new();

        env.add_template_owned(REDIRECT_TEMPLATE.to_string(), REDIRECT_HTML.to_string())?;
        env.add_filter("url", |permalink: String| permalink_to_url(&permalink));
        env.set_loader(move |name| load_from_roots(&roots, name));

        Ok(Self { env })
    }

    /// Render `template` with the `page` and `site` variables.
    pub fn render(
        &self,
        template: &str,
        page: &serde_json::Value,
        site: &minijinja::Value,
    ) -> Result<String, Error> {
        let tmpl = self.env.get_template(template)?;

        tmpl.render(context! {
            page => minijinja::Value::from_serialize(page),
            site => site.clone(),
        })
    }
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEngine").finish_non_exhaustive()
    }
}

fn load_from_roots(roots: &[PathBuf], name: &str) -> Result<Option<String>, Error> {
    let relative = Path::new(name);
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return Err(Error::new(
            ErrorKind::TemplateNotFound,
            format!("refusing to load template outside the layout roots: {name}"),
        ));
    }

    for root in roots {
        let path = root.join(relative);
        if path.is_file() {
            return fs::read_to_string(&path).map(Some).map_err(|e| {
                Error::new(
                    ErrorKind::InvalidOperation,
                    format!("failed to read {}", path.display()),
                )
                .with_source(e)
            });
        }
    }

    Ok(None)
}

/// Flat description of a page, with page references left as ids.
pub fn page_summary(page: &Page) -> serde_json::Value {
    let mut map = Map::new();

    for (key, value) in page.variables() {
        map.insert(key.clone(), value.to_json());
    }

    map.insert("id".to_string(), json!(page.id()));
    map.insert("pathname".to_string(), json!(page.pathname()));
    map.insert("permalink".to_string(), json!(page.permalink()));
    map.insert("url".to_string(), json!(page.url()));
    map.insert("title".to_string(), json!(page.title()));
    map.insert("section".to_string(), json!(page.section()));
    map.insert(
        "date".to_string(),
        json!(page.date().map(|d| d.to_rfc3339())),
    );
    map.insert("node_type".to_string(), json!(page.node_type().as_str()));
    map.insert("html".to_string(), json!(page.html().unwrap_or_default()));

    serde_json::Value::Object(map)
}

/// The `page` variable: the summary with page references expanded one level.
pub fn page_context(page: &Page, pages: &PageCollection) -> serde_json::Value {
    let mut context = page_summary(page);

    if let serde_json::Value::Object(map) = &mut context {
        for (key, value) in page.variables() {
            if has_pages(value) {
                map.insert(key.clone(), expand(value, pages));
            }
        }
    }

    context
}

/// The `site` variable, built once per render stage.
pub fn site_context(site: &SiteSection, menus: &Menus, pages: &PageCollection) -> minijinja::Value {
    let mut map = match serde_json::to_value(site) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => Map::new(),
    };

    map.insert(
        "menus".to_string(),
        serde_json::to_value(menus).unwrap_or_default(),
    );
    map.insert(
        "pages".to_string(),
        serde_json::Value::Array(pages.iter().map(page_summary).collect()),
    );

    minijinja::Value::from_serialize(&serde_json::Value::Object(map))
}

fn has_pages(value: &Value) -> bool {
    match value {
        Value::Pages(_) => true,
        Value::Map(map) => map.values().any(has_pages),
        Value::List(items) => items.iter().any(has_pages),
        _ => false,
    }
}

fn expand(value: &Value, pages: &PageCollection) -> serde_json::Value {
    match value {
        Value::Pages(ids) => serde_json::Value::Array(
            ids.iter()
                .filter_map(|id| pages.get(id))
                .map(page_summary)
                .collect(),
        ),
        Value::Map(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), expand(v, pages)))
                .collect(),
        ),
        Value::List(items) => {
            serde_json::Value::Array(items.iter().map(|v| expand(v, pages)).collect())
        }
        other => other.to_json(),
    }
}

/// Where a page is written, relative to the output directory.
///
/// Explicit `index` files land at their directory; permalinks without an
/// extension become directories holding `filename`; anything else is used
/// verbatim.
pub fn output_path(page: &Page, filename: &str) -> String {
    let raw = if !page.is_virtual() && page.name() == "index" {
        format!("{}/{}", page.path(), filename)
    } else if !has_extension(page.permalink()) {
        format!("{}/{}", page.permalink(), filename)
    } else {
        page.permalink().to_string()
    };

    collapse_slashes(&raw)
}

const REDIRECT_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{{ page.title }}</title>
  <link rel="canonical" href="{{ page.destination | url | safe }}">
  <meta http-equiv="refresh" content="0; url={{ page.destination | url | safe }}">
</head>
<body>
  <p>Moved to <a href="{{ page.destination | url | safe }}">{{ page.destination | url | safe }}</a>.</p>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{NodeType, PageSource};
    use tempfile::tempdir;

    fn engine_with(files: &[(&str, &str)]) -> (tempfile::TempDir, TemplateEngine) {
        let temp = tempdir().unwrap();
        for (name, body) in files {
            let path = temp.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
        let engine = TemplateEngine::new(vec![temp.path().to_path_buf()]).unwrap();
        (temp, engine)
    }

    fn explicit(id: &str, path: &str, name: &str) -> Page {
        let mut page = Page::new(
            id,
            PageSource {
                relative_path: format!("{id}.md"),
                extension: "md".to_string(),
            },
        );
        page.set_path(path);
        page.set_name(name);
        page
    }

    #[test]
    fn renders_layout_from_disk() {
        let (_temp, engine) = engine_with(&[(
            "_default/page.html",
            "<h1>{{ page.title }}</h1>{{ page.html | safe }} {{ site.title }}",
        )]);
        let mut page = Page::new_virtual("about", "about", NodeType::None);
        page.set_title("About");
        page.set_html("<p>Me</p>");
        let pages = PageCollection::new();
        let site = site_context(&SiteSection::default(), &Menus::new(), &pages);

        let html = engine
            .render("_default/page.html", &page_context(&page, &pages), &site)
            .unwrap();

        assert_eq!(html, "<h1>About</h1><p>Me</p> My Site");
    }

    #[test]
    fn expands_page_references() {
        let (_temp, engine) = engine_with(&[(
            "list.html",
            "{% for p in page.pages %}{{ p.title }}@{{ p.url | safe }};{% endfor %}",
        )]);
        let mut pages = PageCollection::new();
        for (id, title) in [("blog/a", "A"), ("blog/b", "B")] {
            let mut post = Page::new_virtual(id, id, NodeType::None);
            post.set_title(title);
            pages.add(post).unwrap();
        }
        let mut section = Page::new_virtual("blog/index", "blog", NodeType::Section);
        section.set_pages(vec!["blog/b".to_string(), "blog/a".to_string()]);
        let site = site_context(&SiteSection::default(), &Menus::new(), &pages);

        let html = engine
            .render("list.html", &page_context(&section, &pages), &site)
            .unwrap();

        assert_eq!(html, "B@/blog/b/;A@/blog/a/;");
    }

    #[test]
    fn redirect_template_is_built_in() {
        let (_temp, engine) = engine_with(&[]);
        let mut page = Page::new_virtual("old", "old", NodeType::None);
        page.set_variable("destination", "blog/new");
        let pages = PageCollection::new();
        let site = site_context(&SiteSection::default(), &Menus::new(), &pages);

        let html = engine
            .render(REDIRECT_TEMPLATE, &page_context(&page, &pages), &site)
            .unwrap();

        assert!(html.contains(r#"url=/blog/new/""#));
    }

    #[test]
    fn rejects_paths_leaving_the_roots() {
        let (_temp, engine) = engine_with(&[]);
        let pages = PageCollection::new();
        let site = site_context(&SiteSection::default(), &Menus::new(), &pages);

        assert!(engine
            .render("../secret.html", &json!({}), &site)
            .is_err());
    }

    #[test]
    fn output_paths() {
        let index = explicit("blog/index", "blog", "index");
        assert_eq!(output_path(&index, "index.html"), "blog/index.html");

        let post = explicit("blog/post", "blog", "post");
        assert_eq!(output_path(&post, "index.html"), "blog/post/index.html");

        let home = Page::new_virtual("index", "", NodeType::Homepage);
        assert_eq!(output_path(&home, "index.html"), "index.html");

        let mut feed = Page::new_virtual("feed", "feed", NodeType::None);
        feed.set_permalink("/feed.xml");
        assert_eq!(output_path(&feed, "index.html"), "feed.xml");
    }
}
