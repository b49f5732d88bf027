//! Scaffold a new site.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Files written by `init`, relative to the source directory.
const SCAFFOLD: &[(&str, &str)] = &[
    ("layouts/_default/page.html", DEFAULT_PAGE_LAYOUT),
    ("layouts/_default/list.html", DEFAULT_LIST_LAYOUT),
    ("content/blog/hello.md", DEFAULT_POST),
    ("static/style.css", DEFAULT_CSS),
];

/// Run the init command.
pub async fn run(source: &Path, config: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing pagewright in {}...", source.display());

    let config_path = source.join(config);
    if config_path.exists() && !yes {
        tracing::warn!(
            "{} already exists. Use --yes to overwrite.",
            config_path.display()
        );
        return Ok(());
    }

    write_file(&config_path, DEFAULT_CONFIG)?;

    for (relative, contents) in SCAFFOLD {
        let path = source.join(relative);
        if path.exists() && !yes {
            tracing::info!("Keeping existing {}", path.display());
            continue;
        }
        write_file(&path, contents)?;
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'pagewright build' to render the site.");

    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Created {}", path.display());
    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# pagewright configuration

[site]
title = "My Site"
baseurl = "/"

[site.taxonomies]
tags = "tag"
categories = "category"

[site.paginate]
max = 5
path = "page"

[content]
dir = "content"

[output]
dir = "_site"

[build]
# Minify copied CSS
minify = false
"#;

const DEFAULT_PAGE_LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{{ page.title }} - {{ site.title }}</title>
  <link rel="stylesheet" href="{{ site.baseurl }}style.css">
</head>
<body>
  <nav>
  {% for item in site.menus.main %}
    <a href="{{ item.url }}">{{ item.name }}</a>
  {% endfor %}
  </nav>
  <main>
    <h1>{{ page.title }}</h1>
    {{ page.html | safe }}
  </main>
</body>
</html>
"#;

const DEFAULT_LIST_LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{{ page.title }} - {{ site.title }}</title>
  <link rel="stylesheet" href="{{ site.baseurl }}style.css">
</head>
<body>
  <nav>
  {% for item in site.menus.main %}
    <a href="{{ item.url }}">{{ item.name }}</a>
  {% endfor %}
  </nav>
  <main>
    <h1>{{ page.title }}</h1>
    <ul>
    {% for p in (page.pagination.pages if page.pagination else page.pages) %}
      <li><a href="{{ p.url }}">{{ p.title }}</a></li>
    {% endfor %}
    </ul>
    {% if page.pagination %}
      {% if page.pagination.prev %}<a href="{{ page.pagination.prev }}">Newer</a>{% endif %}
      {% if page.pagination.next %}<a href="{{ page.pagination.next }}">Older</a>{% endif %}
    {% endif %}
  </main>
</body>
</html>
"#;

const DEFAULT_POST: &str = r#"---
title: Hello, world
tags: [welcome]
---

# Hello

This is your first post. Edit `content/blog/hello.md` and run `pagewright build`.
"#;

const DEFAULT_CSS: &str = r#"body {
  font-family: system-ui, sans-serif;
  max-width: 40rem;
  margin: 2rem auto;
  line-height: 1.6;
}

nav a {
  margin-right: 1rem;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn scaffolds_a_buildable_site() {
        let temp = tempdir().unwrap();

        run(temp.path(), Path::new("pagewright.toml"), false)
            .await
            .unwrap();

        assert!(temp.path().join("pagewright.toml").exists());
        assert!(temp.path().join("layouts/_default/list.html").exists());
        assert!(temp.path().join("content/blog/hello.md").exists());

        let site = crate::commands::build::load_config(temp.path(), Path::new("pagewright.toml"))
            .unwrap();
        let result = pagewright_static::StaticBuilder::new(temp.path(), site)
            .build()
            .unwrap();
        assert_eq!(result.errors, 0);
        assert!(temp.path().join("_site/blog/hello/index.html").exists());
        assert!(temp.path().join("_site/tags/welcome/index.html").exists());
    }

    #[tokio::test]
    async fn keeps_existing_files_without_yes() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("pagewright.toml"), "# mine").unwrap();

        run(temp.path(), Path::new("pagewright.toml"), false)
            .await
            .unwrap();

        assert_eq!(
            fs::read_to_string(temp.path().join("pagewright.toml")).unwrap(),
            "# mine"
        );
        assert!(!temp.path().join("layouts").exists());
    }
}
