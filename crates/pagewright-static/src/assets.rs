//! Static asset copying.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::builder::BuildError;

/// Minify CSS using lightningcss.
pub fn minify_css(css: &str) -> Result<String, String> {
    use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

    let stylesheet = StyleSheet::parse(css, ParserOptions::default())
        .map_err(|e| format!("CSS parse error: {}", e))?;

    let minified = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..Default::default()
        })
        .map_err(|e| format!("CSS minify error: {}", e))?;

    Ok(minified.code)
}

/// Copy everything under `src` into `dest`, skipping entries whose file name
/// is listed in `exclude`. Returns the number of files copied.
///
/// A missing `src` copies nothing. Existing files in `dest` are overwritten.
pub fn copy_static(
    src: &Path,
    dest: &Path,
    exclude: &[String],
    minify: bool,
) -> Result<usize, BuildError> {
    if !src.is_dir() {
        return Ok(0);
    }

    let mut copied = 0;

    for entry in WalkDir::new(src)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0 || !exclude.iter().any(|name| e.file_name().to_string_lossy() == *name)
        })
    {
        let entry = entry.map_err(|e| BuildError::ReadError {
            path: e.path().map_or_else(|| src.to_path_buf(), Path::to_path_buf),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let target = dest.join(path.strip_prefix(src).unwrap_or(path));

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::WriteError {
                path: parent.to_path_buf(),
                message: e.to_string(),
            })?;
        }

        let is_css = path.extension().and_then(|e| e.to_str()) == Some("css");
        let written = if minify && is_css {
            let css = fs::read_to_string(path).map_err(|e| BuildError::ReadError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            let css = match minify_css(&css) {
                Ok(minified) => minified,
                Err(e) => {
                    tracing::warn!("Keeping {} unminified: {}", path.display(), e);
                    css
                }
            };
            fs::write(&target, css)
        } else {
            fs::copy(path, &target).map(|_| ())
        };
        written.map_err(|e| BuildError::WriteError {
            path: target.clone(),
            message: e.to_string(),
        })?;

        copied += 1;
    }

    tracing::debug!("Copied {} static files from {}", copied, src.display());

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn minifies_css() {
        let css = r#"
.button {
    background-color: blue;
    padding: 10px;
}
        "#;

        let minified = minify_css(css).unwrap();

        assert!(!minified.contains('\n'));
        assert!(minified.contains(".button"));
    }

    #[test]
    fn copies_tree_and_skips_excluded_names() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("static");
        let dest = temp.path().join("out");
        fs::create_dir_all(src.join("css")).unwrap();
        fs::create_dir_all(src.join("sass")).unwrap();
        fs::write(src.join("css/site.css"), "a { color: red; }").unwrap();
        fs::write(src.join("sass/site.scss"), "$x: 1;").unwrap();
        fs::write(src.join(".DS_Store"), "junk").unwrap();
        fs::write(src.join("robots.txt"), "User-agent: *").unwrap();

        let exclude = vec![".DS_Store".to_string(), "sass".to_string()];
        let copied = copy_static(&src, &dest, &exclude, false).unwrap();

        assert_eq!(copied, 2);
        assert!(dest.join("css/site.css").exists());
        assert!(dest.join("robots.txt").exists());
        assert!(!dest.join("sass").exists());
        assert!(!dest.join(".DS_Store").exists());
    }

    #[test]
    fn minifies_css_when_asked() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("static");
        let dest = temp.path().join("out");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("site.css"), "a {\n  color: red;\n}\n").unwrap();

        copy_static(&src, &dest, &[], true).unwrap();

        let css = fs::read_to_string(dest.join("site.css")).unwrap();
        assert!(!css.contains('\n'));
        assert!(css.contains("color:red"));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_entries_are_reported() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("static");
        fs::create_dir_all(&src).unwrap();
        std::os::unix::fs::symlink(src.join("gone.css"), src.join("site.css")).unwrap();

        let result = copy_static(&src, &temp.path().join("out"), &[], false);

        assert!(matches!(result, Err(BuildError::ReadError { .. })));
    }

    #[test]
    fn missing_source_copies_nothing() {
        let temp = tempdir().unwrap();

        let copied = copy_static(&temp.path().join("nope"), temp.path(), &[], false).unwrap();

        assert_eq!(copied, 0);
    }
}
