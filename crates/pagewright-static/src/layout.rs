//! Layout selection through per-node-type fallback chains.

use std::path::PathBuf;

use thiserror::Error;

use crate::page::{NodeType, Page, Value};

/// `layout` value marking a redirect page.
pub const REDIRECT_LAYOUT: &str = "redirect";

/// Built-in template used for every redirect page.
pub const REDIRECT_TEMPLATE: &str = "_internal/redirect.html";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("No layout found for {page} (tried {})", .candidates.join(", "))]
    NotFound {
        page: String,
        candidates: Vec<String>,
    },
}

/// Picks a template for each page from an ordered list of template roots.
#[derive(Debug, Clone, Default)]
pub struct LayoutResolver {
    roots: Vec<PathBuf>,
}

impl LayoutResolver {
    /// Roots are searched in order; put site layouts before theme layouts.
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Template names to try for `page`, most specific first.
    pub fn candidates(page: &Page) -> Vec<String> {
        let mut candidates = Vec::new();

        match page.node_type() {
            NodeType::Homepage => {
                candidates.push("index.html".to_string());
                candidates.push("_default/list.html".to_string());
                candidates.push("_default/page.html".to_string());
            }
            NodeType::Section => {
                if let Some(section) = page.section() {
                    candidates.push(format!("section/{section}.html"));
                }
                candidates.push("_default/section.html".to_string());
                candidates.push("_default/list.html".to_string());
            }
            NodeType::Taxonomy => {
                if let Some(singular) = singular(page) {
                    candidates.push(format!("taxonomy/{singular}.html"));
                }
                candidates.push("_default/taxonomy.html".to_string());
                candidates.push("_default/list.html".to_string());
            }
            NodeType::Terms => {
                if let Some(singular) = singular(page) {
                    candidates.push(format!("taxonomy/{singular}.terms.html"));
                }
                candidates.push("_default/terms.html".to_string());
            }
            NodeType::None => {
                let layout = page.layout();
                match page.section() {
                    Some(section) => {
                        if let Some(layout) = layout {
                            candidates.push(format!("{section}/{layout}.html"));
                        }
                        candidates.push(format!("{section}/page.html"));
                    }
                    None => {
                        if let Some(layout) = layout {
                            candidates.push(format!("{layout}.html"));
                        }
                        candidates.push("page.html".to_string());
                    }
                }
                candidates.push("_default/page.html".to_string());
            }
        }

        candidates
    }

    /// First candidate present in any root, or the built-in redirect template.
    pub fn resolve(&self, page: &Page) -> Result<String, LayoutError> {
        if page.layout() == Some(REDIRECT_LAYOUT) {
            return Ok(REDIRECT_TEMPLATE.to_string());
        }

        let candidates = Self::candidates(page);
        let found = candidates
            .iter()
            .find(|name| self.roots.iter().any(|root| root.join(name).is_file()));

        match found {
            Some(name) => Ok(name.clone()),
            None => Err(LayoutError::NotFound {
                page: page.id().to_string(),
                candidates,
            }),
        }
    }
}

fn singular(page: &Page) -> Option<&str> {
    page.variable("singular")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
