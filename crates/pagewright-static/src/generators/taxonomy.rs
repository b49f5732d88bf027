//! Taxonomy term pages and vocabulary listings.

use std::collections::HashMap;

use pagewright_content::slugify;

use super::pagination::paginate;
use super::{capitalize, claimed_outputs, Generator, GeneratorContext};
use crate::builder::BuildError;
use crate::collection::PageCollection;
use crate::hooks::Stage;
use crate::message::Message;
use crate::page::{NodeType, Page, Value, Variables};
use crate::templates::output_path;

/// For every configured vocabulary: one page per term, and one terms listing.
///
/// Term pages paginate themselves. The terms listing is only kept when a
/// layout exists for it, which the render stage decides.
#[derive(Debug, Default, Clone, Copy)]
pub struct TaxonomyGenerator;

impl Generator for TaxonomyGenerator {
    fn name(&self) -> &'static str {
        "taxonomy"
    }

    fn generate(
        &self,
        pages: &PageCollection,
        ctx: &GeneratorContext<'_>,
    ) -> Result<Vec<Page>, BuildError> {
        let claimed = claimed_outputs(pages, ctx);
        let overwrites = |page: &Page| {
            let output = output_path(page, &ctx.config.output.filename);
            if !claimed.contains(&output) {
                return false;
            }
            (ctx.report)(Message::warning(
                Stage::Generate,
                page.id(),
                format!("{} page would overwrite {output}", page.node_type().as_str()),
            ));
            true
        };
        let mut generated = Vec::new();

        for (plural, singular) in &ctx.config.site.taxonomies {
            let mut labels: HashMap<String, String> = HashMap::new();
            let terms = pages.group_by(|page| {
                terms_of(page, plural)
                    .into_iter()
                    .filter_map(|term| {
                        let slug = slugify(&term);
                        if slug.is_empty() {
                            return None;
                        }
                        labels.entry(slug.clone()).or_insert(term);
                        Some(slug)
                    })
                    .collect()
            });

            if terms.is_empty() {
                continue;
            }

            let mut term_map = Variables::new();
            let mut tagged: Vec<String> = Vec::new();

            for (slug, members) in terms {
                let label = labels.get(&slug).cloned().unwrap_or_else(|| slug.clone());
                let sorted = pages.subset(&members).sort_by_date().ids();

                for id in &sorted {
                    if !tagged.contains(id) {
                        tagged.push(id.clone());
                    }
                }
                term_map.insert(label.clone(), Value::Pages(sorted.clone()));

                let id = slugify(&format!("{plural}/{slug}/index"));
                if pages.has(&id) {
                    continue;
                }

                let mut page = Page::new_virtual(
                    id,
                    slugify(&format!("{plural}/{slug}")),
                    NodeType::Taxonomy,
                );
                page.set_path(slugify(plural));
                if overwrites(&page) {
                    continue;
                }
                page.set_title(label);
                page.set_variable("plural", plural.as_str());
                page.set_variable("singular", singular.as_str());
                page.set_pages(sorted.clone());

                generated.extend(paginate(page, &sorted, pages, ctx));
            }

            let terms_id = plural.to_lowercase();
            if pages.has(&terms_id) {
                continue;
            }

            let mut listing = Page::new_virtual(terms_id, slugify(plural), NodeType::Terms);
            if overwrites(&listing) {
                continue;
            }
            listing.set_title(capitalize(plural));
            listing.set_variable("plural", plural.as_str());
            listing.set_variable("singular", singular.as_str());
            listing.set_variable("terms", term_map);
            listing.set_pages(pages.subset(&tagged).sort_by_date().ids());
            generated.push(listing);
        }

        Ok(generated)
    }
}

/// Terms a page declares for a vocabulary; a scalar counts as a one-element list.
fn terms_of(page: &Page, plural: &str) -> Vec<String> {
    page.variable(plural)
        .map(Value::to_text_list)
        .unwrap_or_default()
        .into_iter()
        .map(|term| term.trim().to_string())
        .filter(|term| !term.is_empty())
        .collect()
}
