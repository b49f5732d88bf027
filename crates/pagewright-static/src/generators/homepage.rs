//! The site homepage.

use pagewright_content::slugify;

use super::{Generator, GeneratorContext};
use crate::builder::BuildError;
use crate::collection::PageCollection;
use crate::page::{NodeType, Page};

const HOMEPAGE_ID: &str = "index";

/// Synthesizes `index` when the site has no explicit homepage.
#[derive(Debug, Default, Clone, Copy)]
pub struct HomepageGenerator;

impl Generator for HomepageGenerator {
    fn name(&self) -> &'static str {
        "homepage"
    }

    fn generate(
        &self,
        pages: &PageCollection,
        ctx: &GeneratorContext<'_>,
    ) -> Result<Vec<Page>, BuildError> {
        if pages.has(HOMEPAGE_ID) {
            return Ok(Vec::new());
        }

        let section = ctx.config.site.paginate.homepage.section.as_deref();
        let listed = pages
            .filter(|page| {
                page.node_type() == NodeType::None
                    && page.has_body()
                    && section.map_or(true, |s| page.section() == Some(s))
            })
            .sort_by_date()
            .ids();

        let mut home = Page::new_virtual(HOMEPAGE_ID, slugify(""), NodeType::Homepage);
        home.set_title("Home");
        home.set_pages(listed);
        home.set_menu_weight("main", 1);

        Ok(vec![home])
    }
}
