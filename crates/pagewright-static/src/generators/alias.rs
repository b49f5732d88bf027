//! Redirect pages for `aliases`.

use std::collections::HashSet;

use pagewright_content::slugify;

use super::{Generator, GeneratorContext};
use crate::builder::BuildError;
use crate::collection::PageCollection;
use crate::hooks::Stage;
use crate::layout::REDIRECT_LAYOUT;
use crate::message::Message;
use crate::page::{NodeType, Page};

/// One redirect page per alias, pointing at the declaring page's permalink.
#[derive(Debug, Default, Clone, Copy)]
pub struct AliasGenerator;

impl Generator for AliasGenerator {
    fn name(&self) -> &'static str {
        "alias"
    }

    fn generate(
        &self,
        pages: &PageCollection,
        ctx: &GeneratorContext<'_>,
    ) -> Result<Vec<Page>, BuildError> {
        let taken: HashSet<&str> = pages.iter().map(Page::pathname).collect();
        let mut seen = HashSet::new();
        let mut generated = Vec::new();

        for page in pages {
            for alias in page.aliases() {
                let alias = alias.trim().to_string();
                let pathname = slugify(&alias);

                if pages.has(&alias) || taken.contains(pathname.as_str()) {
                    (ctx.report)(Message::warning(
                        Stage::Generate,
                        page.id(),
                        format!("alias {alias} would overwrite an existing page"),
                    ));
                    continue;
                }
                if !seen.insert(alias.clone()) {
                    continue;
                }

                let mut redirect = Page::new_virtual(alias, pathname, NodeType::None);
                redirect.set_title(page.title());
                redirect.set_layout(REDIRECT_LAYOUT);
                redirect.set_variable("destination", page.permalink());
                generated.push(redirect);
            }
        }

        Ok(generated)
    }
}
