//! Section index pages.

use pagewright_content::slugify;

use super::{capitalize, claimed_outputs, Generator, GeneratorContext};
use crate::builder::BuildError;
use crate::collection::PageCollection;
use crate::hooks::Stage;
use crate::message::Message;
use crate::page::{NodeType, Page};
use crate::templates::output_path;

/// Menu weight of the first section; each later section adds [`WEIGHT_STEP`].
const FIRST_WEIGHT: i64 = 100;
const WEIGHT_STEP: i64 = 10;

/// One listing page per section, unless the section already has an explicit index.
#[derive(Debug, Default, Clone, Copy)]
pub struct SectionGenerator;

impl Generator for SectionGenerator {
    fn name(&self) -> &'static str {
        "section"
    }

    fn generate(
        &self,
        pages: &PageCollection,
        ctx: &GeneratorContext<'_>,
    ) -> Result<Vec<Page>, BuildError> {
        let claimed = claimed_outputs(pages, ctx);
        let sections =
            pages.group_by(|page| page.section().map(str::to_string).into_iter().collect());

        let mut generated = Vec::new();
        let mut weight = FIRST_WEIGHT;

        for (section, members) in sections {
            let id = slugify(&format!("{section}/index"));

            let current = weight;
            weight += WEIGHT_STEP;

            if pages.has(&id) {
                continue;
            }

            let mut page = Page::new_virtual(id, slugify(&section), NodeType::Section);
            page.set_path(slugify(&section));
            page.set_title(capitalize(&section));
            page.set_section(section.clone());

            let output = output_path(&page, &ctx.config.output.filename);
            if claimed.contains(&output) {
                (ctx.report)(Message::warning(
                    Stage::Generate,
                    page.id(),
                    format!("section index for {section} would overwrite {output}"),
                ));
                continue;
            }

            page.set_pages(pages.subset(&members).sort_by_date().ids());
            page.set_menu_weight("main", current);
            generated.push(page);
        }

        Ok(generated)
    }
}
