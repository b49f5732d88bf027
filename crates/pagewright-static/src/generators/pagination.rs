//! Splitting long listings into chunk pages.

use pagewright_content::slugify;

use super::{Generator, GeneratorContext};
use crate::builder::BuildError;
use crate::collection::PageCollection;
use crate::hooks::Stage;
use crate::message::Message;
use crate::page::{permalink_to_url, NodeType, Page, Value, Variables};

/// Paginates homepage and section pages. Taxonomy pages paginate themselves.
#[derive(Debug, Default, Clone, Copy)]
pub struct PaginationGenerator;

impl Generator for PaginationGenerator {
    fn name(&self) -> &'static str {
        "pagination"
    }

    fn generate(
        &self,
        pages: &PageCollection,
        ctx: &GeneratorContext<'_>,
    ) -> Result<Vec<Page>, BuildError> {
        let settings = &ctx.config.site.paginate;
        let mut generated = Vec::new();

        for page in pages {
            if !matches!(page.node_type(), NodeType::Homepage | NodeType::Section) {
                continue;
            }
            // Already split on an earlier pass
            if page.has_variable("pagination") {
                continue;
            }
            let Some(members) = page.pages() else {
                continue;
            };
            if !settings.splits(members.len()) {
                continue;
            }

            let members = members.to_vec();
            generated.extend(paginate(page.clone(), &members, pages, ctx));
        }

        Ok(generated)
    }
}

/// Split `page` over `members` into chunks of `paginate.max` pages.
///
/// Returns the page unchanged when no split is needed. Otherwise the first
/// chunk keeps the page's id and pathname and gains a `.../page/1` alias;
/// every later chunk is a fresh page at `.../page/<n>`. A later chunk whose id
/// is already taken is skipped with a warning.
pub(crate) fn paginate(
    page: Page,
    members: &[String],
    existing: &PageCollection,
    ctx: &GeneratorContext<'_>,
) -> Vec<Page> {
    let settings = &ctx.config.site.paginate;
    if !settings.splits(members.len()) {
        return vec![page];
    }

    let base = page.pathname().to_string();
    let link = |n: usize| slugify(&format!("{}/{}/{}", base, settings.path, n));

    let chunks: Vec<&[String]> = members.chunks(settings.max).collect();
    let total = chunks.len();
    let mut out = Vec::with_capacity(total);

    for (i, chunk) in chunks.into_iter().enumerate() {
        let mut current = if i == 0 {
            let mut first = page.clone();
            first.add_alias(link(1));
            first
        } else {
            let id = slugify(&format!("{}/{}/{}/index", base, settings.path, i + 1));
            if existing.has(&id) {
                (ctx.report)(Message::warning(
                    Stage::Generate,
                    id,
                    format!("pagination chunk {} of {} collides with an existing page", i + 1, page.id()),
                ));
                continue;
            }
            page.chunk_copy(id, link(i + 1))
        };

        let mut pagination = Variables::new();
        pagination.insert("pages".to_string(), Value::Pages(chunk.to_vec()));
        pagination.insert("current".to_string(), Value::Integer(i as i64 + 1));
        pagination.insert("total".to_string(), Value::Integer(total as i64));
        if i > 0 {
            pagination.insert("prev".to_string(), Value::from(permalink_to_url(&link(i))));
        }
        if i + 1 < total {
            pagination.insert(
                "next".to_string(),
                Value::from(permalink_to_url(&link(i + 2))),
            );
        }
        current.set_variable("pagination", pagination);

        out.push(current);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::config::SiteConfig;
    use pretty_assertions::assert_eq;

    fn section_with(count: u32) -> PageCollection {
        let mut posts: Vec<Page> = (1..=count).map(|d| post(&format!("blog/p{d:02}"), d)).collect();
        let mut section = Page::new_virtual("blog/index", "blog", NodeType::Section);
        section.set_path("blog");
        section.set_menu_weight("main", 100);
        section.set_pages(posts.iter().rev().map(|p| p.id().to_string()).collect());
        posts.push(section);
        collection(posts)
    }

    fn pagination_of<'a>(page: &'a Page) -> &'a Variables {
        page.variable("pagination").and_then(Value::as_map).unwrap()
    }

    #[test]
    fn splits_twelve_pages_into_three_chunks() {
        let pages = section_with(12);

        let (generated, messages) = run_one(&PaginationGenerator, &pages, &SiteConfig::default());
        assert!(messages.is_empty());

        let ids: Vec<_> = generated.iter().map(Page::id).collect();
        assert_eq!(ids, vec!["blog/index", "blog/page/2/index", "blog/page/3/index"]);

        let first = &generated[0];
        assert_eq!(first.pathname(), "blog");
        assert_eq!(first.aliases(), vec!["blog/page/1"]);
        assert!(first.menu().is_some());
        let p0 = pagination_of(first);
        assert_eq!(p0["pages"].as_pages().unwrap().len(), 5);
        assert_eq!(p0["next"], Value::from("/blog/page/2/"));
        assert!(!p0.contains_key("prev"));

        let second = &generated[1];
        assert_eq!(second.pathname(), "blog/page/2");
        assert!(second.menu().is_none());
        assert!(second.aliases().is_empty());
        let p1 = pagination_of(second);
        assert_eq!(p1["prev"], Value::from("/blog/page/1/"));
        assert_eq!(p1["next"], Value::from("/blog/page/3/"));
        assert_eq!(p1["current"], Value::Integer(2));
        assert_eq!(p1["total"], Value::Integer(3));

        let third = pagination_of(&generated[2]);
        assert_eq!(third["pages"].as_pages().unwrap().len(), 2);
        assert_eq!(third["prev"], Value::from("/blog/page/2/"));
        assert!(!third.contains_key("next"));
    }

    #[test]
    fn leaves_short_listings_alone() {
        let pages = section_with(5);

        let (generated, _) = run_one(&PaginationGenerator, &pages, &SiteConfig::default());

        assert!(generated.is_empty());
    }

    #[test]
    fn disabled_pagination_never_splits() {
        let mut config = SiteConfig::default();
        config.site.paginate.disabled = true;

        let (generated, _) = run_one(&PaginationGenerator, &section_with(12), &config);

        assert!(generated.is_empty());
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let mut pages = section_with(12);
        let config = SiteConfig::default();

        let (generated, _) = run_one(&PaginationGenerator, &pages, &config);
        for page in generated {
            if pages.has(page.id()) {
                pages.replace(page).unwrap();
            } else {
                pages.add(page).unwrap();
            }
        }

        let (again, _) = run_one(&PaginationGenerator, &pages, &config);
        assert!(again.is_empty());
    }

    #[test]
    fn colliding_chunk_is_skipped_with_warning() {
        let mut pages = section_with(12);
        pages.add(post("blog/page/2/index", 28)).unwrap();

        let (generated, messages) = run_one(&PaginationGenerator, &pages, &SiteConfig::default());
        let ids: Vec<_> = generated.iter().map(Page::id).collect();

        assert_eq!(ids, vec!["blog/index", "blog/page/3/index"]);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].page.as_deref(), Some("blog/page/2/index"));
    }

    #[test]
    fn homepage_chunks_live_under_the_root() {
        let mut posts: Vec<Page> = (1..=3).map(|d| post(&format!("p{d}"), d)).collect();
        let mut home = Page::new_virtual("index", "", NodeType::Homepage);
        home.set_pages(posts.iter().map(|p| p.id().to_string()).collect());
        posts.push(home);
        let mut config = SiteConfig::default();
        config.site.paginate.max = 2;

        let (generated, _) = run_one(&PaginationGenerator, &collection(posts), &config);

        assert_eq!(generated[0].aliases(), vec!["page/1"]);
        assert_eq!(generated[1].id(), "page/2/index");
        assert_eq!(pagination_of(&generated[1])["prev"], Value::from("/page/1/"));
    }
}
