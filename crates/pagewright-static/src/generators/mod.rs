//! Generators that derive pages from the page collection.
//!
//! Each generator reads the collection left by the ones before it and returns
//! the pages it contributes. The registry merges them back: a page whose id is
//! already present replaces it, any other page is added. Generators check ids
//! and output files themselves before proposing a page, so explicit pages
//! always win.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use pagewright_content::Converters;

use crate::builder::BuildError;
use crate::collection::PageCollection;
use crate::config::SiteConfig;
use crate::message::Message;
use crate::page::Page;
use crate::templates::output_path;

pub mod alias;
pub mod external;
pub mod homepage;
pub mod pagination;
pub mod section;
pub mod taxonomy;

pub use alias::AliasGenerator;
pub use external::{ExternalBodyGenerator, FetchError, Fetcher, HttpFetcher};
pub use homepage::HomepageGenerator;
pub use pagination::PaginationGenerator;
pub use section::SectionGenerator;
pub use taxonomy::TaxonomyGenerator;

/// What a generator can see besides the collection.
pub struct GeneratorContext<'a> {
    pub config: &'a SiteConfig,
    pub converters: &'a Converters,
    pub report: &'a dyn Fn(Message),
}

/// A step deriving pages from the current collection.
pub trait Generator: Send + Sync {
    /// Name used in diagnostics and in `[generators]` priority overrides
    fn name(&self) -> &'static str;

    /// Pages to add, or to replace when their id already exists.
    fn generate(
        &self,
        pages: &PageCollection,
        ctx: &GeneratorContext<'_>,
    ) -> Result<Vec<Page>, BuildError>;
}

/// Generators sorted by ascending priority, ties in registration order.
#[derive(Clone, Default)]
pub struct GeneratorRegistry {
    generators: Vec<(i32, Arc<dyn Generator>)>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Section (10), taxonomy (20), homepage (30), external body (35),
    /// pagination (40) and alias (50).
    pub fn with_defaults(fetcher: Arc<dyn Fetcher>) -> Self {
        let mut registry = Self::new();
        registry.register(10, SectionGenerator);
        registry.register(20, TaxonomyGenerator);
        registry.register(30, HomepageGenerator);
        registry.register(35, ExternalBodyGenerator::new(fetcher));
        registry.register(40, PaginationGenerator);
        registry.register(50, AliasGenerator);
        registry
    }

    pub fn register(&mut self, priority: i32, generator: impl Generator + 'static) {
        self.register_arc(priority, Arc::new(generator));
    }

    pub fn register_arc(&mut self, priority: i32, generator: Arc<dyn Generator>) {
        self.generators.push((priority, generator));
        self.generators.sort_by_key(|(priority, _)| *priority);
    }

    /// Apply `[generators]` overrides. Unknown names are a configuration error.
    pub fn set_priorities(&mut self, overrides: &BTreeMap<String, i32>) -> Result<(), BuildError> {
        let known: HashSet<&str> = self.generators.iter().map(|(_, g)| g.name()).collect();
        if let Some(unknown) = overrides.keys().find(|name| !known.contains(name.as_str())) {
            return Err(BuildError::UnknownGenerator(unknown.clone()));
        }

        for (priority, generator) in &mut self.generators {
            if let Some(&value) = overrides.get(generator.name()) {
                *priority = value;
            }
        }
        self.generators.sort_by_key(|(priority, _)| *priority);

        Ok(())
    }

    /// `(priority, name)` in run order.
    pub fn order(&self) -> Vec<(i32, &'static str)> {
        self.generators
            .iter()
            .map(|(priority, g)| (*priority, g.name()))
            .collect()
    }

    /// Run every generator in order, merging its output before the next one runs.
    pub fn run(
        &self,
        pages: &mut PageCollection,
        ctx: &GeneratorContext<'_>,
    ) -> Result<(), BuildError> {
        for (priority, generator) in &self.generators {
            let generated = generator.generate(pages, ctx)?;
            tracing::debug!(
                "Generator {} (priority {}) produced {} pages",
                generator.name(),
                priority,
                generated.len()
            );

            for page in generated {
                let merged = if pages.has(page.id()) {
                    pages.replace(page).map(|_| ())
                } else {
                    pages.add(page)
                };
                merged.map_err(|e| BuildError::Generator {
                    generator: generator.name().to_string(),
                    message: e.to_string(),
                })?;
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.order()).finish()
    }
}

/// Capitalize first letter of a string.
/// Output files already written by pages in the collection.
pub(crate) fn claimed_outputs(pages: &PageCollection, ctx: &GeneratorContext<'_>) -> HashSet<String> {
    let filename = &ctx.config.output.filename;
    pages.iter().map(|page| output_path(page, filename)).collect()
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::page::NodeType;
    use chrono::{TimeZone, Utc};
    use std::cell::RefCell;

    /// An explicit-looking content page dated `2015-01-<day>`.
    pub fn post(id: &str, day: u32) -> Page {
        let (dir, _) = id.rsplit_once('/').unwrap_or(("", id));
        let mut page = Page::new_virtual(id, id, NodeType::None);
        page.set_path(dir);
        page.set_title(id);
        page.set_body("Body");
        page.set_date(Utc.with_ymd_and_hms(2015, 1, day, 0, 0, 0).unwrap());
        page
    }

    pub fn collection(pages: impl IntoIterator<Item = Page>) -> PageCollection {
        let mut collection = PageCollection::new();
        for page in pages {
            collection.add(page).unwrap();
        }
        collection
    }

    /// Run one generator and collect the messages it reports.
    pub fn run_one(
        generator: &dyn Generator,
        pages: &PageCollection,
        config: &SiteConfig,
    ) -> (Vec<Page>, Vec<Message>) {
        let converters = Converters::with_defaults();
        let messages = RefCell::new(Vec::new());
        let report = |m: Message| messages.borrow_mut().push(m);
        let ctx = GeneratorContext {
            config,
            converters: &converters,
            report: &report,
        };
        let pages = generator.generate(pages, &ctx).unwrap();
        (pages, messages.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    struct Named(&'static str);

    impl Generator for Named {
        fn name(&self) -> &'static str {
            self.0
        }

        fn generate(
            &self,
            _pages: &PageCollection,
            _ctx: &GeneratorContext<'_>,
        ) -> Result<Vec<Page>, BuildError> {
            Ok(Vec::new())
        }
    }

    struct NoFetch;

    impl Fetcher for NoFetch {
        fn fetch(&self, url: &str) -> Result<String, FetchError> {
            Err(FetchError::Request(url.to_string()))
        }
    }

    #[test]
    fn defaults_run_in_priority_order() {
        let registry = GeneratorRegistry::with_defaults(Arc::new(NoFetch));

        assert_eq!(
            registry.order(),
            vec![
                (10, "section"),
                (20, "taxonomy"),
                (30, "homepage"),
                (35, "external"),
                (40, "pagination"),
                (50, "alias"),
            ]
        );
    }

    #[test]
    fn equal_priorities_keep_registration_order() {
        let mut registry = GeneratorRegistry::new();
        registry.register(5, Named("b"));
        registry.register(1, Named("a"));
        registry.register(5, Named("c"));

        let names: Vec<_> = registry.order().into_iter().map(|(_, n)| n).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn overrides_reorder_and_reject_unknown_names() {
        let mut registry = GeneratorRegistry::new();
        registry.register(10, Named("first"));
        registry.register(20, Named("second"));

        registry
            .set_priorities(&BTreeMap::from([("first".to_string(), 30)]))
            .unwrap();
        assert_eq!(registry.order(), vec![(20, "second"), (30, "first")]);

        let err = registry
            .set_priorities(&BTreeMap::from([("bogus".to_string(), 1)]))
            .unwrap_err();
        assert!(matches!(err, BuildError::UnknownGenerator(name) if name == "bogus"));
    }

    #[test]
    fn later_generators_see_earlier_output() {
        let config = SiteConfig {
            site: crate::config::SiteSection {
                paginate: crate::config::PaginateConfig {
                    max: 1,
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        };
        let converters = Converters::with_defaults();
        let report = |_: Message| {};
        let ctx = GeneratorContext {
            config: &config,
            converters: &converters,
            report: &report,
        };

        let mut pages = collection([post("blog/a", 1), post("blog/b", 2)]);
        GeneratorRegistry::with_defaults(Arc::new(NoFetch))
            .run(&mut pages, &ctx)
            .unwrap();

        assert!(pages.has("blog/index"));
        assert!(pages.has("blog/page/2/index"));
        assert!(pages.has("index"));
        assert!(pages.has("page/2/index"));
        assert!(pages.has("blog/page/1"));
        assert!(pages.has("page/1"));
    }

    #[test]
    fn capitalizes() {
        assert_eq!(capitalize("blog"), "Blog");
        assert_eq!(capitalize(""), "");
    }
}
