//! Static site builder.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use pagewright_content::{ConvertError, Converters};
use rayon::prelude::*;
use serde_json::json;

use crate::assets::copy_static;
use crate::collection::{CollectionError, PageCollection};
use crate::config::SiteConfig;
use crate::factory::PageFactory;
use crate::generators::{Fetcher, Generator, GeneratorContext, GeneratorRegistry, HttpFetcher};
use crate::hooks::{Hooks, Stage};
use crate::layout::{LayoutError, LayoutResolver};
use crate::menu::collect_menus;
use crate::message::{log_message, Message, Severity};
use crate::page::NodeType;
use crate::source::{ContentSource, DirectorySource};
use crate::templates::{output_path, page_context, site_context, TemplateEngine};

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of pages written
    pub pages: usize,

    /// Number of recoverable errors reported along the way
    pub errors: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Content directory not found: {}", .0.display())]
    ContentDirNotFound(PathBuf),

    #[error("Layouts directory not found: {}", .0.display())]
    LayoutsDirNotFound(PathBuf),

    #[error("Theme {theme} not found: {} has no layouts", .path.display())]
    ThemeNotFound { theme: String, path: PathBuf },

    #[error("Invalid output directory: {}", .0.display())]
    InvalidOutputDir(PathBuf),

    #[error("Unknown generator in [generators]: {0}")]
    UnknownGenerator(String),

    #[error("Failed to read {}: {message}", .path.display())]
    ReadError { path: PathBuf, message: String },

    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error("{id} is produced by more than one content file ({path})")]
    DuplicatePage { id: String, path: String },

    #[error("Invalid front matter in {page}: {source}")]
    Frontmatter {
        page: String,
        #[source]
        source: ConvertError,
    },

    #[error("Invalid date in {page}: {value}")]
    InvalidDate { page: String, value: String },

    #[error("Generator {generator} failed: {message}")]
    Generator { generator: String, message: String },

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("Failed to render {page}: {message}")]
    TemplateError { page: String, message: String },

    #[error("Failed to write {}: {message}", .path.display())]
    WriteError { path: PathBuf, message: String },
}

impl BuildError {
    /// Whether the build may continue past this error for the page concerned.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Frontmatter { .. })
    }
}

/// Directories a build reads from and writes to, checked up front.
#[derive(Debug)]
struct SiteDirs {
    content: PathBuf,
    layout_roots: Vec<PathBuf>,
    static_roots: Vec<PathBuf>,
    output: PathBuf,
}

type MessageSink = Box<dyn Fn(&Message) + Send + Sync>;

/// Static site builder.
pub struct StaticBuilder {
    source_dir: PathBuf,
    config: SiteConfig,
    converters: Converters,
    fetcher: Arc<dyn Fetcher>,
    extra_generators: Vec<(i32, Arc<dyn Generator>)>,
    hooks: Hooks,
    on_message: MessageSink,
}

impl StaticBuilder {
    /// Create a builder for the site rooted at `source_dir`.
    pub fn new(source_dir: impl Into<PathBuf>, config: SiteConfig) -> Self {
        Self {
            source_dir: source_dir.into(),
            config,
            converters: Converters::with_defaults(),
            fetcher: Arc::new(HttpFetcher::new()),
            extra_generators: Vec::new(),
            hooks: Hooks::new(),
            on_message: Box::new(log_message),
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Replace the front matter and body converters.
    pub fn with_converters(mut self, converters: Converters) -> Self {
        self.converters = converters;
        self
    }

    /// Fetcher used by the external body generator.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Receive per-page diagnostics instead of logging them.
    pub fn on_message(mut self, sink: impl Fn(&Message) + Send + Sync + 'static) -> Self {
        self.on_message = Box::new(sink);
        self
    }

    /// Add a generator next to the built-in ones.
    pub fn register_generator(mut self, priority: i32, generator: impl Generator + 'static) -> Self {
        self.extra_generators.push((priority, Arc::new(generator)));
        self
    }

    /// Build the static site.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        let dirs = self.site_dirs()?;
        let registry = self.registry()?;

        let errors = Cell::new(0usize);
        let report = |message: Message| {
            if message.severity == Severity::Error {
                errors.set(errors.get() + 1);
            }
            (self.on_message)(&message);
        };

        // Load
        let content_dir = dirs.content.display().to_string();
        let units = self.run_stage(Stage::Load, json!({ "dir": content_dir }), || {
            DirectorySource::new(&dirs.content, &self.config.content.ext).units()
        })?;

        // Create
        let factory = PageFactory::new(&self.config, &self.converters);
        let mut pages = self.run_stage(Stage::Create, json!({ "units": units.len() }), || {
            let mut pages = PageCollection::new();
            for unit in &units {
                let page = factory.create(unit);
                if pages.has(page.id()) {
                    return Err(BuildError::DuplicatePage {
                        id: page.id().to_string(),
                        path: unit.relative_path.clone(),
                    });
                }
                pages.add(page)?;
            }
            Ok(pages)
        })?;

        // Convert
        let count = pages.len();
        self.run_stage(Stage::Convert, json!({ "pages": count }), || {
            for page in pages.iter_mut() {
                match factory.convert(page) {
                    Ok(()) => {}
                    Err(e) if e.is_recoverable() => {
                        report(Message::error(Stage::Convert, page.id(), e.to_string()));
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok(())
        })?;

        // Generate
        let order: Vec<_> = registry.order().into_iter().map(|(_, name)| name).collect();
        let ctx = GeneratorContext {
            config: &self.config,
            converters: &self.converters,
            report: &report,
        };
        self.run_stage(Stage::Generate, json!({ "generators": order }), || {
            registry.run(&mut pages, &ctx)
        })?;

        // Menus
        let menus = self.run_stage(Stage::Menus, json!({ "pages": pages.len() }), || {
            Ok(collect_menus(&pages, &self.config.site.menu))
        })?;

        // Render
        let output_dir = dirs.output.display().to_string();
        let rendered = self.run_stage(Stage::Render, json!({ "output": output_dir }), || {
            self.render(&mut pages, &menus, &dirs)
        })?;

        // Copy
        self.run_stage(Stage::Copy, json!({ "output": output_dir }), || {
            let mut copied = 0;
            for root in &dirs.static_roots {
                copied += copy_static(
                    root,
                    &dirs.output,
                    &self.config.static_files.exclude,
                    self.config.build.minify,
                )?;
            }
            Ok(copied)
        })?;

        let duration = start.elapsed();

        Ok(BuildResult {
            pages: rendered,
            errors: errors.get(),
            duration_ms: duration.as_millis() as u64,
            output_dir: dirs.output,
        })
    }

    /// Fire the hooks around one stage.
    fn run_stage<T>(
        &self,
        stage: Stage,
        payload: serde_json::Value,
        run: impl FnOnce() -> Result<T, BuildError>,
    ) -> Result<T, BuildError> {
        tracing::debug!("Stage {} started", stage);
        self.hooks.fire(&stage.pre(), &payload);

        match run() {
            Ok(value) => {
                self.hooks.fire(&stage.post(), &payload);
                Ok(value)
            }
            Err(e) => {
                self.hooks
                    .fire(&stage.exception(), &json!({ "error": e.to_string() }));
                Err(e)
            }
        }
    }

    /// Check every configured directory before touching any page.
    fn site_dirs(&self) -> Result<SiteDirs, BuildError> {
        let source = &self.source_dir;
        if !source.is_dir() {
            return Err(BuildError::SourceNotFound(source.clone()));
        }

        let content = source.join(&self.config.content.dir);
        if !content.is_dir() {
            return Err(BuildError::ContentDirNotFound(content));
        }

        let mut layout_roots = Vec::new();
        let mut static_roots = Vec::new();

        let layouts = source.join(&self.config.layouts.dir);
        if layouts.is_dir() {
            layout_roots.push(layouts);
        } else if self.config.theme.is_none() {
            return Err(BuildError::LayoutsDirNotFound(layouts));
        }

        if let Some(theme) = &self.config.theme {
            let theme_dir = source.join(&self.config.themes.dir).join(theme);
            let theme_layouts = theme_dir.join("layouts");
            if !theme_layouts.is_dir() {
                return Err(BuildError::ThemeNotFound {
                    theme: theme.clone(),
                    path: theme_dir,
                });
            }
            layout_roots.push(theme_layouts);
            static_roots.push(theme_dir.join("static"));
        }
        static_roots.push(source.join(&self.config.static_files.dir));

        let output = source.join(&self.config.output.dir);
        if output.exists() && !output.is_dir() {
            return Err(BuildError::InvalidOutputDir(output));
        }
        if same_dir(&output, source) || same_dir(&output, &content) {
            return Err(BuildError::InvalidOutputDir(output));
        }

        Ok(SiteDirs {
            content,
            layout_roots,
            static_roots,
            output,
        })
    }

    fn registry(&self) -> Result<GeneratorRegistry, BuildError> {
        let mut registry = GeneratorRegistry::with_defaults(self.fetcher.clone());
        for (priority, generator) in &self.extra_generators {
            registry.register_arc(*priority, generator.clone());
        }
        registry.set_priorities(&self.config.generators)?;
        Ok(registry)
    }

    /// Resolve layouts, drop terms pages without one, then render in parallel.
    fn render(
        &self,
        pages: &mut PageCollection,
        menus: &crate::menu::Menus,
        dirs: &SiteDirs,
    ) -> Result<usize, BuildError> {
        let resolver = LayoutResolver::new(dirs.layout_roots.clone());

        let mut jobs = Vec::with_capacity(pages.len());
        let mut dropped = Vec::new();
        for page in pages.iter() {
            match resolver.resolve(page) {
                Ok(template) => jobs.push((page.id().to_string(), template)),
                Err(e) if page.node_type() == NodeType::Terms => {
                    tracing::debug!("Skipping {}: {}", page.id(), e);
                    dropped.push(page.id().to_string());
                }
                Err(e) => return Err(e.into()),
            }
        }
        for id in &dropped {
            pages.remove(id);
        }

        let engine =
            TemplateEngine::new(dirs.layout_roots.clone()).map_err(|e| BuildError::TemplateError {
                page: String::new(),
                message: e.to_string(),
            })?;
        let site = site_context(&self.config.site, menus, pages);

        fs::create_dir_all(&dirs.output).map_err(|e| BuildError::WriteError {
            path: dirs.output.clone(),
            message: e.to_string(),
        })?;

        let pages = &*pages;
        let results: Vec<Result<(), BuildError>> = jobs
            .par_iter()
            .map(|(id, template)| {
                let Some(page) = pages.get(id) else {
                    return Ok(());
                };

                let html = engine
                    .render(template, &page_context(page, pages), &site)
                    .map_err(|e| BuildError::TemplateError {
                        page: id.clone(),
                        message: format!("{template}: {e}"),
                    })?;

                let target = dirs
                    .output
                    .join(output_path(page, &self.config.output.filename));
                write_page(&target, &html)
            })
            .collect();

        for result in results {
            result?;
        }

        tracing::debug!("Rendered {} pages", jobs.len());

        Ok(jobs.len())
    }
}

impl std::fmt::Debug for StaticBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticBuilder")
            .field("source_dir", &self.source_dir)
            .field("config", &self.config)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

fn write_page(target: &Path, html: &str) -> Result<(), BuildError> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::WriteError {
            path: parent.to_path_buf(),
            message: e.to_string(),
        })?;
    }

    fs::write(target, html).map_err(|e| BuildError::WriteError {
        path: target.to_path_buf(),
        message: e.to_string(),
    })
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
