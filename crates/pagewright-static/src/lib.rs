//! Page model and build pipeline for pagewright.
//!
//! Turns a content directory into a rendered site: content files become
//! [`Page`]s in a [`PageCollection`], a priority-ordered chain of generators
//! derives section, taxonomy, homepage, pagination and redirect pages, every
//! page is matched to a layout through a fallback chain, and the result is
//! rendered with minijinja.

pub mod assets;
pub mod builder;
pub mod collection;
pub mod config;
pub mod factory;
pub mod generators;
pub mod hooks;
pub mod layout;
pub mod menu;
pub mod message;
pub mod page;
pub mod source;
pub mod templates;

pub use builder::{BuildError, BuildResult, StaticBuilder};
pub use collection::{CollectionError, PageCollection};
pub use config::SiteConfig;
pub use factory::PageFactory;
pub use generators::{Generator, GeneratorContext, GeneratorRegistry};
pub use hooks::{HookEvent, Hooks, Stage};
pub use layout::{LayoutError, LayoutResolver};
pub use menu::{MenuEntry, MenuSpec, Menus};
pub use message::{Message, Severity};
pub use page::{NodeType, Page, Value, Variables};
pub use source::{ContentSource, ContentUnit, DirectorySource};
