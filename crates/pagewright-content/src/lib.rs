//! Content parsing primitives for pagewright.
//!
//! This crate splits raw content files into a front matter block and a body,
//! decodes front matter through pluggable format parsers, renders bodies to
//! HTML, and provides the slug normalization used for page identifiers.

pub mod convert;
pub mod frontmatter;
pub mod slug;

pub use convert::{
    BodyConverter, ConvertError, Converters, FrontMatterMap, FrontMatterParser, IniParser,
    MarkdownConverter, YamlParser,
};
pub use frontmatter::{split_frontmatter, Split};
pub use slug::slugify;
