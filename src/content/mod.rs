//! Content module - article records, parsing and serialization

mod error;
mod fence;
mod frontmatter;
pub mod loader;
mod parser;
mod record;
pub mod widget;
mod writer;

pub use error::ParseError;
pub use fence::format_line_set;
pub use frontmatter::FrontMatter;
pub use parser::markdown_options;
pub use record::{line_count, BlockNode, CodeBlock, ContentRecord};
pub use widget::Widget;
