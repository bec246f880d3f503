//! Attribute access and the XML event source.

mod attributes;
mod source;

pub use attributes::{parse_bool, split_list, AttributeView, FromAttribute, RawAttributes};
pub use source::{feed_document, get_tag_name, raw_attributes, EventSink};
