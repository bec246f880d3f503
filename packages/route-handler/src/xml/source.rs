//! Event source that replays an XML document as open/close events.

use roxmltree::{Document, Edge, Node};

use super::attributes::RawAttributes;
use crate::error::Result;
use crate::types::Tag;

/// Receiver of element events.
///
/// Events arrive in document order; every `start_element` is matched by
/// one `end_element` for the same tag.
pub trait EventSink {
    /// An element was opened.
    ///
    /// # Errors
    /// Implementations return an error to stop the event stream.
    fn start_element(&mut self, tag: Tag, attrs: &RawAttributes) -> Result<()>;

    /// The innermost open element was closed.
    ///
    /// # Errors
    /// Implementations return an error to stop the event stream.
    fn end_element(&mut self, tag: Tag) -> Result<()>;
}

/// Get the element name without namespace prefix.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use route_handler::xml::get_tag_name;
///
/// let doc = Document::parse(r#"<routes><vehicle id="v"/></routes>"#).unwrap();
/// let vehicle = doc.root_element().first_element_child().unwrap();
/// assert_eq!(get_tag_name(vehicle), "vehicle");
/// ```
pub fn get_tag_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Collect the attributes of an element, ignoring namespaces.
#[must_use]
pub fn raw_attributes(node: Node<'_, '_>) -> RawAttributes {
    node.attributes()
        .map(|attr| (attr.name(), attr.value()))
        .collect()
}

/// Parse `text` and replay its elements into `sink`.
///
/// Text content, comments and processing instructions are not forwarded.
/// Nesting depth is not limited by the call stack.
///
/// # Errors
/// Returns `Xml` for malformed documents, or the first error returned by
/// the sink, after which no further events are delivered.
pub fn feed_document(text: &str, sink: &mut impl EventSink) -> Result<()> {
    let document = Document::parse(text)?;
    for edge in document.root_element().traverse() {
        match edge {
            Edge::Open(node) if node.is_element() => {
                let tag = Tag::from_name(get_tag_name(node));
                sink.start_element(tag, &raw_attributes(node))?;
            }
            Edge::Close(node) if node.is_element() => {
                sink.end_element(Tag::from_name(get_tag_name(node)))?;
            }
            _ => {}
        }
    }
    Ok(())
}
