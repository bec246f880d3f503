//! Raw attribute sets and typed extraction over them.

use std::collections::BTreeMap;

use crate::error::AttributeError;
use crate::types::{Attr, Attributes, Color, SumoTime, Tag};

/// Attribute set of one element as delivered by the event source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAttributes {
    values: BTreeMap<String, String>,
}

impl RawAttributes {
    /// Create an empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an attribute.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Look up an attribute by its source name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Serialize a typed attribute bag back into source syntax.
    #[must_use]
    pub fn from_attributes(attributes: &Attributes) -> Self {
        attributes
            .iter()
            .map(|(attr, value)| (attr.as_str().to_string(), value.to_string()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawAttributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Types that can be parsed from attribute text.
pub trait FromAttribute: Sized {
    /// Human-readable type name used in error messages.
    const EXPECTED: &'static str;

    /// Whether a required attribute of this type must be non-empty.
    const REQUIRES_CONTENT: bool = false;

    /// Parse attribute text, returning `None` when it is not a valid value.
    fn from_attribute(text: &str) -> Option<Self>;
}

impl FromAttribute for String {
    const EXPECTED: &'static str = "string";
    const REQUIRES_CONTENT: bool = true;

    fn from_attribute(text: &str) -> Option<Self> {
        Some(text.to_string())
    }
}

impl FromAttribute for i32 {
    const EXPECTED: &'static str = "int";

    fn from_attribute(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }
}

impl FromAttribute for i64 {
    const EXPECTED: &'static str = "int";

    fn from_attribute(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }
}

impl FromAttribute for u32 {
    const EXPECTED: &'static str = "non-negative int";

    fn from_attribute(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }
}

impl FromAttribute for f64 {
    const EXPECTED: &'static str = "double";

    fn from_attribute(text: &str) -> Option<Self> {
        text.trim().parse().ok().filter(|value: &f64| value.is_finite())
    }
}

impl FromAttribute for bool {
    const EXPECTED: &'static str = "bool";

    fn from_attribute(text: &str) -> Option<Self> {
        parse_bool(text)
    }
}

impl FromAttribute for Vec<String> {
    const EXPECTED: &'static str = "list of strings";

    fn from_attribute(text: &str) -> Option<Self> {
        Some(split_list(text))
    }
}

impl FromAttribute for Color {
    const EXPECTED: &'static str = "color";

    fn from_attribute(text: &str) -> Option<Self> {
        Color::parse(text)
    }
}

impl FromAttribute for SumoTime {
    const EXPECTED: &'static str = "time";

    fn from_attribute(text: &str) -> Option<Self> {
        SumoTime::parse(text)
    }
}

/// Parse a boolean literal.
///
/// # Examples
/// ```
/// use route_handler::xml::parse_bool;
///
/// assert_eq!(parse_bool("TRUE"), Some(true));
/// assert_eq!(parse_bool("x"), Some(true));
/// assert_eq!(parse_bool("off"), Some(false));
/// assert_eq!(parse_bool("maybe"), None);
/// ```
#[must_use]
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_lowercase().as_str() {
        "1" | "yes" | "true" | "on" | "x" => Some(true),
        "0" | "no" | "false" | "off" | "-" => Some(false),
        _ => None,
    }
}

/// Split a whitespace and/or comma separated list.
///
/// # Examples
/// ```
/// use route_handler::xml::split_list;
///
/// assert_eq!(split_list("a b,c"), vec!["a", "b", "c"]);
/// assert!(split_list("").is_empty());
/// ```
#[must_use]
pub fn split_list(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(String::from)
        .collect()
}

/// Typed, read-only view over one element's raw attributes.
///
/// Errors name the element tag and, when the element has one, its id.
#[derive(Debug, Clone, Copy)]
pub struct AttributeView<'a> {
    tag: Tag,
    raw: &'a RawAttributes,
}

impl<'a> AttributeView<'a> {
    /// Wrap the attributes of a `tag` element.
    #[must_use]
    pub fn new(tag: Tag, raw: &'a RawAttributes) -> Self {
        Self { tag, raw }
    }

    /// Tag of the element being read.
    #[must_use]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Element id used in diagnostics, if the element carries one.
    #[must_use]
    pub fn object_id(&self) -> Option<String> {
        self.raw
            .get(Attr::Id.as_str())
            .filter(|id| !id.is_empty())
            .map(String::from)
    }

    /// Check whether an attribute is present.
    #[must_use]
    pub fn has(&self, attr: Attr) -> bool {
        self.raw.get(attr.as_str()).is_some()
    }

    /// Raw text of an attribute.
    #[must_use]
    pub fn text(&self, attr: Attr) -> Option<&'a str> {
        self.raw.get(attr.as_str())
    }

    /// Extract a required attribute.
    ///
    /// # Errors
    /// `Missing` if absent, `Malformed` if present but unparsable.
    /// Required strings must not be empty.
    pub fn required<T: FromAttribute>(&self, attr: Attr) -> Result<T, AttributeError> {
        let Some(text) = self.text(attr) else {
            return Err(AttributeError::Missing {
                tag: self.tag,
                attr,
                id: self.object_id(),
            });
        };
        if T::REQUIRES_CONTENT && text.is_empty() {
            return Err(self.malformed::<T>(attr, text));
        }
        T::from_attribute(text).ok_or_else(|| self.malformed::<T>(attr, text))
    }

    /// Extract an optional attribute, substituting `default` when absent.
    ///
    /// # Errors
    /// `Malformed` if present but unparsable.
    pub fn optional<T: FromAttribute>(&self, attr: Attr, default: T) -> Result<T, AttributeError> {
        match self.text(attr) {
            None => Ok(default),
            Some(text) => T::from_attribute(text).ok_or_else(|| self.malformed::<T>(attr, text)),
        }
    }

    /// Extract an attribute that has no default.
    ///
    /// # Errors
    /// `Malformed` if present but unparsable.
    pub fn maybe<T: FromAttribute>(&self, attr: Attr) -> Result<Option<T>, AttributeError> {
        self.text(attr)
            .map(|text| T::from_attribute(text).ok_or_else(|| self.malformed::<T>(attr, text)))
            .transpose()
    }

    /// Build a malformed-attribute error for the given text.
    #[must_use]
    pub fn malformed<T: FromAttribute>(&self, attr: Attr, text: &str) -> AttributeError {
        AttributeError::Malformed {
            tag: self.tag,
            attr,
            value: text.to_string(),
            expected: T::EXPECTED,
            id: self.object_id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> RawAttributes {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_required_missing() {
        let attrs = raw(&[("id", "r1")]);
        let view = AttributeView::new(Tag::Route, &attrs);
        let err = view.required::<Vec<String>>(Attr::Edges).unwrap_err();
        assert_eq!(
            err,
            AttributeError::Missing {
                tag: Tag::Route,
                attr: Attr::Edges,
                id: Some("r1".to_string()),
            }
        );
    }

    #[test]
    fn test_required_malformed() {
        let attrs = raw(&[("repeat", "often")]);
        let view = AttributeView::new(Tag::Route, &attrs);
        let err = view.required::<i32>(Attr::Repeat).unwrap_err();
        assert!(matches!(
            err,
            AttributeError::Malformed {
                expected: "int",
                ..
            }
        ));
    }

    #[test]
    fn test_required_empty_string_is_malformed() {
        let attrs = raw(&[("from", "")]);
        let view = AttributeView::new(Tag::Trip, &attrs);
        assert!(view.required::<String>(Attr::From).is_err());
        assert_eq!(view.optional(Attr::From, "x".to_string()).unwrap(), "");
    }

    #[test]
    fn test_optional_default_and_malformed() {
        let attrs = raw(&[("arrivalPos", "end")]);
        let view = AttributeView::new(Tag::Ride, &attrs);
        assert_eq!(view.optional(Attr::DepartPos, 0.0).unwrap(), 0.0);
        assert!(view.optional(Attr::ArrivalPos, 0.0).is_err());
    }

    #[test]
    fn test_non_finite_doubles_are_malformed() {
        for text in ["NaN", "nan", "inf", "-inf", "infinity"] {
            assert_eq!(f64::from_attribute(text), None, "{text}");
        }
        assert_eq!(f64::from_attribute(" 1e3 "), Some(1000.0));

        let attrs = raw(&[("arrivalPos", "NaN")]);
        let view = AttributeView::new(Tag::Walk, &attrs);
        assert!(view.optional(Attr::ArrivalPos, 0.0).is_err());
    }

    #[test]
    fn test_empty_list_is_not_an_error() {
        let attrs = raw(&[("edges", "")]);
        let view = AttributeView::new(Tag::Route, &attrs);
        let edges: Vec<String> = view.required(Attr::Edges).unwrap();
        assert!(edges.is_empty());
    }

    #[test]
    fn test_has_and_maybe() {
        let attrs = raw(&[("until", "50")]);
        let view = AttributeView::new(Tag::Stop, &attrs);
        assert!(view.has(Attr::Until));
        assert!(!view.has(Attr::Duration));
        assert_eq!(
            view.maybe::<SumoTime>(Attr::Until).unwrap(),
            Some(SumoTime::from_secs(50))
        );
        assert_eq!(view.maybe::<SumoTime>(Attr::Duration).unwrap(), None);
        assert_eq!(view.object_id(), None);
    }

    #[test]
    fn test_from_attributes_serializes_values() {
        let mut attributes = Attributes::new();
        attributes.insert_string(Attr::Id, "r1");
        attributes.insert_string_list(Attr::Edges, vec!["a".into(), "b".into()]);
        let raw = RawAttributes::from_attributes(&attributes);
        assert_eq!(raw.get("id"), Some("r1"));
        assert_eq!(raw.get("edges"), Some("a b"));
        assert_eq!(raw.len(), 2);
    }
}
