//! Rule for `<param>` elements.

use crate::error::{AttributeError, ElementError};
use crate::registry::rule::{ElementRule, ParsedElement, RuleContext};
use crate::types::{Attr, Attributes, Tag};
use crate::xml::AttributeView;

/// Rule for generic `<param key=".." value=".."/>` elements.
///
/// The parameter must sit directly inside a parsed element. Key syntax is
/// checked when the parameter is attached, so an empty key parses here.
pub struct ParamRule;

impl ElementRule for ParamRule {
    fn tag(&self) -> Tag {
        Tag::Param
    }

    fn parse(
        &self,
        attrs: &AttributeView<'_>,
        context: &RuleContext<'_>,
    ) -> Result<ParsedElement, ElementError> {
        if matches!(context.parent, None | Some(Tag::Param | Tag::Nothing)) {
            return Err(ElementError::structural(
                Tag::Param,
                "parameters must be defined within a route, vehicle, stop or plan element",
            ));
        }
        if !attrs.has(Attr::Key) {
            return Err(AttributeError::Missing {
                tag: Tag::Param,
                attr: Attr::Key,
                id: None,
            }
            .into());
        }

        let mut attributes = Attributes::new();
        attributes.insert_string(Attr::Key, attrs.optional(Attr::Key, String::new())?);
        attributes.insert_string(Attr::Value, attrs.optional(Attr::Value, String::new())?);
        Ok(ParsedElement::new(Tag::Param, attributes))
    }
}
