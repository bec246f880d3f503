//! Rule for `<route>` elements.

use crate::error::ElementError;
use crate::registry::rule::{ElementRule, ParsedElement, RuleContext};
use crate::types::{Attr, AttributeValue, Attributes, Color, SumoTime, Tag};
use crate::xml::AttributeView;

/// Rule for `<route>` elements.
///
/// A route is either stand-alone with an id, or embedded in a vehicle or
/// flow without one.
pub struct RouteRule;

impl ElementRule for RouteRule {
    fn tag(&self) -> Tag {
        Tag::Route
    }

    fn parse(
        &self,
        attrs: &AttributeView<'_>,
        context: &RuleContext<'_>,
    ) -> Result<ParsedElement, ElementError> {
        if context.parent.is_some() && attrs.has(Attr::Id) {
            return Err(ElementError::structural(
                Tag::Route,
                "either define a route within a vehicle or define it with an id",
            ));
        }

        let mut attributes = Attributes::new();
        if let Some(id) = attrs.maybe::<String>(Attr::Id)? {
            attributes.insert_string(Attr::Id, id);
        }
        attributes.insert_string_list(Attr::Edges, attrs.required(Attr::Edges)?);
        attributes.insert(
            Attr::Color,
            AttributeValue::Color(attrs.optional(Attr::Color, Color::YELLOW)?),
        );
        attributes.insert(
            Attr::Repeat,
            AttributeValue::Int(attrs.optional(Attr::Repeat, 0)?),
        );
        attributes.insert(
            Attr::CycleTime,
            AttributeValue::Time(attrs.optional(Attr::CycleTime, SumoTime::ZERO)?),
        );

        Ok(ParsedElement::new(Tag::Route, attributes))
    }
}
