//! Rules for person and container plan elements.
//!
//! Every plan attribute is optional and individually defaulted, so a plan
//! element only fails on malformed values.

use crate::error::ElementError;
use crate::registry::rule::{ElementRule, ParsedElement, RuleContext};
use crate::types::{Attr, Attributes, Tag};
use crate::xml::AttributeView;

/// Copy optional string attributes, defaulting to empty.
fn strings(
    attrs: &AttributeView<'_>,
    attributes: &mut Attributes,
    keys: &[Attr],
) -> Result<(), ElementError> {
    for &key in keys {
        attributes.insert_string(key, attrs.optional(key, String::new())?);
    }
    Ok(())
}

/// Copy optional list attributes, defaulting to empty.
fn lists(
    attrs: &AttributeView<'_>,
    attributes: &mut Attributes,
    keys: &[Attr],
) -> Result<(), ElementError> {
    for &key in keys {
        attributes.insert_string_list(key, attrs.optional(key, Vec::new())?);
    }
    Ok(())
}

/// Copy optional numeric attributes, defaulting to zero.
fn doubles(
    attrs: &AttributeView<'_>,
    attributes: &mut Attributes,
    keys: &[Attr],
) -> Result<(), ElementError> {
    for &key in keys {
        attributes.insert_double(key, attrs.optional(key, 0.0)?);
    }
    Ok(())
}

/// Rule for `<personTrip>` elements.
pub struct PersonTripRule;

impl ElementRule for PersonTripRule {
    fn tag(&self) -> Tag {
        Tag::PersonTrip
    }

    fn parse(
        &self,
        attrs: &AttributeView<'_>,
        _context: &RuleContext<'_>,
    ) -> Result<ParsedElement, ElementError> {
        let mut attributes = Attributes::new();
        strings(attrs, &mut attributes, &[Attr::From, Attr::To, Attr::BusStop])?;
        lists(attrs, &mut attributes, &[Attr::Via, Attr::VTypes, Attr::Modes])?;
        doubles(attrs, &mut attributes, &[Attr::DepartPos, Attr::ArrivalPos])?;
        Ok(ParsedElement::new(Tag::PersonTrip, attributes))
    }
}

/// Rule for `<ride>` elements.
pub struct RideRule;

impl ElementRule for RideRule {
    fn tag(&self) -> Tag {
        Tag::Ride
    }

    fn parse(
        &self,
        attrs: &AttributeView<'_>,
        _context: &RuleContext<'_>,
    ) -> Result<ParsedElement, ElementError> {
        let mut attributes = Attributes::new();
        strings(attrs, &mut attributes, &[Attr::From, Attr::To, Attr::BusStop])?;
        lists(attrs, &mut attributes, &[Attr::Lines])?;
        doubles(attrs, &mut attributes, &[Attr::ArrivalPos])?;
        Ok(ParsedElement::new(Tag::Ride, attributes))
    }
}

/// Rule for `<walk>` elements.
pub struct WalkRule;

impl ElementRule for WalkRule {
    fn tag(&self) -> Tag {
        Tag::Walk
    }

    fn parse(
        &self,
        attrs: &AttributeView<'_>,
        _context: &RuleContext<'_>,
    ) -> Result<ParsedElement, ElementError> {
        let mut attributes = Attributes::new();
        strings(
            attrs,
            &mut attributes,
            &[Attr::Route, Attr::From, Attr::To, Attr::BusStop],
        )?;
        lists(attrs, &mut attributes, &[Attr::Edges])?;
        doubles(
            attrs,
            &mut attributes,
            &[
                Attr::Duration,
                Attr::Speed,
                Attr::DepartPos,
                Attr::ArrivalPos,
                Attr::DepartPosLat,
            ],
        )?;
        Ok(ParsedElement::new(Tag::Walk, attributes))
    }
}

/// Rule for `<transport>` elements.
pub struct TransportRule;

impl ElementRule for TransportRule {
    fn tag(&self) -> Tag {
        Tag::Transport
    }

    fn parse(
        &self,
        attrs: &AttributeView<'_>,
        _context: &RuleContext<'_>,
    ) -> Result<ParsedElement, ElementError> {
        let mut attributes = Attributes::new();
        strings(
            attrs,
            &mut attributes,
            &[Attr::From, Attr::To, Attr::ContainerStop],
        )?;
        lists(attrs, &mut attributes, &[Attr::Lines])?;
        doubles(attrs, &mut attributes, &[Attr::ArrivalPos])?;
        Ok(ParsedElement::new(Tag::Transport, attributes))
    }
}

/// Rule for `<tranship>` elements.
pub struct TranshipRule;

impl ElementRule for TranshipRule {
    fn tag(&self) -> Tag {
        Tag::Tranship
    }

    fn parse(
        &self,
        attrs: &AttributeView<'_>,
        _context: &RuleContext<'_>,
    ) -> Result<ParsedElement, ElementError> {
        let mut attributes = Attributes::new();
        lists(attrs, &mut attributes, &[Attr::Edges])?;
        strings(
            attrs,
            &mut attributes,
            &[Attr::From, Attr::To, Attr::ContainerStop],
        )?;
        doubles(
            attrs,
            &mut attributes,
            &[Attr::Speed, Attr::DepartPos, Attr::ArrivalPos],
        )?;
        Ok(ParsedElement::new(Tag::Tranship, attributes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HandlerConfig;
    use crate::xml::RawAttributes;
    use pretty_assertions::assert_eq;

    fn parse(rule: &dyn ElementRule, raw: &RawAttributes) -> Result<ParsedElement, ElementError> {
        let config = HandlerConfig::default();
        rule.parse(
            &AttributeView::new(rule.tag(), raw),
            &RuleContext::new(Some(Tag::Person), &config),
        )
    }

    #[test]
    fn test_person_trip_defaults() {
        let parsed = parse(&PersonTripRule, &RawAttributes::new()).unwrap();
        let attributes = &parsed.attributes;

        assert_eq!(attributes.string(Attr::From), "");
        assert_eq!(attributes.string(Attr::BusStop), "");
        assert!(attributes.string_list(Attr::VTypes).is_empty());
        assert!(attributes.string_list(Attr::Modes).is_empty());
        assert_eq!(attributes.double(Attr::DepartPos), 0.0);
        assert_eq!(attributes.double(Attr::ArrivalPos), 0.0);
        assert_eq!(attributes.len(), 8);
    }

    #[test]
    fn test_ride_lines() {
        let raw = RawAttributes::new()
            .with("from", "a")
            .with("busStop", "bs1")
            .with("lines", "ANY 42");
        let parsed = parse(&RideRule, &raw).unwrap();
        assert_eq!(parsed.attributes.string(Attr::BusStop), "bs1");
        assert_eq!(parsed.attributes.string_list(Attr::Lines), ["ANY", "42"]);
    }

    #[test]
    fn test_walk_malformed_speed() {
        let raw = RawAttributes::new().with("edges", "a b").with("speed", "brisk");
        let err = parse(&WalkRule, &raw).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Attribute 'speed' in definition of walk is not a valid double: 'brisk'"
        );
    }

    #[test]
    fn test_transport_and_tranship() {
        let raw = RawAttributes::new()
            .with("containerStop", "cs1")
            .with("arrivalPos", "12.5");
        let parsed = parse(&TransportRule, &raw).unwrap();
        assert_eq!(parsed.attributes.string(Attr::ContainerStop), "cs1");
        assert_eq!(parsed.attributes.double(Attr::ArrivalPos), 12.5);

        let raw = RawAttributes::new().with("edges", "x").with("speed", "1.5");
        let parsed = parse(&TranshipRule, &raw).unwrap();
        assert_eq!(parsed.attributes.string_list(Attr::Edges), ["x"]);
        assert_eq!(parsed.attributes.double(Attr::Speed), 1.5);
    }

    #[test]
    fn test_plan_round_trip() {
        let raw = RawAttributes::new()
            .with("from", "a")
            .with("to", "b")
            .with("edges", "a m b")
            .with("duration", "20")
            .with("departPosLat", "-0.5");
        let first = parse(&WalkRule, &raw).unwrap();
        let second = parse(
            &WalkRule,
            &RawAttributes::from_attributes(&first.attributes),
        )
        .unwrap();
        assert_eq!(first.attributes, second.attributes);
    }
}
