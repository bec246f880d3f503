//! Rules for elements that carry a vehicle parameter record.
//!
//! These are `vehicle`, `trip`, `flow`, `person`, `personFlow`,
//! `container` and `containerFlow`.

use crate::error::ElementError;
use crate::registry::rule::{ElementRule, ParsedElement, RuleContext};
use crate::types::{Attr, Attributes, Tag};
use crate::vehicle::parse_vehicle_parameter;
use crate::xml::AttributeView;

/// Rule for elements whose content is only the vehicle parameter record.
///
/// Used for `vehicle`, `person`, `personFlow`, `container` and
/// `containerFlow`.
pub struct VehicleLikeRule {
    tag: Tag,
}

impl VehicleLikeRule {
    /// Create a rule for one of the plain vehicle-like tags.
    #[must_use]
    pub fn new(tag: Tag) -> Self {
        Self { tag }
    }
}

impl ElementRule for VehicleLikeRule {
    fn tag(&self) -> Tag {
        self.tag
    }

    fn parse(
        &self,
        attrs: &AttributeView<'_>,
        context: &RuleContext<'_>,
    ) -> Result<ParsedElement, ElementError> {
        let vehicle = parse_vehicle_parameter(attrs, context.config)
            .map_err(ElementError::vehicle_parameter)?;
        Ok(ParsedElement::new(self.tag, Attributes::new()).with_vehicle_parameter(vehicle))
    }
}

/// Rule for `<trip>` elements: a vehicle between two edges.
pub struct TripRule;

impl ElementRule for TripRule {
    fn tag(&self) -> Tag {
        Tag::Trip
    }

    fn parse(
        &self,
        attrs: &AttributeView<'_>,
        context: &RuleContext<'_>,
    ) -> Result<ParsedElement, ElementError> {
        let vehicle = parse_vehicle_parameter(attrs, context.config)
            .map_err(ElementError::vehicle_parameter)?;

        let mut attributes = Attributes::new();
        attributes.insert_string(Attr::From, attrs.required::<String>(Attr::From)?);
        attributes.insert_string(Attr::To, attrs.required::<String>(Attr::To)?);
        attributes.insert_string_list(Attr::Via, attrs.optional(Attr::Via, Vec::new())?);

        Ok(ParsedElement::new(Tag::Trip, attributes).with_vehicle_parameter(vehicle))
    }
}

/// Rule for `<flow>` elements.
///
/// `from`, `to` and `via` are only used when the flow neither references
/// a route nor embeds one.
pub struct FlowRule;

impl ElementRule for FlowRule {
    fn tag(&self) -> Tag {
        Tag::Flow
    }

    fn parse(
        &self,
        attrs: &AttributeView<'_>,
        context: &RuleContext<'_>,
    ) -> Result<ParsedElement, ElementError> {
        let vehicle = parse_vehicle_parameter(attrs, context.config)
            .map_err(ElementError::vehicle_parameter)?;

        let mut attributes = Attributes::new();
        attributes.insert_string(Attr::From, attrs.optional(Attr::From, String::new())?);
        attributes.insert_string(Attr::To, attrs.optional(Attr::To, String::new())?);
        attributes.insert_string_list(Attr::Via, attrs.optional(Attr::Via, Vec::new())?);

        Ok(ParsedElement::new(Tag::Flow, attributes).with_vehicle_parameter(vehicle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HandlerConfig;
    use crate::types::SumoTime;
    use crate::vehicle::Depart;
    use crate::xml::RawAttributes;

    fn parse(
        rule: &dyn ElementRule,
        raw: &RawAttributes,
    ) -> Result<ParsedElement, ElementError> {
        let config = HandlerConfig::default();
        rule.parse(
            &AttributeView::new(rule.tag(), raw),
            &RuleContext::new(None, &config),
        )
    }

    #[test]
    fn test_vehicle_carries_parameter_record() {
        let raw = RawAttributes::new()
            .with("id", "v1")
            .with("depart", "10")
            .with("route", "r1");
        let parsed = parse(&VehicleLikeRule::new(Tag::Vehicle), &raw).unwrap();

        let vehicle = parsed.vehicle_parameter.unwrap();
        assert_eq!(vehicle.id, "v1");
        assert_eq!(vehicle.depart, Some(Depart::Given(SumoTime::from_secs(10))));
        assert!(vehicle.has_route_reference());
        assert!(parsed.attributes.is_empty());
    }

    #[test]
    fn test_person_requires_id() {
        let raw = RawAttributes::new().with("depart", "0");
        let err = parse(&VehicleLikeRule::new(Tag::Person), &raw).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Attribute 'id' is missing in definition of person"
        );
    }

    #[test]
    fn test_trip_requires_from_and_to() {
        let raw = RawAttributes::new()
            .with("id", "t1")
            .with("depart", "0")
            .with("from", "a");
        let err = parse(&TripRule, &raw).unwrap_err();
        assert!(err.is_attribute_error());
        assert!(!err.is_vehicle_parameter_error());

        let raw = raw.with("to", "b").with("via", "x y");
        let parsed = parse(&TripRule, &raw).unwrap();
        assert_eq!(parsed.attributes.string(Attr::From), "a");
        assert_eq!(parsed.attributes.string(Attr::To), "b");
        assert_eq!(parsed.attributes.string_list(Attr::Via), ["x", "y"]);
    }

    #[test]
    fn test_vehicle_record_errors_are_marked() {
        let raw = RawAttributes::new().with("id", "t1").with("depart", "-1");
        let err = parse(&TripRule, &raw).unwrap_err();
        assert!(err.is_vehicle_parameter_error());

        let raw = RawAttributes::new().with("id", "f1");
        let err = parse(&FlowRule, &raw).unwrap_err();
        assert!(err.is_vehicle_parameter_error());
    }

    #[test]
    fn test_flow_endpoints_are_optional() {
        let raw = RawAttributes::new()
            .with("id", "f1")
            .with("number", "5")
            .with("route", "r1");
        let parsed = parse(&FlowRule, &raw).unwrap();
        assert_eq!(parsed.attributes.string(Attr::From), "");
        assert!(parsed.attributes.string_list(Attr::Via).is_empty());
        assert!(parsed.vehicle_parameter.unwrap().flow.is_some());
    }
}
