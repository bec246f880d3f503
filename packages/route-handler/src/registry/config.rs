//! Registry configuration for route files.

use super::core::RuleRegistry;
use super::rule::ElementRule;
use super::rules::{
    FlowRule, ParamRule, PersonTripRule, RideRule, RouteRule, StopRule, TranshipRule,
    TransportRule, TripRule, VehicleLikeRule, WalkRule,
};
use crate::types::Tag;

/// Rule for a tag, `None` for transparent tags.
fn rule_for(tag: Tag) -> Option<Box<dyn ElementRule>> {
    let rule: Box<dyn ElementRule> = match tag {
        Tag::Route => Box::new(RouteRule),
        Tag::Trip => Box::new(TripRule),
        Tag::Flow => Box::new(FlowRule),
        Tag::Vehicle
        | Tag::Person
        | Tag::PersonFlow
        | Tag::Container
        | Tag::ContainerFlow => Box::new(VehicleLikeRule::new(tag)),
        Tag::Stop => Box::new(StopRule),
        Tag::PersonTrip => Box::new(PersonTripRule),
        Tag::Ride => Box::new(RideRule),
        Tag::Walk => Box::new(WalkRule),
        Tag::Transport => Box::new(TransportRule),
        Tag::Tranship => Box::new(TranshipRule),
        Tag::Param => Box::new(ParamRule),
        Tag::Nothing => return None,
    };
    Some(rule)
}

/// Create a rule registry for route files.
///
/// Every tag except `Nothing` gets a rule.
#[must_use]
pub fn create_route_registry() -> RuleRegistry {
    let mut registry = RuleRegistry::new();
    for tag in Tag::ALL {
        if let Some(rule) = rule_for(tag) {
            registry.register_boxed(rule);
        }
    }
    registry
}
