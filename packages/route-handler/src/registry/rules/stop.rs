//! Rule for `<stop>` elements.

use crate::error::ElementError;
use crate::registry::rule::{ElementRule, ParsedElement, RuleContext};
use crate::stop::parse_stop;
use crate::types::{Attributes, Tag};
use crate::xml::AttributeView;

/// Rule for `<stop>` elements.
///
/// Stops are valid inside vehicles, flows, persons, containers, embedded
/// routes and at the top level.
pub struct StopRule;

impl ElementRule for StopRule {
    fn tag(&self) -> Tag {
        Tag::Stop
    }

    fn parse(
        &self,
        attrs: &AttributeView<'_>,
        _context: &RuleContext<'_>,
    ) -> Result<ParsedElement, ElementError> {
        let parsed = parse_stop(attrs)?;
        Ok(ParsedElement::new(Tag::Stop, Attributes::new())
            .with_stop_parameter(parsed.stop)
            .with_warnings(parsed.warnings))
    }
}
