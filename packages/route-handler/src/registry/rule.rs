//! Element rule trait and the values rules produce.

use crate::config::HandlerConfig;
use crate::error::ElementError;
use crate::stop::Stop;
use crate::types::{Attributes, Tag};
use crate::vehicle::VehicleParameter;
use crate::xml::AttributeView;

/// What a rule may know about the element's surroundings.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Tag of the enclosing element, if that element was parsed by a rule.
    ///
    /// `None` at the document root and below transparent or rejected
    /// elements.
    pub parent: Option<Tag>,

    /// Session configuration.
    pub config: &'a HandlerConfig,
}

impl<'a> RuleContext<'a> {
    /// Create a context.
    #[must_use]
    pub fn new(parent: Option<Tag>, config: &'a HandlerConfig) -> Self {
        Self { parent, config }
    }
}

/// Typed content of one accepted element.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedElement {
    pub tag: Tag,
    pub attributes: Attributes,
    pub vehicle_parameter: Option<VehicleParameter>,
    pub stop_parameter: Option<Stop>,
    /// Non-fatal problems found while parsing.
    pub warnings: Vec<String>,
}

impl ParsedElement {
    /// Create a result that only carries an attribute bag.
    #[must_use]
    pub fn new(tag: Tag, attributes: Attributes) -> Self {
        Self {
            tag,
            attributes,
            vehicle_parameter: None,
            stop_parameter: None,
            warnings: Vec::new(),
        }
    }

    /// Attach a vehicle parameter record.
    #[must_use]
    pub fn with_vehicle_parameter(mut self, vehicle: VehicleParameter) -> Self {
        self.vehicle_parameter = Some(vehicle);
        self
    }

    /// Attach a stop record.
    #[must_use]
    pub fn with_stop_parameter(mut self, stop: Stop) -> Self {
        self.stop_parameter = Some(stop);
        self
    }

    /// Append non-fatal warnings.
    #[must_use]
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }
}

/// Trait for element rules.
///
/// A rule turns the attributes of one element into typed node content. It
/// has no side effects: failures are returned and the caller decides
/// whether the node is dropped or the session aborted.
pub trait ElementRule: Send + Sync {
    /// Tag this rule parses.
    fn tag(&self) -> Tag;

    /// Parse the element.
    ///
    /// # Arguments
    /// * `attrs` - Typed view over the element's raw attributes
    /// * `context` - Enclosing element and session configuration
    fn parse(
        &self,
        attrs: &AttributeView<'_>,
        context: &RuleContext<'_>,
    ) -> Result<ParsedElement, ElementError>;
}
