//! Rule registry for mapping tags to element rules.

use std::collections::{BTreeSet, HashMap};

use super::rule::ElementRule;
use crate::types::Tag;

/// Registry mapping element tags to rules.
///
/// Tags without a rule are transparent: their nodes stay untyped and are
/// never dispatched.
pub struct RuleRegistry {
    rules: HashMap<Tag, Box<dyn ElementRule>>,
}

impl RuleRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Register a rule under the tag it reports, replacing any previous rule.
    pub fn register(&mut self, rule: impl ElementRule + 'static) {
        self.register_boxed(Box::new(rule));
    }

    /// Register an already boxed rule.
    pub fn register_boxed(&mut self, rule: Box<dyn ElementRule>) {
        self.rules.insert(rule.tag(), rule);
    }

    /// Get the rule for a tag.
    #[must_use]
    pub fn get(&self, tag: Tag) -> Option<&dyn ElementRule> {
        self.rules.get(&tag).map(|rule| rule.as_ref())
    }

    /// Check if a rule is registered for a tag.
    #[must_use]
    pub fn has_rule(&self, tag: Tag) -> bool {
        self.rules.contains_key(&tag)
    }

    /// Return the set of all tags with a rule.
    #[must_use]
    pub fn registered_tags(&self) -> BTreeSet<Tag> {
        self.rules.keys().copied().collect()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("tags", &self.registered_tags())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ElementError;
    use crate::registry::{ParsedElement, RuleContext};
    use crate::types::Attributes;
    use crate::xml::AttributeView;

    struct DummyRule(Tag);

    impl ElementRule for DummyRule {
        fn tag(&self) -> Tag {
            self.0
        }

        fn parse(
            &self,
            _attrs: &AttributeView<'_>,
            _context: &RuleContext<'_>,
        ) -> Result<ParsedElement, ElementError> {
            Ok(ParsedElement::new(self.0, Attributes::new()))
        }
    }

    #[test]
    fn test_registry_register_and_get() {
        let mut registry = RuleRegistry::new();
        registry.register(DummyRule(Tag::Walk));

        assert!(registry.has_rule(Tag::Walk));
        assert!(!registry.has_rule(Tag::Ride));
        assert_eq!(registry.get(Tag::Walk).map(|r| r.tag()), Some(Tag::Walk));
        assert!(registry.get(Tag::Ride).is_none());
    }

    #[test]
    fn test_registry_replaces_rule() {
        let mut registry = RuleRegistry::new();
        registry.register(DummyRule(Tag::Walk));
        registry.register(DummyRule(Tag::Walk));
        assert_eq!(registry.registered_tags().len(), 1);
    }
}
