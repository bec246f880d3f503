//! Route handler session: element events in, builder callbacks out.
//!
//! Each opened element becomes a node of the session's [`ObjectTree`] and
//! is parsed by the rule registered for its tag. When the outermost
//! dispatchable element closes, its subtree is walked into the
//! [`RouteBuilder`] and freed.

use std::fmt;

use serde::Serialize;

use crate::config::{is_valid_parameter_key, HandlerConfig};
use crate::dispatch::{RouteBuilder, TreeDispatcher};
use crate::error::{ElementError, HandlerError, Result};
use crate::registry::{create_route_registry, ParsedElement, RuleContext, RuleRegistry};
use crate::tree::{Node, NodeId, ObjectTree};
use crate::types::{Attr, Tag};
use crate::xml::{feed_document, AttributeView, EventSink, RawAttributes};

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Element kept, something was ignored or corrected.
    Warning,
    /// Element dropped.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// A problem found while handling one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Element the problem was found in.
    pub element: Tag,
    /// Id of that element, if it has one.
    pub id: Option<String>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// One parse session over a stream of element events.
///
/// Invalid elements are dropped together with their subtree and reported
/// once as an error [`Diagnostic`]; the session continues with the next
/// sibling. With `hard_fail` set, a vehicle, flow, person or container
/// whose vehicle parameters do not parse aborts the session instead.
pub struct RouteHandler<B: RouteBuilder> {
    config: HandlerConfig,
    registry: RuleRegistry,
    tree: ObjectTree,
    builder: B,
    diagnostics: Vec<Diagnostic>,
    aborted: Option<ElementError>,
    /// Open nodes with a dispatchable tag.
    open_dispatchable: usize,
}

impl<B: RouteBuilder> RouteHandler<B> {
    /// Create a session with the default route-file rules.
    pub fn new(config: HandlerConfig, builder: B) -> Self {
        Self::with_registry(config, create_route_registry(), builder)
    }

    /// Create a session with a custom rule registry.
    pub fn with_registry(config: HandlerConfig, registry: RuleRegistry, builder: B) -> Self {
        Self {
            config,
            registry,
            tree: ObjectTree::new(),
            builder,
            diagnostics: Vec::new(),
            aborted: None,
            open_dispatchable: 0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    #[must_use]
    pub fn builder(&self) -> &B {
        &self.builder
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The session's tree, holding open and not yet dispatched nodes.
    #[must_use]
    pub fn tree(&self) -> &ObjectTree {
        &self.tree
    }

    /// Whether a hard-fail abort ended the session.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    /// End the session, returning the builder and collected diagnostics.
    ///
    /// Elements still open are dropped without dispatch.
    pub fn finish(self) -> (B, Vec<Diagnostic>) {
        if self.tree.depth() > 0 {
            tracing::debug!(
                open = self.tree.depth(),
                "Session finished with open elements, dropping them"
            );
        }
        (self.builder, self.diagnostics)
    }

    /// Handle an open event.
    ///
    /// # Errors
    /// `Aborted` when a hard-fail session meets a vehicle-like element whose
    /// vehicle parameters do not parse, and for every event after that.
    pub fn start_element(&mut self, tag: Tag, attrs: &RawAttributes) -> Result<()> {
        self.check_aborted()?;

        let parent = self.tree.current().and_then(|id| self.tree.get(id));
        let inside_rejected = parent.is_some_and(Node::is_rejected);
        let parent_tag = parent.map(Node::tag).filter(|t| *t != Tag::Nothing);

        let node = self.tree.open(tag);
        if inside_rejected {
            self.reject_current();
            return Ok(());
        }

        let view = AttributeView::new(tag, attrs);
        let result = match self.registry.get(tag) {
            Some(rule) => rule.parse(&view, &RuleContext::new(parent_tag, &self.config)),
            None => return Ok(()),
        };

        match result {
            Ok(parsed) => {
                self.accept(node, view.object_id(), parsed);
                Ok(())
            }
            Err(err) => {
                self.reject_current();
                self.report_error(tag, view.object_id(), &err);
                if self.config.hard_fail && err.is_vehicle_parameter_error() {
                    tracing::error!(tag = %tag, "Aborting session on invalid element");
                    self.aborted = Some(err.clone());
                    return Err(HandlerError::Aborted(err));
                }
                Ok(())
            }
        }
    }

    /// Handle a close event.
    ///
    /// # Errors
    /// `UnbalancedClose` if no element is open or the innermost open
    /// element has a different tag; `Aborted` after a hard-fail abort.
    pub fn end_element(&mut self, tag: Tag) -> Result<()> {
        self.check_aborted()?;

        let Some(id) = self.tree.current() else {
            return Err(HandlerError::UnbalancedClose {
                found: tag,
                expected: None,
            });
        };
        let Some((element, node_tag, rejected)) = self
            .tree
            .get(id)
            .map(|node| (node.element(), node.tag(), node.is_rejected()))
        else {
            return Err(HandlerError::UnbalancedClose {
                found: tag,
                expected: None,
            });
        };
        if element != tag {
            return Err(HandlerError::UnbalancedClose {
                found: tag,
                expected: Some(element),
            });
        }
        self.tree.close();
        if node_tag.is_dispatchable() {
            self.open_dispatchable = self.open_dispatchable.saturating_sub(1);
        }

        if rejected || node_tag == Tag::Param {
            self.tree.discard(id);
            return Ok(());
        }
        if self.open_dispatchable > 0 {
            return Ok(());
        }

        if node_tag.is_dispatchable() {
            let callbacks = TreeDispatcher::new(&self.tree).walk(id, &mut self.builder);
            tracing::debug!(tag = %node_tag, callbacks, "Dispatched element tree");
        }
        self.tree.discard(id);
        Ok(())
    }

    fn check_aborted(&self) -> Result<()> {
        match &self.aborted {
            Some(err) => Err(HandlerError::Aborted(err.clone())),
            None => Ok(()),
        }
    }

    fn reject_current(&mut self) {
        if let Some(current) = self.tree.current_mut() {
            current.reject();
        }
    }

    /// Store a successfully parsed element in the current node.
    fn accept(&mut self, node: NodeId, id: Option<String>, mut parsed: ParsedElement) {
        for warning in std::mem::take(&mut parsed.warnings) {
            self.report_warning(parsed.tag, id.clone(), warning);
        }
        if parsed.tag == Tag::Param {
            self.attach_parameter(node, &parsed);
        }
        if parsed.tag.is_dispatchable() {
            self.open_dispatchable += 1;
        }
        if let Some(current) = self.tree.current_mut() {
            current.assign(parsed);
        }
    }

    /// Attach a generic parameter to the element enclosing `node`.
    fn attach_parameter(&mut self, node: NodeId, parsed: &ParsedElement) {
        let Some((target, target_tag)) = self
            .tree
            .ancestors(node)
            .next()
            .map(|(id, parent)| (id, parent.tag()))
        else {
            return;
        };
        let key = parsed.attributes.string(Attr::Key);
        let value = parsed.attributes.string(Attr::Value);

        if key.is_empty() {
            self.report_warning(
                Tag::Param,
                None,
                format!("key of {target_tag} parameter cannot be empty"),
            );
        } else if !is_valid_parameter_key(key) {
            self.report_warning(
                Tag::Param,
                None,
                format!("key '{key}' of {target_tag} parameter contains invalid characters"),
            );
        } else {
            tracing::debug!(key, value, parent = %target_tag, "Inserting generic parameter");
            self.tree
                .add_parameter(target, key.to_string(), value.to_string());
        }
    }

    fn report_error(&mut self, element: Tag, id: Option<String>, err: &ElementError) {
        tracing::error!(tag = %element, error = %err, "Dropping invalid element");
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            element,
            id,
            message: err.to_string(),
        });
    }

    fn report_warning(&mut self, element: Tag, id: Option<String>, message: String) {
        tracing::warn!(tag = %element, "{message}");
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            element,
            id,
            message,
        });
    }
}

impl<B: RouteBuilder> EventSink for RouteHandler<B> {
    fn start_element(&mut self, tag: Tag, attrs: &RawAttributes) -> Result<()> {
        RouteHandler::start_element(self, tag, attrs)
    }

    fn end_element(&mut self, tag: Tag) -> Result<()> {
        RouteHandler::end_element(self, tag)
    }
}

impl<B: RouteBuilder + fmt::Debug> fmt::Debug for RouteHandler<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteHandler")
            .field("config", &self.config)
            .field("open", &self.tree.depth())
            .field("diagnostics", &self.diagnostics.len())
            .field("aborted", &self.aborted.is_some())
            .finish()
    }
}

/// Handle a complete XML document in one session.
///
/// # Examples
/// ```
/// use route_handler::config::HandlerConfig;
/// use route_handler::dispatch::RecordingBuilder;
/// use route_handler::handler::handle_document;
///
/// let xml = r#"<routes><route id="r1" edges="a b c"/></routes>"#;
/// let (builder, diagnostics) =
///     handle_document(xml, HandlerConfig::default(), RecordingBuilder::new()).unwrap();
/// assert_eq!(builder.calls.len(), 1);
/// assert!(diagnostics.is_empty());
/// ```
///
/// # Errors
/// `Xml` for malformed documents and `Aborted` for hard-fail aborts.
pub fn handle_document<B: RouteBuilder>(
    text: &str,
    config: HandlerConfig,
    builder: B,
) -> Result<(B, Vec<Diagnostic>)> {
    let mut handler = RouteHandler::new(config, builder);
    feed_document(text, &mut handler)?;
    Ok(handler.finish())
}
