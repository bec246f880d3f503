//! Pre-order traversal of closed trees into builder callbacks.

use std::borrow::Cow;

use super::builder::{NodeRef, RouteBuilder};
use crate::tree::{Node, NodeId, ObjectTree};
use crate::types::{Attr, Parameters, Tag};
use crate::vehicle::VehicleParameter;

/// Walks a closed subtree and invokes one builder callback per node.
///
/// A node is dispatched before its children, so callbacks arrive in
/// document order. Routes embedded in a vehicle or flow have no callback of
/// their own; their edges and parameters are passed to the enclosing
/// element's callback.
pub struct TreeDispatcher<'t> {
    tree: &'t ObjectTree,
}

impl<'t> TreeDispatcher<'t> {
    #[must_use]
    pub fn new(tree: &'t ObjectTree) -> Self {
        Self { tree }
    }

    /// Dispatch `id` and its descendants.
    ///
    /// # Returns
    /// The number of callbacks invoked.
    pub fn walk(&self, id: NodeId, builder: &mut impl RouteBuilder) -> usize {
        let Some(node) = self.tree.get(id) else {
            return 0;
        };
        let mut count = 0;
        let mut pending = vec![(node, self.owner(node))];
        while let Some((node, owner)) = pending.pop() {
            count += usize::from(self.dispatch(node, owner, builder));
            let inherited = node.vehicle_parameter().or(owner);
            pending.extend(
                node.children()
                    .iter()
                    .rev()
                    .filter_map(|child| self.tree.get(*child))
                    .map(|child| (child, inherited)),
            );
        }
        count
    }

    /// Tag of the parent if that parent is a parsed element.
    fn parent_tag(&self, node: &Node) -> Option<Tag> {
        node.parent()
            .and_then(|parent| self.tree.get(parent))
            .map(Node::tag)
            .filter(|tag| *tag != Tag::Nothing)
    }

    /// Nearest enclosing vehicle parameter record.
    fn owner(&self, node: &'t Node) -> Option<&'t VehicleParameter> {
        let mut current = node.parent();
        while let Some(id) = current {
            let ancestor = self.tree.get(id)?;
            if let Some(vehicle) = ancestor.vehicle_parameter() {
                return Some(vehicle);
            }
            current = ancestor.parent();
        }
        None
    }

    /// First embedded route child, if any.
    fn embedded_route(&self, node: &'t Node) -> Option<&'t Node> {
        node.children()
            .iter()
            .filter_map(|child| self.tree.get(*child))
            .find(|child| child.tag() == Tag::Route)
    }

    /// Invoke the callback for one node; returns whether one was invoked.
    fn dispatch(
        &self,
        node: &'t Node,
        owner: Option<&'t VehicleParameter>,
        builder: &mut impl RouteBuilder,
    ) -> bool {
        let parent = self.parent_tag(node);
        let context = NodeRef {
            tag: node.tag(),
            parent,
            owner,
        };
        let attrs = node.attributes();
        let parameters = node.parameters();

        match (node.tag(), node.vehicle_parameter(), node.stop_parameter()) {
            (Tag::Route, _, _) => {
                if parent.is_some() {
                    return false;
                }
                builder.build_route(
                    context,
                    attrs.string(Attr::Id),
                    attrs.string_list(Attr::Edges),
                    attrs.color(Attr::Color),
                    attrs.int(Attr::Repeat),
                    attrs.time(Attr::CycleTime),
                    parameters,
                );
            }
            (Tag::Vehicle, Some(vehicle), _) => {
                if vehicle.has_route_reference() {
                    builder.build_vehicle_over_route(context, vehicle, parameters);
                } else {
                    let route = self.embedded_route(node);
                    let edges = route
                        .map(|route| route.attributes().string_list(Attr::Edges))
                        .unwrap_or_default();
                    let parameters = route.map_or(Cow::Borrowed(parameters), |route| {
                        with_route_parameters(node, route)
                    });
                    builder.build_vehicle_embedded_route(context, vehicle, edges, &parameters);
                }
            }
            (Tag::Trip, Some(vehicle), _) => builder.build_trip(
                context,
                vehicle,
                attrs.string(Attr::From),
                attrs.string(Attr::To),
                attrs.string_list(Attr::Via),
                parameters,
            ),
            (Tag::Flow, Some(flow), _) => {
                if flow.has_route_reference() {
                    builder.build_flow_over_route(context, flow, parameters);
                } else if let Some(route) = self.embedded_route(node) {
                    let edges = route.attributes().string_list(Attr::Edges);
                    let parameters = with_route_parameters(node, route);
                    builder.build_flow_embedded_route(context, flow, edges, &parameters);
                } else {
                    builder.build_flow(
                        context,
                        flow,
                        attrs.string(Attr::From),
                        attrs.string(Attr::To),
                        attrs.string_list(Attr::Via),
                        parameters,
                    );
                }
            }
            (Tag::Stop, _, Some(stop)) => builder.build_stop(context, stop),
            (Tag::Person, Some(person), _) => builder.build_person(context, person, parameters),
            (Tag::PersonFlow, Some(person_flow), _) => {
                builder.build_person_flow(context, person_flow, parameters);
            }
            (Tag::PersonTrip, _, _) => builder.build_person_trip(
                context,
                attrs.string(Attr::From),
                attrs.string(Attr::To),
                attrs.string(Attr::BusStop),
                attrs.double(Attr::ArrivalPos),
                attrs.string_list(Attr::VTypes),
                attrs.string_list(Attr::Modes),
            ),
            (Tag::Ride, _, _) => builder.build_ride(
                context,
                attrs.string(Attr::From),
                attrs.string(Attr::To),
                attrs.string(Attr::BusStop),
                attrs.double(Attr::ArrivalPos),
                attrs.string_list(Attr::Lines),
            ),
            (Tag::Walk, _, _) => builder.build_walk(
                context,
                attrs.string(Attr::From),
                attrs.string(Attr::To),
                attrs.string(Attr::BusStop),
                attrs.string_list(Attr::Edges),
                attrs.string(Attr::Route),
                attrs.double(Attr::ArrivalPos),
            ),
            (Tag::Container, Some(container), _) => {
                builder.build_container(context, container, parameters);
            }
            (Tag::ContainerFlow, Some(container_flow), _) => {
                builder.build_container_flow(context, container_flow, parameters);
            }
            (Tag::Transport, _, _) => builder.build_transport(
                context,
                attrs.string(Attr::From),
                attrs.string(Attr::To),
                attrs.string(Attr::ContainerStop),
                attrs.string_list(Attr::Lines),
                attrs.double(Attr::ArrivalPos),
            ),
            (Tag::Tranship, _, _) => builder.build_tranship(
                context,
                attrs.string(Attr::From),
                attrs.string(Attr::To),
                attrs.string(Attr::ContainerStop),
                attrs.string_list(Attr::Edges),
                attrs.double(Attr::Speed),
                attrs.double(Attr::DepartPos),
                attrs.double(Attr::ArrivalPos),
            ),
            _ => return false,
        }
        tracing::debug!(tag = %node.tag(), owner = ?context.owner_id(), "Dispatched element");
        true
    }
}

/// Parameters of `node` with those of its embedded `route` underneath.
///
/// Keys set on the element itself win over the route's.
fn with_route_parameters<'n>(node: &'n Node, route: &'n Node) -> Cow<'n, Parameters> {
    if route.parameters().is_empty() {
        return Cow::Borrowed(node.parameters());
    }
    let mut merged = route.parameters().clone();
    merged.extend(
        node.parameters()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone())),
    );
    Cow::Owned(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{BuildCall, RecordingBuilder};
    use crate::registry::{create_route_registry, RuleContext};
    use crate::config::HandlerConfig;
    use crate::xml::{AttributeView, RawAttributes};

    /// Open a parsed node below the current stack top.
    fn open(tree: &mut ObjectTree, tag: Tag, pairs: &[(&str, &str)]) -> NodeId {
        let registry = create_route_registry();
        let config = HandlerConfig::default();
        let parent = tree
            .current()
            .and_then(|id| tree.get(id))
            .map(Node::tag)
            .filter(|tag| *tag != Tag::Nothing);
        let raw: RawAttributes = pairs.iter().copied().collect();
        let parsed = registry
            .get(tag)
            .unwrap()
            .parse(&AttributeView::new(tag, &raw), &RuleContext::new(parent, &config))
            .unwrap();
        let id = tree.open(tag);
        tree.current_mut().unwrap().assign(parsed);
        id
    }

    #[test]
    fn test_vehicle_with_embedded_route_and_stop() {
        let mut tree = ObjectTree::new();
        let vehicle = open(&mut tree, Tag::Vehicle, &[("id", "v1"), ("depart", "0")]);
        open(&mut tree, Tag::Route, &[("edges", "a b")]);
        open(&mut tree, Tag::Stop, &[("lane", "b_0"), ("duration", "5")]);
        tree.close();
        tree.close();
        tree.close();

        let mut builder = RecordingBuilder::default();
        let count = TreeDispatcher::new(&tree).walk(vehicle, &mut builder);

        assert_eq!(count, 2);
        assert!(matches!(
            &builder.calls[0],
            BuildCall::VehicleEmbeddedRoute { vehicle, edges, .. }
                if vehicle.id == "v1" && edges == &["a", "b"]
        ));
        assert!(matches!(
            &builder.calls[1],
            BuildCall::Stop { owner: Some(owner), parent: Some(Tag::Route), .. } if owner == "v1"
        ));
    }

    #[test]
    fn test_embedded_route_parameters_reach_owner_callback() {
        let mut tree = ObjectTree::new();
        let vehicle = open(&mut tree, Tag::Vehicle, &[("id", "v1"), ("depart", "0")]);
        let route = open(&mut tree, Tag::Route, &[("edges", "a b")]);
        tree.close();
        tree.close();
        tree.add_parameter(route, "color".into(), "route".into());
        tree.add_parameter(route, "k".into(), "v".into());
        tree.add_parameter(vehicle, "color".into(), "vehicle".into());

        let mut builder = RecordingBuilder::default();
        TreeDispatcher::new(&tree).walk(vehicle, &mut builder);

        let [BuildCall::VehicleEmbeddedRoute { parameters, .. }] = &builder.calls[..] else {
            panic!("unexpected calls: {:?}", builder.calls);
        };
        assert_eq!(parameters.get("k").map(String::as_str), Some("v"));
        assert_eq!(parameters.get("color").map(String::as_str), Some("vehicle"));
    }

    #[test]
    fn test_deep_subtree_walks_without_recursion() {
        let mut tree = ObjectTree::new();
        let vehicle = open(&mut tree, Tag::Vehicle, &[("id", "v1"), ("depart", "0")]);
        for _ in 0..100_000 {
            tree.open(Tag::Nothing);
        }
        open(&mut tree, Tag::Stop, &[("lane", "a_0"), ("duration", "5")]);
        while tree.close().is_some() {}

        let mut builder = RecordingBuilder::default();
        let count = TreeDispatcher::new(&tree).walk(vehicle, &mut builder);

        assert_eq!(count, 2);
        assert!(matches!(
            &builder.calls[1],
            BuildCall::Stop { owner: Some(owner), parent: None, .. } if owner == "v1"
        ));
    }

    #[test]
    fn test_vehicle_without_route_has_empty_edges() {
        let mut tree = ObjectTree::new();
        let vehicle = open(&mut tree, Tag::Vehicle, &[("id", "v2"), ("depart", "1")]);
        tree.close();

        let mut builder = RecordingBuilder::default();
        TreeDispatcher::new(&tree).walk(vehicle, &mut builder);
        assert!(matches!(
            &builder.calls[..],
            [BuildCall::VehicleEmbeddedRoute { edges, .. }] if edges.is_empty()
        ));
    }

    #[test]
    fn test_flow_variants() {
        let mut tree = ObjectTree::new();
        let over = open(&mut tree, Tag::Flow, &[("id", "f1"), ("number", "2"), ("route", "r")]);
        tree.close();
        let embedded = open(&mut tree, Tag::Flow, &[("id", "f2"), ("number", "2")]);
        open(&mut tree, Tag::Route, &[("edges", "x")]);
        tree.close();
        tree.close();
        let plain = open(
            &mut tree,
            Tag::Flow,
            &[("id", "f3"), ("period", "10"), ("from", "a"), ("to", "b")],
        );
        tree.close();

        let mut builder = RecordingBuilder::default();
        let dispatcher = TreeDispatcher::new(&tree);
        for id in [over, embedded, plain] {
            dispatcher.walk(id, &mut builder);
        }

        assert!(matches!(builder.calls[0], BuildCall::FlowOverRoute { .. }));
        assert!(matches!(builder.calls[1], BuildCall::FlowEmbeddedRoute { .. }));
        assert!(matches!(
            &builder.calls[2],
            BuildCall::Flow { from, to, .. } if from == "a" && to == "b"
        ));
    }

    #[test]
    fn test_person_plan_in_document_order() {
        let mut tree = ObjectTree::new();
        let person = open(&mut tree, Tag::Person, &[("id", "p1"), ("depart", "0")]);
        open(&mut tree, Tag::Walk, &[("edges", "a b")]);
        tree.close();
        open(&mut tree, Tag::Ride, &[("busStop", "bs"), ("lines", "L1")]);
        tree.close();
        open(&mut tree, Tag::PersonTrip, &[("from", "b"), ("to", "c")]);
        tree.close();
        tree.close();

        let mut builder = RecordingBuilder::default();
        TreeDispatcher::new(&tree).walk(person, &mut builder);
        let names: Vec<&str> = builder.calls.iter().map(BuildCall::name).collect();
        assert_eq!(names, ["person", "walk", "ride", "personTrip"]);
    }
}
