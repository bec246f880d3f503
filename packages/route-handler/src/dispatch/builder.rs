//! Builder callbacks invoked for closed element trees.

use crate::stop::Stop;
use crate::types::{Color, Parameters, SumoTime, Tag};
use crate::vehicle::VehicleParameter;

/// Read-only context of the node a callback is invoked for.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    /// Tag assigned to the node.
    pub tag: Tag,
    /// Tag of the enclosing element; `None` at the document root.
    pub parent: Option<Tag>,
    /// Vehicle record of the nearest enclosing vehicle, flow, person or
    /// container.
    pub owner: Option<&'a VehicleParameter>,
}

impl NodeRef<'_> {
    /// Id of the owning vehicle, flow, person or container.
    #[must_use]
    pub fn owner_id(&self) -> Option<&str> {
        self.owner.map(|owner| owner.id.as_str())
    }
}

/// Consumer of built route-file objects.
///
/// There is one callback per dispatchable element kind. Callbacks receive
/// the node's resolved fields; parameters attached through `<param>`
/// children are passed where the element supports them.
#[allow(clippy::too_many_arguments)]
pub trait RouteBuilder {
    /// A stand-alone route.
    fn build_route(
        &mut self,
        node: NodeRef<'_>,
        id: &str,
        edges: &[String],
        color: Color,
        repeat: i32,
        cycle_time: SumoTime,
        parameters: &Parameters,
    );

    /// A vehicle that references a route by id.
    fn build_vehicle_over_route(
        &mut self,
        node: NodeRef<'_>,
        vehicle: &VehicleParameter,
        parameters: &Parameters,
    );

    /// A vehicle with its route embedded; `edges` is empty if no route was given.
    fn build_vehicle_embedded_route(
        &mut self,
        node: NodeRef<'_>,
        vehicle: &VehicleParameter,
        edges: &[String],
        parameters: &Parameters,
    );

    fn build_trip(
        &mut self,
        node: NodeRef<'_>,
        vehicle: &VehicleParameter,
        from: &str,
        to: &str,
        via: &[String],
        parameters: &Parameters,
    );

    /// A flow between two edges, without a route.
    fn build_flow(
        &mut self,
        node: NodeRef<'_>,
        flow: &VehicleParameter,
        from: &str,
        to: &str,
        via: &[String],
        parameters: &Parameters,
    );

    fn build_flow_over_route(
        &mut self,
        node: NodeRef<'_>,
        flow: &VehicleParameter,
        parameters: &Parameters,
    );

    fn build_flow_embedded_route(
        &mut self,
        node: NodeRef<'_>,
        flow: &VehicleParameter,
        edges: &[String],
        parameters: &Parameters,
    );

    fn build_stop(&mut self, node: NodeRef<'_>, stop: &Stop);

    fn build_person(&mut self, node: NodeRef<'_>, person: &VehicleParameter, parameters: &Parameters);

    fn build_person_flow(
        &mut self,
        node: NodeRef<'_>,
        person_flow: &VehicleParameter,
        parameters: &Parameters,
    );

    fn build_person_trip(
        &mut self,
        node: NodeRef<'_>,
        from: &str,
        to: &str,
        bus_stop: &str,
        arrival_pos: f64,
        v_types: &[String],
        modes: &[String],
    );

    fn build_ride(
        &mut self,
        node: NodeRef<'_>,
        from: &str,
        to: &str,
        bus_stop: &str,
        arrival_pos: f64,
        lines: &[String],
    );

    fn build_walk(
        &mut self,
        node: NodeRef<'_>,
        from: &str,
        to: &str,
        bus_stop: &str,
        edges: &[String],
        route: &str,
        arrival_pos: f64,
    );

    fn build_container(
        &mut self,
        node: NodeRef<'_>,
        container: &VehicleParameter,
        parameters: &Parameters,
    );

    fn build_container_flow(
        &mut self,
        node: NodeRef<'_>,
        container_flow: &VehicleParameter,
        parameters: &Parameters,
    );

    fn build_transport(
        &mut self,
        node: NodeRef<'_>,
        from: &str,
        to: &str,
        container_stop: &str,
        lines: &[String],
        arrival_pos: f64,
    );

    fn build_tranship(
        &mut self,
        node: NodeRef<'_>,
        from: &str,
        to: &str,
        container_stop: &str,
        edges: &[String],
        speed: f64,
        depart_pos: f64,
        arrival_pos: f64,
    );
}
